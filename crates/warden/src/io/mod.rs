//! Stdin/stdout plumbing for the runner

mod processor;

pub use processor::StdinProcessor;
