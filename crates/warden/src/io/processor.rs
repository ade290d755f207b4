//! Hardened stdin processor
//!
//! The host pipes exactly one JSON event per invocation. Reading is bounded
//! three ways: a size cap, a per-read timeout, and a nesting-depth cap
//! checked before parsing, so a hostile or broken host cannot wedge the
//! runner or feed it a JSON bomb.

use bytes::BytesMut;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::io::{AsyncReadExt, stdin};
use warden_core::{Result, WardenError};

/// Maximum accepted input size in bytes
const MAX_INPUT_BYTES: usize = 8 * 1024 * 1024;

/// Timeout applied to each individual stdin read
const READ_TIMEOUT_MS: u64 = 5_000;

/// Maximum JSON nesting depth
const MAX_JSON_DEPTH: u32 = 64;

/// Bounded JSON reader over stdin
pub struct StdinProcessor {
    buffer: BytesMut,
    read_buffer: Vec<u8>,
}

impl StdinProcessor {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(8192),
            read_buffer: vec![0u8; 8192],
        }
    }

    /// Read and parse one JSON value from stdin
    pub async fn read_json<T>(&mut self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.buffer.clear();
        let mut stdin = stdin();

        loop {
            let n = tokio::time::timeout(
                Duration::from_millis(READ_TIMEOUT_MS),
                stdin.read(&mut self.read_buffer),
            )
            .await
            .map_err(|_| WardenError::Timeout {
                operation: "stdin read".to_string(),
                timeout_ms: READ_TIMEOUT_MS,
            })?
            .map_err(WardenError::Io)?;

            if n == 0 {
                break;
            }

            if self.buffer.len() + n > MAX_INPUT_BYTES {
                return Err(WardenError::InvalidInput {
                    message: format!("input exceeds maximum size of {MAX_INPUT_BYTES} bytes"),
                });
            }
            self.buffer.extend_from_slice(&self.read_buffer[..n]);
        }

        validate_json_depth(&self.buffer, MAX_JSON_DEPTH)?;
        serde_json::from_slice(&self.buffer).map_err(WardenError::Json)
    }
}

impl Default for StdinProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject input nested deeper than `max_depth` before handing it to serde
fn validate_json_depth(input: &[u8], max_depth: u32) -> Result<()> {
    let mut depth = 0u32;
    let mut in_string = false;
    let mut escape_next = false;

    for &byte in input {
        if escape_next {
            escape_next = false;
            continue;
        }

        match byte {
            b'"' => in_string = !in_string,
            b'\\' if in_string => escape_next = true,
            b'{' | b'[' if !in_string => {
                depth += 1;
                if depth > max_depth {
                    return Err(WardenError::InvalidInput {
                        message: format!(
                            "JSON nesting depth {depth} exceeds maximum {max_depth}"
                        ),
                    });
                }
            }
            b'}' | b']' if !in_string => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    Ok(())
}
