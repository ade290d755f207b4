//! Shell-aware command decomposition
//!
//! Dangerous commands hide behind chaining, pipes, and command substitution.
//! This module decomposes a raw command string without executing anything,
//! using a small scanner with five states: normal, single-quote,
//! double-quote, `$(`-depth, and backtick. Splitting never happens inside a
//! quoted region or a substitution, so `git commit -m "a; b"` stays whole.
//!
//! Two split flavors exist:
//!
//! - [`extract_all_commands`] recursively pulls the bodies out of `$(...)`
//!   and backtick substitutions, then splits the residue on `&&`, `||`, `;`,
//!   `|`, and `&`; the command-rule engine must see every executable
//!   command.
//! - [`split_commands`] splits only the top level on `&&`, `||`, `;`, and
//!   `|`, leaving substitutions embedded; the worktree checker judges each
//!   chained command as the user wrote it.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    SingleQuote,
    DoubleQuote,
    Backtick,
}

/// Scanner over a command string tracking quote and substitution context
struct Scanner<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    state: State,
    paren_depth: u32,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            state: State::Normal,
            paren_depth: 0,
        }
    }

    fn in_plain_text(&self) -> bool {
        self.state == State::Normal && self.paren_depth == 0
    }

    /// Advance one scan step, updating quote/substitution state.
    /// Returns the number of bytes consumed (a `$(` opener counts as one
    /// step of two bytes so a separator check never lands between them).
    fn step(&mut self) -> Option<usize> {
        let ch = self.chars.next()?;
        let mut consumed = ch.len_utf8();
        match self.state {
            State::SingleQuote => {
                if ch == '\'' {
                    self.state = State::Normal;
                }
            }
            State::DoubleQuote => {
                if ch == '"' {
                    self.state = State::Normal;
                }
            }
            State::Backtick => {
                if ch == '`' {
                    self.state = State::Normal;
                }
            }
            State::Normal => match ch {
                '\'' if self.paren_depth == 0 => self.state = State::SingleQuote,
                '"' if self.paren_depth == 0 => self.state = State::DoubleQuote,
                '`' if self.paren_depth == 0 => self.state = State::Backtick,
                '$' if self.chars.peek() == Some(&'(') => {
                    self.chars.next();
                    consumed += 1;
                    self.paren_depth += 1;
                }
                '(' if self.paren_depth > 0 => self.paren_depth += 1,
                ')' if self.paren_depth > 0 => self.paren_depth -= 1,
                _ => {}
            },
        }
        Some(consumed)
    }
}

const SEPARATORS: &[&str] = &["&&", "||", ";", "|", "&"];

/// Split a command on chain separators, respecting quotes and substitutions
///
/// Separators: `&&`, `||`, `;`, `|`. A single `&` is not a separator here so
/// that background-job suffixes stay attached to their command.
pub fn split_commands(command: &str) -> Vec<String> {
    split_with(command, false)
}

fn split_with(command: &str, split_single_amp: bool) -> Vec<String> {
    let mut commands = Vec::new();
    let mut current = String::new();
    let mut rest = command;

    while !rest.is_empty() {
        let mut scanner = Scanner::new(rest);
        let mut consumed = 0;
        let mut split_len = 0;

        loop {
            if scanner.in_plain_text() {
                let ahead = &rest[consumed..];
                if ahead.starts_with("&&") || ahead.starts_with("||") {
                    split_len = 2;
                    break;
                }
                if ahead.starts_with(';')
                    || ahead.starts_with('|')
                    || (split_single_amp && ahead.starts_with('&'))
                {
                    split_len = 1;
                    break;
                }
            }
            match scanner.step() {
                Some(bytes) => consumed += bytes,
                None => break,
            }
        }

        current.push_str(&rest[..consumed]);
        if split_len > 0 {
            push_trimmed(&mut commands, &current);
            current.clear();
            rest = &rest[consumed + split_len..];
        } else {
            rest = "";
        }
    }

    push_trimmed(&mut commands, &current);
    commands
}

fn push_trimmed(commands: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && !SEPARATORS.contains(&trimmed) {
        commands.push(trimmed.to_string());
    }
}

/// Extract every executable command, including substitution bodies
///
/// Substitution bodies come first (recursively decomposed), followed by the
/// top-level commands with substitutions stripped out. Order within each
/// group follows the source text.
pub fn extract_all_commands(command: &str) -> Vec<String> {
    let mut commands = Vec::new();
    for body in extract_substitution_bodies(command) {
        commands.extend(extract_all_commands(&body));
    }
    let residue = strip_substitutions(command);
    commands.extend(split_with(&residue, true));
    commands
}

/// Top-level `$(...)` and backtick bodies, in source order
fn extract_substitution_bodies(command: &str) -> Vec<String> {
    let mut bodies = Vec::new();
    let mut chars = command.char_indices().peekable();
    let mut in_single = false;

    while let Some((i, ch)) = chars.next() {
        match ch {
            '\'' => in_single = !in_single,
            '$' if !in_single && command[i + 1..].starts_with('(') => {
                chars.next();
                let body_start = i + 2;
                let mut depth = 1u32;
                let mut body_end = command.len();
                for (j, cj) in chars.by_ref() {
                    match cj {
                        '(' => depth += 1,
                        ')' => {
                            depth -= 1;
                            if depth == 0 {
                                body_end = j;
                                break;
                            }
                        }
                        _ => {}
                    }
                }
                let body = command[body_start..body_end].trim();
                if !body.is_empty() {
                    bodies.push(body.to_string());
                }
            }
            '`' if !in_single => {
                let body_start = i + ch.len_utf8();
                let mut body_end = command.len();
                for (j, cj) in chars.by_ref() {
                    if cj == '`' {
                        body_end = j;
                        break;
                    }
                }
                let body = command[body_start..body_end].trim();
                if !body.is_empty() {
                    bodies.push(body.to_string());
                }
            }
            _ => {}
        }
    }
    bodies
}

/// Replace substitutions with a placeholder so the residue splits cleanly
fn strip_substitutions(command: &str) -> String {
    let mut result = String::with_capacity(command.len());
    let mut chars = command.char_indices().peekable();
    let mut in_single = false;

    while let Some((i, ch)) = chars.next() {
        match ch {
            '\'' => {
                in_single = !in_single;
                result.push(ch);
            }
            '$' if !in_single && command[i + 1..].starts_with('(') => {
                chars.next();
                let mut depth = 1u32;
                for (_, cj) in chars.by_ref() {
                    match cj {
                        '(' => depth += 1,
                        ')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                }
                result.push_str("__SUBST__");
            }
            '`' if !in_single => {
                for (_, cj) in chars.by_ref() {
                    if cj == '`' {
                        break;
                    }
                }
                result.push_str("__SUBST__");
            }
            _ => result.push(ch),
        }
    }
    result
}

static CD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*cd\s+(?:-[LP]\s+)?(.+)$").expect("valid cd regex"));

/// Extract the target directory of a `cd` command, unquoted
///
/// Recognises `cd TARGET`, `cd -L TARGET`, `cd -P TARGET`. Returns `None`
/// for anything that is not a cd command.
pub fn extract_cd_target(command: &str) -> Option<String> {
    let captures = CD_RE.captures(command.trim())?;
    let target = captures.get(1)?.as_str().trim();
    if target.is_empty() {
        return None;
    }
    Some(unquote(target))
}

/// Strip one layer of matching surrounding quotes and unescape spaces
pub fn unquote(token: &str) -> String {
    let stripped = if token.len() >= 2
        && ((token.starts_with('"') && token.ends_with('"'))
            || (token.starts_with('\'') && token.ends_with('\'')))
    {
        &token[1..token.len() - 1]
    } else {
        token
    };
    stripped.replace("\\ ", " ")
}

/// True when a token contains a shell variable reference
///
/// Detects `$VAR`, `${VAR}`, and `~`/`~user` prefixes. Variables are never
/// expanded; a reference alone marks the token as potentially dangerous.
pub fn contains_variable_reference(token: &str) -> bool {
    token.contains('$') || token.starts_with('~')
}

static QUOTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["']([^"']+)["']"#).expect("valid quoted-token regex"));

/// Extract path-like tokens from a command string
///
/// Quoted tokens count when they contain `/` or `.`; unquoted tokens count
/// when they contain `/` or start with `~` or `.`. Flags and chain operators
/// are skipped.
pub fn extract_paths_from_command(command: &str) -> Vec<String> {
    let mut paths = Vec::new();

    for captures in QUOTED_RE.captures_iter(command) {
        let token = &captures[1];
        if token.contains('/') || token.contains('.') || token.contains('~') {
            paths.push(token.to_string());
        }
    }

    let unquoted = QUOTED_RE.replace_all(command, "");
    for token in unquoted.split_whitespace() {
        if token.starts_with('-') || SEPARATORS.contains(&token) {
            continue;
        }
        if token.contains('/') || token.starts_with('~') || token.starts_with('.') {
            paths.push(token.to_string());
        }
    }

    paths
}
