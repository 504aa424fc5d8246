//! Ticket scanning helpers.
//!
//! The external discovery collaborator hands the board raw subject/body
//! text; this module pulls ticket keys out of that text and derives a
//! presentable task title from a mail subject line.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Default pattern for ticket keys (`ABC-123` style)
pub const DEFAULT_TICKET_PATTERN: &str = r"\b[A-Z][A-Z0-9]+-\d+\b";

/// Compiled ticket-key matcher
#[derive(Debug, Clone)]
pub struct TicketPattern {
    regex: Regex,
}

impl TicketPattern {
    /// Compile a ticket pattern, rejecting invalid regexes
    pub fn new(pattern: &str) -> Result<Self> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidConfig(
                "ticket pattern cannot be empty".to_string(),
            ));
        }
        let regex = Regex::new(trimmed).map_err(|err| {
            Error::InvalidConfig(format!("invalid ticket pattern '{trimmed}': {err}"))
        })?;
        Ok(Self { regex })
    }

    /// Extract ticket keys from text, deduplicated in first-seen order
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut tickets = Vec::new();
        for found in self.regex.find_iter(text) {
            let ticket = found.as_str().to_string();
            if seen.insert(ticket.clone()) {
                tickets.push(ticket);
            }
        }
        tickets
    }
}

impl Default for TicketPattern {
    fn default() -> Self {
        Self::new(DEFAULT_TICKET_PATTERN).expect("default ticket pattern compiles")
    }
}

/// Derive a task title from a mail subject line.
///
/// Strips leading reply/forward markers and bracketed list tags
/// (`Re:`, `Fwd:`, `[jira]`, ...) and trims whitespace. Returns an empty
/// string when nothing is left; callers fall back to the ticket key.
pub fn candidate_title(subject: &str) -> String {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    let prefix = PREFIX
        .get_or_init(|| Regex::new(r"(?i)^(re:|fwd?:|\[[^\]]*\])\s*").expect("prefix regex"));

    let mut title = subject.trim();
    loop {
        match prefix.find(title) {
            Some(found) if found.start() == 0 => {
                title = title[found.end()..].trim_start();
            }
            _ => break,
        }
    }
    title.trim().to_string()
}
