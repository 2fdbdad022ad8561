//! Text-only message filtering.
//!
//! A post is eligible for relay only when it is plain text: non-empty, free
//! of links and carrying no media of any kind. Optional regex block patterns
//! from the config are applied on top.

use std::fmt;

use fancy_regex::Regex;
use tracing::warn;

use crate::common::messages::ChannelPost;
use crate::common::types::MediaKind;

/// Prefixes that mark a link when followed by at least one non-space character.
const LINK_PREFIXES: [&str; 3] = ["http://", "https://", "www."];

/// Why a post was not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NoText,
    ContainsLink,
    HasMedia(MediaKind),
    Blocked(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NoText => write!(f, "no text"),
            Rejection::ContainsLink => write!(f, "contains a link"),
            Rejection::HasMedia(kind) => write!(f, "has {} attached", kind),
            Rejection::Blocked(pattern) => write!(f, "matches block pattern '{}'", pattern),
        }
    }
}

/// Message filter that decides whether a channel post may be copied.
#[derive(Debug, Clone)]
pub struct MessageFilter {
    /// Extra patterns; a match blocks the post.
    block_patterns: Vec<CompiledPattern>,
}

/// A compiled regex pattern with its original string for debugging.
#[derive(Debug, Clone)]
struct CompiledPattern {
    original: String,
    regex: Regex,
}

impl MessageFilter {
    /// Create a filter with extra block patterns.
    ///
    /// Invalid regex patterns are logged and skipped.
    pub fn new(block_patterns: Option<Vec<String>>) -> Self {
        Self {
            block_patterns: compile_patterns(block_patterns.unwrap_or_default()),
        }
    }

    /// Check a post, returning the first reason it is rejected.
    pub fn check(&self, post: &ChannelPost) -> Result<(), Rejection> {
        if let Some(kind) = post.media {
            return Err(Rejection::HasMedia(kind));
        }

        let text = match post.text.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Err(Rejection::NoText),
        };

        if contains_link(text) {
            return Err(Rejection::ContainsLink);
        }

        if let Some(pattern) = self.blocking_pattern(text) {
            return Err(Rejection::Blocked(pattern.to_string()));
        }

        Ok(())
    }

    /// Returns true if the filter has any extra patterns configured.
    pub fn has_patterns(&self) -> bool {
        !self.block_patterns.is_empty()
    }

    fn blocking_pattern(&self, text: &str) -> Option<&str> {
        self.block_patterns
            .iter()
            .find(|p| {
                p.regex.is_match(text).unwrap_or_else(|e| {
                    warn!("Regex match error for pattern '{}': {}", p.original, e);
                    false
                })
            })
            .map(|p| p.original.as_str())
    }
}

/// Case-insensitive search for `http://`, `https://` or `www.` followed by a
/// non-whitespace character.
pub fn contains_link(text: &str) -> bool {
    let lowered = text.to_ascii_lowercase();
    LINK_PREFIXES.iter().any(|prefix| {
        lowered.match_indices(prefix).any(|(start, _)| {
            lowered[start + prefix.len()..]
                .chars()
                .next()
                .is_some_and(|c| !c.is_whitespace())
        })
    })
}

/// Compile a list of regex pattern strings, skipping invalid ones.
fn compile_patterns(patterns: Vec<String>) -> Vec<CompiledPattern> {
    patterns
        .into_iter()
        .filter_map(|pattern| match Regex::new(&pattern) {
            Ok(regex) => Some(CompiledPattern {
                original: pattern,
                regex,
            }),
            Err(e) => {
                warn!("Invalid filter regex pattern '{}': {}", pattern, e);
                None
            }
        })
        .collect()
}
