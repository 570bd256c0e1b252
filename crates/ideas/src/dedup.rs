//! Title-based duplicate filter.
//!
//! An idea's fingerprint is the SHA-256 of its trimmed, lowercased display
//! title, so `{"title": "  My Idea  "}`, `{"summary": "my idea"}` and
//! `"MY IDEA"` all collide.

use std::collections::HashSet;

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::display_title;

/// Hex SHA-256 of the normalized display title.
pub fn fingerprint(idea: &Value) -> String {
    let normalized = display_title(idea).trim().to_lowercase();
    hex::encode(Sha256::digest(normalized.as_bytes()))
}

/// The seen-idea index. One per pipeline run; never shared.
#[derive(Debug, Default)]
pub struct DedupChecker {
    seen: HashSet<String>,
}

impl DedupChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_duplicate(&self, idea: &Value) -> bool {
        self.seen.contains(&fingerprint(idea))
    }

    /// Record `idea`. Returns `false` if it was already known.
    pub fn add(&mut self, idea: &Value) -> bool {
        self.seen.insert(fingerprint(idea))
    }

    /// Keep the first occurrence of each title, in input order.
    pub fn filter(&mut self, ideas: Vec<Value>) -> Vec<Value> {
        let before = ideas.len();
        let kept: Vec<Value> = ideas.into_iter().filter(|idea| self.add(idea)).collect();
        debug!(before, after = kept.len(), "Deduplicated ideas");
        kept
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
