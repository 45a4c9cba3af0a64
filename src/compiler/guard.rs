//! Cycle bookkeeping for symbol resolution within one `compile` call.
use std::collections::HashSet;

/// Tracks which identifiers are currently being resolved.
///
/// An identifier entered while still in progress is a circular definition; it is
/// then confirmed, and confirmed identifiers stay confirmed until `clear`.
#[derive(Debug, Default, Clone)]
pub struct CycleGuard {
    in_progress: HashSet<String>,
    confirmed: HashSet<String>,
}

impl CycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_progress(&self, id: &str) -> bool {
        self.in_progress.contains(id)
    }

    /// Marks `id` as being resolved. Returns `false` if it already was.
    pub fn enter(&mut self, id: &str) -> bool {
        self.in_progress.insert(id.to_string())
    }

    pub fn leave(&mut self, id: &str) {
        self.in_progress.remove(id);
    }

    pub fn confirm(&mut self, id: &str) {
        self.confirmed.insert(id.to_string());
    }

    pub fn is_confirmed(&self, id: &str) -> bool {
        self.confirmed.contains(id)
    }

    /// Identifiers found on a cycle so far, sorted.
    pub fn confirmed(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.confirmed.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn clear(&mut self) {
        self.in_progress.clear();
        self.confirmed.clear();
    }
}
