//! Renderer-safe identifiers for node names.

use std::collections::{HashMap, HashSet};

const FILLER: char = '_';

/// Replace every non-alphanumeric character with `_` and guard a leading digit.
pub fn sanitize(name: &str) -> String {
    let mut id: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { FILLER })
        .collect();

    if id.is_empty() {
        id.push(FILLER);
    } else if id.starts_with(|c: char| c.is_ascii_digit()) {
        id.insert(0, FILLER);
    }
    id
}

/// Name -> identifier table for one render run.
///
/// Names colliding on the same sanitized base get `_1`, `_2`, ... in first-seen
/// order. Once assigned, a name keeps its identifier for the table's lifetime.
#[derive(Debug, Default)]
pub struct IdentityTable {
    assigned: HashMap<String, String>,
    next_suffix: HashMap<String, usize>,
    taken: HashSet<String>,
}

impl IdentityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identifier(&mut self, name: &str) -> String {
        if let Some(id) = self.assigned.get(name) {
            return id.clone();
        }

        let base = sanitize(name);
        let id = if self.taken.contains(&base) {
            let counter = self.next_suffix.entry(base.clone()).or_insert(1);
            loop {
                let candidate = format!("{}_{}", base, counter);
                *counter += 1;
                if !self.taken.contains(&candidate) {
                    break candidate;
                }
            }
        } else {
            base
        };

        self.taken.insert(id.clone());
        self.assigned.insert(name.to_string(), id.clone());
        id
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}
