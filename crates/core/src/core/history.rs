// no_std support
#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(not(feature = "std"))]
use alloc::{
    string::{String, ToString},
    vec::Vec,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Bounded circular log of recently rewarded `(input, output)` pairs.
///
/// Every new success is abstracted against each logged pair, so the log is
/// the second witness for all generic-rule induction. On overflow the oldest
/// entry is overwritten.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SuccessLog {
    entries: Vec<(String, String)>,
    head: usize,
    cap: usize,
}

impl SuccessLog {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: Vec::new(),
            head: 0,
            cap: cap.max(1),
        }
    }

    /// Append a pair unless the identical pair is already logged.
    pub fn push(&mut self, input: &str, output: &str) {
        if self
            .entries
            .iter()
            .any(|(i, o)| i == input && o == output)
        {
            return;
        }
        if self.entries.len() < self.cap {
            self.entries.push((input.to_string(), output.to_string()));
        } else {
            self.entries[self.head] = (input.to_string(), output.to_string());
            self.head = (self.head + 1) % self.cap;
        }
    }

    /// Most recently appended pair.
    pub fn last(&self) -> Option<(&str, &str)> {
        if self.entries.is_empty() {
            return None;
        }
        let idx = if self.entries.len() < self.cap {
            self.entries.len() - 1
        } else {
            (self.head + self.cap - 1) % self.cap
        };
        self.entries
            .get(idx)
            .map(|(i, o)| (i.as_str(), o.as_str()))
    }

    /// Logged input closest to `input` by token overlap, with its output.
    /// Returns `None` when nothing overlaps at all.
    pub fn closest(&self, input: &str) -> Option<(&str, &str)> {
        let query: Vec<&str> = input.split_whitespace().collect();
        if query.is_empty() {
            return None;
        }
        let mut best: Option<(usize, &(String, String))> = None;
        for e in &self.entries {
            let words: Vec<&str> = e.0.split_whitespace().collect();
            let score = query.iter().filter(|q| words.contains(q)).count();
            if score == 0 {
                continue;
            }
            match best {
                Some((b, _)) if b >= score => {}
                _ => best = Some((score, e)),
            }
        }
        best.map(|(_, e)| (e.0.as_str(), e.1.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(i, o)| (i.as_str(), o.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
