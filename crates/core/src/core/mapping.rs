// no_std support
#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
use std::collections::{BTreeMap, HashMap, HashSet};

#[cfg(not(feature = "std"))]
use alloc::{
    collections::BTreeMap,
    string::{String, ToString},
    vec::Vec,
};
#[cfg(not(feature = "std"))]
use hashbrown::{HashMap, HashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Exact rule for one input: its currently believed output and every output
/// the teacher has rejected for it.
///
/// `output` and `failed` are disjoint: a success removes the output from the
/// failed set, a failure clears the output.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MappingRule {
    output: String,
    failed: HashSet<String>,
}

impl MappingRule {
    pub fn output(&self) -> Option<&str> {
        if self.output.is_empty() {
            None
        } else {
            Some(&self.output)
        }
    }

    pub fn is_failed(&self, candidate: &str) -> bool {
        self.failed.contains(candidate)
    }

    pub fn failed_len(&self) -> usize {
        self.failed.len()
    }
}

/// Store of exact input-to-output rules, with an output frequency multiset
/// and the task-wide uniform output value.
///
/// `uniform` is visible exactly while every successful output so far has
/// been the same string; two distinct successful outputs clear it for good.
/// A failure matching the uniform value hides it without burning it, and
/// only a success with the same output makes it visible again.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MappingStore {
    rules: HashMap<String, MappingRule>,
    freq: BTreeMap<String, u32>,
    uniform: Option<String>,
    uniform_broken: bool,
    uniform_hidden: bool,
}

impl MappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rewarded `(input, output)` pair.
    pub fn successful(&mut self, input: &str, output: &str) {
        let rule = self.rules.entry(input.to_string()).or_default();

        if !rule.output.is_empty() && rule.output != output {
            decrement(&mut self.freq, &rule.output);
        }
        if rule.output != output {
            *self.freq.entry(output.to_string()).or_default() += 1;
        }
        rule.output = output.to_string();
        rule.failed.remove(output);

        if !self.uniform_broken {
            match &self.uniform {
                None => {
                    self.uniform = Some(output.to_string());
                    self.uniform_hidden = false;
                }
                Some(u) if u != output => {
                    self.uniform = None;
                    self.uniform_broken = true;
                }
                _ => self.uniform_hidden = false,
            }
        }
    }

    /// Record a punished `(input, output)` pair.
    pub fn failed(&mut self, input: &str, output: &str) {
        let rule = self.rules.entry(input.to_string()).or_default();

        if !rule.output.is_empty() {
            decrement(&mut self.freq, &rule.output);
            rule.output.clear();
        }
        rule.failed.insert(output.to_string());

        if self.uniform.as_deref() == Some(output) {
            self.uniform_hidden = true;
        }
    }

    /// The confirmed output for an input, if any.
    pub fn retrieve(&self, input: &str) -> Option<&str> {
        self.rules.get(input).and_then(|r| r.output())
    }

    pub fn rule(&self, input: &str) -> Option<&MappingRule> {
        self.rules.get(input)
    }

    /// True when `candidate` has been rejected for `input`.
    pub fn is_failed(&self, input: &str, candidate: &str) -> bool {
        self.rules
            .get(input)
            .map(|r| r.is_failed(candidate))
            .unwrap_or(false)
    }

    /// All current outputs by descending frequency; ties break
    /// lexicographically so the order is deterministic.
    pub fn outputs_by_freq(&self) -> Vec<(String, u32)> {
        let mut out: Vec<(String, u32)> =
            self.freq.iter().map(|(k, v)| (k.clone(), *v)).collect();
        out.sort_by(|a, b| b.1.cmp(&a.1));
        out
    }

    pub fn uniform_value(&self) -> Option<&str> {
        if self.uniform_hidden {
            None
        } else {
            self.uniform.as_deref()
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Sum of failed-set sizes plus live frequency counts; equals the number
    /// of distinct `(input, output)` outcomes ever recorded.
    pub fn outcome_count(&self) -> usize {
        let failed: usize = self.rules.values().map(|r| r.failed.len()).sum();
        let live: usize = self.freq.values().map(|v| *v as usize).sum();
        failed + live
    }
}

fn decrement(freq: &mut BTreeMap<String, u32>, key: &str) {
    if let Some(v) = freq.get_mut(key) {
        *v = v.saturating_sub(1);
        if *v == 0 {
            freq.remove(key);
        }
    }
}
