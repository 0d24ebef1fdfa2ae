// no_std support
#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use alloc::string::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::charrule::CharRule;
use crate::pattern::{split_words, strip_ending, CharPattern, CharTok, IdNum};

/// A family of char-generic rules parametrised by the length of the variable
/// identifier word.
///
/// Applying the family to an input whose variable word carries `k`
/// characters expands the base rule `k - base_len` times, each step
/// appending one identifier to the variable input word and wrapping the
/// output in the grow affixes (with a fresh identifier substituted for the
/// grow identifier).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SizeRule {
    base: CharRule,
    var_word: usize,
    grow_input_right: bool,
    /// Flat output affixes; spaces are literal tokens.
    grow_left: Vec<CharTok>,
    grow_right: Vec<CharTok>,
    grow_id: IdNum,
    /// Output word the affixes wrap (the 1-to-1 shape), or the whole output
    /// (the 1-to-N shape).
    out_site: Option<usize>,
    ending: Option<char>,
}

impl SizeRule {
    pub fn base(&self) -> &CharRule {
        &self.base
    }

    /// Expand the family for a variable word of `k` identifiers.
    pub fn expand(&self, k: usize) -> CharRule {
        let mut rule = self.base.clone();
        let base_len = rule.input.words[self.var_word].len();
        if k <= base_len {
            return rule;
        }
        let mut next_id: IdNum = rule
            .input
            .ids()
            .into_iter()
            .max()
            .unwrap_or(0)
            .saturating_add(1);

        for _ in 0..(k - base_len) {
            let nid = next_id;
            next_id = next_id.saturating_add(1);

            let w = &mut rule.input.words[self.var_word];
            if self.grow_input_right {
                w.push(CharTok::Id(nid));
            } else {
                w.insert(0, CharTok::Id(nid));
            }

            let gl = substitute(&self.grow_left, self.grow_id, nid);
            let gr = substitute(&self.grow_right, self.grow_id, nid);
            match self.out_site {
                Some(oi) => {
                    let mut word = gl;
                    word.extend_from_slice(&rule.output.words[oi]);
                    word.extend_from_slice(&gr);
                    rule.output.words[oi] = word;
                }
                None => {
                    let mut flat = gl;
                    flat.extend(flatten(&rule.output));
                    flat.extend_from_slice(&gr);
                    rule.output = unflatten(&flat);
                }
            }
        }
        rule
    }

    /// Apply the family to an input, expanding to the observed identifier
    /// count first.
    pub fn apply(&self, input: &str) -> Option<String> {
        let stripped = strip_ending(input, self.ending);
        let words = split_words(stripped);
        if words.len() != self.base.input.words.len() {
            return None;
        }
        let k = words[self.var_word].chars().count();
        let base_len = self.base.input.words[self.var_word].len();
        if k <= base_len {
            return None;
        }
        let expanded = self.expand(k);
        let bind = expanded.matches(stripped)?;
        expanded.apply(&bind)
    }
}

fn substitute(toks: &[CharTok], from: IdNum, to: IdNum) -> Vec<CharTok> {
    toks.iter()
        .map(|t| match t {
            CharTok::Id(n) if *n == from => CharTok::Id(to),
            other => other.clone(),
        })
        .collect()
}

fn flatten(p: &CharPattern) -> Vec<CharTok> {
    let mut out = Vec::new();
    for (i, w) in p.words.iter().enumerate() {
        if i > 0 {
            out.push(CharTok::Lit(' '));
        }
        out.extend_from_slice(w);
    }
    out
}

fn unflatten(flat: &[CharTok]) -> CharPattern {
    let mut words: Vec<Vec<CharTok>> = Vec::new();
    let mut cur: Vec<CharTok> = Vec::new();
    for t in flat {
        if *t == CharTok::Lit(' ') {
            if !cur.is_empty() {
                words.push(core::mem::take(&mut cur));
            }
        } else {
            cur.push(t.clone());
        }
    }
    if !cur.is_empty() {
        words.push(cur);
    }
    CharPattern { words }
}

/// Generalize two char-generic rules over the length of their variable
/// identifier word.
///
/// The inputs must differ in exactly one all-identifier word, by exactly one
/// extra identifier. Output containment is tried word against word first
/// (the 1-to-1 shape) and then over the whole flattened outputs (1-to-N).
pub fn abstract_size_rule(
    smaller: &CharRule,
    larger: &CharRule,
    ending: Option<char>,
) -> Option<SizeRule> {
    if smaller.input.words.len() != larger.input.words.len() {
        return None;
    }
    let diffs: Vec<usize> = (0..smaller.input.words.len())
        .filter(|&i| smaller.input.words[i] != larger.input.words[i])
        .collect();
    if diffs.len() != 1 {
        return None;
    }
    let d = diffs[0];
    let sw = &smaller.input.words[d];
    let lw = &larger.input.words[d];
    if !CharPattern::word_is_all_ids(sw) || !CharPattern::word_is_all_ids(lw) {
        return None;
    }
    if lw.len() != sw.len() + 1 {
        return None;
    }

    let s_ids: Vec<IdNum> = sw
        .iter()
        .filter_map(|t| match t {
            CharTok::Id(n) => Some(*n),
            CharTok::Lit(_) => None,
        })
        .collect();
    let new_ids: Vec<IdNum> = lw
        .iter()
        .filter_map(|t| match t {
            CharTok::Id(n) if !s_ids.contains(n) => Some(*n),
            _ => None,
        })
        .collect();
    if new_ids.len() != 1 {
        return None;
    }
    let grow_id = new_ids[0];

    let grow_input_right = lw[..sw.len()] == sw[..] && lw[sw.len()] == CharTok::Id(grow_id);
    let grow_input_left = lw[1..] == sw[..] && lw[0] == CharTok::Id(grow_id);
    if !grow_input_right && !grow_input_left {
        return None;
    }

    // 1-to-1: exactly one output word differs and the smaller word sits
    // contiguously inside the larger one.
    if smaller.output.words.len() == larger.output.words.len() {
        let odiffs: Vec<usize> = (0..smaller.output.words.len())
            .filter(|&i| smaller.output.words[i] != larger.output.words[i])
            .collect();
        if odiffs.len() == 1 {
            let oi = odiffs[0];
            if let Some((gl, gr)) =
                split_around(&larger.output.words[oi], &smaller.output.words[oi])
            {
                if contains_id(&gl, grow_id) || contains_id(&gr, grow_id) {
                    return Some(SizeRule {
                        base: smaller.clone(),
                        var_word: d,
                        grow_input_right,
                        grow_left: gl,
                        grow_right: gr,
                        grow_id,
                        out_site: Some(oi),
                        ending,
                    });
                }
            }
        }
    }

    // 1-to-N: outputs treated as whole strings.
    let sflat = flatten(&smaller.output);
    let lflat = flatten(&larger.output);
    if let Some((gl, gr)) = split_around(&lflat, &sflat) {
        if contains_id(&gl, grow_id) || contains_id(&gr, grow_id) {
            return Some(SizeRule {
                base: smaller.clone(),
                var_word: d,
                grow_input_right,
                grow_left: gl,
                grow_right: gr,
                grow_id,
                out_site: None,
                ending,
            });
        }
    }
    None
}

/// Find `needle` as a contiguous slice of `hay` and return what surrounds it.
fn split_around(hay: &[CharTok], needle: &[CharTok]) -> Option<(Vec<CharTok>, Vec<CharTok>)> {
    if needle.is_empty() || needle.len() > hay.len() {
        return None;
    }
    for start in 0..=(hay.len() - needle.len()) {
        if &hay[start..start + needle.len()] == needle {
            return Some((hay[..start].to_vec(), hay[start + needle.len()..].to_vec()));
        }
    }
    None
}

fn contains_id(toks: &[CharTok], id: IdNum) -> bool {
    toks.iter().any(|t| *t == CharTok::Id(id))
}

/// Flat store of size rules; insertion order decides application.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SizeRuleStore {
    rules: Vec<SizeRule>,
}

impl SizeRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, rule: SizeRule) -> bool {
        if self.rules.contains(&rule) {
            return false;
        }
        self.rules.push(rule);
        true
    }

    pub fn remove(&mut self, idx: usize) -> Option<SizeRule> {
        if idx < self.rules.len() {
            Some(self.rules.remove(idx))
        } else {
            None
        }
    }

    /// Drop every family derived from `base`; used when the char rule it
    /// came from is deleted.
    pub fn remove_with_base(&mut self, base: &CharRule) {
        self.rules.retain(|r| r.base != *base);
    }

    pub fn rules(&self) -> &[SizeRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn apply_matching_rule(&self, input: &str) -> Option<(String, usize)> {
        for (i, rule) in self.rules.iter().enumerate() {
            if let Some(out) = rule.apply(input) {
                return Some((out, i));
            }
        }
        None
    }
}
