// no_std support
#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
use std::collections::HashMap;

#[cfg(not(feature = "std"))]
use alloc::{
    format,
    string::{String, ToString},
    vec,
    vec::Vec,
};
#[cfg(not(feature = "std"))]
use hashbrown::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::pattern::{split_words, strip_ending, variability, IdNum, WordPattern, WordSeg};

/// A per-token abstraction: identifiers stand for whole whitespace-separated
/// tokens. Output slots may concatenate several identifiers, encoding words
/// glued together from input tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WordRule {
    pub input: WordPattern,
    pub output: WordPattern,
}

impl WordRule {
    /// Match a sentence, binding identifiers to whole tokens.
    pub fn matches(&self, input: &str) -> Option<HashMap<IdNum, String>> {
        let words = split_words(input);
        if words.len() != self.input.words.len() {
            return None;
        }
        let mut bind: HashMap<IdNum, String> = HashMap::new();
        for (slot, w) in self.input.words.iter().zip(words.iter()) {
            // Input-side slots are single segments by construction.
            match slot.first()? {
                WordSeg::Lit(l) => {
                    if l.as_str() != *w {
                        return None;
                    }
                }
                WordSeg::Id(n) => match bind.get(n) {
                    Some(b) if b.as_str() != *w => return None,
                    Some(_) => {}
                    None => {
                        bind.insert(*n, (*w).to_string());
                    }
                },
            }
        }
        Some(bind)
    }

    /// Substitute bound tokens into the output pattern.
    pub fn apply(&self, bind: &HashMap<IdNum, String>) -> Option<String> {
        let mut out = String::new();
        for (i, slot) in self.output.words.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            for seg in slot {
                match seg {
                    WordSeg::Lit(s) => out.push_str(s),
                    WordSeg::Id(n) => out.push_str(bind.get(n)?),
                }
            }
        }
        Some(out)
    }

    pub fn id_count(&self) -> usize {
        self.input.id_count()
    }
}

/// Abstract a word-level rule from two rewarded witnesses. Same admission
/// rules as the character-level abstraction, but tokens bind whole words.
pub fn abstract_word_rule(
    i1: &str,
    o1: &str,
    i2: &str,
    o2: &str,
    ending: Option<char>,
) -> Option<WordRule> {
    let i1 = strip_ending(i1, ending);
    let i2 = strip_ending(i2, ending);
    let o1 = strip_ending(o1, ending);
    let o2 = strip_ending(o2, ending);

    let i1w = split_words(i1);
    let i2w = split_words(i2);
    let o1w = split_words(o1);
    let o2w = split_words(o2);

    if i1w.len() < 2 || i2w.len() < 2 {
        return None;
    }
    if i1.chars().count() < 3 || i2.chars().count() < 3 {
        return None;
    }
    if o1w.is_empty() || o1w.len() != o2w.len() {
        return None;
    }

    let var = variability(&i1w, &i2w)?;
    if var.iter().all(|v| !v) {
        return None;
    }

    let a = abstract_repeated_elements(&i1w, &o1w, &var)?;
    let b = abstract_repeated_elements(&i2w, &o2w, &var)?;
    validate_equivalent_patterns(a, b, (i2, o2), (i1, o1))
}

/// Build one candidate from a single witness.
///
/// Output tokens found verbatim among variable input tokens get an
/// identifier; tokens that decompose into a concatenation of input tokens
/// become a run of identifiers; anything else stays literal. Leftover
/// variable input tokens get identifiers at the end.
fn abstract_repeated_elements(
    inw: &[&str],
    outw: &[&str],
    var: &[bool],
) -> Option<WordRule> {
    let mut word_to_id: HashMap<String, IdNum> = HashMap::new();
    let mut next: IdNum = 1;
    let mut in_pat: Vec<Vec<WordSeg>> = inw
        .iter()
        .map(|w| vec![WordSeg::Lit((*w).to_string())])
        .collect();
    let mut out_pat: Vec<Vec<WordSeg>> = outw
        .iter()
        .map(|w| vec![WordSeg::Lit((*w).to_string())])
        .collect();

    let variable_tokens: Vec<String> = inw
        .iter()
        .enumerate()
        .filter(|(i, _)| var[*i])
        .map(|(_, w)| (*w).to_string())
        .collect();

    for o in 0..outw.len() {
        let tok = outw[o];

        if variable_tokens.iter().any(|v| v.as_str() == tok) {
            let id = assign(&mut word_to_id, &mut next, tok);
            replace_input_occurrences(&mut in_pat, inw, var, tok, id);
            out_pat[o] = vec![WordSeg::Id(id)];
            continue;
        }

        if let Some(parts) = find_sub_words(tok, &variable_tokens) {
            let mut slot: Vec<WordSeg> = Vec::with_capacity(parts.len());
            for part in &parts {
                let id = assign(&mut word_to_id, &mut next, part);
                replace_input_occurrences(&mut in_pat, inw, var, part, id);
                slot.push(WordSeg::Id(id));
            }
            out_pat[o] = slot;
        }
        // Otherwise the token stays literal.
    }

    for (i, w) in inw.iter().enumerate() {
        if !var[i] {
            continue;
        }
        if matches!(in_pat[i].first(), Some(WordSeg::Lit(_))) {
            let id = assign(&mut word_to_id, &mut next, w);
            in_pat[i] = vec![WordSeg::Id(id)];
        }
    }

    Some(WordRule {
        input: WordPattern { words: in_pat },
        output: WordPattern { words: out_pat },
    })
}

fn assign(map: &mut HashMap<String, IdNum>, next: &mut IdNum, word: &str) -> IdNum {
    if let Some(id) = map.get(word) {
        return *id;
    }
    let id = *next;
    *next += 1;
    map.insert(word.to_string(), id);
    id
}

fn replace_input_occurrences(
    in_pat: &mut [Vec<WordSeg>],
    inw: &[&str],
    var: &[bool],
    word: &str,
    id: IdNum,
) {
    for (i, w) in inw.iter().enumerate() {
        if var[i] && *w == word {
            in_pat[i] = vec![WordSeg::Id(id)];
        }
    }
}

/// Decompose `target` into a concatenation of at least two candidate tokens.
fn find_sub_words(target: &str, candidates: &[String]) -> Option<Vec<String>> {
    fn rec(target: &str, candidates: &[String]) -> Option<Vec<String>> {
        if target.is_empty() {
            return Some(Vec::new());
        }
        for c in candidates {
            if c.is_empty() {
                continue;
            }
            if let Some(rest) = target.strip_prefix(c.as_str()) {
                if let Some(mut tail) = rec(rest, candidates) {
                    tail.insert(0, c.clone());
                    return Some(tail);
                }
            }
        }
        None
    }
    let parts = rec(target, candidates)?;
    if parts.len() < 2 {
        return None;
    }
    Some(parts)
}

fn validate_equivalent_patterns(
    a: WordRule,
    b: WordRule,
    other_of_a: (&str, &str),
    other_of_b: (&str, &str),
) -> Option<WordRule> {
    if a == b {
        return Some(a);
    }
    let a_covers = rule_reproduces(&a, other_of_a.0, other_of_a.1);
    let b_covers = rule_reproduces(&b, other_of_b.0, other_of_b.1);
    match (a_covers, b_covers) {
        (true, true) => {
            if b.id_count() > a.id_count() {
                Some(b)
            } else {
                Some(a)
            }
        }
        (true, false) => Some(a),
        (false, true) => Some(b),
        (false, false) => None,
    }
}

fn rule_reproduces(rule: &WordRule, input: &str, output: &str) -> bool {
    let expect = split_words(output).join(" ");
    rule.matches(input)
        .and_then(|bind| rule.apply(&bind))
        .map(|got| got == expect)
        .unwrap_or(false)
}

/// Flat store of word-generic rules; insertion order decides application.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WordRuleStore {
    rules: Vec<WordRule>,
}

impl WordRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, rule: WordRule) -> bool {
        if self.rules.contains(&rule) {
            return false;
        }
        self.rules.push(rule);
        true
    }

    pub fn remove(&mut self, idx: usize) -> Option<WordRule> {
        if idx < self.rules.len() {
            Some(self.rules.remove(idx))
        } else {
            None
        }
    }

    pub fn rules(&self) -> &[WordRule] {
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
            if let Some(bind) = rule.matches(input) {
                if let Some(out) = rule.apply(&bind) {
                    return Some((out, i));
                }
            }
        }
        None
    }

    pub fn apply_compound_matching_rule(&self, input: &str) -> Option<(String, usize)> {
        let words = split_words(input);
        if words.len() < 2 {
            return None;
        }
        self.compound(&words, 16)
    }

    fn compound(&self, words: &[&str], depth: usize) -> Option<(String, usize)> {
        if depth == 0 || words.is_empty() {
            return None;
        }
        for (i, rule) in self.rules.iter().enumerate() {
            let n = rule.input.words.len();
            if n > words.len() {
                continue;
            }
            let prefix = words[..n].join(" ");
            let out = match rule.matches(&prefix).and_then(|b| rule.apply(&b)) {
                Some(o) => o,
                None => continue,
            };
            let rest = &words[n..];
            if rest.is_empty() {
                return Some((out, i));
            }
            if let Some((tail, _)) = self.compound(rest, depth - 1) {
                return Some((format!("{out} {tail}"), i));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abstracts_token_echo() {
        let rule = abstract_word_rule("say cat", "cat", "say dog", "dog", None).unwrap();
        let bind = rule.matches("say cow").unwrap();
        assert_eq!(rule.apply(&bind).unwrap(), "cow");
    }

    #[test]
    fn abstracts_token_swap() {
        let rule =
            abstract_word_rule("one two", "two one", "red blue", "blue red", None).unwrap();
        let bind = rule.matches("left right").unwrap();
        assert_eq!(rule.apply(&bind).unwrap(), "right left");
    }

    #[test]
    fn compound_output_decomposes_into_input_tokens() {
        let rule =
            abstract_word_rule("foo bar", "foobar", "baz qux", "bazqux", None).unwrap();
        let bind = rule.matches("one two").unwrap();
        assert_eq!(rule.apply(&bind).unwrap(), "onetwo");
    }

    #[test]
    fn abstraction_reproduces_both_witnesses() {
        let rule =
            abstract_word_rule("foo bar", "foobar", "baz qux", "bazqux", None).unwrap();
        for (i, o) in [("foo bar", "foobar"), ("baz qux", "bazqux")] {
            let bind = rule.matches(i).unwrap();
            assert_eq!(rule.apply(&bind).unwrap(), o, "witness {i}");
        }
    }

    #[test]
    fn output_ids_are_subset_of_input_ids() {
        let rule =
            abstract_word_rule("a1 b2", "a1b2", "c3 d4", "c3d4", None).unwrap();
        let in_ids = rule.input.ids();
        for id in rule.output.ids() {
            assert!(in_ids.contains(&id));
        }
    }

    #[test]
    fn identical_witnesses_produce_no_rule() {
        assert!(abstract_word_rule("say cat", "cat", "say cat", "cat", None).is_none());
    }

    #[test]
    fn constant_output_word_stays_literal() {
        let rule = abstract_word_rule(
            "greet alice",
            "hi alice",
            "greet bob",
            "hi bob",
            None,
        )
        .unwrap();
        let bind = rule.matches("greet carol").unwrap();
        assert_eq!(rule.apply(&bind).unwrap(), "hi carol");
    }

    #[test]
    fn compound_store_application_recurses_over_remainder() {
        let mut store = WordRuleStore::new();
        store.add(abstract_word_rule("say cat", "cat", "say dog", "dog", None).unwrap());
        let (out, _) = store
            .apply_compound_matching_rule("say one say two")
            .unwrap();
        assert_eq!(out, "one two");
    }

    #[test]
    fn find_sub_words_needs_at_least_two_parts() {
        let cands = vec!["foo".to_string(), "bar".to_string()];
        assert_eq!(
            find_sub_words("foobar", &cands),
            Some(vec!["foo".to_string(), "bar".to_string()])
        );
        assert_eq!(find_sub_words("foo", &cands), None);
        assert_eq!(find_sub_words("fooqux", &cands), None);
    }
}
