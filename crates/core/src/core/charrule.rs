// no_std support
#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
use std::collections::HashMap;

#[cfg(not(feature = "std"))]
use alloc::{format, string::String, vec::Vec};
#[cfg(not(feature = "std"))]
use hashbrown::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::pattern::{split_words, strip_ending, variability, CharPattern, CharTok, IdNum};

/// A per-character abstraction: identifiers stand for single characters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CharRule {
    pub input: CharPattern,
    pub output: CharPattern,
}

impl CharRule {
    /// Match a sentence against the input pattern, binding identifiers.
    ///
    /// Literal tokens must be equal; an identifier binds on first sight and
    /// must see the same character on every later sight.
    pub fn matches(&self, input: &str) -> Option<HashMap<IdNum, char>> {
        let words = split_words(input);
        if words.len() != self.input.words.len() {
            return None;
        }
        let mut bind: HashMap<IdNum, char> = HashMap::new();
        for (pw, w) in self.input.words.iter().zip(words.iter()) {
            let chars: Vec<char> = w.chars().collect();
            if chars.len() != pw.len() {
                return None;
            }
            for (t, &c) in pw.iter().zip(chars.iter()) {
                match t {
                    CharTok::Lit(l) => {
                        if *l != c {
                            return None;
                        }
                    }
                    CharTok::Id(n) => match bind.get(n) {
                        Some(b) if *b != c => return None,
                        Some(_) => {}
                        None => {
                            bind.insert(*n, c);
                        }
                    },
                }
            }
        }
        Some(bind)
    }

    /// Substitute bound characters into the output pattern.
    pub fn apply(&self, bind: &HashMap<IdNum, char>) -> Option<String> {
        let mut out = String::new();
        for (i, w) in self.output.words.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            for t in w {
                match t {
                    CharTok::Lit(c) => out.push(*c),
                    CharTok::Id(n) => out.push(*bind.get(n)?),
                }
            }
        }
        Some(out)
    }

    pub fn id_count(&self) -> usize {
        self.input.id_count()
    }
}

/// Abstract a rule from two rewarded witnesses.
///
/// Both sentences are stripped of the trailing ending first. The witnesses
/// must align word for word, contain whitespace and at least three
/// characters, and differ somewhere; otherwise no rule is produced.
pub fn abstract_generic_rule(
    i1: &str,
    o1: &str,
    i2: &str,
    o2: &str,
    ending: Option<char>,
) -> Option<CharRule> {
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

    let a = abstract_repeated_chars(&i1w, &o1w, &var);
    let b = abstract_repeated_chars(&i2w, &o2w, &var);
    validate_equivalent_patterns(a, b, (i2, o2), (i1, o1))
}

/// Build one candidate pattern pair from a single witness.
///
/// Output characters are scanned left to right; each character also present
/// in a variable input word gets a fresh identifier, replacing every
/// occurrence in both patterns at once. Variable-word characters never seen
/// in the output get identifiers at the end.
fn abstract_repeated_chars(inw: &[&str], outw: &[&str], var: &[bool]) -> CharRule {
    let mut in_pat: Vec<Vec<CharTok>> = inw
        .iter()
        .map(|w| w.chars().map(CharTok::Lit).collect())
        .collect();
    let mut out_pat: Vec<Vec<CharTok>> = outw
        .iter()
        .map(|w| w.chars().map(CharTok::Lit).collect())
        .collect();

    let mut assigned: HashMap<char, IdNum> = HashMap::new();
    let mut next: IdNum = 1;

    for w in 0..out_pat.len() {
        for p in 0..out_pat[w].len() {
            let c = match out_pat[w][p] {
                CharTok::Lit(c) => c,
                CharTok::Id(_) => continue,
            };
            if assigned.contains_key(&c) {
                continue;
            }
            let in_variable_word = in_pat.iter().enumerate().any(|(wi, word)| {
                var[wi] && word.iter().any(|t| *t == CharTok::Lit(c))
            });
            if !in_variable_word {
                continue;
            }
            let id = next;
            next += 1;
            assigned.insert(c, id);
            for (wi, word) in in_pat.iter_mut().enumerate() {
                if !var[wi] {
                    continue;
                }
                for t in word.iter_mut() {
                    if *t == CharTok::Lit(c) {
                        *t = CharTok::Id(id);
                    }
                }
            }
            for word in out_pat.iter_mut() {
                for t in word.iter_mut() {
                    if *t == CharTok::Lit(c) {
                        *t = CharTok::Id(id);
                    }
                }
            }
        }
    }

    for (wi, word) in in_pat.iter_mut().enumerate() {
        if !var[wi] {
            continue;
        }
        for t in word.iter_mut() {
            if let CharTok::Lit(c) = *t {
                let id = *assigned.entry(c).or_insert_with(|| {
                    let id = next;
                    next += 1;
                    id
                });
                *t = CharTok::Id(id);
            }
        }
    }

    CharRule {
        input: CharPattern { words: in_pat },
        output: CharPattern { words: out_pat },
    }
}

/// Cross-validate two single-witness candidates.
///
/// Equal candidates pass trivially. Otherwise at least one must generalize
/// the other witness (parse its literal input and yield its literal output);
/// when both do, the more specific one (greater identifier count) wins.
fn validate_equivalent_patterns(
    a: CharRule,
    b: CharRule,
    other_of_a: (&str, &str),
    other_of_b: (&str, &str),
) -> Option<CharRule> {
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

fn rule_reproduces(rule: &CharRule, input: &str, output: &str) -> bool {
    let expect = split_words(output).join(" ");
    rule.matches(input)
        .and_then(|bind| rule.apply(&bind))
        .map(|got| got == expect)
        .unwrap_or(false)
}

/// Flat store of char-generic rules. Insertion order is load-bearing:
/// application scans in order and returns the first hit.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CharRuleStore {
    rules: Vec<CharRule>,
}

impl CharRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule; duplicates are dropped.
    pub fn add(&mut self, rule: CharRule) -> bool {
        if self.rules.contains(&rule) {
            return false;
        }
        self.rules.push(rule);
        true
    }

    pub fn remove(&mut self, idx: usize) -> Option<CharRule> {
        if idx < self.rules.len() {
            Some(self.rules.remove(idx))
        } else {
            None
        }
    }

    pub fn rules(&self) -> &[CharRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule matching the whole input, applied.
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

    /// Greedily match a prefix of the input tokens against any rule and
    /// recurse over the remainder, joining partial outputs with spaces.
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

    /// Score every rule by fractional match against the input and apply the
    /// best-scoring one leniently. Each literal word is worth
    /// `1/|patternWords|`; identifier characters inside a variable word
    /// split that slice further.
    pub fn apply_closest_rule(&self, input: &str) -> Option<(String, usize)> {
        let words = split_words(input);
        if words.is_empty() {
            return None;
        }

        let mut scored: Vec<(f32, usize)> = Vec::new();
        for (i, rule) in self.rules.iter().enumerate() {
            let s = closeness(rule, &words);
            if s > 0.0 {
                scored.push((s, i));
            }
        }
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        for (_, i) in scored {
            let rule = &self.rules[i];
            if let Some(out) = apply_lenient(rule, &words) {
                return Some((out, i));
            }
        }
        None
    }
}

fn closeness(rule: &CharRule, words: &[&str]) -> f32 {
    let p = rule.input.words.len();
    if p == 0 {
        return 0.0;
    }
    let per_word = 1.0 / p as f32;
    let mut score = 0.0;
    for (pw, w) in rule.input.words.iter().zip(words.iter()) {
        let chars: Vec<char> = w.chars().collect();
        if pw.iter().all(|t| matches!(t, CharTok::Lit(_))) {
            let lit: String = pw
                .iter()
                .filter_map(|t| match t {
                    CharTok::Lit(c) => Some(*c),
                    CharTok::Id(_) => None,
                })
                .collect();
            if lit == *w {
                score += per_word;
            }
        } else {
            let per_tok = per_word / pw.len() as f32;
            for (t, c) in pw.iter().zip(chars.iter()) {
                match t {
                    CharTok::Lit(l) if l == c => score += per_tok,
                    CharTok::Id(_) => score += per_tok,
                    _ => {}
                }
            }
        }
    }
    score
}

/// Best-effort application: bind identifiers positionally where the input
/// provides characters, ignore literal mismatches, and require every output
/// identifier to end up bound.
fn apply_lenient(rule: &CharRule, words: &[&str]) -> Option<String> {
    let mut bind: HashMap<IdNum, char> = HashMap::new();
    for (pw, w) in rule.input.words.iter().zip(words.iter()) {
        let chars: Vec<char> = w.chars().collect();
        for (t, c) in pw.iter().zip(chars.iter()) {
            if let CharTok::Id(n) = t {
                bind.entry(*n).or_insert(*c);
            }
        }
    }
    rule.apply(&bind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reversal_rule() -> CharRule {
        abstract_generic_rule("CONSTANT xyz", "zyx", "CONSTANT abc", "cba", None).unwrap()
    }

    #[test]
    fn abstracts_reversal_and_applies_to_fresh_input() {
        let rule = reversal_rule();
        let bind = rule.matches("CONSTANT bkj").unwrap();
        assert_eq!(rule.apply(&bind).unwrap(), "jkb");
    }

    #[test]
    fn abstraction_reproduces_both_witnesses() {
        let rule = reversal_rule();
        for (i, o) in [("CONSTANT xyz", "zyx"), ("CONSTANT abc", "cba")] {
            let bind = rule.matches(i).unwrap();
            assert_eq!(rule.apply(&bind).unwrap(), o, "witness {i}");
        }
    }

    #[test]
    fn output_ids_are_subset_of_input_ids() {
        let rule = reversal_rule();
        let in_ids = rule.input.ids();
        for id in rule.output.ids() {
            assert!(in_ids.contains(&id));
        }
    }

    #[test]
    fn ending_is_stripped_before_abstraction() {
        let rule =
            abstract_generic_rule("CONSTANT xyz .", "zyx .", "CONSTANT abc .", "cba .", Some('.'))
                .unwrap();
        let bind = rule.matches("CONSTANT bkj").unwrap();
        assert_eq!(rule.apply(&bind).unwrap(), "jkb");
    }

    #[test]
    fn no_rule_without_whitespace_or_below_three_chars() {
        assert!(abstract_generic_rule("xyz", "zyx", "abc", "cba", None).is_none());
        assert!(abstract_generic_rule("ab", "b", "cd", "d", None).is_none());
    }

    #[test]
    fn identical_witnesses_produce_no_rule() {
        assert!(abstract_generic_rule("CONSTANT xyz", "zyx", "CONSTANT xyz", "zyx", None).is_none());
    }

    #[test]
    fn mismatched_word_counts_produce_no_rule() {
        assert!(abstract_generic_rule("a b c", "x", "a b", "x", None).is_none());
    }

    #[test]
    fn literal_output_chars_stay_literal() {
        // '!' never occurs in the variable word, so it survives as a literal.
        let rule =
            abstract_generic_rule("say ab", "ba!", "say cd", "dc!", None).unwrap();
        let bind = rule.matches("say pq").unwrap();
        assert_eq!(rule.apply(&bind).unwrap(), "qp!");
    }

    #[test]
    fn store_applies_first_matching_rule_in_insertion_order() {
        let mut store = CharRuleStore::new();
        store.add(reversal_rule());
        let (out, idx) = store.apply_matching_rule("CONSTANT rst").unwrap();
        assert_eq!(out, "tsr");
        assert_eq!(idx, 0);
        assert!(store.apply_matching_rule("OTHER rst").is_none());
    }

    #[test]
    fn duplicate_rules_are_not_stored() {
        let mut store = CharRuleStore::new();
        assert!(store.add(reversal_rule()));
        assert!(!store.add(reversal_rule()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn compound_application_consumes_prefix_then_recurses() {
        let mut store = CharRuleStore::new();
        store.add(abstract_generic_rule("AB xy", "yx", "AB cd", "dc", None).unwrap());
        let (out, _) = store
            .apply_compound_matching_rule("AB pq AB rs")
            .unwrap();
        assert_eq!(out, "qp sr");
    }

    #[test]
    fn closest_rule_tolerates_a_differing_literal_word() {
        let mut store = CharRuleStore::new();
        store.add(reversal_rule());
        let (out, _) = store.apply_closest_rule("WRONG bkj").unwrap();
        assert_eq!(out, "jkb");
        assert!(store.apply_closest_rule("zz").is_none());
    }
}
