// no_std support
#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(not(feature = "std"))]
use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Why a numeric evaluation produced no result. All three are treated the
/// same by the rule layer: the rule simply yields nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalError {
    Parse,
    Overflow,
    DivByZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MathOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl MathOp {
    pub const ALL: [MathOp; 4] = [MathOp::Add, MathOp::Sub, MathOp::Mul, MathOp::Div];

    fn letter(self) -> char {
        match self {
            MathOp::Add => 'A',
            MathOp::Sub => 'S',
            MathOp::Mul => 'M',
            MathOp::Div => 'D',
        }
    }
}

/// 32-bit signed arithmetic. During induction a zero divisor degrades to a
/// division by one; during application it is a failure.
pub fn apply_operation(op: MathOp, a: i32, b: i32, induction: bool) -> Result<i32, EvalError> {
    match op {
        MathOp::Add => a.checked_add(b).ok_or(EvalError::Overflow),
        MathOp::Sub => a.checked_sub(b).ok_or(EvalError::Overflow),
        MathOp::Mul => a.checked_mul(b).ok_or(EvalError::Overflow),
        MathOp::Div => {
            if b == 0 {
                if induction {
                    Ok(a)
                } else {
                    Err(EvalError::DivByZero)
                }
            } else {
                a.checked_div(b).ok_or(EvalError::Overflow)
            }
        }
    }
}

pub fn parse_in_base(s: &str, base: u32) -> Result<i32, EvalError> {
    if s.is_empty() {
        return Err(EvalError::Parse);
    }
    i32::from_str_radix(s, base).map_err(|_| EvalError::Parse)
}

pub fn format_in_base(v: i32, base: u32) -> String {
    let digits = b"0123456789abcdef";
    let mut mag = (v as i64).unsigned_abs();
    if mag == 0 {
        return "0".to_string();
    }
    let mut buf: Vec<u8> = Vec::new();
    while mag > 0 {
        buf.push(digits[(mag % base as u64) as usize]);
        mag /= base as u64;
    }
    if v < 0 {
        buf.push(b'-');
    }
    buf.reverse();
    buf.into_iter().map(|b| b as char).collect()
}

/// Split into alphanumeric runs and symbol runs, dropping blanks. A `-` that
/// follows a non-alphanumeric (or the start) and prefixes a digit belongs to
/// the number.
pub fn tokenize(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut out: Vec<String> = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == ' ' {
            i += 1;
            continue;
        }
        if c.is_alphanumeric() {
            let start = i;
            while i < chars.len() && chars[i].is_alphanumeric() {
                i += 1;
            }
            out.push(chars[start..i].iter().collect());
            continue;
        }
        let unary_minus = c == '-'
            && i + 1 < chars.len()
            && chars[i + 1].is_ascii_digit()
            && out
                .last()
                .and_then(|t| t.chars().last())
                .map(|l| !l.is_alphanumeric())
                .unwrap_or(true);
        if unary_minus {
            let start = i;
            i += 1;
            while i < chars.len() && chars[i].is_alphanumeric() {
                i += 1;
            }
            out.push(chars[start..i].iter().collect());
            continue;
        }
        let start = i;
        while i < chars.len() {
            let c = chars[i];
            if c == ' ' || c.is_alphanumeric() {
                break;
            }
            if c == '-' && i > start && i + 1 < chars.len() && chars[i + 1].is_ascii_digit() {
                break;
            }
            i += 1;
        }
        out.push(chars[start..i].iter().collect());
    }
    out
}

/// One token of a math rule's input pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MathTok {
    Lit(String),
    /// Operand slot (1 or 2) parsed in `base`.
    Operand { slot: u8, base: u32 },
}

impl fmt::Display for MathTok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MathTok::Lit(s) => write!(f, "{s}"),
            MathTok::Operand { slot, base } => write!(f, "Ð{slot}{base:02}"),
        }
    }
}

/// One token of a math rule's output pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MathOut {
    Lit(String),
    /// The operation result formatted in `base`.
    Result { op: MathOp, base: u32 },
}

impl fmt::Display for MathOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MathOut::Lit(s) => write!(f, "{s}"),
            MathOut::Result { op, base } => write!(f, "Ð{}{base:02}", op.letter()),
        }
    }
}

/// An arithmetic abstraction: two operand slots, one result slot, all other
/// tokens constant.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MathRule {
    pub input: Vec<MathTok>,
    pub output: Vec<MathOut>,
}

impl MathRule {
    pub fn op(&self) -> Option<MathOp> {
        self.output.iter().find_map(|t| match t {
            MathOut::Result { op, .. } => Some(*op),
            MathOut::Lit(_) => None,
        })
    }

    pub fn operand_base(&self) -> Option<u32> {
        self.input.iter().find_map(|t| match t {
            MathTok::Operand { base, .. } => Some(*base),
            MathTok::Lit(_) => None,
        })
    }

    pub fn result_base(&self) -> Option<u32> {
        self.output.iter().find_map(|t| match t {
            MathOut::Result { base, .. } => Some(*base),
            MathOut::Lit(_) => None,
        })
    }

    /// Index just past the second operand; the prefix a rolling application
    /// consumes.
    fn operand_prefix_len(&self) -> usize {
        self.input
            .iter()
            .rposition(|t| matches!(t, MathTok::Operand { .. }))
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    /// Match the full token list and evaluate.
    pub fn evaluate(&self, toks: &[String]) -> Result<i32, EvalError> {
        if toks.len() != self.input.len() {
            return Err(EvalError::Parse);
        }
        self.evaluate_prefix(toks, self.input.len())
    }

    fn evaluate_prefix(&self, toks: &[String], upto: usize) -> Result<i32, EvalError> {
        let mut a: Option<i32> = None;
        let mut b: Option<i32> = None;
        for (pat, tok) in self.input[..upto].iter().zip(toks.iter()) {
            match pat {
                MathTok::Lit(l) => {
                    if l != tok {
                        return Err(EvalError::Parse);
                    }
                }
                MathTok::Operand { slot, base } => {
                    let v = parse_in_base(tok, *base)?;
                    if *slot == 1 {
                        a = Some(v);
                    } else {
                        b = Some(v);
                    }
                }
            }
        }
        let (a, b) = match (a, b) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(EvalError::Parse),
        };
        let op = self.op().ok_or(EvalError::Parse)?;
        apply_operation(op, a, b, false)
    }

    /// Full-match application: compute and render the output pattern.
    pub fn apply(&self, input: &str) -> Option<String> {
        let toks = tokenize(input);
        let v = self.evaluate(&toks).ok()?;
        let base = self.result_base()?;
        let mut out = String::new();
        for t in &self.output {
            match t {
                MathOut::Lit(s) => out.push_str(s),
                MathOut::Result { .. } => out.push_str(&format_in_base(v, base)),
            }
        }
        Some(out)
    }
}

/// Abstract a math rule from two witnesses.
///
/// The shape must be "two variable tokens in, one variable token out, all
/// else constant". Every operation is tried across the base grid; if more
/// than one operation can explain both witnesses the induction is rejected
/// as ambiguous. Among base grids that fit a single operation the smallest
/// operand and result bases win (a wrong small base loses its rule at the
/// first carrying example and the pair is re-abstracted).
pub fn abstract_math_rule(i1: &str, o1: &str, i2: &str, o2: &str) -> Option<MathRule> {
    const BASES: [u32; 4] = [2, 8, 10, 16];

    let ti1 = tokenize(i1);
    let ti2 = tokenize(i2);
    let to1 = tokenize(o1);
    let to2 = tokenize(o2);

    if ti1.len() != ti2.len() || to1.len() != to2.len() || to1.is_empty() {
        return None;
    }

    let var_in: Vec<usize> = (0..ti1.len()).filter(|&i| ti1[i] != ti2[i]).collect();
    let var_out: Vec<usize> = (0..to1.len()).filter(|&i| to1[i] != to2[i]).collect();
    if var_in.len() != 2 || var_out.len() != 1 {
        return None;
    }
    let (p1, p2) = (var_in[0], var_in[1]);
    let po = var_out[0];

    let mut candidates: Vec<(MathOp, u32, u32)> = Vec::new();
    for &bin in &BASES {
        let parsed = (
            parse_in_base(&ti1[p1], bin),
            parse_in_base(&ti1[p2], bin),
            parse_in_base(&ti2[p1], bin),
            parse_in_base(&ti2[p2], bin),
        );
        let (a1, b1, a2, b2) = match parsed {
            (Ok(a1), Ok(b1), Ok(a2), Ok(b2)) => (a1, b1, a2, b2),
            _ => continue,
        };
        for &bout in &BASES {
            let (r1, r2) = match (parse_in_base(&to1[po], bout), parse_in_base(&to2[po], bout)) {
                (Ok(r1), Ok(r2)) => (r1, r2),
                _ => continue,
            };
            for op in MathOp::ALL {
                let ok = apply_operation(op, a1, b1, true) == Ok(r1)
                    && apply_operation(op, a2, b2, true) == Ok(r2);
                if ok {
                    candidates.push((op, bin, bout));
                }
            }
        }
    }

    let first_op = candidates.first()?.0;
    if candidates.iter().any(|(op, _, _)| *op != first_op) {
        // Several operations explain the witnesses: ambiguous.
        return None;
    }
    candidates.sort_by_key(|&(_, bin, bout)| (bin, bout));
    let (op, bin, bout) = candidates[0];

    let input = ti1
        .iter()
        .enumerate()
        .map(|(i, t)| {
            if i == p1 {
                MathTok::Operand { slot: 1, base: bin }
            } else if i == p2 {
                MathTok::Operand { slot: 2, base: bin }
            } else {
                MathTok::Lit(t.clone())
            }
        })
        .collect();
    let output = to1
        .iter()
        .enumerate()
        .map(|(i, t)| {
            if i == po {
                MathOut::Result { op, base: bout }
            } else {
                MathOut::Lit(t.clone())
            }
        })
        .collect();

    Some(MathRule { input, output })
}

/// Flat store of math rules; insertion order decides application.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MathRuleStore {
    rules: Vec<MathRule>,
}

impl MathRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, rule: MathRule) -> bool {
        if self.rules.contains(&rule) {
            return false;
        }
        self.rules.push(rule);
        true
    }

    pub fn remove(&mut self, idx: usize) -> Option<MathRule> {
        if idx < self.rules.len() {
            Some(self.rules.remove(idx))
        } else {
            None
        }
    }

    pub fn rules(&self) -> &[MathRule] {
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

    /// Fold a chained expression: consume the operand prefix, format the
    /// intermediate result in the operand base so the next step can parse
    /// it, and recurse; the deepest full match renders in the result base.
    pub fn apply_compound_rolling_rule(&self, input: &str) -> Option<(String, usize)> {
        let toks = tokenize(input);
        for (i, rule) in self.rules.iter().enumerate() {
            if let Some(out) = Self::roll(rule, toks.clone(), 16) {
                return Some((out, i));
            }
        }
        None
    }

    fn roll(rule: &MathRule, toks: Vec<String>, depth: usize) -> Option<String> {
        if depth == 0 {
            return None;
        }
        if toks.len() == rule.input.len() {
            if let Ok(v) = rule.evaluate(&toks) {
                let base = rule.result_base()?;
                let mut out = String::new();
                for t in &rule.output {
                    match t {
                        MathOut::Lit(s) => out.push_str(s),
                        MathOut::Result { .. } => out.push_str(&format_in_base(v, base)),
                    }
                }
                return Some(out);
            }
            return None;
        }

        let cut = rule.operand_prefix_len();
        if cut == 0 || toks.len() <= cut {
            return None;
        }
        let v = rule.evaluate_prefix(&toks, cut).ok()?;
        let bin = rule.operand_base()?;
        let mut next: Vec<String> = Vec::with_capacity(toks.len() - cut + 1);
        next.push(format_in_base(v, bin));
        next.extend_from_slice(&toks[cut..]);
        Self::roll(rule, next, depth - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_rule() -> MathRule {
        abstract_math_rule("57+65=", "122", "3+3=", "6").unwrap()
    }

    #[test]
    fn tokenizer_separates_runs_and_keeps_unary_minus() {
        assert_eq!(tokenize("12+34="), vec!["12", "+", "34", "="]);
        assert_eq!(tokenize("5-3"), vec!["5", "-", "3"]);
        assert_eq!(tokenize("=-3"), vec!["=", "-3"]);
        assert_eq!(tokenize("-3+4"), vec!["-3", "+", "4"]);
        assert_eq!(tokenize("a b1"), vec!["a", "b1"]);
    }

    #[test]
    fn abstracts_decimal_addition_with_carry() {
        let rule = add_rule();
        assert_eq!(rule.op(), Some(MathOp::Add));
        assert_eq!(rule.operand_base(), Some(10));
        assert_eq!(rule.result_base(), Some(10));
    }

    #[test]
    fn abstraction_reproduces_both_witnesses() {
        let rule = add_rule();
        assert_eq!(rule.apply("57+65=").as_deref(), Some("122"));
        assert_eq!(rule.apply("3+3=").as_deref(), Some("6"));
    }

    #[test]
    fn applies_to_fresh_operands() {
        let rule = add_rule();
        assert_eq!(rule.apply("12+34=").as_deref(), Some("46"));
        assert_eq!(rule.apply("999+1=").as_deref(), Some("1000"));
    }

    #[test]
    fn ambiguous_witnesses_produce_no_rule() {
        // 1+0=1 fits every base and both addition and subtraction.
        assert!(abstract_math_rule("1+0=", "1", "2+0=", "2").is_none());
    }

    #[test]
    fn hex_operands_force_the_base() {
        let rule = abstract_math_rule("1f+a=", "29", "b+1=", "c").unwrap();
        assert_eq!(rule.operand_base(), Some(16));
        assert_eq!(rule.apply("10+10=").as_deref(), Some("20"));
    }

    #[test]
    fn division_by_zero_fails_in_application() {
        let rule = abstract_math_rule("9/3=", "3", "78/2=", "39").unwrap();
        assert_eq!(rule.op(), Some(MathOp::Div));
        assert_eq!(rule.apply("8/0="), None);
    }

    #[test]
    fn overflow_yields_no_result() {
        let rule = abstract_math_rule("3*4=", "12", "5*7=", "35").unwrap();
        assert_eq!(rule.op(), Some(MathOp::Mul));
        assert_eq!(rule.apply("2000000000*2000000000="), None);
    }

    #[test]
    fn compound_rolling_folds_left() {
        let mut store = MathRuleStore::new();
        store.add(add_rule());
        let (out, _) = store.apply_compound_rolling_rule("1+2+3=").unwrap();
        assert_eq!(out, "6");
        let (out, _) = store.apply_compound_rolling_rule("10+20+30+40=").unwrap();
        assert_eq!(out, "100");
    }

    #[test]
    fn format_in_base_handles_negatives() {
        assert_eq!(format_in_base(-5, 2), "-101");
        assert_eq!(format_in_base(255, 16), "ff");
        assert_eq!(format_in_base(0, 8), "0");
    }
}
