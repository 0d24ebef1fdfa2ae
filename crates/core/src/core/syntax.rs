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

/// Rolling memory of the last two full feedback strings, and the verbose
/// boilerplate inferred from them.
///
/// The boilerplate ("wrong feedback words") is whatever wraps the real
/// answer in verbose feedback, e.g. `"wrong! "`. It is learned as the
/// longest common word-aligned prefix of the two samples, falling back to
/// the longest common suffix.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeedbackWords {
    recent: [Option<String>; 2],
    next: usize,
    wrong_words: Option<String>,
}

impl FeedbackWords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed feedback string.
    pub fn push(&mut self, s: &str) {
        self.recent[self.next] = Some(s.to_string());
        self.next = (self.next + 1) % 2;
    }

    pub fn wrong_words(&self) -> Option<&str> {
        self.wrong_words.as_deref()
    }

    pub fn set_wrong_words(&mut self, s: &str) {
        self.wrong_words = Some(s.to_string());
    }

    /// Re-infer the boilerplate from the two stored samples.
    ///
    /// Both samples must contain whitespace and at least three characters.
    /// Returns `true` when a boilerplate different from the previous one was
    /// produced.
    pub fn learn_wrong_feedback_words(&mut self) -> bool {
        let (a, b) = match (&self.recent[0], &self.recent[1]) {
            (Some(a), Some(b)) => (a.as_str(), b.as_str()),
            _ => return false,
        };
        if a.chars().count() < 3 || b.chars().count() < 3 {
            return false;
        }
        if !a.contains(' ') || !b.contains(' ') {
            return false;
        }

        let learned = word_aligned_common_prefix(a, b)
            .filter(|p| !p.is_empty())
            .or_else(|| common_suffix(a, b).filter(|s| !s.trim().is_empty()));

        match learned {
            Some(w) if self.wrong_words.as_deref() != Some(w.as_str()) => {
                self.wrong_words = Some(w);
                true
            }
            _ => false,
        }
    }

    /// Judge a feedback string: `+` iff the learned boilerplate does not
    /// occur in it (the real answer replaced it), else `-`.
    pub fn parse_feedback_for_rewards(&self, s: &str) -> char {
        match &self.wrong_words {
            Some(ww) if s.contains(ww.as_str()) => '-',
            _ => '+',
        }
    }

    /// Strip one occurrence of the boilerplate out of a string.
    pub fn strip_wrong_words<'a>(&self, s: &'a str) -> &'a str {
        let ww = match &self.wrong_words {
            Some(w) if !w.is_empty() => w.as_str(),
            _ => return s,
        };
        if let Some(rest) = s.strip_prefix(ww) {
            return rest.trim_start_matches(' ');
        }
        if let Some(rest) = s.strip_suffix(ww) {
            return rest.trim_end_matches(' ');
        }
        s
    }
}

fn word_aligned_common_prefix(a: &str, b: &str) -> Option<String> {
    let aw: Vec<&str> = a.split(' ').collect();
    let bw: Vec<&str> = b.split(' ').collect();
    let mut shared: Vec<&str> = Vec::new();
    for (x, y) in aw.iter().zip(bw.iter()) {
        if x != y {
            break;
        }
        shared.push(x);
    }
    if shared.is_empty() {
        None
    } else {
        Some(shared.join(" "))
    }
}

fn common_suffix(a: &str, b: &str) -> Option<String> {
    let ac: Vec<char> = a.chars().collect();
    let bc: Vec<char> = b.chars().collect();
    let mut n = 0;
    while n < ac.len() && n < bc.len() && ac[ac.len() - 1 - n] == bc[bc.len() - 1 - n] {
        n += 1;
    }
    if n == 0 {
        None
    } else {
        Some(ac[ac.len() - n..].iter().collect())
    }
}

/// Framing syntax of the current task, discovered from the raw streams.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Syntax {
    /// Character terminating the teacher's question, when one exists.
    pub answer_now: Option<char>,
    /// Character terminating the teacher's feedback, when one exists.
    pub next_request: Option<char>,
    /// Question length; used only when no delimiter is found. 0 = unknown.
    pub input_len: usize,
    /// Length of the exchange segment after the question (the answer
    /// window). 0 means single-character tasks.
    pub feedback_len: usize,
    /// How many trailing feedback characters are meaningful; tolerates bogus
    /// prefixes. Deliberately persistent across task switches.
    pub feedback_real_chars: usize,
    /// Whether discovery has run for this task.
    pub discovered: bool,

    pub feedback_words: FeedbackWords,
}

impl Syntax {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delimiters_known(&self) -> bool {
        self.answer_now.is_some() || self.next_request.is_some()
    }

    pub fn single_char_mode(&self) -> bool {
        self.discovered && self.feedback_len == 0 && self.input_len <= 1
    }

    /// Forget the discovered syntax. `feedback_real_chars` survives on
    /// purpose; see the task-switch arbiter.
    pub fn reset(&mut self) {
        let keep = self.feedback_real_chars;
        *self = Self::default();
        self.feedback_real_chars = keep;
    }

    /// Inspect the aligned raw streams after four rewards and fill in the
    /// descriptor. Returns `false` on a teacher protocol violation.
    pub fn discover(&mut self, inputs: &str, rewards: &str) -> bool {
        let (ins, rws) = collapse_streams(inputs, rewards);
        let pos: Vec<usize> = rws
            .iter()
            .enumerate()
            .filter(|(_, r)| **r != ' ')
            .map(|(i, _)| i)
            .collect();
        if pos.len() < 4 {
            // Fewer than four rewards is a teacher protocol violation.
            return false;
        }
        let pos = &pos[..4];

        self.detect_answer_now(&ins, pos);
        self.detect_next_request_from_left(&ins, pos);
        if self.next_request.is_none() {
            self.detect_next_request_from_right(&ins, pos);
        }

        if !self.delimiters_known() {
            // No delimiter structure at all: the reward spacing is the only
            // framing. A gap of one declares single-character tasks.
            let gap = pos.windows(2).map(|w| w[1] - w[0]).min().unwrap_or(1);
            self.input_len = gap.max(1);
            self.feedback_len = 0;
        }

        self.discovered = true;
        true
    }

    fn detect_answer_now(&mut self, ins: &[char], pos: &[usize]) {
        let at: Vec<char> = pos.iter().map(|&p| *ins.get(p).unwrap_or(&' ')).collect();

        let first = at[0];
        if first != ' ' && at.iter().all(|&c| c == first) && !first.is_alphanumeric() {
            self.answer_now = Some(first);
            self.feedback_len = 1;
            return;
        }

        if at.iter().all(|&c| c == ' ') {
            // The reward arrives some ticks after the question ended; walk
            // left past the agent's answer window to the delimiter.
            let mut found: Vec<(char, usize)> = Vec::new();
            for &p in pos {
                let mut q = p;
                while q > 0 && ins[q] == ' ' {
                    q -= 1;
                }
                if ins[q] != ' ' {
                    found.push((ins[q], p - q));
                }
            }
            if found.len() < 3 {
                return;
            }
            let c = found[found.len() - 1].0;
            let agreeing = found.iter().filter(|(x, _)| *x == c).count();
            if agreeing >= 3 && !c.is_alphanumeric() {
                self.answer_now = Some(c);
                let max_dist = found
                    .iter()
                    .filter(|(x, _)| *x == c)
                    .map(|(_, d)| *d)
                    .max()
                    .unwrap_or(0);
                self.feedback_len = max_dist + 1;
            }
        }
    }

    fn detect_next_request_from_left(&mut self, ins: &[char], pos: &[usize]) {
        // The two consecutive feedback stretches between rewards 2-3 and 3-4.
        let seg_a = &ins[pos[1] + 1..=pos[2].min(ins.len() - 1)];
        let seg_b = &ins[pos[2] + 1..=pos[3].min(ins.len() - 1)];

        let mut lcp = 0;
        while lcp < seg_a.len() && lcp < seg_b.len() && seg_a[lcp] == seg_b[lcp] {
            lcp += 1;
        }
        if lcp == 0 {
            return;
        }

        // A matching symbol inside the shared run, skipping the answer-now
        // char itself (the next symbol beyond it still qualifies).
        let delim = seg_a[..lcp]
            .iter()
            .find(|c| !c.is_alphanumeric() && **c != ' ' && Some(**c) != self.answer_now);
        if let Some(&d) = delim {
            self.next_request = Some(d);
            // Whatever matched before the divergence is the boilerplate that
            // wraps real answers.
            let prefix: String = seg_a[..lcp].iter().collect();
            let prefix = prefix.trim();
            if prefix.chars().count() >= 3 {
                self.feedback_words.set_wrong_words(prefix);
            }
        }
    }

    fn detect_next_request_from_right(&mut self, ins: &[char], pos: &[usize]) {
        let mut k = 1;
        while k <= pos[1] && k <= pos[2] {
            let ca = ins[pos[1] - k];
            let cb = ins[pos[2] - k];
            if ca == cb && !ca.is_alphanumeric() && ca != ' ' && Some(ca) != self.answer_now {
                self.next_request = Some(ca);
                return;
            }
            k += 1;
        }
    }
}

/// Collapse runs of all-blank columns so slow teachers do not distort the
/// position arithmetic. Both streams are collapsed in lock-step; the reward
/// column may lead the input column by one tick, so the shorter side is
/// padded with blanks.
fn collapse_streams(inputs: &str, rewards: &str) -> (Vec<char>, Vec<char>) {
    let ic: Vec<char> = inputs.chars().collect();
    let rc: Vec<char> = rewards.chars().collect();
    let n = ic.len().max(rc.len());

    let mut outs = Vec::with_capacity(n);
    let mut outr = Vec::with_capacity(n);
    let mut prev_blank = false;
    for i in 0..n {
        let a = ic.get(i).copied().unwrap_or(' ');
        let r = rc.get(i).copied().unwrap_or(' ');
        let blank = a == ' ' && r == ' ';
        if blank && prev_blank {
            continue;
        }
        outs.push(a);
        outr.push(r);
        prev_blank = blank;
    }
    (outs, outr)
}
