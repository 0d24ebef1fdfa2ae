// no_std support
#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(not(feature = "std"))]
use alloc::{
    collections::VecDeque,
    string::{String, ToString},
};
#[cfg(feature = "std")]
use std::collections::VecDeque;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::syntax::Syntax;

/// Cursor state of the input/output/feedback cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Phase {
    /// Accumulating the teacher's question.
    #[default]
    ReceivingInput,
    /// Draining a queued multi-character answer.
    InLongOutput,
    /// Accumulating the teacher's feedback.
    ReceivingFeedback,
}

/// One-character-per-tick stream state.
///
/// Holds the rolling `inputs`/`rewards` strings (kept aligned column by
/// column, bounded), the current question tuple, and the queued output.
/// Strictly single-threaded; one column per external tick.
#[derive(Debug, Clone)]
pub struct StreamState {
    inputs: String,
    rewards: String,
    reward_count: usize,

    phase: Phase,
    full_input: String,
    full_output: String,
    full_feedback: String,

    queued: VecDeque<char>,
    all_ready: bool,
    cycle_done: bool,
    state_ok: bool,
    reward_in_input_only: bool,
    completed_feedback: Option<String>,
    last_emitted: char,

    cap: usize,
    trim: usize,
}

impl StreamState {
    /// `cap` bounds the rolling strings; the oldest `trim` columns are
    /// dropped together once `cap` is exceeded.
    pub fn new(cap: usize, trim: usize) -> Self {
        Self {
            inputs: String::new(),
            rewards: String::new(),
            reward_count: 0,
            phase: Phase::ReceivingInput,
            full_input: String::new(),
            full_output: String::new(),
            full_feedback: String::new(),
            queued: VecDeque::new(),
            all_ready: false,
            cycle_done: false,
            state_ok: true,
            reward_in_input_only: false,
            completed_feedback: None,
            last_emitted: ' ',
            cap,
            trim: trim.min(cap),
        }
    }

    /// Record this tick's reward column. Must be called once per tick,
    /// before [`process_state`](Self::process_state), blanks included, so
    /// the two rolling strings stay aligned.
    pub fn set_reward(&mut self, r: char, from_input: bool) {
        self.rewards.push(r);
        if r != ' ' {
            self.reward_count += 1;
            if from_input {
                self.reward_in_input_only = true;
            }
        }
    }

    /// Consume this tick's teacher character and advance the cycle.
    pub fn process_state(&mut self, syntax: &Syntax, ch: char) {
        self.inputs.push(ch);
        self.trim_rolling();

        if self.cycle_done {
            self.clear_question();
        }

        match self.phase {
            Phase::ReceivingInput => self.receive_input(syntax, ch),
            Phase::InLongOutput => self.receive_while_emitting(syntax, ch),
            Phase::ReceivingFeedback => self.receive_feedback(syntax, ch),
        }
    }

    fn receive_input(&mut self, syntax: &Syntax, ch: char) {
        self.full_input.push(ch);

        let by_delim = syntax.answer_now == Some(ch);
        let by_len = syntax.answer_now.is_none()
            && syntax.input_len > 0
            && self.full_input.chars().count() >= syntax.input_len;
        if !(by_delim || by_len) {
            return;
        }

        self.all_ready = true;
        if syntax.feedback_len > 1 {
            self.phase = Phase::InLongOutput;
        } else if syntax.feedback_len == 1 {
            self.phase = Phase::ReceivingFeedback;
        }
        // feedback_len == 0: the exchange closes once the answer is drained
        // (or, pre-discovery, when the next reward arrives).
    }

    fn receive_while_emitting(&mut self, syntax: &Syntax, ch: char) {
        if ch == ' ' {
            return;
        }
        if self.queued.is_empty() || Some(self.last_emitted) == syntax.answer_now {
            // The answer is finished (or properly terminated): the teacher
            // is starting its feedback.
            self.queued.clear();
            self.phase = Phase::ReceivingFeedback;
            self.push_feedback(syntax, ch);
        } else {
            // Teacher spoke over an unfinished answer: the syntax model is
            // wrong and must be rebuilt.
            self.state_ok = false;
        }
    }

    fn receive_feedback(&mut self, syntax: &Syntax, ch: char) {
        self.push_feedback(syntax, ch);
    }

    fn push_feedback(&mut self, syntax: &Syntax, ch: char) {
        self.full_feedback.push(ch);

        if let Some(nr) = syntax.next_request {
            if ch == nr && !self.feedback_is_boilerplate_fragment(syntax) {
                self.complete_feedback();
            }
        } else if syntax.feedback_len == 1 && !self.full_feedback.is_empty() {
            self.complete_feedback();
        }
    }

    /// The same literal as the next-request char can occur inside verbose
    /// boilerplate; while the accumulated feedback is still a fragment of the
    /// known boilerplate it cannot be a separator.
    fn feedback_is_boilerplate_fragment(&self, syntax: &Syntax) -> bool {
        match syntax.feedback_words.wrong_words() {
            Some(ww) => {
                let f = self.full_feedback.as_str();
                ww.starts_with(f) || ww.ends_with(f)
            }
            None => false,
        }
    }

    fn complete_feedback(&mut self) {
        self.completed_feedback = Some(self.full_feedback.clone());
        self.cycle_done = true;
        self.phase = Phase::ReceivingInput;
    }

    /// Feedback string of the last completed cycle, if one just finished.
    pub fn take_completed_feedback(&mut self) -> Option<String> {
        self.completed_feedback.take()
    }

    /// Queue a full answer for draining.
    pub fn set_output(&mut self, s: &str) {
        self.queued = s.chars().collect();
        self.full_output = s.to_string();
        self.all_ready = false;
    }

    /// Pop the next queued answer character.
    pub fn get_output(&mut self) -> char {
        let c = self.queued.pop_front().unwrap_or(' ');
        self.last_emitted = c;
        if self.queued.is_empty() && self.phase == Phase::ReceivingInput {
            // Nothing further expected from the teacher for this exchange.
            self.cycle_done = true;
        }
        c
    }

    /// Record a silent tick on the agent's side.
    pub fn push_silence(&mut self) {
        self.full_output.push(' ');
        self.last_emitted = ' ';
    }

    pub fn clear_output(&mut self) {
        self.queued.clear();
    }

    /// Close the pending exchange on a reward when no delimiter structure is
    /// known; the reward is the only cycle boundary available. Whatever is
    /// still queued belongs to the closed exchange and is dropped.
    pub fn close_unstructured_exchange(&mut self) {
        self.queued.clear();
        self.clear_question();
        self.phase = Phase::ReceivingInput;
    }

    fn clear_question(&mut self) {
        self.full_input.clear();
        self.full_output.clear();
        self.full_feedback.clear();
        self.all_ready = false;
        self.cycle_done = false;
    }

    fn trim_rolling(&mut self) {
        // Both strings have equal length here (one column per tick).
        if self.inputs.chars().count() > self.cap {
            self.inputs = self.inputs.chars().skip(self.trim).collect();
            self.rewards = self.rewards.chars().skip(self.trim).collect();
        }
    }

    // ------------------------------------------------------------------
    // Readable flags
    // ------------------------------------------------------------------

    pub fn is_all_ready(&self) -> bool {
        self.all_ready
    }

    pub fn is_output_left(&self) -> bool {
        !self.queued.is_empty()
    }

    pub fn should_send_output_now(&self) -> bool {
        self.all_ready && self.queued.is_empty()
    }

    /// True when the teacher has been blank for the whole recent window
    /// (and the rewards column blank for all but the newest slot).
    pub fn is_teacher_silent(&self, window: usize) -> bool {
        let n = self.inputs.chars().count();
        if n < window {
            return false;
        }
        let inputs_blank = self.inputs.chars().rev().take(window).all(|c| c == ' ');
        let rewards_blank = self
            .rewards
            .chars()
            .rev()
            .take(window.saturating_sub(1))
            .all(|c| c == ' ');
        inputs_blank && rewards_blank
    }

    pub fn state_ok(&self) -> bool {
        self.state_ok
    }

    pub fn mark_state_bad(&mut self) {
        self.state_ok = false;
    }

    pub fn reward_in_input_only(&self) -> bool {
        self.reward_in_input_only
    }

    pub fn reward_count(&self) -> usize {
        self.reward_count
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn inputs(&self) -> &str {
        &self.inputs
    }

    pub fn rewards(&self) -> &str {
        &self.rewards
    }

    pub fn full_input(&self) -> &str {
        &self.full_input
    }

    pub fn full_output(&self) -> &str {
        &self.full_output
    }

    pub fn full_feedback(&self) -> &str {
        &self.full_feedback
    }

    pub fn last_emitted(&self) -> char {
        self.last_emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::Syntax;

    fn syntax_with_len(input_len: usize, feedback_len: usize) -> Syntax {
        let mut s = Syntax::new();
        s.input_len = input_len;
        s.feedback_len = feedback_len;
        s.discovered = true;
        s
    }

    #[test]
    fn question_completes_at_input_length() {
        let syn = syntax_with_len(2, 0);
        let mut st = StreamState::new(100, 90);
        st.set_reward(' ', false);
        st.process_state(&syn, '1');
        assert!(!st.is_all_ready());
        st.set_reward(' ', false);
        st.process_state(&syn, '2');
        assert!(st.is_all_ready());
        assert_eq!(st.full_input(), "12");
    }

    #[test]
    fn question_completes_at_answer_now_char() {
        let mut syn = Syntax::new();
        syn.answer_now = Some('.');
        syn.feedback_len = 1;
        syn.discovered = true;
        let mut st = StreamState::new(100, 90);
        for c in "ab.".chars() {
            st.set_reward(' ', false);
            st.process_state(&syn, c);
        }
        assert!(st.is_all_ready());
        assert_eq!(st.phase(), Phase::ReceivingFeedback);
    }

    #[test]
    fn all_ready_and_output_left_are_exclusive() {
        let syn = syntax_with_len(1, 0);
        let mut st = StreamState::new(100, 90);
        st.set_reward(' ', false);
        st.process_state(&syn, 'x');
        assert!(st.is_all_ready());
        st.set_output("y");
        assert!(!st.is_all_ready());
        assert!(st.is_output_left());
        assert_eq!(st.get_output(), 'y');
        assert!(!st.is_output_left());
    }

    #[test]
    fn next_question_clears_completed_tuple() {
        let syn = syntax_with_len(1, 0);
        let mut st = StreamState::new(100, 90);
        st.set_reward(' ', false);
        st.process_state(&syn, 'x');
        st.set_output("y");
        let _ = st.get_output();
        st.set_reward(' ', false);
        st.process_state(&syn, 'z');
        assert_eq!(st.full_input(), "z");
        assert_eq!(st.full_output(), "");
    }

    #[test]
    fn teacher_interrupt_mid_answer_flags_bad_state() {
        let mut syn = Syntax::new();
        syn.answer_now = Some('.');
        syn.feedback_len = 3;
        syn.discovered = true;
        let mut st = StreamState::new(100, 90);
        for c in "ab.".chars() {
            st.set_reward(' ', false);
            st.process_state(&syn, c);
        }
        assert_eq!(st.phase(), Phase::InLongOutput);
        st.set_output("xy.");
        let _ = st.get_output();
        // Teacher speaks while 'y' and '.' are still queued.
        st.set_reward(' ', false);
        st.process_state(&syn, 'w');
        assert!(!st.state_ok());
    }

    #[test]
    fn interrupt_after_terminated_answer_is_feedback() {
        let mut syn = Syntax::new();
        syn.answer_now = Some('.');
        syn.next_request = Some(';');
        syn.feedback_len = 3;
        syn.discovered = true;
        let mut st = StreamState::new(100, 90);
        for c in "ab.".chars() {
            st.set_reward(' ', false);
            st.process_state(&syn, c);
        }
        st.set_output("x.");
        let _ = st.get_output();
        let _ = st.get_output();
        st.set_reward('+', false);
        st.process_state(&syn, 'o');
        assert!(st.state_ok());
        assert_eq!(st.phase(), Phase::ReceivingFeedback);
        st.set_reward(' ', false);
        st.process_state(&syn, 'k');
        st.set_reward(' ', false);
        st.process_state(&syn, ';');
        assert_eq!(st.take_completed_feedback().as_deref(), Some("ok;"));
    }

    #[test]
    fn rolling_strings_stay_aligned_and_bounded() {
        let syn = syntax_with_len(1, 0);
        let mut st = StreamState::new(20, 15);
        for i in 0..30 {
            st.set_reward(if i % 2 == 0 { '+' } else { ' ' }, false);
            st.process_state(&syn, 'a');
        }
        assert!(st.inputs().chars().count() <= 20);
        assert_eq!(st.inputs().chars().count(), st.rewards().chars().count());
    }

    #[test]
    fn teacher_silence_requires_full_window() {
        let syn = syntax_with_len(1, 0);
        let mut st = StreamState::new(200, 150);
        for _ in 0..49 {
            st.set_reward(' ', false);
            st.process_state(&syn, ' ');
        }
        assert!(!st.is_teacher_silent(50));
        st.set_reward(' ', false);
        st.process_state(&syn, ' ');
        assert!(st.is_teacher_silent(50));
    }

    #[test]
    fn boilerplate_fragment_defers_next_request_separator() {
        let mut syn = Syntax::new();
        syn.answer_now = Some('.');
        syn.next_request = Some('.');
        syn.feedback_len = 4;
        syn.discovered = true;
        syn.feedback_words.set_wrong_words("no. try");
        let mut st = StreamState::new(200, 150);
        for c in "q.".chars() {
            st.set_reward(' ', false);
            st.process_state(&syn, c);
        }
        st.set_output("z.");
        let _ = st.get_output();
        let _ = st.get_output();
        // "no." is a fragment of the boilerplate, so its '.' must not end
        // the feedback; the later '.' does.
        for c in "no. try x.".chars() {
            st.set_reward(' ', false);
            st.process_state(&syn, c);
        }
        assert_eq!(st.take_completed_feedback().as_deref(), Some("no. try x."));
    }
}
