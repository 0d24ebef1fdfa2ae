//! Advisory terminal view of the rolling conversation.
//!
//! Keeps the last `width` (reward, input, reply) columns aligned in three
//! rows and an accuracy counter. Never consulted by the learner.

use std::io::{self, Write};

#[derive(Debug)]
pub struct Conversation {
    width: usize,
    rewards: String,
    inputs: String,
    replies: String,
    correct: u64,
    incorrect: u64,
    ticks: u64,
    drawn_before: bool,
}

impl Conversation {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(8),
            rewards: String::new(),
            inputs: String::new(),
            replies: String::new(),
            correct: 0,
            incorrect: 0,
            ticks: 0,
            drawn_before: false,
        }
    }

    pub fn push(&mut self, reward: char, input: char, reply: char) {
        self.rewards.push(reward);
        self.inputs.push(input);
        self.replies.push(reply);
        trim_to(&mut self.rewards, self.width);
        trim_to(&mut self.inputs, self.width);
        trim_to(&mut self.replies, self.width);

        self.ticks += 1;
        match reward {
            '+' => self.correct += 1,
            '-' => self.incorrect += 1,
            _ => {}
        }
    }

    pub fn accuracy(&self) -> f32 {
        let graded = self.correct + self.incorrect;
        if graded == 0 {
            0.0
        } else {
            self.correct as f32 / graded as f32
        }
    }

    pub fn render(&self) -> String {
        format!(
            "reward  |{}|\nteacher |{}|\nagent   |{}|  tick {}  acc {:.2}",
            self.rewards,
            self.inputs,
            self.replies,
            self.ticks,
            self.accuracy()
        )
    }

    /// Redraw the three-row window in place.
    pub fn redraw(&mut self) -> io::Result<()> {
        let mut out = io::stdout().lock();
        if self.drawn_before {
            // Move back over the previous three rows.
            write!(out, "\x1b[3F\x1b[J")?;
        }
        writeln!(out, "{}", self.render())?;
        out.flush()?;
        self.drawn_before = true;
        Ok(())
    }
}

fn trim_to(s: &mut String, width: usize) {
    let n = s.chars().count();
    if n > width {
        *s = s.chars().skip(n - width).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_stay_aligned_and_bounded() {
        let mut c = Conversation::new(8);
        for i in 0..20 {
            let ch = char::from(b'a' + (i % 26) as u8);
            c.push(if i % 2 == 0 { '+' } else { '-' }, ch, ch);
        }
        assert_eq!(c.rewards.chars().count(), 8);
        assert_eq!(c.inputs.chars().count(), 8);
        assert_eq!(c.replies.chars().count(), 8);
    }

    #[test]
    fn accuracy_tracks_graded_ticks_only() {
        let mut c = Conversation::new(16);
        c.push(' ', 'a', ' ');
        c.push('+', 'b', 'b');
        c.push('-', 'c', 'c');
        c.push('+', 'd', 'd');
        assert!((c.accuracy() - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn render_contains_all_three_rows() {
        let mut c = Conversation::new(16);
        c.push('+', 'x', 'y');
        let r = c.render();
        assert!(r.contains("|x|"));
        assert!(r.contains("|y|"));
        assert!(r.lines().count() == 3);
    }
}
