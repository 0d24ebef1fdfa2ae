use std::collections::VecDeque;

/// Graded exchanges kept for the recency rate.
const WINDOW: usize = 100;

/// Accuracy tracking over a lesson's reward stream.
///
/// Consumes the raw reward characters the teacher emits; blank frames are
/// ungraded ticks and do not count. Besides the lifetime totals a bounded
/// window of the most recent graded exchanges is kept, so a long bad start
/// does not mask late mastery.
#[derive(Debug, Clone, Default)]
pub struct LessonStats {
    correct: u32,
    incorrect: u32,
    window: VecDeque<bool>,
}

impl LessonStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one reward frame (`'+'`, `'-'`, or blank).
    pub fn record(&mut self, reward: char) {
        let rewarded = match reward {
            '+' => true,
            '-' => false,
            _ => return,
        };
        if rewarded {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
        self.window.push_back(rewarded);
        if self.window.len() > WINDOW {
            self.window.pop_front();
        }
    }

    pub fn correct(&self) -> u32 {
        self.correct
    }

    pub fn incorrect(&self) -> u32 {
        self.incorrect
    }

    /// Share of rewarded exchanges over the whole run.
    pub fn accuracy(&self) -> f32 {
        let graded = self.correct + self.incorrect;
        if graded == 0 {
            return 0.0;
        }
        self.correct as f32 / graded as f32
    }

    /// Share of rewarded exchanges over the last hundred graded ticks.
    pub fn last_100_rate(&self) -> f32 {
        if self.window.is_empty() {
            return 0.0;
        }
        let rewarded = self.window.iter().filter(|&&x| x).count();
        rewarded as f32 / self.window.len() as f32
    }
}
