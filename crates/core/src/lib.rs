//! # pupil
//!
//! A symbolic learner for one-character-per-tick teacher dialogues.
//!
//! The brain consumes one teacher character and one reward per tick, works
//! out the framing syntax of the conversation (question length, delimiters,
//! verbose-feedback boilerplate) from the unlabeled stream alone, and builds
//! symbolic rules — exact mappings, character- and word-level abstractions,
//! arithmetic in several bases, and length-generalized rule families — that
//! it discards again the moment the teacher moves to a new task.
//!
//! ## Quick Start
//!
//! ```
//! use pupil::prelude::*;
//!
//! let mut brain = Brain::new(BrainConfig::default());
//!
//! // One tick: reward for the previous exchange, then the teacher's
//! // character in, exactly one character out (space = silence).
//! brain.register_reward(' ', false);
//! let reply = brain.answer('a');
//! assert_eq!(reply, ' '); // nothing graded yet: stay silent
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Standard library support
//! - `serde`: Enable serialization/deserialization of config and snapshots
//!
//! ## no_std Support
//!
//! Disable default features for `no_std` environments (alloc required):
//! ```toml
//! pupil = { version = "0.1", default-features = false }
//! ```
//!
//! ## Modules
//!
//! - [`learner`]: The brain: controller, rewards, task switching
//! - [`stream`]: One-tick stream state machine
//! - [`syntax`]: Framing-syntax discovery and feedback boilerplate
//! - [`mapping`]: Exact input-to-output rules
//! - [`charrule`], [`wordrule`], [`mathrule`], [`sizerule`]: Generic rules

// no_std support
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[path = "core/pattern.rs"]
pub mod pattern;

#[path = "core/stream.rs"]
pub mod stream;

#[path = "core/syntax.rs"]
pub mod syntax;

#[path = "core/mapping.rs"]
pub mod mapping;

#[path = "core/history.rs"]
pub mod history;

#[path = "core/charrule.rs"]
pub mod charrule;

#[path = "core/wordrule.rs"]
pub mod wordrule;

#[path = "core/mathrule.rs"]
pub mod mathrule;

#[path = "core/sizerule.rs"]
pub mod sizerule;

#[path = "core/learner.rs"]
pub mod learner;

/// Prelude module for convenient imports.
///
/// ```
/// use pupil::prelude::*;
/// ```
pub mod prelude {
    pub use crate::learner::{AnswerSource, Brain, BrainConfig, Diagnostics};
    pub use crate::pattern::{CharPattern, CharTok, IdNum, WordPattern, WordSeg};
    pub use crate::stream::{Phase, StreamState};
    pub use crate::syntax::{FeedbackWords, Syntax};
}
