//! Teacher simulators ("lessons") for the pupil learner.
//!
//! Each lesson produces the same tick discipline as the live carrier: one
//! reward frame and one teacher character per tick, with the first reward
//! frame of a session discarded and every later one registered. Lessons
//! grade replies themselves and keep a [`stats::LessonStats`] accuracy
//! window.

pub mod stats;

pub mod scripted;

pub mod digit_pairs;
