//! Questionnaire search entry points.
//!
//! # Responsibility
//! - Expose title search as a derived view over live registry contents.
//! - Keep result shaping (filtering, ordering, limits) inside core.

pub mod title;
