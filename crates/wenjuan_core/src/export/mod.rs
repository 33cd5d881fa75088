//! Questionnaire export rendering.
//!
//! # Responsibility
//! - Turn one questionnaire plus its answers into a downloadable document.
//!
//! # Invariants
//! - Rendering is pure: it never touches storage.
//! - Identical snapshots render to byte-identical documents.

mod pdf;
pub mod render;
