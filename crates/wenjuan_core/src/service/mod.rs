//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into survey-level operations.
//! - Map persistence failures onto the service error taxonomy.
//! - Keep request-gateway code decoupled from storage details.

pub mod answer_service;
pub mod category_service;
pub mod error;
pub mod export_service;
pub mod questionnaire_service;
