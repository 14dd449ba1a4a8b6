//! Roster use-case services.
//!
//! # Responsibility
//! - Orchestrate worksheet calls into register/list/search/remove/average.
//! - Keep front-ends decoupled from store details.

pub mod student_service;
