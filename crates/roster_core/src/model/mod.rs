//! Roster domain model.
//!
//! # Responsibility
//! - Define the student record and the audit log entry shapes.
//! - Own text-to-number coercion for user-entered fields.
//!
//! # Invariants
//! - A student id is generated once at registration and never rewritten.
//! - Names are stored lowercased.

pub mod audit;
pub mod student;
