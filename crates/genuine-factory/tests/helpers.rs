//! Test helpers for genuine-factory integration tests.
//!
//! Shared models and a journal used to observe callback invocations.

#[path = "helpers/journal.rs"]
pub mod journal;
#[path = "helpers/models.rs"]
pub mod models;
