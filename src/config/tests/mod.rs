//! Config module tests
//!
//! - Preference file lifecycle, backups and restore
//! - Transaction commit/rollback
//! - Preference file grammar
//! - In-memory store

mod preference_file_tests;
