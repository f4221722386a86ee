//! Core business logic for SplitLedger.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All split rules, validation and settlement rollups live here.
//!
//! # Modules
//!
//! - `split` - Share calculation and validation for group expenses
//! - `settlement` - Balance sheet, portfolio summary and unpaid list
//! - `reminder` - Payment reminder planning and message content

pub mod reminder;
pub mod settlement;
pub mod split;
