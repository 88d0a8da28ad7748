//! Domain model for the employee directory and the project/task tree.
//!
//! # Responsibility
//! - Define canonical records shared by the store, the channel binding and
//!   reconciliation.
//! - Own the value-level invariants (level range, self-dependency, field
//!   lengths) so every write path enforces them the same way.
//!
//! # Invariants
//! - Employees are deactivated (level 0), never removed.
//! - External identifiers are opaque platform snowflakes.

pub mod access;
pub mod catalog;
pub mod employee;
pub mod ids;
pub mod project;
pub mod selector;
pub mod task;
pub mod validation;
