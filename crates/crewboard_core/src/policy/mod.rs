//! Access-escalation policy.
//!
//! # Responsibility
//! - Decide, from level pairs only, whether an actor may run a command or
//!   grant/change a level.
//! - Map every command to its minimum level.
//!
//! # Invariants
//! - Privilege only flows downward: an actor can never grant its own level
//!   or anything above it.
//! - Peers never act on peers, and the privileged path never targets the
//!   actor itself.
//! - Functions here are pure and never fail; callers turn a denial into
//!   an authorization error.

pub mod access_policy;
pub mod command;
