//! Core records and storage for amateur tournaments.
//!
//! This crate provides:
//! - The tournament, team, match and score model
//! - The [`TournamentStore`] contract the ranking and scheduling engine uses
//! - Exclusive per-tournament locks guarding ordering allocation
//! - [`MemoryStore`], an embedded store with JSON snapshots

pub mod error;
pub mod lock;
pub mod memory;
pub mod model;
pub mod store;

pub use error::*;
pub use lock::*;
pub use memory::*;
pub use model::*;
pub use store::*;
