//! Ranking and match scheduling for small amateur tournaments
//!
//! This crate provides:
//! - Points-based standings with competitive (tie-sharing) ranks
//! - Automatic pairing of free teams, avoiding repeat opponents
//! - Match status transitions (coming, ongoing, done)
//! - Admin actions that trigger scheduling when matches finish
//!
//! # Usage
//!
//! ```bash
//! # Create a tournament with four teams and schedule its first round
//! cargo run -p tourney -- init "Spring Cup" --matches-per-team 3
//! cargo run -p tourney -- teams add Alpha Bravo Charlie Delta
//! cargo run -p tourney -- start
//!
//! # Finish a match and let the scheduler pair the freed teams
//! cargo run -p tourney -- score 1 1=13 2=7 --status done
//! cargo run -p tourney -- standings
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod ranking;
pub mod report;
pub mod scheduler;
pub mod service;
pub mod status;

pub use config::*;
pub use controller::*;
pub use error::*;
pub use ranking::*;
pub use report::*;
pub use scheduler::*;
pub use service::*;
pub use status::{apply_status, update_match_statuses, update_status, update_status_in_order};
