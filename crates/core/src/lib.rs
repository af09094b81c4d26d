#![warn(clippy::all, missing_docs)]

//! Core game logic for PlantBot.
//!
//! Each chat community tends one shared plant and trades its fruit on a
//! small local market. This crate hosts the plant and economy models, the
//! per-community manager and its snapshot persistence, command parsing, the
//! registry/router used by chat frontends, and the tick scheduler.

pub mod catalog;
pub mod command;
pub mod community;
pub mod config;
pub mod directory;
pub mod economy;
pub mod error;
pub mod market;
pub mod plant;
pub mod registry;
pub mod reply;
pub mod router;
pub mod scheduler;
pub mod snapshot;

/// Platform identifier of a community (guild/server).
pub type CommunityId = u64;
/// Platform identifier of a member.
pub type MemberId = u64;

pub use catalog::FruitKind;
pub use command::{BankScope, Command};
pub use community::{CommunityManager, CommunityState};
pub use config::AppConfig;
pub use directory::{Member, MemberDirectory};
pub use economy::{EconomyState, SellOrder};
pub use error::{DirectoryError, SnapshotError};
pub use market::Market;
pub use plant::{DeathCause, Mood, PlantState, TickOutcome};
pub use registry::Registry;
pub use reply::Reply;
pub use router::Router;
pub use scheduler::TickScheduler;
pub use snapshot::{SnapshotRecord, SnapshotStore};
