//! Typed errors surfaced by the core crate.

use std::path::PathBuf;

use thiserror::Error;

use crate::{CommunityId, MemberId};

/// Failure to read or write a community snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Filesystem access failed.
    #[error("failed to access snapshot {}: {source}", path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The record exists but does not have the expected structure.
    #[error("snapshot {} is malformed: {source}", path.display())]
    Decode {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// The record was written by a newer build.
    #[error("snapshot {} has version {found}; this build reads up to {supported}", path.display())]
    UnsupportedVersion {
        /// Offending file.
        path: PathBuf,
        /// Version stored in the record.
        found: u32,
        /// Highest version this build understands.
        supported: u32,
    },
    /// The record for one community claims to belong to another.
    #[error("snapshot {} belongs to community {found}, expected {expected}", path.display())]
    CommunityMismatch {
        /// Offending file.
        path: PathBuf,
        /// Community requested.
        expected: CommunityId,
        /// Community stored in the record.
        found: CommunityId,
    },
    /// Serialising the in-memory state failed.
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Failure to resolve a member's display name.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The platform does not know this member.
    #[error("member {0} could not be found")]
    UnknownMember(MemberId),
    /// The platform could not be reached.
    #[error("member directory unavailable: {0}")]
    Unavailable(String),
}
