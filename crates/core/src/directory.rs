//! Member identity as supplied by the chat platform.

use crate::{error::DirectoryError, CommunityId, MemberId};

/// The member who issued a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Platform id.
    pub id: MemberId,
    /// Name shown in replies.
    pub display_name: String,
}

impl Member {
    /// Build a member from its id and display name.
    pub fn new(id: MemberId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}

/// Platform capability to look up a member's display name by id.
pub trait MemberDirectory {
    /// Resolve the display name of `member` within `community`.
    fn display_name(
        &self,
        community: CommunityId,
        member: MemberId,
    ) -> Result<String, DirectoryError>;
}
