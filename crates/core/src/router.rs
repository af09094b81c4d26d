//! Entry points for the chat layer: commands, reactions and manual ticks.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::{
    command::Command,
    community::CommunityManager,
    directory::{Member, MemberDirectory},
    plant::TickOutcome,
    registry::Registry,
    reply::Reply,
    scheduler::TickScheduler,
    CommunityId,
};

/// Routes inbound platform events to the right community manager.
pub struct Router {
    registry: Arc<Registry>,
    scheduler: Arc<TickScheduler>,
}

impl Router {
    /// Build a router over an explicit registry and scheduler.
    pub fn new(registry: Arc<Registry>, scheduler: Arc<TickScheduler>) -> Self {
        Self {
            registry,
            scheduler,
        }
    }

    /// Registry backing this router.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Return the manager for `community`, loading it and starting its tick
    /// loop on first contact.
    pub fn open(&self, community: CommunityId) -> Result<Arc<CommunityManager>> {
        let (manager, created) = self
            .registry
            .get_or_load(community)
            .with_context(|| format!("failed to load community {community}"))?;
        if created {
            self.scheduler.watch(Arc::clone(&manager));
        }
        Ok(manager)
    }

    /// Parse `args` and apply them to `community` on behalf of `member`.
    pub fn process_command<S: AsRef<str>>(
        &self,
        community: CommunityId,
        member: &Member,
        args: &[S],
        directory: &impl MemberDirectory,
    ) -> Result<Vec<Reply>> {
        let manager = self.open(community)?;
        let command = Command::parse(args);
        debug!(community, member = member.id, ?command, "processing command");
        Ok(manager.handle(member, &command, directory))
    }

    /// Acknowledge a reaction. Reactions carry no game meaning yet.
    pub fn process_reaction(&self, community: CommunityId, member: &Member, emoji: &str) {
        debug!(community, member = member.id, emoji, "ignoring reaction");
    }

    /// Run one tick for `community` immediately, outside its schedule.
    pub fn tick(&self, community: CommunityId) -> Result<TickOutcome> {
        let manager = self.open(community)?;
        manager
            .tick()
            .with_context(|| format!("failed to persist community {community}"))
    }
}
