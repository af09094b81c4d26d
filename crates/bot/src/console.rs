//! Line-oriented stand-in for a chat platform.
//!
//! Each stdin line is one inbound event:
//!
//! ```text
//! <community> <member>[(Display Name)] $plant sell apple 2
//! <community> <member>[(Display Name)] react 🌱
//! ```
//!
//! Lines that are neither commands nor reactions are ordinary chatter and
//! are ignored, as a bot would ignore them.

use std::collections::HashMap;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use plantbot_core::{
    CommunityId, DirectoryError, Member, MemberDirectory, MemberId, Reply, Router,
};
use regex::Regex;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::{error, warn};

static EVENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+)\s+(\d+)(?:\(([^)]*)\))?\s+(.*?)\s*$").expect("invalid event regex")
});

/// One parsed stdin line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// `$plant ...` from a member.
    Command {
        community: CommunityId,
        member: Member,
        args: Vec<String>,
    },
    /// `react <emoji>` from a member.
    Reaction {
        community: CommunityId,
        member: Member,
        emoji: String,
    },
    /// Anything else.
    Chatter,
}

/// Parse a console line into an inbound event.
pub fn parse_line(line: &str, prefix: &str) -> Result<Inbound> {
    let Some(caps) = EVENT_RE.captures(line) else {
        return Ok(Inbound::Chatter);
    };

    let community: CommunityId = caps[1]
        .parse()
        .with_context(|| format!("community id {} out of range", &caps[1]))?;
    let member_id: MemberId = caps[2]
        .parse()
        .with_context(|| format!("member id {} out of range", &caps[2]))?;
    let display_name = caps
        .get(3)
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| fallback_name(member_id));
    let member = Member::new(member_id, display_name);

    let mut words = caps[4].split_whitespace();
    match words.next() {
        Some(head) if head == prefix => Ok(Inbound::Command {
            community,
            member,
            args: words.map(str::to_string).collect(),
        }),
        Some("react") => match words.next() {
            Some(emoji) => Ok(Inbound::Reaction {
                community,
                member,
                emoji: emoji.to_string(),
            }),
            None => Ok(Inbound::Chatter),
        },
        _ => Ok(Inbound::Chatter),
    }
}

/// Label for a member who never gave a display name.
fn fallback_name(member: MemberId) -> String {
    format!("member-{member}")
}

/// Display names learned from the members who have spoken.
///
/// Accounts restored from a snapshot may belong to members who have not
/// spoken since the process started; they are shown by their fallback label.
#[derive(Default)]
pub struct ConsoleDirectory {
    names: RwLock<HashMap<(CommunityId, MemberId), String>>,
}

impl ConsoleDirectory {
    /// Remember how `member` is called in `community`.
    pub fn observe(&self, community: CommunityId, member: &Member) {
        self.names
            .write()
            .insert((community, member.id), member.display_name.clone());
    }
}

impl MemberDirectory for ConsoleDirectory {
    fn display_name(
        &self,
        community: CommunityId,
        member: MemberId,
    ) -> Result<String, DirectoryError> {
        Ok(self
            .names
            .read()
            .get(&(community, member))
            .cloned()
            .unwrap_or_else(|| fallback_name(member)))
    }
}

/// Reads events from stdin and prints replies to stdout.
pub struct ConsoleFrontend<'a> {
    router: &'a Router,
    prefix: String,
}

impl<'a> ConsoleFrontend<'a> {
    pub fn new(router: &'a Router, prefix: String) -> Self {
        Self { router, prefix }
    }

    /// Process stdin until it closes.
    pub async fn run(&self, directory: &ConsoleDirectory) -> Result<()> {
        let mut lines = BufReader::new(io::stdin()).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .context("failed to read from stdin")?
        {
            for reply in self.dispatch(&line, directory) {
                println!("{reply}");
            }
        }
        Ok(())
    }

    /// Handle one line, returning what should be shown to the members.
    pub fn dispatch(&self, line: &str, directory: &ConsoleDirectory) -> Vec<String> {
        let event = match parse_line(line, &self.prefix) {
            Ok(event) => event,
            Err(err) => {
                warn!("ignoring line {line:?}: {err:#}");
                return Vec::new();
            }
        };

        match event {
            Inbound::Command {
                community,
                member,
                args,
            } => {
                directory.observe(community, &member);
                match self
                    .router
                    .process_command(community, &member, &args, directory)
                {
                    Ok(replies) => replies
                        .iter()
                        .map(|reply| format_reply(community, reply))
                        .collect(),
                    Err(err) => {
                        error!("{err:#}");
                        vec![format!(
                            "[{community}] The plant for this server could not be loaded."
                        )]
                    }
                }
            }
            Inbound::Reaction {
                community,
                member,
                emoji,
            } => {
                directory.observe(community, &member);
                self.router.process_reaction(community, &member, &emoji);
                Vec::new()
            }
            Inbound::Chatter => Vec::new(),
        }
    }
}

fn format_reply(community: CommunityId, reply: &Reply) -> String {
    format!("[{community}] {reply}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantbot_core::{CommunityState, Registry, SnapshotStore, TickScheduler};
    use std::{sync::Arc, time::Duration};

    fn parse(line: &str) -> Inbound {
        parse_line(line, "$plant").expect("line parses")
    }

    #[test]
    fn parses_commands_with_names() {
        assert_eq!(
            parse("10 7(Ada Lovelace) $plant sell apple 2"),
            Inbound::Command {
                community: 10,
                member: Member::new(7, "Ada Lovelace"),
                args: vec!["sell".into(), "apple".into(), "2".into()],
            }
        );
    }

    #[test]
    fn bare_prefix_has_no_args() {
        assert_eq!(
            parse("1 2 $plant"),
            Inbound::Command {
                community: 1,
                member: Member::new(2, "member-2"),
                args: Vec::new(),
            }
        );
    }

    #[test]
    fn parses_reactions_and_chatter() {
        assert_eq!(
            parse("1 2(Bo) react 🌱"),
            Inbound::Reaction {
                community: 1,
                member: Member::new(2, "Bo"),
                emoji: "🌱".into(),
            }
        );
        assert_eq!(parse("1 2 hello there"), Inbound::Chatter);
        assert_eq!(parse("not an event"), Inbound::Chatter);
    }

    #[test]
    fn oversized_ids_are_errors() {
        assert!(parse_line("99999999999999999999999 1 $plant", "$plant").is_err());
    }

    #[test]
    fn directory_labels_members_it_has_not_seen() -> Result<()> {
        let directory = ConsoleDirectory::default();
        directory.observe(1, &Member::new(5, "Cy"));
        assert_eq!(directory.display_name(1, 5)?, "Cy");
        assert_eq!(directory.display_name(2, 5)?, "member-5");
        Ok(())
    }

    #[tokio::test]
    async fn dispatch_routes_to_the_community() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let registry = Arc::new(Registry::new(SnapshotStore::new(dir.path())));
        let scheduler = Arc::new(TickScheduler::new(Duration::from_secs(3600)));
        let router = Router::new(registry, scheduler);
        let frontend = ConsoleFrontend::new(&router, "$plant".to_string());
        let directory = ConsoleDirectory::default();

        let out = frontend.dispatch("3 1(Ada) $plant pet", &directory);
        assert_eq!(
            out,
            vec!["[3] Thanks for petting Plant! Its happiness is 60.00%.".to_string()]
        );
        let out = frontend.dispatch("3 1(Ada) $plant bank", &directory);
        assert_eq!(out, vec!["[3] **Ada** has $0.00 (Rank: 1).".to_string()]);
        assert!(frontend.dispatch("3 1 good morning", &directory).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn bank_all_works_after_restart() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SnapshotStore::new(dir.path());
        let mut state = CommunityState::default();
        state.economy.credit(2, 7.5);
        state.economy.credit(1, 3.0);
        store.save(3, &state)?;

        let registry = Arc::new(Registry::new(store));
        let scheduler = Arc::new(TickScheduler::new(Duration::from_secs(3600)));
        let router = Router::new(registry, scheduler);
        let frontend = ConsoleFrontend::new(&router, "$plant".to_string());
        let directory = ConsoleDirectory::default();

        let out = frontend.dispatch("3 1(Ada) $plant bank all", &directory);
        assert_eq!(
            out,
            vec![
                "[3] **Server bank accounts:**\n**member-2** has $7.50.\n**Ada** has $3.00."
                    .to_string()
            ]
        );
        Ok(())
    }
}
