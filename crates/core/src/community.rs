//! One community's plant and economy, and the manager that serialises access to them.

use parking_lot::Mutex;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::{
    catalog::join_fruits,
    command::{BankScope, Command},
    directory::{Member, MemberDirectory},
    economy::{EconomyState, SellOrder},
    error::SnapshotError,
    plant::{Harvest, PlantState, TickOutcome},
    reply::{money, percent, Reply, UNKNOWN_COMMAND_REACTION},
    snapshot::{SnapshotRecord, SnapshotStore},
    CommunityId,
};

/// Everything persisted for a community.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommunityState {
    /// The shared plant.
    pub plant: PlantState,
    /// Balances, inventories and prices.
    pub economy: EconomyState,
}

impl CommunityState {
    /// Advance the plant and the market by one tick.
    pub fn advance_one_tick(&mut self, rng: &mut impl Rng) -> TickOutcome {
        let outcome = self.plant.advance(rng);
        self.economy.market.reprice(rng);
        outcome
    }

    /// Respawn the plant, leaving the economy untouched.
    fn respawn(&mut self) -> Reply {
        if self.plant.respawn() {
            Reply::text("Respawned the plant.")
        } else {
            Reply::text(format!(
                "Cannot respawn the plant because {} is still alive.",
                self.plant.name
            ))
        }
    }

    fn status(&self) -> Vec<Reply> {
        let plant = &self.plant;
        if plant.alive {
            let fruits = if plant.fruits.is_empty() {
                "None".to_string()
            } else {
                join_fruits(&plant.fruits)
            };
            vec![
                Reply::text(":potted_plant:"),
                Reply::text(format!(
                    "*{}*\n**Hydration:** {}\n**Happiness:** {} ({})\n**Fruits:** {}",
                    plant.name,
                    percent(plant.hydration),
                    percent(plant.happiness),
                    plant.mood().label(),
                    fruits
                )),
            ]
        } else {
            let cause = plant
                .death_cause
                .map(|cause| cause.label())
                .unwrap_or("unknown causes");
            vec![
                Reply::text(":skull:"),
                Reply::text(format!(
                    "*{}*\n**Plant died due to {}**.",
                    plant.name, cause
                )),
            ]
        }
    }

    fn water(&mut self) -> Reply {
        match self.plant.water() {
            Ok(hydration) => Reply::text(format!(
                "Thanks for watering {}! Its hydration is {}.",
                self.plant.name,
                percent(hydration)
            )),
            Err(_) => Reply::text(format!(
                "You cannot water {} because it died.",
                self.plant.name
            )),
        }
    }

    fn pet(&mut self) -> Reply {
        match self.plant.pet() {
            Ok(happiness) => Reply::text(format!(
                "Thanks for petting {}! Its happiness is {}.",
                self.plant.name,
                percent(happiness)
            )),
            Err(_) => Reply::text(format!(
                "You cannot pet {} because it died.",
                self.plant.name
            )),
        }
    }

    fn rename(&mut self, name: &str) -> Reply {
        let old = self.plant.rename(name.trim());
        Reply::text(format!("{old} renamed to {}.", self.plant.name))
    }

    fn harvest(&mut self, member: &Member) -> Reply {
        match self.plant.harvest() {
            Harvest::Picked(fruits) => {
                let line = join_fruits(&fruits);
                self.economy.stash(member.id, fruits);
                Reply::text(format!("You harvested the plant, receiving: {line}"))
            }
            Harvest::Empty => Reply::text("There are no fruit to harvest."),
            Harvest::Dead => Reply::text(format!(
                "You cannot harvest {} because it died.",
                self.plant.name
            )),
        }
    }

    fn inventory(&self, member: &Member) -> Reply {
        let inventory = self.economy.inventory(member.id);
        if inventory.is_empty() {
            Reply::text("Your inventory is empty.")
        } else {
            Reply::text(format!("Your inventory: {}", join_fruits(inventory)))
        }
    }

    fn market(&self) -> Reply {
        let mut body = "**Fruit market prices:**".to_string();
        for (kind, price) in self.economy.market.quotes() {
            body.push_str(&format!("\n{} {}", kind.emoji(), money(price)));
        }
        Reply::text(body)
    }

    fn sell(&mut self, member: &Member, order: SellOrder) -> Reply {
        let Some(sale) = self.economy.sell(member.id, order) else {
            return Reply::text("No fruits were sold.");
        };
        let what = match order {
            SellOrder::Kind { kind, .. } => kind.emoji(),
            SellOrder::All => "fruit".to_string(),
        };
        Reply::text(format!(
            "You sold {} {} for {}. You now have {}.",
            sale.sold,
            what,
            money(sale.revenue),
            money(sale.balance)
        ))
    }

    fn bank(&self, member: &Member) -> Reply {
        let standing = self.economy.standing(member.id);
        Reply::text(format!(
            "**{}** has {} (Rank: {}).",
            member.display_name,
            money(standing.balance),
            standing.rank
        ))
    }
}

/// Owns one community's state behind a single lock.
///
/// Commands and ticks both go through the lock, so a snapshot is always
/// captured between mutations, never in the middle of one.
pub struct CommunityManager {
    id: CommunityId,
    store: SnapshotStore,
    state: Mutex<CommunityState>,
    // Held across each snapshot write; taken before `state` is released.
    writing: Mutex<()>,
}

impl CommunityManager {
    /// Load the community from `store`, or start fresh when no record exists.
    pub fn open(id: CommunityId, store: SnapshotStore) -> Result<Self, SnapshotError> {
        let state = match store.load(id)? {
            Some(record) => {
                info!(community = id, saved_at = %record.saved_at, "restored community snapshot");
                record.into_state()
            }
            None => {
                info!(community = id, "no snapshot found; planting a new plant");
                CommunityState::default()
            }
        };
        Ok(Self::with_state(id, store, state))
    }

    /// Wrap an existing state without touching disk.
    pub fn with_state(id: CommunityId, store: SnapshotStore, state: CommunityState) -> Self {
        Self {
            id,
            store,
            state: Mutex::new(state),
            writing: Mutex::new(()),
        }
    }

    /// Community this manager owns.
    pub fn id(&self) -> CommunityId {
        self.id
    }

    /// Clone of the current state.
    pub fn state(&self) -> CommunityState {
        self.state.lock().clone()
    }

    /// Run one tick with the thread-local rng and persist the result.
    pub fn tick(&self) -> Result<TickOutcome, SnapshotError> {
        self.tick_with(&mut rand::thread_rng())
    }

    /// Run one tick and persist the result.
    ///
    /// The record is encoded under the state lock and written after it is
    /// released, so commands are not blocked on disk. Writes are ordered by a
    /// second lock acquired before the state is released, so concurrent ticks
    /// land on disk in the order they advanced the state. A failed write
    /// leaves the in-memory state advanced.
    pub fn tick_with(&self, rng: &mut impl Rng) -> Result<TickOutcome, SnapshotError> {
        let mut state = self.state.lock();
        let outcome = state.advance_one_tick(rng);
        let bytes = SnapshotRecord::capture(self.id, &state).encode();
        let _writing = self.writing.lock();
        drop(state);

        match outcome {
            TickOutcome::Died(cause) => {
                info!(community = self.id, cause = cause.label(), "plant died")
            }
            TickOutcome::Grew(Some(fruit)) => {
                debug!(community = self.id, fruit = fruit.name(), "fruit grew")
            }
            _ => {}
        }

        self.store.write(self.id, &bytes?)?;
        Ok(outcome)
    }

    /// Apply `command` on behalf of `member`.
    pub fn handle(
        &self,
        member: &Member,
        command: &Command,
        directory: &impl MemberDirectory,
    ) -> Vec<Reply> {
        if let Command::Bank(BankScope::All) = command {
            return vec![self.bank_all(directory)];
        }

        let mut state = self.state.lock();
        match command {
            Command::Status => state.status(),
            Command::Respawn => vec![state.respawn()],
            Command::Water => vec![state.water()],
            Command::Pet => vec![state.pet()],
            Command::Rename(name) => vec![state.rename(name)],
            Command::Harvest => vec![state.harvest(member)],
            Command::Inventory => vec![state.inventory(member)],
            Command::Bank(_) => vec![state.bank(member)],
            Command::Market => vec![state.market()],
            Command::Sell(order) => vec![state.sell(member, *order)],
            Command::Invalid(usage) => vec![Reply::text(usage.hint())],
            Command::Unknown(keyword) => {
                debug!(community = self.id, keyword = %keyword, "unknown command");
                vec![Reply::React(UNKNOWN_COMMAND_REACTION.to_string())]
            }
        }
    }

    // Name lookups may hit the platform, so they run outside the lock.
    fn bank_all(&self, directory: &impl MemberDirectory) -> Reply {
        let ranked = self.state.lock().economy.leaderboard();
        if ranked.is_empty() {
            return Reply::text("**Server bank accounts:**\nNobody has sold any fruit yet.");
        }

        let mut body = "**Server bank accounts:**".to_string();
        for account in ranked {
            match directory.display_name(self.id, account.member) {
                Ok(name) => {
                    body.push_str(&format!("\n**{name}** has {}.", money(account.balance)))
                }
                Err(err) => {
                    warn!(community = self.id, "bank listing failed: {err}");
                    return Reply::text(format!("Could not list bank accounts: {err}"));
                }
            }
        }
        Reply::text(body)
    }
}
