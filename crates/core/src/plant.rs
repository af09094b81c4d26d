#![allow(missing_docs)]

//! Plant lifecycle: stats, decay and fruit growth.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::FruitKind;

/// Hydration lost per tick (100% drains in ~8.3 hours at a 30s tick).
pub const HYDRATION_DECAY: f64 = 0.1;
/// Multiplicative happiness decay applied every tick.
pub const HAPPINESS_DECAY: f64 = 0.9925;
/// Hydration above this kills the plant.
pub const MAX_HYDRATION: f64 = 200.0;
/// Hydration below this kills the plant.
pub const MIN_HYDRATION: f64 = 0.0;
/// Upper bound for happiness raised by petting.
pub const MAX_HAPPINESS: f64 = 100.0;
/// Hydration added by a single watering.
pub const WATER_AMOUNT: f64 = 10.0;
/// Happiness added by a single pet.
pub const PET_AMOUNT: f64 = 10.0;
/// Fruit stops growing once this many hang on the plant.
pub const MAX_FRUITS: usize = 20;
/// Spawn chance per tick is `happiness / FRUIT_ODDS_DIVISOR`.
pub const FRUIT_ODDS_DIVISOR: f64 = 400.0;

const DEFAULT_NAME: &str = "Plant";
const INITIAL_HYDRATION: f64 = 100.0;
const INITIAL_HAPPINESS: f64 = 50.0;

/// Why a plant died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// Hydration rose above [`MAX_HYDRATION`].
    Overwatering,
    /// Hydration fell below [`MIN_HYDRATION`].
    Underwatering,
}

impl DeathCause {
    /// Lowercase label used in chat messages.
    pub fn label(self) -> &'static str {
        match self {
            DeathCause::Overwatering => "overwatering",
            DeathCause::Underwatering => "underwatering",
        }
    }
}

/// Display-only mood derived from happiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Depressed,
    Sad,
    Wilting,
    Mediocre,
    Happy,
    Joyous,
}

impl Mood {
    /// Map a happiness value onto its mood bucket.
    pub fn from_happiness(happiness: f64) -> Self {
        if happiness <= 1.0 {
            Mood::Depressed
        } else if happiness <= 20.0 {
            Mood::Sad
        } else if happiness <= 40.0 {
            Mood::Wilting
        } else if happiness <= 60.0 {
            Mood::Mediocre
        } else if happiness <= 80.0 {
            Mood::Happy
        } else {
            Mood::Joyous
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mood::Depressed => "Depressed",
            Mood::Sad => "Sad",
            Mood::Wilting => "Wilting",
            Mood::Mediocre => "Mediocre",
            Mood::Happy => "Happy",
            Mood::Joyous => "Joyous",
        }
    }
}

/// What happened to the plant during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Plant was already dead; nothing changed.
    Dormant,
    /// Plant died this tick.
    Died(DeathCause),
    /// Plant survived, possibly growing a fruit.
    Grew(Option<FruitKind>),
}

/// Rejection for actions that need a living plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlantIsDead;

/// Result of a harvest attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Harvest {
    /// Every fruit that was on the plant, in growth order.
    Picked(Vec<FruitKind>),
    /// Nothing was hanging on the plant.
    Empty,
    /// Dead plants cannot be harvested.
    Dead,
}

/// The community plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantState {
    pub name: String,
    pub hydration: f64,
    pub happiness: f64,
    pub alive: bool,
    #[serde(default)]
    pub death_cause: Option<DeathCause>,
    #[serde(default)]
    pub fruits: Vec<FruitKind>,
}

impl Default for PlantState {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            hydration: INITIAL_HYDRATION,
            happiness: INITIAL_HAPPINESS,
            alive: true,
            death_cause: None,
            fruits: Vec::new(),
        }
    }
}

impl PlantState {
    pub fn mood(&self) -> Mood {
        Mood::from_happiness(self.happiness)
    }

    /// Evaluate one tick of decay, death checks and fruit growth.
    pub fn advance(&mut self, rng: &mut impl Rng) -> TickOutcome {
        if !self.alive {
            return TickOutcome::Dormant;
        }

        self.hydration -= HYDRATION_DECAY;
        let cause = if self.hydration > MAX_HYDRATION {
            Some(DeathCause::Overwatering)
        } else if self.hydration < MIN_HYDRATION {
            Some(DeathCause::Underwatering)
        } else {
            None
        };
        if let Some(cause) = cause {
            self.alive = false;
            self.death_cause = Some(cause);
            return TickOutcome::Died(cause);
        }

        self.happiness *= HAPPINESS_DECAY;

        if self.fruits.len() < MAX_FRUITS {
            let roll: f64 = rng.gen();
            if roll <= self.happiness / FRUIT_ODDS_DIVISOR {
                let fruit = FruitKind::random(rng);
                self.fruits.push(fruit);
                return TickOutcome::Grew(Some(fruit));
            }
        }

        TickOutcome::Grew(None)
    }

    /// Add hydration; there is no upper clamp, so overwatering is possible.
    pub fn water(&mut self) -> Result<f64, PlantIsDead> {
        if !self.alive {
            return Err(PlantIsDead);
        }
        self.hydration += WATER_AMOUNT;
        Ok(self.hydration)
    }

    pub fn pet(&mut self) -> Result<f64, PlantIsDead> {
        if !self.alive {
            return Err(PlantIsDead);
        }
        self.happiness = (self.happiness + PET_AMOUNT).min(MAX_HAPPINESS);
        Ok(self.happiness)
    }

    /// Take every fruit off the plant.
    pub fn harvest(&mut self) -> Harvest {
        if !self.alive {
            return Harvest::Dead;
        }
        if self.fruits.is_empty() {
            return Harvest::Empty;
        }
        Harvest::Picked(std::mem::take(&mut self.fruits))
    }

    /// Replace the name, returning the previous one.
    pub fn rename(&mut self, name: impl Into<String>) -> String {
        std::mem::replace(&mut self.name, name.into())
    }

    /// Reset a dead plant to its initial stats. Returns `false` while alive.
    pub fn respawn(&mut self) -> bool {
        if self.alive {
            return false;
        }
        *self = Self::default();
        true
    }
}
