#![allow(missing_docs)]

//! Fixed catalog of fruit kinds the plant can grow.

use std::{fmt, str::FromStr};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Every fruit kind a plant can produce, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FruitKind {
    Apple,
    GreenApple,
    Banana,
    Tangerine,
    Grapes,
    Strawberry,
    Avocado,
    Coconut,
    Cheese,
    Cookie,
    Fish,
    Gem,
}

impl FruitKind {
    /// All kinds in catalog order.
    pub const ALL: [FruitKind; 12] = [
        FruitKind::Apple,
        FruitKind::GreenApple,
        FruitKind::Banana,
        FruitKind::Tangerine,
        FruitKind::Grapes,
        FruitKind::Strawberry,
        FruitKind::Avocado,
        FruitKind::Coconut,
        FruitKind::Cheese,
        FruitKind::Cookie,
        FruitKind::Fish,
        FruitKind::Gem,
    ];

    /// Price the market reverts towards.
    pub fn base_price(self) -> f64 {
        match self {
            FruitKind::Apple => 1.0,
            FruitKind::GreenApple => 1.1,
            FruitKind::Banana => 0.5,
            FruitKind::Tangerine => 1.2,
            FruitKind::Grapes => 4.0,
            FruitKind::Strawberry => 0.4,
            FruitKind::Avocado => 3.0,
            FruitKind::Coconut => 5.0,
            FruitKind::Cheese => 6.0,
            FruitKind::Cookie => 1.5,
            FruitKind::Fish => 7.5,
            FruitKind::Gem => 50.0,
        }
    }

    /// Name members type when selling, e.g. `green_apple`.
    pub fn name(self) -> &'static str {
        match self {
            FruitKind::Apple => "apple",
            FruitKind::GreenApple => "green_apple",
            FruitKind::Banana => "banana",
            FruitKind::Tangerine => "tangerine",
            FruitKind::Grapes => "grapes",
            FruitKind::Strawberry => "strawberry",
            FruitKind::Avocado => "avocado",
            FruitKind::Coconut => "coconut",
            FruitKind::Cheese => "cheese",
            FruitKind::Cookie => "cookie",
            FruitKind::Fish => "fish",
            FruitKind::Gem => "gem",
        }
    }

    /// Chat emoji shortcode, e.g. `:green_apple:`.
    pub fn emoji(self) -> String {
        format!(":{}:", self.name())
    }

    /// Pick a kind uniformly from the catalog.
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for FruitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.emoji())
    }
}

/// Returned when a token names no catalog fruit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown fruit `{0}`")]
pub struct UnknownFruit(pub String);

impl FromStr for FruitKind {
    type Err = UnknownFruit;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let needle = input.trim().trim_matches(':').to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == needle)
            .ok_or_else(|| UnknownFruit(input.to_string()))
    }
}

/// Render a fruit sequence the way chat messages show it.
pub fn join_fruits(fruits: &[FruitKind]) -> String {
    fruits
        .iter()
        .map(|fruit| fruit.emoji())
        .collect::<Vec<_>>()
        .join(" ")
}
