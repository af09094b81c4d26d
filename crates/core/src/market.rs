//! Per-community fruit market with mean reversion and random drift.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::FruitKind;

/// Step added each tick to a price sitting below its base.
pub const REVERSION_STEP: f64 = 0.01;
/// Lower bound of the per-tick multiplicative noise.
pub const NOISE_LOW: f64 = 0.98;
/// Upper bound (exclusive) of the per-tick multiplicative noise.
pub const NOISE_HIGH: f64 = 1.0225;
/// Demand factor applied after every unit sold.
pub const SALE_DEPRESSION: f64 = 0.8;
/// Prices are clamped down to this multiple of base before noise is applied.
pub const MAX_BASE_MULTIPLE: f64 = 10.0;
/// Prices never fall below this.
pub const MIN_PRICE: f64 = 0.01;

/// Current prices for every catalog fruit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Market {
    prices: BTreeMap<FruitKind, f64>,
}

impl Default for Market {
    fn default() -> Self {
        Self {
            prices: FruitKind::ALL
                .into_iter()
                .map(|kind| (kind, kind.base_price()))
                .collect(),
        }
    }
}

impl Market {
    /// Current price of `kind`.
    pub fn price(&self, kind: FruitKind) -> f64 {
        self.prices
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.base_price())
    }

    /// Prices in catalog order.
    pub fn quotes(&self) -> impl Iterator<Item = (FruitKind, f64)> + '_ {
        FruitKind::ALL
            .into_iter()
            .map(move |kind| (kind, self.price(kind)))
    }

    /// Sell one unit: return the current price and depress it.
    pub fn sell_one(&mut self, kind: FruitKind) -> f64 {
        let price = self.price(kind);
        self.prices
            .insert(kind, (price * SALE_DEPRESSION).max(MIN_PRICE));
        price
    }

    /// Apply one tick of mean reversion followed by random drift.
    pub fn reprice(&mut self, rng: &mut impl Rng) {
        for kind in FruitKind::ALL {
            let base = kind.base_price();
            let mut price = self.price(kind);
            if price < base {
                price += REVERSION_STEP;
            }
            price = price.min(base * MAX_BASE_MULTIPLE);
            price *= rng.gen_range(NOISE_LOW..NOISE_HIGH);
            self.prices.insert(kind, price.max(MIN_PRICE));
        }
    }

    /// Re-seed any catalog kind missing from a loaded record at its base price.
    pub(crate) fn backfill(&mut self) {
        for kind in FruitKind::ALL {
            if !self.prices.contains_key(&kind) {
                warn!("market record missing {}; seeding base price", kind.name());
                self.prices.insert(kind, kind.base_price());
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn set_price(&mut self, kind: FruitKind, price: f64) {
        self.prices.insert(kind, price);
    }
}
