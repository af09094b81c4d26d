//! Member balances, inventories and fruit sales.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{catalog::FruitKind, market::Market, MemberId};

/// One tracked bank account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Owner of the account.
    pub member: MemberId,
    /// Accumulated sale revenue.
    pub balance: f64,
}

/// Which fruit a sale should take from the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellOrder {
    /// Up to `count` units of a single kind.
    Kind {
        /// Fruit to sell.
        kind: FruitKind,
        /// Maximum number of units.
        count: u32,
    },
    /// Every fruit held, whatever its kind.
    All,
}

/// Outcome of a completed sale.
#[derive(Debug, Clone, PartialEq)]
pub struct Sale {
    /// Units removed from the inventory.
    pub sold: usize,
    /// Sum of the per-unit prices.
    pub revenue: f64,
    /// Balance after the credit.
    pub balance: f64,
}

/// A member's place on the leaderboard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Standing {
    /// Current balance (zero for untracked members).
    pub balance: f64,
    /// 1-based rank by descending balance.
    pub rank: usize,
}

/// Everything that survives a plant respawn.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EconomyState {
    /// Accounts in the order they were opened.
    #[serde(default)]
    pub accounts: Vec<Account>,
    /// Unsold fruit per member, in the order it was received.
    #[serde(default)]
    pub inventories: BTreeMap<MemberId, Vec<FruitKind>>,
    /// Current fruit prices.
    #[serde(default)]
    pub market: Market,
}

impl EconomyState {
    /// Balance of `member`, if an account exists.
    pub fn balance(&self, member: MemberId) -> Option<f64> {
        self.accounts
            .iter()
            .find(|account| account.member == member)
            .map(|account| account.balance)
    }

    /// Fruit held by `member`; empty when nothing was ever received.
    pub fn inventory(&self, member: MemberId) -> &[FruitKind] {
        self.inventories
            .get(&member)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Append freshly harvested fruit to the member's inventory.
    pub fn stash(&mut self, member: MemberId, fruits: impl IntoIterator<Item = FruitKind>) {
        self.inventories.entry(member).or_default().extend(fruits);
    }

    /// Credit `amount`, opening the account on first use. Returns the new balance.
    pub fn credit(&mut self, member: MemberId, amount: f64) -> f64 {
        match self
            .accounts
            .iter_mut()
            .find(|account| account.member == member)
        {
            Some(account) => {
                account.balance += amount;
                account.balance
            }
            None => {
                self.accounts.push(Account {
                    member,
                    balance: amount,
                });
                amount
            }
        }
    }

    /// Sell fruit from the member's inventory at current market prices.
    ///
    /// Units are taken in inventory order. Each unit is paid at the price in
    /// effect when it is sold, and that price is depressed before the next
    /// unit. Returns `None` when nothing was eligible.
    pub fn sell(&mut self, member: MemberId, order: SellOrder) -> Option<Sale> {
        let inventory = self.inventories.get_mut(&member)?;

        let limit = match order {
            SellOrder::Kind { count, .. } => count as usize,
            SellOrder::All => usize::MAX,
        };
        let mut sold = 0;
        let mut revenue = 0.0;
        let mut kept = Vec::with_capacity(inventory.len());
        for fruit in inventory.drain(..) {
            let eligible = match order {
                SellOrder::Kind { kind, .. } => fruit == kind,
                SellOrder::All => true,
            };
            if eligible && sold < limit {
                revenue += self.market.sell_one(fruit);
                sold += 1;
            } else {
                kept.push(fruit);
            }
        }
        *inventory = kept;

        if sold == 0 {
            return None;
        }
        let balance = self.credit(member, revenue);
        Some(Sale {
            sold,
            revenue,
            balance,
        })
    }

    /// Accounts sorted by descending balance; ties keep opening order.
    pub fn leaderboard(&self) -> Vec<Account> {
        let mut ranked = self.accounts.clone();
        ranked.sort_by(|a, b| b.balance.total_cmp(&a.balance));
        ranked
    }

    /// Balance and rank for `member` without opening an account.
    pub fn standing(&self, member: MemberId) -> Standing {
        let ranked = self.leaderboard();
        match ranked.iter().position(|account| account.member == member) {
            Some(index) => Standing {
                balance: ranked[index].balance,
                rank: index + 1,
            },
            None => Standing {
                balance: 0.0,
                rank: ranked.len() + 1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: MemberId = 1;
    const BOB: MemberId = 2;
    const CAROL: MemberId = 3;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn selling_two_of_three_apples() {
        let mut economy = EconomyState::default();
        economy.stash(ALICE, [FruitKind::Apple; 3]);

        let sale = economy
            .sell(
                ALICE,
                SellOrder::Kind {
                    kind: FruitKind::Apple,
                    count: 2,
                },
            )
            .expect("apples were held");

        assert_eq!(sale.sold, 2);
        assert!(approx(sale.revenue, 1.8));
        assert!(approx(sale.balance, 1.8));
        assert_eq!(economy.inventory(ALICE), &[FruitKind::Apple]);
        assert!(approx(economy.market.price(FruitKind::Apple), 0.64));
    }

    #[test]
    fn per_unit_revenue_strictly_decreases() {
        let mut economy = EconomyState::default();
        economy.stash(ALICE, [FruitKind::Fish; 6]);

        let mut previous = f64::INFINITY;
        for remaining in (1..=5).rev() {
            let sale = economy
                .sell(
                    ALICE,
                    SellOrder::Kind {
                        kind: FruitKind::Fish,
                        count: 1,
                    },
                )
                .expect("fish were held");
            assert!(sale.revenue < previous);
            assert_eq!(economy.inventory(ALICE).len(), remaining);
            previous = sale.revenue;
        }
    }

    #[test]
    fn sell_kind_leaves_other_fruit_in_order() {
        let mut economy = EconomyState::default();
        economy.stash(
            ALICE,
            [
                FruitKind::Banana,
                FruitKind::Gem,
                FruitKind::Banana,
                FruitKind::Cookie,
            ],
        );
        economy.sell(
            ALICE,
            SellOrder::Kind {
                kind: FruitKind::Banana,
                count: 5,
            },
        );
        assert_eq!(
            economy.inventory(ALICE),
            &[FruitKind::Gem, FruitKind::Cookie]
        );
    }

    #[test]
    fn sell_all_prices_each_unit_in_order() {
        let mut economy = EconomyState::default();
        economy.stash(ALICE, [FruitKind::Apple, FruitKind::Banana, FruitKind::Apple]);

        let sale = economy.sell(ALICE, SellOrder::All).expect("fruit was held");

        assert_eq!(sale.sold, 3);
        assert!(approx(sale.revenue, 1.0 + 0.5 + 0.8));
        assert!(economy.inventory(ALICE).is_empty());
    }

    #[test]
    fn nothing_eligible_means_no_sale() {
        let mut economy = EconomyState::default();
        assert_eq!(economy.sell(ALICE, SellOrder::All), None);

        economy.stash(ALICE, [FruitKind::Apple]);
        let zero = SellOrder::Kind {
            kind: FruitKind::Apple,
            count: 0,
        };
        let missing = SellOrder::Kind {
            kind: FruitKind::Gem,
            count: 3,
        };
        assert_eq!(economy.sell(ALICE, zero), None);
        assert_eq!(economy.sell(ALICE, missing), None);
        assert_eq!(economy.balance(ALICE), None);
        assert_eq!(economy.market, Market::default());
    }

    #[test]
    fn leaderboard_orders_by_balance() {
        let mut economy = EconomyState::default();
        economy.credit(ALICE, 50.0);
        economy.credit(BOB, 10.0);
        economy.credit(CAROL, 30.0);

        let balances: Vec<f64> = economy
            .leaderboard()
            .iter()
            .map(|account| account.balance)
            .collect();
        assert_eq!(balances, vec![50.0, 30.0, 10.0]);
        assert_eq!(economy.standing(BOB).rank, 3);
    }

    #[test]
    fn ties_keep_opening_order() {
        let mut economy = EconomyState::default();
        economy.credit(CAROL, 5.0);
        economy.credit(ALICE, 5.0);
        economy.credit(BOB, 7.0);

        let members: Vec<MemberId> = economy
            .leaderboard()
            .iter()
            .map(|account| account.member)
            .collect();
        assert_eq!(members, vec![BOB, CAROL, ALICE]);
    }

    #[test]
    fn standing_does_not_open_accounts() {
        let mut economy = EconomyState::default();
        economy.credit(ALICE, 2.0);
        let before = economy.clone();

        let standing = economy.standing(BOB);
        assert_eq!(standing.balance, 0.0);
        assert_eq!(standing.rank, 2);
        assert_eq!(economy, before);
    }
}
