//! Parsing of `$plant` arguments into a closed set of commands.

use std::{collections::HashMap, num::IntErrorKind};

use once_cell::sync::Lazy;

use crate::{catalog::FruitKind, economy::SellOrder};

/// Which accounts a bank query reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankScope {
    /// The caller's balance and rank.
    Caller,
    /// Every tracked account.
    All,
}

/// Argument errors, each answered with a usage hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Usage {
    /// `name` without any text.
    Rename,
    /// `bank` with something other than `all`.
    Bank,
    /// `sell` with the wrong shape.
    Sell,
    /// `sell <fruit> <num>` where num is not a whole number.
    SellCount,
    /// `sell <fruit> <num>` naming no catalog fruit.
    SellFruit(String),
}

impl Usage {
    /// Hint shown to the caller.
    pub fn hint(&self) -> String {
        match self {
            Usage::Rename => "`$plant name <name>`".to_string(),
            Usage::Bank => "`$plant bank [all]`".to_string(),
            Usage::Sell => "`$plant sell <fruit> <num> or $plant sell all`".to_string(),
            Usage::SellCount => "`<num> must be a valid number`".to_string(),
            Usage::SellFruit(name) => {
                let known = FruitKind::ALL
                    .iter()
                    .map(|kind| kind.name())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("`{name}` is not a fruit. Try one of: {known}")
            }
        }
    }
}

/// Every command the router understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// No arguments: show the plant.
    Status,
    /// Bring a dead plant back.
    Respawn,
    /// Add hydration.
    Water,
    /// Add happiness.
    Pet,
    /// Give the plant a new name.
    Rename(String),
    /// Move all fruit into the caller's inventory.
    Harvest,
    /// Show the caller's fruit.
    Inventory,
    /// Show balances.
    Bank(BankScope),
    /// Show fruit prices.
    Market,
    /// Sell fruit from the caller's inventory.
    Sell(SellOrder),
    /// A recognised keyword with malformed arguments.
    Invalid(Usage),
    /// Keyword not in the table.
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Respawn,
    Water,
    Pet,
    Name,
    Harvest,
    Inventory,
    Bank,
    Market,
    Sell,
}

static KEYWORDS: Lazy<HashMap<&'static str, Keyword>> = Lazy::new(|| {
    HashMap::from([
        ("respawn", Keyword::Respawn),
        ("r", Keyword::Respawn),
        ("water", Keyword::Water),
        ("w", Keyword::Water),
        ("pet", Keyword::Pet),
        ("p", Keyword::Pet),
        ("name", Keyword::Name),
        ("n", Keyword::Name),
        ("harvest", Keyword::Harvest),
        ("h", Keyword::Harvest),
        ("inventory", Keyword::Inventory),
        ("i", Keyword::Inventory),
        ("bank", Keyword::Bank),
        ("b", Keyword::Bank),
        ("market", Keyword::Market),
        ("m", Keyword::Market),
        ("sell", Keyword::Sell),
        ("s", Keyword::Sell),
    ])
});

impl Command {
    /// Parse the tokens that followed the command prefix.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Self {
        let Some((head, rest)) = args.split_first() else {
            return Command::Status;
        };
        let head: &str = head.as_ref();
        let rest: Vec<&str> = rest.iter().map(|arg| arg.as_ref()).collect();

        let Some(keyword) = KEYWORDS.get(head) else {
            return Command::Unknown(head.to_string());
        };

        match keyword {
            Keyword::Respawn => Command::Respawn,
            Keyword::Water => Command::Water,
            Keyword::Pet => Command::Pet,
            Keyword::Harvest => Command::Harvest,
            Keyword::Inventory => Command::Inventory,
            Keyword::Market => Command::Market,
            Keyword::Name => {
                let name = rest.join(" ");
                if name.trim().is_empty() {
                    Command::Invalid(Usage::Rename)
                } else {
                    Command::Rename(name)
                }
            }
            Keyword::Bank => match rest.first() {
                None => Command::Bank(BankScope::Caller),
                Some(&"all") => Command::Bank(BankScope::All),
                Some(_) => Command::Invalid(Usage::Bank),
            },
            Keyword::Sell => parse_sell(&rest),
        }
    }
}

fn parse_sell(rest: &[&str]) -> Command {
    match rest {
        [fruit, count, ..] => {
            // Counts beyond `u32` sell everything held.
            let count = match count.parse::<u32>() {
                Ok(count) => count,
                Err(err) if *err.kind() == IntErrorKind::PosOverflow => u32::MAX,
                Err(_) => return Command::Invalid(Usage::SellCount),
            };
            match fruit.parse::<FruitKind>() {
                Ok(kind) => Command::Sell(SellOrder::Kind { kind, count }),
                Err(_) => Command::Invalid(Usage::SellFruit(fruit.to_string())),
            }
        }
        ["all"] => Command::Sell(SellOrder::All),
        _ => Command::Invalid(Usage::Sell),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        let args: Vec<&str> = line.split_whitespace().collect();
        Command::parse(&args)
    }

    #[test]
    fn empty_args_show_status() {
        assert_eq!(parse(""), Command::Status);
    }

    #[test]
    fn aliases_match_full_keywords() {
        for (full, short) in [
            ("respawn", "r"),
            ("water", "w"),
            ("pet", "p"),
            ("harvest", "h"),
            ("inventory", "i"),
            ("bank", "b"),
            ("market", "m"),
        ] {
            assert_eq!(parse(full), parse(short), "{full} vs {short}");
        }
    }

    #[test]
    fn rename_joins_remaining_words() {
        assert_eq!(
            parse("name Sir Leafington III"),
            Command::Rename("Sir Leafington III".to_string())
        );
        assert_eq!(parse("n"), Command::Invalid(Usage::Rename));
    }

    #[test]
    fn bank_scopes() {
        assert_eq!(parse("bank"), Command::Bank(BankScope::Caller));
        assert_eq!(parse("b all"), Command::Bank(BankScope::All));
        assert_eq!(parse("bank everyone"), Command::Invalid(Usage::Bank));
    }

    #[test]
    fn sell_forms() {
        assert_eq!(
            parse("sell apple 2"),
            Command::Sell(SellOrder::Kind {
                kind: FruitKind::Apple,
                count: 2
            })
        );
        assert_eq!(parse("s all"), Command::Sell(SellOrder::All));
        assert_eq!(parse("sell apple lots"), Command::Invalid(Usage::SellCount));
        assert_eq!(parse("sell apple -1"), Command::Invalid(Usage::SellCount));
        assert_eq!(
            parse("sell durian 1"),
            Command::Invalid(Usage::SellFruit("durian".to_string()))
        );
        assert_eq!(parse("sell"), Command::Invalid(Usage::Sell));
        assert_eq!(parse("sell apple"), Command::Invalid(Usage::Sell));
    }

    #[test]
    fn oversized_sell_count_sells_everything_held() {
        let everything = Command::Sell(SellOrder::Kind {
            kind: FruitKind::Apple,
            count: u32::MAX,
        });
        assert_eq!(parse("sell apple 5000000000"), everything);
        assert_eq!(parse("sell apple 99999999999999999999999"), everything);
    }

    #[test]
    fn unknown_keyword_is_explicit() {
        assert_eq!(parse("dance now"), Command::Unknown("dance".to_string()));
    }
}
