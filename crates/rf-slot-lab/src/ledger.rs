//! Betting ledger: balance, current bet, last win and the selectable bets
//!
//! The ledger has no notion of round state. Gating bet changes to `Idle` is
//! the round controller's job.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LedgerConfig;

/// Ledger operation failure. Never mutates the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("insufficient balance: {balance} < bet {bet}")]
    InsufficientBalance { balance: u64, bet: u64 },

    #[error("bet {0} is not one of the available bets")]
    UnknownBet(u64),

    #[error("available bet list is empty")]
    EmptyBetList,
}

/// Read-only view handed to displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub balance: u64,
    pub bet: u64,
    pub last_win: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BettingLedger {
    balance: u64,
    bet: u64,
    last_win: u64,
    available_bets: Vec<u64>,
}

impl BettingLedger {
    /// Build from config. The initial bet must be one of the available bets.
    pub fn new(config: &LedgerConfig) -> Result<Self, LedgerError> {
        if config.available_bets.is_empty() {
            return Err(LedgerError::EmptyBetList);
        }
        if !config.available_bets.contains(&config.initial_bet) {
            return Err(LedgerError::UnknownBet(config.initial_bet));
        }
        Ok(Self {
            balance: config.initial_balance,
            bet: config.initial_bet,
            last_win: 0,
            available_bets: config.available_bets.clone(),
        })
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn bet(&self) -> u64 {
        self.bet
    }

    pub fn last_win(&self) -> u64 {
        self.last_win
    }

    pub fn available_bets(&self) -> &[u64] {
        &self.available_bets
    }

    pub fn can_place_bet(&self) -> bool {
        self.balance >= self.bet
    }

    /// Deduct the current bet and clear the last win. Returns the amount wagered.
    pub fn place_bet(&mut self) -> Result<u64, LedgerError> {
        if !self.can_place_bet() {
            return Err(LedgerError::InsufficientBalance {
                balance: self.balance,
                bet: self.bet,
            });
        }
        self.balance -= self.bet;
        self.last_win = 0;
        Ok(self.bet)
    }

    pub fn apply_win(&mut self, amount: u64) {
        self.balance = self.balance.saturating_add(amount);
        self.last_win = amount;
    }

    pub fn change_bet(&mut self, value: u64) -> Result<(), LedgerError> {
        if !self.available_bets.contains(&value) {
            return Err(LedgerError::UnknownBet(value));
        }
        self.bet = value;
        Ok(())
    }

    /// The bet following the current one, wrapping after the last
    pub fn next_bet(&self) -> u64 {
        match self.available_bets.iter().position(|&b| b == self.bet) {
            Some(idx) => self.available_bets[(idx + 1) % self.available_bets.len()],
            None => self.available_bets[0],
        }
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            balance: self.balance,
            bet: self.bet,
            last_win: self.last_win,
        }
    }
}

impl Default for BettingLedger {
    fn default() -> Self {
        let config = LedgerConfig::default();
        Self {
            balance: config.initial_balance,
            bet: config.initial_bet,
            last_win: 0,
            available_bets: config.available_bets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn ledger(balance: u64) -> BettingLedger {
        BettingLedger::new(&LedgerConfig {
            initial_balance: balance,
            ..LedgerConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_place_bet_and_win() {
        let mut ledger = ledger(1000);
        assert_eq!(ledger.place_bet(), Ok(1));
        assert_eq!(ledger.balance(), 999);
        assert_eq!(ledger.last_win(), 0);

        ledger.apply_win(30);
        assert_eq!(ledger.snapshot(), LedgerSnapshot { balance: 1029, bet: 1, last_win: 30 });

        ledger.place_bet().unwrap();
        assert_eq!(ledger.last_win(), 0);
    }

    #[test]
    fn test_insufficient_balance_leaves_ledger_untouched() {
        let mut ledger = ledger(4);
        ledger.change_bet(5).unwrap();
        let before = ledger.clone();

        assert!(!ledger.can_place_bet());
        assert_eq!(
            ledger.place_bet(),
            Err(LedgerError::InsufficientBalance { balance: 4, bet: 5 })
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_bet_only_placed_when_covered() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut ledger = ledger(50);
        let mut rejected = 0;

        for _ in 0..2000 {
            match rng.random_range(0..3) {
                0 => {
                    let next = ledger.next_bet();
                    ledger.change_bet(next).unwrap();
                }
                1 => {
                    let before = ledger.balance();
                    let bet = ledger.bet();
                    match ledger.place_bet() {
                        Ok(placed) => {
                            assert!(before >= bet, "bet {bet} placed on balance {before}");
                            assert_eq!(placed, bet);
                            assert_eq!(ledger.balance(), before - bet);
                        }
                        Err(err) => {
                            assert!(before < bet);
                            assert_eq!(err, LedgerError::InsufficientBalance { balance: before, bet });
                            assert_eq!(ledger.balance(), before);
                            rejected += 1;
                        }
                    }
                }
                _ => ledger.apply_win(rng.random_range(0..20)),
            }
        }
        assert!(rejected > 0);
    }

    #[test]
    fn test_change_bet_membership() {
        let mut ledger = ledger(1000);
        for &bet in &[1, 2, 5, 10, 20, 50, 100] {
            assert!(ledger.change_bet(bet).is_ok());
            assert_eq!(ledger.bet(), bet);
        }
        assert_eq!(ledger.change_bet(3), Err(LedgerError::UnknownBet(3)));
        assert_eq!(ledger.bet(), 100);
    }

    #[test]
    fn test_next_bet_wraps() {
        let mut ledger = ledger(1000);
        assert_eq!(ledger.next_bet(), 2);
        ledger.change_bet(100).unwrap();
        assert_eq!(ledger.next_bet(), 1);
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let empty = LedgerConfig {
            available_bets: vec![],
            ..LedgerConfig::default()
        };
        assert_eq!(BettingLedger::new(&empty), Err(LedgerError::EmptyBetList));

        let unknown = LedgerConfig {
            initial_bet: 7,
            ..LedgerConfig::default()
        };
        assert_eq!(BettingLedger::new(&unknown), Err(LedgerError::UnknownBet(7)));
    }
}
