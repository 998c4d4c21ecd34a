//! Ledger arithmetic and the store abstraction used by settlement.
//!
//! Every party owns a [`LedgerAccount`] with a spendable `stake` and an
//! escrowed `locked` balance. Seized funds leave the party and land in the
//! protocol kitty. Handlers never touch balances directly: they go through a
//! [`LedgerStore`], which lets the same matching and settlement code run over
//! program accounts on-chain and over [`MemoryLedger`] in tests and
//! simulations.

use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::errors::PocoError;
use crate::state::LedgerAccount;

impl LedgerAccount {
    /// Move `amount` from stake into escrow
    pub fn lock(&mut self, amount: u64) -> Result<()> {
        require!(self.stake >= amount, PocoError::InsufficientStake);
        self.stake -= amount;
        self.locked = self
            .locked
            .checked_add(amount)
            .ok_or(PocoError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Release `amount` from escrow back into stake
    pub fn unlock(&mut self, amount: u64) -> Result<()> {
        require!(self.locked >= amount, PocoError::InsufficientLocked);
        self.locked -= amount;
        self.stake = self
            .stake
            .checked_add(amount)
            .ok_or(PocoError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Remove `amount` from escrow. The caller decides where it goes.
    pub fn spend_locked(&mut self, amount: u64) -> Result<()> {
        require!(self.locked >= amount, PocoError::InsufficientLocked);
        self.locked -= amount;
        Ok(())
    }

    /// Credit `amount` to stake
    pub fn credit(&mut self, amount: u64) -> Result<()> {
        self.stake = self
            .stake
            .checked_add(amount)
            .ok_or(PocoError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Debit `amount` from stake
    pub fn debit(&mut self, amount: u64) -> Result<()> {
        require!(self.stake >= amount, PocoError::InsufficientStake);
        self.stake -= amount;
        Ok(())
    }

    pub fn total(&self) -> Option<u64> {
        self.stake.checked_add(self.locked)
    }
}

/// Key-indexed ledger with a kitty.
///
/// Implementors provide account lookup; the balance operations are shared.
/// Lookups fail with `LedgerNotFound` for unknown parties.
pub trait LedgerStore {
    fn account(&self, owner: &Pubkey) -> Result<&LedgerAccount>;

    fn account_mut(&mut self, owner: &Pubkey) -> Result<&mut LedgerAccount>;

    fn kitty(&self) -> u64;

    fn kitty_mut(&mut self) -> &mut u64;

    fn stake_of(&self, owner: &Pubkey) -> Result<u64> {
        Ok(self.account(owner)?.stake)
    }

    fn locked_of(&self, owner: &Pubkey) -> Result<u64> {
        Ok(self.account(owner)?.locked)
    }

    fn lock(&mut self, owner: &Pubkey, amount: u64) -> Result<()> {
        self.account_mut(owner)?.lock(amount)
    }

    fn unlock(&mut self, owner: &Pubkey, amount: u64) -> Result<()> {
        self.account_mut(owner)?.unlock(amount)
    }

    /// Pay `amount` out of the owner's escrow; the receivers are rewarded separately
    fn spend_locked(&mut self, owner: &Pubkey, amount: u64) -> Result<()> {
        self.account_mut(owner)?.spend_locked(amount)
    }

    fn reward(&mut self, owner: &Pubkey, amount: u64) -> Result<()> {
        self.account_mut(owner)?.credit(amount)
    }

    /// Move `amount` of the owner's escrow into the kitty
    fn seize(&mut self, owner: &Pubkey, amount: u64) -> Result<()> {
        self.account_mut(owner)?.spend_locked(amount)?;
        let kitty = self.kitty_mut();
        *kitty = kitty
            .checked_add(amount)
            .ok_or(PocoError::ArithmeticOverflow)?;
        Ok(())
    }

    fn pay_from_kitty(&mut self, owner: &Pubkey, amount: u64) -> Result<()> {
        require!(self.kitty() >= amount, PocoError::InsufficientKitty);
        self.account_mut(owner)?.credit(amount)?;
        *self.kitty_mut() -= amount;
        Ok(())
    }
}

/// Lock a deal's escrow: the payer's price and the scheduler's stake.
///
/// Both balances are checked before either lock, so a failure leaves the
/// store untouched. A payer who is also the scheduler must cover both.
pub fn lock_deal_escrow<L: LedgerStore>(
    ledger: &mut L,
    payer: &Pubkey,
    payer_lock: u64,
    scheduler: &Pubkey,
    scheduler_lock: u64,
) -> Result<()> {
    let payer_needs = if payer == scheduler {
        payer_lock
            .checked_add(scheduler_lock)
            .ok_or(PocoError::ArithmeticOverflow)?
    } else {
        payer_lock
    };
    require!(
        ledger.stake_of(payer)? >= payer_needs,
        PocoError::InsufficientStake
    );
    require!(
        ledger.stake_of(scheduler)? >= scheduler_lock,
        PocoError::InsufficientStake
    );
    ledger.lock(payer, payer_lock)?;
    ledger.lock(scheduler, scheduler_lock)
}

/// In-memory ledger used by unit tests and the simulation crate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryLedger {
    pub accounts: BTreeMap<Pubkey, LedgerAccount>,
    pub kitty: u64,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or top up) an account with `stake` spendable funds
    pub fn deposit(&mut self, owner: Pubkey, stake: u64) -> Result<()> {
        self.accounts
            .entry(owner)
            .or_insert_with(|| LedgerAccount {
                owner,
                ..LedgerAccount::default()
            })
            .credit(stake)
    }

    /// Sum of every balance plus the kitty. Constant under lock, unlock,
    /// seize, reward-from-escrow and kitty payouts.
    pub fn total_value(&self) -> Option<u64> {
        self.accounts
            .values()
            .try_fold(self.kitty, |sum, account| sum.checked_add(account.total()?))
    }
}

impl LedgerStore for MemoryLedger {
    fn account(&self, owner: &Pubkey) -> Result<&LedgerAccount> {
        self.accounts
            .get(owner)
            .ok_or_else(|| error!(PocoError::LedgerNotFound))
    }

    fn account_mut(&mut self, owner: &Pubkey) -> Result<&mut LedgerAccount> {
        self.accounts
            .get_mut(owner)
            .ok_or_else(|| error!(PocoError::LedgerNotFound))
    }

    fn kitty(&self) -> u64 {
        self.kitty
    }

    fn kitty_mut(&mut self) -> &mut u64 {
        &mut self.kitty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod account_tests {
        use super::*;

        fn account(stake: u64, locked: u64) -> LedgerAccount {
            LedgerAccount {
                stake,
                locked,
                ..LedgerAccount::default()
            }
        }

        #[test]
        fn test_lock_moves_stake_into_escrow() {
            let mut ledger = account(100, 0);
            ledger.lock(40).unwrap();
            assert_eq!((ledger.stake, ledger.locked), (60, 40));
        }

        #[test]
        fn test_lock_insufficient_stake_leaves_account_untouched() {
            let mut ledger = account(10, 5);
            assert!(ledger.lock(11).is_err());
            assert_eq!(ledger, account(10, 5));
        }

        #[test]
        fn test_unlock_and_spend_require_escrow() {
            let mut ledger = account(0, 5);
            assert!(ledger.unlock(6).is_err());
            assert!(ledger.spend_locked(6).is_err());
            ledger.unlock(2).unwrap();
            ledger.spend_locked(3).unwrap();
            assert_eq!(ledger, account(2, 0));
        }

        #[test]
        fn test_credit_overflow() {
            let mut ledger = account(u64::MAX, 0);
            assert!(ledger.credit(1).is_err());
        }

        #[test]
        fn test_debit() {
            let mut ledger = account(5, 0);
            assert!(ledger.debit(6).is_err());
            ledger.debit(5).unwrap();
            assert_eq!(ledger.stake, 0);
        }
    }

    mod store_tests {
        use super::*;

        #[test]
        fn test_unknown_party_is_not_found() {
            let mut ledger = MemoryLedger::new();
            assert!(ledger.stake_of(&Pubkey::new_unique()).is_err());
            assert!(ledger.reward(&Pubkey::new_unique(), 1).is_err());
        }

        #[test]
        fn test_seize_feeds_kitty_and_payout_drains_it() {
            let alice = Pubkey::new_unique();
            let bob = Pubkey::new_unique();
            let mut ledger = MemoryLedger::new();
            ledger.deposit(alice, 50).unwrap();
            ledger.deposit(bob, 0).unwrap();
            let total = ledger.total_value().unwrap();

            ledger.lock(&alice, 30).unwrap();
            ledger.seize(&alice, 30).unwrap();
            assert_eq!(ledger.kitty(), 30);
            assert_eq!(ledger.locked_of(&alice).unwrap(), 0);

            assert!(ledger.pay_from_kitty(&bob, 31).is_err());
            ledger.pay_from_kitty(&bob, 12).unwrap();
            assert_eq!(ledger.kitty(), 18);
            assert_eq!(ledger.stake_of(&bob).unwrap(), 12);
            assert_eq!(ledger.total_value().unwrap(), total);
        }

        #[test]
        fn test_spend_then_reward_conserves_value() {
            let payer = Pubkey::new_unique();
            let payee = Pubkey::new_unique();
            let mut ledger = MemoryLedger::new();
            ledger.deposit(payer, 29).unwrap();
            ledger.deposit(payee, 0).unwrap();
            let total = ledger.total_value().unwrap();

            ledger.lock(&payer, 29).unwrap();
            ledger.spend_locked(&payer, 29).unwrap();
            ledger.reward(&payee, 29).unwrap();
            assert_eq!(ledger.total_value().unwrap(), total);
            assert_eq!(ledger.stake_of(&payee).unwrap(), 29);
        }
    }

    mod escrow_tests {
        use super::*;

        fn funded(payer_stake: u64, scheduler_stake: u64) -> (MemoryLedger, Pubkey, Pubkey) {
            let payer = Pubkey::new_unique();
            let scheduler = Pubkey::new_unique();
            let mut ledger = MemoryLedger::new();
            ledger.deposit(payer, payer_stake).unwrap();
            ledger.deposit(scheduler, scheduler_stake).unwrap();
            (ledger, payer, scheduler)
        }

        #[test]
        fn test_locks_both_sides() {
            let (mut ledger, payer, scheduler) = funded(145, 40);
            lock_deal_escrow(&mut ledger, &payer, 145, &scheduler, 40).unwrap();
            assert_eq!(ledger.locked_of(&payer).unwrap(), 145);
            assert_eq!(ledger.locked_of(&scheduler).unwrap(), 40);
            assert_eq!(ledger.stake_of(&payer).unwrap(), 0);
        }

        #[test]
        fn test_underfunded_scheduler_leaves_payer_unlocked() {
            let (mut ledger, payer, scheduler) = funded(145, 39);
            let before = ledger.clone();
            let err = lock_deal_escrow(&mut ledger, &payer, 145, &scheduler, 40).unwrap_err();
            assert_eq!(err, error!(PocoError::InsufficientStake));
            assert_eq!(ledger, before);
            assert_eq!(ledger.locked_of(&payer).unwrap(), 0);
        }

        #[test]
        fn test_underfunded_payer_rejected() {
            let (mut ledger, payer, scheduler) = funded(144, 40);
            let before = ledger.clone();
            assert!(lock_deal_escrow(&mut ledger, &payer, 145, &scheduler, 40).is_err());
            assert_eq!(ledger, before);
        }

        #[test]
        fn test_payer_acting_as_scheduler_covers_both() {
            let (mut ledger, payer, _) = funded(150, 0);
            let before = ledger.clone();
            assert!(lock_deal_escrow(&mut ledger, &payer, 145, &payer, 40).is_err());
            assert_eq!(ledger, before);

            ledger.deposit(payer, 35).unwrap();
            lock_deal_escrow(&mut ledger, &payer, 145, &payer, 40).unwrap();
            assert_eq!(ledger.locked_of(&payer).unwrap(), 185);
        }

        #[test]
        fn test_missing_scheduler_ledger() {
            let (mut ledger, payer, _) = funded(145, 0);
            let before = ledger.clone();
            let err = lock_deal_escrow(&mut ledger, &payer, 145, &Pubkey::new_unique(), 1).unwrap_err();
            assert_eq!(err, error!(PocoError::LedgerNotFound));
            assert_eq!(ledger, before);
        }
    }
}
