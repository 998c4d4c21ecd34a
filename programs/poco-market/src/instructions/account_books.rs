//! Program accounts passed through `remaining_accounts`.
//!
//! Settlement touches a variable set of parties, so their ledger, score and
//! contribution accounts arrive as remaining accounts. Each book loads its
//! accounts once, validates ownership and identity, hands out typed values
//! to the pure helpers and writes every value back on `commit`.

use anchor_lang::prelude::*;

use crate::errors::PocoError;
use crate::instructions::ledger_helpers::LedgerStore;
use crate::instructions::score_helpers::ScoreStore;
use crate::state::{Contribution, LedgerAccount, Task, WorkerScore};

/// Deserialize a program-owned account
pub fn load_program_account<T: AccountDeserialize>(
    info: &AccountInfo,
    program_id: &Pubkey,
) -> Result<T> {
    // Ownership first: anyone can fake the discriminator of a foreign account
    require!(info.owner == program_id, PocoError::InvalidAccountOwner);
    let data = info.try_borrow_data()?;
    T::try_deserialize(&mut &**data)
}

/// Serialize `value` over the whole account data, discriminator included
pub fn store_program_account<T: AccountSerialize>(info: &AccountInfo, value: &T) -> Result<()> {
    require!(info.is_writable, PocoError::InvalidInput);
    let mut data = info.try_borrow_mut_data()?;
    let mut writer: &mut [u8] = &mut data;
    value.try_serialize(&mut writer)?;
    Ok(())
}

/// Split `remaining` into the first `count` accounts and the rest
pub fn split_remaining<'a, 'info>(
    remaining: &'a [AccountInfo<'info>],
    count: usize,
) -> Result<(&'a [AccountInfo<'info>], &'a [AccountInfo<'info>])> {
    require!(remaining.len() >= count, PocoError::InvalidInput);
    Ok(remaining.split_at(count))
}

/// Ledger accounts of every party a settlement pays or charges
pub struct LedgerBook<'a, 'info> {
    entries: Vec<(&'a AccountInfo<'info>, LedgerAccount)>,
    kitty: u64,
}

impl<'a, 'info> LedgerBook<'a, 'info> {
    pub fn load(infos: &'a [AccountInfo<'info>], program_id: &Pubkey, kitty: u64) -> Result<Self> {
        let mut entries: Vec<(&'a AccountInfo<'info>, LedgerAccount)> =
            Vec::with_capacity(infos.len());
        for info in infos {
            let ledger: LedgerAccount = load_program_account(info, program_id)?;
            require!(
                !entries
                    .iter()
                    .any(|(seen, account)| seen.key == info.key || account.owner == ledger.owner),
                PocoError::DuplicateLedgerAccount
            );
            entries.push((info, ledger));
        }
        Ok(Self { entries, kitty })
    }

    /// Fail unless every `owner` has a ledger in the book
    pub fn require_owners(&self, owners: &[Pubkey]) -> Result<()> {
        for owner in owners {
            self.account(owner)?;
        }
        Ok(())
    }

    /// Write every ledger back and return the kitty balance
    pub fn commit(self) -> Result<u64> {
        for (info, ledger) in &self.entries {
            store_program_account(info, ledger)?;
        }
        Ok(self.kitty)
    }
}

impl LedgerStore for LedgerBook<'_, '_> {
    fn account(&self, owner: &Pubkey) -> Result<&LedgerAccount> {
        self.entries
            .iter()
            .find(|(_, account)| account.owner == *owner)
            .map(|(_, account)| account)
            .ok_or_else(|| error!(PocoError::LedgerNotFound))
    }

    fn account_mut(&mut self, owner: &Pubkey) -> Result<&mut LedgerAccount> {
        self.entries
            .iter_mut()
            .find(|(_, account)| account.owner == *owner)
            .map(|(_, account)| account)
            .ok_or_else(|| error!(PocoError::LedgerNotFound))
    }

    fn kitty(&self) -> u64 {
        self.kitty
    }

    fn kitty_mut(&mut self) -> &mut u64 {
        &mut self.kitty
    }
}

/// Contribution accounts of a task, in `task.contributors` order
pub struct ContributionBook<'a, 'info> {
    infos: &'a [AccountInfo<'info>],
    pub contributions: Vec<Contribution>,
}

impl<'a, 'info> ContributionBook<'a, 'info> {
    pub fn load(infos: &'a [AccountInfo<'info>], task: &Task, program_id: &Pubkey) -> Result<Self> {
        require!(
            infos.len() == task.contributors.len(),
            PocoError::ContributionAccountMismatch
        );
        let contributions = infos
            .iter()
            .zip(task.contributors.iter())
            .map(|(info, worker)| {
                let contribution: Contribution = load_program_account(info, program_id)?;
                require!(
                    contribution.task_id == task.task_id && contribution.worker == *worker,
                    PocoError::ContributionAccountMismatch
                );
                Ok(contribution)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            infos,
            contributions,
        })
    }

    pub fn commit(&self) -> Result<()> {
        for (info, contribution) in self.infos.iter().zip(self.contributions.iter()) {
            store_program_account(info, contribution)?;
        }
        Ok(())
    }
}

/// Worker score accounts, one per contributor in `task.contributors` order
pub struct ScoreBook<'a, 'info> {
    entries: Vec<(&'a AccountInfo<'info>, WorkerScore)>,
}

impl<'a, 'info> ScoreBook<'a, 'info> {
    pub fn load(infos: &'a [AccountInfo<'info>], task: &Task, program_id: &Pubkey) -> Result<Self> {
        require!(
            infos.len() == task.contributors.len(),
            PocoError::ScoreAccountMismatch
        );
        let entries = infos
            .iter()
            .zip(task.contributors.iter())
            .map(|(info, worker)| {
                let score: WorkerScore = load_program_account(info, program_id)?;
                require_keys_eq!(score.worker, *worker, PocoError::ScoreAccountMismatch);
                Ok((info, score))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    pub fn commit(&self) -> Result<()> {
        for (info, score) in &self.entries {
            store_program_account(info, score)?;
        }
        Ok(())
    }

    fn entry_mut(&mut self, worker: &Pubkey) -> Result<&mut WorkerScore> {
        self.entries
            .iter_mut()
            .find(|(_, score)| score.worker == *worker)
            .map(|(_, score)| score)
            .ok_or_else(|| error!(PocoError::ScoreAccountMismatch))
    }
}

impl ScoreStore for ScoreBook<'_, '_> {
    fn score_of(&self, worker: &Pubkey) -> Result<u64> {
        self.entries
            .iter()
            .find(|(_, score)| score.worker == *worker)
            .map(|(_, score)| score.score)
            .ok_or_else(|| error!(PocoError::ScoreAccountMismatch))
    }

    fn increment(&mut self, worker: &Pubkey) -> Result<u64> {
        self.entry_mut(worker)?.increment()
    }
}
