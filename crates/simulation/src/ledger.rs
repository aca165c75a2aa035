//! Simulated account balances.

use lottery_core::{Ledger, TransferError};
use lottery_types::{Address, Wei};
use std::collections::{BTreeMap, BTreeSet};

/// In-memory account balances.
///
/// Accounts marked unreachable refuse incoming transfers, which models a
/// recipient whose receive hook reverts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountLedger {
    balances: BTreeMap<Address, Wei>,
    unreachable: BTreeSet<Address>,
}

impl AccountLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` out of thin air (genesis allocation / faucet).
    pub fn mint(&mut self, account: Address, amount: Wei) -> Result<Wei, TransferError> {
        let balance = self
            .balance_of(&account)
            .checked_add(amount)
            .ok_or(TransferError::Overflow(account))?;
        self.balances.insert(account, balance);
        Ok(balance)
    }

    pub fn set_reachable(&mut self, account: Address, reachable: bool) {
        if reachable {
            self.unreachable.remove(&account);
        } else {
            self.unreachable.insert(account);
        }
    }

    pub fn is_reachable(&self, account: &Address) -> bool {
        !self.unreachable.contains(account)
    }

    /// Sum of all balances, or `None` if it does not fit in a [`Wei`].
    pub fn total_supply(&self) -> Option<Wei> {
        Wei::checked_sum(self.balances.values().copied())
    }
}

impl Ledger for AccountLedger {
    fn balance_of(&self, account: &Address) -> Wei {
        self.balances.get(account).copied().unwrap_or(Wei::ZERO)
    }

    fn transfer(&mut self, from: Address, to: Address, amount: Wei) -> Result<(), TransferError> {
        if !self.is_reachable(&to) {
            return Err(TransferError::Rejected(to));
        }
        if from == to {
            return Ok(());
        }

        let available = self.balance_of(&from);
        let remaining = available
            .checked_sub(amount)
            .ok_or(TransferError::InsufficientFunds {
                account: from,
                available,
                required: amount,
            })?;
        let credited = self
            .balance_of(&to)
            .checked_add(amount)
            .ok_or(TransferError::Overflow(to))?;

        self.balances.insert(from, remaining);
        self.balances.insert(to, credited);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lottery_types::test_utils::test_address;

    #[test]
    fn test_transfer_moves_value() {
        let mut ledger = AccountLedger::new();
        let (a, b) = (test_address(1), test_address(2));
        ledger.mint(a, Wei(100)).unwrap();

        ledger.transfer(a, b, Wei(40)).unwrap();

        assert_eq!(ledger.balance_of(&a), Wei(60));
        assert_eq!(ledger.balance_of(&b), Wei(40));
        assert_eq!(ledger.total_supply(), Some(Wei(100)));
    }

    #[test]
    fn test_failed_transfer_changes_nothing() {
        let mut ledger = AccountLedger::new();
        let (a, b) = (test_address(1), test_address(2));
        ledger.mint(a, Wei(10)).unwrap();
        let before = ledger.clone();

        assert!(matches!(
            ledger.transfer(a, b, Wei(11)),
            Err(TransferError::InsufficientFunds { .. })
        ));
        assert_eq!(ledger, before);

        ledger.set_reachable(b, false);
        assert_eq!(
            ledger.transfer(a, b, Wei(1)),
            Err(TransferError::Rejected(b))
        );
        assert_eq!(ledger.balance_of(&a), Wei(10));

        ledger.set_reachable(b, true);
        ledger.transfer(a, b, Wei(1)).unwrap();
        assert_eq!(ledger.balance_of(&b), Wei(1));
    }

    #[test]
    fn test_mint_overflow() {
        let mut ledger = AccountLedger::new();
        let a = test_address(1);
        ledger.mint(a, Wei(u128::MAX)).unwrap();
        assert_eq!(ledger.mint(a, Wei(1)), Err(TransferError::Overflow(a)));
    }

    #[test]
    fn test_total_supply_overflow_is_reported() {
        let mut ledger = AccountLedger::new();
        ledger.mint(test_address(1), Wei(u128::MAX)).unwrap();
        ledger.mint(test_address(2), Wei(u128::MAX)).unwrap();
        assert_eq!(ledger.total_supply(), None);
    }
}
