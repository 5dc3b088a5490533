//! Public fungible balances.
//!
//! A plain `address -> amount` ledger with a non-negative balance invariant.
//! The confidential ledger bridges into and out of it through escrow
//! identities.

use std::collections::HashMap;

use privtoken_types::Owner;

use crate::error::ModuleError;
use crate::handlers::HandlerResult;

/// Capability the core needs from the public ledger.
pub trait PublicLedger {
    fn balance_of(&self, owner: &Owner) -> u64;

    /// Move `amount` from `from` to `to`, failing if `from` cannot cover it.
    fn transfer_from(&mut self, from: &Owner, to: &Owner, amount: u64) -> HandlerResult<()>;
}

#[derive(Clone, Debug, Default)]
pub struct Balances {
    balances: HashMap<Owner, u64>,
    circulating_supply: u64,
}

impl Balances {
    /// Credit newly issued tokens to `owner`.
    pub fn mint(&mut self, owner: &Owner, amount: u64) -> HandlerResult<()> {
        let supply = self
            .circulating_supply
            .checked_add(amount)
            .ok_or(ModuleError::Overflow)?;
        let balance = self
            .balance_of(owner)
            .checked_add(amount)
            .ok_or(ModuleError::Overflow)?;

        self.circulating_supply = supply;
        self.balances.insert(*owner, balance);
        Ok(())
    }

    pub fn circulating_supply(&self) -> u64 {
        self.circulating_supply
    }
}

impl PublicLedger for Balances {
    fn balance_of(&self, owner: &Owner) -> u64 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    fn transfer_from(&mut self, from: &Owner, to: &Owner, amount: u64) -> HandlerResult<()> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(ModuleError::InsufficientFunds {
                required: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }

        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(ModuleError::Overflow)?;
        self.balances.insert(*from, available - amount);
        self.balances.insert(*to, credited);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_operations() {
        let mut balances = Balances::default();
        let alice = Owner([1u8; 48]);
        let bob = Owner([2u8; 48]);

        assert_eq!(balances.balance_of(&alice), 0);

        balances.mint(&alice, 100).unwrap();
        assert_eq!(balances.balance_of(&alice), 100);
        assert_eq!(balances.circulating_supply(), 100);

        balances.transfer_from(&alice, &bob, 60).unwrap();
        assert_eq!(balances.balance_of(&alice), 40);
        assert_eq!(balances.balance_of(&bob), 60);

        let result = balances.transfer_from(&alice, &bob, 41);
        assert_eq!(
            result,
            Err(ModuleError::InsufficientFunds {
                required: 41,
                available: 40
            })
        );
        assert_eq!(balances.balance_of(&alice), 40);
        assert_eq!(balances.circulating_supply(), 100);
    }

    #[test]
    fn test_self_transfer_keeps_balance() {
        let mut balances = Balances::default();
        let alice = Owner([1u8; 48]);
        balances.mint(&alice, 10).unwrap();

        balances.transfer_from(&alice, &alice, 10).unwrap();
        assert_eq!(balances.balance_of(&alice), 10);
    }
}
