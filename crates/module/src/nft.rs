//! Non-fungible asset registry.
//!
//! Records are keyed by `(collection, sequence)` where the collection is the
//! minter and the sequence is the minter's running nonce. A locked asset
//! cannot change hands until it is unlocked.

use std::collections::HashMap;

use privtoken_types::{AssetKey, AssetRecord, Digest, Owner};

use crate::error::ModuleError;
use crate::handlers::HandlerResult;

/// Capability the auction lifecycle needs from the asset registry.
pub trait AssetRegistry {
    fn assert_owner(&self, key: &AssetKey, owner: &Owner) -> HandlerResult<()>;

    fn assert_unlocked(&self, key: &AssetKey) -> HandlerResult<()>;

    fn lock(&mut self, key: &AssetKey) -> HandlerResult<()>;

    fn unlock(&mut self, key: &AssetKey) -> HandlerResult<()>;

    /// Change ownership without any lock or signer checks.
    fn transfer(&mut self, key: &AssetKey, to: &Owner) -> HandlerResult<()>;
}

#[derive(Clone, Debug, Default)]
pub struct NftRegistry {
    records: HashMap<AssetKey, AssetRecord>,
    nonces: HashMap<Owner, u32>,
}

impl NftRegistry {
    /// Mint a new unlocked asset in `minter`'s collection, owned by `to`.
    pub fn mint(&mut self, minter: &Owner, to: &Owner, metadata: Digest) -> HandlerResult<AssetKey> {
        let sequence = self.nonces.get(minter).copied().unwrap_or(0);
        let next = sequence.checked_add(1).ok_or(ModuleError::Overflow)?;

        let key = AssetKey::new(*minter, sequence);
        self.records.insert(
            key,
            AssetRecord {
                owner: *to,
                metadata,
                locked: false,
            },
        );
        self.nonces.insert(*minter, next);
        Ok(key)
    }

    pub fn get(&self, key: &AssetKey) -> Option<&AssetRecord> {
        self.records.get(key)
    }

    fn get_mut(&mut self, key: &AssetKey) -> HandlerResult<&mut AssetRecord> {
        self.records
            .get_mut(key)
            .ok_or(ModuleError::AssetNotFound(*key))
    }

    fn record(&self, key: &AssetKey) -> HandlerResult<&AssetRecord> {
        self.records.get(key).ok_or(ModuleError::AssetNotFound(*key))
    }
}

impl AssetRegistry for NftRegistry {
    fn assert_owner(&self, key: &AssetKey, owner: &Owner) -> HandlerResult<()> {
        if self.record(key)?.owner != *owner {
            return Err(ModuleError::NotOwner);
        }
        Ok(())
    }

    fn assert_unlocked(&self, key: &AssetKey) -> HandlerResult<()> {
        if self.record(key)?.locked {
            return Err(ModuleError::AlreadyLocked);
        }
        Ok(())
    }

    fn lock(&mut self, key: &AssetKey) -> HandlerResult<()> {
        self.get_mut(key)?.locked = true;
        Ok(())
    }

    fn unlock(&mut self, key: &AssetKey) -> HandlerResult<()> {
        self.get_mut(key)?.locked = false;
        Ok(())
    }

    fn transfer(&mut self, key: &AssetKey, to: &Owner) -> HandlerResult<()> {
        self.get_mut(key)?.owner = *to;
        Ok(())
    }
}
