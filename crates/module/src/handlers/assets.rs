//! Public token and asset registry calls.

use tracing::{debug, info};

use privtoken_types::{AssetKey, Digest, Owner};

use super::{CallContext, HandlerResult};
use crate::balances::PublicLedger;
use crate::error::ModuleError;
use crate::nft::AssetRegistry;
use crate::state::ModuleState;

/// Handle MintAsset call. The sender's identity becomes the collection.
pub fn handle_mint_asset(
    state: &mut ModuleState,
    ctx: &CallContext,
    to: Owner,
    metadata: Digest,
) -> HandlerResult<AssetKey> {
    let key = state.assets.mint(&ctx.sender, &to, metadata)?;
    debug!(collection = %ctx.sender, sequence = key.sequence, %to, "asset minted");
    Ok(key)
}

/// Handle TransferAsset call. Locked assets cannot move.
pub fn handle_transfer_asset(
    state: &mut ModuleState,
    ctx: &CallContext,
    to: Owner,
    asset: AssetKey,
) -> HandlerResult<()> {
    state.assets.assert_owner(&asset, &ctx.sender)?;
    state.assets.assert_unlocked(&asset)?;
    state.assets.transfer(&asset, &to)
}

/// Handle TransferPublic call.
pub fn handle_transfer_public(
    state: &mut ModuleState,
    ctx: &CallContext,
    to: Owner,
    amount: u64,
) -> HandlerResult<()> {
    state.balances.transfer_from(&ctx.sender, &to, amount)
}

/// Handle SetBalance call (admin only).
pub fn handle_set_balance(
    state: &mut ModuleState,
    ctx: &CallContext,
    owner: Owner,
    amount: u64,
) -> HandlerResult<()> {
    if state.admin != Some(ctx.sender) {
        return Err(ModuleError::NotAuthorized);
    }

    state.balances.mint(&owner, amount)?;
    info!(%owner, amount, "public tokens issued");
    Ok(())
}
