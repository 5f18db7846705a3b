//! The external collaborators that move funds: the swap venue and the token
//! ledger.

use crate::domain::eth::{Address, Asset, FeeTier, TokenAddress, U256};

/// Swap an exact input amount for as much output as the pool gives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swap {
    pub token_in: TokenAddress,
    pub token_out: TokenAddress,
    /// Selects the pool of the pair.
    pub fee: FeeTier,
    pub amount_in: U256,
    pub min_amount_out: U256,
    /// The account the input is pulled from.
    pub payer: Address,
    pub recipient: Address,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Swapper: Send + Sync {
    /// Returns the output amount credited to the recipient. A failed swap has
    /// no effects.
    async fn swap(&self, swap: Swap) -> Result<U256, SwapError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SwapError {
    #[error("swap output {amount_out} is below the minimum {min_amount_out}")]
    SlippageExceeded {
        amount_out: U256,
        min_amount_out: U256,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// One leg of a batch transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub asset: Asset,
    pub to: Address,
}

/// A fungible token ledger with ERC20 semantics. Every call either applies
/// completely or not at all.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Ledger: Send + Sync {
    async fn balance_of(&self, token: TokenAddress, owner: Address) -> anyhow::Result<U256>;

    /// Moves `from`'s own funds.
    async fn transfer(
        &self,
        token: TokenAddress,
        from: Address,
        to: Address,
        amount: U256,
    ) -> anyhow::Result<()>;

    /// Moves funds `from` approved to `spender`.
    async fn transfer_from(
        &self,
        token: TokenAddress,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> anyhow::Result<()>;

    /// Moves several of `from`'s own funds at once. Either every leg is
    /// applied or none is.
    async fn transfer_batch(&self, from: Address, transfers: Vec<Transfer>) -> anyhow::Result<()>;
}
