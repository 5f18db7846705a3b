//! Authentication of holder intent. Orders are never registered anywhere, a
//! valid signature over the canonical encoding is all that makes an order
//! exist.

use {
    crate::domain::eth::{Address, U256},
    model::{
        DomainSeparator,
        SigningDomain,
        order::{MAX_FEE_BPS, Order, OrderCancellation, OrderData, OrderHash},
        signature::Signature,
    },
};

/// Verifies orders and cancellations against one signing domain.
#[derive(Debug, Clone)]
pub struct Authorizer {
    domain: SigningDomain,
    separator: DomainSeparator,
}

impl Authorizer {
    pub fn new(domain: SigningDomain) -> Self {
        let separator = domain.separator();
        Self { domain, separator }
    }

    pub fn domain(&self) -> &SigningDomain {
        &self.domain
    }

    pub fn separator(&self) -> &DomainSeparator {
        &self.separator
    }

    pub fn hash(&self, order: &OrderData) -> OrderHash {
        order.hash(&self.separator)
    }

    /// Recovers the holder of a signed order.
    ///
    /// The recovered signer has to be a plausible account and has to match
    /// the holder the order names. The holder is part of the signed data, so
    /// a signature by anybody else is rejected here instead of failing later
    /// when moving funds.
    pub fn verify(&self, order: &Order) -> Result<Address, Error> {
        let signer = order.recover_signer(&self.separator).map_err(|err| {
            tracing::debug!(?err, "signature recovery failed");
            Error::InvalidSignature
        })?;
        if signer == Address::ZERO || signer != order.data.holder {
            tracing::debug!(%signer, holder = %order.data.holder, "signer is not the holder");
            return Err(Error::InvalidSignature);
        }
        Ok(signer)
    }

    /// Checks the field invariants that signing alone can't guarantee.
    pub fn validate(&self, order: &OrderData) -> Result<(), Error> {
        if order.amount == U256::ZERO {
            return Err(Error::InvalidOrder("amount must be positive"));
        }
        if order.trigger_price == U256::ZERO {
            return Err(Error::InvalidOrder("trigger price must be positive"));
        }
        if order.fee_bps > MAX_FEE_BPS {
            return Err(Error::InvalidOrder("fee exceeds 100%"));
        }
        Ok(())
    }

    /// Recovers the account that signed an off-line cancellation request.
    pub fn cancellation_signer(
        &self,
        cancellation: &OrderCancellation,
        signature: &Signature,
    ) -> Result<Address, Error> {
        match cancellation.recover_caller(signature, &self.separator) {
            Ok(caller) if caller != Address::ZERO => Ok(caller),
            Ok(_) => Err(Error::InvalidSignature),
            Err(err) => {
                tracing::debug!(?err, "cancellation signature recovery failed");
                Err(Error::InvalidSignature)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid order: {0}")]
    InvalidOrder(&'static str),
}
