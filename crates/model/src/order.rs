//! Contains the stop-loss order type and its canonical EIP-712 encoding.

use {
    crate::{
        DomainSeparator,
        hashed_eip712_message,
        signature::{EcdsaSignature, Signature, SigningScheme},
    },
    alloy::{
        primitives::{Address, B256, U256},
        signers::local::PrivateKeySigner,
        sol_types::SolStruct,
    },
    number::serialization::HexOrDecimalU256,
    serde::{Deserialize, Serialize},
    serde_with::serde_as,
    std::fmt::{self, Display},
};

mod eip712 {
    alloy::sol! {
        struct StopLossOrder {
            address holder;
            address token;
            uint256 amount;
            uint256 triggerPrice;
            uint64 expiry;
            uint256 nonce;
            uint16 feeBps;
        }

        struct OrderCancellation {
            bytes32 orderHash;
        }
    }
}

/// Fees are expressed in basis points of the sold amount.
pub const MAX_FEE_BPS: u16 = 10_000;

/// The complete order data.
///
/// These are the exact fields that get signed by the holder. The signature
/// commits to every one of them, so none can change after signing.
#[serde_as]
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderData {
    /// The account selling `token`. Only this account can produce a valid
    /// signature for the order.
    pub holder: Address,
    /// The token to sell.
    pub token: Address,
    /// Amount of `token` to sell, in the token's base units.
    #[serde_as(as = "HexOrDecimalU256")]
    pub amount: U256,
    /// Price of one whole `token` in the stable asset's base units at or
    /// below which the order may be executed.
    #[serde_as(as = "HexOrDecimalU256")]
    pub trigger_price: U256,
    /// Unix timestamp in seconds after which the order can no longer be
    /// executed.
    pub expiry: u64,
    #[serde_as(as = "HexOrDecimalU256")]
    pub nonce: U256,
    /// Keeper fee in basis points of `amount`.
    pub fee_bps: u16,
}

impl OrderData {
    /// The EIP-712 type string that fixes the field order of the encoding.
    pub const TYPE: &'static str = "StopLossOrder(address holder,address token,uint256 amount,\
                                    uint256 triggerPrice,uint64 expiry,uint256 nonce,uint16 \
                                    feeBps)";

    /// Returns the value of hashStruct() over the order data as defined by
    /// EIP-712.
    ///
    /// https://eips.ethereum.org/EIPS/eip-712#definition-of-hashstruct
    pub fn hash_struct(&self) -> [u8; 32] {
        self.as_eip712().eip712_hash_struct().0
    }

    /// The order hash. This is the EIP-712 signing message, which makes it
    /// unique per deployment as well as per order.
    pub fn hash(&self, domain: &DomainSeparator) -> OrderHash {
        OrderHash(B256::from(hashed_eip712_message(
            domain,
            &self.hash_struct(),
        )))
    }

    /// Signs the order on behalf of `key`. The holder field is overwritten
    /// with the key's address so that the signature is always consistent.
    pub fn sign(
        mut self,
        scheme: SigningScheme,
        domain: &DomainSeparator,
        key: &PrivateKeySigner,
    ) -> anyhow::Result<Order> {
        self.holder = key.address();
        let signature =
            EcdsaSignature::sign(scheme, domain, &self.hash_struct(), key)?.to_signature(scheme);
        Ok(Order {
            data: self,
            signature,
        })
    }

    fn as_eip712(&self) -> eip712::StopLossOrder {
        eip712::StopLossOrder {
            holder: self.holder,
            token: self.token,
            amount: self.amount,
            triggerPrice: self.trigger_price,
            expiry: self.expiry,
            nonce: self.nonce,
            feeBps: self.fee_bps,
        }
    }
}

/// An order together with the holder's signature over it. This is what
/// holders hand to keepers.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(flatten)]
    pub data: OrderData,
    pub signature: Signature,
}

impl Order {
    /// Recovers the address that signed the order.
    pub fn recover_signer(&self, domain: &DomainSeparator) -> anyhow::Result<Address> {
        self.signature.recover(domain, &self.data.hash_struct())
    }

    pub fn hash(&self, domain: &DomainSeparator) -> OrderHash {
        self.data.hash(domain)
    }
}

/// Identifies an order for one deployment. Hex encoded with a 0x prefix.
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct OrderHash(pub B256);

impl Display for OrderHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for OrderHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::str::FromStr for OrderHash {
    type Err = const_hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(B256::from(const_hex::decode_to_array::<_, 32>(s)?)))
    }
}

#[derive(
    Eq,
    PartialEq,
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Serialize,
    Hash,
    strum::AsRefStr,
    strum::Display,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum OrderStatus {
    /// Every validly signed order starts out open. Orders never need to be
    /// registered, so unknown hashes are open as well.
    #[default]
    Open,
    Filled,
    Cancelled,
}

impl OrderStatus {
    pub fn is_final(self) -> bool {
        !matches!(self, Self::Open)
    }
}

/// Request by a holder to cancel one of their orders.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCancellation {
    pub order_hash: OrderHash,
}

impl OrderCancellation {
    pub fn hash_struct(&self) -> [u8; 32] {
        eip712::OrderCancellation {
            orderHash: self.order_hash.0,
        }
        .eip712_hash_struct()
        .0
    }

    pub fn sign(
        self,
        scheme: SigningScheme,
        domain: &DomainSeparator,
        key: &PrivateKeySigner,
    ) -> anyhow::Result<Signature> {
        Ok(EcdsaSignature::sign(scheme, domain, &self.hash_struct(), key)?.to_signature(scheme))
    }

    /// Recovers the account that requested the cancellation.
    pub fn recover_caller(
        &self,
        signature: &Signature,
        domain: &DomainSeparator,
    ) -> anyhow::Result<Address> {
        signature.recover(domain, &self.hash_struct())
    }
}
