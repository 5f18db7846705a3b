//! Contains the models that holders, keepers and the stop-loss service agree
//! on: the signed order, its canonical encoding and the signing domain.

pub mod order;
pub mod signature;

use {
    alloy::{
        primitives::{Address, B256, U256, keccak256},
        sol_types::Eip712Domain,
    },
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// The EIP-712 domain name used by default for stop-loss orders.
pub const DEFAULT_DOMAIN_NAME: &str = "Token Stop Loss Contract";

/// The EIP-712 domain version used by default for stop-loss orders.
pub const DEFAULT_DOMAIN_VERSION: &str = "1";

/// The tuple that scopes signatures to one deployment. Changing any field
/// produces a different [`DomainSeparator`] and with it invalidates every
/// signature issued under the old domain.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningDomain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl SigningDomain {
    pub fn new(chain_id: u64, verifying_contract: Address) -> Self {
        Self {
            name: DEFAULT_DOMAIN_NAME.to_owned(),
            version: DEFAULT_DOMAIN_VERSION.to_owned(),
            chain_id,
            verifying_contract,
        }
    }

    pub fn eip712(&self) -> Eip712Domain {
        Eip712Domain::new(
            Some(self.name.clone().into()),
            Some(self.version.clone().into()),
            Some(U256::from(self.chain_id)),
            Some(self.verifying_contract),
            None,
        )
    }

    pub fn separator(&self) -> DomainSeparator {
        DomainSeparator(self.eip712().separator().0)
    }
}

/// domainSeparator as defined by EIP-712.
///
/// https://eips.ethereum.org/EIPS/eip-712#definition-of-domainseparator
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct DomainSeparator(pub [u8; 32]);

impl std::str::FromStr for DomainSeparator {
    type Err = const_hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(const_hex::decode_to_array(s)?))
    }
}

impl fmt::Debug for DomainSeparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&const_hex::encode(self.0))
    }
}

impl fmt::Display for DomainSeparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&const_hex::encode_prefixed(self.0))
    }
}

impl From<DomainSeparator> for B256 {
    fn from(value: DomainSeparator) -> Self {
        B256::from(value.0)
    }
}

/// Returns the signing message `keccak256(0x1901 ‖ domainSeparator ‖
/// hashStruct)` defined by EIP-712.
///
/// https://eips.ethereum.org/EIPS/eip-712#specification
pub fn hashed_eip712_message(
    domain_separator: &DomainSeparator,
    struct_hash: &[u8; 32],
) -> [u8; 32] {
    let mut message = [0u8; 66];
    message[0..2].copy_from_slice(&[0x19, 0x01]);
    message[2..34].copy_from_slice(&domain_separator.0);
    message[34..66].copy_from_slice(struct_hash);
    keccak256(message).0
}
