use {
    crate::{DomainSeparator, hashed_eip712_message},
    alloy::{
        primitives::{Address, B256, U256, keccak256},
        signers::{SignerSync, local::PrivateKeySigner},
    },
    anyhow::{Context as _, Result, bail},
    serde::{Deserialize, Serialize, de},
    std::fmt::{self, Debug, Formatter},
};

/// See [`Signature`].
#[derive(Eq, PartialEq, Clone, Copy, Debug, Default, Deserialize, Serialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SigningScheme {
    #[default]
    Eip712,
    EthSign,
}

/// Signature over the order data.
/// Both variants rely on the EIP-712 hash of the order data, referred to as
/// the order hash.
#[derive(Eq, PartialEq, Clone, Copy, Deserialize, Serialize, Hash)]
#[serde(into = "JsonSignature", try_from = "JsonSignature")]
pub enum Signature {
    /// The order struct is signed according to EIP-712.
    ///
    /// https://eips.ethereum.org/EIPS/eip-712
    Eip712(EcdsaSignature),
    /// The order hash is signed according to EIP-191's personal_sign signature
    /// format.
    ///
    /// https://eips.ethereum.org/EIPS/eip-191
    EthSign(EcdsaSignature),
}

impl Default for Signature {
    fn default() -> Self {
        Self::Eip712(Default::default())
    }
}

impl Debug for Signature {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let scheme = format!("{:?}", self.scheme());
        let bytes = const_hex::encode_prefixed(self.to_bytes());
        f.debug_tuple(&scheme).field(&bytes).finish()
    }
}

impl Signature {
    /// Recovers the address that signed `struct_hash` under `domain`.
    pub fn recover(&self, domain: &DomainSeparator, struct_hash: &[u8; 32]) -> Result<Address> {
        self.ecdsa().recover(self.scheme(), domain, struct_hash)
    }

    pub fn from_bytes(scheme: SigningScheme, bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; 65] = bytes
            .try_into()
            .context("ECDSA signature must be 65 bytes long")?;
        Ok(EcdsaSignature::from_bytes(&bytes).to_signature(scheme))
    }

    pub fn to_bytes(&self) -> [u8; 65] {
        self.ecdsa().to_bytes()
    }

    pub fn scheme(&self) -> SigningScheme {
        match self {
            Signature::Eip712(_) => SigningScheme::Eip712,
            Signature::EthSign(_) => SigningScheme::EthSign,
        }
    }

    fn ecdsa(&self) -> &EcdsaSignature {
        match self {
            Signature::Eip712(signature) | Signature::EthSign(signature) => signature,
        }
    }
}

/// An internal type used for deriving `serde` implementations for the
/// `Signature` type.
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSignature {
    signing_scheme: SigningScheme,
    signature: EcdsaSignature,
}

impl From<Signature> for JsonSignature {
    fn from(signature: Signature) -> Self {
        Self {
            signing_scheme: signature.scheme(),
            signature: *signature.ecdsa(),
        }
    }
}

impl TryFrom<JsonSignature> for Signature {
    type Error = anyhow::Error;

    fn try_from(json: JsonSignature) -> Result<Self, Self::Error> {
        Ok(json.signature.to_signature(json.signing_scheme))
    }
}

#[derive(Eq, PartialEq, Clone, Copy, Debug, Default, Hash)]
pub struct EcdsaSignature {
    pub r: B256,
    pub s: B256,
    pub v: u8,
}

/// Returns the message used for signing and recovery for the specified hash.
///
/// The signing message depends on the signature scheme that was used.
fn signing_message(
    signing_scheme: SigningScheme,
    domain_separator: &DomainSeparator,
    struct_hash: &[u8; 32],
) -> [u8; 32] {
    let message = hashed_eip712_message(domain_separator, struct_hash);
    match signing_scheme {
        SigningScheme::Eip712 => message,
        SigningScheme::EthSign => {
            let mut buffer = [0u8; 60];
            buffer[..28].copy_from_slice(b"\x19Ethereum Signed Message:\n32");
            buffer[28..].copy_from_slice(&message);
            keccak256(buffer).0
        }
    }
}

impl EcdsaSignature {
    pub fn to_signature(self, scheme: SigningScheme) -> Signature {
        match scheme {
            SigningScheme::Eip712 => Signature::Eip712(self),
            SigningScheme::EthSign => Signature::EthSign(self),
        }
    }

    /// r + s + v
    pub fn to_bytes(self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(self.r.as_slice());
        bytes[32..64].copy_from_slice(self.s.as_slice());
        bytes[64] = self.v;
        bytes
    }

    pub fn from_bytes(bytes: &[u8; 65]) -> Self {
        EcdsaSignature {
            r: B256::from_slice(&bytes[..32]),
            s: B256::from_slice(&bytes[32..64]),
            v: bytes[64],
        }
    }

    pub fn recover(
        &self,
        signing_scheme: SigningScheme,
        domain_separator: &DomainSeparator,
        struct_hash: &[u8; 32],
    ) -> Result<Address> {
        let message = signing_message(signing_scheme, domain_separator, struct_hash);
        let y_parity = match self.v {
            0 | 27 => false,
            1 | 28 => true,
            v => bail!("invalid recovery id {v}"),
        };
        let signature = alloy::primitives::Signature::new(
            U256::from_be_bytes(self.r.0),
            U256::from_be_bytes(self.s.0),
            y_parity,
        );
        signature
            .recover_address_from_prehash(&B256::from(message))
            .context("unexpectedly invalid signature")
    }

    pub fn sign(
        signing_scheme: SigningScheme,
        domain_separator: &DomainSeparator,
        struct_hash: &[u8; 32],
        key: &PrivateKeySigner,
    ) -> Result<Self> {
        let message = signing_message(signing_scheme, domain_separator, struct_hash);
        let signature = key
            .sign_hash_sync(&B256::from(message))
            .context("failed to sign message")?;
        Ok(Self {
            r: B256::from(signature.r().to_be_bytes::<32>()),
            s: B256::from(signature.s().to_be_bytes::<32>()),
            v: 27 + u8::from(signature.v()),
        })
    }
}

impl Serialize for EcdsaSignature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&const_hex::encode_prefixed(self.to_bytes()))
    }
}

impl<'de> Deserialize<'de> for EcdsaSignature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor {}
        impl de::Visitor<'_> for Visitor {
            type Value = EcdsaSignature;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(
                    formatter,
                    "the 65 ecdsa signature bytes as a hex encoded string, ordered as r, s, v, \
                     where v is either 27 or 28"
                )
            }

            fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                let s = s.strip_prefix("0x").ok_or_else(|| {
                    de::Error::custom(format!(
                        "{s:?} can't be decoded as hex ecdsa signature because it does not start \
                         with '0x'"
                    ))
                })?;
                let bytes: [u8; 65] = const_hex::decode_to_array(s).map_err(|err| {
                    de::Error::custom(format!(
                        "failed to decode {s:?} as hex ecdsa signature: {err}"
                    ))
                })?;
                Ok(EcdsaSignature::from_bytes(&bytes))
            }
        }

        deserializer.deserialize_str(Visitor {})
    }
}
