use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use base58::{FromBase58, ToBase58};
use secp256k1::PublicKey;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::{checksum, public_key_from_slice, EchoPublicKey, CHECKSUM_SIZE};
use crate::error::{EchoError, Result};
use crate::serialize::ByteSerializable;

pub const ECHO_PREFIX: &str = "ECHO";
pub const TESTNET_PREFIX: &str = "TEST";
pub const BITSHARES_PREFIX: &str = "GPH";

/// Prefixes tried, in order, when an address is parsed without an explicit network.
pub const KNOWN_PREFIXES: [&str; 3] = [ECHO_PREFIX, TESTNET_PREFIX, BITSHARES_PREFIX];

const COMPRESSED_KEY_SIZE: usize = 33;
const EDDSA_KEY_SIZE: usize = 32;

/// The chain a key is encoded for. Only the address prefix differs between networks.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Network {
    address_prefix: String,
}

impl Network {
    pub fn new(address_prefix: &str) -> Self {
        Network {
            address_prefix: address_prefix.to_string(),
        }
    }

    pub fn devnet() -> Self {
        Network::new(ECHO_PREFIX)
    }

    pub fn testnet() -> Self {
        Network::new(TESTNET_PREFIX)
    }

    pub fn bitshares() -> Self {
        Network::new(BITSHARES_PREFIX)
    }

    pub fn address_prefix(&self) -> &str {
        &self.address_prefix
    }
}

impl Default for Network {
    fn default() -> Self {
        Network::devnet()
    }
}

/// A compressed secp256k1 public key bound to a network prefix.
///
/// Text form is `prefix + base58(compressed_key || ripemd160(compressed_key)[..4])`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    public_key: PublicKey,
    network: Network,
}

impl Address {
    pub fn new(public_key: PublicKey, network: &Network) -> Self {
        Address {
            public_key,
            network: network.clone(),
        }
    }

    /// Build from raw key bytes. Accepts compressed or uncompressed encodings and always stores
    /// the compressed point. 32-byte input is a private key and is refused.
    pub fn from_bytes(bytes: &[u8], network: &Network) -> Result<Self> {
        if bytes.len() == 32 {
            return Err(EchoError::MalformedInput(String::from(
                "refusing to build a public key from a private key",
            )));
        }
        Ok(Address::new(public_key_from_slice(bytes)?, network))
    }

    pub fn parse(address: &str, network: &Network) -> Result<Self> {
        let prefix = network.address_prefix();
        let encoded = address.strip_prefix(prefix).ok_or_else(|| {
            EchoError::MalformedInput(format!("address `{}` does not start with `{}`", address, prefix))
        })?;
        let bytes = encoded
            .from_base58()
            .map_err(|error| EchoError::MalformedInput(format!("address is not base58: {:?}", error)))?;
        if bytes.len() != COMPRESSED_KEY_SIZE + CHECKSUM_SIZE {
            return Err(EchoError::MalformedInput(format!(
                "address decodes to {} bytes, expected {}",
                bytes.len(),
                COMPRESSED_KEY_SIZE + CHECKSUM_SIZE
            )));
        }
        let (key, check) = bytes.split_at(COMPRESSED_KEY_SIZE);
        if checksum(key)[..] != check[..] {
            return Err(EchoError::MalformedInput(format!("address `{}` has a bad checksum", address)));
        }
        let public_key = PublicKey::from_slice(key)
            .map_err(|_| EchoError::MalformedInput(format!("address `{}` is not a curve point", address)))?;
        Ok(Address::new(public_key, network))
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn public_key_bytes(&self) -> EchoPublicKey {
        self.public_key.serialize()
    }
}

impl FromStr for Address {
    type Err = EchoError;

    fn from_str(address: &str) -> Result<Self> {
        for prefix in KNOWN_PREFIXES.iter() {
            if address.starts_with(prefix) {
                return Address::parse(address, &Network::new(prefix));
            }
        }
        Err(EchoError::MalformedInput(format!("address `{}` has an unknown prefix", address)))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self.public_key_bytes();
        let mut vbytes = key.to_vec();
        vbytes.extend(&checksum(&key));
        write!(f, "{}{}", self.network.address_prefix(), vbytes.to_base58())
    }
}

// Authority maps sort keys by their compressed bytes, matching the node's ordering.
impl Ord for Address {
    fn cmp(&self, other: &Self) -> Ordering {
        self.public_key_bytes()
            .cmp(&other.public_key_bytes())
            .then_with(|| self.network.address_prefix().cmp(other.network.address_prefix()))
    }
}

impl PartialOrd for Address {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl ByteSerializable for Address {
    fn to_bytes(&self) -> Vec<u8> {
        self.public_key_bytes().to_vec()
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let address = String::deserialize(deserializer)?;
        address.parse().map_err(de::Error::custom)
    }
}

/// Address of an Ed25519 key: `ECHO + base58(raw_key)`, without checksum.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EdAddress {
    public_key: [u8; EDDSA_KEY_SIZE],
}

impl EdAddress {
    pub fn new(public_key: [u8; EDDSA_KEY_SIZE]) -> Self {
        EdAddress { public_key }
    }

    pub fn public_key(&self) -> &[u8; EDDSA_KEY_SIZE] {
        &self.public_key
    }
}

impl FromStr for EdAddress {
    type Err = EchoError;

    fn from_str(address: &str) -> Result<Self> {
        let encoded = address.strip_prefix(ECHO_PREFIX).ok_or_else(|| {
            EchoError::MalformedInput(format!("address `{}` does not start with `{}`", address, ECHO_PREFIX))
        })?;
        let bytes = encoded
            .from_base58()
            .map_err(|error| EchoError::MalformedInput(format!("address is not base58: {:?}", error)))?;
        let mut public_key = [0u8; EDDSA_KEY_SIZE];
        if bytes.len() != EDDSA_KEY_SIZE {
            return Err(EchoError::MalformedInput(format!(
                "ed25519 address decodes to {} bytes, expected {}",
                bytes.len(),
                EDDSA_KEY_SIZE
            )));
        }
        public_key.copy_from_slice(&bytes);
        Ok(EdAddress::new(public_key))
    }
}

impl fmt::Display for EdAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ECHO_PREFIX, self.public_key.to_base58())
    }
}

impl ByteSerializable for EdAddress {
    fn to_bytes(&self) -> Vec<u8> {
        self.public_key.to_vec()
    }
}

impl Serialize for EdAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EdAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let address = String::deserialize(deserializer)?;
        address.parse().map_err(de::Error::custom)
    }
}
