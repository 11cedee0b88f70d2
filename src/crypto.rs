use std::fmt;
use std::str::FromStr;

use base58::{FromBase58, ToBase58};
use ed25519_dalek::{Signer, SigningKey};
use ripemd::Ripemd160;
use secp256k1::{ecdh, Message, PublicKey, SecretKey, SECP256K1};
use sha2::{Digest, Sha256, Sha512};

use crate::error::{EchoError, Result};

pub type EchoHash = [u8; 32];
pub type EchoPrivateKey = [u8; 32];
pub type EchoPublicKey = [u8; 33];

pub const CHECKSUM_SIZE: usize = 4;
pub const ECDSA_SIGNATURE_SIZE: usize = 65;
pub const EDDSA_SIGNATURE_SIZE: usize = 64;

const WIF_VERSION: u8 = 0x80;
const ECHORAND_ROLE: &str = "echorand";

pub fn hash(data: &[u8]) -> EchoHash {
    let mut output = [0u8; 32];
    output.copy_from_slice(&Sha256::digest(data));
    output
}

pub fn double_hash(data: &[u8]) -> EchoHash {
    hash(&hash(data))
}

pub fn sha512(data: &[u8]) -> [u8; 64] {
    let mut output = [0u8; 64];
    output.copy_from_slice(&Sha512::digest(data));
    output
}

pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    let mut output = [0u8; 20];
    output.copy_from_slice(&Ripemd160::digest(data));
    output
}

/// Address checksum: the leading bytes of RIPEMD-160 over the key bytes.
pub fn checksum(data: &[u8]) -> [u8; CHECKSUM_SIZE] {
    let digest = ripemd160(data);
    let mut output = [0u8; CHECKSUM_SIZE];
    output.copy_from_slice(&digest[..CHECKSUM_SIZE]);
    output
}

/// Account authority a derived key is used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Owner,
    Active,
    Memo,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Active => "active",
            Role::Memo => "memo",
        }
    }
}

impl FromStr for Role {
    type Err = EchoError;

    fn from_str(role: &str) -> Result<Self> {
        match role {
            "owner" => Ok(Role::Owner),
            "active" => Ok(Role::Active),
            "memo" => Ok(Role::Memo),
            other => Err(EchoError::MalformedInput(format!("unknown role `{}`", other))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn derive_seed(username: &str, password: &str, role: Role) -> String {
    format!("{}{}{}", username, role.name(), password)
}

pub fn derive_echorand_seed(username: &str, password: &str) -> String {
    format!("{}{}{}", username, ECHORAND_ROLE, password)
}

pub fn derive_private_key(seed: &str) -> EchoPrivateKey {
    hash(seed.as_bytes())
}

pub fn secret_key_from_slice(bytes: &[u8]) -> Result<SecretKey> {
    SecretKey::from_slice(bytes)
        .map_err(|error| EchoError::crypto(format!("invalid secp256k1 private key of {} bytes", bytes.len()), error))
}

pub fn public_key_from_slice(bytes: &[u8]) -> Result<PublicKey> {
    PublicKey::from_slice(bytes)
        .map_err(|error| EchoError::crypto(format!("invalid secp256k1 public key of {} bytes", bytes.len()), error))
}

/// A private key attached to a transaction. Only used to produce signatures.
#[derive(Clone)]
pub enum PrivateKey {
    Ecdsa(SecretKey),
    Eddsa(SigningKey),
}

impl PrivateKey {
    pub fn sign_digest(&self, digest: &EchoHash) -> Result<Vec<u8>> {
        match self {
            PrivateKey::Ecdsa(secret_key) => Ok(sign_ecdsa(digest, secret_key)?.to_vec()),
            PrivateKey::Eddsa(signing_key) => Ok(signing_key.sign(digest).to_bytes().to_vec()),
        }
    }

    pub fn signature_size(&self) -> usize {
        match self {
            PrivateKey::Ecdsa(_) => ECDSA_SIGNATURE_SIZE,
            PrivateKey::Eddsa(_) => EDDSA_SIGNATURE_SIZE,
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivateKey::Ecdsa(_) => f.write_str("PrivateKey::Ecdsa(..)"),
            PrivateKey::Eddsa(_) => f.write_str("PrivateKey::Eddsa(..)"),
        }
    }
}

/// Sign a 32-byte digest with a compact recoverable signature.
///
/// Layout is `[27 + 4 + recovery_id, r, s]`. The node only accepts canonical signatures, so
/// extra nonce data is mixed in until both `r` and `s` encode without a leading high bit or
/// zero byte.
pub fn sign_ecdsa(digest: &EchoHash, secret_key: &SecretKey) -> Result<[u8; ECDSA_SIGNATURE_SIZE]> {
    let message = Message::from_digest_slice(digest)?;
    let mut counter: u32 = 0;
    loop {
        let signature = if counter == 0 {
            SECP256K1.sign_ecdsa_recoverable(&message, secret_key)
        } else {
            let mut noncedata = digest.to_vec();
            noncedata.extend(&counter.to_le_bytes());
            SECP256K1.sign_ecdsa_recoverable_with_noncedata(&message, secret_key, &hash(&noncedata))
        };
        let (recovery_id, compact) = signature.serialize_compact();
        if is_canonical(&compact) {
            let mut output = [0u8; ECDSA_SIGNATURE_SIZE];
            output[0] = 27 + 4 + recovery_id.to_i32() as u8;
            output[1..].copy_from_slice(&compact);
            return Ok(output);
        }
        counter += 1;
    }
}

fn is_canonical(compact: &[u8; 64]) -> bool {
    compact[0] & 0x80 == 0
        && !(compact[0] == 0 && compact[1] & 0x80 == 0)
        && compact[32] & 0x80 == 0
        && !(compact[32] == 0 && compact[33] & 0x80 == 0)
}

/// X coordinate of `public_key * secret_key`.
pub fn shared_secret(secret_key: &SecretKey, public_key: &PublicKey) -> EchoHash {
    let point = ecdh::shared_secret_point(public_key, secret_key);
    let mut x = [0u8; 32];
    x.copy_from_slice(&point[..32]);
    x
}

pub fn encode_to_wif(private_key: &EchoPrivateKey) -> String {
    let mut vbytes: Vec<u8> = vec![WIF_VERSION];
    vbytes.extend(private_key);
    let check = double_hash(&vbytes);
    vbytes.extend(&check[..CHECKSUM_SIZE]);
    vbytes.to_base58()
}

pub fn decode_from_wif(wif: &str) -> Result<EchoPrivateKey> {
    let bytes = wif
        .from_base58()
        .map_err(|error| EchoError::MalformedInput(format!("WIF is not base58: {:?}", error)))?;
    // 38 bytes when the compressed-key flag is appended
    let payload_len = match bytes.len() {
        37 => 33,
        38 if bytes[33] == 0x01 => 34,
        len => {
            return Err(EchoError::MalformedInput(format!(
                "WIF has {} bytes, expected 37 or 38",
                len
            )))
        }
    };
    if bytes[0] != WIF_VERSION {
        return Err(EchoError::MalformedInput(format!(
            "WIF version byte {:#04x}, expected {:#04x}",
            bytes[0], WIF_VERSION
        )));
    }
    let check = double_hash(&bytes[..payload_len]);
    if check[..CHECKSUM_SIZE] != bytes[payload_len..] {
        return Err(EchoError::MalformedInput(String::from("WIF checksum mismatch")));
    }
    bytes[1..33]
        .try_into()
        .map_err(|_| EchoError::MalformedInput(String::from("WIF key is not 32 bytes")))
}
