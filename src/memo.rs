use aes::Aes256;
use block_modes::block_padding::Pkcs7;
use block_modes::{BlockMode, Cbc};
use secp256k1::{PublicKey, SecretKey};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::address::Address;
use crate::crypto::{hash, sha512, shared_secret};
use crate::error::{EchoError, Result};
use crate::keypair::Keypair;
use crate::serialize::{serialize_bytes, u64_number_or_string, ByteSerializable};

type Aes256Cbc = Cbc<Aes256, Pkcs7>;

const MESSAGE_CHECKSUM_SIZE: usize = 4;

/// Encrypt `message` so that only the holders of `secret_key` or of the private key behind
/// `public_key` can read it.
///
/// The ciphertext covers `sha256(message)[..4] || message`, so decryption can tell a wrong key
/// or a damaged payload from a real plaintext.
pub fn encrypt_message(
    secret_key: &SecretKey,
    public_key: &PublicKey,
    nonce: u64,
    message: &[u8],
) -> Result<Vec<u8>> {
    let cipher = memo_cipher(secret_key, public_key, nonce)?;
    let mut plaintext: Vec<u8> = hash(message)[..MESSAGE_CHECKSUM_SIZE].to_vec();
    plaintext.extend(message);
    Ok(cipher.encrypt_vec(&plaintext))
}

pub fn decrypt_message(
    secret_key: &SecretKey,
    public_key: &PublicKey,
    nonce: u64,
    ciphertext: &[u8],
) -> Result<Vec<u8>> {
    let cipher = memo_cipher(secret_key, public_key, nonce)?;
    let plaintext = cipher
        .decrypt_vec(ciphertext)
        .map_err(|_| EchoError::CorruptedMessage)?;
    if plaintext.len() < MESSAGE_CHECKSUM_SIZE {
        return Err(EchoError::CorruptedMessage);
    }
    let (check, message) = plaintext.split_at(MESSAGE_CHECKSUM_SIZE);
    if hash(message)[..MESSAGE_CHECKSUM_SIZE] != check[..] {
        return Err(EchoError::CorruptedMessage);
    }
    Ok(message.to_vec())
}

// key and iv come from sha512(nonce || hex(sha512(shared_x)))
fn memo_cipher(secret_key: &SecretKey, public_key: &PublicKey, nonce: u64) -> Result<Aes256Cbc> {
    let shared_hash = sha512(&shared_secret(secret_key, public_key));
    let mut seed: Vec<u8> = nonce.to_string().into_bytes();
    seed.extend(hex::encode(shared_hash).into_bytes());
    let seed_hash = sha512(&seed);
    Aes256Cbc::new_from_slices(&seed_hash[..32], &seed_hash[32..48])
        .map_err(|error| EchoError::crypto("memo cipher setup", error.to_string()))
}

/// Encrypted note attached to a transfer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Memo {
    from: Address,
    to: Address,
    #[serde(with = "u64_number_or_string")]
    nonce: u64,
    #[serde(with = "hex_message")]
    message: Vec<u8>,
}

impl Memo {
    pub fn new(sender: &Keypair, recipient: &Address, nonce: u64, plaintext: &str) -> Result<Memo> {
        let message = encrypt_message(
            sender.secret_key(),
            recipient.public_key(),
            nonce,
            plaintext.as_bytes(),
        )?;
        Ok(Memo {
            from: sender.address(recipient.network()),
            to: recipient.clone(),
            nonce,
            message,
        })
    }

    pub fn with_random_nonce(sender: &Keypair, recipient: &Address, plaintext: &str) -> Result<Memo> {
        Memo::new(sender, recipient, rand::random::<u64>(), plaintext)
    }

    /// Decrypt with either party's key.
    pub fn decrypt(&self, keypair: &Keypair) -> Result<String> {
        let peer = if keypair.public_key() == self.from.public_key() {
            &self.to
        } else {
            &self.from
        };
        let message = decrypt_message(keypair.secret_key(), peer.public_key(), self.nonce, &self.message)?;
        String::from_utf8(message).map_err(|_| EchoError::CorruptedMessage)
    }

    pub fn get_from(&self) -> &Address {
        &self.from
    }

    pub fn get_to(&self) -> &Address {
        &self.to
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }

    pub fn get_message(&self) -> &[u8] {
        &self.message
    }
}

impl ByteSerializable for Memo {
    fn to_bytes(&self) -> Vec<u8> {
        let mut vbytes: Vec<u8> = vec![];
        vbytes.extend(self.from.to_bytes());
        vbytes.extend(self.to.to_bytes());
        vbytes.extend(&self.nonce.to_le_bytes());
        vbytes.extend(serialize_bytes(&self.message));
        vbytes
    }
}

mod hex_message {
    use super::*;

    pub fn serialize<S: Serializer>(message: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(message))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error> {
        let message = String::deserialize(deserializer)?;
        hex::decode(message).map_err(de::Error::custom)
    }
}
