use ed25519_dalek::SigningKey;
use secp256k1::{PublicKey, SecretKey, SECP256K1};

use crate::address::{Address, EdAddress, Network};
use crate::crypto::{
    decode_from_wif, derive_echorand_seed, derive_private_key, derive_seed, encode_to_wif,
    secret_key_from_slice, EchoPrivateKey, PrivateKey, Role,
};
use crate::error::Result;

/// An secp256k1 keypair for signing transactions and encrypting memos
#[derive(Debug, Clone, PartialEq)]
pub struct Keypair {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl Keypair {
    /// Create and return a keypair with a randomly generated private key.
    pub fn new() -> Keypair {
        let (secret_key, public_key) = SECP256K1.generate_keypair(&mut secp256k1::rand::thread_rng());
        Keypair {
            secret_key,
            public_key,
        }
    }

    /// Derive the keypair an account uses for `role` from its name and password.
    pub fn from_credentials(username: &str, password: &str, role: Role) -> Result<Keypair> {
        let seed = derive_seed(username, password, role);
        Keypair::from_secret_slice(&derive_private_key(&seed))
    }

    pub fn from_secret_slice(slice: &[u8]) -> Result<Keypair> {
        let secret_key = secret_key_from_slice(slice)?;
        let public_key = PublicKey::from_secret_key(&SECP256K1, &secret_key);
        Ok(Keypair {
            secret_key,
            public_key,
        })
    }

    pub fn from_wif(wif: &str) -> Result<Keypair> {
        Keypair::from_secret_slice(&decode_from_wif(wif)?)
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    pub fn private_key_bytes(&self) -> EchoPrivateKey {
        self.secret_key.secret_bytes()
    }

    pub fn private_key(&self) -> PrivateKey {
        PrivateKey::Ecdsa(self.secret_key)
    }

    pub fn to_wif(&self) -> String {
        encode_to_wif(&self.private_key_bytes())
    }

    pub fn address(&self, network: &Network) -> Address {
        Address::new(self.public_key, network)
    }
}

impl Default for Keypair {
    fn default() -> Self {
        Keypair::new()
    }
}

/// An Ed25519 keypair. Shares the credential derivation of [`Keypair`]; the 32-byte digest is
/// used directly as the Ed25519 seed.
#[derive(Debug, Clone)]
pub struct EdKeypair {
    signing_key: SigningKey,
}

impl EdKeypair {
    pub fn from_credentials(username: &str, password: &str, role: Role) -> EdKeypair {
        EdKeypair::from_private_key(&derive_private_key(&derive_seed(username, password, role)))
    }

    /// The key an account uses to take part in block production.
    pub fn echorand(username: &str, password: &str) -> EdKeypair {
        EdKeypair::from_private_key(&derive_private_key(&derive_echorand_seed(username, password)))
    }

    pub fn from_private_key(private_key: &EchoPrivateKey) -> EdKeypair {
        EdKeypair {
            signing_key: SigningKey::from_bytes(private_key),
        }
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    pub fn private_key_bytes(&self) -> EchoPrivateKey {
        self.signing_key.to_bytes()
    }

    pub fn private_key(&self) -> PrivateKey {
        PrivateKey::Eddsa(self.signing_key.clone())
    }

    pub fn address(&self) -> EdAddress {
        EdAddress::new(self.public_key_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypair_from_credentials_test() {
        let keypair = Keypair::from_credentials("dima", "dima", Role::Active).unwrap();
        assert_eq!(
            hex::encode(keypair.public_key().serialize()),
            "0200a10cfc8f39726433ecac72c23719d7dd6dcd4635cc01a944fd4f22756de279"
        );
        assert_eq!(
            keypair.address(&Network::devnet()).to_string(),
            "ECHO4tmRW8HFwLSJR1wxPp5at3qeJ2XcfSwpKpAM6AQE8dZugqBtU7"
        );
        assert_eq!(keypair.to_wif(), "5J3UbadSyzzcQQ7HEfTr2brhJJpHhx3NsMzrvgzfysBesutNRCm");
    }

    #[test]
    fn keypair_is_deterministic_test() {
        let first = Keypair::from_credentials("testName", "testPassword", Role::Active).unwrap();
        let second = Keypair::from_credentials("testName", "testPassword", Role::Active).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.address(&Network::devnet()).to_string(),
            "ECHO7m7eTG2GxUhdb96EUn7Wh4Vi2P5rf5rYEcwGVascSnxUyJfcKG"
        );

        let other = Keypair::from_credentials("secondTestName", "secondTestPassword", Role::Active).unwrap();
        assert_eq!(
            other.address(&Network::devnet()).to_string(),
            "ECHO4v7JAoA75FHjzxDNJ3WW4rtUJ4Nzc2SMiSfvQ2JcXnhBSMvkpN"
        );
        assert_ne!(first, other);
    }

    #[test]
    fn keypair_wif_round_trip_test() {
        let keypair = Keypair::new();
        let restored = Keypair::from_wif(&keypair.to_wif()).unwrap();
        assert_eq!(restored, keypair);
    }

    #[test]
    fn ed_keypair_addresses_test() {
        assert_eq!(
            EdKeypair::from_credentials("dima", "dima", Role::Active).address().to_string(),
            "ECHO8fnhZpqLsPCa6sGnzhMrug48JAZqwdbZWbzBWSDniJ4u"
        );
        assert_eq!(
            EdKeypair::echorand("dima", "dima").address().to_string(),
            "ECHOAeZMHadzcGeebtbGoKi3ViMQGt1KREScbJeV1zPhXVw8"
        );
        assert_eq!(
            EdKeypair::from_credentials("testName", "testPassword", Role::Active).address().to_string(),
            "ECHO2fZnRe6VZN5SMQjCbqeQm3jiPqkUqqkP4LzJzDrpVr13"
        );
        assert_eq!(
            EdKeypair::echorand("secondTestName", "secondTestPassword").address().to_string(),
            "ECHOJDCC6NpToknwpAijtvKdtq9j3SiEL42o9AEUSSbLBqXx"
        );
    }

    #[test]
    fn ed_keypair_shares_seed_with_keypair_test() {
        let keypair = Keypair::from_credentials("dima", "dima", Role::Active).unwrap();
        let ed_keypair = EdKeypair::from_credentials("dima", "dima", Role::Active);
        assert_eq!(keypair.private_key_bytes(), ed_keypair.private_key_bytes());
        assert_ne!(keypair.public_key().serialize()[1..], ed_keypair.public_key_bytes()[..]);
    }
}
