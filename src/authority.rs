use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::address::Address;
use crate::error::{EchoError, Result};
use crate::object::ObjectId;
use crate::serialize::{varint, ByteSerializable, Extensions};

/// Voting account meaning "vote with my own options".
pub const PROXY_TO_SELF: ObjectId = ObjectId::new(1, 2, 5);

const MAX_VOTE_INSTANCE: u32 = 0x00ff_ffff;

/// Weighted threshold over accounts and keys.
///
/// Maps are ordered so the encoding matches the node's sorted containers. Threshold
/// satisfiability is the chain's concern and is not checked here.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Authority {
    pub weight_threshold: u32,
    #[serde(with = "pair_list", default)]
    pub account_auths: BTreeMap<ObjectId, u16>,
    #[serde(with = "pair_list", default)]
    pub key_auths: BTreeMap<Address, u16>,
    /// Always empty. Address authorities cannot be signed for, so a non-empty list is rejected.
    #[serde(with = "empty_address_auths", default)]
    address_auths: (),
}

impl Authority {
    pub fn new(weight_threshold: u32) -> Self {
        Authority {
            weight_threshold,
            account_auths: BTreeMap::new(),
            key_auths: BTreeMap::new(),
            address_auths: (),
        }
    }

    /// Single-key authority with threshold 1, the usual shape for a new account.
    pub fn from_key(key: Address) -> Self {
        let mut authority = Authority::new(1);
        authority.key_auths.insert(key, 1);
        authority
    }

    pub fn add_account(&mut self, account: ObjectId, weight: u16) {
        self.account_auths.insert(account, weight);
    }

    pub fn add_key(&mut self, key: Address, weight: u16) {
        self.key_auths.insert(key, weight);
    }
}

impl ByteSerializable for Authority {
    fn to_bytes(&self) -> Vec<u8> {
        let mut vbytes: Vec<u8> = vec![];
        vbytes.extend(&self.weight_threshold.to_le_bytes());
        vbytes.extend(varint(self.account_auths.len() as u64));
        for (account, weight) in &self.account_auths {
            vbytes.extend(account.to_bytes());
            vbytes.extend(&weight.to_le_bytes());
        }
        vbytes.extend(varint(self.key_auths.len() as u64));
        for (key, weight) in &self.key_auths {
            vbytes.extend(key.to_bytes());
            vbytes.extend(&weight.to_le_bytes());
        }
        // address_auths
        vbytes.extend(varint(0));
        vbytes
    }
}

mod empty_address_auths {
    use super::*;

    pub fn serialize<S: Serializer>(_: &(), serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(std::iter::empty::<(String, u16)>())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<(), D::Error> {
        let pairs: Vec<(String, u16)> = Vec::deserialize(deserializer)?;
        if !pairs.is_empty() {
            return Err(de::Error::custom("address_auths must be empty"));
        }
        Ok(())
    }
}

/// `[[key, weight], ...]` encoding used by the node for authority maps.
mod pair_list {
    use super::*;

    pub fn serialize<K, S>(map: &BTreeMap<K, u16>, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        K: Serialize,
        S: Serializer,
    {
        serializer.collect_seq(map.iter())
    }

    pub fn deserialize<'de, K, D>(deserializer: D) -> std::result::Result<BTreeMap<K, u16>, D::Error>
    where
        K: Deserialize<'de> + Ord,
        D: Deserializer<'de>,
    {
        let pairs: Vec<(K, u16)> = Vec::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

/// A vote for a committee member or witness, written `type:instance`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Vote {
    vote_type: u8,
    instance: u32,
}

impl Vote {
    pub fn new(vote_type: u32, instance: u32) -> Result<Self> {
        let vote_type = u8::try_from(vote_type)
            .map_err(|_| EchoError::OutOfRange(format!("vote type {} does not fit in one byte", vote_type)))?;
        if instance > MAX_VOTE_INSTANCE {
            return Err(EchoError::OutOfRange(format!(
                "vote instance {} does not fit in 24 bits",
                instance
            )));
        }
        Ok(Vote { vote_type, instance })
    }

    pub fn vote_type(&self) -> u8 {
        self.vote_type
    }

    pub fn instance(&self) -> u32 {
        self.instance
    }

    fn content(&self) -> u32 {
        (self.instance << 8) | self.vote_type as u32
    }
}

impl FromStr for Vote {
    type Err = EchoError;

    fn from_str(vote: &str) -> Result<Self> {
        let malformed = || EchoError::MalformedInput(format!("`{}` is not a vote id", vote));
        let (vote_type, instance) = vote.split_once(':').ok_or_else(malformed)?;
        let vote_type = vote_type.parse::<u32>().map_err(|_| malformed())?;
        let instance = instance.parse::<u32>().map_err(|_| malformed())?;
        Vote::new(vote_type, instance)
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.vote_type, self.instance)
    }
}

impl Ord for Vote {
    fn cmp(&self, other: &Self) -> Ordering {
        self.content().cmp(&other.content())
    }
}

impl PartialOrd for Vote {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl ByteSerializable for Vote {
    fn to_bytes(&self) -> Vec<u8> {
        self.content().to_le_bytes().to_vec()
    }
}

impl Serialize for Vote {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Vote {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let vote = String::deserialize(deserializer)?;
        vote.parse().map_err(de::Error::custom)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AccountOptions {
    pub memo_key: Address,
    #[serde(default = "proxy_to_self")]
    pub voting_account: ObjectId,
    #[serde(default)]
    pub num_witness: u16,
    #[serde(default)]
    pub num_committee: u16,
    #[serde(default)]
    pub votes: BTreeSet<Vote>,
    #[serde(default)]
    pub extensions: Extensions,
}

fn proxy_to_self() -> ObjectId {
    PROXY_TO_SELF
}

impl AccountOptions {
    pub fn new(memo_key: Address) -> Self {
        AccountOptions {
            memo_key,
            voting_account: PROXY_TO_SELF,
            num_witness: 0,
            num_committee: 0,
            votes: BTreeSet::new(),
            extensions: Extensions::new(),
        }
    }
}

impl ByteSerializable for AccountOptions {
    fn to_bytes(&self) -> Vec<u8> {
        let mut vbytes: Vec<u8> = vec![];
        vbytes.extend(self.memo_key.to_bytes());
        vbytes.extend(self.voting_account.to_bytes());
        vbytes.extend(&self.num_witness.to_le_bytes());
        vbytes.extend(&self.num_committee.to_le_bytes());
        vbytes.extend(varint(self.votes.len() as u64));
        for vote in &self.votes {
            vbytes.extend(vote.to_bytes());
        }
        vbytes.extend(self.extensions.to_bytes());
        vbytes
    }
}
