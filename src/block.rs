use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{EchoError, Result};
use crate::object::ObjectId;
use crate::serialize::{u64_number_or_string, ByteSerializable};
use crate::time::{format_chain_time, parse_chain_time};

/// Seconds a transaction stays valid past the head block time.
pub const DEFAULT_EXPIRATION_SECONDS: u32 = 40;

/// The `2.1.0` object: head of the chain as the node currently sees it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DynamicGlobalProperties {
    pub id: ObjectId,
    #[serde(with = "u64_number_or_string")]
    pub head_block_number: u64,
    pub head_block_id: String,
    pub time: String,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// A signed block returned by `get_block`. Transactions stay in their JSON form.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Block {
    pub previous: String,
    pub timestamp: String,
    #[serde(default)]
    pub transactions: Vec<Value>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Reference to a recent block plus the expiration time, the TaPoS header of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockData {
    ref_block_num: u16,
    ref_block_prefix: u32,
    expiration: u32,
}

impl BlockData {
    pub fn new(ref_block_num: u16, ref_block_prefix: u32, expiration: u32) -> Self {
        BlockData {
            ref_block_num,
            ref_block_prefix,
            expiration,
        }
    }

    pub fn from_properties(properties: &DynamicGlobalProperties, expiration_seconds: u32) -> Result<Self> {
        let ref_block_num = (properties.head_block_number & 0xffff) as u16;

        let block_id = hex::decode(&properties.head_block_id).map_err(|error| {
            EchoError::MalformedInput(format!("head block id `{}`: {}", properties.head_block_id, error))
        })?;
        if block_id.len() < 8 {
            return Err(EchoError::MalformedInput(format!(
                "head block id `{}` is too short",
                properties.head_block_id
            )));
        }
        let mut prefix = [0u8; 4];
        prefix.copy_from_slice(&block_id[4..8]);
        let ref_block_prefix = u32::from_le_bytes(prefix);

        let head_time = parse_chain_time(&properties.time)?;
        let expiration = head_time
            .checked_add(expiration_seconds as i64)
            .and_then(|seconds| u32::try_from(seconds).ok())
            .ok_or_else(|| EchoError::OutOfRange(format!("expiration after {}", properties.time)))?;

        Ok(BlockData::new(ref_block_num, ref_block_prefix, expiration))
    }

    pub fn get_ref_block_num(&self) -> u16 {
        self.ref_block_num
    }

    pub fn get_ref_block_prefix(&self) -> u32 {
        self.ref_block_prefix
    }

    pub fn get_expiration(&self) -> u32 {
        self.expiration
    }

    pub fn expiration_string(&self) -> String {
        format_chain_time(self.expiration)
    }
}

impl ByteSerializable for BlockData {
    fn to_bytes(&self) -> Vec<u8> {
        let mut vbytes: Vec<u8> = vec![];
        vbytes.extend(&self.ref_block_num.to_le_bytes());
        vbytes.extend(&self.ref_block_prefix.to_le_bytes());
        vbytes.extend(&self.expiration.to_le_bytes());
        vbytes
    }
}
