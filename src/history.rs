use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EchoError, Result};
use crate::object::ObjectId;
use crate::operations::{Operation, OperationType};

/// Id the node treats as "no bound" for `start` and `stop` in history queries.
pub const DEFAULT_HISTORY_ID: ObjectId = ObjectId::new(1, 10, 0);
/// Largest page the history api returns.
pub const DEFAULT_HISTORY_LIMIT: u32 = 100;

/// One `1.10.x` operation history object.
///
/// The operation is decoded when its tag is known. Operations of other kinds keep only
/// `raw_operation`, so unknown entries are passed through instead of failing the whole page.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: ObjectId,
    pub block_num: u64,
    pub trx_in_block: u64,
    pub op_in_trx: u64,
    pub virtual_op: u64,
    pub operation: Option<Operation>,
    pub raw_operation: Value,
}

#[derive(Deserialize)]
struct RawEntry {
    id: ObjectId,
    #[serde(default)]
    block_num: u64,
    #[serde(default)]
    trx_in_block: u64,
    #[serde(default)]
    op_in_trx: u64,
    #[serde(default)]
    virtual_op: u64,
    op: Value,
}

impl HistoryEntry {
    pub fn from_json(value: &Value) -> Result<HistoryEntry> {
        let raw: RawEntry = serde_json::from_value(value.clone())?;
        let operation = match raw.op.get(0).and_then(Value::as_u64) {
            Some(tag) if OperationType::from_id(tag).is_some() => Some(Operation::from_json(&raw.op)?),
            Some(_) => None,
            None => {
                return Err(EchoError::decoding(format!(
                    "history entry {} has no operation tag",
                    raw.id
                )))
            }
        };
        Ok(HistoryEntry {
            id: raw.id,
            block_num: raw.block_num,
            trx_in_block: raw.trx_in_block,
            op_in_trx: raw.op_in_trx,
            virtual_op: raw.virtual_op,
            operation,
            raw_operation: raw.op,
        })
    }

    pub fn is_decoded(&self) -> bool {
        self.operation.is_some()
    }
}

impl Serialize for HistoryEntry {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serde_json::json!({
            "id": self.id,
            "block_num": self.block_num,
            "trx_in_block": self.trx_in_block,
            "op_in_trx": self.op_in_trx,
            "virtual_op": self.virtual_op,
            "op": self.raw_operation,
        })
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for HistoryEntry {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        HistoryEntry::from_json(&value).map_err(serde::de::Error::custom)
    }
}
