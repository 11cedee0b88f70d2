/*!
# Operations

Every state change on the chain is an operation. A transaction carries an ordered list of them.

On the wire an operation is a two-element array `[type_tag, body]`. The binary form used for
signing is `varint(type_tag) || body`, where each body is `fee || fields in declared order ||
extensions`.

The numeric tags are positions in the node's operation enumeration and are kept in one place,
[`OperationType`].
*/

mod account;
mod asset;
mod contract;
mod sidechain;
mod transfer;

pub use account::{AccountCreateOperation, AccountUpdateOperation, AccountUpdateOperationBuilder};
pub use asset::{AssetCreateOperation, AssetIssueOperation, AssetIssueOperationBuilder};
pub use contract::{
    ContractCallOperation, ContractCallOperationBuilder, ContractCreateOperation,
    ContractCreateOperationBuilder, ContractTransferOperation, DEFAULT_GAS,
};
pub use sidechain::{SidechainBurnOperation, SidechainIssueOperation};
pub use transfer::{TransferOperation, TransferOperationBuilder};

use serde::ser::SerializeTuple;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::asset::AssetAmount;
use crate::error::{EchoError, Result};
use crate::serialize::{write_varint, ByteSerializable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    Transfer = 0,
    AccountCreate = 5,
    AccountUpdate = 6,
    AssetCreate = 10,
    AssetIssue = 14,
    ContractCreate = 47,
    ContractCall = 48,
    ContractTransfer = 49,
    SidechainIssue = 50,
    SidechainBurn = 51,
}

impl OperationType {
    pub fn id(&self) -> u64 {
        *self as u64
    }

    pub fn from_id(id: u64) -> Option<Self> {
        match id {
            0 => Some(OperationType::Transfer),
            5 => Some(OperationType::AccountCreate),
            6 => Some(OperationType::AccountUpdate),
            10 => Some(OperationType::AssetCreate),
            14 => Some(OperationType::AssetIssue),
            47 => Some(OperationType::ContractCreate),
            48 => Some(OperationType::ContractCall),
            49 => Some(OperationType::ContractTransfer),
            50 => Some(OperationType::SidechainIssue),
            51 => Some(OperationType::SidechainBurn),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Transfer(TransferOperation),
    AccountCreate(AccountCreateOperation),
    AccountUpdate(AccountUpdateOperation),
    AssetCreate(AssetCreateOperation),
    AssetIssue(AssetIssueOperation),
    ContractCreate(ContractCreateOperation),
    ContractCall(ContractCallOperation),
    ContractTransfer(ContractTransferOperation),
    SidechainIssue(SidechainIssueOperation),
    SidechainBurn(SidechainBurnOperation),
}

// Runs `$action` with `$body` bound to the inner operation of any variant.
macro_rules! with_body {
    ($operation:expr, $body:ident => $action:expr) => {
        match $operation {
            Operation::Transfer($body) => $action,
            Operation::AccountCreate($body) => $action,
            Operation::AccountUpdate($body) => $action,
            Operation::AssetCreate($body) => $action,
            Operation::AssetIssue($body) => $action,
            Operation::ContractCreate($body) => $action,
            Operation::ContractCall($body) => $action,
            Operation::ContractTransfer($body) => $action,
            Operation::SidechainIssue($body) => $action,
            Operation::SidechainBurn($body) => $action,
        }
    };
}

impl Operation {
    pub fn operation_type(&self) -> OperationType {
        match self {
            Operation::Transfer(_) => OperationType::Transfer,
            Operation::AccountCreate(_) => OperationType::AccountCreate,
            Operation::AccountUpdate(_) => OperationType::AccountUpdate,
            Operation::AssetCreate(_) => OperationType::AssetCreate,
            Operation::AssetIssue(_) => OperationType::AssetIssue,
            Operation::ContractCreate(_) => OperationType::ContractCreate,
            Operation::ContractCall(_) => OperationType::ContractCall,
            Operation::ContractTransfer(_) => OperationType::ContractTransfer,
            Operation::SidechainIssue(_) => OperationType::SidechainIssue,
            Operation::SidechainBurn(_) => OperationType::SidechainBurn,
        }
    }

    pub fn get_fee(&self) -> &AssetAmount {
        with_body!(self, body => &body.fee)
    }

    pub fn set_fee(&mut self, fee: AssetAmount) {
        with_body!(self, body => body.fee = fee)
    }

    /// `[type_tag, {fields}]`, the form the node expects inside a transaction.
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_json(value: &Value) -> Result<Operation> {
        let pair = value
            .as_array()
            .filter(|pair| pair.len() == 2)
            .ok_or_else(|| EchoError::decoding(format!("operation is not a [tag, body] pair: {}", value)))?;
        let id = pair[0]
            .as_u64()
            .ok_or_else(|| EchoError::decoding(format!("operation tag is not a number: {}", pair[0])))?;
        let operation_type = OperationType::from_id(id)
            .ok_or_else(|| EchoError::decoding(format!("unknown operation type {}", id)))?;
        let body = pair[1].clone();
        let operation = match operation_type {
            OperationType::Transfer => Operation::Transfer(serde_json::from_value(body)?),
            OperationType::AccountCreate => Operation::AccountCreate(serde_json::from_value(body)?),
            OperationType::AccountUpdate => Operation::AccountUpdate(serde_json::from_value(body)?),
            OperationType::AssetCreate => Operation::AssetCreate(serde_json::from_value(body)?),
            OperationType::AssetIssue => Operation::AssetIssue(serde_json::from_value(body)?),
            OperationType::ContractCreate => Operation::ContractCreate(serde_json::from_value(body)?),
            OperationType::ContractCall => Operation::ContractCall(serde_json::from_value(body)?),
            OperationType::ContractTransfer => Operation::ContractTransfer(serde_json::from_value(body)?),
            OperationType::SidechainIssue => Operation::SidechainIssue(serde_json::from_value(body)?),
            OperationType::SidechainBurn => Operation::SidechainBurn(serde_json::from_value(body)?),
        };
        Ok(operation)
    }
}

impl ByteSerializable for Operation {
    fn to_bytes(&self) -> Vec<u8> {
        let mut vbytes: Vec<u8> = vec![];
        write_varint(&mut vbytes, self.operation_type().id());
        vbytes.extend(with_body!(self, body => body.to_bytes()));
        vbytes
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.operation_type().id())?;
        with_body!(self, body => tuple.serialize_element(body)?);
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Operation::from_json(&value).map_err(de::Error::custom)
    }
}

macro_rules! impl_from_operation {
    ($($variant:ident($operation:ty)),* $(,)?) => {
        $(
            impl From<$operation> for Operation {
                fn from(operation: $operation) -> Self {
                    Operation::$variant(operation)
                }
            }
        )*
    };
}

impl_from_operation!(
    Transfer(TransferOperation),
    AccountCreate(AccountCreateOperation),
    AccountUpdate(AccountUpdateOperation),
    AssetCreate(AssetCreateOperation),
    AssetIssue(AssetIssueOperation),
    ContractCreate(ContractCreateOperation),
    ContractCall(ContractCallOperation),
    ContractTransfer(ContractTransferOperation),
    SidechainIssue(SidechainIssueOperation),
    SidechainBurn(SidechainBurnOperation),
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::ECHO_ASSET_ID;
    use crate::object::ObjectId;
    use serde_json::json;

    fn transfer() -> Operation {
        TransferOperationBuilder::new()
            .set_from(ObjectId::account(17))
            .set_to(ObjectId::account(18))
            .set_amount(AssetAmount::new(1000, ECHO_ASSET_ID))
            .build()
            .unwrap()
            .into()
    }

    #[test]
    fn operation_type_ids_test() {
        for id in 0..64 {
            if let Some(operation_type) = OperationType::from_id(id) {
                assert_eq!(operation_type.id(), id);
            }
        }
        assert_eq!(OperationType::from_id(1), None);
    }

    #[test]
    fn operation_json_is_tagged_pair_test() {
        let json = transfer().to_json().unwrap();
        assert_eq!(json[0], json!(0));
        assert_eq!(json[1]["from"], json!("1.2.17"));
        assert_eq!(json[1]["extensions"], json!([]));
        assert_eq!(Operation::from_json(&json).unwrap(), transfer());
    }

    #[test]
    fn operation_bytes_start_with_tag_test() {
        let bytes = transfer().to_bytes();
        assert_eq!(bytes[0], 0);
        let contract_transfer: Operation = ContractTransferOperation::new(
            ObjectId::contract(1),
            ObjectId::account(2),
            AssetAmount::new(5, ECHO_ASSET_ID),
        )
        .into();
        assert_eq!(contract_transfer.to_bytes()[0], 49);
    }

    #[test]
    fn set_fee_test() {
        let mut operation = transfer();
        operation.set_fee(AssetAmount::new(20, ECHO_ASSET_ID));
        assert_eq!(operation.get_fee().get_amount(), 20);
        assert_eq!(&operation.to_bytes()[1..9], &20u64.to_le_bytes());
    }

    #[test]
    fn from_json_rejects_bad_shapes_test() {
        assert!(Operation::from_json(&json!({"fee": 1})).is_err());
        assert!(Operation::from_json(&json!([999, {}])).is_err());
        assert!(Operation::from_json(&json!([0, {"from": "1.2.1"}])).is_err());
    }
}
