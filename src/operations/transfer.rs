use serde::{Deserialize, Serialize};

use crate::asset::AssetAmount;
use crate::error::{EchoError, Result};
use crate::memo::Memo;
use crate::object::ObjectId;
use crate::serialize::{serialize_optional, ByteSerializable, Extensions};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransferOperation {
    #[serde(default = "AssetAmount::zero")]
    pub fee: AssetAmount,
    pub from: ObjectId,
    pub to: ObjectId,
    pub amount: AssetAmount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<Memo>,
    #[serde(default)]
    pub extensions: Extensions,
}

impl ByteSerializable for TransferOperation {
    fn to_bytes(&self) -> Vec<u8> {
        let mut vbytes: Vec<u8> = vec![];
        vbytes.extend(self.fee.to_bytes());
        vbytes.extend(self.from.to_bytes());
        vbytes.extend(self.to.to_bytes());
        vbytes.extend(self.amount.to_bytes());
        vbytes.extend(serialize_optional(&self.memo));
        vbytes.extend(self.extensions.to_bytes());
        vbytes
    }
}

#[derive(Debug, Default)]
pub struct TransferOperationBuilder {
    fee: Option<AssetAmount>,
    from: Option<ObjectId>,
    to: Option<ObjectId>,
    amount: Option<AssetAmount>,
    memo: Option<Memo>,
}

impl TransferOperationBuilder {
    pub fn new() -> Self {
        TransferOperationBuilder::default()
    }

    pub fn set_fee(mut self, fee: AssetAmount) -> Self {
        self.fee = Some(fee);
        self
    }

    pub fn set_from(mut self, from: ObjectId) -> Self {
        self.from = Some(from);
        self
    }

    pub fn set_to(mut self, to: ObjectId) -> Self {
        self.to = Some(to);
        self
    }

    pub fn set_amount(mut self, amount: AssetAmount) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn set_memo(mut self, memo: Memo) -> Self {
        self.memo = Some(memo);
        self
    }

    pub fn build(self) -> Result<TransferOperation> {
        Ok(TransferOperation {
            fee: self.fee.unwrap_or_else(AssetAmount::zero),
            from: self.from.ok_or(EchoError::MissingField("from"))?,
            to: self.to.ok_or(EchoError::MissingField("to"))?,
            amount: self.amount.ok_or(EchoError::MissingField("amount"))?,
            memo: self.memo,
            extensions: Extensions::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Network;
    use crate::asset::ECHO_ASSET_ID;
    use crate::crypto::Role;
    use crate::keypair::Keypair;
    use serde_json::json;

    fn builder() -> TransferOperationBuilder {
        TransferOperationBuilder::new()
            .set_from(ObjectId::account(1))
            .set_to(ObjectId::account(2))
            .set_amount(AssetAmount::new(1, ECHO_ASSET_ID))
    }

    #[test]
    fn transfer_bytes_test() {
        let transfer = builder().build().unwrap();
        assert_eq!(
            transfer.to_bytes(),
            vec![
                0, 0, 0, 0, 0, 0, 0, 0, 0, // fee
                1, // from
                2, // to
                1, 0, 0, 0, 0, 0, 0, 0, 0, // amount
                0, // no memo
                0, // extensions
            ]
        );
    }

    #[test]
    fn transfer_json_test() {
        let transfer = builder().build().unwrap();
        assert_eq!(
            serde_json::to_value(&transfer).unwrap(),
            json!({
                "fee": {"amount": 0, "asset_id": "1.3.0"},
                "from": "1.2.1",
                "to": "1.2.2",
                "amount": {"amount": 1, "asset_id": "1.3.0"},
                "extensions": []
            })
        );
    }

    #[test]
    fn transfer_from_json_tolerates_missing_optionals_test() {
        let transfer: TransferOperation = serde_json::from_value(json!({
            "from": "1.2.1",
            "to": "1.2.2",
            "amount": {"amount": "1", "asset_id": "1.3.0"},
            "unknown_field": true
        }))
        .unwrap();
        assert_eq!(transfer, builder().build().unwrap());
    }

    #[test]
    fn transfer_with_memo_test() {
        let sender = Keypair::from_credentials("testName", "testPassword", Role::Memo).unwrap();
        let recipient = Keypair::from_credentials("secondTestName", "secondTestPassword", Role::Memo).unwrap();
        let memo = Memo::new(&sender, &recipient.address(&Network::devnet()), 5, "testMessage").unwrap();
        let transfer = builder().set_memo(memo.clone()).build().unwrap();

        let bytes = transfer.to_bytes();
        assert_eq!(bytes[20], 1);
        assert_eq!(bytes.len(), 22 + memo.to_bytes().len());
        assert!(serde_json::to_value(&transfer).unwrap().get("memo").is_some());
    }

    #[test]
    fn transfer_builder_requires_fields_test() {
        assert!(matches!(
            TransferOperationBuilder::new().set_from(ObjectId::account(1)).build(),
            Err(EchoError::MissingField("to"))
        ));
        assert!(matches!(
            TransferOperationBuilder::new()
                .set_from(ObjectId::account(1))
                .set_to(ObjectId::account(2))
                .build(),
            Err(EchoError::MissingField("amount"))
        ));
    }
}
