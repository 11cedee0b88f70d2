use serde::{Deserialize, Serialize};

use crate::asset::AssetAmount;
use crate::object::ObjectId;
use crate::serialize::{ByteSerializable, Extensions};

/// Credit of sidechain-wrapped funds after a deposit on the external chain.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SidechainIssueOperation {
    #[serde(default = "AssetAmount::zero")]
    pub fee: AssetAmount,
    pub value: AssetAmount,
    pub account: ObjectId,
    pub deposit_id: ObjectId,
    #[serde(default)]
    pub extensions: Extensions,
}

impl ByteSerializable for SidechainIssueOperation {
    fn to_bytes(&self) -> Vec<u8> {
        let mut vbytes: Vec<u8> = vec![];
        vbytes.extend(self.fee.to_bytes());
        vbytes.extend(self.value.to_bytes());
        vbytes.extend(self.account.to_bytes());
        vbytes.extend(self.deposit_id.to_bytes());
        vbytes.extend(self.extensions.to_bytes());
        vbytes
    }
}

/// Burn of sidechain-wrapped funds backing a withdrawal to the external chain.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SidechainBurnOperation {
    #[serde(default = "AssetAmount::zero")]
    pub fee: AssetAmount,
    pub value: AssetAmount,
    pub account: ObjectId,
    pub withdraw_id: ObjectId,
    #[serde(default)]
    pub extensions: Extensions,
}

impl ByteSerializable for SidechainBurnOperation {
    fn to_bytes(&self) -> Vec<u8> {
        let mut vbytes: Vec<u8> = vec![];
        vbytes.extend(self.fee.to_bytes());
        vbytes.extend(self.value.to_bytes());
        vbytes.extend(self.account.to_bytes());
        vbytes.extend(self.withdraw_id.to_bytes());
        vbytes.extend(self.extensions.to_bytes());
        vbytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sidechain_issue_from_history_json_test() {
        let operation: SidechainIssueOperation = serde_json::from_value(json!({
            "fee": {"amount": "0", "asset_id": "1.3.0"},
            "value": {"amount": "1000", "asset_id": "1.3.1"},
            "account": "1.2.22",
            "deposit_id": "1.15.3",
            "extensions": []
        }))
        .unwrap();
        assert_eq!(operation.value.get_amount(), 1000);
        assert_eq!(operation.deposit_id.to_string(), "1.15.3");

        let bytes = operation.to_bytes();
        assert_eq!(&bytes[9..17], &1000u64.to_le_bytes());
        assert_eq!(&bytes[17..], &[1, 22, 3, 0]);
    }

    #[test]
    fn sidechain_burn_bytes_test() {
        let operation = SidechainBurnOperation {
            fee: AssetAmount::zero(),
            value: AssetAmount::new(7, ObjectId::asset(2)),
            account: ObjectId::account(4),
            withdraw_id: "1.16.9".parse().unwrap(),
            extensions: Extensions::new(),
        };
        assert_eq!(&operation.to_bytes()[17..], &[2, 4, 9, 0]);
    }
}
