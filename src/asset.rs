use serde::{Deserialize, Serialize};

use crate::error::{EchoError, Result};
use crate::object::ObjectId;
use crate::serialize::{serialize_string, u64_number_or_string, ByteSerializable, Extensions};

/// Core asset of the chain, `1.3.0`.
pub const ECHO_ASSET_ID: ObjectId = ObjectId::new(1, 3, 0);

/// A quantity of one asset, in the asset's smallest unit.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetAmount {
    #[serde(with = "u64_number_or_string")]
    amount: u64,
    asset_id: ObjectId,
}

impl AssetAmount {
    pub fn new(amount: u64, asset_id: ObjectId) -> Self {
        AssetAmount { amount, asset_id }
    }

    /// A zero amount of the core asset, the fee placeholder before fees are known.
    pub fn zero() -> Self {
        AssetAmount::new(0, ECHO_ASSET_ID)
    }

    pub fn get_amount(&self) -> u64 {
        self.amount
    }

    pub fn get_asset_id(&self) -> &ObjectId {
        &self.asset_id
    }

    pub fn checked_add(&self, other: &AssetAmount) -> Result<AssetAmount> {
        self.check_same_asset(other)?;
        let amount = self.amount.checked_add(other.amount).ok_or_else(|| {
            EchoError::OutOfRange(format!("{} + {} overflows", self.amount, other.amount))
        })?;
        Ok(AssetAmount::new(amount, self.asset_id))
    }

    pub fn checked_sub(&self, other: &AssetAmount) -> Result<AssetAmount> {
        self.check_same_asset(other)?;
        let amount = self.amount.checked_sub(other.amount).ok_or_else(|| {
            EchoError::OutOfRange(format!("{} - {} underflows", self.amount, other.amount))
        })?;
        Ok(AssetAmount::new(amount, self.asset_id))
    }

    fn check_same_asset(&self, other: &AssetAmount) -> Result<()> {
        if self.asset_id != other.asset_id {
            return Err(EchoError::MalformedInput(format!(
                "cannot combine amounts of {} and {}",
                self.asset_id, other.asset_id
            )));
        }
        Ok(())
    }
}

impl ByteSerializable for AssetAmount {
    fn to_bytes(&self) -> Vec<u8> {
        let mut vbytes: Vec<u8> = vec![];
        vbytes.extend(&self.amount.to_le_bytes());
        vbytes.extend(self.asset_id.to_bytes());
        vbytes
    }
}

/// Exchange rate between two assets.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Price {
    pub base: AssetAmount,
    pub quote: AssetAmount,
}

impl ByteSerializable for Price {
    fn to_bytes(&self) -> Vec<u8> {
        let mut vbytes = self.base.to_bytes();
        vbytes.extend(self.quote.to_bytes());
        vbytes
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AssetOptions {
    #[serde(with = "u64_number_or_string")]
    pub max_supply: u64,
    #[serde(default)]
    pub issuer_permissions: u16,
    #[serde(default)]
    pub flags: u16,
    pub core_exchange_rate: Price,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub extensions: Extensions,
}

impl AssetOptions {
    pub fn new(max_supply: u64, core_exchange_rate: Price) -> Self {
        AssetOptions {
            max_supply,
            issuer_permissions: 0,
            flags: 0,
            core_exchange_rate,
            description: String::new(),
            extensions: Extensions::new(),
        }
    }
}

impl ByteSerializable for AssetOptions {
    fn to_bytes(&self) -> Vec<u8> {
        let mut vbytes: Vec<u8> = vec![];
        vbytes.extend(&self.max_supply.to_le_bytes());
        vbytes.extend(&self.issuer_permissions.to_le_bytes());
        vbytes.extend(&self.flags.to_le_bytes());
        vbytes.extend(self.core_exchange_rate.to_bytes());
        vbytes.extend(serialize_string(&self.description));
        vbytes.extend(self.extensions.to_bytes());
        vbytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn asset_amount_bytes_test() {
        let amount = AssetAmount::new(1, ObjectId::asset(0));
        assert_eq!(amount.to_bytes(), vec![1, 0, 0, 0, 0, 0, 0, 0, 0]);

        let large = AssetAmount::new(u64::MAX, ObjectId::asset(1));
        assert_eq!(large.to_bytes(), vec![0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 1]);
    }

    #[test]
    fn asset_amount_json_test() {
        let amount = AssetAmount::new(25, ECHO_ASSET_ID);
        assert_eq!(serde_json::to_value(amount).unwrap(), json!({"amount": 25, "asset_id": "1.3.0"}));

        let from_string: AssetAmount =
            serde_json::from_value(json!({"amount": "9000000000000000000", "asset_id": "1.3.4"})).unwrap();
        assert_eq!(from_string.get_amount(), 9_000_000_000_000_000_000);
        assert_eq!(from_string.get_asset_id(), &ObjectId::asset(4));
    }

    #[test]
    fn asset_amount_arithmetic_test() {
        let one = AssetAmount::new(1, ECHO_ASSET_ID);
        let max = AssetAmount::new(u64::MAX, ECHO_ASSET_ID);
        assert_eq!(one.checked_add(&one).unwrap().get_amount(), 2);
        assert!(matches!(max.checked_add(&one), Err(EchoError::OutOfRange(_))));
        assert!(matches!(AssetAmount::zero().checked_sub(&one), Err(EchoError::OutOfRange(_))));
        assert!(one.checked_add(&AssetAmount::new(1, ObjectId::asset(1))).is_err());
    }

    #[test]
    fn asset_options_bytes_test() {
        let rate = Price {
            base: AssetAmount::new(1, ECHO_ASSET_ID),
            quote: AssetAmount::new(1, ObjectId::asset(1)),
        };
        let options = AssetOptions::new(1000, rate);
        let bytes = options.to_bytes();
        // max_supply + permissions + flags + price + empty description + empty extensions
        assert_eq!(bytes.len(), 8 + 2 + 2 + 18 + 1 + 1);
        assert_eq!(&bytes[..8], &1000u64.to_le_bytes());
    }
}
