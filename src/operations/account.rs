use serde::{Deserialize, Serialize};

use crate::asset::AssetAmount;
use crate::authority::{AccountOptions, Authority};
use crate::error::{EchoError, Result};
use crate::object::ObjectId;
use crate::serialize::{serialize_optional, serialize_string, ByteSerializable, Extensions};

/// Register a new account named `name`, paid for by `registrar`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AccountCreateOperation {
    #[serde(default = "AssetAmount::zero")]
    pub fee: AssetAmount,
    pub registrar: ObjectId,
    pub referrer: ObjectId,
    #[serde(default)]
    pub referrer_percent: u16,
    pub name: String,
    pub owner: Authority,
    pub active: Authority,
    pub options: AccountOptions,
    #[serde(default)]
    pub extensions: Extensions,
}

impl AccountCreateOperation {
    pub fn new(
        name: &str,
        registrar: ObjectId,
        referrer: ObjectId,
        owner: Authority,
        active: Authority,
        options: AccountOptions,
    ) -> Self {
        AccountCreateOperation {
            fee: AssetAmount::zero(),
            registrar,
            referrer,
            referrer_percent: 0,
            name: name.to_string(),
            owner,
            active,
            options,
            extensions: Extensions::new(),
        }
    }
}

impl ByteSerializable for AccountCreateOperation {
    fn to_bytes(&self) -> Vec<u8> {
        let mut vbytes: Vec<u8> = vec![];
        vbytes.extend(self.fee.to_bytes());
        vbytes.extend(self.registrar.to_bytes());
        vbytes.extend(self.referrer.to_bytes());
        vbytes.extend(&self.referrer_percent.to_le_bytes());
        vbytes.extend(serialize_string(&self.name));
        vbytes.extend(self.owner.to_bytes());
        vbytes.extend(self.active.to_bytes());
        vbytes.extend(self.options.to_bytes());
        vbytes.extend(self.extensions.to_bytes());
        vbytes
    }
}

/// Replace any of an account's authorities or options. Absent parts stay as they are.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AccountUpdateOperation {
    #[serde(default = "AssetAmount::zero")]
    pub fee: AssetAmount,
    pub account: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Authority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<Authority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_options: Option<AccountOptions>,
    #[serde(default)]
    pub extensions: Extensions,
}

impl ByteSerializable for AccountUpdateOperation {
    fn to_bytes(&self) -> Vec<u8> {
        let mut vbytes: Vec<u8> = vec![];
        vbytes.extend(self.fee.to_bytes());
        vbytes.extend(self.account.to_bytes());
        vbytes.extend(serialize_optional(&self.owner));
        vbytes.extend(serialize_optional(&self.active));
        vbytes.extend(serialize_optional(&self.new_options));
        vbytes.extend(self.extensions.to_bytes());
        vbytes
    }
}

#[derive(Debug, Default)]
pub struct AccountUpdateOperationBuilder {
    fee: Option<AssetAmount>,
    account: Option<ObjectId>,
    owner: Option<Authority>,
    active: Option<Authority>,
    new_options: Option<AccountOptions>,
}

impl AccountUpdateOperationBuilder {
    pub fn new() -> Self {
        AccountUpdateOperationBuilder::default()
    }

    pub fn set_fee(mut self, fee: AssetAmount) -> Self {
        self.fee = Some(fee);
        self
    }

    pub fn set_account(mut self, account: ObjectId) -> Self {
        self.account = Some(account);
        self
    }

    pub fn set_owner(mut self, owner: Authority) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn set_active(mut self, active: Authority) -> Self {
        self.active = Some(active);
        self
    }

    pub fn set_options(mut self, options: AccountOptions) -> Self {
        self.new_options = Some(options);
        self
    }

    pub fn build(self) -> Result<AccountUpdateOperation> {
        Ok(AccountUpdateOperation {
            fee: self.fee.unwrap_or_else(AssetAmount::zero),
            account: self.account.ok_or(EchoError::MissingField("account"))?,
            owner: self.owner,
            active: self.active,
            new_options: self.new_options,
            extensions: Extensions::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::authority::PROXY_TO_SELF;
    use serde_json::json;

    const KEY: &str = "ECHO7m7eTG2GxUhdb96EUn7Wh4Vi2P5rf5rYEcwGVascSnxUyJfcKG";

    fn key() -> Address {
        KEY.parse().unwrap()
    }

    #[test]
    fn account_create_bytes_test() {
        let operation = AccountCreateOperation::new(
            "abc",
            ObjectId::account(1),
            ObjectId::account(1),
            Authority::from_key(key()),
            Authority::from_key(key()),
            AccountOptions::new(key()),
        );
        let bytes = operation.to_bytes();
        assert_eq!(&bytes[9..11], &[1, 1]);
        assert_eq!(&bytes[11..13], &[0, 0]);
        assert_eq!(&bytes[13..17], &[3, b'a', b'b', b'c']);
        // fee, ids, percent, name, two authorities, options, extensions
        assert_eq!(bytes.len(), 9 + 2 + 2 + 4 + 42 + 42 + 40 + 1);
    }

    #[test]
    fn account_create_json_test() {
        let operation = AccountCreateOperation::new(
            "abc",
            ObjectId::account(1),
            ObjectId::account(1),
            Authority::from_key(key()),
            Authority::from_key(key()),
            AccountOptions::new(key()),
        );
        let value = serde_json::to_value(&operation).unwrap();
        assert_eq!(value["name"], json!("abc"));
        assert_eq!(value["owner"]["key_auths"], json!([[KEY, 1]]));
        assert_eq!(value["options"]["voting_account"], json!(PROXY_TO_SELF.to_string()));
        assert_eq!(serde_json::from_value::<AccountCreateOperation>(value).unwrap(), operation);
    }

    #[test]
    fn account_update_optional_parts_test() {
        let operation = AccountUpdateOperationBuilder::new()
            .set_account(ObjectId::account(7))
            .set_active(Authority::from_key(key()))
            .build()
            .unwrap();
        let bytes = operation.to_bytes();
        assert_eq!(bytes[9], 7);
        assert_eq!(bytes[10], 0);
        assert_eq!(bytes[11], 1);
        assert_eq!(&bytes[bytes.len() - 2..], &[0, 0]);

        let value = serde_json::to_value(&operation).unwrap();
        assert!(value.get("owner").is_none());
        assert!(value.get("active").is_some());
    }

    #[test]
    fn account_update_requires_account_test() {
        assert!(matches!(
            AccountUpdateOperationBuilder::new().build(),
            Err(EchoError::MissingField("account"))
        ));
    }
}
