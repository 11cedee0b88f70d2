use serde::{Deserialize, Serialize};

use crate::asset::{AssetAmount, AssetOptions};
use crate::error::{EchoError, Result};
use crate::memo::Memo;
use crate::object::ObjectId;
use crate::serialize::{serialize_optional, serialize_string, ByteSerializable, Extensions};

/// Create a user-issued asset. Market-pegged assets are not supported, so the
/// bitasset options are always absent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AssetCreateOperation {
    #[serde(default = "AssetAmount::zero")]
    pub fee: AssetAmount,
    pub issuer: ObjectId,
    pub symbol: String,
    pub precision: u8,
    pub common_options: AssetOptions,
    #[serde(default)]
    pub is_prediction_market: bool,
    #[serde(default)]
    pub extensions: Extensions,
}

impl AssetCreateOperation {
    pub fn new(issuer: ObjectId, symbol: &str, precision: u8, common_options: AssetOptions) -> Self {
        AssetCreateOperation {
            fee: AssetAmount::zero(),
            issuer,
            symbol: symbol.to_string(),
            precision,
            common_options,
            is_prediction_market: false,
            extensions: Extensions::new(),
        }
    }
}

impl ByteSerializable for AssetCreateOperation {
    fn to_bytes(&self) -> Vec<u8> {
        let mut vbytes: Vec<u8> = vec![];
        vbytes.extend(self.fee.to_bytes());
        vbytes.extend(self.issuer.to_bytes());
        vbytes.extend(serialize_string(&self.symbol));
        vbytes.push(self.precision);
        vbytes.extend(self.common_options.to_bytes());
        // bitasset_opts
        vbytes.push(0);
        vbytes.extend(self.is_prediction_market.to_bytes());
        vbytes.extend(self.extensions.to_bytes());
        vbytes
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AssetIssueOperation {
    #[serde(default = "AssetAmount::zero")]
    pub fee: AssetAmount,
    pub issuer: ObjectId,
    pub asset_to_issue: AssetAmount,
    pub issue_to_account: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<Memo>,
    #[serde(default)]
    pub extensions: Extensions,
}

impl ByteSerializable for AssetIssueOperation {
    fn to_bytes(&self) -> Vec<u8> {
        let mut vbytes: Vec<u8> = vec![];
        vbytes.extend(self.fee.to_bytes());
        vbytes.extend(self.issuer.to_bytes());
        vbytes.extend(self.asset_to_issue.to_bytes());
        vbytes.extend(self.issue_to_account.to_bytes());
        vbytes.extend(serialize_optional(&self.memo));
        vbytes.extend(self.extensions.to_bytes());
        vbytes
    }
}

#[derive(Debug, Default)]
pub struct AssetIssueOperationBuilder {
    fee: Option<AssetAmount>,
    issuer: Option<ObjectId>,
    asset_to_issue: Option<AssetAmount>,
    issue_to_account: Option<ObjectId>,
    memo: Option<Memo>,
}

impl AssetIssueOperationBuilder {
    pub fn new() -> Self {
        AssetIssueOperationBuilder::default()
    }

    pub fn set_fee(mut self, fee: AssetAmount) -> Self {
        self.fee = Some(fee);
        self
    }

    pub fn set_issuer(mut self, issuer: ObjectId) -> Self {
        self.issuer = Some(issuer);
        self
    }

    pub fn set_asset_to_issue(mut self, amount: AssetAmount) -> Self {
        self.asset_to_issue = Some(amount);
        self
    }

    pub fn set_issue_to_account(mut self, account: ObjectId) -> Self {
        self.issue_to_account = Some(account);
        self
    }

    pub fn set_memo(mut self, memo: Memo) -> Self {
        self.memo = Some(memo);
        self
    }

    pub fn build(self) -> Result<AssetIssueOperation> {
        Ok(AssetIssueOperation {
            fee: self.fee.unwrap_or_else(AssetAmount::zero),
            issuer: self.issuer.ok_or(EchoError::MissingField("issuer"))?,
            asset_to_issue: self.asset_to_issue.ok_or(EchoError::MissingField("asset_to_issue"))?,
            issue_to_account: self
                .issue_to_account
                .ok_or(EchoError::MissingField("issue_to_account"))?,
            memo: self.memo,
            extensions: Extensions::new(),
        })
    }
}
