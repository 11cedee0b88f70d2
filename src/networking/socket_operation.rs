use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::asset::AssetAmount;
use crate::block::{Block, DynamicGlobalProperties};
use crate::error::{EchoError, Result};
use crate::history::{HistoryEntry, DEFAULT_HISTORY_ID, DEFAULT_HISTORY_LIMIT};
use crate::object::{GrapheneObject, ObjectId};
use crate::operations::Operation;

/// The login API is always registered under this id.
pub const LOGIN_API_ID: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Api {
    Login,
    Database,
    NetworkBroadcast,
    History,
}

impl Api {
    pub fn name(&self) -> &'static str {
        match self {
            Api::Login => "login",
            Api::Database => "database",
            Api::NetworkBroadcast => "network_broadcast",
            Api::History => "history",
        }
    }

    pub fn from_name(name: &str) -> Option<Api> {
        match name {
            "login" => Some(Api::Login),
            "database" => Some(Api::Database),
            "network_broadcast" => Some(Api::NetworkBroadcast),
            "history" => Some(Api::History),
            _ => None,
        }
    }
}

/// A single call to the node: where it goes, what it sends and how to read the answer.
pub trait SocketOperation: Send + 'static {
    type Output: Send + 'static;

    fn api(&self) -> Api;

    fn method(&self) -> &'static str;

    fn params(&self) -> Value;

    fn decode(&self, result: Value) -> Result<Self::Output>;
}

/// The request envelope for one call.
pub fn request_json(call_id: u64, api_id: u64, method: &str, params: Value) -> Value {
    json!({
        "id": call_id,
        "method": "call",
        "params": [api_id, method, params],
    })
}

fn decode_as<T: for<'de> Deserialize<'de>>(method: &str, result: Value) -> Result<T> {
    serde_json::from_value(result).map_err(|error| EchoError::decoding(format!("{}: {}", method, error)))
}

pub struct Login {
    pub username: String,
    pub password: String,
}

impl SocketOperation for Login {
    type Output = bool;

    fn api(&self) -> Api {
        Api::Login
    }

    fn method(&self) -> &'static str {
        "login"
    }

    fn params(&self) -> Value {
        json!([self.username, self.password])
    }

    fn decode(&self, result: Value) -> Result<bool> {
        decode_as(self.method(), result)
    }
}

/// Ask the login API for the id of another API.
pub struct AccessApi {
    pub api: Api,
}

impl SocketOperation for AccessApi {
    type Output = u64;

    fn api(&self) -> Api {
        Api::Login
    }

    fn method(&self) -> &'static str {
        self.api.name()
    }

    fn params(&self) -> Value {
        json!([])
    }

    fn decode(&self, result: Value) -> Result<u64> {
        decode_as(self.method(), result)
    }
}

pub struct GetChainId;

impl SocketOperation for GetChainId {
    type Output = String;

    fn api(&self) -> Api {
        Api::Database
    }

    fn method(&self) -> &'static str {
        "get_chain_id"
    }

    fn params(&self) -> Value {
        json!([])
    }

    fn decode(&self, result: Value) -> Result<String> {
        decode_as(self.method(), result)
    }
}

pub struct GetDynamicGlobalProperties;

impl SocketOperation for GetDynamicGlobalProperties {
    type Output = DynamicGlobalProperties;

    fn api(&self) -> Api {
        Api::Database
    }

    fn method(&self) -> &'static str {
        "get_dynamic_global_properties"
    }

    fn params(&self) -> Value {
        json!([])
    }

    fn decode(&self, result: Value) -> Result<DynamicGlobalProperties> {
        decode_as(self.method(), result)
    }
}

/// Fetch objects by id. Ids the node does not know come back as `None`, in request order.
pub struct GetObjects {
    pub ids: Vec<ObjectId>,
}

impl SocketOperation for GetObjects {
    type Output = Vec<Option<GrapheneObject>>;

    fn api(&self) -> Api {
        Api::Database
    }

    fn method(&self) -> &'static str {
        "get_objects"
    }

    fn params(&self) -> Value {
        json!([self.ids])
    }

    fn decode(&self, result: Value) -> Result<Vec<Option<GrapheneObject>>> {
        let entries: Vec<Value> = decode_as(self.method(), result)?;
        entries
            .into_iter()
            .map(|entry| match entry {
                Value::Null => Ok(None),
                object => GrapheneObject::from_json(object).map(Some),
            })
            .collect()
    }
}

/// An account together with everything `get_full_accounts` attaches to it.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct FullAccount {
    pub account: GrapheneObject,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

pub struct GetFullAccounts {
    pub names_or_ids: Vec<String>,
    pub subscribe: bool,
}

impl SocketOperation for GetFullAccounts {
    /// `(requested name or id, account)`; unknown names are left out by the node.
    type Output = Vec<(String, FullAccount)>;

    fn api(&self) -> Api {
        Api::Database
    }

    fn method(&self) -> &'static str {
        "get_full_accounts"
    }

    fn params(&self) -> Value {
        json!([self.names_or_ids, self.subscribe])
    }

    fn decode(&self, result: Value) -> Result<Vec<(String, FullAccount)>> {
        decode_as(self.method(), result)
    }
}

pub struct GetRequiredFees {
    pub operations: Vec<Operation>,
    pub asset_id: ObjectId,
}

impl SocketOperation for GetRequiredFees {
    type Output = Vec<AssetAmount>;

    fn api(&self) -> Api {
        Api::Database
    }

    fn method(&self) -> &'static str {
        "get_required_fees"
    }

    fn params(&self) -> Value {
        json!([self.operations, self.asset_id])
    }

    /// Contract operations are quoted as `{fee, user_to_pay}`; the fee part is what gets attached.
    fn decode(&self, result: Value) -> Result<Vec<AssetAmount>> {
        let entries: Vec<Value> = decode_as(self.method(), result)?;
        entries
            .into_iter()
            .map(|entry| {
                let fee = match entry {
                    Value::Object(mut fields) if fields.contains_key("fee") => {
                        fields.remove("fee").unwrap_or(Value::Null)
                    }
                    other => other,
                };
                decode_as(self.method(), fee)
            })
            .collect()
    }
}

pub struct GetBlock {
    pub block_num: u64,
}

impl SocketOperation for GetBlock {
    type Output = Option<Block>;

    fn api(&self) -> Api {
        Api::Database
    }

    fn method(&self) -> &'static str {
        "get_block"
    }

    fn params(&self) -> Value {
        json!([self.block_num])
    }

    fn decode(&self, result: Value) -> Result<Option<Block>> {
        decode_as(self.method(), result)
    }
}

/// Turn on object-change notices for this connection, tagged with `callback_id`.
pub struct SetSubscribeCallback {
    pub callback_id: u64,
    pub clear_filter: bool,
}

impl SocketOperation for SetSubscribeCallback {
    type Output = ();

    fn api(&self) -> Api {
        Api::Database
    }

    fn method(&self) -> &'static str {
        "set_subscribe_callback"
    }

    fn params(&self) -> Value {
        json!([self.callback_id, self.clear_filter])
    }

    fn decode(&self, _result: Value) -> Result<()> {
        Ok(())
    }
}

pub struct CancelAllSubscriptions;

impl SocketOperation for CancelAllSubscriptions {
    type Output = ();

    fn api(&self) -> Api {
        Api::Database
    }

    fn method(&self) -> &'static str {
        "cancel_all_subscriptions"
    }

    fn params(&self) -> Value {
        json!([])
    }

    fn decode(&self, _result: Value) -> Result<()> {
        Ok(())
    }
}

/// Broadcast a signed transaction. The node answers once it accepts the transaction and sends a
/// notice tagged with `callback_id` when it is included in a block.
pub struct BroadcastTransactionWithCallback {
    pub callback_id: u64,
    pub transaction: Value,
}

impl SocketOperation for BroadcastTransactionWithCallback {
    type Output = ();

    fn api(&self) -> Api {
        Api::NetworkBroadcast
    }

    fn method(&self) -> &'static str {
        "broadcast_transaction_with_callback"
    }

    fn params(&self) -> Value {
        json!([self.callback_id, self.transaction])
    }

    fn decode(&self, _result: Value) -> Result<()> {
        Ok(())
    }
}

/// Operations touching `account`, newest first, from `start` back to `stop`.
pub struct GetAccountHistory {
    pub account: ObjectId,
    pub start: ObjectId,
    pub limit: u32,
    pub stop: ObjectId,
}

impl GetAccountHistory {
    pub fn new(account: ObjectId) -> Self {
        GetAccountHistory {
            account,
            start: DEFAULT_HISTORY_ID,
            limit: DEFAULT_HISTORY_LIMIT,
            stop: DEFAULT_HISTORY_ID,
        }
    }
}

impl SocketOperation for GetAccountHistory {
    type Output = Vec<HistoryEntry>;

    fn api(&self) -> Api {
        Api::History
    }

    fn method(&self) -> &'static str {
        "get_account_history"
    }

    fn params(&self) -> Value {
        json!([self.account, self.start, self.limit, self.stop])
    }

    fn decode(&self, result: Value) -> Result<Vec<HistoryEntry>> {
        let entries: Vec<Value> = decode_as(self.method(), result)?;
        entries.iter().map(HistoryEntry::from_json).collect()
    }
}
