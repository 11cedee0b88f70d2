use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Notify};
use tokio_tungstenite::{accept_async, tungstenite::Message};

use crate::asset::{AssetAmount, ECHO_ASSET_ID};
use crate::block::DynamicGlobalProperties;
use crate::networking::subscription::ObjectListener;
use crate::object::{GrapheneObject, ObjectId};
use crate::operations::{Operation, TransferOperationBuilder};

pub const CHAIN_ID: &str = "233ae92c7218173c76b5ffad9487b063933eec714a12e3f2ea48026a45262934";
pub const DATABASE_API_ID: u64 = 2;
pub const NETWORK_BROADCAST_API_ID: u64 = 3;
pub const HISTORY_API_ID: u64 = 4;
pub const REQUIRED_FEE: u64 = 20;
/// Accounts the fake node knows by name.
pub const KNOWN_ACCOUNT: (&str, u64) = ("nathan", 22);
pub const KNOWN_MEMO_KEY: &str = "ECHO4tmRW8HFwLSJR1wxPp5at3qeJ2XcfSwpKpAM6AQE8dZugqBtU7";

pub fn make_mock_properties() -> DynamicGlobalProperties {
    serde_json::from_value(mock_properties_json()).unwrap()
}

fn mock_properties_json() -> Value {
    json!({
        "id": "2.1.0",
        "head_block_number": 70000,
        "head_block_id": "00011170aabbccdd0102030405060708090a0b0c",
        "time": "2019-03-01T10:00:00",
        "next_maintenance_time": "2019-03-01T11:00:00"
    })
}

pub fn make_mock_transfer(amount: u64) -> Operation {
    TransferOperationBuilder::new()
        .set_from(ObjectId::account(17))
        .set_to(ObjectId::account(18))
        .set_amount(AssetAmount::new(amount, ECHO_ASSET_ID))
        .build()
        .unwrap()
        .into()
}

/// Collects every update it is handed.
#[derive(Default)]
pub struct RecordingListener {
    updates: Mutex<Vec<GrapheneObject>>,
    notify: Notify,
}

impl RecordingListener {
    pub fn new() -> Self {
        RecordingListener::default()
    }

    pub fn updates(&self) -> Vec<GrapheneObject> {
        self.updates.lock().unwrap().clone()
    }

    /// Wait until at least `count` updates arrived. Panics after five seconds.
    pub async fn wait_for_updates(&self, count: usize) -> Vec<GrapheneObject> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let updates = self.updates();
            if updates.len() >= count {
                return updates;
            }
            if tokio::time::timeout_at(deadline, self.notify.notified()).await.is_err() {
                panic!("expected {} updates, got {}", count, updates.len());
            }
        }
    }
}

impl ObjectListener for RecordingListener {
    fn on_update(&self, object: &GrapheneObject) {
        self.updates.lock().unwrap().push(object.clone());
        self.notify.notify_one();
    }
}

/// A scripted node on `127.0.0.1`.
///
/// It answers the login handshake, database, broadcast and history calls with canned data and
/// records the method of every call. Calls against [`FakeNode::SILENT_API_ID`] are never answered.
/// Object ids with an instance of 1000 or more do not exist.
pub struct FakeNode {
    address: SocketAddr,
    connections: Arc<Mutex<Vec<mpsc::UnboundedSender<Message>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeNode {
    pub const SILENT_API_ID: u64 = 99;

    pub async fn start() -> FakeNode {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let connections = Arc::new(Mutex::new(vec![]));
        let calls = Arc::new(Mutex::new(vec![]));

        let accept_connections = connections.clone();
        let accept_calls = calls.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, accept_connections.clone(), accept_calls.clone()));
            }
        });

        FakeNode {
            address,
            connections,
            calls,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.address)
    }

    /// Methods called so far, in arrival order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls().iter().filter(|called| called.as_str() == method).count()
    }

    /// Send a notice frame with `params` to every open connection.
    pub fn push_notice(&self, params: Value) {
        let frame = json!({"method": "notice", "params": params}).to_string();
        for connection in self.connections.lock().unwrap().iter() {
            let _ = connection.send(Message::Text(frame.clone()));
        }
    }

    /// Close every open connection from the server side.
    pub fn drop_connections(&self) {
        for connection in self.connections.lock().unwrap().drain(..) {
            let _ = connection.send(Message::Close(None));
        }
    }
}

async fn serve(stream: TcpStream, connections: Arc<Mutex<Vec<mpsc::UnboundedSender<Message>>>>, calls: Arc<Mutex<Vec<String>>>) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws_stream) => ws_stream,
        Err(_) => return,
    };
    let (mut write_sink, mut read_stream) = ws_stream.split();
    let (sender, mut receiver) = mpsc::unbounded_channel::<Message>();
    connections.lock().unwrap().push(sender.clone());

    tokio::spawn(async move {
        while let Some(message) = receiver.recv().await {
            let closing = matches!(message, Message::Close(_));
            if write_sink.send(message).await.is_err() || closing {
                break;
            }
        }
    });

    while let Some(Ok(message)) = read_stream.next().await {
        let request: Value = match message {
            Message::Text(text) => match serde_json::from_str(&text) {
                Ok(request) => request,
                Err(_) => continue,
            },
            Message::Close(_) => break,
            _ => continue,
        };
        let call_id = request["id"].clone();
        let api_id = request["params"][0].as_u64().unwrap_or_default();
        let method = request["params"][1].as_str().unwrap_or_default().to_string();
        let params = request["params"][2].clone();
        calls.lock().unwrap().push(method.clone());

        if api_id == FakeNode::SILENT_API_ID {
            continue;
        }
        let response = match answer(api_id, &method, &params) {
            Ok(result) => json!({"id": call_id, "jsonrpc": "2.0", "result": result}),
            Err(message) => json!({"id": call_id, "jsonrpc": "2.0", "error": {"code": 1, "message": message}}),
        };
        let _ = sender.send(Message::Text(response.to_string()));

        if method == "broadcast_transaction_with_callback" {
            let notice = json!({
                "method": "notice",
                "params": [params[0].clone(), [{"id": "confirmed", "block_num": 70001}]]
            });
            let _ = sender.send(Message::Text(notice.to_string()));
        }
    }
}

fn answer(api_id: u64, method: &str, params: &Value) -> std::result::Result<Value, String> {
    match (api_id, method) {
        (1, "login") => Ok(json!(params[0] != json!("rejected"))),
        (1, "database") => Ok(json!(DATABASE_API_ID)),
        (1, "network_broadcast") => Ok(json!(NETWORK_BROADCAST_API_ID)),
        (1, "history") => Ok(json!(HISTORY_API_ID)),
        (DATABASE_API_ID, "get_chain_id") => Ok(json!(CHAIN_ID)),
        (DATABASE_API_ID, "get_dynamic_global_properties") => Ok(mock_properties_json()),
        (DATABASE_API_ID, "get_objects") => Ok(params[0]
            .as_array()
            .map(|ids| ids.iter().map(mock_object).collect::<Vec<Value>>())
            .unwrap_or_default()
            .into()),
        (DATABASE_API_ID, "get_full_accounts") => {
            let accounts: Vec<Value> = params[0]
                .as_array()
                .map(|names| names.iter().filter_map(mock_full_account).collect())
                .unwrap_or_default();
            Ok(accounts.into())
        }
        (DATABASE_API_ID, "get_required_fees") => {
            let asset_id = params[1].clone();
            let fees: Vec<Value> = params[0]
                .as_array()
                .map(|operations| {
                    operations
                        .iter()
                        .map(|_| json!({"amount": REQUIRED_FEE, "asset_id": asset_id}))
                        .collect()
                })
                .unwrap_or_default();
            Ok(fees.into())
        }
        (DATABASE_API_ID, "get_block") => match params[0].as_u64() {
            Some(block_num) if block_num <= 70000 => Ok(json!({
                "previous": "0001116f00000000000000000000000000000000",
                "timestamp": "2019-03-01T10:00:00",
                "witness": "1.6.1",
                "transactions": []
            })),
            _ => Ok(Value::Null),
        },
        (DATABASE_API_ID, "set_subscribe_callback") | (DATABASE_API_ID, "cancel_all_subscriptions") => Ok(Value::Null),
        (NETWORK_BROADCAST_API_ID, "broadcast_transaction_with_callback") => {
            if params[1]["signatures"].as_array().map_or(true, Vec::is_empty) {
                Err(String::from("missing required active authority"))
            } else {
                Ok(Value::Null)
            }
        }
        (HISTORY_API_ID, "get_account_history") => Ok(json!([{
            "id": "1.10.44",
            "op": [0, {
                "fee": {"amount": 20, "asset_id": "1.3.0"},
                "from": params[0],
                "to": "1.2.18",
                "amount": {"amount": 1000, "asset_id": "1.3.0"},
                "extensions": []
            }],
            "result": [0, {}],
            "block_num": 3021,
            "trx_in_block": 0,
            "op_in_trx": 0,
            "virtual_op": 11
        }])),
        _ => Err(format!("no method {} on api {}", method, api_id)),
    }
}

fn mock_object(id: &Value) -> Value {
    match id.as_str().and_then(|id| id.parse::<ObjectId>().ok()) {
        Some(object_id) if object_id.instance() < 1000 => json!({"id": object_id, "balance": 100}),
        _ => Value::Null,
    }
}

fn mock_full_account(name_or_id: &Value) -> Option<Value> {
    let (name, instance) = KNOWN_ACCOUNT;
    let requested = name_or_id.as_str()?;
    if requested != name && requested != ObjectId::account(instance).to_string() {
        return None;
    }
    Some(json!([requested, {
        "account": {
            "id": ObjectId::account(instance),
            "name": name,
            "options": {"memo_key": KNOWN_MEMO_KEY, "voting_account": "1.2.5"}
        },
        "balances": []
    }]))
}
