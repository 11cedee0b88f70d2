use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{event, Level};

use serde_json::Value;

use crate::address::{Address, Network};
use crate::asset::AssetAmount;
use crate::block::{Block, BlockData, DynamicGlobalProperties};
use crate::error::{EchoError, Result};
use crate::history::HistoryEntry;
use crate::networking::connection;
use crate::networking::socket::{SocketCore, SocketEvent, SocketState};
use crate::networking::socket_operation::{
    AccessApi, Api, BroadcastTransactionWithCallback, CancelAllSubscriptions, FullAccount,
    GetAccountHistory, GetBlock, GetChainId, GetDynamicGlobalProperties, GetFullAccounts,
    GetObjects, GetRequiredFees, Login, SetSubscribeCallback, SocketOperation, LOGIN_API_ID,
};
use crate::networking::subscription::{ObjectListener, SubscriptionManager};
use crate::object::{GrapheneObject, ObjectId};
use crate::operations::Operation;
use crate::settings::ClientSettings;
use crate::transaction::Transaction;

/// Callback id object-change notices are tagged with.
pub const SUBSCRIPTION_CALLBACK_ID: u64 = 1;

type ApiIds = Arc<RwLock<HashMap<Api, u64>>>;

/// Whether the node sends object-change notices on this connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PushState {
    Off,
    /// `set_subscribe_callback` is in flight
    Enabling,
    On,
}

/// A connection to one node plus everything cached for it.
///
/// API ids, the push flag and the subscription registry only live as long as the connection.
/// They are dropped on an explicit [`EchoClient::disconnect`] and when the socket fails.
pub struct EchoClient {
    settings: ClientSettings,
    core: Arc<SocketCore>,
    subscriptions: Arc<SubscriptionManager>,
    api_ids: ApiIds,
    push_state: Arc<Mutex<PushState>>,
    next_callback_id: AtomicU64,
    notice_task: Mutex<Option<JoinHandle<()>>>,
}

impl EchoClient {
    pub fn new(settings: ClientSettings) -> Self {
        EchoClient {
            settings,
            core: Arc::new(SocketCore::new()),
            subscriptions: Arc::new(SubscriptionManager::new()),
            api_ids: Arc::new(RwLock::new(HashMap::new())),
            push_state: Arc::new(Mutex::new(PushState::Off)),
            next_callback_id: AtomicU64::new(SUBSCRIPTION_CALLBACK_ID + 1),
            notice_task: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Address prefix keys are read and written with on this node.
    pub fn network(&self) -> Network {
        self.settings.network()
    }

    pub async fn state(&self) -> SocketState {
        self.core.state().await
    }

    /// Lifecycle changes and every notice, including broadcast confirmations.
    pub fn events(&self) -> broadcast::Receiver<SocketEvent> {
        self.core.subscribe_events()
    }

    /// Open the socket, log in and look up the configured APIs.
    pub async fn connect(&self) -> Result<()> {
        let events = self.core.subscribe_events();
        connection::open(self.core.clone(), &self.settings.url).await?;
        if let Err(error) = self.handshake().await {
            event!(Level::WARN, "handshake with {} failed: {}", self.settings.url, error);
            self.disconnect().await;
            return Err(error);
        }
        self.spawn_notice_task(events).await;
        event!(Level::INFO, "connected to {}", self.settings.url);
        Ok(())
    }

    async fn handshake(&self) -> Result<()> {
        let login = Login {
            username: self.settings.login.username.clone(),
            password: self.settings.login.password.clone(),
        };
        if !self.core.call(login, LOGIN_API_ID, self.timeout()).await? {
            return Err(EchoError::Connection(String::from("login rejected")));
        }

        let mut api_ids = HashMap::new();
        for name in &self.settings.apis {
            let api = Api::from_name(name)
                .filter(|api| *api != Api::Login)
                .ok_or_else(|| EchoError::MalformedInput(format!("unknown api `{}`", name)))?;
            let api_id = self.core.call(AccessApi { api }, LOGIN_API_ID, self.timeout()).await?;
            event!(Level::DEBUG, "api {} has id {}", name, api_id);
            api_ids.insert(api, api_id);
        }
        *self.api_ids.write().await = api_ids;
        Ok(())
    }

    async fn spawn_notice_task(&self, mut events: broadcast::Receiver<SocketEvent>) {
        let database_api_id = self.api_id(Api::Database).await.ok();
        let core = self.core.clone();
        let subscriptions = self.subscriptions.clone();
        let api_ids = self.api_ids.clone();
        let push_state = self.push_state.clone();
        let timeout = self.timeout();

        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SocketEvent::Notice(params)) => {
                        if params.get(0).and_then(|id| id.as_u64()) != Some(SUBSCRIPTION_CALLBACK_ID) {
                            continue;
                        }
                        let database_api_id = match database_api_id {
                            Some(api_id) => api_id,
                            None => {
                                event!(Level::WARN, "object notice without a database api");
                                continue;
                            }
                        };
                        let changed = SubscriptionManager::process_push_event(&params);
                        let watched = subscriptions.registered(&changed).await;
                        if watched.is_empty() {
                            continue;
                        }
                        match core.call(GetObjects { ids: watched }, database_api_id, timeout).await {
                            Ok(objects) => {
                                for object in objects.iter().flatten() {
                                    subscriptions.notify(object).await;
                                }
                            }
                            Err(error) => event!(Level::WARN, "could not refresh watched objects: {}", error),
                        }
                    }
                    Ok(SocketEvent::Disconnected) => {
                        api_ids.write().await.clear();
                        subscriptions.clear().await;
                        *push_state.lock().await = PushState::Off;
                        break;
                    }
                    Ok(SocketEvent::Connected) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        event!(Level::WARN, "notice processing fell behind, {} events dropped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        if let Some(previous) = self.notice_task.lock().await.replace(task) {
            previous.abort();
        }
    }

    /// Fail every pending call and forget all per-connection state.
    pub async fn disconnect(&self) {
        self.core.disconnect().await;
        if let Some(task) = self.notice_task.lock().await.take() {
            task.abort();
        }
        self.api_ids.write().await.clear();
        self.subscriptions.clear().await;
        *self.push_state.lock().await = PushState::Off;
    }

    fn timeout(&self) -> Option<Duration> {
        self.settings.call_timeout()
    }

    pub async fn api_id(&self, api: Api) -> Result<u64> {
        if api == Api::Login {
            return Ok(LOGIN_API_ID);
        }
        self.api_ids
            .read()
            .await
            .get(&api)
            .copied()
            .ok_or_else(|| EchoError::Connection(format!("{} api is not available", api.name())))
    }

    /// Send `operation` to its API and wait for the answer, bounded by the configured timeout.
    pub async fn call<O: SocketOperation>(&self, operation: O) -> Result<O::Output> {
        let api_id = self.api_id(operation.api()).await?;
        self.core.call(operation, api_id, self.timeout()).await
    }

    pub async fn get_chain_id(&self) -> Result<String> {
        self.call(GetChainId).await
    }

    pub async fn get_dynamic_global_properties(&self) -> Result<DynamicGlobalProperties> {
        self.call(GetDynamicGlobalProperties).await
    }

    pub async fn get_objects(&self, ids: &[ObjectId]) -> Result<Vec<Option<GrapheneObject>>> {
        self.call(GetObjects { ids: ids.to_vec() }).await
    }

    pub async fn get_object(&self, id: ObjectId) -> Result<GrapheneObject> {
        self.get_objects(&[id])
            .await?
            .into_iter()
            .next()
            .flatten()
            .ok_or_else(|| EchoError::NotFound(id.to_string()))
    }

    pub async fn get_full_accounts(&self, names_or_ids: &[&str], subscribe: bool) -> Result<Vec<(String, FullAccount)>> {
        self.call(GetFullAccounts {
            names_or_ids: names_or_ids.iter().map(|name| name.to_string()).collect(),
            subscribe,
        })
        .await
    }

    pub async fn get_account(&self, name_or_id: &str) -> Result<FullAccount> {
        self.get_full_accounts(&[name_or_id], false)
            .await?
            .into_iter()
            .next()
            .map(|(_, account)| account)
            .ok_or_else(|| EchoError::NotFound(format!("account {}", name_or_id)))
    }

    /// The key memos to `name_or_id` are encrypted for.
    pub async fn get_memo_key(&self, name_or_id: &str) -> Result<Address> {
        let account = self.get_account(name_or_id).await?;
        let memo_key = account
            .account
            .get("options")
            .and_then(|options| options.get("memo_key"))
            .and_then(Value::as_str)
            .ok_or_else(|| EchoError::decoding(format!("account {} has no memo key", name_or_id)))?;
        Address::parse(memo_key, &self.network())
    }

    pub async fn get_required_fees(&self, operations: &[Operation], asset_id: ObjectId) -> Result<Vec<AssetAmount>> {
        self.call(GetRequiredFees {
            operations: operations.to_vec(),
            asset_id,
        })
        .await
    }

    pub async fn get_block(&self, block_num: u64) -> Result<Block> {
        self.call(GetBlock { block_num })
            .await?
            .ok_or_else(|| EchoError::NotFound(format!("block {}", block_num)))
    }

    pub async fn get_account_history(
        &self,
        account: ObjectId,
        start: ObjectId,
        limit: u32,
        stop: ObjectId,
    ) -> Result<Vec<HistoryEntry>> {
        self.call(GetAccountHistory {
            account,
            start,
            limit,
            stop,
        })
        .await
    }

    /// Turn on object notices unless they already are. The lock is only held to read or commit
    /// the state; concurrent callers that find a request in flight send their own, which the
    /// node treats as a no-op.
    async fn ensure_push_enabled(&self) -> Result<()> {
        {
            let mut push_state = self.push_state.lock().await;
            if *push_state == PushState::On {
                return Ok(());
            }
            *push_state = PushState::Enabling;
        }

        let result = self
            .call(SetSubscribeCallback {
                callback_id: SUBSCRIPTION_CALLBACK_ID,
                clear_filter: false,
            })
            .await;

        let mut push_state = self.push_state.lock().await;
        // a disconnect or unsubscribe_all in the meantime leaves the state Off
        if *push_state == PushState::Enabling {
            *push_state = if result.is_ok() { PushState::On } else { PushState::Off };
        }
        result
    }

    /// Watch `ids`. The node only reports changes to objects it has sent to this connection, so
    /// the objects are fetched once before the listener is registered.
    pub async fn subscribe_objects(&self, ids: &[ObjectId], listener: Arc<dyn ObjectListener>) -> Result<()> {
        self.ensure_push_enabled().await?;
        let objects = self.get_objects(ids).await?;
        if let Some((id, _)) = ids.iter().zip(&objects).find(|(_, object)| object.is_none()) {
            return Err(EchoError::NotFound(id.to_string()));
        }
        for id in ids {
            self.subscriptions.register(*id, listener.clone()).await;
        }
        Ok(())
    }

    /// Watch accounts by name or id. Returns their ids in request order.
    pub async fn subscribe_accounts(&self, names_or_ids: &[&str], listener: Arc<dyn ObjectListener>) -> Result<Vec<ObjectId>> {
        self.ensure_push_enabled().await?;
        let accounts = self.get_full_accounts(names_or_ids, true).await?;
        let mut ids = vec![];
        for name in names_or_ids {
            let account = accounts
                .iter()
                .find(|(requested, _)| requested == name)
                .ok_or_else(|| EchoError::NotFound(format!("account {}", name)))?;
            ids.push(*account.1.account.id());
        }
        for id in &ids {
            self.subscriptions.register(*id, listener.clone()).await;
        }
        Ok(ids)
    }

    pub async fn unsubscribe(&self, id: &ObjectId) -> Result<()> {
        self.subscriptions
            .remove_all(id)
            .await
            .map(|_| ())
            .ok_or_else(|| EchoError::NotFound(format!("no listeners for {}", id)))
    }

    /// Drop every listener and stop object notices for this connection.
    pub async fn unsubscribe_all(&self) -> Result<()> {
        self.call(CancelAllSubscriptions).await?;
        self.subscriptions.clear().await;
        *self.push_state.lock().await = PushState::Off;
        Ok(())
    }

    pub async fn is_subscribed(&self, id: &ObjectId) -> bool {
        self.subscriptions.is_registered(id).await
    }

    pub async fn get_block_data(&self) -> Result<BlockData> {
        let properties = self.get_dynamic_global_properties().await?;
        BlockData::from_properties(&properties, self.settings.expiration_seconds)
    }

    /// A transaction over `operations` bound to the current chain head. Fees are still zero.
    pub async fn prepare_transaction(&self, operations: Vec<Operation>) -> Result<Transaction> {
        let chain_id = self.get_chain_id().await?;
        let block_data = self.get_block_data().await?;
        Ok(Transaction::new(block_data, operations, &chain_id))
    }

    pub async fn fill_required_fees(&self, transaction: &mut Transaction, asset_id: ObjectId) -> Result<()> {
        let fees = self.get_required_fees(transaction.get_operations(), asset_id).await?;
        transaction.set_fees(&fees)
    }

    /// Broadcast a signed transaction. Returns the callback id of the notice that reports its
    /// inclusion in a block; watch [`EchoClient::events`] for it.
    pub async fn broadcast_transaction(&self, transaction: &Transaction) -> Result<u64> {
        if !transaction.is_signed() {
            return Err(EchoError::MissingField("signatures"));
        }
        let callback_id = self.next_callback_id.fetch_add(1, Ordering::SeqCst);
        self.call(BroadcastTransactionWithCallback {
            callback_id,
            transaction: transaction.to_json()?,
        })
        .await?;
        Ok(callback_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::ECHO_ASSET_ID;
    use crate::crypto::Role;
    use crate::history::{DEFAULT_HISTORY_ID, DEFAULT_HISTORY_LIMIT};
    use crate::keypair::Keypair;
    use crate::test_utilities::mocks::{
        make_mock_transfer, FakeNode, RecordingListener, CHAIN_ID, DATABASE_API_ID, HISTORY_API_ID,
        KNOWN_ACCOUNT, KNOWN_MEMO_KEY, REQUIRED_FEE,
    };
    use serde_json::json;

    async fn connected_client() -> (FakeNode, EchoClient) {
        let node = FakeNode::start().await;
        let mut settings = ClientSettings::new(&node.url());
        settings.call_timeout_ms = 5_000;
        let client = EchoClient::new(settings);
        client.connect().await.unwrap();
        (node, client)
    }

    #[tokio::test]
    async fn connect_runs_handshake_test() {
        let (node, client) = connected_client().await;
        assert_eq!(client.state().await, SocketState::Connected);
        assert_eq!(client.api_id(Api::Database).await.unwrap(), DATABASE_API_ID);
        assert_eq!(client.api_id(Api::History).await.unwrap(), HISTORY_API_ID);
        assert_eq!(client.api_id(Api::Login).await.unwrap(), LOGIN_API_ID);
        assert_eq!(node.calls(), vec!["login", "database", "network_broadcast", "history"]);
        assert_eq!(client.get_chain_id().await.unwrap(), CHAIN_ID);
    }

    #[tokio::test]
    async fn rejected_login_leaves_client_disconnected_test() {
        let node = FakeNode::start().await;
        let mut settings = ClientSettings::new(&node.url());
        settings.login.username = String::from("rejected");
        let client = EchoClient::new(settings);
        assert!(matches!(client.connect().await, Err(EchoError::Connection(_))));
        assert_eq!(client.state().await, SocketState::Disconnected);
        assert!(client.api_id(Api::Database).await.is_err());
    }

    #[tokio::test]
    async fn calls_fail_after_disconnect_test() {
        let (_node, client) = connected_client().await;
        client.disconnect().await;
        assert!(matches!(client.get_chain_id().await, Err(EchoError::Connection(_))));
        client.connect().await.unwrap();
        assert_eq!(client.get_chain_id().await.unwrap(), CHAIN_ID);
    }

    #[tokio::test]
    async fn database_calls_test() {
        let (_node, client) = connected_client().await;
        let object = client.get_object(ObjectId::account(5)).await.unwrap();
        assert_eq!(object.get("balance"), Some(&json!(100)));
        assert!(matches!(
            client.get_object(ObjectId::account(5000)).await,
            Err(EchoError::NotFound(_))
        ));

        let account = client.get_account(KNOWN_ACCOUNT.0).await.unwrap();
        assert_eq!(account.account.id(), &ObjectId::account(KNOWN_ACCOUNT.1));
        assert!(matches!(client.get_account("nobody").await, Err(EchoError::NotFound(_))));

        assert!(client.get_block(5).await.is_ok());
        assert!(matches!(client.get_block(80000).await, Err(EchoError::NotFound(_))));

        let history = client
            .get_account_history(ObjectId::account(17), DEFAULT_HISTORY_ID, DEFAULT_HISTORY_LIMIT, DEFAULT_HISTORY_ID)
            .await
            .unwrap();
        assert!(history[0].is_decoded());
    }

    #[tokio::test]
    async fn memo_key_uses_configured_prefix_test() {
        let (node, client) = connected_client().await;
        let memo_key = client.get_memo_key(KNOWN_ACCOUNT.0).await.unwrap();
        assert_eq!(memo_key.to_string(), KNOWN_MEMO_KEY);
        assert_eq!(memo_key.network(), &client.network());

        let mut settings = ClientSettings::new(&node.url());
        settings.address_prefix = String::from("TEST");
        let testnet_client = EchoClient::new(settings);
        testnet_client.connect().await.unwrap();
        assert!(matches!(
            testnet_client.get_memo_key(KNOWN_ACCOUNT.0).await,
            Err(EchoError::MalformedInput(_))
        ));
    }

    #[tokio::test]
    async fn unknown_method_is_response_error_test() {
        let (_node, client) = connected_client().await;
        let result = client.core.call(GetChainId, 77, client.timeout()).await;
        assert!(matches!(result, Err(EchoError::Response { .. })));
    }

    #[tokio::test]
    async fn subscription_delivers_fresh_state_test() {
        let (node, client) = connected_client().await;
        let listener = Arc::new(RecordingListener::new());
        client.subscribe_objects(&[ObjectId::account(5)], listener.clone()).await.unwrap();
        client.subscribe_objects(&[ObjectId::account(6)], listener.clone()).await.unwrap();
        assert_eq!(node.call_count("set_subscribe_callback"), 1);

        node.push_notice(json!([SUBSCRIPTION_CALLBACK_ID, [["1.2.5", "1.2.77"]]]));
        let updates = listener.wait_for_updates(1).await;
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].id(), &ObjectId::account(5));
        assert_eq!(updates[0].get("balance"), Some(&json!(100)));
    }

    #[tokio::test]
    async fn unsubscribe_test() {
        let (node, client) = connected_client().await;
        let listener = Arc::new(RecordingListener::new());
        let ids = client.subscribe_accounts(&[KNOWN_ACCOUNT.0], listener.clone()).await.unwrap();
        assert_eq!(ids, vec![ObjectId::account(KNOWN_ACCOUNT.1)]);
        assert!(client.is_subscribed(&ids[0]).await);

        client.unsubscribe(&ids[0]).await.unwrap();
        assert!(matches!(client.unsubscribe(&ids[0]).await, Err(EchoError::NotFound(_))));

        client.subscribe_objects(&[ObjectId::account(5)], listener.clone()).await.unwrap();
        client.unsubscribe_all().await.unwrap();
        assert!(!client.is_subscribed(&ObjectId::account(5)).await);
        assert_eq!(node.call_count("cancel_all_subscriptions"), 1);

        client.subscribe_objects(&[ObjectId::account(5)], listener).await.unwrap();
        assert_eq!(node.call_count("set_subscribe_callback"), 2);
    }

    #[tokio::test]
    async fn stalled_push_enable_does_not_block_other_subscribers_test() {
        let node = FakeNode::start().await;
        let mut settings = ClientSettings::new(&node.url());
        settings.call_timeout_ms = 0;
        let client = Arc::new(EchoClient::new(settings));
        client.connect().await.unwrap();

        client.api_ids.write().await.insert(Api::Database, FakeNode::SILENT_API_ID);
        let stalled_client = client.clone();
        let stalled = tokio::spawn(async move {
            let listener = Arc::new(RecordingListener::new());
            stalled_client.subscribe_objects(&[ObjectId::account(5)], listener).await
        });
        for _ in 0..100 {
            if node.call_count("set_subscribe_callback") == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(node.call_count("set_subscribe_callback"), 1);

        client.api_ids.write().await.insert(Api::Database, DATABASE_API_ID);
        let listener = Arc::new(RecordingListener::new());
        let subscribed = tokio::time::timeout(
            Duration::from_secs(5),
            client.subscribe_objects(&[ObjectId::account(6)], listener),
        )
        .await;
        assert!(matches!(subscribed, Ok(Ok(()))));
        assert!(client.is_subscribed(&ObjectId::account(6)).await);
        assert!(!stalled.is_finished());
        stalled.abort();
    }

    #[tokio::test]
    async fn subscribing_to_missing_objects_fails_test() {
        let (_node, client) = connected_client().await;
        let listener = Arc::new(RecordingListener::new());
        let result = client
            .subscribe_objects(&[ObjectId::account(5), ObjectId::account(5000)], listener)
            .await;
        assert!(matches!(result, Err(EchoError::NotFound(_))));
        assert!(!client.is_subscribed(&ObjectId::account(5)).await);
    }

    #[tokio::test]
    async fn server_disconnect_clears_registry_test() {
        let (node, client) = connected_client().await;
        let mut events = client.events();
        let listener = Arc::new(RecordingListener::new());
        client.subscribe_objects(&[ObjectId::account(5)], listener).await.unwrap();

        node.drop_connections();
        loop {
            if events.recv().await.unwrap() == SocketEvent::Disconnected {
                break;
            }
        }
        // the notice task runs its cleanup on the same event
        for _ in 0..100 {
            if !client.is_subscribed(&ObjectId::account(5)).await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!client.is_subscribed(&ObjectId::account(5)).await);
        assert_eq!(client.state().await, SocketState::Disconnected);
    }

    #[tokio::test]
    async fn transaction_flow_test() {
        let (_node, client) = connected_client().await;
        let mut events = client.events();
        let mut transaction = client.prepare_transaction(vec![make_mock_transfer(1000)]).await.unwrap();
        assert_eq!(transaction.get_chain_id(), CHAIN_ID);
        assert_eq!(transaction.get_block_data().get_ref_block_prefix(), 0xddccbbaa);

        client.fill_required_fees(&mut transaction, ECHO_ASSET_ID).await.unwrap();
        assert_eq!(transaction.get_operations()[0].get_fee().get_amount(), REQUIRED_FEE);

        assert!(matches!(
            client.broadcast_transaction(&transaction).await,
            Err(EchoError::MissingField("signatures"))
        ));
        let keypair = Keypair::from_credentials("testName", "testPassword", Role::Active).unwrap();
        transaction.add_private_key(keypair.private_key());
        transaction.sign().unwrap();
        let callback_id = client.broadcast_transaction(&transaction).await.unwrap();

        loop {
            if let SocketEvent::Notice(params) = events.recv().await.unwrap() {
                if params[0] == json!(callback_id) {
                    break;
                }
            }
        }
    }
}
