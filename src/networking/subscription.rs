use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{event, Level};

use crate::object::{GrapheneObject, ObjectId};

/// Receives the current state of a watched object every time it changes.
pub trait ObjectListener: Send + Sync {
    fn on_update(&self, object: &GrapheneObject);
}

/// Which object ids are watched, and by whom.
///
/// Listeners are compared by identity; registering the same `Arc` twice for one id keeps a single
/// entry. Listener callbacks run without the registry lock held, so a listener may subscribe or
/// unsubscribe from inside `on_update`.
#[derive(Default)]
pub struct SubscriptionManager {
    listeners: RwLock<HashMap<ObjectId, Vec<Arc<dyn ObjectListener>>>>,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        SubscriptionManager::default()
    }

    pub async fn register(&self, id: ObjectId, listener: Arc<dyn ObjectListener>) {
        let mut listeners = self.listeners.write().await;
        let entry = listeners.entry(id).or_insert_with(Vec::new);
        if !entry.iter().any(|existing| same_listener(existing, &listener)) {
            entry.push(listener);
        }
    }

    pub async fn is_registered(&self, id: &ObjectId) -> bool {
        self.listeners.read().await.contains_key(id)
    }

    /// Ids among `ids` that have at least one listener.
    pub async fn registered(&self, ids: &[ObjectId]) -> Vec<ObjectId> {
        let listeners = self.listeners.read().await;
        ids.iter().filter(|id| listeners.contains_key(*id)).copied().collect()
    }

    pub async fn remove_all(&self, id: &ObjectId) -> Option<Vec<Arc<dyn ObjectListener>>> {
        self.listeners.write().await.remove(id)
    }

    pub async fn remove_listener(&self, id: &ObjectId, listener: &Arc<dyn ObjectListener>) -> bool {
        let mut listeners = self.listeners.write().await;
        let removed = match listeners.get_mut(id) {
            Some(entry) => {
                let before = entry.len();
                entry.retain(|existing| !same_listener(existing, listener));
                before != entry.len()
            }
            None => false,
        };
        if listeners.get(id).map_or(false, Vec::is_empty) {
            listeners.remove(id);
        }
        removed
    }

    pub async fn clear(&self) {
        self.listeners.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.listeners.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.listeners.read().await.is_empty()
    }

    /// Hand `object` to every listener of its id. Returns how many listeners were called.
    pub async fn notify(&self, object: &GrapheneObject) -> usize {
        let listeners = match self.listeners.read().await.get(object.id()) {
            Some(listeners) => listeners.clone(),
            None => return 0,
        };
        for listener in &listeners {
            listener.on_update(object);
        }
        event!(Level::DEBUG, "notified {} listeners of {}", listeners.len(), object.id());
        listeners.len()
    }

    /// Ids named by a notice's params.
    ///
    /// The payload nests arrays of changed objects; each element is either an id string or an
    /// object with an `id` field. Anything else is skipped, so a malformed notice yields nothing.
    pub fn process_push_event(event: &Value) -> Vec<ObjectId> {
        let mut ids = vec![];
        let mut seen = HashSet::new();
        if let Some(params) = event.as_array() {
            // params[0] is the callback id
            for changes in params.iter().skip(1) {
                collect_ids(changes, &mut ids, &mut seen);
            }
        }
        ids
    }
}

fn same_listener(a: &Arc<dyn ObjectListener>, b: &Arc<dyn ObjectListener>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

fn collect_ids(value: &Value, ids: &mut Vec<ObjectId>, seen: &mut HashSet<ObjectId>) {
    let id = match value {
        Value::Array(items) => {
            for item in items {
                collect_ids(item, ids, seen);
            }
            return;
        }
        Value::String(id) => id.parse::<ObjectId>().ok(),
        Value::Object(fields) => fields
            .get("id")
            .and_then(Value::as_str)
            .and_then(|id| id.parse::<ObjectId>().ok()),
        _ => None,
    };
    if let Some(id) = id {
        if seen.insert(id) {
            ids.push(id);
        }
    }
}
