// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Change observer: delivers added/deleted notifications for one resource kind
//! to subscribers, after an initial full synchronization.

mod known;

pub use known::{ChangeEvent, ChangeKind};

use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError};

use futures::{pin_mut, Stream, StreamExt};
use kube::{runtime::WatchStreamExt, Api, Resource};
use kube_runtime::watcher;
use serde::de::DeserializeOwned;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::constants::OBSERVER_BUFFER;
use crate::error::{Result, TourError};
use known::KnownObjects;

/// Identifies one subscription for `unsubscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Receiving end of a subscription
pub struct Subscription<K> {
    id: SubscriptionId,
    rx: mpsc::Receiver<ChangeEvent<K>>,
}

impl<K> Subscription<K> {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Next event, or None once the observer stopped or this subscription was removed
    pub async fn recv(&mut self) -> Option<ChangeEvent<K>> {
        self.rx.recv().await
    }
}

struct Registry<K> {
    next_id: u64,
    senders: Vec<(SubscriptionId, mpsc::Sender<ChangeEvent<K>>)>,
}

type SharedRegistry<K> = Arc<Mutex<Registry<K>>>;

pub struct ChangeObserver<K> {
    registry: SharedRegistry<K>,
    synced_tx: Option<watch::Sender<bool>>,
    synced_rx: watch::Receiver<bool>,
    task: Option<JoinHandle<()>>,
}

impl<K> Default for ChangeObserver<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> ChangeObserver<K> {
    /// Create an observer that is not yet receiving anything.
    /// Subscribe before `start` to see the objects of the initial list.
    pub fn new() -> Self {
        let (synced_tx, synced_rx) = watch::channel(false);
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                senders: Vec::new(),
            })),
            synced_tx: Some(synced_tx),
            synced_rx,
            task: None,
        }
    }

    /// Each subscription buffers up to `OBSERVER_BUFFER` events. A subscriber
    /// that falls further behind misses events instead of stalling the others.
    pub fn subscribe(&self) -> Subscription<K> {
        let (tx, rx) = mpsc::channel(OBSERVER_BUFFER);
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;
        registry.senders.push((id, tx));
        Subscription { id, rx }
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry.senders.retain(|(sid, _)| *sid != id);
    }

    pub fn is_synced(&self) -> bool {
        *self.synced_rx.borrow()
    }

    /// Block until the initial synchronization has been delivered
    pub async fn wait_synced(&self) -> Result<()> {
        let mut rx = self.synced_rx.clone();
        rx.wait_for(|synced| *synced)
            .await
            .map(|_| ())
            .map_err(|_| TourError::Observer("stopped before the initial sync completed".to_string()))
    }

    /// Stop delivering events; open subscriptions see the end of their stream
    pub fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry.senders.clear();
    }
}

impl<K> ChangeObserver<K>
where
    K: Resource + Clone + Debug + Send + Sync + 'static,
{
    /// Start consuming `events` on a background task. Calling it twice is a no-op.
    pub fn start<S>(&mut self, events: S)
    where
        S: Stream<Item = std::result::Result<watcher::Event<K>, watcher::Error>> + Send + 'static,
    {
        let Some(synced_tx) = self.synced_tx.take() else {
            warn!("Change observer already started");
            return;
        };
        let registry = self.registry.clone();
        self.task = Some(tokio::spawn(deliver(events, registry, synced_tx)));
    }
}

impl<K> ChangeObserver<K>
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
{
    /// Start watching `api` with the library watcher and its default backoff
    pub fn start_watch(&mut self, api: Api<K>, config: watcher::Config) {
        self.start(watcher(api, config).default_backoff());
    }
}

impl<K> Drop for ChangeObserver<K> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn deliver<K, S>(events: S, registry: SharedRegistry<K>, synced_tx: watch::Sender<bool>)
where
    K: Resource + Clone + Debug + Send + Sync + 'static,
    S: Stream<Item = std::result::Result<watcher::Event<K>, watcher::Error>>,
{
    pin_mut!(events);
    let mut known = KnownObjects::new();

    while let Some(item) = events.next().await {
        let event = match item {
            Ok(event) => event,
            Err(e) => {
                warn!("Watch error: {}", e);
                continue;
            }
        };

        let was_synced = known.is_synced();
        let changes = known.apply(event);
        for change in changes {
            publish(&registry, change);
        }

        if !was_synced && known.is_synced() {
            info!("Change observer synced");
            synced_tx.send_replace(true);
        }
    }

    debug!("Watch stream ended, change observer stopping");
}

fn publish<K: Clone>(registry: &SharedRegistry<K>, change: ChangeEvent<K>) {
    let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
    registry.senders.retain(|(id, tx)| match tx.try_send(change.clone()) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!("Subscriber {:?} is {} events behind, dropping event", id, OBSERVER_BUFFER);
            true
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    });
}
