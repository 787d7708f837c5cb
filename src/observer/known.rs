// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Turns raw watcher events into added/deleted notifications.

use std::collections::HashMap;

use kube::{Resource, ResourceExt};
use kube_runtime::watcher;

/// Lifecycle transition reported to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Deleted,
}

/// A lifecycle transition and the object snapshot that caused it
#[derive(Debug, Clone)]
pub struct ChangeEvent<K> {
    pub kind: ChangeKind,
    pub object: K,
}

/// Objects currently known to exist, keyed by namespace/name
pub(crate) struct KnownObjects<K> {
    known: HashMap<String, K>,
    relisting: Option<HashMap<String, K>>,
    synced: bool,
}

fn key<K: Resource>(obj: &K) -> String {
    format!("{}/{}", obj.namespace().unwrap_or_default(), obj.name_any())
}

impl<K: Resource + Clone> KnownObjects<K> {
    pub(crate) fn new() -> Self {
        Self {
            known: HashMap::new(),
            relisting: None,
            synced: false,
        }
    }

    /// True once the first full list has been applied
    pub(crate) fn is_synced(&self) -> bool {
        self.synced
    }

    /// Apply one watcher event, returning the notifications it produces.
    /// Modifications of known objects produce nothing.
    pub(crate) fn apply(&mut self, event: watcher::Event<K>) -> Vec<ChangeEvent<K>> {
        match event {
            watcher::Event::Init => {
                self.relisting = Some(HashMap::new());
                Vec::new()
            }
            watcher::Event::InitApply(obj) => {
                self.relisting
                    .get_or_insert_with(HashMap::new)
                    .insert(key(&obj), obj);
                Vec::new()
            }
            watcher::Event::InitDone => {
                let listed = self.relisting.take().unwrap_or_default();
                let mut changes: Vec<ChangeEvent<K>> = self
                    .known
                    .iter()
                    .filter(|(k, _)| !listed.contains_key(*k))
                    .map(|(_, obj)| ChangeEvent {
                        kind: ChangeKind::Deleted,
                        object: obj.clone(),
                    })
                    .collect();
                changes.extend(
                    listed
                        .iter()
                        .filter(|(k, _)| !self.known.contains_key(*k))
                        .map(|(_, obj)| ChangeEvent {
                            kind: ChangeKind::Added,
                            object: obj.clone(),
                        }),
                );
                self.known = listed;
                self.synced = true;
                changes
            }
            watcher::Event::Apply(obj) => {
                let added = self.known.insert(key(&obj), obj.clone()).is_none();
                if added {
                    vec![ChangeEvent {
                        kind: ChangeKind::Added,
                        object: obj,
                    }]
                } else {
                    Vec::new()
                }
            }
            watcher::Event::Delete(obj) => match self.known.remove(&key(&obj)) {
                Some(_) => vec![ChangeEvent {
                    kind: ChangeKind::Deleted,
                    object: obj,
                }],
                None => Vec::new(),
            },
        }
    }
}
