// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Generic create/list/delete helpers shared by every resource kind

use std::fmt::Debug;
use std::time::Duration;

use kube::{
    api::{DeleteParams, ListParams, PostParams},
    Api, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument};

use crate::error::{Result, TourError};

/// What to do when the object to create is already there
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatePolicy {
    /// Already exists is an error like any other
    Strict,
    /// Already exists counts as success; the existing object is read back
    TolerateExisting,
}

/// Result of a successful create
#[derive(Debug, Clone)]
pub enum CreateOutcome<K> {
    Created(K),
    AlreadyExisted(K),
}

impl<K> CreateOutcome<K> {
    pub fn was_created(&self) -> bool {
        matches!(self, CreateOutcome::Created(_))
    }

    pub fn into_inner(self) -> K {
        match self {
            CreateOutcome::Created(k) | CreateOutcome::AlreadyExisted(k) => k,
        }
    }
}

/// Deletion propagation policy for dependents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// Dependents are removed before the owner disappears
    Foreground,
    Background,
    Orphan,
}

impl Propagation {
    pub fn delete_params(self) -> DeleteParams {
        match self {
            Propagation::Foreground => DeleteParams::foreground(),
            Propagation::Background => DeleteParams::background(),
            Propagation::Orphan => DeleteParams::orphan(),
        }
    }
}

/// Create `resource`, handling an existing object according to `policy`
#[instrument(skip(api, resource), fields(name = %resource.name_any()))]
pub async fn create_resource<K>(
    api: &Api<K>,
    resource: &K,
    policy: CreatePolicy,
) -> Result<CreateOutcome<K>>
where
    K: Resource + Clone + DeserializeOwned + Serialize + Debug,
{
    let name = resource.name_any();

    match api.create(&PostParams::default(), resource).await {
        Ok(created) => {
            debug!("Created {}", name);
            Ok(CreateOutcome::Created(created))
        }
        Err(e) => match TourError::from(e) {
            err if err.is_already_exists() && policy == CreatePolicy::TolerateExisting => {
                info!("{} already exists, reusing it", name);
                let existing = api.get(&name).await?;
                Ok(CreateOutcome::AlreadyExisted(existing))
            }
            err => Err(err),
        },
    }
}

/// List every object visible through `api`; an empty list is not an error
pub async fn list_resources<K>(api: &Api<K>, params: &ListParams) -> Result<Vec<K>>
where
    K: Resource + Clone + DeserializeOwned + Debug,
{
    let list = api.list(params).await?;
    Ok(list.items)
}

/// Delete `name`. With foreground propagation this only returns once the
/// object is gone, which the API server guarantees happens after its dependents.
#[instrument(skip(api, poll_interval))]
pub async fn delete_resource<K>(
    api: &Api<K>,
    name: &str,
    propagation: Propagation,
    poll_interval: Duration,
) -> Result<()>
where
    K: Resource + Clone + DeserializeOwned + Debug,
{
    let response = api.delete(name, &propagation.delete_params()).await?;

    // Left is the object still pending deletion; Right is a finished Status
    match response.left() {
        Some(pending) if propagation == Propagation::Foreground => {
            debug!("{} marked for deletion, waiting for dependents", name);
            wait_until_deleted(api, name, pending.uid(), poll_interval).await
        }
        _ => Ok(()),
    }
}

/// Poll until `name` (with the given uid, when known) no longer exists
pub async fn wait_until_deleted<K>(
    api: &Api<K>,
    name: &str,
    uid: Option<String>,
    poll_interval: Duration,
) -> Result<()>
where
    K: Resource + Clone + DeserializeOwned + Debug,
{
    loop {
        match api.get_opt(name).await? {
            None => return Ok(()),
            Some(current) if uid.is_some() && current.uid() != uid => {
                debug!("{} was recreated with a new uid, old object is gone", name);
                return Ok(());
            }
            Some(_) => {
                debug!("{} still present, checking again in {:?}", name, poll_interval);
                sleep(poll_interval).await;
            }
        }
    }
}

/// Whether sleeping `interval` would overshoot `deadline`. No deadline never expires.
pub fn next_poll_misses(deadline: Option<Instant>, interval: Duration) -> bool {
    match deadline {
        None => false,
        Some(deadline) => Instant::now()
            .checked_add(interval)
            .map_or(true, |next| next > deadline),
    }
}
