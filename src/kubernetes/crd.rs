// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CustomResourceDefinition registration

use crate::error::Result;
use crate::kubernetes::resources::{
    create_resource, next_poll_misses, CreateOutcome, CreatePolicy,
};
use crate::types::CrdSpec;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{Api, Client};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

/// Register the CRD described by `spec`, handling an existing definition per `policy`
#[instrument(skip(client, spec), fields(crd = %spec.name))]
pub async fn register_crd(
    client: &Client,
    spec: &CrdSpec,
    policy: CreatePolicy,
) -> Result<CreateOutcome<CustomResourceDefinition>> {
    if !spec.has_canonical_name() {
        warn!(
            "CRD name {} does not match {}.{}, the API server will likely reject it",
            spec.name, spec.plural, spec.group
        );
    }

    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    let outcome = create_resource(&crds, &spec.to_crd(), policy).await?;

    if outcome.was_created() {
        debug!("CRD {} has been created", spec.name);
    } else {
        debug!("CRD {} already registered", spec.name);
    }
    Ok(outcome)
}

/// Whether the CRD carries an `Established=True` condition
pub fn is_established(crd: &CustomResourceDefinition) -> bool {
    crd.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Established" && c.status == "True")
        })
}

/// Wait for the CRD to be established, doubling the poll interval up to `max_interval`.
/// Returns false when `timeout` passes first.
pub async fn wait_for_established(
    client: &Client,
    name: &str,
    mut interval: Duration,
    max_interval: Duration,
    timeout: Duration,
) -> Result<bool> {
    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    let deadline = Instant::now().checked_add(timeout);

    loop {
        let crd = crds.get(name).await?;
        if is_established(&crd) {
            info!("CRD {} is established", name);
            return Ok(true);
        }

        if next_poll_misses(deadline, interval) {
            warn!("CRD {} not established after {:?}", name, timeout);
            return Ok(false);
        }

        info!("CRD {} not yet established, waiting {:?}...", name, interval);
        sleep(interval).await;

        interval = (interval * 2).min(max_interval);
    }
}
