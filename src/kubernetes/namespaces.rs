// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace management utilities

use crate::error::Result;
use crate::kubernetes::resources::{create_resource, CreateOutcome, CreatePolicy};
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{DeleteParams, ObjectMeta},
    Api, Client,
};
use tracing::{debug, info, instrument};

/// Ensure a namespace exists in the cluster; an existing one is not an error
#[instrument(skip(client))]
pub async fn ensure_namespace(client: &Client, namespace: &str) -> Result<CreateOutcome<Namespace>> {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    let ns = Namespace {
        metadata: ObjectMeta {
            name: Some(namespace.to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    let outcome = create_resource(&namespaces, &ns, CreatePolicy::TolerateExisting).await?;
    if outcome.was_created() {
        info!("Namespace {} created successfully", namespace);
    } else {
        debug!("Namespace {} already exists", namespace);
    }
    Ok(outcome)
}

/// Delete a namespace. The API server removes its contents asynchronously.
#[instrument(skip(client))]
pub async fn delete_namespace(client: &Client, namespace: &str) -> Result<()> {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    namespaces.delete(namespace, &DeleteParams::default()).await?;
    info!("Namespace {} deleted", namespace);
    Ok(())
}
