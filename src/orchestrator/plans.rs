// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Step sequences for the two walkthroughs.

use std::time::Duration;

use crate::config::{CrdWalkthrough, DeploymentWalkthrough};
use crate::constants::crd::ESTABLISH_TIMEOUT_SECS;
use crate::kubernetes::{CreatePolicy, Propagation};
use crate::orchestrator::step::{ListWait, Manifest, ResourceKind, Step};

/// ensure namespace, observe pods, create deployment, list pods,
/// then (unless kept) delete the deployment in the foreground and the namespace
pub fn deployment_plan(w: &DeploymentWalkthrough) -> Vec<Step> {
    let namespace = w.namespace.clone();
    let mut steps = vec![
        Step::EnsureNamespace(namespace.clone()),
        Step::ObservePods {
            namespace: namespace.clone(),
        },
        Step::CreateResource {
            namespace: namespace.clone(),
            manifest: Manifest::Deployment(w.deployment.to_deployment()),
            policy: CreatePolicy::Strict,
        },
        Step::ListResources {
            namespace: namespace.clone(),
            kind: ResourceKind::Pod,
            wait: Some(ListWait {
                min_items: 1,
                timeout: w.pod_wait,
            }),
        },
    ];

    if w.teardown {
        steps.push(Step::DeleteResource {
            namespace: namespace.clone(),
            kind: ResourceKind::Deployment,
            name: w.deployment.name.clone(),
            propagation: Propagation::Foreground,
        });
        steps.push(Step::DeleteNamespace(namespace));
    }

    steps
}

/// ensure namespace, register the CRD (reusing an existing one), wait until it is served
pub fn crd_plan(w: &CrdWalkthrough) -> Vec<Step> {
    vec![
        Step::EnsureNamespace(w.namespace.clone()),
        Step::CreateResource {
            namespace: w.namespace.clone(),
            manifest: Manifest::Crd(w.crd.clone()),
            policy: CreatePolicy::TolerateExisting,
        },
        Step::AwaitCrdEstablished {
            name: w.crd.name.clone(),
            timeout: Duration::from_secs(ESTABLISH_TIMEOUT_SECS),
        },
    ]
}
