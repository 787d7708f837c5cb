// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The steps an orchestration run is made of.

use std::fmt;
use std::time::Duration;

use k8s_openapi::api::apps::v1::Deployment;
use kube::ResourceExt;

use crate::kubernetes::{CreatePolicy, Propagation};
use crate::types::CrdSpec;

/// Resource kinds the orchestrator can list and delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Pod,
    Deployment,
    CustomResourceDefinition,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Pod => "pod",
            ResourceKind::Deployment => "deployment",
            ResourceKind::CustomResourceDefinition => "crd",
        };
        f.write_str(name)
    }
}

/// An object to create
#[derive(Debug, Clone)]
pub enum Manifest {
    Deployment(Deployment),
    /// Registered through the CRD helper, which checks the name first
    Crd(CrdSpec),
}

impl Manifest {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Manifest::Deployment(_) => ResourceKind::Deployment,
            Manifest::Crd(_) => ResourceKind::CustomResourceDefinition,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Manifest::Deployment(d) => d.name_any(),
            Manifest::Crd(spec) => spec.name.clone(),
        }
    }
}

/// Keep listing until at least `min_items` show up or `timeout` passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListWait {
    pub min_items: usize,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub enum Step {
    /// Create the namespace; an existing one is fine
    EnsureNamespace(String),
    /// Start the pod change observer for a namespace and wait for its initial sync
    ObservePods { namespace: String },
    /// `namespace` is ignored for cluster-scoped manifests
    CreateResource {
        namespace: String,
        manifest: Manifest,
        policy: CreatePolicy,
    },
    ListResources {
        namespace: String,
        kind: ResourceKind,
        wait: Option<ListWait>,
    },
    DeleteResource {
        namespace: String,
        kind: ResourceKind,
        name: String,
        propagation: Propagation,
    },
    DeleteNamespace(String),
    /// Wait for a CRD to be served; running out of time only warns
    AwaitCrdEstablished { name: String, timeout: Duration },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::EnsureNamespace(ns) => write!(f, "ensure namespace {}", ns),
            Step::ObservePods { namespace } => write!(f, "observe pods in {}", namespace),
            Step::CreateResource {
                namespace,
                manifest,
                ..
            } => match manifest.kind() {
                ResourceKind::CustomResourceDefinition => {
                    write!(f, "create crd {}", manifest.name())
                }
                kind => write!(f, "create {} {}/{}", kind, namespace, manifest.name()),
            },
            Step::ListResources {
                namespace, kind, ..
            } => write!(f, "list {}s in {}", kind, namespace),
            Step::DeleteResource {
                namespace,
                kind,
                name,
                ..
            } => write!(f, "delete {} {}/{}", kind, namespace, name),
            Step::DeleteNamespace(ns) => write!(f, "delete namespace {}", ns),
            Step::AwaitCrdEstablished { name, .. } => write!(f, "wait for crd {}", name),
        }
    }
}

/// What a successful step did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    NamespaceCreated(String),
    NamespaceExisted(String),
    Observing(String),
    Created { kind: ResourceKind, name: String },
    Reused { kind: ResourceKind, name: String },
    Listed { kind: ResourceKind, names: Vec<String> },
    Deleted { kind: ResourceKind, name: String },
    NamespaceDeleted(String),
    CrdEstablished { name: String, established: bool },
}
