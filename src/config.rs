// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::{Cli, Command, CrdArgs, DeploymentArgs};
use crate::constants::{crd, deployment};
use crate::error::{Result, TourError};
use crate::kubernetes::ClientIdentity;
use crate::types::{CrdSpec, DeploymentSpec};

/// Settings for one run, built once from the command line
#[derive(Debug, Clone)]
pub struct Settings {
    /// Kubeconfig read when no in-cluster configuration is available
    pub kubeconfig: PathBuf,
    pub identity: ClientIdentity,
    pub walkthrough: Walkthrough,
}

#[derive(Debug, Clone)]
pub enum Walkthrough {
    Deployment(DeploymentWalkthrough),
    Crd(CrdWalkthrough),
}

#[derive(Debug, Clone)]
pub struct DeploymentWalkthrough {
    pub namespace: String,
    pub deployment: DeploymentSpec,
    /// Upper bound on waiting for the first pod to be listed
    pub pod_wait: Duration,
    pub poll_interval: Duration,
    /// Delete the deployment and namespace at the end
    pub teardown: bool,
}

impl Default for DeploymentWalkthrough {
    fn default() -> Self {
        Self {
            namespace: deployment::NAMESPACE.to_string(),
            deployment: DeploymentSpec::default(),
            pod_wait: Duration::from_secs(deployment::POD_WAIT_SECS),
            poll_interval: Duration::from_millis(deployment::POLL_INTERVAL_MS),
            teardown: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrdWalkthrough {
    pub namespace: String,
    pub crd: CrdSpec,
}

impl Default for CrdWalkthrough {
    fn default() -> Self {
        Self {
            namespace: crd::NAMESPACE.to_string(),
            crd: CrdSpec::default(),
        }
    }
}

impl TryFrom<Cli> for Settings {
    type Error = TourError;

    fn try_from(cli: Cli) -> Result<Self> {
        if let Some(namespace) = &cli.namespace {
            if namespace.trim().is_empty() {
                return Err(TourError::InvalidSettings(
                    "namespace must not be empty".to_string(),
                ));
            }
        }

        let walkthrough = match cli.command {
            Command::Deployment(args) => {
                Walkthrough::Deployment(deployment_walkthrough(cli.namespace, args)?)
            }
            Command::Crd(args) => Walkthrough::Crd(crd_walkthrough(cli.namespace, args)),
        };

        Ok(Settings {
            kubeconfig: cli.kubeconfig,
            identity: ClientIdentity::default(),
            walkthrough,
        })
    }
}

fn deployment_walkthrough(
    namespace: Option<String>,
    args: DeploymentArgs,
) -> Result<DeploymentWalkthrough> {
    if args.replicas < 1 {
        return Err(TourError::InvalidSettings(format!(
            "replicas must be at least 1, got {}",
            args.replicas
        )));
    }

    if args.poll_interval_ms < 1 {
        return Err(TourError::InvalidSettings(
            "poll interval must be at least 1ms".to_string(),
        ));
    }

    Ok(DeploymentWalkthrough {
        namespace: namespace.unwrap_or_else(|| deployment::NAMESPACE.to_string()),
        deployment: DeploymentSpec {
            name: args.name,
            replicas: args.replicas,
            image: args.image,
            ..Default::default()
        },
        pod_wait: Duration::from_secs(args.pod_wait_secs),
        poll_interval: Duration::from_millis(args.poll_interval_ms),
        teardown: !args.keep,
    })
}

fn crd_walkthrough(namespace: Option<String>, args: CrdArgs) -> CrdWalkthrough {
    CrdWalkthrough {
        namespace: namespace.unwrap_or_else(|| crd::NAMESPACE.to_string()),
        crd: CrdSpec {
            name: args.crd_name,
            group: args.group_name,
            plural: args.plural_name,
            singular: args.singular_name,
            kind: args.kind,
            versions: vec![args.version],
        },
    }
}
