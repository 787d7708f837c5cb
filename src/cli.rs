// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::constants::{crd, deployment, DEFAULT_KUBECONFIG};

#[derive(Debug, Parser)]
#[command(
    name = "kubetour",
    version,
    about = "Walk through the Kubernetes API: namespaces, deployments, pods and CRDs"
)]
pub struct Cli {
    /// Kubeconfig file used when not running inside a cluster
    #[arg(
        long = "kubeconfig",
        env = "KUBECONFIG_FILE",
        default_value = DEFAULT_KUBECONFIG,
        global = true
    )]
    pub kubeconfig: PathBuf,

    /// Namespace to work in (defaults depend on the walkthrough)
    #[arg(short = 'n', long = "namespace", env = "KUBETOUR_NAMESPACE", global = true)]
    pub namespace: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a deployment, watch its pods come and go, then tear everything down
    Deployment(DeploymentArgs),
    /// Register a CustomResourceDefinition
    Crd(CrdArgs),
}

#[derive(Debug, Args)]
pub struct DeploymentArgs {
    /// Deployment name
    #[arg(long = "name", default_value = deployment::NAME)]
    pub name: String,

    /// Desired replica count
    #[arg(long = "replicas", default_value_t = deployment::REPLICAS)]
    pub replicas: i32,

    /// Container image
    #[arg(long = "image", default_value = deployment::IMAGE)]
    pub image: String,

    /// Seconds to wait for the first pod to be listed
    #[arg(long = "pod-wait-secs", default_value_t = deployment::POD_WAIT_SECS)]
    pub pod_wait_secs: u64,

    /// Milliseconds between polls while waiting for pods or deletions
    #[arg(long = "poll-interval-ms", default_value_t = deployment::POLL_INTERVAL_MS)]
    pub poll_interval_ms: u64,

    /// Leave the deployment and namespace in place
    #[arg(long = "keep", default_value_t = false)]
    pub keep: bool,
}

// camelCase aliases keep older command lines working
#[derive(Debug, Args)]
pub struct CrdArgs {
    #[arg(long = "crd-name", alias = "crdName", default_value = crd::NAME)]
    pub crd_name: String,

    #[arg(long = "group-name", alias = "groupName", default_value = crd::GROUP)]
    pub group_name: String,

    #[arg(long = "plural-name", alias = "pluralName", default_value = crd::PLURAL)]
    pub plural_name: String,

    #[arg(long = "singular-name", alias = "singularName", default_value = crd::SINGULAR)]
    pub singular_name: String,

    #[arg(long = "kind", default_value = crd::KIND)]
    pub kind: String,

    #[arg(long = "version", default_value = crd::VERSION)]
    pub version: String,
}
