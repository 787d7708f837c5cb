// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for config resolution, client sessions, resource CRUD and CRDs.

pub mod client;
pub mod crd;
pub mod namespaces;
pub mod resources;

pub use client::{resolve_config, ClientIdentity, ClientSession, ConfigSource, ResolvedConfig};
pub use crd::{register_crd, wait_for_established};
pub use namespaces::{delete_namespace, ensure_namespace};
pub use resources::{
    create_resource, delete_resource, list_resources, next_poll_misses, CreateOutcome,
    CreatePolicy, Propagation,
};
