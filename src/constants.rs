// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubeconfig file used when no in-cluster configuration is available
pub const DEFAULT_KUBECONFIG: &str = "kubeconfig.json";

/// Client identity sent with every request
pub mod identity {
    /// Application name used in the User-Agent header
    pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
    pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
    /// kube-rs only decodes JSON, so protobuf is never requested
    pub const ACCEPT_CONTENT_TYPES: &[&str] = &["application/json"];
}

/// Deployment walkthrough defaults
pub mod deployment {
    pub const NAMESPACE: &str = "example-namespace2";
    pub const NAME: &str = "demo-deployment";
    pub const REPLICAS: i32 = 2;
    pub const APP_LABEL: &str = "demo";
    pub const CONTAINER_NAME: &str = "web";
    pub const IMAGE: &str = "nginx:1.12";
    pub const PORT_NAME: &str = "http";
    pub const PORT: i32 = 80;
    /// How long to wait for the first pod to show up
    pub const POD_WAIT_SECS: u64 = 30;
    pub const POLL_INTERVAL_MS: u64 = 500;
}

/// CRD walkthrough defaults
pub mod crd {
    pub const NAMESPACE: &str = "crd-namespace";
    pub const NAME: &str = "pizzas.pizza.com";
    pub const GROUP: &str = "pizza.com";
    pub const PLURAL: &str = "pizzas";
    pub const SINGULAR: &str = "pizza";
    pub const KIND: &str = "Pizza";
    pub const VERSION: &str = "v1alpha1";
    /// How long to wait for a new CRD to be served
    pub const ESTABLISH_TIMEOUT_SECS: u64 = 30;
    pub const POLL_INTERVAL_MS: u64 = 500;
}

/// Buffer size of each change observer subscription
pub const OBSERVER_BUFFER: usize = 256;
