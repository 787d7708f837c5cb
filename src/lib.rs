// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod kubernetes;
pub mod logging;
pub mod observer;
pub mod orchestrator;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use std::time::Duration;

use tracing::info;

use crate::config::{Settings, Walkthrough};
use crate::error::Result;
use crate::kubernetes::{resolve_config, ClientSession};
use crate::orchestrator::{crd_plan, deployment_plan, Orchestrator};

/// Resolve the connection, then run the selected walkthrough to completion
pub async fn run(settings: Settings) -> Result<()> {
    let resolved = resolve_config(&settings.kubeconfig).await?;
    info!("Using {}", resolved.source);
    let session = ClientSession::connect(resolved, &settings.identity)?;

    let (steps, poll_interval) = match &settings.walkthrough {
        Walkthrough::Deployment(w) => (deployment_plan(w), w.poll_interval),
        Walkthrough::Crd(w) => (
            crd_plan(w),
            Duration::from_millis(constants::crd::POLL_INTERVAL_MS),
        ),
    };

    let mut orchestrator = Orchestrator::new(session, poll_interval);
    let result = orchestrator.run(&steps).await;
    orchestrator.finish().await;

    let outcomes = result?;
    info!("Walkthrough finished after {} steps", outcomes.len());
    Ok(())
}
