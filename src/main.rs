// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use kubetour::cli::Cli;
use kubetour::config::Settings;

#[tokio::main]
async fn main() -> ExitCode {
    kubetour::logging::init();

    match try_main().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::try_from(cli).context("Invalid command line")?;

    info!("Starting kubetour");
    kubetour::run(settings).await?;
    Ok(())
}
