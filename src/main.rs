// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

use mssh::{
    endpoint::parse_host_list,
    executor::Dispatcher,
    ssh::SshShell,
    utils::{init_logging, should_use_colors},
    Cli,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = cli.to_config()?;
    let host_list = cli.host_list().context("Could not parse input file")?;
    let endpoints = parse_host_list(&host_list).context("Could not parse hosts")?;

    if endpoints.is_empty() {
        tracing::warn!("No hosts given, nothing to do");
        return Ok(());
    }

    let shell = Arc::new(SshShell::new(config.host_key_checking()));
    let dispatcher = Dispatcher::new(config, shell).with_colors(should_use_colors());

    // Ctrl-C stops the run; jobs not finished by then are reported as cancelled.
    let stop = dispatcher.stop_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping workers");
            stop.cancel();
        }
    });

    dispatcher
        .run(endpoints, &cli.command, std::io::stdout())
        .await?;

    Ok(())
}
