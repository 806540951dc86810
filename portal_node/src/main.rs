// Copyright (C) 2024-2026 Pool Portal Developers (see AUTHORS)
//
// This file is part of Pool Portal
//
// Pool Portal is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Pool Portal is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// Pool Portal. If not, see <https://www.gnu.org/licenses/>.

use clap::Parser;
use portal_lib::config::Config;
use portal_lib::logging::setup_logging;
use portal_lib::portal::Portal;
use portal_lib::stats::save_portal_stats;
use portal_lib::store::{RedisStore, TimeoutStore, groups::connect_groups};
use portal_lib::utils::time_provider::SystemTimeProvider;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

use crate::signal::{ShutdownReason, setup_signal_handler};

mod signal;

type RedisPortal = Portal<TimeoutStore<RedisStore>, SystemTimeProvider>;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env("PORTAL_CONFIG"))]
    config: String,
    /// Reconcile rewards for this miner address once, print the result and exit
    #[arg(short, long)]
    miner: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };
    // Hold the guard so buffered file logs are flushed on exit
    let _guard = match setup_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to set up logging: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = config.validate() {
        error!("Invalid config: {e}");
        return ExitCode::FAILURE;
    }
    info!("Starting portal with {} coins", config.coins.len());

    let groups = match connect_groups(&config.coins, config.portal.store_timeout()) {
        Ok(groups) => groups,
        Err(e) => {
            error!("Failed to set up store gateways: {e}");
            return ExitCode::FAILURE;
        }
    };
    let portal = match Portal::new(&config, groups, SystemTimeProvider) {
        Ok(portal) => portal,
        Err(e) => {
            error!("Failed to set up portal: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(address) = args.miner {
        return print_miner_stats(&portal, &address).await;
    }

    let exit_sender = watch::Sender::new(ShutdownReason::None);
    let signal_handle = setup_signal_handler(exit_sender.clone());

    run_stats_loop(
        &portal,
        Duration::from_secs(config.portal.stats_interval_secs.max(1)),
        &config.logging.stats_dir,
        exit_sender.subscribe(),
    )
    .await;

    let reason = *exit_sender.borrow();
    signal_handle.abort();
    info!("Portal stopped ({reason:?})");
    if reason.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn print_miner_stats(portal: &RedisPortal, address: &str) -> ExitCode {
    let snapshot = portal.get_miner_stats(address).await;
    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to serialize miner stats: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Refresh and save pool stats every `interval` until shutdown is requested.
/// Callers of the portal are serialized by this loop.
async fn run_stats_loop(
    portal: &RedisPortal,
    interval: Duration,
    stats_dir: &str,
    mut exit_receiver: watch::Receiver<ShutdownReason>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = exit_receiver.changed() => break,
            _ = ticker.tick() => {
                let snapshot = portal.get_stats().await;
                info!(
                    "Stats v{}: {} pools, {} workers, {} kH/s",
                    snapshot.version,
                    snapshot.data.pools.len(),
                    snapshot.data.global.workers,
                    snapshot.data.global.hashrate
                );
                if let Err(e) = save_portal_stats(&snapshot, stats_dir) {
                    error!("Failed to save portal stats: {e}");
                }
            }
        }
    }
}
