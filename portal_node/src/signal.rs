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

#[cfg(unix)]
use tokio::signal::unix::{self, SignalKind};

use tokio::{sync::watch, task::JoinHandle};
use tracing::{error, info};

/// Why the node stopped, decides the exit code
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Still running
    None,
    /// ctrl-c, SIGTERM or SIGHUP
    Signal,
    /// A component gave up
    Error,
}

impl ShutdownReason {
    pub fn is_error(&self) -> bool {
        matches!(self, ShutdownReason::Error)
    }
}

fn request_shutdown(exit_sender: &watch::Sender<ShutdownReason>) {
    if exit_sender.send(ShutdownReason::Signal).is_err() {
        error!("Shutdown requested but nobody is listening");
    }
}

#[cfg(unix)]
pub fn setup_signal_handler(exit_sender: watch::Sender<ShutdownReason>) -> JoinHandle<()> {
    let mut exit_receiver = exit_sender.subscribe();
    tokio::spawn(async move {
        let (mut hangup, mut terminate) = match (
            unix::signal(SignalKind::hangup()),
            unix::signal(SignalKind::terminate()),
        ) {
            (Ok(hangup), Ok(terminate)) => (hangup, terminate),
            (Err(e), _) | (_, Err(e)) => {
                error!("Failed to install signal handlers: {e}");
                let _ = exit_sender.send(ShutdownReason::Error);
                return;
            }
        };

        let sig = tokio::select! {
            _ = exit_receiver.changed() => None,
            _ = tokio::signal::ctrl_c() => Some(SignalKind::interrupt()),
            _ = hangup.recv() => Some(SignalKind::hangup()),
            _ = terminate.recv() => Some(SignalKind::terminate()),
        };

        if let Some(sig) = sig {
            info!("Received signal {sig:?}. Stopping portal...");
            request_shutdown(&exit_sender);
        }
    })
}

#[cfg(not(unix))]
pub fn setup_signal_handler(exit_sender: watch::Sender<ShutdownReason>) -> JoinHandle<()> {
    let mut exit_receiver = exit_sender.subscribe();
    tokio::spawn(async move {
        tokio::select! {
            _ = exit_receiver.changed() => {},
            _ = tokio::signal::ctrl_c() => {
                info!("Received ctrl-c. Stopping portal...");
                request_shutdown(&exit_sender);
            }
        };
    })
}
