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

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// A published value with its version and generation time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<T> {
    /// Starts at 0 for the initial empty value, each publish adds one
    pub version: u64,
    /// Seconds since epoch
    pub generated_at: u64,
    pub data: T,
}

/// Single writer, many readers. A publish replaces the whole snapshot, readers
/// never see a partial update.
#[derive(Debug)]
pub struct SnapshotPublisher<T> {
    sender: watch::Sender<Snapshot<T>>,
}

impl<T: Clone + Default> SnapshotPublisher<T> {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Snapshot::default());
        SnapshotPublisher { sender }
    }

    /// Swap in `data` and bump the version. Returns the new version.
    pub fn publish(&self, data: T, generated_at: u64) -> u64 {
        let mut version = 0;
        self.sender.send_modify(|snapshot| {
            version = snapshot.version + 1;
            *snapshot = Snapshot {
                version,
                generated_at,
                data,
            };
        });
        version
    }

    pub fn latest(&self) -> Snapshot<T> {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.sender.subscribe()
    }
}

impl<T: Clone + Default> Default for SnapshotPublisher<T> {
    fn default() -> Self {
        Self::new()
    }
}
