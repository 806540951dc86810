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

//! Windowed pool stats and the versioned snapshots both public operations
//! publish into.

pub mod pool_stats;
pub mod saver;
pub mod snapshot;

pub use pool_stats::collect_group_stats;
pub use saver::{load_portal_stats, save_portal_stats};
pub use snapshot::{Snapshot, SnapshotPublisher};
