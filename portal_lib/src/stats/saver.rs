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

use super::snapshot::Snapshot;
use portal_accounting::stats::PortalStats;
use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::Path;
use tracing::error;

const PORTAL_STATS_DIR: &str = "portal";
const PORTAL_STATS_FILE: &str = "portal_stats.json";

/// Write the stats snapshot under `stats_dir`, replacing the previous file
/// through a rename so readers only ever see a complete file.
pub fn save_portal_stats(snapshot: &Snapshot<PortalStats>, stats_dir: &str) -> std::io::Result<()> {
    let dir = Path::new(stats_dir).join(PORTAL_STATS_DIR);
    if let Err(e) = create_dir_all(&dir) {
        error!("Error creating stats directory {}: {e}", dir.display());
        return Err(e);
    }
    let path = dir.join(PORTAL_STATS_FILE);
    let tmp_path = dir.join(format!("{PORTAL_STATS_FILE}.tmp"));

    let serialized = serde_json::to_string_pretty(snapshot)
        .map_err(|e| std::io::Error::other(format!("JSON serialization failed: {e}")))?;

    let mut file = File::create(&tmp_path)?;
    file.write_all(serialized.as_bytes())?;
    file.sync_all()?;
    std::fs::rename(&tmp_path, &path)
}

/// Read back the last saved snapshot. A missing file is an empty snapshot.
pub fn load_portal_stats(stats_dir: &str) -> std::io::Result<Snapshot<PortalStats>> {
    let path = Path::new(stats_dir)
        .join(PORTAL_STATS_DIR)
        .join(PORTAL_STATS_FILE);
    if !path.exists() {
        return Ok(Snapshot::default());
    }
    let content = std::fs::read_to_string(&path)?;
    serde_json::from_str(&content).map_err(|e| {
        error!("Error deserializing portal stats: {e}");
        std::io::Error::other("JSON deserialization failed")
    })
}
