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

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of the current time for window trimming and snapshot timestamps
pub trait TimeProvider: Send + Sync {
    fn now(&self) -> SystemTime;

    fn seconds_since_epoch(&self) -> u64 {
        self.now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

/// Wall clock time
#[derive(Clone, Debug, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Settable clock for tests. Clones share the same time.
#[derive(Clone, Debug)]
pub struct TestTimeProvider {
    time: Arc<Mutex<SystemTime>>,
}

impl TestTimeProvider {
    pub fn new(time: SystemTime) -> Self {
        Self {
            time: Arc::new(Mutex::new(time)),
        }
    }

    pub fn at_seconds(seconds: u64) -> Self {
        Self::new(UNIX_EPOCH + Duration::from_secs(seconds))
    }

    pub fn set_since_epoch(&self, seconds: u64) {
        if let Ok(mut time) = self.time.lock() {
            *time = UNIX_EPOCH + Duration::from_secs(seconds);
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut time) = self.time.lock() {
            *time += by;
        }
    }
}

impl TimeProvider for TestTimeProvider {
    fn now(&self) -> SystemTime {
        self.time.lock().map(|t| *t).unwrap_or(UNIX_EPOCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_time_provider() {
        let provider = TestTimeProvider::at_seconds(1000);
        assert_eq!(provider.seconds_since_epoch(), 1000);

        let shared = provider.clone();
        shared.set_since_epoch(5000);
        assert_eq!(provider.seconds_since_epoch(), 5000);

        provider.advance(Duration::from_secs(60));
        assert_eq!(shared.seconds_since_epoch(), 5060);
    }

    #[test]
    fn test_system_time_provider() {
        let provider = SystemTimeProvider;
        let diff = SystemTime::now()
            .duration_since(provider.now())
            .unwrap_or_default();
        assert!(diff < Duration::from_secs(1));
        // After Jan 1, 2024
        assert!(provider.seconds_since_epoch() > 1_704_067_200);
    }
}
