// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tracking of scan transitions and the end of an observation.

use log::info;

/// The scan id metadata carries while no scan is active.
pub const SCAN_INACTIVE: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanManager {
    /// The active scan, or the last active scan once the observation has
    /// completed. -1 before any scan has started.
    current_scan_index: i64,

    observation_complete: bool,
}

impl Default for ScanManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanManager {
    pub fn new() -> ScanManager {
        ScanManager {
            current_scan_index: SCAN_INACTIVE,
            observation_complete: false,
        }
    }

    /// Feed the scan id of the latest metadata record.
    ///
    /// An inactive (negative) id after a scan has been active completes the
    /// observation. Completion is terminal.
    pub fn update(&mut self, scan_id: i64) {
        if self.observation_complete || scan_id == self.current_scan_index {
            return;
        }

        if scan_id >= 0 {
            if self.current_scan_index >= 0 {
                info!("Scan boundary: {} -> {scan_id}", self.current_scan_index);
            } else {
                info!("Scan {scan_id} started");
            }
            self.current_scan_index = scan_id;
        } else if self.current_scan_index >= 0 {
            info!("Observation complete; last scan was {}", self.current_scan_index);
            self.observation_complete = true;
        }
    }

    pub fn scan_index(&self) -> i64 {
        self.current_scan_index
    }

    pub fn has_started(&self) -> bool {
        self.current_scan_index >= 0
    }

    pub fn observation_complete(&self) -> bool {
        self.observation_complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waits_for_first_scan() {
        let mut sm = ScanManager::new();
        assert_eq!(sm.scan_index(), -1);
        sm.update(-1);
        sm.update(-1);
        assert!(!sm.has_started());
        assert!(!sm.observation_complete());

        sm.update(0);
        assert!(sm.has_started());
        assert_eq!(sm.scan_index(), 0);
    }

    #[test]
    fn test_scan_boundaries_and_completion() {
        let mut sm = ScanManager::new();
        for id in [0, 0, 1, 1, 3] {
            sm.update(id);
            assert!(!sm.observation_complete());
        }
        assert_eq!(sm.scan_index(), 3);

        sm.update(-1);
        assert!(sm.observation_complete());
        // The last active scan is kept for diagnostics.
        assert_eq!(sm.scan_index(), 3);

        // Completion is terminal.
        sm.update(4);
        assert!(sm.observation_complete());
        assert_eq!(sm.scan_index(), 3);
    }
}
