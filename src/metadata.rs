// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Telescope metadata, one record per integration.

use serde::{Deserialize, Serialize};

/// The state of a single antenna during an integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntennaMetadata {
    #[serde(default)]
    pub name: String,
    pub on_source: bool,
    pub hardware_error: bool,
}

impl AntennaMetadata {
    /// Is data involving this antenna unusable for this integration?
    pub fn is_flagged(&self) -> bool {
        !self.on_source || self.hardware_error
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// The start of the integration (BAT) \[microseconds\].
    pub timestamp: u64,

    /// -1 while the observation hasn't started (or has ended); otherwise an
    /// index into the configured scans.
    pub scan_id: i64,

    /// Everything in this integration should be flagged.
    #[serde(default)]
    pub flagged: bool,

    /// One entry per configured antenna, in configuration order.
    pub antennas: Vec<AntennaMetadata>,
}

impl MetadataRecord {
    /// Is data involving this antenna unusable? Antennas the record doesn't
    /// describe are treated as flagged.
    pub fn antenna_flagged(&self, antenna: usize) -> bool {
        self.antennas
            .get(antenna)
            .map(AntennaMetadata::is_flagged)
            .unwrap_or(true)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(bytes: &[u8]) -> Result<MetadataRecord, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn test_antenna_flags() {
        let record = MetadataRecord {
            timestamp: 100,
            scan_id: 0,
            flagged: false,
            antennas: vec![
                AntennaMetadata {
                    name: "ak01".to_string(),
                    on_source: true,
                    hardware_error: false,
                },
                AntennaMetadata {
                    name: "ak02".to_string(),
                    on_source: false,
                    hardware_error: false,
                },
                AntennaMetadata {
                    name: "ak03".to_string(),
                    on_source: true,
                    hardware_error: true,
                },
            ],
        };
        assert!(!record.antenna_flagged(0));
        assert!(record.antenna_flagged(1));
        assert!(record.antenna_flagged(2));
        // Not described.
        assert!(record.antenna_flagged(3));
    }

    #[test]
    fn test_decode_json() {
        let json = indoc! {r#"
            {
                "timestamp": 4976059470000000,
                "scan_id": 2,
                "antennas": [
                    {"name": "ak01", "on_source": true, "hardware_error": false},
                    {"on_source": true, "hardware_error": false}
                ]
            }
        "#};
        let record = MetadataRecord::from_json(json.as_bytes()).unwrap();
        assert_eq!(record.timestamp, 4976059470000000);
        assert_eq!(record.scan_id, 2);
        assert!(!record.flagged);
        assert_eq!(record.antennas.len(), 2);
        assert!(record.antennas[1].name.is_empty());

        let back = MetadataRecord::from_json(record.to_json().unwrap().as_bytes()).unwrap();
        assert_eq!(back, record);

        assert!(MetadataRecord::from_json(b"{\"timestamp\": 1}").is_err());
    }
}
