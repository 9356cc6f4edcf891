// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helpful functions for tests.

use crate::{
    config::{IngestConfig, IngestParams, NetworkConfig, ScanConfig},
    metadata::{AntennaMetadata, MetadataRecord},
    pol::PolProduct,
};

/// 3 antennas, 2 beams, 4 products and 2 slices of 4 channels on rank 0. One
/// scan, 5 second integrations.
pub(crate) fn small_config() -> IngestConfig {
    IngestConfig {
        antennas: vec!["ak01".into(), "ak02".into(), "ak03".into()],
        n_beams: 2,
        beams_expected: None,
        beam_map: None,
        channels_per_slice: 4,
        interval_micros: 5_000_000,
        metadata_timeout_micros: 1_000,
        shard_channels: vec![8],
        baselines: None,
        scans: vec![ScanConfig {
            field_name: "1934-638".to_string(),
            field_direction: [294.854275, -63.712674],
            start_freq_hz: 1.0e9,
            channel_width_hz: 1.0e6,
            n_channels: 8,
            products: vec![
                PolProduct::XX,
                PolProduct::XY,
                PolProduct::YX,
                PolProduct::YY,
            ],
        }],
        network: NetworkConfig::default(),
    }
}

pub(crate) fn small_params() -> IngestParams {
    small_config().parse(0).unwrap()
}

/// Metadata with every antenna healthy and on source.
pub(crate) fn good_metadata(timestamp: u64, scan_id: i64, num_antennas: usize) -> MetadataRecord {
    MetadataRecord {
        timestamp,
        scan_id,
        flagged: false,
        antennas: (0..num_antennas)
            .map(|i| AntennaMetadata {
                name: format!("ak{:02}", i + 1),
                on_source: true,
                hardware_error: false,
            })
            .collect(),
    }
}
