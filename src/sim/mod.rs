// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A stand-in for the correlator and the telescope control system.
//!
//! The simulator produces, for any integration, the metadata record and the
//! full set of visibility datagrams the real instrument would send for a
//! configuration. Samples are a deterministic function of (baseline, beam,
//! channel), so received chunks can be checked value by value.

use crate::{
    c32,
    config::IngestParams,
    datagram::VisDatagram,
    metadata::{AntennaMetadata, MetadataRecord},
};

/// An arbitrary start time (BAT) \[microseconds\]. This is 2020-01-01.
pub const DEFAULT_START_BAT: u64 = 58_849 * crate::constants::MICROS_PER_DAY;

#[derive(Debug, Clone)]
pub struct Simulator {
    params: IngestParams,
    start_bat: u64,
}

impl Simulator {
    pub fn new(params: IngestParams) -> Simulator {
        Simulator::with_start(params, DEFAULT_START_BAT)
    }

    pub fn with_start(params: IngestParams, start_bat: u64) -> Simulator {
        Simulator { params, start_bat }
    }

    pub fn params(&self) -> &IngestParams {
        &self.params
    }

    /// The start time of integration number `index`.
    pub fn timestamp(&self, index: u64) -> u64 {
        self.start_bat + index * self.params.interval_micros
    }

    /// Healthy metadata for every antenna.
    pub fn metadata(&self, timestamp: u64, scan_id: i64) -> MetadataRecord {
        MetadataRecord {
            timestamp,
            scan_id,
            flagged: false,
            antennas: self
                .params
                .antenna_names
                .iter()
                .map(|name| AntennaMetadata {
                    name: name.clone(),
                    on_source: true,
                    hardware_error: false,
                })
                .collect(),
        }
    }

    /// Every datagram of one integration of scan `scan_id`: each baseline id
    /// with one of the scan's products, each expected (one-based) beam, each
    /// slice of this rank. A `scan_id` that doesn't address a configured scan
    /// gets every baseline id.
    pub fn datagrams(&self, timestamp: u64, scan_id: i64) -> Vec<VisDatagram> {
        let width = self.params.channels_per_slice;
        let num_slices = self.params.slices_per_shard();
        let num_beams = self.params.beams_expected as u32;
        let scan = usize::try_from(scan_id)
            .ok()
            .and_then(|i| self.params.scans.get(i));

        let mut datagrams = Vec::new();
        for (baseline_id, baseline) in self.params.baseline_map.iter() {
            if let Some(scan) = scan {
                if scan.product_index(baseline.product).is_none() {
                    continue;
                }
            }
            for beam_id in 1..=num_beams {
                for slice in 0..num_slices {
                    let vis = (slice * width..(slice + 1) * width)
                        .map(|chan| sample(baseline_id, beam_id, chan))
                        .collect();
                    datagrams.push(VisDatagram {
                        timestamp,
                        slice: slice as u32,
                        baseline_id,
                        beam_id,
                        vis,
                    });
                }
            }
        }
        datagrams
    }

    /// The metadata and datagrams of integration number `index`.
    pub fn integration(&self, index: u64, scan_id: i64) -> (MetadataRecord, Vec<VisDatagram>) {
        let timestamp = self.timestamp(index);
        (
            self.metadata(timestamp, scan_id),
            self.datagrams(timestamp, scan_id),
        )
    }
}

/// The sample the simulator sends for `baseline_id` and `beam_id` (one-based)
/// on local channel `channel`.
pub fn sample(baseline_id: u32, beam_id: u32, channel: usize) -> c32 {
    c32::new(
        baseline_id as f32 + channel as f32 / 1000.0,
        beam_id as f32 - channel as f32 / 100.0,
    )
}

/// Drop `drop_percent` percent of `datagrams`, spread evenly through each
/// hundred. `drop_percent` is clamped to 100.
pub fn thin(datagrams: Vec<VisDatagram>, drop_percent: usize) -> Vec<VisDatagram> {
    let drop_percent = drop_percent.min(100);
    datagrams
        .into_iter()
        .enumerate()
        // 37 is coprime with 100, so each run of 100 indices maps onto every
        // residue exactly once.
        .filter(|(i, _)| (i * 37) % 100 >= drop_percent)
        .map(|(_, d)| d)
        .collect()
}
