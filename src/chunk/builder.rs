// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Allocation of empty chunks.

use ndarray::prelude::*;

use super::{row_index, VisChunk};
use crate::{
    channels::ChannelManager,
    config::{IngestParams, Scan},
    metadata::MetadataRecord,
    time::{integration_midpoint, micros_to_seconds, DayTime},
};

/// Builds chunks with every row's attributes filled in, every sample zero and
/// every flag set.
#[derive(Debug, Clone)]
pub struct ChunkBuilder {
    num_antennas: usize,
    num_beams: usize,
    interval_micros: u64,
    rank: usize,
    channel_manager: ChannelManager,
}

impl ChunkBuilder {
    pub fn new(params: &IngestParams) -> ChunkBuilder {
        ChunkBuilder {
            num_antennas: params.num_antennas(),
            num_beams: params.n_beams,
            interval_micros: params.interval_micros,
            rank: params.rank,
            channel_manager: params.channel_manager.clone(),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.num_beams * self.num_antennas * (self.num_antennas + 1) / 2
    }

    /// Make an empty chunk for the integration described by `metadata`, which
    /// belongs to scan number `scan_index` (`scan`).
    pub fn build(&self, metadata: &MetadataRecord, scan_index: usize, scan: &Scan) -> VisChunk {
        let num_rows = self.num_rows();
        // The rank was validated when the params were made.
        let frequency = self
            .channel_manager
            .local_frequencies(self.rank, scan.start_freq_hz, scan.channel_width_hz)
            .unwrap_or_default();
        let shape = (num_rows, frequency.len(), scan.products.len());

        let midpoint = integration_midpoint(metadata.timestamp, self.interval_micros);
        let time = DayTime::from_bat(midpoint);

        let mut antenna1 = Vec::with_capacity(num_rows);
        let mut antenna2 = Vec::with_capacity(num_rows);
        let mut beam1 = Vec::with_capacity(num_rows);
        for beam in 0..self.num_beams {
            for ant1 in 0..self.num_antennas {
                for ant2 in ant1..self.num_antennas {
                    debug_assert_eq!(
                        row_index(beam, ant1, ant2, self.num_antennas),
                        antenna1.len()
                    );
                    antenna1.push(ant1);
                    antenna2.push(ant2);
                    beam1.push(beam);
                }
            }
        }

        VisChunk {
            timestamp: metadata.timestamp,
            time,
            epoch: time.to_epoch(),
            interval: micros_to_seconds(self.interval_micros),
            scan: scan_index,
            target_name: scan.field_name.clone(),
            channel_width: scan.channel_width_hz,
            frequency,
            stokes: scan.products.clone(),
            antenna1,
            antenna2,
            beam2: beam1.clone(),
            beam1,
            phase_centre: vec![scan.field_direction; num_rows],
            visibility: Array3::zeros(shape),
            flag: Array3::from_elem(shape, true),
        }
    }
}
