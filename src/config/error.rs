// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from reading and validating ingest configuration. All of these are
//! fatal.

use thiserror::Error;

use crate::{baseline_map::BaselineMapError, beam_map::BeamMapError, pol::PolProductError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file '{0}' doesn't have a recognised file extension! Valid extensions are: toml, json")]
    UnrecognisedExtension(String),

    #[error("Couldn't decode config file {file}:\n{err}")]
    Decode { file: String, err: String },

    #[error("No antennas were configured")]
    NoAntennas,

    #[error("n_beams must be at least 1")]
    NoBeams,

    #[error("beams_expected must be at least 1")]
    NoExpectedBeams,

    #[error("No scans were configured")]
    NoScans,

    #[error("The integration interval must be non-zero")]
    ZeroInterval,

    #[error("channels_per_slice must be non-zero")]
    ZeroChannelsPerSlice,

    #[error("Rank {rank} was requested, but only {num_ranks} ranks have channels configured")]
    RankOutOfRange { rank: usize, num_ranks: usize },

    #[error("Rank {rank} has no channels")]
    NoLocalChannels { rank: usize },

    #[error("This rank's {local_channels} channels are not divisible by the {channels_per_slice} channels in each slice")]
    ChannelsNotDivisible {
        local_channels: usize,
        channels_per_slice: usize,
    },

    #[error("Scan {scan} has only {available} channels, but rank {rank} needs {needed}")]
    ShardExceedsScan {
        scan: usize,
        rank: usize,
        needed: usize,
        available: usize,
    },

    #[error("Scan {scan}: {err}")]
    Products {
        scan: usize,
        #[source]
        err: PolProductError,
    },

    #[error("The baseline map is empty")]
    EmptyBaselineMap,

    #[error("Baseline id {id} refers to antenna {antenna}, but only {num_antennas} antennas are configured")]
    BaselineAntenna {
        id: u32,
        antenna: usize,
        num_antennas: usize,
    },

    #[error(transparent)]
    BeamMap(#[from] BeamMapError),

    #[error(transparent)]
    BaselineMap(#[from] BaselineMapError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
