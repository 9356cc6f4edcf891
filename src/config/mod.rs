// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Ingest configuration.
//!
//! [`IngestConfig`] is what's written on disk (TOML or JSON). It is parsed
//! once at start up into an immutable, validated [`IngestParams`], which is
//! all the merge engine ever sees.

mod error;

pub use error::ConfigError;

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use vec1::Vec1;

use crate::{
    baseline_map::{BaselineEntry, BaselineMap},
    beam_map::BeamMap,
    channels::ChannelManager,
    chunk::Direction,
    constants::*,
    pol::{canonical_products, PolProduct},
};

#[derive(Debug, Display, EnumString)]
pub(crate) enum ConfigFileType {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    /// Antenna names. The number of antennas is the length of this list.
    pub antennas: Vec<String>,

    /// The number of beams in each chunk.
    pub n_beams: usize,

    /// The number of beams the correlator sends. Defaults to `n_beams`.
    #[serde(default)]
    pub beams_expected: Option<usize>,

    /// Beam translation rules, e.g. "0:1,1:0,5:-1".
    #[serde(default)]
    pub beam_map: Option<String>,

    #[serde(default = "default_channels_per_slice")]
    pub channels_per_slice: usize,

    #[serde(default = "default_interval_micros")]
    pub interval_micros: u64,

    #[serde(default = "default_metadata_timeout_micros")]
    pub metadata_timeout_micros: u64,

    /// Element r is the number of channels handled by rank r.
    pub shard_channels: Vec<usize>,

    /// An explicit baseline map. If this isn't given, the standard map is
    /// generated.
    #[serde(default)]
    pub baselines: Option<Vec<BaselineEntry>>,

    pub scans: Vec<ScanConfig>,

    #[serde(default)]
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    pub field_name: String,

    /// RA and Dec \[degrees\].
    pub field_direction: [f64; 2],

    /// The frequency of the scan's first channel \[Hz\].
    pub start_freq_hz: f64,

    pub channel_width_hz: f64,

    /// The number of channels over all ranks.
    pub n_channels: usize,

    pub products: Vec<PolProduct>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    /// Where metadata records arrive.
    #[serde(default = "default_metadata_addr")]
    pub metadata_addr: String,

    /// Where visibility datagrams arrive.
    #[serde(default = "default_vis_addr")]
    pub vis_addr: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            metadata_addr: default_metadata_addr(),
            vis_addr: default_vis_addr(),
        }
    }
}

fn default_channels_per_slice() -> usize {
    DEFAULT_CHANNELS_PER_SLICE
}

fn default_interval_micros() -> u64 {
    DEFAULT_INTERVAL_MICROS
}

fn default_metadata_timeout_micros() -> u64 {
    DEFAULT_METADATA_TIMEOUT_MICROS
}

fn default_metadata_addr() -> String {
    "0.0.0.0:9001".to_string()
}

fn default_vis_addr() -> String {
    "0.0.0.0:3000".to_string()
}

/// A validated scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    pub field_name: String,
    pub field_direction: Direction,
    pub start_freq_hz: f64,
    pub channel_width_hz: f64,
    pub n_channels: usize,

    /// In canonical order.
    pub products: Vec<PolProduct>,
}

impl Scan {
    /// Where `product` lives in this scan's chunks.
    pub fn product_index(&self, product: PolProduct) -> Option<usize> {
        self.products.iter().position(|&p| p == product)
    }
}

/// Everything the merge engine needs to know, validated.
#[derive(Debug, Clone)]
pub struct IngestParams {
    /// Which shard of the band this process handles.
    pub rank: usize,
    pub antenna_names: Vec1<String>,
    pub n_beams: usize,
    pub beams_expected: usize,
    pub beam_map: BeamMap,
    pub baseline_map: BaselineMap,
    pub channel_manager: ChannelManager,
    pub channels_per_slice: usize,
    pub interval_micros: u64,
    pub metadata_timeout_micros: u64,
    pub scans: Vec1<Scan>,
    pub network: NetworkConfig,
}

impl IngestConfig {
    /// Read a config file. The format is determined by the file extension.
    pub fn from_file(path: &Path) -> Result<IngestConfig, ConfigError> {
        debug!("Attempting to parse config file {}", path.display());

        let file_type = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| ConfigFileType::from_str(&e).ok());

        let mut contents = String::new();
        match file_type {
            Some(ConfigFileType::Toml) => {
                debug!("Parsing toml file...");
                File::open(path)?.read_to_string(&mut contents)?;
                toml::from_str(&contents).map_err(|e| ConfigError::Decode {
                    file: path.display().to_string(),
                    err: e.to_string(),
                })
            }

            Some(ConfigFileType::Json) => {
                debug!("Parsing json file...");
                File::open(path)?.read_to_string(&mut contents)?;
                serde_json::from_str(&contents).map_err(|e| ConfigError::Decode {
                    file: path.display().to_string(),
                    err: e.to_string(),
                })
            }

            None => Err(ConfigError::UnrecognisedExtension(
                path.display().to_string(),
            )),
        }
    }

    /// Validate this config for the process handling `rank`.
    pub fn parse(self, rank: usize) -> Result<IngestParams, ConfigError> {
        let IngestConfig {
            antennas,
            n_beams,
            beams_expected,
            beam_map,
            channels_per_slice,
            interval_micros,
            metadata_timeout_micros,
            shard_channels,
            baselines,
            scans,
            network,
        } = self;

        let antenna_names = Vec1::try_from_vec(antennas).map_err(|_| ConfigError::NoAntennas)?;
        let num_antennas = antenna_names.len();
        if n_beams == 0 {
            return Err(ConfigError::NoBeams);
        }
        let beams_expected = beams_expected.unwrap_or(n_beams);
        if beams_expected == 0 {
            return Err(ConfigError::NoExpectedBeams);
        }
        if interval_micros == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if channels_per_slice == 0 {
            return Err(ConfigError::ZeroChannelsPerSlice);
        }

        let beam_map = BeamMap::parse(beam_map.as_deref().unwrap_or(""))?;

        let channel_manager = ChannelManager::new(shard_channels);
        let local_channels = channel_manager.local_channel_count(rank).ok_or(
            ConfigError::RankOutOfRange {
                rank,
                num_ranks: channel_manager.num_ranks(),
            },
        )?;
        if local_channels == 0 {
            return Err(ConfigError::NoLocalChannels { rank });
        }
        if local_channels % channels_per_slice != 0 {
            return Err(ConfigError::ChannelsNotDivisible {
                local_channels,
                channels_per_slice,
            });
        }
        // Can't fail; the rank was checked above.
        let channel_offset = channel_manager.channel_offset(rank).unwrap_or_default();

        let mut validated_scans = Vec::with_capacity(scans.len());
        for (i_scan, scan) in scans.into_iter().enumerate() {
            let products = canonical_products(&scan.products)
                .map_err(|err| ConfigError::Products { scan: i_scan, err })?;
            if channel_offset + local_channels > scan.n_channels {
                return Err(ConfigError::ShardExceedsScan {
                    scan: i_scan,
                    rank,
                    needed: channel_offset + local_channels,
                    available: scan.n_channels,
                });
            }
            validated_scans.push(Scan {
                field_name: scan.field_name,
                field_direction: Direction::from_degrees(
                    scan.field_direction[0],
                    scan.field_direction[1],
                ),
                start_freq_hz: scan.start_freq_hz,
                channel_width_hz: scan.channel_width_hz,
                n_channels: scan.n_channels,
                products,
            });
        }
        let scans = Vec1::try_from_vec(validated_scans).map_err(|_| ConfigError::NoScans)?;

        let baseline_map = match baselines {
            Some(entries) => BaselineMap::new(entries)?,
            None => {
                let all_products = scans
                    .iter()
                    .flat_map(|s| s.products.iter().copied())
                    .sorted()
                    .dedup()
                    .collect::<Vec<_>>();
                BaselineMap::standard(num_antennas, &all_products)
            }
        };
        if baseline_map.is_empty() {
            return Err(ConfigError::EmptyBaselineMap);
        }
        if let Some((id, baseline)) = baseline_map
            .iter()
            .find(|(_, b)| b.antenna2 >= num_antennas)
        {
            return Err(ConfigError::BaselineAntenna {
                id,
                antenna: baseline.antenna2,
                num_antennas,
            });
        }

        Ok(IngestParams {
            rank,
            antenna_names,
            n_beams,
            beams_expected,
            beam_map,
            baseline_map,
            channel_manager,
            channels_per_slice,
            interval_micros,
            metadata_timeout_micros,
            scans,
            network,
        })
    }
}

impl IngestParams {
    pub fn num_antennas(&self) -> usize {
        self.antenna_names.len()
    }

    /// The number of antenna pairs (including autos) per beam.
    pub fn num_baselines(&self) -> usize {
        let n = self.num_antennas();
        n * (n + 1) / 2
    }

    pub fn num_rows(&self) -> usize {
        self.n_beams * self.num_baselines()
    }

    pub fn local_channel_count(&self) -> usize {
        // Validated in `IngestConfig::parse`.
        self.channel_manager
            .local_channel_count(self.rank)
            .unwrap_or_default()
    }

    pub fn slices_per_shard(&self) -> usize {
        self.local_channel_count() / self.channels_per_slice
    }

    /// The baseline ids the correlator sends during `scan`. The baseline map
    /// may cover products this scan doesn't have.
    pub fn scan_baseline_count(&self, scan: &Scan) -> usize {
        self.baseline_map
            .iter()
            .filter(|(_, b)| scan.product_index(b.product).is_some())
            .count()
    }

    /// How many datagrams make up a complete integration of `scan` for this
    /// rank.
    pub fn expected_datagram_count(&self, scan: &Scan) -> usize {
        self.scan_baseline_count(scan) * self.beams_expected * self.slices_per_shard()
    }
}
