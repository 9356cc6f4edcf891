// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Run the merge engine against the network.

use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};

use super::IngestError;
use crate::{
    config::{IngestConfig, IngestParams},
    interrupt::{install_signal_handler, Interrupt},
    merge::{MergeEngine, MergeError},
    source::{UdpMetadataSource, UdpVisSource},
    telemetry::LogTelemetry,
};

#[derive(Parser, Debug)]
pub(super) struct IngestArgs {
    /// Path to the ingest configuration (toml or json).
    #[clap(name = "CONFIG_FILE", parse(from_os_str))]
    config: PathBuf,

    /// Which shard of the band this process handles.
    #[clap(short, long, default_value = "0")]
    rank: usize,

    /// Stop after this many integrations. The default is to run until the
    /// observation ends.
    #[clap(long)]
    max_integrations: Option<usize>,
}

impl IngestArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), IngestError> {
        let params = IngestConfig::from_file(&self.config)?.parse(self.rank)?;
        print_params(&params);
        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let metadata_src = UdpMetadataSource::bind(&params.network.metadata_addr)?;
        let vis_src = UdpVisSource::bind(&params.network.vis_addr, params.channels_per_slice)?;
        info!(
            "Listening for metadata on {} and visibilities on {}",
            metadata_src.local_addr()?,
            vis_src.local_addr()?
        );

        let interrupt = Interrupt::new();
        // The handler thread lives for the rest of the process.
        let _signals = install_signal_handler(interrupt.clone())?;

        let mut engine = MergeEngine::new(
            params,
            Box::new(metadata_src),
            Box::new(vis_src),
            Box::new(LogTelemetry),
            interrupt,
        );

        let mut num_integrations = 0;
        loop {
            if self.max_integrations == Some(num_integrations) {
                info!("Reached {num_integrations} integrations; stopping");
                break;
            }

            match engine.next() {
                Ok(Some(chunk)) => {
                    num_integrations += 1;
                    let stats = engine.last_cycle_stats().unwrap_or_default();
                    info!(
                        "{} (MJD {:.6}): scan {} ({}), {}/{} datagrams, {:.1}% flagged",
                        chunk.timestamp,
                        chunk.time.mjd(),
                        chunk.scan,
                        chunk.target_name,
                        stats.accepted,
                        stats.expected,
                        100.0 * chunk.flagged_fraction()
                    );
                }

                Ok(None) => {
                    info!("End of observation");
                    break;
                }

                Err(MergeError::Interrupted) => {
                    warn!("Interrupted; shutting down");
                    engine.invalidate_telemetry();
                    break;
                }

                Err(e) => return Err(e.into()),
            }
        }

        info!("Produced {num_integrations} chunks");
        Ok(())
    }
}

fn print_params(params: &IngestParams) {
    info!("Rank {} of {}", params.rank, params.channel_manager.num_ranks());
    info!(
        "{} antennas, {} beams ({} expected from the correlator)",
        params.num_antennas(),
        params.n_beams,
        params.beams_expected
    );
    if !params.beam_map.is_identity() {
        info!("Beams are being remapped");
    }
    info!(
        "{} local channels in {} slices of {}; {} baseline ids",
        params.local_channel_count(),
        params.slices_per_shard(),
        params.channels_per_slice,
        params.baseline_map.size()
    );
    for (i, scan) in params.scans.iter().enumerate() {
        info!(
            "Scan {i}: {} at ({:.4}, {:.4}) deg, products {:?}",
            scan.field_name,
            scan.field_direction.ra.to_degrees(),
            scan.field_direction.dec.to_degrees(),
            scan.products
        );
    }
}
