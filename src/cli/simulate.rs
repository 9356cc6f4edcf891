// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pretend to be the telescope: send metadata and visibility datagrams.

use std::net::UdpSocket;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::Parser;
use log::{debug, info};

use super::IngestError;
use crate::{
    config::IngestConfig,
    scan::SCAN_INACTIVE,
    sim::{thin, Simulator},
};

#[derive(Parser, Debug)]
pub(super) struct SimulateArgs {
    /// Path to the ingest configuration (toml or json).
    #[clap(name = "CONFIG_FILE", parse(from_os_str))]
    config: PathBuf,

    /// Simulate the datagrams for this rank's shard of the band.
    #[clap(short, long, default_value = "0")]
    rank: usize,

    /// The number of integrations to send.
    #[clap(short = 'n', long, default_value = "10")]
    integrations: u64,

    /// The scan id to put in the metadata.
    #[clap(long, default_value = "0")]
    scan: i64,

    /// The percentage of visibility datagrams to drop.
    #[clap(long, default_value = "0")]
    drop_percent: usize,

    /// Where to send metadata. Defaults to the configured metadata address.
    #[clap(long)]
    metadata_addr: Option<String>,

    /// Where to send visibilities. Defaults to the configured visibility
    /// address.
    #[clap(long)]
    vis_addr: Option<String>,

    /// Send integrations back to back instead of one per interval.
    #[clap(long)]
    no_wait: bool,
}

impl SimulateArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), IngestError> {
        let params = IngestConfig::from_file(&self.config)?.parse(self.rank)?;
        let metadata_addr = self
            .metadata_addr
            .unwrap_or_else(|| params.network.metadata_addr.clone());
        let vis_addr = self
            .vis_addr
            .unwrap_or_else(|| params.network.vis_addr.clone());
        let interval = Duration::from_micros(params.interval_micros);
        info!(
            "Sending {} integrations of scan {} (dropping {}% of datagrams) to {vis_addr}; metadata to {metadata_addr}",
            self.integrations,
            self.scan,
            self.drop_percent.min(100)
        );
        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let socket = UdpSocket::bind("0.0.0.0:0")?;
        let sim = Simulator::new(params);
        for i in 0..self.integrations {
            let (metadata, datagrams) = sim.integration(i, self.scan);
            socket.send_to(metadata.to_json()?.as_bytes(), &metadata_addr)?;
            let datagrams = thin(datagrams, self.drop_percent);
            for d in &datagrams {
                socket.send_to(&d.encode(), &vis_addr)?;
            }
            debug!("Sent integration {} ({} datagrams)", metadata.timestamp, datagrams.len());

            if !self.no_wait {
                thread::sleep(interval);
            }
        }

        // Tell the ingest process that the observation is over.
        let end = sim.metadata(sim.timestamp(self.integrations), SCAN_INACTIVE);
        socket.send_to(end.to_json()?.as_bytes(), &metadata_addr)?;
        info!("Sent end of observation");

        Ok(())
    }
}
