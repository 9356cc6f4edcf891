// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod cli;
mod udp;

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use assert_cmd::Command;
use indoc::indoc;
use tempfile::TempDir;

use vis_ingest::{
    source::{UdpMetadataSource, UdpVisSource},
    IngestConfig, IngestParams,
};

/// 3 antennas, 2 beams, 2 slices of 4 channels. Integrations are short so
/// that timeouts don't slow the tests down.
const SMALL_CONFIG: &str = indoc! {r#"
    antennas = ["ak01", "ak02", "ak03"]
    n_beams = 2
    channels_per_slice = 4
    interval_micros = 100000
    metadata_timeout_micros = 1000
    shard_channels = [8]

    [[scans]]
    field_name = "1934-638"
    field_direction = [294.854275, -63.712674]
    start_freq_hz = 1.0e9
    channel_width_hz = 1.0e6
    n_channels = 8
    products = ["XX", "XY", "YX", "YY"]

    [network]
    metadata_addr = "127.0.0.1:0"
    vis_addr = "127.0.0.1:0"
"#};

fn vis_ingest() -> Command {
    Command::cargo_bin("vis_ingest").unwrap()
}

fn write_config(dir: &TempDir, filename: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(filename);
    let mut f = File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

fn small_params() -> (TempDir, IngestParams) {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "ingest.toml", SMALL_CONFIG);
    let params = IngestConfig::from_file(&path).unwrap().parse(0).unwrap();
    (dir, params)
}

/// Sources bound to ephemeral loopback ports.
fn loopback_sources(params: &IngestParams) -> (UdpMetadataSource, UdpVisSource) {
    (
        UdpMetadataSource::bind(&params.network.metadata_addr).unwrap(),
        UdpVisSource::bind(&params.network.vis_addr, params.channels_per_slice).unwrap(),
    )
}
