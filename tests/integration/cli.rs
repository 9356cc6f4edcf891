// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests of the binary.

use std::str::from_utf8;

use serial_test::serial;

use super::*;
use vis_ingest::{telemetry::RecordingTelemetry, Interrupt, MergeEngine};

#[test]
fn test_ingest_dry_run() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "ingest.toml", SMALL_CONFIG);
    let output = vis_ingest()
        .arg("ingest")
        .arg(&config)
        .arg("--dry-run")
        .output()
        .unwrap();
    let stdout = from_utf8(&output.stdout).unwrap();
    assert!(output.status.success(), "{stdout}");
    assert!(stdout.contains("3 antennas, 2 beams"), "{stdout}");
    assert!(stdout.contains("Dry run"), "{stdout}");
}

#[test]
fn test_bad_config_is_reported() {
    let dir = TempDir::new().unwrap();
    let bad = SMALL_CONFIG.replace("channels_per_slice = 4", "channels_per_slice = 3");
    let config = write_config(&dir, "ingest.toml", &bad);
    let output = vis_ingest()
        .arg("ingest")
        .arg(&config)
        .arg("--dry-run")
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = from_utf8(&output.stderr).unwrap();
    assert!(stderr.starts_with("Error: "), "{stderr}");
    assert!(stderr.contains("divisible"), "{stderr}");
}

#[test]
fn test_unrecognised_config_extension() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "ingest.yaml", SMALL_CONFIG);
    let output = vis_ingest().arg("ingest").arg(&config).output().unwrap();
    assert!(!output.status.success());
    let stderr = from_utf8(&output.stderr).unwrap();
    assert!(stderr.contains("ingest.yaml"), "{stderr}");
}

#[test]
#[serial]
fn test_simulate_feeds_an_engine() {
    let (dir, params) = small_params();
    let (metadata_src, vis_src) = loopback_sources(&params);
    let config = write_config(&dir, "sim.toml", SMALL_CONFIG);

    let output = vis_ingest()
        .arg("simulate")
        .arg(&config)
        .args(["-n", "3", "--no-wait"])
        .arg("--metadata-addr")
        .arg(metadata_src.local_addr().unwrap().to_string())
        .arg("--vis-addr")
        .arg(vis_src.local_addr().unwrap().to_string())
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "{}",
        from_utf8(&output.stderr).unwrap()
    );

    let mut engine = MergeEngine::new(
        params,
        Box::new(metadata_src),
        Box::new(vis_src),
        Box::new(RecordingTelemetry::new()),
        Interrupt::new(),
    );
    let mut num_chunks = 0;
    while let Some(chunk) = engine.next().unwrap() {
        assert_eq!(chunk.num_flagged(), 0);
        num_chunks += 1;
    }
    assert_eq!(num_chunks, 3);
}
