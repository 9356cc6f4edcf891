// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The merge engine fed over real sockets.

use std::net::UdpSocket;

use serial_test::serial;

use super::*;
use vis_ingest::{
    constants::{PACKETS_LOST_COUNT, PACKETS_LOST_PERCENT},
    scan::SCAN_INACTIVE,
    sim::{thin, Simulator},
    telemetry::{MonitorValue, RecordingTelemetry},
    Interrupt, MergeEngine,
};

#[test]
#[serial]
fn test_ingest_over_loopback() {
    let (_dir, params) = small_params();
    let (metadata_src, vis_src) = loopback_sources(&params);
    let metadata_addr = metadata_src.local_addr().unwrap();
    let vis_addr = vis_src.local_addr().unwrap();

    let sim = Simulator::new(params.clone());
    let tx = UdpSocket::bind("127.0.0.1:0").unwrap();
    for i in 0..2 {
        let (metadata, datagrams) = sim.integration(i, 0);
        tx.send_to(metadata.to_json().unwrap().as_bytes(), metadata_addr)
            .unwrap();
        for d in datagrams {
            tx.send_to(&d.encode(), vis_addr).unwrap();
        }
    }
    let end = sim.metadata(sim.timestamp(2), SCAN_INACTIVE);
    tx.send_to(end.to_json().unwrap().as_bytes(), metadata_addr)
        .unwrap();

    let telemetry = RecordingTelemetry::new();
    let mut engine = MergeEngine::new(
        params,
        Box::new(metadata_src),
        Box::new(vis_src),
        Box::new(telemetry.clone()),
        Interrupt::new(),
    );

    for i in 0..2 {
        let chunk = engine.next().unwrap().unwrap();
        assert_eq!(chunk.timestamp, sim.timestamp(i));
        assert_eq!(chunk.num_rows(), 12);
        assert_eq!(chunk.num_flagged(), 0);
        let stats = engine.last_cycle_stats().unwrap();
        assert_eq!(stats.accepted, 84);
        assert_eq!(stats.duplicates, 0);
    }
    assert!(engine.next().unwrap().is_none());

    assert_eq!(
        telemetry.latest(PACKETS_LOST_COUNT),
        Some(Some(MonitorValue::Int(0)))
    );
    assert_eq!(telemetry.points().len(), 4);
}

#[test]
#[serial]
fn test_lossy_integration_over_loopback() {
    let (_dir, params) = small_params();
    let (metadata_src, vis_src) = loopback_sources(&params);
    let metadata_addr = metadata_src.local_addr().unwrap();
    let vis_addr = vis_src.local_addr().unwrap();

    let sim = Simulator::new(params.clone());
    let tx = UdpSocket::bind("127.0.0.1:0").unwrap();
    let (metadata, datagrams) = sim.integration(0, 0);
    let datagrams = thin(datagrams, 50);
    let num_sent = datagrams.len();
    tx.send_to(metadata.to_json().unwrap().as_bytes(), metadata_addr)
        .unwrap();
    for d in datagrams {
        tx.send_to(&d.encode(), vis_addr).unwrap();
    }
    // Garbage on both sockets is skipped.
    tx.send_to(b"{\"not\": \"metadata\"}", metadata_addr).unwrap();
    tx.send_to(&[0; 10], vis_addr).unwrap();

    let telemetry = RecordingTelemetry::new();
    let mut engine = MergeEngine::new(
        params,
        Box::new(metadata_src),
        Box::new(vis_src),
        Box::new(telemetry.clone()),
        Interrupt::new(),
    );

    // The engine waits two intervals for the missing datagrams, then gives up.
    let chunk = engine.next().unwrap().unwrap();
    let stats = engine.last_cycle_stats().unwrap();
    assert_eq!(stats.accepted, num_sent);
    assert_eq!(stats.lost(), 84 - num_sent);
    assert!(chunk.num_flagged() > 0);
    assert_eq!(
        telemetry.latest(PACKETS_LOST_COUNT),
        Some(Some(MonitorValue::Int((84 - num_sent) as i64)))
    );
    match telemetry.latest(PACKETS_LOST_PERCENT) {
        Some(Some(MonitorValue::Float(p))) => {
            assert!((p - 100.0 * (84 - num_sent) as f64 / 84.0).abs() < 1e-9)
        }
        other => panic!("unexpected telemetry: {other:?}"),
    }
}
