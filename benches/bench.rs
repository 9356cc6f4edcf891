// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use criterion::*;

use vis_ingest::{
    config::{IngestConfig, NetworkConfig, ScanConfig},
    datagram::VisDatagram,
    pol::PolProduct,
    sim::Simulator,
    source::QueueSource,
    telemetry::RecordingTelemetry,
    Interrupt, MergeEngine,
};

/// 36 antennas and 4 products over 216 channels, roughly a single ASKAP-like
/// shard.
fn big_config() -> IngestConfig {
    IngestConfig {
        antennas: (1..=36).map(|i| format!("ak{i:02}")).collect(),
        n_beams: 1,
        beams_expected: None,
        beam_map: None,
        channels_per_slice: 54,
        interval_micros: 5_000_000,
        metadata_timeout_micros: 1_000,
        shard_channels: vec![216],
        baselines: None,
        scans: vec![ScanConfig {
            field_name: "1934-638".to_string(),
            field_direction: [294.854275, -63.712674],
            start_freq_hz: 1.0e9,
            channel_width_hz: 18.5e3,
            n_channels: 216,
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

fn merge_integration(c: &mut Criterion) {
    let params = big_config().parse(0).unwrap();
    let sim = Simulator::new(params.clone());
    let (metadata, datagrams) = sim.integration(0, 0);

    c.bench_function("merge one integration", |b| {
        b.iter_batched(
            || {
                MergeEngine::new(
                    params.clone(),
                    Box::new(QueueSource::from_items([metadata.clone()])),
                    Box::new(QueueSource::from_items(datagrams.clone())),
                    Box::new(RecordingTelemetry::new()),
                    Interrupt::new(),
                )
            },
            |mut engine| engine.next().unwrap(),
            BatchSize::LargeInput,
        )
    });

    let encoded: Vec<Vec<u8>> = datagrams.iter().map(|d| d.encode()).collect();
    c.bench_function("decode one integration", |b| {
        b.iter(|| {
            for bytes in &encoded {
                black_box(VisDatagram::decode(bytes, 54).unwrap());
            }
        })
    });
}

criterion_group!(benches, merge_integration);
criterion_main!(benches);
