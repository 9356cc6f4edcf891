// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The merge engine: joins the metadata stream and the visibility datagram
//! stream on timestamp and produces one [`VisChunk`] per integration.
//!
//! Each call to [`MergeEngine::next`]:
//!
//! 1. pulls metadata (waiting for the first scan to start if necessary);
//! 2. stops if the metadata addresses an undefined scan or the observation
//!    is over;
//! 3. aligns the visibility stream with the metadata timestamp, dropping
//!    stale datagrams;
//! 4. builds an empty (all-flagged) chunk and folds matching datagrams into
//!    it until every expected datagram has arrived or the stream goes quiet
//!    for two integration intervals;
//! 5. reports packet loss and flags rows belonging to bad antennas.
//!
//! Lost, duplicated, stale and unmappable datagrams are counted in
//! [`CycleStats`] and never raised as errors.

mod error;

pub use error::MergeError;

use std::cmp::Ordering;
use std::time::Duration;

use log::{debug, trace, warn};
use ndarray::prelude::*;

use crate::{
    chunk::{row_index, ChunkBuilder, VisChunk},
    config::{IngestParams, Scan},
    constants::{PACKETS_LOST_COUNT, PACKETS_LOST_PERCENT},
    datagram::VisDatagram,
    dedup::DatagramDeduper,
    interrupt::Interrupt,
    metadata::MetadataRecord,
    pol::PolProduct,
    scan::ScanManager,
    source::{MetadataSource, VisSource},
    telemetry::{MonitorValue, TelemetrySink},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeState {
    /// No metadata with a valid scan has been seen yet.
    AwaitingScanStart,
    Synchronising,
    Accumulating,
    Flagging,
    /// End of observation. Terminal.
    Complete,
    /// The interrupt was raised. Terminal.
    Interrupted,
}

/// What happened to the datagrams of one integration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub expected: usize,
    pub accepted: usize,
    pub duplicates: usize,
    /// Datagrams older than the integration being built.
    pub stale: usize,
    pub unmapped_baseline: usize,
    /// Beams with no place in the chunk (wire id 0, dropped by the beam map,
    /// or translated past the last beam).
    pub rejected_beam: usize,
    /// Slices past this shard's channels, or with the wrong number of
    /// samples.
    pub invalid_slice: usize,
    /// Baselines whose product isn't in the current scan.
    pub unknown_product: usize,
}

impl CycleStats {
    /// Expected datagrams that weren't accepted. Duplicates don't make up for
    /// losses.
    pub fn lost(&self) -> usize {
        self.expected.saturating_sub(self.accepted)
    }

    pub fn lost_percent(&self) -> f64 {
        if self.expected == 0 {
            return 0.0;
        }
        100.0 * self.lost() as f64 / self.expected as f64
    }
}

/// The result of lining the visibility stream up with a metadata timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Alignment {
    /// The buffered datagram belongs to this integration.
    Aligned,
    /// None of this integration's datagrams will arrive.
    Missing,
    /// The visibility stream is ahead; more metadata is needed.
    MetadataBehind,
}

pub struct MergeEngine {
    params: IngestParams,
    builder: ChunkBuilder,
    metadata_src: Box<dyn MetadataSource>,
    vis_src: Box<dyn VisSource>,
    telemetry: Box<dyn TelemetrySink>,
    interrupt: Interrupt,

    scan_manager: ScanManager,
    deduper: DatagramDeduper,

    /// The single datagram read ahead of the integration being built.
    lookahead: Option<VisDatagram>,

    /// The timestamp of the last chunk produced. Once this is set, the
    /// engine is synchronised with the correlator.
    last_timestamp: Option<u64>,

    state: MergeState,
    last_stats: Option<CycleStats>,
}

impl MergeEngine {
    pub fn new(
        params: IngestParams,
        metadata_src: Box<dyn MetadataSource>,
        vis_src: Box<dyn VisSource>,
        telemetry: Box<dyn TelemetrySink>,
        interrupt: Interrupt,
    ) -> MergeEngine {
        debug!(
            "Merge engine for rank {}: {} rows, {} local channels, {} baseline ids",
            params.rank,
            params.num_rows(),
            params.local_channel_count(),
            params.baseline_map.size()
        );
        MergeEngine {
            builder: ChunkBuilder::new(&params),
            params,
            metadata_src,
            vis_src,
            telemetry,
            interrupt,
            scan_manager: ScanManager::new(),
            deduper: DatagramDeduper::new(),
            lookahead: None,
            last_timestamp: None,
            state: MergeState::AwaitingScanStart,
            last_stats: None,
        }
    }

    pub fn params(&self) -> &IngestParams {
        &self.params
    }

    pub fn state(&self) -> MergeState {
        self.state
    }

    /// The statistics of the most recently produced chunk.
    pub fn last_cycle_stats(&self) -> Option<CycleStats> {
        self.last_stats
    }

    /// Produce the next integration's chunk. `Ok(None)` means the observation
    /// is over; every later call also returns `Ok(None)`.
    ///
    /// Returns [`MergeError::Interrupted`] if the interrupt is raised while
    /// waiting for data. The engine is then unusable.
    pub fn next(&mut self) -> Result<Option<VisChunk>, MergeError> {
        match self.state {
            MergeState::Complete => return Ok(None),
            MergeState::Interrupted => return Err(MergeError::Interrupted),
            _ => (),
        }

        let result = self.next_inner();
        match &result {
            Ok(Some(_)) => self.state = MergeState::Synchronising,
            Ok(None) => self.state = MergeState::Complete,
            Err(MergeError::Interrupted) => self.state = MergeState::Interrupted,
            Err(_) => (),
        }
        result
    }

    /// Invalidate the points this engine produces. Used at shutdown.
    pub fn invalidate_telemetry(&mut self) {
        self.telemetry.invalidate(PACKETS_LOST_COUNT);
        self.telemetry.invalidate(PACKETS_LOST_PERCENT);
    }

    fn next_inner(&mut self) -> Result<Option<VisChunk>, MergeError> {
        let mut stats = CycleStats::default();

        let mut metadata = if self.scan_manager.has_started() {
            self.pull_metadata()?
        } else {
            self.await_scan_start()?
        };

        let (scan_index, alignment) = loop {
            let scan_index = match usize::try_from(metadata.scan_id) {
                Ok(i) if i >= self.params.scans.len() => {
                    warn!(
                        "Metadata at {} addresses scan {}, but only {} scans are configured; stopping",
                        metadata.timestamp,
                        i,
                        self.params.scans.len()
                    );
                    return Ok(None);
                }
                Ok(i) => Some(i),
                Err(_) => None,
            };

            self.scan_manager.update(metadata.scan_id);
            if self.scan_manager.observation_complete() {
                return Ok(None);
            }
            let scan_index = match scan_index {
                Some(i) => i,
                // Only reachable with a negative id before any scan started.
                None => {
                    metadata = self.await_scan_start()?;
                    continue;
                }
            };

            self.state = MergeState::Synchronising;
            match self.align(metadata.timestamp, &mut stats)? {
                Alignment::MetadataBehind => {
                    trace!(
                        "Visibilities are ahead of metadata at {}; pulling more metadata",
                        metadata.timestamp
                    );
                    metadata = self.pull_metadata()?;
                }
                a => break (scan_index, a),
            }
        };

        let scan = &self.params.scans[scan_index];
        let mut chunk = self.builder.build(&metadata, scan_index, scan);
        self.deduper.reset();
        stats.expected = self.params.expected_datagram_count(scan);

        if alignment == Alignment::Aligned {
            self.state = MergeState::Accumulating;
            self.drain(&mut chunk, scan_index, &mut stats)?;
        } else {
            debug!("No visibilities arrived for {}", metadata.timestamp);
        }

        self.report_loss(metadata.timestamp, &stats);

        self.state = MergeState::Flagging;
        flag_from_metadata(&mut chunk, &metadata);

        debug!("Integration {}: {:?}", metadata.timestamp, stats);
        self.last_timestamp = Some(metadata.timestamp);
        self.last_stats = Some(stats);
        Ok(Some(chunk))
    }

    fn check_interrupt(&self) -> Result<(), MergeError> {
        if self.interrupt.is_raised() {
            Err(MergeError::Interrupted)
        } else {
            Ok(())
        }
    }

    fn drain_timeout(&self) -> Duration {
        Duration::from_micros(2 * self.params.interval_micros)
    }

    /// Pull the next metadata record, waiting as long as it takes. Records
    /// that don't move time forward are dropped.
    fn pull_metadata(&mut self) -> Result<MetadataRecord, MergeError> {
        let timeout = Duration::from_micros(self.params.metadata_timeout_micros);
        loop {
            self.check_interrupt()?;
            let metadata = match self.metadata_src.next(timeout) {
                Some(m) => m,
                None => {
                    trace!("Still waiting for metadata");
                    continue;
                }
            };
            match self.last_timestamp {
                Some(last) if metadata.timestamp <= last => {
                    warn!(
                        "Discarding metadata at {}; already produced {}",
                        metadata.timestamp, last
                    );
                }
                _ => return Ok(metadata),
            }
        }
    }

    fn await_scan_start(&mut self) -> Result<MetadataRecord, MergeError> {
        self.state = MergeState::AwaitingScanStart;
        loop {
            let metadata = self.pull_metadata()?;
            if metadata.scan_id >= 0 {
                return Ok(metadata);
            }
            debug!(
                "Waiting for a scan to start (metadata at {} has scan id {})",
                metadata.timestamp, metadata.scan_id
            );
        }
    }

    /// Make sure the lookahead datagram belongs to `timestamp`, discarding
    /// older datagrams.
    fn align(&mut self, timestamp: u64, stats: &mut CycleStats) -> Result<Alignment, MergeError> {
        let timeout = self.drain_timeout();
        loop {
            self.check_interrupt()?;
            let vis_timestamp = match &self.lookahead {
                Some(v) => v.timestamp,
                None => match self.vis_src.next(timeout) {
                    Some(v) => {
                        let t = v.timestamp;
                        self.lookahead = Some(v);
                        t
                    }
                    None => return Ok(Alignment::Missing),
                },
            };

            match vis_timestamp.cmp(&timestamp) {
                Ordering::Equal => return Ok(Alignment::Aligned),
                Ordering::Less => {
                    trace!("Dropping stale datagram from {vis_timestamp}");
                    stats.stale += 1;
                    self.lookahead = None;
                }
                Ordering::Greater if self.last_timestamp.is_some() => {
                    // Every datagram of this integration went missing.
                    return Ok(Alignment::Missing);
                }
                Ordering::Greater => return Ok(Alignment::MetadataBehind),
            }
        }
    }

    fn drain(
        &mut self,
        chunk: &mut VisChunk,
        scan_index: usize,
        stats: &mut CycleStats,
    ) -> Result<(), MergeError> {
        let timeout = self.drain_timeout();
        let timestamp = chunk.timestamp;
        while stats.accepted < stats.expected {
            self.check_interrupt()?;
            let vis = match self.lookahead.take() {
                Some(v) => v,
                None => match self.vis_src.next(timeout) {
                    Some(v) => v,
                    None => {
                        trace!("Visibility stream went quiet");
                        break;
                    }
                },
            };

            match vis.timestamp.cmp(&timestamp) {
                Ordering::Less => {
                    trace!("Dropping late datagram from {}", vis.timestamp);
                    stats.stale += 1;
                }
                Ordering::Greater => {
                    self.lookahead = Some(vis);
                    break;
                }
                Ordering::Equal => fold_datagram(
                    &self.params,
                    &self.params.scans[scan_index],
                    &mut self.deduper,
                    chunk,
                    &vis,
                    stats,
                )?,
            }
        }
        Ok(())
    }

    fn report_loss(&mut self, timestamp: u64, stats: &CycleStats) {
        let lost = stats.lost();
        let percent = stats.lost_percent();
        if lost > 0 {
            warn!(
                "Integration {timestamp}: lost {lost} of {} datagrams ({percent:.2}%)",
                stats.expected
            );
        }
        self.telemetry
            .submit(PACKETS_LOST_COUNT, MonitorValue::Int(lost as i64));
        self.telemetry
            .submit(PACKETS_LOST_PERCENT, MonitorValue::Float(percent));
    }
}

/// Write `vis` into `chunk` if it belongs there. Datagrams that can't be
/// placed are counted in `stats`; only indexing inconsistencies are errors.
pub(crate) fn fold_datagram(
    params: &IngestParams,
    scan: &Scan,
    deduper: &mut DatagramDeduper,
    chunk: &mut VisChunk,
    vis: &VisDatagram,
    stats: &mut CycleStats,
) -> Result<(), MergeError> {
    let baseline = match params.baseline_map.get(vis.baseline_id) {
        Some(b) => b,
        None => {
            trace!("Baseline id {} isn't mapped", vis.baseline_id);
            stats.unmapped_baseline += 1;
            return Ok(());
        }
    };
    let beam = match params.beam_map.map_wire(vis.beam_id) {
        Some(b) if b < params.n_beams => b,
        _ => {
            trace!("Beam id {} has no place in the chunk", vis.beam_id);
            stats.rejected_beam += 1;
            return Ok(());
        }
    };
    let pol = match scan.product_index(baseline.product) {
        Some(p) => p,
        None => {
            trace!(
                "Product {} of baseline id {} isn't in this scan",
                baseline.product,
                vis.baseline_id
            );
            stats.unknown_product += 1;
            return Ok(());
        }
    };

    let width = params.channels_per_slice;
    let first_channel = vis.slice as usize * width;
    if vis.vis.len() != width || first_channel + width > chunk.num_channels() {
        warn!(
            "Dropping datagram for slice {} with {} samples; this shard has {} channels in slices of {}",
            vis.slice,
            vis.vis.len(),
            chunk.num_channels(),
            width
        );
        stats.invalid_slice += 1;
        return Ok(());
    }

    if deduper.seen(vis.identity()) {
        trace!("Duplicate datagram {:?}", vis.identity());
        stats.duplicates += 1;
        return Ok(());
    }

    let num_rows = chunk.num_rows();
    let row = row_index(
        beam,
        baseline.antenna1,
        baseline.antenna2,
        params.num_antennas(),
    );
    if row >= num_rows {
        return Err(MergeError::RowOutOfRange { row, num_rows });
    }
    let built_for = (chunk.beam1[row], chunk.antenna1[row], chunk.antenna2[row]);
    let wanted = (beam, baseline.antenna1, baseline.antenna2);
    if built_for != wanted {
        return Err(MergeError::RowMismatch {
            row,
            expected: wanted,
            got: built_for,
        });
    }

    let channels = first_channel..first_channel + width;
    let samples = ArrayView1::from(vis.vis.as_slice());
    chunk
        .visibility
        .slice_mut(s![row, channels.clone(), pol])
        .assign(&samples);
    chunk.flag.slice_mut(s![row, channels.clone(), pol]).fill(false);

    // The correlator doesn't send YX for autos; it's the conjugate of XY.
    if baseline.antenna1 == baseline.antenna2 && baseline.product == PolProduct::XY {
        if let Some(yx) = scan.product_index(PolProduct::YX) {
            chunk
                .visibility
                .slice_mut(s![row, channels.clone(), yx])
                .iter_mut()
                .zip(samples.iter())
                .for_each(|(dst, src)| *dst = src.conj());
            chunk.flag.slice_mut(s![row, channels, yx]).fill(false);
        }
    }

    stats.accepted += 1;
    Ok(())
}

/// Flag every row touching an antenna the metadata says is bad, or the whole
/// chunk if the integration is flagged. Never unflags anything.
fn flag_from_metadata(chunk: &mut VisChunk, metadata: &MetadataRecord) {
    if metadata.flagged {
        chunk.flag.fill(true);
        return;
    }

    for ((mut flags, &ant1), &ant2) in chunk
        .flag
        .outer_iter_mut()
        .zip(chunk.antenna1.iter())
        .zip(chunk.antenna2.iter())
    {
        if metadata.antenna_flagged(ant1) || metadata.antenna_flagged(ant2) {
            flags.fill(true);
        }
    }
}
