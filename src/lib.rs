// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Ingest for a radio interferometer's central processor.
//!
//! Telescope metadata and correlator visibility datagrams arrive on separate
//! streams. The [`MergeEngine`] joins them on timestamp and produces one fully
//! indexed, flagged [`VisChunk`] per integration.

pub mod baseline_map;
pub mod beam_map;
pub mod channels;
pub mod chunk;
mod cli;
pub mod config;
pub mod constants;
pub mod datagram;
pub mod dedup;
pub mod interrupt;
pub mod merge;
pub mod metadata;
pub mod pol;
pub mod scan;
pub mod sim;
pub mod source;
pub mod telemetry;
pub mod time;

#[cfg(test)]
mod tests;

/// Visibilities are single precision on the wire and in chunks.
#[allow(non_camel_case_types)]
pub type c32 = num_complex::Complex<f32>;

// Re-exports.
pub use chunk::{row_index, VisChunk};
pub use cli::{IngestError, VisIngest};
pub use config::{IngestConfig, IngestParams};
pub use datagram::VisDatagram;
pub use interrupt::Interrupt;
pub use merge::{CycleStats, MergeEngine, MergeError};
pub use metadata::MetadataRecord;
