// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The merge engine's product: all of one integration's visibilities for this
//! rank, indexed by (row, channel, product).
//!
//! Rows enumerate (beam, antenna1, antenna2) with antenna1 <= antenna2; beam is
//! outermost, antenna2 innermost. The row of any triple is given by
//! [`row_index`], so datagrams can be applied in any order.

mod builder;

pub use builder::ChunkBuilder;

use hifitime::Epoch;
use ndarray::prelude::*;

use crate::{c32, pol::PolProduct, time::DayTime};

/// A sky direction \[radians\].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Direction {
    pub ra: f64,
    pub dec: f64,
}

impl Direction {
    pub fn from_degrees(ra: f64, dec: f64) -> Direction {
        Direction {
            ra: ra.to_radians(),
            dec: dec.to_radians(),
        }
    }
}

/// The row holding (`beam`, `antenna1`, `antenna2`). `antenna1` must not be
/// bigger than `antenna2`, and both must be less than `num_antennas`.
#[inline]
pub fn row_index(beam: usize, antenna1: usize, antenna2: usize, num_antennas: usize) -> usize {
    debug_assert!(antenna1 <= antenna2);
    let num_baselines = num_antennas * (num_antennas + 1) / 2;
    // The number of rows belonging to antenna1 values less than this one.
    let antenna1_offset = antenna1 * (2 * num_antennas - antenna1 + 1) / 2;
    beam * num_baselines + antenna1_offset + (antenna2 - antenna1)
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisChunk {
    /// The start of the integration (BAT) \[microseconds\].
    pub timestamp: u64,

    /// The middle of the integration.
    pub time: DayTime,

    /// The middle of the integration.
    pub epoch: Epoch,

    /// \[seconds\]
    pub interval: f64,

    /// The index of the scan this integration belongs to.
    pub scan: usize,

    pub target_name: String,

    /// \[Hz\]
    pub channel_width: f64,

    /// One per channel \[Hz\].
    pub frequency: Vec<f64>,

    /// The correlation products along the third axis, in canonical order.
    pub stokes: Vec<PolProduct>,

    pub antenna1: Vec<usize>,
    pub antenna2: Vec<usize>,
    pub beam1: Vec<usize>,
    pub beam2: Vec<usize>,

    /// The pointing of each row's beam.
    pub phase_centre: Vec<Direction>,

    /// Dimensions are (row, channel, product).
    pub visibility: Array3<c32>,

    /// `true` means the corresponding visibility is invalid. Dimensions match
    /// `visibility`.
    pub flag: Array3<bool>,
}

impl VisChunk {
    pub fn num_rows(&self) -> usize {
        self.visibility.len_of(Axis(0))
    }

    pub fn num_channels(&self) -> usize {
        self.visibility.len_of(Axis(1))
    }

    pub fn num_pols(&self) -> usize {
        self.visibility.len_of(Axis(2))
    }

    pub fn num_flagged(&self) -> usize {
        self.flag.iter().filter(|&&f| f).count()
    }

    /// The fraction of samples that are flagged, in [0, 1].
    pub fn flagged_fraction(&self) -> f64 {
        if self.flag.is_empty() {
            return 0.0;
        }
        self.num_flagged() as f64 / self.flag.len() as f64
    }
}
