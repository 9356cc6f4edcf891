// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Visibility datagrams and their wire format.
//!
//! Every datagram is a fixed-size little-endian record:
//!
//! | offset | type  | field                                  |
//! |--------|-------|----------------------------------------|
//! | 0      | u32   | version (must be [`VIS_DATAGRAM_VERSION`]) |
//! | 4      | u32   | slice index                            |
//! | 8      | u64   | BAT timestamp \[microseconds\]         |
//! | 16     | u32   | baseline id                            |
//! | 20     | u32   | beam id (one-based)                    |
//! | 24     | f32x2 | `channels_per_slice` complex samples   |

mod error;

pub use error::DatagramError;

use std::io::Cursor;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};

use crate::{c32, constants::VIS_DATAGRAM_VERSION, dedup::DatagramIdentity};

/// The number of bytes before the samples.
pub const HEADER_SIZE: usize = 24;

/// The total size of a datagram carrying `channels_per_slice` samples.
pub const fn datagram_size(channels_per_slice: usize) -> usize {
    HEADER_SIZE + channels_per_slice * 2 * std::mem::size_of::<f32>()
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisDatagram {
    /// The start of the integration this data belongs to (BAT)
    /// \[microseconds\].
    pub timestamp: u64,

    /// Which block of `channels_per_slice` channels this is.
    pub slice: u32,

    pub baseline_id: u32,

    /// One-based.
    pub beam_id: u32,

    /// One sample per channel in the slice.
    pub vis: Vec<c32>,
}

impl VisDatagram {
    pub fn identity(&self) -> DatagramIdentity {
        DatagramIdentity {
            baseline_id: self.baseline_id,
            slice: self.slice,
            beam_id: self.beam_id,
        }
    }

    /// Decode a datagram, rejecting anything that isn't exactly the expected
    /// size or doesn't carry the expected version.
    pub fn decode(bytes: &[u8], channels_per_slice: usize) -> Result<VisDatagram, DatagramError> {
        let expected = datagram_size(channels_per_slice);
        if bytes.len() != expected {
            return Err(DatagramError::WrongSize {
                expected,
                got: bytes.len(),
            });
        }

        let mut cursor = Cursor::new(bytes);
        let version = cursor.read_u32::<LittleEndian>()?;
        if version != VIS_DATAGRAM_VERSION {
            return Err(DatagramError::WrongVersion {
                expected: VIS_DATAGRAM_VERSION,
                got: version,
            });
        }
        let slice = cursor.read_u32::<LittleEndian>()?;
        let timestamp = cursor.read_u64::<LittleEndian>()?;
        let baseline_id = cursor.read_u32::<LittleEndian>()?;
        let beam_id = cursor.read_u32::<LittleEndian>()?;

        let mut floats = vec![0.0; channels_per_slice * 2];
        cursor.read_f32_into::<LittleEndian>(&mut floats)?;
        let vis = floats
            .chunks_exact(2)
            .map(|re_im| c32::new(re_im[0], re_im[1]))
            .collect();

        Ok(VisDatagram {
            timestamp,
            slice,
            baseline_id,
            beam_id,
            vis,
        })
    }

    /// Encode this datagram into its wire format. The slice width is the
    /// number of samples carried.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0; datagram_size(self.vis.len())];
        LittleEndian::write_u32(&mut buf[0..4], VIS_DATAGRAM_VERSION);
        LittleEndian::write_u32(&mut buf[4..8], self.slice);
        LittleEndian::write_u64(&mut buf[8..16], self.timestamp);
        LittleEndian::write_u32(&mut buf[16..20], self.baseline_id);
        LittleEndian::write_u32(&mut buf[20..24], self.beam_id);
        let floats: Vec<f32> = self.vis.iter().flat_map(|c| [c.re, c.im]).collect();
        LittleEndian::write_f32_into(&floats, &mut buf[HEADER_SIZE..]);
        buf
    }
}
