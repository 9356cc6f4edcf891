// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

Timestamps are always integer microseconds of the instrument's absolute clock
(BAT). Anything that needs to be a float is converted as late as possible.
 */

/// The version field every visibility datagram must carry.
pub const VIS_DATAGRAM_VERSION: u32 = 1;

/// The number of fine channels carried by a single visibility datagram, unless
/// configured otherwise.
pub const DEFAULT_CHANNELS_PER_SLICE: usize = 216;

/// The nominal correlator integration interval \[microseconds\].
pub const DEFAULT_INTERVAL_MICROS: u64 = 5_000_000;

/// How long a single metadata pull may block before the engine checks for
/// interruption and tries again \[microseconds\].
pub const DEFAULT_METADATA_TIMEOUT_MICROS: u64 = 1_000_000;

pub const MICROS_PER_SECOND: u64 = 1_000_000;
pub const MICROS_PER_DAY: u64 = 86_400 * MICROS_PER_SECOND;

/// Telemetry point carrying the number of datagrams not received in the last
/// integration.
pub const PACKETS_LOST_COUNT: &str = "PacketsLostCount";

/// Telemetry point carrying the percentage of datagrams not received in the
/// last integration.
pub const PACKETS_LOST_PERCENT: &str = "PacketsLostPercent";
