// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helper functions around time.
//!
//! The instrument's absolute time (BAT) is an integer number of microseconds
//! since MJD 0 (TAI). BAT values are big enough that converting them to `f64`
//! before splitting off whole days throws away sub-microsecond (and, for
//! derived quantities, sub-millisecond) precision, so all arithmetic here is
//! done on integers first.

use hifitime::{Duration, Epoch, Unit};

use crate::constants::{MICROS_PER_DAY, MICROS_PER_SECOND};

/// The midpoint of an integration that starts at `start_bat` and lasts
/// `interval_micros`.
pub fn integration_midpoint(start_bat: u64, interval_micros: u64) -> u64 {
    start_bat + interval_micros / 2
}

/// A BAT split into whole days and a fraction of a day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayTime {
    /// Whole days since MJD 0.
    pub day: u64,

    /// The fraction of `day` elapsed, in [0, 1).
    pub day_fraction: f64,
}

impl DayTime {
    pub fn from_bat(bat: u64) -> DayTime {
        DayTime {
            day: bat / MICROS_PER_DAY,
            day_fraction: (bat % MICROS_PER_DAY) as f64 / MICROS_PER_DAY as f64,
        }
    }

    /// Go back to integer microseconds. Exact for anything made by
    /// [`DayTime::from_bat`].
    pub fn to_bat(self) -> u64 {
        self.day * MICROS_PER_DAY + (self.day_fraction * MICROS_PER_DAY as f64).round() as u64
    }

    /// The MJD as a single float. Only use this for display.
    pub fn mjd(self) -> f64 {
        self.day as f64 + self.day_fraction
    }

    pub fn to_epoch(self) -> Epoch {
        // Whole days are exactly representable, so only the fraction goes
        // through a float.
        Epoch::from_mjd_tai(self.day as f64)
            + Duration::from_f64(self.day_fraction * MICROS_PER_DAY as f64, Unit::Microsecond)
    }
}

/// Convert a duration in microseconds to seconds.
pub fn micros_to_seconds(micros: u64) -> f64 {
    (micros / MICROS_PER_SECOND) as f64
        + (micros % MICROS_PER_SECOND) as f64 / MICROS_PER_SECOND as f64
}
