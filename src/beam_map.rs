// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Translation of correlator beam indices into chunk beam indices.
//!
//! Rules are written as a comma-separated list of `source:target` pairs, e.g.
//! "0:1, 1:0, 5:-1". Indices without a rule pass through unchanged, and a
//! negative target means "drop this beam".

use std::collections::HashMap;
use std::str::FromStr;

use itertools::Itertools;
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeamMap {
    rules: HashMap<u32, i64>,
}

impl BeamMap {
    /// Parse a rule string. An empty (or all-whitespace) string gives the
    /// identity map.
    pub fn parse(rules: &str) -> Result<BeamMap, BeamMapError> {
        let mut map = HashMap::new();
        for rule in rules.split(',').map(str::trim).filter(|r| !r.is_empty()) {
            let (src, dst) = rule
                .split_once(':')
                .ok_or_else(|| BeamMapError::MissingColon(rule.to_string()))?;
            let src = u32::from_str(src.trim()).map_err(|_| BeamMapError::BadIndex {
                rule: rule.to_string(),
                index: src.trim().to_string(),
            })?;
            let dst = i64::from_str(dst.trim()).map_err(|_| BeamMapError::BadIndex {
                rule: rule.to_string(),
                index: dst.trim().to_string(),
            })?;
            if map.insert(src, dst).is_some() {
                return Err(BeamMapError::DuplicateSource(src));
            }
        }

        // No two beams may land on the same target. A target that isn't itself
        // a source is also claimed by its own index passing through.
        let mut claimed: HashMap<i64, u32> = HashMap::new();
        for (&src, &dst) in map.iter().filter(|(_, &dst)| dst >= 0).sorted() {
            let pass_through = u32::try_from(dst)
                .ok()
                .filter(|&d| d != src && !map.contains_key(&d));
            if let Some(other) = claimed.insert(dst, src).or(pass_through) {
                return Err(BeamMapError::TargetCollision {
                    target: dst,
                    first: other.min(src),
                    second: other.max(src),
                });
            }
        }

        Ok(BeamMap { rules: map })
    }

    /// Translate a zero-based beam index. `None` means the beam is dropped.
    pub fn map(&self, beam: u32) -> Option<usize> {
        match self.rules.get(&beam) {
            Some(&target) if target < 0 => None,
            Some(&target) => Some(target as usize),
            None => Some(beam as usize),
        }
    }

    /// Translate a one-based beam id as it appears on the wire. Beam id 0 is
    /// never valid.
    pub fn map_wire(&self, wire_beam_id: u32) -> Option<usize> {
        wire_beam_id.checked_sub(1).and_then(|b| self.map(b))
    }

    pub fn is_identity(&self) -> bool {
        self.rules.iter().all(|(&src, &dst)| i64::from(src) == dst)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BeamMapError {
    #[error("Beam map rule '{0}' is not of the form 'source:target'")]
    MissingColon(String),

    #[error("Beam map rule '{rule}' contains an invalid index '{index}'")]
    BadIndex { rule: String, index: String },

    #[error("Beam index {0} appears as a source in more than one beam map rule")]
    DuplicateSource(u32),

    #[error("Beam indices {first} and {second} would both be mapped to beam {target}")]
    TargetCollision { target: i64, first: u32, second: u32 },
}
