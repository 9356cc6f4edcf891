// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Rejection of datagrams seen more than once in an integration.

use std::collections::HashSet;

/// What makes a visibility datagram unique within an integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DatagramIdentity {
    pub baseline_id: u32,
    pub slice: u32,
    pub beam_id: u32,
}

#[derive(Debug, Default)]
pub struct DatagramDeduper {
    seen: HashSet<DatagramIdentity>,
}

impl DatagramDeduper {
    pub fn new() -> DatagramDeduper {
        DatagramDeduper::default()
    }

    /// Record `identity`, returning whether it had already been recorded.
    pub fn seen(&mut self, identity: DatagramIdentity) -> bool {
        !self.seen.insert(identity)
    }

    /// Forget everything; called at the start of every integration. The
    /// allocation is kept.
    pub fn reset(&mut self) {
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
