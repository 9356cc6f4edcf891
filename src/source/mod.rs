// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Where metadata and visibilities come from.
//!
//! Both kinds of source have the same contract: `next` blocks for at most
//! `timeout` and returns `None` if nothing (valid) arrived in that time. A
//! `None` is never an error.

mod error;
mod udp;

pub use error::SourceError;
pub use udp::{UdpMetadataSource, UdpVisSource};

use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};

use crate::{datagram::VisDatagram, metadata::MetadataRecord};

pub trait MetadataSource: Send {
    fn next(&mut self, timeout: Duration) -> Option<MetadataRecord>;
}

pub trait VisSource: Send {
    fn next(&mut self, timeout: Duration) -> Option<VisDatagram>;
}

/// A source backed by an in-process channel. Records are delivered in the
/// order they were sent.
#[derive(Debug)]
pub struct QueueSource<T> {
    rx: Receiver<T>,
}

impl<T> QueueSource<T> {
    pub fn new(rx: Receiver<T>) -> QueueSource<T> {
        QueueSource { rx }
    }

    /// Make a source and the handle used to feed it.
    pub fn channel() -> (Sender<T>, QueueSource<T>) {
        let (tx, rx) = unbounded();
        (tx, QueueSource { rx })
    }

    /// A source pre-loaded with `items`. Once they've all been taken, `next`
    /// returns `None` immediately.
    pub fn from_items<I: IntoIterator<Item = T>>(items: I) -> QueueSource<T> {
        let (tx, rx) = unbounded();
        for item in items {
            // The receiver is alive, so this can't fail.
            let _ = tx.send(item);
        }
        QueueSource { rx }
    }

    fn recv(&self, timeout: Duration) -> Option<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(item) => Some(item),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl MetadataSource for QueueSource<MetadataRecord> {
    fn next(&mut self, timeout: Duration) -> Option<MetadataRecord> {
        self.recv(timeout)
    }
}

impl VisSource for QueueSource<VisDatagram> {
    fn next(&mut self, timeout: Duration) -> Option<VisDatagram> {
        self.recv(timeout)
    }
}
