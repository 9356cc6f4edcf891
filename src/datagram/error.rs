// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from decoding visibility datagrams.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatagramError {
    #[error("Visibility datagram was {got} bytes long, but {expected} bytes were expected")]
    WrongSize { expected: usize, got: usize },

    #[error("Visibility datagram has version {got}, but version {expected} was expected")]
    WrongVersion { expected: u32, got: u32 },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
