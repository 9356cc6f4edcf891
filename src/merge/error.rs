// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("Ingest was interrupted")]
    Interrupted,

    #[error("Computed row {row}, but the chunk only has {num_rows} rows. This is a bug.")]
    RowOutOfRange { row: usize, num_rows: usize },

    #[error("Row {row} should hold (beam, antenna1, antenna2) = {expected:?}, but it was built for {got:?}. This is a bug.")]
    RowMismatch {
        row: usize,
        expected: (usize, usize, usize),
        got: (usize, usize, usize),
    },
}
