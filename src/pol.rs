// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Correlation (polarisation) products.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

/// One of the correlation products formed for each baseline. The declaration
/// order is the canonical order used in chunks.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum PolProduct {
    XX,
    XY,
    YX,
    YY,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PolProductError {
    #[error("No correlation products were specified")]
    Empty,

    #[error("The correlation product {0} was specified more than once")]
    Duplicate(PolProduct),

    #[error("Unsupported set of correlation products: {0:?}; supported sets are [XX], [XX, YY] and [XX, XY, YX, YY]")]
    Unsupported(Vec<PolProduct>),
}

/// Put a scan's configured products into canonical order, checking that the
/// set is one a chunk can hold.
pub fn canonical_products(products: &[PolProduct]) -> Result<Vec<PolProduct>, PolProductError> {
    use PolProduct::*;

    if products.is_empty() {
        return Err(PolProductError::Empty);
    }
    let mut sorted = products.to_vec();
    sorted.sort_unstable();
    if let Some(dup) = sorted.windows(2).find(|w| w[0] == w[1]) {
        return Err(PolProductError::Duplicate(dup[0]));
    }

    match sorted.as_slice() {
        [XX] | [XX, YY] | [XX, XY, YX, YY] => Ok(sorted),
        _ => Err(PolProductError::Unsupported(sorted)),
    }
}
