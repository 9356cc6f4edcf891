// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Lookup from the correlator's wire baseline ids to antenna pairs and
//! correlation products.
//!
//! An id without an entry is not an error; callers are expected to drop the
//! datagram that carried it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pol::PolProduct;

/// A single configured baseline-map entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineEntry {
    pub id: u32,
    pub antenna1: usize,
    pub antenna2: usize,
    pub product: PolProduct,
}

/// What a baseline id resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Baseline {
    pub antenna1: usize,
    pub antenna2: usize,
    pub product: PolProduct,
}

#[derive(Debug, Clone, Default)]
pub struct BaselineMap {
    /// Insertion order is preserved so that iteration matches the configured
    /// order.
    map: IndexMap<u32, Baseline>,
}

impl BaselineMap {
    pub fn new<I>(entries: I) -> Result<BaselineMap, BaselineMapError>
    where
        I: IntoIterator<Item = BaselineEntry>,
    {
        let mut map = IndexMap::new();
        for entry in entries {
            if entry.antenna1 > entry.antenna2 {
                return Err(BaselineMapError::UnorderedAntennas {
                    id: entry.id,
                    antenna1: entry.antenna1,
                    antenna2: entry.antenna2,
                });
            }
            let baseline = Baseline {
                antenna1: entry.antenna1,
                antenna2: entry.antenna2,
                product: entry.product,
            };
            if map.insert(entry.id, baseline).is_some() {
                return Err(BaselineMapError::DuplicateId(entry.id));
            }
        }

        Ok(BaselineMap { map })
    }

    /// Generate the map the correlator uses when none is configured. Ids
    /// start at 1 and are assigned with antenna1 outermost, then antenna2
    /// (>= antenna1), then product in the order given. The correlator doesn't
    /// send YX for auto-correlations, so it gets no id.
    pub fn standard(num_antennas: usize, products: &[PolProduct]) -> BaselineMap {
        let mut map = IndexMap::new();
        let mut id = 1;
        for antenna1 in 0..num_antennas {
            for antenna2 in antenna1..num_antennas {
                for &product in products {
                    if antenna1 == antenna2 && product == PolProduct::YX {
                        continue;
                    }
                    map.insert(
                        id,
                        Baseline {
                            antenna1,
                            antenna2,
                            product,
                        },
                    );
                    id += 1;
                }
            }
        }

        BaselineMap { map }
    }

    pub fn get(&self, id: u32) -> Option<Baseline> {
        self.map.get(&id).copied()
    }

    pub fn antenna1(&self, id: u32) -> Option<usize> {
        self.get(id).map(|b| b.antenna1)
    }

    pub fn antenna2(&self, id: u32) -> Option<usize> {
        self.get(id).map(|b| b.antenna2)
    }

    pub fn product(&self, id: u32) -> Option<PolProduct> {
        self.get(id).map(|b| b.product)
    }

    /// The number of ids with an entry.
    pub fn size(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, Baseline)> + '_ {
        self.map.iter().map(|(&id, &b)| (id, b))
    }

    /// The biggest antenna index referenced by any entry.
    pub fn max_antenna_index(&self) -> Option<usize> {
        self.map.values().map(|b| b.antenna2).max()
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BaselineMapError {
    #[error("Baseline id {0} appears more than once in the baseline map")]
    DuplicateId(u32),

    #[error("Baseline id {id} has antenna1 ({antenna1}) greater than antenna2 ({antenna2})")]
    UnorderedAntennas {
        id: u32,
        antenna1: usize,
        antenna2: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pol::PolProduct::*;

    #[test]
    fn test_standard_map() {
        let map = BaselineMap::standard(3, &[XX, XY, YX, YY]);
        // 6 baselines * 4 products, less one YX for each of the 3 autos.
        assert_eq!(map.size(), 21);

        assert_eq!(
            map.get(1),
            Some(Baseline {
                antenna1: 0,
                antenna2: 0,
                product: XX
            })
        );
        assert_eq!(map.product(2), Some(XY));
        // Id 3 skips the auto YX.
        assert_eq!(map.product(3), Some(YY));
        assert_eq!(map.antenna1(4), Some(0));
        assert_eq!(map.antenna2(4), Some(1));
        assert_eq!(map.product(4), Some(XX));

        let last = map.get(21).unwrap();
        assert_eq!((last.antenna1, last.antenna2, last.product), (2, 2, YY));
        assert_eq!(map.max_antenna_index(), Some(2));
    }

    #[test]
    fn test_unmapped_ids() {
        let map = BaselineMap::standard(2, &[XX, YY]);
        assert_eq!(map.get(0), None);
        assert_eq!(map.antenna1(1000), None);
        assert_eq!(map.antenna2(1000), None);
        assert_eq!(map.product(1000), None);
    }

    #[test]
    fn test_explicit_map() {
        let map = BaselineMap::new([
            BaselineEntry {
                id: 7,
                antenna1: 0,
                antenna2: 1,
                product: XX,
            },
            BaselineEntry {
                id: 3,
                antenna1: 1,
                antenna2: 1,
                product: YY,
            },
        ])
        .unwrap();
        assert_eq!(map.size(), 2);
        assert_eq!(map.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![7, 3]);
        assert_eq!(map.antenna2(7), Some(1));

        let result = BaselineMap::new([
            BaselineEntry {
                id: 1,
                antenna1: 0,
                antenna2: 1,
                product: XX,
            },
            BaselineEntry {
                id: 1,
                antenna1: 0,
                antenna2: 0,
                product: XX,
            },
        ]);
        assert_eq!(result.unwrap_err(), BaselineMapError::DuplicateId(1));

        let result = BaselineMap::new([BaselineEntry {
            id: 1,
            antenna1: 2,
            antenna2: 1,
            product: XX,
        }]);
        assert!(matches!(
            result,
            Err(BaselineMapError::UnorderedAntennas { id: 1, .. })
        ));
    }
}
