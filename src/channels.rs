// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Which part of the band each ingest process (rank) is responsible for.
//!
//! Ranks own contiguous channel ranges in rank order; rank 0 starts at the
//! scan's first channel.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelManager {
    channels_per_rank: Vec<usize>,
}

impl ChannelManager {
    pub fn new(channels_per_rank: Vec<usize>) -> ChannelManager {
        ChannelManager { channels_per_rank }
    }

    pub fn num_ranks(&self) -> usize {
        self.channels_per_rank.len()
    }

    /// The number of channels handled by `rank`, or `None` if there's no such
    /// rank.
    pub fn local_channel_count(&self, rank: usize) -> Option<usize> {
        self.channels_per_rank.get(rank).copied()
    }

    /// The index of `rank`'s first channel within the full band.
    pub fn channel_offset(&self, rank: usize) -> Option<usize> {
        if rank >= self.channels_per_rank.len() {
            return None;
        }
        Some(self.channels_per_rank[..rank].iter().sum())
    }

    /// The total number of channels over all ranks.
    pub fn total_channels(&self) -> usize {
        self.channels_per_rank.iter().sum()
    }

    /// The frequencies of `rank`'s channels \[Hz\], given the frequency of the
    /// band's first channel and the channel width.
    pub fn local_frequencies(
        &self,
        rank: usize,
        start_freq_hz: f64,
        channel_width_hz: f64,
    ) -> Option<Vec<f64>> {
        let offset = self.channel_offset(rank)?;
        let count = self.local_channel_count(rank)?;
        Some(
            (offset..offset + count)
                .map(|i_chan| start_freq_hz + i_chan as f64 * channel_width_hz)
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_counts_and_offsets() {
        let cm = ChannelManager::new(vec![216, 432, 216]);
        assert_eq!(cm.num_ranks(), 3);
        assert_eq!(cm.total_channels(), 864);
        assert_eq!(cm.local_channel_count(1), Some(432));
        assert_eq!(cm.channel_offset(0), Some(0));
        assert_eq!(cm.channel_offset(1), Some(216));
        assert_eq!(cm.channel_offset(2), Some(648));
        assert_eq!(cm.local_channel_count(3), None);
        assert_eq!(cm.channel_offset(3), None);
    }

    #[test]
    fn test_local_frequencies() {
        let cm = ChannelManager::new(vec![4, 4]);
        let freqs = cm.local_frequencies(1, 1.0e9, 1.0e6).unwrap();
        assert_eq!(freqs.len(), 4);
        assert_abs_diff_eq!(freqs[0], 1.004e9);
        assert_abs_diff_eq!(freqs[3], 1.007e9);
        for w in freqs.windows(2) {
            assert_abs_diff_eq!(w[1] - w[0], 1.0e6, epsilon = 1e-6);
        }

        assert!(cm.local_frequencies(2, 1.0e9, 1.0e6).is_none());
    }
}
