//! Channel pair selection.

use serde::Serialize;
use std::fmt;

/// Unordered pair of channels `(a, b)` with `a < b`, tagged with the index of
/// the recording they come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ChannelPair {
    /// Index of the source recording.
    pub source: usize,
    /// Lower channel index.
    pub a: usize,
    /// Higher channel index.
    pub b: usize,
}

impl ChannelPair {
    /// Create a pair, ordering the channel indices. Returns `None` when both
    /// indices are the same channel.
    pub fn new(source: usize, x: usize, y: usize) -> Option<Self> {
        match x.cmp(&y) {
            std::cmp::Ordering::Less => Some(Self { source, a: x, b: y }),
            std::cmp::Ordering::Greater => Some(Self { source, a: y, b: x }),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Short label such as `ch0-ch2`.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ChannelPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}-ch{}", self.a, self.b)
    }
}

/// Every two-channel combination of a recording, in lexicographic order.
pub fn channel_pairs(source: usize, num_channels: usize) -> Vec<ChannelPair> {
    (0..num_channels)
        .flat_map(|a| ((a + 1)..num_channels).map(move |b| ChannelPair { source, a, b }))
        .collect()
}

/// Channel pairs of several recordings, concatenated in recording order.
pub fn pairs_for_sources(channel_counts: &[usize]) -> Vec<ChannelPair> {
    channel_counts
        .iter()
        .enumerate()
        .flat_map(|(source, &n)| channel_pairs(source, n))
        .collect()
}
