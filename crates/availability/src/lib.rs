//! Per-bin availability: how many connected peers have each chunk,
//! supporting rarest-first selection.
//!
//! This is a thin, transport-agnostic interface: the piece-picker policy
//! and the channels that deliver `HAVE` messages both live outside this
//! crate's scope. What stays in scope is the counting data structure
//! itself, since it needs to track per-peer state precisely enough to
//! undo a peer's contribution on disconnect without rescanning every
//! other peer's binmap.

use std::collections::{HashMap, HashSet};
use swift_bin::Bin;
use swift_binmap::Binmap;

/// Tracks, per chunk, how many known peers have announced having it.
#[derive(Debug, Default)]
pub struct Availability {
    counts: HashMap<u64, u32>,
    peer_chunks: HashMap<u64, HashSet<u64>>,
}

impl Availability {
    /// An empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `channel_id` has announced (via a `HAVE`-style binmap)
    /// the filled chunks under `target`. Only newly-seen chunks for this
    /// peer affect the counts, so repeated announcements are idempotent.
    pub fn set(&mut self, channel_id: u64, binmap: &Binmap, target: Bin) {
        let peer_chunks = self.peer_chunks.entry(channel_id).or_default();
        for offset in target.base_offset()..target.base_offset() + target.base_length() {
            let chunk = Bin::new(0, offset);
            if binmap.is_filled(chunk) && peer_chunks.insert(offset) {
                *self.counts.entry(offset).or_insert(0) += 1;
            }
        }
    }

    /// Forget everything `channel_id` contributed, e.g. on disconnect.
    pub fn remove(&mut self, channel_id: u64) {
        if let Some(chunks) = self.peer_chunks.remove(&channel_id) {
            for offset in chunks {
                if let Some(count) = self.counts.get_mut(&offset) {
                    *count -= 1;
                    if *count == 0 {
                        self.counts.remove(&offset);
                    }
                }
            }
        }
    }

    /// The number of peers known to have `bin`. For a non-base bin this is
    /// the minimum across the chunks it covers — the conservative estimate
    /// of how many peers could serve the whole range.
    pub fn get(&self, bin: Bin) -> u32 {
        (bin.base_offset()..bin.base_offset() + bin.base_length())
            .map(|o| self.counts.get(&o).copied().unwrap_or(0))
            .min()
            .unwrap_or(0)
    }

    /// Find the rarest bin of `width` chunks within `range`, ties broken by
    /// leftmost position. `width` must be a power of two.
    pub fn rarest(&self, range: Bin, width: u64) -> Option<Bin> {
        if width == 0 || width & (width - 1) != 0 {
            return None;
        }
        let layer = width.trailing_zeros();
        let start = range.base_offset();
        let end = start + range.base_length();

        let mut best: Option<(Bin, u32)> = None;
        let mut offset = start;
        while offset < end {
            let candidate = Bin::new(layer, offset / width);
            let count = self.get(candidate);
            if best.map(|(_, best_count)| count < best_count).unwrap_or(true) {
                best = Some((candidate, count));
            }
            offset += width;
        }
        best.map(|(bin, _)| bin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn announce_all(av: &mut Availability, channel: u64, up_to: u64) {
        let mut binmap = Binmap::new();
        for o in 0..up_to {
            binmap.fill(Bin::new(0, o));
        }
        av.set(channel, &binmap, Bin::new(10, 0));
    }

    #[test]
    fn counts_accumulate_across_peers() {
        let mut av = Availability::new();
        announce_all(&mut av, 1, 4);
        announce_all(&mut av, 2, 4);
        assert_eq!(av.get(Bin::new(0, 0)), 2);
        assert_eq!(av.get(Bin::new(0, 10)), 0);
    }

    #[test]
    fn remove_undoes_only_that_peers_contribution() {
        let mut av = Availability::new();
        announce_all(&mut av, 1, 4);
        announce_all(&mut av, 2, 4);
        av.remove(1);
        assert_eq!(av.get(Bin::new(0, 0)), 1);
    }

    #[test]
    fn rarest_prefers_least_available_chunk() {
        let mut av = Availability::new();
        let mut binmap = Binmap::new();
        binmap.fill(Bin::new(0, 0));
        binmap.fill(Bin::new(0, 1));
        av.set(1, &binmap, Bin::new(4, 0));

        let mut binmap2 = Binmap::new();
        binmap2.fill(Bin::new(0, 0));
        av.set(2, &binmap2, Bin::new(4, 0));

        // chunk 0: 2 peers, chunk 1: 1 peer, chunks 2,3: 0 peers.
        let rarest = av.rarest(Bin::new(4, 0), 1).unwrap();
        assert!(rarest == Bin::new(0, 2) || rarest == Bin::new(0, 3));
    }
}
