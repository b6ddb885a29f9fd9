//! The live (unified) Merkle tree: a hash tree for an unbounded stream,
//! whose peaks move forward as new data arrives and are periodically signed
//! by the source so clients can verify data before a fixed root ever
//! exists (there is no fixed root — a live stream never completes).
//!
//! Unlike [`swift-static-tree`](../swift_static_tree/index.html), which
//! preallocates one hash slot per bin up front, this tree grows node by
//! node as data is produced. Nodes live in an arena addressed by `u32`
//! index rather than behind pointers, so the tree can be pruned (old nodes
//! freed) without juggling lifetimes.
//!
//! A tree is either a *source* (has a signing key, calls [`LiveTree::add_data`]
//! as new content is produced) or a *client* (has only a verifying key,
//! calls [`LiveTree::offer_signed_peak_hash`] and [`LiveTree::offer_data`]
//! as it arrives over the wire).

use swift_bin::Bin;
use swift_binmap::Binmap;
use swift_hash::{Hash, HASH_SIZE};
use swift_signing::{KeyPair, Signature};
use swift_storage::{ContentStorage, StorageError};

/// The number of chunks the source guesses are covered by each signature,
/// before any signed peak has actually been observed. Purging (discarding
/// old tree nodes) uses this as a safe lower bound on how far back
/// unsigned data might still be needed.
pub const DEFAULT_CHUNKS_PER_SIGNATURE: u64 = 64;

#[derive(Debug, thiserror::Error)]
pub enum LiveTreeError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiveTreeState {
    /// Source, nothing produced yet.
    SignEmpty,
    /// Source, has produced data.
    SignData,
    /// Client, hasn't received a signed peak yet: nothing can be verified.
    VerAwaitPeak,
    /// Client, has at least one signed peak: can verify incoming data.
    VerAwaitData,
}

struct NodeSlot {
    parent: Option<u32>,
    left: Option<u32>,
    right: Option<u32>,
    bin: Bin,
    hash: Hash,
    verified: bool,
}

impl NodeSlot {
    fn new(bin: Bin) -> Self {
        NodeSlot {
            parent: None,
            left: None,
            right: None,
            bin,
            hash: Hash::ZERO,
            verified: false,
        }
    }
}

pub struct LiveTree {
    storage: Box<dyn ContentStorage>,
    keypair: Box<dyn KeyPair>,
    state: LiveTreeState,

    arena: Vec<NodeSlot>,
    free: Vec<u32>,
    root: Option<u32>,
    /// Source only: the rightmost leaf produced so far, where the next
    /// `AddData` attaches.
    addcursor: Option<u32>,

    chunk_size: u32,
    size: u64,
    sizec: u64,
    completec: u64,

    /// The current contiguous peak decomposition of everything produced
    /// (source) or signed-and-accepted (client) so far, left to right.
    peaks: Vec<Bin>,
    /// Source only: the peaks as of the last `UpdateSignedPeaks` call,
    /// paired with the signature already issued for each.
    signed_peaks: Vec<(Bin, Signature)>,
    /// Client only: a peak hash received via `OfferHash` before its
    /// signature arrived, held until `OfferSignedPeakHash` confirms it.
    cand_peak: Option<(Bin, Hash)>,

    ack_out: Binmap,
    guessed_chunks_per_sig: u64,
}

impl LiveTree {
    /// A fresh tree for a source about to start producing a live stream.
    pub fn new_source(
        storage: Box<dyn ContentStorage>,
        keypair: Box<dyn KeyPair>,
        chunk_size: u32,
    ) -> Self {
        Self::new(storage, keypair, chunk_size, LiveTreeState::SignEmpty)
    }

    /// A fresh tree for a client about to receive a live stream, verifying
    /// against `keypair`'s public key.
    pub fn new_client(
        storage: Box<dyn ContentStorage>,
        keypair: Box<dyn KeyPair>,
        chunk_size: u32,
    ) -> Self {
        Self::new(storage, keypair, chunk_size, LiveTreeState::VerAwaitPeak)
    }

    fn new(
        storage: Box<dyn ContentStorage>,
        keypair: Box<dyn KeyPair>,
        chunk_size: u32,
        state: LiveTreeState,
    ) -> Self {
        LiveTree {
            storage,
            keypair,
            state,
            arena: Vec::new(),
            free: Vec::new(),
            root: None,
            addcursor: None,
            chunk_size,
            size: 0,
            sizec: 0,
            completec: 0,
            peaks: Vec::new(),
            signed_peaks: Vec::new(),
            cand_peak: None,
            ack_out: Binmap::new(),
            guessed_chunks_per_sig: DEFAULT_CHUNKS_PER_SIGNATURE,
        }
    }

    fn alloc_node(&mut self, bin: Bin) -> u32 {
        if let Some(idx) = self.free.pop() {
            self.arena[idx as usize] = NodeSlot::new(bin);
            idx
        } else {
            self.arena.push(NodeSlot::new(bin));
            (self.arena.len() - 1) as u32
        }
    }

    fn free_subtree(&mut self, idx: u32) {
        let (left, right) = (self.arena[idx as usize].left, self.arena[idx as usize].right);
        if let Some(l) = left {
            self.free_subtree(l);
        }
        if let Some(r) = right {
            self.free_subtree(r);
        }
        self.free.push(idx);
    }

    fn find_node(&self, pos: Bin) -> Option<u32> {
        let mut iter = self.root?;
        loop {
            let node = &self.arena[iter as usize];
            if pos.to_raw() == node.bin.to_raw() {
                return Some(iter);
            } else if pos.to_raw() < node.bin.to_raw() {
                iter = node.left?;
            } else {
                iter = node.right?;
            }
        }
    }

    fn signing_payload(bin: Bin, hash: Hash) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8 + HASH_SIZE);
        buf.extend_from_slice(&bin.to_u64().to_le_bytes());
        buf.extend_from_slice(hash.as_bytes());
        buf
    }

    /// The peak bin covering `pos`, or [`Bin::NONE`] if none is known yet.
    pub fn peak_for(&self, pos: Bin) -> Bin {
        self.peaks
            .iter()
            .copied()
            .find(|peak| *peak == pos || peak.contains(pos))
            .unwrap_or(Bin::NONE)
    }

    /// The root hash derivable from the current peaks. A live tree has no
    /// fixed root to compare against — this is only meaningful as "the root
    /// as of right now", useful for logging/diagnostics.
    pub fn derive_root(&self) -> Hash {
        let Some((&last, rest)) = self.peaks.split_last() else {
            return Hash::ZERO;
        };
        let mut bin = last;
        let mut hash = self.hash_at(last);
        for &next in rest.iter().rev() {
            while bin.layer() < next.layer() {
                hash = Hash::of_pair(&hash, &Hash::ZERO);
                bin = bin.parent();
            }
            let left_hash = self.hash_at(next);
            hash = Hash::of_pair(&left_hash, &hash);
            bin = next.parent();
        }
        hash
    }

    fn hash_at(&self, bin: Bin) -> Hash {
        self.find_node(bin).map(|idx| self.arena[idx as usize].hash).unwrap_or(Hash::ZERO)
    }

    /// How many chunks per signature the source seems to be using, guessed
    /// from the narrowest signed peak seen so far. Used to decide how much
    /// tree to keep when pruning: never purge closer than this to the live
    /// edge, since an unsigned tail may still need to fold up to a not-yet-
    /// issued signature.
    pub fn guessed_chunks_per_signature(&self) -> u64 {
        self.guessed_chunks_per_sig
    }

    /// The number of chunks produced (source) or accepted (client) so far.
    pub fn chunks_complete(&self) -> u64 {
        self.completec
    }

    /// Bytes produced/accepted so far.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// A live stream has no fixed end, so completeness is undefined; this
    /// always reports `false`, matching the upstream stub for the same
    /// reason. Use [`LiveTree::chunks_complete`] to measure progress.
    pub fn is_complete(&self) -> bool {
        false
    }

    // ---- source side ----

    /// Append one chunk of freshly produced data, extending the tree and
    /// its regular peak decomposition. Returns the bin the chunk was
    /// assigned.
    pub fn add_data(&mut self, data: &[u8]) -> Result<Bin, LiveTreeError> {
        let hash = Hash::of_data(data);
        let idx = self.create_next();
        self.arena[idx as usize].hash = hash;
        self.arena[idx as usize].verified = true;
        let bin = self.arena[idx as usize].bin;

        let offset = bin.base_offset() * u64::from(self.chunk_size);
        self.storage.write_at(offset, data)?;
        self.ack_out.fill(bin);

        self.size += data.len() as u64;
        self.sizec += 1;
        self.completec += 1;
        self.peaks = swift_bin::gen_peaks(self.sizec);
        self.state = LiveTreeState::SignData;

        Ok(bin)
    }

    fn create_next(&mut self) -> u32 {
        let Some(cursor) = self.addcursor else {
            let idx = self.alloc_node(Bin::new(0, 0));
            self.root = Some(idx);
            self.addcursor = Some(idx);
            return idx;
        };

        let cursor_bin = self.arena[cursor as usize].bin;
        if cursor_bin.is_left() {
            let newright = self.alloc_node(cursor_bin.sibling());
            let par = match self.arena[cursor as usize].parent {
                Some(p) => p,
                None => {
                    let p = self.alloc_node(Bin::new(cursor_bin.layer() + 1, 0));
                    self.root = Some(p);
                    p
                }
            };
            self.arena[par as usize].left = Some(cursor);
            self.arena[par as usize].right = Some(newright);
            self.arena[cursor as usize].parent = Some(par);
            self.arena[newright as usize].parent = Some(par);
            self.addcursor = Some(newright);
            return newright;
        }

        // Cursor is a right child: walk up until a spot for a new right
        // subtree opens up, growing the root along the way if needed.
        let mut iter = cursor;
        loop {
            iter = self.arena[iter as usize]
                .parent
                .expect("a right child always has a parent");

            if Some(iter) == self.root {
                let new_layer = self.arena[iter as usize].bin.layer() + 1;
                let new_root = self.alloc_node(Bin::new(new_layer, 0));
                self.arena[new_root as usize].left = Some(iter);
                self.arena[iter as usize].parent = Some(new_root);
                self.root = Some(new_root);
                iter = new_root;
            }

            if self.arena[iter as usize].right.is_none() {
                let new_right_bin = self.arena[iter as usize].bin.right();
                let new_right = self.alloc_node(new_right_bin);
                self.arena[iter as usize].right = Some(new_right);
                self.arena[new_right as usize].parent = Some(iter);

                let depth = self.arena[iter as usize].bin.layer().saturating_sub(1);
                let mut cur = new_right;
                for _ in 0..depth {
                    let left_bin = self.arena[cur as usize].bin.left();
                    let new_left = self.alloc_node(left_bin);
                    self.arena[cur as usize].left = Some(new_left);
                    self.arena[new_left as usize].parent = Some(cur);
                    cur = new_left;
                }
                self.addcursor = Some(cur);
                return cur;
            }
        }
    }

    fn compute_tree(&mut self, idx: u32) {
        if self.arena[idx as usize].verified {
            return;
        }
        let left = self.arena[idx as usize]
            .left
            .expect("a peak's subtree is always complete by the time it's signed");
        let right = self.arena[idx as usize]
            .right
            .expect("a peak's subtree is always complete by the time it's signed");
        self.compute_tree(left);
        self.compute_tree(right);
        let combined = Hash::of_pair(&self.arena[left as usize].hash, &self.arena[right as usize].hash);
        self.arena[idx as usize].hash = combined;
        self.arena[idx as usize].verified = true;
    }

    /// Sign every peak that's new since the last call, returning
    /// `(bin, hash, signature)` tuples ready to send to clients.
    pub fn update_signed_peaks(&mut self) -> Vec<(Bin, Hash, Signature)> {
        let unchanged = self.peaks.len() == self.signed_peaks.len()
            && self.peaks.iter().zip(&self.signed_peaks).all(|(p, (sp, _))| p == sp);
        if unchanged && !self.peaks.is_empty() {
            return Vec::new();
        }

        let mut newly_signed = Vec::new();
        for &peak in &self.peaks {
            if self.signed_peaks.iter().any(|(b, _)| *b == peak) {
                continue;
            }
            let Some(node) = self.find_node(peak) else {
                continue;
            };
            self.compute_tree(node);
            let hash = self.arena[node as usize].hash;
            let payload = Self::signing_payload(peak, hash);
            if let Ok(sig) = self.keypair.sign(&payload) {
                newly_signed.push((peak, hash, sig));
            }
        }

        let mut updated = Vec::with_capacity(self.peaks.len());
        for &peak in &self.peaks {
            if let Some((_, sig)) = self.signed_peaks.iter().find(|(b, _)| *b == peak) {
                updated.push((peak, sig.clone()));
            } else if let Some((_, _, sig)) = newly_signed.iter().find(|(b, _, _)| *b == peak) {
                updated.push((peak, sig.clone()));
            }
        }
        self.signed_peaks = updated;

        newly_signed
    }

    /// Drop everything at or below `pos`. Used once a signature covering
    /// `pos` (or something beyond it) has been issued and acknowledged, so
    /// the data is no longer needed to answer verification requests.
    pub fn prune_tree(&mut self, pos: Bin) {
        let Some(idx) = self.find_node(pos) else {
            return;
        };
        match self.arena[idx as usize].parent {
            Some(parent) => {
                if self.arena[parent as usize].left == Some(idx) {
                    self.arena[parent as usize].left = None;
                } else if self.arena[parent as usize].right == Some(idx) {
                    self.arena[parent as usize].right = None;
                }
            }
            None => self.root = None,
        }
        self.free_subtree(idx);
    }

    // ---- client side ----

    /// Offer a signed peak hash: the signature over `(pos, hash)` where
    /// `hash` is whatever hash was most recently offered (unsigned) for
    /// `pos` via [`LiveTree::offer_hash`]. A mismatched `pos` (the signature
    /// arrived for a different candidate than expected) is ignored.
    pub fn offer_signed_peak_hash(&mut self, pos: Bin, sig: &Signature) -> bool {
        let Some((cand_bin, cand_hash)) = self.cand_peak else {
            return false;
        };
        if pos != cand_bin {
            return false;
        }
        let payload = Self::signing_payload(pos, cand_hash);
        if !self.keypair.verify(&payload, sig) {
            return false;
        }

        let mut i = 0;
        let mut stored = false;
        while i < self.peaks.len() {
            if pos == self.peaks[i] {
                stored = true;
                break;
            } else if pos.contains(self.peaks[i]) {
                if !stored {
                    self.peaks[i] = pos;
                    stored = true;
                    i += 1;
                } else {
                    self.peaks.remove(i);
                }
            } else {
                i += 1;
            }
        }
        if !stored {
            self.peaks.push(pos);
        }

        if let Some(&last) = self.peaks.last() {
            self.sizec = last.base_right().layer_offset() + 1;
            self.size = self.sizec * u64::from(self.chunk_size);
        }

        if self.state == LiveTreeState::VerAwaitPeak {
            self.state = LiveTreeState::VerAwaitData;
        }

        self.create_and_verify_node(cand_bin, cand_hash, true);
        self.cand_peak = None;

        if pos.base_length() < self.guessed_chunks_per_sig {
            self.guessed_chunks_per_sig = pos.base_length();
        }
        true
    }

    /// Offer a single node's hash, e.g. as part of a proof path, or as the
    /// first hash seen for a not-yet-signed peak (stashed as the pending
    /// candidate until its signature arrives).
    pub fn offer_hash(&mut self, pos: Bin, hash: Hash) -> bool {
        if hash.is_zero() {
            return false;
        }
        let peak = self.peak_for(pos);
        if peak.is_none() {
            self.cand_peak = Some((pos, hash));
            return false;
        }
        self.cand_peak = None;
        self.create_and_verify_node(pos, hash, false)
    }

    /// Offer chunk data, verifying it against the tree before accepting it.
    pub fn offer_data(&mut self, pos: Bin, data: &[u8]) -> Result<bool, LiveTreeError> {
        if self.state == LiveTreeState::VerAwaitPeak {
            return Ok(false);
        }
        if !pos.is_base() {
            return Ok(false);
        }
        if (data.len() as u64) < u64::from(self.chunk_size) && pos != Bin::new(0, self.sizec.saturating_sub(1)) {
            return Ok(false);
        }
        if self.ack_out.is_filled(pos) {
            return Ok(true);
        }
        if self.peak_for(pos).is_none() {
            return Ok(false);
        }

        let hash = Hash::of_data(data);
        if !self.offer_hash(pos, hash) {
            return Ok(false);
        }

        let offset = pos.base_offset() * u64::from(self.chunk_size);
        self.storage.write_at(offset, data)?;
        self.ack_out.fill(pos);
        self.completec += 1;
        Ok(true)
    }

    fn create_and_verify_node(&mut self, pos: Bin, hash: Hash, verified: bool) -> bool {
        let mut iter = self.root;
        let mut parent: Option<u32> = None;

        let found = loop {
            if iter.is_none() {
                match parent {
                    None => {
                        let idx = self.alloc_node(pos);
                        self.arena[idx as usize].hash = hash;
                        self.arena[idx as usize].verified = verified;
                        self.root = Some(idx);
                        return false;
                    }
                    Some(par) => {
                        let par_bin = self.arena[par as usize].bin;
                        let new_idx = if pos.to_raw() < par_bin.to_raw() {
                            let n = self.alloc_node(par_bin.left());
                            self.arena[par as usize].left = Some(n);
                            n
                        } else {
                            let n = self.alloc_node(par_bin.right());
                            self.arena[par as usize].right = Some(n);
                            n
                        };
                        self.arena[new_idx as usize].parent = Some(par);
                        iter = Some(new_idx);
                    }
                }
            }

            let cur = iter.expect("just ensured iter is Some above");
            let cur_bin = self.arena[cur as usize].bin;

            if !cur_bin.contains(pos) {
                let new_root_bin = cur_bin.parent();
                let new_root = self.alloc_node(new_root_bin);
                if pos.layer_offset() < cur_bin.layer_offset() {
                    self.arena[new_root as usize].right = Some(cur);
                } else {
                    self.arena[new_root as usize].left = Some(cur);
                }
                self.arena[cur as usize].parent = Some(new_root);
                self.root = Some(new_root);
                iter = Some(new_root);
                parent = None;
                continue;
            }

            if pos.to_raw() == cur_bin.to_raw() {
                break cur;
            } else if pos.to_raw() < cur_bin.to_raw() {
                parent = Some(cur);
                iter = self.arena[cur as usize].left;
            } else {
                parent = Some(cur);
                iter = self.arena[cur as usize].right;
            }
        };

        self.verify_found_node(found, pos, hash, verified)
    }

    fn verify_found_node(&mut self, found: u32, pos: Bin, hash: Hash, verified: bool) -> bool {
        if self.state == LiveTreeState::VerAwaitPeak {
            return false;
        }

        let peak = self.peak_for(pos);
        if peak.is_none() {
            return false;
        }
        if peak == pos {
            if verified {
                self.arena[found as usize].hash = hash;
                self.arena[found as usize].verified = verified;
            }
            return hash == self.arena[found as usize].hash;
        }

        if self.arena[found as usize].verified {
            return hash == self.arena[found as usize].hash;
        }
        self.arena[found as usize].hash = hash;

        if !pos.is_base() {
            return false;
        }

        let mut piter = found;
        let mut uphash = hash;

        while self.arena[piter as usize].bin != peak && !self.arena[piter as usize].verified {
            self.arena[piter as usize].hash = uphash;
            let Some(parent_idx) = self.arena[piter as usize].parent else {
                return false;
            };
            piter = parent_idx;

            let (left, right) = (self.arena[piter as usize].left, self.arena[piter as usize].right);
            let (Some(l), Some(r)) = (left, right) else {
                return false; // tree still incomplete on this path
            };
            let (lh, rh) = (self.arena[l as usize].hash, self.arena[r as usize].hash);
            if lh.is_zero() || rh.is_zero() {
                break;
            }
            uphash = Hash::of_pair(&lh, &rh);
        }

        if self.arena[piter as usize].hash.is_zero() {
            return false;
        }

        let success = uphash == self.arena[piter as usize].hash;
        if success {
            // Mark the whole leaf-to-peak path verified, and every sibling
            // the fold consumed along the way (the uncle hashes), so
            // re-offers and later proofs for any of them short-circuit here
            // instead of re-folding.
            let mut cur = found;
            loop {
                self.arena[cur as usize].verified = true;
                if let Some(parent_idx) = self.arena[cur as usize].parent {
                    let is_left = self.arena[cur as usize].bin.is_left();
                    let sibling = if is_left {
                        self.arena[parent_idx as usize].right
                    } else {
                        self.arena[parent_idx as usize].left
                    };
                    if let Some(sib_idx) = sibling {
                        if !self.arena[sib_idx as usize].hash.is_zero() {
                            self.arena[sib_idx as usize].verified = true;
                        }
                    }
                }
                if self.arena[cur as usize].bin == peak {
                    break;
                }
                match self.arena[cur as usize].parent {
                    Some(p) => cur = p,
                    None => break,
                }
            }
        }
        success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swift_signing::DummyKeyPair;
    use swift_storage::MemoryStorage;

    fn source() -> LiveTree {
        LiveTree::new_source(Box::new(MemoryStorage::new()), Box::new(DummyKeyPair::generate()), 4)
    }

    /// The uncle hashes needed to fold `pos` up to `peak` independently of
    /// any of its sibling leaves' own data — exactly what a sender would
    /// bundle alongside a DATA message for a chunk arriving out of order.
    fn uncle_hashes(tree: &LiveTree, peak: Bin, mut pos: Bin) -> Vec<(Bin, Hash)> {
        let mut proof = Vec::new();
        while pos != peak {
            let sib = pos.sibling();
            proof.push((sib, tree.hash_at(sib)));
            pos = pos.parent();
        }
        proof
    }

    // S4: a source producing data can always sign its current peaks, and a
    // client that receives those signed peaks, the uncle hashes proving
    // each chunk's place under them, and the matching data, ends up with
    // identical accepted chunks — each chunk verified independently rather
    // than only the one that happens to complete the fold.
    #[test]
    fn client_accepts_data_confirmed_by_signed_peaks() {
        let mut src = source();
        let chunks: Vec<&[u8]> = vec![b"aaaa", b"bbbb", b"cccc", b"dddd"];
        let mut bins = Vec::new();
        for c in &chunks {
            bins.push(src.add_data(c).unwrap());
        }
        let signed = src.update_signed_peaks();
        assert!(!signed.is_empty());

        let pubkey = DummyKeyPair::from_public_key_bytes(&src.keypair.public_key_bytes()).unwrap();
        let mut client = LiveTree::new_client(Box::new(MemoryStorage::new()), Box::new(pubkey), 4);

        for (bin, hash, sig) in &signed {
            client.offer_hash(*bin, *hash);
            assert!(client.offer_signed_peak_hash(*bin, sig));
        }

        let peak = signed[0].0;
        for &bin in &bins {
            for (uncle_bin, uncle_hash) in uncle_hashes(&src, peak, bin) {
                client.offer_hash(uncle_bin, uncle_hash);
            }
        }

        for (bin, data) in bins.iter().zip(chunks.iter()) {
            assert!(client.offer_data(*bin, data).unwrap());
        }
        assert_eq!(client.chunks_complete(), 4);
    }

    // S5: data that doesn't match an already-signed peak is rejected, once
    // its uncle hash lets the fold complete (otherwise rejection would be
    // indistinguishable from a proof that's merely still incomplete).
    #[test]
    fn client_rejects_data_not_matching_signed_peak() {
        let mut src = source();
        src.add_data(b"aaaa").unwrap();
        src.add_data(b"bbbb").unwrap();
        let signed = src.update_signed_peaks();

        let pubkey = DummyKeyPair::from_public_key_bytes(&src.keypair.public_key_bytes()).unwrap();
        let mut client = LiveTree::new_client(Box::new(MemoryStorage::new()), Box::new(pubkey), 4);
        for (bin, hash, sig) in &signed {
            client.offer_hash(*bin, *hash);
            client.offer_signed_peak_hash(*bin, sig);
        }

        let peak = signed[0].0;
        for (uncle_bin, uncle_hash) in uncle_hashes(&src, peak, Bin::new(0, 0)) {
            client.offer_hash(uncle_bin, uncle_hash);
        }

        assert!(!client.offer_data(Bin::new(0, 0), b"XXXX").unwrap());
    }

    #[test]
    fn wrong_signature_is_rejected() {
        let mut src = source();
        src.add_data(b"aaaa").unwrap();
        let signed = src.update_signed_peaks();
        let (bin, hash, _) = signed[0].clone();

        let other_source = DummyKeyPair::generate();
        let bad_sig = other_source.sign(b"whatever").unwrap();

        let pubkey = DummyKeyPair::from_public_key_bytes(&src.keypair.public_key_bytes()).unwrap();
        let mut client = LiveTree::new_client(Box::new(MemoryStorage::new()), Box::new(pubkey), 4);
        client.offer_hash(bin, hash);
        assert!(!client.offer_signed_peak_hash(bin, &bad_sig));
    }

    #[test]
    fn prune_tree_drops_old_nodes_without_touching_peaks() {
        let mut src = source();
        for c in [b"aaaa", b"bbbb", b"cccc", b"dddd"] {
            src.add_data(c).unwrap();
        }
        let peaks_before = src.peaks.clone();
        src.prune_tree(Bin::new(0, 0));
        assert_eq!(src.peaks, peaks_before);
    }
}
