//! The static hash tree: verifies and derives a content-integrity Merkle
//! tree over a file of (eventually) known size, split into fixed-size
//! chunks.
//!
//! A tree is opened one of two ways: from locally available content
//! ([`StaticTree::from_content`], which hashes everything and derives its
//! own root), or from a claimed root hash received from a peer
//! ([`StaticTree::for_receiving`]), which accepts peak hashes and then
//! individual node/data offers until enough of the tree has been folded
//! back up to the peaks to confirm the claimed root. Every `offer_*` call is
//! idempotent: re-offering an already-verified hash or already-received
//! chunk is a no-op that still reports success.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use memmap2::MmapMut;
use swift_bin::{gen_peaks, Bin};
use swift_binmap::Binmap;
use swift_hash::{Hash, HASH_SIZE};
use swift_storage::{ContentStorage, StorageError};

/// The chunk size libswift and most reimplementations default to.
pub const DEFAULT_CHUNK_SIZE: u32 = 1024;

/// Errors a tree operation can raise. Rejected offers (a bad hash, an
/// unplaceable bin) are reported through a `bool`/`Option` return instead —
/// this type is for failures of the surrounding plumbing.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("checkpoint's peaks do not derive its recorded root hash")]
    CheckpointRootMismatch,

    #[error("checkpoint file is truncated")]
    TruncatedCheckpoint,
}

/// Storage for the per-bin node hashes, addressed directly by raw bin value.
///
/// Grounded on `hashtree.cpp`'s `hashes_` array: one slot per bin, so a tree
/// can be checkpointed by flushing this file alongside a small metadata
/// record, with no separate index structure.
pub trait HashStore {
    /// The hash stored at `bin`, or [`Hash::ZERO`] if nothing has been
    /// stored there yet.
    fn get(&self, bin: Bin) -> Hash;

    /// Store `hash` at `bin`, growing the backing storage if needed.
    fn set(&mut self, bin: Bin, hash: Hash);

    /// Flush any buffered writes to the backing medium.
    fn flush(&mut self) -> Result<(), TreeError>;
}

/// An in-memory hash store, for tests and for trees too small to bother
/// mmapping.
#[derive(Default)]
pub struct MemoryHashStore {
    slots: Vec<Hash>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HashStore for MemoryHashStore {
    fn get(&self, bin: Bin) -> Hash {
        self.slots.get(bin.to_raw() as usize).copied().unwrap_or(Hash::ZERO)
    }

    fn set(&mut self, bin: Bin, hash: Hash) {
        let idx = bin.to_raw() as usize;
        if idx >= self.slots.len() {
            self.slots.resize(idx + 1, Hash::ZERO);
        }
        self.slots[idx] = hash;
    }

    fn flush(&mut self) -> Result<(), TreeError> {
        Ok(())
    }
}

/// An mmap-backed hash store: one file, one [`HASH_SIZE`]-byte slot per bin,
/// grown (and remapped) on demand as higher bins are touched.
pub struct MmapHashStore {
    file: File,
    mmap: MmapMut,
    capacity: u64,
}

impl MmapHashStore {
    /// Create a fresh hash file at `path`, sized for `capacity` bins.
    pub fn create(path: impl AsRef<Path>, capacity: u64) -> Result<Self, TreeError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let capacity = capacity.max(1);
        file.set_len(capacity * HASH_SIZE as u64)?;
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        Ok(MmapHashStore { file, mmap, capacity })
    }

    /// Reopen an existing hash file as-is (no truncation).
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Self, TreeError> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = file.metadata()?.len();
        let capacity = (len / HASH_SIZE as u64).max(1);
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        Ok(MmapHashStore { file, mmap, capacity })
    }

    fn grow(&mut self, min_capacity: u64) -> Result<(), TreeError> {
        if min_capacity <= self.capacity {
            return Ok(());
        }
        let new_capacity = min_capacity.max(self.capacity * 2);
        self.file.set_len(new_capacity * HASH_SIZE as u64)?;
        self.mmap = unsafe { MmapMut::map_mut(&self.file)? };
        self.capacity = new_capacity;
        Ok(())
    }
}

impl HashStore for MmapHashStore {
    fn get(&self, bin: Bin) -> Hash {
        let idx = bin.to_raw();
        if idx >= self.capacity {
            return Hash::ZERO;
        }
        let start = idx as usize * HASH_SIZE;
        let mut bytes = [0u8; HASH_SIZE];
        bytes.copy_from_slice(&self.mmap[start..start + HASH_SIZE]);
        Hash::from_bytes(bytes)
    }

    fn set(&mut self, bin: Bin, hash: Hash) {
        let idx = bin.to_raw();
        if self.grow(idx + 1).is_err() {
            return;
        }
        let start = idx as usize * HASH_SIZE;
        self.mmap[start..start + HASH_SIZE].copy_from_slice(hash.as_bytes());
    }

    fn flush(&mut self) -> Result<(), TreeError> {
        self.mmap.flush()?;
        Ok(())
    }
}

/// Metadata recovered from a checkpoint without rebuilding the full tree:
/// just enough to know what swarm this is and how big it claims to be.
#[derive(Debug, Clone, Copy)]
pub struct CheckpointMeta {
    pub root_hash: Hash,
    pub chunk_size: u32,
    pub size: u64,
    pub sizec: u64,
}

const META_LEN: usize = HASH_SIZE + 4 + 8 + 8;

impl CheckpointMeta {
    fn to_bytes(self) -> [u8; META_LEN] {
        let mut buf = [0u8; META_LEN];
        buf[0..HASH_SIZE].copy_from_slice(self.root_hash.as_bytes());
        buf[HASH_SIZE..HASH_SIZE + 4].copy_from_slice(&self.chunk_size.to_le_bytes());
        buf[HASH_SIZE + 4..HASH_SIZE + 12].copy_from_slice(&self.size.to_le_bytes());
        buf[HASH_SIZE + 12..META_LEN].copy_from_slice(&self.sizec.to_le_bytes());
        buf
    }

    fn from_bytes(buf: &[u8]) -> Result<Self, TreeError> {
        if buf.len() < META_LEN {
            return Err(TreeError::TruncatedCheckpoint);
        }
        let mut hash_bytes = [0u8; HASH_SIZE];
        hash_bytes.copy_from_slice(&buf[0..HASH_SIZE]);
        let mut u32_bytes = [0u8; 4];
        u32_bytes.copy_from_slice(&buf[HASH_SIZE..HASH_SIZE + 4]);
        let mut size_bytes = [0u8; 8];
        size_bytes.copy_from_slice(&buf[HASH_SIZE + 4..HASH_SIZE + 12]);
        let mut sizec_bytes = [0u8; 8];
        sizec_bytes.copy_from_slice(&buf[HASH_SIZE + 12..META_LEN]);
        Ok(CheckpointMeta {
            root_hash: Hash::from_bytes(hash_bytes),
            chunk_size: u32::from_le_bytes(u32_bytes),
            size: u64::from_le_bytes(size_bytes),
            sizec: u64::from_le_bytes(sizec_bytes),
        })
    }

    /// Read just the metadata record from a checkpoint file, without
    /// touching the (potentially large) hash file or re-deriving anything.
    /// Used to answer "what swarm is this" questions cheaply, e.g. when
    /// listing known swarms at startup before any of them are activated.
    pub fn read_metadata_only(path: impl AsRef<Path>) -> Result<CheckpointMeta, TreeError> {
        let buf = std::fs::read(path)?;
        CheckpointMeta::from_bytes(&buf)
    }
}

/// A static content hash tree over `sizec` chunks of `chunk_size` bytes.
pub struct StaticTree {
    storage: Box<dyn ContentStorage>,
    hashes: Box<dyn HashStore>,
    chunk_size: u32,
    size: u64,
    size_known: bool,
    sizec: u64,
    completec: u64,
    root_hash: Hash,
    peaks: Vec<Bin>,
    /// Chunks actually received and accepted (libswift's `ack_out_`). A
    /// `Binmap` is correct here: it's a true range — every base bin under a
    /// filled range has in fact arrived.
    ack_out: Binmap,
    /// Exact set of bins whose hash has been verified against the root.
    /// Must be a per-bin set, not a `Binmap`: accepting one peak's hash
    /// does not verify every leaf underneath it, only the peak itself.
    verified: HashSet<Bin>,
    /// Exact set of bins that have *some* hash stored, verified or not.
    known: HashSet<Bin>,
}

impl StaticTree {
    /// Build a tree from content that is already fully available, hashing
    /// it and deriving its own root (the "seeding" / "Submit" path).
    pub fn from_content(
        mut storage: Box<dyn ContentStorage>,
        mut hashes: Box<dyn HashStore>,
        chunk_size: u32,
    ) -> Result<Self, TreeError> {
        let size = storage.reserved_size();
        let sizec = size.div_ceil(u64::from(chunk_size)).max(1);

        let mut buf = vec![0u8; chunk_size as usize];
        for c in 0..sizec {
            let offset = c * u64::from(chunk_size);
            let len = std::cmp::min(u64::from(chunk_size), size - offset) as usize;
            storage.read_at(offset, &mut buf[..len])?;
            hashes.set(Bin::new(0, c), Hash::of_data(&buf[..len]));
        }

        let peaks = gen_peaks(sizec);
        for peak in &peaks {
            Self::compute_subtree_hash(hashes.as_mut(), *peak);
        }

        let mut tree = StaticTree {
            storage,
            hashes,
            chunk_size,
            size,
            size_known: true,
            sizec,
            completec: sizec,
            root_hash: Hash::ZERO,
            peaks,
            ack_out: Binmap::new(),
            verified: HashSet::new(),
            known: HashSet::new(),
        };
        tree.root_hash = tree.derive_root();
        for c in 0..sizec {
            tree.ack_out.fill(Bin::new(0, c));
        }
        for peak in tree.peaks.clone() {
            tree.verified.insert(peak);
            tree.known.insert(peak);
        }
        Ok(tree)
    }

    fn compute_subtree_hash(hashes: &mut dyn HashStore, bin: Bin) -> Hash {
        if bin.layer() == 0 {
            return hashes.get(bin);
        }
        let left = Self::compute_subtree_hash(hashes, bin.left());
        let right = Self::compute_subtree_hash(hashes, bin.right());
        let combined = Hash::of_pair(&left, &right);
        hashes.set(bin, combined);
        combined
    }

    /// Open a tree awaiting content from a peer: nothing is known yet
    /// beyond the root hash it claims to have.
    pub fn for_receiving(
        storage: Box<dyn ContentStorage>,
        hashes: Box<dyn HashStore>,
        chunk_size: u32,
        root_hash: Hash,
    ) -> Self {
        StaticTree {
            storage,
            hashes,
            chunk_size,
            size: 0,
            size_known: false,
            sizec: 0,
            completec: 0,
            root_hash,
            peaks: Vec::new(),
            ack_out: Binmap::new(),
            verified: HashSet::new(),
            known: HashSet::new(),
        }
    }

    /// Rebuild a tree from a checkpoint, trusting its recorded peak hashes
    /// rather than re-hashing the whole file (the fast path: `RecoverPeakHashes`
    /// re-derives the root from hashes already on disk instead of rescanning
    /// content).
    pub fn recover(
        storage: Box<dyn ContentStorage>,
        hashes: Box<dyn HashStore>,
        meta: CheckpointMeta,
    ) -> Result<Self, TreeError> {
        let peaks = gen_peaks(meta.sizec);
        let mut tree = StaticTree {
            storage,
            hashes,
            chunk_size: meta.chunk_size,
            size: meta.size,
            size_known: true,
            sizec: meta.sizec,
            completec: 0,
            root_hash: meta.root_hash,
            peaks,
            ack_out: Binmap::new(),
            verified: HashSet::new(),
            known: HashSet::new(),
        };
        if tree.derive_root() != tree.root_hash {
            return Err(TreeError::CheckpointRootMismatch);
        }
        for peak in tree.peaks.clone() {
            tree.verified.insert(peak);
            tree.known.insert(peak);
        }
        for c in 0..tree.sizec {
            let bin = Bin::new(0, c);
            if !tree.hashes.get(bin).is_zero() {
                tree.ack_out.fill(bin);
                tree.known.insert(bin);
                tree.completec += 1;
            }
        }
        Ok(tree)
    }

    /// Persist this tree's metadata (root hash, size, chunk size) to
    /// `path`. The hash file itself is the caller's to flush (it's already
    /// durable the moment `HashStore::flush` is called), so checkpointing
    /// is just this small record plus that flush.
    pub fn write_checkpoint(&self, path: impl AsRef<Path>) -> Result<(), TreeError> {
        let meta = CheckpointMeta {
            root_hash: self.root_hash,
            chunk_size: self.chunk_size,
            size: self.size,
            sizec: self.sizec,
        };
        std::fs::write(path, meta.to_bytes())?;
        Ok(())
    }

    /// The root hash this tree is expected (or already known) to derive.
    pub fn root_hash(&self) -> Hash {
        self.root_hash
    }

    /// The chunk size in bytes.
    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// The content size in bytes, if known yet.
    pub fn size(&self) -> Option<u64> {
        self.size_known.then_some(self.size)
    }

    /// The content size in chunks, if known yet.
    pub fn size_in_chunks(&self) -> Option<u64> {
        self.size_known.then_some(self.sizec)
    }

    /// The number of chunks received and accepted so far.
    pub fn chunks_complete(&self) -> u64 {
        self.completec
    }

    /// `true` once every chunk of a known-size tree has been received.
    pub fn is_complete(&self) -> bool {
        self.size_known && self.completec == self.sizec
    }

    /// The set of received chunks.
    pub fn ack_out(&self) -> &Binmap {
        &self.ack_out
    }

    /// The peak bin covering (or equal to) `bin`, or [`Bin::NONE`] if no
    /// known peak covers it (e.g. the tree's size isn't known yet).
    pub fn peak_for(&self, bin: Bin) -> Bin {
        self.peaks
            .iter()
            .copied()
            .find(|peak| *peak == bin || peak.contains(bin))
            .unwrap_or(Bin::NONE)
    }

    /// Fold the current peak hashes, right to left, into a single root
    /// hash. Gaps beyond the last real peak (the tail of an incomplete
    /// final power-of-two block) are padded with [`Hash::ZERO`], matching
    /// `DeriveRoot`'s convention for "nothing there".
    pub fn derive_root(&self) -> Hash {
        let Some((&last, rest)) = self.peaks.split_last() else {
            return Hash::ZERO;
        };
        let mut bin = last;
        let mut hash = self.hashes.get(last);
        for &next in rest.iter().rev() {
            while bin.layer() < next.layer() {
                hash = Hash::of_pair(&hash, &Hash::ZERO);
                bin = bin.parent();
            }
            let left_hash = self.hashes.get(next);
            hash = Hash::of_pair(&left_hash, &hash);
            bin = next.parent();
        }
        hash
    }

    /// Offer a claimed peak hash, e.g. received in a handshake's peak-hash
    /// array. Peaks must arrive left to right and contiguously; an offer
    /// that doesn't immediately extend the current sequence restarts it
    /// (matching `OfferPeakHash`'s discontinuity reset — a peer that sends
    /// peaks out of order is assumed to be starting over, not amending).
    ///
    /// Returns `true` once the accumulated peaks fold up to the tree's
    /// claimed root hash, at which point the content size becomes known.
    pub fn offer_peak_hash(&mut self, bin: Bin, hash: Hash) -> bool {
        let continues = self
            .peaks
            .last()
            .map(|&last| bin.layer() < last.layer() && bin.base_offset() == last.base_right() + 1)
            .unwrap_or(true);

        if !continues {
            self.peaks.clear();
        }
        self.hashes.set(bin, hash);
        self.known.insert(bin);
        self.peaks.push(bin);

        if self.derive_root() != self.root_hash {
            return false;
        }

        self.sizec = self.peaks.iter().map(|p| p.base_length()).sum();
        if !self.size_known {
            self.size = self.sizec * u64::from(self.chunk_size);
        }
        self.size_known = true;
        for peak in self.peaks.clone() {
            self.verified.insert(peak);
            self.known.insert(peak);
        }
        true
    }

    /// Correct the tracked content size once it's known exactly (the last
    /// chunk is usually smaller than `chunk_size`, which peak-hash coverage
    /// alone can't reveal).
    pub fn set_content_length(&mut self, length: u64) {
        self.size = length;
    }

    /// Offer a single node's hash, as part of a Merkle proof path. Folds it
    /// upward against already-known sibling hashes until either a sibling is
    /// still missing — the hash is stored for later but *not* confirmed,
    /// since a lone hash with no path to the root proves nothing — or the
    /// peak is reached and the whole chain is confirmed against the claimed
    /// root.
    ///
    /// Idempotent: re-offering an already-verified bin's hash is a no-op
    /// that reports whether it still matches what was verified before.
    pub fn offer_hash(&mut self, bin: Bin, hash: Hash) -> bool {
        if self.verified.contains(&bin) {
            return hash == self.hashes.get(bin);
        }
        let peak = self.peak_for(bin);
        if peak.is_none() {
            return false;
        }
        if bin == peak {
            if hash != self.hashes.get(peak) {
                return false;
            }
            self.verified.insert(peak);
            return true;
        }

        self.hashes.set(bin, hash);
        self.known.insert(bin);

        let mut cur = bin;
        let mut siblings = Vec::new();
        while cur != peak {
            let sib = cur.sibling();
            if !self.known.contains(&sib) {
                // The rest of the proof hasn't arrived yet: the hash is
                // stored above, but nothing here confirms it against the
                // root, so it can't be reported as accepted.
                return false;
            }
            siblings.push(sib);
            let sib_hash = self.hashes.get(sib);
            let cur_hash = self.hashes.get(cur);
            let combined = if cur.is_left() {
                Hash::of_pair(&cur_hash, &sib_hash)
            } else {
                Hash::of_pair(&sib_hash, &cur_hash)
            };
            let parent = cur.parent();
            let existing = self.hashes.get(parent);
            if self.known.contains(&parent) && existing != combined {
                // A node already confirmed elsewhere doesn't match this
                // chain: the offered hash (or one of its uncles) is bad.
                return false;
            }
            self.hashes.set(parent, combined);
            self.known.insert(parent);
            cur = parent;
        }

        // The whole chain from `bin` to `peak` folded cleanly: the direct
        // path and every uncle hash it consumed are now confirmed.
        self.verified.insert(bin);
        for sib in siblings {
            self.verified.insert(sib);
        }
        let mut mark = bin;
        while mark != peak {
            self.verified.insert(mark);
            mark = mark.parent();
        }
        true
    }

    /// Offer the raw data for a single chunk, verifying it against the
    /// tree before accepting it (`OfferData`: base bins only, written to
    /// storage only once the hash chain confirms it).
    pub fn offer_data(&mut self, bin: Bin, data: &[u8]) -> Result<bool, TreeError> {
        if !bin.is_base() {
            return Ok(false);
        }
        if self.ack_out.is_filled(bin) {
            return Ok(true);
        }

        let hash = Hash::of_data(data);
        if !self.offer_hash(bin, hash) {
            return Ok(false);
        }

        let offset = bin.base_offset() * u64::from(self.chunk_size);
        self.storage.write_at(offset, data)?;
        self.ack_out.fill(bin);
        self.completec += 1;

        if self.size_known && self.sizec > 0 && bin.base_offset() == self.sizec - 1 {
            self.set_content_length(offset + data.len() as u64);
        }
        Ok(true)
    }

    /// How many contiguous bytes are available starting at byte `offset` —
    /// how far a sequential (in-order) reader could get before hitting a
    /// chunk that hasn't arrived yet.
    pub fn seq_complete(&self, offset: u64) -> u64 {
        if self.sizec == 0 {
            return 0;
        }
        let chunk_size = u64::from(self.chunk_size);
        let start_chunk = offset / chunk_size;
        let mut available = 0u64;
        let mut chunk = start_chunk;
        while chunk < self.sizec && self.ack_out.is_filled(Bin::new(0, chunk)) {
            let chunk_offset = chunk * chunk_size;
            let chunk_len = if chunk + 1 == self.sizec {
                self.size - chunk_offset
            } else {
                chunk_size
            };
            available += chunk_len;
            chunk += 1;
        }
        let consumed_before_offset = offset.saturating_sub(start_chunk * chunk_size);
        available.saturating_sub(consumed_before_offset)
    }

    /// Flush the hash store to its backing medium.
    pub fn flush(&mut self) -> Result<(), TreeError> {
        self.hashes.flush()?;
        self.storage.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swift_storage::MemoryStorage;

    fn seed(content: &[u8], chunk_size: u32) -> StaticTree {
        let mut storage = Box::new(MemoryStorage::new());
        storage.write_at(0, content).unwrap();
        StaticTree::from_content(storage, Box::new(MemoryHashStore::new()), chunk_size).unwrap()
    }

    // S1: a tree built from whole content derives a stable root and reports
    // itself fully complete.
    #[test]
    fn from_content_is_immediately_complete() {
        let tree = seed(b"0123456789abcdef", 4);
        assert!(tree.is_complete());
        assert_eq!(tree.size(), Some(16));
        assert_eq!(tree.size_in_chunks(), Some(4));
        assert_ne!(tree.root_hash(), Hash::ZERO);
    }

    #[test]
    fn derive_root_is_stable_regardless_of_chunking_path() {
        let a = seed(b"the quick brown fox jumps", 4);
        let b = seed(b"the quick brown fox jumps", 4);
        assert_eq!(a.root_hash(), b.root_hash());
    }

    // S2: a receiver that gets peaks, then per-node hashes, then data,
    // ends up bit-identical and fully verified.
    #[test]
    fn receiver_reconstructs_from_peaks_hashes_and_data() {
        let content = b"abcdefgh"; // 2 chunks of 4 bytes
        let seeder = seed(content, 4);
        let root = seeder.root_hash();

        let storage = Box::new(MemoryStorage::new());
        let mut receiver =
            StaticTree::for_receiving(storage, Box::new(MemoryHashStore::new()), 4, root);

        // Single peak at (1,0) since 2 is a power of two.
        let peak = Bin::new(1, 0);
        let peak_hash = seeder.hashes.get(peak);
        assert!(receiver.offer_peak_hash(peak, peak_hash));
        assert_eq!(receiver.size_in_chunks(), Some(2));

        // A lone chunk can't be confirmed against its peak without its
        // sibling's hash, so the uncle proof arrives first (as it would
        // alongside real DATA messages on the wire).
        receiver.offer_hash(Bin::new(0, 1), seeder.hashes.get(Bin::new(0, 1)));

        assert!(receiver.offer_data(Bin::new(0, 0), &content[0..4]).unwrap());
        assert!(receiver.offer_data(Bin::new(0, 1), &content[4..8]).unwrap());
        assert!(receiver.is_complete());
    }

    // S3: a bad chunk is rejected and does not corrupt already-verified
    // state.
    #[test]
    fn corrupt_data_is_rejected() {
        let content = b"abcdefgh";
        let seeder = seed(content, 4);
        let root = seeder.root_hash();

        let storage = Box::new(MemoryStorage::new());
        let mut receiver =
            StaticTree::for_receiving(storage, Box::new(MemoryHashStore::new()), 4, root);
        let peak = Bin::new(1, 0);
        receiver.offer_peak_hash(peak, seeder.hashes.get(peak));
        receiver.offer_hash(Bin::new(0, 1), seeder.hashes.get(Bin::new(0, 1)));

        assert!(!receiver.offer_data(Bin::new(0, 0), b"XXXX").unwrap());
        assert!(!receiver.ack_out().is_filled(Bin::new(0, 0)));
        assert!(receiver.offer_data(Bin::new(0, 0), &content[0..4]).unwrap());
    }

    #[test]
    fn offers_are_idempotent() {
        let content = b"abcdefgh";
        let seeder = seed(content, 4);
        let root = seeder.root_hash();
        let storage = Box::new(MemoryStorage::new());
        let mut receiver =
            StaticTree::for_receiving(storage, Box::new(MemoryHashStore::new()), 4, root);
        let peak = Bin::new(1, 0);
        receiver.offer_peak_hash(peak, seeder.hashes.get(peak));
        receiver.offer_hash(Bin::new(0, 1), seeder.hashes.get(Bin::new(0, 1)));
        assert!(receiver.offer_data(Bin::new(0, 0), &content[0..4]).unwrap());
        // Re-offering the same chunk is a harmless no-op.
        assert!(receiver.offer_data(Bin::new(0, 0), &content[0..4]).unwrap());
        assert_eq!(receiver.chunks_complete(), 1);
    }

    #[test]
    fn seq_complete_stops_at_first_hole() {
        let content = b"abcdefghijkl"; // 3 chunks of 4 bytes
        let seeder = seed(content, 4);
        let root = seeder.root_hash();
        let storage = Box::new(MemoryStorage::new());
        let mut receiver =
            StaticTree::for_receiving(storage, Box::new(MemoryHashStore::new()), 4, root);
        for peak in gen_peaks(3) {
            receiver.offer_peak_hash(peak, seeder.hashes.get(peak));
        }
        // (0,0)'s peak (1,0) covers two chunks, so its sibling's hash has
        // to be known before (0,0) alone can fold up to it.
        receiver.offer_hash(Bin::new(0, 1), seeder.hashes.get(Bin::new(0, 1)));
        receiver.offer_data(Bin::new(0, 0), &content[0..4]).unwrap();
        receiver.offer_data(Bin::new(0, 2), &content[8..12]).unwrap();
        assert_eq!(receiver.seq_complete(0), 4);
    }

    #[test]
    fn checkpoint_roundtrip_recovers_known_chunks() {
        let content = b"abcdefgh";
        let mut storage = Box::new(MemoryStorage::new());
        storage.write_at(0, content).unwrap();
        let tree = StaticTree::from_content(storage, Box::new(MemoryHashStore::new()), 4).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swift.checkpoint");
        tree.write_checkpoint(&path).unwrap();

        let meta = CheckpointMeta::read_metadata_only(&path).unwrap();
        assert_eq!(meta.root_hash, tree.root_hash());
        assert_eq!(meta.sizec, 2);

        let mut hashes = MemoryHashStore::new();
        for c in 0..meta.sizec {
            hashes.set(Bin::new(0, c), tree.hashes.get(Bin::new(0, c)));
        }
        for peak in gen_peaks(meta.sizec) {
            hashes.set(peak, tree.hashes.get(peak));
        }
        let recovered = StaticTree::recover(
            Box::new(MemoryStorage::new()),
            Box::new(hashes),
            meta,
        )
        .unwrap();
        assert_eq!(recovered.chunks_complete(), 2);
        assert!(recovered.is_complete());
    }
}
