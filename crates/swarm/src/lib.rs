//! The swarm lifecycle manager: tracks every swarm known to this process,
//! activating (bringing fully into memory) and deactivating (checkpointing
//! and dropping the in-memory tree) them as needed, so a process can have
//! many swarms registered while only the ones currently in use cost more
//! than a small cached record.
//!
//! Only static (file) swarms are managed this way — a live swarm, per the
//! source this is grounded on, is unbounded and always active, so it isn't
//! a candidate for deactivation and isn't tracked here.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use lru::LruCache;
use swift_hash::Hash;
use swift_static_tree::{CheckpointMeta, HashStore, MmapHashStore, StaticTree, TreeError};
use swift_storage::{ContentStorage, SingleFileStorage, StorageError};
use swift_transfer::{Direction, ProgressCallback, ProgressCallbacks, SpeedLimits};

/// An integer handle identifying a registered swarm, stable for its
/// lifetime in this process (reused only after a cooldown once freed).
pub type Descriptor = i32;

#[derive(Debug, thiserror::Error)]
pub enum SwarmError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("no swarm registered with descriptor {0}")]
    UnknownDescriptor(Descriptor),

    #[error("no swarm registered with root hash {0}")]
    UnknownSwarm(Hash),
}

/// How a swarm is being registered: whether its content is already on disk
/// (its id is derived by hashing it), or it's expected to arrive from peers
/// under an already-known id.
#[derive(Debug, Clone, Copy)]
pub enum Origin {
    /// Content is already present at the given filename; hash it to learn
    /// the swarm id.
    Seed,
    /// Awaiting content from peers under this already-known root hash.
    Leech(Hash),
}

/// Tunables for swarm activation/deactivation and descriptor reuse.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, clap::Args)]
#[command(next_help_heading = "Swarm manager")]
pub struct SwarmManagerConfig {
    /// Maximum number of swarms kept fully active (in memory) at once.
    #[arg(long, default_value_t = 512)]
    pub max_active_swarms: usize,

    /// Seconds of inactivity before an active swarm is deactivated even
    /// though the active cap hasn't been reached.
    #[arg(long, default_value_t = 30)]
    pub idle_deactivate_secs: u64,

    /// Seconds a swarm flagged for removal must sit idle before the
    /// removal sweep actually deletes it.
    #[arg(long, default_value_t = 30)]
    pub removal_idle_secs: u64,

    /// Seconds a freed descriptor slot must age before it's handed out
    /// again.
    #[arg(long, default_value_t = 120)]
    pub index_reuse_cooldown_secs: u64,
}

impl Default for SwarmManagerConfig {
    fn default() -> Self {
        SwarmManagerConfig {
            max_active_swarms: 512,
            idle_deactivate_secs: 30,
            removal_idle_secs: 30,
            index_reuse_cooldown_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct CachedMeta {
    size: Option<u64>,
    completec: u64,
    seq_complete_zero: u64,
    is_complete: bool,
}

/// One swarm's bookkeeping record: its identity, location on disk, and
/// either a live tree (while active) or a cached snapshot (while not).
pub struct SwarmData {
    id: Descriptor,
    root_hash: Hash,
    filename: PathBuf,
    tracker: Option<String>,
    chunk_size: u32,
    force_check_diskvshash: bool,
    active: bool,
    to_be_removed: bool,
    remove_state: bool,
    remove_content: bool,
    latest_use: Instant,
    tree: Option<StaticTree>,
    max_speeds: SpeedLimits,
    progress_callbacks: ProgressCallbacks,
    cached: CachedMeta,
}

impl SwarmData {
    pub fn id(&self) -> Descriptor {
        self.id
    }

    pub fn root_hash(&self) -> Hash {
        self.root_hash
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    pub fn tracker(&self) -> Option<&str> {
        self.tracker.as_deref()
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

fn checkpoint_path(filename: &Path) -> PathBuf {
    let mut p = filename.as_os_str().to_owned();
    p.push(".mbinmap");
    PathBuf::from(p)
}

fn hash_path(filename: &Path) -> PathBuf {
    let mut p = filename.as_os_str().to_owned();
    p.push(".mhash");
    PathBuf::from(p)
}

/// The manager itself: a 64-bucket index keyed on the low 6 bits of the
/// root hash (binary-searched within bucket), a flat descriptor table, and
/// an LRU-tracked set of currently active swarms.
pub struct SwarmManager {
    config: SwarmManagerConfig,
    buckets: [Vec<Descriptor>; 64],
    swarms: Vec<Option<SwarmData>>,
    unused: Vec<(Descriptor, Instant)>,
    active_lru: LruCache<Descriptor, ()>,
}

impl SwarmManager {
    pub fn new(config: SwarmManagerConfig) -> Self {
        let cap = NonZeroUsize::new(config.max_active_swarms.max(1)).unwrap_or(NonZeroUsize::MIN);
        SwarmManager {
            config,
            buckets: std::array::from_fn(|_| Vec::new()),
            swarms: Vec::new(),
            unused: Vec::new(),
            active_lru: LruCache::new(cap),
        }
    }

    pub fn maximum_active_swarms(&self) -> usize {
        self.config.max_active_swarms
    }

    /// Change the active-swarm cap, deactivating (and checkpointing) the
    /// least-recently-used swarms immediately if the new cap is smaller.
    pub fn set_maximum_active_swarms(&mut self, max: usize) {
        self.config.max_active_swarms = max;
        while self.active_lru.len() > max {
            let Some((id, _)) = self.active_lru.pop_lru() else {
                break;
            };
            self.deactivate_by_id(id);
        }
        let cap = NonZeroUsize::new(max.max(1)).unwrap_or(NonZeroUsize::MIN);
        self.active_lru.resize(cap);
    }

    fn alloc_descriptor(&mut self) -> Descriptor {
        let now = Instant::now();
        let cooldown = Duration::from_secs(self.config.index_reuse_cooldown_secs);
        if let Some(pos) = self
            .unused
            .iter()
            .position(|&(_, freed_at)| now.duration_since(freed_at) >= cooldown)
        {
            let (id, _) = self.unused.remove(pos);
            id
        } else {
            let id = self.swarms.len() as Descriptor;
            self.swarms.push(None);
            id
        }
    }

    fn register(
        &mut self,
        root_hash: Hash,
        filename: PathBuf,
        tracker: Option<String>,
        chunk_size: u32,
        tree: Option<StaticTree>,
        cached: Option<CachedMeta>,
    ) -> Descriptor {
        let id = self.alloc_descriptor();
        let data = SwarmData {
            id,
            root_hash,
            filename,
            tracker,
            chunk_size,
            force_check_diskvshash: false,
            active: false,
            to_be_removed: false,
            remove_state: false,
            remove_content: false,
            latest_use: Instant::now(),
            tree,
            max_speeds: SpeedLimits::default(),
            progress_callbacks: ProgressCallbacks::new(),
            cached: cached.unwrap_or_default(),
        };
        self.swarms[id as usize] = Some(data);

        let bucket = (root_hash.as_bytes()[0] & 63) as usize;
        let pos = self.buckets[bucket].partition_point(|&existing| {
            self.swarms[existing as usize]
                .as_ref()
                .expect("bucket entries always point at live swarms")
                .root_hash
                .as_bytes()
                < root_hash.as_bytes()
        });
        self.buckets[bucket].insert(pos, id);
        id
    }

    /// Look up a swarm's descriptor by its root hash.
    pub fn find_by_root_hash(&self, root_hash: Hash) -> Option<Descriptor> {
        let bucket = (root_hash.as_bytes()[0] & 63) as usize;
        let list = &self.buckets[bucket];
        list.binary_search_by(|&id| {
            self.swarms[id as usize]
                .as_ref()
                .expect("bucket entries always point at live swarms")
                .root_hash
                .as_bytes()
                .cmp(root_hash.as_bytes())
        })
        .ok()
        .map(|pos| list[pos])
    }

    /// Look up a swarm's record by descriptor.
    pub fn find_swarm(&self, id: Descriptor) -> Option<&SwarmData> {
        self.swarms.get(id as usize).and_then(|s| s.as_ref())
    }

    fn find_data(&self, root_hash: Hash) -> Result<&SwarmData, SwarmError> {
        let id = self
            .find_by_root_hash(root_hash)
            .ok_or(SwarmError::UnknownSwarm(root_hash))?;
        Ok(self.swarms[id as usize]
            .as_ref()
            .expect("index always points at a live entry"))
    }

    fn find_data_mut(&mut self, root_hash: Hash) -> Result<&mut SwarmData, SwarmError> {
        let id = self
            .find_by_root_hash(root_hash)
            .ok_or(SwarmError::UnknownSwarm(root_hash))?;
        Ok(self.swarms[id as usize]
            .as_mut()
            .expect("index always points at a live entry"))
    }

    /// Register a swarm. If `origin` already names a known root hash for an
    /// existing record, that record's descriptor is returned unchanged
    /// (matching a duplicate `AddSwarm` being a no-op besides activation).
    pub fn add_swarm(
        &mut self,
        filename: impl Into<PathBuf>,
        origin: Origin,
        tracker: Option<String>,
        chunk_size: u32,
        activate: bool,
    ) -> Result<Descriptor, SwarmError> {
        let filename = filename.into();

        if let Origin::Leech(root_hash) = origin {
            if let Some(existing) = self.find_by_root_hash(root_hash) {
                if activate {
                    self.activate_by_id(existing)?;
                }
                return Ok(existing);
            }

            if !activate {
                if let Ok(meta) = CheckpointMeta::read_metadata_only(checkpoint_path(&filename)) {
                    return Ok(self.register(
                        root_hash,
                        filename,
                        tracker,
                        meta.chunk_size,
                        None,
                        Some(CachedMeta {
                            size: Some(meta.size),
                            completec: meta.sizec,
                            seq_complete_zero: meta.size,
                            is_complete: true,
                        }),
                    ));
                }
            }

            let descriptor = self.register(root_hash, filename, tracker, chunk_size, None, None);
            if activate {
                self.activate_by_id(descriptor)?;
            }
            return Ok(descriptor);
        }

        // Origin::Seed: the id is derived from content, so it must be
        // hashed now regardless of whether the caller wants it activated.
        let storage = Box::new(SingleFileStorage::open(&filename)?);
        let hashes: Box<dyn HashStore> = Box::new(MmapHashStore::create(hash_path(&filename), 1024)?);
        let tree = StaticTree::from_content(storage, hashes, chunk_size)?;
        let root_hash = tree.root_hash();

        if let Some(existing) = self.find_by_root_hash(root_hash) {
            if activate {
                self.activate_by_id(existing)?;
            }
            return Ok(existing);
        }

        let descriptor = self.register(root_hash, filename, tracker, chunk_size, Some(tree), None);
        if activate {
            self.activate_by_id(descriptor)?;
        } else {
            self.deactivate_by_id(descriptor);
        }
        Ok(descriptor)
    }

    fn build_tree(data: &SwarmData) -> Result<StaticTree, SwarmError> {
        if !data.force_check_diskvshash {
            if let Ok(meta) = CheckpointMeta::read_metadata_only(checkpoint_path(&data.filename)) {
                if meta.root_hash == data.root_hash {
                    if let Ok(hashes) = MmapHashStore::open_existing(hash_path(&data.filename)) {
                        let storage = Box::new(SingleFileStorage::open(&data.filename)?);
                        if let Ok(tree) = StaticTree::recover(storage, Box::new(hashes), meta) {
                            return Ok(tree);
                        }
                    }
                }
            }
        }
        let storage = Box::new(SingleFileStorage::open(&data.filename)?);
        if storage.reserved_size() == 0 {
            // Nothing on disk yet: a leech swarm awaiting content from peers.
            let hashes = Box::new(MmapHashStore::create(hash_path(&data.filename), 1024)?);
            return Ok(StaticTree::for_receiving(storage, hashes, data.chunk_size, data.root_hash));
        }
        let hashes = Box::new(MmapHashStore::create(hash_path(&data.filename), 1024)?);
        Ok(StaticTree::from_content(storage, hashes, data.chunk_size)?)
    }

    fn activate_by_id(&mut self, id: Descriptor) -> Result<(), SwarmError> {
        {
            let data = self
                .swarms
                .get_mut(id as usize)
                .and_then(|s| s.as_mut())
                .ok_or(SwarmError::UnknownDescriptor(id))?;
            if data.tree.is_none() {
                data.tree = Some(Self::build_tree(data)?);
            }
            data.active = true;
            data.latest_use = Instant::now();
        }
        if let Some((evicted_id, _)) = self.active_lru.push(id, ()) {
            if evicted_id != id {
                tracing::debug!(evicted = evicted_id, "active swarm cap reached, deactivating LRU swarm");
                self.deactivate_by_id(evicted_id);
            }
        }
        Ok(())
    }

    fn deactivate_by_id(&mut self, id: Descriptor) {
        if let Some(data) = self.swarms.get_mut(id as usize).and_then(|s| s.as_mut()) {
            if let Some(mut tree) = data.tree.take() {
                let checkpoint_ok = tree.flush().is_ok() && tree.write_checkpoint(checkpoint_path(&data.filename)).is_ok();
                if !checkpoint_ok {
                    data.force_check_diskvshash = true;
                }
                data.cached = CachedMeta {
                    size: tree.size(),
                    completec: tree.chunks_complete(),
                    seq_complete_zero: tree.seq_complete(0),
                    is_complete: tree.is_complete(),
                };
            }
            data.active = false;
        }
        self.active_lru.pop(&id);
    }

    /// Bring a cached swarm fully into memory. Exceeding the active cap
    /// deactivates the least-recently-used active swarm first.
    pub fn activate_swarm(&mut self, root_hash: Hash) -> Result<Descriptor, SwarmError> {
        let id = self
            .find_by_root_hash(root_hash)
            .ok_or(SwarmError::UnknownSwarm(root_hash))?;
        self.activate_by_id(id)?;
        Ok(id)
    }

    /// Checkpoint and drop a swarm's in-memory tree, keeping only a cached
    /// summary.
    pub fn deactivate_swarm(&mut self, root_hash: Hash) -> Result<(), SwarmError> {
        let id = self
            .find_by_root_hash(root_hash)
            .ok_or(SwarmError::UnknownSwarm(root_hash))?;
        self.deactivate_by_id(id);
        Ok(())
    }

    /// Persist an active swarm's hash file and checkpoint record without
    /// deactivating it (a standalone `Checkpoint` call, distinct from the
    /// checkpoint-then-drop that deactivation performs).
    pub fn checkpoint(&mut self, root_hash: Hash) -> Result<(), SwarmError> {
        let data = self.find_data_mut(root_hash)?;
        let Some(tree) = data.tree.as_mut() else {
            // Nothing active to flush; the cached snapshot already reflects
            // the last checkpoint taken at deactivation.
            return Ok(());
        };
        tree.flush()?;
        tree.write_checkpoint(checkpoint_path(&data.filename))?;
        Ok(())
    }

    /// Flag a swarm for removal; it is actually deleted by the next
    /// [`SwarmManager::check_swarms_to_be_removed`] sweep once it has sat
    /// idle past the removal threshold.
    pub fn remove_swarm(&mut self, root_hash: Hash, remove_state: bool, remove_content: bool) -> Result<(), SwarmError> {
        let data = self.find_data_mut(root_hash)?;
        data.to_be_removed = true;
        data.remove_state = remove_state;
        data.remove_content = remove_content;
        Ok(())
    }

    /// Remove a swarm immediately, bypassing the idle-threshold the
    /// background sweep normally waits out. For callers that already know
    /// they want it gone right now (e.g. an explicit one-shot `Close`).
    pub fn force_remove_swarm(&mut self, root_hash: Hash, remove_state: bool, remove_content: bool) -> Result<(), SwarmError> {
        let id = self
            .find_by_root_hash(root_hash)
            .ok_or(SwarmError::UnknownSwarm(root_hash))?;
        if let Some(data) = self.swarms[id as usize].as_mut() {
            data.remove_state = remove_state;
            data.remove_content = remove_content;
        }
        self.remove_now(id);
        Ok(())
    }

    fn remove_now(&mut self, id: Descriptor) {
        if let Some(data) = self.swarms[id as usize].take() {
            self.active_lru.pop(&id);
            let bucket = (data.root_hash.as_bytes()[0] & 63) as usize;
            if let Some(pos) = self.buckets[bucket].iter().position(|&x| x == id) {
                self.buckets[bucket].remove(pos);
            }
            if data.remove_content {
                let _ = std::fs::remove_file(&data.filename);
            }
            if data.remove_state {
                let _ = std::fs::remove_file(hash_path(&data.filename));
                let _ = std::fs::remove_file(checkpoint_path(&data.filename));
            }
            self.unused.push((id, Instant::now()));
        }
    }

    /// Periodic sweep (meant to run roughly every 5 seconds): finalizes
    /// removal of swarms flagged by [`SwarmManager::remove_swarm`] once
    /// they've sat idle past the removal threshold.
    pub fn check_swarms_to_be_removed(&mut self) {
        let idle_after = Duration::from_secs(self.config.removal_idle_secs);
        let now = Instant::now();
        let ids: Vec<Descriptor> = self
            .swarms
            .iter()
            .filter_map(|slot| {
                slot.as_ref()
                    .filter(|d| d.to_be_removed && now.duration_since(d.latest_use) >= idle_after)
                    .map(|d| d.id)
            })
            .collect();
        for id in ids {
            self.remove_now(id);
        }
    }

    /// Periodic sweep (meant to run roughly every second): deactivates
    /// swarms that have had no recent activity, independent of the active
    /// cap.
    pub fn deactivate_idle_swarms(&mut self) {
        let idle_after = Duration::from_secs(self.config.idle_deactivate_secs);
        let now = Instant::now();
        let idle_ids: Vec<Descriptor> = self
            .swarms
            .iter()
            .filter_map(|slot| {
                slot.as_ref()
                    .filter(|d| d.active && !d.to_be_removed && now.duration_since(d.latest_use) >= idle_after)
                    .map(|d| d.id)
            })
            .collect();
        for id in idle_ids {
            self.deactivate_by_id(id);
        }
    }

    /// Record I/O activity on a swarm, resetting its idle clock and
    /// promoting it in the active LRU.
    pub fn touch(&mut self, root_hash: Hash) -> Result<(), SwarmError> {
        let id = self
            .find_by_root_hash(root_hash)
            .ok_or(SwarmError::UnknownSwarm(root_hash))?;
        if let Some(data) = self.swarms[id as usize].as_mut() {
            data.latest_use = Instant::now();
        }
        self.active_lru.get(&id);
        Ok(())
    }

    pub fn size(&self, root_hash: Hash) -> Result<Option<u64>, SwarmError> {
        let data = self.find_data(root_hash)?;
        Ok(match &data.tree {
            Some(tree) => tree.size(),
            None => data.cached.size,
        })
    }

    pub fn is_complete(&self, root_hash: Hash) -> Result<bool, SwarmError> {
        let data = self.find_data(root_hash)?;
        Ok(match &data.tree {
            Some(tree) => tree.is_complete(),
            None => data.cached.is_complete,
        })
    }

    pub fn chunks_complete(&self, root_hash: Hash) -> Result<u64, SwarmError> {
        let data = self.find_data(root_hash)?;
        Ok(match &data.tree {
            Some(tree) => tree.chunks_complete(),
            None => data.cached.completec,
        })
    }

    /// Bytes sequentially available from `offset`. Only `offset == 0` is
    /// answerable for a deactivated (cached) swarm; any other offset
    /// requires activation first.
    pub fn seq_complete(&self, root_hash: Hash, offset: u64) -> Result<u64, SwarmError> {
        let data = self.find_data(root_hash)?;
        Ok(match &data.tree {
            Some(tree) => tree.seq_complete(offset),
            None if offset == 0 => data.cached.seq_complete_zero,
            None => 0,
        })
    }

    pub fn set_max_speed(&mut self, root_hash: Hash, direction: Direction, bytes_per_sec: Option<f64>) -> Result<(), SwarmError> {
        let data = self.find_data_mut(root_hash)?;
        data.max_speeds.set(direction, bytes_per_sec);
        Ok(())
    }

    pub fn add_progress_callback(&mut self, root_hash: Hash, callback: Box<dyn ProgressCallback>, agg_layer: u8) -> Result<(), SwarmError> {
        let data = self.find_data_mut(root_hash)?;
        data.progress_callbacks.add(callback, agg_layer);
        Ok(())
    }

    /// Iterate over every swarm known to this manager, active or cached.
    pub fn iter(&self) -> Iter<'_> {
        self.into_iter()
    }

    /// Deactivate (checkpointing) every active swarm. Intended to be called
    /// once, at process shutdown.
    pub fn shutdown(&mut self) {
        let active_ids: Vec<Descriptor> = self
            .swarms
            .iter()
            .filter_map(|slot| slot.as_ref().filter(|d| d.active).map(|d| d.id))
            .collect();
        for id in active_ids {
            self.deactivate_by_id(id);
        }
    }
}

/// Iterator over every swarm known to a manager, active or cached.
pub struct Iter<'a> {
    inner: std::slice::Iter<'a, Option<SwarmData>>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a SwarmData;

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.inner.by_ref() {
            if let Some(data) = slot {
                return Some(data);
            }
        }
        None
    }
}

impl<'a> IntoIterator for &'a SwarmManager {
    type Item = &'a SwarmData;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        Iter {
            inner: self.swarms.iter(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(max_active: usize) -> SwarmManager {
        SwarmManager::new(SwarmManagerConfig {
            max_active_swarms: max_active,
            ..SwarmManagerConfig::default()
        })
    }

    // S6: adding the same swarm id twice returns the same descriptor and
    // keeps the index sorted.
    #[test]
    fn duplicate_add_returns_existing_descriptor() {
        let mut mgr = manager(8);
        let id = Hash::of_data(b"swarm-under-test");

        let first = mgr.add_swarm("f1.dat", Origin::Leech(id), None, 1024, false).unwrap();
        let second = mgr.add_swarm("f2.dat", Origin::Leech(id), None, 1024, false).unwrap();
        assert_eq!(first, second);
        assert_eq!(mgr.iter().count(), 1);
    }

    // S7: activation cap with maxActive=2 deactivates the LRU swarm when a
    // third is activated, and cached queries keep answering for it.
    #[test]
    fn activation_cap_deactivates_lru() {
        let dir = tempfile::tempdir().unwrap();
        let mut mgr = manager(2);

        let mut descriptors = Vec::new();
        for (name, content) in [("a.dat", b"aaaa" as &[u8]), ("b.dat", b"bbbb"), ("c.dat", b"cccc")] {
            let path = dir.path().join(name);
            std::fs::write(&path, content).unwrap();
            let id = mgr.add_swarm(path, Origin::Seed, None, 4, true).unwrap();
            descriptors.push(id);
        }

        let a = mgr.find_swarm(descriptors[0]).unwrap();
        assert!(!a.is_active(), "a should have been evicted by the LRU cap");
        let root_a = a.root_hash();
        assert_eq!(mgr.size(root_a).unwrap(), Some(4));
        assert!(mgr.is_complete(root_a).unwrap());

        let c = mgr.find_swarm(descriptors[2]).unwrap();
        assert!(c.is_active());
    }

    #[test]
    fn deactivate_then_reactivate_recovers_from_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.dat");
        std::fs::write(&path, b"0123456789abcdef").unwrap();

        let mut mgr = manager(8);
        let id = mgr.add_swarm(&path, Origin::Seed, None, 4, true).unwrap();
        let root_hash = mgr.find_swarm(id).unwrap().root_hash();

        mgr.deactivate_swarm(root_hash).unwrap();
        assert!(!mgr.find_swarm(id).unwrap().is_active());
        assert!(mgr.is_complete(root_hash).unwrap());

        mgr.activate_swarm(root_hash).unwrap();
        assert!(mgr.find_swarm(id).unwrap().is_active());
        assert!(mgr.is_complete(root_hash).unwrap());
    }

    #[test]
    fn removal_sweep_waits_for_idle_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.dat");
        std::fs::write(&path, b"data").unwrap();

        let mut mgr = manager(8);
        let id = mgr.add_swarm(&path, Origin::Seed, None, 4, true).unwrap();
        let root_hash = mgr.find_swarm(id).unwrap().root_hash();

        mgr.remove_swarm(root_hash, true, true).unwrap();
        // Not idle yet (just touched by add_swarm), so the sweep is a no-op.
        mgr.check_swarms_to_be_removed();
        assert!(mgr.find_swarm(id).is_some());
    }
}
