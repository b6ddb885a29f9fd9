//! A bitmap over the bin address space.
//!
//! `Binmap` tracks, for every base (chunk) address, whether it is filled
//! (received / verified) or empty, and lets that be queried and updated at
//! any granularity — a single chunk or an entire aligned range — in time
//! proportional to the tree's depth rather than the range's size. Both the
//! static tree's "ack_out"/verified sets and the live tree's per-node
//! `verified` flags are instances of this same shape of problem, so it is
//! pulled out as its own crate rather than being embedded in either tree.
//!
//! Internally this is an arena of nodes addressed by `u32` slot id (never
//! raw pointers), with a free list reused on merge. The tree starts rooted
//! at a single chunk and grows upward, doubling its covered range, the
//! first time a bin outside the current root is touched.

use swift_bin::Bin;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Node {
    Empty,
    Filled,
    Split { left: u32, right: u32 },
}

/// A binary tree over the bin address space recording filled/empty state.
#[derive(Debug)]
pub struct Binmap {
    arena: Vec<Node>,
    free: Vec<u32>,
    root: u32,
    root_bin: Bin,
}

impl Default for Binmap {
    fn default() -> Self {
        Self::new()
    }
}

impl Binmap {
    /// A binmap with nothing filled, initially rooted at chunk 0.
    pub fn new() -> Self {
        Binmap {
            arena: vec![Node::Empty],
            free: Vec::new(),
            root: 0,
            root_bin: Bin::new(0, 0),
        }
    }

    /// The bin currently spanned by the root. Grows (doubles) as bins
    /// outside it are filled or cleared.
    pub fn root_bin(&self) -> Bin {
        self.root_bin
    }

    /// `true` if every base address under `bin` is filled.
    pub fn is_filled(&self, bin: Bin) -> bool {
        if !self.root_bin.contains(bin) && self.root_bin != bin {
            return false;
        }
        self.query(self.root, self.root_bin, bin) == Some(true)
    }

    /// `true` if every base address under `bin` is empty.
    pub fn is_empty(&self, bin: Bin) -> bool {
        if !self.root_bin.contains(bin) && self.root_bin != bin {
            return true;
        }
        self.query(self.root, self.root_bin, bin) == Some(false)
    }

    /// Mark every base address under `bin` as filled.
    pub fn fill(&mut self, bin: Bin) {
        self.grow_to_contain(bin);
        self.set(self.root, self.root_bin, bin, true);
        self.root = self.simplify(self.root);
    }

    /// Mark every base address under `bin` as empty.
    pub fn clear(&mut self, bin: Bin) {
        self.grow_to_contain(bin);
        self.set(self.root, self.root_bin, bin, false);
        self.root = self.simplify(self.root);
    }

    /// Find the leftmost empty base bin within `range`, if any.
    pub fn find_empty(&self, range: Bin) -> Option<Bin> {
        if !self.root_bin.contains(range) && self.root_bin != range {
            return Some(range.base_left());
        }
        self.find_empty_rec(self.root, self.root_bin, range)
    }

    fn find_empty_rec(&self, idx: u32, node_bin: Bin, range: Bin) -> Option<Bin> {
        if !node_bin.contains(range) && node_bin != range {
            return None;
        }
        match self.arena[idx as usize] {
            Node::Filled => None,
            Node::Empty => Some(range.base_left()),
            Node::Split { left, right } => {
                let l_bin = node_bin.left();
                let r_bin = node_bin.right();
                if l_bin.contains(range) || l_bin == range {
                    self.find_empty_rec(left, l_bin, range)
                } else if r_bin.contains(range) || r_bin == range {
                    self.find_empty_rec(right, r_bin, range)
                } else {
                    self.find_empty_rec(left, l_bin, l_bin)
                        .or_else(|| self.find_empty_rec(right, r_bin, r_bin))
                }
            }
        }
    }

    fn query(&self, idx: u32, node_bin: Bin, target: Bin) -> Option<bool> {
        if node_bin == target {
            return match self.arena[idx as usize] {
                Node::Empty => Some(false),
                Node::Filled => Some(true),
                Node::Split { .. } => None,
            };
        }
        match self.arena[idx as usize] {
            Node::Empty => Some(false),
            Node::Filled => Some(true),
            Node::Split { left, right } => {
                let l_bin = node_bin.left();
                if l_bin.contains(target) || l_bin == target {
                    self.query(left, l_bin, target)
                } else {
                    self.query(right, node_bin.right(), target)
                }
            }
        }
    }

    fn grow_to_contain(&mut self, bin: Bin) {
        while self.root_bin != bin && !self.root_bin.contains(bin) {
            if self.root_bin.is_all() {
                // Already covers the full address space; nothing more to do.
                break;
            }
            let new_root_bin = self.root_bin.parent();
            let sibling = self.alloc(Node::Empty);
            let new_root = if self.root_bin.is_left() {
                self.alloc(Node::Split {
                    left: self.root,
                    right: sibling,
                })
            } else {
                self.alloc(Node::Split {
                    left: sibling,
                    right: self.root,
                })
            };
            self.root = new_root;
            self.root_bin = new_root_bin;
        }
    }

    fn set(&mut self, idx: u32, node_bin: Bin, target: Bin, filled: bool) -> u32 {
        if node_bin == target {
            self.free_subtree(idx);
            let v = if filled { Node::Filled } else { Node::Empty };
            return self.alloc(v);
        }

        let (left, right) = match self.arena[idx as usize] {
            Node::Filled => {
                let l = self.alloc(Node::Filled);
                let r = self.alloc(Node::Filled);
                (l, r)
            }
            Node::Empty => {
                let l = self.alloc(Node::Empty);
                let r = self.alloc(Node::Empty);
                (l, r)
            }
            Node::Split { left, right } => (left, right),
        };

        let l_bin = node_bin.left();
        let r_bin = node_bin.right();
        let (left, right) = if l_bin.contains(target) || l_bin == target {
            (self.set(left, l_bin, target, filled), right)
        } else {
            (left, self.set(right, r_bin, target, filled))
        };

        self.arena[idx as usize] = Node::Split { left, right };
        self.simplify(idx)
    }

    fn simplify(&mut self, idx: u32) -> u32 {
        if let Node::Split { left, right } = self.arena[idx as usize] {
            if self.arena[left as usize] == self.arena[right as usize] {
                if let leaf @ (Node::Empty | Node::Filled) = self.arena[left as usize] {
                    self.free.push(left);
                    self.free.push(right);
                    self.arena[idx as usize] = leaf;
                }
            }
        }
        idx
    }

    fn free_subtree(&mut self, idx: u32) {
        if let Node::Split { left, right } = self.arena[idx as usize] {
            self.free_subtree(left);
            self.free_subtree(right);
        }
        self.free.push(idx);
    }

    fn alloc(&mut self, node: Node) -> u32 {
        if let Some(idx) = self.free.pop() {
            self.arena[idx as usize] = node;
            idx
        } else {
            self.arena.push(node);
            (self.arena.len() - 1) as u32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_map_is_empty() {
        let m = Binmap::new();
        assert!(m.is_empty(Bin::new(0, 0)));
        assert!(!m.is_filled(Bin::new(0, 0)));
    }

    #[test]
    fn fill_single_chunk() {
        let mut m = Binmap::new();
        m.fill(Bin::new(0, 0));
        assert!(m.is_filled(Bin::new(0, 0)));
        assert!(m.is_empty(Bin::new(0, 1)));
    }

    #[test]
    fn fill_range_reports_filled_for_whole_and_parts() {
        let mut m = Binmap::new();
        m.fill(Bin::new(2, 0)); // chunks 0..4
        for i in 0..4 {
            assert!(m.is_filled(Bin::new(0, i)));
        }
        assert!(m.is_empty(Bin::new(0, 4)));
        assert!(m.is_filled(Bin::new(1, 0)));
        assert!(m.is_filled(Bin::new(1, 1)));
    }

    #[test]
    fn clear_after_fill() {
        let mut m = Binmap::new();
        m.fill(Bin::new(2, 0));
        m.clear(Bin::new(0, 1));
        assert!(m.is_filled(Bin::new(0, 0)));
        assert!(m.is_empty(Bin::new(0, 1)));
        assert!(m.is_filled(Bin::new(0, 2)));
        assert!(m.is_filled(Bin::new(0, 3)));
        // The range as a whole is no longer uniformly filled.
        assert!(!m.is_filled(Bin::new(2, 0)));
        assert!(!m.is_empty(Bin::new(2, 0)));
    }

    #[test]
    fn grows_root_to_cover_later_bins() {
        let mut m = Binmap::new();
        m.fill(Bin::new(0, 0));
        m.fill(Bin::new(0, 1000));
        assert!(m.is_filled(Bin::new(0, 0)));
        assert!(m.is_filled(Bin::new(0, 1000)));
        assert!(m.is_empty(Bin::new(0, 500)));
    }

    #[test]
    fn find_empty_returns_leftmost_hole() {
        let mut m = Binmap::new();
        m.fill(Bin::new(0, 0));
        m.fill(Bin::new(0, 1));
        let found = m.find_empty(Bin::new(2, 0)).unwrap();
        assert_eq!(found, Bin::new(0, 2));
    }

    #[test]
    fn merges_back_to_leaf_when_fully_filled() {
        let mut m = Binmap::new();
        m.fill(Bin::new(0, 0));
        m.fill(Bin::new(0, 1));
        m.fill(Bin::new(0, 2));
        m.fill(Bin::new(0, 3));
        assert!(m.is_filled(Bin::new(2, 0)));
        // Internal simplification should have merged the four leaves and
        // their parents back into one node; behavior-visible as: clearing
        // any one chunk must not resurrect stale filled state elsewhere.
        m.clear(Bin::new(0, 2));
        assert!(m.is_filled(Bin::new(0, 0)));
        assert!(m.is_filled(Bin::new(0, 1)));
        assert!(m.is_empty(Bin::new(0, 2)));
        assert!(m.is_filled(Bin::new(0, 3)));
    }
}
