//! Ordered event registry: an arena-backed AVL map keyed by `u32`
//!
//! Registered event records live in a fixed arena; tree links are arena
//! indices rather than pointers. All structural surgery (insertion,
//! rotation, removal) manipulates indices only — a value never moves
//! between slots, so the handle returned by [`AvlMap::insert`] stays valid
//! until that entry is removed. The timer queue relies on this to refer to
//! armed records by handle.

use et_core::{EtError, EtResult};

/// Arena slot: either free (threaded on the free list) or holding a node
enum Slot<T> {
    Free { next: Option<usize> },
    Used(Node<T>),
}

struct Node<T> {
    key: u32,
    left: Option<usize>,
    right: Option<usize>,
    height: u8,
    value: T,
}

/// Fixed-capacity AVL map from `u32` keys to values
///
/// Supports unique-key insert, exact-match find, and removal with
/// rebalancing. The height-balance invariant
/// `|height(left) - height(right)| <= 1` holds after every operation.
pub struct AvlMap<T, const N: usize> {
    slots: [Slot<T>; N],
    root: Option<usize>,
    free: Option<usize>,
    fresh: usize,
    len: usize,
}

impl<T, const N: usize> AvlMap<T, N> {
    const FREE_SLOT: Slot<T> = Slot::Free { next: None };

    /// Create a new empty map
    pub const fn new() -> Self {
        Self {
            slots: [Self::FREE_SLOT; N],
            root: None,
            free: None,
            fresh: 0,
            len: 0,
        }
    }

    /// Number of entries in the map
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the map is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of entries
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Insert a value under a unique key
    ///
    /// Returns the entry's stable handle, [`EtError::Busy`] if the key is
    /// already present, or [`EtError::NoMemory`] when the arena is full.
    pub fn insert(&mut self, key: u32, value: T) -> EtResult<usize> {
        if self.find(key).is_some() {
            return Err(EtError::Busy);
        }

        let idx = self.alloc(key, value).ok_or(EtError::NoMemory)?;
        self.root = Some(self.insert_at(self.root, idx));
        self.len += 1;
        Ok(idx)
    }

    /// Exact-match lookup, returning the entry's handle
    pub fn find(&self, key: u32) -> Option<usize> {
        let mut current = self.root;
        while let Some(idx) = current {
            let node = self.node(idx)?;
            if key == node.key {
                return Some(idx);
            }
            current = if key < node.key { node.left } else { node.right };
        }
        None
    }

    /// Access a value by handle
    pub fn get(&self, handle: usize) -> Option<&T> {
        match self.slots.get(handle) {
            Some(Slot::Used(node)) => Some(&node.value),
            _ => None,
        }
    }

    /// Mutably access a value by handle
    pub fn get_mut(&mut self, handle: usize) -> Option<&mut T> {
        match self.slots.get_mut(handle) {
            Some(Slot::Used(node)) => Some(&mut node.value),
            _ => None,
        }
    }

    /// Key stored at a handle
    pub fn key_of(&self, handle: usize) -> Option<u32> {
        match self.slots.get(handle) {
            Some(Slot::Used(node)) => Some(node.key),
            _ => None,
        }
    }

    /// Remove an entry by key, returning its value
    ///
    /// The tree is rebalanced along the removal path. Other entries keep
    /// their handles.
    pub fn remove(&mut self, key: u32) -> Option<T> {
        let (new_root, removed) = self.remove_at(self.root, key);
        self.root = new_root;
        let idx = removed?;
        self.len -= 1;
        let slot = core::mem::replace(&mut self.slots[idx], Slot::Free { next: self.free });
        self.free = Some(idx);
        match slot {
            Slot::Used(node) => Some(node.value),
            Slot::Free { .. } => None,
        }
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = Slot::Free { next: None };
        }
        self.root = None;
        self.free = None;
        self.fresh = 0;
        self.len = 0;
    }

    fn alloc(&mut self, key: u32, value: T) -> Option<usize> {
        let idx = match self.free {
            Some(idx) => {
                self.free = match self.slots.get(idx) {
                    Some(Slot::Free { next }) => *next,
                    _ => None,
                };
                idx
            }
            None => {
                if self.fresh >= N {
                    return None;
                }
                let idx = self.fresh;
                self.fresh += 1;
                idx
            }
        };
        self.slots[idx] = Slot::Used(Node {
            key,
            left: None,
            right: None,
            height: 1,
            value,
        });
        Some(idx)
    }

    fn node(&self, idx: usize) -> Option<&Node<T>> {
        match self.slots.get(idx) {
            Some(Slot::Used(node)) => Some(node),
            _ => None,
        }
    }

    fn links(&self, idx: usize) -> (Option<usize>, Option<usize>) {
        match self.node(idx) {
            Some(node) => (node.left, node.right),
            None => (None, None),
        }
    }

    fn key(&self, idx: usize) -> u32 {
        match self.node(idx) {
            Some(node) => node.key,
            None => 0,
        }
    }

    fn set_left(&mut self, idx: usize, left: Option<usize>) {
        if let Some(Slot::Used(node)) = self.slots.get_mut(idx) {
            node.left = left;
        }
    }

    fn set_right(&mut self, idx: usize, right: Option<usize>) {
        if let Some(Slot::Used(node)) = self.slots.get_mut(idx) {
            node.right = right;
        }
    }

    fn height(&self, idx: Option<usize>) -> u8 {
        match idx.and_then(|i| self.node(i)) {
            Some(node) => node.height,
            None => 0,
        }
    }

    fn update_height(&mut self, idx: usize) {
        let (left, right) = self.links(idx);
        let height = 1 + self.height(left).max(self.height(right));
        if let Some(Slot::Used(node)) = self.slots.get_mut(idx) {
            node.height = height;
        }
    }

    fn balance_factor(&self, idx: usize) -> i16 {
        let (left, right) = self.links(idx);
        self.height(left) as i16 - self.height(right) as i16
    }

    fn rotate_right(&mut self, idx: usize) -> usize {
        let (left, _) = self.links(idx);
        let pivot = match left {
            Some(pivot) => pivot,
            None => return idx,
        };
        let (_, pivot_right) = self.links(pivot);
        self.set_left(idx, pivot_right);
        self.set_right(pivot, Some(idx));
        self.update_height(idx);
        self.update_height(pivot);
        pivot
    }

    fn rotate_left(&mut self, idx: usize) -> usize {
        let (_, right) = self.links(idx);
        let pivot = match right {
            Some(pivot) => pivot,
            None => return idx,
        };
        let (pivot_left, _) = self.links(pivot);
        self.set_right(idx, pivot_left);
        self.set_left(pivot, Some(idx));
        self.update_height(idx);
        self.update_height(pivot);
        pivot
    }

    fn rebalance(&mut self, idx: usize) -> usize {
        self.update_height(idx);
        let factor = self.balance_factor(idx);
        if factor > 1 {
            let (left, _) = self.links(idx);
            if let Some(left) = left {
                if self.balance_factor(left) < 0 {
                    let new_left = self.rotate_left(left);
                    self.set_left(idx, Some(new_left));
                }
            }
            self.rotate_right(idx)
        } else if factor < -1 {
            let (_, right) = self.links(idx);
            if let Some(right) = right {
                if self.balance_factor(right) > 0 {
                    let new_right = self.rotate_right(right);
                    self.set_right(idx, Some(new_right));
                }
            }
            self.rotate_left(idx)
        } else {
            idx
        }
    }

    fn insert_at(&mut self, root: Option<usize>, idx: usize) -> usize {
        let current = match root {
            None => return idx,
            Some(current) => current,
        };
        if self.key(idx) < self.key(current) {
            let (left, _) = self.links(current);
            let new_left = self.insert_at(left, idx);
            self.set_left(current, Some(new_left));
        } else {
            let (_, right) = self.links(current);
            let new_right = self.insert_at(right, idx);
            self.set_right(current, Some(new_right));
        }
        self.rebalance(current)
    }

    /// Remove `key` from the subtree at `root`
    ///
    /// Returns the new subtree root and the unlinked slot index. A node
    /// with two children is replaced by its in-order successor via index
    /// splicing; the successor keeps its own slot.
    fn remove_at(&mut self, root: Option<usize>, key: u32) -> (Option<usize>, Option<usize>) {
        let current = match root {
            None => return (None, None),
            Some(current) => current,
        };
        let current_key = self.key(current);
        if key < current_key {
            let (left, _) = self.links(current);
            let (new_left, removed) = self.remove_at(left, key);
            self.set_left(current, new_left);
            if removed.is_none() {
                return (Some(current), None);
            }
            (Some(self.rebalance(current)), removed)
        } else if key > current_key {
            let (_, right) = self.links(current);
            let (new_right, removed) = self.remove_at(right, key);
            self.set_right(current, new_right);
            if removed.is_none() {
                return (Some(current), None);
            }
            (Some(self.rebalance(current)), removed)
        } else {
            let (left, right) = self.links(current);
            let new_root = match (left, right) {
                (None, None) => None,
                (Some(child), None) | (None, Some(child)) => Some(child),
                (Some(_), Some(right)) => {
                    let (new_right, successor) = self.remove_min(right);
                    match successor {
                        Some(successor) => {
                            self.set_left(successor, left);
                            self.set_right(successor, new_right);
                            Some(self.rebalance(successor))
                        }
                        // Unreachable for a well-formed tree; keep the node
                        None => return (Some(current), None),
                    }
                }
            };
            (new_root, Some(current))
        }
    }

    /// Unlink the minimum node of the subtree at `root`
    fn remove_min(&mut self, root: usize) -> (Option<usize>, Option<usize>) {
        let (left, right) = self.links(root);
        match left {
            None => (right, Some(root)),
            Some(left) => {
                let (new_left, min) = self.remove_min(left);
                self.set_left(root, new_left);
                (Some(self.rebalance(root)), min)
            }
        }
    }
}

impl<T, const N: usize> Default for AvlMap<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Recursively check BST ordering, stored heights, and the AVL balance
    /// invariant; returns the subtree height.
    fn check<T, const N: usize>(
        map: &AvlMap<T, N>,
        idx: Option<usize>,
        min: Option<u32>,
        max: Option<u32>,
    ) -> u8 {
        let idx = match idx {
            None => return 0,
            Some(idx) => idx,
        };
        let node = map.node(idx).expect("link to free slot");
        if let Some(min) = min {
            assert!(node.key > min, "BST order violated");
        }
        if let Some(max) = max {
            assert!(node.key < max, "BST order violated");
        }
        let lh = check(map, node.left, min, Some(node.key));
        let rh = check(map, node.right, Some(node.key), max);
        let height = 1 + lh.max(rh);
        assert_eq!(node.height, height, "stale height");
        assert!((lh as i16 - rh as i16).abs() <= 1, "balance violated");
        height
    }

    fn validate<T, const N: usize>(map: &AvlMap<T, N>) {
        check(map, map.root, None, None);
    }

    #[test]
    fn test_insert_find_sequential() {
        let mut map: AvlMap<u32, 64> = AvlMap::new();
        for key in 1..=64 {
            map.insert(key, key * 10).unwrap();
            validate(&map);
        }
        assert_eq!(map.len(), 64);
        for key in 1..=64 {
            let handle = map.find(key).expect("missing key");
            assert_eq!(map.get(handle), Some(&(key * 10)));
            assert_eq!(map.key_of(handle), Some(key));
        }
        assert_eq!(map.find(0), None);
        assert_eq!(map.find(65), None);
    }

    #[test]
    fn test_insert_duplicate_is_busy() {
        let mut map: AvlMap<u32, 8> = AvlMap::new();
        let handle = map.insert(7, 70).unwrap();
        assert_eq!(map.insert(7, 71), Err(EtError::Busy));
        // Existing record untouched
        assert_eq!(map.get(handle), Some(&70));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_insert_exhausted() {
        let mut map: AvlMap<u32, 4> = AvlMap::new();
        for key in 0..4 {
            map.insert(key, key).unwrap();
        }
        assert_eq!(map.insert(100, 100), Err(EtError::NoMemory));
    }

    #[test]
    fn test_remove_rebalances() {
        let mut map: AvlMap<u32, 64> = AvlMap::new();
        for key in 1..=64 {
            map.insert(key, key).unwrap();
        }
        // Remove all odd keys, validating the invariants after each step
        for key in (1..=64).step_by(2) {
            assert_eq!(map.remove(key), Some(key));
            validate(&map);
        }
        assert_eq!(map.len(), 32);
        for key in 1..=64 {
            if key % 2 == 0 {
                assert!(map.find(key).is_some());
            } else {
                assert!(map.find(key).is_none());
            }
        }
    }

    #[test]
    fn test_remove_missing() {
        let mut map: AvlMap<u32, 8> = AvlMap::new();
        map.insert(1, 1).unwrap();
        assert_eq!(map.remove(2), None);
        assert_eq!(map.len(), 1);
        validate(&map);
    }

    #[test]
    fn test_remove_root_repeatedly() {
        let mut map: AvlMap<u32, 32> = AvlMap::new();
        for key in 1..=20 {
            map.insert(key, key).unwrap();
        }
        while let Some(root) = map.root {
            let key = map.key(root);
            assert_eq!(map.remove(key), Some(key));
            validate(&map);
        }
        assert!(map.is_empty());
    }

    #[test]
    fn test_scrambled_insert_remove() {
        // Knuth multiplicative hash is bijective on u32, so keys are unique
        let mut map: AvlMap<u32, 128> = AvlMap::new();
        let keys: std::vec::Vec<u32> = (0..100u32)
            .map(|i| i.wrapping_mul(2_654_435_761))
            .collect();
        for &key in &keys {
            map.insert(key, !key).unwrap();
            validate(&map);
        }
        for &key in keys.iter().step_by(3) {
            assert_eq!(map.remove(key), Some(!key));
            validate(&map);
        }
        for (i, &key) in keys.iter().enumerate() {
            if i % 3 == 0 {
                assert!(map.find(key).is_none());
            } else {
                let handle = map.find(key).expect("missing key");
                assert_eq!(map.get(handle), Some(&!key));
            }
        }
    }

    #[test]
    fn test_handle_stability_across_removals() {
        let mut map: AvlMap<&'static str, 8> = AvlMap::new();
        let a = map.insert(10, "a").unwrap();
        let b = map.insert(20, "b").unwrap();
        let c = map.insert(30, "c").unwrap();

        map.remove(10);
        map.remove(30);
        // b keeps its slot even though the tree restructured around it
        assert_eq!(map.get(b), Some(&"b"));
        assert_eq!(map.find(20), Some(b));
        // freed handles no longer resolve
        assert_eq!(map.get(a), None);
        assert_eq!(map.get(c), None);
        validate(&map);
    }

    #[test]
    fn test_slot_reuse_after_remove() {
        let mut map: AvlMap<u32, 2> = AvlMap::new();
        map.insert(1, 1).unwrap();
        map.insert(2, 2).unwrap();
        assert_eq!(map.insert(3, 3), Err(EtError::NoMemory));
        map.remove(1);
        map.insert(3, 3).unwrap();
        assert_eq!(map.len(), 2);
        validate(&map);
    }

    #[test]
    fn test_clear() {
        let mut map: AvlMap<u32, 16> = AvlMap::new();
        for key in 0..10 {
            map.insert(key, key).unwrap();
        }
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.find(5), None);
        map.insert(5, 50).unwrap();
        assert_eq!(map.len(), 1);
    }
}
