//! Fixed-capacity sprite pool
//!
//! Waves that churn through many small entities draw them from a pool that
//! pre-spawns its whole capacity up front; nothing is allocated during
//! gameplay. Acquisition is all-or-nothing and release is idempotent, so
//! the active and inactive sets stay disjoint and always sum to capacity.

use std::collections::VecDeque;

use thiserror::Error;

use crate::stage::{Sprite, SpriteId, Stage};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("pool exhausted: requested {requested}, available {available}")]
    Exhausted { requested: usize, available: usize },
}

/// Pool of pre-spawned sprites with disjoint active/inactive sets
#[derive(Debug)]
pub struct SpritePool {
    active: Vec<SpriteId>,
    inactive: VecDeque<SpriteId>,
    capacity: usize,
}

impl SpritePool {
    /// Pre-spawn `capacity` sprites from the factory, all inactive and
    /// invisible
    pub fn new(stage: &mut Stage, mut factory: impl FnMut() -> Sprite, capacity: usize) -> Self {
        let mut inactive = VecDeque::with_capacity(capacity);
        for _ in 0..capacity {
            let id = stage.spawn(factory());
            stage.sprite_mut(id).visible = false;
            inactive.push_back(id);
        }
        log::debug!("sprite pool ready, capacity {}", capacity);
        Self { active: Vec::with_capacity(capacity), inactive, capacity }
    }

    /// Move the first `n` inactive sprites to active and mark them visible.
    /// Fails without side effects when fewer than `n` are available.
    pub fn acquire(&mut self, stage: &mut Stage, n: usize) -> Result<Vec<SpriteId>, PoolError> {
        if n > self.inactive.len() {
            return Err(PoolError::Exhausted { requested: n, available: self.inactive.len() });
        }
        let acquired: Vec<SpriteId> = self.inactive.drain(..n).collect();
        for id in &acquired {
            stage.sprite_mut(*id).visible = true;
            self.active.push(*id);
        }
        Ok(acquired)
    }

    /// Return sprites to the inactive set: hide them and detach them from
    /// every stage group. Ids not currently active are skipped.
    pub fn release(&mut self, stage: &mut Stage, ids: &[SpriteId]) {
        for id in ids {
            let Some(index) = self.active.iter().position(|a| a == id) else {
                continue;
            };
            self.active.remove(index);
            stage.sprite_mut(*id).visible = false;
            stage.remove_from_all_groups(*id);
            self.inactive.push_back(*id);
        }
    }

    /// Release every active sprite, in acquisition order
    pub fn release_all(&mut self, stage: &mut Stage) {
        let ids: Vec<SpriteId> = self.active.clone();
        self.release(stage, &ids);
    }

    #[inline]
    pub fn active(&self) -> &[SpriteId] {
        &self.active
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.inactive.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// The pools the coordinator owns and lends to waves
#[derive(Debug)]
pub struct Pools {
    /// Shared dense-pack block pool
    pub shield_blocks: SpritePool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn block() -> Sprite {
        Sprite::solid(10.0, 12.0, [176, 176, 176])
    }

    fn pool_of(capacity: usize) -> (Stage, SpritePool) {
        let mut stage = Stage::new();
        let pool = SpritePool::new(&mut stage, block, capacity);
        (stage, pool)
    }

    #[test]
    fn test_acquire_is_all_or_nothing() {
        let (mut stage, mut pool) = pool_of(4);
        let err = pool.acquire(&mut stage, 5).unwrap_err();
        assert_eq!(err, PoolError::Exhausted { requested: 5, available: 4 });
        // The failed call must not have consumed anything
        assert_eq!(pool.available(), 4);
        assert!(pool.active().is_empty());
        assert_eq!(pool.acquire(&mut stage, 4).unwrap().len(), 4);
    }

    #[test]
    fn test_acquire_marks_visible_release_hides_and_detaches() {
        let (mut stage, mut pool) = pool_of(2);
        let ids = pool.acquire(&mut stage, 2).unwrap();
        assert!(ids.iter().all(|id| stage.sprite(*id).visible));

        let g = stage.group();
        stage.group_push(g, ids[0]);
        pool.release(&mut stage, &[ids[0]]);
        assert!(!stage.sprite(ids[0]).visible);
        assert!(stage.members(g).is_empty());
        assert_eq!(pool.active(), &ids[1..]);
    }

    #[test]
    fn test_release_is_idempotent() {
        let (mut stage, mut pool) = pool_of(3);
        let ids = pool.acquire(&mut stage, 2).unwrap();
        pool.release(&mut stage, &[ids[0]]);
        pool.release(&mut stage, &[ids[0]]);
        assert_eq!(pool.active().len(), 1);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_release_snapshot_of_active_set() {
        let (mut stage, mut pool) = pool_of(5);
        pool.acquire(&mut stage, 5).unwrap();
        let snapshot = pool.active().to_vec();
        pool.release(&mut stage, &snapshot);
        assert!(pool.active().is_empty());
        assert_eq!(pool.available(), 5);
    }

    #[test]
    fn test_release_all_twice_is_safe() {
        let (mut stage, mut pool) = pool_of(3);
        pool.acquire(&mut stage, 3).unwrap();
        pool.release_all(&mut stage);
        pool.release_all(&mut stage);
        assert_eq!(pool.available(), 3);
    }

    #[test]
    fn test_acquire_order_is_fifo() {
        let (mut stage, mut pool) = pool_of(4);
        let first = pool.acquire(&mut stage, 2).unwrap();
        pool.release(&mut stage, &[first[0]]);
        // The released sprite goes to the back of the line
        let next = pool.acquire(&mut stage, 1).unwrap();
        assert_ne!(next[0], first[0]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Acquire(usize),
        ReleaseFirst(usize),
        ReleaseAll,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..10usize).prop_map(Op::Acquire),
            (0..10usize).prop_map(Op::ReleaseFirst),
            Just(Op::ReleaseAll),
        ]
    }

    proptest! {
        #[test]
        fn pool_conserves_capacity(ops in proptest::collection::vec(op(), 1..50)) {
            let (mut stage, mut pool) = pool_of(8);
            for op in ops {
                match op {
                    Op::Acquire(n) => {
                        let before = pool.available();
                        match pool.acquire(&mut stage, n) {
                            Ok(ids) => prop_assert_eq!(ids.len(), n),
                            Err(_) => prop_assert_eq!(pool.available(), before),
                        }
                    }
                    Op::ReleaseFirst(n) => {
                        let ids: Vec<_> = pool.active().iter().take(n).copied().collect();
                        pool.release(&mut stage, &ids);
                    }
                    Op::ReleaseAll => pool.release_all(&mut stage),
                }
                prop_assert_eq!(pool.active().len() + pool.available(), pool.capacity());
            }
        }
    }
}
