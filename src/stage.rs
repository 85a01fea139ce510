//! Entity arena and live sprite groups
//!
//! Every entity in play is a `Sprite` slot in the `Stage`. Slots are
//! recycled on despawn, so handles stay cheap copyable indices. Groups are
//! live id lists shared by the action engine (move targets), the collision
//! code (candidate sets) and the renderer (draw lists); removing a sprite
//! from its groups is what takes it out of play.

use glam::Vec2;

/// Handle to a sprite slot in the stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteId(pub u32);

/// Handle to a sprite group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub u32);

/// A rectangular entity: center position, body size, per-frame velocity,
/// paint and animation state
#[derive(Debug, Clone)]
pub struct Sprite {
    /// Center position (px, y-up)
    pub pos: Vec2,
    /// Body size (width, height)
    pub size: Vec2,
    /// Current velocity (px/s), written by the action engine
    pub vel: Vec2,
    pub visible: bool,
    /// Solid paint color
    pub color: [u8; 3],
    /// Animation frame index for cycled patterns
    pub frame: u32,
}

impl Sprite {
    /// A visible solid-color sprite at the origin
    pub fn solid(width: f32, height: f32, color: [u8; 3]) -> Self {
        Self {
            pos: Vec2::ZERO,
            size: Vec2::new(width, height),
            vel: Vec2::ZERO,
            visible: true,
            color,
            frame: 0,
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x - self.size.x / 2.0
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x / 2.0
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y - self.size.y / 2.0
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y + self.size.y / 2.0
    }

    #[inline]
    pub fn set_left(&mut self, x: f32) {
        self.pos.x = x + self.size.x / 2.0;
    }

    #[inline]
    pub fn set_right(&mut self, x: f32) {
        self.pos.x = x - self.size.x / 2.0;
    }

    #[inline]
    pub fn set_bottom(&mut self, y: f32) {
        self.pos.y = y + self.size.y / 2.0;
    }

    #[inline]
    pub fn set_top(&mut self, y: f32) {
        self.pos.y = y - self.size.y / 2.0;
    }
}

#[derive(Debug)]
struct Slot {
    sprite: Sprite,
    alive: bool,
}

#[derive(Debug, Default)]
struct Group {
    members: Vec<SpriteId>,
    alive: bool,
}

/// Arena owning every sprite slot plus the group lists
#[derive(Debug, Default)]
pub struct Stage {
    slots: Vec<Slot>,
    free: Vec<u32>,
    groups: Vec<Group>,
    free_groups: Vec<u32>,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a sprite, reusing a free slot when one exists
    pub fn spawn(&mut self, sprite: Sprite) -> SpriteId {
        let id = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize] = Slot { sprite, alive: true };
                SpriteId(index)
            }
            None => {
                self.slots.push(Slot { sprite, alive: true });
                SpriteId(self.slots.len() as u32 - 1)
            }
        };
        log::debug!("spawn sprite {:?}", id);
        id
    }

    /// Free a slot and drop the id from every group
    pub fn despawn(&mut self, id: SpriteId) {
        let slot = &mut self.slots[id.0 as usize];
        if !slot.alive {
            return;
        }
        slot.alive = false;
        slot.sprite.visible = false;
        self.free.push(id.0);
        self.remove_from_all_groups(id);
        log::debug!("despawn sprite {:?}", id);
    }

    #[inline]
    pub fn sprite(&self, id: SpriteId) -> &Sprite {
        &self.slots[id.0 as usize].sprite
    }

    #[inline]
    pub fn sprite_mut(&mut self, id: SpriteId) -> &mut Sprite {
        &mut self.slots[id.0 as usize].sprite
    }

    pub fn is_alive(&self, id: SpriteId) -> bool {
        self.slots[id.0 as usize].alive
    }

    /// Create an empty group
    pub fn group(&mut self) -> GroupId {
        match self.free_groups.pop() {
            Some(index) => {
                let slot = &mut self.groups[index as usize];
                slot.members.clear();
                slot.alive = true;
                GroupId(index)
            }
            None => {
                self.groups.push(Group { members: Vec::new(), alive: true });
                GroupId(self.groups.len() as u32 - 1)
            }
        }
    }

    /// Retire a group; its members are untouched
    pub fn group_free(&mut self, gid: GroupId) {
        let slot = &mut self.groups[gid.0 as usize];
        if !slot.alive {
            return;
        }
        slot.members.clear();
        slot.alive = false;
        self.free_groups.push(gid.0);
    }

    pub fn group_push(&mut self, gid: GroupId, id: SpriteId) {
        self.groups[gid.0 as usize].members.push(id);
    }

    pub fn group_remove(&mut self, gid: GroupId, id: SpriteId) {
        self.groups[gid.0 as usize].members.retain(|m| *m != id);
    }

    #[inline]
    pub fn members(&self, gid: GroupId) -> &[SpriteId] {
        &self.groups[gid.0 as usize].members
    }

    /// Drop the id from every live group
    pub fn remove_from_all_groups(&mut self, id: SpriteId) {
        for group in &mut self.groups {
            if group.alive {
                group.members.retain(|m| *m != id);
            }
        }
    }

    pub fn set_group_visible(&mut self, gid: GroupId, visible: bool) {
        let members = std::mem::take(&mut self.groups[gid.0 as usize].members);
        for id in &members {
            self.slots[id.0 as usize].sprite.visible = visible;
        }
        self.groups[gid.0 as usize].members = members;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_reuses_freed_slots() {
        let mut stage = Stage::new();
        let a = stage.spawn(Sprite::solid(10.0, 10.0, [255, 0, 0]));
        let b = stage.spawn(Sprite::solid(10.0, 10.0, [0, 255, 0]));
        stage.despawn(a);
        let c = stage.spawn(Sprite::solid(10.0, 10.0, [0, 0, 255]));
        assert_eq!(c, a); // slot recycled
        assert_ne!(c, b);
        assert!(stage.is_alive(c));
    }

    #[test]
    fn test_despawn_leaves_no_group_membership() {
        let mut stage = Stage::new();
        let id = stage.spawn(Sprite::solid(4.0, 4.0, [255, 255, 255]));
        let g1 = stage.group();
        let g2 = stage.group();
        stage.group_push(g1, id);
        stage.group_push(g2, id);
        stage.despawn(id);
        assert!(stage.members(g1).is_empty());
        assert!(stage.members(g2).is_empty());
        assert!(!stage.sprite(id).visible);
    }

    #[test]
    fn test_despawn_is_idempotent() {
        let mut stage = Stage::new();
        let a = stage.spawn(Sprite::solid(4.0, 4.0, [1, 2, 3]));
        stage.despawn(a);
        stage.despawn(a);
        let b = stage.spawn(Sprite::solid(4.0, 4.0, [1, 2, 3]));
        let c = stage.spawn(Sprite::solid(4.0, 4.0, [1, 2, 3]));
        // A double despawn must not hand the same slot out twice
        assert_ne!(b, c);
    }

    #[test]
    fn test_edge_helpers_round_trip() {
        let mut s = Sprite::solid(20.0, 10.0, [0, 0, 0]);
        s.set_left(100.0);
        s.set_bottom(50.0);
        assert_eq!(s.left(), 100.0);
        assert_eq!(s.right(), 120.0);
        assert_eq!(s.bottom(), 50.0);
        assert_eq!(s.top(), 60.0);
        assert_eq!(s.pos, Vec2::new(110.0, 55.0));
    }

    #[test]
    fn test_group_visibility_toggle() {
        let mut stage = Stage::new();
        let g = stage.group();
        let ids: Vec<_> = (0..3)
            .map(|_| {
                let id = stage.spawn(Sprite::solid(2.0, 2.0, [9, 9, 9]));
                stage.group_push(g, id);
                id
            })
            .collect();
        stage.set_group_visible(g, false);
        assert!(ids.iter().all(|id| !stage.sprite(*id).visible));
        stage.set_group_visible(g, true);
        assert!(ids.iter().all(|id| stage.sprite(*id).visible));
    }
}
