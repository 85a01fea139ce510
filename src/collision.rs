//! AABB overlap tests and push-out resolution
//!
//! Overlap is strict: bodies that merely touch do not collide. Resolution
//! for a mover against static obstacles is always vertical, away from the
//! viewport midline, by the smallest depth that clears every overlapping
//! obstacle plus a small margin.

use crate::contexts::DamageMeter;
use crate::stage::{GroupId, Sprite, SpriteId, Stage};
use crate::{consts, vertical_push_direction};

/// Extra clearance applied on top of the measured overlap depth
const PUSH_MARGIN: f32 = 1.0;

/// Positive overlap depths along both axes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlap {
    pub x: f32,
    pub y: f32,
}

/// Overlap depths of two bodies, or `None` unless both are strictly
/// positive
pub fn overlap(a: &Sprite, b: &Sprite) -> Option<Overlap> {
    let x = (a.size.x + b.size.x) / 2.0 - (a.pos.x - b.pos.x).abs();
    let y = (a.size.y + b.size.y) / 2.0 - (a.pos.y - b.pos.y).abs();
    if x > 0.0 && y > 0.0 { Some(Overlap { x, y }) } else { None }
}

/// Members of `group` that strictly overlap the given sprite
pub fn hits_in_group(stage: &Stage, id: SpriteId, group: GroupId) -> Vec<SpriteId> {
    let body = stage.sprite(id);
    stage
        .members(group)
        .iter()
        .filter(|other| **other != id && overlap(body, stage.sprite(**other)).is_some())
        .copied()
        .collect()
}

/// True if the sprite strictly overlaps any member of any given group
pub fn hits_any(stage: &Stage, id: SpriteId, groups: &[GroupId]) -> bool {
    let body = stage.sprite(id);
    groups.iter().any(|gid| {
        stage
            .members(*gid)
            .iter()
            .any(|other| *other != id && overlap(body, stage.sprite(*other)).is_some())
    })
}

/// Push a mover out of the given obstacle groups.
///
/// No overlap means no effect and a `false` return. Otherwise the mover is
/// pushed vertically (up when its center is strictly below the viewport
/// midline, down at or above it) by the minimum vertical overlap among the
/// colliding obstacles plus a margin, its vertical velocity is zeroed, and
/// one fixed damage amount is registered regardless of how many obstacles
/// overlapped.
pub fn resolve_push(
    stage: &mut Stage,
    id: SpriteId,
    obstacles: &[GroupId],
    damage: &mut DamageMeter,
) -> bool {
    let body = stage.sprite(id).clone();
    let mut min_depth: Option<f32> = None;
    for gid in obstacles {
        for other in stage.members(*gid) {
            if *other == id {
                continue;
            }
            if let Some(o) = overlap(&body, stage.sprite(*other)) {
                min_depth = Some(min_depth.map_or(o.y, |d: f32| d.min(o.y)));
            }
        }
    }
    let Some(depth) = min_depth else {
        return false;
    };

    let direction = vertical_push_direction(body.pos.y);
    let sprite = stage.sprite_mut(id);
    sprite.pos.y += direction * (depth + PUSH_MARGIN);
    sprite.vel.y = 0.0;
    damage.register(consts::TERRAIN_HIT_DAMAGE);
    true
}
