//! Immediate-mode drawing of the tunnel world
//!
//! The simulation is y-up with the origin at the bottom-left; macroquad's
//! screen space is y-down from the top-left, so every rect flips through
//! the window height on the way out. Draw order is back to front: wave,
//! walls, terrain, ship, shots, then the damage flash over everything.

use macroquad::color::{BLACK, Color, WHITE};
use macroquad::shapes::draw_rectangle;

use crate::consts;
use crate::stage::{GroupId, Sprite, Stage};
use crate::tunnel::Tunnel;

/// Strength of the full-screen flash at damage level 1.0
const FLASH_PEAK_ALPHA: f32 = 0.8;
/// Height of the drifting highlight band on animated cores
const CORE_BAND_HEIGHT: f32 = 6.0;

fn to_color(rgb: [u8; 3], alpha: f32) -> Color {
    Color::new(
        rgb[0] as f32 / 255.0,
        rgb[1] as f32 / 255.0,
        rgb[2] as f32 / 255.0,
        alpha,
    )
}

/// Screen rect of a sprite: top-left corner plus size
fn screen_rect(sprite: &Sprite) -> (f32, f32, f32, f32) {
    (
        sprite.left(),
        consts::WINDOW_HEIGHT - sprite.top(),
        sprite.size.x,
        sprite.size.y,
    )
}

fn draw_sprite(sprite: &Sprite) {
    if !sprite.visible {
        return;
    }
    let (x, y, w, h) = screen_rect(sprite);
    draw_rectangle(x, y, w, h, to_color(sprite.color, 1.0));

    // animated cores carry a rolling frame counter; show it as a band
    // drifting down the body
    if sprite.frame > 0 {
        let offset = (sprite.frame as f32) % (h - CORE_BAND_HEIGHT).max(1.0);
        draw_rectangle(
            x,
            y + offset,
            w,
            CORE_BAND_HEIGHT.min(h),
            Color::new(1.0, 1.0, 1.0, 0.55),
        );
    }
}

fn draw_group(stage: &Stage, group: GroupId) {
    for id in stage.members(group) {
        draw_sprite(stage.sprite(*id));
    }
}

/// Draw one frame of the world
pub fn draw_frame(tunnel: &Tunnel) {
    macroquad::window::clear_background(BLACK);
    let stage = tunnel.stage();

    let mut layers = tunnel.wave_layers();
    layers.sort_by_key(|(z, _)| *z);
    for (_, group) in layers {
        draw_group(stage, group);
    }

    draw_group(stage, tunnel.tunnel_walls());
    draw_group(stage, tunnel.hill_tops());
    draw_group(stage, tunnel.hill_bottoms());
    draw_sprite(stage.sprite(tunnel.ship().sprite()));
    draw_group(stage, tunnel.shots());

    let flash = tunnel.damage_level();
    if flash > 0.0 {
        let mut white = WHITE;
        white.a = flash.min(1.0) * FLASH_PEAK_ALPHA;
        draw_rectangle(0.0, 0.0, consts::WINDOW_WIDTH, consts::WINDOW_HEIGHT, white);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_rect_flips_y() {
        let mut sprite = Sprite::solid(64.0, 24.0, [255, 255, 255]);
        sprite.pos = glam::Vec2::new(100.0, 382.0);

        let (x, y, w, h) = screen_rect(&sprite);
        assert_eq!(x, 68.0);
        // top edge at 394 world lands 38 below the screen top
        assert_eq!(y, consts::WINDOW_HEIGHT - 394.0);
        assert_eq!((w, h), (64.0, 24.0));
    }

    #[test]
    fn test_to_color_normalizes_channels() {
        let c = to_color([255, 0, 51], 0.5);
        assert_eq!(c.r, 1.0);
        assert_eq!(c.g, 0.0);
        assert!((c.b - 0.2).abs() < 1e-6);
        assert_eq!(c.a, 0.5);
    }
}
