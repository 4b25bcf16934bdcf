//! The shared per-frame context handed to every lifecycle hook.

use serde::{Deserialize, Serialize};

use crate::math::Vec3f;

/// Global state threaded through every lifecycle hook. The dispatcher itself
/// only touches the frame counter, the player position (to refresh each
/// actor's distance), and the proximity ranges; everything else is the
/// hooks' business.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    /// Frames elapsed since the current mode started; bumped by
    /// [`crate::Registry::update_all`].
    pub frame: u32,
    pub player_position: Vec3f,
    pub camera_position: Vec3f,
    /// Actors farther than this from the player skip update unless flagged
    /// `FORCE_UPDATE`.
    pub update_range: f32,
    /// Actors farther than this from the player skip draw unless flagged
    /// `FORCE_DRAW`.
    pub draw_range: f32,
}

impl World {
    pub fn new() -> World {
        World::default()
    }
}

impl Default for World {
    fn default() -> World {
        World {
            frame: 0,
            player_position: Vec3f::ZERO,
            camera_position: Vec3f::ZERO,
            update_range: f32::INFINITY,
            draw_range: f32::INFINITY,
        }
    }
}
