//! The two demo categories: a gull that circles its spawn point while
//! alternating glide and flap animations, and a bouncing marker with a
//! compact-init-defaulted field block and a self-despawn timer.
//!
//! These are call sites for the runtime, not part of it; they exist so the
//! harness exercises every lifecycle path headlessly.

use z64_formats::anim::{AnimationClip, AnimationSet, ClipDef, ClipMode};
use z64_formats::compact_init::{self, InitEntry, InitScript, InitType};
use z64_formats::segment::{Segment, SegmentAddr};
use z64_runtime::math::{bin_cos, bin_sin};
use z64_runtime::registry::RegisterError;
use z64_runtime::{
    ActorCategory, ActorFlags, ActorId, ActorInstance, CategoryDescriptor, DrawCommand, DrawPass,
    FrameOps, ObjectId, Pose, Registry, World,
};

pub const GULL_ID: ActorId = ActorId(55);
pub const SHADOW_ID: ActorId = ActorId(61);
pub const BOUNCER_ID: ActorId = ActorId(60);

pub const GULL_OBJECT: ObjectId = ObjectId(134);
pub const KEEP_OBJECT: ObjectId = ObjectId(1);

/// Pack a gull spawn variable: high nibble is the elliptical factor, next
/// nibble is speed-1, bit 7 flips the flight direction, and the low seven
/// bits are (radius/64)-1.
pub fn pack_gull_variable(ellipse: u16, speed: u16, counter_clockwise: bool, radius: u16) -> u16 {
    (ellipse & 0xF) << 12
        | (speed & 0xF) << 8
        | u16::from(counter_clockwise) << 7
        | (radius & 0x7F)
}

pub fn register_all(registry: &mut Registry) -> Result<(), RegisterError> {
    registry.register(CategoryDescriptor {
        id: GULL_ID,
        category: ActorCategory::Npc,
        flags: ActorFlags::TARGETABLE | ActorFlags::FORCE_UPDATE | ActorFlags::FORCE_DRAW,
        object: GULL_OBJECT,
        instance_size: gull::SIZE,
        init_script: None,
        construct: gull::construct,
        destruct: None,
        update: Some(gull::update),
        draw: Some(gull::draw),
    })?;
    registry.register(CategoryDescriptor {
        id: SHADOW_ID,
        category: ActorCategory::Misc,
        flags: ActorFlags::FORCE_DRAW,
        object: KEEP_OBJECT,
        instance_size: 0,
        init_script: None,
        construct: shadow_construct,
        destruct: None,
        update: None,
        draw: Some(shadow_draw),
    })?;
    registry.register(CategoryDescriptor {
        id: BOUNCER_ID,
        category: ActorCategory::Misc,
        flags: ActorFlags::FORCE_UPDATE | ActorFlags::FORCE_DRAW,
        object: KEEP_OBJECT,
        instance_size: bouncer::SIZE,
        init_script: Some(bouncer::init_script()),
        construct: bouncer::construct,
        destruct: None,
        update: Some(bouncer::update),
        draw: Some(bouncer::draw),
    })?;
    Ok(())
}

fn shadow_construct(actor: &mut ActorInstance, _: &mut World, _: &mut FrameOps) {
    actor.set_uniform_scale(0.01);
}

fn shadow_draw(actor: &mut ActorInstance, _: &World, pass: &mut DrawPass) {
    pass.submit(DrawCommand::Marker { pose: actor.pose });
}

pub mod gull {
    use super::*;

    pub const SIZE: usize = 10;

    // Instance field offsets.
    const ANGLE: usize = 0;
    const FLAP: usize = 2;
    const ANIM: usize = 4;
    const SPEED: usize = 6;
    const RNG: usize = 8;

    pub const ANIM_GLIDE: i16 = 0;
    pub const ANIM_FLAP: i16 = 1;

    const SKELETON_OFFSET: u32 = 0xE68;
    const GLIDE_OFFSET: u32 = 0x58;
    const FLAP_OFFSET: u32 = 0x168;

    /// The gull's indexed clip table: glide loops slowly, flap loops fast
    /// and eases in over four frames so wing starts do not pop.
    pub fn clips() -> AnimationSet {
        let glide = SegmentAddr::new(Segment::Object, GLIDE_OFFSET).expect("static clip offset");
        let flap = SegmentAddr::new(Segment::Object, FLAP_OFFSET).expect("static clip offset");
        AnimationSet::new(vec![
            ClipDef {
                clip: AnimationClip::new(glide, 30.0),
                speed: 1.0,
                start_frame: 0.0,
                mode: ClipMode::Loop,
                blend_frames: 4.0,
            },
            ClipDef {
                clip: AnimationClip::new(flap, 20.0),
                speed: 1.0,
                start_frame: 0.0,
                mode: ClipMode::Loop,
                blend_frames: 4.0,
            },
        ])
    }

    /// 16-bit LCG standing in for the console RNG; state lives in the
    /// instance so runs are reproducible from the spawn variable alone.
    fn short_random(actor: &mut ActorInstance, base: i16, range: i16) -> i16 {
        let state = compact_init::read_u16(&actor.data, RNG).unwrap_or(1);
        let next = state.wrapping_mul(25173).wrapping_add(13849);
        let _ = compact_init::write_u16(&mut actor.data, RNG, next);
        if range <= 0 {
            return base;
        }
        base + (next % range as u16) as i16
    }

    pub fn construct(actor: &mut ActorInstance, _: &mut World, ops: &mut FrameOps) {
        actor.set_uniform_scale(0.01);
        let _ = actor.anim.change_clip_by_index(&clips(), ANIM_GLIDE as usize);

        let _ = compact_init::write_u16(&mut actor.data, RNG, actor.variable | 1);
        let _ = compact_init::write_i16(&mut actor.data, ANGLE, 0);
        let _ = compact_init::write_i16(&mut actor.data, FLAP, 100);
        let _ = compact_init::write_i16(&mut actor.data, ANIM, ANIM_GLIDE);

        let clockwise: i16 = if actor.variable & 0x80 != 0 { -1 } else { 1 };
        // Tilt into the turn.
        actor.pose.rotation.z = 15 * 182 * clockwise;

        let mut speed = clockwise * (((actor.variable >> 8) & 0xF) as i16 + 1) * 182;
        // Slow down on larger radii so the ground speed stays plausible.
        speed /= ((actor.variable & 0x7F) as i16 + 1) * 2;
        let _ = compact_init::write_i16(&mut actor.data, SPEED, speed);

        // A non-owning shadow marker under the spawn point.
        ops.spawn_attached(actor.handle, SHADOW_ID, Pose::at(actor.home.position), 0);
    }

    pub fn update(actor: &mut ActorInstance, _: &mut World, _: &mut FrameOps) {
        let angle = compact_init::read_i16(&actor.data, ANGLE).unwrap_or(0);
        let speed = compact_init::read_i16(&actor.data, SPEED).unwrap_or(0);

        let radius = ((actor.variable & 0x7F) as f32 + 1.0) * 64.0;
        let x = actor.home.position.x + radius * bin_cos(angle);
        // The elliptical factor squashes the orbit along z.
        let squash = (16.0 - f32::from(actor.variable >> 12)) / 16.0;
        let z = squash * (actor.home.position.z + radius * bin_sin(angle));

        actor.pose.rotation.y = angle.wrapping_neg();
        if speed < 0 {
            // Counter-clockwise flight faces the other way.
            actor.pose.rotation.y = actor.pose.rotation.y.wrapping_add(180 * 182);
        }
        actor.pose.position.x = x;
        actor.pose.position.z = z;
        let _ = compact_init::write_i16(&mut actor.data, ANGLE, angle.wrapping_add(speed));

        let flap = compact_init::read_i16(&actor.data, FLAP).unwrap_or(1) - 1;
        if flap == 0 {
            let current = compact_init::read_i16(&actor.data, ANIM).unwrap_or(ANIM_GLIDE);
            let (next_anim, duration) = if current == ANIM_GLIDE {
                // Flap one to three full wingbeats, buffering four frames to
                // settle back into the glide.
                (ANIM_FLAP, 20 * short_random(actor, 1, 3) + 4)
            } else {
                (ANIM_GLIDE, short_random(actor, 30, 30))
            };
            let _ = actor.anim.change_clip_by_index(&clips(), next_anim as usize);
            let _ = compact_init::write_i16(&mut actor.data, ANIM, next_anim);
            let _ = compact_init::write_i16(&mut actor.data, FLAP, duration);
        } else {
            let _ = compact_init::write_i16(&mut actor.data, FLAP, flap);
        }
    }

    pub fn draw(actor: &mut ActorInstance, _: &World, pass: &mut DrawPass) {
        actor.anim.advance(1.0);
        let skeleton =
            SegmentAddr::new(Segment::Object, SKELETON_OFFSET).expect("static skeleton offset");
        let animation = actor.anim.clip().map(|clip| clip.data);
        if let (Some(skeleton), Some(animation)) = (
            pass.resolve(skeleton),
            animation.and_then(|addr| pass.resolve(addr)),
        ) {
            pass.submit(DrawCommand::Skeleton {
                skeleton,
                animation,
                frame: actor.anim.current_frame(),
                blend_weight: actor.anim.blend_weight(),
                pose: actor.pose,
            });
        }
    }
}

pub mod bouncer {
    use super::*;

    pub const SIZE: usize = 8;

    const X: usize = 0;
    const Y: usize = 2;
    const FORWARD: usize = 4;
    const DOWNWARD: usize = 5;
    const COLOR: usize = 6;

    const MIN_X: i16 = 20;
    const MAX_X: i16 = 300;
    const MIN_Y: i16 = 10;
    const MAX_Y: i16 = 200;
    const MAX_COLORS: i16 = 12;

    /// Field defaults as a compact-init script rather than constructor code.
    pub fn init_script() -> InitScript {
        let entries = vec![
            InitEntry::new(InitType::S16, X as u16, MIN_X).expect("static entry"),
            InitEntry::new(InitType::S16, Y as u16, MIN_Y).expect("static entry"),
            InitEntry::new(InitType::U8, FORWARD as u16, 1).expect("static entry"),
            InitEntry::new(InitType::U8, DOWNWARD as u16, 1).expect("static entry"),
            InitEntry::new(InitType::U8Stop, COLOR as u16, MAX_COLORS - 1).expect("static entry"),
        ];
        InitScript::from_entries(entries).expect("static script")
    }

    pub fn construct(actor: &mut ActorInstance, _: &mut World, _: &mut FrameOps) {
        actor.set_uniform_scale(1.0);
    }

    pub fn update(actor: &mut ActorInstance, world: &mut World, ops: &mut FrameOps) {
        let mut x = compact_init::read_i16(&actor.data, X).unwrap_or(MIN_X);
        let mut y = compact_init::read_i16(&actor.data, Y).unwrap_or(MIN_Y);
        let mut forward = compact_init::read_u8(&actor.data, FORWARD).unwrap_or(1) != 0;
        let mut downward = compact_init::read_u8(&actor.data, DOWNWARD).unwrap_or(1) != 0;
        let color = compact_init::read_u8(&actor.data, COLOR).unwrap_or(0);

        if forward {
            x += 1;
            if x > MAX_X {
                forward = false;
            }
        } else {
            x -= 1;
            if x < MIN_X {
                forward = true;
            }
        }
        if downward {
            y += 1;
            if y > MAX_Y {
                downward = false;
            }
        } else {
            y -= 1;
            if y < MIN_Y {
                downward = true;
            }
        }

        let _ = compact_init::write_i16(&mut actor.data, X, x);
        let _ = compact_init::write_i16(&mut actor.data, Y, y);
        let _ = compact_init::write_u8(&mut actor.data, FORWARD, u8::from(forward));
        let _ = compact_init::write_u8(&mut actor.data, DOWNWARD, u8::from(downward));
        let _ = compact_init::write_u8(
            &mut actor.data,
            COLOR,
            ((i16::from(color) + 1) % MAX_COLORS) as u8,
        );

        actor.pose.position.x = f32::from(x);
        actor.pose.position.y = f32::from(y);

        // The spawn variable doubles as a lifetime in frames.
        if actor.variable != 0 && world.frame >= u32::from(actor.variable) {
            ops.despawn(actor.handle);
        }
    }

    pub fn draw(actor: &mut ActorInstance, _: &World, pass: &mut DrawPass) {
        pass.submit(DrawCommand::Marker { pose: actor.pose });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use z64_formats::segment::RamAddr;
    use z64_runtime::{RecordingBackend, ResourceLoader};

    fn host() -> (Registry, World, ResourceLoader) {
        let mut registry = Registry::new();
        register_all(&mut registry).unwrap();
        let mut loader = ResourceLoader::new();
        loader.load_object(GULL_OBJECT, RamAddr(0x8050_0000));
        loader.load_object(KEEP_OBJECT, RamAddr(0x8040_0000));
        (registry, World::new(), loader)
    }

    #[test]
    fn gull_spawns_with_an_attached_shadow() {
        let (mut registry, mut world, mut loader) = host();
        let gull = registry
            .spawn(&mut world, &mut loader, GULL_ID, Pose::default(), 0)
            .unwrap();
        assert_eq!(registry.count(ActorCategory::Misc), 1);
        let shadow = registry.first(ActorCategory::Misc).unwrap();
        assert!(registry.is_attached(shadow));
        assert_eq!(registry.get(gull).unwrap().child, Some(shadow));
    }

    #[test]
    fn gull_orbits_its_home_position() {
        let (mut registry, mut world, mut loader) = host();
        let variable = pack_gull_variable(0, 4, false, 0);
        let home = Pose::at(z64_runtime::Vec3f::new(100.0, 50.0, -40.0));
        let gull = registry
            .spawn(&mut world, &mut loader, GULL_ID, home, variable)
            .unwrap();
        for _ in 0..30 {
            registry.update_all(&mut world, &mut loader);
        }
        let instance = registry.get(gull).unwrap();
        // Radius for a zeroed low byte is 64 units.
        let distance = instance.pose.position.distance(home.position);
        assert!((distance - 64.0).abs() < 1.0, "distance {distance}");
        // The orbit is planar; altitude stays where the gull spawned.
        assert_eq!(instance.pose.position.y, 50.0);
    }

    #[test]
    fn gull_alternates_glide_and_flap() {
        let (mut registry, mut world, mut loader) = host();
        let gull = registry
            .spawn(&mut world, &mut loader, GULL_ID, Pose::default(), 0)
            .unwrap();
        // The first glide period is 100 updates.
        for _ in 0..99 {
            registry.update_all(&mut world, &mut loader);
        }
        let anim = compact_init::read_i16(&registry.get(gull).unwrap().data, 4);
        assert_eq!(anim, Some(gull::ANIM_GLIDE));
        registry.update_all(&mut world, &mut loader);
        let anim = compact_init::read_i16(&registry.get(gull).unwrap().data, 4);
        assert_eq!(anim, Some(gull::ANIM_FLAP));
        assert!(registry.get(gull).unwrap().anim.is_blending());
    }

    #[test]
    fn bouncer_defaults_come_from_the_script() {
        let (mut registry, mut world, mut loader) = host();
        let bouncer = registry
            .spawn(&mut world, &mut loader, BOUNCER_ID, Pose::default(), 0)
            .unwrap();
        let data = &registry.get(bouncer).unwrap().data;
        assert_eq!(compact_init::read_i16(data, 0), Some(20));
        assert_eq!(compact_init::read_i16(data, 2), Some(10));
        assert_eq!(compact_init::read_u8(data, 6), Some(11));
    }

    #[test]
    fn bouncer_expires_after_its_lifetime() {
        let (mut registry, mut world, mut loader) = host();
        let bouncer = registry
            .spawn(&mut world, &mut loader, BOUNCER_ID, Pose::default(), 10)
            .unwrap();
        for _ in 0..9 {
            registry.update_all(&mut world, &mut loader);
        }
        assert!(registry.get(bouncer).is_some());
        registry.update_all(&mut world, &mut loader);
        assert!(registry.get(bouncer).is_none());
    }

    #[test]
    fn draw_pass_emits_one_command_per_visible_actor() {
        let (mut registry, mut world, mut loader) = host();
        registry
            .spawn(&mut world, &mut loader, GULL_ID, Pose::default(), 0)
            .unwrap();
        registry
            .spawn(&mut world, &mut loader, BOUNCER_ID, Pose::default(), 0)
            .unwrap();
        registry.update_all(&mut world, &mut loader);
        let mut backend = RecordingBackend::new();
        registry.draw_all(&world, &mut loader, &mut backend);
        // Gull skeleton, shadow marker, bouncer marker.
        assert_eq!(backend.commands().len(), 3);
        assert!(backend
            .commands()
            .iter()
            .any(|command| matches!(command, DrawCommand::Skeleton { .. })));
    }
}
