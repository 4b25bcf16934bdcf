//! Skeletal-animation playback state, owned per actor instance.
//!
//! Draw hooks advance the player once per frame and read the current frame
//! (and blend weight, while a transition is in flight) to pose the skeleton.
//! Playback has two steady states, wrap-around looping and clamped segment
//! play, plus a transient blend window entered by switching clips with a
//! nonzero blend duration.

use thiserror::Error;

use z64_formats::anim::{AnimationClip, AnimationSet, ClipMode};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AnimError {
    #[error("animation set has no clip at index {0}")]
    NoSuchClip(usize),
}

/// Result of one [`AnimationPlayer::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Playing,
    /// Segment mode hit the boundary it was moving toward this call. Callers
    /// typically react by switching clips.
    SegmentComplete,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Blend {
    remaining: f32,
    duration: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationPlayer {
    clip: Option<AnimationClip>,
    current_frame: f32,
    start_frame: f32,
    total_frames: f32,
    speed: f32,
    mode: ClipMode,
    blend: Option<Blend>,
}

impl AnimationPlayer {
    /// An idle player with no clip; advancing it is a no-op.
    pub fn new() -> AnimationPlayer {
        AnimationPlayer {
            clip: None,
            current_frame: 0.0,
            start_frame: 0.0,
            total_frames: 0.0,
            speed: 0.0,
            mode: ClipMode::Loop,
            blend: None,
        }
    }

    pub fn clip(&self) -> Option<&AnimationClip> {
        self.clip.as_ref()
    }

    pub fn current_frame(&self) -> f32 {
        self.current_frame
    }

    pub fn total_frames(&self) -> f32 {
        self.total_frames
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn mode(&self) -> ClipMode {
        self.mode
    }

    pub fn is_blending(&self) -> bool {
        self.blend.is_some()
    }

    /// Progress of the active blend in `[0, 1]`; `1.0` once (or when no
    /// blend is in flight) the new clip fully owns the pose.
    pub fn blend_weight(&self) -> f32 {
        match self.blend {
            Some(blend) if blend.duration > 0.0 => {
                (1.0 - blend.remaining / blend.duration).clamp(0.0, 1.0)
            }
            _ => 1.0,
        }
    }

    /// Switch to `clip` immediately: the new clip, range, speed, and mode
    /// take effect on this frame, not the next. A positive `blend_frames`
    /// arms a blend window so the visible pose eases over instead of
    /// popping; the frame counter still jumps to `start_frame` at once.
    pub fn change_clip(
        &mut self,
        clip: AnimationClip,
        speed: f32,
        start_frame: f32,
        mode: ClipMode,
        blend_frames: f32,
    ) {
        self.total_frames = clip.frame_count;
        self.clip = Some(clip);
        self.speed = speed;
        self.start_frame = start_frame;
        self.current_frame = start_frame;
        self.mode = mode;
        // A new request while a blend is in flight restarts the window
        // toward the newest target.
        self.blend = (blend_frames > 0.0).then_some(Blend {
            remaining: blend_frames,
            duration: blend_frames,
        });
    }

    /// Switch by index into a category's clip table, pulling every playback
    /// parameter from the definition.
    pub fn change_clip_by_index(
        &mut self,
        set: &AnimationSet,
        index: usize,
    ) -> Result<(), AnimError> {
        let def = set.get(index).ok_or(AnimError::NoSuchClip(index))?;
        self.change_clip(
            def.clip,
            def.speed,
            def.start_frame,
            def.mode,
            def.blend_frames,
        );
        Ok(())
    }

    /// Advance playback by `delta_frames` host frames (scaled by the clip
    /// speed, which may be negative for reverse play).
    ///
    /// Loop mode wraps into `[0, total)`. Segment mode clamps into
    /// `[0, total - 1]` and reports [`Advance::SegmentComplete`] on any call
    /// that lands on the boundary the motion is heading toward. A clip with
    /// zero frames is a static pose and is never divided or wrapped.
    pub fn advance(&mut self, delta_frames: f32) -> Advance {
        if let Some(blend) = self.blend.as_mut() {
            blend.remaining -= delta_frames.abs();
            if blend.remaining <= 0.0 {
                self.blend = None;
            }
        }

        if self.total_frames <= 0.0 {
            return Advance::Playing;
        }

        let next = self.current_frame + self.speed * delta_frames;
        match self.mode {
            ClipMode::Loop => {
                self.current_frame = next.rem_euclid(self.total_frames);
                Advance::Playing
            }
            ClipMode::Segment => {
                let last = (self.total_frames - 1.0).max(0.0);
                self.current_frame = next.clamp(0.0, last);
                let complete = if self.speed >= 0.0 {
                    next >= last
                } else {
                    next <= 0.0
                };
                if complete {
                    Advance::SegmentComplete
                } else {
                    Advance::Playing
                }
            }
        }
    }

    /// Whether playback currently sits on `frame`. Compares integral parts
    /// so a fractional per-frame step cannot hop over a trigger frame.
    pub fn is_at_frame(&self, frame: f32) -> bool {
        self.current_frame.floor() == frame.floor()
    }
}

impl Default for AnimationPlayer {
    fn default() -> AnimationPlayer {
        AnimationPlayer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use z64_formats::segment::{Segment, SegmentAddr};

    fn clip(frames: f32) -> AnimationClip {
        AnimationClip::new(SegmentAddr::new(Segment::Object, 0x58).unwrap(), frames)
    }

    fn player(frames: f32, speed: f32, start: f32, mode: ClipMode) -> AnimationPlayer {
        let mut p = AnimationPlayer::new();
        p.change_clip(clip(frames), speed, start, mode, 0.0);
        p
    }

    #[test]
    fn loop_mode_wraps_modulo_total() {
        let mut p = player(20.0, 3.0, 19.0, ClipMode::Loop);
        assert_eq!(p.advance(1.0), Advance::Playing);
        assert_eq!(p.current_frame(), 2.0);
    }

    #[test]
    fn loop_mode_wraps_backward_play() {
        let mut p = player(20.0, -3.0, 1.0, ClipMode::Loop);
        p.advance(1.0);
        assert_eq!(p.current_frame(), 18.0);
    }

    #[test]
    fn segment_mode_clamps_and_reports_completion() {
        let mut p = player(20.0, 5.0, 18.0, ClipMode::Segment);
        assert_eq!(p.advance(1.0), Advance::SegmentComplete);
        assert_eq!(p.current_frame(), 19.0);
    }

    #[test]
    fn segment_mode_before_the_boundary_keeps_playing() {
        let mut p = player(20.0, 5.0, 0.0, ClipMode::Segment);
        assert_eq!(p.advance(1.0), Advance::Playing);
        assert_eq!(p.current_frame(), 5.0);
    }

    #[test]
    fn segment_mode_completes_at_zero_when_reversed() {
        let mut p = player(20.0, -5.0, 3.0, ClipMode::Segment);
        assert_eq!(p.advance(1.0), Advance::SegmentComplete);
        assert_eq!(p.current_frame(), 0.0);
    }

    #[test]
    fn zero_frame_clip_is_a_static_pose() {
        let mut p = player(0.0, 2.0, 0.0, ClipMode::Loop);
        assert_eq!(p.advance(1.0), Advance::Playing);
        assert_eq!(p.current_frame(), 0.0);
    }

    #[test]
    fn blend_window_elapses_into_steady_state() {
        let mut p = player(30.0, 1.0, 0.0, ClipMode::Loop);
        p.change_clip(clip(20.0), 1.0, 0.0, ClipMode::Segment, 4.0);
        assert!(p.is_blending());
        assert!(p.blend_weight() < 1.0);
        for _ in 0..4 {
            p.advance(1.0);
        }
        assert!(!p.is_blending());
        assert_eq!(p.blend_weight(), 1.0);
        assert_eq!(p.mode(), ClipMode::Segment);
    }

    #[test]
    fn blend_weight_rises_monotonically() {
        let mut p = player(30.0, 1.0, 0.0, ClipMode::Loop);
        p.change_clip(clip(20.0), 1.0, 0.0, ClipMode::Loop, 10.0);
        let mut previous = p.blend_weight();
        for _ in 0..10 {
            p.advance(1.0);
            let weight = p.blend_weight();
            assert!(weight >= previous);
            previous = weight;
        }
        assert_eq!(previous, 1.0);
    }

    #[test]
    fn clip_switch_takes_effect_immediately() {
        let mut p = player(30.0, 1.0, 12.0, ClipMode::Loop);
        p.change_clip(clip(20.0), 2.0, 5.0, ClipMode::Loop, 0.0);
        assert_eq!(p.current_frame(), 5.0);
        assert_eq!(p.total_frames(), 20.0);
        assert_eq!(p.speed(), 2.0);
    }

    #[test]
    fn frame_triggers_compare_integral_parts() {
        let mut p = player(20.0, 0.4, 0.0, ClipMode::Loop);
        p.advance(1.0);
        p.advance(1.0);
        p.advance(1.0);
        // 1.2000001-ish; still "at" frame 1.
        assert!(p.is_at_frame(1.0));
        assert!(!p.is_at_frame(2.0));
    }

    #[test]
    fn change_by_index_pulls_the_definition() {
        use z64_formats::anim::{AnimationSet, ClipDef};
        let set = AnimationSet::new(vec![ClipDef {
            clip: clip(20.0),
            speed: 1.0,
            start_frame: 0.0,
            mode: ClipMode::Loop,
            blend_frames: 4.0,
        }]);
        let mut p = AnimationPlayer::new();
        p.change_clip_by_index(&set, 0).unwrap();
        assert!(p.is_blending());
        assert_eq!(p.total_frames(), 20.0);
        assert_eq!(
            p.change_clip_by_index(&set, 3),
            Err(AnimError::NoSuchClip(3))
        );
    }
}
