use serde_json::{Map, Value};

use super::Asset;
use crate::serializable::{ReadMethodMap, Serializable};
use crate::stream;
use crate::warning;

/// A run of sprite-sheet frames played over a fixed duration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationAsset {
    pub frame_start: u32,
    pub frame_end: u32,
    /// Seconds for one pass over every frame.
    pub duration: f32,
    pub looping: bool,
}

impl AnimationAsset {
    pub fn frame_count(&self) -> u32 {
        self.frame_end - self.frame_start + 1
    }

    /// Sheet frame shown `time` seconds after the animation started.
    pub fn frame_at(&self, time: f32) -> u32 {
        let count = self.frame_count();
        if self.duration <= 0.0 || time <= 0.0 {
            return self.frame_start;
        }
        let step = (time / (self.duration / count as f32)) as u32;
        let offset = if self.looping { step % count } else { step.min(count - 1) };
        self.frame_start + offset
    }

    /// Whether a non-looping animation has played through.
    pub fn is_finished(&self, time: f32) -> bool {
        !self.looping && time >= self.duration
    }

    fn read_frame_start(&mut self, json: &Value) { stream::read(&mut self.frame_start, json); }
    fn read_frame_end(&mut self, json: &Value) { stream::read(&mut self.frame_end, json); }
    fn read_duration(&mut self, json: &Value) { stream::read(&mut self.duration, json); }
    fn read_looping(&mut self, json: &Value) { stream::read(&mut self.looping, json); }

    const READ_METHODS: &'static ReadMethodMap<Self> = &[
        ("FrameStart", Self::read_frame_start),
        ("FrameEnd", Self::read_frame_end),
        ("Duration", Self::read_duration),
        ("Looping", Self::read_looping),
    ];
}

impl Serializable for AnimationAsset {
    fn read_methods() -> &'static ReadMethodMap<Self> { Self::READ_METHODS }

    fn after_load(&mut self) {
        if self.frame_end < self.frame_start {
            warning!(
                "animation: frame end {} is before frame start {}, swapping",
                self.frame_end,
                self.frame_start
            );
            std::mem::swap(&mut self.frame_start, &mut self.frame_end);
        }
        if self.duration < 0.0 {
            warning!("animation: negative duration {} clamped to 0", self.duration);
            self.duration = 0.0;
        }
    }

    fn write(&self) -> Value {
        let mut json = Map::new();
        json.insert("FrameStart".into(), stream::write(&self.frame_start));
        json.insert("FrameEnd".into(), stream::write(&self.frame_end));
        json.insert("Duration".into(), stream::write(&self.duration));
        json.insert("Looping".into(), stream::write(&self.looping));
        Value::Object(json)
    }
}

impl Asset for AnimationAsset {
    const LIBRARY: &'static str = "Animations";
}
