use serde_json::{Map, Value};

use super::Asset;
use crate::serializable::{ReadMethodMap, Serializable};
use crate::stream;
use crate::warning;

/// A playable sound file and how to play it.
#[derive(Debug, Clone, PartialEq)]
pub struct Sound {
    pub filepath: String,
    pub volume: f32,
    pub pitch: f32,
    pub looping: bool,
    /// Channel group the sound is routed through.
    pub channel: String,
}

impl Default for Sound {
    fn default() -> Self {
        Self {
            filepath: String::new(),
            volume: 1.0,
            pitch: 1.0,
            looping: false,
            channel: "sfx".to_string(),
        }
    }
}

impl Sound {
    fn read_filepath(&mut self, json: &Value) { stream::read(&mut self.filepath, json); }
    fn read_volume(&mut self, json: &Value) { stream::read(&mut self.volume, json); }
    fn read_pitch(&mut self, json: &Value) { stream::read(&mut self.pitch, json); }
    fn read_looping(&mut self, json: &Value) { stream::read(&mut self.looping, json); }
    fn read_channel(&mut self, json: &Value) { stream::read(&mut self.channel, json); }

    const READ_METHODS: &'static ReadMethodMap<Self> = &[
        ("Filepath", Self::read_filepath),
        ("Volume", Self::read_volume),
        ("Pitch", Self::read_pitch),
        ("Looping", Self::read_looping),
        ("Channel", Self::read_channel),
    ];
}

impl Serializable for Sound {
    fn read_methods() -> &'static ReadMethodMap<Self> { Self::READ_METHODS }

    fn after_load(&mut self) {
        if self.volume < 0.0 {
            warning!("sound \"{}\": negative volume {} clamped to 0", self.filepath, self.volume);
            self.volume = 0.0;
        }
        if self.pitch <= 0.0 {
            warning!("sound \"{}\": pitch {} must be positive", self.filepath, self.pitch);
            self.pitch = 1.0;
        }
    }

    fn write(&self) -> Value {
        let mut json = Map::new();
        json.insert("Filepath".into(), stream::write(&self.filepath));
        json.insert("Volume".into(), stream::write(&self.volume));
        json.insert("Pitch".into(), stream::write(&self.pitch));
        json.insert("Looping".into(), stream::write(&self.looping));
        json.insert("Channel".into(), stream::write(&self.channel));
        Value::Object(json)
    }
}

impl Asset for Sound {
    const LIBRARY: &'static str = "Sounds";
}
