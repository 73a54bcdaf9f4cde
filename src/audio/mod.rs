//! Sound playback through named channel groups.
//!
//! Components never touch the audio device. They push requests onto the
//! [`AudioQueue`] owned by the world, and the [`AudioSystem`] drains it once
//! per frame.

use std::collections::HashMap;

use kira::{
    manager::{AudioManager, AudioManagerSettings, backend::DefaultBackend},
    sound::{PlaybackRate, static_sound::{StaticSoundData, StaticSoundSettings}},
    track::{TrackBuilder, TrackHandle},
    tween::Tween,
    Volume,
};

use crate::assets::Sound;
use crate::ecs::World;
use crate::engine::{EngineError, System};

/// Something a component asked the audio system to do.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCommand {
    Play(Sound),
    SetVolume { channel: String, volume: f32 },
}

/// Requests queued since the audio system last ran.
#[derive(Debug, Default)]
pub struct AudioQueue {
    commands: Vec<AudioCommand>,
}

impl AudioQueue {
    pub fn play(&mut self, sound: &Sound) {
        self.commands.push(AudioCommand::Play(sound.clone()));
    }

    pub fn set_channel_volume(&mut self, channel: impl Into<String>, volume: f32) {
        self.commands.push(AudioCommand::SetVolume { channel: channel.into(), volume: volume.max(0.0) });
    }

    pub fn pending(&self) -> &[AudioCommand] {
        &self.commands
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, AudioCommand> {
        self.commands.drain(..)
    }
}

// ── ChannelGroups ───────────────────────────────────────────────────────────

/// Volume per channel group name. "master", "music" and "sfx" are only
/// conventions; any name may be used.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelGroups {
    volumes: HashMap<String, f32>,
}

impl ChannelGroups {
    pub fn new(volumes: HashMap<String, f32>) -> Self {
        Self { volumes }
    }

    pub fn volume(&self, channel: &str) -> f32 {
        self.volumes.get(channel).copied().unwrap_or(1.0)
    }

    pub fn set_volume(&mut self, channel: &str, volume: f32) {
        self.volumes.insert(channel.to_string(), volume);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.volumes.keys().map(String::as_str)
    }
}

impl Default for ChannelGroups {
    fn default() -> Self {
        let volumes = ["master", "music", "sfx"].into_iter().map(|name| (name.to_string(), 1.0)).collect();
        Self { volumes }
    }
}

// ── AudioSystem ─────────────────────────────────────────────────────────────

struct Device {
    manager: AudioManager,
    tracks: HashMap<String, TrackHandle>,
    sounds: HashMap<String, StaticSoundData>,
}

impl Device {
    fn open() -> Option<Self> {
        match AudioManager::<DefaultBackend>::new(AudioManagerSettings::default()) {
            Ok(manager) => Some(Self { manager, tracks: HashMap::new(), sounds: HashMap::new() }),
            Err(err) => {
                log::warn!("failed to initialize audio device: {err}. Audio disabled.");
                None
            }
        }
    }

    fn track(&mut self, channel: &str, volume: f32) -> Option<&TrackHandle> {
        if !self.tracks.contains_key(channel) {
            match self.manager.add_sub_track(TrackBuilder::new()) {
                Ok(mut track) => {
                    let _ = track.set_volume(Volume::Amplitude(volume as f64), Tween::default());
                    self.tracks.insert(channel.to_string(), track);
                }
                Err(err) => {
                    log::warn!("could not create audio channel \"{channel}\": {err}");
                    return None;
                }
            }
        }
        self.tracks.get(channel)
    }

    fn sound(&mut self, path: &str) -> Option<StaticSoundData> {
        if let Some(data) = self.sounds.get(path) {
            return Some(data.clone());
        }
        match StaticSoundData::from_file(path) {
            Ok(data) => {
                self.sounds.insert(path.to_string(), data.clone());
                Some(data)
            }
            Err(err) => {
                log::warn!("failed to load sound {path}: {err}");
                None
            }
        }
    }

    fn play(&mut self, sound: &Sound, channel_volume: f32) {
        let Some(data) = self.sound(&sound.filepath) else { return };
        let Some(track) = self.track(&sound.channel, channel_volume) else { return };

        let mut settings = StaticSoundSettings::new().output_destination(track);
        if sound.looping {
            settings = settings.loop_region(0.0..);
        }
        settings.volume = Volume::Amplitude(sound.volume.max(0.0) as f64).into();
        settings.playback_rate = PlaybackRate::Factor(sound.pitch as f64).into();

        if let Err(err) = self.manager.play(data.with_settings(settings)) {
            log::warn!("failed to play {}: {err}", sound.filepath);
        }
    }
}

/// Drains the world's [`AudioQueue`] into the audio device.
pub struct AudioSystem {
    device: Option<Device>,
    channels: ChannelGroups,
    played: u64,
}

impl AudioSystem {
    pub fn new(channels: ChannelGroups) -> Self {
        Self { device: Device::open(), channels, played: 0 }
    }

    /// An audio system that never opens a device. Requests are counted and
    /// dropped.
    pub fn headless(channels: ChannelGroups) -> Self {
        Self { device: None, channels, played: 0 }
    }

    pub fn is_available(&self) -> bool {
        self.device.is_some()
    }

    pub fn channels(&self) -> &ChannelGroups {
        &self.channels
    }

    /// Play requests handled so far, including those dropped without a device.
    pub fn played(&self) -> u64 {
        self.played
    }

    fn run(&mut self, command: AudioCommand) {
        match command {
            AudioCommand::Play(sound) => {
                self.played += 1;
                let volume = self.channels.volume(&sound.channel);
                if let Some(device) = self.device.as_mut() {
                    device.play(&sound, volume);
                }
            }
            AudioCommand::SetVolume { channel, volume } => {
                self.channels.set_volume(&channel, volume);
                if let Some(track) = self.device.as_mut().and_then(|d| d.tracks.get_mut(&channel)) {
                    let _ = track.set_volume(Volume::Amplitude(volume as f64), Tween::default());
                }
            }
        }
    }
}

impl System for AudioSystem {
    fn name(&self) -> &'static str {
        "Audio"
    }

    fn on_init(&mut self, _world: &mut World) -> Result<(), EngineError> {
        if let Some(device) = self.device.as_mut() {
            let channels: Vec<(String, f32)> =
                self.channels.names().map(|name| (name.to_string(), self.channels.volume(name))).collect();
            for (name, volume) in channels {
                device.track(&name, volume);
            }
        }
        Ok(())
    }

    fn on_update(&mut self, world: &mut World, _dt: f32) {
        let commands: Vec<AudioCommand> = world.audio_mut().drain().collect();
        for command in commands {
            self.run(command);
        }
    }

    fn on_exit(&mut self, world: &mut World) {
        world.audio_mut().drain();
        self.device = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_system_drains_and_tracks_volumes() {
        let mut world = World::new();
        let mut audio = AudioSystem::headless(ChannelGroups::default());
        let hit = Sound { filepath: "hit.ogg".into(), ..Sound::default() };

        world.audio_mut().play(&hit);
        world.audio_mut().set_channel_volume("music", 0.25);
        world.audio_mut().set_channel_volume("ambience", -1.0);
        assert_eq!(world.audio().pending().len(), 3);

        audio.on_update(&mut world, 0.016);
        assert!(world.audio().pending().is_empty());
        assert_eq!(audio.played(), 1);
        assert_eq!(audio.channels().volume("music"), 0.25);
        assert_eq!(audio.channels().volume("ambience"), 0.0);
        assert_eq!(audio.channels().volume("sfx"), 1.0);
    }
}
