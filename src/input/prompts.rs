use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::Action;
use crate::ecs::World;
use crate::engine::{EngineError, System};
use crate::stream::{self, StreamError};

/// Which prompt sheet a binding is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    Keyboard,
    Mouse,
    Gamepad,
}

/// A frame on one of the prompt sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prompt<'a> {
    pub texture: &'a str,
    pub frame: u32,
}

/// Button-id to sheet-frame tables for drawing control hints.
///
/// Each table is a list of `[buttonId, frameIndex]` pairs, sorted by id
/// once loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ControlPrompts {
    pub keyboard_texture: String,
    pub mouse_texture: String,
    pub gamepad_texture: String,
    pub keyboard: Vec<(i32, u32)>,
    pub mouse: Vec<(i32, u32)>,
    pub gamepad: Vec<(i32, u32)>,
}

impl ControlPrompts {
    pub fn load(path: &Path) -> Result<Self, StreamError> {
        let json = stream::parse_file(path)?;
        let mut prompts: Self = serde_json::from_value(json)
            .map_err(|source| StreamError::Parse { path: path.to_path_buf(), source })?;
        prompts.sort();
        Ok(prompts)
    }

    /// Restores the sorted-by-id order lookups rely on. Later duplicates of
    /// an id are dropped.
    pub fn sort(&mut self) {
        for table in [&mut self.keyboard, &mut self.mouse, &mut self.gamepad] {
            table.sort_by_key(|&(id, _)| id);
            table.dedup_by_key(|&mut (id, _)| id);
        }
    }

    fn table(&self, device: Device) -> &[(i32, u32)] {
        match device {
            Device::Keyboard => &self.keyboard,
            Device::Mouse => &self.mouse,
            Device::Gamepad => &self.gamepad,
        }
    }

    pub fn texture(&self, device: Device) -> &str {
        match device {
            Device::Keyboard => &self.keyboard_texture,
            Device::Mouse => &self.mouse_texture,
            Device::Gamepad => &self.gamepad_texture,
        }
    }

    pub fn frame_for(&self, device: Device, id: i32) -> Option<u32> {
        let table = self.table(device);
        table.binary_search_by_key(&id, |&(id, _)| id).ok().map(|i| table[i].1)
    }

    /// Prompt for the first binding of `action` on `device`. Keyboard
    /// falls back to the mouse sheet for actions bound only to the mouse.
    pub fn prompt_for_action(&self, action: &Action, device: Device) -> Option<Prompt<'_>> {
        let candidates = match device {
            Device::Keyboard | Device::Mouse => {
                vec![(Device::Keyboard, &action.keyboard), (Device::Mouse, &action.mouse)]
            }
            Device::Gamepad => vec![(Device::Gamepad, &action.controller)],
        };
        candidates.into_iter().find_map(|(device, ids)| {
            let frame = ids.iter().find_map(|&id| self.frame_for(device, id))?;
            Some(Prompt { texture: self.texture(device), frame })
        })
    }
}

// ---------------------------------------------------------------------------
// ControlPromptSystem
// ---------------------------------------------------------------------------

/// Loads the prompt tables into the input state.
pub struct ControlPromptSystem {
    path: PathBuf,
}

impl ControlPromptSystem {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl System for ControlPromptSystem {
    fn name(&self) -> &'static str {
        "ControlPrompt"
    }

    fn on_init(&mut self, world: &mut World) -> Result<(), EngineError> {
        if !self.path.is_file() {
            log::info!("no control prompt file at {}", self.path.display());
            return Ok(());
        }
        world.input_mut().prompts = ControlPrompts::load(&self.path)?;
        Ok(())
    }
}
