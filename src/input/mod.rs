//! Raw button state, named actions and the Input system.
//!
//! Buttons are identified by stable numeric ids (GLFW numbering, see
//! [`keys`]) so action files and prompt sheets stay independent of the
//! windowing backend.

mod action;
pub mod keys;
mod prompts;

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use glam::Vec2;

use crate::ecs::{ReferenceKey, World};
use crate::engine::{EngineError, System};
use crate::stream;

pub use action::{Action, ActionId, ActionSet};
pub use prompts::{ControlPromptSystem, ControlPrompts, Device, Prompt};

/// A raw input source that can be bound to an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    Keyboard(i32),
    Mouse(i32),
    Controller(i32),
}

impl InputSource {
    pub fn device(self) -> Device {
        match self {
            Self::Keyboard(_) => Device::Keyboard,
            Self::Mouse(_) => Device::Mouse,
            Self::Controller(_) => Device::Gamepad,
        }
    }
}

/// Button and axis state as of the last fixed tick, plus the action roster.
#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<InputSource>,
    pressed: HashSet<InputSource>,
    released: HashSet<InputSource>,
    /// Edges reported by the platform since the last tick.
    incoming_pressed: HashSet<InputSource>,
    incoming_released: HashSet<InputSource>,
    axes: HashMap<i32, f32>,

    pub mouse_pos: Vec2,
    pub mouse_wheel: f32,
    last_device: Option<Device>,

    actions: Vec<Action>,
    watchers: Vec<ReferenceKey>,
    pub(crate) prompts: ControlPrompts,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Platform events ----------------------------------------------------

    pub fn press(&mut self, source: InputSource) {
        if self.held.insert(source) {
            self.incoming_pressed.insert(source);
        }
    }

    pub fn release(&mut self, source: InputSource) {
        if self.held.remove(&source) {
            self.incoming_released.insert(source);
        }
    }

    /// Sets a controller axis, in `[-1, 1]`.
    pub fn set_axis(&mut self, axis: i32, value: f32) {
        self.axes.insert(axis, value.clamp(-1.0, 1.0));
    }

    /// Drops every held button, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        let held: Vec<InputSource> = self.held.iter().copied().collect();
        for source in held {
            self.release(source);
        }
        self.axes.clear();
    }

    /// Publishes the edges collected since the previous tick and updates
    /// every action. Each edge is visible for exactly one tick.
    pub fn begin_tick(&mut self) {
        self.pressed = std::mem::take(&mut self.incoming_pressed);
        self.released = std::mem::take(&mut self.incoming_released);
        if let Some(source) = self.pressed.iter().next() {
            self.last_device = Some(source.device());
        }

        let mut actions = std::mem::take(&mut self.actions);
        for action in &mut actions {
            action.update(self);
        }
        self.actions = actions;
    }

    // -- Raw queries --------------------------------------------------------

    pub fn is_held(&self, source: InputSource) -> bool { self.held.contains(&source) }
    pub fn is_pressed(&self, source: InputSource) -> bool { self.pressed.contains(&source) }
    pub fn is_released(&self, source: InputSource) -> bool { self.released.contains(&source) }

    pub fn is_key_held(&self, key: i32) -> bool { self.is_held(InputSource::Keyboard(key)) }
    pub fn is_key_pressed(&self, key: i32) -> bool { self.is_pressed(InputSource::Keyboard(key)) }
    pub fn is_key_released(&self, key: i32) -> bool { self.is_released(InputSource::Keyboard(key)) }

    pub fn axis(&self, axis: i32) -> f32 {
        self.axes.get(&axis).copied().unwrap_or(0.0)
    }

    /// Device of the most recent press, for picking prompt sheets.
    pub fn last_device(&self) -> Option<Device> {
        self.last_device
    }

    /// Returns true if the mouse is currently within the given bounds.
    pub fn is_mouse_over(&self, min: Vec2, max: Vec2) -> bool {
        self.mouse_pos.cmpge(min).all() && self.mouse_pos.cmplt(max).all()
    }

    // -- Actions ------------------------------------------------------------

    /// Replaces the action roster. Follow with
    /// [`World::rebind_actions`] so live references pick up the new ids.
    pub fn set_actions(&mut self, actions: Vec<Action>) {
        self.actions = actions;
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn action(&self, id: ActionId) -> Option<&Action> {
        self.actions.get(id.0)
    }

    pub fn action_id(&self, name: &str) -> Option<ActionId> {
        self.actions.iter().position(|a| a.name == name).map(ActionId)
    }

    pub fn find_action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    pub fn prompts(&self) -> &ControlPrompts {
        &self.prompts
    }

    pub(crate) fn watch(&mut self, reference: ReferenceKey) {
        if !self.watchers.contains(&reference) {
            self.watchers.push(reference);
        }
    }

    pub(crate) fn unwatch(&mut self, reference: ReferenceKey) {
        self.watchers.retain(|r| *r != reference);
    }

    /// Action references currently registered.
    pub fn watchers(&self) -> &[ReferenceKey] {
        &self.watchers
    }
}

// ---------------------------------------------------------------------------
// InputSystem
// ---------------------------------------------------------------------------

/// Loads the action file and publishes input edges at the start of every
/// fixed tick.
pub struct InputSystem {
    actions_file: PathBuf,
}

impl InputSystem {
    pub fn new(actions_file: impl Into<PathBuf>) -> Self {
        Self { actions_file: actions_file.into() }
    }

    /// Reads the action file again and rebinds every action reference.
    pub fn reload(&self, world: &mut World) -> Result<(), stream::StreamError> {
        if !self.actions_file.is_file() {
            log::info!("no action file at {}", self.actions_file.display());
            return Ok(());
        }
        let mut set = ActionSet::default();
        stream::read_file(&mut set, &self.actions_file)?;
        log::debug!("loaded {} input actions", set.actions.len());
        world.input_mut().set_actions(set.actions);
        world.rebind_actions();
        Ok(())
    }
}

impl System for InputSystem {
    fn name(&self) -> &'static str {
        "Input"
    }

    fn on_init(&mut self, world: &mut World) -> Result<(), EngineError> {
        self.reload(world)?;
        Ok(())
    }

    fn on_fixed_update(&mut self, world: &mut World) {
        world.input_mut().begin_tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_last_one_tick() {
        let mut input = InputState::new();
        input.press(InputSource::Keyboard(keys::SPACE));
        input.begin_tick();
        assert!(input.is_key_pressed(keys::SPACE));
        assert!(input.is_key_held(keys::SPACE));

        input.begin_tick();
        assert!(!input.is_key_pressed(keys::SPACE));
        assert!(input.is_key_held(keys::SPACE));
    }

    #[test]
    fn tap_between_ticks_still_reports_both_edges() {
        let mut input = InputState::new();
        input.press(InputSource::Mouse(keys::MOUSE_LEFT));
        input.release(InputSource::Mouse(keys::MOUSE_LEFT));
        input.begin_tick();
        assert!(input.is_pressed(InputSource::Mouse(keys::MOUSE_LEFT)));
        assert!(input.is_released(InputSource::Mouse(keys::MOUSE_LEFT)));
        assert!(!input.is_held(InputSource::Mouse(keys::MOUSE_LEFT)));
        assert_eq!(input.last_device(), Some(Device::Mouse));
    }

    #[test]
    fn axes_are_clamped() {
        let mut input = InputState::new();
        input.set_axis(0, 3.0);
        assert_eq!(input.axis(0), 1.0);
        assert_eq!(input.axis(1), 0.0);
    }
}
