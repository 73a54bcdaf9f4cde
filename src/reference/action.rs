use serde_json::Value;

use super::{read_name, write_name};
use crate::input::{Action, ActionId, InputState};

/// Handle to an input action by name. Registered with the input state while
/// its owner is in a scene, so reloading the action file rebinds it.
#[derive(Debug, Default)]
pub struct ActionReference {
    name: String,
    action: Option<ActionId>,
}

impl ActionReference {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), action: None }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> Option<ActionId> {
        self.action
    }

    pub fn get<'i>(&self, input: &'i InputState) -> Option<&'i Action> {
        input.action(self.action?)
    }

    pub fn is_down(&self, input: &InputState) -> bool {
        self.get(input).is_some_and(Action::is_down)
    }

    pub fn is_triggered(&self, input: &InputState) -> bool {
        self.get(input).is_some_and(Action::is_triggered)
    }

    pub fn is_released(&self, input: &InputState) -> bool {
        self.get(input).is_some_and(Action::is_released)
    }

    pub fn value(&self, input: &InputState) -> f32 {
        self.get(input).map_or(0.0, |action| action.value(input))
    }

    pub(crate) fn bind(&mut self, action: Option<ActionId>) {
        self.action = action;
    }

    /// Reads `{ "ActionName": name }` or a bare name string.
    pub fn read(&mut self, json: &Value) {
        read_name(&mut self.name, "ActionName", json);
        self.action = None;
    }

    pub fn write(&self) -> Value {
        write_name("ActionName", &self.name)
    }
}

/// Clones come back unbound.
impl Clone for ActionReference {
    fn clone(&self) -> Self {
        Self { name: self.name.clone(), action: None }
    }
}
