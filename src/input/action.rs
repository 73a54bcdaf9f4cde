use serde_json::{Map, Value};

use super::{InputSource, InputState};
use crate::serializable::{ReadMethodMap, Serializable};
use crate::stream;

/// Index of an action in the [`InputState`] roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId(pub(super) usize);

impl ActionId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A named control bound to any number of buttons and axes.
///
/// Positive bindings push the value towards `1`, negative ones towards
/// `-1`. Any held binding on either side counts as the action being down.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Action {
    pub name: String,
    pub keyboard: Vec<i32>,
    pub keyboard_negative: Vec<i32>,
    pub mouse: Vec<i32>,
    pub mouse_negative: Vec<i32>,
    pub controller: Vec<i32>,
    pub controller_negative: Vec<i32>,
    pub axes: Vec<i32>,

    down: bool,
    triggered: bool,
    released: bool,
}

impl Action {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn with_keys(mut self, keys: &[i32]) -> Self {
        self.keyboard.extend_from_slice(keys);
        self
    }

    pub fn with_negative_keys(mut self, keys: &[i32]) -> Self {
        self.keyboard_negative.extend_from_slice(keys);
        self
    }

    pub fn with_mouse(mut self, buttons: &[i32]) -> Self {
        self.mouse.extend_from_slice(buttons);
        self
    }

    pub fn with_axes(mut self, axes: &[i32]) -> Self {
        self.axes.extend_from_slice(axes);
        self
    }

    /// Held on this tick.
    pub fn is_down(&self) -> bool { self.down }
    /// Became held on this tick.
    pub fn is_triggered(&self) -> bool { self.triggered }
    /// Stopped being held on this tick.
    pub fn is_released(&self) -> bool { self.released }

    /// Every positive and negative binding, keyboard first.
    pub fn sources(&self) -> impl Iterator<Item = InputSource> + '_ {
        let keys = self.keyboard.iter().chain(&self.keyboard_negative).map(|&id| InputSource::Keyboard(id));
        let mouse = self.mouse.iter().chain(&self.mouse_negative).map(|&id| InputSource::Mouse(id));
        let pads =
            self.controller.iter().chain(&self.controller_negative).map(|&id| InputSource::Controller(id));
        keys.chain(mouse).chain(pads)
    }

    fn positive(&self) -> impl Iterator<Item = InputSource> + '_ {
        let keys = self.keyboard.iter().map(|&id| InputSource::Keyboard(id));
        let mouse = self.mouse.iter().map(|&id| InputSource::Mouse(id));
        let pads = self.controller.iter().map(|&id| InputSource::Controller(id));
        keys.chain(mouse).chain(pads)
    }

    fn negative(&self) -> impl Iterator<Item = InputSource> + '_ {
        let keys = self.keyboard_negative.iter().map(|&id| InputSource::Keyboard(id));
        let mouse = self.mouse_negative.iter().map(|&id| InputSource::Mouse(id));
        let pads = self.controller_negative.iter().map(|&id| InputSource::Controller(id));
        keys.chain(mouse).chain(pads)
    }

    /// Positive minus negative buttons plus every bound axis, in `[-1, 1]`.
    pub fn value(&self, input: &InputState) -> f32 {
        let positive = self.positive().any(|s| input.is_held(s));
        let negative = self.negative().any(|s| input.is_held(s));
        let buttons = positive as i32 as f32 - negative as i32 as f32;
        let axes: f32 = self.axes.iter().map(|&axis| input.axis(axis)).sum();
        (buttons + axes).clamp(-1.0, 1.0)
    }

    pub(super) fn update(&mut self, input: &InputState) {
        let was_down = self.down;
        let down = self.sources().any(|s| input.is_held(s));
        self.down = down;
        let pressed = self.sources().any(|s| input.is_pressed(s));
        let released = self.sources().any(|s| input.is_released(s));
        // A press and release between two ticks still reports both edges.
        self.triggered = !was_down && (self.down || pressed);
        self.released = !self.down && (was_down || (pressed && released));
    }

    fn read_name(&mut self, json: &Value) { stream::read(&mut self.name, json); }
    fn read_keyboard(&mut self, json: &Value) { stream::read_array(&mut self.keyboard, json); }
    fn read_keyboard_negative(&mut self, json: &Value) { stream::read_array(&mut self.keyboard_negative, json); }
    fn read_mouse(&mut self, json: &Value) { stream::read_array(&mut self.mouse, json); }
    fn read_mouse_negative(&mut self, json: &Value) { stream::read_array(&mut self.mouse_negative, json); }
    fn read_controller(&mut self, json: &Value) { stream::read_array(&mut self.controller, json); }
    fn read_controller_negative(&mut self, json: &Value) {
        stream::read_array(&mut self.controller_negative, json);
    }
    fn read_axes(&mut self, json: &Value) { stream::read_array(&mut self.axes, json); }

    const READ_METHODS: &'static ReadMethodMap<Self> = &[
        ("Name", Self::read_name),
        ("KeyboardButtons", Self::read_keyboard),
        ("KeyboardNegative", Self::read_keyboard_negative),
        ("MouseButtons", Self::read_mouse),
        ("MouseNegative", Self::read_mouse_negative),
        ("ControllerButtons", Self::read_controller),
        ("ControllerNegative", Self::read_controller_negative),
        ("ControllerAxes", Self::read_axes),
    ];
}

impl Serializable for Action {
    fn read_methods() -> &'static ReadMethodMap<Self> { Self::READ_METHODS }

    fn write(&self) -> Value {
        let mut json = Map::new();
        json.insert("Name".into(), stream::write(&self.name));
        json.insert("KeyboardButtons".into(), stream::write_array(&self.keyboard));
        json.insert("KeyboardNegative".into(), stream::write_array(&self.keyboard_negative));
        json.insert("MouseButtons".into(), stream::write_array(&self.mouse));
        json.insert("MouseNegative".into(), stream::write_array(&self.mouse_negative));
        json.insert("ControllerButtons".into(), stream::write_array(&self.controller));
        json.insert("ControllerNegative".into(), stream::write_array(&self.controller_negative));
        json.insert("ControllerAxes".into(), stream::write_array(&self.axes));
        Value::Object(json)
    }
}

/// The action file: `{ "Actions": [ ... ] }`.
#[derive(Debug, Clone, Default)]
pub struct ActionSet {
    pub actions: Vec<Action>,
}

impl ActionSet {
    fn read_actions(&mut self, json: &Value) { stream::read_objects(&mut self.actions, json); }

    const READ_METHODS: &'static ReadMethodMap<Self> = &[("Actions", Self::read_actions)];
}

impl Serializable for ActionSet {
    fn read_methods() -> &'static ReadMethodMap<Self> { Self::READ_METHODS }

    fn after_load(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.actions.retain(|action| {
            let fresh = seen.insert(action.name.clone());
            if !fresh {
                crate::warning!("duplicate input action \"{}\" ignored", action.name);
            }
            fresh
        });
    }

    fn write(&self) -> Value {
        let mut json = Map::new();
        json.insert("Actions".into(), stream::write_objects(&self.actions));
        Value::Object(json)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::input::keys;

    fn jump_state() -> InputState {
        let mut input = InputState::new();
        input.set_actions(vec![Action::named("Jump").with_keys(&[keys::SPACE, keys::W])]);
        input
    }

    #[test]
    fn triggered_and_released_fire_for_one_tick() {
        let mut input = jump_state();
        let jump = input.action_id("Jump").unwrap();

        input.press(InputSource::Keyboard(keys::SPACE));
        input.begin_tick();
        let action = input.action(jump).unwrap();
        assert!(action.is_down() && action.is_triggered());

        input.begin_tick();
        let action = input.action(jump).unwrap();
        assert!(action.is_down() && !action.is_triggered());

        input.release(InputSource::Keyboard(keys::SPACE));
        input.begin_tick();
        let action = input.action(jump).unwrap();
        assert!(!action.is_down() && action.is_released());
    }

    #[test]
    fn second_binding_does_not_retrigger() {
        let mut input = jump_state();
        input.press(InputSource::Keyboard(keys::SPACE));
        input.begin_tick();
        input.press(InputSource::Keyboard(keys::W));
        input.begin_tick();
        let action = input.find_action("Jump").unwrap();
        assert!(action.is_down() && !action.is_triggered());
        input.release(InputSource::Keyboard(keys::SPACE));
        input.begin_tick();
        assert!(!input.find_action("Jump").unwrap().is_released());
    }

    #[test]
    fn value_combines_sides_and_axes() {
        let mut input = InputState::new();
        let horizontal = Action::named("Horizontal")
            .with_keys(&[keys::D])
            .with_negative_keys(&[keys::A])
            .with_axes(&[0]);
        input.set_actions(vec![horizontal]);

        input.press(InputSource::Keyboard(keys::D));
        input.begin_tick();
        assert_eq!(input.find_action("Horizontal").unwrap().value(&input), 1.0);

        input.press(InputSource::Keyboard(keys::A));
        input.set_axis(0, -0.25);
        input.begin_tick();
        assert_eq!(input.find_action("Horizontal").unwrap().value(&input), -0.25);
    }

    #[test]
    fn reads_action_file_and_drops_duplicates() {
        crate::diag::drain();
        let mut set = ActionSet::default();
        stream::read_object(
            &mut set,
            &json!({ "Actions": [
                { "Name": "Fire", "MouseButtons": [0] },
                { "Name": "Fire", "KeyboardButtons": [70] }
            ]}),
        );
        assert_eq!(set.actions.len(), 1);
        assert_eq!(set.actions[0].mouse, vec![0]);
        assert_eq!(crate::diag::drain().len(), 1);
    }
}
