use serde_json::{Map, Value};

use crate::ecs::{Component, ComponentType, Context, TypeTag};
use crate::events::NamedEvent;
use crate::serializable::{ReadMethodMap, Serializable};
use crate::stream;

/// Broadcasts a [`NamedEvent`] when it joins the scene and another when it
/// leaves. An empty name sends nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventEmitter {
    pub init_event: String,
    pub exit_event: String,
}

impl EventEmitter {
    pub fn new(init_event: impl Into<String>, exit_event: impl Into<String>) -> Self {
        Self { init_event: init_event.into(), exit_event: exit_event.into() }
    }

    fn emit(name: &str, cx: &mut Context<'_>) {
        if name.is_empty() {
            return;
        }
        let reached = cx.broadcast(&NamedEvent(name.to_owned()));
        log::debug!("\"{}\" emitted \"{name}\" to {reached} listener(s)", cx.entity_name());
    }

    /// `EventName` sets both events.
    fn read_event_name(&mut self, json: &Value) {
        stream::read(&mut self.init_event, json);
        self.exit_event = self.init_event.clone();
    }

    fn read_init_event_name(&mut self, json: &Value) { stream::read(&mut self.init_event, json); }
    fn read_exit_event_name(&mut self, json: &Value) { stream::read(&mut self.exit_event, json); }

    const READ_METHODS: &'static ReadMethodMap<Self> = &[
        ("EventName", Self::read_event_name),
        ("InitEventName", Self::read_init_event_name),
        ("ExitEventName", Self::read_exit_event_name),
    ];
}

impl Serializable for EventEmitter {
    fn read_methods() -> &'static ReadMethodMap<Self> { Self::READ_METHODS }

    fn write(&self) -> Value {
        let mut json = Map::new();
        json.insert("InitEventName".into(), stream::write(&self.init_event));
        json.insert("ExitEventName".into(), stream::write(&self.exit_event));
        Value::Object(json)
    }
}

impl Component for EventEmitter {
    fn on_init(&mut self, cx: &mut Context<'_>) {
        Self::emit(&self.init_event, cx);
    }

    fn on_exit(&mut self, cx: &mut Context<'_>) {
        Self::emit(&self.exit_event, cx);
    }
}

impl ComponentType for EventEmitter {
    const TAG: TypeTag = TypeTag::new("EventEmitter");
}
