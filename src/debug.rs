//! Frame timing and the warning console.

use std::collections::VecDeque;

use crate::diag;
use crate::ecs::World;
use crate::engine::System;
use crate::input::keys;

/// Frames of history kept for the frame-time graph.
pub const FRAME_HISTORY: usize = 60;

/// Lines of the warning ring shown in the console.
pub const CONSOLE_LINES: usize = 20;

/// Tracks frame times and exposes recent warnings. F1 toggles the overlay.
#[derive(Debug, Default)]
pub struct DebugSystem {
    frame_times: VecDeque<f32>,
    visible: bool,
}

impl DebugSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn frame_times(&self) -> &VecDeque<f32> {
        &self.frame_times
    }

    pub fn record_frame(&mut self, dt: f32) {
        if self.frame_times.len() >= FRAME_HISTORY {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(dt);
    }

    /// Mean of the recorded frame times, or 0 with no history.
    pub fn average_frame_time(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32
    }

    pub fn fps(&self) -> f32 {
        let average = self.average_frame_time();
        if average > 0.0 { 1.0 / average } else { 0.0 }
    }

    /// Most recent warnings, oldest first.
    pub fn console(&self) -> Vec<String> {
        let recent = diag::recent();
        let skip = recent.len().saturating_sub(CONSOLE_LINES);
        recent.into_iter().skip(skip).collect()
    }

    /// One-line summary of the world for the overlay header.
    pub fn summary(&self, world: &World) -> String {
        let mut registries: Vec<String> = world
            .registries()
            .tags()
            .map(|tag| format!("{tag}:{}", world.registry(tag).len()))
            .collect();
        registries.sort();
        let mut line = format!(
            "tick {} | {:.0} fps | {} entities | {}",
            world.time().tick,
            self.fps(),
            world.len(),
            registries.join(" ")
        );
        let listeners = world.events().summary();
        if !listeners.is_empty() {
            let listeners: Vec<String> = listeners.iter().map(|(event, count)| format!("{event}:{count}")).collect();
            line.push_str(&format!(" | listening {}", listeners.join(" ")));
        }
        line
    }
}

impl System for DebugSystem {
    fn name(&self) -> &'static str {
        "Debug"
    }

    fn on_fixed_update(&mut self, world: &mut World) {
        if world.input().is_key_pressed(keys::F1) {
            self.visible = !self.visible;
        }
    }

    fn on_update(&mut self, _world: &mut World, dt: f32) {
        self.record_frame(dt);
    }

    fn on_draw(&mut self, world: &World) {
        if self.visible && world.time().tick % 60 == 0 {
            log::debug!("{}", self.summary(world));
        }
    }
}
