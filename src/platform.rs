//! The windowed runner: a winit event loop feeding input into an
//! [`Engine`] and driving one engine frame per redraw.

use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use crate::config::WindowSettings;
use crate::engine::{Engine, EngineError};
use crate::input::{InputSource, keys};

/// Runs `engine` in a window until it is closed or the world asks to quit.
/// The engine must already be initialized.
pub fn run(engine: &mut Engine, settings: &WindowSettings) -> Result<(), EngineError> {
    let event_loop = EventLoop::new()?;
    let mut app = App { engine, settings: settings.clone(), window: None, last_instant: None, error: None };
    event_loop.run_app(&mut app)?;
    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

// ── App (winit ApplicationHandler) ──────────────────────────────────────────

struct App<'e> {
    engine: &'e mut Engine,
    settings: WindowSettings,
    window: Option<Window>,
    last_instant: Option<Instant>,
    error: Option<EngineError>,
}

impl App<'_> {
    fn button(&mut self, source: InputSource, state: ElementState) {
        let input = self.engine.world_mut().input_mut();
        match state {
            ElementState::Pressed => input.press(source),
            ElementState::Released => input.release(source),
        }
    }
}

impl ApplicationHandler for App<'_> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attributes = Window::default_attributes()
            .with_title(&self.settings.title)
            .with_inner_size(winit::dpi::PhysicalSize::new(self.settings.width, self.settings.height))
            .with_resizable(false);
        match event_loop.create_window(attributes) {
            Ok(window) => self.window = Some(window),
            Err(err) => {
                self.error = Some(err.into());
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Focused(false) => self.engine.world_mut().input_mut().release_all(),

            WindowEvent::CursorMoved { position, .. } => {
                self.engine.world_mut().input_mut().mouse_pos =
                    glam::Vec2::new(position.x as f32, position.y as f32);
            }

            WindowEvent::MouseInput { button, state, .. } => {
                if let Some(id) = keys::from_mouse_button(button) {
                    self.button(InputSource::Mouse(id), state);
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let input = self.engine.world_mut().input_mut();
                match delta {
                    MouseScrollDelta::LineDelta(_, y) => input.mouse_wheel = y,
                    MouseScrollDelta::PixelDelta(pos) => input.mouse_wheel = (pos.y / 100.0) as f32,
                }
            }

            WindowEvent::KeyboardInput {
                event: KeyEvent { physical_key: PhysicalKey::Code(code), state, repeat: false, .. },
                ..
            } => {
                if let Some(id) = keys::from_key_code(code) {
                    self.button(InputSource::Keyboard(id), state);
                }
            }

            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let elapsed = match self.last_instant {
                    Some(prev) => now.duration_since(prev).as_secs_f32(),
                    None => self.engine.world().time().fixed_dt,
                };
                self.last_instant = Some(now);

                self.engine.frame(elapsed);
                self.engine.world_mut().input_mut().mouse_wheel = 0.0;
                if self.engine.world().quit_requested() {
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }
}
