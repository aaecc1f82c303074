//! Platform runners (desktop via winit; Android)
//!
//! A runner owns the window, the wgpu backend and one [`TextOverlay`]. It
//! translates window events into [`InputEvent`]s, and on every redraw lets the
//! overlay clamp and record itself before handing the scene to the backend.
//!
//! [`TextOverlay`]: textlay_ui::TextOverlay
//! [`InputEvent`]: textlay_core::input::InputEvent

use textlay_core::*;

#[cfg(any(feature = "desktop", feature = "android", test))]
mod common;

#[cfg(all(feature = "android", target_os = "android"))]
pub mod android;

#[derive(Clone, Debug)]
pub struct DesktopOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: Color,
    /// If true, runner keeps requesting frames even when nothing changed.
    pub continuous_redraw: bool,
    /// Start with the debug HUD on; F12 toggles it either way.
    pub show_hud: bool,
}

impl Default for DesktopOptions {
    fn default() -> Self {
        Self {
            title: "Textlay".to_string(),
            width: 1280,
            height: 800,
            clear_color: Color::from_hex("#121212"),
            continuous_redraw: false,
            show_hud: false,
        }
    }
}

#[cfg(feature = "desktop")]
pub fn run_desktop_app<M: TextMeasurer + 'static>(
    overlay: textlay_ui::TextOverlay<M>,
    options: DesktopOptions,
) -> anyhow::Result<()> {
    use std::sync::Arc;

    use textlay_core::input::{
        InputEvent, Modifiers, PointerButton, PointerEvent, PointerEventKind,
    };
    use winit::application::ApplicationHandler;
    use winit::dpi::PhysicalSize;
    use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
    use winit::event_loop::EventLoop;
    use winit::keyboard::{KeyCode, PhysicalKey};
    use winit::window::{Window, WindowAttributes};

    use crate::common as rc;

    struct App<M: TextMeasurer> {
        options: DesktopOptions,
        host: rc::OverlayHost<M>,
        window: Option<Arc<Window>>,
        backend: Option<textlay_render_wgpu::WgpuBackend>,
        mouse_pos: Vec2,
        mouse_down: bool,
        modifiers: Modifiers,
    }

    impl<M: TextMeasurer> App<M> {
        fn request_redraw(&self) {
            if let Some(w) = &self.window {
                w.request_redraw();
            }
        }

        /// False while minimised; frames wait for the next `Resized`.
        fn has_area(&self) -> bool {
            self.window.as_ref().is_some_and(|w| {
                let size = w.inner_size();
                size.width > 0 && size.height > 0
            })
        }

        fn dispatch(&mut self, event: InputEvent) {
            if self.host.dispatch(event) {
                self.request_redraw();
            }
        }

        fn mouse(&mut self, event: PointerEventKind) {
            let pe = PointerEvent::mouse(event, self.mouse_pos, self.modifiers);
            self.dispatch(pe.into());
        }
    }

    impl<M: TextMeasurer> ApplicationHandler<()> for App<M> {
        fn resumed(&mut self, el: &winit::event_loop::ActiveEventLoop) {
            if self.window.is_some() {
                return;
            }
            match el.create_window(
                WindowAttributes::default()
                    .with_title(self.options.title.clone())
                    .with_inner_size(PhysicalSize::new(self.options.width, self.options.height)),
            ) {
                Ok(win) => {
                    let w = Arc::new(win);
                    match textlay_render_wgpu::WgpuBackend::new(w.clone()) {
                        Ok(b) => {
                            self.backend = Some(b);
                            self.window = Some(w);
                            self.host.dirty = true;
                            self.request_redraw();
                        }
                        Err(e) => {
                            log::error!("Failed to create WGPU backend: {e:?}");
                            el.exit();
                        }
                    }
                }
                Err(e) => {
                    log::error!("Failed to create window: {e:?}");
                    el.exit();
                }
            }
        }

        fn window_event(
            &mut self,
            el: &winit::event_loop::ActiveEventLoop,
            _id: winit::window::WindowId,
            event: WindowEvent,
        ) {
            match event {
                WindowEvent::CloseRequested => {
                    log::info!("Window close requested");
                    el.exit();
                }
                WindowEvent::Resized(size) => {
                    if let Some(b) = &mut self.backend {
                        b.configure_surface(size.width, size.height);
                    }
                    self.host.dirty = true;
                    self.request_redraw();
                }
                WindowEvent::ModifiersChanged(new_mods) => {
                    self.modifiers.shift = new_mods.state().shift_key();
                    self.modifiers.ctrl = new_mods.state().control_key();
                    self.modifiers.alt = new_mods.state().alt_key();
                    self.modifiers.meta = new_mods.state().super_key();
                }
                WindowEvent::CursorMoved { position, .. } => {
                    self.mouse_pos = Vec2::new(position.x as f32, position.y as f32);
                    if self.mouse_down {
                        self.mouse(PointerEventKind::Move);
                    }
                }
                WindowEvent::MouseInput {
                    state,
                    button: MouseButton::Left,
                    ..
                } => match state {
                    ElementState::Pressed if !self.mouse_down => {
                        self.mouse_down = true;
                        self.mouse(PointerEventKind::Down(PointerButton::Primary));
                    }
                    ElementState::Released if self.mouse_down => {
                        self.mouse_down = false;
                        self.mouse(PointerEventKind::Up(PointerButton::Primary));
                    }
                    _ => {}
                },
                WindowEvent::CursorLeft { .. } if self.mouse_down => {
                    self.mouse_down = false;
                    self.mouse(PointerEventKind::Cancel);
                }
                WindowEvent::Touch(t) => {
                    let pos = Vec2::new(t.location.x as f32, t.location.y as f32);
                    let pe = PointerEvent::touch(t.id, rc::touch_phase_kind(t.phase), pos);
                    self.dispatch(pe.into());
                }
                WindowEvent::PinchGesture { delta, .. } => {
                    let factor = rc::gesture_zoom_factor(delta);
                    self.dispatch(rc::pinch(factor, self.mouse_pos));
                }
                WindowEvent::MouseWheel { delta, .. } if self.modifiers.ctrl => {
                    let lines = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y,
                        MouseScrollDelta::PixelDelta(p) => (p.y / rc::WHEEL_LINE_PX) as f32,
                    };
                    log::trace!("ctrl+wheel {lines}");
                    if lines != 0.0 {
                        self.dispatch(rc::pinch(rc::wheel_zoom_factor(lines), self.mouse_pos));
                    }
                }
                WindowEvent::KeyboardInput {
                    event: key_event, ..
                } => {
                    if key_event.state == ElementState::Pressed
                        && !key_event.repeat
                        && key_event.physical_key == PhysicalKey::Code(KeyCode::F12)
                    {
                        self.host.toggle_hud();
                        self.request_redraw();
                    }
                }
                WindowEvent::RedrawRequested => {
                    let (Some(backend), Some(win)) = (self.backend.as_mut(), self.window.as_ref())
                    else {
                        return;
                    };
                    let size = win.inner_size();
                    let Some(scene) =
                        self.host
                            .compose(size.width, size.height, self.options.clear_color)
                    else {
                        return;
                    };
                    backend.frame(&scene);

                    if self.options.continuous_redraw {
                        win.request_redraw();
                    }
                }
                _ => {}
            }
        }

        fn about_to_wait(&mut self, _el: &winit::event_loop::ActiveEventLoop) {
            if (self.options.continuous_redraw || self.host.dirty) && self.has_area() {
                self.request_redraw();
            }
        }
    }

    let event_loop = EventLoop::new()?;
    let mut app = App {
        host: rc::OverlayHost::new(overlay, options.show_hud),
        options,
        window: None,
        backend: None,
        mouse_pos: Vec2::default(),
        mouse_down: false,
        modifiers: Modifiers::default(),
    };
    event_loop.run_app(&mut app)?;
    Ok(())
}
