use crate::common as rc;
use textlay_core::input::PointerEvent;
use textlay_core::*;
use textlay_ui::TextOverlay;

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::platform::android::EventLoopBuilderExtAndroid;
use winit::platform::android::activity::AndroidApp;
use winit::window::{Window, WindowAttributes};

#[derive(Clone, Copy, Debug)]
pub struct AndroidOptions {
    pub clear_color: Color,
    /// If true, runner keeps requesting frames (costs battery).
    pub continuous_redraw: bool,
    pub show_hud: bool,
}

impl Default for AndroidOptions {
    fn default() -> Self {
        Self {
            clear_color: Color::from_hex("#121212"),
            continuous_redraw: false,
            show_hud: false,
        }
    }
}

pub fn run_android_app<M: TextMeasurer + 'static>(
    app: AndroidApp,
    overlay: TextOverlay<M>,
    options: AndroidOptions,
) -> anyhow::Result<()> {
    let event_loop = winit::event_loop::EventLoop::builder()
        .with_android_app(app)
        .build()?;

    struct AppState<M: TextMeasurer> {
        options: AndroidOptions,
        host: rc::OverlayHost<M>,
        window: Option<Arc<Window>>,
        backend: Option<textlay_render_wgpu::WgpuBackend>,
    }

    impl<M: TextMeasurer> AppState<M> {
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
    }

    impl<M: TextMeasurer> ApplicationHandler<()> for AppState<M> {
        fn resumed(&mut self, el: &winit::event_loop::ActiveEventLoop) {
            if self.window.is_some() {
                return;
            }

            match el.create_window(WindowAttributes::default().with_title("Textlay")) {
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
                            log::error!("WGPU backend init failed: {e:?}");
                            el.exit();
                        }
                    }
                }
                Err(e) => {
                    log::error!("Window create failed: {e:?}");
                    el.exit();
                }
            }
        }

        fn suspended(&mut self, _el: &winit::event_loop::ActiveEventLoop) {
            // The native window goes away while paused; a new one comes with
            // the next resume.
            log::debug!("suspended; dropping surface");
            self.backend = None;
            self.window = None;
        }

        fn window_event(
            &mut self,
            el: &winit::event_loop::ActiveEventLoop,
            _id: winit::window::WindowId,
            event: WindowEvent,
        ) {
            match event {
                WindowEvent::CloseRequested => el.exit(),

                WindowEvent::Resized(size) => {
                    if let Some(b) = &mut self.backend {
                        b.configure_surface(size.width, size.height);
                    }
                    self.host.dirty = true;
                    self.request_redraw();
                }

                WindowEvent::Touch(t) => {
                    let pos = Vec2::new(t.location.x as f32, t.location.y as f32);
                    let pe = PointerEvent::touch(t.id, rc::touch_phase_kind(t.phase), pos);
                    if self.host.dispatch(pe.into()) {
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
            // Only redraw if needed (unless continuous_redraw is enabled).
            if (self.options.continuous_redraw || self.host.dirty) && self.has_area() {
                self.request_redraw();
            }
        }
    }

    let mut app_state = AppState {
        host: rc::OverlayHost::new(overlay, options.show_hud),
        options,
        window: None,
        backend: None,
    };
    event_loop.run_app(&mut app_state)?;
    Ok(())
}
