use textlay_core::input::{InputEvent, PinchEvent, PointerEventKind};
use textlay_core::*;
use textlay_devtools::Inspector;
use textlay_ui::{DrawScope, TextOverlay};

/// Pixels per wheel "line" when a device reports pixel deltas.
pub(crate) const WHEEL_LINE_PX: f64 = 40.0;

/// Each wheel line zooms by 10%.
pub(crate) fn wheel_zoom_factor(lines: f32) -> f32 {
    1.1f32.powf(lines)
}

/// Trackpad pinch deltas are relative to the previous step.
pub(crate) fn gesture_zoom_factor(delta: f64) -> f32 {
    (1.0 + delta).max(0.0) as f32
}

pub(crate) fn pinch(scale: f32, focus: Vec2) -> InputEvent {
    InputEvent::Pinch(PinchEvent { scale, focus })
}

#[cfg(any(feature = "desktop", feature = "android"))]
pub(crate) fn touch_phase_kind(phase: winit::event::TouchPhase) -> PointerEventKind {
    use textlay_core::input::PointerButton;
    use winit::event::TouchPhase;
    match phase {
        TouchPhase::Started => PointerEventKind::Down(PointerButton::Primary),
        TouchPhase::Moved => PointerEventKind::Move,
        TouchPhase::Ended => PointerEventKind::Up(PointerButton::Primary),
        TouchPhase::Cancelled => PointerEventKind::Cancel,
    }
}

/// What a runner keeps between frames: the overlay, the HUD and whether
/// anything changed since the last frame.
pub(crate) struct OverlayHost<M: TextMeasurer> {
    pub overlay: TextOverlay<M>,
    pub inspector: Inspector,
    pub dirty: bool,
}

impl<M: TextMeasurer> OverlayHost<M> {
    pub fn new(overlay: TextOverlay<M>, show_hud: bool) -> Self {
        let mut inspector = Inspector::new();
        inspector.enabled = show_hud;
        Self {
            overlay,
            inspector,
            dirty: true,
        }
    }

    /// Returns whether a new frame is wanted.
    pub fn dispatch(&mut self, event: InputEvent) -> bool {
        let handled = self.overlay.handle_input(&event);
        if self.overlay.take_redraw_request() {
            self.dirty = true;
        }
        // The HUD shows the active item, which changes on press and release
        // without the overlay asking for a redraw.
        if self.inspector.enabled
            && let InputEvent::Pointer(pe) = event
            && !matches!(pe.event, PointerEventKind::Move)
        {
            self.dirty = true;
        }
        handled && self.dirty
    }

    pub fn toggle_hud(&mut self) {
        self.inspector.toggle();
        self.dirty = true;
    }

    /// `None` while the window has no area: clamping against a 0×0 surface
    /// would pile every item into the corner. `dirty` stays set so the frame
    /// is retried once the size comes back.
    pub fn compose(&mut self, width: u32, height: u32, clear_color: Color) -> Option<Scene> {
        if width == 0 || height == 0 {
            return None;
        }
        let mut scope = DrawScope::new(Size::new(width as f32, height as f32));
        self.overlay.draw(&mut scope);
        let mut scene = scope.into_scene(clear_color);
        self.inspector.frame(
            &mut scene,
            &self.overlay.item_bounds(),
            self.overlay.active_index(),
        );
        self.overlay.take_redraw_request();
        self.dirty = false;
        Some(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use textlay_core::input::{PointerButton, PointerEvent};

    fn host(show_hud: bool) -> OverlayHost<MonospaceMeasurer> {
        let mut overlay = TextOverlay::new(MonospaceMeasurer::default());
        overlay.add_text("A", 30.0, Color::RED);
        OverlayHost::new(overlay, show_hud)
    }

    fn touch(id: u64, event: PointerEventKind, x: f32, y: f32) -> InputEvent {
        PointerEvent::touch(id, event, Vec2::new(x, y)).into()
    }

    #[test]
    fn test_wheel_zoom_factor() {
        assert_eq!(wheel_zoom_factor(0.0), 1.0);
        assert!((wheel_zoom_factor(1.0) - 1.1).abs() < 1e-6);
        assert!((wheel_zoom_factor(-1.0) - 1.0 / 1.1).abs() < 1e-6);
    }

    #[test]
    fn test_gesture_zoom_factor_never_negative() {
        assert_eq!(gesture_zoom_factor(0.5), 1.5);
        assert_eq!(gesture_zoom_factor(-2.0), 0.0);
    }

    #[test]
    fn test_compose_clears_dirty() {
        let mut h = host(false);
        assert!(h.dirty);
        let scene = h.compose(800, 600, Color::BLACK).expect("scene");
        assert!(!h.dirty);
        assert_eq!(scene.clear_color, Color::BLACK);
        assert_eq!(scene.nodes.len(), 1);
    }

    #[test]
    fn test_drag_marks_dirty() {
        let mut h = host(false);
        h.compose(800, 600, Color::BLACK);

        // press alone changes nothing visible
        assert!(!h.dispatch(touch(0, PointerEventKind::Down(PointerButton::Primary), 55.0, 20.0)));
        assert!(h.dispatch(touch(0, PointerEventKind::Move, 100.0, 100.0)));
        h.compose(800, 600, Color::BLACK);
        assert_eq!(h.overlay.items()[0].position, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_hud_redraws_on_press() {
        let mut h = host(true);
        h.compose(800, 600, Color::BLACK);
        assert!(h.dispatch(touch(0, PointerEventKind::Down(PointerButton::Primary), 55.0, 20.0)));

        // text, active fill, border, status line
        let scene = h.compose(800, 600, Color::BLACK).expect("scene");
        assert_eq!(scene.nodes.len(), 4);
    }

    #[test]
    fn test_pinch_without_active_item_is_quiet() {
        let mut h = host(false);
        h.compose(800, 600, Color::BLACK);
        assert!(!h.dispatch(pinch(2.0, Vec2::new(0.0, 0.0))));
        assert_eq!(h.overlay.items()[0].font_size, 30.0);
    }

    #[test]
    fn test_zero_sized_window_keeps_positions() {
        let mut h = host(false);
        h.overlay.add_text("B", 30.0, Color::BLUE);
        h.compose(800, 600, Color::BLACK);
        let before: Vec<Vec2> = h.overlay.items().iter().map(|i| i.position).collect();

        // minimised
        h.dirty = true;
        assert!(h.compose(0, 0, Color::BLACK).is_none());
        assert!(h.compose(800, 0, Color::BLACK).is_none());
        assert!(h.dirty);

        h.compose(800, 600, Color::BLACK);
        let after: Vec<Vec2> = h.overlay.items().iter().map(|i| i.position).collect();
        assert_eq!(before, vec![Vec2::new(50.0, 30.0), Vec2::new(50.0, 80.0)]);
        assert_eq!(after, before);
    }
}
