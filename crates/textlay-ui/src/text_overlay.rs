//! Draggable, pinch-scalable text labels.
//!
//! Items are kept in insertion order, which is also paint order and hit-test
//! priority: when labels overlap, the one added first wins the touch even
//! though it is painted underneath.
//!
//! Positions are only pulled back inside the surface when a frame is drawn.
//! A drag can leave an item outside the surface until then, and a hit test in
//! between sees that unclamped position.

use std::cell::Cell;

use textlay_core::input::*;
use textlay_core::*;

use crate::canvas::DrawScope;
use crate::gestures::{ScaleConfig, ScaleGestureDetector};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayConfig {
    pub min_font_size: f32,
    pub max_font_size: f32,
    /// Left edge for newly added items.
    pub default_x: f32,
    /// Vertical gap between stacked new items.
    pub line_gap: f32,
    pub scale: ScaleConfig,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            min_font_size: 20.0,
            max_font_size: 200.0,
            default_x: 50.0,
            line_gap: 20.0,
            scale: ScaleConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextItem {
    pub text: String,
    /// `x` is the left edge, `y` the baseline.
    pub position: Vec2,
    pub font_size: f32,
    pub color: Color,
}

impl TextItem {
    /// Box spanning `[x, x + width] × [y - font_size, y]`.
    pub fn bounds(&self, width: f32) -> Rect {
        Rect {
            x: self.position.x,
            y: self.position.y - self.font_size,
            w: width,
            h: self.font_size,
        }
    }
}

/// Where the `count`-th item (zero based) lands: stacked below the previous
/// ones, one line of its own size plus the gap apart.
pub fn default_position(count: usize, font_size: f32, config: &OverlayConfig) -> Vec2 {
    Vec2 {
        x: config.default_x,
        y: count as f32 * (font_size + config.line_gap) + font_size,
    }
}

pub struct TextOverlay<M: TextMeasurer> {
    measurer: M,
    config: OverlayConfig,
    items: Vec<TextItem>,
    // (font_size, width) last measured for the item at the same index
    widths: Vec<Cell<Option<(f32, f32)>>>,
    active: Option<usize>,
    surface: Size,
    gestures: ScaleGestureDetector,
    redraw_requested: bool,
}

impl<M: TextMeasurer> TextOverlay<M> {
    pub fn new(measurer: M) -> Self {
        Self::with_config(measurer, OverlayConfig::default())
    }

    pub fn with_config(measurer: M, config: OverlayConfig) -> Self {
        Self {
            measurer,
            config,
            items: Vec::new(),
            widths: Vec::new(),
            active: None,
            surface: Size::default(),
            gestures: ScaleGestureDetector::new(config.scale),
            redraw_requested: false,
        }
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn measurer(&self) -> &M {
        &self.measurer
    }

    pub fn items(&self) -> &[TextItem] {
        &self.items
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active_item(&self) -> Option<&TextItem> {
        self.active.and_then(|i| self.items.get(i))
    }

    /// Surface size seen by the last draw pass.
    pub fn surface_size(&self) -> Size {
        self.surface
    }

    /// Appends a label below the existing ones. Nothing is validated; sizes
    /// outside the configured range are only corrected by a later pinch.
    pub fn add_text(&mut self, text: impl Into<String>, font_size: f32, color: impl Into<Color>) {
        let item = TextItem {
            text: text.into(),
            position: default_position(self.items.len(), font_size, &self.config),
            font_size,
            color: color.into(),
        };
        log::debug!(
            "add_text #{} {:?} at {:?}",
            self.items.len(),
            item.text,
            item.position
        );
        self.items.push(item);
        self.widths.push(Cell::new(None));
        self.request_redraw();
    }

    /// Width of the item at `index` at its current size. Measured once per
    /// size; text never changes after `add_text`.
    pub fn measured_width(&self, index: usize) -> Option<f32> {
        let item = self.items.get(index)?;
        let slot = self.widths.get(index)?;
        match slot.get() {
            Some((size, width)) if size.to_bits() == item.font_size.to_bits() => Some(width),
            _ => {
                let width = self.measurer.measure(&item.text, item.font_size);
                slot.set(Some((item.font_size, width)));
                Some(width)
            }
        }
    }

    fn bounds_at(&self, index: usize) -> Rect {
        self.items[index].bounds(self.measured_width(index).unwrap_or(0.0))
    }

    /// Current box of every item, in insertion order.
    pub fn item_bounds(&self) -> Vec<Rect> {
        (0..self.items.len()).map(|i| self.bounds_at(i)).collect()
    }

    /// First item, by insertion order, whose box contains `p`.
    pub fn hit_test(&self, p: Vec2) -> Option<usize> {
        (0..self.items.len()).find(|&i| self.bounds_at(i).contains(p))
    }

    /// Pulls every item back inside `surface`: `x` into `[0, width - text
    /// width]` and `y` into `[font_size, height]`, the lower bound winning
    /// when a range is inverted.
    pub fn clamp_to_surface(&mut self, surface: Size) {
        self.surface = surface;
        for i in 0..self.items.len() {
            let text_w = self.measured_width(i).unwrap_or(0.0);
            let item = &mut self.items[i];
            item.position.x = clamp_low_wins(item.position.x, 0.0, surface.width - text_w);
            item.position.y = clamp_low_wins(item.position.y, item.font_size, surface.height);
        }
    }

    /// Records one text command per item at its current position.
    pub fn render(&self, scope: &mut DrawScope) {
        for item in &self.items {
            scope.draw_text(
                item.text.clone(),
                item.position,
                item.color,
                item.font_size,
            );
        }
    }

    /// Per-frame entry: clamps against the scope's size, then renders.
    pub fn draw(&mut self, scope: &mut DrawScope) {
        self.clamp_to_surface(scope.size);
        self.render(scope);
    }

    /// Always reports the event as handled.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::Pointer(pe) => self.handle_pointer(pe),
            InputEvent::Pinch(pinch) => {
                self.scale_active(pinch.scale);
            }
        }
        true
    }

    fn handle_pointer(&mut self, event: &PointerEvent) {
        let gesture_start = self.gestures.pointer_count() == 0;

        if let Some(step) = self.gestures.on_pointer(event) {
            self.scale_active(step.factor);
        }

        match event.event {
            PointerEventKind::Down(_) if gesture_start => {
                self.active = self.hit_test(event.position);
                log::debug!(
                    "gesture start at {:?}: active {:?}",
                    event.position,
                    self.active
                );
            }
            PointerEventKind::Down(_) => {}
            PointerEventKind::Move => {
                if self.gestures.primary() == Some(event.id)
                    && let Some(item) = self.active.and_then(|i| self.items.get_mut(i))
                {
                    item.position = event.position;
                    self.request_redraw();
                }
            }
            PointerEventKind::Up(_) | PointerEventKind::Cancel => {
                if self.gestures.pointer_count() == 0 && self.active.take().is_some() {
                    log::debug!("gesture end at {:?}", event.position);
                }
            }
        }
    }

    /// Multiplies the active item's size by `factor`, clamped to the
    /// configured range. Returns `false` (and changes nothing) without an
    /// active item.
    pub fn scale_active(&mut self, factor: f32) -> bool {
        let (min, max) = (self.config.min_font_size, self.config.max_font_size);
        let Some(item) = self.active.and_then(|i| self.items.get_mut(i)) else {
            return false;
        };
        item.font_size = clamp_low_wins(item.font_size * factor, min, max);
        log::trace!("scale x{factor:.3} -> {:.1}", item.font_size);
        self.request_redraw();
        true
    }

    pub fn needs_redraw(&self) -> bool {
        self.redraw_requested
    }

    /// Returns and clears the pending redraw request.
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 0.5 em per char: "A" at 30px is 15px wide
    fn overlay() -> TextOverlay<MonospaceMeasurer> {
        TextOverlay::new(MonospaceMeasurer::default())
    }

    fn at(x: f32, y: f32) -> Vec2 {
        Vec2::new(x, y)
    }
    fn down(id: u64, p: Vec2) -> InputEvent {
        PointerEvent::touch(id, PointerEventKind::Down(PointerButton::Primary), p).into()
    }
    fn mv(id: u64, p: Vec2) -> InputEvent {
        PointerEvent::touch(id, PointerEventKind::Move, p).into()
    }
    fn up(id: u64, p: Vec2) -> InputEvent {
        PointerEvent::touch(id, PointerEventKind::Up(PointerButton::Primary), p).into()
    }
    fn pinch(scale: f32) -> InputEvent {
        PinchEvent {
            scale,
            focus: Vec2::default(),
        }
        .into()
    }

    fn frame(o: &mut TextOverlay<MonospaceMeasurer>, w: f32, h: f32) -> DrawScope {
        let mut scope = DrawScope::new(Size::new(w, h));
        o.draw(&mut scope);
        scope
    }

    #[test]
    fn test_add_text_stacks_items() {
        let mut o = overlay();
        o.add_text("A", 30.0, Color::RED);
        o.add_text("B", 30.0, Color::BLUE);

        assert_eq!(o.items()[0].position, at(50.0, 30.0));
        assert_eq!(o.items()[1].position, at(50.0, 80.0));
        assert_eq!(o.items()[1].color, Color::BLUE);
        assert!(o.take_redraw_request());
        assert!(!o.needs_redraw());
    }

    #[test]
    fn test_default_position_uses_count() {
        let cfg = OverlayConfig::default();
        assert_eq!(default_position(0, 40.0, &cfg), at(50.0, 40.0));
        assert_eq!(default_position(3, 40.0, &cfg), at(50.0, 220.0));
    }

    #[test]
    fn test_add_text_accepts_anything() {
        let mut o = overlay();
        o.add_text("", -5.0, 0xFF00FF00u32);
        let item = &o.items()[0];
        assert_eq!(item.font_size, -5.0);
        assert_eq!(item.color, Color::GREEN);
    }

    #[test]
    fn test_hit_test_first_match_wins() {
        let mut o = overlay();
        o.add_text("AAAA", 30.0, Color::RED); // box x 50..110, y 0..30
        o.add_text("BBBB", 30.0, Color::BLUE); // box x 50..110, y 50..80
        o.items[1].position = at(60.0, 20.0); // now overlaps item 0

        assert_eq!(o.hit_test(at(70.0, 10.0)), Some(0));
        assert_eq!(o.hit_test(at(115.0, 10.0)), Some(1));
        assert_eq!(o.hit_test(at(300.0, 300.0)), None);
        // inclusive edges
        assert_eq!(o.hit_test(at(50.0, 0.0)), Some(0));
        assert_eq!(o.hit_test(at(110.0, 30.0)), Some(0));
    }

    #[test]
    fn test_press_drag_release() {
        let mut o = overlay();
        o.add_text("A", 30.0, Color::RED);
        o.add_text("B", 30.0, Color::BLUE);
        o.take_redraw_request();

        assert!(o.handle_input(&down(0, at(55.0, 20.0))));
        assert_eq!(o.active_index(), Some(0));

        assert!(o.handle_input(&mv(0, at(100.0, 100.0))));
        assert_eq!(o.items()[0].position, at(100.0, 100.0));
        assert!(o.take_redraw_request());

        assert!(o.handle_input(&up(0, at(100.0, 100.0))));
        assert_eq!(o.active_index(), None);
        assert_eq!(o.items()[1].position, at(50.0, 80.0));
    }

    #[test]
    fn test_press_on_empty_space_selects_nothing() {
        let mut o = overlay();
        o.add_text("A", 30.0, Color::RED);
        o.take_redraw_request();

        o.handle_input(&down(0, at(400.0, 400.0)));
        assert_eq!(o.active_item(), None);
        o.handle_input(&mv(0, at(10.0, 10.0)));
        assert_eq!(o.items()[0].position, at(50.0, 30.0));
        assert!(!o.needs_redraw());
    }

    #[test]
    fn test_drag_snaps_anchor_to_pointer() {
        let mut o = overlay();
        o.add_text("Hello", 40.0, Color::WHITE); // box x 50..150, y 0..40

        o.handle_input(&down(0, at(140.0, 5.0)));
        o.handle_input(&mv(0, at(141.0, 6.0)));
        // no grab offset: the baseline-left corner jumps under the finger
        assert_eq!(o.items()[0].position, at(141.0, 6.0));
    }

    #[test]
    fn test_pinch_scales_and_clamps() {
        let mut o = overlay();
        o.add_text("A", 100.0, Color::RED); // box x 50..100, y 0..100

        o.handle_input(&down(0, at(60.0, 50.0)));
        o.handle_input(&down(1, at(160.0, 50.0)));
        o.handle_input(&mv(1, at(210.0, 50.0))); // spread 100 -> 150
        let size = o.items()[0].font_size;
        assert!((size - 150.0).abs() < 1e-3);

        o.handle_input(&mv(1, at(360.0, 50.0))); // spread 150 -> 300
        assert_eq!(o.items()[0].font_size, 200.0);
    }

    #[test]
    fn test_pinch_event_respects_bounds() {
        let mut o = overlay();
        o.add_text("A", 100.0, Color::RED);
        o.handle_input(&down(0, at(60.0, 50.0)));

        o.handle_input(&pinch(1.5));
        assert_eq!(o.items()[0].font_size, 150.0);
        o.handle_input(&pinch(2.0));
        assert_eq!(o.items()[0].font_size, 200.0);
        for _ in 0..10 {
            o.handle_input(&pinch(0.5));
        }
        assert_eq!(o.items()[0].font_size, 20.0);
        o.handle_input(&pinch(f32::NAN));
        let size = o.items()[0].font_size;
        assert!((20.0..=200.0).contains(&size));
    }

    #[test]
    fn test_pinch_without_active_item_is_noop() {
        let mut o = overlay();
        o.add_text("A", 100.0, Color::RED);
        o.take_redraw_request();

        assert!(o.handle_input(&pinch(1.5)));
        assert!(!o.scale_active(1.5));
        assert_eq!(o.items()[0].font_size, 100.0);
        assert!(!o.needs_redraw());
    }

    #[test]
    fn test_second_pointer_down_does_not_reselect() {
        let mut o = overlay();
        o.add_text("A", 30.0, Color::RED);
        o.add_text("B", 30.0, Color::BLUE);

        o.handle_input(&down(0, at(55.0, 20.0)));
        o.handle_input(&down(1, at(55.0, 70.0))); // lands on B
        assert_eq!(o.active_index(), Some(0));

        // only the primary pointer drags
        o.handle_input(&mv(1, at(300.0, 300.0)));
        assert_eq!(o.items()[0].position, at(50.0, 30.0));

        // lifting one finger keeps the gesture alive, the other becomes primary
        o.handle_input(&up(0, at(55.0, 20.0)));
        assert_eq!(o.active_index(), Some(0));
        o.handle_input(&mv(1, at(200.0, 200.0)));
        assert_eq!(o.items()[0].position, at(200.0, 200.0));

        o.handle_input(&up(1, at(200.0, 200.0)));
        assert_eq!(o.active_index(), None);
    }

    #[test]
    fn test_cancel_ends_gesture() {
        let mut o = overlay();
        o.add_text("A", 30.0, Color::RED);
        o.handle_input(&down(0, at(55.0, 20.0)));
        o.handle_input(&PointerEvent::touch(0, PointerEventKind::Cancel, at(0.0, 0.0)).into());
        assert_eq!(o.active_index(), None);
    }

    #[test]
    fn test_draw_clamps_into_surface() {
        let mut o = overlay();
        o.add_text("AB", 40.0, Color::RED); // 40px wide
        o.handle_input(&down(0, at(60.0, 20.0)));
        o.handle_input(&mv(0, at(1000.0, 1000.0)));
        o.handle_input(&up(0, at(1000.0, 1000.0)));

        let scope = frame(&mut o, 300.0, 200.0);
        assert_eq!(o.items()[0].position, at(260.0, 200.0));
        assert_eq!(o.surface_size(), Size::new(300.0, 200.0));
        assert_eq!(
            scope.commands,
            vec![crate::DrawCommand::Text {
                text: "AB".to_string(),
                pos: at(260.0, 200.0),
                color: Color::RED,
                size: 40.0,
            }]
        );

        o.items[0].position = at(-30.0, 5.0);
        frame(&mut o, 300.0, 200.0);
        assert_eq!(o.items()[0].position, at(0.0, 40.0));
    }

    #[test]
    fn test_oversized_text_pins_to_lower_bounds() {
        let mut o = overlay();
        o.add_text("WWWWWWWWWW", 100.0, Color::RED); // 500px wide
        frame(&mut o, 200.0, 50.0);
        assert_eq!(o.items()[0].position, at(0.0, 100.0));
    }

    #[test]
    fn test_draw_is_idempotent() {
        let mut o = overlay();
        o.add_text("first", 30.0, Color::RED);
        o.add_text("second", 60.0, Color::BLUE);
        o.add_text("way too long for this", 80.0, Color::GREEN);
        o.items[0].position = at(-100.0, 900.0);

        let first = frame(&mut o, 320.0, 240.0).commands;
        let after_first: Vec<_> = o.items().to_vec();
        let second = frame(&mut o, 320.0, 240.0).commands;
        assert_eq!(first, second);
        assert_eq!(o.items(), &after_first[..]);

        for (item, b) in o.items().iter().zip(o.item_bounds()) {
            let w = b.w;
            if w <= 320.0 {
                assert!(item.position.x >= 0.0 && item.position.x <= 320.0 - w);
            } else {
                assert_eq!(item.position.x, 0.0);
            }
            assert!(item.position.y >= item.font_size && item.position.y <= 240.0);
        }
    }

    #[test]
    fn test_hit_test_sees_unclamped_position() {
        let mut o = overlay();
        o.add_text("AB", 40.0, Color::RED);
        frame(&mut o, 300.0, 200.0);

        o.handle_input(&down(0, at(60.0, 20.0)));
        o.handle_input(&mv(0, at(500.0, 20.0)));
        o.handle_input(&up(0, at(500.0, 20.0)));

        // no frame yet: the item still sits off-surface and is hit there
        assert_eq!(o.hit_test(at(510.0, 10.0)), Some(0));
        frame(&mut o, 300.0, 200.0);
        assert_eq!(o.hit_test(at(510.0, 10.0)), None);
        assert_eq!(o.hit_test(at(270.0, 30.0)), Some(0));
    }

    #[test]
    fn test_custom_config() {
        let cfg = OverlayConfig {
            min_font_size: 10.0,
            max_font_size: 50.0,
            default_x: 0.0,
            line_gap: 0.0,
            ..OverlayConfig::default()
        };
        let mut o = TextOverlay::with_config(MonospaceMeasurer::default(), cfg);
        o.add_text("A", 20.0, Color::RED);
        o.add_text("B", 20.0, Color::RED);
        assert_eq!(o.items()[1].position, at(0.0, 40.0));

        o.handle_input(&down(0, at(5.0, 30.0)));
        assert_eq!(o.active_index(), Some(1));
        o.handle_input(&pinch(10.0));
        assert_eq!(o.items()[1].font_size, 50.0);
    }

    #[derive(Default)]
    struct CountingMeasurer {
        calls: Cell<usize>,
    }

    impl TextMeasurer for CountingMeasurer {
        fn measure(&self, text: &str, font_size: f32) -> f32 {
            self.calls.set(self.calls.get() + 1);
            MonospaceMeasurer::default().measure(text, font_size)
        }
    }

    #[test]
    fn test_width_measured_once_per_size() {
        let m = CountingMeasurer::default();
        let mut o = TextOverlay::new(&m);
        o.add_text("A", 30.0, Color::RED);
        o.add_text("B", 30.0, Color::BLUE);

        for _ in 0..3 {
            let mut scope = DrawScope::new(Size::new(800.0, 600.0));
            o.draw(&mut scope);
            o.item_bounds();
        }
        assert_eq!(m.calls.get(), 2);

        o.handle_input(&down(0, at(55.0, 20.0)));
        o.handle_input(&pinch(2.0));
        let mut scope = DrawScope::new(Size::new(800.0, 600.0));
        o.draw(&mut scope);

        // only the resized item is measured again
        assert_eq!(m.calls.get(), 3);
        assert_eq!(o.measured_width(0), Some(30.0));
        assert_eq!(o.measured_width(2), None);
    }
}
