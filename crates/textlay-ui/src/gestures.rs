//! Multi-pointer tracking and pinch recognition.
//!
//! [`ScaleGestureDetector`] watches the raw pointer stream, remembers which
//! pointers are down (in press order) and turns changes in their spread into
//! [`ScaleEvent`]s. The first pointer still down is the gesture's primary
//! pointer; widgets use it to decide which moves drag.

use smallvec::SmallVec;
use textlay_core::Vec2;
use textlay_core::input::*;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleConfig {
    /// Spans shorter than this (in px) don't produce scale events.
    pub min_span: f32,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self { min_span: 0.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleEvent {
    /// Current span over previous span.
    pub factor: f32,
    /// Centroid of the pointers.
    pub focus: Vec2,
}

#[derive(Clone, Debug, Default)]
pub struct ScaleGestureDetector {
    config: ScaleConfig,
    pointers: SmallVec<[(PointerId, Vec2); 4]>,
    prev_span: Option<f32>,
}

impl ScaleGestureDetector {
    pub fn new(config: ScaleConfig) -> Self {
        Self {
            config,
            pointers: SmallVec::new(),
            prev_span: None,
        }
    }

    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    /// Earliest pointer still down.
    pub fn primary(&self) -> Option<PointerId> {
        self.pointers.first().map(|(id, _)| *id)
    }

    pub fn is_in_progress(&self) -> bool {
        self.pointers.len() >= 2 && self.prev_span.is_some()
    }

    /// Feeds one pointer event; returns a scale step when the spread of two or
    /// more pointers changed.
    pub fn on_pointer(&mut self, event: &PointerEvent) -> Option<ScaleEvent> {
        match event.event {
            PointerEventKind::Down(_) => {
                match self.pointers.iter_mut().find(|(id, _)| *id == event.id) {
                    Some(slot) => slot.1 = event.position,
                    None => self.pointers.push((event.id, event.position)),
                }
                self.reset_span();
                None
            }
            PointerEventKind::Up(_) | PointerEventKind::Cancel => {
                self.pointers.retain(|(id, _)| *id != event.id);
                self.reset_span();
                None
            }
            PointerEventKind::Move => {
                let slot = self.pointers.iter_mut().find(|(id, _)| *id == event.id)?;
                slot.1 = event.position;
                if self.pointers.len() < 2 {
                    return None;
                }

                let (span, focus) = self.span_and_focus();
                if span < self.config.min_span || span <= 0.0 {
                    self.prev_span = None;
                    return None;
                }
                let step = self.prev_span.map(|prev| ScaleEvent {
                    factor: span / prev,
                    focus,
                });
                self.prev_span = Some(span);
                step
            }
        }
    }

    /// Pointer set changed: start measuring from the current spread.
    fn reset_span(&mut self) {
        self.prev_span = if self.pointers.len() >= 2 {
            let (span, _) = self.span_and_focus();
            (span >= self.config.min_span && span > 0.0).then_some(span)
        } else {
            None
        };
    }

    /// Span is the diagonal of twice the mean deviation from the centroid; for
    /// two pointers that is just their distance.
    fn span_and_focus(&self) -> (f32, Vec2) {
        let n = self.pointers.len() as f32;
        let (sx, sy) = self
            .pointers
            .iter()
            .fold((0.0, 0.0), |(sx, sy), (_, p)| (sx + p.x, sy + p.y));
        let focus = Vec2::new(sx / n, sy / n);

        let (dx, dy) = self.pointers.iter().fold((0.0, 0.0), |(dx, dy), (_, p)| {
            (dx + (p.x - focus.x).abs(), dy + (p.y - focus.y).abs())
        });
        let span_x = 2.0 * dx / n;
        let span_y = 2.0 * dy / n;
        ((span_x * span_x + span_y * span_y).sqrt(), focus)
    }
}
