//! Input events as the runners deliver them to a widget.

use crate::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(pub u64);

impl PointerId {
    /// The mouse; kept clear of touch ids, which winit hands out from 0.
    pub const MOUSE: PointerId = PointerId(u64::MAX);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    /// Left mouse button or a finger.
    Primary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerEventKind {
    Down(PointerButton),
    Up(PointerButton),
    Move,
    Cancel,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool, // Cmd on Mac, Win key on Windows
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub id: PointerId,
    pub kind: PointerKind,
    pub event: PointerEventKind,
    pub position: Vec2,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn touch(id: u64, event: PointerEventKind, position: Vec2) -> Self {
        Self {
            id: PointerId(id),
            kind: PointerKind::Touch,
            event,
            position,
            modifiers: Modifiers::default(),
        }
    }

    pub fn mouse(event: PointerEventKind, position: Vec2, modifiers: Modifiers) -> Self {
        Self {
            id: PointerId::MOUSE,
            kind: PointerKind::Mouse,
            event,
            position,
            modifiers,
        }
    }
}

/// A pinch step recognised outside the pointer stream (trackpad gesture,
/// Ctrl+wheel). `scale` is current spread over previous spread.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchEvent {
    pub scale: f32,
    pub focus: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    Pointer(PointerEvent),
    Pinch(PinchEvent),
}

impl From<PointerEvent> for InputEvent {
    fn from(e: PointerEvent) -> Self {
        InputEvent::Pointer(e)
    }
}

impl From<PinchEvent> for InputEvent {
    fn from(e: PinchEvent) -> Self {
        InputEvent::Pinch(e)
    }
}
