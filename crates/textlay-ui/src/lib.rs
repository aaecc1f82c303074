//! Widgets for Textlay.
//!
//! [`TextOverlay`] holds a list of text labels that can be dragged with one
//! finger and resized with a two-finger pinch. It is driven by a runner
//! through two calls:
//!
//! ```rust
//! use textlay_core::{input::*, Color, MonospaceMeasurer, Size, Vec2};
//! use textlay_ui::{DrawScope, TextOverlay};
//!
//! let mut overlay = TextOverlay::new(MonospaceMeasurer::default());
//! overlay.add_text("Hello", 40.0, Color::WHITE);
//!
//! // input: press on the label, drag it, let go
//! let at = |x, y| Vec2::new(x, y);
//! overlay.handle_input(&PointerEvent::touch(0, PointerEventKind::Down(PointerButton::Primary), at(60.0, 30.0)).into());
//! overlay.handle_input(&PointerEvent::touch(0, PointerEventKind::Move, at(200.0, 300.0)).into());
//! overlay.handle_input(&PointerEvent::touch(0, PointerEventKind::Up(PointerButton::Primary), at(200.0, 300.0)).into());
//!
//! // frame: clamp into the surface and record draw commands
//! let mut scope = DrawScope::new(Size::new(800.0, 600.0));
//! overlay.draw(&mut scope);
//! assert_eq!(overlay.items()[0].position, at(200.0, 300.0));
//! ```

pub mod canvas;
pub mod gestures;
pub mod text_overlay;

pub use canvas::*;
pub use gestures::*;
pub use text_overlay::*;
