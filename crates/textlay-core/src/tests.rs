#[cfg(test)]
mod tests {
    use crate::input::*;
    use crate::*;

    #[test]
    fn test_color_from_hex() {
        let c = Color::from_hex("#FF5733");
        assert_eq!(c, Color(255, 87, 51, 255));

        let c_alpha = Color::from_hex("#FF5733AA");
        assert_eq!(c_alpha, Color(255, 87, 51, 170));
    }

    #[test]
    fn test_color_from_hex_lenient() {
        assert_eq!(Color::from_hex("#zz5733"), Color(0, 87, 51, 255));
        assert_eq!(Color::from_hex("#123"), Color::BLACK);
    }

    #[test]
    fn test_color_parse_strict() {
        assert_eq!("00ff00".parse::<Color>(), Ok(Color::GREEN));
        assert_eq!("#123".parse::<Color>(), Err(ColorParseError::Length(3)));
        assert_eq!(
            "#GG0000".parse::<Color>(),
            Err(ColorParseError::Digit("GG".to_string()))
        );
    }

    #[test]
    fn test_color_packed_argb() {
        assert_eq!(Color::from_argb(0xFFFF0000), Color::RED);
        assert_eq!(Color::from(0x800000FF), Color(0, 0, 255, 128));
        assert_eq!(Color(1, 2, 3, 4).to_argb(), 0x04010203);
    }

    #[test]
    fn test_rect_contains() {
        let rect = Rect {
            x: 10.0,
            y: 10.0,
            w: 100.0,
            h: 50.0,
        };

        assert!(rect.contains(Vec2 { x: 50.0, y: 30.0 }));
        assert!(rect.contains(Vec2 { x: 110.0, y: 60.0 }));
        assert!(!rect.contains(Vec2 { x: 5.0, y: 30.0 }));
        assert!(!rect.contains(Vec2 { x: 50.0, y: 70.0 }));
    }

    #[test]
    fn test_clamp_low_wins() {
        assert_eq!(clamp_low_wins(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp_low_wins(-1.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp_low_wins(11.0, 0.0, 10.0), 10.0);
        // inverted range pins to the lower bound
        assert_eq!(clamp_low_wins(7.0, 0.0, -20.0), 0.0);
    }

    #[test]
    fn test_monospace_measurer() {
        let m = MonospaceMeasurer::default();
        assert_eq!(m.measure("abcd", 20.0), 40.0);
        assert_eq!(m.measure("", 20.0), 0.0);
        let boxed: Box<dyn TextMeasurer> = Box::new(m);
        assert_eq!(boxed.measure("ab", 10.0), 10.0);
    }

    #[test]
    fn test_input_event_from() {
        let pe = PointerEvent::touch(3, PointerEventKind::Move, Vec2::new(1.0, 2.0));
        assert_eq!(InputEvent::from(pe), InputEvent::Pointer(pe));
        assert_eq!(pe.id, PointerId(3));
        assert_eq!(pe.kind, PointerKind::Touch);
    }

    #[test]
    fn test_mouse_id_does_not_clash_with_first_touch() {
        let mouse =
            PointerEvent::mouse(PointerEventKind::Move, Vec2::default(), Modifiers::default());
        let touch = PointerEvent::touch(0, PointerEventKind::Move, Vec2::default());
        assert_eq!(mouse.id, PointerId::MOUSE);
        assert_ne!(mouse.id, touch.id);
    }
}
