/// Measures the advance width of a single line of text.
///
/// The overlay only needs widths; shaping and rasterisation stay in the
/// text crate and the renderer.
pub trait TextMeasurer {
    fn measure(&self, text: &str, font_size: f32) -> f32;
}

impl<M: TextMeasurer + ?Sized> TextMeasurer for &M {
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        (**self).measure(text, font_size)
    }
}

impl<M: TextMeasurer + ?Sized> TextMeasurer for Box<M> {
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        (**self).measure(text, font_size)
    }
}

/// Every char advances by `font_size * advance_ratio`.
///
/// Deterministic, which makes it the measurer of choice for tests and for
/// headless hosts without fonts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonospaceMeasurer {
    pub advance_ratio: f32,
}

impl Default for MonospaceMeasurer {
    fn default() -> Self {
        Self { advance_ratio: 0.5 }
    }
}

impl TextMeasurer for MonospaceMeasurer {
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * self.advance_ratio
    }
}
