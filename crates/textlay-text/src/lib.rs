use ahash::AHasher;
use cosmic_text::{
    Attrs, Buffer, CacheKey, FontSystem, Metrics, Shaping, SwashCache, SwashContent,
};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    hash::{Hash, Hasher},
    sync::Arc,
};
use textlay_core::TextMeasurer;

/// Shaping sizes are snapped to this step so a pinch does not mint a new set
/// of glyph keys for every frame.
const SIZE_STEP: f32 = 0.5;

/// Past this many live glyph keys the key map and the bitmap cache start over.
const MAX_CACHED_GLYPHS: usize = 4096;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GlyphKey(pub u64);

/// A glyph positioned relative to the line origin (baseline at y = 0).
pub struct ShapedGlyph {
    pub key: GlyphKey,
    /// Left edge of the bitmap.
    pub x: f32,
    /// Top edge of the bitmap; negative above the baseline.
    pub y: f32,
    pub w: f32,
}

pub struct GlyphBitmap {
    pub w: u32,
    pub h: u32,
    pub content: SwashContent,
    pub data: Vec<u8>, // Mask: A8; Color/Subpixel: RGBA8
}

struct Engine {
    fs: FontSystem,
    cache: SwashCache,
    // compact atlas key -> full cosmic_text CacheKey
    key_map: HashMap<GlyphKey, CacheKey>,
}

impl Engine {
    fn get_image(&mut self, key: CacheKey) -> Option<cosmic_text::SwashImage> {
        self.cache.get_image(&mut self.fs, key).clone()
    }

    fn trim(&mut self) {
        log::debug!("dropping {} cached glyphs", self.key_map.len());
        self.key_map.clear();
        self.cache = SwashCache::new();
    }

    fn shaped_buffer(&mut self, text: &str, px: f32) -> Buffer {
        let mut buf = Buffer::new(&mut self.fs, Metrics::new(px, px * 1.3));
        {
            let mut b = buf.borrow_with(&mut self.fs);
            b.set_size(None, None);
            b.set_text(text, &Attrs::new(), Shaping::Advanced, None);
            b.shape_until_scroll(true);
        }
        buf
    }
}

static ENGINE: OnceCell<Mutex<Engine>> = OnceCell::new();

fn engine() -> &'static Mutex<Engine> {
    ENGINE.get_or_init(|| {
        let fs = FontSystem::new();
        log::debug!("font system ready: {} faces", fs.db().len());
        Mutex::new(Engine {
            fs,
            cache: SwashCache::new(),
            key_map: HashMap::new(),
        })
    })
}

fn key_from_cachekey(k: &CacheKey) -> GlyphKey {
    let mut h = AHasher::default();
    k.hash(&mut h);
    GlyphKey(h.finish())
}

/// Registers extra font faces (TTF/OTF/TTC bytes), e.g. a face shipped next
/// to the binary or one the system database did not pick up. Returns how
/// many faces were added; unparsable data adds none.
pub fn load_font_data(data: Vec<u8>) -> usize {
    let mut eng = engine().lock();
    let ids = eng
        .fs
        .db_mut()
        .load_font_source(fontdb::Source::Binary(Arc::new(data)));
    log::debug!("loaded {} font faces", ids.len());
    ids.len()
}

fn snap_size(px: f32) -> f32 {
    (px / SIZE_STEP).round() * SIZE_STEP
}

/// Drops every cached glyph key and bitmap. Keys handed out earlier stop
/// rasterizing; shape again to get fresh ones.
pub fn trim_caches() {
    engine().lock().trim();
}

/// Shape a single-line string (no wrapping). `px` is snapped to half pixels.
pub fn shape_line(text: &str, px: f32) -> Vec<ShapedGlyph> {
    let px = snap_size(px);
    let mut eng = engine().lock();
    if eng.key_map.len() > MAX_CACHED_GLYPHS {
        eng.trim();
    }
    let buf = eng.shaped_buffer(text, px);

    let mut out = Vec::new();
    for run in buf.layout_runs() {
        for g in run.glyphs {
            let phys = g.physical((0.0, run.line_y), 1.0);
            let key = key_from_cachekey(&phys.cache_key);
            eng.key_map.insert(key, phys.cache_key);

            let (w, left, top) = match eng.get_image(phys.cache_key) {
                Some(img) => (
                    img.placement.width as f32,
                    img.placement.left as f32,
                    img.placement.top as f32,
                ),
                None => (0.0, 0.0, 0.0),
            };

            out.push(ShapedGlyph {
                key,
                x: g.x + g.x_offset + left,
                y: -top,
                w,
            });
        }
    }
    out
}

/// Rasterize a glyph previously returned by [`shape_line`].
pub fn rasterize(key: GlyphKey) -> Option<GlyphBitmap> {
    let mut eng = engine().lock();
    let &ck = eng.key_map.get(&key)?;

    let img = eng.get_image(ck)?;
    Some(GlyphBitmap {
        w: img.placement.width,
        h: img.placement.height,
        content: img.content,
        data: img.data,
    })
}

/// Advance width of the widest laid-out line.
pub fn measure_width(text: &str, px: f32) -> f32 {
    if text.is_empty() {
        return 0.0;
    }
    let mut eng = engine().lock();
    let buf = eng.shaped_buffer(text, px);
    buf.layout_runs().map(|run| run.line_w).fold(0.0, f32::max)
}

/// [`TextMeasurer`] backed by the shared cosmic-text font system.
#[derive(Clone, Copy, Debug, Default)]
pub struct CosmicMeasurer;

impl TextMeasurer for CosmicMeasurer {
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        measure_width(text, font_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_empty_is_zero() {
        assert_eq!(measure_width("", 24.0), 0.0);
        assert_eq!(CosmicMeasurer.measure("", 24.0), 0.0);
    }

    #[test]
    fn test_measure_is_monotonic_in_length() {
        let one = measure_width("a", 24.0);
        let three = measure_width("aaa", 24.0);
        assert!(three >= one);
        assert!(one >= 0.0);
    }

    #[test]
    fn test_shaped_keys_rasterize() {
        for g in shape_line("Hi", 32.0) {
            if g.w > 0.0 {
                let bmp = rasterize(g.key).expect("shaped glyph has an image");
                assert_eq!(bmp.w as f32, g.w);
            }
        }
    }

    #[test]
    fn test_load_font_data_rejects_garbage() {
        assert_eq!(load_font_data(b"definitely not a font".to_vec()), 0);
        assert_eq!(load_font_data(Vec::new()), 0);
    }

    #[test]
    fn test_pinch_sizes_collapse_to_half_pixels() {
        assert_eq!(snap_size(30.2), 30.0);
        assert_eq!(snap_size(30.3), 30.5);

        let mut px = 30.0f32;
        let mut sizes = Vec::new();
        for _ in 0..200 {
            sizes.push(snap_size(px).to_bits());
            px *= 1.003;
        }
        sizes.dedup();
        // 30px up to ~54.5px
        assert!(sizes.len() <= 50, "{} sizes", sizes.len());
    }

    #[test]
    fn test_pinching_keeps_glyph_cache_bounded() {
        let mut px = 30.0f32;
        for _ in 0..200 {
            shape_line("Hello", px);
            px *= 1.003;
        }
        assert!(engine().lock().key_map.len() <= MAX_CACHED_GLYPHS);
    }
}
