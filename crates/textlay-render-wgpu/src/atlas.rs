/// Row-based ("shelf") packer for the glyph atlas. Keeps a 1px gutter
/// around every allocation.
#[derive(Clone, Debug)]
pub(crate) struct ShelfPacker {
    pub size: u32,
    next_x: u32,
    next_y: u32,
    row_h: u32,
}

impl ShelfPacker {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            next_x: 1,
            next_y: 1,
            row_h: 0,
        }
    }

    pub fn reset(&mut self) {
        self.next_x = 1;
        self.next_y = 1;
        self.row_h = 0;
    }

    /// Top-left corner for a `w × h` slot, or `None` when the atlas is full.
    pub fn alloc(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if w + 2 > self.size || h + 2 > self.size {
            return None;
        }
        if self.next_x + w + 1 > self.size {
            self.next_x = 1;
            self.next_y += self.row_h + 1;
            self.row_h = 0;
        }
        if self.next_y + h + 1 > self.size {
            return None;
        }
        let pos = (self.next_x, self.next_y);
        self.next_x += w + 1;
        self.row_h = self.row_h.max(h);
        Some(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shelf_wraps_rows() {
        let mut p = ShelfPacker::new(32);
        assert_eq!(p.alloc(10, 8), Some((1, 1)));
        assert_eq!(p.alloc(10, 5), Some((12, 1)));
        // 23 + 10 + 1 > 32: next row starts under the tallest slot
        assert_eq!(p.alloc(10, 4), Some((1, 10)));
    }

    #[test]
    fn test_shelf_reports_full() {
        let mut p = ShelfPacker::new(16);
        assert_eq!(p.alloc(14, 14), Some((1, 1)));
        assert_eq!(p.alloc(4, 4), None);
        assert_eq!(p.alloc(40, 1), None);

        p.reset();
        assert_eq!(p.alloc(4, 4), Some((1, 1)));
    }
}
