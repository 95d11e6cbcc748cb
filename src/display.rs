// Default mode graphics
pub const GFX_WIDTH: usize = 64;
pub const GFX_HEIGHT: usize = 32;

type Storage = u32;
const STORAGE_BITS: usize = Storage::BITS as usize;
const PACKED_WIDTH: usize = GFX_WIDTH / STORAGE_BITS;

/// Monochrome 64x32 screen, each row packed into two words with the
/// leftmost pixel in the most significant bit.
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    packed_state: [Storage; PACKED_WIDTH * GFX_HEIGHT],
}

impl Framebuffer {
    pub fn new() -> Self {
        Self {
            packed_state: [0; PACKED_WIDTH * GFX_HEIGHT],
        }
    }

    pub fn clear(&mut self) {
        self.packed_state = [0; PACKED_WIDTH * GFX_HEIGHT];
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        let (col, nibble) = Self::get_bucket(x, y);
        let mask = 1 << nibble;
        (self.packed_state[col] & mask) != 0
    }

    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        let (col, nibble) = Self::get_bucket(x, y);
        let mask = 1 << nibble;
        if value {
            self.packed_state[col] |= mask;
        } else {
            self.packed_state[col] &= !mask;
        }
    }

    /// XORs a lit sprite pixel onto the screen. Coordinates wrap around
    /// the edges. Returns `true` when the pixel was already on.
    pub fn toggle(&mut self, x: usize, y: usize) -> bool {
        let (col, nibble) = Self::get_bucket(x % GFX_WIDTH, y % GFX_HEIGHT);
        let mask = 1 << nibble;
        let collision = (self.packed_state[col] & mask) != 0;
        self.packed_state[col] ^= mask;
        collision
    }

    pub fn is_blank(&self) -> bool {
        self.packed_state.iter().all(|word| *word == 0)
    }

    /// One line per row, `#` for lit pixels and `.` for dark ones.
    pub fn render_text(&self) -> String {
        let mut out = String::with_capacity((GFX_WIDTH + 1) * GFX_HEIGHT);
        for y in 0..GFX_HEIGHT {
            for x in 0..GFX_WIDTH {
                out.push(if self.get(x, y) { '#' } else { '.' });
            }
            out.push('\n');
        }
        out
    }

    #[inline]
    fn get_bucket(x: usize, y: usize) -> (usize, usize) {
        let real_x = x / STORAGE_BITS;
        let col = (y * PACKED_WIDTH) + real_x;
        let nibble = (STORAGE_BITS * (real_x + 1)) - x - 1;
        (col, nibble)
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{Framebuffer, GFX_HEIGHT, GFX_WIDTH};
    use proptest::prelude::*;

    #[test]
    fn toggle_test() {
        let mut gfx = Framebuffer::new();
        assert!(!gfx.toggle(3, 4));
        assert!(gfx.get(3, 4));
        assert!(gfx.toggle(3, 4));
        assert!(!gfx.get(3, 4));
        assert!(gfx.is_blank());
    }

    #[test]
    fn toggle_wraps_test() {
        let mut gfx = Framebuffer::new();
        gfx.toggle(GFX_WIDTH + 1, GFX_HEIGHT + 2);
        assert!(gfx.get(1, 2));

        gfx.toggle(GFX_WIDTH - 1, GFX_HEIGHT - 1);
        assert!(gfx.get(63, 31));
    }

    #[test]
    fn clear_test() {
        let mut gfx = Framebuffer::new();
        gfx.set(0, 0, true);
        gfx.set(63, 31, true);
        assert!(!gfx.is_blank());
        gfx.clear();
        assert!(gfx.is_blank());
    }

    #[test]
    fn render_text_test() {
        let mut gfx = Framebuffer::new();
        gfx.set(0, 0, true);
        gfx.set(63, 1, true);

        let text = gfx.render_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), GFX_HEIGHT);
        assert!(lines[0].starts_with("#."));
        assert!(lines[1].ends_with(".#"));
        assert_eq!(lines[2], ".".repeat(GFX_WIDTH));
    }

    proptest! {
        #[test]
        fn compression_proptest(
            coords in prop::collection::vec(
                (0..GFX_WIDTH, 0..GFX_HEIGHT),
                1..500
            )
        ) {
            let mut gfx = Framebuffer::new();
            // Set
            for (x, y) in coords.iter() {
                gfx.set(*x, *y, true);
            }
            for x in 0..GFX_WIDTH {
                for y in 0..GFX_HEIGHT {
                    let res = gfx.get(x, y);
                    assert!(res == coords.contains(&(x, y)));
                }
            }
            // Reset
            for (x, y) in coords.iter() {
                gfx.set(*x, *y, false);
            }
            assert!(gfx.is_blank());
        }
    }
}
