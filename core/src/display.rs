use crate::color::{Chip8Color, DEFAULT_BACKGROUND_COLOR, DEFAULT_FOREGROUND_COLOR};

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;

const PIXEL_ON: u8 = 1;
const PIXEL_OFF: u8 = 0;

/// 64x32 monochrome display, one byte per pixel (0 or 1), row major.
///
/// The dirty flag is raised by every clear and every sprite bit drawn, and
/// stays raised until the consumer calls [`Framebuffer::mark_clean`].
#[derive(Clone, Debug)]
pub struct Framebuffer {
    pixels: [u8; SCREEN_WIDTH * SCREEN_HEIGHT],
    dirty: bool,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Framebuffer {
            pixels: [PIXEL_OFF; SCREEN_WIDTH * SCREEN_HEIGHT],
            dirty: false,
        }
    }
}

impl Framebuffer {
    /// All 2048 cells, indexed as `x + y * 64`.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels[..]
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[Self::index(x, y)] == PIXEL_ON
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn clear(&mut self) {
        self.pixels.fill(PIXEL_OFF);
        self.dirty = true;
    }

    /// Toggles one pixel, returns true if it was on before (a collision).
    pub(crate) fn xor_pixel(&mut self, x: usize, y: usize) -> bool {
        let idx = Self::index(x, y);
        let was_on = self.pixels[idx] == PIXEL_ON;
        self.pixels[idx] ^= PIXEL_ON;
        self.dirty = true;
        was_on
    }

    fn index(x: usize, y: usize) -> usize {
        debug_assert!(x < SCREEN_WIDTH && y < SCREEN_HEIGHT);
        y * SCREEN_WIDTH + x
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub foreground: Chip8Color,
    pub background: Chip8Color,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            foreground: DEFAULT_FOREGROUND_COLOR,
            background: DEFAULT_BACKGROUND_COLOR,
        }
    }
}

/// Converts a framebuffer into RGBX8888 bytes for a streaming texture.
pub struct Rasterizer {
    palette: Palette,
    buffer: Vec<Chip8Color>,
}

impl Rasterizer {
    pub fn new(palette: Palette) -> Rasterizer {
        Rasterizer {
            palette,
            buffer: vec![palette.background; SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }

    /// Bytes per row of the returned buffer.
    pub const PITCH: usize = SCREEN_WIDTH * std::mem::size_of::<Chip8Color>();

    pub fn rasterize(&mut self, framebuffer: &Framebuffer) -> &[u8] {
        for (out, &cell) in self.buffer.iter_mut().zip(framebuffer.pixels()) {
            *out = if cell == PIXEL_ON {
                self.palette.foreground
            } else {
                self.palette.background
            };
        }
        bytemuck::cast_slice(&self.buffer[..])
    }
}
