// CHIP-8 interpreter core
//
// The core owns the whole machine state and exposes a single step operation.
// Window, audio and keyboard handling live in the frontend.

mod chip8;
mod color;
mod display;
mod error;
mod instruction;

pub use chip8::{
    Chip8, Chip8Builder, Quirks, DEFAULT_FONT, DEFAULT_STACK_CAPACITY, FONT_ADDR, MAX_STACK_CAPACITY,
    MEMORY_SIZE, NUM_KEYS, PROGRAM_START, TIMER_PERIOD,
};
pub use color::{Chip8Color, Chip8ColorParseError, DEFAULT_BACKGROUND_COLOR, DEFAULT_FOREGROUND_COLOR};
pub use display::{Framebuffer, Palette, Rasterizer, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use error::{ExecError, LoadError};
pub use instruction::Instruction;
