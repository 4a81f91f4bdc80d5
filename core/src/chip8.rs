// CHIP-8 interpreter
//
// Useful links:
// * [Guide to making a CHIP-8 emulator](https://tobiasvl.github.io/blog/write-a-chip-8-emulator/)
// * [Cowgod's Chip-8 Technical Reference](http://devernay.free.fr/hacks/chip8/C8TECH10.HTM)
//

use std::{
    path::Path,
    time::{Duration, Instant},
};

use log::{debug, info, trace};
use rand::{rngs::StdRng, RngCore, SeedableRng};

use crate::display::{Framebuffer, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::error::{ExecError, LoadError};
use crate::instruction::Instruction;

pub const MEMORY_SIZE: usize = 0x1000;
pub const FONT_ADDR: u16 = 0x050;
pub const PROGRAM_START: u16 = 0x200;
pub const NUM_KEYS: usize = 16;
pub const DEFAULT_STACK_CAPACITY: usize = 12;
pub const MAX_STACK_CAPACITY: usize = 16;

/// Delay and sound timers count down at 60 Hz.
pub const TIMER_PERIOD: Duration = Duration::from_nanos(1_000_000_000 / 60);

const FONT_GLYPH_SIZE: u16 = 5;
const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

pub static DEFAULT_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Points where CHIP-8 interpreters disagree. Everything off by default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Quirks {
    /// Bitwise shift (8XY6 and 8XYE): VY is copied into VX before shifting (COSMAC VIP)
    pub shift_reads_vy: bool,
    /// Store and load memory (FX55/FX65): I is left pointing past the last register (COSMAC VIP)
    pub load_store_increments_index: bool,
}

impl Quirks {
    pub const fn cosmac_vip() -> Quirks {
        Quirks {
            shift_reads_vy: true,
            load_store_increments_index: true,
        }
    }
}

#[derive(Debug)]
pub struct Chip8Builder {
    /// Program loaded at 0x200 on build
    rom: Option<Vec<u8>>,
    /// PRNG seed, taken from the OS when absent
    rng_seed: Option<u64>,
    /// Number of return addresses the call stack holds
    stack_capacity: usize,
    quirks: Quirks,
}

pub struct Chip8 {
    /// General purpose registers
    regs: [u8; 16],
    /// Index register
    index: u16,
    /// Program counter
    pc: u16,
    /// Call stack
    stack: Vec<u16>,
    /// Stack pointer
    sp: usize,
    /// Delay Timer
    delay_timer: u8,
    /// Sound Timer
    sound_timer: u8,
    /// When the timers were last decremented
    last_timer_tick: Instant,
    /// Memory
    memory: Vec<u8>,
    /// Display
    display: Framebuffer,
    /// Key latches, written by the driver
    keys: [bool; NUM_KEYS],
    /// Set once a program has been copied into memory
    loaded: bool,
    quirks: Quirks,
    /// PRNG Generator
    rng: StdRng,
}

impl Default for Chip8Builder {
    fn default() -> Self {
        Chip8Builder::new()
    }
}

impl Chip8Builder {
    pub fn new() -> Chip8Builder {
        Chip8Builder {
            rom: None,
            rng_seed: None,
            stack_capacity: DEFAULT_STACK_CAPACITY,
            quirks: Quirks::default(),
        }
    }

    pub fn with_rom(mut self, rom: Vec<u8>) -> Self {
        self.rom = Some(rom);
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn with_quirks(mut self, quirks: Quirks) -> Self {
        self.quirks = quirks;
        self
    }

    pub fn with_stack_capacity(mut self, capacity: usize) -> Self {
        assert!(
            (1..=MAX_STACK_CAPACITY).contains(&capacity),
            "Stack capacity must be between [1-{}]",
            MAX_STACK_CAPACITY
        );
        self.stack_capacity = capacity;
        self
    }

    pub fn build(&self) -> Result<Chip8, LoadError> {
        // Pseudo random number generator, seeded once for the lifetime of the machine
        let rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut chip = Chip8 {
            regs: [0u8; 16],
            index: 0,
            pc: PROGRAM_START,
            stack: vec![0u16; self.stack_capacity],
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            last_timer_tick: Instant::now(),
            memory: fresh_memory(),
            display: Framebuffer::default(),
            keys: [false; NUM_KEYS],
            loaded: false,
            quirks: self.quirks,
            rng,
        };

        if let Some(rom) = &self.rom {
            chip.load(rom)?;
        }

        Ok(chip)
    }
}

/// Zeroed memory with the font table in place.
fn fresh_memory() -> Vec<u8> {
    let mut memory = vec![0u8; MEMORY_SIZE];
    let font = FONT_ADDR as usize;
    memory[font..font + DEFAULT_FONT.len()].copy_from_slice(&DEFAULT_FONT);
    memory
}

impl Chip8 {
    /// Copies a program verbatim to 0x200. Nothing is written on failure.
    pub fn load(&mut self, program: &[u8]) -> Result<(), LoadError> {
        if self.loaded {
            return Err(LoadError::AlreadyLoaded);
        }

        if program.len() > MAX_PROGRAM_SIZE {
            return Err(LoadError::TooLarge {
                size: program.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }

        let start = PROGRAM_START as usize;
        self.memory[start..start + program.len()].copy_from_slice(program);
        self.loaded = true;

        info!("Loaded {} byte program at 0x{:03x}", program.len(), start);
        Ok(())
    }

    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LoadError> {
        if self.loaded {
            return Err(LoadError::AlreadyLoaded);
        }

        let program = std::fs::read(path)?;
        self.load(&program)
    }

    /// Back to power-on state. Configuration and the PRNG survive.
    pub fn reset(&mut self) {
        self.regs = [0u8; 16];
        self.index = 0;
        self.pc = PROGRAM_START;
        self.stack.iter_mut().for_each(|s| *s = 0);
        self.sp = 0;
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.last_timer_tick = Instant::now();
        self.memory = fresh_memory();
        self.display = Framebuffer::default();
        self.keys = [false; NUM_KEYS];
        self.loaded = false;
    }

    pub fn display(&self) -> &Framebuffer {
        &self.display
    }

    /// Acknowledges the current framebuffer contents.
    pub fn mark_display_clean(&mut self) {
        self.display.mark_clean();
    }

    pub fn keys_mut(&mut self) -> &mut [bool; NUM_KEYS] {
        &mut self.keys
    }

    pub fn set_key(&mut self, key: usize, pressed: bool) {
        if let Some(latch) = self.keys.get_mut(key) {
            *latch = pressed;
        }
    }

    /// True while the sound timer is running.
    pub fn should_beep(&self) -> bool {
        self.sound_timer > 0
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn register(&self, reg: usize) -> u8 {
        self.regs[reg]
    }

    /// Active return addresses, oldest first.
    pub fn stack(&self) -> &[u16] {
        &self.stack[..self.sp]
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory[..]
    }

    /// True if the instruction at PC is FX0A and no key is down.
    pub fn is_waiting_for_key(&self) -> bool {
        let waiting = matches!(
            self.read_u16_be(self.pc),
            Some(word) if matches!(Instruction::decode(word), Instruction::WaitKey { .. })
        );
        waiting && !self.keys.iter().any(|&k| k)
    }

    /// Executes one instruction, decrementing the timers first if 1/60 s has
    /// passed since they were last decremented.
    pub fn step(&mut self) -> Result<(), ExecError> {
        self.step_at(Instant::now())
    }

    /// Like [`Chip8::step`] with an explicit notion of "now".
    ///
    /// On error PC is left at the faulting instruction and no other state has
    /// changed apart from the timer tick.
    pub fn step_at(&mut self, now: Instant) -> Result<(), ExecError> {
        self.tick_timers(now);

        // Fetch
        let addr = self.pc;
        let word = self.read_u16_be(addr).ok_or(ExecError::MemoryBounds {
            pc: addr,
            address: addr as usize + 1,
        })?;
        self.pc = addr + 2;

        // Decode
        let inst = Instruction::decode(word);
        trace!("0x{:03x}: 0x{:04x} {}", addr, word, inst);

        // Execute
        let result = self.execute(inst, addr);
        if result.is_err() {
            self.pc = addr;
        }
        result
    }

    /// Decrements both timers once, stopping at zero.
    pub fn step_timer(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    fn tick_timers(&mut self, now: Instant) {
        if now.saturating_duration_since(self.last_timer_tick) >= TIMER_PERIOD {
            self.step_timer();
            self.last_timer_tick = now;
        }
    }

    fn execute(&mut self, inst: Instruction, pc: u16) -> Result<(), ExecError> {
        use Instruction::*;

        match inst {
            ClearScreen => self.display.clear(),
            Return => {
                if self.sp == 0 {
                    return Err(ExecError::StackUnderflow { pc });
                }
                self.sp -= 1;
                self.pc = self.stack[self.sp];
            }
            Jump { addr } => self.pc = addr,
            Call { addr } => {
                if self.sp >= self.stack.len() {
                    return Err(ExecError::StackOverflow {
                        pc,
                        capacity: self.stack.len(),
                    });
                }
                self.stack[self.sp] = self.pc;
                self.sp += 1;
                self.pc = addr;
            }
            SkipEqImm { x, nn } => self.skip_if(self.reg(x) == nn),
            SkipNeqImm { x, nn } => self.skip_if(self.reg(x) != nn),
            SkipEqReg { x, y } => self.skip_if(self.reg(x) == self.reg(y)),
            SetImm { x, nn } => self.set_reg(x, nn),
            AddImm { x, nn } => self.set_reg(x, self.reg(x).wrapping_add(nn)),
            Set { x, y } => self.set_reg(x, self.reg(y)),
            Or { x, y } => self.set_reg(x, self.reg(x) | self.reg(y)),
            And { x, y } => self.set_reg(x, self.reg(x) & self.reg(y)),
            Xor { x, y } => self.set_reg(x, self.reg(x) ^ self.reg(y)),
            AddReg { x, y } => {
                let (sum, carry) = self.reg(x).overflowing_add(self.reg(y));
                self.regs[0xF] = carry as u8;
                self.set_reg(x, sum);
            }
            SubXY { x, y } => {
                let (vx, vy) = (self.reg(x), self.reg(y));
                self.regs[0xF] = (vx > vy) as u8;
                self.set_reg(x, vx.wrapping_sub(vy));
            }
            ShiftRight { x, y } => {
                let value = self.shift_operand(x, y);
                self.regs[0xF] = value & 0x01;
                self.set_reg(x, value >> 1);
            }
            SubYX { x, y } => {
                let (vx, vy) = (self.reg(x), self.reg(y));
                self.regs[0xF] = (vy > vx) as u8;
                self.set_reg(x, vy.wrapping_sub(vx));
            }
            ShiftLeft { x, y } => {
                let value = self.shift_operand(x, y);
                self.regs[0xF] = (value >> 7) & 0x01;
                self.set_reg(x, value << 1);
            }
            SkipNeqReg { x, y } => self.skip_if(self.reg(x) != self.reg(y)),
            SetIndex { addr } => self.index = addr,
            JumpOffset { addr } => self.pc = addr + self.regs[0] as u16,
            Random { x, nn } => {
                let n = self.rng.next_u32() as u8;
                self.set_reg(x, n & nn);
            }
            Draw { x, y, n } => self.draw_sprite(x, y, n, pc)?,
            SkipKeyPressed { x } => self.skip_if(self.key_pressed(self.reg(x))),
            SkipKeyNotPressed { x } => self.skip_if(!self.key_pressed(self.reg(x))),
            GetDelay { x } => self.set_reg(x, self.delay_timer),
            WaitKey { x } => match self.keys.iter().position(|&k| k) {
                Some(key) => self.set_reg(x, key as u8),
                // Run this instruction again on the next step
                None => self.pc = pc,
            },
            SetDelay { x } => self.delay_timer = self.reg(x),
            SetSound { x } => self.sound_timer = self.reg(x),
            AddIndex { x } => {
                let index = self.index + self.reg(x) as u16;
                check_range(pc, index as usize, 1)?;
                self.index = index;
            }
            FontGlyph { x } => self.index = FONT_ADDR + self.reg(x) as u16 * FONT_GLYPH_SIZE,
            Bcd { x } => {
                let start = self.index as usize;
                check_writable(pc, start, 3)?;
                let value = self.reg(x);
                self.memory[start] = value / 100;
                self.memory[start + 1] = (value / 10) % 10;
                self.memory[start + 2] = value % 10;
            }
            Store { x } => {
                let start = self.index as usize;
                let count = x as usize + 1;
                check_writable(pc, start, count)?;
                self.memory[start..start + count].copy_from_slice(&self.regs[..count]);
                if self.quirks.load_store_increments_index {
                    self.index += count as u16;
                }
            }
            Load { x } => {
                let start = self.index as usize;
                let count = x as usize + 1;
                check_range(pc, start, count)?;
                self.regs[..count].copy_from_slice(&self.memory[start..start + count]);
                if self.quirks.load_store_increments_index {
                    self.index += count as u16;
                }
            }
            Unknown { word } => {
                debug!("Ignoring unknown instruction 0x{:04x} at 0x{:03x}", word, pc);
            }
        }

        Ok(())
    }

    /// DXYN: XOR an N row sprite from memory at I onto the display.
    ///
    /// The origin wraps around the screen, the sprite itself is clipped at
    /// the right and bottom edges. VF is set if any lit pixel was turned off.
    fn draw_sprite(&mut self, x: u8, y: u8, rows: u8, pc: u16) -> Result<(), ExecError> {
        let sprite_start = self.index as usize;
        check_range(pc, sprite_start, rows as usize)?;

        // Origin where we start to draw
        let ox = self.reg(x) as usize % SCREEN_WIDTH;
        let oy = self.reg(y) as usize % SCREEN_HEIGHT;

        // Reset carry flag
        self.regs[0xF] = 0;

        for row in 0..rows as usize {
            let py = oy + row;
            if py >= SCREEN_HEIGHT {
                break;
            }

            let data = self.memory[sprite_start + row];
            for column in 0..8 {
                let px = ox + column;
                if px >= SCREEN_WIDTH {
                    break;
                }

                if data & (0x80 >> column) != 0 && self.display.xor_pixel(px, py) {
                    self.regs[0xF] = 1;
                }
            }
        }

        Ok(())
    }

    fn reg(&self, reg: u8) -> u8 {
        self.regs[reg as usize]
    }

    fn set_reg(&mut self, reg: u8, value: u8) {
        self.regs[reg as usize] = value;
    }

    fn shift_operand(&self, x: u8, y: u8) -> u8 {
        if self.quirks.shift_reads_vy {
            self.reg(y)
        } else {
            self.reg(x)
        }
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.pc += 2;
        }
    }

    /// Key numbers above 0xF are never down.
    fn key_pressed(&self, key: u8) -> bool {
        self.keys.get(key as usize).copied().unwrap_or(false)
    }

    fn read_u16_be(&self, addr: u16) -> Option<u16> {
        let addr = addr as usize;
        let bytes = self.memory.get(addr..addr + 2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }
}

/// Fails unless `start..start + len` lies inside memory.
fn check_range(pc: u16, start: usize, len: usize) -> Result<(), ExecError> {
    if start + len > MEMORY_SIZE {
        return Err(ExecError::MemoryBounds {
            pc,
            address: start + len - 1,
        });
    }
    Ok(())
}

/// Like [`check_range`], additionally refusing writes below the program area
/// so the font table stays intact.
fn check_writable(pc: u16, start: usize, len: usize) -> Result<(), ExecError> {
    check_range(pc, start, len)?;
    if start < PROGRAM_START as usize {
        return Err(ExecError::ProtectedWrite { pc, address: start });
    }
    Ok(())
}
