use std::fmt;

/// A decoded CHIP-8 instruction.
///
/// `x` and `y` are register numbers (0x0-0xF), `nn` is the low byte of the
/// instruction word, `n` the low nibble and `addr` the low 12 bits.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Instruction {
    /// 00E0 (any 0xxx with N == 0): clear the screen
    ClearScreen,
    /// 00EE (any 0xxx with N == E): return from subroutine
    Return,
    /// 1NNN: jump to NNN
    Jump { addr: u16 },
    /// 2NNN: call subroutine at NNN
    Call { addr: u16 },
    /// 3XNN: skip next instruction if VX == NN
    SkipEqImm { x: u8, nn: u8 },
    /// 4XNN: skip next instruction if VX != NN
    SkipNeqImm { x: u8, nn: u8 },
    /// 5XYN: skip next instruction if VX == VY
    SkipEqReg { x: u8, y: u8 },
    /// 6XNN: VX = NN
    SetImm { x: u8, nn: u8 },
    /// 7XNN: VX += NN, no carry
    AddImm { x: u8, nn: u8 },
    /// 8XY0: VX = VY
    Set { x: u8, y: u8 },
    /// 8XY1: VX |= VY
    Or { x: u8, y: u8 },
    /// 8XY2: VX &= VY
    And { x: u8, y: u8 },
    /// 8XY3: VX ^= VY
    Xor { x: u8, y: u8 },
    /// 8XY4: VX += VY, VF = carry
    AddReg { x: u8, y: u8 },
    /// 8XY5: VX = VX - VY, VF = VX > VY
    SubXY { x: u8, y: u8 },
    /// 8XY6: VX >>= 1, VF = shifted out bit
    ShiftRight { x: u8, y: u8 },
    /// 8XY7: VX = VY - VX, VF = VY > VX
    SubYX { x: u8, y: u8 },
    /// 8XYE: VX <<= 1, VF = shifted out bit
    ShiftLeft { x: u8, y: u8 },
    /// 9XYN: skip next instruction if VX != VY
    SkipNeqReg { x: u8, y: u8 },
    /// ANNN: I = NNN
    SetIndex { addr: u16 },
    /// BNNN: jump to NNN + V0
    JumpOffset { addr: u16 },
    /// CXNN: VX = random byte & NN
    Random { x: u8, nn: u8 },
    /// DXYN: draw an N row sprite from I at (VX, VY)
    Draw { x: u8, y: u8, n: u8 },
    /// EX9E: skip next instruction if key VX is down
    SkipKeyPressed { x: u8 },
    /// EXA1: skip next instruction if key VX is up
    SkipKeyNotPressed { x: u8 },
    /// FX07: VX = delay timer
    GetDelay { x: u8 },
    /// FX0A: wait for a key press and store it in VX
    WaitKey { x: u8 },
    /// FX15: delay timer = VX
    SetDelay { x: u8 },
    /// FX18: sound timer = VX
    SetSound { x: u8 },
    /// FX1E: I += VX
    AddIndex { x: u8 },
    /// FX29: I = address of font glyph VX
    FontGlyph { x: u8 },
    /// FX33: store BCD of VX at I, I+1, I+2
    Bcd { x: u8 },
    /// FX55: store V0..=VX at I
    Store { x: u8 },
    /// FX65: load V0..=VX from I
    Load { x: u8 },
    /// Anything else. Executes as a no-op.
    Unknown { word: u16 },
}

impl Instruction {
    pub fn decode(word: u16) -> Instruction {
        use Instruction::*;

        // Instruction split into nibbles
        let group = (word >> 12) as u8;
        let x = ((word >> 8) & 0xF) as u8;
        let y = ((word >> 4) & 0xF) as u8;
        let n = (word & 0xF) as u8;
        let nn = (word & 0xFF) as u8;
        let addr = word & 0x0FFF;

        match (group, n) {
            (0x0, 0x0) => ClearScreen,
            (0x0, 0xE) => Return,
            (0x1, _) => Jump { addr },
            (0x2, _) => Call { addr },
            (0x3, _) => SkipEqImm { x, nn },
            (0x4, _) => SkipNeqImm { x, nn },
            (0x5, _) => SkipEqReg { x, y },
            (0x6, _) => SetImm { x, nn },
            (0x7, _) => AddImm { x, nn },
            (0x8, 0x0) => Set { x, y },
            (0x8, 0x1) => Or { x, y },
            (0x8, 0x2) => And { x, y },
            (0x8, 0x3) => Xor { x, y },
            (0x8, 0x4) => AddReg { x, y },
            (0x8, 0x5) => SubXY { x, y },
            (0x8, 0x6) => ShiftRight { x, y },
            (0x8, 0x7) => SubYX { x, y },
            (0x8, 0xE) => ShiftLeft { x, y },
            (0x9, _) => SkipNeqReg { x, y },
            (0xA, _) => SetIndex { addr },
            (0xB, _) => JumpOffset { addr },
            (0xC, _) => Random { x, nn },
            (0xD, _) => Draw { x, y, n },
            (0xE, _) => match nn {
                0x9E => SkipKeyPressed { x },
                0xA1 => SkipKeyNotPressed { x },
                _ => Unknown { word },
            },
            (0xF, _) => match nn {
                0x07 => GetDelay { x },
                0x0A => WaitKey { x },
                0x15 => SetDelay { x },
                0x18 => SetSound { x },
                0x1E => AddIndex { x },
                0x29 => FontGlyph { x },
                0x33 => Bcd { x },
                0x55 => Store { x },
                0x65 => Load { x },
                _ => Unknown { word },
            },
            _ => Unknown { word },
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;

        match *self {
            ClearScreen => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump { addr } => write!(f, "JP 0x{:03x}", addr),
            Call { addr } => write!(f, "CALL 0x{:03x}", addr),
            SkipEqImm { x, nn } => write!(f, "SE V{:X}, 0x{:02x}", x, nn),
            SkipNeqImm { x, nn } => write!(f, "SNE V{:X}, 0x{:02x}", x, nn),
            SkipEqReg { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            SetImm { x, nn } => write!(f, "LD V{:X}, 0x{:02x}", x, nn),
            AddImm { x, nn } => write!(f, "ADD V{:X}, 0x{:02x}", x, nn),
            Set { x, y } => write!(f, "LD V{:X}, V{:X}", x, y),
            Or { x, y } => write!(f, "OR V{:X}, V{:X}", x, y),
            And { x, y } => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor { x, y } => write!(f, "XOR V{:X}, V{:X}", x, y),
            AddReg { x, y } => write!(f, "ADD V{:X}, V{:X}", x, y),
            SubXY { x, y } => write!(f, "SUB V{:X}, V{:X}", x, y),
            ShiftRight { x, y } => write!(f, "SHR V{:X}, V{:X}", x, y),
            SubYX { x, y } => write!(f, "SUBN V{:X}, V{:X}", x, y),
            ShiftLeft { x, y } => write!(f, "SHL V{:X}, V{:X}", x, y),
            SkipNeqReg { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            SetIndex { addr } => write!(f, "LD I, 0x{:03x}", addr),
            JumpOffset { addr } => write!(f, "JP V0, 0x{:03x}", addr),
            Random { x, nn } => write!(f, "RND V{:X}, 0x{:02x}", x, nn),
            Draw { x, y, n } => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            SkipKeyPressed { x } => write!(f, "SKP V{:X}", x),
            SkipKeyNotPressed { x } => write!(f, "SKNP V{:X}", x),
            GetDelay { x } => write!(f, "LD V{:X}, DT", x),
            WaitKey { x } => write!(f, "LD V{:X}, K", x),
            SetDelay { x } => write!(f, "LD DT, V{:X}", x),
            SetSound { x } => write!(f, "LD ST, V{:X}", x),
            AddIndex { x } => write!(f, "ADD I, V{:X}", x),
            FontGlyph { x } => write!(f, "LD F, V{:X}", x),
            Bcd { x } => write!(f, "LD B, V{:X}", x),
            Store { x } => write!(f, "LD [I], V{:X}", x),
            Load { x } => write!(f, "LD V{:X}, [I]", x),
            Unknown { word } => write!(f, "??? 0x{:04x}", word),
        }
    }
}
