use thiserror::Error;

/// Failure to place a program into memory. The machine is left untouched.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("program is too large ({size} bytes), at most {max} bytes fit above 0x200")]
    TooLarge { size: usize, max: usize },

    #[error("failed to read program: {0}")]
    Io(#[from] std::io::Error),

    #[error("a program is already loaded, reset the machine before loading another")]
    AlreadyLoaded,
}

/// Failure while executing an instruction.
///
/// These come from malformed programs, not from normal operation. The driver
/// decides whether to halt or to log and continue.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ExecError {
    #[error("stack overflow at 0x{pc:03x}: call stack already holds {capacity} return addresses")]
    StackOverflow { pc: u16, capacity: usize },

    #[error("stack underflow at 0x{pc:03x}: return with an empty call stack")]
    StackUnderflow { pc: u16 },

    #[error("memory access out of bounds at 0x{pc:03x}: address 0x{address:04x}")]
    MemoryBounds { pc: u16, address: usize },

    #[error("write to protected memory at 0x{pc:03x}: address 0x{address:03x} is below 0x200")]
    ProtectedWrite { pc: u16, address: usize },
}
