//! A CHIP-8 interpreter core.
//!
//! The [`ChipSet`](chip8::ChipSet) owns the whole machine state and is driven by a host,
//! which loads the program bytes, calls [`step`](chip8::ChipSet::step) at its own pace,
//! calls [`tick_timers`](chip8::ChipSet::tick_timers) at 60Hz and presents the framebuffer.
pub mod chip8;
pub mod definitions;
pub mod devices;
pub mod opcode;
pub mod timer;
mod error;

// reexporting for convenience
pub use error::*;
