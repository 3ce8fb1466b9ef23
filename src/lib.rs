//! Cycle-timed ColecoVision core.
//!
//! Emulates the console around an externally supplied Z80 interpreter:
//! the TMS9928A video processor, the SN76489 sound generator, the Super
//! Game Module's extra RAM and AY-3-8910, the cartridge/BIOS memory map
//! with Mega Cart banking, and the two controller ports. The host drives
//! it one video frame at a time and receives video and audio through
//! plain buffers and callbacks.

mod bus;
mod cartridge;
mod controller;
mod counter;
mod cpu;
mod emulator;
mod info;
mod mixer;
mod psg;
mod serial;
mod sgmpsg;
mod vdp;

pub use bus::Bus;
pub use controller::{
    ControllerState, InputCallback, Keypad, BASELINE, INPUT_DOWN, INPUT_FIRE_LEFT,
    INPUT_FIRE_RIGHT, INPUT_LEFT, INPUT_RIGHT, INPUT_SPIN_MINUS, INPUT_SPIN_PLUS, INPUT_UP,
};
pub use cpu::{Z80Core, Z80State};
pub use emulator::{Config, Emulator, Region, STATE_LEN};
pub use info::{CPU_CLOCK, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use mixer::AudioCallback;
pub use vdp::Palette;

/// Emulator error type. Everything here is a status the frontend can
/// show; nothing during a frame can fail.
#[derive(Debug, thiserror::Error)]
pub enum EmuError {
    #[error("unsupported sample rate {0}")]
    UnsupportedSampleRate(u32),
    #[error("resampler quality {0} out of range (0-10)")]
    QualityOutOfRange(u8),
    #[error("BIOS image must be exactly 8192 bytes, got {0}")]
    BiosSize(usize),
    #[error("cartridge image too small ({0} bytes)")]
    RomTooSmall(usize),
    #[error("cartridge image has no valid header")]
    BadRomHeader,
    #[error("save state is {actual} bytes, expected {expected}")]
    StateSize { expected: usize, actual: usize },
    #[error("frame buffer is {actual} pixels, expected {expected}")]
    FrameSize { expected: usize, actual: usize },
}
