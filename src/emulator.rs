//! The assembled console and its frame scheduler.
//!
//! [`Emulator`] owns the CPU adapter (interpreter plus bus) and the
//! mixer, and advances everything one video frame at a time: CPU
//! instructions run until each scanline's cycle budget is met, every 16
//! cycles of progress clock both PSGs, and each completed line renders
//! through the VDP. Audio is delivered once per frame.

use crate::{
    bus::Bus,
    cartridge::Cartridge,
    counter::Divider,
    cpu::{Cpu, Z80Core, Z80State},
    info::*,
    mixer::{AudioCallback, Mixer},
    psg::Psg,
    serial::{Reader, Writer},
    sgmpsg::SgmPsg,
    vdp::{Palette, Vdp},
    controller::InputCallback,
    EmuError,
};

/// Fixed size of a save-state image, derived from the component layouts.
pub const STATE_LEN: usize = Bus::STATE_LEN
    + 4 // scanline cycle residue
    + 4 // PSG clock residue
    + Cartridge::STATE_LEN
    + Psg::STATE_LEN
    + SgmPsg::STATE_LEN
    + Vdp::STATE_LEN
    + Z80State::STATE_LEN;

/// Video timing region.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    #[default]
    Ntsc,
    Pal,
}

impl Region {
    pub(crate) fn scanlines(self) -> u16 {
        match self {
            Region::Ntsc => NTSC_LINES,
            Region::Pal => PAL_LINES,
        }
    }

    pub fn frame_rate(self) -> u32 {
        match self {
            Region::Ntsc => 60,
            Region::Pal => 50,
        }
    }
}

/// Host-facing knobs, validated once at construction.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub region: Region,
    /// One of 44100, 48000, 96000 or 192000.
    pub sample_rate: u32,
    /// Resampler quality, 0-10. 0 selects nearest-neighbor.
    pub quality: u8,
    pub palette: Palette,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: Region::Ntsc,
            sample_rate: 48_000,
            quality: 3,
            palette: Palette::Teatime,
        }
    }
}

pub struct Emulator<Z: Z80Core> {
    cpu: Cpu<Z>,
    mixer: Mixer,
    region: Region,
    /// Cycles the CPU overshot the previous line by; deducted from the
    /// next line's budget so the average line length stays exact.
    extcycs: i32,
    /// Divide-by-16 clock driving both PSGs.
    psg_clock: Divider,
}

impl<Z: Z80Core> Emulator<Z> {
    pub fn new(core: Z, config: Config) -> Result<Self, EmuError> {
        if !HOST_RATES.contains(&config.sample_rate) {
            return Err(EmuError::UnsupportedSampleRate(config.sample_rate));
        }
        if config.quality > MAX_QUALITY {
            return Err(EmuError::QualityOutOfRange(config.quality));
        }

        let bus = Bus::new(config.region.scanlines(), config.palette);
        Ok(Self {
            cpu: Cpu::new(core, bus),
            mixer: Mixer::new(config.sample_rate, config.quality),
            region: config.region,
            extcycs: 0,
            psg_clock: Divider::new(PSG_CLOCK_DIV),
        })
    }

    /// Install the 8 KiB BIOS image.
    pub fn load_bios(&mut self, image: &[u8]) -> Result<(), EmuError> {
        self.cpu.bus.load_bios(image)
    }

    /// Insert a cartridge.
    pub fn load_rom(&mut self, image: &[u8]) -> Result<(), EmuError> {
        self.cpu.bus.cart = Cartridge::new(image)?;
        Ok(())
    }

    pub fn set_input_callback(&mut self, cb: InputCallback) {
        self.cpu.bus.set_input_callback(cb);
    }

    pub fn set_audio_callback(&mut self, cb: AudioCallback) {
        self.mixer.set_audio_callback(cb);
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Direct bus access, mainly for harnesses and debuggers.
    pub fn bus(&self) -> &Bus {
        &self.cpu.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.cpu.bus
    }

    pub fn core(&self) -> &Z {
        &self.cpu.core
    }

    pub fn core_mut(&mut self) -> &mut Z {
        &mut self.cpu.core
    }

    /// Run one full video frame and deliver its audio. Returns the number
    /// of audio samples handed to the callback.
    pub fn frame_exec(&mut self) -> usize {
        self.cpu.bus.psg.begin_frame();
        self.cpu.bus.sgmpsg.begin_frame();

        for _ in 0..self.region.scanlines() {
            let reqcycs = CYCLES_PER_LINE - self.extcycs;
            let mut linecycs = 0i32;
            while linecycs < reqcycs {
                let itercycs = self.cpu.step();
                linecycs += itercycs as i32;
                for _ in 0..self.psg_clock.advance(itercycs) {
                    self.cpu.bus.psg.exec();
                    self.cpu.bus.sgmpsg.exec();
                }
            }
            self.extcycs = linecycs - reqcycs;

            self.cpu.bus.vdp.exec();
            self.cpu.poll_vdp_nmi();
        }

        self.mixer
            .mix(self.cpu.bus.psg.samples_mut(), self.cpu.bus.sgmpsg.samples())
    }

    /// Soft reset: CPU and chip state restart, RAM and media stay put.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.cpu.bus.reset();
        self.extcycs = 0;
        self.psg_clock = Divider::new(PSG_CLOCK_DIV);
    }

    /// Borrow the rendered 272x208 frame (0xAARRGGBB).
    pub fn frame(&self) -> &[u32] {
        self.cpu.bus.vdp.frame()
    }

    /// Copy the rendered frame into a caller buffer of exactly
    /// `SCREEN_WIDTH * SCREEN_HEIGHT` pixels.
    pub fn copy_frame(&self, dst: &mut [u32]) -> Result<(), EmuError> {
        let src = self.cpu.bus.vdp.frame();
        if dst.len() != src.len() {
            return Err(EmuError::FrameSize {
                expected: src.len(),
                actual: dst.len(),
            });
        }
        dst.copy_from_slice(src);
        Ok(())
    }

    /// Snapshot everything `frame_exec` depends on into a fixed-size
    /// image (ROM and BIOS are not included; reload media first).
    pub fn state_save(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(STATE_LEN);
        self.cpu.bus.state_save(&mut w);
        w.push_u32(self.extcycs as u32);
        w.push_u32(self.psg_clock.residue());
        self.cpu.bus.cart.state_save(&mut w);
        self.cpu.bus.psg.state_save(&mut w);
        self.cpu.bus.sgmpsg.state_save(&mut w);
        self.cpu.bus.vdp.state_save(&mut w);
        self.cpu.core.state().state_save(&mut w);
        debug_assert_eq!(w.len(), STATE_LEN);
        w.into_bytes()
    }

    pub fn state_load(&mut self, data: &[u8]) -> Result<(), EmuError> {
        if data.len() != STATE_LEN {
            log::warn!(
                "state: image is {} bytes, expected {}",
                data.len(),
                STATE_LEN
            );
            return Err(EmuError::StateSize {
                expected: STATE_LEN,
                actual: data.len(),
            });
        }

        let mut r = Reader::new(data);
        self.cpu.bus.state_load(&mut r);
        self.extcycs = r.pop_u32() as i32;
        self.psg_clock.set_residue(r.pop_u32());
        self.cpu.bus.cart.state_load(&mut r);
        self.cpu.bus.psg.state_load(&mut r);
        self.cpu.bus.sgmpsg.state_load(&mut r);
        self.cpu.bus.vdp.state_load(&mut r);
        let z80 = Z80State::state_load(&mut r);
        self.cpu.core.load_state(&z80);
        Ok(())
    }
}
