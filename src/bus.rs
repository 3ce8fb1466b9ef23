//! The memory and I/O fabric between the CPU and everything else.
//!
//! Owns the BIOS, system RAM, Super Game Module RAM, cartridge and all
//! three peripheral chips. Memory decoding is a strict priority chain:
//! SGM overlays first, then BIOS, the unmapped expansion hole, the 1 KiB
//! RAM mirror and finally paged cartridge ROM. I/O decoding is by 0x20
//! port bands with a handful of fully-decoded SGM ports below 0x80.

use crate::{
    cartridge::Cartridge,
    controller::{InputCallback, BASELINE},
    info::*,
    psg::Psg,
    serial::{Reader, Writer},
    sgmpsg::SgmPsg,
    vdp::{Palette, Vdp},
};
use rand::Rng;

pub struct Bus {
    pub(crate) vdp: Vdp,
    pub(crate) psg: Psg,
    pub(crate) sgmpsg: SgmPsg,
    pub(crate) cart: Cartridge,

    bios: Box<[u8]>,
    ram: Box<[u8]>,
    sgmram: Box<[u8]>,
    /// SGM RAM overlay enables: lower covers 0x0000-0x1FFF (over the
    /// BIOS), upper covers 0x2000-0x7FFF.
    sgm_lower: bool,
    sgm_upper: bool,

    /// Controller strobe segment: 0 selects keypad half, 1 joystick half.
    cseg: u8,
    /// Last words polled from the frontend, one per port.
    ctrl: [u16; 2],
    input_cb: InputCallback,

    /// Wait-state cycles charged by I/O since last collected.
    delay: u32,
}

impl Bus {
    pub(crate) fn new(scanlines: u16, palette: Palette) -> Self {
        // Boot RAM is deliberately not zeroed; some titles use leftover
        // garbage as an entropy source and hang on all-zero RAM.
        let mut ram = vec![0u8; SIZE_RAM].into_boxed_slice();
        rand::rng().fill(&mut ram[..]);

        Self {
            vdp: Vdp::new(scanlines, palette),
            psg: Psg::new(),
            sgmpsg: SgmPsg::new(),
            cart: Cartridge::default(),
            bios: vec![0; SIZE_BIOS].into_boxed_slice(),
            ram,
            sgmram: vec![0xFF; SIZE_SGM_RAM].into_boxed_slice(),
            sgm_lower: false,
            sgm_upper: false,
            cseg: 0,
            ctrl: [BASELINE; 2],
            input_cb: Box::new(|_| BASELINE),
            delay: 0,
        }
    }

    pub(crate) fn load_bios(&mut self, image: &[u8]) -> Result<(), crate::EmuError> {
        if image.len() != SIZE_BIOS {
            return Err(crate::EmuError::BiosSize(image.len()));
        }
        self.bios.copy_from_slice(image);
        Ok(())
    }

    pub(crate) fn set_input_callback(&mut self, cb: InputCallback) {
        self.input_cb = cb;
    }

    pub(crate) fn take_delay(&mut self) -> u32 {
        std::mem::take(&mut self.delay)
    }

    /// CPU memory read hook.
    pub fn read_byte(&mut self, addr: u16) -> u8 {
        if self.sgm_lower && addr < BIOS_END {
            return self.sgmram[addr as usize];
        }
        if addr < BIOS_END {
            return self.bios[addr as usize];
        }
        if self.sgm_upper && addr < RAM_END {
            return self.sgmram[addr as usize];
        }
        if addr < EXPANSION_END {
            // Unpopulated expansion port.
            return 0xFF;
        }
        if addr < RAM_END {
            return self.ram[(addr & RAM_MASK) as usize];
        }
        self.cart.read(addr)
    }

    /// CPU memory write hook. ROM and the expansion hole swallow writes.
    pub fn write_byte(&mut self, addr: u16, data: u8) {
        if self.sgm_lower && addr < BIOS_END {
            self.sgmram[addr as usize] = data;
            return;
        }
        if addr < BIOS_END {
            return;
        }
        if self.sgm_upper && addr < RAM_END {
            self.sgmram[addr as usize] = data;
            return;
        }
        if addr >= EXPANSION_END && addr < RAM_END {
            self.ram[(addr & RAM_MASK) as usize] = data;
        }
    }

    /// CPU I/O read hook.
    pub fn io_read(&mut self, port: u8) -> u8 {
        if port == PORT_SGM_AY_READ {
            return self.sgmpsg.read_reg();
        }

        match port & BAND_MASK {
            BAND_VDP => {
                if port & 1 != 0 {
                    self.vdp.status_read()
                } else {
                    self.vdp.data_read()
                }
            }
            BAND_CTRL_PSG => {
                let p = ((port >> 1) & 1) as usize;
                let word = (self.input_cb)(p);
                self.ctrl[p] = word;
                // Lines are active-low: the selected half reads inverted.
                if self.cseg != 0 {
                    !((word >> 8) as u8)
                } else {
                    !(word as u8)
                }
            }
            _ => 0xFF,
        }
    }

    /// CPU I/O write hook.
    pub fn io_write(&mut self, port: u8, data: u8) {
        match port {
            PORT_SGM_AY_LATCH => return self.sgmpsg.select(data),
            PORT_SGM_AY_DATA => return self.sgmpsg.write_reg(data),
            PORT_SGM_UPPER => {
                // One-way enable; the hardware offers no disable path.
                self.sgm_upper = true;
                return;
            }
            PORT_SGM_LOWER => {
                // Inverted polarity, bit 1 only.
                self.sgm_lower = !data & 0x02 != 0;
                return;
            }
            _ => {}
        }

        match port & BAND_MASK {
            BAND_CSEG_KEYPAD => self.cseg = 0,
            BAND_CSEG_JOYSTICK => self.cseg = 1,
            BAND_VDP => {
                if port & 1 != 0 {
                    self.vdp.ctrl_write(data)
                } else {
                    self.vdp.data_write(data)
                }
            }
            BAND_CTRL_PSG => {
                self.delay += PSG_WRITE_PENALTY;
                self.psg.write(data);
            }
            _ => {}
        }
    }

    pub(crate) fn reset(&mut self) {
        self.vdp.reset();
        self.sgm_lower = false;
        self.sgm_upper = false;
        self.cseg = 0;
        self.delay = 0;
    }

    /// System-context part of the save state; the chips append their own
    /// blocks after it.
    pub(crate) const STATE_LEN: usize = SIZE_RAM + SIZE_SGM_RAM + 1 + 1 + 1 + 2 * 2;

    pub(crate) fn state_save(&self, w: &mut Writer) {
        w.push_block(&self.ram);
        w.push_block(&self.sgmram);
        w.push_u8(self.cseg);
        w.push_u8(self.sgm_lower as u8);
        w.push_u8(self.sgm_upper as u8);
        w.push_u16(self.ctrl[0]);
        w.push_u16(self.ctrl[1]);
    }

    pub(crate) fn state_load(&mut self, r: &mut Reader) {
        r.pop_block(&mut self.ram);
        r.pop_block(&mut self.sgmram);
        self.cseg = r.pop_u8();
        self.sgm_lower = r.pop_u8() != 0;
        self.sgm_upper = r.pop_u8() != 0;
        self.ctrl[0] = r.pop_u16();
        self.ctrl[1] = r.pop_u16();
        self.delay = 0;
    }
}
