//! Cartridge ROM with flat or Mega Cart paging.
//!
//! Standard carts are at most 32 KiB and map flat into the four 8 KiB
//! windows from 0x8000. Mega Carts keep their top 16 KiB fixed at 0x8000
//! and switch the 16 KiB window at 0xC000 between banks; the switch is a
//! side effect of *reading* anywhere in 0xFFC0-0xFFFF, and the very read
//! that switches already sees the new bank's byte.

use crate::{
    info::*,
    serial::{Reader, Writer},
    EmuError,
};

pub(crate) struct Cartridge {
    megacart: bool,
    /// Offsets into `rom`, one per 8 KiB window at 0x8000/0xA000/0xC000/0xE000.
    pages: [u32; ROM_PAGES],
    /// Number of 8 KiB pages in the image.
    npages: u32,
    rom: Box<[u8]>,
}

impl Default for Cartridge {
    fn default() -> Self {
        // Unpopulated slot: every read in cart space falls to the size
        // guard and returns 0xFF.
        Self {
            megacart: false,
            pages: [0; ROM_PAGES],
            npages: 0,
            rom: Box::default(),
        }
    }
}

impl Cartridge {
    /// Copy the ROM image and validate its header.
    ///
    /// Images over 32 KiB must carry the two-byte magic at `len - 0x4000`
    /// (little-endian) and load as Mega Carts. Smaller images carry it at
    /// offset 0. 0xAA55 boots through the BIOS splash, 0x55AA jumps
    /// straight to the cart vector; both are accepted.
    pub(crate) fn new(rom: &[u8]) -> Result<Self, EmuError> {
        if rom.len() < 2 {
            return Err(EmuError::RomTooSmall(rom.len()));
        }

        if rom.len() > 32 * KB {
            let off = rom.len() - 0x4000;
            let magic = u16::from_le_bytes([rom[off], rom[off + 1]]);
            if magic != 0xAA55 && magic != 0x55AA {
                return Err(EmuError::BadRomHeader);
            }

            let npages = (rom.len() / PAGE_SIZE) as u32;
            log::debug!(
                "cartridge: Mega Cart, {} KiB, {} banks",
                rom.len() / KB,
                npages >> 1
            );
            return Ok(Self {
                megacart: true,
                // Top 16 KiB fixed at 0x8000, first bank visible at 0xC000.
                pages: [
                    (rom.len() - 0x4000) as u32,
                    (rom.len() - 0x2000) as u32,
                    0,
                    PAGE_SIZE as u32,
                ],
                npages,
                rom: rom.into(),
            });
        }

        // Cartridge headers predate the Mega Cart and read big-endian.
        let magic = (rom[0] as u16) << 8 | rom[1] as u16;
        if magic != 0xAA55 && magic != 0x55AA {
            return Err(EmuError::BadRomHeader);
        }

        let npages = ((rom.len() / PAGE_SIZE) as u32).max(1);
        let mut pages = [0u32; ROM_PAGES];
        for (i, p) in pages.iter_mut().enumerate() {
            // Small ROMs replicate their pages through the higher windows.
            *p = (i as u32 % npages) * PAGE_SIZE as u32;
        }

        log::debug!("cartridge: {} KiB flat", rom.len() / KB);
        Ok(Self {
            megacart: false,
            pages,
            npages,
            rom: rom.into(),
        })
    }

    /// Read from cart space (0x8000-0xFFFF), switching banks first if this
    /// is a Mega Cart select address.
    pub(crate) fn read(&mut self, addr: u16) -> u8 {
        if self.megacart && addr >= MEGA_SELECT_BASE {
            let bank = addr as u32 & ((self.npages >> 1) - 1);
            self.pages[2] = bank << 14;
            self.pages[3] = (bank << 14) + PAGE_SIZE as u32;
        }

        if addr as usize >= self.rom.len() + CART_BASE as usize {
            return 0xFF;
        }

        let page = ((addr >> PAGE_SHIFT) - 4) as usize;
        self.rom[self.pages[page] as usize + (addr as usize & (PAGE_SIZE - 1))]
    }

    pub(crate) const STATE_LEN: usize = ROM_PAGES * 4;

    pub(crate) fn state_save(&self, w: &mut Writer) {
        for p in self.pages {
            w.push_u32(p);
        }
    }

    pub(crate) fn state_load(&mut self, r: &mut Reader) {
        for p in self.pages.iter_mut() {
            *p = r.pop_u32();
        }
    }
}
