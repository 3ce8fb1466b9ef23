//! Property tests over the bus fabric and save states.

mod common;

use common::{flat_rom, test_bios, ChaosCore, ScriptCore};
use cvemu::{Config, Emulator};
use proptest::prelude::*;

fn plain_emu() -> Emulator<ScriptCore> {
    Emulator::new(ScriptCore::new(4, vec![]), Config::default()).unwrap()
}

proptest! {
    /// With both SGM overlays off, system RAM repeats every 1 KiB across
    /// 0x6000-0x7FFF.
    #[test]
    fn ram_mirror(addr in 0x6000u16..0x8000, mirror in 0u16..8, byte: u8) {
        let mut e = plain_emu();
        let bus = e.bus_mut();
        bus.write_byte(addr, byte);
        let alias = 0x6000 + (addr & 0x3FF) + mirror * 0x400;
        prop_assert_eq!(bus.read_byte(alias), byte);
    }

    /// The controller read returns the complement of whichever half the
    /// strobe segment selects.
    #[test]
    fn controller_complement(word: u16, joystick_half: bool) {
        let mut e = plain_emu();
        e.set_input_callback(Box::new(move |_| word));
        let bus = e.bus_mut();
        bus.io_write(if joystick_half { 0xC0 } else { 0x80 }, 0);
        let got = bus.io_read(0xFC);
        let want = if joystick_half { !((word >> 8) as u8) } else { !(word as u8) };
        prop_assert_eq!(got, want);
    }

    /// With both overlays armed, all of 0x0000-0x7FFF is SGM RAM no
    /// matter what the BIOS or cartridge hold.
    #[test]
    fn sgm_overlay_precedence(addr in 0u16..0x8000, byte: u8) {
        let mut e = plain_emu();
        e.load_bios(&test_bios()).unwrap();
        e.load_rom(&flat_rom(0x8000)).unwrap();
        let bus = e.bus_mut();
        bus.io_write(0x7F, 0xFD);
        bus.io_write(0x53, 1);
        bus.write_byte(addr, byte);
        prop_assert_eq!(bus.read_byte(addr), byte);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    /// Saving, restoring into a fresh machine and running a frame lands
    /// in exactly the state of the original machine running that frame.
    #[test]
    fn save_load_frame_commutes(seed: u32, warmup in 0usize..3) {
        let build = |s| {
            let mut e = Emulator::new(ChaosCore::new(s), Config::default()).unwrap();
            e.load_bios(&test_bios()).unwrap();
            e.load_rom(&flat_rom(0x8000)).unwrap();
            e
        };

        let mut original = build(seed);
        for _ in 0..warmup {
            original.frame_exec();
        }
        let img = original.state_save();

        let mut restored = build(seed ^ 0x5555_AAAA);
        restored.state_load(&img).unwrap();
        prop_assert_eq!(restored.state_save(), img);

        original.frame_exec();
        restored.frame_exec();
        prop_assert_eq!(original.state_save(), restored.state_save());
    }
}
