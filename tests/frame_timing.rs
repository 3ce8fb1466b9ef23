//! Frame scheduler behavior: line budgets, cycle residue, PSG wait
//! states, NMI cadence and audio delivery.

mod common;

use common::{Op, ScriptCore};
use cvemu::{Config, Emulator};

const NTSC_FRAME_CYCLES: u64 = 228 * 262;

fn emu(core: ScriptCore) -> Emulator<ScriptCore> {
    Emulator::new(core, Config::default()).unwrap()
}

#[test]
fn line_budget_is_228_cycles() {
    let mut e = emu(ScriptCore::new(228, vec![]));
    e.frame_exec();
    assert_eq!(e.core().steps, 262);
}

#[test]
fn cycle_residue_carries_across_lines_and_frames() {
    let mut e = emu(ScriptCore::new(100, vec![]));
    for n in 1..=10u64 {
        e.frame_exec();
        // Overshoot is credited forward, so the step count never drifts
        // from the exact running total.
        let expected = (NTSC_FRAME_CYCLES * n).div_ceil(100);
        assert_eq!(e.core().steps, expected, "frame {n}");
    }
}

#[test]
fn pal_frames_run_313_lines() {
    let cfg = Config {
        region: cvemu::Region::Pal,
        ..Config::default()
    };
    let mut e = Emulator::new(ScriptCore::new(228, vec![]), cfg).unwrap();
    e.frame_exec();
    assert_eq!(e.core().steps, 313);
}

#[test]
fn vblank_nmi_fires_once_per_frame_until_acknowledged() {
    // Enable GINT through the control port, then idle.
    let ops = vec![Op::Out(0xBF, 0x20), Op::Out(0xBF, 0x81)];
    let mut e = emu(ScriptCore::new(114, ops));

    e.frame_exec();
    assert_eq!(e.core().nmi_count, 1);

    // The frame interrupt is never acknowledged, so the guard holds the
    // next one back.
    e.frame_exec();
    assert_eq!(e.core().nmi_count, 1);

    // A status read at the top of the next frame re-arms it.
    e.core_mut().push_ops(&[Op::In(0xBF)]);
    e.frame_exec();
    assert_eq!(e.core().nmi_count, 2);
}

#[test]
fn psg_writes_charge_wait_states() {
    let mut e = emu(ScriptCore::new(228, vec![]));
    e.frame_exec();
    let plain_steps = e.core().steps;

    // Volume-ramp PCM: every instruction is a PSG write, each costing
    // 228 + 48 cycles of bus time.
    let mut e = emu(ScriptCore::new(228, vec![Op::Out(0xFF, 0x9F); 300]));
    e.frame_exec();
    let pcm_steps = e.core().steps;
    assert!(pcm_steps < plain_steps, "{pcm_steps} vs {plain_steps}");
    assert_eq!(pcm_steps, NTSC_FRAME_CYCLES.div_ceil(228 + 48));
}

#[test]
fn audio_arrives_once_per_frame_at_host_rate() {
    use std::{cell::RefCell, rc::Rc};

    let deliveries = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&deliveries);

    let mut e = emu(ScriptCore::new(228, vec![]));
    e.set_audio_callback(Box::new(move |buf| sink.borrow_mut().push(buf.len())));

    let mut counts = Vec::new();
    for _ in 0..10 {
        counts.push(e.frame_exec());
    }
    assert_eq!(*deliveries.borrow(), counts);

    // 59736 cycles/frame at 48 kHz comes to just over 800 samples.
    let total: usize = counts.iter().sum();
    let expected = NTSC_FRAME_CYCLES as i64 * 10 * 48_000 / 3_579_545;
    assert!((total as i64 - expected).abs() <= 2, "total={total}");
}
