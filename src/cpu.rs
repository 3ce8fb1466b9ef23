//! CPU host adapter.
//!
//! The Z80 instruction interpreter is an external collaborator; anything
//! implementing [`Z80Core`] plugs in. The adapter owns the interpreter
//! and the bus, folds I/O wait-state charges into each instruction's
//! cycle count, and forwards interrupt requests the VDP latched while the
//! instruction ran.

use crate::{
    bus::Bus,
    serial::{Reader, Writer},
};

/// Interface the core consumes a Z80 interpreter through.
///
/// `step` executes exactly one instruction against the bus and reports
/// its T-cycle cost. `pulse_nmi`/`pulse_irq` latch edge-triggered
/// interrupt requests which the interpreter services at its next
/// instruction boundary, honoring the usual IFF/EI rules.
pub trait Z80Core {
    fn step(&mut self, bus: &mut Bus) -> u32;
    fn pulse_nmi(&mut self);
    fn pulse_irq(&mut self, data: u8);
    fn reset(&mut self);
    fn state(&self) -> Z80State;
    fn load_state(&mut self, state: &Z80State);
}

/// Full Z80 register file plus interrupt latches, as carried by save
/// states.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Z80State {
    pub af: u16,
    pub bc: u16,
    pub de: u16,
    pub hl: u16,
    // Alternate (shadow) register set.
    pub af2: u16,
    pub bc2: u16,
    pub de2: u16,
    pub hl2: u16,
    pub pc: u16,
    pub sp: u16,
    pub ix: u16,
    pub iy: u16,
    /// Internal address latch, observable through flag bits 3/5 of BIT.
    pub memptr: u16,
    pub i: u8,
    pub r: u8,
    pub iff1: bool,
    pub iff2: bool,
    pub im: u8,
    pub halted: bool,
    pub nmi_pending: bool,
    pub irq_pending: bool,
    /// Data bus byte supplied with a pending IRQ (IM 2 vector low byte).
    pub irq_data: u8,
    /// EI enables interrupts one instruction late; nonzero while pending.
    pub ei_delay: u8,
}

impl Z80State {
    pub(crate) const STATE_LEN: usize = 13 * 2 + 2 + 2 + 1 + 1 + 1 + 1 + 1 + 1;

    pub(crate) fn state_save(&self, w: &mut Writer) {
        for v in [
            self.af, self.bc, self.de, self.hl, //
            self.af2, self.bc2, self.de2, self.hl2, //
            self.pc, self.sp, self.ix, self.iy, self.memptr,
        ] {
            w.push_u16(v);
        }
        w.push_u8(self.i);
        w.push_u8(self.r);
        w.push_u8(self.iff1 as u8);
        w.push_u8(self.iff2 as u8);
        w.push_u8(self.im);
        w.push_u8(self.halted as u8);
        w.push_u8(self.nmi_pending as u8);
        w.push_u8(self.irq_pending as u8);
        w.push_u8(self.irq_data);
        w.push_u8(self.ei_delay);
    }

    pub(crate) fn state_load(r: &mut Reader) -> Self {
        let mut regs = [0u16; 13];
        for v in regs.iter_mut() {
            *v = r.pop_u16();
        }
        let [af, bc, de, hl, af2, bc2, de2, hl2, pc, sp, ix, iy, memptr] = regs;
        Self {
            af,
            bc,
            de,
            hl,
            af2,
            bc2,
            de2,
            hl2,
            pc,
            sp,
            ix,
            iy,
            memptr,
            i: r.pop_u8(),
            r: r.pop_u8(),
            iff1: r.pop_u8() != 0,
            iff2: r.pop_u8() != 0,
            im: r.pop_u8(),
            halted: r.pop_u8() != 0,
            nmi_pending: r.pop_u8() != 0,
            irq_pending: r.pop_u8() != 0,
            irq_data: r.pop_u8(),
            ei_delay: r.pop_u8(),
        }
    }
}

pub(crate) struct Cpu<Z: Z80Core> {
    pub(crate) core: Z,
    pub(crate) bus: Bus,
}

impl<Z: Z80Core> Cpu<Z> {
    pub(crate) fn new(core: Z, bus: Bus) -> Self {
        Self { core, bus }
    }

    /// Execute one instruction. The returned cycle count includes any
    /// wait states the I/O fabric charged during the instruction.
    pub(crate) fn step(&mut self) -> u32 {
        let cycles = self.core.step(&mut self.bus) + self.bus.take_delay();
        if self.bus.vdp.take_nmi() {
            self.core.pulse_nmi();
        }
        cycles
    }

    /// Forward an interrupt the VDP raised outside of an instruction
    /// (the scheduler's own per-line VDP call).
    pub(crate) fn poll_vdp_nmi(&mut self) {
        if self.bus.vdp.take_nmi() {
            self.core.pulse_nmi();
        }
    }

    pub(crate) fn reset(&mut self) {
        self.core.reset();
    }
}
