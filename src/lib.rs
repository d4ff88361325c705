//! Interpreter core for a 16-bit fixed-point DSP with a 40-bit accumulator
//! ALU, dual multipliers, modulo/bit-reversed addressing, hardware loops and
//! a small vectored interrupt front-end.
//!
//! The core owns the architectural register file and executes one
//! instruction per [`Dsp::run`] cycle against a word-addressed program/data
//! bus pair. Peripherals, the interrupt controller and any host glue live
//! behind the [`Bus`] trait and the [`IrqPins`] block.

mod addr;
mod alu;
mod exec;

pub mod ins;
pub mod regs;

#[cfg(test)]
pub(crate) mod test_bus;

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU32, Ordering},
};

use easyerr::Error;

use crate::ins::{Ins, Opcode, OpcodeTable};
use crate::regs::Registers;

/// Word-addressed program and data memory interface.
///
/// Data reads may have side effects (memory-mapped FIFOs); the core never
/// reads speculatively.
pub trait Bus {
    /// Read a data word. The data space is 16-bit addressed.
    fn data_read(&mut self, address: u16) -> u16;

    /// Write a data word.
    fn data_write(&mut self, address: u16, value: u16);

    /// Read a program word. The program space is 18-bit addressed.
    fn program_read(&mut self, address: u32) -> u16;

    /// Write a program word.
    fn program_write(&mut self, address: u32, value: u16);
}

/// Fatal simulator faults. None of these are recoverable in-core; the host
/// may log the opcode pattern and halt.
#[derive(Debug, Error)]
pub enum Fault {
    #[error("undefined opcode {opcode:04X} at pc {pc:05X}")]
    Undefined { opcode: u16, pc: u32 },
    #[error("unimplemented opcode {opcode:04X} at pc {pc:05X}")]
    Unimplemented { opcode: u16, pc: u32 },
    #[error("program counter {pc:05X} out of range")]
    PcOutOfRange { pc: u32 },
    #[error("block repeat stack overflow")]
    LoopStackOverflow,
    #[error("{reason}")]
    LoopState { reason: &'static str },
}

/// Edge-triggered interrupt request pins.
///
/// Other threads hold a clone of the [`Arc`] and raise lines; the core
/// latches them into the architectural pending bits between instructions.
#[derive(Debug, Default)]
pub struct IrqPins {
    lines: [AtomicBool; 3],
    vectored: AtomicBool,
    vector: AtomicU32,
}

impl IrqPins {
    /// Raises one of the three fixed-vector interrupt lines.
    pub fn signal(&self, line: usize) {
        self.lines[line].store(true, Ordering::Release);
    }

    /// Raises the vectored interrupt line with a branch target.
    pub fn signal_vectored(&self, address: u32) {
        self.vector.store(address, Ordering::Release);
        self.vectored.store(true, Ordering::Release);
    }
}

/// The DSP core: architectural state plus a bus.
pub struct Dsp<B> {
    pub regs: Registers,
    pub bus: B,
    table: Arc<OpcodeTable>,
    pins: Arc<IrqPins>,
    op_word: u16,
    op_pc: u32,
}

impl<B: Bus> Dsp<B> {
    pub fn new(bus: B) -> Self {
        Self::with_table(bus, Arc::new(OpcodeTable::new()))
    }

    /// Builds a core around a shared decode table.
    pub fn with_table(bus: B, table: Arc<OpcodeTable>) -> Self {
        Self {
            regs: Registers::default(),
            bus,
            table,
            pins: Arc::new(IrqPins::default()),
            op_word: 0,
            op_pc: 0,
        }
    }

    /// The interrupt pin block, shareable with other threads.
    pub fn pins(&self) -> Arc<IrqPins> {
        self.pins.clone()
    }

    /// Marks interrupt line `i` pending.
    pub fn signal_interrupt(&mut self, line: usize) {
        self.regs.ip[line] = true;
    }

    /// Marks the vectored interrupt pending with a branch target.
    pub fn signal_vectored_interrupt(&mut self, address: u32) {
        self.regs.viaddr = address;
        self.regs.vip = true;
    }

    pub(crate) fn undefined(&self) -> Fault {
        Fault::Undefined {
            opcode: self.op_word,
            pc: self.op_pc,
        }
    }

    pub(crate) fn unimplemented(&self) -> Fault {
        tracing::warn!(
            opcode = self.op_word,
            pc = self.op_pc,
            "unimplemented opcode"
        );
        Fault::Unimplemented {
            opcode: self.op_word,
            pc: self.op_pc,
        }
    }

    /// Loads `pc` from a computed address, faulting when it leaves the
    /// 18-bit program space.
    pub(crate) fn set_pc_checked(&mut self, pc: u32) -> Result<(), Fault> {
        if pc >= 0x40000 {
            return Err(Fault::PcOutOfRange { pc });
        }
        self.regs.pc = pc;
        Ok(())
    }

    /// Pushes the split program counter, high/low order per `pc_endian`.
    pub(crate) fn push_pc(&mut self) {
        let l = self.regs.pc_l();
        let h = self.regs.pc_h();
        if self.regs.pc_endian == 1 {
            self.regs.sp = self.regs.sp.wrapping_sub(1);
            self.bus.data_write(self.regs.sp, h);
            self.regs.sp = self.regs.sp.wrapping_sub(1);
            self.bus.data_write(self.regs.sp, l);
        } else {
            self.regs.sp = self.regs.sp.wrapping_sub(1);
            self.bus.data_write(self.regs.sp, l);
            self.regs.sp = self.regs.sp.wrapping_sub(1);
            self.bus.data_write(self.regs.sp, h);
        }
    }

    pub(crate) fn pop_pc(&mut self) {
        let (l, h);
        if self.regs.pc_endian == 1 {
            l = self.bus.data_read(self.regs.sp);
            self.regs.sp = self.regs.sp.wrapping_add(1);
            h = self.bus.data_read(self.regs.sp);
            self.regs.sp = self.regs.sp.wrapping_add(1);
        } else {
            h = self.bus.data_read(self.regs.sp);
            self.regs.sp = self.regs.sp.wrapping_add(1);
            l = self.bus.data_read(self.regs.sp);
            self.regs.sp = self.regs.sp.wrapping_add(1);
        }
        self.regs.set_pc(l, h);
    }

    /// Interrupt-entry context switch: flags and mode bits to the shadow
    /// bank, step/modulo registers swapped, `a1`/`b1` exchanged.
    pub(crate) fn context_store(&mut self) {
        self.regs.shadow_store();
        self.regs.shadow_swap();
        let a = self.regs.a[1];
        let b = self.regs.b[1];
        self.regs.b[1] = a;
        // flags are set by the b1 -> a1 transfer
        self.set_acc_no_sat(ins::Acc::A1, b);
    }

    pub(crate) fn context_restore(&mut self) {
        self.regs.shadow_restore();
        self.regs.shadow_swap();
        let a = self.regs.a[1];
        self.regs.a[1] = self.regs.b[1];
        self.regs.b[1] = a;
    }

    fn latch_pins(&mut self) {
        for line in 0..3 {
            if self.pins.lines[line].swap(false, Ordering::Acquire) {
                self.regs.ip[line] = true;
            }
        }
        if self.pins.vectored.swap(false, Ordering::Acquire) {
            self.regs.viaddr = self.pins.vector.load(Ordering::Acquire);
            self.regs.vip = true;
        }
    }

    fn check_interrupts(&mut self) {
        if !self.regs.ie || self.regs.rep {
            return;
        }
        for line in 0..3 {
            if self.regs.im[line] && self.regs.ip[line] {
                tracing::debug!(line, pc = self.regs.pc, "interrupt taken");
                self.regs.ip[line] = false;
                self.regs.ie = false;
                self.push_pc();
                self.regs.pc = 0x0006 + line as u32 * 8;
                if self.regs.ic[line] {
                    self.context_store();
                }
                return;
            }
        }
        if self.regs.vim && self.regs.vip {
            tracing::debug!(target = self.regs.viaddr, "vectored interrupt taken");
            self.regs.vip = false;
            self.regs.ie = false;
            self.push_pc();
            self.regs.pc = self.regs.viaddr;
            if self.regs.vic {
                self.context_store();
            }
        }
    }

    /// Executes one instruction, including the repeat and interrupt
    /// bookkeeping around it.
    pub fn step(&mut self) -> Result<(), Fault> {
        self.op_pc = self.regs.pc;
        let word = self.bus.program_read(self.regs.pc);
        self.regs.pc += 1;
        self.op_word = word;

        let opcode = self.table.lookup(word);
        let ins = if opcode.needs_expansion() {
            let expansion = self.bus.program_read(self.regs.pc);
            self.regs.pc += 1;
            Ins::with_expansion(word, expansion)
        } else {
            Ins::new(word)
        };

        if self.regs.rep {
            if self.regs.repc == 0 {
                self.regs.rep = false;
            } else {
                self.regs.repc -= 1;
                self.regs.pc -= 1;
            }
        }

        if self.regs.lp {
            let frame = self.regs.bkrep_stack[self.regs.bcn as usize - 1];
            if frame.end + 1 == self.regs.pc {
                if frame.lc == 0 {
                    self.regs.bcn -= 1;
                    self.regs.lp = self.regs.bcn != 0;
                } else {
                    self.regs.bkrep_stack[self.regs.bcn as usize - 1].lc -= 1;
                    self.regs.pc = frame.start;
                }
            }
        }

        if opcode == Opcode::Undefined {
            return Err(self.undefined());
        }
        self.dispatch(opcode, ins)?;

        self.latch_pins();
        self.check_interrupts();
        Ok(())
    }

    /// Runs exactly `cycles` instructions; repeat re-executions each count
    /// as one cycle.
    pub fn run(&mut self, cycles: u32) -> Result<(), Fault> {
        for _ in 0..cycles {
            self.step()?;
        }
        Ok(())
    }
}
