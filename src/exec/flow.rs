//! Branches, calls, repeats, block repeats and bank switches.

use bitos::BitUtils;

use crate::{
    Bus, Dsp, Fault,
    addr::bit_reverse,
    alu::sext,
    ins::{Acc, Cond, Ins, RegName, StepValue, step_zids},
};

/// Which register walks memory during a block-repeat save or restore.
pub(crate) enum LoopPointer {
    Rn(usize),
    Sp,
}

impl<B: Bus> Dsp<B> {
    fn loop_pointer(&self, ptr: &LoopPointer) -> u16 {
        match ptr {
            LoopPointer::Rn(unit) => self.regs.r[*unit],
            LoopPointer::Sp => self.regs.sp,
        }
    }

    fn set_loop_pointer(&mut self, ptr: &LoopPointer, value: u16) {
        match ptr {
            LoopPointer::Rn(unit) => self.regs.r[*unit] = value,
            LoopPointer::Sp => self.regs.sp = value,
        }
    }

    pub(crate) fn br(&mut self, ins: Ins) -> Result<(), Fault> {
        if self.regs.condition_pass(Cond::new(ins.base.bits(0, 4))) {
            self.regs.set_pc(ins.expansion, ins.base.bits(4, 6));
        }
        Ok(())
    }

    pub(crate) fn brr(&mut self, ins: Ins) -> Result<(), Fault> {
        if self.regs.condition_pass(Cond::new(ins.base.bits(7, 11))) {
            // pc is already the address of the next instruction
            let offset = sext(ins.base.bits(0, 7) as u64, 7) as u32;
            self.regs.pc = self.regs.pc.wrapping_add(offset) & 0x3FFFF;
        }
        Ok(())
    }

    pub(crate) fn call(&mut self, ins: Ins) -> Result<(), Fault> {
        if self.regs.condition_pass(Cond::new(ins.base.bits(0, 4))) {
            self.push_pc();
            self.regs.set_pc(ins.expansion, ins.base.bits(4, 6));
        }
        Ok(())
    }

    pub(crate) fn callr(&mut self, ins: Ins) -> Result<(), Fault> {
        if self.regs.condition_pass(Cond::new(ins.base.bits(7, 11))) {
            self.push_pc();
            let offset = sext(ins.base.bits(0, 7) as u64, 7) as u32;
            self.regs.pc = self.regs.pc.wrapping_add(offset) & 0x3FFFF;
        }
        Ok(())
    }

    pub(crate) fn calla_axl(&mut self, acc: Acc) -> Result<(), Fault> {
        self.push_pc();
        // raw low half, no saturation on this path
        let target = (self.get_acc(acc) & 0xFFFF) as u32;
        self.set_pc_checked(target)
    }

    pub(crate) fn calla_ax(&mut self, acc: Acc) -> Result<(), Fault> {
        self.push_pc();
        // 18-bit target straight off the accumulator, no saturation
        let target = (self.get_acc(acc) & 0x3FFFF) as u32;
        self.set_pc_checked(target)
    }

    pub(crate) fn break_(&mut self) -> Result<(), Fault> {
        if !self.regs.lp {
            return Err(Fault::LoopState {
                reason: "break outside of a block repeat",
            });
        }
        self.regs.bcn -= 1;
        self.regs.lp = self.regs.bcn != 0;
        // note: execution stays inside the block; only the loop is dropped
        Ok(())
    }

    pub(crate) fn repeat(&mut self, count: u16) {
        self.regs.repc = count;
        self.regs.rep = true;
    }

    fn block_repeat(&mut self, lc: u16, address: u32) -> Result<(), Fault> {
        if self.regs.bcn > 3 {
            return Err(Fault::LoopStackOverflow);
        }
        let frame = &mut self.regs.bkrep_stack[self.regs.bcn as usize];
        frame.start = self.regs.pc;
        frame.end = address;
        frame.lc = lc;
        self.regs.lp = true;
        self.regs.bcn += 1;
        Ok(())
    }

    pub(crate) fn bkrep_imm8(&mut self, ins: Ins) -> Result<(), Fault> {
        let lc = ins.base.bits(0, 8);
        let address = ins.expansion as u32 | (self.regs.pc & 0x30000);
        self.block_repeat(lc, address)
    }

    pub(crate) fn bkrep_reg(&mut self, ins: Ins) -> Result<(), Fault> {
        let lc = self.reg_to_bus16(RegName::new(ins.base.bits(2, 7)), false)?;
        let address = ins.expansion as u32 | (ins.base.bits(0, 2) as u32) << 16;
        self.block_repeat(lc, address)
    }

    pub(crate) fn bkrep_r6(&mut self, ins: Ins) -> Result<(), Fault> {
        let lc = self.regs.r[6];
        let address = ins.expansion as u32 | (ins.base.bits(0, 2) as u32) << 16;
        self.block_repeat(lc, address)
    }

    fn restore_block_repeat(&mut self, ptr: LoopPointer) -> Result<(), Fault> {
        if self.regs.lp {
            if self.regs.bcn > 3 {
                return Err(Fault::LoopStackOverflow);
            }
            // slide the live frames up to make room at the bottom
            for i in (0..self.regs.bcn as usize).rev() {
                self.regs.bkrep_stack[i + 1] = self.regs.bkrep_stack[i];
            }
            self.regs.bcn += 1;
        }
        let mut address = self.loop_pointer(&ptr);
        address = address.wrapping_add(1);
        let flag = self.bus.data_read(address);
        let valid = flag >> 15 != 0;
        if self.regs.lp {
            if !valid {
                return Err(Fault::LoopState {
                    reason: "restoring an invalid loop below a valid one",
                });
            }
        } else if valid {
            self.regs.lp = true;
            self.regs.bcn = 1;
        }
        address = address.wrapping_add(1);
        let end_low = self.bus.data_read(address);
        self.regs.bkrep_stack[0].end = end_low as u32 | ((flag as u32 >> 8) & 3) << 16;
        address = address.wrapping_add(1);
        let start_low = self.bus.data_read(address);
        self.regs.bkrep_stack[0].start = start_low as u32 | ((flag as u32) & 3) << 16;
        address = address.wrapping_add(1);
        self.regs.bkrep_stack[0].lc = self.bus.data_read(address);
        self.set_loop_pointer(&ptr, address);
        Ok(())
    }

    fn store_block_repeat(&mut self, ptr: LoopPointer) -> Result<(), Fault> {
        let mut address = self.loop_pointer(&ptr);
        let frame = self.regs.bkrep_stack[0];
        self.bus.data_write(address, frame.lc);
        address = address.wrapping_sub(1);
        self.bus.data_write(address, frame.start as u16);
        address = address.wrapping_sub(1);
        self.bus.data_write(address, frame.end as u16);
        address = address.wrapping_sub(1);
        // the flag word packs the start high bits into both fields
        let mut flag = (self.regs.lp as u16) << 15;
        flag |= (frame.start >> 16) as u16;
        flag |= ((frame.start >> 16) as u16) << 8;
        self.bus.data_write(address, flag);
        address = address.wrapping_sub(1);
        self.set_loop_pointer(&ptr, address);
        if self.regs.lp {
            for i in 1..self.regs.bcn as usize {
                self.regs.bkrep_stack[i - 1] = self.regs.bkrep_stack[i];
            }
            self.regs.bcn -= 1;
            if self.regs.bcn == 0 {
                self.regs.lp = false;
            }
        }
        Ok(())
    }

    pub(crate) fn bkrep_rst_ar(&mut self, ins: Ins) -> Result<(), Fault> {
        let unit = self.ar_rn_unit(ins.base.bits(0, 2));
        self.restore_block_repeat(LoopPointer::Rn(unit))
    }

    pub(crate) fn bkrep_rst_memsp(&mut self) -> Result<(), Fault> {
        self.restore_block_repeat(LoopPointer::Sp)
    }

    pub(crate) fn bkrep_sto_ar(&mut self, ins: Ins) -> Result<(), Fault> {
        let unit = self.ar_rn_unit(ins.base.bits(0, 2));
        self.store_block_repeat(LoopPointer::Rn(unit))
    }

    pub(crate) fn bkrep_sto_memsp(&mut self) -> Result<(), Fault> {
        self.store_block_repeat(LoopPointer::Sp)
    }

    // ----- bank and addressing-mode switches -----

    pub(crate) fn banke(&mut self, ins: Ins) -> Result<(), Fault> {
        let flags = ins.base.bits(0, 6);
        if flags.bit(0) {
            std::mem::swap(&mut self.regs.stepi, &mut self.regs.stepib);
            std::mem::swap(&mut self.regs.modi, &mut self.regs.modib);
            if self.regs.bankstep {
                std::mem::swap(&mut self.regs.stepi0, &mut self.regs.stepi0b);
            }
        }
        if flags.bit(1) {
            std::mem::swap(&mut self.regs.r[4], &mut self.regs.r4b);
        }
        if flags.bit(2) {
            std::mem::swap(&mut self.regs.r[1], &mut self.regs.r1b);
        }
        if flags.bit(3) {
            std::mem::swap(&mut self.regs.r[0], &mut self.regs.r0b);
        }
        if flags.bit(4) {
            std::mem::swap(&mut self.regs.r[7], &mut self.regs.r7b);
        }
        if flags.bit(5) {
            std::mem::swap(&mut self.regs.stepj, &mut self.regs.stepjb);
            std::mem::swap(&mut self.regs.modj, &mut self.regs.modjb);
            if self.regs.bankstep {
                std::mem::swap(&mut self.regs.stepj0, &mut self.regs.stepj0b);
            }
        }
        Ok(())
    }

    pub(crate) fn bitrev(&mut self, ins: Ins, set_brv: Option<bool>) -> Result<(), Fault> {
        let unit = ins.base.bits(0, 3) as usize;
        self.regs.r[unit] = bit_reverse(self.regs.r[unit]);
        if let Some(brv) = set_brv {
            self.regs.brv[unit] = brv;
        }
        Ok(())
    }

    pub(crate) fn modr(&mut self, ins: Ins) -> Result<(), Fault> {
        let unit = ins.base.bits(2, 5) as usize;
        let step = step_zids(ins.base.bits(0, 2));
        let dmod = ins.base.bit(5);
        self.rn_and_modify(unit, step, dmod);
        self.regs.flags.r = self.regs.r[unit] == 0;
        Ok(())
    }

    pub(crate) fn modr_i2d2(&mut self, ins: Ins) -> Result<(), Fault> {
        let unit = ins.base.bits(0, 3) as usize;
        let step = if ins.base.bit(3) {
            StepValue::Decrease2Mode1
        } else {
            StepValue::Increase2Mode1
        };
        let dmod = ins.base.bit(4);
        self.rn_and_modify(unit, step, dmod);
        self.regs.flags.r = self.regs.r[unit] == 0;
        Ok(())
    }

    pub(crate) fn modr_arp(&mut self, ins: Ins, dmodi: bool, dmodj: bool) -> Result<(), Fault> {
        let (ui, uj) = self.arp_rn_units(ins.base.bits(0, 2));
        let (si, sj) = self.arp_steps(ins.base.bits(2, 4), ins.base.bits(4, 6));
        self.rn_and_modify(ui, si, dmodi);
        self.rn_and_modify(uj, sj, dmodj);
        Ok(())
    }
}
