//! Stack, program-space and double-word move instructions.

use bitos::BitUtils;

use crate::{
    Bus, Dsp, Fault,
    alu::{sext, sext32},
    ins::{Acc, Ins, RegName},
};

impl<B: Bus> Dsp<B> {
    pub(crate) fn push_word(&mut self, value: u16) -> Result<(), Fault> {
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.bus.data_write(self.regs.sp, value);
        Ok(())
    }

    pub(crate) fn pop_word(&mut self) -> u16 {
        let value = self.bus.data_read(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        value
    }

    /// Pushes the saturated 32-bit body of an accumulator, low word first.
    pub(crate) fn pusha(&mut self, acc: Acc) -> Result<(), Fault> {
        let value = self.get_acc(acc);
        let value = self.saturate_acc(value, false) & 0xFFFF_FFFF;
        self.push_word(value as u16)?;
        self.push_word((value >> 16) as u16)
    }

    pub(crate) fn popa(&mut self, acc: Acc) -> Result<(), Fault> {
        let h = self.pop_word();
        let l = self.pop_word();
        let value = sext32(((h as u64) << 16) | l as u64);
        self.set_acc(acc, value);
        Ok(())
    }

    pub(crate) fn push_abe(&mut self, acc: Acc) -> Result<(), Fault> {
        let value = self.get_acc(acc);
        let value = ((self.saturate_acc(value, false) >> 32) & 0xFFFF) as u16;
        self.push_word(value)
    }

    pub(crate) fn pop_abe(&mut self, acc: Acc) -> Result<(), Fault> {
        let value = sext(self.pop_word() as u64 & 0xFF, 8);
        let body = self.get_acc(acc) & 0xFFFF_FFFF;
        self.set_acc(acc, body | (value << 32));
        Ok(())
    }

    pub(crate) fn push_px(&mut self, unit: usize) -> Result<(), Fault> {
        let value = self.product_to_bus40(unit) as u32;
        self.push_word(value as u16)?;
        self.push_word((value >> 16) as u16)
    }

    pub(crate) fn pop_px(&mut self, unit: usize) -> Result<(), Fault> {
        let h = self.pop_word();
        let l = self.pop_word();
        self.product_from_bus32(unit, ((h as u32) << 16) | l as u32);
        Ok(())
    }

    // ----- program-space moves -----

    pub(crate) fn movp_axl_reg(&mut self, ins: Ins) -> Result<(), Fault> {
        let address = (self.get_acc(Acc::ax(ins.base.bits(5, 6))) & 0xFFFF) as u32
            | (self.regs.movpd as u32) << 16;
        let value = self.bus.program_read(address);
        self.reg_from_bus16(RegName::new(ins.base.bits(0, 5)), value)
    }

    pub(crate) fn movp_ax_reg(&mut self, ins: Ins) -> Result<(), Fault> {
        // 18-bit address straight off the accumulator, no saturation
        let address = (self.get_acc(Acc::ax(ins.base.bits(5, 6))) & 0x3FFFF) as u32;
        let value = self.bus.program_read(address);
        self.reg_from_bus16(RegName::new(ins.base.bits(0, 5)), value)
    }

    pub(crate) fn movp_rn(&mut self, ins: Ins) -> Result<(), Fault> {
        let unit = ins.base.bits(2, 5) as usize;
        let step = crate::ins::step_zids(ins.base.bits(0, 2));
        let src = self.rn_address_and_modify(unit, step, false) as u32
            | (self.regs.movpd as u32) << 16;
        let dst_unit = ins.base.bits(7, 9) as usize;
        let dst_step = crate::ins::step_zids(ins.base.bits(5, 7));
        let dst = self.rn_address_and_modify(dst_unit, dst_step, false);
        let value = self.bus.program_read(src);
        self.bus.data_write(dst, value);
        Ok(())
    }

    pub(crate) fn movd(&mut self, ins: Ins) -> Result<(), Fault> {
        let src_unit = ins.base.bits(2, 4) as usize;
        let src_step = crate::ins::step_zids(ins.base.bits(0, 2));
        let dst_unit = ins.base.bits(6, 7) as usize + 4;
        let dst_step = crate::ins::step_zids(ins.base.bits(4, 6));
        let src = self.rn_address_and_modify(src_unit, src_step, false);
        let dst = self.rn_address_and_modify(dst_unit, dst_step, false) as u32
            | (self.regs.movpd as u32) << 16;
        let value = self.bus.data_read(src);
        self.bus.program_write(dst, value);
        Ok(())
    }

    pub(crate) fn movpdw(&mut self, acc: Acc) -> Result<(), Fault> {
        let address = (self.get_acc(acc) & 0x3FFFF) as u32;
        // word order here is fixed, unaffected by the stack endian mode
        let h = self.bus.program_read(address);
        let l = self.bus.program_read(address + 1);
        self.regs.set_pc(l, h);
        if self.regs.pc >= 0x40000 {
            return Err(Fault::PcOutOfRange { pc: self.regs.pc });
        }
        Ok(())
    }

    // ----- double-word data moves -----

    pub(crate) fn mov2_px_to_mem(&mut self, ins: Ins, shifted: bool) -> Result<(), Fault> {
        let unit_index = ins.base.bits(0, 1) as usize;
        let value = if shifted {
            (self.product_to_bus40(unit_index) & 0xFFFF_FFFF) as u32
        } else {
            self.product_no_shift(unit_index)
        };
        let l = value as u16;
        let h = (value >> 16) as u16;
        let unit = self.ar_rn_unit(ins.base.bits(3, 5));
        let step = self.ar_step(ins.base.bits(1, 3));
        let offset = self.ar_offset(ins.base.bits(1, 3));
        let address = self.rn_address_and_modify(unit, step, false);
        let address2 = self.offset_address(unit, address, offset, false);
        // the second write wins when the offset collapses the pair
        self.bus.data_write(address2, l);
        self.bus.data_write(address, h);
        Ok(())
    }

    pub(crate) fn mov2_mem_to_px(&mut self, ins: Ins) -> Result<(), Fault> {
        let unit = self.ar_rn_unit(ins.base.bits(3, 5));
        let step = self.ar_step(ins.base.bits(1, 3));
        let offset = self.ar_offset(ins.base.bits(1, 3));
        let address = self.rn_address_and_modify(unit, step, false);
        let address2 = self.offset_address(unit, address, offset, false);
        let l = self.bus.data_read(address2);
        let h = self.bus.data_read(address);
        let value = ((h as u32) << 16) | l as u32;
        self.product_from_bus32(ins.base.bits(0, 1) as usize, value);
        Ok(())
    }

    pub(crate) fn mova_to_mem(&mut self, ins: Ins) -> Result<(), Fault> {
        let acc = self.get_acc(Acc::ab(ins.base.bits(0, 2)));
        let value = self.saturate_acc(acc, false);
        let l = value as u16;
        let h = (value >> 16) as u16;
        let unit = self.ar_rn_unit(ins.base.bits(4, 6));
        let step = self.ar_step(ins.base.bits(2, 4));
        let offset = self.ar_offset(ins.base.bits(2, 4));
        let address = self.rn_address_and_modify(unit, step, false);
        let address2 = self.offset_address(unit, address, offset, false);
        // the second write wins when the offset collapses the pair
        self.bus.data_write(address2, l);
        self.bus.data_write(address, h);
        Ok(())
    }

    pub(crate) fn mova_from_mem(&mut self, ins: Ins) -> Result<(), Fault> {
        let unit = self.ar_rn_unit(ins.base.bits(4, 6));
        let step = self.ar_step(ins.base.bits(2, 4));
        let offset = self.ar_offset(ins.base.bits(2, 4));
        let address = self.rn_address_and_modify(unit, step, false);
        let address2 = self.offset_address(unit, address, offset, false);
        let l = self.bus.data_read(address2);
        let h = self.bus.data_read(address);
        let value = sext32(((h as u64) << 16) | l as u64);
        self.set_acc(Acc::ab(ins.base.bits(0, 2)), value);
        Ok(())
    }

    /// Rounded load through an ArRn descriptor into an accumulator high.
    pub(crate) fn movr_ar(&mut self, ins: Ins) -> Result<(), Fault> {
        let unit = self.ar_rn_unit(ins.base.bits(4, 6));
        let step = self.ar_step(ins.base.bits(2, 4));
        let address = self.rn_address_and_modify(unit, step, false);
        let value16 = self.bus.data_read(address);
        let value = sext32((value16 as u64) << 16);
        let result = self.add_sub(value, 0x8000, false);
        self.set_acc(Acc::ab(ins.base.bits(0, 2)), result);
        Ok(())
    }

    pub(crate) fn mov2_acc_to_mem(&mut self, ins: Ins, swapped: bool) -> Result<(), Fault> {
        let (ui, uj) = self.arp_rn_units(ins.base.bits(2, 3));
        let (si, sj) = self.arp_steps(ins.base.bits(3, 4), ins.base.bits(4, 5));
        let i = self.rn_address_and_modify(ui, si, false);
        let j = self.rn_address_and_modify(uj, sj, false);
        let acc = self.get_acc(Acc::ab(ins.base.bits(0, 2)));
        let value = self.saturate_acc_no_flag(acc, false);
        let (high_at, low_at) = if swapped { (j, i) } else { (i, j) };
        self.bus.data_write(high_at, (value >> 16) as u16);
        self.bus.data_write(low_at, value as u16);
        Ok(())
    }

    pub(crate) fn mov2_mem_to_acc(&mut self, ins: Ins, swapped: bool) -> Result<(), Fault> {
        let (ui, uj) = self.arp_rn_units(ins.base.bits(2, 3));
        let (si, sj) = self.arp_steps(ins.base.bits(3, 4), ins.base.bits(4, 5));
        let (h, l);
        if swapped {
            let i = self.rn_address_and_modify(ui, si, false);
            l = self.bus.data_read(i);
            let j = self.rn_address_and_modify(uj, sj, false);
            h = self.bus.data_read(j);
        } else {
            let i = self.rn_address_and_modify(ui, si, false);
            h = self.bus.data_read(i);
            let j = self.rn_address_and_modify(uj, sj, false);
            l = self.bus.data_read(j);
        }
        let value = sext32(((h as u64) << 16) | l as u64);
        self.set_acc_raw(Acc::ab(ins.base.bits(0, 2)), value);
        Ok(())
    }

    /// Stores an accumulator high next to `y0` through one descriptor.
    pub(crate) fn mov2_axh_y0(&mut self, ins: Ins) -> Result<(), Fault> {
        let acc = self.get_acc(Acc::ax(ins.base.bits(0, 1)));
        let u = ((self.saturate_acc_no_flag(acc, false) >> 16) & 0xFFFF) as u16;
        let v = self.regs.y[0];
        let unit = self.ar_rn_unit(ins.base.bits(3, 5));
        let step = self.ar_step(ins.base.bits(1, 3));
        let offset = self.ar_offset(ins.base.bits(1, 3));
        let ua = self.rn_address_and_modify(unit, step, false);
        let va = self.offset_address(unit, ua, offset, false);
        // keep the order
        self.bus.data_write(va, v);
        self.bus.data_write(ua, u);
        Ok(())
    }

    /// Stores two accumulator highs through one descriptor.
    pub(crate) fn mov2_abh(&mut self, ins: Ins) -> Result<(), Fault> {
        let x = self.get_acc(Acc::ab(ins.base.bits(2, 4)));
        let u = ((self.saturate_acc_no_flag(x, false) >> 16) & 0xFFFF) as u16;
        let y = self.get_acc(Acc::ab(ins.base.bits(4, 6)));
        let v = ((self.saturate_acc_no_flag(y, false) >> 16) & 0xFFFF) as u16;
        let unit = self.ar_rn_unit(ins.base.bits(1, 2));
        let step = self.ar_step(ins.base.bits(0, 1));
        let offset = self.ar_offset(ins.base.bits(0, 1));
        let ua = self.rn_address_and_modify(unit, step, false);
        let va = self.offset_address(unit, ua, offset, false);
        // keep the order
        self.bus.data_write(va, v);
        self.bus.data_write(ua, u);
        Ok(())
    }

    /// Lateral exchange of an accumulator high with a pair of memory cells.
    pub(crate) fn exchange(&mut self, ins: Ins, from_j: bool, round: bool) -> Result<(), Fault> {
        let (ui, uj) = self.arp_rn_units(ins.base.bits(1, 3));
        let (si, sj) = self.arp_steps(ins.base.bits(3, 5), ins.base.bits(5, 7));
        let i = self.rn_address_and_modify(ui, si, false);
        let j = self.rn_address_and_modify(uj, sj, false);
        let acc = Acc::ax(ins.base.bits(0, 1));
        let value = self.get_acc(acc);
        let value = self.saturate_acc_no_flag(value, false);
        let (store_at, load_at) = if from_j { (i, j) } else { (j, i) };
        self.bus.data_write(store_at, ((value >> 16) & 0xFFFF) as u16);
        let mut loaded = (self.bus.data_read(load_at) as u64) << 16;
        if round {
            loaded |= 0x8000;
        }
        self.set_acc_raw(acc, sext32(loaded));
        Ok(())
    }
}
