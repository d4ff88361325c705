//! Vector scan, voice-trigger, codebook-search and dual-memory ops.

use bitos::BitUtils;

use crate::{
    Bus, Dsp, Fault,
    alu::{P_ADD, P_SUB, sext, sext16},
    ins::{Acc, CbsCond, Ins, Opcode, SumBase, step_zids},
};

impl<B: Bus> Dsp<B> {
    // ----- min/max scans -----

    /// Accumulator-pair scan: conditionally latches the counterpart value
    /// and the current r0 into mixp.
    pub(crate) fn minmax_acc(&mut self, opcode: Opcode, ins: Ins) -> Result<(), Fault> {
        let acc = Acc::ax(ins.base.bits(2, 3));
        let u = self.get_acc(acc);
        let v = self.get_acc(acc.counterpart());
        let d = v.wrapping_sub(u);
        let r0 = self.rn_and_modify(0, step_zids(ins.base.bits(0, 2)), false);
        let taken = Self::minmax_taken(opcode, d);
        if taken {
            self.regs.flags.m = true;
            self.regs.mixp = r0;
            self.set_acc_raw(acc, v);
        } else {
            self.regs.flags.m = false;
        }
        Ok(())
    }

    /// Memory scan through r0.
    pub(crate) fn minmax_r0(&mut self, opcode: Opcode, ins: Ins) -> Result<(), Fault> {
        let acc = Acc::ax(ins.base.bits(2, 3));
        let u = self.get_acc(acc);
        let r0 = self.rn_and_modify(0, step_zids(ins.base.bits(0, 2)), false);
        let address = self.rn_address(0, r0);
        let v = sext16(self.bus.data_read(address) as u64);
        let d = v.wrapping_sub(u);
        let taken = Self::minmax_taken(opcode, d);
        if taken {
            self.regs.flags.m = true;
            self.regs.mixp = r0;
            self.set_acc_raw(acc, v);
        } else {
            self.regs.flags.m = false;
        }
        Ok(())
    }

    fn minmax_taken(opcode: Opcode, d: u64) -> bool {
        let negative = d >> 63 != 0;
        match opcode {
            Opcode::MaxGe | Opcode::MaxGeR0 => !negative,
            Opcode::MaxGt | Opcode::MaxGtR0 => !negative && d != 0,
            Opcode::MinLe | Opcode::MinLeR0 => negative || d == 0,
            _ => negative,
        }
    }

    // ----- voice trigger bitstreams -----

    pub(crate) fn vtrshr(&mut self) {
        self.regs.vtr[0] = (self.regs.vtr[0] >> 1) | (self.regs.flags.c[0] as u16) << 15;
        self.regs.vtr[1] = (self.regs.vtr[1] >> 1) | (self.regs.flags.c[1] as u16) << 15;
    }

    pub(crate) fn vtrmov(&mut self, acc: Acc, index: usize) -> Result<(), Fault> {
        self.set_acc(acc, self.regs.vtr[index] as u64);
        Ok(())
    }

    /// Split high/low compare of two accumulators; each half keeps the
    /// winner and shifts its pick bit into the trigger streams.
    pub(crate) fn min_max_vtr(&mut self, a: Acc, b: Acc, min: bool) -> Result<(), Fault> {
        let u = self.get_acc(a);
        let v = self.get_acc(b);
        let uh = sext(u >> 16, 24);
        let ul = sext16(u & 0xFFFF);
        let vh = sext(v >> 16, 24);
        let vl = sext16(v & 0xFFFF);
        let wh = if min { uh.wrapping_sub(vh) } else { vh.wrapping_sub(uh) };
        let wl = if min { ul.wrapping_sub(vl) } else { vl.wrapping_sub(ul) };
        self.regs.flags.c[0] = wh >> 63 == 0;
        let wh = if self.regs.flags.c[0] { vh } else { uh };
        self.regs.flags.c[1] = wl >> 63 == 0;
        let wl = if self.regs.flags.c[1] { vl } else { ul };
        let w = (wh << 16) | (wl & 0xFFFF);
        self.set_acc_raw(a, w);
        self.vtrshr();
        Ok(())
    }

    pub(crate) fn min_max_vtr_mov(&mut self, opcode: Opcode, ins: Ins) -> Result<(), Fault> {
        use Opcode::*;

        let (min, high, b_first) = match opcode {
            Max2VtrMovlAxBx => (false, false, false),
            Max2VtrMovhAxBx => (false, true, false),
            Max2VtrMovlBxAx => (false, false, true),
            Max2VtrMovhBxAx => (false, true, true),
            Min2VtrMovlAxBx => (true, false, false),
            Min2VtrMovhAxBx => (true, true, false),
            Min2VtrMovlBxAx => (true, false, true),
            _ => (true, true, true),
        };
        let ax = Acc::ax(ins.base.bits(0, 1));
        let bx = Acc::bx(ins.base.bits(1, 2));
        let (a, b) = if b_first { (bx, ax) } else { (ax, bx) };
        self.min_max_vtr(a, b, min)?;
        let value = self.get_acc(a.counterpart());
        let value = self.saturate_acc_no_flag(value, false);
        let address = self.ar_rn1_step1_address(ins.base.bits(3, 4), ins.base.bits(2, 3));
        let word = if high {
            ((value >> 16) & 0xFFFF) as u16
        } else {
            (value & 0xFFFF) as u16
        };
        self.bus.data_write(address, word);
        Ok(())
    }

    pub(crate) fn min_max_vtr_movij(
        &mut self,
        ins: Ins,
        min: bool,
        swapped: bool,
    ) -> Result<(), Fault> {
        let a = Acc::ax(ins.base.bits(0, 1));
        let b = Acc::bx(ins.base.bits(1, 2));
        self.min_max_vtr(a, b, min)?;
        let value = self.get_acc(a.counterpart());
        let value = self.saturate_acc_no_flag(value, false);
        let h = ((value >> 16) & 0xFFFF) as u16;
        let l = (value & 0xFFFF) as u16;
        let (ui, uj) = self.arp_rn_units(ins.base.bits(2, 3));
        let (si, sj) = self.arp_steps(ins.base.bits(3, 4), ins.base.bits(4, 5));
        let i = self.rn_address_and_modify(ui, si, false);
        let j = self.rn_address_and_modify(uj, sj, false);
        let (iw, jw) = if swapped { (l, h) } else { (h, l) };
        self.bus.data_write(i, iw);
        self.bus.data_write(j, jw);
        Ok(())
    }

    // ----- codebook search -----

    /// One codebook-search step: compare the running products, conditionally
    /// latch the candidate, then restart both multipliers.
    fn cbs(&mut self, u: u16, v: u16, r: u16, cond: CbsCond) -> Result<(), Fault> {
        let x0 = std::mem::replace(&mut self.regs.x[0], u);
        let diff = self
            .product_to_bus40(0)
            .wrapping_sub(self.product_to_bus40(1));
        self.regs.y[0] = u;
        self.do_multiplication(0, true, true);
        self.regs.y[0] = ((self.product_to_bus40(0) >> 16) & 0xFFFF) as u16;
        self.regs.x[0] = x0;
        let taken = match cond {
            CbsCond::Ge => diff >> 63 == 0,
            CbsCond::Gt => diff >> 63 == 0 && diff != 0,
        };
        if taken {
            self.regs.mixp = r;
            // the lateral shuffle involves a hidden operand latch
            self.regs.x[0] = self.regs.y[1];
            self.regs.x[1] = self.regs.y[0];
        }
        self.regs.y[1] = v;
        self.do_multiplication(0, true, true);
        self.do_multiplication(1, true, true);
        Ok(())
    }

    pub(crate) fn cbs_axh(&mut self, ins: Ins) -> Result<(), Fault> {
        let acc = Acc::ax(ins.base.bits(1, 2));
        let u = ((self.get_acc(acc) >> 16) & 0xFFFF) as u16;
        let v = ((self.get_acc(acc.counterpart()) >> 16) & 0xFFFF) as u16;
        let r = self.regs.r[0];
        self.cbs(u, v, r, CbsCond::new(ins.base.bits(0, 1)))
    }

    pub(crate) fn cbs_axh_bxh(&mut self, ins: Ins) -> Result<(), Fault> {
        let u = ((self.get_acc(Acc::ax(ins.base.bits(1, 2))) >> 16) & 0xFFFF) as u16;
        let v = ((self.get_acc(Acc::bx(ins.base.bits(2, 3))) >> 16) & 0xFFFF) as u16;
        let r = self.regs.r[0];
        self.cbs(u, v, r, CbsCond::new(ins.base.bits(0, 1)))
    }

    pub(crate) fn cbs_arp(&mut self, ins: Ins) -> Result<(), Fault> {
        let (ui, uj) = self.arp_rn_units(ins.base.bits(1, 2));
        let (si, sj) = self.arp_steps(ins.base.bits(2, 3), ins.base.bits(3, 4));
        let aip = self.rn_and_modify(ui, si, false);
        let ai = self.rn_address(ui, aip);
        let aj = self.rn_address_and_modify(uj, sj, false);
        let u = self.bus.data_read(ai);
        let v = self.bus.data_read(aj);
        self.cbs(u, v, aip, CbsCond::new(ins.base.bits(0, 1)))
    }

    // ----- dual-memory combine ops -----

    /// Paired read/combine through an ArpRn descriptor: signed sum or
    /// difference in the high half, plain 16-bit arithmetic in the low half.
    pub(crate) fn dual_add_sub(
        &mut self,
        ins: Ins,
        high_sub: bool,
        low_sub: bool,
    ) -> Result<(), Fault> {
        let (ui, uj) = self.arp_rn_units(ins.base.bits(2, 3));
        let (si, sj) = self.arp_steps(ins.base.bits(3, 4), ins.base.bits(4, 5));
        let (oi, oj) = self.arp_offsets(ins.base.bits(3, 4), ins.base.bits(4, 5));
        let i = self.rn_address_and_modify(ui, si, false);
        let j = self.rn_address_and_modify(uj, sj, false);
        let vj = sext16(self.bus.data_read(j) as u64);
        let vi = sext16(self.bus.data_read(i) as u64);
        let high = if high_sub {
            vj.wrapping_sub(vi)
        } else {
            vj.wrapping_add(vi)
        };
        let ja = self.offset_address(uj, j, oj, false);
        let ia = self.offset_address(ui, i, oi, false);
        let lj = self.bus.data_read(ja);
        let li = self.bus.data_read(ia);
        let low = if low_sub {
            lj.wrapping_sub(li)
        } else {
            lj.wrapping_add(li)
        };
        let result = (high << 16) | low as u64;
        self.set_acc_raw(Acc::ab(ins.base.bits(0, 2)), result);
        Ok(())
    }

    /// Single-descriptor combine against the shift value register.
    pub(crate) fn add_sub_sv(&mut self, ins: Ins, sub_high: bool) -> Result<(), Fault> {
        let unit = self.ar_rn_unit(ins.base.bits(3, 4));
        let step = self.ar_step(ins.base.bits(2, 3));
        let offset = self.ar_offset(ins.base.bits(2, 3));
        let address = self.rn_address_and_modify(unit, step, false);
        let sv = self.regs.sv;
        let word = sext16(self.bus.data_read(address) as u64);
        let high = if sub_high {
            word.wrapping_sub(sext16(sv as u64))
        } else {
            word.wrapping_add(sext16(sv as u64))
        };
        let offset_address = self.offset_address(unit, address, offset, false);
        let word = self.bus.data_read(offset_address);
        let low = if sub_high {
            word.wrapping_add(sv)
        } else {
            word.wrapping_sub(sv)
        };
        let result = (high << 16) | low as u64;
        self.set_acc_raw(Acc::ab(ins.base.bits(0, 2)), result);
        Ok(())
    }

    /// Combine one lane against `sv` and refill `sv` from the other lane.
    pub(crate) fn sub_add_mov_sv(&mut self, ins: Ins, use_j: bool) -> Result<(), Fault> {
        let (ui, uj) = self.arp_rn_units(ins.base.bits(2, 3));
        let (si, sj) = self.arp_steps(ins.base.bits(3, 4), ins.base.bits(4, 5));
        let (oi, oj) = self.arp_offsets(ins.base.bits(3, 4), ins.base.bits(4, 5));
        let i = self.rn_address_and_modify(ui, si, false);
        let j = self.rn_address_and_modify(uj, sj, false);
        let (unit, address, offset, other) = if use_j {
            (uj, j, oj, i)
        } else {
            (ui, i, oi, j)
        };
        let sv = self.regs.sv;
        let word = sext16(self.bus.data_read(address) as u64);
        let high = word.wrapping_sub(sext16(sv as u64));
        let offset_address = self.offset_address(unit, address, offset, false);
        let low = self.bus.data_read(offset_address).wrapping_add(sv);
        let result = (high << 16) | low as u64;
        self.set_acc_raw(Acc::ab(ins.base.bits(0, 2)), result);
        self.regs.sv = self.bus.data_read(other);
        Ok(())
    }

    /// Combine one lane against `sv` and exchange the accumulator low with
    /// the other lane.
    pub(crate) fn add_sub_mov(&mut self, ins: Ins, use_j: bool) -> Result<(), Fault> {
        let (ui, uj) = self.arp_rn_units(ins.base.bits(2, 3));
        let (si, sj) = self.arp_steps(ins.base.bits(3, 4), ins.base.bits(4, 5));
        let (oi, oj) = self.arp_offsets(ins.base.bits(3, 4), ins.base.bits(4, 5));
        let i = self.rn_address_and_modify(ui, si, false);
        let j = self.rn_address_and_modify(uj, sj, false);
        let (unit, address, offset, other) = if use_j {
            (uj, j, oj, i)
        } else {
            (ui, i, oi, j)
        };
        let sv = self.regs.sv;
        let word = sext16(self.bus.data_read(address) as u64);
        let high = word.wrapping_add(sext16(sv as u64));
        let offset_address = self.offset_address(unit, address, offset, false);
        let low = self.bus.data_read(offset_address).wrapping_sub(sv);
        let result = (high << 16) | low as u64;
        let acc = Acc::ab(ins.base.bits(0, 2));
        let old = self.get_acc(acc);
        let exchange = (self.saturate_acc_no_flag(old, false) & 0xFFFF) as u16;
        self.set_acc_raw(acc, result);
        self.bus.data_write(other, exchange);
        Ok(())
    }

    /// Product sum against `sv` with a fresh `sv` loaded first.
    pub(crate) fn mov_product_sum_sv(&mut self, ins: Ins) -> Result<(), Fault> {
        let unit = self.ar_rn_unit(ins.base.bits(1, 2));
        let step = if ins.base.bit(3) {
            self.ar_step_alt(ins.base.bits(2, 3))
        } else {
            self.ar_step(ins.base.bits(2, 3))
        };
        let address = self.rn_address_and_modify(unit, step, false);
        self.regs.sv = self.bus.data_read(address);
        let base = if ins.base.bit(4) {
            SumBase::SvRnd
        } else {
            SumBase::Sv
        };
        let p1 = if ins.base.bit(5) { P_SUB } else { P_ADD };
        let acc = Acc::bx(ins.base.bits(0, 1));
        self.product_sum(base, acc, P_SUB, p1);
        Ok(())
    }
}
