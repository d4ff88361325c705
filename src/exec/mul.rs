//! Multiply, multiply-accumulate and the dual-multiplier families.

use bitos::BitUtils;

use crate::{
    Bus, Dsp, Fault,
    alu::{P_ADD, P_ADDA, P_SUB, P_SUBA, ProductTerm, sext},
    ins::{Acc, Ins, MulOp, RegName, SumBase, step_zids},
};

impl<B: Bus> Dsp<B> {
    /// Accumulate-then-multiply skeleton shared by the whole family. The
    /// product is refreshed from the operands loaded by the caller.
    pub(crate) fn mul_generic(&mut self, op: MulOp, acc: Acc) -> Result<(), Fault> {
        if op != MulOp::Mpy && op != MulOp::Mpysu {
            let value = self.get_acc(acc);
            let mut product = self.product_to_bus40(0);
            if op == MulOp::Maa || op == MulOp::Maasu {
                product = sext(product >> 16, 24);
            }
            let result = self.add_sub(value, product, false);
            self.set_acc(acc, result);
        }

        match op {
            MulOp::Mpy | MulOp::Mac | MulOp::Maa => self.do_multiplication(0, true, true),
            // "su" multiplies signed y by unsigned x
            MulOp::Mpysu | MulOp::Macsu | MulOp::Maasu => self.do_multiplication(0, false, true),
            MulOp::Macus => self.do_multiplication(0, true, false),
            MulOp::Macuu => self.do_multiplication(0, false, false),
        }
        Ok(())
    }

    pub(crate) fn mul_rn_imm16(&mut self, ins: Ins) -> Result<(), Fault> {
        let unit = ins.base.bits(2, 5) as usize;
        let step = step_zids(ins.base.bits(0, 2));
        let address = self.rn_address_and_modify(unit, step, false);
        self.regs.y[0] = self.bus.data_read(address);
        self.regs.x[0] = ins.expansion;
        self.mul_generic(MulOp::new(ins.base.bits(6, 9)), Acc::ax(ins.base.bits(5, 6)))
    }

    pub(crate) fn mul_y0_rn(&mut self, ins: Ins) -> Result<(), Fault> {
        let unit = ins.base.bits(2, 5) as usize;
        let step = step_zids(ins.base.bits(0, 2));
        let address = self.rn_address_and_modify(unit, step, false);
        self.regs.x[0] = self.bus.data_read(address);
        self.mul_generic(MulOp::new(ins.base.bits(6, 9)), Acc::ax(ins.base.bits(5, 6)))
    }

    pub(crate) fn mul_y0_reg(&mut self, ins: Ins) -> Result<(), Fault> {
        self.regs.x[0] = self.reg_to_bus16(RegName::new(ins.base.bits(0, 5)), false)?;
        let op = if ins.base.bit(6) { MulOp::Mac } else { MulOp::Mpy };
        self.mul_generic(op, Acc::ax(ins.base.bits(5, 6)))
    }

    pub(crate) fn mul_r45_r0123(&mut self, ins: Ins) -> Result<(), Fault> {
        let y_unit = ins.base.bits(7, 8) as usize + 4;
        let y_step = step_zids(ins.base.bits(5, 7));
        let x_unit = ins.base.bits(3, 5) as usize;
        let x_step = step_zids(ins.base.bits(1, 3));
        let address_y = self.rn_address_and_modify(y_unit, y_step, false);
        let address_x = self.rn_address_and_modify(x_unit, x_step, false);
        self.regs.y[0] = self.bus.data_read(address_y);
        self.regs.x[0] = self.bus.data_read(address_x);
        self.mul_generic(MulOp::new(ins.base.bits(8, 11)), Acc::ax(ins.base.bits(0, 1)))
    }

    /// Subtract the running product, then restart it from fresh operands.
    fn msu_core(&mut self, acc: Acc) {
        let value = self.get_acc(acc);
        let product = self.product_to_bus40(0);
        let result = self.add_sub(value, product, true);
        self.set_acc(acc, result);
    }

    pub(crate) fn msu_r45_r0123(&mut self, ins: Ins) -> Result<(), Fault> {
        let y_unit = ins.base.bits(7, 8) as usize + 4;
        let y_step = step_zids(ins.base.bits(5, 7));
        let x_unit = ins.base.bits(3, 5) as usize;
        let x_step = step_zids(ins.base.bits(1, 3));
        let yi = self.rn_address_and_modify(y_unit, y_step, false);
        let xi = self.rn_address_and_modify(x_unit, x_step, false);
        let acc = Acc::ax(ins.base.bits(0, 1));
        self.msu_core(acc);
        self.regs.y[0] = self.bus.data_read(yi);
        self.regs.x[0] = self.bus.data_read(xi);
        self.do_multiplication(0, true, true);
        Ok(())
    }

    pub(crate) fn msu_rn_imm16(&mut self, ins: Ins) -> Result<(), Fault> {
        let unit = ins.base.bits(2, 5) as usize;
        let step = step_zids(ins.base.bits(0, 2));
        let yi = self.rn_address_and_modify(unit, step, false);
        let acc = Acc::ax(ins.base.bits(5, 6));
        self.msu_core(acc);
        self.regs.y[0] = self.bus.data_read(yi);
        self.regs.x[0] = ins.expansion;
        self.do_multiplication(0, true, true);
        Ok(())
    }

    pub(crate) fn msusu(&mut self, ins: Ins) -> Result<(), Fault> {
        let unit = self.ar_rn_unit(ins.base.bits(3, 5));
        let step = self.ar_step(ins.base.bits(1, 3));
        let xi = self.rn_address_and_modify(unit, step, false);
        let acc = Acc::ax(ins.base.bits(0, 1));
        self.msu_core(acc);
        self.regs.x[0] = self.bus.data_read(xi);
        self.do_multiplication(0, false, true);
        Ok(())
    }

    pub(crate) fn mac_x1to0(&mut self, acc: Acc) -> Result<(), Fault> {
        let value = self.get_acc(acc);
        let product = self.product_to_bus40(0);
        let result = self.add_sub(value, product, false);
        self.set_acc(acc, result);
        self.regs.x[0] = self.regs.x[1];
        self.do_multiplication(0, true, true);
        Ok(())
    }

    pub(crate) fn mac1(&mut self, ins: Ins) -> Result<(), Fault> {
        let (ui, uj) = self.arp_rn_units(ins.base.bits(1, 2));
        let (si, sj) = self.arp_steps(ins.base.bits(2, 3), ins.base.bits(3, 4));
        let i = self.rn_address_and_modify(ui, si, false);
        let j = self.rn_address_and_modify(uj, sj, false);
        let acc = Acc::ax(ins.base.bits(0, 1));
        let value = self.get_acc(acc);
        let product = self.product_to_bus40(1);
        let result = self.add_sub(value, product, false);
        self.set_acc(acc, result);
        self.regs.x[1] = self.bus.data_read(i);
        self.regs.y[1] = self.bus.data_read(j);
        self.do_multiplication(1, true, true);
        Ok(())
    }

    // ----- square and mixed families -----

    pub(crate) fn sqr_sqr_add3_ab(&mut self, ins: Ins) -> Result<(), Fault> {
        let value = self.get_acc(Acc::ab(ins.base.bits(0, 2)));
        self.product_sum(SumBase::Acc, Acc::ab(ins.base.bits(2, 4)), P_ADD, P_ADD);
        self.regs.x[0] = ((value >> 16) & 0xFFFF) as u16;
        self.regs.y[0] = self.regs.x[0];
        self.regs.x[1] = (value & 0xFFFF) as u16;
        self.regs.y[1] = self.regs.x[1];
        self.do_multiplication(0, true, true);
        self.do_multiplication(1, true, true);
        Ok(())
    }

    pub(crate) fn sqr_sqr_add3_ar(&mut self, ins: Ins) -> Result<(), Fault> {
        self.product_sum(SumBase::Acc, Acc::ab(ins.base.bits(0, 2)), P_ADD, P_ADD);
        let unit = self.ar_rn_unit(ins.base.bits(4, 6));
        let step = self.ar_step(ins.base.bits(2, 4));
        let offset = self.ar_offset(ins.base.bits(2, 4));
        let address0 = self.rn_address_and_modify(unit, step, false);
        let address1 = self.offset_address(unit, address0, offset, false);
        let first = self.bus.data_read(address0);
        self.regs.x[0] = first;
        self.regs.y[0] = first;
        let second = self.bus.data_read(address1);
        self.regs.x[1] = second;
        self.regs.y[1] = second;
        self.do_multiplication(0, true, true);
        self.do_multiplication(1, true, true);
        Ok(())
    }

    pub(crate) fn sqr_mpysu_add3a(&mut self, ins: Ins) -> Result<(), Fault> {
        let value = self.get_acc(Acc::ab(ins.base.bits(0, 2)));
        self.product_sum(SumBase::Acc, Acc::ab(ins.base.bits(2, 4)), P_ADD, P_ADDA);
        let high = ((value >> 16) & 0xFFFF) as u16;
        self.regs.x[0] = high;
        self.regs.y[0] = high;
        self.regs.y[1] = high;
        self.regs.x[1] = (value & 0xFFFF) as u16;
        self.do_multiplication(0, true, true);
        self.do_multiplication(1, false, true);
        Ok(())
    }

    pub(crate) fn addhp(&mut self, ins: Ins) -> Result<(), Fault> {
        let unit = self.ar_rn_unit(ins.base.bits(4, 6));
        let step = self.ar_step(ins.base.bits(2, 4));
        let address = self.rn_address_and_modify(unit, step, false);
        let word = self.bus.data_read(address);
        let value = crate::alu::sext32(((word as u64) << 16) | 0x8000);
        let p = self.product_to_bus40(ins.base.bits(1, 2) as usize);
        let result = self.add_sub(value, p, false);
        self.set_acc(Acc::ax(ins.base.bits(0, 1)), result);
        Ok(())
    }

    // ----- dual-multiplier (mma) family -----

    fn mma_terms(combo: u16) -> (ProductTerm, ProductTerm) {
        match combo & 3 {
            0 => (P_ADD, P_ADD),
            1 => (P_ADD, P_ADDA),
            2 => (P_SUB, P_SUB),
            _ => (P_ADD, P_SUBA),
        }
    }

    fn mma_signs(field: u16) -> (bool, bool) {
        // x/y signedness applied to both multiplier units
        match field & 3 {
            0 => (true, true),
            1 => (false, true),
            2 => (true, false),
            _ => (false, false),
        }
    }

    /// Register-operand form: sum, swap the x bank, remultiply both units.
    pub(crate) fn mma_reg(&mut self, ins: Ins) -> Result<(), Fault> {
        let (p0, p1) = Self::mma_terms(ins.base.bits(6, 8));
        let (x_sign, y_sign) = Self::mma_signs(ins.base.bits(2, 4));
        let base = SumBase::new(ins.base.bits(4, 6));
        self.product_sum(base, Acc::ab(ins.base.bits(0, 2)), p0, p1);
        self.regs.x.swap(0, 1);
        self.do_multiplication(0, x_sign, y_sign);
        self.do_multiplication(1, x_sign, y_sign);
        Ok(())
    }

    /// Memory form: sum, then reload all four operands through a pair
    /// descriptor with its offsets.
    pub(crate) fn mma_arp(&mut self, ins: Ins) -> Result<(), Fault> {
        let (p0, p1) = if ins.base.bit(7) {
            (P_SUB, P_SUB)
        } else {
            (P_ADD, P_ADD)
        };
        let (x_sign, y_sign) = Self::mma_signs(ins.base.bits(2, 4));
        self.product_sum(SumBase::Acc, Acc::ab(ins.base.bits(0, 2)), p0, p1);
        let (ui, uj) = self.arp_rn_units(ins.base.bits(4, 5));
        let (si, sj) = self.arp_steps(ins.base.bits(5, 6), ins.base.bits(6, 7));
        let (oi, oj) = self.arp_offsets(ins.base.bits(5, 6), ins.base.bits(6, 7));
        let x = self.rn_address_and_modify(ui, si, false);
        let y = self.rn_address_and_modify(uj, sj, false);
        self.regs.x[0] = self.bus.data_read(x);
        self.regs.y[0] = self.bus.data_read(y);
        let x1 = self.offset_address(ui, x, oi, false);
        self.regs.x[1] = self.bus.data_read(x1);
        let y1 = self.offset_address(uj, y, oj, false);
        self.regs.y[1] = self.bus.data_read(y1);
        self.do_multiplication(0, x_sign, y_sign);
        self.do_multiplication(1, x_sign, y_sign);
        Ok(())
    }

    /// Reloads both x operands through one descriptor.
    pub(crate) fn mma_my_my(&mut self, ins: Ins) -> Result<(), Fault> {
        let (p0, p1) = if ins.base.bit(6) {
            (P_SUB, P_SUB)
        } else {
            (P_ADD, P_ADD)
        };
        let (x_sign, y_sign) = Self::mma_signs(ins.base.bits(4, 6));
        self.product_sum(SumBase::Acc, Acc::ab(ins.base.bits(2, 4)), p0, p1);
        let unit = self.ar_rn_unit(ins.base.bits(0, 1));
        let step = self.ar_step(ins.base.bits(1, 2));
        let offset = self.ar_offset(ins.base.bits(1, 2));
        let address = self.rn_address_and_modify(unit, step, false);
        self.regs.x[0] = self.bus.data_read(address);
        let address1 = self.offset_address(unit, address, offset, false);
        self.regs.x[1] = self.bus.data_read(address1);
        self.do_multiplication(0, x_sign, y_sign);
        self.do_multiplication(1, x_sign, y_sign);
        Ok(())
    }

    /// Swaps the x bank and reloads one y operand.
    pub(crate) fn mma_x_swap(&mut self, ins: Ins, to_y1: bool) -> Result<(), Fault> {
        let (p0, p1) = if ins.base.bit(4) {
            (P_SUB, P_SUB)
        } else {
            (P_ADD, P_ADD)
        };
        self.product_sum(SumBase::Acc, Acc::ab(ins.base.bits(2, 4)), p0, p1);
        self.regs.x.swap(0, 1);
        let unit = self.ar_rn_unit(ins.base.bits(0, 1));
        let step = self.ar_step(ins.base.bits(1, 2));
        let address = self.rn_address_and_modify(unit, step, false);
        let value = self.bus.data_read(address);
        if to_y1 {
            self.regs.y[1] = value;
        } else {
            self.regs.y[0] = value;
        }
        self.do_multiplication(0, true, true);
        self.do_multiplication(1, true, true);
        Ok(())
    }

    /// Stores the accumulator pair highs, then sums and remultiplies.
    pub(crate) fn mma_mov_counterpart(&mut self, ins: Ins) -> Result<(), Fault> {
        let acc = Acc::ab(ins.base.bits(3, 5));
        let unit = self.ar_rn_unit(ins.base.bits(0, 2));
        let step = self.ar_step(ins.base.bits(2, 3));
        let offset = self.ar_offset(ins.base.bits(2, 3));
        let address = self.rn_address_and_modify(unit, step, false);
        let u = self.get_acc(acc);
        let u = ((self.saturate_acc_no_flag(u, false) >> 16) & 0xFFFF) as u16;
        let v = self.get_acc(acc.counterpart());
        let v = ((self.saturate_acc_no_flag(v, false) >> 16) & 0xFFFF) as u16;
        // keep the order
        let offset_address = self.offset_address(unit, address, offset, false);
        self.bus.data_write(offset_address, v);
        self.bus.data_write(address, u);
        self.product_sum(SumBase::Acc, acc, P_ADD, P_ADD);
        self.regs.x.swap(0, 1);
        self.do_multiplication(0, true, true);
        self.do_multiplication(1, true, true);
        Ok(())
    }

    /// Stores two named accumulator highs, then sums and remultiplies.
    pub(crate) fn mma_mov_pair(&mut self, ins: Ins) -> Result<(), Fault> {
        let unit = self.ar_rn_unit(ins.base.bits(2, 3));
        let step = self.ar_step(ins.base.bits(3, 4));
        let offset = self.ar_offset(ins.base.bits(3, 4));
        let address = self.rn_address_and_modify(unit, step, false);
        let u = self.get_acc(Acc::ax(ins.base.bits(0, 1)));
        let u = ((self.saturate_acc_no_flag(u, false) >> 16) & 0xFFFF) as u16;
        let v = self.get_acc(Acc::bx(ins.base.bits(1, 2)));
        let v = ((self.saturate_acc_no_flag(v, false) >> 16) & 0xFFFF) as u16;
        // keep the order
        let offset_address = self.offset_address(unit, address, offset, false);
        self.bus.data_write(offset_address, v);
        self.bus.data_write(address, u);
        self.product_sum(SumBase::Acc, Acc::ax(ins.base.bits(4, 5)), P_ADD, P_ADD);
        self.regs.x.swap(0, 1);
        self.do_multiplication(0, true, true);
        self.do_multiplication(1, true, true);
        Ok(())
    }
}
