//! Instruction semantics: dispatch and the generic ALU families.

mod flow;
mod mem;
mod mul;
mod vec;

use bitos::BitUtils;

use crate::{
    Bus, Dsp, Fault,
    alu::{P_ADD, P_ADDA, P_SUB, P_SUBA, sext16, sext32, sext40},
    ins::{
        Acc, AlbOp, AlbRegName, AlmOp, Cond, Ins, ModaOp, MulOp, Opcode, RegName, SttMod, SumBase,
        ablh, step_zids,
    },
};

impl<B: Bus> Dsp<B> {
    pub(crate) fn dispatch(&mut self, opcode: Opcode, ins: Ins) -> Result<(), Fault> {
        use Opcode::*;

        match opcode {
            Nop => Ok(()),
            Trap | Retd | Retid | Retidc | PushPrpage | PopPrpage | MovDvmToAb | MovDvmAbl
            | MovPrpageAbl | MovPrpageToAbl | MovPrpageImm4 | MovIcrImm5 | MovEu | MovExt0
            | MovExt1 | MovExt2 | MovExt3 => Err(self.unimplemented()),
            Dint => {
                self.regs.ie = false;
                Ok(())
            }
            Eint => {
                self.regs.ie = true;
                Ok(())
            }
            CntxS => {
                self.context_store();
                Ok(())
            }
            CntxR => {
                self.context_restore();
                Ok(())
            }
            Break => self.break_(),
            BkrepRstMemsp => self.bkrep_rst_memsp(),
            BkrepStoMemsp => self.bkrep_sto_memsp(),
            PushRepc => self.push_word(self.regs.repc),
            PopRepc => {
                self.regs.repc = self.pop_word();
                Ok(())
            }
            PushX0 => self.push_word(self.regs.x[0]),
            PopX0 => {
                self.regs.x[0] = self.pop_word();
                Ok(())
            }
            PushX1 => self.push_word(self.regs.x[1]),
            PopX1 => {
                self.regs.x[1] = self.pop_word();
                Ok(())
            }
            PushY1 => self.push_word(self.regs.y[1]),
            PopY1 => {
                self.regs.y[1] = self.pop_word();
                Ok(())
            }
            PushR6 => self.push_word(self.regs.r[6]),
            PopR6 => {
                self.regs.r[6] = self.pop_word();
                Ok(())
            }
            RepR6 => {
                self.repeat(self.regs.r[6]);
                Ok(())
            }
            MovMixpR6 => {
                self.regs.r[6] = self.regs.mixp;
                Ok(())
            }
            MovR6Mixp => {
                self.regs.mixp = self.regs.r[6];
                Ok(())
            }
            MovMemspR6 => {
                self.regs.r[6] = self.bus.data_read(self.regs.sp);
                Ok(())
            }
            MovP0hR6 => {
                self.regs.r[6] = (self.product_to_bus40(0) >> 16) as u16;
                Ok(())
            }
            ExpR6 => {
                self.exp_r6();
                Ok(())
            }
            Vtrclr0 => {
                self.regs.vtr[0] = 0;
                Ok(())
            }
            Vtrclr1 => {
                self.regs.vtr[1] = 0;
                Ok(())
            }
            Vtrclr => {
                self.regs.vtr = [0; 2];
                Ok(())
            }
            Vtrshr => {
                self.vtrshr();
                Ok(())
            }
            Clrp0 => {
                self.product_from_bus32(0, 0);
                Ok(())
            }
            Clrp1 => {
                self.product_from_bus32(1, 0);
                Ok(())
            }
            Clrp => {
                self.product_from_bus32(0, 0);
                self.product_from_bus32(1, 0);
                Ok(())
            }
            Bankr => {
                self.regs.swap_all_ar_arp();
                Ok(())
            }
            MovA0hStepi0 => {
                self.regs.stepi0 = self.reg_to_bus16(RegName::A0h, true)?;
                Ok(())
            }
            MovA0hStepj0 => {
                self.regs.stepj0 = self.reg_to_bus16(RegName::A0h, true)?;
                Ok(())
            }
            MovStepi0A0h => self.reg_from_bus16(RegName::A0h, self.regs.stepi0),
            MovStepj0A0h => self.reg_from_bus16(RegName::A0h, self.regs.stepj0),
            MacX1To0 => self.mac_x1to0(Acc::ax(ins.base.bits(0, 1))),
            Pacr1 => self.pacr1(Acc::ax(ins.base.bits(0, 1))),
            ExpR6Ax => {
                self.exp_r6();
                self.exp_store(Acc::ax(ins.base.bits(0, 1)));
                Ok(())
            }
            MovsR6Ax => {
                let value = sext16(self.regs.r[6] as u64);
                self.shift_bus40(value, self.regs.sv, Acc::ax(ins.base.bits(0, 1)));
                Ok(())
            }
            MovrR6Ax => self.movr_bus16(self.regs.r[6], Acc::ax(ins.base.bits(0, 1))),
            CallaAxl => self.calla_axl(Acc::ax(ins.base.bits(0, 1))),
            CallaAx => self.calla_ax(Acc::ax(ins.base.bits(0, 1))),
            MovPcAx => {
                let value = self.get_acc(Acc::ax(ins.base.bits(0, 1)));
                self.set_pc_checked((value & 0xFFFF_FFFF) as u32)
            }
            MovPcBx => {
                let value = self.get_acc(Acc::bx(ins.base.bits(0, 1)));
                self.set_pc_checked((value & 0xFFFF_FFFF) as u32)
            }
            Movpdw => self.movpdw(Acc::ax(ins.base.bits(0, 1))),
            ExpBx => {
                let value = self.get_acc(Acc::bx(ins.base.bits(0, 1)));
                self.regs.sv = crate::alu::exponent(value);
                Ok(())
            }
            Swap => self.swap(ins.base.bits(0, 4)),
            BankrAr => {
                self.regs.swap_ar(ins.base.bits(0, 1) as usize);
                Ok(())
            }
            Vtrmov0 => self.vtrmov(Acc::ax(ins.base.bits(0, 1)), 0),
            BankrArp => {
                self.regs.swap_arp(ins.base.bits(0, 2) as usize);
                Ok(())
            }
            BankrArArp => {
                self.regs.swap_ar(ins.base.bits(0, 1) as usize);
                self.regs.swap_arp(ins.base.bits(1, 3) as usize);
                Ok(())
            }
            PopBx => {
                let value = self.pop_word();
                self.reg_from_bus16(
                    if ins.base.bit(0) { RegName::B1 } else { RegName::B0 },
                    value,
                )
            }
            PushaAx => self.pusha(Acc::ax(ins.base.bits(0, 1))),
            PushaBx => self.pusha(Acc::bx(ins.base.bits(0, 1))),
            PushPx => self.push_px(ins.base.bits(0, 1) as usize),
            PopPx => self.pop_px(ins.base.bits(0, 1) as usize),
            Vtrmov1 => self.vtrmov(Acc::ax(ins.base.bits(0, 1)), 1),
            BkrepR6 => self.bkrep_r6(ins),
            MulY0R6 => {
                self.regs.x[0] = self.regs.r[6];
                self.mul_generic(MulOp::new(ins.base.bits(1, 4)), Acc::ax(ins.base.bits(0, 1)))
            }
            PopaAb => self.popa(Acc::ab(ins.base.bits(0, 2))),
            PopAbe => self.pop_abe(Acc::ab(ins.base.bits(0, 2))),
            PushAbe => self.push_abe(Acc::ab(ins.base.bits(0, 2))),
            MovP1ToAb => {
                let value = self.product_to_bus40(1);
                self.set_acc(Acc::ab(ins.base.bits(0, 2)), value);
                Ok(())
            }
            MovP0Ab => {
                let acc = self.get_acc(Acc::ab(ins.base.bits(0, 2)));
                let value = self.saturate_acc(acc, false) as u32;
                self.product_from_bus32(0, value);
                Ok(())
            }
            MovRepcToAb => self.reg_from_bus16_ab(ins, self.regs.repc),
            MovX0ToAb => self.reg_from_bus16_ab(ins, self.regs.x[0]),
            MovX1ToAb => self.reg_from_bus16_ab(ins, self.regs.x[1]),
            MovY1ToAb => self.reg_from_bus16_ab(ins, self.regs.y[1]),
            MovIcrToAb => self.reg_from_bus16_ab(ins, self.regs.icr()),
            Vtrmov => {
                let value = (self.regs.vtr[1] & 0xFF00) | (self.regs.vtr[0] >> 8);
                self.set_acc(Acc::ax(ins.base.bits(0, 1)), value as u64);
                Ok(())
            }
            ClrAbAb => self.clr_pair(ins, false),
            ClrrAbAb => self.clr_pair(ins, true),
            MovAbAb => {
                let value = self.get_acc(Acc::ab(ins.base.bits(0, 2)));
                self.set_acc(Acc::ab(ins.base.bits(2, 4)), value);
                Ok(())
            }
            SqrSqrAdd3Ab => self.sqr_sqr_add3_ab(ins),
            SqrMpysuAdd3a => self.sqr_mpysu_add3a(ins),
            MovX0Abl => {
                self.regs.x[0] = self.abl_to_bus16(Acc::ab(ins.base.bits(0, 2)));
                Ok(())
            }
            MovX1Abl => {
                self.regs.x[1] = self.abl_to_bus16(Acc::ab(ins.base.bits(0, 2)));
                Ok(())
            }
            MovY1Abl => {
                self.regs.y[1] = self.abl_to_bus16(Acc::ab(ins.base.bits(0, 2)));
                Ok(())
            }
            MovRepcAbl => {
                self.regs.repc = self.abl_to_bus16(Acc::ab(ins.base.bits(0, 2)));
                Ok(())
            }
            MovP0hToBx => {
                let value = (self.product_to_bus40(0) >> 16) as u16;
                self.reg_from_bus16(
                    if ins.base.bit(0) { RegName::B1 } else { RegName::B0 },
                    value,
                )
            }
            MovR6ToBx => self.reg_from_bus16(
                if ins.base.bit(0) { RegName::B1 } else { RegName::B0 },
                self.regs.r[6],
            ),
            MovRepcToAbl => self.set_abl(Acc::ab(ins.base.bits(0, 2)), self.regs.repc),
            LimAxAx => {
                let value = self.get_acc(Acc::ax(ins.base.bits(0, 1)));
                let value = self.saturate_acc_unconditional(value);
                self.set_acc_no_sat(Acc::ax(ins.base.bits(1, 2)), value);
                Ok(())
            }
            ExpBxAx => {
                let value = self.get_acc(Acc::bx(ins.base.bits(1, 2)));
                self.regs.sv = crate::alu::exponent(value);
                self.exp_store(Acc::ax(ins.base.bits(0, 1)));
                Ok(())
            }
            CmpB0B1 => self.cmp_acc(Acc::B0, Acc::B1),
            CmpB1B0 => self.cmp_acc(Acc::B1, Acc::B0),
            CmpAxBx => self.cmp_acc(Acc::ax(ins.base.bits(0, 1)), Acc::bx(ins.base.bits(1, 2))),
            CmpBxAx => self.cmp_acc(Acc::bx(ins.base.bits(0, 1)), Acc::ax(ins.base.bits(1, 2))),
            CmpP1Ax => {
                let va = self.product_to_bus40(1);
                let vb = self.get_acc(Acc::ax(ins.base.bits(0, 1)));
                let result = self.add_sub(vb, va, true);
                self.set_acc_flags(result);
                Ok(())
            }
            MovMixpToBx => self.reg_from_bus16(
                if ins.base.bit(0) { RegName::B1 } else { RegName::B0 },
                self.regs.mixp,
            ),
            MaxGe | MaxGt | MinLe | MinLt => self.minmax_acc(opcode, ins),
            ExpRegister => {
                self.exp_register(RegName::new(ins.base.bits(0, 5)))?;
                Ok(())
            }
            Mac1 => self.mac1(ins),
            ExpRegisterAx => {
                self.exp_register(RegName::new(ins.base.bits(0, 5)))?;
                self.exp_store(Acc::ax(ins.base.bits(5, 6)));
                Ok(())
            }
            MsusuArRn2 => self.msusu(ins),
            MaxGeR0 | MaxGtR0 | MinLeR0 | MinLtR0 => self.minmax_r0(opcode, ins),

            Modr => self.modr(ins),
            ModrI2D2 => self.modr_i2d2(ins),
            Bitrev => self.bitrev(ins, None),
            BitrevDbrv => self.bitrev(ins, Some(false)),
            BitrevEbrv => self.bitrev(ins, Some(true)),
            BkrepRstAr => self.bkrep_rst_ar(ins),
            BkrepStoAr => self.bkrep_sto_ar(ins),
            MovR6Reg => {
                self.regs.r[6] = self.reg_to_bus16(RegName::new(ins.base.bits(0, 5)), true)?;
                Ok(())
            }
            MovR6ToReg => self.reg_from_bus16(RegName::new(ins.base.bits(0, 5)), self.regs.r[6]),
            RepReg => {
                let count = self.reg_to_bus16(RegName::new(ins.base.bits(0, 5)), false)?;
                self.repeat(count);
                Ok(())
            }
            PushReg => {
                let value = self.reg_to_bus16(RegName::new(ins.base.bits(0, 5)), true)?;
                self.push_word(value)
            }
            PopReg => {
                let value = self.pop_word();
                self.reg_from_bus16(RegName::new(ins.base.bits(0, 5)), value)
            }
            MovMemspToReg => {
                let value = self.bus.data_read(self.regs.sp);
                self.reg_from_bus16(RegName::new(ins.base.bits(0, 5)), value)
            }
            MovMixpToReg => self.reg_from_bus16(RegName::new(ins.base.bits(0, 5)), self.regs.mixp),
            MovIcrReg => {
                let value = self.reg_to_bus16(RegName::new(ins.base.bits(0, 5)), true)?;
                self.regs.set_icr(value);
                Ok(())
            }
            MovMixpReg => {
                self.regs.mixp = self.reg_to_bus16(RegName::new(ins.base.bits(0, 5)), true)?;
                Ok(())
            }
            MovP0hToReg => {
                let value = (self.product_to_bus40(0) >> 16) as u16;
                self.reg_from_bus16(RegName::new(ins.base.bits(0, 5)), value)
            }
            MovRegBx => self.mov_reg_bx(ins),
            ModrEemod => self.modr_arp(ins, false, false),
            ModrEdmod => self.modr_arp(ins, false, true),
            ModrDemod => self.modr_arp(ins, true, false),
            ModrDdmod => self.modr_arp(ins, true, true),
            LoadStepi => {
                self.regs.stepi = ins.base.bits(0, 7);
                Ok(())
            }
            LoadStepj => {
                self.regs.stepj = ins.base.bits(0, 7);
                Ok(())
            }
            LoadPs => {
                self.regs.ps[0] = ins.base.bits(0, 2);
                Ok(())
            }
            LoadMovpd => {
                self.regs.movpd = ins.base.bits(0, 2);
                Ok(())
            }
            LoadPs01 => {
                self.regs.ps[0] = ins.base.bits(0, 2);
                self.regs.ps[1] = ins.base.bits(2, 4);
                Ok(())
            }
            Ret => {
                if self.regs.condition_pass(Cond::new(ins.base.bits(0, 4))) {
                    self.pop_pc();
                }
                Ok(())
            }
            Reti => {
                if self.regs.condition_pass(Cond::new(ins.base.bits(0, 4))) {
                    self.pop_pc();
                    self.regs.ie = true;
                }
                Ok(())
            }
            Retic => {
                if self.regs.condition_pass(Cond::new(ins.base.bits(0, 4))) {
                    self.pop_pc();
                    self.regs.ie = true;
                    self.context_restore();
                }
                Ok(())
            }
            MovArArpAbl => {
                let ararp = ins.base.bits(2, 4) | (ins.base.bit(5) as u16) << 2;
                let value = self.ararp_to_bus16(crate::ins::ArArp::new(ararp))?;
                self.set_abl(Acc::ab(ins.base.bits(0, 2)), value)
            }
            TstbR6 => {
                self.regs.flags.z = (self.regs.r[6] >> ins.base.bits(0, 4)) & 1 != 0;
                Ok(())
            }
            MovSttModAbl => {
                let value = self.sttmod_to_bus16(SttMod::new(ins.base.bits(2, 5)))?;
                self.set_abl(Acc::ab(ins.base.bits(0, 2)), value)
            }
            MovAblArArp => {
                let value = self.abl_to_bus16(Acc::ab(ins.base.bits(0, 2)));
                self.ararp_from_bus16(crate::ins::ArArp::new(ins.base.bits(2, 5)), value)
            }
            NormAxRn => self.norm(ins),
            MovSvToMemImm8 => {
                let address = self.mem_imm8(ins.base.bits(0, 8));
                self.bus.data_write(address, self.regs.sv);
                Ok(())
            }
            Shfi => {
                let value = self.get_acc(Acc::ab(ins.base.bits(8, 10)));
                let sv = crate::alu::sext(ins.base.bits(0, 6) as u64, 6) as u16;
                self.shift_bus40(value, sv, Acc::ab(ins.base.bits(6, 8)));
                Ok(())
            }
            Rets => {
                self.pop_pc();
                self.regs.sp = self.regs.sp.wrapping_add(ins.base.bits(0, 8));
                Ok(())
            }
            RepImm8 => {
                self.repeat(ins.base.bits(0, 8));
                Ok(())
            }
            LoadPage => {
                self.regs.page = ins.base.bits(0, 8);
                Ok(())
            }
            Mpyi => {
                self.regs.x[0] = crate::alu::sext(ins.base.bits(0, 8) as u64, 8) as u16;
                self.do_multiplication(0, true, true);
                Ok(())
            }

            MovImm8Axl => {
                // low-lane write, zero-extended
                self.set_acc(Acc::ax(ins.base.bits(8, 9)), ins.base.bits(0, 8) as u64);
                Ok(())
            }
            MovImm8sAxh => {
                let value = crate::alu::sext(ins.base.bits(0, 8) as u64, 8) as u16;
                self.reg_from_bus16(
                    if ins.base.bit(8) { RegName::A1h } else { RegName::A0h },
                    value,
                )
            }
            LoadModi => {
                self.regs.modi = ins.base.bits(0, 9);
                Ok(())
            }
            LoadModj => {
                self.regs.modj = ins.base.bits(0, 9);
                Ok(())
            }
            Brr => self.brr(ins),
            Callr => self.callr(ins),
            MovSvImm8s => {
                self.regs.sv = crate::alu::sext(ins.base.bits(0, 8) as u64, 8) as u16;
                Ok(())
            }

            MovR6Imm16 => {
                self.regs.r[6] = ins.expansion;
                Ok(())
            }
            MovRepcImm16 => {
                self.regs.repc = ins.expansion;
                Ok(())
            }
            MovStepi0Imm16 => {
                self.regs.stepi0 = ins.expansion;
                Ok(())
            }
            MovStepj0Imm16 => {
                self.regs.stepj0 = ins.expansion;
                Ok(())
            }
            PushImm16 => self.push_word(ins.expansion),
            MovImm16SttMod => {
                self.sttmod_from_bus16(SttMod::new(ins.base.bits(0, 3)), ins.expansion)
            }
            MovImm16ArArp => {
                self.ararp_from_bus16(crate::ins::ArArp::new(ins.base.bits(0, 3)), ins.expansion)
            }
            MovImm16Bx => self.reg_from_bus16(
                if ins.base.bit(0) { RegName::B1 } else { RegName::B0 },
                ins.expansion,
            ),
            AlbR6 => self.alb_r6(ins),
            TstbSttModImm16 => {
                let value = self.sttmod_to_bus16(SttMod::new(ins.base.bits(0, 3)))?;
                self.regs.flags.z = value
                    .checked_shr(ins.expansion as u32)
                    .map_or(0, |v| v & 1)
                    != 0;
                Ok(())
            }
            MovImm16Reg => self.reg_from_bus16(RegName::new(ins.base.bits(0, 5)), ins.expansion),
            AluImm16 => {
                let op = AlmOp::from_alu(ins.base.bits(1, 4));
                let value = self.extend_for_alm(op, ins.expansion);
                self.alm_generic(op, value, Acc::ax(ins.base.bits(0, 1)))
            }
            AluMemImm16 => {
                let op = AlmOp::from_alu(ins.base.bits(1, 4));
                let value = self.bus.data_read(ins.expansion);
                let value = self.extend_for_alm(op, value);
                self.alm_generic(op, value, Acc::ax(ins.base.bits(0, 1)))
            }
            AluMemR7Imm16 => {
                let op = AlmOp::from_alu(ins.base.bits(1, 4));
                let address = ins.expansion.wrapping_add(self.regs.r[7]);
                let value = self.bus.data_read(address);
                let value = self.extend_for_alm(op, value);
                self.alm_generic(op, value, Acc::ax(ins.base.bits(0, 1)))
            }
            MovMemImm16Ax => {
                let value = self.bus.data_read(ins.expansion);
                self.reg_from_bus16(
                    if ins.base.bit(0) { RegName::A1 } else { RegName::A0 },
                    value,
                )
            }
            MovAxlMemImm16 => {
                let value = self.axl_to_bus16(Acc::ax(ins.base.bits(0, 1)));
                self.bus.data_write(ins.expansion, value);
                Ok(())
            }
            MovMemR7Imm16Ax => {
                let value = self.bus.data_read(ins.expansion.wrapping_add(self.regs.r[7]));
                self.reg_from_bus16(
                    if ins.base.bit(0) { RegName::A1 } else { RegName::A0 },
                    value,
                )
            }
            MovAxlMemR7Imm16 => {
                let value = self.axl_to_bus16(Acc::ax(ins.base.bits(0, 1)));
                self.bus
                    .data_write(ins.expansion.wrapping_add(self.regs.r[7]), value);
                Ok(())
            }
            MovRepcMemR7Imm16 => {
                self.regs.repc = self.bus.data_read(ins.expansion.wrapping_add(self.regs.r[7]));
                Ok(())
            }
            MovRepcToMemR7Imm16 => {
                self.bus
                    .data_write(ins.expansion.wrapping_add(self.regs.r[7]), self.regs.repc);
                Ok(())
            }
            MovMemR7Imm16ArArpSttMod => {
                let value = self.bus.data_read(ins.expansion.wrapping_add(self.regs.r[7]));
                self.ararpsttmod_from_bus16(
                    crate::ins::ArArpSttMod::new(ins.base.bits(0, 4)),
                    value,
                )
            }
            MovArArpSttModMemR7Imm16 => {
                let value = self
                    .ararpsttmod_to_bus16(crate::ins::ArArpSttMod::new(ins.base.bits(0, 4)))?;
                self.bus
                    .data_write(ins.expansion.wrapping_add(self.regs.r[7]), value);
                Ok(())
            }
            SqrSqrAdd3Ar => self.sqr_sqr_add3_ar(ins),
            Divs => self.divs(ins),
            BkrepReg => self.bkrep_reg(ins),
            MovMemR7Imm7sAx => {
                let value = self.bus.data_read(self.mem_r7_imm7s(ins.base.bits(0, 7)));
                self.reg_from_bus16(
                    if ins.base.bit(8) { RegName::A1 } else { RegName::A0 },
                    value,
                )
            }
            Br => self.br(ins),
            Call => self.call(ins),
            Bkrep => self.bkrep_imm8(ins),
            MovAxlMemR7Imm7s => {
                let value = self.axl_to_bus16(Acc::ax(ins.base.bits(7, 8)));
                let address = self.mem_r7_imm7s(ins.base.bits(0, 7));
                self.bus.data_write(address, value);
                Ok(())
            }

            AlmRn => {
                let op = AlmOp::new(ins.base.bits(5, 9));
                let unit = ins.base.bits(2, 5) as usize;
                let step = step_zids(ins.base.bits(0, 2));
                let address = self.rn_address_and_modify(unit, step, false);
                let value = self.bus.data_read(address);
                let value = self.extend_for_alm(op, value);
                self.alm_generic(op, value, Acc::ax(ins.base.bits(9, 10)))
            }
            AlmReg => self.alm_reg(ins),
            AluMemR7Imm7s => {
                let op = AlmOp::from_alu(ins.base.bits(8, 11));
                let value = self.bus.data_read(self.mem_r7_imm7s(ins.base.bits(0, 7)));
                let value = self.extend_for_alm(op, value);
                self.alm_generic(op, value, Acc::ax(ins.base.bits(7, 8)))
            }
            Alm => {
                let op = AlmOp::new(ins.base.bits(8, 12));
                let value = self.bus.data_read(self.mem_imm8(ins.base.bits(0, 8)));
                let value = self.extend_for_alm(op, value);
                self.alm_generic(op, value, Acc::ax(ins.base.bits(12, 13)))
            }
            Alb => self.alb_mem(ins),
            MulY0MemImm8 => {
                self.regs.x[0] = self.bus.data_read(self.mem_imm8(ins.base.bits(0, 8)));
                self.mul_generic(
                    MulOp::from_mul2(ins.base.bits(9, 11)),
                    Acc::ax(ins.base.bits(8, 9)),
                )
            }
            AluImm8 => self.alu_imm8(ins),

            MovAblhMemImm8 => {
                let (acc, part) = ablh(ins.base.bits(8, 11));
                let value = self.ablh_to_bus16(acc, part);
                let address = self.mem_imm8(ins.base.bits(0, 8));
                self.bus.data_write(address, value);
                Ok(())
            }
            MovMemImm8Ablh => {
                let (acc, part) = ablh(ins.base.bits(8, 11));
                let value = self.bus.data_read(self.mem_imm8(ins.base.bits(0, 8)));
                match part {
                    crate::ins::Part::Low => self.set_acc(acc, value as u64),
                    crate::ins::Part::High => self.set_acc(acc, sext32((value as u64) << 16)),
                }
                Ok(())
            }
            MovMemImm8Rn => {
                let value = self.bus.data_read(self.mem_imm8(ins.base.bits(0, 8)));
                self.regs.r[ins.base.bits(8, 11) as usize] = value;
                Ok(())
            }
            MovRnMemImm8 => {
                let value = self.regs.r[ins.base.bits(8, 11) as usize];
                let address = self.mem_imm8(ins.base.bits(0, 8));
                self.bus.data_write(address, value);
                Ok(())
            }
            MovImm8sRn => {
                self.regs.r[ins.base.bits(8, 11) as usize] =
                    crate::alu::sext(ins.base.bits(0, 8) as u64, 8) as u16;
                Ok(())
            }
            MovMemImm8Ab => {
                let value = self.bus.data_read(self.mem_imm8(ins.base.bits(0, 8)));
                let acc = Acc::ab(ins.base.bits(8, 10));
                self.set_acc(acc, sext16(value as u64));
                Ok(())
            }
            MovsMemImm8Ab => {
                let value = self.bus.data_read(self.mem_imm8(ins.base.bits(0, 8)));
                self.shift_bus40(
                    sext16(value as u64),
                    self.regs.sv,
                    Acc::ab(ins.base.bits(8, 10)),
                );
                Ok(())
            }
            TstbMemImm8 => {
                let value = self.bus.data_read(self.mem_imm8(ins.base.bits(0, 8)));
                self.regs.flags.z = (value >> ins.base.bits(8, 12)) & 1 != 0;
                Ok(())
            }

            MulR45R0123 => self.mul_r45_r0123(ins),
            MovR6ToRnStep => {
                let address = self.rn_step_address(ins);
                self.bus.data_write(address, self.regs.r[6]);
                Ok(())
            }
            MovR6RnStep => {
                let address = self.rn_step_address(ins);
                self.regs.r[6] = self.bus.data_read(address);
                Ok(())
            }
            ExpRnStep => {
                self.exp_rn(ins);
                Ok(())
            }
            MovRnStepBx => {
                let address = self.rn_step_address(ins);
                let value = self.bus.data_read(address);
                self.reg_from_bus16(
                    if ins.base.bit(5) { RegName::B1 } else { RegName::B0 },
                    value,
                )
            }
            ExpRnStepAx => {
                self.exp_rn(ins);
                self.exp_store(Acc::ax(ins.base.bits(5, 6)));
                Ok(())
            }
            MovsRnStepAb => {
                let address = self.rn_step_address(ins);
                let value = self.bus.data_read(address);
                self.shift_bus40(
                    sext16(value as u64),
                    self.regs.sv,
                    Acc::ab(ins.base.bits(5, 7)),
                );
                Ok(())
            }
            MovdR0123R45 => self.movd(ins),
            MovpAxlReg => self.movp_axl_reg(ins),
            MovpAxReg => self.movp_ax_reg(ins),
            AlbRnStep => self.alb_rn(ins),
            AlbReg => self.alb_reg(ins),
            ExchangeIaj => self.exchange(ins, false, false),
            ExchangeRiaj => self.exchange(ins, false, true),
            ExchangeJai => self.exchange(ins, true, false),
            ExchangeRjai => self.exchange(ins, true, true),
            MovRnStepReg => {
                let address = self.rn_step_address(ins);
                let value = self.bus.data_read(address);
                self.reg_from_bus16(RegName::new(ins.base.bits(5, 10)), value)
            }
            MovRegRnStep => {
                let value = self.reg_to_bus16(RegName::new(ins.base.bits(5, 10)), true)?;
                let address = self.rn_step_address(ins);
                self.bus.data_write(address, value);
                Ok(())
            }
            MovpRnR0123 => self.movp_rn(ins),
            TstbRnStep => {
                let address = self.rn_step_address(ins);
                let value = self.bus.data_read(address);
                self.regs.flags.z = (value >> ins.base.bits(5, 9)) & 1 != 0;
                Ok(())
            }
            MulRnImm16 => self.mul_rn_imm16(ins),
            MulY0Rn => self.mul_y0_rn(ins),

            Mov2PxArRn2 => self.mov2_px_to_mem(ins, false),
            Mov2sPxArRn2 => self.mov2_px_to_mem(ins, true),
            Mov2ArRn2Px => self.mov2_mem_to_px(ins),
            AlmR6 => {
                let op = AlmOp::new(ins.base.bits(1, 5));
                let value = self.extend_for_alm(op, self.regs.r[6]);
                self.alm_generic(op, value, Acc::ax(ins.base.bits(0, 1)))
            }
            MovaAbArRn2 => self.mova_to_mem(ins),
            MovaArRn2Ab => self.mova_from_mem(ins),
            MovrArRn2Abh => self.movr_ar(ins),
            Banke => self.banke(ins),
            MovrRnStepAx => {
                let address = self.rn_step_address(ins);
                let value = self.bus.data_read(address);
                self.movr_bus16(value, Acc::ax(ins.base.bits(5, 6)))
            }
            MovSvMemImm8 => {
                self.regs.sv = self.bus.data_read(self.mem_imm8(ins.base.bits(0, 8)));
                Ok(())
            }
            MovRepcToArRn1 => {
                let address = self.ar_rn1_step1_address(ins.base.bits(1, 2), ins.base.bits(0, 1));
                self.bus.data_write(address, self.regs.repc);
                Ok(())
            }
            MovRepcArRn1 => {
                let address = self.ar_rn1_step1_address(ins.base.bits(1, 2), ins.base.bits(0, 1));
                self.regs.repc = self.bus.data_read(address);
                Ok(())
            }
            Tst4b => self.tst4b(ins, false),
            MovArArpArRn1 => {
                let value = self.ararp_to_bus16(crate::ins::ArArp::new(ins.base.bits(2, 5)))?;
                let address = self.ar_rn1_step1_address(ins.base.bits(1, 2), ins.base.bits(0, 1));
                self.bus.data_write(address, value);
                Ok(())
            }
            MovSttModArRn1 => {
                let value = self.sttmod_to_bus16(SttMod::new(ins.base.bits(2, 5)))?;
                let address = self.ar_rn1_step1_address(ins.base.bits(1, 2), ins.base.bits(0, 1));
                self.bus.data_write(address, value);
                Ok(())
            }
            MovArRn1ArArp => {
                let address = self.ar_rn1_step1_address(ins.base.bits(1, 2), ins.base.bits(0, 1));
                let value = self.bus.data_read(address);
                self.ararp_from_bus16(crate::ins::ArArp::new(ins.base.bits(2, 5)), value)
            }
            MovArRn1SttMod => {
                let address = self.ar_rn1_step1_address(ins.base.bits(1, 2), ins.base.bits(0, 1));
                let value = self.bus.data_read(address);
                self.sttmod_from_bus16(SttMod::new(ins.base.bits(2, 5)), value)
            }
            Tst4bAx => self.tst4b(ins, true),
            Addhp => self.addhp(ins),
            MovRegReg => self.mov_reg_reg(ins),
            MovProductSumSv => self.mov_product_sum_sv(ins),
            CbsAxh => self.cbs_axh(ins),
            CbsAxhBxh => self.cbs_axh_bxh(ins),
            CbsArp => self.cbs_arp(ins),
            SubAddIMovJSv => self.sub_add_mov_sv(ins, false),
            SubAddJMovISv => self.sub_add_mov_sv(ins, true),
            AddSubIMovJ => self.add_sub_mov(ins, false),
            AddSubJMovI => self.add_sub_mov(ins, true),
            AddSubSv => self.add_sub_sv(ins, false),
            SubAddSv => self.add_sub_sv(ins, true),
            AddAdd => self.dual_add_sub(ins, false, false),
            AddSubDual => self.dual_add_sub(ins, false, true),
            SubAdd => self.dual_add_sub(ins, true, false),
            SubSub => self.dual_add_sub(ins, true, true),
            Mov2AxMij => self.mov2_acc_to_mem(ins, false),
            Mov2AxMji => self.mov2_acc_to_mem(ins, true),
            Mov2MijAx => self.mov2_mem_to_acc(ins, false),
            Mov2MjiAx => self.mov2_mem_to_acc(ins, true),

            Moda4 => self.moda(
                ModaOp::new(ins.base.bits(5, 9)),
                Acc::ax(ins.base.bits(4, 5)),
                Cond::new(ins.base.bits(0, 4)),
            ),
            Moda3 => self.moda(
                ModaOp::from_moda3(ins.base.bits(5, 8)),
                Acc::bx(ins.base.bits(4, 5)),
                Cond::new(ins.base.bits(0, 4)),
            ),
            MsuR45R0123 => self.msu_r45_r0123(ins),
            Movsi => {
                let value = self.regs.r[ins.base.bits(7, 10) as usize];
                let sv = crate::alu::sext(ins.base.bits(0, 5) as u64, 5) as u16;
                self.shift_bus40(sext16(value as u64), sv, Acc::ab(ins.base.bits(5, 7)));
                Ok(())
            }
            AddAbBx => self.add_acc(Acc::ab(ins.base.bits(0, 2)), Acc::bx(ins.base.bits(2, 3))),
            AddBxAx => self.add_acc(Acc::bx(ins.base.bits(0, 1)), Acc::ax(ins.base.bits(1, 2))),
            AddP1Ax => {
                let value = self.product_to_bus40(1);
                self.add_value_acc(value, Acc::ax(ins.base.bits(0, 1)))
            }
            SubP1Ax => {
                let value = self.product_to_bus40(1);
                self.sub_value_acc(value, Acc::ax(ins.base.bits(0, 1)))
            }
            AddPxBx => {
                let value = self.product_to_bus40(ins.base.bits(0, 1) as usize);
                self.add_value_acc(value, Acc::bx(ins.base.bits(1, 2)))
            }
            SubBxAx => self.sub_acc(Acc::bx(ins.base.bits(0, 1)), Acc::ax(ins.base.bits(1, 2))),
            SubAbBx => self.sub_acc(Acc::ab(ins.base.bits(0, 2)), Acc::bx(ins.base.bits(2, 3))),
            SubPxBx => {
                let value = self.product_to_bus40(ins.base.bits(0, 1) as usize);
                self.sub_value_acc(value, Acc::bx(ins.base.bits(1, 2)))
            }
            OrAxBxAx => self.or_acc(
                Acc::ax(ins.base.bits(0, 1)),
                Acc::bx(ins.base.bits(1, 2)),
                Acc::ax(ins.base.bits(2, 3)),
            ),
            OrAbAxAx => self.or_acc(
                Acc::ab(ins.base.bits(0, 2)),
                Acc::ax(ins.base.bits(2, 3)),
                Acc::ax(ins.base.bits(3, 4)),
            ),
            OrBxBxAx => self.or_acc(
                Acc::bx(ins.base.bits(0, 1)),
                Acc::bx(ins.base.bits(1, 2)),
                Acc::ax(ins.base.bits(2, 3)),
            ),
            AndAbAbAx => self.and_acc(
                Acc::ab(ins.base.bits(0, 2)),
                Acc::ab(ins.base.bits(2, 4)),
                Acc::ax(ins.base.bits(4, 5)),
            ),
            ShfcAx => {
                let cond = Cond::new(ins.base.bits(0, 4));
                if self.regs.condition_pass(cond) {
                    let value = self.get_acc(Acc::ab(ins.base.bits(4, 6)));
                    self.shift_bus40(value, self.regs.sv, Acc::ax(ins.base.bits(6, 7)));
                }
                Ok(())
            }
            ShfcBx => {
                let cond = Cond::new(ins.base.bits(0, 4));
                if self.regs.condition_pass(cond) {
                    let value = self.get_acc(Acc::ab(ins.base.bits(4, 6)));
                    self.shift_bus40(value, self.regs.sv, Acc::bx(ins.base.bits(6, 7)));
                }
                Ok(())
            }
            MovrRegAx => self.movr_reg(ins),
            MsuRnImm16 => self.msu_rn_imm16(ins),
            MovsRegAb => {
                let value = self.reg_to_bus16(RegName::new(ins.base.bits(0, 5)), false)?;
                self.shift_bus40(
                    sext16(value as u64),
                    self.regs.sv,
                    Acc::ab(ins.base.bits(5, 7)),
                );
                Ok(())
            }
            Max2VtrAx => {
                let a = Acc::ax(ins.base.bits(0, 1));
                self.min_max_vtr(a, a.counterpart(), false)
            }
            Min2VtrAx => {
                let a = Acc::ax(ins.base.bits(0, 1));
                self.min_max_vtr(a, a.counterpart(), true)
            }
            Max2VtrAxBx => self.min_max_vtr(
                Acc::ax(ins.base.bits(0, 1)),
                Acc::bx(ins.base.bits(1, 2)),
                false,
            ),
            Min2VtrAxBx => self.min_max_vtr(
                Acc::ax(ins.base.bits(0, 1)),
                Acc::bx(ins.base.bits(1, 2)),
                true,
            ),
            PopArArpSttMod => {
                let value = self.pop_word();
                self.ararpsttmod_from_bus16(
                    crate::ins::ArArpSttMod::new(ins.base.bits(0, 4)),
                    value,
                )
            }
            PushArArpSttMod => {
                let value = self
                    .ararpsttmod_to_bus16(crate::ins::ArArpSttMod::new(ins.base.bits(0, 4)))?;
                self.push_word(value)
            }
            Max2VtrMovlAxBx | Max2VtrMovhAxBx | Max2VtrMovlBxAx | Max2VtrMovhBxAx
            | Min2VtrMovlAxBx | Min2VtrMovhAxBx | Min2VtrMovlBxAx | Min2VtrMovhBxAx => {
                self.min_max_vtr_mov(opcode, ins)
            }
            Max2VtrMovij => self.min_max_vtr_movij(ins, false, false),
            Max2VtrMovji => self.min_max_vtr_movij(ins, false, true),
            Min2VtrMovij => self.min_max_vtr_movij(ins, true, false),
            Min2VtrMovji => self.min_max_vtr_movij(ins, true, true),
            Mov2AxhMY0M => self.mov2_axh_y0(ins),
            MovAblSttMod => {
                let value = self.abl_to_bus16(Acc::ab(ins.base.bits(0, 2)));
                self.sttmod_from_bus16(SttMod::new(ins.base.bits(2, 5)), value)
            }
            AddP0P1 => self.psum(ins, SumBase::Zero, P_ADD, P_ADD),
            AddP0P1a => self.psum(ins, SumBase::Zero, P_ADD, P_ADDA),
            Add3P0P1 => self.psum(ins, SumBase::Acc, P_ADD, P_ADD),
            Add3P0P1a => self.psum(ins, SumBase::Acc, P_ADD, P_ADDA),
            Add3P0aP1a => self.psum(ins, SumBase::Acc, P_ADDA, P_ADDA),
            SubP0P1 => self.psum(ins, SumBase::Zero, P_ADD, P_SUB),
            SubP0P1a => self.psum(ins, SumBase::Zero, P_ADD, P_SUBA),
            Sub3P0P1 => self.psum(ins, SumBase::Acc, P_SUB, P_SUB),
            Sub3P0P1a => self.psum(ins, SumBase::Acc, P_SUB, P_SUBA),
            Sub3P0aP1a => self.psum(ins, SumBase::Acc, P_SUBA, P_SUBA),
            AddsubP0P1 => self.psum(ins, SumBase::Acc, P_ADD, P_SUB),
            AddsubP1P0 => self.psum(ins, SumBase::Acc, P_SUB, P_ADD),
            AddsubP0P1a => self.psum(ins, SumBase::Acc, P_ADD, P_SUBA),
            AddsubP1aP0 => self.psum(ins, SumBase::Acc, P_SUB, P_ADDA),
            MovrBxAx => {
                let value = self.get_acc(Acc::bx(ins.base.bits(0, 1)));
                let result = self.add_sub(value, 0x8000, false);
                self.set_acc(Acc::ax(ins.base.bits(1, 2)), result);
                Ok(())
            }
            Mov2AbhM => self.mov2_abh(ins),
            MulY0Reg => self.mul_y0_reg(ins),
            Mma => self.mma_reg(ins),
            MmaArp => self.mma_arp(ins),
            MmaMyMy => self.mma_my_my(ins),
            MmaMxXy => self.mma_x_swap(ins, false),
            MmaXyMx => self.mma_x_swap(ins, true),
            MmaMovArRn2 => self.mma_mov_counterpart(ins),
            MmaMovAxhBxh => self.mma_mov_pair(ins),

            Undefined => Err(self.undefined()),
        }
    }

    // ----- operand plumbing -----

    pub(crate) fn mem_imm8(&self, imm: u16) -> u16 {
        imm.wrapping_add(self.regs.page << 8)
    }

    pub(crate) fn mem_r7_imm7s(&self, imm: u16) -> u16 {
        (crate::alu::sext(imm as u64, 7) as u16).wrapping_add(self.regs.r[7])
    }

    pub(crate) fn rn_step_address(&mut self, ins: Ins) -> u16 {
        let unit = ins.base.bits(2, 5) as usize;
        let step = step_zids(ins.base.bits(0, 2));
        self.rn_address_and_modify(unit, step, false)
    }

    pub(crate) fn ar_rn1_step1_address(&mut self, arrn: u16, arstep: u16) -> u16 {
        let unit = self.ar_rn_unit(arrn);
        let step = self.ar_step(arstep);
        self.rn_address_and_modify(unit, step, false)
    }

    pub(crate) fn axl_to_bus16(&mut self, acc: Acc) -> u16 {
        let value = self.get_acc(acc);
        (self.saturate_acc(value, false) & 0xFFFF) as u16
    }

    pub(crate) fn abl_to_bus16(&mut self, acc: Acc) -> u16 {
        self.axl_to_bus16(acc)
    }

    pub(crate) fn ablh_to_bus16(&mut self, acc: Acc, part: crate::ins::Part) -> u16 {
        let value = self.get_acc(acc);
        let value = self.saturate_acc(value, false);
        match part {
            crate::ins::Part::Low => (value & 0xFFFF) as u16,
            crate::ins::Part::High => ((value >> 16) & 0xFFFF) as u16,
        }
    }

    pub(crate) fn set_abl(&mut self, acc: Acc, value: u16) -> Result<(), Fault> {
        self.set_acc(acc, value as u64);
        Ok(())
    }

    fn reg_from_bus16_ab(&mut self, ins: Ins, value: u16) -> Result<(), Fault> {
        let acc = Acc::ab(ins.base.bits(0, 2));
        self.set_acc(acc, sext16(value as u64));
        Ok(())
    }

    /// Reads a named 16-bit bus register. `saturating_mov` enables the
    /// accumulator saturation of plain move paths.
    pub(crate) fn reg_to_bus16(
        &mut self,
        reg: RegName,
        saturating_mov: bool,
    ) -> Result<u16, Fault> {
        Ok(match reg {
            RegName::R0 => self.regs.r[0],
            RegName::R1 => self.regs.r[1],
            RegName::R2 => self.regs.r[2],
            RegName::R3 => self.regs.r[3],
            RegName::R4 => self.regs.r[4],
            RegName::R5 => self.regs.r[5],
            RegName::R6 => self.regs.r[6],
            RegName::R7 => self.regs.r[7],
            RegName::X0 => self.regs.x[0],
            RegName::X1 => self.regs.x[1],
            RegName::Y0 => self.regs.y[0],
            RegName::Y1 => self.regs.y[1],
            // whole-accumulator names read the low half without saturation
            RegName::A0 => self.get_acc(Acc::A0) as u16,
            RegName::A1 => self.get_acc(Acc::A1) as u16,
            RegName::B0 => self.get_acc(Acc::B0) as u16,
            RegName::B1 => self.get_acc(Acc::B1) as u16,
            RegName::Sp => self.regs.sp,
            RegName::Sv => self.regs.sv,
            RegName::Lc => self.regs.lc(),
            RegName::P => (self.product_to_bus40(0) >> 16) as u16,
            RegName::Pc => return Err(self.undefined()),
            RegName::A0h | RegName::A1h | RegName::B0h | RegName::B1h => {
                let acc = match reg {
                    RegName::A0h => Acc::A0,
                    RegName::A1h => Acc::A1,
                    RegName::B0h => Acc::B0,
                    _ => Acc::B1,
                };
                let value = self.get_acc(acc);
                if saturating_mov {
                    ((self.saturate_acc(value, false) >> 16) & 0xFFFF) as u16
                } else {
                    ((value >> 16) & 0xFFFF) as u16
                }
            }
            RegName::St0 => self.regs.st0(),
            RegName::St1 => self.regs.st1(),
            RegName::St2 => self.regs.st2(),
            RegName::Cfgi => self.regs.cfgi(),
            RegName::Cfgj => self.regs.cfgj(),
            RegName::Reserved0 | RegName::Reserved1 => return Err(self.undefined()),
        })
    }

    /// Writes a named 16-bit bus register, with the usual widening rules for
    /// accumulator destinations.
    pub(crate) fn reg_from_bus16(&mut self, reg: RegName, value: u16) -> Result<(), Fault> {
        match reg {
            RegName::R0 => self.regs.r[0] = value,
            RegName::R1 => self.regs.r[1] = value,
            RegName::R2 => self.regs.r[2] = value,
            RegName::R3 => self.regs.r[3] = value,
            RegName::R4 => self.regs.r[4] = value,
            RegName::R5 => self.regs.r[5] = value,
            RegName::R6 => self.regs.r[6] = value,
            RegName::R7 => self.regs.r[7] = value,
            RegName::X0 => self.regs.x[0] = value,
            RegName::X1 => self.regs.x[1] = value,
            RegName::Y0 => self.regs.y[0] = value,
            RegName::Y1 => self.regs.y[1] = value,
            RegName::A0 => self.set_acc(Acc::A0, sext16(value as u64)),
            RegName::A1 => self.set_acc(Acc::A1, sext16(value as u64)),
            RegName::B0 => self.set_acc(Acc::B0, sext16(value as u64)),
            RegName::B1 => self.set_acc(Acc::B1, sext16(value as u64)),
            RegName::Sp => self.regs.sp = value,
            RegName::Sv => self.regs.sv = value,
            RegName::Lc => self.regs.set_lc(value),
            RegName::P => {
                self.regs.psign[0] = (value > 0x7FFF) as u16;
                self.regs.p[0] = (self.regs.p[0] & 0xFFFF) | ((value as u32) << 16);
            }
            RegName::Pc => return Err(self.undefined()),
            RegName::A0h => self.set_acc(Acc::A0, sext32((value as u64) << 16)),
            RegName::A1h => self.set_acc(Acc::A1, sext32((value as u64) << 16)),
            RegName::B0h => self.set_acc(Acc::B0, sext32((value as u64) << 16)),
            RegName::B1h => self.set_acc(Acc::B1, sext32((value as u64) << 16)),
            RegName::St0 => self.regs.set_st0(value),
            RegName::St1 => self.regs.set_st1(value),
            RegName::St2 => self.regs.set_st2(value),
            RegName::Cfgi => self.regs.set_cfgi(value),
            RegName::Cfgj => self.regs.set_cfgj(value),
            RegName::Reserved0 | RegName::Reserved1 => return Err(self.undefined()),
        }
        Ok(())
    }

    pub(crate) fn sttmod_to_bus16(&mut self, reg: SttMod) -> Result<u16, Fault> {
        Ok(match reg {
            SttMod::Stt0 => self.regs.stt0(),
            SttMod::Stt1 => self.regs.stt1(),
            SttMod::Stt2 => self.regs.stt2(),
            SttMod::Mod0 => self.regs.mod0(),
            SttMod::Mod1 => self.regs.mod1(),
            SttMod::Mod2 => self.regs.mod2(),
            SttMod::Mod3 => self.regs.mod3(),
            SttMod::Reserved => return Err(self.undefined()),
        })
    }

    pub(crate) fn sttmod_from_bus16(&mut self, reg: SttMod, value: u16) -> Result<(), Fault> {
        match reg {
            SttMod::Stt0 => self.regs.set_stt0(value),
            SttMod::Stt1 => self.regs.set_stt1(value),
            SttMod::Stt2 => self.regs.set_stt2(value),
            SttMod::Mod0 => self.regs.set_mod0(value),
            SttMod::Mod1 => self.regs.set_mod1(value),
            SttMod::Mod2 => self.regs.set_mod2(value),
            SttMod::Mod3 => self.regs.set_mod3(value),
            SttMod::Reserved => return Err(self.undefined()),
        }
        Ok(())
    }

    pub(crate) fn ararp_to_bus16(&mut self, reg: crate::ins::ArArp) -> Result<u16, Fault> {
        use crate::ins::ArArp;
        Ok(match reg {
            ArArp::Ar0 => self.regs.ar(0),
            ArArp::Ar1 => self.regs.ar(1),
            ArArp::Arp0 => self.regs.arp(0),
            ArArp::Arp1 => self.regs.arp(1),
            ArArp::Arp2 => self.regs.arp(2),
            ArArp::Arp3 => self.regs.arp(3),
            ArArp::Reserved0 | ArArp::Reserved1 => return Err(self.undefined()),
        })
    }

    pub(crate) fn ararp_from_bus16(
        &mut self,
        reg: crate::ins::ArArp,
        value: u16,
    ) -> Result<(), Fault> {
        use crate::ins::ArArp;
        match reg {
            ArArp::Ar0 => self.regs.set_ar(0, value),
            ArArp::Ar1 => self.regs.set_ar(1, value),
            ArArp::Arp0 => self.regs.set_arp(0, value),
            ArArp::Arp1 => self.regs.set_arp(1, value),
            ArArp::Arp2 => self.regs.set_arp(2, value),
            ArArp::Arp3 => self.regs.set_arp(3, value),
            ArArp::Reserved0 | ArArp::Reserved1 => return Err(self.undefined()),
        }
        Ok(())
    }

    pub(crate) fn ararpsttmod_to_bus16(
        &mut self,
        reg: crate::ins::ArArpSttMod,
    ) -> Result<u16, Fault> {
        use crate::ins::ArArpSttMod as R;
        Ok(match reg {
            R::Ar0 => self.regs.ar(0),
            R::Ar1 => self.regs.ar(1),
            R::Arp0 => self.regs.arp(0),
            R::Arp1 => self.regs.arp(1),
            R::Arp2 => self.regs.arp(2),
            R::Arp3 => self.regs.arp(3),
            R::Stt0 => self.regs.stt0(),
            R::Stt1 => self.regs.stt1(),
            R::Stt2 => self.regs.stt2(),
            R::Mod0 => self.regs.mod0(),
            R::Mod1 => self.regs.mod1(),
            R::Mod2 => self.regs.mod2(),
            R::Mod3 => self.regs.mod3(),
            R::Reserved0 | R::Reserved1 | R::Reserved2 => return Err(self.undefined()),
        })
    }

    pub(crate) fn ararpsttmod_from_bus16(
        &mut self,
        reg: crate::ins::ArArpSttMod,
        value: u16,
    ) -> Result<(), Fault> {
        use crate::ins::ArArpSttMod as R;
        match reg {
            R::Ar0 => self.regs.set_ar(0, value),
            R::Ar1 => self.regs.set_ar(1, value),
            R::Arp0 => self.regs.set_arp(0, value),
            R::Arp1 => self.regs.set_arp(1, value),
            R::Arp2 => self.regs.set_arp(2, value),
            R::Arp3 => self.regs.set_arp(3, value),
            R::Stt0 => self.regs.set_stt0(value),
            R::Stt1 => self.regs.set_stt1(value),
            R::Stt2 => self.regs.set_stt2(value),
            R::Mod0 => self.regs.set_mod0(value),
            R::Mod1 => self.regs.set_mod1(value),
            R::Mod2 => self.regs.set_mod2(value),
            R::Mod3 => self.regs.set_mod3(value),
            R::Reserved0 | R::Reserved1 | R::Reserved2 => return Err(self.undefined()),
        }
        Ok(())
    }

    // ----- generic ALU families -----

    /// Widens a 16-bit operand per the op's extension rule.
    pub(crate) fn extend_for_alm(&self, op: AlmOp, value: u16) -> u64 {
        match op {
            AlmOp::Cmp | AlmOp::Sub | AlmOp::Add => sext16(value as u64),
            AlmOp::Addh | AlmOp::Subh => sext32((value as u64) << 16),
            _ => value as u64,
        }
    }

    pub(crate) fn alm_generic(&mut self, op: AlmOp, a: u64, b: Acc) -> Result<(), Fault> {
        match op {
            AlmOp::Or => {
                let value = sext40(self.get_acc(b) | a);
                self.set_acc_no_sat(b, value);
            }
            AlmOp::And => {
                let value = sext40(self.get_acc(b) & a);
                self.set_acc_no_sat(b, value);
            }
            AlmOp::Xor => {
                let value = sext40(self.get_acc(b) ^ a);
                self.set_acc_no_sat(b, value);
            }
            AlmOp::Tst0 => {
                let value = self.get_acc(b) & 0xFFFF;
                self.regs.flags.z = (value & a) == 0;
            }
            AlmOp::Tst1 => {
                let value = self.get_acc(b) & 0xFFFF;
                self.regs.flags.z = (value & !a) == 0;
            }
            AlmOp::Cmp
            | AlmOp::Cmpu
            | AlmOp::Sub
            | AlmOp::Subl
            | AlmOp::Subh
            | AlmOp::Add
            | AlmOp::Addl
            | AlmOp::Addh => {
                let value = self.get_acc(b);
                let sub = !matches!(op, AlmOp::Add | AlmOp::Addl | AlmOp::Addh);
                let result = self.add_sub(value, a, sub);
                if matches!(op, AlmOp::Cmp | AlmOp::Cmpu) {
                    self.set_acc_flags(result);
                } else {
                    self.set_acc(b, result);
                }
            }
            AlmOp::Msu => {
                let value = self.get_acc(b);
                let product = self.product_to_bus40(0);
                let result = self.add_sub(value, product, true);
                self.set_acc(b, result);

                self.regs.x[0] = (a & 0xFFFF) as u16;
                self.do_multiplication(0, true, true);
            }
            AlmOp::Sqra => {
                let value = self.get_acc(b);
                let product = self.product_to_bus40(0);
                let result = self.add_sub(value, product, false);
                self.set_acc(b, result);

                self.regs.x[0] = (a & 0xFFFF) as u16;
                self.regs.y[0] = self.regs.x[0];
                self.do_multiplication(0, true, true);
            }
            AlmOp::Sqr => {
                self.regs.x[0] = (a & 0xFFFF) as u16;
                self.regs.y[0] = self.regs.x[0];
                self.do_multiplication(0, true, true);
            }
        }
        Ok(())
    }

    fn alm_reg(&mut self, ins: Ins) -> Result<(), Fault> {
        let op = AlmOp::new(ins.base.bits(5, 9));
        let reg = RegName::new(ins.base.bits(0, 5));
        let b = Acc::ax(ins.base.bits(9, 10));
        let bus40_allowed = matches!(
            op,
            AlmOp::Or | AlmOp::And | AlmOp::Xor | AlmOp::Add | AlmOp::Cmp | AlmOp::Sub
        );
        let value = match reg {
            RegName::P => {
                if !bus40_allowed {
                    return Err(self.undefined());
                }
                self.product_to_bus40(0)
            }
            RegName::A0 | RegName::A1 => {
                if !bus40_allowed {
                    return Err(self.undefined());
                }
                self.get_acc(if reg == RegName::A0 { Acc::A0 } else { Acc::A1 })
            }
            _ => {
                let raw = self.reg_to_bus16(reg, false)?;
                self.extend_for_alm(op, raw)
            }
        };
        self.alm_generic(op, value, b)
    }

    fn alu_imm8(&mut self, ins: Ins) -> Result<(), Fault> {
        let op = AlmOp::from_alu(ins.base.bits(9, 12));
        let b = Acc::ax(ins.base.bits(8, 9));
        let value = ins.base.bits(0, 8);
        // bits 8..15 of the accumulator are unaffected, but flags are set as
        // if they were
        let backup = if op == AlmOp::And {
            Some(self.get_acc(b) & 0xFF00)
        } else {
            None
        };
        let extended = self.extend_for_alm(op, value);
        self.alm_generic(op, extended, b)?;
        if let Some(backup) = backup {
            let new = self.get_acc(b) & 0xFFFF_FFFF_FFFF_00FF;
            self.set_acc_raw(b, backup | new);
        }
        Ok(())
    }

    fn generic_alb(&mut self, op: AlbOp, a: u16, b: u16) -> u16 {
        let result = match op {
            AlbOp::Set => {
                let result = a | b;
                self.regs.flags.m = result >> 15 != 0;
                result
            }
            AlbOp::Rst => {
                let result = !a & b;
                self.regs.flags.m = result >> 15 != 0;
                result
            }
            AlbOp::Chng => {
                let result = a ^ b;
                self.regs.flags.m = result >> 15 != 0;
                result
            }
            AlbOp::Addv => {
                let r = a as u32 + b as u32;
                self.regs.flags.c[0] = (r >> 16) != 0;
                self.regs.flags.m =
                    (sext16(b as u64) as u32).wrapping_add(sext16(a as u64) as u32) >> 31 != 0;
                (r & 0xFFFF) as u16
            }
            AlbOp::Tst0 => ((a & b) != 0) as u16,
            AlbOp::Tst1 => ((a & !b) != 0) as u16,
            AlbOp::Cmpv | AlbOp::Subv => {
                let r = (b as u32).wrapping_sub(a as u32);
                self.regs.flags.c[0] = (r >> 16) != 0;
                self.regs.flags.m =
                    (sext16(b as u64) as u32).wrapping_sub(sext16(a as u64) as u32) >> 31 != 0;
                (r & 0xFFFF) as u16
            }
        };
        self.regs.flags.z = result == 0;
        result
    }

    fn alb_mem(&mut self, ins: Ins) -> Result<(), Fault> {
        let op = AlbOp::new(ins.base.bits(8, 11));
        let address = self.mem_imm8(ins.base.bits(0, 8));
        let bv = self.bus.data_read(address);
        let result = self.generic_alb(op, ins.expansion, bv);
        if op.modifies() {
            self.bus.data_write(address, result);
        }
        Ok(())
    }

    fn alb_rn(&mut self, ins: Ins) -> Result<(), Fault> {
        let op = AlbOp::new(ins.base.bits(5, 7) | (ins.base.bit(8) as u16) << 2);
        let unit = ins.base.bits(2, 5) as usize;
        let step = step_zids(ins.base.bits(0, 2));
        let address = self.rn_address_and_modify(unit, step, false);
        let bv = self.bus.data_read(address);
        let result = self.generic_alb(op, ins.expansion, bv);
        if op.modifies() {
            self.bus.data_write(address, result);
        }
        Ok(())
    }

    fn alb_r6(&mut self, ins: Ins) -> Result<(), Fault> {
        let op = AlbOp::new(ins.base.bits(0, 3));
        let bv = self.regs.r[6];
        let result = self.generic_alb(op, ins.expansion, bv);
        if op.modifies() {
            self.regs.r[6] = result;
        }
        Ok(())
    }

    fn alb_reg(&mut self, ins: Ins) -> Result<(), Fault> {
        let op = AlbOp::new(ins.base.bits(4, 7));
        let reg = AlbRegName::new(ins.base.bits(0, 4));
        let bv = match reg {
            AlbRegName::A0l | AlbRegName::A1l | AlbRegName::B0l | AlbRegName::B1l => {
                (self.get_acc(Acc::ab(ins.base.bits(0, 2))) & 0xFFFF) as u16
            }
            AlbRegName::A0h | AlbRegName::A1h | AlbRegName::B0h | AlbRegName::B1h => {
                ((self.get_acc(Acc::ab(ins.base.bits(0, 2))) >> 16) & 0xFFFF) as u16
            }
            AlbRegName::P => (self.product_to_bus40(0) >> 16) as u16,
            AlbRegName::Stt0 => self.regs.stt0(),
            AlbRegName::Stt1 => self.regs.stt1(),
            AlbRegName::Stt2 => self.regs.stt2(),
            AlbRegName::Mod0 => self.regs.mod0(),
            AlbRegName::Mod1 => self.regs.mod1(),
            AlbRegName::Mod2 => self.regs.mod2(),
            AlbRegName::Mod3 => self.regs.mod3(),
        };
        let result = self.generic_alb(op, ins.expansion, bv);
        if op.modifies() {
            // accumulator lanes are spliced directly, skipping the bus with
            // its flags and saturation
            let acc = Acc::ab(ins.base.bits(0, 2));
            match reg {
                AlbRegName::A0l | AlbRegName::A1l | AlbRegName::B0l | AlbRegName::B1l => {
                    let value = (self.get_acc(acc) & 0xFFFF_FFFF_FFFF_0000) | result as u64;
                    self.set_acc_raw(acc, value);
                }
                AlbRegName::A0h | AlbRegName::A1h | AlbRegName::B0h | AlbRegName::B1h => {
                    let value =
                        (self.get_acc(acc) & 0xFFFF_FFFF_0000_FFFF) | ((result as u64) << 16);
                    self.set_acc_raw(acc, value);
                }
                AlbRegName::P => self.reg_from_bus16(RegName::P, result)?,
                AlbRegName::Stt0 => self.regs.set_stt0(result),
                AlbRegName::Stt1 => self.regs.set_stt1(result),
                AlbRegName::Stt2 => self.regs.set_stt2(result),
                AlbRegName::Mod0 => self.regs.set_mod0(result),
                AlbRegName::Mod1 => self.regs.set_mod1(result),
                AlbRegName::Mod2 => self.regs.set_mod2(result),
                AlbRegName::Mod3 => self.regs.set_mod3(result),
            }
        }
        Ok(())
    }

    // ----- accumulator-accumulator ops -----

    fn add_acc(&mut self, a: Acc, b: Acc) -> Result<(), Fault> {
        let value_a = self.get_acc(a);
        self.add_value_acc(value_a, b)
    }

    pub(crate) fn add_value_acc(&mut self, value: u64, b: Acc) -> Result<(), Fault> {
        let value_b = self.get_acc(b);
        let result = self.add_sub(value_b, value, false);
        self.set_acc(b, result);
        Ok(())
    }

    fn sub_acc(&mut self, a: Acc, b: Acc) -> Result<(), Fault> {
        let value_a = self.get_acc(a);
        self.sub_value_acc(value_a, b)
    }

    pub(crate) fn sub_value_acc(&mut self, value: u64, b: Acc) -> Result<(), Fault> {
        let value_b = self.get_acc(b);
        let result = self.add_sub(value_b, value, true);
        self.set_acc(b, result);
        Ok(())
    }

    fn or_acc(&mut self, a: Acc, b: Acc, c: Acc) -> Result<(), Fault> {
        let value = sext40(self.get_acc(a) | self.get_acc(b));
        self.set_acc_no_sat(c, value);
        Ok(())
    }

    fn and_acc(&mut self, a: Acc, b: Acc, c: Acc) -> Result<(), Fault> {
        let value = sext40(self.get_acc(a) & self.get_acc(b));
        self.set_acc_no_sat(c, value);
        Ok(())
    }

    fn cmp_acc(&mut self, a: Acc, b: Acc) -> Result<(), Fault> {
        let va = self.get_acc(a);
        let vb = self.get_acc(b);
        let result = self.add_sub(vb, va, true);
        self.set_acc_flags(result);
        Ok(())
    }

    fn psum(
        &mut self,
        ins: Ins,
        base: SumBase,
        p0: crate::alu::ProductTerm,
        p1: crate::alu::ProductTerm,
    ) -> Result<(), Fault> {
        self.product_sum(base, Acc::ab(ins.base.bits(0, 2)), p0, p1);
        Ok(())
    }

    // ----- conditional accumulator ops -----

    pub(crate) fn moda(&mut self, op: ModaOp, acc: Acc, cond: Cond) -> Result<(), Fault> {
        if !self.regs.condition_pass(cond) {
            return Ok(());
        }
        match op {
            ModaOp::Shr => {
                let value = self.get_acc(acc);
                self.shift_bus40(value, 0xFFFF, acc);
            }
            ModaOp::Shr4 => {
                let value = self.get_acc(acc);
                self.shift_bus40(value, 0xFFFC, acc);
            }
            ModaOp::Shl => {
                let value = self.get_acc(acc);
                self.shift_bus40(value, 1, acc);
            }
            ModaOp::Shl4 => {
                let value = self.get_acc(acc);
                self.shift_bus40(value, 4, acc);
            }
            ModaOp::Ror => {
                let mut value = self.get_acc(acc) & crate::alu::MASK40;
                let old_c = self.regs.flags.c[0];
                self.regs.flags.c[0] = value & 1 != 0;
                value >>= 1;
                value |= (old_c as u64) << 39;
                self.set_acc_no_sat(acc, sext40(value));
            }
            ModaOp::Rol => {
                let mut value = self.get_acc(acc);
                let old_c = self.regs.flags.c[0];
                self.regs.flags.c[0] = (value >> 39) & 1 != 0;
                value <<= 1;
                value |= old_c as u64;
                self.set_acc_no_sat(acc, sext40(value));
            }
            ModaOp::Clr => self.set_acc(acc, 0),
            ModaOp::Not => {
                let result = sext40(!self.get_acc(acc));
                self.set_acc_no_sat(acc, result);
            }
            ModaOp::Neg => {
                let value = self.get_acc(acc);
                self.regs.flags.c[0] = value != 0;
                self.regs.flags.update_v(value == 0xFFFF_FF80_0000_0000);
                let result = sext40((!value).wrapping_add(1));
                self.set_acc(acc, result);
            }
            ModaOp::Rnd => {
                let value = self.get_acc(acc);
                let result = self.add_sub(value, 0x8000, false);
                self.set_acc(acc, result);
            }
            ModaOp::Pacr => {
                let value = self.product_to_bus40(0);
                let result = self.add_sub(value, 0x8000, false);
                self.set_acc(acc, result);
            }
            ModaOp::Clrr => self.set_acc(acc, 0x8000),
            ModaOp::Inc => {
                let value = self.get_acc(acc);
                let result = self.add_sub(value, 1, false);
                self.set_acc(acc, result);
            }
            ModaOp::Dec => {
                let value = self.get_acc(acc);
                let result = self.add_sub(value, 1, true);
                self.set_acc(acc, result);
            }
            ModaOp::Copy => {
                // note: the b accumulators do not encode this one
                let value = self.get_acc(if acc == Acc::A0 { Acc::A1 } else { Acc::A0 });
                self.set_acc(acc, value);
            }
            ModaOp::Reserved => return Err(self.undefined()),
        }
        Ok(())
    }

    pub(crate) fn pacr1(&mut self, acc: Acc) -> Result<(), Fault> {
        let value = self.product_to_bus40(1);
        let result = self.add_sub(value, 0x8000, false);
        self.set_acc(acc, result);
        Ok(())
    }

    fn clr_pair(&mut self, ins: Ins, round: bool) -> Result<(), Fault> {
        let a = ins.base.bits(0, 2);
        let mut b = ins.base.bits(2, 4);
        // the second operand is steered away from the first
        if a == 0 {
            b = 1;
        } else if a == 1 {
            b = 0;
        } else if a == 2 {
            if b == 2 {
                b = 3;
            }
        } else {
            b = if b == 1 { 1 } else { 0 };
        }
        let value = if round { 0x8000 } else { 0 };
        self.set_acc(Acc::ab(a), value);
        self.set_acc(Acc::ab(b), value);
        Ok(())
    }

    fn swap(&mut self, field: u16) -> Result<(), Fault> {
        use crate::ins::SwapType::*;

        let swap = crate::ins::SwapType::new(field);
        let (s0, d0, s1, d1) = match swap {
            A0B0 => (Acc::A0, Acc::B0, Acc::B0, Acc::A0),
            A0B1 => (Acc::A0, Acc::B1, Acc::B1, Acc::A0),
            A1B0 => (Acc::A1, Acc::B0, Acc::B0, Acc::A1),
            A1B1 => (Acc::A1, Acc::B1, Acc::B1, Acc::A1),
            A0B0A1B1 => {
                let u = self.get_acc(Acc::A1);
                let v = self.get_acc(Acc::B1);
                self.set_acc(Acc::A1, v);
                self.set_acc(Acc::B1, u);
                (Acc::A0, Acc::B0, Acc::B0, Acc::A0)
            }
            A0B1A1B0 => {
                let u = self.get_acc(Acc::A1);
                let v = self.get_acc(Acc::B0);
                self.set_acc(Acc::A1, v);
                self.set_acc(Acc::B0, u);
                (Acc::A0, Acc::B1, Acc::B1, Acc::A0)
            }
            A0B0A1 => (Acc::A0, Acc::B0, Acc::B0, Acc::A1),
            A0B1A1 => (Acc::A0, Acc::B1, Acc::B1, Acc::A1),
            A1B0A0 => (Acc::A1, Acc::B0, Acc::B0, Acc::A0),
            A1B1A0 => (Acc::A1, Acc::B1, Acc::B1, Acc::A0),
            B0A0B1 => (Acc::A0, Acc::B0, Acc::B0, Acc::B1),
            B0A1B1 => (Acc::A1, Acc::B0, Acc::B0, Acc::B1),
            B1A0B0 => (Acc::A0, Acc::B1, Acc::B1, Acc::B0),
            B1A1B0 => (Acc::A1, Acc::B1, Acc::B1, Acc::B0),
            Reserved0 | Reserved1 => return Err(self.undefined()),
        };
        let u = self.get_acc(s0);
        let v = self.get_acc(s1);
        self.set_acc(d0, u);
        // only the second transfer drives the flags
        self.set_acc(d1, v);
        Ok(())
    }

    fn norm(&mut self, ins: Ins) -> Result<(), Fault> {
        if !self.regs.flags.n {
            let acc = Acc::ax(ins.base.bits(5, 6));
            let value = self.get_acc(acc);
            let overflow = value != crate::alu::sext(value, 39);
            self.regs.flags.update_v(overflow);
            let value = value << 1;
            self.regs.flags.c[0] = value & (1 << 40) != 0;
            let value = sext40(value);
            self.set_acc_no_sat(acc, value);
            let unit = ins.base.bits(2, 5) as usize;
            self.rn_and_modify(unit, step_zids(ins.base.bits(0, 2)), false);
            self.regs.flags.r = self.regs.r[unit] == 0;
        }
        Ok(())
    }

    fn divs(&mut self, ins: Ins) -> Result<(), Fault> {
        let da = self.bus.data_read(self.mem_imm8(ins.base.bits(0, 8)));
        let acc = Acc::ax(ins.base.bits(8, 9));
        let db = self.get_acc(acc);
        let value = db.wrapping_sub((da as u64) << 15);
        if value >> 63 != 0 {
            self.set_acc_no_sat(acc, sext40(db << 1));
        } else {
            self.set_acc_no_sat(acc, sext40((value << 1).wrapping_add(1)));
        }
        Ok(())
    }

    fn tst4b(&mut self, ins: Ins, with_shift: bool) -> Result<(), Fault> {
        if with_shift {
            let a = self.get_acc(Acc::A0);
            let bit = a & 0xF;
            let saved = self.regs.flags;
            let sv = self.regs.sv;
            self.shift_bus40(a, sv, Acc::ax(ins.base.bits(4, 5)));
            self.regs.flags.c[1] = self.regs.flags.c[0];
            self.regs.flags.v = saved.v;
            self.regs.flags.lv = saved.lv;
            self.regs.flags.m = saved.m;
            self.regs.flags.n = saved.n;
            self.regs.flags.e = saved.e;
            let unit = self.ar_rn_unit(ins.base.bits(2, 4));
            let step = self.ar_step(ins.base.bits(0, 2));
            let address = self.rn_address_and_modify(unit, step, false);
            let value = self.bus.data_read(address);
            let hit = (value >> bit) & 1 != 0;
            self.regs.flags.z = hit;
            self.regs.flags.c[0] = hit;
        } else {
            let unit = self.ar_rn_unit(ins.base.bits(2, 4));
            let step = self.ar_step(ins.base.bits(0, 2));
            let address = self.rn_address_and_modify(unit, step, false);
            let value = self.bus.data_read(address);
            let bit = self.get_acc(Acc::A0) & 0xF;
            let hit = (value >> bit) & 1 != 0;
            self.regs.flags.z = hit;
            self.regs.flags.c[0] = hit;
        }
        Ok(())
    }

    // ----- exponent probes -----

    pub(crate) fn exp_store(&mut self, acc: Acc) {
        let value = sext16(self.regs.sv as u64);
        self.set_acc_raw(acc, value);
    }

    pub(crate) fn exp_r6(&mut self) {
        let value = sext32((self.regs.r[6] as u64) << 16);
        self.regs.sv = crate::alu::exponent(value);
    }

    fn exp_rn(&mut self, ins: Ins) {
        let address = self.rn_step_address(ins);
        let value = sext32((self.bus.data_read(address) as u64) << 16);
        self.regs.sv = crate::alu::exponent(value);
    }

    fn exp_register(&mut self, reg: RegName) -> Result<(), Fault> {
        let value = match reg {
            RegName::A0 => self.get_acc(Acc::A0),
            RegName::A1 => self.get_acc(Acc::A1),
            // p follows the usual 16-bit bus rule here
            _ => sext32((self.reg_to_bus16(reg, false)? as u64) << 16),
        };
        self.regs.sv = crate::alu::exponent(value);
        Ok(())
    }

    // ----- helpers shared with the move family -----

    /// Rounding move of a plain 16-bit source: 16-bit add of the rounding
    /// constant with carry from bit 16 and overflow always clear.
    pub(crate) fn movr_bus16(&mut self, value: u16, dest: Acc) -> Result<(), Fault> {
        let result = value as u64 + 0x8000;
        self.regs.flags.c[0] = result >> 16 != 0;
        self.regs.flags.v = false;
        self.set_acc(dest, result & 0xFFFF);
        Ok(())
    }

    fn movr_reg(&mut self, ins: Ins) -> Result<(), Fault> {
        let reg = RegName::new(ins.base.bits(0, 5));
        let dest = Acc::ax(ins.base.bits(5, 6));
        match reg {
            RegName::A0 | RegName::A1 => {
                let value = self.get_acc(if reg == RegName::A0 { Acc::A0 } else { Acc::A1 });
                let result = self.add_sub(value, 0x8000, false);
                self.set_acc(dest, result);
                Ok(())
            }
            RegName::P => {
                let value = self.product_to_bus40(0);
                let result = self.add_sub(value, 0x8000, false);
                self.set_acc(dest, result);
                Ok(())
            }
            _ => {
                let value = self.reg_to_bus16(reg, false)?;
                self.movr_bus16(value, dest)
            }
        }
    }

    fn mov_reg_bx(&mut self, ins: Ins) -> Result<(), Fault> {
        let reg = RegName::new(ins.base.bits(0, 5));
        let b = Acc::bx(ins.base.bits(5, 6));
        match reg {
            RegName::P => {
                let value = self.product_to_bus40(0);
                self.set_acc(b, value);
                Ok(())
            }
            RegName::A0 | RegName::A1 => {
                let value = self.get_acc(if reg == RegName::A0 { Acc::A0 } else { Acc::A1 });
                self.set_acc(b, value);
                Ok(())
            }
            _ => {
                let value = self.reg_to_bus16(reg, true)?;
                self.reg_from_bus16(
                    if b == Acc::B1 { RegName::B1 } else { RegName::B0 },
                    value,
                )
            }
        }
    }

    fn mov_reg_reg(&mut self, ins: Ins) -> Result<(), Fault> {
        let src = RegName::new(ins.base.bits(5, 10));
        let dst = RegName::new(ins.base.bits(0, 5));
        match src {
            RegName::P => {
                // the destination field collapses to an accumulator select
                let acc = if ins.base.bit(0) { Acc::A1 } else { Acc::A0 };
                let value = self.product_to_bus40(0);
                self.set_acc(acc, value);
                Ok(())
            }
            RegName::Pc => match dst {
                RegName::A0 | RegName::A1 => {
                    let pc = self.regs.pc as u64;
                    self.set_acc(if dst == RegName::A0 { Acc::A0 } else { Acc::A1 }, pc);
                    Ok(())
                }
                _ => self.reg_from_bus16(dst, self.regs.pc as u16),
            },
            _ => {
                let value = self.reg_to_bus16(src, true)?;
                self.reg_from_bus16(dst, value)
            }
        }
    }
}
