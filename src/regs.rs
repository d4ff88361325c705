//! Architectural register file.

use crate::ins::Cond;
use bitos::{
    BitUtils, bitos,
    integer::{u2, u3, u6, u7, u9},
};

/// Arithmetic flag block.
///
/// `lv` and `ls` are sticky: ALU paths may only raise them. They are cleared
/// through explicit status register writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    pub z: bool,
    pub m: bool,
    pub n: bool,
    pub v: bool,
    pub c: [bool; 2],
    pub e: bool,
    pub lv: bool,
    pub ls: bool,
    pub r: bool,
}

impl Flags {
    /// Sets `v` and folds it into the sticky `lv`.
    pub fn update_v(&mut self, v: bool) {
        self.v = v;
        self.lv |= v;
    }
}

/// One hardware loop frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopFrame {
    pub start: u32,
    pub end: u32,
    pub lc: u16,
}

/// Mode bits shadowed across an interrupt context switch.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShadowBank {
    pub flags: Flags,
    pub sar: [bool; 2],
    pub s: bool,
    pub ym: u16,
    pub page: u16,
    pub stepi: u16,
    pub stepj: u16,
    pub stepi0: u16,
    pub stepj0: u16,
    pub modi: u16,
    pub modj: u16,
}

#[bitos(16)]
#[derive(Debug, Clone, Copy)]
pub struct St0 {
    #[bits(0)]
    pub sata: bool,
    #[bits(1)]
    pub ie: bool,
    #[bits(2)]
    pub im0: bool,
    #[bits(3)]
    pub im1: bool,
    #[bits(4)]
    pub fr: bool,
    #[bits(5)]
    pub fls: bool,
    #[bits(6)]
    pub fe: bool,
    #[bits(7)]
    pub fc0: bool,
    #[bits(8)]
    pub fv: bool,
    #[bits(9)]
    pub fnorm: bool,
    #[bits(10)]
    pub fm: bool,
    #[bits(11)]
    pub fz: bool,
    #[bits(12)]
    pub flv: bool,
    #[bits(13)]
    pub fc1: bool,
}

#[bitos(16)]
#[derive(Debug, Clone, Copy)]
pub struct St1 {
    #[bits(0..8)]
    pub page: u8,
    #[bits(10..12)]
    pub ps0: u2,
}

#[bitos(16)]
#[derive(Debug, Clone, Copy)]
pub struct St2 {
    #[bits(0..6)]
    pub m: u6,
    #[bits(6)]
    pub im2: bool,
    #[bits(7)]
    pub s: bool,
    #[bits(8)]
    pub ou0: bool,
    #[bits(9)]
    pub ou1: bool,
    #[bits(10)]
    pub iu0: bool,
    #[bits(11)]
    pub iu1: bool,
    #[bits(13)]
    pub ip2: bool,
    #[bits(14)]
    pub ip0: bool,
    #[bits(15)]
    pub ip1: bool,
}

#[bitos(16)]
#[derive(Debug, Clone, Copy)]
pub struct Stt0 {
    #[bits(0)]
    pub fls: bool,
    #[bits(1)]
    pub flv: bool,
    #[bits(2)]
    pub fe: bool,
    #[bits(3)]
    pub fc0: bool,
    #[bits(4)]
    pub fv: bool,
    #[bits(5)]
    pub fnorm: bool,
    #[bits(6)]
    pub fm: bool,
    #[bits(7)]
    pub fz: bool,
    #[bits(8)]
    pub fc1: bool,
    #[bits(11)]
    pub fr: bool,
}

#[bitos(16)]
#[derive(Debug, Clone, Copy)]
pub struct Stt1 {
    #[bits(10)]
    pub psign0: bool,
    #[bits(11)]
    pub psign1: bool,
}

#[bitos(16)]
#[derive(Debug, Clone, Copy)]
pub struct Stt2 {
    #[bits(0)]
    pub ip0: bool,
    #[bits(1)]
    pub ip1: bool,
    #[bits(2)]
    pub ip2: bool,
    #[bits(3)]
    pub vip: bool,
    #[bits(8..11)]
    pub bcn: u3,
    #[bits(15)]
    pub lp: bool,
}

#[bitos(16)]
#[derive(Debug, Clone, Copy)]
pub struct Mod0 {
    #[bits(0)]
    pub sat: bool,
    #[bits(1)]
    pub sata: bool,
    #[bits(2..4)]
    pub ps0: u2,
    #[bits(4..6)]
    pub ps1: u2,
    #[bits(6..8)]
    pub hwm: u2,
    #[bits(8)]
    pub s: bool,
}

#[bitos(16)]
#[derive(Debug, Clone, Copy)]
pub struct Mod1 {
    #[bits(0..8)]
    pub page: u8,
    #[bits(12)]
    pub stp16: bool,
    #[bits(13)]
    pub cmd: bool,
    #[bits(14)]
    pub epi: bool,
    #[bits(15)]
    pub epj: bool,
}

#[bitos(16)]
#[derive(Debug, Clone, Copy)]
pub struct Mod2 {
    #[bits(0..8)]
    pub m: u8,
    #[bits(8..16)]
    pub brv: u8,
}

#[bitos(16)]
#[derive(Debug, Clone, Copy)]
pub struct Mod3 {
    #[bits(0)]
    pub ic0: bool,
    #[bits(1)]
    pub ic1: bool,
    #[bits(2)]
    pub ic2: bool,
    #[bits(3)]
    pub vic: bool,
    #[bits(4)]
    pub vim: bool,
    #[bits(15)]
    pub pc_endian: bool,
}

#[bitos(16)]
#[derive(Debug, Clone, Copy)]
pub struct Icr {
    #[bits(0)]
    pub ie: bool,
    #[bits(1)]
    pub im0: bool,
    #[bits(2)]
    pub im1: bool,
    #[bits(3)]
    pub im2: bool,
    #[bits(4)]
    pub vim: bool,
}

#[bitos(16)]
#[derive(Debug, Clone, Copy)]
pub struct Cfg {
    #[bits(0..7)]
    pub step: u7,
    #[bits(7..16)]
    pub modulo: u9,
}

/// Packed address-register descriptor: two (rn, offset, step) tuples.
#[bitos(16)]
#[derive(Debug, Clone, Copy)]
pub struct Ar {
    #[bits(0..3)]
    pub rn0: u3,
    #[bits(3..5)]
    pub offset0: u2,
    #[bits(5..8)]
    pub step0: u3,
    #[bits(8..11)]
    pub rn1: u3,
    #[bits(11..13)]
    pub offset1: u2,
    #[bits(13..16)]
    pub step1: u3,
}

/// Packed address-register-pair descriptor: one (i, j) tuple.
#[bitos(16)]
#[derive(Debug, Clone, Copy)]
pub struct Arp {
    #[bits(0..2)]
    pub rni: u2,
    #[bits(2..5)]
    pub stepi: u3,
    #[bits(5..7)]
    pub offseti: u2,
    #[bits(8..10)]
    pub rnj: u2,
    #[bits(10..13)]
    pub stepj: u3,
    #[bits(13..15)]
    pub offsetj: u2,
}

#[derive(Debug, Clone)]
pub struct Registers {
    /// Accumulators, always 40-bit sign-extended into the full word.
    pub a: [u64; 2],
    pub b: [u64; 2],
    pub r: [u16; 8],
    pub r0b: u16,
    pub r1b: u16,
    pub r4b: u16,
    pub r7b: u16,
    pub x: [u16; 2],
    pub y: [u16; 2],
    /// Raw 32-bit products plus their latched sign and shift code.
    pub p: [u32; 2],
    pub psign: [u16; 2],
    pub ps: [u16; 2],
    pub stepi: u16,
    pub stepj: u16,
    pub stepib: u16,
    pub stepjb: u16,
    pub stepi0: u16,
    pub stepj0: u16,
    pub stepi0b: u16,
    pub stepj0b: u16,
    pub modi: u16,
    pub modj: u16,
    pub modib: u16,
    pub modjb: u16,
    pub bankstep: bool,
    pub legacy_mod: bool,
    pub m: [bool; 8],
    pub brv: [bool; 8],
    pub r3z: bool,
    pub r7z: bool,
    pub arrn: [u16; 4],
    pub arstep: [u16; 4],
    pub aroffset: [u16; 4],
    pub arprni: [u16; 4],
    pub arprnj: [u16; 4],
    pub arpstepi: [u16; 4],
    pub arpstepj: [u16; 4],
    pub arpoffseti: [u16; 4],
    pub arpoffsetj: [u16; 4],
    /// Alternate-bank copies of `ar0`/`ar1` and `arp0`..`arp3`, kept packed.
    pub arb: [u16; 2],
    pub arpb: [u16; 4],
    pub flags: Flags,
    pub sar: [bool; 2],
    pub s: bool,
    pub ym: u16,
    pub sv: u16,
    pub mixp: u16,
    pub page: u16,
    pub movpd: u16,
    pub sp: u16,
    pub pc: u32,
    pub pc_endian: u16,
    pub iu: [bool; 2],
    pub ou: [bool; 2],
    pub vtr: [u16; 2],
    pub rep: bool,
    pub repc: u16,
    pub lp: bool,
    pub bcn: u16,
    pub bkrep_stack: [LoopFrame; 4],
    pub ie: bool,
    pub im: [bool; 3],
    pub ip: [bool; 3],
    pub ic: [bool; 3],
    pub vim: bool,
    pub vip: bool,
    pub vic: bool,
    pub viaddr: u32,
    pub shadow: ShadowBank,
}

impl Default for Registers {
    fn default() -> Self {
        Self {
            a: [0; 2],
            b: [0; 2],
            r: [0; 8],
            r0b: 0,
            r1b: 0,
            r4b: 0,
            r7b: 0,
            x: [0; 2],
            y: [0; 2],
            p: [0; 2],
            psign: [0; 2],
            ps: [0; 2],
            stepi: 0,
            stepj: 0,
            stepib: 0,
            stepjb: 0,
            stepi0: 0,
            stepj0: 0,
            stepi0b: 0,
            stepj0b: 0,
            modi: 0,
            modj: 0,
            modib: 0,
            modjb: 0,
            bankstep: false,
            legacy_mod: false,
            m: [false; 8],
            brv: [false; 8],
            r3z: false,
            r7z: false,
            arrn: [0; 4],
            arstep: [0; 4],
            aroffset: [0; 4],
            arprni: [0; 4],
            arprnj: [0; 4],
            arpstepi: [0; 4],
            arpstepj: [0; 4],
            arpoffseti: [0; 4],
            arpoffsetj: [0; 4],
            arb: [0; 2],
            arpb: [0; 4],
            flags: Flags::default(),
            sar: [false; 2],
            s: false,
            ym: 0,
            sv: 0,
            mixp: 0,
            page: 0,
            movpd: 0,
            sp: 0,
            pc: 0,
            pc_endian: 0,
            iu: [false; 2],
            ou: [false; 2],
            vtr: [0; 2],
            rep: false,
            repc: 0,
            lp: false,
            bcn: 0,
            bkrep_stack: [LoopFrame::default(); 4],
            ie: false,
            im: [false; 3],
            ip: [false; 3],
            ic: [false; 3],
            vim: false,
            vip: false,
            vic: false,
            viaddr: 0,
            shadow: ShadowBank::default(),
        }
    }
}

impl Registers {
    pub fn pc_l(&self) -> u16 {
        self.pc as u16
    }

    pub fn pc_h(&self) -> u16 {
        (self.pc >> 16) as u16
    }

    /// Loads `pc` from its split halves.
    pub fn set_pc(&mut self, low: u16, high: u16) {
        self.pc = low as u32 | ((high as u32) << 16);
    }

    /// The loop counter of the innermost active block repeat.
    pub fn lc(&self) -> u16 {
        let frame = if self.lp { self.bcn as usize - 1 } else { 0 };
        self.bkrep_stack[frame].lc
    }

    pub fn set_lc(&mut self, value: u16) {
        let frame = if self.lp { self.bcn as usize - 1 } else { 0 };
        self.bkrep_stack[frame].lc = value;
    }

    pub fn condition_pass(&self, cond: Cond) -> bool {
        let f = &self.flags;
        match cond {
            Cond::True => true,
            Cond::Eq => f.z,
            Cond::Neq => !f.z,
            Cond::Gt => !f.z && !f.m,
            Cond::Ge => !f.m,
            Cond::Lt => f.m,
            Cond::Le => f.m || f.z,
            Cond::Nn => !f.n,
            Cond::C => f.c[0],
            Cond::V => f.v,
            Cond::E => f.e,
            Cond::L => f.ls,
            Cond::Nr => !f.r,
            Cond::Niu0 => !self.iu[0],
            Cond::Iu0 => self.iu[0],
            Cond::Iu1 => self.iu[1],
        }
    }

    pub fn st0(&self) -> u16 {
        St0::from_bits(0)
            .with_sata(self.sar[0])
            .with_ie(self.ie)
            .with_im0(self.im[0])
            .with_im1(self.im[1])
            .with_fr(self.flags.r)
            .with_fls(self.flags.ls)
            .with_fe(self.flags.e)
            .with_fc0(self.flags.c[0])
            .with_fv(self.flags.v)
            .with_fnorm(self.flags.n)
            .with_fm(self.flags.m)
            .with_fz(self.flags.z)
            .with_flv(self.flags.lv)
            .with_fc1(self.flags.c[1])
            .to_bits()
    }

    pub fn set_st0(&mut self, value: u16) {
        let v = St0::from_bits(value);
        self.sar[0] = v.sata();
        self.ie = v.ie();
        self.im[0] = v.im0();
        self.im[1] = v.im1();
        self.flags.r = v.fr();
        self.flags.ls = v.fls();
        self.flags.e = v.fe();
        self.flags.c[0] = v.fc0();
        self.flags.v = v.fv();
        self.flags.n = v.fnorm();
        self.flags.m = v.fm();
        self.flags.z = v.fz();
        self.flags.lv = v.flv();
        self.flags.c[1] = v.fc1();
    }

    pub fn st1(&self) -> u16 {
        St1::from_bits(0)
            .with_page(self.page as u8)
            .with_ps0(u2::new(self.ps[0] as u8))
            .to_bits()
    }

    pub fn set_st1(&mut self, value: u16) {
        let v = St1::from_bits(value);
        self.page = v.page() as u16;
        self.ps[0] = v.ps0().value() as u16;
    }

    pub fn st2(&self) -> u16 {
        let mut m = 0u8;
        for unit in 0..6 {
            m = m.with_bit(unit, self.m[unit as usize]);
        }
        St2::from_bits(0)
            .with_m(u6::new(m))
            .with_im2(self.im[2])
            .with_s(self.s)
            .with_ou0(self.ou[0])
            .with_ou1(self.ou[1])
            .with_iu0(self.iu[0])
            .with_iu1(self.iu[1])
            .with_ip2(self.ip[2])
            .with_ip0(self.ip[0])
            .with_ip1(self.ip[1])
            .to_bits()
    }

    pub fn set_st2(&mut self, value: u16) {
        let v = St2::from_bits(value);
        for unit in 0..6 {
            self.m[unit as usize] = v.m().value().bit(unit);
        }
        self.im[2] = v.im2();
        self.s = v.s();
        self.ou[0] = v.ou0();
        self.ou[1] = v.ou1();
    }

    pub fn stt0(&self) -> u16 {
        Stt0::from_bits(0)
            .with_fls(self.flags.ls)
            .with_flv(self.flags.lv)
            .with_fe(self.flags.e)
            .with_fc0(self.flags.c[0])
            .with_fv(self.flags.v)
            .with_fnorm(self.flags.n)
            .with_fm(self.flags.m)
            .with_fz(self.flags.z)
            .with_fc1(self.flags.c[1])
            .with_fr(self.flags.r)
            .to_bits()
    }

    pub fn set_stt0(&mut self, value: u16) {
        let v = Stt0::from_bits(value);
        self.flags.ls = v.fls();
        self.flags.lv = v.flv();
        self.flags.e = v.fe();
        self.flags.c[0] = v.fc0();
        self.flags.v = v.fv();
        self.flags.n = v.fnorm();
        self.flags.m = v.fm();
        self.flags.z = v.fz();
        self.flags.c[1] = v.fc1();
        self.flags.r = v.fr();
    }

    pub fn stt1(&self) -> u16 {
        Stt1::from_bits(0)
            .with_psign0(self.psign[0] != 0)
            .with_psign1(self.psign[1] != 0)
            .to_bits()
    }

    pub fn set_stt1(&mut self, value: u16) {
        let v = Stt1::from_bits(value);
        self.psign[0] = v.psign0() as u16;
        self.psign[1] = v.psign1() as u16;
    }

    pub fn stt2(&self) -> u16 {
        Stt2::from_bits(0)
            .with_ip0(self.ip[0])
            .with_ip1(self.ip[1])
            .with_ip2(self.ip[2])
            .with_vip(self.vip)
            .with_bcn(u3::new(self.bcn as u8))
            .with_lp(self.lp)
            .to_bits()
    }

    pub fn set_stt2(&mut self, value: u16) {
        let v = Stt2::from_bits(value);
        self.ip[0] = v.ip0();
        self.ip[1] = v.ip1();
        self.ip[2] = v.ip2();
        self.vip = v.vip();
    }

    pub fn mod0(&self) -> u16 {
        Mod0::from_bits(0)
            .with_sat(self.sar[1])
            .with_sata(self.sar[0])
            .with_ps0(u2::new(self.ps[0] as u8))
            .with_ps1(u2::new(self.ps[1] as u8))
            .with_hwm(u2::new(self.ym as u8))
            .with_s(self.s)
            .to_bits()
    }

    pub fn set_mod0(&mut self, value: u16) {
        let v = Mod0::from_bits(value);
        self.sar[1] = v.sat();
        self.sar[0] = v.sata();
        self.ps[0] = v.ps0().value() as u16;
        self.ps[1] = v.ps1().value() as u16;
        self.ym = v.hwm().value() as u16;
        self.s = v.s();
    }

    pub fn mod1(&self) -> u16 {
        Mod1::from_bits(0)
            .with_page(self.page as u8)
            .with_stp16(self.bankstep)
            .with_cmd(self.legacy_mod)
            .with_epi(self.r3z)
            .with_epj(self.r7z)
            .to_bits()
    }

    pub fn set_mod1(&mut self, value: u16) {
        let v = Mod1::from_bits(value);
        self.page = v.page() as u16;
        self.bankstep = v.stp16();
        self.legacy_mod = v.cmd();
        self.r3z = v.epi();
        self.r7z = v.epj();
    }

    pub fn mod2(&self) -> u16 {
        let mut m = 0u8;
        let mut brv = 0u8;
        for unit in 0..8 {
            m = m.with_bit(unit, self.m[unit as usize]);
            brv = brv.with_bit(unit, self.brv[unit as usize]);
        }
        Mod2::from_bits(0).with_m(m).with_brv(brv).to_bits()
    }

    pub fn set_mod2(&mut self, value: u16) {
        let v = Mod2::from_bits(value);
        for unit in 0..8 {
            self.m[unit as usize] = v.m().bit(unit);
            self.brv[unit as usize] = v.brv().bit(unit);
        }
    }

    pub fn mod3(&self) -> u16 {
        Mod3::from_bits(0)
            .with_ic0(self.ic[0])
            .with_ic1(self.ic[1])
            .with_ic2(self.ic[2])
            .with_vic(self.vic)
            .with_vim(self.vim)
            .with_pc_endian(self.pc_endian != 0)
            .to_bits()
    }

    pub fn set_mod3(&mut self, value: u16) {
        let v = Mod3::from_bits(value);
        self.ic[0] = v.ic0();
        self.ic[1] = v.ic1();
        self.ic[2] = v.ic2();
        self.vic = v.vic();
        self.vim = v.vim();
        self.pc_endian = v.pc_endian() as u16;
    }

    pub fn icr(&self) -> u16 {
        Icr::from_bits(0)
            .with_ie(self.ie)
            .with_im0(self.im[0])
            .with_im1(self.im[1])
            .with_im2(self.im[2])
            .with_vim(self.vim)
            .to_bits()
    }

    pub fn set_icr(&mut self, value: u16) {
        let v = Icr::from_bits(value);
        self.ie = v.ie();
        self.im[0] = v.im0();
        self.im[1] = v.im1();
        self.im[2] = v.im2();
        self.vim = v.vim();
    }

    pub fn cfgi(&self) -> u16 {
        Cfg::from_bits(0)
            .with_step(u7::new(self.stepi as u8))
            .with_modulo(u9::new(self.modi))
            .to_bits()
    }

    pub fn set_cfgi(&mut self, value: u16) {
        let v = Cfg::from_bits(value);
        self.stepi = v.step().value() as u16;
        self.modi = v.modulo().value();
    }

    pub fn cfgj(&self) -> u16 {
        Cfg::from_bits(0)
            .with_step(u7::new(self.stepj as u8))
            .with_modulo(u9::new(self.modj))
            .to_bits()
    }

    pub fn set_cfgj(&mut self, value: u16) {
        let v = Cfg::from_bits(value);
        self.stepj = v.step().value() as u16;
        self.modj = v.modulo().value();
    }

    pub fn ar(&self, i: usize) -> u16 {
        Ar::from_bits(0)
            .with_rn0(u3::new(self.arrn[i * 2] as u8))
            .with_offset0(u2::new(self.aroffset[i * 2] as u8))
            .with_step0(u3::new(self.arstep[i * 2] as u8))
            .with_rn1(u3::new(self.arrn[i * 2 + 1] as u8))
            .with_offset1(u2::new(self.aroffset[i * 2 + 1] as u8))
            .with_step1(u3::new(self.arstep[i * 2 + 1] as u8))
            .to_bits()
    }

    pub fn set_ar(&mut self, i: usize, value: u16) {
        let v = Ar::from_bits(value);
        self.arrn[i * 2] = v.rn0().value() as u16;
        self.aroffset[i * 2] = v.offset0().value() as u16;
        self.arstep[i * 2] = v.step0().value() as u16;
        self.arrn[i * 2 + 1] = v.rn1().value() as u16;
        self.aroffset[i * 2 + 1] = v.offset1().value() as u16;
        self.arstep[i * 2 + 1] = v.step1().value() as u16;
    }

    pub fn arp(&self, i: usize) -> u16 {
        Arp::from_bits(0)
            .with_rni(u2::new(self.arprni[i] as u8))
            .with_stepi(u3::new(self.arpstepi[i] as u8))
            .with_offseti(u2::new(self.arpoffseti[i] as u8))
            .with_rnj(u2::new(self.arprnj[i] as u8))
            .with_stepj(u3::new(self.arpstepj[i] as u8))
            .with_offsetj(u2::new(self.arpoffsetj[i] as u8))
            .to_bits()
    }

    pub fn set_arp(&mut self, i: usize, value: u16) {
        let v = Arp::from_bits(value);
        self.arprni[i] = v.rni().value() as u16;
        self.arpstepi[i] = v.stepi().value() as u16;
        self.arpoffseti[i] = v.offseti().value() as u16;
        self.arprnj[i] = v.rnj().value() as u16;
        self.arpstepj[i] = v.stepj().value() as u16;
        self.arpoffsetj[i] = v.offsetj().value() as u16;
    }

    pub fn swap_ar(&mut self, i: usize) {
        let current = self.ar(i);
        let bank = self.arb[i];
        self.set_ar(i, bank);
        self.arb[i] = current;
    }

    pub fn swap_arp(&mut self, i: usize) {
        let current = self.arp(i);
        let bank = self.arpb[i];
        self.set_arp(i, bank);
        self.arpb[i] = current;
    }

    pub fn swap_all_ar_arp(&mut self) {
        for i in 0..2 {
            self.swap_ar(i);
        }
        for i in 0..4 {
            self.swap_arp(i);
        }
    }

    /// Copies the store/restore shadow set into the shadow bank.
    pub fn shadow_store(&mut self) {
        self.shadow.flags = self.flags;
        self.shadow.sar = self.sar;
        self.shadow.s = self.s;
        self.shadow.ym = self.ym;
        self.shadow.page = self.page;
    }

    pub fn shadow_restore(&mut self) {
        self.flags = self.shadow.flags;
        self.sar = self.shadow.sar;
        self.s = self.shadow.s;
        self.ym = self.shadow.ym;
        self.page = self.shadow.page;
    }

    /// Exchanges the step/modulo registers with their shadow copies.
    pub fn shadow_swap(&mut self) {
        std::mem::swap(&mut self.stepi, &mut self.shadow.stepi);
        std::mem::swap(&mut self.stepj, &mut self.shadow.stepj);
        std::mem::swap(&mut self.stepi0, &mut self.shadow.stepi0);
        std::mem::swap(&mut self.stepj0, &mut self.shadow.stepj0);
        std::mem::swap(&mut self.modi, &mut self.shadow.modi);
        std::mem::swap(&mut self.modj, &mut self.shadow.modj);
    }
}

#[cfg(test)]
mod test {
    use super::Registers;
    use crate::ins::Cond;

    #[test]
    fn st0_round_trip() {
        let mut regs = Registers::default();
        regs.set_st0(0b0011_1111_1111_1111);
        assert!(regs.ie);
        assert!(regs.flags.z && regs.flags.lv && regs.flags.c[1]);
        assert_eq!(regs.st0(), 0b0011_1111_1111_1111);
    }

    #[test]
    fn mod2_maps_all_units() {
        let mut regs = Registers::default();
        regs.set_mod2(0x8001);
        assert!(regs.m[0]);
        assert!(regs.brv[7]);
        assert_eq!(regs.mod2(), 0x8001);
    }

    #[test]
    fn ar_pack_unpack() {
        let mut regs = Registers::default();
        regs.set_ar(0, 0xFFFF);
        assert_eq!(regs.arrn[0], 7);
        assert_eq!(regs.aroffset[1], 3);
        assert_eq!(regs.ar(0), 0xFFFF);
        regs.swap_ar(0);
        assert_eq!(regs.ar(0), 0);
        assert_eq!(regs.arb[0], 0xFFFF);
    }

    #[test]
    fn lc_tracks_innermost_loop(){
        let mut regs = Registers::default();
        regs.bkrep_stack[0].lc = 5;
        assert_eq!(regs.lc(), 5);
        regs.lp = true;
        regs.bcn = 2;
        regs.bkrep_stack[1].lc = 9;
        assert_eq!(regs.lc(), 9);
        regs.set_lc(8);
        assert_eq!(regs.bkrep_stack[1].lc, 8);
    }

    #[test]
    fn conditions_follow_flags() {
        let mut regs = Registers::default();
        regs.flags.z = true;
        assert!(regs.condition_pass(Cond::Eq));
        assert!(regs.condition_pass(Cond::Le));
        assert!(!regs.condition_pass(Cond::Neq));
        regs.flags.z = false;
        regs.flags.m = true;
        assert!(regs.condition_pass(Cond::Lt));
        assert!(!regs.condition_pass(Cond::Ge));
    }
}
