//! Instruction words and the opcode table.
//!
//! Opcodes are declared as 16-bit pattern strings parsed into mask/target
//! matchers at compile time. `OpcodeTable` expands the declarative table into
//! a 65 536-entry array once at startup; unmatched words decode to
//! [`Opcode::Undefined`].

use strum::{FromRepr, VariantArray};

#[derive(Clone, Copy)]
pub struct OpcodeInfo {
    mask: u16,
    target: u16,
}

impl OpcodeInfo {
    #[inline(always)]
    fn matches(self, value: u16) -> bool {
        (value & self.mask) == self.target
    }

    const fn parse(s: &'static str) -> Self {
        assert!(s.is_ascii());

        let bytes = s.as_bytes();

        let mut mask = 0;
        let mut target = 0;

        let mut char_index = 0;
        let mut bit_index = 15;
        loop {
            let char = bytes[char_index];
            match char {
                b'0' => {
                    mask |= 1 << bit_index;
                }
                b'1' => {
                    mask |= 1 << bit_index;
                    target |= 1 << bit_index;
                }
                b'x' | b'_' => (),
                _ => panic!("unknown character"),
            }

            char_index += 1;
            if char != b'_' {
                if bit_index == 0 {
                    break;
                }

                bit_index -= 1;
            }
        }

        Self { mask, target }
    }
}

macro_rules! opcode {
    (
        $e:ident;
        $($name:ident = $opcode:literal),*
        $(,)?
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, VariantArray)]
        pub enum $e {
            $(
                $name,
            )*
            Undefined,
        }

        impl $e {
            pub fn decode(value: u16) -> Self {
                $(
                    let info = const { OpcodeInfo::parse($opcode) };
                    if info.matches(value) {
                        return Self::$name;
                    }
                )*

                Self::Undefined
            }

            #[cfg(test)]
            fn info(self) -> Option<OpcodeInfo> {
                match self {
                    $(
                        Self::$name => Some(const { OpcodeInfo::parse($opcode) }),
                    )*
                    Self::Undefined => None,
                }
            }
        }
    };
}

opcode! {
    Opcode;

    // System and single-word register transfers.
    Nop             = "0000_0000_0000_0000",
    Trap            = "0000_0000_0000_0001",
    Dint            = "0000_0000_0000_0010",
    Eint            = "0000_0000_0000_0011",
    CntxS           = "0000_0000_0000_0100",
    CntxR           = "0000_0000_0000_0101",
    Break           = "0000_0000_0000_0110",
    Retd            = "0000_0000_0000_0111",
    BkrepRstMemsp   = "0000_0000_0000_1000",
    BkrepStoMemsp   = "0000_0000_0000_1001",
    PushPrpage      = "0000_0000_0000_1010",
    PopPrpage       = "0000_0000_0000_1011",
    PushRepc        = "0000_0000_0000_1100",
    PopRepc         = "0000_0000_0000_1101",
    PushX0          = "0000_0000_0000_1110",
    PopX0           = "0000_0000_0000_1111",
    PushX1          = "0000_0000_0001_0000",
    PopX1           = "0000_0000_0001_0001",
    PushY1          = "0000_0000_0001_0010",
    PopY1           = "0000_0000_0001_0011",
    PushR6          = "0000_0000_0001_0100",
    PopR6           = "0000_0000_0001_0101",
    RepR6           = "0000_0000_0001_0110",
    MovMixpR6       = "0000_0000_0001_0111",
    MovR6Mixp       = "0000_0000_0001_1000",
    MovMemspR6      = "0000_0000_0001_1001",
    MovP0hR6        = "0000_0000_0001_1010",
    ExpR6           = "0000_0000_0001_1011",
    Vtrclr0         = "0000_0000_0001_1100",
    Vtrclr1         = "0000_0000_0001_1101",
    Vtrclr          = "0000_0000_0001_1110",
    Vtrshr          = "0000_0000_0001_1111",
    Clrp0           = "0000_0000_0010_0000",
    Clrp1           = "0000_0000_0010_0001",
    Clrp            = "0000_0000_0010_0010",
    Bankr           = "0000_0000_0010_0011",
    Retid           = "0000_0000_0010_0100",
    Retidc          = "0000_0000_0010_0101",
    MovA0hStepi0    = "0000_0000_0010_0110",
    MovA0hStepj0    = "0000_0000_0010_0111",
    MovStepi0A0h    = "0000_0000_0010_1000",
    MovStepj0A0h    = "0000_0000_0010_1001",
    MacX1To0        = "0000_0000_0010_101x",
    Pacr1           = "0000_0000_0010_110x",
    ExpR6Ax         = "0000_0000_0010_111x",
    MovsR6Ax        = "0000_0000_0011_000x",
    MovrR6Ax        = "0000_0000_0011_001x",
    CallaAxl        = "0000_0000_0011_010x",
    CallaAx         = "0000_0000_0011_011x",
    MovPcAx         = "0000_0000_0011_100x",
    MovPcBx         = "0000_0000_0011_101x",
    Movpdw          = "0000_0000_0011_110x",
    ExpBx           = "0000_0000_0011_111x",
    Swap            = "0000_0000_0100_xxxx",
    BankrAr         = "0000_0000_0101_000x",
    Vtrmov0         = "0000_0000_0101_001x",
    BankrArp        = "0000_0000_0101_01xx",
    BankrArArp      = "0000_0000_0101_1xxx",
    PopBx           = "0000_0000_0110_000x",
    PushaAx         = "0000_0000_0110_001x",
    PushaBx         = "0000_0000_0110_010x",
    PushPx          = "0000_0000_0110_011x",
    PopPx           = "0000_0000_0110_100x",
    Vtrmov1         = "0000_0000_0110_101x",
    BkrepR6         = "0000_0000_0110_11xx",
    MulY0R6         = "0000_0000_0111_xxxx",
    PopaAb          = "0000_0000_1000_00xx",
    PopAbe          = "0000_0000_1000_01xx",
    PushAbe         = "0000_0000_1000_10xx",
    MovP1ToAb       = "0000_0000_1000_11xx",
    MovP0Ab         = "0000_0000_1001_00xx",
    MovRepcToAb     = "0000_0000_1001_01xx",
    MovX0ToAb       = "0000_0000_1001_10xx",
    MovX1ToAb       = "0000_0000_1001_11xx",
    MovY1ToAb       = "0000_0000_1010_00xx",
    MovIcrToAb      = "0000_0000_1010_01xx",
    MovDvmToAb      = "0000_0000_1010_10xx",
    Vtrmov          = "0000_0000_1010_110x",
    MovPrpageImm4   = "0000_0000_1010_1110",
    MovIcrImm5      = "0000_0000_1010_1111",
    ClrAbAb         = "0000_0000_1011_xxxx",
    ClrrAbAb        = "0000_0000_1100_xxxx",
    MovAbAb         = "0000_0000_1101_xxxx",
    SqrSqrAdd3Ab    = "0000_0000_1110_xxxx",
    SqrMpysuAdd3a   = "0000_0000_1111_xxxx",
    MovX0Abl        = "0000_0001_0000_00xx",
    MovX1Abl        = "0000_0001_0000_01xx",
    MovY1Abl        = "0000_0001_0000_10xx",
    MovDvmAbl       = "0000_0001_0000_1100",
    MovPrpageAbl    = "0000_0001_0000_1101",
    MovPrpageToAbl  = "0000_0001_0000_1110",
    MovExt0         = "0000_0001_0000_1111",
    MovRepcAbl      = "0000_0001_0001_00xx",
    MovP0hToBx      = "0000_0001_0001_010x",
    MovExt1         = "0000_0001_0001_0110",
    MovExt2         = "0000_0001_0001_0111",
    MovR6ToBx       = "0000_0001_0001_100x",
    MovEu           = "0000_0001_0001_1010",
    MovExt3         = "0000_0001_0001_1011",
    MovRepcToAbl    = "0000_0001_0001_11xx",
    LimAxAx         = "0000_0001_0010_00xx",
    ExpBxAx         = "0000_0001_0010_01xx",
    CmpB0B1         = "0000_0001_0010_1000",
    CmpB1B0         = "0000_0001_0010_1001",
    CmpAxBx         = "0000_0001_0010_11xx",
    CmpBxAx         = "0000_0001_0011_00xx",
    CmpP1Ax         = "0000_0001_0011_010x",
    MovMixpToBx     = "0000_0001_0011_011x",
    MaxGe           = "0000_0001_0011_1xxx",
    ExpRegister     = "0000_0001_010x_xxxx",
    Mac1            = "0000_0001_0110_xxxx",
    MaxGt           = "0000_0001_0111_0xxx",
    MinLe           = "0000_0001_0111_1xxx",
    ExpRegisterAx   = "0000_0001_10xx_xxxx",
    MsusuArRn2      = "0000_0001_110x_xxxx",
    MaxGeR0         = "0000_0001_1110_0xxx",
    MaxGtR0         = "0000_0001_1110_1xxx",
    MinLeR0         = "0000_0001_1111_0xxx",
    MinLtR0         = "0000_0001_1111_1xxx",

    // Addressing-mode manipulators and register-file transfers.
    Modr            = "0000_0010_00xx_xxxx",
    ModrI2D2        = "0000_0010_010x_xxxx",
    Bitrev          = "0000_0010_0110_0xxx",
    BitrevDbrv      = "0000_0010_0110_1xxx",
    BitrevEbrv      = "0000_0010_0111_0xxx",
    BkrepRstAr      = "0000_0010_0111_10xx",
    BkrepStoAr      = "0000_0010_0111_11xx",
    MovR6Reg        = "0000_0010_100x_xxxx",
    MovR6ToReg      = "0000_0010_101x_xxxx",
    RepReg          = "0000_0010_110x_xxxx",
    PushReg         = "0000_0010_111x_xxxx",
    PopReg          = "0000_0011_000x_xxxx",
    MovMemspToReg   = "0000_0011_001x_xxxx",
    MovMixpToReg    = "0000_0011_010x_xxxx",
    MovIcrReg       = "0000_0011_011x_xxxx",
    MovMixpReg      = "0000_0011_100x_xxxx",
    MovP0hToReg     = "0000_0011_101x_xxxx",
    MovRegBx        = "0000_0011_11xx_xxxx",
    ModrEemod       = "0000_0100_00xx_xxxx",
    ModrEdmod       = "0000_0100_01xx_xxxx",
    ModrDemod       = "0000_0100_10xx_xxxx",
    ModrDdmod       = "0000_0100_11xx_xxxx",
    LoadStepi       = "0000_0101_0xxx_xxxx",
    LoadStepj       = "0000_0101_1xxx_xxxx",
    LoadPs          = "0000_0110_0000_00xx",
    LoadMovpd       = "0000_0110_0000_01xx",
    MinLt           = "0000_0110_0000_1xxx",
    LoadPs01        = "0000_0110_0001_xxxx",
    Ret             = "0000_0110_0010_xxxx",
    Reti            = "0000_0110_0011_xxxx",
    Retic           = "0000_0110_0100_xxxx",
    MovArArpAbl     = "0000_0110_01x1_xxxx",
    TstbR6          = "0000_0110_0110_xxxx",
    MovSttModAbl    = "0000_0110_100x_xxxx",
    MovAblArArp     = "0000_0110_101x_xxxx",
    NormAxRn        = "0000_0110_11xx_xxxx",
    MovSvToMemImm8  = "0000_0111_xxxx_xxxx",
    Shfi            = "0000_10xx_xxxx_xxxx",
    Rets            = "0000_1100_xxxx_xxxx",
    RepImm8         = "0000_1101_xxxx_xxxx",
    LoadPage        = "0000_1110_xxxx_xxxx",
    Mpyi            = "0000_1111_xxxx_xxxx",

    // Immediate moves and branches.
    MovImm8Axl      = "0001_000x_xxxx_xxxx",
    MovImm8sAxh     = "0001_001x_xxxx_xxxx",
    LoadModi        = "0001_010x_xxxx_xxxx",
    LoadModj        = "0001_011x_xxxx_xxxx",
    Brr             = "0001_1xxx_xxxx_xxxx",
    Callr           = "0010_0xxx_xxxx_xxxx",
    MovSvImm8s      = "0010_1000_xxxx_xxxx",

    // Two-word immediate cluster; second word is the raw immediate.
    MovR6Imm16      = "0010_1001_0000_0000",
    MovRepcImm16    = "0010_1001_0000_0001",
    MovStepi0Imm16  = "0010_1001_0000_0010",
    MovStepj0Imm16  = "0010_1001_0000_0011",
    PushImm16       = "0010_1001_0000_0100",
    MovImm16SttMod  = "0010_1001_0000_1xxx",
    MovImm16ArArp   = "0010_1001_0001_0xxx",
    MovImm16Bx      = "0010_1001_0001_100x",
    AlbR6           = "0010_1001_0010_0xxx",
    TstbSttModImm16 = "0010_1001_0010_1xxx",
    MovImm16Reg     = "0010_1001_010x_xxxx",
    AluImm16        = "0010_1001_0110_xxxx",
    AluMemImm16     = "0010_1001_0111_xxxx",
    AluMemR7Imm16   = "0010_1001_1000_xxxx",
    MovMemImm16Ax   = "0010_1001_1001_000x",
    MovAxlMemImm16  = "0010_1001_1001_001x",
    MovMemR7Imm16Ax = "0010_1001_1001_010x",
    MovAxlMemR7Imm16 = "0010_1001_1001_011x",
    MovRepcMemR7Imm16 = "0010_1001_1001_1000",
    MovRepcToMemR7Imm16 = "0010_1001_1001_1001",
    MovMemR7Imm16ArArpSttMod = "0010_1001_1010_xxxx",
    MovArArpSttModMemR7Imm16 = "0010_1001_1011_xxxx",
    SqrSqrAdd3Ar    = "0010_1001_11xx_xxxx",
    Divs            = "0010_101x_xxxx_xxxx",
    BkrepReg        = "0010_1100_0xxx_xxxx",
    MovMemR7Imm7sAx = "0010_110x_1xxx_xxxx",
    Br              = "0010_1101_00xx_xxxx",
    Call            = "0010_1101_01xx_xxxx",
    Bkrep           = "0010_1110_xxxx_xxxx",
    MovAxlMemR7Imm7s = "0010_1111_xxxx_xxxx",

    // Generic ALU over registers and memory.
    AlmRn           = "0011_00xx_xxxx_xxxx",
    AlmReg          = "0011_01xx_xxxx_xxxx",
    AluMemR7Imm7s   = "0011_1xxx_xxxx_xxxx",
    Alm             = "010x_xxxx_xxxx_xxxx",
    Alb             = "0110_0xxx_xxxx_xxxx",
    MulY0MemImm8    = "0110_1xxx_xxxx_xxxx",
    AluImm8         = "0111_xxxx_xxxx_xxxx",

    // Page-relative moves.
    MovAblhMemImm8  = "1000_0xxx_xxxx_xxxx",
    MovMemImm8Ablh  = "1000_1xxx_xxxx_xxxx",
    MovMemImm8Rn    = "1001_0xxx_xxxx_xxxx",
    MovRnMemImm8    = "1001_1xxx_xxxx_xxxx",
    MovImm8sRn      = "1010_0xxx_xxxx_xxxx",
    MovMemImm8Ab    = "1010_10xx_xxxx_xxxx",
    MovsMemImm8Ab   = "1010_11xx_xxxx_xxxx",
    TstbMemImm8     = "1011_xxxx_xxxx_xxxx",

    // Multiply and indirect move clusters.
    MulR45R0123     = "1100_0xxx_xxxx_xxxx",
    MovR6ToRnStep   = "1100_1000_0xxx_xxxx",
    MovR6RnStep     = "1100_1000_1xxx_xxxx",
    ExpRnStep       = "1100_1001_0xxx_xxxx",
    MovRnStepBx     = "1100_1001_1xxx_xxxx",
    ExpRnStepAx     = "1100_1010_0xxx_xxxx",
    MovsRnStepAb    = "1100_1010_1xxx_xxxx",
    MovdR0123R45    = "1100_1011_0xxx_xxxx",
    MovpAxlReg      = "1100_1011_1xxx_xxxx",
    MovpAxReg       = "1100_1100_0xxx_xxxx",
    AlbRnStep       = "1100_110x_1xxx_xxxx",
    AlbReg          = "1100_1101_0xxx_xxxx",
    ExchangeIaj     = "1100_1110_0xxx_xxxx",
    ExchangeRiaj    = "1100_1110_1xxx_xxxx",
    ExchangeJai     = "1100_1111_0xxx_xxxx",
    ExchangeRjai    = "1100_1111_1xxx_xxxx",
    MovRnStepReg    = "1101_00xx_xxxx_xxxx",
    MovRegRnStep    = "1101_01xx_xxxx_xxxx",
    MovpRnR0123     = "1101_100x_xxxx_xxxx",
    TstbRnStep      = "1101_101x_xxxx_xxxx",
    MulRnImm16      = "1101_110x_xxxx_xxxx",
    MulY0Rn         = "1101_111x_xxxx_xxxx",

    // ArRn/ArpRn indirect cluster.
    Mov2PxArRn2     = "1110_0000_000x_xxxx",
    Mov2sPxArRn2    = "1110_0000_001x_xxxx",
    Mov2ArRn2Px     = "1110_0000_010x_xxxx",
    AlmR6           = "1110_0000_011x_xxxx",
    MovaAbArRn2     = "1110_0000_10xx_xxxx",
    MovaArRn2Ab     = "1110_0000_11xx_xxxx",
    MovrArRn2Abh    = "1110_0001_0xxx_xxxx",
    Banke           = "1110_0001_10xx_xxxx",
    MovrRnStepAx    = "1110_0001_11xx_xxxx",
    MovSvMemImm8    = "1110_0010_xxxx_xxxx",
    MovRepcToArRn1  = "1110_0011_0000_00xx",
    MovRepcArRn1    = "1110_0011_0000_01xx",
    Tst4b           = "1110_0011_0001_xxxx",
    MovArArpArRn1   = "1110_0011_001x_xxxx",
    MovSttModArRn1  = "1110_0011_010x_xxxx",
    MovArRn1ArArp   = "1110_0011_011x_xxxx",
    MovArRn1SttMod  = "1110_0011_100x_xxxx",
    Tst4bAx         = "1110_0011_101x_xxxx",
    Addhp           = "1110_0011_11xx_xxxx",
    MovRegReg       = "1110_01xx_xxxx_xxxx",
    MovProductSumSv = "1110_1000_00xx_xxxx",
    CbsAxh          = "1110_1000_01xx_xxxx",
    CbsAxhBxh       = "1110_1000_10xx_xxxx",
    CbsArp          = "1110_1000_11xx_xxxx",
    SubAddIMovJSv   = "1110_1001_0xxx_xxxx",
    SubAddJMovISv   = "1110_1001_1xxx_xxxx",
    AddSubIMovJ     = "1110_1010_0xxx_xxxx",
    AddSubJMovI     = "1110_1010_1xxx_xxxx",
    AddSubSv        = "1110_1011_0xxx_xxxx",
    SubAddSv        = "1110_1011_1xxx_xxxx",
    AddAdd          = "1110_1100_0xxx_xxxx",
    AddSubDual      = "1110_1100_1xxx_xxxx",
    SubAdd          = "1110_1101_0xxx_xxxx",
    SubSub          = "1110_1101_1xxx_xxxx",
    Mov2AxMij       = "1110_1110_0xxx_xxxx",
    Mov2AxMji       = "1110_1110_1xxx_xxxx",
    Mov2MijAx       = "1110_1111_0xxx_xxxx",
    Mov2MjiAx       = "1110_1111_1xxx_xxxx",

    // Conditional accumulator ops, product sums, multi-multiplies.
    Moda4           = "1111_000x_xxxx_xxxx",
    Moda3           = "1111_0010_xxxx_xxxx",
    MsuR45R0123     = "1111_0011_xxxx_xxxx",
    Movsi           = "1111_01xx_xxxx_xxxx",
    AddAbBx         = "1111_1000_0000_0xxx",
    AddBxAx         = "1111_1000_0000_10xx",
    AddP1Ax         = "1111_1000_0000_110x",
    SubP1Ax         = "1111_1000_0000_111x",
    AddPxBx         = "1111_1000_0001_00xx",
    SubBxAx         = "1111_1000_0001_01xx",
    SubAbBx         = "1111_1000_0001_1xxx",
    SubPxBx         = "1111_1000_0010_00xx",
    OrAxBxAx        = "1111_1000_0010_1xxx",
    OrAbAxAx        = "1111_1000_0011_xxxx",
    OrBxBxAx        = "1111_1000_0100_0xxx",
    AndAbAbAx       = "1111_1000_011x_xxxx",
    ShfcAx          = "1111_1000_1xxx_xxxx",
    ShfcBx          = "1111_1001_0xxx_xxxx",
    MovrRegAx       = "1111_1001_10xx_xxxx",
    MsuRnImm16      = "1111_1001_11xx_xxxx",
    MovsRegAb       = "1111_1010_0xxx_xxxx",
    Max2VtrAx       = "1111_1010_1000_000x",
    Min2VtrAx       = "1111_1010_1000_001x",
    Max2VtrAxBx     = "1111_1010_1000_01xx",
    Min2VtrAxBx     = "1111_1010_1000_10xx",
    PopArArpSttMod  = "1111_1010_1001_xxxx",
    PushArArpSttMod = "1111_1010_1010_xxxx",
    Max2VtrMovlAxBx = "1111_1010_1100_xxxx",
    Max2VtrMovhAxBx = "1111_1010_1101_xxxx",
    Max2VtrMovlBxAx = "1111_1010_1110_xxxx",
    Max2VtrMovhBxAx = "1111_1010_1111_xxxx",
    Min2VtrMovlAxBx = "1111_1011_0000_xxxx",
    Min2VtrMovhAxBx = "1111_1011_0001_xxxx",
    Min2VtrMovlBxAx = "1111_1011_0010_xxxx",
    Min2VtrMovhBxAx = "1111_1011_0011_xxxx",
    Max2VtrMovij    = "1111_1011_010x_xxxx",
    Max2VtrMovji    = "1111_1011_011x_xxxx",
    Min2VtrMovij    = "1111_1011_100x_xxxx",
    Min2VtrMovji    = "1111_1011_101x_xxxx",
    Mov2AxhMY0M     = "1111_1011_110x_xxxx",
    MovAblSttMod    = "1111_1011_111x_xxxx",
    AddP0P1         = "1111_1100_0000_00xx",
    AddP0P1a        = "1111_1100_0000_01xx",
    Add3P0P1        = "1111_1100_0000_10xx",
    Add3P0P1a       = "1111_1100_0000_11xx",
    Add3P0aP1a      = "1111_1100_0001_00xx",
    SubP0P1         = "1111_1100_0001_01xx",
    SubP0P1a        = "1111_1100_0001_10xx",
    Sub3P0P1        = "1111_1100_0001_11xx",
    Sub3P0P1a       = "1111_1100_0010_00xx",
    Sub3P0aP1a      = "1111_1100_0010_01xx",
    AddsubP0P1      = "1111_1100_0010_10xx",
    AddsubP1P0      = "1111_1100_0010_11xx",
    AddsubP0P1a     = "1111_1100_0011_00xx",
    AddsubP1aP0     = "1111_1100_0011_01xx",
    MovrBxAx        = "1111_1100_0011_10xx",
    Mov2AbhM        = "1111_1100_01xx_xxxx",
    MulY0Reg        = "1111_1100_1xxx_xxxx",
    Mma             = "1111_1101_xxxx_xxxx",
    MmaArp          = "1111_1110_xxxx_xxxx",
    MmaMyMy         = "1111_1111_0xxx_xxxx",
    MmaMxXy         = "1111_1111_100x_xxxx",
    MmaXyMx         = "1111_1111_101x_xxxx",
    MmaMovArRn2     = "1111_1111_110x_xxxx",
    MmaMovAxhBxh    = "1111_1111_111x_xxxx",
}

impl Opcode {
    /// Whether a second program word must be fetched for this instruction.
    pub fn needs_expansion(self) -> bool {
        use Opcode::*;

        matches!(
            self,
            BkrepR6
                | MovR6Imm16
                | MovRepcImm16
                | MovStepi0Imm16
                | MovStepj0Imm16
                | PushImm16
                | MovImm16SttMod
                | MovImm16ArArp
                | MovImm16Bx
                | AlbR6
                | TstbSttModImm16
                | MovImm16Reg
                | AluImm16
                | AluMemImm16
                | AluMemR7Imm16
                | MovMemImm16Ax
                | MovAxlMemImm16
                | MovMemR7Imm16Ax
                | MovAxlMemR7Imm16
                | MovRepcMemR7Imm16
                | MovRepcToMemR7Imm16
                | MovMemR7Imm16ArArpSttMod
                | MovArArpSttModMemR7Imm16
                | BkrepReg
                | Br
                | Call
                | Bkrep
                | Alb
                | AlbRnStep
                | AlbReg
                | MulRnImm16
                | MsuRnImm16
        )
    }
}

/// The fully expanded decode table, one [`Opcode`] per 16-bit program word.
///
/// Built once from the declarative pattern list; immutable afterwards, so a
/// single table may be shared between cores.
pub struct OpcodeTable {
    entries: Box<[Opcode; 0x10000]>,
}

impl OpcodeTable {
    pub fn new() -> Self {
        let entries = (0..=u16::MAX)
            .map(Opcode::decode)
            .collect::<Vec<_>>()
            .into_boxed_slice()
            .try_into()
            .unwrap_or_else(|_| unreachable!());

        Self { entries }
    }

    #[inline(always)]
    pub fn lookup(&self, word: u16) -> Opcode {
        self.entries[word as usize]
    }
}

impl Default for OpcodeTable {
    fn default() -> Self {
        Self::new()
    }
}

/// A fetched instruction: the opcode word and its optional expansion word.
#[derive(Debug, Clone, Copy)]
pub struct Ins {
    pub base: u16,
    pub expansion: u16,
}

impl Ins {
    pub fn new(base: u16) -> Self {
        Self { base, expansion: 0 }
    }

    pub fn with_expansion(base: u16, expansion: u16) -> Self {
        Self { base, expansion }
    }
}

/// Accumulator selector on the 40-bit bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(u8)]
pub enum Acc {
    A0,
    A1,
    B0,
    B1,
}

impl Acc {
    pub fn ax(bit: u16) -> Self {
        if bit != 0 { Self::A1 } else { Self::A0 }
    }

    pub fn bx(bit: u16) -> Self {
        if bit != 0 { Self::B1 } else { Self::B0 }
    }

    pub fn ab(field: u16) -> Self {
        Self::from_repr((field & 3) as u8).unwrap()
    }

    /// The other accumulator of the same bank.
    pub fn counterpart(self) -> Self {
        match self {
            Self::A0 => Self::A1,
            Self::A1 => Self::A0,
            Self::B0 => Self::B1,
            Self::B1 => Self::B0,
        }
    }
}

/// Half-word view of an accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    Low,
    High,
}

/// Decodes the 3-bit low/high accumulator lane field.
pub fn ablh(field: u16) -> (Acc, Part) {
    let acc = Acc::ab(field & 3);
    let part = if field & 4 != 0 { Part::High } else { Part::Low };
    (acc, part)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(u8)]
pub enum Cond {
    True = 0b0000,
    Eq = 0b0001,
    Neq = 0b0010,
    Gt = 0b0011,
    Ge = 0b0100,
    Lt = 0b0101,
    Le = 0b0110,
    Nn = 0b0111,
    C = 0b1000,
    V = 0b1001,
    E = 0b1010,
    L = 0b1011,
    Nr = 0b1100,
    Niu0 = 0b1101,
    Iu0 = 0b1110,
    Iu1 = 0b1111,
}

impl Cond {
    pub fn new(field: u16) -> Self {
        Self::from_repr((field & 0xF) as u8).unwrap()
    }
}

/// Post-modification selector for Rn-indirect access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepValue {
    Zero,
    Increase,
    Decrease,
    Increase2Mode1,
    Decrease2Mode1,
    Increase2Mode2,
    Decrease2Mode2,
    PlusStep,
}

/// Decodes the 2-bit zero/increase/decrease/step field.
pub fn step_zids(field: u16) -> StepValue {
    match field & 3 {
        0 => StepValue::Zero,
        1 => StepValue::Increase,
        2 => StepValue::Decrease,
        _ => StepValue::PlusStep,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetValue {
    Zero,
    PlusOne,
    MinusOne,
    MinusOneDmod,
}

/// 16-bit bus register selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(u8)]
pub enum RegName {
    R0 = 0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    X0,
    X1,
    Y0,
    Y1,
    A0,
    A1,
    B0,
    B1,
    Sp,
    Sv,
    Lc,
    P,
    Pc,
    A0h,
    A1h,
    B0h,
    B1h,
    St0,
    St1,
    St2,
    Cfgi,
    Cfgj,
    Reserved0,
    Reserved1,
}

impl RegName {
    pub fn new(field: u16) -> Self {
        Self::from_repr((field & 0x1F) as u8).unwrap()
    }
}

/// Status/mode register selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(u8)]
pub enum SttMod {
    Stt0 = 0,
    Stt1,
    Stt2,
    Mod0,
    Mod1,
    Mod2,
    Mod3,
    Reserved,
}

impl SttMod {
    pub fn new(field: u16) -> Self {
        Self::from_repr((field & 7) as u8).unwrap()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(u8)]
pub enum ArArp {
    Ar0 = 0,
    Ar1,
    Arp0,
    Arp1,
    Arp2,
    Arp3,
    Reserved0,
    Reserved1,
}

impl ArArp {
    pub fn new(field: u16) -> Self {
        Self::from_repr((field & 7) as u8).unwrap()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(u8)]
pub enum ArArpSttMod {
    Ar0 = 0,
    Ar1,
    Arp0,
    Arp1,
    Arp2,
    Arp3,
    Stt0,
    Stt1,
    Stt2,
    Mod0,
    Mod1,
    Mod2,
    Mod3,
    Reserved0,
    Reserved1,
    Reserved2,
}

impl ArArpSttMod {
    pub fn new(field: u16) -> Self {
        Self::from_repr((field & 0xF) as u8).unwrap()
    }
}

/// Register lanes addressable by the bit-set/clear ALU family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(u8)]
pub enum AlbRegName {
    A0l = 0,
    A1l,
    B0l,
    B1l,
    A0h,
    A1h,
    B0h,
    B1h,
    P,
    Stt0,
    Stt1,
    Stt2,
    Mod0,
    Mod1,
    Mod2,
    Mod3,
}

impl AlbRegName {
    pub fn new(field: u16) -> Self {
        Self::from_repr((field & 0xF) as u8).unwrap()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(u8)]
pub enum AlmOp {
    Or = 0,
    And,
    Xor,
    Tst0,
    Tst1,
    Cmp,
    Sub,
    Msu,
    Addh,
    Addl,
    Subh,
    Subl,
    Add,
    Sqr,
    Sqra,
    Cmpu,
}

impl AlmOp {
    pub fn new(field: u16) -> Self {
        Self::from_repr((field & 0xF) as u8).unwrap()
    }

    /// The 3-bit ALU subset used by the 16-bit-immediate forms.
    pub fn from_alu(field: u16) -> Self {
        match field & 7 {
            0 => Self::Or,
            1 => Self::And,
            2 => Self::Xor,
            3 => Self::Add,
            4 => Self::Cmp,
            5 => Self::Sub,
            6 => Self::Addh,
            _ => Self::Subh,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(u8)]
pub enum AlbOp {
    Set = 0,
    Rst,
    Chng,
    Addv,
    Tst0,
    Tst1,
    Cmpv,
    Subv,
}

impl AlbOp {
    pub fn new(field: u16) -> Self {
        Self::from_repr((field & 7) as u8).unwrap()
    }

    pub fn modifies(self) -> bool {
        matches!(
            self,
            Self::Set | Self::Rst | Self::Chng | Self::Addv | Self::Subv
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(u8)]
pub enum ModaOp {
    Shr = 0,
    Shr4,
    Shl,
    Shl4,
    Ror,
    Rol,
    Clr,
    Not,
    Neg,
    Rnd,
    Pacr,
    Clrr,
    Inc,
    Dec,
    Copy,
    Reserved,
}

impl ModaOp {
    pub fn new(field: u16) -> Self {
        Self::from_repr((field & 0xF) as u8).unwrap()
    }

    /// The 3-bit subset available on the b accumulators.
    pub fn from_moda3(field: u16) -> Self {
        match field & 7 {
            0 => Self::Shr,
            1 => Self::Shr4,
            2 => Self::Shl,
            3 => Self::Shl4,
            4 => Self::Ror,
            5 => Self::Rol,
            6 => Self::Clr,
            _ => Self::Clrr,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(u8)]
pub enum MulOp {
    Mpy = 0,
    Mpysu,
    Mac,
    Macsu,
    Maa,
    Maasu,
    Macus,
    Macuu,
}

impl MulOp {
    pub fn new(field: u16) -> Self {
        Self::from_repr((field & 7) as u8).unwrap()
    }

    /// The 2-bit subset used by the short multiply forms.
    pub fn from_mul2(field: u16) -> Self {
        match field & 3 {
            0 => Self::Mpy,
            1 => Self::Mac,
            2 => Self::Maa,
            _ => Self::Macsu,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(u8)]
pub enum SwapType {
    A0B0 = 0,
    A0B1,
    A1B0,
    A1B1,
    A0B0A1B1,
    A0B1A1B0,
    A0B0A1,
    A0B1A1,
    A1B0A0,
    A1B1A0,
    B0A0B1,
    B0A1B1,
    B1A0B0,
    B1A1B0,
    Reserved0,
    Reserved1,
}

impl SwapType {
    pub fn new(field: u16) -> Self {
        Self::from_repr((field & 0xF) as u8).unwrap()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CbsCond {
    Ge,
    Gt,
}

impl CbsCond {
    pub fn new(field: u16) -> Self {
        if field & 1 != 0 { Self::Gt } else { Self::Ge }
    }
}

/// Base operand of the product-sum unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SumBase {
    Zero,
    Acc,
    Sv,
    SvRnd,
}

impl SumBase {
    pub fn new(field: u16) -> Self {
        match field & 3 {
            0 => Self::Zero,
            1 => Self::Acc,
            2 => Self::Sv,
            _ => Self::SvRnd,
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Opcode, OpcodeTable};
    use strum::VariantArray;

    #[test]
    fn unique_opcodes() {
        for value in 0..u16::MAX {
            let mut hit = None;
            for opcode in Opcode::VARIANTS {
                if opcode.info().is_some_and(|i| i.matches(value)) {
                    if let Some(hit) = hit {
                        panic!("opcodes {hit:?} and {opcode:?} are valid for {value:016b}");
                    }

                    hit = Some(*opcode);
                }
            }
        }
    }

    #[test]
    fn table_matches_linear_decode() {
        let table = OpcodeTable::new();
        for value in [0x0000u16, 0x4123, 0x7FFF, 0x9ABC, 0xFFFF, 0x2D15] {
            assert_eq!(table.lookup(value), Opcode::decode(value));
        }
    }

    #[test]
    fn every_variant_is_reachable() {
        let table = OpcodeTable::new();
        let mut seen = vec![false; Opcode::VARIANTS.len()];
        for value in 0..=u16::MAX {
            let opcode = table.lookup(value);
            let index = Opcode::VARIANTS
                .iter()
                .position(|v| *v == opcode)
                .unwrap_or(seen.len() - 1);
            seen[index] = true;
        }
        for (variant, seen) in Opcode::VARIANTS.iter().zip(&seen) {
            assert!(seen, "opcode {variant:?} has no encoding");
        }
    }
}
