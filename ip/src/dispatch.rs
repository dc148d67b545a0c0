//! The function-code dispatch table.
//!
//! Decoded `(f, j, a)` fields map to exactly one table entry holding
//! the handler function pointer and the instruction's static
//! properties (privilege requirement, whether j selects a partial
//! word, which execution modes admit it).  A miss for a well-formed
//! but unassigned code is reported to the caller, who raises an
//! invalid-instruction interrupt; the table itself has no fallible
//! paths.

use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use crate::proc::{ExecFault, InstructionProcessor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Mnemonic {
    // Loads
    LA, LNA, LMA, LNMA, LR, LX, LXI, LXM, DL,
    // Stores
    SA, SNA, SMA, SR, SX, DS,
    SZ, SNZ, SP1, SN1, SFS, SFZ, SAS, SAZ,
    INC, DEC, INC2, DEC2, ENZ, ADD1, SUB1,
    // Fixed point and logical
    AA, ANA, AMA, ANMA, AU, ANU, AX, ANX, MI, DI, OR, XOR, AND,
    // Floating point
    FA, FAN, FM, FD,
    // Shifts
    SSC, DSC, SSL, DSL, SSA, DSA, LSC, DLSC, LSSC, LDSC, LSSL, LDSL,
    // Jumps
    J, JK, HLTJ, SLJ, LMJ, JZ, JNZ, JP, JN, JO, JNO, JC, JNC,
    // Tests
    TZ, TNZ, TE, TNE, TLE, TG, TS, TSS, TCS,
    // System
    LD, SD, RDC, SDC, SGNL, BUY, SELL, HALT,
}

impl Display for Mnemonic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Which execution modes admit an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionModes {
    Both,
    BasicOnly,
}

pub type HandlerFn = fn(&mut InstructionProcessor) -> Result<(), ExecFault>;

pub struct FunctionTableEntry {
    pub mnemonic: Mnemonic,
    pub handler: HandlerFn,
    /// Highest designator privilege value allowed to execute this
    /// instruction; executing above it is a privilege fault.
    pub maximum_privilege: u8,
    /// True when the j field selects a partial word or immediate
    /// operand rather than acting as a minor function code.
    pub uses_j_field: bool,
    /// True when j values 016/017 denote an immediate operand.
    pub allow_immediate: bool,
    pub modes: InstructionModes,
}

impl fmt::Debug for FunctionTableEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionTableEntry{{{}}}", self.mnemonic)
    }
}

macro_rules! entries {
    ($($name:ident: $mnem:ident, $handler:ident, privilege=$p:expr, jfield=$j:expr,
       immediate=$imm:expr, $modes:ident;)*) => {
        $(
            static $name: FunctionTableEntry = FunctionTableEntry {
                mnemonic: Mnemonic::$mnem,
                handler: InstructionProcessor::$handler,
                maximum_privilege: $p,
                uses_j_field: $j,
                allow_immediate: $imm,
                modes: InstructionModes::$modes,
            };
        )*
    };
}

entries!(
    E_LA: LA, op_la, privilege = 3, jfield = true, immediate = true, Both;
    E_LNA: LNA, op_lna, privilege = 3, jfield = true, immediate = true, Both;
    E_LMA: LMA, op_lma, privilege = 3, jfield = true, immediate = true, Both;
    E_LNMA: LNMA, op_lnma, privilege = 3, jfield = true, immediate = true, Both;
    E_LR: LR, op_lr, privilege = 3, jfield = true, immediate = true, Both;
    E_LX: LX, op_lx, privilege = 3, jfield = true, immediate = true, Both;
    E_LXI: LXI, op_lxi, privilege = 3, jfield = true, immediate = true, Both;
    E_LXM: LXM, op_lxm, privilege = 3, jfield = true, immediate = true, Both;
    E_DL: DL, op_dl, privilege = 3, jfield = false, immediate = false, Both;

    E_SA: SA, op_sa, privilege = 3, jfield = true, immediate = false, Both;
    E_SNA: SNA, op_sna, privilege = 3, jfield = true, immediate = false, Both;
    E_SMA: SMA, op_sma, privilege = 3, jfield = true, immediate = false, Both;
    E_SR: SR, op_sr, privilege = 3, jfield = true, immediate = false, Both;
    E_SX: SX, op_sx, privilege = 3, jfield = true, immediate = false, Both;
    E_DS: DS, op_ds, privilege = 3, jfield = false, immediate = false, Both;

    E_SZ: SZ, op_sz, privilege = 3, jfield = true, immediate = false, Both;
    E_SNZ: SNZ, op_snz, privilege = 3, jfield = true, immediate = false, Both;
    E_SP1: SP1, op_sp1, privilege = 3, jfield = true, immediate = false, Both;
    E_SN1: SN1, op_sn1, privilege = 3, jfield = true, immediate = false, Both;
    E_SFS: SFS, op_sfs, privilege = 3, jfield = true, immediate = false, Both;
    E_SFZ: SFZ, op_sfz, privilege = 3, jfield = true, immediate = false, Both;
    E_SAS: SAS, op_sas, privilege = 3, jfield = true, immediate = false, Both;
    E_SAZ: SAZ, op_saz, privilege = 3, jfield = true, immediate = false, Both;
    E_INC: INC, op_inc, privilege = 3, jfield = true, immediate = false, Both;
    E_DEC: DEC, op_dec, privilege = 3, jfield = true, immediate = false, Both;
    E_INC2: INC2, op_inc2, privilege = 3, jfield = true, immediate = false, Both;
    E_DEC2: DEC2, op_dec2, privilege = 3, jfield = true, immediate = false, Both;
    E_ENZ: ENZ, op_enz, privilege = 3, jfield = true, immediate = false, Both;
    E_ADD1: ADD1, op_add1, privilege = 3, jfield = true, immediate = false, Both;
    E_SUB1: SUB1, op_sub1, privilege = 3, jfield = true, immediate = false, Both;

    E_AA: AA, op_aa, privilege = 3, jfield = true, immediate = true, Both;
    E_ANA: ANA, op_ana, privilege = 3, jfield = true, immediate = true, Both;
    E_AMA: AMA, op_ama, privilege = 3, jfield = true, immediate = true, Both;
    E_ANMA: ANMA, op_anma, privilege = 3, jfield = true, immediate = true, Both;
    E_AU: AU, op_au, privilege = 3, jfield = true, immediate = true, Both;
    E_ANU: ANU, op_anu, privilege = 3, jfield = true, immediate = true, Both;
    E_AX: AX, op_ax, privilege = 3, jfield = true, immediate = true, Both;
    E_ANX: ANX, op_anx, privilege = 3, jfield = true, immediate = true, Both;
    E_MI: MI, op_mi, privilege = 3, jfield = true, immediate = true, Both;
    E_DI: DI, op_di, privilege = 3, jfield = true, immediate = true, Both;
    E_OR: OR, op_or, privilege = 3, jfield = true, immediate = true, Both;
    E_XOR: XOR, op_xor, privilege = 3, jfield = true, immediate = true, Both;
    E_AND: AND, op_and, privilege = 3, jfield = true, immediate = true, Both;

    E_FA: FA, op_fa, privilege = 3, jfield = false, immediate = false, Both;
    E_FAN: FAN, op_fan, privilege = 3, jfield = false, immediate = false, Both;
    E_FM: FM, op_fm, privilege = 3, jfield = false, immediate = false, Both;
    E_FD: FD, op_fd, privilege = 3, jfield = false, immediate = false, Both;

    E_SSC: SSC, op_ssc, privilege = 3, jfield = false, immediate = false, Both;
    E_DSC: DSC, op_dsc, privilege = 3, jfield = false, immediate = false, Both;
    E_SSL: SSL, op_ssl, privilege = 3, jfield = false, immediate = false, Both;
    E_DSL: DSL, op_dsl, privilege = 3, jfield = false, immediate = false, Both;
    E_SSA: SSA, op_ssa, privilege = 3, jfield = false, immediate = false, Both;
    E_DSA: DSA, op_dsa, privilege = 3, jfield = false, immediate = false, Both;
    E_LSC: LSC, op_lsc, privilege = 3, jfield = false, immediate = false, Both;
    E_DLSC: DLSC, op_dlsc, privilege = 3, jfield = false, immediate = false, Both;
    E_LSSC: LSSC, op_lssc, privilege = 3, jfield = false, immediate = false, Both;
    E_LDSC: LDSC, op_ldsc, privilege = 3, jfield = false, immediate = false, Both;
    E_LSSL: LSSL, op_lssl, privilege = 3, jfield = false, immediate = false, Both;
    E_LDSL: LDSL, op_ldsl, privilege = 3, jfield = false, immediate = false, Both;

    E_J: J, op_j, privilege = 3, jfield = false, immediate = false, Both;
    E_JK: JK, op_jk, privilege = 3, jfield = false, immediate = false, Both;
    E_HLTJ: HLTJ, op_hltj, privilege = 1, jfield = false, immediate = false, Both;
    E_SLJ: SLJ, op_slj, privilege = 3, jfield = false, immediate = false, BasicOnly;
    E_LMJ: LMJ, op_lmj, privilege = 3, jfield = false, immediate = false, Both;
    E_JZ: JZ, op_jz, privilege = 3, jfield = false, immediate = false, Both;
    E_JNZ: JNZ, op_jnz, privilege = 3, jfield = false, immediate = false, Both;
    E_JP: JP, op_jp, privilege = 3, jfield = false, immediate = false, Both;
    E_JN: JN, op_jn, privilege = 3, jfield = false, immediate = false, Both;
    E_JO: JO, op_jo, privilege = 3, jfield = false, immediate = false, Both;
    E_JNO: JNO, op_jno, privilege = 3, jfield = false, immediate = false, Both;
    E_JC: JC, op_jc, privilege = 3, jfield = false, immediate = false, Both;
    E_JNC: JNC, op_jnc, privilege = 3, jfield = false, immediate = false, Both;

    E_TZ: TZ, op_tz, privilege = 3, jfield = true, immediate = true, Both;
    E_TNZ: TNZ, op_tnz, privilege = 3, jfield = true, immediate = true, Both;
    E_TE: TE, op_te, privilege = 3, jfield = true, immediate = true, Both;
    E_TNE: TNE, op_tne, privilege = 3, jfield = true, immediate = true, Both;
    E_TLE: TLE, op_tle, privilege = 3, jfield = true, immediate = true, Both;
    E_TG: TG, op_tg, privilege = 3, jfield = true, immediate = true, Both;
    E_TS: TS, op_ts, privilege = 3, jfield = false, immediate = false, Both;
    E_TSS: TSS, op_tss, privilege = 3, jfield = false, immediate = false, Both;
    E_TCS: TCS, op_tcs, privilege = 3, jfield = false, immediate = false, Both;

    E_LD: LD, op_ld, privilege = 0, jfield = false, immediate = false, Both;
    E_SD: SD, op_sd, privilege = 2, jfield = false, immediate = false, Both;
    E_RDC: RDC, op_rdc, privilege = 2, jfield = false, immediate = false, Both;
    E_SDC: SDC, op_sdc, privilege = 0, jfield = false, immediate = false, Both;
    E_SGNL: SGNL, op_sgnl, privilege = 2, jfield = false, immediate = false, Both;
    E_BUY: BUY, op_buy, privilege = 3, jfield = false, immediate = false, Both;
    E_SELL: SELL, op_sell, privilege = 3, jfield = false, immediate = false, Both;
    E_HALT: HALT, op_halt, privilege = 0, jfield = false, immediate = false, Both;
);

/// Look up the entry for a decoded instruction, or `None` when the
/// code is unassigned (an invalid-instruction condition).
#[must_use]
pub fn lookup(f: u8, j: u8, a: u8, basic_mode: bool) -> Option<&'static FunctionTableEntry> {
    let entry: &'static FunctionTableEntry = match f {
        0o01 => &E_SA,
        0o02 => &E_SNA,
        0o03 => &E_SMA,
        0o04 => &E_SR,
        0o05 => match a {
            0o00 => &E_SZ,
            0o01 => &E_SNZ,
            0o02 => &E_SP1,
            0o03 => &E_SN1,
            0o04 => &E_SFS,
            0o05 => &E_SFZ,
            0o06 => &E_SAS,
            0o07 => &E_SAZ,
            0o10 => &E_INC,
            0o11 => &E_DEC,
            0o12 => &E_INC2,
            0o13 => &E_DEC2,
            0o14 => &E_ENZ,
            0o15 => &E_ADD1,
            0o16 => &E_SUB1,
            _ => return None,
        },
        0o06 => &E_SX,
        0o10 => &E_LA,
        0o11 => &E_LNA,
        0o12 => &E_LMA,
        0o13 => &E_LNMA,
        0o14 => &E_AA,
        0o15 => &E_ANA,
        0o16 => &E_AMA,
        0o17 => &E_ANMA,
        0o20 => &E_AU,
        0o21 => &E_ANU,
        0o23 => &E_LR,
        0o24 => &E_AX,
        0o25 => &E_ANX,
        0o26 => &E_LXM,
        0o27 => &E_LX,
        0o30 => &E_MI,
        0o34 => &E_DI,
        0o40 => &E_OR,
        0o41 => &E_XOR,
        0o42 => &E_AND,
        0o46 => &E_LXI,
        0o50 => &E_TZ,
        0o51 => &E_TNZ,
        0o52 => &E_TE,
        0o53 => &E_TNE,
        0o54 => &E_TLE,
        0o55 => &E_TG,
        0o71 => match j {
            0o12 => &E_DS,
            0o13 => &E_DL,
            _ => return None,
        },
        0o72 => match j {
            0o01 => &E_SLJ,
            _ => return None,
        },
        0o73 => match j {
            0o00 => &E_SSC,
            0o01 => &E_DSC,
            0o02 => &E_SSL,
            0o03 => &E_DSL,
            0o04 => &E_SSA,
            0o05 => &E_DSA,
            0o06 => &E_LSC,
            0o07 => &E_DLSC,
            0o10 => &E_LSSC,
            0o11 => &E_LDSC,
            0o12 => &E_LSSL,
            0o13 => &E_LDSL,
            0o15 => match a {
                0o00 => &E_LD,
                0o01 => &E_SD,
                0o02 => &E_RDC,
                0o03 => &E_SDC,
                0o17 => &E_SGNL,
                _ => return None,
            },
            0o17 => match a {
                0o00 => &E_TS,
                0o01 => &E_TSS,
                0o02 => &E_TCS,
                0o03 => &E_BUY,
                0o04 => &E_SELL,
                _ => return None,
            },
            _ => return None,
        },
        0o74 => match j {
            0o00 => &E_JZ,
            0o01 => &E_JNZ,
            0o02 => &E_JP,
            0o03 => &E_JN,
            // J and JK share the code point; a selects the jump key.
            0o04 => {
                if a == 0 {
                    &E_J
                } else {
                    &E_JK
                }
            }
            0o05 => &E_HLTJ,
            0o13 => &E_LMJ,
            0o14 => &E_JO,
            0o15 => &E_JNO,
            0o16 => &E_JC,
            0o17 => &E_JNC,
            _ => return None,
        },
        0o76 => match j {
            0o00 => &E_FA,
            0o01 => &E_FAN,
            0o02 => &E_FM,
            0o03 => &E_FD,
            _ => return None,
        },
        0o77 => {
            if j == 0o17 && a == 0o17 {
                &E_HALT
            } else {
                return None;
            }
        }
        _ => return None,
    };
    match entry.modes {
        InstructionModes::Both => Some(entry),
        InstructionModes::BasicOnly => basic_mode.then_some(entry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_simple_function_codes() {
        assert_eq!(lookup(0o10, 0, 0, false).map(|e| e.mnemonic), Some(Mnemonic::LA));
        assert_eq!(lookup(0o01, 0, 5, false).map(|e| e.mnemonic), Some(Mnemonic::SA));
        assert_eq!(lookup(0o27, 0o16, 3, true).map(|e| e.mnemonic), Some(Mnemonic::LX));
    }

    #[test]
    fn test_lookup_sub_decodes() {
        assert_eq!(lookup(0o05, 0, 0o02, false).map(|e| e.mnemonic), Some(Mnemonic::SP1));
        assert_eq!(lookup(0o73, 0o06, 4, false).map(|e| e.mnemonic), Some(Mnemonic::LSC));
        assert_eq!(lookup(0o73, 0o17, 0, true).map(|e| e.mnemonic), Some(Mnemonic::TS));
        assert_eq!(lookup(0o74, 0o04, 0, false).map(|e| e.mnemonic), Some(Mnemonic::J));
        assert_eq!(lookup(0o74, 0o04, 5, false).map(|e| e.mnemonic), Some(Mnemonic::JK));
        assert_eq!(lookup(0o77, 0o17, 0o17, false).map(|e| e.mnemonic), Some(Mnemonic::HALT));
    }

    #[test]
    fn test_lookup_unassigned_codes_miss() {
        assert!(lookup(0o07, 0, 0, false).is_none());
        assert!(lookup(0o05, 0, 0o17, false).is_none());
        assert!(lookup(0o73, 0o14, 0, false).is_none());
        assert!(lookup(0o77, 0, 0, false).is_none());
    }

    #[test]
    fn test_basic_only_instructions() {
        assert_eq!(lookup(0o72, 0o01, 0, true).map(|e| e.mnemonic), Some(Mnemonic::SLJ));
        assert!(lookup(0o72, 0o01, 0, false).is_none());
    }

    #[test]
    fn test_privilege_annotations() {
        assert_eq!(lookup(0o74, 0o05, 0, false).map(|e| e.maximum_privilege), Some(1));
        assert_eq!(lookup(0o73, 0o15, 0o03, false).map(|e| e.maximum_privilege), Some(0));
        assert_eq!(lookup(0o10, 0, 0, false).map(|e| e.maximum_privilege), Some(3));
    }
}
