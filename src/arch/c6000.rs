//! TMS320C6000 relocation support.
//!
//! The C6000 family is byte addressable with 32-bit instruction words and may
//! run either byte order; the file header's byte-order mark decides, which the
//! caller feeds in through the loader options. Branch displacements and
//! DP-relative offsets are scaled by the access size, so most instruction
//! relocations carry a scale and the DP-relative form checks the implied
//! alignment.

use super::{TargetArch, expression};
use crate::codec::Endian;
use crate::codec::FieldSign::{Signed as SGN, SignedTol1 as TOL1, Unsigned as UNS};
use crate::table::RelocAction::*;
use crate::table::{Lookup, RelocEntry, RelocFlags, SymbolUse};

/// Object-file machine identifier of the C6000 family.
pub const MACHINE: u16 = 0x0099;

pub const R_ABS: u16 = 0x0000;
pub const R_RELBYTE: u16 = 0x000f;
pub const R_RELWORD: u16 = 0x0010;
pub const R_RELLONG: u16 = 0x0011;
pub const R_C60BASE: u16 = 0x0050;
pub const R_C60DIR15: u16 = 0x0051;
pub const R_C60PCR21: u16 = 0x0052;
pub const R_C60PCR10: u16 = 0x0053;
pub const R_C60LO16: u16 = 0x0054;
pub const R_C60HI16: u16 = 0x0055;
pub const R_C60SECT: u16 = 0x0056;
pub const R_C60S16: u16 = 0x0057;
pub const R_C60PCR7: u16 = 0x0070;
pub const R_C60PCR12: u16 = 0x0071;
/// Alignment hint, no load-time effect.
pub const R_C60ALIGN: u16 = 0x0076;
/// No-compress hint, no load-time effect.
pub const R_C60NOCMP: u16 = 0x0077;
/// Frame-pointer hint, no load-time effect.
pub const R_C60FPHEAD: u16 = 0x0078;

pub static TARGET: TargetArch = TargetArch {
    machine: MACHINE,
    endian: Endian::Little,
    tau_bits: 8,
    word_bits: 32,
    base_symbol: ".bss",
    ops: lookup,
};

const VAL: SymbolUse = SymbolUse::Value;
const W: RelocFlags = RelocFlags::WRITES_FIELD;
const RW: RelocFlags = RelocFlags::RW;

static ABS: RelocEntry = RelocEntry::expr_op(Value, SymbolUse::None, crate::table::StackOp::None);
static RELBYTE: RelocEntry = RelocEntry::field_op(Assign, VAL, W, TOL1, 0, 8, 0);
static RELWORD: RelocEntry = RelocEntry::field_op(Assign, VAL, W, TOL1, 0, 16, 0);
static RELLONG: RelocEntry = RelocEntry::field_op(Assign, VAL, W, UNS, 0, 32, 0);
// DP-relative load/store offset, scaled by the word access size.
static BASE: RelocEntry = RelocEntry::field_op(BaseRelative, VAL, W, UNS, 2, 15, 8);
static DIR15: RelocEntry = RelocEntry::field_op(ScaledAdd, VAL, RW, UNS, 2, 15, 8);
// Branch displacements count instruction words.
static PCR21: RelocEntry = RelocEntry::field_op(PcRelative, VAL, RW, SGN, 2, 21, 7);
static PCR10: RelocEntry = RelocEntry::field_op(PcRelative, VAL, RW, SGN, 2, 10, 13);
static PCR7: RelocEntry = RelocEntry::field_op(PcRelative, VAL, RW, SGN, 2, 7, 16);
static PCR12: RelocEntry = RelocEntry::field_op(PcRelative, VAL, RW, SGN, 2, 12, 16);
// MVKL/MVKH constant halves.
static LO16: RelocEntry = RelocEntry::field_op(Lo16, VAL, RW, UNS, 0, 16, 7);
static HI16: RelocEntry = RelocEntry::field_op(Add, VAL, RW, TOL1, 16, 16, 7);
static SECT: RelocEntry = RelocEntry::field_op(Assign, SymbolUse::Delta, W, UNS, 0, 32, 0);
static S16: RelocEntry = RelocEntry::field_op(Add, VAL, RW, SGN, 0, 16, 7);

fn lookup(code: u16) -> Lookup {
    match code {
        R_ABS => Lookup::Entry(&ABS),
        R_RELBYTE => Lookup::Entry(&RELBYTE),
        R_RELWORD => Lookup::Entry(&RELWORD),
        R_RELLONG => Lookup::Entry(&RELLONG),
        R_C60BASE => Lookup::Entry(&BASE),
        R_C60DIR15 => Lookup::Entry(&DIR15),
        R_C60PCR21 => Lookup::Entry(&PCR21),
        R_C60PCR10 => Lookup::Entry(&PCR10),
        R_C60LO16 => Lookup::Entry(&LO16),
        R_C60HI16 => Lookup::Entry(&HI16),
        R_C60SECT => Lookup::Entry(&SECT),
        R_C60S16 => Lookup::Entry(&S16),
        R_C60PCR7 => Lookup::Entry(&PCR7),
        R_C60PCR12 => Lookup::Entry(&PCR12),
        R_C60ALIGN | R_C60NOCMP | R_C60FPHEAD => Lookup::Ignored,
        _ => expression(code),
    }
}

/// Map a C6000 relocation type to a human readable name
pub fn reloc_type_str(reloc_type: u16) -> &'static str {
    match reloc_type {
        R_ABS => "R_ABS",
        R_RELBYTE => "R_RELBYTE",
        R_RELWORD => "R_RELWORD",
        R_RELLONG => "R_RELLONG",
        R_C60BASE => "R_C60BASE",
        R_C60DIR15 => "R_C60DIR15",
        R_C60PCR21 => "R_C60PCR21",
        R_C60PCR10 => "R_C60PCR10",
        R_C60LO16 => "R_C60LO16",
        R_C60HI16 => "R_C60HI16",
        R_C60SECT => "R_C60SECT",
        R_C60S16 => "R_C60S16",
        R_C60PCR7 => "R_C60PCR7",
        R_C60PCR12 => "R_C60PCR12",
        R_C60ALIGN => "R_C60ALIGN",
        R_C60NOCMP => "R_C60NOCMP",
        R_C60FPHEAD => "R_C60FPHEAD",
        _ => "UNKNOWN",
    }
}
