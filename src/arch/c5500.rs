//! TMS320C55x relocation support.
//!
//! The C55x addresses data memory in 16-bit units, so a record's target
//! address is converted to host bytes by the dispatcher rather than used
//! directly. Extended data addresses are split across page-register fields,
//! which is where the scaled entries below come from.

use super::{TargetArch, expression};
use crate::codec::Endian;
use crate::codec::FieldSign::{Signed as SGN, SignedTol1 as TOL1, Unsigned as UNS};
use crate::table::RelocAction::*;
use crate::table::{Lookup, RelocEntry, RelocFlags, SymbolUse};

/// Object-file machine identifier of the C55x family.
pub const MACHINE: u16 = 0x009c;

pub const R_ABS: u16 = 0x0000;
pub const R_RELWORD: u16 = 0x0010;
pub const R_RELLONG: u16 = 0x0011;
pub const R_LD3_DMA: u16 = 0x0170;
pub const R_LD3_MDP: u16 = 0x0172;
pub const R_LD3_PDP: u16 = 0x0173;
pub const R_LD3_REL23: u16 = 0x0178;

pub static TARGET: TargetArch = TargetArch {
    machine: MACHINE,
    endian: Endian::Little,
    tau_bits: 16,
    word_bits: 32,
    base_symbol: ".bss",
    ops: lookup,
};

const VAL: SymbolUse = SymbolUse::Value;
const W: RelocFlags = RelocFlags::WRITES_FIELD;
const RW: RelocFlags = RelocFlags::RW;

static ABS: RelocEntry = RelocEntry::expr_op(Value, SymbolUse::None, crate::table::StackOp::None);
static RELWORD: RelocEntry = RelocEntry::field_op(Assign, VAL, W, TOL1, 0, 16, 0);
static RELLONG: RelocEntry = RelocEntry::field_op(Assign, VAL, W, UNS, 0, 32, 0);
// Direct memory address with an instruction-encoded displacement.
static DMA: RelocEntry = RelocEntry::field_op(AddDisp, VAL, RW, UNS, 0, 16, 0);
// Memory/peripheral data page registers hold the address bits above the page.
static MDP: RelocEntry = RelocEntry::field_op(Add, VAL, RW, UNS, 16, 7, 0);
static PDP: RelocEntry = RelocEntry::field_op(Add, VAL, RW, UNS, 7, 9, 0);
static REL23: RelocEntry = RelocEntry::field_op(Add, VAL, RW, SGN, 0, 23, 0);

fn lookup(code: u16) -> Lookup {
    match code {
        R_ABS => Lookup::Entry(&ABS),
        R_RELWORD => Lookup::Entry(&RELWORD),
        R_RELLONG => Lookup::Entry(&RELLONG),
        R_LD3_DMA => Lookup::Entry(&DMA),
        R_LD3_MDP => Lookup::Entry(&MDP),
        R_LD3_PDP => Lookup::Entry(&PDP),
        R_LD3_REL23 => Lookup::Entry(&REL23),
        _ => expression(code),
    }
}
