//! Target architectures supported by the loader.
//!
//! Each submodule compiles the static relocation operation table of one DSP
//! family and describes its addressing geometry. The dispatcher is fully
//! table-driven; adding a target means adding a module with its own
//! [`TargetArch`] instance and table, without touching the dispatcher.

pub mod c5500;
pub mod c6000;

use crate::codec::Endian;
use crate::codec::FieldSign::{Signed as SGN, Unsigned as UNS};
use crate::table::{Lookup, RelocAction, RelocEntry, RelocFlags, StackOp, SymbolUse};

/// Description of one target architecture.
///
/// One static instance exists per supported target; the loader state borrows
/// it for the duration of a load.
pub struct TargetArch {
    /// Machine identifier from the object file header.
    pub machine: u16,
    /// Default byte order of target memory.
    pub endian: Endian,
    /// Width in bits of the target addressable unit.
    pub tau_bits: u32,
    /// Width in bits of the target word containing word-addressed fields.
    pub word_bits: u32,
    /// Name of the lazily-resolved base symbol of base-relative relocations.
    pub base_symbol: &'static str,
    pub(crate) ops: fn(u16) -> Lookup,
}

impl TargetArch {
    /// Looks up the table entry for a relocation-type code.
    #[inline]
    pub fn lookup(&self, reloc_type: u16) -> Lookup {
        (self.ops)(reloc_type)
    }
}

/// Maps an object-file machine identifier to its architecture description.
pub fn by_machine(machine: u16) -> Option<&'static TargetArch> {
    [&c6000::TARGET, &c5500::TARGET]
        .into_iter()
        .find(|arch| arch.machine == machine)
}

// The expression operators are shared by every target's object format; the
// per-target tables fall back to this table for codes they do not define
// themselves.

pub const RE_ADD: u16 = 0x4000;
pub const RE_SUB: u16 = 0x4001;
pub const RE_NEG: u16 = 0x4002;
pub const RE_MPY: u16 = 0x4003;
pub const RE_DIV: u16 = 0x4004;
pub const RE_MOD: u16 = 0x4005;
pub const RE_SR: u16 = 0x4006;
pub const RE_ASR: u16 = 0x4007;
pub const RE_SL: u16 = 0x4008;
pub const RE_AND: u16 = 0x4009;
pub const RE_OR: u16 = 0x400a;
pub const RE_XOR: u16 = 0x400b;
pub const RE_NOTB: u16 = 0x400c;
/// Load field, push it zero-extended.
pub const RE_ULDFLD: u16 = 0x400d;
/// Load field, push it sign-extended.
pub const RE_SLDFLD: u16 = 0x400e;
/// Pop, store into an unsigned field.
pub const RE_USTFLD: u16 = 0x400f;
/// Pop, store into a signed field.
pub const RE_SSTFLD: u16 = 0x4010;
/// Push the referenced symbol's value.
pub const RE_PUSH: u16 = 0x4011;
/// Push a signed constant.
pub const RE_PUSHSK: u16 = 0x4012;
/// Push an unsigned constant.
pub const RE_PUSHUK: u16 = 0x4013;
/// Push the current section's run address.
pub const RE_PUSHPC: u16 = 0x4014;
pub const RE_DUMMY: u16 = 0x4015;
/// End of a composite expression.
pub const RE_XPEND: u16 = 0x4016;

static ADD: RelocEntry = RelocEntry::expr_op(RelocAction::Plus, SymbolUse::Value, StackOp::Binary);
static SUB: RelocEntry = RelocEntry::expr_op(RelocAction::Sub, SymbolUse::Value, StackOp::Binary);
static NEG: RelocEntry = RelocEntry::expr_op(RelocAction::Neg, SymbolUse::Value, StackOp::Unary);
static MPY: RelocEntry = RelocEntry::expr_op(RelocAction::Mul, SymbolUse::Value, StackOp::Binary);
static DIV: RelocEntry = RelocEntry::expr_op(RelocAction::Div, SymbolUse::Value, StackOp::Binary);
static MOD: RelocEntry = RelocEntry::expr_op(RelocAction::Mod, SymbolUse::Value, StackOp::Binary);
static SR: RelocEntry = RelocEntry::expr_op(RelocAction::Shr, SymbolUse::Value, StackOp::Binary);
static ASR: RelocEntry = RelocEntry::expr_op(RelocAction::Ashr, SymbolUse::Value, StackOp::Binary);
static SL: RelocEntry = RelocEntry::expr_op(RelocAction::Shl, SymbolUse::Value, StackOp::Binary);
static AND: RelocEntry = RelocEntry::expr_op(RelocAction::And, SymbolUse::Value, StackOp::Binary);
static OR: RelocEntry = RelocEntry::expr_op(RelocAction::Or, SymbolUse::Value, StackOp::Binary);
static XOR: RelocEntry = RelocEntry::expr_op(RelocAction::Xor, SymbolUse::Value, StackOp::Binary);
static NOTB: RelocEntry = RelocEntry::expr_op(RelocAction::Not, SymbolUse::Value, StackOp::Unary);
static ULDFLD: RelocEntry = RelocEntry::expr_field_op(RelocFlags::READS_FIELD, UNS, StackOp::Push);
static SLDFLD: RelocEntry = RelocEntry::expr_field_op(RelocFlags::READS_FIELD, SGN, StackOp::Push);
static USTFLD: RelocEntry = RelocEntry::expr_field_op(RelocFlags::WRITES_FIELD, UNS, StackOp::Pop);
static SSTFLD: RelocEntry = RelocEntry::expr_field_op(RelocFlags::WRITES_FIELD, SGN, StackOp::Pop);
static PUSH: RelocEntry = RelocEntry::expr_op(RelocAction::Assign, SymbolUse::Value, StackOp::Push);
static PUSHSK: RelocEntry = RelocEntry::expr_op(RelocAction::Assign, SymbolUse::None, StackOp::Push);
static PUSHUK: RelocEntry = RelocEntry::expr_op(RelocAction::Assign, SymbolUse::None, StackOp::Push);
static PUSHPC: RelocEntry =
    RelocEntry::expr_op(RelocAction::AssignPc, SymbolUse::None, StackOp::Push);
static DUMMY: RelocEntry = RelocEntry::expr_op(RelocAction::Value, SymbolUse::None, StackOp::None);
static XPEND: RelocEntry = RelocEntry::expr_op(RelocAction::Value, SymbolUse::None, StackOp::Clear);

pub(crate) fn expression(code: u16) -> Lookup {
    match code {
        RE_ADD => Lookup::Entry(&ADD),
        RE_SUB => Lookup::Entry(&SUB),
        RE_NEG => Lookup::Entry(&NEG),
        RE_MPY => Lookup::Entry(&MPY),
        RE_DIV => Lookup::Entry(&DIV),
        RE_MOD => Lookup::Entry(&MOD),
        RE_SR => Lookup::Entry(&SR),
        RE_ASR => Lookup::Entry(&ASR),
        RE_SL => Lookup::Entry(&SL),
        RE_AND => Lookup::Entry(&AND),
        RE_OR => Lookup::Entry(&OR),
        RE_XOR => Lookup::Entry(&XOR),
        RE_NOTB => Lookup::Entry(&NOTB),
        RE_ULDFLD => Lookup::Entry(&ULDFLD),
        RE_SLDFLD => Lookup::Entry(&SLDFLD),
        RE_USTFLD => Lookup::Entry(&USTFLD),
        RE_SSTFLD => Lookup::Entry(&SSTFLD),
        RE_PUSH => Lookup::Entry(&PUSH),
        RE_PUSHSK => Lookup::Entry(&PUSHSK),
        RE_PUSHUK => Lookup::Entry(&PUSHUK),
        RE_PUSHPC => Lookup::Entry(&PUSHPC),
        RE_DUMMY => Lookup::Entry(&DUMMY),
        RE_XPEND => Lookup::Entry(&XPEND),
        _ => Lookup::Unknown,
    }
}
