//! Relocation operation table types.
//!
//! Every supported target architecture compiles one static table mapping the
//! numeric relocation codes of its object format to a [`RelocEntry`]: the
//! arithmetic action to perform plus the info describing symbol use, field
//! access, signedness, expression-stack use, and scaling. The tables live in
//! [`crate::arch`]; the dispatcher only ever consults them through
//! [`Lookup`].

use crate::codec::{FieldSign, FieldSpec};
use bitflags::bitflags;

/// Arithmetic performed by one relocation record.
///
/// The first group operates on the field value and the resolved relocation
/// amount. The second group are the expression operators that combine the
/// record's value with the top of the expression stack. The last group are
/// target-specific extensions dispatched like any other action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelocAction {
    /// Pass the unpacked field value through unchanged.
    Value,
    /// Replace the field with the resolved amount.
    Assign,
    /// Add the resolved amount to the field.
    Add,
    /// PC-relative adjustment: `field + amount - delta_run_addr`, with the
    /// amount forced to zero for an absolute target.
    PcRelative,
    /// `field + record.disp + amount`.
    AddDisp,
    /// Capture the current section's run address plus the amount.
    AssignPc,

    /// `popped + value`.
    Plus,
    /// `popped - value`.
    Sub,
    /// `-popped`.
    Neg,
    /// `popped * value`.
    Mul,
    /// `popped / value`.
    Div,
    /// `popped % value`.
    Mod,
    /// `popped >> value`, logical.
    Shr,
    /// `popped >> value`, arithmetic.
    Ashr,
    /// `popped << value`.
    Shl,
    /// `popped & value`.
    And,
    /// `popped | value`.
    Or,
    /// `popped ^ value`.
    Xor,
    /// `!popped`, bitwise.
    Not,

    /// Offset from the lazily-resolved base symbol:
    /// `field + amount - base`.
    BaseRelative,
    /// `field + record.disp + amount` with a power-of-two alignment check
    /// against the entry's scale.
    ScaledAdd,
    /// Low half of a split constant: `(field + amount) & 0xffff`.
    Lo16,
}

/// Which part of the referenced symbol supplies the relocation amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolUse {
    /// No symbol reference; the record's raw constant is the amount.
    None,
    /// The symbol's relocated value.
    Value,
    /// The symbol's original file value.
    Delta,
}

/// Expression-stack behavior of a table entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackOp {
    None,
    /// Push the computed value for a later record.
    Push,
    /// Pop the prior top into the working value before the write-back path.
    Pop,
    /// Pop the prior top as the left operand of a binary action.
    Binary,
    /// Pop the prior top and transform it alone.
    Unary,
    /// Discard the whole stack (end of a composite expression).
    Clear,
}

bitflags! {
    /// Field access required by a table entry.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct RelocFlags: u8 {
        /// The current field value participates in the computation.
        const READS_FIELD = 1 << 0;
        /// The result is packed back into the field.
        const WRITES_FIELD = 1 << 1;
        /// Shorthand for entries that both read and write.
        const RW = Self::READS_FIELD.bits() | Self::WRITES_FIELD.bits();
    }
}

/// One row of a target's relocation operation table. Static, never mutated.
#[derive(Clone, Copy, Debug)]
pub struct RelocEntry {
    pub action: RelocAction,
    pub symbol: SymbolUse,
    pub flags: RelocFlags,
    pub sign: FieldSign,
    pub stack: StackOp,
    /// Left shift applied to the field value after unpacking and undone
    /// before repacking. Also the alignment exponent of [`RelocAction::ScaledAdd`].
    pub scale: u8,
    /// Table-defined field geometry; `None` takes the geometry from the
    /// record itself.
    pub field: Option<FieldSpec>,
}

impl RelocEntry {
    /// Table row for a relocation that manipulates a field of the image.
    pub(crate) const fn field_op(
        action: RelocAction,
        symbol: SymbolUse,
        flags: RelocFlags,
        sign: FieldSign,
        scale: u8,
        size: u16,
        offset: u16,
    ) -> Self {
        Self {
            action,
            symbol,
            flags,
            sign,
            stack: StackOp::None,
            scale,
            field: Some(FieldSpec { size, offset }),
        }
    }

    /// Table row for an expression operator.
    pub(crate) const fn expr_op(action: RelocAction, symbol: SymbolUse, stack: StackOp) -> Self {
        Self {
            action,
            symbol,
            flags: RelocFlags::empty(),
            sign: FieldSign::Unsigned,
            stack,
            scale: 0,
            field: None,
        }
    }

    /// Table row for an expression operator that accesses a record-described
    /// field (the load/store-field operators).
    pub(crate) const fn expr_field_op(
        flags: RelocFlags,
        sign: FieldSign,
        stack: StackOp,
    ) -> Self {
        Self {
            action: RelocAction::Value,
            symbol: SymbolUse::None,
            flags,
            sign,
            stack,
            scale: 0,
            field: None,
        }
    }
}

/// Result of a relocation-type lookup.
///
/// The table itself never classifies unknown codes as errors: a small set of
/// codes are assembler hints that must be accepted and ignored, and only the
/// dispatcher decides that everything else is fatal for the record.
#[derive(Clone, Copy, Debug)]
pub enum Lookup {
    /// The code maps to exactly one table entry.
    Entry(&'static RelocEntry),
    /// The code is a compiler/assembler hint with no load-time effect.
    Ignored,
    /// The code is not part of this target's table.
    Unknown,
}
