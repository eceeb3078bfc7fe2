//! # dsp_loader
//! A `safe`, `lightweight` relocation engine for loading DSP relocatable
//! object images.
//! ## Usage
//! The crate implements the target-parameterized core of a dynamic code
//! loader: given the section directory, the resolved local symbols, and the
//! in-memory image of a section, it processes that section's relocation
//! records one by one, rewriting arbitrary-width bit fields with explicit
//! endianness and target-word-size handling, overflow detection, and a small
//! expression stack for composite relocations. Parsing the object container
//! and moving the finished image to target memory belong to the surrounding
//! loader.
//! ## Example
//! ```
//! use dsp_loader::{
//!     LoadOptions, LoaderState, LocalSymbol, RelocationRecord, SectionInfo, SymbolTable, arch,
//! };
//!
//! let mut state = LoaderState::new(&arch::c6000::TARGET, LoadOptions::empty(), |diag| {
//!     panic!("{}: {}", diag.section, diag.message);
//! });
//! state.set_symbols(SymbolTable::new([(
//!     "_entry".into(),
//!     LocalSymbol { value: 0x1000, delta: 0, section: 1, class: 2 },
//! )]));
//! state.set_sections(vec![SectionInfo {
//!     name: ".text".into(),
//!     load_addr: 0,
//!     run_addr: 0x8000_0000,
//!     size: 0x100,
//! }]);
//! state.begin_section(0, 0).unwrap();
//!
//! let mut image = [0u8; 8];
//! let record = RelocationRecord {
//!     target_vaddr: 0,
//!     reloc_type: arch::c6000::R_RELLONG,
//!     symbol_index: 0,
//!     ..Default::default()
//! };
//! state.relocate(&mut image, &record).unwrap();
//! assert_eq!(u32::from_le_bytes(image[0..4].try_into().unwrap()), 0x1000);
//! ```
#![no_std]
extern crate alloc;

pub mod arch;
mod codec;
mod error;
mod relocate;
mod section;
mod stack;
mod state;
mod symbol;
mod table;

pub use codec::{BitCursor, Endian, FieldOverflow, FieldSign, FieldSpec};
pub use error::Error;
pub use relocate::RelocationRecord;
pub use section::SectionInfo;
pub use stack::EXPR_STACK_DEPTH;
pub use state::{Diagnostic, LoadOptions, LoaderState};
pub use symbol::{CURRENT_SECTION, LocalSymbol, SymbolTable};
pub use table::{Lookup, RelocAction, RelocEntry, RelocFlags, StackOp, SymbolUse};

/// Signed intermediate type of all relocation arithmetic.
pub type Rvalue = i32;
/// Unsigned counterpart of [`Rvalue`], used for masking and overflow
/// arithmetic.
pub type Urvalue = u32;

pub type Result<T> = core::result::Result<T, Error>;
