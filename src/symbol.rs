//! Local symbol table of one load operation.
//!
//! The upstream object-file parser resolves the input's symbol entries into
//! an array of [`LocalSymbol`]s before relocation begins. Relocation records
//! reference symbols by index; the by-name table exists for the handful of
//! well-known symbols the engine must find itself (the lazily-resolved base
//! symbol of base-relative relocations). It uses the hashbrown crate for
//! efficient hash table operations.

use crate::Rvalue;
use alloc::{boxed::Box, string::String, vec::Vec};
use core::hash::{Hash, Hasher};
use foldhash::{SharedSeed, fast::FoldHasher};
use hashbrown::HashTable;

/// Relocation-record symbol index that refers to the section currently being
/// relocated instead of a symbol table entry.
pub const CURRENT_SECTION: i32 = -1;

/// One resolved symbol of the input object. Read-only during relocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalSymbol {
    /// Relocated value.
    pub value: Rvalue,
    /// Original value in the input file.
    pub delta: Rvalue,
    /// Section the symbol is defined in.
    pub section: i16,
    /// Storage class from the input file.
    pub class: i16,
}

struct NameEntry {
    name: Box<str>,
    idx: usize,
}

const HASHER: FoldHasher<'static> = FoldHasher::with_seed(0, SharedSeed::global_fixed());

/// Symbol table of a load operation: the index-ordered symbol array plus a
/// name index over it.
pub struct SymbolTable {
    symbols: Box<[LocalSymbol]>,
    by_name: HashTable<NameEntry>,
}

impl SymbolTable {
    /// Builds the table from `(name, symbol)` pairs in symbol-index order.
    ///
    /// When two symbols share a name the first one wins the name index, which
    /// matches the first-definition rule of the input format; both remain
    /// reachable by index.
    pub fn new(symbols: impl IntoIterator<Item = (String, LocalSymbol)>) -> Self {
        let mut array = Vec::new();
        let mut by_name = HashTable::new();
        for (idx, (name, symbol)) in symbols.into_iter().enumerate() {
            array.push(symbol);
            let hash = Self::hash(name.as_bytes());
            if by_name
                .find(hash, |entry: &NameEntry| &*entry.name == name.as_str())
                .is_none()
            {
                by_name.insert_unique(
                    hash,
                    NameEntry {
                        name: name.into_boxed_str(),
                        idx,
                    },
                    |entry| Self::hash(entry.name.as_bytes()),
                );
            }
        }
        Self {
            symbols: array.into_boxed_slice(),
            by_name,
        }
    }

    /// An empty table, for loads of objects without symbols.
    pub fn empty() -> Self {
        Self {
            symbols: Box::new([]),
            by_name: HashTable::new(),
        }
    }

    fn hash(name: &[u8]) -> u64 {
        let mut hasher = HASHER.clone();
        name.hash(&mut hasher);
        hasher.finish()
    }

    /// Gets the symbol at a relocation record's symbol index.
    #[inline]
    pub fn get(&self, idx: usize) -> Option<&LocalSymbol> {
        self.symbols.get(idx)
    }

    /// Looks up a symbol by name.
    pub fn lookup_by_name(&self, name: &str) -> Option<&LocalSymbol> {
        let hash = Self::hash(name.as_bytes());
        self.by_name
            .find(hash, |entry| &*entry.name == name)
            .map(|entry| &self.symbols[entry.idx])
    }

    /// Number of symbols in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
