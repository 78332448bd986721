//! Access to the decoded contents of a symbol store

use crate::function::PdbFunction;
use anyhow::bail;
use uuid::Uuid;

/// Everything a reader needs from a symbol store.
#[derive(Clone, Debug, Default)]
pub struct FunctionTable {
    /// The GUID embedded in the store. Must match the assembly's debug header.
    pub guid: Uuid,
    /// Incremented each time the store is rewritten for the same GUID.
    pub age: u32,
    /// One record per method. Tokens are expected to be unique.
    pub functions: Vec<PdbFunction>,
}

/// Decodes a symbol store into a [`FunctionTable`].
///
/// The byte-level format is the implementation's business. A reader calls `load_functions` at
/// most once.
pub trait SymbolStore {
    /// Decodes the function table.
    fn load_functions(&mut self) -> anyhow::Result<FunctionTable>;
}

impl<S: SymbolStore + ?Sized> SymbolStore for Box<S> {
    fn load_functions(&mut self) -> anyhow::Result<FunctionTable> {
        (**self).load_functions()
    }
}

/// A symbol store whose table has already been decoded.
pub struct MemoryStore {
    table: Option<FunctionTable>,
    loads: u32,
}

impl MemoryStore {
    /// Wraps a decoded table.
    pub fn new(table: FunctionTable) -> Self {
        Self {
            table: Some(table),
            loads: 0,
        }
    }

    /// Number of times `load_functions` has been called.
    pub fn loads(&self) -> u32 {
        self.loads
    }
}

impl SymbolStore for MemoryStore {
    fn load_functions(&mut self) -> anyhow::Result<FunctionTable> {
        self.loads += 1;
        let Some(table) = self.table.take() else {
            bail!("The function table of this store has already been consumed");
        };
        Ok(table)
    }
}
