//! Reconstructs debug information for CLR method bodies from PDB symbol stores.
//!
//! A symbol store describes each method by its metadata token: lexical scopes and the local
//! variables they declare, line records that map IL offsets to source spans, and metadata for
//! compiler-generated iterator and async state machines. [`PdbReader`] loads those records once,
//! after checking the assembly's CodeView debug header against the store, and attaches them to
//! [`MethodBody`] values or to standalone [`MethodSymbols`].
//!
//! When an assembly is rewritten, tokens found in the store are resolved through a
//! [`SymbolReaderResolver`], which can rebind them to the tokens assigned by a
//! [`MetadataBuilder`]. [`PdbWriter`] goes the other way and turns debug information back into
//! function records.
//!
//! Decoding the bytes of a symbol store is left to an implementation of [`SymbolStore`].
//!
//! # References
//! * <https://github.com/microsoft/microsoft-pdb>
//! * <https://github.com/dotnet/runtime/blob/main/docs/design/specs/PE-COFF.md>

#![forbid(unused_must_use)]
#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::new_without_default)]

pub mod cil;
pub mod documents;
pub mod error;
pub mod function;
pub mod header;
pub mod locator;
pub mod provider;
pub mod reader;
pub mod resolver;
pub mod scopes;
pub mod sequence_points;
pub mod state_machine;
pub mod store;
pub mod symbols;
pub mod token;
pub mod writer;

pub use ::uuid::Uuid;
pub use cil::{
    Instruction, InstructionId, MethodBody, MethodDebugInformation, MethodDefinition,
    MethodReference, TypeDefinition, VariableDefinition,
};
pub use clrpdb_coff::{self as coff, IMAGE_DEBUG_DIRECTORY, IMAGE_DEBUG_TYPE};
pub use documents::{Document, DocumentRegistry};
pub use error::{UnsupportedStructure, VariableSlotOutOfRange};
pub use header::{BindingKey, DebugHeaderError, parse_debug_header};
pub use locator::{InstructionMapper, InstructionRange, OffsetMap, OffsetRange};
pub use provider::{PdbReaderProvider, ProviderRegistry, SymbolKind, SymbolReaderProvider};
pub use reader::{PdbReader, ReaderOptions, SymbolReader};
pub use resolver::{MetadataBuilder, MetadataEntity, MetadataReader, SymbolReaderResolver, TokenLookup};
pub use scopes::{Scope, ScopeId, ScopeTree};
pub use sequence_points::SequencePoint;
pub use state_machine::{SynchronizationInformation, SynchronizationPoint};
pub use store::{FunctionTable, MemoryStore, SymbolStore};
pub use symbols::{InstructionSymbol, MethodSymbols};
pub use sync_file::RandomAccessFile;
pub use token::{Token, TokenType};
pub use writer::{PdbWriter, SymbolWriter};

#[cfg(test)]
#[static_init::dynamic]
static INIT_LOGGER: () = {
    let _ = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_test_writer()
        .with_file(true)
        .with_line_number(true)
        .with_max_level(tracing::Level::TRACE)
        .compact()
        .without_time()
        .try_init();
};
