//! Function records decoded from a symbol store
//!
//! These are the typed records that a [`SymbolStore`](crate::store::SymbolStore) produces. They
//! are read-only input to the reader and the output of the writer. Offsets are byte offsets from
//! the start of the method's IL stream.

use crate::token::Token;
use uuid::Uuid;

/// Debug records for one method.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PdbFunction {
    /// The `MethodDef` token of the method, in the metadata the store was built against.
    pub token: Token,
    /// Line blocks. Each block belongs to one source file.
    pub lines: Vec<PdbLines>,
    /// Top-level scopes. Well-formed stores have at most one.
    pub scopes: Vec<PdbScope>,
    /// Simple name of the compiler-generated iterator class, nested in the declaring type.
    pub iterator_class: Option<String>,
    #[allow(missing_docs)]
    pub iterator_scopes: Vec<PdbIteratorScope>,
    /// Async stepping information.
    pub synchronization: Option<PdbSynchronizationInformation>,
    /// Number of namespaces imported by each nesting level of the scope tree.
    pub using_counts: Vec<u16>,
    /// The method whose namespace imports apply to this method as well.
    pub using_info_forward: Option<Token>,
}

impl PdbFunction {
    /// Creates a record with no debug data.
    pub fn new(token: Token) -> Self {
        Self {
            token,
            ..Default::default()
        }
    }

    /// True if the record carries nothing worth storing.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
            && self.scopes.is_empty()
            && self.iterator_class.is_none()
            && self.iterator_scopes.is_empty()
            && self.synchronization.is_none()
            && self.using_counts.is_empty()
            && self.using_info_forward.is_none()
    }
}

/// A block of line records that all belong to one source file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PdbLines {
    #[allow(missing_docs)]
    pub file: PdbSource,
    #[allow(missing_docs)]
    pub lines: Vec<PdbLine>,
}

/// Maps one IL offset to a source span.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[allow(missing_docs)]
pub struct PdbLine {
    pub offset: u32,
    pub line_begin: u32,
    pub col_begin: u16,
    pub line_end: u32,
    pub col_end: u16,
}

/// A source file, as described by the store.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PdbSource {
    /// Path of the file. This is the document's identity.
    pub name: String,
    #[allow(missing_docs)]
    pub language: Uuid,
    #[allow(missing_docs)]
    pub vendor: Uuid,
    #[allow(missing_docs)]
    pub doctype: Uuid,
    /// Algorithm used to compute `checksum`, or nil.
    pub checksum_algorithm: Uuid,
    #[allow(missing_docs)]
    pub checksum: Vec<u8>,
}

/// A lexical scope.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PdbScope {
    /// Start of the scope, in bytes.
    pub offset: u32,
    /// Length of the scope, in bytes.
    pub length: u32,
    /// Nested scopes, in source order.
    pub scopes: Vec<PdbScope>,
    /// Local variables declared by this scope.
    pub slots: Vec<PdbSlot>,
    /// Namespaces imported by this scope.
    pub used_namespaces: Vec<String>,
}

/// Names the local variable at index `slot`.
///
/// Slot indices are not validated by the store and can be out of range for the method body.
#[derive(Clone, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub struct PdbSlot {
    pub slot: u32,
    pub name: String,
}

/// A range of an iterator's `MoveNext` that corresponds to user code.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[allow(missing_docs)]
pub struct PdbIteratorScope {
    pub offset: u32,
    pub length: u32,
}

/// Async stepping information, with tokens as found in the store.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PdbSynchronizationInformation {
    /// The user-visible async method that started the state machine.
    pub kickoff_method: Token,
    /// Offset of the compiler-generated catch handler, or 0.
    pub generated_catch_handler_offset: u32,
    #[allow(missing_docs)]
    pub points: Vec<PdbSynchronizationPoint>,
}

/// An `await` point.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[allow(missing_docs)]
pub struct PdbSynchronizationPoint {
    pub synchronize_offset: u32,
    pub continuation_method: Token,
    pub continuation_offset: u32,
}
