//! Standalone method symbols
//!
//! [`MethodSymbols`] carries the debug information of one method without reference to a live
//! instruction stream. Positions are raw byte offsets. Rewriters use it to carry debug
//! information across a transformation that rebuilds method bodies.

use crate::cil::{MethodBody, MethodReference, VariableDefinition};
use crate::locator::OffsetRange;
use crate::scopes::ScopeTree;
use crate::sequence_points::SequencePoint;
use crate::state_machine::SynchronizationInformation;
use crate::token::Token;

/// A sequence point at a raw IL offset.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstructionSymbol {
    #[allow(missing_docs)]
    pub offset: u32,
    #[allow(missing_docs)]
    pub sequence_point: SequencePoint,
}

/// Debug information for one method, keyed by offsets.
#[derive(Clone, Debug, Default)]
pub struct MethodSymbols {
    /// Identifies the method in the metadata the symbol store was built against.
    pub method_token: Token,
    #[allow(missing_docs)]
    pub method_name: String,
    /// Size of the IL stream, in bytes.
    pub code_size: u32,
    /// `StandAloneSig` token of the local variable signature, or nil.
    pub local_var_token: Token,
    #[allow(missing_docs)]
    pub variables: Vec<VariableDefinition>,
    /// Sequence points, in store order. Several may share an offset.
    pub instructions: Vec<InstructionSymbol>,
    #[allow(missing_docs)]
    pub scopes: ScopeTree<OffsetRange>,
    /// Simple name of the generated iterator class.
    pub iterator_type: Option<String>,
    #[allow(missing_docs)]
    pub iterator_scopes: Vec<OffsetRange>,
    /// Namespace imports, parents before children.
    pub used_namespaces: Vec<String>,
    /// Number of imports at each nesting level.
    pub using_counts: Vec<u16>,
    /// The method whose imports also apply to this method.
    pub method_whose_using_info_applies: Option<MethodReference>,
    #[allow(missing_docs)]
    pub synchronization: Option<SynchronizationInformation>,
}

impl MethodSymbols {
    /// Creates empty symbols for `method_token`.
    pub fn new(method_token: Token) -> Self {
        Self {
            method_token,
            ..Default::default()
        }
    }

    /// Captures the identity and variables of a method body. No debug information is copied.
    pub fn from_body(body: &MethodBody) -> Self {
        Self {
            method_token: body.method_token(),
            method_name: body.method.name.clone(),
            code_size: body.code_size,
            local_var_token: body.local_var_token,
            variables: body.variables().to_vec(),
            ..Default::default()
        }
    }

    /// True if no debug information has been read into these symbols.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
            && self.scopes.is_empty()
            && self.iterator_type.is_none()
            && self.iterator_scopes.is_empty()
            && self.used_namespaces.is_empty()
            && self.using_counts.is_empty()
            && self.method_whose_using_info_applies.is_none()
            && self.synchronization.is_none()
    }
}
