//! Iterator and async state machine metadata
//!
//! Compilers turn iterator and async methods into a generated class whose `MoveNext` method holds
//! the user's code. The symbol store records which class that is, which ranges of `MoveNext`
//! correspond to user code, and (for async methods) where the method awaits and resumes.

use crate::cil::{MethodReference, TypeDefinition};
use crate::function::{
    PdbFunction, PdbScope, PdbSynchronizationInformation, PdbSynchronizationPoint,
};
use crate::resolver::SymbolReaderResolver;
use std::rc::Rc;
use tracing::trace;

/// Async stepping information, with methods resolved.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SynchronizationInformation {
    /// The user-visible async method.
    pub kickoff_method: MethodReference,
    /// Offset of the compiler-generated catch handler, or 0.
    pub generated_catch_handler_offset: u32,
    #[allow(missing_docs)]
    pub points: Vec<SynchronizationPoint>,
}

/// An `await` point.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SynchronizationPoint {
    /// Offset in `MoveNext` of the await.
    pub synchronize_offset: u32,
    /// The method that runs when the awaited task completes.
    pub continuation_method: MethodReference,
    /// Offset in `continuation_method` where execution resumes.
    pub continuation_offset: u32,
}

impl SynchronizationInformation {
    /// Resolves the methods of a store record.
    ///
    /// Returns `None` if the kickoff method cannot be resolved. Points whose continuation method
    /// cannot be resolved are dropped.
    pub fn resolve(
        record: &PdbSynchronizationInformation,
        resolver: &SymbolReaderResolver<'_>,
    ) -> Option<Self> {
        let Some(kickoff_method) = resolver.lookup_method(record.kickoff_method) else {
            trace!(
                "dropping synchronization information; kickoff method {} is not a method",
                record.kickoff_method
            );
            return None;
        };

        let points = record
            .points
            .iter()
            .filter_map(|p| {
                let continuation_method = resolver.lookup_method(p.continuation_method);
                if continuation_method.is_none() {
                    trace!(
                        "dropping synchronization point at 0x{:x}; continuation {} is not a method",
                        p.synchronize_offset,
                        p.continuation_method
                    );
                }
                Some(SynchronizationPoint {
                    synchronize_offset: p.synchronize_offset,
                    continuation_method: continuation_method?,
                    continuation_offset: p.continuation_offset,
                })
            })
            .collect();

        Some(Self {
            kickoff_method,
            generated_catch_handler_offset: record.generated_catch_handler_offset,
            points,
        })
    }

    /// Converts back to a store record, using the tokens the methods currently have.
    pub fn to_record(&self) -> PdbSynchronizationInformation {
        PdbSynchronizationInformation {
            kickoff_method: self.kickoff_method.token,
            generated_catch_handler_offset: self.generated_catch_handler_offset,
            points: self
                .points
                .iter()
                .map(|p| PdbSynchronizationPoint {
                    synchronize_offset: p.synchronize_offset,
                    continuation_method: p.continuation_method.token,
                    continuation_offset: p.continuation_offset,
                })
                .collect(),
        }
    }
}

/// The iterator class name of a record, ignoring empty names.
pub fn iterator_class(function: &PdbFunction) -> Option<&str> {
    function.iterator_class.as_deref().filter(|s| !s.is_empty())
}

/// Finds the generated iterator class among the nested types of `declaring_type`.
pub fn resolve_iterator_type(
    function: &PdbFunction,
    declaring_type: &TypeDefinition,
) -> Option<Rc<TypeDefinition>> {
    let name = iterator_class(function)?;
    let found = declaring_type.nested_type(name);
    if found.is_none() {
        trace!(
            "iterator class {name:?} is not nested in {}",
            declaring_type.full_name()
        );
    }
    found
}

/// Namespace imports of a scope tree, parents before children.
pub fn used_namespaces(scopes: &[PdbScope]) -> Vec<String> {
    fn walk(scope: &PdbScope, out: &mut Vec<String>) {
        out.extend(scope.used_namespaces.iter().cloned());
        for child in scope.scopes.iter() {
            walk(child, out);
        }
    }

    let mut out = Vec::new();
    for s in scopes.iter() {
        walk(s, &mut out);
    }
    out
}
