//! Lexical scope trees
//!
//! Symbol stores describe scopes as a nested list of records, each with a byte range and the
//! variable slots it declares. [`ScopeBuilder`] turns that into a [`ScopeTree`], an arena of
//! [`Scope`] nodes with parent and child links.
//!
//! The tree is generic over its range type. Method bodies use
//! [`InstructionRange`](crate::locator::InstructionRange), standalone method symbols use
//! [`OffsetRange`](crate::locator::OffsetRange).
//!
//! Building runs in two passes. The first materializes the explicit scopes depth-first, in input
//! order, then hands any variable no scope declared to the explicit root. The second adds a
//! synthetic root that covers the whole body and declares every variable, but only if the store
//! gave no root and the method has variables.
//!
//! Variable names found in slots are collected as renames and are not applied to the body until
//! the build has succeeded, so a rejected method is left untouched.

use crate::cil::VariableDefinition;
use crate::error::{UnsupportedStructure, VariableSlotOutOfRange};
use crate::function::PdbScope;
use crate::token::Token;
use std::ops::Index;
use tracing::trace;

/// Identifies a scope within its [`ScopeTree`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ScopeId(pub u32);

/// One lexical scope.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Scope<R> {
    /// The code covered by this scope.
    pub range: R,
    #[allow(missing_docs)]
    pub parent: Option<ScopeId>,
    /// Nested scopes, in source order.
    pub children: Vec<ScopeId>,
    /// Indexes of the variables declared directly in this scope.
    pub variables: Vec<u32>,
}

/// An arena of scopes with at most one root.
///
/// The root, if present, is always `ScopeId(0)`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScopeTree<R> {
    scopes: Vec<Scope<R>>,
}

impl<R> Default for ScopeTree<R> {
    fn default() -> Self {
        Self { scopes: Vec::new() }
    }
}

impl<R> ScopeTree<R> {
    /// Creates a tree that contains only a root scope.
    pub fn with_root(range: R) -> Self {
        Self {
            scopes: vec![Scope {
                range,
                parent: None,
                children: Vec::new(),
                variables: Vec::new(),
            }],
        }
    }

    /// The root scope, if the tree is not empty.
    pub fn root(&self) -> Option<ScopeId> {
        if self.scopes.is_empty() {
            None
        } else {
            Some(ScopeId(0))
        }
    }

    /// Adds a scope at the end of `parent`'s children.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not in this tree.
    pub fn add_child(&mut self, parent: ScopeId, range: R) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes[parent.0 as usize].children.push(id);
        self.scopes.push(Scope {
            range,
            parent: Some(parent),
            children: Vec::new(),
            variables: Vec::new(),
        });
        id
    }

    /// Declares variable `index` in scope `id`.
    pub fn add_variable(&mut self, id: ScopeId, index: u32) {
        self.scopes[id.0 as usize].variables.push(index);
    }

    #[allow(missing_docs)]
    pub fn get(&self, id: ScopeId) -> Option<&Scope<R>> {
        self.scopes.get(id.0 as usize)
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Iterates all scopes, parents before children, siblings in order.
    pub fn iter(&self) -> impl Iterator<Item = (ScopeId, &Scope<R>)> + '_ {
        let mut stack: Vec<ScopeId> = self.root().into_iter().collect();
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            let scope = &self.scopes[id.0 as usize];
            stack.extend(scope.children.iter().rev().copied());
            Some((id, scope))
        })
    }

    /// Number of ancestors of `id`.
    pub fn depth(&self, id: ScopeId) -> usize {
        let mut depth = 0;
        let mut cur = self.scopes[id.0 as usize].parent;
        while let Some(p) = cur {
            depth += 1;
            cur = self.scopes[p.0 as usize].parent;
        }
        depth
    }

    /// Builds a tree with the same shape and variables, converting each range.
    pub fn map_ranges<T>(&self, mut f: impl FnMut(&R) -> T) -> ScopeTree<T> {
        ScopeTree {
            scopes: self
                .scopes
                .iter()
                .map(|s| Scope {
                    range: f(&s.range),
                    parent: s.parent,
                    children: s.children.clone(),
                    variables: s.variables.clone(),
                })
                .collect(),
        }
    }
}

impl<R> Index<ScopeId> for ScopeTree<R> {
    type Output = Scope<R>;

    fn index(&self, id: ScopeId) -> &Scope<R> {
        &self.scopes[id.0 as usize]
    }
}

/// The result of [`ScopeBuilder::build`].
#[derive(Clone, Debug)]
pub struct ScopeBuild<R> {
    #[allow(missing_docs)]
    pub tree: ScopeTree<R>,
    /// `(variable index, name)` pairs, in the order the slots were visited.
    pub renames: Vec<(u32, String)>,
}

impl<R> ScopeBuild<R> {
    /// Applies the collected variable names. Later slots for the same variable win.
    pub fn apply_renames(&self, variables: &mut [VariableDefinition]) {
        for (index, name) in self.renames.iter() {
            if let Some(var) = variables.get_mut(*index as usize) {
                var.name = Some(name.clone());
            }
        }
    }
}

/// Converts scope records into a [`ScopeTree`].
pub struct ScopeBuilder<'a, R> {
    method: Token,
    variable_count: usize,
    strict_slots: bool,
    make_range: &'a dyn Fn(u32, u32) -> R,
}

impl<'a, R> ScopeBuilder<'a, R> {
    /// `make_range` converts a record's `(offset, length)` into a range.
    pub fn new(method: Token, variable_count: usize, make_range: &'a dyn Fn(u32, u32) -> R) -> Self {
        Self {
            method,
            variable_count,
            strict_slots: false,
            make_range,
        }
    }

    /// If set, slots that are out of range for the method are an error instead of being ignored.
    pub fn strict_slots(mut self, strict: bool) -> Self {
        self.strict_slots = strict;
        self
    }

    /// Builds the tree.
    ///
    /// `whole` supplies the range of the synthetic root, and is only called if one is needed.
    pub fn build(&self, scopes: &[PdbScope], whole: impl FnOnce() -> R) -> anyhow::Result<ScopeBuild<R>> {
        if scopes.len() > 1 {
            return Err(UnsupportedStructure {
                method: self.method,
                top_level_scopes: scopes.len(),
            }
            .into());
        }

        let mut build = ScopeBuild {
            tree: ScopeTree::default(),
            renames: Vec::new(),
        };

        // Pass 1: explicit scopes.
        if let Some(top) = scopes.first() {
            let range = (self.make_range)(top.offset, top.length);
            build.tree = ScopeTree::with_root(range);
            self.add_slots_and_children(&mut build, ScopeId(0), top)?;

            let mut claimed = vec![false; self.variable_count];
            for (_, scope) in build.tree.iter() {
                for &v in scope.variables.iter() {
                    claimed[v as usize] = true;
                }
            }
            for (index, _) in claimed.iter().enumerate().filter(|(_, c)| !**c) {
                trace!("method {}: variable {index} is not declared by any scope", self.method);
                build.tree.add_variable(ScopeId(0), index as u32);
            }
        }

        // Pass 2: synthetic root.
        if build.tree.root().is_none() && self.variable_count > 0 {
            build.tree = ScopeTree::with_root(whole());
            for index in 0..self.variable_count as u32 {
                build.tree.add_variable(ScopeId(0), index);
            }
        }

        Ok(build)
    }

    fn add_slots_and_children(
        &self,
        build: &mut ScopeBuild<R>,
        id: ScopeId,
        record: &PdbScope,
    ) -> anyhow::Result<()> {
        for slot in record.slots.iter() {
            if (slot.slot as usize) >= self.variable_count {
                if self.strict_slots {
                    return Err(VariableSlotOutOfRange {
                        method: self.method,
                        slot: slot.slot,
                        variable_count: self.variable_count,
                    }
                    .into());
                }
                trace!(
                    "method {}: ignoring slot {} ({:?}); body has {} variables",
                    self.method,
                    slot.slot,
                    slot.name,
                    self.variable_count
                );
                continue;
            }

            build.tree.add_variable(id, slot.slot);
            build.renames.push((slot.slot, slot.name.clone()));
        }

        for child in record.scopes.iter() {
            let range = (self.make_range)(child.offset, child.length);
            let child_id = build.tree.add_child(id, range);
            self.add_slots_and_children(build, child_id, child)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
