//! In-memory model of CIL method bodies
//!
//! This is the part of an assembly's object model that debug information is attached to. It is
//! produced by whatever reads the assembly container; this crate only reads instruction offsets
//! and variables from it, renames variables and attaches [`MethodDebugInformation`].

use crate::locator::InstructionRange;
use crate::scopes::ScopeTree;
use crate::sequence_points::SequencePoint;
use crate::state_machine::SynchronizationInformation;
use crate::token::Token;
use std::rc::Rc;

/// Identifies an instruction by its position within [`MethodBody::instructions`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct InstructionId(pub u32);

impl InstructionId {
    /// The instruction immediately before this one, if any.
    pub fn previous(self) -> Option<InstructionId> {
        self.0.checked_sub(1).map(InstructionId)
    }

    /// Index into the instruction list.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One instruction of a method body. Only the offset matters to debug information.
#[derive(Clone, Debug)]
pub struct Instruction {
    /// Byte offset of this instruction from the start of the IL stream.
    pub offset: u32,
    /// Source location of this instruction, if it starts a statement.
    pub sequence_point: Option<SequencePoint>,
}

/// A local variable of a method body. Identity is the position in the body's variable list.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VariableDefinition {
    /// The slot index of this variable.
    pub index: u32,
    /// Source-level name, if debug information provided one.
    pub name: Option<String>,
}

/// A type definition, with just enough shape to resolve iterator classes.
#[derive(Clone, Debug, Default)]
pub struct TypeDefinition {
    #[allow(missing_docs)]
    pub token: Token,
    #[allow(missing_docs)]
    pub namespace: String,
    #[allow(missing_docs)]
    pub name: String,
    /// Types declared inside this type.
    pub nested_types: Vec<Rc<TypeDefinition>>,
}

impl TypeDefinition {
    /// Creates a type with no nested types.
    pub fn new(token: Token, namespace: &str, name: &str) -> Self {
        Self {
            token,
            namespace: namespace.to_string(),
            name: name.to_string(),
            nested_types: Vec::new(),
        }
    }

    /// Adds a nested type and returns `self`.
    pub fn with_nested(mut self, nested: TypeDefinition) -> Self {
        self.nested_types.push(Rc::new(nested));
        self
    }

    /// Finds a directly nested type by its simple name.
    pub fn nested_type(&self, name: &str) -> Option<Rc<TypeDefinition>> {
        self.nested_types.iter().find(|t| t.name == name).cloned()
    }

    /// The namespace-qualified name of this type.
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

/// A method defined in the assembly being processed.
#[derive(Clone, Debug)]
pub struct MethodDefinition {
    /// The `MethodDef` token of this method.
    pub token: Token,
    #[allow(missing_docs)]
    pub name: String,
    #[allow(missing_docs)]
    pub declaring_type: Rc<TypeDefinition>,
}

impl MethodDefinition {
    /// Creates a method definition.
    pub fn new(token: Token, name: &str, declaring_type: Rc<TypeDefinition>) -> Self {
        Self {
            token,
            name: name.to_string(),
            declaring_type,
        }
    }

    /// A reference to this method, using its current token.
    pub fn to_reference(&self) -> MethodReference {
        MethodReference {
            token: self.token,
            name: self.name.clone(),
            declaring_type: self.declaring_type.full_name(),
        }
    }
}

/// A reference to a method, which may be defined in this assembly or elsewhere.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct MethodReference {
    /// The token that names this method in the metadata that the reference belongs to.
    pub token: Token,
    #[allow(missing_docs)]
    pub name: String,
    /// Full name of the declaring type.
    pub declaring_type: String,
}

/// Debug information attached to a [`MethodBody`].
#[derive(Clone, Debug, Default)]
pub struct MethodDebugInformation {
    /// Lexical scopes and the variables they declare.
    pub scopes: ScopeTree<InstructionRange>,
    /// The compiler-generated class that implements this iterator or async method.
    pub iterator_type: Option<Rc<TypeDefinition>>,
    /// Ranges of the iterator's `MoveNext` implementation that correspond to user code.
    pub iterator_scopes: Vec<InstructionRange>,
    /// Async stepping information.
    pub synchronization: Option<SynchronizationInformation>,
}

impl MethodDebugInformation {
    /// True if nothing has been attached.
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
            && self.iterator_type.is_none()
            && self.iterator_scopes.is_empty()
            && self.synchronization.is_none()
    }
}

/// The body of a method: its instruction stream and local variables.
#[derive(Clone, Debug)]
pub struct MethodBody {
    /// The method that owns this body.
    pub method: Rc<MethodDefinition>,
    /// Size of the IL stream, in bytes.
    pub code_size: u32,
    /// `StandAloneSig` token of the local variable signature, or nil.
    pub local_var_token: Token,
    instructions: Vec<Instruction>,
    variables: Vec<VariableDefinition>,
    debug_information: Option<MethodDebugInformation>,
}

impl MethodBody {
    /// Creates an empty body.
    pub fn new(method: Rc<MethodDefinition>) -> Self {
        Self {
            method,
            code_size: 0,
            local_var_token: Token::default(),
            instructions: Vec::new(),
            variables: Vec::new(),
            debug_information: None,
        }
    }

    /// The token of the owning method.
    pub fn method_token(&self) -> Token {
        self.method.token
    }

    /// Appends an instruction at `offset` with the given encoded size.
    ///
    /// Instructions must be pushed in increasing offset order.
    pub fn push_instruction(&mut self, offset: u32, size: u32) -> InstructionId {
        debug_assert!(self.instructions.last().is_none_or(|last| last.offset < offset));
        let id = InstructionId(self.instructions.len() as u32);
        self.instructions.push(Instruction {
            offset,
            sequence_point: None,
        });
        self.code_size = self.code_size.max(offset.saturating_add(size));
        id
    }

    /// Appends an unnamed variable and returns its index.
    pub fn add_variable(&mut self) -> u32 {
        let index = self.variables.len() as u32;
        self.variables.push(VariableDefinition { index, name: None });
        index
    }

    #[allow(missing_docs)]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    #[allow(missing_docs)]
    pub fn instruction(&self, id: InstructionId) -> Option<&Instruction> {
        self.instructions.get(id.index())
    }

    #[allow(missing_docs)]
    pub fn instruction_mut(&mut self, id: InstructionId) -> Option<&mut Instruction> {
        self.instructions.get_mut(id.index())
    }

    /// Id of the first instruction, if the body is not empty.
    pub fn first_instruction(&self) -> Option<InstructionId> {
        if self.instructions.is_empty() {
            None
        } else {
            Some(InstructionId(0))
        }
    }

    /// Id of the last instruction, if the body is not empty.
    pub fn last_instruction(&self) -> Option<InstructionId> {
        self.instructions
            .len()
            .checked_sub(1)
            .map(|i| InstructionId(i as u32))
    }

    /// The offset just past `id`: the next instruction's offset, or the code size.
    pub fn offset_after(&self, id: InstructionId) -> u32 {
        match self.instructions.get(id.index() + 1) {
            Some(next) => next.offset,
            None => self.code_size,
        }
    }

    #[allow(missing_docs)]
    pub fn variables(&self) -> &[VariableDefinition] {
        &self.variables
    }

    #[allow(missing_docs)]
    pub fn variables_mut(&mut self) -> &mut [VariableDefinition] {
        &mut self.variables
    }

    /// Debug information attached to this body, if any.
    pub fn debug_information(&self) -> Option<&MethodDebugInformation> {
        self.debug_information.as_ref()
    }

    /// Debug information attached to this body, created empty on first use.
    pub fn debug_information_mut(&mut self) -> &mut MethodDebugInformation {
        self.debug_information.get_or_insert_with(Default::default)
    }

    /// Iterates the instructions that carry a sequence point.
    pub fn sequence_points(&self) -> impl Iterator<Item = (&Instruction, &SequencePoint)> + '_ {
        self.instructions
            .iter()
            .filter_map(|i| i.sequence_point.as_ref().map(|sp| (i, sp)))
    }

    /// Splits the body into the parts that debug information writes into.
    pub(crate) fn parts_mut(
        &mut self,
    ) -> (
        &mut [Instruction],
        &mut [VariableDefinition],
        &mut Option<MethodDebugInformation>,
    ) {
        (
            &mut self.instructions,
            &mut self.variables,
            &mut self.debug_information,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn body() -> MethodBody {
        let ty = Rc::new(TypeDefinition::new(Token(0x0200_0002), "Demo", "Program"));
        let method = Rc::new(MethodDefinition::new(Token(0x0600_0001), "Main", ty));
        MethodBody::new(method)
    }

    #[test]
    fn instructions_and_code_size() {
        let mut b = body();
        assert_eq!(b.first_instruction(), None);
        assert_eq!(b.last_instruction(), None);

        let a = b.push_instruction(0, 1);
        let c = b.push_instruction(1, 5);
        assert_eq!(a, InstructionId(0));
        assert_eq!(c, InstructionId(1));
        assert_eq!(b.code_size, 6);
        assert_eq!(b.last_instruction(), Some(c));
        assert_eq!(b.offset_after(a), 1);
        assert_eq!(b.offset_after(c), 6);
        assert_eq!(c.previous(), Some(a));
        assert_eq!(a.previous(), None);
    }

    #[test]
    fn nested_type_lookup() {
        let ty = TypeDefinition::new(Token::new(TokenType::TYPE_DEF, 2), "Demo", "Program")
            .with_nested(TypeDefinition::new(
                Token::new(TokenType::TYPE_DEF, 3),
                "",
                "<Run>d__1",
            ));
        assert_eq!(ty.full_name(), "Demo.Program");
        assert_eq!(ty.nested_type("<Run>d__1").unwrap().token.rid(), 3);
        assert!(ty.nested_type("<Run>d__2").is_none());
    }

    #[test]
    fn debug_information_created_lazily() {
        let mut b = body();
        assert!(b.debug_information().is_none());
        assert!(b.debug_information_mut().is_empty());
        assert!(b.debug_information().is_some());
    }

    #[test]
    fn variables() {
        let mut b = body();
        assert!(b.variables().is_empty());
        assert_eq!(b.add_variable(), 0);
        assert_eq!(b.add_variable(), 1);
        b.variables_mut()[1].name = Some("y".to_string());
        assert_eq!(b.variables()[1].name.as_deref(), Some("y"));
        assert_eq!(b.variables()[0].name, None);
    }
}
