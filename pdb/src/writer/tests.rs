use super::*;
use crate::cil::{MethodDefinition, TypeDefinition};
use crate::function::PdbSource;
use crate::header::parse_debug_header;
use crate::sequence_points::SequencePoint;
use crate::symbols::InstructionSymbol;
use std::rc::Rc;
use uuid::Uuid;

fn key() -> BindingKey {
    BindingKey {
        guid: Uuid::from_u128(0x1111_2222_3333_4444_5555_6666_7777_8888),
        age: 2,
    }
}

fn doc(url: &str) -> Rc<Document> {
    Rc::new(Document::from_source(&PdbSource {
        name: url.to_string(),
        ..Default::default()
    }))
}

fn sp(document: &Rc<Document>, line: u32) -> SequencePoint {
    SequencePoint {
        document: Rc::clone(document),
        start_line: line,
        start_column: 1,
        end_line: line,
        end_column: 2,
    }
}

/// Instructions at 0, 1, 3, 6, code size 10.
fn body(token: Token) -> MethodBody {
    let ty = Rc::new(TypeDefinition::new(Token(0x0200_0002), "Demo", "Program"));
    let mut b = MethodBody::new(Rc::new(MethodDefinition::new(token, "M", ty)));
    b.push_instruction(0, 1);
    b.push_instruction(1, 2);
    b.push_instruction(3, 3);
    b.push_instruction(6, 4);
    b
}

#[test]
fn debug_header() {
    let mut w = PdbWriter::new(key(), "out/app.pdb");
    w.set_time_date_stamp(0xabcd);
    let (dir, bytes) = w.get_debug_header();
    assert!(dir.is_codeview());
    assert_eq!(dir.time_date_stamp, 0xabcd);
    assert_eq!(dir.size_of_data as usize, bytes.len());
    assert_eq!(parse_debug_header(&bytes), Ok(key()));
}

#[test]
fn empty_body_writes_nothing() {
    let mut w = PdbWriter::new(key(), "app.pdb");
    w.write(&body(Token(0x0600_0001))).unwrap();
    assert_eq!(w.num_functions(), 0);
    let table = w.finish();
    assert_eq!(table.guid, key().guid);
    assert_eq!(table.age, 2);
}

#[test]
fn duplicate_method_is_rejected() {
    let mut w = PdbWriter::new(key(), "app.pdb");
    w.write(&body(Token(0x0600_0001))).unwrap();
    assert!(w.write(&body(Token(0x0600_0001))).is_err());
}

#[test]
fn lines_grouped_by_document() {
    let a = doc("a.cs");
    let b_doc = doc("b.cs");
    let mut b = body(Token(0x0600_0001));
    b.instruction_mut(InstructionId(0)).unwrap().sequence_point = Some(sp(&a, 10));
    b.instruction_mut(InstructionId(1)).unwrap().sequence_point = Some(sp(&b_doc, 20));
    b.instruction_mut(InstructionId(3)).unwrap().sequence_point = Some(sp(&a, 11));

    let mut w = PdbWriter::new(key(), "app.pdb");
    w.write(&b).unwrap();
    let table = w.finish();
    let f = &table.functions[0];
    assert_eq!(f.lines.len(), 2);
    assert_eq!(f.lines[0].file.name, "a.cs");
    assert_eq!(
        f.lines[0].lines.iter().map(|l| (l.offset, l.line_begin)).collect::<Vec<_>>(),
        vec![(0, 10), (6, 11)]
    );
    assert_eq!(f.lines[1].file.name, "b.cs");
    assert_eq!(f.lines[1].lines[0].offset, 1);
}

#[test]
fn scope_offsets_and_slots() {
    let mut b = body(Token(0x0600_0001));
    b.add_variable();
    b.add_variable();
    b.variables_mut()[1].name = Some("y".to_string());

    let mut tree = ScopeTree::with_root(InstructionRange {
        start: Some(InstructionId(0)),
        end: Some(InstructionId(3)),
    });
    let child = tree.add_child(
        ScopeId(0),
        InstructionRange {
            start: Some(InstructionId(1)),
            end: Some(InstructionId(2)),
        },
    );
    tree.add_variable(ScopeId(0), 0);
    tree.add_variable(child, 1);
    b.debug_information_mut().scopes = tree;

    let mut w = PdbWriter::new(key(), "app.pdb");
    w.write(&b).unwrap();
    let table = w.finish();
    let root = &table.functions[0].scopes[0];
    assert_eq!((root.offset, root.length), (0, 10));
    // Unnamed variables get no slot.
    assert!(root.slots.is_empty());
    let child = &root.scopes[0];
    assert_eq!((child.offset, child.length), (1, 5));
    assert_eq!(
        child.slots,
        vec![PdbSlot {
            slot: 1,
            name: "y".to_string()
        }]
    );
}

#[test]
fn open_ended_range() {
    let b = body(Token(0x0600_0001));
    let r = InstructionRange {
        start: Some(InstructionId(2)),
        end: None,
    };
    assert_eq!(instruction_range_offsets(&b, &r), (3, 0));
}

#[test]
fn symbols_with_namespaces() {
    let a = doc("a.cs");
    let mut symbols = MethodSymbols::new(Token(0x0600_0009));
    symbols.instructions.push(InstructionSymbol {
        offset: 4,
        sequence_point: sp(&a, 7),
    });
    symbols.variables.push(VariableDefinition {
        index: 0,
        name: Some("i".to_string()),
    });
    let mut tree = ScopeTree::with_root(OffsetRange::new(0, 20));
    let child = tree.add_child(ScopeId(0), OffsetRange::new(4, 8));
    tree.add_variable(child, 0);
    symbols.scopes = tree;
    symbols.used_namespaces = vec!["USystem".into(), "USystem.Text".into(), "UExtra".into()];
    symbols.using_counts = vec![1, 1];
    symbols.iterator_type = Some("<Items>d__3".to_string());
    symbols.iterator_scopes = vec![OffsetRange::new(2, 3)];

    let mut w = PdbWriter::new(key(), "app.pdb");
    w.write_symbols(&symbols).unwrap();
    let table = w.finish();
    let f = &table.functions[0];
    assert_eq!(f.lines[0].lines[0].offset, 4);
    let root = &f.scopes[0];
    assert_eq!(root.used_namespaces, vec!["USystem", "UExtra"]);
    assert_eq!(root.scopes[0].used_namespaces, vec!["USystem.Text"]);
    assert_eq!((root.scopes[0].offset, root.scopes[0].length), (4, 8));
    assert_eq!(root.scopes[0].slots[0].name, "i");
    assert_eq!(f.using_counts, vec![1, 1]);
    assert_eq!(f.iterator_class.as_deref(), Some("<Items>d__3"));
    assert_eq!(
        f.iterator_scopes,
        vec![PdbIteratorScope {
            offset: 2,
            length: 3
        }]
    );
}

#[test]
fn inverted_iterator_scope_is_written_empty() {
    let mut symbols = MethodSymbols::new(Token(0x0600_000a));
    symbols.iterator_type = Some("<Items>d__4".to_string());
    symbols.iterator_scopes = vec![OffsetRange { start: 5, end: 2 }];

    let mut w = PdbWriter::new(key(), "app.pdb");
    w.write_symbols(&symbols).unwrap();
    let table = w.finish();
    assert_eq!(
        table.functions[0].iterator_scopes,
        vec![PdbIteratorScope {
            offset: 5,
            length: 0
        }]
    );
}
