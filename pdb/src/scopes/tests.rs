use super::*;
use crate::function::PdbSlot;
use crate::locator::OffsetRange;

const METHOD: Token = Token(0x0600_0007);

fn scope(offset: u32, length: u32, slots: &[(u32, &str)], scopes: Vec<PdbScope>) -> PdbScope {
    PdbScope {
        offset,
        length,
        scopes,
        slots: slots
            .iter()
            .map(|&(slot, name)| PdbSlot {
                slot,
                name: name.to_string(),
            })
            .collect(),
        used_namespaces: Vec::new(),
    }
}

fn variables(n: u32) -> Vec<VariableDefinition> {
    (0..n)
        .map(|index| VariableDefinition { index, name: None })
        .collect()
}

fn build(
    scopes: &[PdbScope],
    variable_count: usize,
    strict: bool,
) -> anyhow::Result<ScopeBuild<OffsetRange>> {
    ScopeBuilder::new(METHOD, variable_count, &OffsetRange::new)
        .strict_slots(strict)
        .build(scopes, || OffsetRange::new(0, 100))
}

#[test]
fn empty() {
    let b = build(&[], 0, false).unwrap();
    assert!(b.tree.is_empty());
    assert!(b.tree.root().is_none());
    assert!(b.renames.is_empty());
}

#[test]
fn nesting_and_names_survive() {
    // root declares a, child 1 declares b and c, grandchild declares d, child 2 declares e.
    let input = scope(
        0,
        100,
        &[(0, "a")],
        vec![
            scope(
                10,
                50,
                &[(1, "b"), (2, "c")],
                vec![scope(20, 10, &[(3, "d")], vec![])],
            ),
            scope(60, 30, &[(4, "e")], vec![]),
        ],
    );

    let b = build(std::slice::from_ref(&input), 5, false).unwrap();
    let mut vars = variables(5);
    b.apply_renames(&mut vars);

    // (depth, range, name) for every declared variable
    let mut found: Vec<(usize, OffsetRange, String)> = Vec::new();
    for (id, s) in b.tree.iter() {
        for &v in s.variables.iter() {
            found.push((
                b.tree.depth(id),
                s.range,
                vars[v as usize].name.clone().unwrap(),
            ));
        }
    }
    found.sort_by(|a, b| a.2.cmp(&b.2));

    assert_eq!(
        found,
        vec![
            (0, OffsetRange::new(0, 100), "a".to_string()),
            (1, OffsetRange::new(10, 50), "b".to_string()),
            (1, OffsetRange::new(10, 50), "c".to_string()),
            (2, OffsetRange::new(20, 10), "d".to_string()),
            (1, OffsetRange::new(60, 30), "e".to_string()),
        ]
    );

    let root = b.tree.root().unwrap();
    let kids = &b.tree[root].children;
    assert_eq!(kids.len(), 2);
    assert_eq!(b.tree[kids[0]].range.start, 10);
    assert_eq!(b.tree[kids[1]].range.start, 60);
    assert_eq!(b.tree[kids[0]].parent, Some(root));
}

#[test]
fn second_top_level_scope_is_rejected() {
    let input = [
        scope(0, 10, &[(0, "a")], vec![]),
        scope(10, 10, &[(1, "b")], vec![]),
    ];
    let err = build(&input, 2, false).unwrap_err();
    let e = err.downcast_ref::<UnsupportedStructure>().unwrap();
    assert_eq!(e.method, METHOD);
    assert_eq!(e.top_level_scopes, 2);
}

#[test]
fn out_of_range_slot_is_ignored() {
    let input = [scope(0, 10, &[(99, "ghost"), (1, "real")], vec![])];
    let b = build(&input, 3, false).unwrap();
    assert_eq!(b.tree[ScopeId(0)].variables, vec![1, 0, 2]);

    let mut vars = variables(3);
    b.apply_renames(&mut vars);
    assert_eq!(vars[0].name, None);
    assert_eq!(vars[1].name.as_deref(), Some("real"));
    assert_eq!(vars[2].name, None);
}

#[test]
fn out_of_range_slot_is_rejected_when_strict() {
    let input = [scope(0, 10, &[(99, "ghost")], vec![])];
    let err = build(&input, 3, true).unwrap_err();
    let e = err.downcast_ref::<VariableSlotOutOfRange>().unwrap();
    assert_eq!(e.slot, 99);
    assert_eq!(e.variable_count, 3);
}

#[test]
fn synthetic_root() {
    let b = build(&[], 3, false).unwrap();
    assert_eq!(b.tree.len(), 1);
    let root = &b.tree[ScopeId(0)];
    assert_eq!(root.range, OffsetRange::new(0, 100));
    assert_eq!(root.variables, vec![0, 1, 2]);
    assert!(b.renames.is_empty());
}

#[test]
fn no_synthetic_root_when_explicit() {
    let input = [scope(0, 40, &[], vec![])];
    let b = build(&input, 3, false).unwrap();
    assert_eq!(b.tree.len(), 1);
    assert_eq!(b.tree[ScopeId(0)].range, OffsetRange::new(0, 40));
    assert_eq!(b.tree[ScopeId(0)].variables, vec![0, 1, 2]);
}

#[test]
fn explicit_root_takes_undeclared_variables() {
    let input = [scope(0, 8, &[(0, "first")], vec![])];
    let b = build(&input, 2, false).unwrap();
    assert_eq!(b.tree.len(), 1);
    assert_eq!(b.tree[ScopeId(0)].variables, vec![0, 1]);

    let mut vars = variables(2);
    b.apply_renames(&mut vars);
    assert_eq!(vars[0].name.as_deref(), Some("first"));
    assert_eq!(vars[1].name, None);
}

#[test]
fn variables_declared_by_nested_scopes_stay_there() {
    let input = [scope(
        0,
        40,
        &[],
        vec![scope(4, 8, &[(1, "inner")], vec![])],
    )];
    let b = build(&input, 3, false).unwrap();
    assert_eq!(b.tree[ScopeId(0)].variables, vec![0, 2]);
    assert_eq!(b.tree[ScopeId(1)].variables, vec![1]);
}

#[test]
fn map_ranges_keeps_shape() {
    let input = [scope(0, 40, &[(0, "x")], vec![scope(4, 8, &[], vec![])])];
    let b = build(&input, 1, false).unwrap();
    let lengths = b.tree.map_ranges(|r| r.len());
    assert_eq!(lengths[ScopeId(0)].range, 40);
    assert_eq!(lengths[ScopeId(1)].range, 8);
    assert_eq!(lengths[ScopeId(1)].parent, Some(ScopeId(0)));
    assert_eq!(lengths[ScopeId(0)].variables, vec![0]);
}
