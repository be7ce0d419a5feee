#![no_main]

use arbitrary::Arbitrary;
use dockgraph_layout::{
    ContentHandle, DockLeaf, DockOutcome, DockPosition, ElementId, LayoutGraph, LeafLocation, Side,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Position {
    Top,
    Bottom,
    Left,
    Right,
    Center,
}

impl From<Position> for DockPosition {
    fn from(value: Position) -> Self {
        match value {
            Position::Top => DockPosition::Top,
            Position::Bottom => DockPosition::Bottom,
            Position::Left => DockPosition::Left,
            Position::Right => DockPosition::Right,
            Position::Center => DockPosition::Center,
        }
    }
}

#[derive(Debug, Arbitrary)]
enum Op {
    Add { target: u8, position: Position, tab: Option<u8> },
    Dock { leaf: u8, target: u8, position: Position, tab: Option<u8> },
    Undock { leaf: u8 },
    Move { element: u8, target: u8, position: Position, tab: Option<u8> },
    Pin { leaf: u8, right: bool, index: Option<u8> },
    Restore { leaf: u8 },
    SetDivider { element: u8, index: u8, value: f64 },
    SetRatios { element: u8, weights: Vec<u16> },
    SelectTab { element: u8, index: u8 },
    Remove { leaf: u8 },
    Lock(bool),
}

fn nth(ids: &[ElementId], index: u8) -> Option<ElementId> {
    (!ids.is_empty()).then(|| ids[usize::from(index) % ids.len()])
}

fuzz_target!(|ops: Vec<Op>| {
    let mut graph = LayoutGraph::new();
    let mut known: Vec<ElementId> = Vec::new();

    for (step, op) in ops.into_iter().take(256).enumerate() {
        let tree: Vec<ElementId> = graph.walk().map(|walk| walk.record.id()).collect();
        let before = graph.revision();
        let outcome = match op {
            Op::Add {
                target,
                position,
                tab,
            } => {
                let id = graph.add_leaf(DockLeaf::new(
                    format!("leaf-{step}"),
                    "Leaf",
                    ContentHandle(step as u64),
                ));
                known.push(id);
                graph.dock(id, nth(&tree, target), position.into(), tab.map(usize::from))
            }
            Op::Dock {
                leaf,
                target,
                position,
                tab,
            } => match nth(&known, leaf) {
                Some(leaf) => graph.dock(leaf, nth(&tree, target), position.into(), tab.map(usize::from)),
                None => continue,
            },
            Op::Undock { leaf } => match nth(&known, leaf) {
                Some(leaf) => graph.undock(leaf),
                None => continue,
            },
            Op::Move {
                element,
                target,
                position,
                tab,
            } => match nth(&tree, element) {
                Some(element) => graph.move_element(
                    element,
                    nth(&tree, target),
                    position.into(),
                    tab.map(usize::from),
                ),
                None => continue,
            },
            Op::Pin { leaf, right, index } => match nth(&known, leaf) {
                Some(leaf) => {
                    let side = if right { Side::Right } else { Side::Left };
                    graph.pin_to_sidebar(leaf, side, index.map(usize::from))
                }
                None => continue,
            },
            Op::Restore { leaf } => match nth(&known, leaf) {
                Some(leaf) => graph.restore_from_sidebar(leaf),
                None => continue,
            },
            Op::SetDivider {
                element,
                index,
                value,
            } => match nth(&tree, element) {
                Some(split) => graph.set_divider(split, usize::from(index), value),
                None => continue,
            },
            Op::SetRatios { element, weights } => match nth(&tree, element) {
                Some(split) => {
                    let weights: Vec<f64> = weights.into_iter().map(f64::from).collect();
                    graph.set_split_ratios(split, &weights)
                }
                None => continue,
            },
            Op::SelectTab { element, index } => match nth(&tree, element) {
                Some(tabs) => graph.select_tab(tabs, usize::from(index)),
                None => continue,
            },
            Op::Remove { leaf } => {
                if let Some(leaf) = nth(&known, leaf) {
                    let placed = matches!(
                        graph.location(leaf),
                        Some(LeafLocation::MainTree | LeafLocation::SideBar(_))
                    );
                    let removed = graph.remove_leaf(leaf).is_some();
                    let bumps = u64::from(removed && placed);
                    assert_eq!(graph.revision(), before + bumps);
                }
                graph.validate().expect("valid after remove");
                continue;
            }
            Op::Lock(locked) => {
                graph.set_locked(locked);
                continue;
            }
        };

        match outcome {
            DockOutcome::Applied { revision } => {
                assert!(!graph.is_locked(), "applied while locked");
                assert_eq!(revision, before + 1);
            }
            DockOutcome::Noop { .. } => assert_eq!(graph.revision(), before),
        }
        graph.validate().expect("layout invariants hold");
    }

    let snapshot = graph.to_snapshot();
    let mut reloaded = LayoutGraph::new();
    let report = reloaded.load_snapshot(snapshot.clone()).expect("own snapshot loads");
    assert!(report.is_clean(), "valid tree needed repairs: {:?}", report.repairs);
    assert_eq!(reloaded.to_snapshot(), snapshot);
});
