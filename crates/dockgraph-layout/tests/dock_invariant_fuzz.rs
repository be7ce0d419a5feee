//! Property/fuzz-style invariants for docking operation streams.
//!
//! Random dock/undock/move/pin/restore/setter streams run against the public
//! LayoutGraph API. After every step the graph must validate, and the
//! revision must move by exactly one on applied operations and not at all on
//! no-ops.

use dockgraph_layout::{
    ContentHandle, DockLeaf, DockOutcome, DockPosition, ElementId, ElementKind, LayoutGraph, Side,
    Size,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn choose_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        (self.next_u64() % len as u64) as usize
    }

    fn choose_bool(&mut self) -> bool {
        (self.next_u64() & 1) == 0
    }

    fn next_unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

const POSITIONS: [DockPosition; 5] = [
    DockPosition::Top,
    DockPosition::Bottom,
    DockPosition::Left,
    DockPosition::Right,
    DockPosition::Center,
];

#[derive(Debug, Clone, Copy)]
enum Op {
    Add,
    Dock,
    Undock,
    Move,
    Pin,
    Restore,
    SetDivider,
    SelectTab,
    Remove,
}

fn tree_elements(graph: &LayoutGraph) -> Vec<ElementId> {
    graph.walk().map(|step| step.record.id()).collect()
}

fn containers(graph: &LayoutGraph, splits: bool) -> Vec<ElementId> {
    graph
        .walk()
        .filter(|step| match step.record.kind() {
            ElementKind::Split(_) => splits,
            ElementKind::Tabs(_) => !splits,
            ElementKind::Leaf(_) => false,
        })
        .map(|step| step.record.id())
        .collect()
}

fn pinned(graph: &LayoutGraph) -> Vec<ElementId> {
    Side::ALL
        .into_iter()
        .flat_map(|side| graph.sidebar(side).entries().to_vec())
        .collect()
}

fn random_leaf(rng: &mut Lcg, sequence: usize) -> DockLeaf {
    let leaf = DockLeaf::new(
        format!("leaf-{sequence}"),
        format!("Leaf {sequence}"),
        ContentHandle(sequence as u64),
    );
    if rng.choose_index(4) == 0 {
        let extent = 50.0 + rng.next_unit() * 600.0;
        leaf.with_size_hint(Size::new(extent, extent / 2.0))
    } else {
        leaf
    }
}

fn pick(rng: &mut Lcg, ids: &[ElementId]) -> Option<ElementId> {
    (!ids.is_empty()).then(|| ids[rng.choose_index(ids.len())])
}

fn apply_random(graph: &mut LayoutGraph, rng: &mut Lcg, sequence: usize) -> (Op, DockOutcome) {
    let ops = [
        Op::Add,
        Op::Dock,
        Op::Dock,
        Op::Undock,
        Op::Move,
        Op::Move,
        Op::Pin,
        Op::Restore,
        Op::SetDivider,
        Op::SelectTab,
        Op::Remove,
    ];
    let op = ops[rng.choose_index(ops.len())];
    let position = POSITIONS[rng.choose_index(POSITIONS.len())];
    let tab_index = rng.choose_bool().then(|| rng.choose_index(4));
    let tree = tree_elements(graph);
    let leaves = graph.leaves();
    let outcome = match op {
        Op::Add => {
            let id = graph.add_leaf(random_leaf(rng, sequence));
            let target = pick(rng, &tree);
            graph.dock(id, target, position, tab_index)
        }
        Op::Dock => {
            let mut free = graph.detached_leaves();
            free.extend(pinned(graph));
            match pick(rng, &free) {
                Some(leaf) => graph.dock(leaf, pick(rng, &tree), position, tab_index),
                None => graph.dock(ElementId::from_raw(u64::MAX).expect("non-zero"), None, position, None),
            }
        }
        Op::Undock => match pick(rng, &leaves) {
            Some(leaf) => graph.undock(leaf),
            None => graph.undock(ElementId::from_raw(u64::MAX - 1).expect("non-zero")),
        },
        Op::Move => match (pick(rng, &tree), pick(rng, &tree)) {
            (Some(element), target) => graph.move_element(element, target, position, tab_index),
            (None, _) => graph.move_element(
                ElementId::from_raw(u64::MAX - 2).expect("non-zero"),
                None,
                position,
                None,
            ),
        },
        Op::Pin => {
            let mut candidates = leaves.clone();
            candidates.extend(pinned(graph));
            let side = if rng.choose_bool() { Side::Left } else { Side::Right };
            match pick(rng, &candidates) {
                Some(leaf) => graph.pin_to_sidebar(leaf, side, tab_index),
                None => graph.pin_to_sidebar(
                    ElementId::from_raw(u64::MAX - 3).expect("non-zero"),
                    side,
                    None,
                ),
            }
        }
        Op::Restore => {
            let candidates = pinned(graph);
            match pick(rng, &candidates) {
                Some(leaf) => graph.restore_from_sidebar(leaf),
                None => graph.restore_from_sidebar(ElementId::from_raw(u64::MAX - 4).expect("non-zero")),
            }
        }
        Op::SetDivider => {
            let splits = containers(graph, true);
            match pick(rng, &splits) {
                Some(split) => {
                    let count = graph.children_of(split).len();
                    let index = rng.choose_index(count);
                    graph.set_divider(split, index, rng.next_unit())
                }
                None => graph.clear_sidebars(),
            }
        }
        Op::SelectTab => {
            let tabs = containers(graph, false);
            match pick(rng, &tabs) {
                Some(group) => {
                    let count = graph.children_of(group).len();
                    graph.select_tab(group, rng.choose_index(count + 1))
                }
                None => graph.set_sidebar_pinned_open(Side::Left, rng.choose_bool()),
            }
        }
        Op::Remove => {
            let before = graph.revision();
            let removed = pick(rng, &leaves).and_then(|leaf| graph.remove_leaf(leaf));
            match removed {
                Some(_) => DockOutcome::Applied {
                    revision: graph.revision(),
                },
                None => {
                    assert_eq!(graph.revision(), before);
                    graph.undock(ElementId::from_raw(u64::MAX - 5).expect("non-zero"))
                }
            }
        }
    };
    (op, outcome)
}

fn assert_graph_invariants(graph: &LayoutGraph) {
    graph
        .validate()
        .expect("graph should remain structurally valid");
    for leaf in pinned(graph) {
        assert!(
            !graph.contains_in_tree(leaf),
            "pinned leaf {leaf} must not be attached"
        );
    }
}

fn run_sequence(seed: u64, steps: usize) -> LayoutGraph {
    let mut graph = LayoutGraph::new();
    let mut rng = Lcg::new(seed);
    for step in 0..steps {
        let before = graph.revision();
        let (op, outcome) = apply_random(&mut graph, &mut rng, step);
        match outcome {
            DockOutcome::Applied { revision } => {
                assert_eq!(revision, graph.revision());
                assert_eq!(
                    revision,
                    before + 1,
                    "applied {op:?} must bump once (step {step}, seed {seed})"
                );
            }
            DockOutcome::Noop { reason } => assert_eq!(
                graph.revision(),
                before,
                "no-op {op:?} ({reason:?}) must not bump (step {step}, seed {seed})"
            ),
        }
        assert_graph_invariants(&graph);
    }
    graph
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_operation_sequences_preserve_invariants(
        seed in any::<u64>(),
        steps in 20usize..160,
    ) {
        let graph = run_sequence(seed, steps);
        assert_graph_invariants(&graph);
    }

    #[test]
    fn random_operation_sequences_replay_deterministically(
        seed in any::<u64>(),
        steps in 20usize..100,
    ) {
        let first = run_sequence(seed, steps);
        let second = run_sequence(seed, steps);
        prop_assert_eq!(first.root_node(), second.root_node());
        prop_assert_eq!(first.to_snapshot(), second.to_snapshot());
        prop_assert_eq!(first.revision(), second.revision());
    }

    #[test]
    fn locked_graph_ignores_any_stream(
        seed in any::<u64>(),
        steps in 10usize..60,
    ) {
        let mut graph = run_sequence(seed, 40);
        let snapshot = graph.to_snapshot();
        let revision = graph.revision();
        graph.set_locked(true);
        let mut rng = Lcg::new(seed.rotate_left(17));
        for step in 0..steps {
            let (op, outcome) = apply_random(&mut graph, &mut rng, 1_000 + step);
            if !matches!(op, Op::Add) {
                prop_assert!(outcome.is_noop(), "{:?} applied while locked", op);
            }
        }
        // Registering leaves is allowed while locked; structure is not.
        prop_assert_eq!(graph.revision(), revision);
        prop_assert_eq!(graph.to_snapshot(), snapshot);
    }
}

#[test]
fn fuzz_seed_corpus_preserves_invariants() {
    let seeds = [
        0_u64,
        1,
        2,
        3,
        5,
        8,
        13,
        21,
        34,
        55,
        89,
        144,
        u32::MAX as u64,
        (u32::MAX as u64) + 1,
        u64::MAX - 1,
        u64::MAX,
    ];

    for seed in seeds {
        let graph = run_sequence(seed, 240);
        assert_graph_invariants(&graph);
    }
}
