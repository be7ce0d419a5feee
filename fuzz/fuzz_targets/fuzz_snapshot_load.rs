#![no_main]

use dockgraph_layout::{LayoutGraph, LayoutSnapshot};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(snapshot) = serde_json::from_slice::<LayoutSnapshot>(data) else {
        return;
    };
    let mut graph = LayoutGraph::new();
    let Ok(report) = graph.load_snapshot(snapshot) else {
        return;
    };
    graph.validate().expect("loaded layout is valid");
    assert_eq!(report.revision, graph.revision());

    // A normalized layout loads again without repairs.
    let normalized = graph.to_snapshot();
    let mut again = LayoutGraph::new();
    let second = again.load_snapshot(normalized.clone()).expect("own snapshot loads");
    assert!(second.is_clean(), "{:?}", second.repairs);
    assert_eq!(again.to_snapshot(), normalized);
});
