mod common;

use std::collections::HashMap;

use common::{fresh_html, App, TreeGen};
use haskle_dom::NodeId;
use haskle_vdom::{keyed_node, node, text, VNode};
use proptest::prelude::*;

const SEEDS: u64 = 64;
const STEPS: usize = 8;

#[test]
fn random_updates_converge_on_a_fresh_render() {
    for seed in 0..SEEDS {
        let mut gen = TreeGen::new(seed);
        let mut app = App::mount(gen.tree(3));
        for step in 0..STEPS {
            let next = gen.tree(3);
            app.update(next.clone());
            assert!(
                app.matches(&next),
                "seed {seed}, step {step}: {} vs {}",
                app.html(),
                fresh_html(&next)
            );
        }
    }
}

#[test]
fn updates_stay_attached_to_the_body() {
    for seed in 0..SEEDS {
        let mut gen = TreeGen::new(seed);
        let mut app = App::mount(gen.tree(2));
        for _ in 0..STEPS {
            app.update(gen.tree(2));
            assert_eq!(app.doc.child_nodes(app.body), &[app.root()], "seed {seed}");
        }
    }
}

#[test]
fn equal_trees_produce_no_patches() {
    for seed in 0..SEEDS {
        let gen = TreeGen::new(0);
        let first = gen.fork(seed).tree(3);
        let again = gen.fork(seed).tree(3);

        let mut app = App::mount(first.clone());
        let html = app.html();
        assert_eq!(app.update(first), 0, "seed {seed}: same handle");
        assert_eq!(app.update(again), 0, "seed {seed}: rebuilt tree");
        assert_eq!(app.html(), html);
    }
}

#[test]
fn patching_twice_toward_the_same_tree_is_a_no_op() {
    for seed in 0..SEEDS {
        let mut gen = TreeGen::new(seed);
        let mut app = App::mount(gen.tree(3));
        let target = gen.tree(3);
        app.update(target.clone());
        let html = app.html();
        assert_eq!(app.update(target), 0, "seed {seed}");
        assert_eq!(app.html(), html);
    }
}

// ── Keyed lists ───────────────────────────────────────────────────────────

fn list(keys: &[u32]) -> VNode<u32> {
    keyed_node(
        "ul",
        vec![],
        keys.iter()
            .map(|k| (k.to_string(), node("li", vec![], vec![text(k.to_string())])))
            .collect(),
    )
}

fn nodes_by_key(app: &App<u32>, keys: &[u32]) -> HashMap<u32, NodeId> {
    keys.iter()
        .copied()
        .zip(app.doc.child_nodes(app.root()).iter().copied())
        .collect()
}

fn distinct_keys() -> impl Strategy<Value = Vec<u32>> {
    proptest::sample::subsequence((0..10).collect::<Vec<u32>>(), 0..=10).prop_shuffle()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn keyed_permutations_converge_and_keep_nodes(
        old in distinct_keys(),
        new in distinct_keys(),
    ) {
        let mut app = App::mount(list(&old));
        let before = nodes_by_key(&app, &old);

        app.update(list(&new));
        prop_assert!(app.matches(&list(&new)), "{}", app.html());

        let after = nodes_by_key(&app, &new);
        for key in &new {
            if let Some(id) = before.get(key) {
                prop_assert_eq!(after.get(key), Some(id), "key {} was re-rendered", key);
            }
        }
    }

    #[test]
    fn keyed_lists_with_duplicates_converge(
        old in prop::collection::vec(0u32..4, 0..8),
        new in prop::collection::vec(0u32..4, 0..8),
    ) {
        let mut app = App::mount(list(&old));
        app.update(list(&new));
        prop_assert!(app.matches(&list(&new)), "{}", app.html());
    }
}
