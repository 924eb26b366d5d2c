use std::collections::BTreeSet;

use proptest::prelude::*;

use infmax::{
    BetaBelief, CelfEvaluator, DiscountDegreeEvaluator, Evaluator, Graph, HighestDegreeEvaluator,
    InfluenceModel, PathSampler, PmcEvaluator, RandomEvaluator, SampleKind, SampleManager,
    SeedSet, TimConfig, TimEvaluator,
};

/// Build a graph from proptest-generated arcs; self-loops are skipped.
fn graph_from(arcs: &[(u64, u64, f64)]) -> Graph {
    let mut g = Graph::new();
    for &(u, v, p) in arcs {
        if u != v {
            g.add_edge(u, v, InfluenceModel::point(p));
        }
    }
    g
}

fn all_evaluators(seed: u64) -> Vec<(&'static str, Box<dyn Evaluator>)> {
    vec![
        ("celf", Box::new(CelfEvaluator::new())),
        ("random", Box::new(RandomEvaluator::with_seed(seed))),
        ("highest-degree", Box::new(HighestDegreeEvaluator::new())),
        ("discount-degree", Box::new(DiscountDegreeEvaluator::new())),
        (
            "tim",
            Box::new(TimEvaluator::with_seed(TimConfig::default(), seed)),
        ),
        ("pmc", Box::new(PmcEvaluator::with_seed(seed))),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Every evaluator returns at most k seeds, none of them activated.
    #[test]
    fn seed_sets_are_valid_for_every_evaluator(
        arcs in prop::collection::vec((0u64..12, 0u64..12, 0.0f64..=1.0), 1..40),
        activated_raw in prop::collection::btree_set(0u64..12, 0..6),
        k in 1usize..4,
        seed in 0u64..1000,
    ) {
        let g = graph_from(&arcs);
        prop_assume!(g.node_count() > 0);
        let activated: SeedSet = activated_raw.into_iter().collect();
        let sampler = PathSampler::new(SampleKind::Mean, 4);

        for (name, mut evaluator) in all_evaluators(seed) {
            let mut samples = SampleManager::new(seed);
            let seeds = evaluator.select(&g, &sampler, &mut samples, &activated, k);
            prop_assert!(seeds.len() <= k, "{name} returned {} > k={k}", seeds.len());
            prop_assert!(
                seeds.is_disjoint(&activated),
                "{name} returned activated seeds"
            );
            for s in &seeds {
                prop_assert!(g.contains(*s), "{name} invented node {s}");
            }
        }
    }

    /// When enough candidates exist, exactly k seeds come back.
    #[test]
    fn seed_sets_are_full_when_candidates_suffice(
        arcs in prop::collection::vec((0u64..12, 0u64..12, 0.0f64..=1.0), 4..40),
        k in 1usize..4,
        seed in 0u64..1000,
    ) {
        let g = graph_from(&arcs);
        prop_assume!(g.node_count() >= 4);
        let sampler = PathSampler::new(SampleKind::Mean, 4);
        for (name, mut evaluator) in all_evaluators(seed) {
            let mut samples = SampleManager::new(seed);
            let seeds = evaluator.select(&g, &sampler, &mut samples, &SeedSet::new(), k);
            prop_assert!(seeds.len() == k, "{name} returned {} != k={k}", seeds.len());
        }
    }

    /// A fixed seed reproduces every evaluator's choice exactly.
    #[test]
    fn evaluators_are_deterministic_under_a_fixed_seed(
        arcs in prop::collection::vec((0u64..10, 0u64..10, 0.0f64..=1.0), 1..30),
        k in 1usize..3,
        seed in 0u64..1000,
    ) {
        let g = graph_from(&arcs);
        prop_assume!(g.node_count() > 0);
        let sampler = PathSampler::new(SampleKind::Mean, 3);
        let run = || {
            all_evaluators(seed)
                .into_iter()
                .map(|(name, mut evaluator)| {
                    let mut samples = SampleManager::new(seed);
                    (name, evaluator.select(&g, &sampler, &mut samples, &SeedSet::new(), k))
                })
                .collect::<Vec<_>>()
        };
        prop_assert_eq!(run(), run());
    }

    /// One observation batch moves the posterior mean strictly toward the
    /// empirical rate (unless it is already there).
    #[test]
    fn posterior_mean_moves_toward_the_empirical_rate(
        hits in 0u64..50,
        misses in 0u64..50,
    ) {
        prop_assume!(hits + misses > 0);
        let mut b = BetaBelief::new(1.0, 1.0, 0.5);
        let before = b.mean();
        let target = hits as f64 / (hits + misses) as f64;
        b.observe(hits, misses);
        let after = b.mean();
        if (target - before).abs() > 1e-12 {
            prop_assert!(
                (after - target).abs() < (before - target).abs(),
                "mean {before} -> {after} did not approach {target}"
            );
        } else {
            prop_assert!((after - target).abs() < 1e-12);
        }
    }

    /// Spread estimates shrink as the activated set grows (monotone
    /// exclusion).
    #[test]
    fn spread_never_grows_with_more_activations(
        arcs in prop::collection::vec((0u64..10, 0u64..10, 0.0f64..=1.0), 1..30),
        extra in prop::collection::btree_set(0u64..10, 0..5),
    ) {
        let g = graph_from(&arcs);
        prop_assume!(g.node_count() > 0);
        let seed_node = g.nodes().next().expect("non-empty graph");
        prop_assume!(!extra.contains(&seed_node));
        let sampler = PathSampler::new(SampleKind::Mean, 5);
        let mut samples = SampleManager::new(0);
        let unblocked = sampler.spread(&g, &mut samples, &SeedSet::new(), [seed_node]);
        let blocked: BTreeSet<u64> = extra.into_iter().collect();
        let constrained = sampler.spread(&g, &mut samples, &blocked, [seed_node]);
        prop_assert!(constrained <= unblocked + 1e-9);
    }
}
