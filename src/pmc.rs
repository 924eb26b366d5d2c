//! PMC: pruned Monte-Carlo seed selection (Ohsaka et al.).
//!
//! Each of R live-edge samples is contracted into an SCC DAG weighted by
//! component size. Marginal gains are then reachability sums over the DAG,
//! memoized per DAG node and pruned through a high-out-degree hub: while the
//! seed set is empty, every ancestor of the hub inherits the hub's gain for
//! the hub-descendant region instead of re-walking it. Selecting a seed
//! removes its component and everything downstream from every DAG.
//!
//! Tarjan runs iteratively with an explicit frame stack; recursion would
//! overflow on deep cascades.

use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::evaluator::Evaluator;
use crate::graph::{Graph, NodeId, SeedSet};
use crate::influence::InfluenceModel;
use crate::samples::{PathSampler, SampleManager};

type SccId = u64;

/// One live-edge sample contracted to its SCC DAG, with gain memoization.
#[derive(Debug, Clone)]
struct ContractionDag {
    scc_of: BTreeMap<NodeId, SccId>,
    /// SCC members, with already-activated nodes dropped so they carry no
    /// weight.
    members: BTreeMap<SccId, Vec<NodeId>>,
    dag: Graph,
    hub: SccId,
    /// DAG nodes reachable from the hub (hub excluded).
    descendants: BTreeSet<SccId>,
    /// DAG nodes that reach the hub (hub excluded).
    ancestors: BTreeSet<SccId>,
    delta: BTreeMap<SccId, f64>,
    latest: BTreeMap<SccId, bool>,
}

impl ContractionDag {
    fn weight(&self, scc: SccId) -> f64 {
        self.members.get(&scc).map(|m| m.len() as f64).unwrap_or(0.0)
    }

    /// DAG nodes reachable from `from` (inclusive).
    fn reach(&self, from: SccId) -> BTreeSet<SccId> {
        let mut seen = BTreeSet::from([from]);
        let mut frontier = vec![from];
        while let Some(u) = frontier.pop() {
            for arc in self.dag.neighbours(u) {
                if seen.insert(arc.target) {
                    frontier.push(arc.target);
                }
            }
        }
        seen
    }

    /// Marginal gain of seeding `node` given whether the seed set is still
    /// empty, memoized until invalidated.
    fn gain(&mut self, node: NodeId, set_is_empty: bool) -> f64 {
        let Some(&scc) = self.scc_of.get(&node) else {
            return 0.0;
        };
        self.gain_by_scc(scc, set_is_empty)
    }

    fn gain_by_scc(&mut self, scc: SccId, set_is_empty: bool) -> f64 {
        if !self.dag.contains(scc) {
            return 0.0;
        }
        if self.latest.get(&scc).copied().unwrap_or(false) {
            return self.delta.get(&scc).copied().unwrap_or(0.0);
        }

        // Hub pruning only applies before the first seed is placed: an
        // ancestor of the hub reaches at least everything the hub reaches,
        // so the hub-descendant region is inherited instead of re-walked.
        let prune = set_is_empty && self.ancestors.contains(&scc);
        let mut delta = if prune {
            self.gain_by_scc(self.hub, set_is_empty)
        } else {
            0.0
        };

        let mut seen = BTreeSet::from([scc]);
        let mut frontier = vec![scc];
        while let Some(u) = frontier.pop() {
            if prune && (u == self.hub || self.descendants.contains(&u)) {
                // Already accounted for through the hub's gain.
                continue;
            }
            delta += self.weight(u);
            for arc in self.dag.neighbours(u) {
                if seen.insert(arc.target) {
                    frontier.push(arc.target);
                }
            }
        }

        self.delta.insert(scc, delta);
        self.latest.insert(scc, true);
        delta
    }

    /// Remove the chosen node's SCC and everything downstream; invalidate
    /// every memoized gain that could still reach the removed region.
    fn commit(&mut self, node: NodeId) {
        let Some(&scc) = self.scc_of.get(&node) else {
            return;
        };
        if !self.dag.contains(scc) {
            return;
        }
        let removed = self.reach(scc);
        let cached: Vec<SccId> = self
            .latest
            .iter()
            .filter(|(_, &fresh)| fresh)
            .map(|(&v, _)| v)
            .collect();
        for v in cached {
            if !self.dag.contains(v) || !self.reach(v).is_disjoint(&removed) {
                self.latest.insert(v, false);
            }
        }
        for &u in &removed {
            self.dag.remove_node(u);
        }
    }
}

/// Pruned Monte-Carlo evaluator. R, the number of live-edge samples, is
/// taken from the sampler's trial count.
#[derive(Debug, Clone)]
pub struct PmcEvaluator {
    rng: StdRng,
}

impl PmcEvaluator {
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Sample live edges and contract them into an SCC DAG.
    fn contract(
        &mut self,
        graph: &Graph,
        sampler: &PathSampler,
        activated: &SeedSet,
    ) -> ContractionDag {
        // Sample every edge exactly once up front; Tarjan then runs on the
        // live subgraph.
        let mut live: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
        for u in graph.nodes() {
            let out: Vec<NodeId> = graph
                .neighbours(u)
                .iter()
                .filter(|arc| arc.influence.attempt(sampler.kind(), &mut self.rng))
                .map(|arc| arc.target)
                .collect();
            live.insert(u, out);
        }

        let (scc_of, mut members) = tarjan_scc(graph, &live);
        for nodes in members.values_mut() {
            nodes.retain(|n| !activated.contains(n));
        }

        // Contraction DAG: one node per SCC, an arc per live edge crossing
        // components (deduplicated).
        let mut dag = Graph::new();
        for &scc in members.keys() {
            dag.add_node(scc);
        }
        let mut dag_edges: BTreeSet<(SccId, SccId)> = BTreeSet::new();
        for (u, outs) in &live {
            for v in outs {
                let (a, b) = (scc_of[u], scc_of[v]);
                if a != b && dag_edges.insert((a, b)) {
                    dag.add_edge(a, b, InfluenceModel::point(1.0));
                }
            }
        }

        // Hub: the DAG node with the largest out-degree (smaller id on ties).
        let hub = dag
            .nodes()
            .max_by_key(|&s| (dag.out_degree(s), std::cmp::Reverse(s)))
            .unwrap_or(0);

        let mut descendants = BTreeSet::new();
        let mut frontier = vec![hub];
        while let Some(u) = frontier.pop() {
            for arc in dag.neighbours(u) {
                if arc.target != hub && descendants.insert(arc.target) {
                    frontier.push(arc.target);
                }
            }
        }

        let rev = dag.reverse_index();
        let mut ancestors = BTreeSet::new();
        let mut frontier = vec![hub];
        while let Some(u) = frontier.pop() {
            if let Some(in_arcs) = rev.get(&u) {
                for (src, _) in in_arcs {
                    if *src != hub && ancestors.insert(*src) {
                        frontier.push(*src);
                    }
                }
            }
        }

        ContractionDag {
            scc_of,
            members,
            dag,
            hub,
            descendants,
            ancestors,
            delta: BTreeMap::new(),
            latest: BTreeMap::new(),
        }
    }
}

impl Default for PmcEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator for PmcEvaluator {
    fn select(
        &mut self,
        graph: &Graph,
        sampler: &PathSampler,
        _samples: &mut SampleManager,
        activated: &SeedSet,
        k: usize,
    ) -> SeedSet {
        let r = sampler.trials();
        let mut dags: Vec<ContractionDag> = (0..r)
            .map(|_| self.contract(graph, sampler, activated))
            .collect();

        let mut chosen = SeedSet::new();
        while chosen.len() < k {
            let mut best: Option<(f64, NodeId)> = None;
            for v in graph.nodes() {
                if activated.contains(&v) || chosen.contains(&v) {
                    continue;
                }
                let total: f64 = dags
                    .iter_mut()
                    .map(|d| d.gain(v, chosen.is_empty()))
                    .sum();
                let avg = total / r as f64;
                // Largest gain wins; ascending node order makes the smaller
                // id win exact ties.
                if best.map(|(g, _)| avg > g).unwrap_or(true) {
                    best = Some((avg, v));
                }
            }
            let Some((_, pick)) = best else {
                break;
            };
            chosen.insert(pick);
            for dag in &mut dags {
                dag.commit(pick);
            }
        }
        chosen
    }
}

/// Iterative Tarjan over the live subgraph. Returns `(node -> SCC id,
/// SCC id -> members)`; SCC ids are assigned in completion order.
fn tarjan_scc(
    graph: &Graph,
    live: &BTreeMap<NodeId, Vec<NodeId>>,
) -> (BTreeMap<NodeId, SccId>, BTreeMap<SccId, Vec<NodeId>>) {
    let mut index: BTreeMap<NodeId, usize> = BTreeMap::new();
    let mut lowlink: BTreeMap<NodeId, usize> = BTreeMap::new();
    let mut on_stack: BTreeSet<NodeId> = BTreeSet::new();
    let mut stack: Vec<NodeId> = Vec::new();
    let mut scc_of: BTreeMap<NodeId, SccId> = BTreeMap::new();
    let mut members: BTreeMap<SccId, Vec<NodeId>> = BTreeMap::new();
    let mut counter = 0usize;
    let mut next_scc: SccId = 0;

    const EMPTY: &[NodeId] = &[];
    let out = |v: NodeId| live.get(&v).map(Vec::as_slice).unwrap_or(EMPTY);

    for root in graph.nodes() {
        if index.contains_key(&root) {
            continue;
        }
        // Frame: (node, next out-edge offset).
        let mut frames: Vec<(NodeId, usize)> = vec![(root, 0)];
        index.insert(root, counter);
        lowlink.insert(root, counter);
        counter += 1;
        stack.push(root);
        on_stack.insert(root);

        while let Some(frame) = frames.last_mut() {
            let v = frame.0;
            if let Some(&w) = out(v).get(frame.1) {
                frame.1 += 1;
                if !index.contains_key(&w) {
                    index.insert(w, counter);
                    lowlink.insert(w, counter);
                    counter += 1;
                    stack.push(w);
                    on_stack.insert(w);
                    frames.push((w, 0));
                } else if on_stack.contains(&w) {
                    let low = lowlink[&v].min(index[&w]);
                    lowlink.insert(v, low);
                }
            } else {
                frames.pop();
                if let Some(&(parent, _)) = frames.last() {
                    let low = lowlink[&parent].min(lowlink[&v]);
                    lowlink.insert(parent, low);
                }
                if lowlink[&v] == index[&v] {
                    let mut component = Vec::new();
                    while let Some(w) = stack.pop() {
                        on_stack.remove(&w);
                        scc_of.insert(w, next_scc);
                        component.push(w);
                        if w == v {
                            break;
                        }
                    }
                    members.insert(next_scc, component);
                    next_scc += 1;
                }
            }
        }
    }

    (scc_of, members)
}
