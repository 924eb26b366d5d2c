//! Directed graph with per-arc influence distributions.
//!
//! Adjacency is outgoing-only and ordered (`BTreeMap`), so node iteration is
//! stable across runs and evaluator tie-breaks reproduce under a fixed RNG
//! seed. The reverse index needed by sketch-based evaluators is a derived
//! view, rebuilt on demand rather than maintained incrementally.

use std::collections::{BTreeMap, BTreeSet};

use crate::influence::InfluenceModel;

/// Node identifier. Nodes are implicit in the edge list.
pub type NodeId = u64;

/// A set of seed nodes, ordered for reproducible output.
pub type SeedSet = BTreeSet<NodeId>;

/// One outgoing arc.
#[derive(Debug, Clone)]
pub struct Arc {
    pub target: NodeId,
    pub influence: InfluenceModel,
}

/// Directed graph: `node -> outgoing arcs`, plus prior bookkeeping used by
/// posterior-mean normalization in degree-style evaluators.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    adjacency: BTreeMap<NodeId, Vec<Arc>>,
    nodes: BTreeSet<NodeId>,
    edge_count: usize,
    prior: (f64, f64),
    rounds: f64,
}

impl Graph {
    pub fn new() -> Self {
        Self {
            adjacency: BTreeMap::new(),
            nodes: BTreeSet::new(),
            edge_count: 0,
            prior: (1.0, 1.0),
            rounds: 0.0,
        }
    }

    /// Register a node without arcs.
    pub fn add_node(&mut self, u: NodeId) {
        self.nodes.insert(u);
    }

    /// Append the arc `u -> v`. Callers deduplicate; this does not.
    pub fn add_edge(&mut self, u: NodeId, v: NodeId, influence: InfluenceModel) {
        self.nodes.insert(u);
        self.nodes.insert(v);
        self.adjacency.entry(u).or_default().push(Arc { target: v, influence });
        self.edge_count += 1;
    }

    /// All node ids in ascending order (stable across runs).
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn contains(&self, u: NodeId) -> bool {
        self.nodes.contains(&u)
    }

    pub fn has_neighbours(&self, u: NodeId) -> bool {
        self.adjacency.get(&u).is_some_and(|a| !a.is_empty())
    }

    /// Outgoing arcs of `u` (empty slice if none).
    pub fn neighbours(&self, u: NodeId) -> &[Arc] {
        self.adjacency.get(&u).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn out_degree(&self, u: NodeId) -> usize {
        self.neighbours(u).len()
    }

    /// Drop `u` together with all incident arcs, outgoing and incoming.
    pub fn remove_node(&mut self, u: NodeId) {
        if !self.nodes.remove(&u) {
            return;
        }
        if let Some(out) = self.adjacency.remove(&u) {
            self.edge_count -= out.len();
        }
        for arcs in self.adjacency.values_mut() {
            let before = arcs.len();
            arcs.retain(|a| a.target != u);
            self.edge_count -= before - arcs.len();
        }
    }

    /// Mutable access to the distribution on `u -> v`, if the arc exists.
    ///
    /// With parallel arcs (callers are expected to avoid them) the first
    /// match wins.
    pub fn influence_mut(&mut self, u: NodeId, v: NodeId) -> Option<&mut InfluenceModel> {
        self.adjacency
            .get_mut(&u)?
            .iter_mut()
            .find(|a| a.target == v)
            .map(|a| &mut a.influence)
    }

    /// Visit every arc as `(source, target, influence)`.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, &InfluenceModel)> + '_ {
        self.adjacency
            .iter()
            .flat_map(|(&u, arcs)| arcs.iter().map(move |a| (u, a.target, &a.influence)))
    }

    /// Derived reverse view: `target -> incoming (source, influence)` pairs.
    ///
    /// Distributions are value-typed and cheap to clone, so the view owns its
    /// copies and stays valid while the caller samples from it.
    pub fn reverse_index(&self) -> BTreeMap<NodeId, Vec<(NodeId, InfluenceModel)>> {
        let mut rev: BTreeMap<NodeId, Vec<(NodeId, InfluenceModel)>> = BTreeMap::new();
        for (u, v, inf) in self.edges() {
            rev.entry(v).or_default().push((u, *inf));
        }
        rev
    }

    /// Record the prior pseudo-counts the model graph was built with.
    pub fn set_prior(&mut self, alpha: f64, beta: f64) {
        self.prior = (alpha.max(0.0), beta.max(0.0));
    }

    pub fn prior(&self) -> (f64, f64) {
        self.prior
    }

    /// Prior mean `alpha0 / (alpha0 + beta0)`, `0.5` when unset.
    pub fn prior_mean(&self) -> f64 {
        let (a, b) = self.prior;
        if a + b <= 0.0 {
            0.5
        } else {
            a / (a + b)
        }
    }

    /// Bump the observed-rounds counter used for posterior-mean
    /// normalization.
    pub fn update_rounds(&mut self, n: f64) {
        if n.is_finite() && n > 0.0 {
            self.rounds += n;
        }
    }

    pub fn rounds(&self) -> f64 {
        self.rounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_graph(edges: &[(NodeId, NodeId, f64)]) -> Graph {
        let mut g = Graph::new();
        for &(u, v, p) in edges {
            g.add_edge(u, v, InfluenceModel::point(p));
        }
        g
    }

    #[test]
    fn nodes_are_the_union_of_endpoints() {
        let g = point_graph(&[(0, 1, 0.5), (2, 1, 0.5)]);
        assert_eq!(g.nodes().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn remove_node_drops_arcs_in_both_directions() {
        let mut g = point_graph(&[(0, 1, 1.0), (1, 2, 1.0), (2, 0, 1.0)]);
        g.remove_node(1);
        assert!(!g.contains(1));
        assert_eq!(g.edge_count(), 1);
        assert!(g.neighbours(0).is_empty());
        assert_eq!(g.neighbours(2)[0].target, 0);
    }

    #[test]
    fn remove_missing_node_is_a_no_op() {
        let mut g = point_graph(&[(0, 1, 1.0)]);
        g.remove_node(99);
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn reverse_index_inverts_arcs() {
        let g = point_graph(&[(0, 2, 0.5), (1, 2, 0.5)]);
        let rev = g.reverse_index();
        let sources: Vec<NodeId> = rev[&2].iter().map(|(s, _)| *s).collect();
        assert_eq!(sources, vec![0, 1]);
        assert!(!rev.contains_key(&0));
    }

    #[test]
    fn prior_bookkeeping_round_trips() {
        let mut g = point_graph(&[(0, 1, 0.5)]);
        assert_eq!(g.prior_mean(), 0.5);
        g.set_prior(2.0, 6.0);
        assert_eq!(g.prior(), (2.0, 6.0));
        assert_eq!(g.prior_mean(), 0.25);
        g.update_rounds(8.0);
        g.update_rounds(f64::NAN);
        assert_eq!(g.rounds(), 8.0);
    }

    #[test]
    fn influence_mut_reaches_the_arc() {
        let mut g = Graph::new();
        g.add_edge(0, 1, InfluenceModel::beta(1.0, 1.0, 0.5));
        g.influence_mut(0, 1).expect("arc exists").observe(3, 1);
        match g.neighbours(0)[0].influence {
            InfluenceModel::Beta(b) => {
                assert_eq!(b.alpha, 4.0);
                assert_eq!(b.beta, 2.0);
            }
            InfluenceModel::Point(_) => panic!("expected beta"),
        }
        assert!(g.influence_mut(1, 0).is_none());
    }
}
