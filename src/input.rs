//! Edge-list ingestion.
//!
//! Input is one arc per line, `<src> <tgt> <prob>` whitespace-separated,
//! terminated by EOF. Malformed tokens, probabilities outside `[0, 1]`, and
//! empty edge lists are fatal: ingestion is the only place this crate reads
//! the outside world, so it fails loudly rather than guessing.

use std::io::BufRead;

use thiserror::Error;

use crate::graph::{Graph, NodeId};
use crate::influence::InfluenceModel;

/// Fatal ingestion errors.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("line {line}: expected `<src> <tgt> <prob>`, got {found} fields")]
    FieldCount { line: usize, found: usize },
    #[error("line {line}: invalid {what} `{token}`")]
    InvalidToken {
        line: usize,
        what: &'static str,
        token: String,
    },
    #[error("line {line}: probability {value} outside [0, 1]")]
    ProbabilityRange { line: usize, value: f64 },
    #[error("edge list is empty")]
    Empty,
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One parsed arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeRecord {
    pub src: NodeId,
    pub tgt: NodeId,
    pub prob: f64,
}

/// Parse a whole edge-list stream. Blank lines are allowed and skipped.
pub fn parse_edge_list<R: BufRead>(reader: R) -> Result<Vec<EdgeRecord>, InputError> {
    let mut edges = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = idx + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() != 3 {
            return Err(InputError::FieldCount {
                line: lineno,
                found: fields.len(),
            });
        }
        let src: NodeId = fields[0].parse().map_err(|_| InputError::InvalidToken {
            line: lineno,
            what: "source node",
            token: fields[0].to_string(),
        })?;
        let tgt: NodeId = fields[1].parse().map_err(|_| InputError::InvalidToken {
            line: lineno,
            what: "target node",
            token: fields[1].to_string(),
        })?;
        let prob: f64 = fields[2].parse().map_err(|_| InputError::InvalidToken {
            line: lineno,
            what: "probability",
            token: fields[2].to_string(),
        })?;
        if !prob.is_finite() || !(0.0..=1.0).contains(&prob) {
            return Err(InputError::ProbabilityRange {
                line: lineno,
                value: prob,
            });
        }
        edges.push(EdgeRecord { src, tgt, prob });
    }
    if edges.is_empty() {
        return Err(InputError::Empty);
    }
    Ok(edges)
}

/// Ground-truth graph: every arc is a point probability.
pub fn point_graph(edges: &[EdgeRecord]) -> Graph {
    let mut g = Graph::new();
    for e in edges {
        g.add_edge(e.src, e.tgt, InfluenceModel::point(e.prob));
    }
    g
}

/// Model graph: every arc carries `Beta(alpha, beta)` with the edge's true
/// probability recorded as the ground prior.
pub fn beta_graph(edges: &[EdgeRecord], alpha: f64, beta: f64) -> Graph {
    let mut g = Graph::new();
    for e in edges {
        g.add_edge(e.src, e.tgt, InfluenceModel::beta(alpha, beta, e.prob));
    }
    g.set_prior(alpha, beta);
    g
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_list() {
        let input = "0 1 1.0\n1 2 0.5\n\n2 0 0.25\n";
        let edges = parse_edge_list(input.as_bytes()).expect("valid input");
        assert_eq!(edges.len(), 3);
        assert_eq!(
            edges[1],
            EdgeRecord {
                src: 1,
                tgt: 2,
                prob: 0.5
            }
        );
    }

    #[test]
    fn rejects_non_numeric_tokens() {
        let err = parse_edge_list("0 x 0.5\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            InputError::InvalidToken {
                what: "target node",
                ..
            }
        ));
    }

    #[test]
    fn rejects_out_of_range_probability() {
        let err = parse_edge_list("0 1 1.5\n".as_bytes()).unwrap_err();
        assert!(matches!(err, InputError::ProbabilityRange { value, .. } if value == 1.5));
    }

    #[test]
    fn rejects_wrong_field_count() {
        let err = parse_edge_list("0 1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, InputError::FieldCount { found: 2, .. }));
    }

    #[test]
    fn rejects_an_empty_list() {
        assert!(matches!(
            parse_edge_list("\n\n".as_bytes()),
            Err(InputError::Empty)
        ));
    }

    #[test]
    fn builds_both_graph_flavours() {
        let edges = parse_edge_list("0 1 0.5\n".as_bytes()).expect("valid");
        let real = point_graph(&edges);
        let model = beta_graph(&edges, 2.0, 3.0);
        assert_eq!(real.edge_count(), 1);
        assert_eq!(model.prior(), (2.0, 3.0));
        match model.neighbours(0)[0].influence {
            InfluenceModel::Beta(b) => assert_eq!(b.prior, 0.5),
            InfluenceModel::Point(_) => panic!("expected beta"),
        }
    }
}
