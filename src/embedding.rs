//! # Applying a minor embedding
//!
//! The hardware graph is sparse, so each logical variable is represented by a chain of physical qubits that must
//! agree with each other. This module applies a known embedding: it spreads the logical QUBO over the chains,
//! penalises disagreement inside a chain, and resolves chains back to logical values by majority vote. Finding an
//! embedding in the first place is left to external tooling, a stored embedding is re-used from a previous run.

use crate::coefficients::QuboCoefficients;
use crate::errors::{NurseError, Result};
use crate::sampleset::{Sample, SampleSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use tracing::debug;

/// Target graph, physical qubit to the set of qubits it couples to.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Adjacency {
    nodes: BTreeMap<usize, BTreeSet<usize>>,
}

impl Adjacency {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: usize) {
        self.nodes.entry(node).or_default();
    }

    pub fn add_edge(&mut self, u: usize, v: usize) {
        if u == v {
            self.add_node(u);
            return;
        }
        self.nodes.entry(u).or_default().insert(v);
        self.nodes.entry(v).or_default().insert(u);
    }

    pub fn from_edges(edges: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut adjacency = Self::new();
        for (u, v) in edges {
            adjacency.add_edge(u, v);
        }
        adjacency
    }

    /// The interaction graph of a QUBO, a graph on which the identity embedding is valid.
    pub fn from_coefficients(coeffs: &QuboCoefficients) -> Self {
        let mut adjacency = Self::new();
        for v in 0..coeffs.num_variables() {
            adjacency.add_node(v);
        }
        for (u, v, _) in coeffs.interactions() {
            adjacency.add_edge(u, v);
        }
        adjacency
    }

    pub fn contains_node(&self, node: usize) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn contains_edge(&self, u: usize, v: usize) -> bool {
        self.nodes.get(&u).is_some_and(|n| n.contains(&v))
    }

    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.nodes.get(&node).into_iter().flatten().copied()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.nodes.values().map(BTreeSet::len).sum::<usize>() / 2
    }
}

/// Logical variable to its chain of physical qubits.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    chains: BTreeMap<usize, Vec<usize>>,
}

impl Embedding {
    pub fn new(chains: BTreeMap<usize, Vec<usize>>) -> Self {
        Self { chains }
    }

    /// Every logical variable is its own single qubit chain.
    pub fn identity(num_variables: usize) -> Self {
        Self {
            chains: (0..num_variables).map(|v| (v, vec![v])).collect(),
        }
    }

    pub fn chain(&self, variable: usize) -> Option<&[usize]> {
        self.chains.get(&variable).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn max_chain_length(&self) -> usize {
        self.chains.values().map(Vec::len).max().unwrap_or(0)
    }

    /// One more than the largest physical qubit used.
    pub fn num_physical(&self) -> usize {
        self.chains
            .values()
            .flatten()
            .map(|&q| q + 1)
            .max()
            .unwrap_or(0)
    }

    fn chain_or_err(&self, variable: usize) -> Result<&[usize]> {
        match self.chain(variable) {
            Some(chain) if !chain.is_empty() => Ok(chain),
            _ => Err(NurseError::InvalidEmbedding(format!(
                "variable {variable} has no chain"
            ))),
        }
    }

    /// Checks that the embedding can carry the given QUBO on the target graph.
    pub fn validate(&self, coeffs: &QuboCoefficients, adjacency: &Adjacency) -> Result<()> {
        let mut used = HashSet::new();

        for v in 0..coeffs.num_variables() {
            let chain = self.chain_or_err(v)?;

            for &qubit in chain {
                if !adjacency.contains_node(qubit) {
                    return Err(NurseError::InvalidEmbedding(format!(
                        "qubit {qubit} of variable {v} is not in the target graph"
                    )));
                }
                if !used.insert(qubit) {
                    return Err(NurseError::InvalidEmbedding(format!(
                        "qubit {qubit} is used by more than one chain"
                    )));
                }
            }

            if !is_connected(chain, adjacency) {
                return Err(NurseError::InvalidEmbedding(format!(
                    "chain of variable {v} is not connected"
                )));
            }
        }

        for (u, v, _) in coeffs.interactions() {
            if self.couplers(u, v, adjacency).is_empty() {
                return Err(NurseError::InvalidEmbedding(format!(
                    "no coupler between the chains of variables {u} and {v}"
                )));
            }
        }

        Ok(())
    }

    /// Physical couplers between the chains of two logical variables.
    fn couplers(&self, u: usize, v: usize, adjacency: &Adjacency) -> Vec<(usize, usize)> {
        let (Some(chain_u), Some(chain_v)) = (self.chain(u), self.chain(v)) else {
            return Vec::new();
        };
        let mut couplers = Vec::new();
        for &p in chain_u {
            for &q in chain_v {
                if adjacency.contains_edge(p, q) {
                    couplers.push((p, q));
                }
            }
        }
        couplers
    }

    /// Spreads a logical QUBO over the physical qubits.
    ///
    /// Linear biases are split evenly over a chain and quadratic biases evenly over the couplers between two
    /// chains. Every coupler inside a chain gets `chain_strength * (x_p + x_q - 2 x_p x_q)`, which is zero when the
    /// two qubits agree.
    pub fn embed_qubo(
        &self,
        coeffs: &QuboCoefficients,
        adjacency: &Adjacency,
        chain_strength: f64,
    ) -> Result<QuboCoefficients> {
        self.validate(coeffs, adjacency)?;
        let mut embedded = QuboCoefficients::new();

        for (u, v, bias) in coeffs.iter() {
            if u == v {
                let chain = self.chain_or_err(u)?;
                let share = bias / chain.len() as f64;
                for &qubit in chain {
                    embedded.add(qubit, qubit, share);
                }
            } else {
                let couplers = self.couplers(u, v, adjacency);
                let share = bias / couplers.len() as f64;
                for (p, q) in couplers {
                    embedded.add(p, q, share);
                }
            }
        }

        let mut chain_edges = 0;
        for chain in self.chains.values() {
            for (k, &p) in chain.iter().enumerate() {
                for &q in &chain[k + 1..] {
                    if adjacency.contains_edge(p, q) {
                        embedded.add(p, p, chain_strength);
                        embedded.add(q, q, chain_strength);
                        embedded.add(p, q, -2.0 * chain_strength);
                        chain_edges += 1;
                    }
                }
            }
        }

        debug!(
            logical = coeffs.num_variables(),
            physical = embedded.num_variables(),
            chain_edges,
            "embedded QUBO"
        );

        Ok(embedded)
    }

    /// Copies logical values onto every qubit of their chain, unused qubits are 0.
    pub fn embed_state(&self, logical: &[usize], num_physical: usize) -> Result<Vec<usize>> {
        let mut physical = vec![0; num_physical];
        for (v, &value) in logical.iter().enumerate() {
            for &qubit in self.chain_or_err(v)? {
                if qubit >= num_physical {
                    return Err(NurseError::StateLength {
                        expected: qubit + 1,
                        found: num_physical,
                    });
                }
                physical[qubit] = value;
            }
        }
        Ok(physical)
    }

    /// Resolves each chain by majority vote, a tie resolves to 1. Returns the logical state and the fraction of
    /// chains whose qubits disagreed.
    pub fn unembed_state(&self, physical: &[usize], num_variables: usize) -> Result<(Vec<usize>, f64)> {
        let mut logical = vec![0; num_variables];
        let mut broken = 0;

        for (v, value) in logical.iter_mut().enumerate() {
            let chain = self.chain_or_err(v)?;
            let mut ones = 0;
            for &qubit in chain {
                match physical.get(qubit) {
                    Some(&bit) => ones += bit,
                    None => {
                        return Err(NurseError::StateLength {
                            expected: qubit + 1,
                            found: physical.len(),
                        })
                    }
                }
            }
            if ones != 0 && ones != chain.len() {
                broken += 1;
            }
            *value = usize::from(2 * ones >= chain.len());
        }

        let fraction = if num_variables == 0 {
            0.0
        } else {
            broken as f64 / num_variables as f64
        };
        Ok((logical, fraction))
    }

    /// Unembeds every sample and recomputes its energy on the logical QUBO.
    pub fn unembed_sampleset(
        &self,
        raw: &SampleSet,
        logical: &QuboCoefficients,
        offset: f64,
    ) -> Result<SampleSet> {
        let num_variables = logical.num_variables();
        let samples = raw
            .iter()
            .map(|sample| {
                let (state, fraction) = self.unembed_state(&sample.state, num_variables)?;
                let energy = logical.energy(&state, offset);
                Ok(Sample {
                    state,
                    energy,
                    num_occurrences: sample.num_occurrences,
                    chain_break_fraction: Some(fraction),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SampleSet::from_samples(samples, raw.info.clone()))
    }
}

fn is_connected(chain: &[usize], adjacency: &Adjacency) -> bool {
    let members: HashSet<usize> = chain.iter().copied().collect();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([chain[0]]);
    seen.insert(chain[0]);

    while let Some(node) = queue.pop_front() {
        for next in adjacency.neighbors(node) {
            if members.contains(&next) && seen.insert(next) {
                queue.push_back(next);
            }
        }
    }

    seen.len() == members.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampleset::SamplerInfo;

    /// x0 x1 coupling, x0 carried by a two qubit chain {0, 1}, x1 on qubit 2 next to qubit 1 only
    fn chained() -> (QuboCoefficients, Embedding, Adjacency) {
        let mut coeffs = QuboCoefficients::new();
        coeffs.add(0, 0, -1.0);
        coeffs.add(1, 1, 0.5);
        coeffs.add(0, 1, 2.0);

        let embedding = Embedding::new(BTreeMap::from([(0, vec![0, 1]), (1, vec![2])]));
        let adjacency = Adjacency::from_edges([(0, 1), (1, 2)]);
        (coeffs, embedding, adjacency)
    }

    #[test]
    fn identity_embedding_is_a_copy() {
        let (coeffs, _, _) = chained();
        let adjacency = Adjacency::from_coefficients(&coeffs);
        let embedded = Embedding::identity(2).embed_qubo(&coeffs, &adjacency, 1.0).unwrap();
        assert_eq!(embedded, coeffs);
    }

    #[test]
    fn chains_split_biases_and_get_penalties() {
        let (coeffs, embedding, adjacency) = chained();
        let embedded = embedding.embed_qubo(&coeffs, &adjacency, 3.0).unwrap();

        // -1 split over two qubits, plus the chain penalty on each
        assert_eq!(embedded.get(0, 0), -0.5 + 3.0);
        assert_eq!(embedded.get(1, 1), -0.5 + 3.0);
        assert_eq!(embedded.get(0, 1), -6.0);
        assert_eq!(embedded.get(2, 2), 0.5);
        // the only coupler between the chains
        assert_eq!(embedded.get(1, 2), 2.0);
        assert!(!embedded.contains(0, 2));
    }

    #[test]
    fn embedded_energy_matches_on_intact_chains() {
        let (coeffs, embedding, adjacency) = chained();
        let embedded = embedding.embed_qubo(&coeffs, &adjacency, 3.0).unwrap();

        for logical in [[0, 0], [1, 0], [0, 1], [1, 1]] {
            let physical = embedding.embed_state(&logical, 3).unwrap();
            assert_eq!(embedded.energy(&physical, 0.0), coeffs.energy(&logical, 0.0));
        }
    }

    #[test]
    fn majority_vote_and_chain_breaks() {
        let embedding = Embedding::new(BTreeMap::from([(0, vec![0, 1, 2]), (1, vec![3, 4])]));

        let (state, fraction) = embedding.unembed_state(&[1, 1, 0, 0, 0], 2).unwrap();
        assert_eq!(state, vec![1, 0]);
        assert_eq!(fraction, 0.5);

        // tie resolves to one
        let (state, fraction) = embedding.unembed_state(&[0, 0, 0, 1, 0], 2).unwrap();
        assert_eq!(state, vec![0, 1]);
        assert_eq!(fraction, 0.5);
    }

    #[test]
    fn unembed_sampleset_recomputes_energy() {
        let (coeffs, embedding, _) = chained();
        let raw = SampleSet::from_samples(
            vec![Sample {
                state: vec![1, 0, 1],
                energy: 99.0,
                num_occurrences: 4,
                chain_break_fraction: None,
            }],
            SamplerInfo::default(),
        );

        let samples = embedding.unembed_sampleset(&raw, &coeffs, 1.0).unwrap();
        let best = samples.first().unwrap();
        assert_eq!(best.state, vec![1, 1]);
        assert_eq!(best.energy, -1.0 + 0.5 + 2.0 + 1.0);
        assert_eq!(best.num_occurrences, 4);
        assert_eq!(best.chain_break_fraction, Some(0.5));
    }

    #[test]
    fn rejects_broken_embeddings() {
        let (coeffs, _, adjacency) = chained();

        let overlapping = Embedding::new(BTreeMap::from([(0, vec![0, 1]), (1, vec![1])]));
        assert!(overlapping.validate(&coeffs, &adjacency).is_err());

        let disconnected = Embedding::new(BTreeMap::from([(0, vec![0, 2]), (1, vec![1])]));
        assert!(disconnected.validate(&coeffs, &adjacency).is_err());

        let no_coupler = Embedding::new(BTreeMap::from([(0, vec![0]), (1, vec![2])]));
        assert!(no_coupler.validate(&coeffs, &adjacency).is_err());

        let missing = Embedding::new(BTreeMap::from([(0, vec![0, 1])]));
        assert!(missing.validate(&coeffs, &adjacency).is_err());

        let off_graph = Embedding::new(BTreeMap::from([(0, vec![0, 1]), (1, vec![7])]));
        assert!(off_graph.validate(&coeffs, &adjacency).is_err());
    }

    #[test]
    fn adjacency_counts() {
        let adjacency = Adjacency::from_edges([(0, 1), (1, 2), (2, 1), (3, 3)]);
        assert_eq!(adjacency.num_nodes(), 4);
        assert_eq!(adjacency.num_edges(), 2);
        assert!(adjacency.contains_edge(2, 1));
        assert!(!adjacency.contains_edge(0, 2));
    }
}
