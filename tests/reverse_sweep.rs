extern crate nurse_anneal;

use nurse_anneal::config::ExperimentConfig;
use nurse_anneal::embedding::{Adjacency, Embedding};
use nurse_anneal::errors::NurseError;
use nurse_anneal::experiment::Experiment;
use nurse_anneal::nurse::{NurseProblem, Penalties};
use nurse_anneal::results::{results_path, RunKind, RunRecord, StoredBqm, Topology};
use nurse_anneal::sampler::ReverseAnnealer;
use nurse_anneal::sampleset::{Sample, SampleSet, SamplerInfo};
use std::collections::BTreeMap;
use std::path::PathBuf;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("nurse-anneal-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn small_config(dir: PathBuf) -> ExperimentConfig {
    ExperimentConfig {
        nurses: 3..4,
        days: 5..7,
        num_reads: 20,
        results_dir: dir,
        seed: 17,
        verbose: 0,
        ..ExperimentConfig::default()
    }
}

#[test]
fn seed_then_reverse_sweep() {
    let dir = scratch_dir("sweep");
    let experiment = Experiment::new(small_config(dir.clone()), ReverseAnnealer::default());

    let seeds = experiment.run_seed_sweep().unwrap();
    assert_eq!(seeds.len(), 2);
    for summary in &seeds {
        assert!(summary.path.exists());
        assert_eq!(summary.moved_bits, None);
        assert_eq!(summary.chain_break_fraction, 0.0);
    }

    let reverse = experiment.run_reverse_sweep().unwrap();
    assert_eq!(reverse.len(), 2);
    for (seed, rev) in seeds.iter().zip(&reverse) {
        assert_eq!((seed.nurses, seed.days), (rev.nurses, rev.days));
        assert!(rev.moved_bits.is_some());
        assert_eq!(
            rev.path,
            results_path(&dir, RunKind::ReinitializedReverse, Topology::Pegasus, rev.nurses, rev.days, 20)
        );

        let record = RunRecord::load(&rev.path).unwrap();
        assert_eq!(record.samples.total_occurrences(), 20);
        assert_eq!(record.results.info.num_reads, 20);
        assert!(record.results.info.schedule.as_ref().unwrap().is_reverse());
        assert!((record.bqm.offset - record.problem.energy_offset()).abs() < 1e-9);
    }

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn record_survives_save_and_load() {
    let dir = scratch_dir("record");
    let experiment = Experiment::new(small_config(dir.clone()), ReverseAnnealer::default());

    let (record, summary) = experiment.seed_run(3, 5).unwrap();
    let loaded = RunRecord::load(&summary.path).unwrap();

    assert_eq!(loaded.problem, record.problem);
    assert_eq!(loaded.embedding, record.embedding);
    assert_eq!(loaded.adjacency, record.adjacency);
    assert_eq!(loaded.bqm.coefficients.len(), record.bqm.coefficients.len());
    assert!((loaded.bqm.offset - record.bqm.offset).abs() < 1e-9);
    assert_eq!(loaded.initial_state().unwrap(), record.initial_state().unwrap());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn reverse_run_on_chained_embedding() {
    let dir = scratch_dir("chains");
    let config = ExperimentConfig {
        chain_strength: 4.0,
        ..small_config(dir.clone())
    };
    let problem = NurseProblem::new(3, 5, Penalties::default()).unwrap();
    let coefficients = problem.build_hamiltonian();

    // every variable v on the two qubit chain {2v, 2v + 1}, couplings from the odd qubit to the even one
    let embedding = Embedding::new((0..problem.size()).map(|v| (v, vec![2 * v, 2 * v + 1])).collect::<BTreeMap<_, _>>());
    let mut adjacency = Adjacency::from_edges((0..problem.size()).map(|v| (2 * v, 2 * v + 1)));
    for (u, v, _) in coefficients.interactions() {
        adjacency.add_edge(2 * u + 1, 2 * v);
    }

    // a perfect rotating roster as the stored best sample
    let mut roster = vec![0; problem.size()];
    for d in 0..problem.days {
        roster[problem.index(d % problem.nurses, d)] = 1;
    }
    let physical = embedding.embed_state(&roster, embedding.num_physical()).unwrap();
    let results = SampleSet::from_samples(
        vec![Sample {
            state: physical,
            energy: 0.0,
            num_occurrences: 1,
            chain_break_fraction: None,
        }],
        SamplerInfo::default(),
    );
    let samples = embedding
        .unembed_sampleset(&results, &coefficients, problem.energy_offset())
        .unwrap();

    let seed_record = RunRecord {
        problem: problem.clone(),
        topology: Topology::Pegasus,
        results,
        embedding,
        adjacency,
        bqm: StoredBqm {
            offset: problem.energy_offset(),
            coefficients,
        },
        samples,
    };
    seed_record
        .save(&results_path(&dir, RunKind::Seed, Topology::Pegasus, 3, 5, config.num_reads))
        .unwrap();

    let experiment = Experiment::new(config, ReverseAnnealer::default());
    let (record, summary) = experiment.reverse_run(3, 5).unwrap();

    assert_eq!(summary.physical_qubits, 30);
    assert_eq!(record.results.first().unwrap().state.len(), 30);
    assert_eq!(record.samples.first().unwrap().state.len(), 15);
    assert!(record.samples.mean_chain_break_fraction().is_some());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn invalid_sweep_configuration_is_rejected() {
    let config = ExperimentConfig {
        nurses: 0..2,
        ..small_config(scratch_dir("invalid"))
    };
    let experiment = Experiment::new(config, ReverseAnnealer::default());
    assert!(matches!(experiment.run_seed_sweep(), Err(NurseError::InvalidProblem(_))));
}
