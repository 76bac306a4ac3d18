//! End-to-end runs through the public API: settings file, benchmark runner
//! and statistics files.

use evocomp::benchmark::{average_histories, condition_generation, Benchmark};
use evocomp::evolution::{Evolution, EvolutionConfig, Mutation, Selection};
use evocomp::io::{
    read_statistics, round_to, write_statistics, CsvWriter, History, HistoryWriter,
};
use evocomp::problems::{Evolution2D, Landscape, Point, Tsp, TspConfig, ValueRange};
use evocomp::settings::settings_from_file;
use evocomp::Error;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_settings_file_to_benchmark_csv() {
    let dir = tempdir().unwrap();
    let settings_path = dir.path().join("settings.csv");
    fs::write(&settings_path, "uniform 0.5,20,0.1\nnormal 0.25,30,1\n").unwrap();

    let settings = settings_from_file(&settings_path).unwrap();
    let range = ValueRange::new(-5.0, 5.0).unwrap();

    let evolutions = settings
        .into_iter()
        .enumerate()
        .map(|(i, setting)| {
            let sink = CsvWriter::statistics(dir.path().join(format!("run{i}.csv")), 2)?;
            Evolution2D::new(Landscape::Sine, setting, range)
                .with_seed(i as u64)
                .build_with_sink(sink)
        })
        .collect::<evocomp::Result<Vec<_>>>()
        .unwrap();

    let mut benchmark = Benchmark::new(evolutions, condition_generation(15));
    let outcomes = benchmark.run().unwrap();
    assert_eq!(outcomes.len(), 2);

    for (i, outcome) in outcomes.iter().enumerate() {
        let rows = read_statistics(dir.path().join(format!("run{i}.csv"))).unwrap();
        // Generation 0 plus one row per step.
        assert_eq!(rows.len(), 16);

        let last = rows.last().unwrap();
        assert!((last.fittest - round_to(outcome.best_fitness, 2)).abs() < 1e-9);
        assert!((last.mean - round_to(outcome.mean_fitness, 2)).abs() < 1e-9);
        assert!((last.median - round_to(outcome.median_fitness, 2)).abs() < 1e-9);
        // Sine is clipped at zero.
        assert!(rows.iter().all(|row| row.fittest >= 0.0 && row.median >= 0.0));
    }
}

#[test]
fn test_malformed_settings_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.csv");
    fs::write(&path, "uniform 0.5,20,0.1\nuniform 0.5,0,0.1\n").unwrap();

    match settings_from_file(&path) {
        Err(Error::InvalidConfiguration(msg)) => assert!(msg.contains("row 2"), "{msg}"),
        other => panic!("expected InvalidConfiguration, got {other:?}"),
    }
}

#[test]
fn test_csv_statistics_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stats.csv");

    let mut evolution = Evolution::builder(EvolutionConfig::new(12).with_seed(5))
        .random_generator(|rng: &mut dyn RngCore| -> evocomp::Result<f64> {
            Ok(rng.random_range(0.0..100.0))
        })
        .fitness_fn(|x: &f64| -> evocomp::Result<f64> { Ok(*x) })
        .selection(Selection::RouletteWheel)
        .operator(Mutation::new(|x: &f64, rng: &mut dyn RngCore| {
            Ok(x + rng.random_range(0.0..1.0))
        }))
        .sink(CsvWriter::statistics(&path, 3).unwrap())
        .build()
        .unwrap();

    let mut expected = vec![(
        evolution.fittest_individual().1,
        evolution.mean_fitness(),
        evolution.median_fitness(),
    )];
    for _ in 0..5 {
        evolution.step().unwrap();
        expected.push((
            evolution.fittest_individual().1,
            evolution.mean_fitness(),
            evolution.median_fitness(),
        ));
    }
    evolution.finalize().unwrap();

    let rows = read_statistics(&path).unwrap();
    assert_eq!(rows.len(), expected.len());
    for (row, (fittest, mean, median)) in rows.iter().zip(expected) {
        assert!((row.fittest - fittest).abs() <= 0.0005 + 1e-9);
        assert!((row.mean - mean).abs() <= 0.0005 + 1e-9);
        assert!((row.median - median).abs() <= 0.0005 + 1e-9);
    }
}

#[test]
fn test_tsp_history_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tsp.json");

    let mut rng = StdRng::seed_from_u64(21);
    let tsp = Arc::new(Tsp::random(8, 1.0, &mut rng).unwrap());
    let config = TspConfig::new(10).with_mutation(0.5, 1).with_seed(21);

    let mut evolution =
        Tsp::evolution(Arc::clone(&tsp), &config, HistoryWriter::with_path(&path)).unwrap();
    for _ in 0..4 {
        evolution.step().unwrap();
    }
    evolution.finalize().unwrap();

    let history: History<Vec<usize>> = History::read_json(&path).unwrap();
    assert_eq!(history.len(), 5);
    for (generation, record) in history.generations().iter().enumerate() {
        assert_eq!(record.generation, generation);
        assert_eq!(record.population.len(), 10);
        assert!(record.population.iter().all(|tour| tsp.is_valid_tour(tour)));
        let best = record
            .fitness_values
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);
        assert_eq!(record.fittest, best);
    }
}

#[test]
fn test_averaged_runs_to_csv() {
    let dir = tempdir().unwrap();
    let settings_path = dir.path().join("settings.csv");
    fs::write(&settings_path, "normal 0.5,16,1\n").unwrap();
    let setting = settings_from_file(&settings_path).unwrap().remove(0);
    let builder = Evolution2D::new(
        Landscape::Parabola,
        setting,
        ValueRange::new(-3.0, 3.0).unwrap(),
    );

    let evolutions = (0..4)
        .map(|k| builder.clone().with_seed(100 + k).build_with_sink(HistoryWriter::new()))
        .collect::<evocomp::Result<Vec<_>>>()
        .unwrap();
    let mut benchmark = Benchmark::new(evolutions, condition_generation(10));
    let outcomes = benchmark.run().unwrap();

    let histories: Vec<History<Point>> = benchmark
        .into_evolutions()
        .into_iter()
        .map(|evolution| evolution.into_sink().into_history())
        .collect();
    let path = dir.path().join("mean0.csv");
    write_statistics(&path, &average_histories(&histories, 2)).unwrap();

    let rows = read_statistics(&path).unwrap();
    assert_eq!(rows.len(), 11);
    let best = outcomes.iter().map(|o| o.best_fitness).sum::<f64>() / 4.0;
    assert!((rows[10].fittest - round_to(best, 2)).abs() < 1e-9);
    // Points are clamped to the range, where the parabola is at most 18.
    assert!(rows
        .iter()
        .all(|row| row.fittest <= 18.0 && row.fittest >= row.mean - 1e-9));
}
