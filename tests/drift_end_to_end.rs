use drift_rs::quantiles::DEFAULT_LEVELS;
use drift_rs::{DriftSimulator, FrequencyGrid, GametePoolMode, Parameters};

#[test]
fn half_frequency_batch_is_centered_with_spread() {
    let params = Parameters {
        random_seed: 42,
        total_pop: 10,
        no_males: 5,
        no_females: 5,
        cycles: 1,
        sims: 1000,
        pool_mode: GametePoolMode::Static,
    };
    let mut sim = DriftSimulator::new(params).unwrap();
    let batch = sim.simulate(0.5).unwrap();

    assert_eq!(batch.len(), 1000);
    assert!(batch.iter().all(|&x| (0.0..=1.0).contains(&x)));

    let mean = batch.iter().sum::<f64>() / batch.len() as f64;
    assert!((mean - 0.5).abs() < 0.05, "mean = {mean}");

    let var = batch.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / batch.len() as f64;
    assert!(var > 0.0, "batch should not be degenerate");
}

#[test]
fn full_run_produces_both_tables_with_expected_shapes() {
    let grid = FrequencyGrid::from_step(0.1).unwrap();
    let params = Parameters {
        random_seed: 7,
        total_pop: 20,
        no_males: 10,
        no_females: 10,
        cycles: 2,
        sims: 50,
        pool_mode: GametePoolMode::Static,
    };
    let mut sim = DriftSimulator::new(params).unwrap();
    let run = sim.run(&grid, Some(DEFAULT_LEVELS.as_slice())).unwrap();

    assert_eq!(run.initial_frequencies, grid.frequencies);
    assert_eq!(run.sim_frequencies.len(), 11);
    for (row, &f) in run.sim_frequencies.iter().zip(&grid.frequencies) {
        assert_eq!(row.len(), 1 + 50);
        assert_eq!(row[0], f);
        assert!(row[1..].iter().all(|&x| (0.0..=1.0).contains(&x)));
    }

    let table = run.quantiles.unwrap();
    assert_eq!(table.len(), 1 + 11);
    assert_eq!(table[0], DEFAULT_LEVELS.to_vec());
    for row in &table {
        assert_eq!(row.len(), DEFAULT_LEVELS.len());
    }
    // Fixed boundary frequencies stay fixed at every quantile level.
    assert!(table[1].iter().all(|&q| q == 0.0));
    assert!(table[11].iter().all(|&q| q == 1.0));
}

#[test]
fn missing_grid_input_fails_before_any_sampling() {
    let err = FrequencyGrid::resolve(None, None).unwrap_err();
    assert!(err.to_string().contains("step"));
}
