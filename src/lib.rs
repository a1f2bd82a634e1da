pub mod quantiles;

use anyhow::{Result, bail};
use indicatif::ProgressBar;
use rand::SeedableRng;
use rand::distr::{Distribution, Uniform};
use rand::prelude::*;
use rand::rngs::SmallRng;

// ── Frequency grid ───────────────────────────────────────────────────────────

/// Ordered initial allele frequencies to simulate, one drift batch per entry.
#[derive(Clone, Debug)]
pub struct FrequencyGrid {
    pub frequencies: Vec<f64>,
}

impl FrequencyGrid {
    /// Use an explicit list as-is. Values are the caller's responsibility
    /// to keep within [0, 1].
    pub fn from_list(frequencies: Vec<f64>) -> Self {
        Self { frequencies }
    }

    /// `floor(1/step) + 1` evenly spaced frequencies from 0 to 1 inclusive.
    /// A step of 0.1 yields 0, 0.1, ..., 1. The step must be positive.
    pub fn from_step(step: f64) -> Result<Self> {
        if step <= 0.0 || step.is_nan() {
            bail!("frequency step must be positive (got {step})");
        }
        let count = (1.0 / step).floor() as usize + 1;
        let frequencies = if count == 1 {
            vec![0.0]
        } else {
            (0..count).map(|i| i as f64 / (count - 1) as f64).collect()
        };
        Ok(Self { frequencies })
    }

    /// Exactly one of `initial`/`step` must be given.
    pub fn resolve(initial: Option<Vec<f64>>, step: Option<f64>) -> Result<Self> {
        match (initial, step) {
            (Some(list), None) => Ok(Self::from_list(list)),
            (None, Some(step)) => Self::from_step(step),
            (Some(_), Some(_)) => {
                bail!("supply either explicit initial frequencies or a step, not both")
            }
            (None, None) => {
                bail!("either initial frequencies or a frequency step must be provided")
            }
        }
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}

// ── Gamete pool mode ─────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GametePoolMode {
    /// Default, reference-compatible behavior. The pool built from the
    /// initial frequency is reused for every generation of every replicate,
    /// so successive generations resample the original pool and do not
    /// compound; only the last generation's draw determines the result.
    Static,
    /// Opt-in corrected behavior. Each generation's pool is rebuilt from the
    /// previous generation's computed frequency, so drift compounds across
    /// generations and frequencies of 0 and 1 become absorbing.
    PerGeneration,
}

// ── Parameters ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Parameters {
    pub random_seed: u64,
    /// Population size in each generation (number of progeny).
    pub total_pop: usize,
    /// Number of males contributing gametes.
    pub no_males: usize,
    /// Number of females contributing gametes.
    pub no_females: usize,
    /// Generations of random mating per replicate. Must be at least 1.
    pub cycles: usize,
    /// Independent replicates per initial frequency.
    pub sims: usize,
    pub pool_mode: GametePoolMode,
}

impl Default for Parameters {
    fn default() -> Self {
        let mut rng = rand::rng();
        let random_seed = rng.random_range(1..u64::MAX);
        Self {
            random_seed,
            total_pop: 96,
            no_males: 48,
            no_females: 48,
            cycles: 1,
            sims: 1,
            pool_mode: GametePoolMode::Static,
        }
    }
}

impl Parameters {
    /// With `cycles = 0` the generation loop never runs and there is no
    /// "last generation" to report, so it is rejected up front. Other
    /// degenerate sizes surface as sampling errors instead.
    pub fn validate(&self) -> Result<()> {
        if self.cycles < 1 {
            bail!("cycles must be at least 1 (got {})", self.cycles);
        }
        Ok(())
    }
}

// ── Gamete pool ───────────────────────────────────────────────────────────────

/// The `2 × total_pop` allele copies gametes are drawn from: `trunc(f × 2N)`
/// copies of the reference allele (1), the remainder alternate (0).
#[derive(Clone, Debug)]
pub struct GametePool {
    pub alleles: Vec<u8>,
}

impl GametePool {
    pub fn new(frequency: f64, total_pop: usize) -> Self {
        let ones = (frequency * 2.0 * total_pop as f64).trunc() as usize;
        let mut alleles = vec![1u8; ones];
        alleles.resize(2 * total_pop, 0);
        Self { alleles }
    }

    pub fn reference_count(&self) -> usize {
        self.alleles.iter().filter(|&&a| a == 1).count()
    }
}

// ── Simulator ─────────────────────────────────────────────────────────────────

pub struct DriftSimulator {
    pub params: Parameters,
    pub rng: SmallRng,
}

impl DriftSimulator {
    pub fn new(params: Parameters) -> Result<Self> {
        params.validate()?;
        let rng = SmallRng::seed_from_u64(params.random_seed);
        Ok(Self { params, rng })
    }

    /// One sex's contribution to a generation: draw `contributors` gametes
    /// uniformly with replacement from the pool, resize the draw to
    /// `total_pop` (truncating when larger, tiling cyclically when smaller),
    /// and return the allele sum of the resized draw.
    fn gamete_contribution(&mut self, pool: &GametePool, contributors: usize) -> Result<u64> {
        let index = Uniform::new(0usize, pool.alleles.len())?;
        let draw: Vec<u8> = (0..contributors)
            .map(|_| pool.alleles[index.sample(&mut self.rng)])
            .collect();
        Ok(draw
            .iter()
            .cycle()
            .take(self.params.total_pop)
            .map(|&a| a as u64)
            .sum())
    }

    /// Run one replicate and return its final-generation frequency.
    /// The trajectory holds `cycles + 1` entries; index 0 is the initial
    /// frequency and the last entry is the reported result.
    fn replicate_final(&mut self, pool: &GametePool, initial: f64) -> Result<f64> {
        let two_n = 2.0 * self.params.total_pop as f64;
        let mut gen_freq = vec![0.0f64; self.params.cycles + 1];
        gen_freq[0] = initial;

        for c in 1..=self.params.cycles {
            let rebuilt;
            let gen_pool = match self.params.pool_mode {
                GametePoolMode::Static => pool,
                GametePoolMode::PerGeneration => {
                    rebuilt = GametePool::new(gen_freq[c - 1], self.params.total_pop);
                    &rebuilt
                }
            };
            let males = self.gamete_contribution(gen_pool, self.params.no_males)?;
            let females = self.gamete_contribution(gen_pool, self.params.no_females)?;
            gen_freq[c] = (males + females) as f64 / two_n;
        }

        Ok(gen_freq[self.params.cycles])
    }

    /// Simulate `sims` independent replicates for one initial frequency and
    /// return their final frequencies. The pool is built once per call and,
    /// in the default mode, shared by every generation of every replicate.
    pub fn simulate(&mut self, initial: f64) -> Result<Vec<f64>> {
        let pool = GametePool::new(initial, self.params.total_pop);
        (0..self.params.sims)
            .map(|_| self.replicate_final(&pool, initial))
            .collect()
    }

    /// Simulate every frequency in the grid, assembling the per-replicate
    /// table and, when `levels` is given, the quantile table.
    pub fn run(&mut self, grid: &FrequencyGrid, levels: Option<&[f64]>) -> Result<DriftRun> {
        let bar = ProgressBar::new(grid.len() as u64);
        let mut sim_frequencies = Vec::with_capacity(grid.len());
        let mut per_frequency = Vec::with_capacity(grid.len());

        for &frequency in &grid.frequencies {
            bar.inc(1);
            let batch = self.simulate(frequency)?;
            if let Some(levels) = levels {
                per_frequency.push(quantiles::compute_quantiles(&batch, levels));
            }
            sim_frequencies.push(sim_frequency_row(frequency, &batch));
        }
        bar.finish();

        let quantile_matrix = levels.map(|levels| quantile_table(levels, per_frequency));
        Ok(DriftRun {
            initial_frequencies: grid.frequencies.clone(),
            sim_frequencies,
            quantiles: quantile_matrix,
        })
    }
}

// ── Output tables ─────────────────────────────────────────────────────────────

/// Assembled result of one run, ready for serialization.
#[derive(Debug, serde::Serialize)]
pub struct DriftRun {
    pub initial_frequencies: Vec<f64>,
    /// One row per initial frequency: `[frequency, final_0, ..., final_sims-1]`.
    pub sim_frequencies: Vec<Vec<f64>>,
    /// Row 0 holds the quantile levels; row `i + 1` the quantile values for
    /// frequency `i`. `None` when quantiles were not requested.
    pub quantiles: Option<Vec<Vec<f64>>>,
}

pub fn sim_frequency_row(frequency: f64, batch: &[f64]) -> Vec<f64> {
    let mut row = Vec::with_capacity(1 + batch.len());
    row.push(frequency);
    row.extend_from_slice(batch);
    row
}

pub fn quantile_table(levels: &[f64], per_frequency: Vec<Vec<f64>>) -> Vec<Vec<f64>> {
    let mut table = Vec::with_capacity(1 + per_frequency.len());
    table.push(levels.to_vec());
    table.extend(per_frequency);
    table
}

// ── Tests ─────────────────────────────────────────────────────────────────────
