//! Sequential and chunked-parallel scenario sampling.

use rayon::prelude::*;
use rayon::ThreadPool;
use sim_core::rng::SimRng;
use sim_core::SampleMatrix;
use sim_models::correlation::generate_correlated_samples;
use sim_models::distributions::sample_variables;
use sim_models::ScenarioConfig;
use tracing::debug;

use crate::error::SimulationError;

/// Draws `iterations` rows for `config` from one RNG stream.
///
/// An identity correlation matrix samples each marginal independently;
/// anything else goes through the scenario's copula.
pub fn sample_scenario(
    config: &ScenarioConfig,
    iterations: usize,
    rng: &mut SimRng,
) -> Result<SampleMatrix, SimulationError> {
    if config.correlation_matrix.is_identity() {
        Ok(sample_variables(&config.variables, iterations, rng)?)
    } else {
        Ok(generate_correlated_samples(
            &config.variables,
            &config.correlation_matrix,
            iterations,
            &config.copula,
            rng,
        )?)
    }
}

/// Contiguous chunk lengths splitting `iterations` into `chunks` parts.
///
/// The first `iterations % chunks` chunks are one longer; empty chunks are
/// dropped.
///
/// ```
/// use sim_engine::sampling::chunk_sizes;
///
/// assert_eq!(chunk_sizes(10, 4), vec![3, 3, 2, 2]);
/// assert_eq!(chunk_sizes(2, 4), vec![1, 1]);
/// ```
pub fn chunk_sizes(iterations: usize, chunks: usize) -> Vec<usize> {
    let chunks = chunks.max(1);
    let base = iterations / chunks;
    let extra = iterations % chunks;
    (0..chunks)
        .map(|i| base + usize::from(i < extra))
        .filter(|&n| n > 0)
        .collect()
}

/// Single-stream sampling seeded from stream 0 of `base_seed`.
///
/// Identical to a one-chunk parallel run.
pub fn sample_sequential(
    config: &ScenarioConfig,
    iterations: usize,
    base_seed: u64,
) -> Result<SampleMatrix, SimulationError> {
    let mut rng = SimRng::for_stream(base_seed, 0);
    sample_scenario(config, iterations, &mut rng)
}

/// Splits the run into `workers` chunks sampled on `pool`.
///
/// Chunk `i` draws from `SimRng::for_stream(base_seed, i)`, and
/// chunks are concatenated row-wise in index order, so the result does not
/// depend on scheduling. The first failing chunk aborts the run.
pub fn sample_parallel(
    pool: &ThreadPool,
    config: &ScenarioConfig,
    iterations: usize,
    workers: usize,
    base_seed: u64,
) -> Result<SampleMatrix, SimulationError> {
    let sizes = chunk_sizes(iterations, workers);
    debug!(chunks = sizes.len(), iterations, "sampling in parallel");

    let chunks: Vec<SampleMatrix> = pool.install(|| {
        sizes
            .par_iter()
            .enumerate()
            .map(|(chunk, &n)| {
                let mut rng = SimRng::for_stream(base_seed, chunk as u64);
                sample_scenario(config, n, &mut rng).map_err(|e| SimulationError::WorkerPool {
                    chunk,
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
    })?;

    Ok(SampleMatrix::vstack(&chunks)?)
}
