//! Latency measurement and baseline comparison.
//!
//! # Implementation
//! Calls run strictly one after another: running them concurrently would
//! fold queueing delay into per-call latency. Each iteration is timed with
//! a monotonic clock and the samples are reduced to min/avg/max.
//!
//! Iterations answering `Unimplemented` are counted but not timed. A run
//! where every iteration was unimplemented passes, since an absent optional
//! capability cannot be late. Any other error stops the run and fails it
//! regardless of latency.

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use serde::Serialize;

use costplug_core::{ContractError, Method};

use crate::baseline::BaselineTable;
use crate::error::TestFailure;
use crate::registry::CaseResult;
use crate::tier::CertificationTier;

/// Default repetitions per measurement.
pub const DEFAULT_ITERATIONS: u32 = 10;

/// Min/avg/max over the timed iterations of one run.
///
/// `min <= avg <= max` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LatencyMeasurement {
    /// Fastest iteration.
    pub min: Duration,
    /// Arithmetic mean, truncated to whole nanoseconds.
    pub avg: Duration,
    /// Slowest iteration.
    pub max: Duration,
    /// Number of timed iterations.
    pub iterations: u32,
}

impl LatencyMeasurement {
    /// Reduces samples to a measurement. Returns `None` for no samples.
    #[must_use]
    pub fn from_samples(samples: &[Duration]) -> Option<Self> {
        let min = samples.iter().min().copied()?;
        let max = samples.iter().max().copied()?;
        let iterations = u32::try_from(samples.len()).unwrap_or(u32::MAX);
        let total: Duration = samples.iter().sum();
        let avg = total / iterations;

        Some(Self {
            min,
            avg,
            max,
            iterations,
        })
    }
}

impl fmt::Display for LatencyMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "min={:?} avg={:?} max={:?} over {} iterations",
            self.min, self.avg, self.max, self.iterations
        )
    }
}

/// Raw result of running a call repeatedly.
#[derive(Debug, Clone)]
pub struct LatencyRun {
    method: Method,
    samples: Vec<Duration>,
    unimplemented: u32,
    error: Option<ContractError>,
}

impl LatencyRun {
    /// Returns the method measured.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Returns the per-iteration timings of successful calls.
    #[must_use]
    pub fn samples(&self) -> &[Duration] {
        &self.samples
    }

    /// Returns how many iterations answered `Unimplemented`.
    #[must_use]
    pub const fn unimplemented(&self) -> u32 {
        self.unimplemented
    }

    /// Returns the hard error that stopped the run, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&ContractError> {
        self.error.as_ref()
    }

    /// Returns true if every iteration answered `Unimplemented`.
    #[must_use]
    pub fn all_unimplemented(&self) -> bool {
        self.error.is_none() && self.samples.is_empty() && self.unimplemented > 0
    }

    /// Reduces the successful iterations to a measurement.
    #[must_use]
    pub fn measurement(&self) -> Option<LatencyMeasurement> {
        LatencyMeasurement::from_samples(&self.samples)
    }

    /// Compares this run against `baselines` at `tier`.
    ///
    /// # Errors
    /// Returns [`TestFailure::Call`] for a hard error and
    /// [`TestFailure::Latency`] when the average exceeds the threshold.
    pub fn evaluate(&self, baselines: &BaselineTable, tier: CertificationTier) -> CaseResult {
        if let Some(error) = &self.error {
            return Err(TestFailure::call(self.method, error.clone()));
        }

        let Some(measurement) = self.measurement() else {
            return Ok(format!(
                "{} not implemented; latency check skipped",
                self.method
            ));
        };

        let skipped = if self.unimplemented > 0 {
            format!(" ({} unimplemented iterations ignored)", self.unimplemented)
        } else {
            String::new()
        };

        let Some(baseline) = baselines.get(self.method) else {
            return Ok(format!(
                "{}: {measurement}{skipped}; no baseline",
                self.method
            ));
        };
        match baseline.threshold(tier) {
            None => Ok(format!(
                "{}: {measurement}{skipped}; no {tier} latency gate",
                self.method
            )),
            Some(threshold) if measurement.avg <= threshold => Ok(format!(
                "{}: {measurement}{skipped}; within {tier} threshold {threshold:?}",
                self.method
            )),
            Some(threshold) => Err(TestFailure::Latency {
                method: self.method,
                observed: measurement.avg,
                threshold,
                tier,
            }),
        }
    }
}

/// Times repeated calls.
#[derive(Debug, Clone, Copy)]
pub struct LatencyMeasurer {
    iterations: u32,
}

impl LatencyMeasurer {
    /// Creates a measurer. Zero iterations is raised to one.
    #[must_use]
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    /// Returns the iteration count.
    #[must_use]
    pub const fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Calls `call` sequentially `iterations` times, timing each call.
    pub async fn measure<F, Fut, T>(&self, method: Method, mut call: F) -> LatencyRun
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ContractError>>,
    {
        let mut run = LatencyRun {
            method,
            samples: Vec::with_capacity(self.iterations as usize),
            unimplemented: 0,
            error: None,
        };

        for iteration in 0..self.iterations {
            let start = Instant::now();
            let result = call().await;
            let elapsed = start.elapsed();

            match result {
                Ok(_) => run.samples.push(elapsed),
                Err(e) if e.is_unimplemented() => run.unimplemented += 1,
                Err(e) => {
                    tracing::debug!(%method, iteration, error = %e, "latency run aborted");
                    run.error = Some(e);
                    break;
                }
            }
        }

        if let Some(m) = run.measurement() {
            tracing::debug!(
                %method,
                min = ?m.min,
                avg = ?m.avg,
                max = ?m.max,
                iterations = m.iterations,
                "latency measured"
            );
        }

        run
    }
}

impl Default for LatencyMeasurer {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}
