//! Memoization layer wrapping the pure [`SeqiahrModel::simulate`].
//!
//! Trajectories are deterministic in their inputs, so a cache keyed on the
//! full argument tuple is always sound. The cache lives entirely outside
//! the core: the model never consults it, and callers that want a TTL (the
//! dashboard pattern this replaces) inject an [`ExpiryPolicy`].

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::Hasher;
use std::time::{Duration, Instant};

use crate::error::EpiResult;
use crate::model::{ModelParameters, ModelVariant, SeqiahrModel, SeqiahrState, TimeRange, Trajectory};
use crate::solver::SolverOptions;

/// Decides when a cached trajectory is stale.
pub trait ExpiryPolicy {
    /// Whether an entry of the given age must be recomputed.
    fn is_expired(&self, age: Duration) -> bool;
}

/// Entries never expire.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverExpire;

impl ExpiryPolicy for NeverExpire {
    fn is_expired(&self, _age: Duration) -> bool {
        false
    }
}

/// Entries expire after a fixed time-to-live.
#[derive(Debug, Clone, Copy)]
pub struct Ttl(pub Duration);

impl ExpiryPolicy for Ttl {
    fn is_expired(&self, age: Duration) -> bool {
        age >= self.0
    }
}

#[derive(Debug, Clone)]
struct Entry {
    trajectory: Trajectory,
    inserted_at: Instant,
}

/// Cache of simulated trajectories keyed by a hash of every input.
#[derive(Debug)]
pub struct SimulationCache<P: ExpiryPolicy = NeverExpire> {
    entries: HashMap<u64, Entry>,
    policy: P,
    hits: u64,
    misses: u64,
}

impl SimulationCache<NeverExpire> {
    /// Cache whose entries never expire.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(NeverExpire)
    }
}

impl Default for SimulationCache<NeverExpire> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ExpiryPolicy> SimulationCache<P> {
    /// Cache with an injected expiry policy.
    #[must_use]
    pub fn with_policy(policy: P) -> Self {
        Self {
            entries: HashMap::new(),
            policy,
            hits: 0,
            misses: 0,
        }
    }

    /// Return the cached trajectory for these inputs, simulating on a miss
    /// or expired entry.
    ///
    /// # Errors
    ///
    /// Propagates any [`crate::EpiError`] from the underlying simulation.
    pub fn get_or_simulate(
        &mut self,
        model: &SeqiahrModel,
        initial: &SeqiahrState,
        range: TimeRange,
    ) -> EpiResult<Trajectory> {
        let key = cache_key(
            model.params(),
            model.variant(),
            model.solver_options(),
            initial,
            range,
        );

        let fresh = self.entries.get(&key).and_then(|entry| {
            if self.policy.is_expired(entry.inserted_at.elapsed()) {
                None
            } else {
                Some(entry.trajectory.clone())
            }
        });
        if let Some(trajectory) = fresh {
            self.hits += 1;
            return Ok(trajectory);
        }

        self.misses += 1;
        let trajectory = model.simulate(initial, range)?;
        self.entries.insert(
            key,
            Entry {
                trajectory: trajectory.clone(),
                inserted_at: Instant::now(),
            },
        );
        Ok(trajectory)
    }

    /// Number of cache hits so far.
    #[must_use]
    pub const fn hits(&self) -> u64 {
        self.hits
    }

    /// Number of cache misses so far.
    #[must_use]
    pub const fn misses(&self) -> u64 {
        self.misses
    }

    /// Number of stored trajectories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no trajectories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all stored trajectories; counters keep running.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

fn hash_f64(h: &mut DefaultHasher, v: f64) {
    h.write_u64(v.to_bits());
}

fn cache_key(
    params: &ModelParameters,
    variant: &ModelVariant,
    solver: &SolverOptions,
    initial: &SeqiahrState,
    range: TimeRange,
) -> u64 {
    let mut h = DefaultHasher::new();

    for v in [
        params.chi,
        params.phi,
        params.beta,
        params.rho,
        params.delta,
        params.gamma,
        params.alpha,
        params.mu,
        params.p,
    ] {
        hash_f64(&mut h, v);
    }
    h.write_u32(params.quarantine.start);
    match params.quarantine.duration {
        Some(r) => {
            h.write_u8(1);
            h.write_u32(r);
        }
        None => h.write_u8(0),
    }

    h.write_u8(u8::from(variant.track_deaths));
    h.write_u8(u8::from(variant.distinct_asymptomatic_recovery));
    h.write_u8(u8::from(variant.hospitalized_transmission));

    h.write_u32(solver.steps_per_day);
    hash_f64(&mut h, solver.conservation_tolerance);

    hash_f64(&mut h, initial.time);
    for v in initial.to_array() {
        hash_f64(&mut h, v);
    }

    h.write_u32(range.start);
    h.write_u32(range.end);

    h.finish()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn model() -> SeqiahrModel {
        SeqiahrModel::new(ModelParameters::default(), ModelVariant::extended()).unwrap()
    }

    #[test]
    fn test_cache_hit_on_identical_inputs() {
        let mut cache = SimulationCache::new();
        let model = model();
        let initial = SeqiahrState::seeded(1e-6);
        let range = TimeRange::new(0, 60);

        let first = cache.get_or_simulate(&model, &initial, range).unwrap();
        let second = cache.get_or_simulate(&model, &initial, range).unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_miss_on_different_inputs() {
        let mut cache = SimulationCache::new();
        let model = model();
        let initial = SeqiahrState::seeded(1e-6);

        cache
            .get_or_simulate(&model, &initial, TimeRange::new(0, 30))
            .unwrap();
        cache
            .get_or_simulate(&model, &initial, TimeRange::new(0, 31))
            .unwrap();

        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_cache_distinguishes_parameters() {
        let initial = SeqiahrState::seeded(1e-6);
        let range = TimeRange::new(0, 30);
        let a = cache_key(
            model().params(),
            model().variant(),
            model().solver_options(),
            &initial,
            range,
        );
        let tweaked = SeqiahrModel::new(
            ModelParameters {
                beta: 0.61,
                ..Default::default()
            },
            ModelVariant::extended(),
        )
        .unwrap();
        let b = cache_key(
            tweaked.params(),
            tweaked.variant(),
            tweaked.solver_options(),
            &initial,
            range,
        );
        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_ttl_always_expires() {
        let mut cache = SimulationCache::with_policy(Ttl(Duration::ZERO));
        let model = model();
        let initial = SeqiahrState::seeded(1e-6);
        let range = TimeRange::new(0, 30);

        cache.get_or_simulate(&model, &initial, range).unwrap();
        cache.get_or_simulate(&model, &initial, range).unwrap();

        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn test_clear_preserves_counters() {
        let mut cache = SimulationCache::new();
        let model = model();
        let initial = SeqiahrState::seeded(1e-6);
        cache
            .get_or_simulate(&model, &initial, TimeRange::new(0, 30))
            .unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.misses(), 1);
    }
}
