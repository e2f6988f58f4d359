//! # Fault Injector
//!
//! The single random source behind the simulation's two fault knobs and its
//! mechanical-delay window. Keeping randomness here (and out of
//! cashsim-core) keeps the engine deterministic and the injector seedable:
//! a test that seeds the injector replays the same faults every run.

use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::{DelayConfig, FaultConfig};

/// Seedable random source consulted by both controllers.
#[derive(Debug)]
pub struct FaultInjector {
    rng: Mutex<StdRng>,
}

impl FaultInjector {
    /// Injector seeded from OS entropy (production-like behavior).
    pub fn new() -> Self {
        FaultInjector {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Injector with a fixed seed; identical call sequences roll identical
    /// outcomes. Used by tests and scripted demos.
    pub fn seeded(seed: u64) -> Self {
        FaultInjector {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Rolls one fault decision against `config`.
    ///
    /// A disabled knob never rolls (and never advances the RNG), so enabling
    /// one path does not perturb the other's sequence.
    pub fn should_fail(&self, config: &FaultConfig) -> bool {
        if !config.enabled {
            return false;
        }
        let roll: f64 = self.rng.lock().expect("injector mutex poisoned").gen();
        let fail = roll < config.rate;
        if fail {
            debug!(rate = config.rate, "fault injector fired");
        }
        fail
    }

    /// Picks a delay from the configured window, or `None` when disabled.
    pub fn delay_for(&self, config: &DelayConfig) -> Option<Duration> {
        if !config.enabled {
            return None;
        }
        let ms = if config.min_ms >= config.max_ms {
            config.min_ms
        } else {
            self.rng
                .lock()
                .expect("injector mutex poisoned")
                .gen_range(config.min_ms..=config.max_ms)
        };
        Some(Duration::from_millis(ms))
    }
}

impl Default for FaultInjector {
    fn default() -> Self {
        FaultInjector::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
