//! Session state — call-scoped mutable state shared by both rewriters.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Categories whose last-chosen expansion is recorded into context memory.
pub const CONTEXT_CATEGORIES: &[&str] = &["vendor", "os", "product", "version_number"];

/// Mutable state for one generator, threaded through expansion.
///
/// `variables`, `seed_multipliers`, and `used_sentences` are scoped to a
/// single generation call and cleared by [`Session::reset_generation`].
/// `context` persists across calls (it is only cleared by topic drift or
/// reseeding) so callers can inspect what the last generation talked about.
pub struct Session {
    /// Base seed, if the session was seeded. Drives `SEED:` multipliers.
    pub seed: Option<u64>,
    /// The one RNG behind all "global" draws. Never process-wide state.
    pub rng: StdRng,
    /// Variable bindings with write-once-per-generation semantics.
    pub variables: FxHashMap<String, String>,
    /// Cached per-key draws, isolated from the main RNG stream.
    pub seed_multipliers: FxHashMap<String, String>,
    /// Last-chosen values for the designated context categories.
    pub context: FxHashMap<String, String>,
    /// Normalized sentences already emitted in the current call.
    pub used_sentences: FxHashSet<String>,
}

impl Session {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Session {
            seed,
            rng,
            variables: FxHashMap::default(),
            seed_multipliers: FxHashMap::default(),
            context: FxHashMap::default(),
            used_sentences: FxHashSet::default(),
        }
    }

    /// Reseed the RNG and drop all state, context included.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = Some(seed);
        self.rng = StdRng::seed_from_u64(seed);
        self.reset_generation();
        self.context.clear();
    }

    /// Clear call-scoped state at the start of a generation call.
    ///
    /// Context memory intentionally survives; it fades through the per-
    /// sentence drift clear instead.
    pub fn reset_generation(&mut self) {
        self.variables.clear();
        self.seed_multipliers.clear();
        self.used_sentences.clear();
    }

    /// Record a chosen expansion into context memory if the category is
    /// context-tracked. Overwrites any previous value.
    pub fn record_context(&mut self, category: &str, value: &str) {
        if CONTEXT_CATEGORIES.contains(&category) {
            self.context.insert(category.to_string(), value.to_string());
        }
    }

    /// Deterministic per-key draw in `[min, max]` for `SEED:key` directives.
    ///
    /// The value is derived by hashing `(base seed, key)` into a throwaway
    /// sub-RNG rather than advancing `self.rng`, so interleaving other draws
    /// cannot perturb it. The first request caches; later requests return
    /// the cached string regardless of the range given.
    ///
    /// Returns `None` when the session is unseeded — the caller falls back
    /// to the main stream.
    pub fn seeded_range(&mut self, key: &str, min: i64, max: i64) -> Option<String> {
        let base = self.seed?;
        if let Some(cached) = self.seed_multipliers.get(key) {
            return Some(cached.clone());
        }

        let mut hasher = DefaultHasher::new();
        base.hash(&mut hasher);
        key.hash(&mut hasher);
        let mut sub_rng = StdRng::seed_from_u64(hasher.finish());

        let value = sub_rng.gen_range(min..=max).to_string();
        self.seed_multipliers.insert(key.to_string(), value.clone());
        Some(value)
    }
}
