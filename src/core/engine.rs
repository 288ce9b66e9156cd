//! The generation driver: request → finished text orchestration.
//!
//! Wires together rule expansion, directive resolution, duplicate
//! avoidance, and the cosmetic mutation pass.

use rand::Rng;
use rustc_hash::FxHashMap;
use std::path::Path;
use thiserror::Error;

use crate::core::expand::Expander;
use crate::core::mutate::MutationPass;
use crate::core::rules::{RuleError, RuleTable};
use crate::core::session::Session;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("rule table error: {0}")]
    Rules(#[from] RuleError),
}

/// Attempt budget: flat mode gives up after this many tries per requested
/// sentence and returns whatever it collected.
const MAX_ATTEMPTS_MULTIPLIER: usize = 10;
/// Chance of clearing context memory before each sentence, emulating topic
/// drift while keeping short-range coherence.
const CONTEXT_DRIFT_CHANCE: f64 = 0.3;
/// Sentence count range used when the request leaves it unspecified.
const DEFAULT_SENTENCE_RANGE: (usize, usize) = (4, 10);

/// Entry symbols for the three generation modes.
const SENTENCE_RULE: &str = "<sentence>";
const FORMAT_RULE: &str = "<format>";
const POST_RULE: &str = "<POST>";

/// Lines starting with these prefixes are structural headers/footers, not
/// prose, and skip the mutation pass.
const FORMAT_STRUCTURAL_PREFIXES: &[&str] = &[
    "🧵", "📚", "🚨", "⚠️", "🔴", "Thread", "THREAD", "Story", "Daily", "What I",
    "Today's", "Another day", "Flexing", "POV:", "Friendly",
];
const POST_STRUCTURAL_PREFIXES: &[&str] = &["🚨", "⚠️", "🔴", "```"];

/// Generation mode selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Flat stream of unique sentences, space-joined.
    #[default]
    Sentences,
    /// One `<format>` expansion: threads, tutorials, reports.
    Format,
    /// One `<POST>` expansion: the hierarchical post structure.
    Post,
}

/// Parameters for one generation call.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Sentence count for flat mode; `None` draws uniformly from `[4, 10]`.
    pub num_sentences: Option<usize>,
    /// Whether to run the cosmetic mutation pass.
    pub mutations: bool,
    pub mode: Mode,
}

impl Default for GenerateRequest {
    fn default() -> Self {
        GenerateRequest {
            num_sentences: None,
            mutations: true,
            mode: Mode::Sentences,
        }
    }
}

/// The top-level generator. Built via [`Generator::builder`].
///
/// Owns one [`Session`]; concurrent callers should build one `Generator`
/// each (the [`RuleTable`] clones cheaply and is read-only).
pub struct Generator {
    rules: RuleTable,
    session: Session,
}

/// Builder for constructing a [`Generator`].
pub struct GeneratorBuilder {
    rules: Option<RuleTable>,
    rules_path: Option<String>,
    seed: Option<u64>,
}

impl Generator {
    pub fn builder() -> GeneratorBuilder {
        GeneratorBuilder {
            rules: None,
            rules_path: None,
            seed: None,
        }
    }

    /// Run one generation request.
    ///
    /// Always resets variables, seed multipliers, and the used-sentence set
    /// first, so nothing leaks between calls on a reused generator. Never
    /// fails: malformed grammars degrade to partial or empty output.
    pub fn generate(&mut self, request: &GenerateRequest) -> String {
        self.session.reset_generation();

        match request.mode {
            Mode::Sentences => self.generate_sentences(request.num_sentences, request.mutations),
            Mode::Format => {
                self.generate_structured(FORMAT_RULE, request.mutations, FORMAT_STRUCTURAL_PREFIXES)
            }
            Mode::Post => {
                self.generate_structured(POST_RULE, request.mutations, POST_STRUCTURAL_PREFIXES)
            }
        }
    }

    /// Snapshot of the current context memory (a copy, not a live view).
    pub fn context(&self) -> FxHashMap<String, String> {
        self.session.context.clone()
    }

    /// Reseed mid-lifetime, dropping all session state.
    pub fn set_seed(&mut self, seed: u64) {
        self.session.reseed(seed);
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Flat mode: collect `n` unique sentences within the attempt budget.
    /// Duplicates are silently discarded; exhausting the budget returns the
    /// partial collection.
    fn generate_sentences(&mut self, num_sentences: Option<usize>, mutations: bool) -> String {
        let n = match num_sentences {
            Some(n) => n,
            None => {
                let (min, max) = DEFAULT_SENTENCE_RANGE;
                self.session.rng.gen_range(min..=max)
            }
        };

        let max_attempts = n * MAX_ATTEMPTS_MULTIPLIER;
        let mut sentences: Vec<String> = Vec::with_capacity(n);
        let mut attempts = 0;

        while sentences.len() < n && attempts < max_attempts {
            attempts += 1;

            // Topic drift: sometimes forget what we were talking about
            if self.session.rng.gen::<f64>() < CONTEXT_DRIFT_CHANCE {
                self.session.context.clear();
            }

            let expander = Expander::new(&self.rules);
            let mut sentence = expander
                .expand(SENTENCE_RULE, &mut self.session)
                .trim()
                .to_string();
            if sentence.is_empty() {
                continue;
            }
            if !sentence.ends_with('.') {
                sentence.push('.');
            }

            // Uniqueness is checked on the pre-mutation text
            let normalized = sentence.to_lowercase();
            if !self.session.used_sentences.insert(normalized) {
                continue;
            }

            if mutations {
                sentence = MutationPass::apply(&sentence, &mut self.session.rng);
            }
            sentences.push(sentence);
        }

        sentences.join(" ")
    }

    /// Hierarchical modes: expand the structural symbol once, then mutate
    /// prose lines, leaving structural headers/footers alone.
    fn generate_structured(
        &mut self,
        root: &str,
        mutations: bool,
        structural_prefixes: &[&str],
    ) -> String {
        let expander = Expander::new(&self.rules);
        let text = expander.expand(root, &mut self.session);

        if !mutations {
            return text.trim().to_string();
        }

        let mut mutated_lines = Vec::new();
        for line in text.lines() {
            let trimmed = line.trim();
            let structural =
                trimmed.is_empty() || structural_prefixes.iter().any(|p| trimmed.starts_with(p));
            if structural {
                mutated_lines.push(line.to_string());
            } else {
                mutated_lines.push(MutationPass::apply(line, &mut self.session.rng));
            }
        }

        mutated_lines.join("\n").trim().to_string()
    }
}

impl GeneratorBuilder {
    /// Provide a rule table directly (for testing without files).
    pub fn with_rules(mut self, rules: RuleTable) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Load (and merge over any direct table) a rule table from a RON file.
    pub fn rules_path(mut self, path: &str) -> Self {
        self.rules_path = Some(path.to_string());
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<Generator, EngineError> {
        let mut rules = self.rules.unwrap_or_default();
        if let Some(ref path) = self.rules_path {
            rules.merge(RuleTable::load_from_ron(Path::new(path))?);
        }

        Ok(Generator {
            rules,
            session: Session::new(self.seed),
        })
    }
}
