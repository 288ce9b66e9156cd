//! Technobabble — procedural security-babble generation.
//!
//! Generates plausible-sounding but semantically meaningless security
//! technobabble by recursively expanding a weighted context-free grammar
//! augmented with a small inline templating DSL, with deterministic
//! seeding for reproducible output.

pub mod core;

pub use crate::core::engine::{EngineError, GenerateRequest, Generator, Mode};
pub use crate::core::rules::{RuleError, RuleTable};
