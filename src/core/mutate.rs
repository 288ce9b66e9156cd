//! Cosmetic mutation pass — term shouting and urgency tags.
//!
//! A non-recursive string pass applied to finished lines. It only annotates
//! and recases; it never removes text.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

/// Terms that may get upper-cased, at most one occurrence each.
const SHOUTED_TERMS: &[&str] = &[
    "critical",
    "vulnerability",
    "exploit",
    "remote",
    "authentication",
];
/// Per-term chance of shouting.
const SHOUT_CHANCE: f64 = 0.3;

/// Urgency tags occasionally prepended to a line.
pub const URGENCY_TAGS: &[&str] = &["[URGENT] ", "[CRITICAL] ", "[ZERO-DAY] "];
/// Chance of prepending an urgency tag.
const URGENCY_CHANCE: f64 = 0.15;

/// The mutation pass applied to generated lines before final output.
pub struct MutationPass;

impl MutationPass {
    /// Mutate one line: upper-case the first word-boundary occurrence of
    /// each known term with independent probability, then maybe prepend an
    /// urgency tag.
    pub fn apply(line: &str, rng: &mut StdRng) -> String {
        let mut line = line.to_string();

        for term in SHOUTED_TERMS {
            if line.to_lowercase().contains(term) && rng.gen::<f64>() < SHOUT_CHANCE {
                line = uppercase_first_occurrence(&line, term);
            }
        }

        if rng.gen::<f64>() < URGENCY_CHANCE {
            if let Some(tag) = URGENCY_TAGS.choose(rng) {
                line = format!("{}{}", tag, line);
            }
        }

        line
    }
}

/// Upper-case the first case-insensitive occurrence of `term` that sits on
/// word boundaries. Occurrences embedded in longer words are left alone.
fn uppercase_first_occurrence(line: &str, term: &str) -> String {
    let bytes = line.as_bytes();
    let needle = term.as_bytes();
    if needle.is_empty() || needle.len() > bytes.len() {
        return line.to_string();
    }

    for i in 0..=bytes.len() - needle.len() {
        if !bytes[i..i + needle.len()].eq_ignore_ascii_case(needle) {
            continue;
        }
        let boundary_before = i == 0 || !bytes[i - 1].is_ascii_alphanumeric();
        let boundary_after = i + needle.len() == bytes.len()
            || !bytes[i + needle.len()].is_ascii_alphanumeric();
        if boundary_before && boundary_after {
            let mut out = String::with_capacity(line.len());
            out.push_str(&line[..i]);
            out.push_str(&line[i..i + needle.len()].to_uppercase());
            out.push_str(&line[i + needle.len()..]);
            return out;
        }
    }

    line.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn uppercase_respects_word_boundaries() {
        assert_eq!(
            uppercase_first_occurrence("a critical flaw", "critical"),
            "a CRITICAL flaw"
        );
        assert_eq!(
            uppercase_first_occurrence("hypercritical review", "critical"),
            "hypercritical review"
        );
    }

    #[test]
    fn uppercase_only_first_occurrence() {
        assert_eq!(
            uppercase_first_occurrence("remote to remote", "remote"),
            "REMOTE to remote"
        );
    }

    #[test]
    fn uppercase_case_insensitive_match() {
        assert_eq!(
            uppercase_first_occurrence("Critical failure", "critical"),
            "CRITICAL failure"
        );
    }

    #[test]
    fn apply_never_removes_text() {
        let mut rng = StdRng::seed_from_u64(9);
        let line = "a critical remote exploit in the vulnerability handler.";
        for _ in 0..100 {
            let mutated = MutationPass::apply(line, &mut rng);
            assert!(mutated.len() >= line.len());
            assert!(mutated.to_lowercase().contains("critical"));
        }
    }

    #[test]
    fn apply_eventually_shouts_and_tags() {
        let mut rng = StdRng::seed_from_u64(1);
        let line = "critical exploit found.";
        let mut saw_shout = false;
        let mut saw_tag = false;
        for _ in 0..200 {
            let mutated = MutationPass::apply(line, &mut rng);
            if mutated.contains("CRITICAL") || mutated.contains("EXPLOIT") {
                saw_shout = true;
            }
            if URGENCY_TAGS.iter().any(|t| mutated.starts_with(t)) {
                saw_tag = true;
            }
        }
        assert!(saw_shout, "expected at least one shouted term in 200 runs");
        assert!(saw_tag, "expected at least one urgency tag in 200 runs");
    }

    #[test]
    fn apply_leaves_unrelated_text_alone_except_tags() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..50 {
            let mutated = MutationPass::apply("nothing to see here.", &mut rng);
            assert!(mutated.ends_with("nothing to see here."));
        }
    }
}
