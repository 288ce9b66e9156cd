//! Rule Linter — validates rule-table coverage and estimates variety.
//!
//! Usage: rule_linter <rules.ron> [--combinations]

use rustc_hash::FxHashSet;
use std::path::Path;
use std::process;
use technobabble::RuleTable;

/// Depth bound for the combination estimate; recursion past this counts as
/// a single path.
const ESTIMATE_MAX_DEPTH: usize = 5;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: rule_linter <rules.ron> [--combinations]");
        process::exit(0);
    }

    let rules_path = &args[1];
    let show_combinations = args.iter().any(|a| a == "--combinations");

    let rules = match RuleTable::load_from_ron(Path::new(rules_path)) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("ERROR: Failed to load rule table: {}", e);
            process::exit(1);
        }
    };

    let total_options: usize = rules.categories.values().map(Vec::len).sum();
    println!(
        "Loaded {} categories ({} options)",
        rules.categories.len(),
        total_options
    );

    let (errors, warnings) = lint_rules(&rules);

    println!("\n=== Rule Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if show_combinations {
        print_combination_estimate(&rules);
    }

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn lint_rules(rules: &RuleTable) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (name, alternatives) in &rules.categories {
        if alternatives.is_empty() {
            warnings.push(format!("Category '{}' has no alternatives", name));
            continue;
        }
        if alternatives.len() < 3 {
            warnings.push(format!(
                "Category '{}' has only {} alternatives (minimum 3 recommended)",
                name,
                alternatives.len()
            ));
        }

        // Unresolvable non-terminal references
        for alternative in alternatives {
            for symbol in non_terminals(&alternative.text) {
                if symbol.starts_with("random:") {
                    continue;
                }
                if !rules.contains(&symbol) {
                    warnings.push(format!(
                        "Category '{}' references unknown symbol '<{}>' (will be elided)",
                        name, symbol
                    ));
                }
            }

            if alternative.weight <= 0.0 {
                errors.push(format!(
                    "Category '{}' has a non-positive weight {} on '{}'",
                    name, alternative.weight, alternative.text
                ));
            }
        }

        // A category where every alternative re-references itself can only
        // terminate through the depth ceiling
        let all_self_referencing = alternatives
            .iter()
            .all(|a| non_terminals(&a.text).iter().any(|s| s == name));
        if all_self_referencing {
            errors.push(format!(
                "Category '{}' has no non-recursive alternative (bounded only by the depth ceiling)",
                name
            ));
        }
    }

    (errors, warnings)
}

/// Extract `<symbol>` names from a template.
fn non_terminals(text: &str) -> Vec<String> {
    let mut symbols = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('<') {
        match rest[open + 1..].find('>') {
            Some(0) => rest = &rest[open + 2..],
            Some(len) => {
                symbols.push(rest[open + 1..open + 1 + len].to_string());
                rest = &rest[open + 1 + len + 1..];
            }
            None => break,
        }
    }
    symbols
}

fn print_combination_estimate(rules: &RuleTable) {
    println!("\n=== Combination Estimate ===\n");
    println!("Rough estimate of unique expansion paths (recursion truncated");
    println!("at depth {}; directives not counted):\n", ESTIMATE_MAX_DEPTH);

    for root in ["sentence", "format", "POST"] {
        if rules.contains(root) {
            let mut visited = FxHashSet::default();
            let combos = count_combinations(rules, root, 0, &mut visited);
            println!("  <{}>: ~{} combinations", root, combos);
        }
    }
}

/// Count unique paths through the expansion tree rooted at `symbol`.
///
/// Visited symbols and depth overruns count as one path, so recursive
/// grammars yield a finite (under-)estimate.
fn count_combinations(
    rules: &RuleTable,
    symbol: &str,
    depth: usize,
    visited: &mut FxHashSet<String>,
) -> u128 {
    if depth > ESTIMATE_MAX_DEPTH || visited.contains(symbol) {
        return 1;
    }
    let alternatives = match rules.get(symbol) {
        Some(a) => a,
        None => return 1,
    };

    visited.insert(symbol.to_string());

    let mut total: u128 = 0;
    for alternative in alternatives {
        let mut path_combos: u128 = 1;
        for referenced in non_terminals(&alternative.text) {
            path_combos = path_combos
                .saturating_mul(count_combinations(rules, &referenced, depth + 1, visited));
        }
        total = total.saturating_add(path_combos);
    }

    visited.remove(symbol);
    total.max(1)
}
