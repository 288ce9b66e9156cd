//! Directive resolver — the inline brace-DSL rewriter.
//!
//! Scans a template for `{...}` directives and rewrites each to a concrete
//! value. Brace matching counts depth explicitly so a directive's argument
//! may contain another complete directive. Malformed directives are left
//! verbatim rather than raised as errors, so a later stage can show the
//! broken directive instead of crashing.

use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::rules::RuleTable;
use crate::core::session::Session;

/// Maximum resolution passes over one string. Self-regenerating or runaway
/// nesting gives up and returns the partially resolved text.
pub const MAX_DIRECTIVE_PASSES: usize = 50;

/// Resolves brace directives against a rule table and session state.
///
/// Supported forms (first token selects the form):
/// - `{R min-max}` — uniform random integer in `[min, max]`
/// - `{R min-max SEED:key}` — same range, deterministic per `key` within a
///   seeded session
/// - `{O a|b|c}` — uniform choice among alternatives
/// - `{M2 a|b|c}` — two distinct alternatives, space-joined
/// - `{W a:3|b:1}` — weighted choice among `literal:weight` pairs
/// - `{C CATEGORY}` — one weighted sample from a rule category
/// - `{C2 CATEGORY}` — two distinct category templates, space-joined
/// - `{VAR:name value}` — resolve and store `value` on first use, then
///   always emit the stored result
/// - `{VAR:name}` — emit the stored value, or the directive itself if unset
pub struct DirectiveResolver<'a> {
    rules: &'a RuleTable,
}

impl<'a> DirectiveResolver<'a> {
    pub fn new(rules: &'a RuleTable) -> Self {
        DirectiveResolver { rules }
    }

    /// Resolve all directives in `text`, iterating while resolution keeps
    /// introducing new directives (a category sample may contain `{...}`).
    pub fn resolve(&self, text: &str, session: &mut Session) -> String {
        let mut current = text.to_string();
        for _ in 0..MAX_DIRECTIVE_PASSES {
            if !current.contains('{') {
                break;
            }
            let next = self.resolve_pass(&current, session);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// One left-to-right pass. Resolved output is not rescanned within the
    /// same pass; the outer loop picks up anything new.
    fn resolve_pass(&self, text: &str, session: &mut Session) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let from_open = &rest[open..];
            match find_matching_brace(from_open) {
                Some(close) => {
                    let expr = &from_open[1..close];
                    out.push_str(&self.resolve_expr(expr, session));
                    rest = &from_open[close + 1..];
                }
                None => {
                    // No matching brace; treat as literal
                    out.push('{');
                    rest = &from_open[1..];
                }
            }
        }

        out.push_str(rest);
        out
    }

    fn resolve_expr(&self, expr: &str, session: &mut Session) -> String {
        let expr = expr.trim();

        if let Some(rest) = expr.strip_prefix("VAR:") {
            return self.resolve_var(expr, rest, session);
        }
        if let Some(rest) = expr.strip_prefix("R ") {
            return resolve_range(expr, rest, session);
        }
        if let Some(rest) = expr.strip_prefix("O ") {
            return resolve_choice(rest, session);
        }
        if expr.starts_with('M') && expr.contains(' ') {
            return resolve_multi_pick(expr, session);
        }
        if let Some(rest) = expr.strip_prefix("W ") {
            return resolve_weighted(expr, rest, session);
        }
        if expr.starts_with('C') {
            return self.resolve_category(expr, session);
        }

        literal(expr)
    }

    /// `VAR:name value` stores on first use; `VAR:name` retrieves. Only the
    /// first write wins, so repeated resolutions are idempotent within one
    /// generation.
    fn resolve_var(&self, expr: &str, rest: &str, session: &mut Session) -> String {
        let rest = rest.trim();
        let (name, value) = match rest.split_once(char::is_whitespace) {
            Some((name, value)) => (name, Some(value.trim())),
            None => (rest, None),
        };
        if name.is_empty() {
            return literal(expr);
        }

        if let Some(stored) = session.variables.get(name) {
            return stored.clone();
        }

        match value {
            Some(value) => {
                // Resolve nested expressions in the value before storing
                let resolved = self.resolve(value, session);
                session
                    .variables
                    .insert(name.to_string(), resolved.clone());
                resolved
            }
            None => literal(expr),
        }
    }

    /// `C CATEGORY` is a weighted category sample; `Ck CATEGORY` picks `k`
    /// distinct templates uniformly. Unknown categories are left verbatim.
    fn resolve_category(&self, expr: &str, session: &mut Session) -> String {
        let after_c = &expr[1..];

        if let Some(first) = after_c.chars().next() {
            if let Some(count) = first.to_digit(10) {
                let category = after_c[first.len_utf8()..].trim();
                if let Some(picked) =
                    self.rules
                        .sample_distinct(category, count as usize, &mut session.rng)
                {
                    return picked.join(" ");
                }
                return literal(expr);
            }
        }

        let category = after_c.trim();
        match self.rules.sample(category, &mut session.rng) {
            Some(text) => text,
            None => literal(expr),
        }
    }
}

/// `R min-max` with an optional `SEED:key` suffix.
fn resolve_range(expr: &str, rest: &str, session: &mut Session) -> String {
    let rest = rest.trim();
    let (range_part, seed_key) = match rest.split_once("SEED:") {
        Some((range, key)) => (range.trim(), Some(key.trim())),
        None => (rest, None),
    };

    let (min, max) = match parse_range(range_part) {
        Some(bounds) => bounds,
        None => return literal(expr),
    };

    if let Some(key) = seed_key {
        // Unseeded sessions have no base to derive from; fall through to
        // the main stream like any other range draw.
        if let Some(cached) = session.seeded_range(key, min, max) {
            return cached;
        }
    }

    session.rng.gen_range(min..=max).to_string()
}

/// `O a|b|c` — uniform choice among pipe-separated literals.
fn resolve_choice(rest: &str, session: &mut Session) -> String {
    let options: Vec<&str> = rest.trim().split('|').map(str::trim).collect();
    options
        .choose(&mut session.rng)
        .map(|s| s.to_string())
        .unwrap_or_default()
}

/// `Mk a|b|c` — `k` distinct alternatives, space-joined in draw order.
fn resolve_multi_pick(expr: &str, session: &mut Session) -> String {
    let (head, items_part) = match expr.split_once(' ') {
        Some(parts) => parts,
        None => return literal(expr),
    };
    let count: usize = match head[1..].parse() {
        Ok(n) => n,
        Err(_) => return literal(expr),
    };

    let items: Vec<&str> = items_part.trim().split('|').map(str::trim).collect();
    let count = count.min(items.len());
    items
        .choose_multiple(&mut session.rng, count)
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `W a:3|b:1` — weighted choice; weights are real numbers.
fn resolve_weighted(expr: &str, rest: &str, session: &mut Session) -> String {
    let mut items = Vec::new();
    let mut weights = Vec::new();

    for option in rest.trim().split('|') {
        let (item, weight) = match option.trim().rsplit_once(':') {
            Some(parts) => parts,
            None => return literal(expr),
        };
        let weight: f32 = match weight.trim().parse() {
            Ok(w) => w,
            Err(_) => return literal(expr),
        };
        items.push(item.trim());
        weights.push(weight);
    }

    let dist = match WeightedIndex::new(&weights) {
        Ok(d) => d,
        Err(_) => return literal(expr),
    };
    items[dist.sample(&mut session.rng)].to_string()
}

/// Parse `min-max` into inclusive integer bounds. Inverted or non-numeric
/// ranges are malformed.
pub(crate) fn parse_range(text: &str) -> Option<(i64, i64)> {
    let (min, max) = text.split_once('-')?;
    let min: i64 = min.trim().parse().ok()?;
    let max: i64 = max.trim().parse().ok()?;
    if min > max {
        return None;
    }
    Some((min, max))
}

/// Reconstitute a directive verbatim for the malformed path.
fn literal(expr: &str) -> String {
    format!("{{{}}}", expr)
}

/// Index of the `}` matching the `{` at the start of `text`, counting depth
/// so nested directives stay intact.
fn find_matching_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, byte) in text.bytes().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rules::RuleTable;

    fn table() -> RuleTable {
        RuleTable::parse_ron(
            r#"{
            "vendor": [
                (weight: 1.0, text: "Cisco"),
                (weight: 1.0, text: "Oracle"),
            ],
            "port": [
                (weight: 1.0, text: "port {R 1-65535}"),
            ],
        }"#,
        )
        .unwrap()
    }

    fn resolve(text: &str, session: &mut Session) -> String {
        let table = table();
        let resolver = DirectiveResolver::new(&table);
        resolver.resolve(text, session)
    }

    #[test]
    fn range_within_bounds() {
        let mut session = Session::new(Some(1));
        for _ in 0..50 {
            let out = resolve("{R 10-20}", &mut session);
            let n: i64 = out.parse().unwrap();
            assert!((10..=20).contains(&n), "out of range: {}", n);
        }
    }

    #[test]
    fn range_single_value() {
        let mut session = Session::new(Some(1));
        assert_eq!(resolve("{R 7-7}", &mut session), "7");
    }

    #[test]
    fn range_malformed_left_verbatim() {
        let mut session = Session::new(Some(1));
        assert_eq!(resolve("{R abc}", &mut session), "{R abc}");
        assert_eq!(resolve("{R 5}", &mut session), "{R 5}");
        assert_eq!(resolve("{R 9-1}", &mut session), "{R 9-1}");
    }

    #[test]
    fn range_seeded_stable() {
        let mut session = Session::new(Some(42));
        let first = resolve("{R 100-200 SEED:k}", &mut session);
        // Interleave unrelated draws
        let _ = resolve("{R 1-1000}", &mut session);
        let _ = resolve("{O a|b|c}", &mut session);
        let second = resolve("{R 100-200 SEED:k}", &mut session);
        assert_eq!(first, second);
    }

    #[test]
    fn range_seeded_unseeded_session_still_resolves() {
        let mut session = Session::new(None);
        let out = resolve("{R 100-200 SEED:k}", &mut session);
        let n: i64 = out.parse().unwrap();
        assert!((100..=200).contains(&n));
    }

    #[test]
    fn choice_picks_an_alternative() {
        let mut session = Session::new(Some(5));
        for _ in 0..20 {
            let out = resolve("{O alpha|beta|gamma}", &mut session);
            assert!(["alpha", "beta", "gamma"].contains(&out.as_str()));
        }
    }

    #[test]
    fn multi_pick_distinct_items() {
        let mut session = Session::new(Some(5));
        for _ in 0..20 {
            let out = resolve("{M2 a|b|c|d}", &mut session);
            let parts: Vec<&str> = out.split(' ').collect();
            assert_eq!(parts.len(), 2);
            assert_ne!(parts[0], parts[1]);
        }
    }

    #[test]
    fn multi_pick_clamps_to_item_count() {
        let mut session = Session::new(Some(5));
        let out = resolve("{M9 a|b}", &mut session);
        let mut parts: Vec<&str> = out.split(' ').collect();
        parts.sort_unstable();
        assert_eq!(parts, vec!["a", "b"]);
    }

    #[test]
    fn multi_pick_malformed_count() {
        let mut session = Session::new(Some(5));
        assert_eq!(resolve("{Mx a|b}", &mut session), "{Mx a|b}");
    }

    #[test]
    fn weighted_bias() {
        let mut session = Session::new(Some(11));
        let mut common = 0;
        for _ in 0..100 {
            if resolve("{W common:10|rare:1}", &mut session) == "common" {
                common += 1;
            }
        }
        assert!(common > 50, "expected weight-10 option to dominate, got {}", common);
    }

    #[test]
    fn weighted_malformed_left_verbatim() {
        let mut session = Session::new(Some(1));
        assert_eq!(resolve("{W a|b:2}", &mut session), "{W a|b:2}");
        assert_eq!(resolve("{W a:x|b:2}", &mut session), "{W a:x|b:2}");
    }

    #[test]
    fn category_sample() {
        let mut session = Session::new(Some(3));
        let out = resolve("{C vendor}", &mut session);
        assert!(["Cisco", "Oracle"].contains(&out.as_str()));
    }

    #[test]
    fn category_multi_pick() {
        let mut session = Session::new(Some(3));
        let out = resolve("{C2 vendor}", &mut session);
        let mut parts: Vec<&str> = out.split(' ').collect();
        parts.sort_unstable();
        assert_eq!(parts, vec!["Cisco", "Oracle"]);
    }

    #[test]
    fn category_unknown_left_verbatim() {
        let mut session = Session::new(Some(3));
        assert_eq!(resolve("{C nonexistent}", &mut session), "{C nonexistent}");
        assert_eq!(resolve("{C2 nonexistent}", &mut session), "{C2 nonexistent}");
    }

    #[test]
    fn category_sample_resolves_nested_directive() {
        // The sampled template itself contains {R ...}; a later pass
        // resolves it.
        let mut session = Session::new(Some(3));
        let out = resolve("{C port}", &mut session);
        assert!(out.starts_with("port "));
        let n: i64 = out["port ".len()..].parse().unwrap();
        assert!((1..=65535).contains(&n));
    }

    #[test]
    fn var_memoization() {
        let mut session = Session::new(Some(1));
        let out = resolve("ID: {VAR:id 12345}. Same ID: {VAR:id}", &mut session);
        assert_eq!(out, "ID: 12345. Same ID: 12345");
    }

    #[test]
    fn var_first_write_wins() {
        let mut session = Session::new(Some(1));
        let out = resolve("{VAR:x one} {VAR:x two}", &mut session);
        assert_eq!(out, "one one");
    }

    #[test]
    fn var_value_resolved_recursively() {
        let mut session = Session::new(Some(1));
        let out = resolve("{VAR:cve CVE-2021-{R 1000-9999}}", &mut session);
        assert!(out.starts_with("CVE-2021-"));
        let n: i64 = out["CVE-2021-".len()..].parse().unwrap();
        assert!((1000..=9999).contains(&n));
        // Stored value is the fully resolved text
        assert_eq!(session.variables.get("cve").unwrap(), &out);
    }

    #[test]
    fn var_unset_left_verbatim() {
        let mut session = Session::new(Some(1));
        assert_eq!(resolve("{VAR:missing}", &mut session), "{VAR:missing}");
    }

    #[test]
    fn unmatched_open_brace_left_alone() {
        let mut session = Session::new(Some(1));
        assert_eq!(resolve("broken {R 1-5", &mut session), "broken {R 1-5");
    }

    #[test]
    fn unknown_directive_left_verbatim() {
        let mut session = Session::new(Some(1));
        assert_eq!(resolve("{X whatever}", &mut session), "{X whatever}");
    }

    #[test]
    fn plain_text_untouched() {
        let mut session = Session::new(Some(1));
        assert_eq!(
            resolve("no directives here.", &mut session),
            "no directives here."
        );
    }

    #[test]
    fn directive_can_emit_non_terminal() {
        let mut session = Session::new(Some(1));
        let out = resolve("{O <vendor>|<vendor>}", &mut session);
        assert_eq!(out, "<vendor>");
    }
}
