//! Rule expander — recursive non-terminal rewriting.
//!
//! Rewrites `<symbol>` markers leftmost-first, weighted-sampling an
//! expansion for each known category and recursing until only terminal
//! text remains or the depth ceiling is hit. Directives are resolved
//! before every scan, so directive output can introduce new non-terminals
//! and expansions can introduce new directives; the two rewriters are
//! mutually re-entrant.

use rand::Rng;

use crate::core::directive::{parse_range, DirectiveResolver};
use crate::core::rules::RuleTable;
use crate::core::session::Session;

/// Maximum substitutions for one template before returning the text as-is,
/// possibly with unresolved markers. This is the only termination guard;
/// left-recursive rules degrade gracefully instead of being rejected.
pub const MAX_EXPANSION_DEPTH: usize = 50;

/// Expands non-terminals against a rule table.
pub struct Expander<'a> {
    rules: &'a RuleTable,
    resolver: DirectiveResolver<'a>,
}

impl<'a> Expander<'a> {
    pub fn new(rules: &'a RuleTable) -> Self {
        Expander {
            rules,
            resolver: DirectiveResolver::new(rules),
        }
    }

    /// Fully expand `template`, best-effort. Never fails: unknown symbols
    /// are elided and hitting the depth ceiling returns the partial text.
    pub fn expand(&self, template: &str, session: &mut Session) -> String {
        let mut text = template.to_string();

        for _ in 0..=MAX_EXPANSION_DEPTH {
            // Directives first; they may generate new `<...>` markers.
            text = self.resolver.resolve(&text, session);

            let (start, end, symbol) = match find_marker(&text) {
                Some((start, end, symbol)) => (start, end, symbol.to_string()),
                None => return text,
            };

            let replacement = self.substitute(&symbol, session);

            let mut next = String::with_capacity(text.len() + replacement.len());
            next.push_str(&text[..start]);
            next.push_str(&replacement);
            next.push_str(&text[end..]);
            text = next;
        }

        text
    }

    fn substitute(&self, symbol: &str, session: &mut Session) -> String {
        // `<random:MIN-MAX>` draws an integer without a rule lookup
        if let Some(range) = symbol.strip_prefix("random:") {
            return match parse_range(range) {
                Some((min, max)) => session.rng.gen_range(min..=max).to_string(),
                None => String::new(),
            };
        }

        match self.rules.sample(symbol, &mut session.rng) {
            Some(expansion) => {
                session.record_context(symbol, &expansion);
                expansion
            }
            // Unknown non-terminals are deleted, not errors
            None => String::new(),
        }
    }
}

/// Locate the leftmost `<symbol>` marker with a non-empty symbol. Returns
/// the marker's byte span and the symbol text.
fn find_marker(text: &str) -> Option<(usize, usize, &str)> {
    let mut search_from = 0;
    while let Some(rel) = text[search_from..].find('<') {
        let start = search_from + rel;
        match text[start + 1..].find('>') {
            // "<>" carries no symbol; keep scanning after it
            Some(0) => search_from = start + 2,
            Some(len) => {
                let symbol = &text[start + 1..start + 1 + len];
                return Some((start, start + 1 + len + 1, symbol));
            }
            None => return None,
        }
    }
    None
}
