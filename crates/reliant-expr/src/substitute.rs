//! Token-level rewriting of formula text.
//!
//! Replacement only ever applies to whole identifier tokens: substituting
//! `D` in `D + DD` touches the first token only. Text between tokens is
//! copied verbatim.

use std::collections::HashMap;

use tracing::warn;

use crate::error::Result;
use crate::lexer::tokenize;

/// Distinct identifiers of a formula in order of first occurrence.
pub fn identifiers(formula: &str) -> Result<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    for tok in tokenize(formula)? {
        if let Some(name) = tok.ident() {
            if !out.iter().any(|n| n == name) {
                out.push(name.to_string());
            }
        }
    }
    Ok(out)
}

/// Replace identifier tokens found in `replacements`, keeping all others.
pub fn substitute(formula: &str, replacements: &HashMap<String, String>) -> Result<String> {
    rewrite(formula, replacements, false)
}

/// Like [`substitute`], but logs a warning for every identifier that has no
/// replacement. The unreplaced token is left in place.
pub fn substitute_reporting(
    formula: &str,
    replacements: &HashMap<String, String>,
) -> Result<String> {
    rewrite(formula, replacements, true)
}

fn rewrite(
    formula: &str,
    replacements: &HashMap<String, String>,
    report_missing: bool,
) -> Result<String> {
    let tokens = tokenize(formula)?;
    let mut out = String::with_capacity(formula.len());
    let mut cursor = 0;

    for tok in &tokens {
        out.push_str(&formula[cursor..tok.span.start]);
        match tok.ident() {
            Some(name) => match replacements.get(name) {
                Some(replacement) => out.push_str(replacement),
                None => {
                    if report_missing {
                        warn!(variable = name, "no interpretation for variable <{name}> was provided");
                    }
                    out.push_str(name);
                }
            },
            None => out.push_str(&formula[tok.span.clone()]),
        }
        cursor = tok.span.end;
    }
    out.push_str(&formula[cursor..]);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn replaces_whole_tokens_only() {
        let out = substitute("D + DD * D", &map(&[("D", "(0.9)")])).unwrap();
        assert_eq!(out, "(0.9) + DD * (0.9)");
    }

    #[test]
    fn keeps_whitespace_and_operators() {
        let out = substitute(" 0.5*( A+B ) ", &map(&[("B", "x")])).unwrap();
        assert_eq!(out, " 0.5*( A+x ) ");
    }

    #[test]
    fn unknown_identifiers_stay_in_place() {
        let out = substitute_reporting("p * Q", &map(&[("p", "1.0")])).unwrap();
        assert_eq!(out, "1.0 * Q");
    }

    #[test]
    fn identifiers_are_distinct_and_ordered() {
        let ids = identifiers("B*A + B*C + 0.5").unwrap();
        assert_eq!(ids, vec!["B", "A", "C"]);
    }

    #[test]
    fn propagates_tokenizer_errors() {
        assert!(substitute("A # B", &HashMap::new()).is_err());
    }
}
