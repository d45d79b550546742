//! Expression evaluation over an active effect set
//!
//! Literals are membership tests against the active effect names. Literals
//! containing `*` or `{a,b,c}` compile to anchored regexes and match by
//! scanning the set. Literal matches against the added/removed delta sets
//! are reported so callers can classify a firing mapping as newly
//! triggered vs already active.

use std::collections::HashSet;

use regex::Regex;

use super::lexer::{Token, tokenize};
use super::parser::{Expr, parse};

/// Outcome of evaluating one expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Evaluation {
    pub result: bool,

    /// Some literal of the expression matched the added-effects delta
    pub touched_added: bool,

    /// Some literal of the expression matched the removed-effects delta
    pub touched_removed: bool,
}

/// Evaluate `expression` against the active effect set.
///
/// Fewer than two tokens means the expression is a single bare effect name
/// and is treated as a direct membership test, never run through the
/// boolean parser. Malformed expressions evaluate to `false`.
pub fn evaluate(
    expression: &str,
    active: &[String],
    added: &HashSet<String>,
    removed: &HashSet<String>,
) -> Evaluation {
    let tokens = tokenize(expression);

    let mut out = Evaluation::default();
    for token in &tokens {
        if let Token::Name(name) = token {
            if matches_any(name, added.iter()) {
                out.touched_added = true;
            }
            if matches_any(name, removed.iter()) {
                out.touched_removed = true;
            }
        }
    }

    out.result = match tokens.len() {
        0 => false,
        1 => match &tokens[0] {
            Token::Name(name) => matches_any(name, active.iter()),
            _ => false,
        },
        _ => match parse(&tokens) {
            Ok(expr) => eval_expr(&expr, active),
            Err(error) => {
                tracing::debug!(expression, %error, "malformed expression treated as false");
                false
            }
        },
    };

    out
}

fn eval_expr(expr: &Expr, active: &[String]) -> bool {
    match expr {
        Expr::Literal(name) => matches_any(name, active.iter()),
        Expr::Not(inner) => !eval_expr(inner, active),
        Expr::And(lhs, rhs) => eval_expr(lhs, active) && eval_expr(rhs, active),
        Expr::Or(lhs, rhs) => eval_expr(lhs, active) || eval_expr(rhs, active),
    }
}

fn matches_any<'a>(pattern: &str, mut candidates: impl Iterator<Item = &'a String>) -> bool {
    if !is_wildcard(pattern) {
        return candidates.any(|c| c == pattern);
    }
    match pattern_regex(pattern) {
        Some(re) => candidates.any(|c| re.is_match(c)),
        None => false,
    }
}

fn is_wildcard(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('{')
}

/// Compile a wildcard literal: `*` becomes `.*`, `{a,b,c}` becomes an
/// alternation group, everything else matches literally. Anchored on both
/// ends.
fn pattern_regex(pattern: &str) -> Option<Regex> {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push('^');
    let mut brace_depth = 0u32;
    for c in pattern.chars() {
        match c {
            '*' => source.push_str(".*"),
            '{' => {
                brace_depth += 1;
                source.push_str("(?:");
            }
            '}' if brace_depth > 0 => {
                brace_depth -= 1;
                source.push(')');
            }
            ',' if brace_depth > 0 => source.push('|'),
            other => source.push_str(&regex::escape(&other.to_string())),
        }
    }
    source.push('$');

    match Regex::new(&source) {
        Ok(re) => Some(re),
        Err(error) => {
            tracing::debug!(pattern, %error, "invalid wildcard pattern");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn eval(expression: &str, active: &[&str]) -> bool {
        evaluate(expression, &names(active), &HashSet::new(), &HashSet::new()).result
    }

    #[test]
    fn test_and_not() {
        assert!(eval("A && \\!B", &["A"]));
        assert!(!eval("A && \\!B", &["A", "B"]));
        assert!(!eval("A && \\!B", &[]));
    }

    #[test]
    fn test_or_with_parens() {
        assert!(eval("\\(A || B\\) && C", &["B", "C"]));
        assert!(!eval("\\(A || B\\) && C", &["B"]));
    }

    #[test]
    fn test_single_name_is_membership_not_logic() {
        // A bare name with operator characters must not be misparsed
        assert!(eval("Poisoned (severe)", &["Poisoned (severe)"]));
        assert!(!eval("Poisoned (severe)", &["Poisoned"]));
    }

    #[test]
    fn test_empty_expression_is_false() {
        assert!(!eval("", &["A"]));
    }

    #[test]
    fn test_malformed_expression_is_false() {
        assert!(!eval("A &&", &["A"]));
        assert!(!eval("\\(A && B", &["A", "B"]));
    }

    #[test]
    fn test_wildcard_literal() {
        assert!(eval("Curse of *", &["Curse of Binding"]));
        assert!(!eval("Curse of *", &["Blessing of Curse"]));
    }

    #[test]
    fn test_brace_alternation() {
        assert!(eval("{Stunned,Paralyzed}", &["Paralyzed"]));
        assert!(!eval("{Stunned,Paralyzed}", &["Prone"]));
    }

    #[test]
    fn test_wildcard_inside_logic() {
        assert!(eval("Mark * && \\!Dead", &["Mark of Doom"]));
        assert!(!eval("Mark * && \\!Dead", &["Mark of Doom", "Dead"]));
    }

    #[test]
    fn test_regex_metacharacters_in_names_are_literal() {
        assert!(eval("hp+5", &["hp+5"]));
        assert!(!eval("a.c", &["abc"]));
    }

    #[test]
    fn test_touched_added_and_removed() {
        let active = names(&["A", "B"]);
        let ev = evaluate("A && B", &active, &set(&["B"]), &HashSet::new());
        assert!(ev.result);
        assert!(ev.touched_added);
        assert!(!ev.touched_removed);

        let ev = evaluate("A && \\!C", &active, &HashSet::new(), &set(&["C"]));
        assert!(ev.result);
        assert!(ev.touched_removed);
    }

    #[test]
    fn test_touched_flags_via_wildcard() {
        let active = names(&["Curse of Binding"]);
        let ev = evaluate(
            "Curse of *",
            &active,
            &set(&["Curse of Binding"]),
            &HashSet::new(),
        );
        assert!(ev.result);
        assert!(ev.touched_added);
    }
}
