//! Helpers over canonically rendered literal strings
//!
//! Ground literals are rendered once, canonically (`(pred arg1 ... argN)`,
//! single spaces), and every table in the pipeline keys on that rendering.
//! These helpers classify and rewrite such keys without re-parsing.

/// Strip any number of `(not ...)` wrappers, returning the flipped-parity
/// flag and the innermost literal.
pub fn strip_negation(literal: &str) -> (bool, &str) {
    let mut negated = false;
    let mut core = literal;
    while let Some(inner) = core
        .strip_prefix("(not ")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        core = inner.trim();
        negated = !negated;
    }
    (negated, core)
}

/// Does this key read the current game state?
pub fn is_state_true(key: &str) -> bool {
    key == "true" || key.starts_with("(true ")
}

/// Does this key read the previous game state?
pub fn is_old_state(key: &str) -> bool {
    key == "true_old" || key.starts_with("(true_old ")
}

pub fn is_does(key: &str) -> bool {
    key == "does" || key.starts_with("(does ")
}

pub fn is_sees(key: &str) -> bool {
    key == "sees" || key.starts_with("(sees ")
}

/// Rewrite a state-true key to its previous-state variant.
pub fn oldify(key: &str) -> String {
    if let Some(rest) = key.strip_prefix("(true ") {
        format!("(true_old {}", rest)
    } else if key == "true" {
        "true_old".to_string()
    } else {
        key.to_string()
    }
}

/// Rewrite a `next` fluent into the `true` literal it seeds in the
/// successor state. Returns `None` for non-`next` keys.
pub fn next_to_true(key: &str) -> Option<String> {
    key.strip_prefix("(next ").map(|rest| format!("(true {}", rest))
}

/// Rewrite a `does` literal into the `legal` head that must admit it.
/// Returns `None` for non-`does` keys.
pub fn does_to_legal(key: &str) -> Option<String> {
    key.strip_prefix("(does ").map(|rest| format!("(legal {}", rest))
}

/// The two argument renderings of a `(distinct a b)` literal, or `None` if
/// the key is not a binary `distinct`.
pub fn distinct_args(key: &str) -> Option<(String, String)> {
    let body = key.strip_prefix("(distinct ")?.strip_suffix(')')?;
    let args = split_args(body);
    match args.as_slice() {
        [a, b] => Some((a.clone(), b.clone())),
        _ => None,
    }
}

/// The predicate name of a rendered literal: the functor of a compound,
/// the atom itself otherwise.
pub fn predicate_of(key: &str) -> &str {
    match key.strip_prefix('(') {
        Some(rest) => rest
            .split(|c| c == ' ' || c == ')')
            .next()
            .unwrap_or(rest),
        None => key,
    }
}

/// Split a rendered argument list at top-level spaces.
fn split_args(body: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in body.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ' ' if depth == 0 => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        args.push(current);
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_negation() {
        assert_eq!(strip_negation("(p a)"), (false, "(p a)"));
        assert_eq!(strip_negation("(not (p a))"), (true, "(p a)"));
        assert_eq!(strip_negation("(not (not (p a)))"), (false, "(p a)"));
        assert_eq!(strip_negation("terminal"), (false, "terminal"));
    }

    #[test]
    fn test_state_prefixes() {
        assert!(is_state_true("(true (cell 1 1 b))"));
        assert!(!is_state_true("(true_old (cell 1 1 b))"));
        assert!(is_old_state("(true_old (cell 1 1 b))"));
        assert!(!is_state_true("(truely x)"));
    }

    #[test]
    fn test_oldify() {
        assert_eq!(oldify("(true (win red))"), "(true_old (win red))");
        assert_eq!(oldify("(goal red 100)"), "(goal red 100)");
    }

    #[test]
    fn test_next_to_true() {
        assert_eq!(
            next_to_true("(next (step 2))").as_deref(),
            Some("(true (step 2))")
        );
        assert_eq!(next_to_true("(goal red 100)"), None);
    }

    #[test]
    fn test_does_to_legal() {
        assert_eq!(
            does_to_legal("(does red (mark 1 1))").as_deref(),
            Some("(legal red (mark 1 1))")
        );
        assert_eq!(does_to_legal("(legal red noop)"), None);
    }

    #[test]
    fn test_predicate_of() {
        assert_eq!(predicate_of("(goal red 100)"), "goal");
        assert_eq!(predicate_of("(true (cell 1 1 b))"), "true");
        assert_eq!(predicate_of("terminal"), "terminal");
        assert_eq!(predicate_of("(low)"), "low");
    }

    #[test]
    fn test_distinct_args_with_compounds() {
        assert_eq!(
            distinct_args("(distinct (cell 1 1) (cell 2 2))"),
            Some(("(cell 1 1)".to_string(), "(cell 2 2)".to_string()))
        );
        assert_eq!(
            distinct_args("(distinct a b)"),
            Some(("a".to_string(), "b".to_string()))
        );
        assert_eq!(distinct_args("(distinct a)"), None);
        assert_eq!(distinct_args("(p a b)"), None);
    }
}
