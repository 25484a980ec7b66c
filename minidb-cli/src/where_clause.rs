//! Parses `--where` clauses from the command line into `Predicate`s.
//!
//! Grammar: `<attr><cmp><literal>`, e.g. `key>=10` or `value=hello`. There is
//! no grouping, no OR, and no SQL — a `select` is just a list of these,
//! ANDed together, by design.

use query_engine::{Attr, Comparator, Predicate};

pub fn parse(clause: &str) -> Result<Predicate, String> {
    let (attr, rest) = if let Some(rest) = clause.strip_prefix("key") {
        (Attr::Key, rest)
    } else if let Some(rest) = clause.strip_prefix("value") {
        (Attr::Value, rest)
    } else {
        return Err(format!("clause must start with `key` or `value`: {clause:?}"));
    };

    let (cmp, literal) = parse_cmp(rest)
        .ok_or_else(|| format!("missing or unrecognized comparator in {clause:?}"))?;

    match attr {
        Attr::Key => {
            let value: i32 = literal
                .parse()
                .map_err(|_| format!("key literal must be an integer: {literal:?}"))?;
            Ok(Predicate::key(cmp, value))
        }
        Attr::Value => Ok(Predicate::value(cmp, literal)),
    }
}

fn parse_cmp(rest: &str) -> Option<(Comparator, &str)> {
    for (prefix, cmp) in [
        ("!=", Comparator::Ne),
        ("<=", Comparator::Le),
        (">=", Comparator::Ge),
        ("=", Comparator::Eq),
        ("<", Comparator::Lt),
        (">", Comparator::Gt),
    ] {
        if let Some(literal) = rest.strip_prefix(prefix) {
            return Some((cmp, literal));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_equality() {
        let p = parse("key=42").unwrap();
        assert_eq!(p.attr, Attr::Key);
        assert_eq!(p.cmp, Comparator::Eq);
    }

    #[test]
    fn parses_value_clause_with_bareword() {
        let p = parse("value=hello").unwrap();
        assert_eq!(p.attr, Attr::Value);
    }

    #[test]
    fn ge_is_preferred_over_eq_prefix_collision() {
        let p = parse("key>=10").unwrap();
        assert_eq!(p.cmp, Comparator::Ge);
    }

    #[test]
    fn rejects_unknown_attribute() {
        assert!(parse("color=red").is_err());
    }

    #[test]
    fn rejects_non_integer_key_literal() {
        assert!(parse("key=abc").is_err());
    }
}
