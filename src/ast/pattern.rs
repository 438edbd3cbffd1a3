//! Wildcard patterns for the `like` operator.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternElem {
    Literal(char),
    /// Matches zero or more characters.
    Wildcard,
}

/// A `like` pattern: literal characters and `*` wildcards, nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pattern(Vec<PatternElem>);

impl Pattern {
    pub fn new(elems: impl IntoIterator<Item = PatternElem>) -> Self {
        Pattern(elems.into_iter().collect())
    }

    /// Build a pattern from its source form: `*` is a wildcard and `\*` a
    /// literal star. Every other character, including a lone `\`, is literal.
    pub fn parse(source: &str) -> Self {
        let mut elems = Vec::with_capacity(source.len());
        let mut chars = source.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\\' if chars.peek() == Some(&'*') => {
                    chars.next();
                    elems.push(PatternElem::Literal('*'));
                }
                '*' => elems.push(PatternElem::Wildcard),
                c => elems.push(PatternElem::Literal(c)),
            }
        }
        Pattern(elems)
    }

    pub fn elems(&self) -> &[PatternElem] {
        &self.0
    }

    /// Match the whole of `text`, backtracking only to the most recent wildcard.
    pub fn matches(&self, text: &str) -> bool {
        let text: Vec<char> = text.chars().collect();
        let pattern = &self.0;

        let (mut t, mut p) = (0, 0);
        let mut backtrack: Option<(usize, usize)> = None;

        while t < text.len() {
            match pattern.get(p) {
                Some(PatternElem::Literal(c)) if *c == text[t] => {
                    t += 1;
                    p += 1;
                }
                Some(PatternElem::Wildcard) => {
                    backtrack = Some((p, t));
                    p += 1;
                }
                _ => match backtrack {
                    Some((star, mark)) => {
                        p = star + 1;
                        t = mark + 1;
                        backtrack = Some((star, mark + 1));
                    }
                    None => return false,
                },
            }
        }

        pattern[p..].iter().all(|e| *e == PatternElem::Wildcard)
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for elem in &self.0 {
            match elem {
                PatternElem::Literal('*') => f.write_str("\\*")?,
                PatternElem::Literal(c) => write!(f, "{c}")?,
                PatternElem::Wildcard => f.write_str("*")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        exact = { "web", "web", true },
        prefix = { "web*", "web-01.example.com", true },
        prefix_miss = { "web*", "db-01.example.com", false },
        suffix = { "*.example.com", "web-01.example.com", true },
        infix = { "web*example*", "web-01.example.com", true },
        star_matches_empty = { "web*", "web", true },
        only_star = { "*", "", true },
        empty_pattern = { "", "x", false },
        empty_both = { "", "", true },
        backtracking = { "*ab*ab", "xabyabab", true },
        escaped_star_literal = { r"a\*b", "a*b", true },
        escaped_star_is_not_wildcard = { r"a\*b", "axxb", false },
        lone_backslash = { r"a\b", r"a\b", true },
        unicode = { "caf*", "café", true },
        case_sensitive = { "Web*", "web", false },
    )]
    fn test_matches(pattern: &str, text: &str, expected: bool) {
        assert_eq!(Pattern::parse(pattern).matches(text), expected);
    }

    #[test]
    fn test_parse_elements() {
        let pattern = Pattern::parse(r"w*\*");
        assert_eq!(
            pattern.elems(),
            &[
                PatternElem::Literal('w'),
                PatternElem::Wildcard,
                PatternElem::Literal('*'),
            ]
        );
    }

    #[test]
    fn test_display_round_trips_source() {
        let source = r"web*\*x";
        assert_eq!(Pattern::parse(source).to_string(), source);
    }

    #[test]
    fn test_serialization_shape() {
        let json = serde_json::to_value(Pattern::parse("w*")).unwrap();
        assert_eq!(json, serde_json::json!([{"Literal": "w"}, "Wildcard"]));
    }
}
