//! Query language.
//!
//! Space-separated groups, each one of:
//! - bare text: `holiday`
//! - field with optional comparison: `file_size:>1GB`, `ext:mp4`
//! - list membership: `tag_id:in(a,b)`, `tag_id:nin(a,b)`
//! - boolean flag: `is:dir`
//! - `NOT`, which inverts the operator of the next group
//!
//! Quotes (`'` or `"`) group text containing spaces and `\` escapes the next
//! character. Nothing is rejected: unknown operators fall back to equality.

use crate::query::op::{CompareOp, Operator};
use serde::Serialize;
use std::collections::BTreeSet;

const NOT_KEYWORD: &str = "NOT";
const TAG_FIELD: &str = "tag_id";
const IDS_FIELD: &str = "ids";
const INVALID_IDS: &str = "invalid_ids";

/// Field name of free-text predicates
pub const TEXT_FIELD: &str = "text";

/// One parsed group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Predicate {
    pub name: String,
    /// None for free text and `is:` flags
    pub op: Option<Operator>,
    pub value: String,
}

impl Predicate {
    pub fn new(name: impl Into<String>, op: Option<Operator>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            op,
            value: value.into(),
        }
    }

    /// Comparison operator, if the predicate carries one
    pub fn compare_op(&self) -> Option<CompareOp> {
        self.op.and_then(Operator::compare)
    }

    /// Apply a preceding `NOT`; operator-less predicates stay operator-less
    fn invert(&mut self) {
        self.op = self.op.map(Operator::inverse);
    }
}

/// Parse a query into predicates
pub fn parse(query: &str) -> Vec<Predicate> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut invert_next = false;

    for group in split_groups(query) {
        let Some(mut predicate) = parse_group(&group) else {
            invert_next = true;
            continue;
        };
        if invert_next {
            predicate.invert();
            invert_next = false;
        }
        out.push(predicate);
    }

    out
}

/// Parse, then replace the `tag_id` predicates with `ids` predicates.
///
/// `in(...)`/`nin(...)` lists are split into single tag ids. Included tags
/// (`=`, `in`) become one `ids` predicate with `In`; excluded tags (`!=`,
/// `nin`, including those produced by `NOT`) become one with `Nin`. `lookup` receives
/// the distinct tag ids of each side and returns the matching entity keys.
/// When no included tag resolves, the `In` side becomes `ids:invalid_ids` so
/// the query matches nothing rather than everything. Excluded tags that
/// resolve to nothing exclude nothing.
pub fn parse_with_tag_mapping<F>(query: &str, mut lookup: F) -> Vec<Predicate>
where
    F: FnMut(&[String]) -> Vec<String>,
{
    let predicates = parse(query);

    let mut included: BTreeSet<&str> = BTreeSet::new();
    let mut excluded: BTreeSet<&str> = BTreeSet::new();
    for p in predicates.iter().filter(|p| p.name == TAG_FIELD) {
        let side = if p.op.is_some_and(Operator::is_negative) {
            &mut excluded
        } else {
            &mut included
        };
        let list = matches!(p.op, Some(Operator::In | Operator::Nin));
        if list {
            side.extend(p.value.split(',').map(str::trim).filter(|id| !id.is_empty()));
        } else {
            side.insert(p.value.as_str());
        }
    }
    if included.is_empty() && excluded.is_empty() {
        return predicates;
    }

    let mut resolve = |ids: BTreeSet<&str>| -> Option<Vec<String>> {
        if ids.is_empty() {
            return None;
        }
        let ids: Vec<String> = ids.into_iter().map(str::to_string).collect();
        Some(lookup(&ids))
    };
    let included_keys = resolve(included);
    let excluded_keys = resolve(excluded);

    let mut out: Vec<Predicate> = predicates
        .iter()
        .filter(|p| p.name != TAG_FIELD)
        .cloned()
        .collect();
    if let Some(keys) = included_keys {
        let value = if keys.is_empty() {
            INVALID_IDS.to_string()
        } else {
            keys.join(",")
        };
        out.push(Predicate::new(IDS_FIELD, Some(Operator::In), value));
    }
    if let Some(keys) = excluded_keys.filter(|k| !k.is_empty()) {
        out.push(Predicate::new(IDS_FIELD, Some(Operator::Nin), keys.join(",")));
    }
    out
}

/// Split on unquoted whitespace. Quote characters are kept in the group;
/// escape backslashes are dropped.
fn split_groups(input: &str) -> Vec<String> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escape = false;

    for c in input.chars() {
        if escape {
            current.push(c);
            escape = false;
            continue;
        }
        if c == '\\' {
            escape = true;
            continue;
        }
        if let Some(q) = quote {
            current.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => {
                quote = Some(c);
                current.push(c);
            }
            ' ' | '\t' | '\n' | '\r' => {
                if !current.is_empty() {
                    groups.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }

    groups
}

/// Strip one pair of matching outer quotes
fn unquote(s: &str) -> &str {
    for q in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// None for the `NOT` keyword
fn parse_group(group: &str) -> Option<Predicate> {
    if group == NOT_KEYWORD {
        return None;
    }

    let Some((field, rest)) = group.split_once(':') else {
        return Some(Predicate::new(TEXT_FIELD, None, unquote(group)));
    };
    let field = unquote(field);
    let rest = unquote(rest);

    if field == "is" {
        return Some(Predicate::new(rest, None, "true"));
    }

    let (op, value) = split_operator(rest);
    Some(Predicate::new(field, Some(op), value))
}

fn split_operator(value: &str) -> (Operator, &str) {
    for (op, name) in [(Operator::Nin, "nin"), (Operator::In, "in")] {
        if let Some(list) = value
            .strip_prefix(name)
            .and_then(|v| v.strip_prefix('('))
            .and_then(|v| v.strip_suffix(')'))
        {
            return (op, list);
        }
    }

    match CompareOp::strip_prefix(value) {
        Some((op, rest)) => (Operator::Cmp(op), rest),
        None => (Operator::EQ, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmp(op: CompareOp) -> Option<Operator> {
        Some(Operator::Cmp(op))
    }

    #[test]
    fn test_split_groups() {
        let cases = [
            ("a b c", vec!["a", "b", "c"]),
            ("foo:'bar baz' x", vec!["foo:'bar baz'", "x"]),
            ("foo:\"bar\" baz", vec!["foo:\"bar\"", "baz"]),
            ("a\\ b c", vec!["a b", "c"]),
            ("'a b' c", vec!["'a b'", "c"]),
            ("  padded\t\tgroups  ", vec!["padded", "groups"]),
        ];
        for (input, expected) in cases {
            assert_eq!(split_groups(input), expected, "{input}");
        }
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("'abc'"), "abc");
        assert_eq!(unquote("\"abc\""), "abc");
        assert_eq!(unquote("abc"), "abc");
        assert_eq!(unquote("'a b'"), "a b");
        assert_eq!(unquote("'"), "'");
        assert_eq!(unquote("'mixed\""), "'mixed\"");
    }

    #[test]
    fn test_parse_file_size() {
        let cases = [
            ("file_size:>1GB", CompareOp::Gt, "1GB"),
            ("file_size:<=100MB", CompareOp::Le, "100MB"),
            ("file_size:=1234", CompareOp::Eq, "1234"),
            ("file_size:!=0", CompareOp::Ne, "0"),
            ("file_size:1KB", CompareOp::Eq, "1KB"),
        ];
        for (query, op, value) in cases {
            let parsed = parse(query);
            assert_eq!(parsed, vec![Predicate::new("file_size", cmp(op), value)], "{query}");
        }
    }

    #[test]
    fn test_parse_is_flag() {
        assert_eq!(parse("is:dir"), vec![Predicate::new("dir", None, "true")]);
    }

    #[test]
    fn test_parse_bare_text() {
        let parsed = parse("holiday  photos");
        assert_eq!(
            parsed,
            vec![
                Predicate::new(TEXT_FIELD, None, "holiday"),
                Predicate::new(TEXT_FIELD, None, "photos"),
            ]
        );
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse("").is_empty());
        assert!(parse("   \t").is_empty());
    }

    #[test]
    fn test_not_inverts_next() {
        assert_eq!(
            parse("NOT file_size:=0"),
            vec![Predicate::new("file_size", cmp(CompareOp::Ne), "0")]
        );
        assert_eq!(
            parse("NOT file_size:>=10 ext:mp4"),
            vec![
                Predicate::new("file_size", cmp(CompareOp::Lt), "10"),
                Predicate::new("ext", cmp(CompareOp::Eq), "mp4"),
            ]
        );
    }

    #[test]
    fn test_not_on_operatorless_stays_operatorless() {
        assert_eq!(parse("NOT is:dir"), vec![Predicate::new("dir", None, "true")]);
        assert_eq!(parse("NOT"), Vec::<Predicate>::new());
    }

    #[test]
    fn test_quotes_and_escapes() {
        assert_eq!(
            parse(r#"name:"summer trip" text"#),
            vec![
                Predicate::new("name", cmp(CompareOp::Eq), "summer trip"),
                Predicate::new(TEXT_FIELD, None, "text"),
            ]
        );
        assert_eq!(
            parse(r"my\ file"),
            vec![Predicate::new(TEXT_FIELD, None, "my file")]
        );
        assert_eq!(
            parse("'quoted text'"),
            vec![Predicate::new(TEXT_FIELD, None, "quoted text")]
        );
    }

    #[test]
    fn test_split_on_first_colon() {
        assert_eq!(
            parse("foo:bar:baz"),
            vec![Predicate::new("foo", cmp(CompareOp::Eq), "bar:baz")]
        );
    }

    #[test]
    fn test_in_and_nin() {
        assert_eq!(
            parse("tag_id:in(a,b)"),
            vec![Predicate::new("tag_id", Some(Operator::In), "a,b")]
        );
        assert_eq!(
            parse("NOT tag_id:in(a,b)"),
            vec![Predicate::new("tag_id", Some(Operator::Nin), "a,b")]
        );
        assert_eq!(
            parse("tag_id:nin(x)"),
            vec![Predicate::new("tag_id", Some(Operator::Nin), "x")]
        );
        // Not a list without parentheses
        assert_eq!(
            parse("name:inbox"),
            vec![Predicate::new("name", cmp(CompareOp::Eq), "inbox")]
        );
    }

    #[test]
    fn test_tag_mapping_resolves() {
        let parsed = parse_with_tag_mapping("tag_id:2 photo tag_id:1 tag_id:2", |ids| {
            assert_eq!(ids, ["1".to_string(), "2".to_string()]);
            vec!["k1".to_string(), "k2".to_string()]
        });
        assert_eq!(
            parsed,
            vec![
                Predicate::new(TEXT_FIELD, None, "photo"),
                Predicate::new("ids", Some(Operator::In), "k1,k2"),
            ]
        );
    }

    #[test]
    fn test_tag_mapping_splits_lists() {
        let parsed = parse_with_tag_mapping("tag_id:in(1,2) tag_id:3", |ids| {
            assert_eq!(ids, ["1".to_string(), "2".to_string(), "3".to_string()]);
            vec!["k1".to_string(), "k3".to_string()]
        });
        assert_eq!(parsed, vec![Predicate::new("ids", Some(Operator::In), "k1,k3")]);
    }

    #[test]
    fn test_tag_mapping_keeps_exclusions() {
        let parsed = parse_with_tag_mapping("NOT tag_id:in(1) clip", |ids| {
            assert_eq!(ids, ["1".to_string()]);
            vec!["k1".to_string()]
        });
        assert_eq!(
            parsed,
            vec![
                Predicate::new(TEXT_FIELD, None, "clip"),
                Predicate::new("ids", Some(Operator::Nin), "k1"),
            ]
        );

        let parsed = parse_with_tag_mapping("tag_id:!=4", |_| vec!["k4".to_string()]);
        assert_eq!(parsed, vec![Predicate::new("ids", Some(Operator::Nin), "k4")]);
    }

    #[test]
    fn test_tag_mapping_mixed_sides() {
        let mut calls = Vec::new();
        let parsed = parse_with_tag_mapping("tag_id:1 tag_id:nin(2,3)", |ids| {
            calls.push(ids.to_vec());
            ids.iter().map(|id| format!("k{id}")).collect()
        });
        assert_eq!(
            parsed,
            vec![
                Predicate::new("ids", Some(Operator::In), "k1"),
                Predicate::new("ids", Some(Operator::Nin), "k2,k3"),
            ]
        );
        assert_eq!(calls.len(), 2);
    }

    #[test]
    fn test_tag_mapping_unresolved_exclusion_is_dropped() {
        let parsed = parse_with_tag_mapping("NOT tag_id:7 beach", |_| Vec::new());
        assert_eq!(parsed, vec![Predicate::new(TEXT_FIELD, None, "beach")]);
    }

    #[test]
    fn test_tag_mapping_unresolved_matches_nothing() {
        let parsed = parse_with_tag_mapping("tag_id:9", |_| Vec::new());
        assert_eq!(parsed, vec![Predicate::new("ids", Some(Operator::In), "invalid_ids")]);
    }

    #[test]
    fn test_tag_mapping_without_tags_is_plain_parse() {
        let parsed = parse_with_tag_mapping("ext:jpg", |_| panic!("lookup must not run"));
        assert_eq!(parsed, parse("ext:jpg"));
    }
}
