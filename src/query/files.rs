//! Turns parsed predicates into a search request for the file browser.

use crate::query::executor::{SearchRequest, SizeFilter};
use crate::query::parser::{parse, Predicate, TEXT_FIELD};
use crate::utils::paths;
use tracing::debug;

/// Search-relevant fields of a file browser query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilesQuery {
    pub text: String,
    pub root_path: String,
    pub relative_path: String,
    pub show_hidden: bool,
    /// Trash view; always shows hidden entries
    pub trash: bool,
    pub file_size: Option<SizeFilter>,
}

impl FilesQuery {
    /// Parse query text and collect the known fields
    pub fn parse(query: &str) -> Self {
        Self::from_predicates(&parse(query))
    }

    pub fn from_predicates(predicates: &[Predicate]) -> Self {
        let mut out = Self::default();

        for p in predicates {
            match p.name.as_str() {
                "show_hidden" => out.show_hidden = p.value == "true",
                TEXT_FIELD => {
                    // Successive words form one conjunctive text query
                    if !out.text.is_empty() {
                        out.text.push(' ');
                    }
                    out.text.push_str(&p.value);
                }
                "root_path" => out.root_path = p.value.clone(),
                "relative_path" => out.relative_path = p.value.clone(),
                "trash" => out.trash = p.value == "true",
                "file_size" => {
                    // List operators have no meaning for sizes
                    out.file_size = p
                        .compare_op()
                        .map(|op| SizeFilter::new(op, parse_file_size(&p.value)));
                    debug!(op = ?p.op, value = %p.value, parsed = ?out.file_size, "file size filter");
                }
                _ => {}
            }
        }

        if out.trash {
            out.show_hidden = true;
        }
        out
    }

    /// Directory the search is scoped to ("" for a global search)
    pub fn base_dir(&self) -> String {
        normalize_slash_dir(&build_base_dir(&self.root_path, &self.relative_path))
    }

    pub fn to_request(&self, offset: usize, limit: usize) -> SearchRequest {
        SearchRequest {
            text: self.text.clone(),
            parent: self.base_dir(),
            offset,
            limit,
            size: self.file_size,
        }
    }
}

/// Parse `1GB`, `100MB`, `1KB`, `12B`, or a plain byte count (case-insensitive,
/// 1024 multiples). Anything unparseable is 0.
pub fn parse_file_size(s: &str) -> u64 {
    let s = s.trim().to_uppercase();
    if s.is_empty() {
        return 0;
    }

    let (digits, multiplier) = if let Some(n) = s.strip_suffix("GB") {
        (n, 1u64 << 30)
    } else if let Some(n) = s.strip_suffix("MB") {
        (n, 1 << 20)
    } else if let Some(n) = s.strip_suffix("KB") {
        (n, 1 << 10)
    } else if let Some(n) = s.strip_suffix('B') {
        (n, 1)
    } else {
        (s.as_str(), 1)
    };

    digits
        .trim()
        .parse::<u64>()
        .map(|v| v.saturating_mul(multiplier))
        .unwrap_or(0)
}

/// Root joined with a relative path; a leading `/` on the relative part is ignored
pub fn build_base_dir(root_path: &str, relative_path: &str) -> String {
    if relative_path.is_empty() {
        return root_path.to_string();
    }
    let rel = relative_path.strip_prefix('/').unwrap_or(relative_path);
    paths::join(root_path, rel)
}

/// Cleaned directory without a trailing slash; "" and "." become ""
pub fn normalize_slash_dir(p: &str) -> String {
    let p = p.trim();
    if p.is_empty() {
        return String::new();
    }
    let cleaned = paths::clean(&p.replace('\\', "/"));
    if cleaned == "." {
        return String::new();
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::op::CompareOp;

    #[test]
    fn test_parse_file_size() {
        assert_eq!(parse_file_size("1GB"), 1 << 30);
        assert_eq!(parse_file_size("100MB"), 100 << 20);
        assert_eq!(parse_file_size("1kb"), 1024);
        assert_eq!(parse_file_size("12B"), 12);
        assert_eq!(parse_file_size(" 42 "), 42);
        assert_eq!(parse_file_size("lots"), 0);
        assert_eq!(parse_file_size(""), 0);
        assert_eq!(parse_file_size("-5MB"), 0);
    }

    #[test]
    fn test_from_query() {
        let q = FilesQuery::parse("holiday root_path:/mnt/usb1 relative_path:photos file_size:>1GB");
        assert_eq!(q.text, "holiday");
        assert_eq!(q.root_path, "/mnt/usb1");
        assert_eq!(q.relative_path, "photos");
        assert_eq!(q.file_size, Some(SizeFilter::new(CompareOp::Gt, 1 << 30)));
        assert!(!q.show_hidden);
    }

    #[test]
    fn test_bare_words_are_joined() {
        let q = FilesQuery::parse("holiday root_path:/data beach 'sea view'");
        assert_eq!(q.text, "holiday beach sea view");
        assert_eq!(q.to_request(0, 10).text, "holiday beach sea view");
    }

    #[test]
    fn test_trash_implies_hidden() {
        let q = FilesQuery::parse("trash:true");
        assert!(q.trash);
        assert!(q.show_hidden);
    }

    #[test]
    fn test_not_file_size() {
        let q = FilesQuery::parse("NOT file_size:>=10KB");
        assert_eq!(q.file_size, Some(SizeFilter::new(CompareOp::Lt, 10 << 10)));
    }

    #[test]
    fn test_base_dir() {
        assert_eq!(build_base_dir("/mnt/usb1", ""), "/mnt/usb1");
        assert_eq!(build_base_dir("/mnt/usb1", "/photos/2024"), "/mnt/usb1/photos/2024");
        assert_eq!(normalize_slash_dir("/mnt/usb1/photos/"), "/mnt/usb1/photos");
        assert_eq!(normalize_slash_dir("/"), "/");
        assert_eq!(normalize_slash_dir("."), "");
        assert_eq!(normalize_slash_dir("  "), "");
    }

    #[test]
    fn test_to_request() {
        let q = FilesQuery::parse("report root_path:/data relative_path:docs");
        let req = q.to_request(10, 20);
        assert_eq!(req.text, "report");
        assert_eq!(req.parent, "/data/docs");
        assert_eq!(req.offset, 10);
        assert_eq!(req.limit, 20);
        assert_eq!(req.size, None);
    }
}
