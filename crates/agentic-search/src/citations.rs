//! Citation extraction: free-text tool responses -> cited corpus paths
//!
//! Matching is a chain of [`CitationMatcher`]s tried in order. The first
//! matcher with at least one candidate that normalises to a path decides the
//! candidate list; later matchers are not consulted. Candidates are then
//! filtered, de-duplicated and truncated, and finally split into paths that
//! exist in the corpus and hallucinated ones.
//!
//! Extraction is total: any input, including empty or binary garbage,
//! produces a (possibly empty) [`Citations`] value.

use codeeval_core::{Error, PathResolver};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

static FILE_MARKER_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t>*_-]*FILE:[*_]*[ \t]*(.+?)[ \t\r]*$").ok());
static BARE_PATH_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?:^|[^\w./@-])(/?(?:[\w.@-]+/)+[\w.@-]*[\w@-]\.[A-Za-z][A-Za-z0-9]{0,5})\b",
    )
    .ok()
});
static BACKTICK_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"`([^`\n]+)`").ok());
static EXTENSION_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\.[A-Za-z][A-Za-z0-9]{0,5}$").ok());
static LINE_SUFFIX_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?:[:#]L?\d+(?:[-:]L?\d+)*)+$").ok());

/// One way of spotting file paths in a response
pub trait CitationMatcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Raw candidate tokens in order of appearance
    fn candidates(&self, text: &str) -> Vec<String>;
}

/// Lines of the form `FILE: path/to/file.ts`, also `**FILE:** path` and `- FILE: path`
#[derive(Debug, Default, Clone, Copy)]
pub struct FileMarkerMatcher;

impl CitationMatcher for FileMarkerMatcher {
    fn name(&self) -> &'static str {
        "file_marker"
    }

    fn candidates(&self, text: &str) -> Vec<String> {
        let Some(pattern) = FILE_MARKER_PATTERN.as_ref() else {
            return Vec::new();
        };
        pattern
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

/// Relative paths with a directory and an extension, e.g. `packages/core/src/a.ts`
#[derive(Debug, Default, Clone, Copy)]
pub struct PathPatternMatcher;

impl CitationMatcher for PathPatternMatcher {
    fn name(&self) -> &'static str {
        "path_pattern"
    }

    fn candidates(&self, text: &str) -> Vec<String> {
        let Some(pattern) = BARE_PATH_PATTERN.as_ref() else {
            return Vec::new();
        };
        pattern
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

/// Backtick-quoted tokens containing `/` and ending in an extension
#[derive(Debug, Default, Clone, Copy)]
pub struct BacktickMatcher;

impl CitationMatcher for BacktickMatcher {
    fn name(&self) -> &'static str {
        "backtick"
    }

    fn candidates(&self, text: &str) -> Vec<String> {
        let (Some(pattern), Some(extension)) =
            (BACKTICK_PATTERN.as_ref(), EXTENSION_PATTERN.as_ref())
        else {
            return Vec::new();
        };
        pattern
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim())
            .filter(|token| token.contains('/') && extension.is_match(token))
            .map(str::to_string)
            .collect()
    }
}

/// Paths cited by one response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citations {
    /// Existing corpus paths, in order of first appearance
    pub cited: Vec<String>,
    /// Well-formed paths that are not in the corpus
    pub hallucinated: Vec<String>,
    /// Raw matches before normalisation and filtering
    pub candidate_count: usize,
    /// Matcher that produced the candidates
    pub matcher: Option<String>,
}

impl Citations {
    pub fn is_empty(&self) -> bool {
        self.cited.is_empty()
    }
}

/// Turns tool responses into cited paths
pub struct CitationExtractor {
    matchers: Vec<Box<dyn CitationMatcher>>,
    excluded_prefixes: Vec<String>,
    root: Option<String>,
}

impl Default for CitationExtractor {
    fn default() -> Self {
        Self::new(vec![
            Box::new(FileMarkerMatcher),
            Box::new(PathPatternMatcher),
            Box::new(BacktickMatcher),
        ])
        .with_excluded_prefixes(vec![".brv/".to_string()])
    }
}

impl CitationExtractor {
    pub fn new(matchers: Vec<Box<dyn CitationMatcher>>) -> Self {
        Self {
            matchers,
            excluded_prefixes: Vec::new(),
            root: None,
        }
    }

    /// Discard cited paths starting with any of these prefixes
    pub fn with_excluded_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.excluded_prefixes = prefixes;
        self
    }

    /// Absolute codebase root, stripped from absolute cited paths
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        let root: String = root.into();
        let root = root.replace('\\', "/");
        self.root = Some(root.trim_end_matches('/').to_string());
        self
    }

    /// Extract at most `max_files` cited paths from `response`
    pub fn extract(
        &self,
        response: &str,
        resolver: &dyn PathResolver,
        max_files: usize,
    ) -> Citations {
        let Some((matcher, candidate_count, normalized)) =
            self.matchers.iter().find_map(|m| {
                let candidates = m.candidates(response);
                let normalized: Vec<String> = candidates
                    .iter()
                    .filter_map(|c| normalize_path(c, self.root.as_deref()))
                    .collect();
                if normalized.is_empty() {
                    if !candidates.is_empty() {
                        debug!(
                            "Matcher '{}' found {} candidates but none is a path",
                            m.name(),
                            candidates.len()
                        );
                    }
                    None
                } else {
                    Some((m.name(), candidates.len(), normalized))
                }
            })
        else {
            debug!(
                "{}",
                Error::extraction(format!(
                    "no file paths found in {} byte response",
                    response.len()
                ))
            );
            return Citations::default();
        };

        let mut seen = HashSet::new();
        let kept: Vec<String> = normalized
            .into_iter()
            .filter(|p| !self.is_excluded(p))
            .filter(|p| seen.insert(p.clone()))
            .take(max_files)
            .collect();

        let (cited, hallucinated): (Vec<String>, Vec<String>) =
            kept.into_iter().partition(|p| resolver.contains(p));

        debug!(
            "Matcher '{matcher}' found {candidate_count} candidates: {} cited, {} hallucinated",
            cited.len(),
            hallucinated.len()
        );

        Citations {
            cited,
            hallucinated,
            candidate_count,
            matcher: Some(matcher.to_string()),
        }
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.excluded_prefixes
            .iter()
            .any(|prefix| {
                path.starts_with(prefix.as_str()) || path == prefix.trim_end_matches('/')
            })
    }
}

/// Normalise one candidate to a repository-relative, `/`-separated path
///
/// Returns `None` for candidates that are empty, absolute outside `root`, or
/// escape the repository with `..`.
pub fn normalize_path(candidate: &str, root: Option<&str>) -> Option<String> {
    let token = candidate.split_whitespace().next()?;
    let token = token
        .trim_start_matches(is_wrapping)
        .trim_end_matches(|c: char| {
            is_wrapping(c) || matches!(c, '.' | ',' | ';' | ':' | '!' | '?')
        });
    let mut path = token.replace('\\', "/");

    if let Some(pattern) = LINE_SUFFIX_PATTERN.as_ref() {
        path = pattern.replace(&path, "").into_owned();
    }

    let is_absolute = path.starts_with('/') || has_drive_prefix(&path);
    if is_absolute {
        let root = root?;
        let relative = path.strip_prefix(root)?;
        if !relative.is_empty() && !relative.starts_with('/') {
            return None;
        }
        path = relative.to_string();
    }

    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn is_wrapping(c: char) -> bool {
    matches!(c, '"' | '\'' | '`' | '*' | '<' | '>' | '[' | ']' | '(' | ')')
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/'
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn corpus() -> BTreeSet<String> {
        [
            "packages/core/src/code_assist/oauth2.ts",
            "packages/core/src/config/config.ts",
            "packages/cli/src/ui/App.tsx",
            "scripts/build.js",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    #[test]
    fn test_file_markers_win() {
        let response = "OAuth2 is implemented in the code_assist module.\n\n\
            FILE: packages/core/src/code_assist/oauth2.ts\n\
            FILE: packages/core/src/config/config.ts\n\
            See also scripts/build.js";

        let citations = CitationExtractor::default().extract(response, &corpus(), 10);
        assert_eq!(
            citations.cited,
            vec![
                "packages/core/src/code_assist/oauth2.ts",
                "packages/core/src/config/config.ts"
            ]
        );
        assert_eq!(citations.candidate_count, 2);
        assert_eq!(citations.matcher.as_deref(), Some("file_marker"));
    }

    #[test]
    fn test_bold_file_markers() {
        let response = "OAuth2 lives in packages/core/src/code_assist/oauth2.ts.\n\n\
            **FILE:** packages/core/src/code_assist/oauth2.ts\n\
            - __FILE:__ `packages/core/src/config/config.ts`\n";

        let citations = CitationExtractor::default().extract(response, &corpus(), 10);
        assert_eq!(
            citations.cited,
            vec![
                "packages/core/src/code_assist/oauth2.ts",
                "packages/core/src/config/config.ts"
            ]
        );
        assert_eq!(citations.matcher.as_deref(), Some("file_marker"));
    }

    #[test]
    fn test_falls_through_when_markers_hold_no_path() {
        let response =
            "FILE: **\nFILE: ../..\nThe config loader is packages/core/src/config/config.ts";

        let citations = CitationExtractor::default().extract(response, &corpus(), 10);
        assert_eq!(citations.cited, vec!["packages/core/src/config/config.ts"]);
        assert_eq!(citations.candidate_count, 1);
        assert_eq!(citations.matcher.as_deref(), Some("path_pattern"));
    }

    #[test]
    fn test_bare_paths_when_no_markers() {
        let response = "The entry point is packages/cli/src/ui/App.tsx, built by scripts/build.js.";
        let citations = CitationExtractor::default().extract(response, &corpus(), 10);
        assert_eq!(
            citations.cited,
            vec!["packages/cli/src/ui/App.tsx", "scripts/build.js"]
        );
        assert_eq!(citations.matcher.as_deref(), Some("path_pattern"));
    }

    #[test]
    fn test_backticks_as_last_resort() {
        let matchers: Vec<Box<dyn CitationMatcher>> =
            vec![Box::new(FileMarkerMatcher), Box::new(BacktickMatcher)];
        let extractor = CitationExtractor::new(matchers);
        let response = "Look at `scripts/build.js` and `README` and `npm run build`.";
        let citations = extractor.extract(response, &corpus(), 10);
        assert_eq!(citations.cited, vec!["scripts/build.js"]);
        assert_eq!(citations.candidate_count, 1);
    }

    #[test]
    fn test_urls_are_not_paths() {
        let response = "Docs at https://github.com/google/gemini-cli/blob/main/README.md";
        let citations = CitationExtractor::default().extract(response, &corpus(), 10);
        assert!(citations.cited.is_empty());
        assert!(citations.hallucinated.is_empty());
    }

    #[test]
    fn test_excluded_prefixes_dedup_and_truncation() {
        let response = "FILE: .brv/context-tree/auth.md\n\
            FILE: ./packages/core/src/config/config.ts\n\
            FILE: packages/core/src/config/config.ts\n\
            FILE: packages\\core\\src\\code_assist\\oauth2.ts\n\
            FILE: scripts/build.js";

        let citations = CitationExtractor::default().extract(response, &corpus(), 2);
        assert_eq!(
            citations.cited,
            vec![
                "packages/core/src/config/config.ts",
                "packages/core/src/code_assist/oauth2.ts"
            ]
        );
        assert_eq!(citations.candidate_count, 5);
    }

    #[test]
    fn test_truncation_happens_before_existence_check() {
        let response = "FILE: packages/core/src/made_up.ts\n\
            FILE: packages/core/src/config/config.ts\n\
            FILE: scripts/build.js";
        let citations = CitationExtractor::default().extract(response, &corpus(), 2);
        assert_eq!(citations.cited, vec!["packages/core/src/config/config.ts"]);
        assert_eq!(citations.hallucinated, vec!["packages/core/src/made_up.ts"]);
    }

    #[test]
    fn test_garbage_and_empty_input() {
        let extractor = CitationExtractor::default();
        assert_eq!(extractor.extract("", &corpus(), 10), Citations::default());
        assert_eq!(
            extractor.extract("no paths here at all!", &corpus(), 10),
            Citations::default()
        );
        let garbage = String::from_utf8_lossy(&[0xff, 0xfe, b'\n', 0x00, 0x80]).into_owned();
        assert!(extractor.extract(&garbage, &corpus(), 10).is_empty());
        assert!(extractor.extract("FILE: ../../etc/passwd", &corpus(), 10).is_empty());
        assert!(extractor.extract("FILE:", &corpus(), 10).is_empty());
    }

    #[test]
    fn test_max_files_zero() {
        let citations =
            CitationExtractor::default().extract("FILE: scripts/build.js", &corpus(), 0);
        assert!(citations.cited.is_empty());
        assert_eq!(citations.candidate_count, 1);
    }

    #[test]
    fn test_absolute_paths_under_root() {
        let extractor = CitationExtractor::default().with_root("/work/gemini-cli/");
        let response = "FILE: /work/gemini-cli/scripts/build.js\nFILE: /etc/hosts.conf";
        let citations = extractor.extract(response, &corpus(), 10);
        assert_eq!(citations.cited, vec!["scripts/build.js"]);
        assert!(citations.hallucinated.is_empty());
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path("  `./src/a.ts`,", None).as_deref(),
            Some("src/a.ts")
        );
        assert_eq!(normalize_path("src/a.ts:42", None).as_deref(), Some("src/a.ts"));
        assert_eq!(
            normalize_path("src/a.ts:10-20 - handles login", None).as_deref(),
            Some("src/a.ts")
        );
        assert_eq!(
            normalize_path("src/lib/../a.ts", None).as_deref(),
            Some("src/a.ts")
        );
        assert_eq!(normalize_path("../a.ts", None), None);
        assert_eq!(normalize_path("/abs/a.ts", None), None);
        assert_eq!(normalize_path("/repo/a.ts", Some("/repo")).as_deref(), Some("a.ts"));
        assert_eq!(normalize_path("/repository/a.ts", Some("/repo")), None);
        assert_eq!(normalize_path("C:/repo/a.ts", Some("C:/repo")).as_deref(), Some("a.ts"));
        assert_eq!(normalize_path("**packages/a.ts**", None).as_deref(), Some("packages/a.ts"));
        assert_eq!(normalize_path("", None), None);
    }
}
