//! Corpus discovery: the set of source files a codebase contributes to the index
//!
//! Discovery is deterministic. Entries are sorted by their repository-relative
//! path (always `/`-separated), so two runs over the same tree produce the
//! same sequence.

use crate::config::CorpusConfig;
use crate::error::{Error, Result};
use crate::tokens::TokenCounter;
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Bytes inspected when sniffing for binary content
const BINARY_SNIFF_BYTES: usize = 8 * 1024;

/// One indexed source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusEntry {
    /// Repository-relative, `/`-separated path. Primary key everywhere.
    pub path: String,
    pub content: String,
    pub token_count: usize,
}

/// Answers whether a repository-relative path names a known file
pub trait PathResolver: Send + Sync {
    fn contains(&self, path: &str) -> bool;
}

impl PathResolver for HashSet<String> {
    fn contains(&self, path: &str) -> bool {
        HashSet::contains(self, path)
    }
}

impl PathResolver for BTreeSet<String> {
    fn contains(&self, path: &str) -> bool {
        BTreeSet::contains(self, path)
    }
}

/// All eligible files under a codebase root
#[derive(Debug, Clone)]
pub struct Corpus {
    root: PathBuf,
    entries: Vec<CorpusEntry>,
    by_path: BTreeMap<String, usize>,
}

impl Corpus {
    /// Build a corpus from already-loaded entries (sorted and de-duplicated by path)
    pub fn from_entries(root: impl Into<PathBuf>, mut entries: Vec<CorpusEntry>) -> Result<Self> {
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries.dedup_by(|a, b| a.path == b.path);

        let root = root.into();
        if entries.is_empty() {
            return Err(Error::corpus(format!(
                "no eligible files found under {}",
                root.display()
            )));
        }

        let by_path = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.path.clone(), i))
            .collect();

        Ok(Self {
            root,
            entries,
            by_path,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&CorpusEntry> {
        self.by_path.get(path).map(|&i| &self.entries[i])
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.path.as_str())
    }

    pub fn total_tokens(&self) -> usize {
        self.entries.iter().map(|e| e.token_count).sum()
    }
}

impl PathResolver for Corpus {
    fn contains(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }
}

/// Load every eligible file under `root`
///
/// Fails with a corpus error if `root` is missing, is not a directory, or
/// contains no eligible file.
pub fn load_corpus(
    root: &Path,
    config: &CorpusConfig,
    token_counter: &dyn TokenCounter,
) -> Result<Corpus> {
    if !root.exists() {
        return Err(Error::corpus(format!(
            "codebase root {} does not exist",
            root.display()
        )));
    }
    if !root.is_dir() {
        return Err(Error::corpus(format!(
            "codebase root {} is not a directory",
            root.display()
        )));
    }

    info!("Collecting code files from {}...", root.display());

    let extensions: HashSet<&str> = config.extensions.iter().map(|e| e.as_str()).collect();
    let ignore_dirs: HashSet<String> = config.ignore_dirs.iter().cloned().collect();

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(false)
        .follow_links(false)
        .git_ignore(config.respect_gitignore)
        .git_exclude(config.respect_gitignore)
        .parents(config.respect_gitignore)
        .require_git(false)
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            !(is_dir
                && entry.depth() > 0
                && entry
                    .file_name()
                    .to_str()
                    .map(|name| ignore_dirs.contains(name))
                    .unwrap_or(false))
        })
        .build();

    let mut entries = Vec::new();
    let mut skipped_binary = 0usize;

    for entry_result in walker {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error reading file entry: {e}");
                continue;
            }
        };

        let path = entry.path();
        let Some(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }

        if !has_allowed_extension(path, &extensions) {
            continue;
        }
        if !should_include_file(path, config.max_file_bytes) {
            continue;
        }

        let Some(relative) = relative_path(root, path) else {
            warn!("Skipping {}: not under the codebase root", path.display());
            continue;
        };

        match read_text_file(path) {
            Ok(Some(content)) => {
                let token_count = token_counter.count(&content);
                entries.push(CorpusEntry {
                    path: relative,
                    content,
                    token_count,
                });
            }
            Ok(None) => {
                skipped_binary += 1;
                debug!("Skipping binary file: {}", path.display());
            }
            Err(e) => {
                warn!("Skipping unreadable file {}: {e}", path.display());
            }
        }
    }

    if skipped_binary > 0 {
        debug!("Skipped {skipped_binary} binary files");
    }

    let corpus = Corpus::from_entries(root, entries)?;
    info!("Collected {} code files", corpus.len());
    Ok(corpus)
}

fn has_allowed_extension(path: &Path, extensions: &HashSet<&str>) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.contains(ext))
        .unwrap_or(false)
}

/// Reject symlinks, non-regular files and oversized files
fn should_include_file(path: &Path, max_bytes: u64) -> bool {
    let metadata = match path.symlink_metadata() {
        Ok(m) => m,
        Err(_) => return false,
    };

    if metadata.is_symlink() {
        debug!("Excluding symlink: {}", path.display());
        return false;
    }

    if !metadata.is_file() {
        return false;
    }

    if metadata.len() > max_bytes {
        debug!(
            "Excluding large file: {} (size: {} bytes)",
            path.display(),
            metadata.len()
        );
        return false;
    }

    true
}

/// Read a file as text. `Ok(None)` means the file looks binary.
fn read_text_file(path: &Path) -> std::io::Result<Option<String>> {
    let mut file = std::fs::File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    if looks_binary(&bytes) {
        return Ok(None);
    }

    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}

/// A NUL byte near the start of the file marks it as binary
pub fn looks_binary(bytes: &[u8]) -> bool {
    let sniff = &bytes[..bytes.len().min(BINARY_SNIFF_BYTES)];
    sniff.contains(&0)
}

/// `/`-separated path of `path` relative to `root`
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::ApproximateTokenCounter;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, content).expect("write");
    }

    #[test]
    fn test_looks_binary() {
        assert!(looks_binary(b"\x89PNG\r\n\x1a\n\0\0"));
        assert!(!looks_binary(b"export const x = 1;\n"));
        assert!(!looks_binary(b""));
    }

    #[test]
    fn test_relative_path_uses_forward_slashes() {
        let root = Path::new("/repo");
        assert_eq!(
            relative_path(root, Path::new("/repo/packages/core/a.ts")),
            Some("packages/core/a.ts".to_string())
        );
        assert_eq!(relative_path(root, Path::new("/elsewhere/a.ts")), None);
    }

    #[test]
    fn test_load_corpus_filters_and_sorts() {
        let dir = TempDir::new().expect("tempdir");
        let root = dir.path();
        write(root, "src/b.ts", b"export const b = 2;");
        write(root, "src/a.ts", b"export const a = 1;");
        write(root, "README.md", b"# not indexed");
        write(root, "node_modules/dep/index.js", b"module.exports = {};");
        write(root, "src/logo.json", b"{\"a\":\0}");

        let corpus = load_corpus(root, &CorpusConfig::default(), &ApproximateTokenCounter)
            .expect("corpus loads");

        let paths: Vec<&str> = corpus.paths().collect();
        assert_eq!(paths, vec!["src/a.ts", "src/b.ts"]);
        assert!(corpus.contains("src/a.ts"));
        assert!(!corpus.contains("README.md"));
        assert_eq!(
            corpus.get("src/a.ts").map(|e| e.token_count),
            Some("export const a = 1;".len() / 4)
        );
    }

    #[test]
    fn test_load_corpus_missing_root() {
        let err = load_corpus(
            Path::new("/definitely/not/here"),
            &CorpusConfig::default(),
            &ApproximateTokenCounter,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Corpus(_)));
    }

    #[test]
    fn test_load_corpus_without_eligible_files() {
        let dir = TempDir::new().expect("tempdir");
        write(dir.path(), "notes.txt", b"plain text");

        let err = load_corpus(dir.path(), &CorpusConfig::default(), &ApproximateTokenCounter)
            .unwrap_err();
        assert!(matches!(err, Error::Corpus(_)));
        assert!(err.to_string().contains("no eligible files"));
    }

    #[test]
    fn test_load_corpus_respects_gitignore_when_enabled() {
        let dir = TempDir::new().expect("tempdir");
        let root = dir.path();
        write(root, ".gitignore", b"generated/\n");
        write(root, "generated/out.ts", b"export {}");
        write(root, "src/main.ts", b"export {}");

        let default_corpus =
            load_corpus(root, &CorpusConfig::default(), &ApproximateTokenCounter)
                .expect("corpus");
        assert!(default_corpus.contains("generated/out.ts"));

        let config = CorpusConfig {
            respect_gitignore: true,
            ..CorpusConfig::default()
        };
        let corpus = load_corpus(root, &config, &ApproximateTokenCounter).expect("corpus");
        assert!(!corpus.contains("generated/out.ts"));
        assert!(corpus.contains("src/main.ts"));
    }

    #[test]
    fn test_load_corpus_skips_large_files() {
        let dir = TempDir::new().expect("tempdir");
        write(dir.path(), "small.ts", b"export {}");
        write(dir.path(), "large.ts", &vec![b'x'; 2048]);

        let config = CorpusConfig {
            max_file_bytes: 1024,
            ..CorpusConfig::default()
        };
        let corpus = load_corpus(dir.path(), &config, &ApproximateTokenCounter).expect("corpus");
        assert!(corpus.contains("small.ts"));
        assert!(!corpus.contains("large.ts"));
    }

    #[test]
    fn test_from_entries_dedups_paths() {
        let entry = CorpusEntry {
            path: "a.ts".to_string(),
            content: String::new(),
            token_count: 0,
        };
        let corpus =
            Corpus::from_entries("/repo", vec![entry.clone(), entry]).expect("non-empty");
        assert_eq!(corpus.len(), 1);
    }
}
