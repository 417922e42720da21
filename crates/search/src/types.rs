use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Upper bound on `matched_entities + unresolved_paths`.
pub const MAX_RESULTS: usize = 500;

/// Shorter search strings are rejected.
pub const MIN_SEARCH_LEN: usize = 3;

/// A tracked asset: its GUID and logical path (`Assets/...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub guid: String,
    pub path: String,
}

impl EntityRef {
    pub fn new(guid: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    search_text: String,
    root_directories: Vec<PathBuf>,
    file_extensions: Vec<String>,
}

impl SearchRequest {
    /// Extensions are taken without the leading dot; duplicates and empty
    /// entries are dropped, first occurrence order kept.
    pub fn new(
        search_text: impl Into<String>,
        root_directories: Vec<PathBuf>,
        file_extensions: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Self {
        let mut exts: Vec<String> = Vec::new();
        for ext in file_extensions {
            let ext = ext.as_ref().trim().trim_start_matches('.');
            if !ext.is_empty() && !exts.iter().any(|e| e == ext) {
                exts.push(ext.to_string());
            }
        }

        Self {
            search_text: search_text.into(),
            root_directories,
            file_extensions: exts,
        }
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn root_directories(&self) -> &[PathBuf] {
        &self.root_directories
    }

    pub fn file_extensions(&self) -> &[String] {
        &self.file_extensions
    }

    /// One invocation per root x extension, roots outermost.
    pub fn invocations(&self) -> Vec<Invocation> {
        let mut out = Vec::with_capacity(self.root_directories.len() * self.file_extensions.len());
        for root in &self.root_directories {
            for ext in &self.file_extensions {
                out.push(Invocation {
                    index: out.len(),
                    root: root.clone(),
                    extension: ext.clone(),
                    search_text: self.search_text.clone(),
                });
            }
        }
        out
    }
}

/// One external search-process run scoped to a root and an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub index: usize,
    pub root: PathBuf,
    pub extension: String,
    pub search_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub search_text: String,
    pub target_entity: Option<EntityRef>,
    pub matched_entities: Vec<EntityRef>,
    pub unresolved_paths: Vec<String>,
    /// The cap was hit while unseen hits were still left in the output.
    #[serde(default)]
    pub truncated: bool,
    #[serde(default)]
    pub cancelled: bool,
    /// The search tool could not be run at all.
    #[serde(default)]
    pub search_unavailable: bool,
    #[serde(default)]
    pub failed_invocations: usize,
    #[serde(default)]
    pub elapsed_ms: u64,
}

impl SearchResult {
    pub fn new(search_text: impl Into<String>) -> Self {
        Self {
            search_text: search_text.into(),
            ..Self::default()
        }
    }

    pub fn total(&self) -> usize {
        self.matched_entities.len() + self.unresolved_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_are_deduplicated_without_dots() {
        let req = SearchRequest::new("abc", vec![], [".prefab", "prefab", "", "unity"]);
        assert_eq!(req.file_extensions(), &["prefab".to_string(), "unity".to_string()]);
    }

    #[test]
    fn invocations_follow_root_then_extension_order() {
        let req = SearchRequest::new(
            "abc",
            vec![PathBuf::from("/p/Assets"), PathBuf::from("/p/Packages")],
            ["prefab", "asset"],
        );
        let invs = req.invocations();
        let pairs: Vec<_> = invs
            .iter()
            .map(|i| (i.index, i.root.to_string_lossy().to_string(), i.extension.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (0, "/p/Assets".to_string(), "prefab"),
                (1, "/p/Assets".to_string(), "asset"),
                (2, "/p/Packages".to_string(), "prefab"),
                (3, "/p/Packages".to_string(), "asset"),
            ]
        );
    }
}
