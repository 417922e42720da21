//! Path utilities for AssetRef
//!
//! Handles tilde expansion, separator normalization and the mapping from
//! filesystem paths to Unity's project-relative asset paths.

use std::path::{Path, PathBuf};

/// Expands a leading tilde (~) to the user's home directory.
/// "~/.assetref" -> "/home/me/.assetref", "/tmp/foo" -> "/tmp/foo"
pub fn expand_tilde(path: &str) -> String {
    if path == "~" {
        return home_dir();
    }
    match path.strip_prefix("~/") {
        Some(rest) => format!("{}/{}", home_dir(), rest),
        None => path.to_string(),
    }
}

fn home_dir() -> String {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string())
}

/// Helper to convert a potentially tilde-containing string into a PathBuf.
pub fn get_path(path: &str) -> PathBuf {
    PathBuf::from(expand_tilde(path))
}

/// Resolves the AssetRef app root from ASSETREF_ROOT.
/// Handles absolute paths, tilde expansion, and bare names under $HOME.
pub fn get_app_root() -> PathBuf {
    let root_name = std::env::var("ASSETREF_ROOT").unwrap_or_else(|_| ".assetref".to_string());

    if Path::new(&root_name).is_absolute() {
        PathBuf::from(root_name)
    } else if root_name.starts_with('~') {
        get_path(&root_name)
    } else {
        PathBuf::from(home_dir()).join(root_name)
    }
}

/// Ensures a path is absolute, resolving tilde and relative to `base`.
pub fn ensure_absolute(path: &str, base: &Path) -> PathBuf {
    let p = get_path(path);
    if p.is_absolute() { p } else { base.join(p) }
}

/// Canonical separator form: forward slashes only.
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Rewrites an absolute hit path into Unity's logical form, e.g.
/// `/proj/Assets/ui/a.prefab` -> `Assets/ui/a.prefab`.
///
/// The first root that prefixes the path wins; the root's parent directory is
/// stripped. Paths outside every root are cut at the first `/<RootName>/`
/// segment, or returned normalized but otherwise unchanged.
pub fn to_logical_path(path: &str, roots: &[PathBuf]) -> String {
    let normalized = normalize_separators(path);

    for root in roots {
        let root_str = normalize_separators(&root.to_string_lossy());
        let root_str = root_str.trim_end_matches('/');
        if root_str.is_empty() {
            continue;
        }
        let Some(rest) = normalized.strip_prefix(root_str) else {
            continue;
        };
        if !(rest.is_empty() || rest.starts_with('/')) {
            continue;
        }
        let parent_len = root_str.rfind('/').map(|i| i + 1).unwrap_or(0);
        return normalized[parent_len..].to_string();
    }

    for root in roots {
        let Some(name) = root.file_name().map(|n| n.to_string_lossy().to_string()) else {
            continue;
        };
        if normalized.starts_with(&format!("{}/", name)) {
            return normalized;
        }
        if let Some(idx) = normalized.find(&format!("/{}/", name)) {
            return normalized[idx + 1..].to_string();
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roots() -> Vec<PathBuf> {
        vec![
            PathBuf::from("/root/Assets"),
            PathBuf::from("/root/Packages"),
            PathBuf::from("/root/ProjectSettings"),
        ]
    }

    #[test]
    fn strips_project_prefix() {
        assert_eq!(to_logical_path("/root/Assets/foo.prefab", &roots()), "Assets/foo.prefab");
        assert_eq!(
            to_logical_path("/root/ProjectSettings/TagManager.asset", &roots()),
            "ProjectSettings/TagManager.asset"
        );
    }

    #[test]
    fn does_not_match_sibling_with_shared_prefix() {
        // "/root/AssetsBackup" must not be treated as inside "/root/Assets"
        assert_eq!(
            to_logical_path("/root/AssetsBackup/x.prefab", &roots()),
            "/root/AssetsBackup/x.prefab"
        );
    }

    #[test]
    fn windows_separators_are_normalized() {
        let roots = vec![PathBuf::from("C:\\proj\\Assets")];
        assert_eq!(to_logical_path("C:\\proj\\Assets\\ui\\a.prefab", &roots), "Assets/ui/a.prefab");
    }

    #[test]
    fn falls_back_to_root_name_segment() {
        assert_eq!(
            to_logical_path("/mnt/other/Packages/com.x/a.asset", &roots()),
            "Packages/com.x/a.asset"
        );
    }

    #[test]
    fn tilde_expansion() {
        assert_eq!(expand_tilde("/tmp/foo"), "/tmp/foo");
        assert!(!expand_tilde("~/x").starts_with('~'));
    }
}
