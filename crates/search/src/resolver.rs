//! Mapping hit paths to tracked assets.

use crate::error::SearchError;
use crate::types::EntityRef;
use assetref_core::path_utils::to_logical_path;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Lookup from a logical project path to a tracked asset.
///
/// Implementations must be pure lookups; they are called once per hit while
/// results are aggregated.
pub trait EntityResolver: Send + Sync {
    fn resolve(&self, path: &str, line: u32) -> Option<EntityRef>;

    /// Asset identified by the search text itself (usually a GUID).
    fn resolve_identifier(&self, _text: &str) -> Option<EntityRef> {
        None
    }
}

/// In-memory path and GUID table.
#[derive(Debug, Clone, Default)]
pub struct MapResolver {
    by_path: HashMap<String, EntityRef>,
    by_guid: HashMap<String, EntityRef>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: EntityRef) {
        self.by_guid.insert(entity.guid.clone(), entity.clone());
        self.by_path.insert(entity.path.clone(), entity);
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    pub fn get_by_guid(&self, guid: &str) -> Option<&EntityRef> {
        self.by_guid.get(guid)
    }
}

impl FromIterator<EntityRef> for MapResolver {
    fn from_iter<I: IntoIterator<Item = EntityRef>>(iter: I) -> Self {
        let mut map = MapResolver::new();
        for entity in iter {
            map.insert(entity);
        }
        map
    }
}

impl EntityResolver for MapResolver {
    fn resolve(&self, path: &str, _line: u32) -> Option<EntityRef> {
        self.by_path.get(path).cloned()
    }

    fn resolve_identifier(&self, text: &str) -> Option<EntityRef> {
        self.by_guid.get(text.trim()).cloned()
    }
}

/// Asset table built from the `.meta` files under the search roots.
#[derive(Debug, Clone, Default)]
pub struct AssetIndex {
    assets: MapResolver,
}

impl AssetIndex {
    /// Walks every existing root; missing roots and unreadable `.meta`
    /// files are skipped.
    pub fn build(roots: &[PathBuf]) -> Self {
        let mut assets = MapResolver::new();

        for root in roots {
            if !root.is_dir() {
                debug!("Skipping missing root {}", root.display());
                continue;
            }

            for entry in WalkDir::new(root)
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
                .filter_map(|e| e.ok())
            {
                let path = entry.path();
                if !entry.file_type().is_file() || path.extension().is_none_or(|e| e != "meta") {
                    continue;
                }

                let content = match std::fs::read_to_string(path) {
                    Ok(c) => c,
                    Err(e) => {
                        warn!("Skipping unreadable {}: {}", path.display(), e);
                        continue;
                    }
                };
                let Some(guid) = parse_meta_guid(&content) else {
                    continue;
                };

                let asset_path = path.with_extension("");
                let logical = to_logical_path(&asset_path.to_string_lossy(), roots);
                assets.insert(EntityRef::new(guid, logical));
            }
        }

        info!("📇 Indexed {} assets", assets.len());
        Self { assets }
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn get_by_guid(&self, guid: &str) -> Option<&EntityRef> {
        self.assets.get_by_guid(guid)
    }
}

impl EntityResolver for AssetIndex {
    fn resolve(&self, path: &str, line: u32) -> Option<EntityRef> {
        // A hit inside a .meta file belongs to the asset it describes.
        let path = path.strip_suffix(".meta").unwrap_or(path);
        self.assets.resolve(path, line)
    }

    fn resolve_identifier(&self, text: &str) -> Option<EntityRef> {
        self.assets.resolve_identifier(text)
    }
}

// Unity skips dot-prefixed and `~`-suffixed folders on import.
fn is_hidden(name: &std::ffi::OsStr) -> bool {
    let name = name.to_string_lossy();
    name.starts_with('.') || name.ends_with('~')
}

/// `guid:` value of a `.meta` file's content.
pub fn parse_meta_guid(content: &str) -> Option<String> {
    content
        .lines()
        .find_map(|line| line.trim().strip_prefix("guid:"))
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
}

/// Reads the GUID of an asset from `<asset>.meta`. A `.meta` path is read
/// directly.
pub fn read_meta_guid(asset: &Path) -> Result<Option<String>, SearchError> {
    let meta = if asset.extension().is_some_and(|e| e == "meta") {
        asset.to_path_buf()
    } else {
        let mut os = asset.as_os_str().to_os_string();
        os.push(".meta");
        PathBuf::from(os)
    };

    if !meta.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&meta)?;
    Ok(parse_meta_guid(&content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_asset(dir: &Path, rel: &str, guid: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "%YAML 1.1\n").unwrap();
        fs::write(
            format!("{}.meta", path.display()),
            format!("fileFormatVersion: 2\nguid: {}\nNativeFormatImporter:\n", guid),
        )
        .unwrap();
    }

    #[test]
    fn parse_meta_guid_reads_guid_line() {
        let meta = "fileFormatVersion: 2\nguid: 0123456789abcdef0123456789abcdef\n";
        assert_eq!(parse_meta_guid(meta).as_deref(), Some("0123456789abcdef0123456789abcdef"));
        assert_eq!(parse_meta_guid("fileFormatVersion: 2\n"), None);
        assert_eq!(parse_meta_guid("guid:   \n"), None);
    }

    #[test]
    fn index_maps_logical_paths_and_guids() {
        let tmp = TempDir::new().unwrap();
        write_asset(tmp.path(), "Assets/ui/a.prefab", "aaa111");
        write_asset(tmp.path(), "Assets/b.mat", "bbb222");
        write_asset(tmp.path(), "Assets/.hidden/c.prefab", "ccc333");
        write_asset(tmp.path(), "Assets/Old~/d.prefab", "ddd444");

        let roots = vec![tmp.path().join("Assets"), tmp.path().join("Packages")];
        let index = AssetIndex::build(&roots);

        assert_eq!(index.len(), 2);
        assert_eq!(
            index.resolve("Assets/ui/a.prefab", 1),
            Some(EntityRef::new("aaa111", "Assets/ui/a.prefab"))
        );
        assert_eq!(
            index.resolve("Assets/b.mat.meta", 2).map(|e| e.guid),
            Some("bbb222".to_string())
        );
        assert_eq!(index.resolve_identifier("bbb222").map(|e| e.path), Some("Assets/b.mat".to_string()));
        assert!(index.resolve("Assets/.hidden/c.prefab", 1).is_none());
        assert!(index.get_by_guid("ddd444").is_none());
    }

    #[test]
    fn read_meta_guid_accepts_asset_or_meta_path() {
        let tmp = TempDir::new().unwrap();
        write_asset(tmp.path(), "Assets/tex.png", "feedbeef");

        let asset = tmp.path().join("Assets/tex.png");
        assert_eq!(read_meta_guid(&asset).unwrap().as_deref(), Some("feedbeef"));
        let meta = tmp.path().join("Assets/tex.png.meta");
        assert_eq!(read_meta_guid(&meta).unwrap().as_deref(), Some("feedbeef"));
        assert_eq!(read_meta_guid(&tmp.path().join("Assets/none.png")).unwrap(), None);
    }

    #[test]
    fn map_resolver_from_iter() {
        let map: MapResolver = vec![EntityRef::new("g1", "Assets/a.prefab")].into_iter().collect();
        assert_eq!(map.resolve("Assets/a.prefab", 3).map(|e| e.guid), Some("g1".to_string()));
        assert!(map.resolve("Assets/b.prefab", 3).is_none());
        assert!(map.resolve_identifier(" g1 ").is_some());
    }

    #[test]
    fn unreadable_meta_is_skipped() {
        let tmp = TempDir::new().unwrap();
        write_asset(tmp.path(), "Assets/good.prefab", "good0001");
        fs::write(tmp.path().join("Assets/bad.prefab"), "%YAML 1.1\n").unwrap();
        fs::write(tmp.path().join("Assets/bad.prefab.meta"), b"guid: \xff\xfe\n").unwrap();

        let index = AssetIndex::build(&[tmp.path().join("Assets")]);

        assert_eq!(index.len(), 1);
        assert!(index.resolve("Assets/good.prefab", 1).is_some());
        assert!(index.resolve("Assets/bad.prefab", 1).is_none());
    }
}
