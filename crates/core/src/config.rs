use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

pub use config::ConfigError;

pub const DEFAULT_MAX_RESULTS: usize = 500;
pub const DEFAULT_MIN_SEARCH_LEN: usize = 3;
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Root folders of a Unity project that hold text-serialized data.
pub const DEFAULT_SEARCH_ROOTS: &[&str] = &["Assets", "Packages", "ProjectSettings"];

/// Text-serialized asset types that can carry GUID references.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "prefab", "unity", "asset", "mat", "controller", "anim",
    "overrideController", "playable", "mask", "spriteatlas", "lighting",
    "shadergraph", "shadersubgraph", "vfx", "preset", "signal",
    "terrainlayer", "brush", "flare", "physicMaterial", "physicsMaterial2D",
    "renderTexture", "cubemap", "guiskin", "fontsettings", "mixer",
    "giparams", "asmdef", "asmref", "json",
];

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Unity project directory. Falls back to the current directory.
    #[serde(default)]
    pub project_root: Option<PathBuf>,

    pub search_roots: Vec<String>,

    pub extensions: Vec<String>,

    pub max_results: usize,

    pub min_search_len: usize,

    pub history_capacity: usize,

    /// Forces `grep` or `findstr` instead of the platform default.
    #[serde(default)]
    pub search_tool: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            project_root: None,
            search_roots: DEFAULT_SEARCH_ROOTS.iter().map(|s| s.to_string()).collect(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            max_results: DEFAULT_MAX_RESULTS,
            min_search_len: DEFAULT_MIN_SEARCH_LEN,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            search_tool: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // 1. Standard dotenv discovery from current dir
        if dotenvy::dotenv().is_err() {
            // 2. Fallback: the app root's .env
            let path = crate::path_utils::get_app_root().join(".env");
            if path.exists() {
                let _ = dotenvy::from_path(&path);
            }
        }

        let builder = Config::builder()
            .set_default("search_roots", DEFAULT_SEARCH_ROOTS.to_vec())?
            .set_default("extensions", DEFAULT_EXTENSIONS.to_vec())?
            .set_default("max_results", DEFAULT_MAX_RESULTS as u64)?
            .set_default("min_search_len", DEFAULT_MIN_SEARCH_LEN as u64)?
            .set_default("history_capacity", DEFAULT_HISTORY_CAPACITY as u64)?
            .add_source(File::with_name("assetref").required(false))
            .add_source(
                Environment::with_prefix("ASSETREF")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("search_roots")
                    .with_list_parse_key("extensions"),
            );

        builder.build()?.try_deserialize()
    }

    /// Project directory with `~` expanded, or the current directory.
    pub fn project_dir(&self) -> PathBuf {
        match &self.project_root {
            Some(p) => crate::path_utils::get_path(&p.to_string_lossy()),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Absolute search roots, in configured order.
    pub fn root_directories(&self) -> Vec<PathBuf> {
        let project = self.project_dir();
        self.search_roots.iter().map(|r| project.join(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_unity_roots() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.search_roots, vec!["Assets", "Packages", "ProjectSettings"]);
        assert_eq!(cfg.max_results, 500);
        assert_eq!(cfg.min_search_len, 3);
        assert!(cfg.extensions.iter().any(|e| e == "prefab"));
        assert!(!cfg.extensions.iter().any(|e| e == "meta"));
    }

    #[test]
    fn root_directories_are_joined_onto_project() {
        let cfg = AppConfig {
            project_root: Some(PathBuf::from("/proj")),
            ..AppConfig::default()
        };
        let roots = cfg.root_directories();
        assert_eq!(roots[0], PathBuf::from("/proj/Assets"));
        assert_eq!(roots[2], PathBuf::from("/proj/ProjectSettings"));
    }
}
