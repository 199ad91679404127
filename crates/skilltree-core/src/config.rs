use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::Level;

/// Name of the per-project state directory.
pub const PROJECT_DIR: &str = ".skilltree";

/// Paths of the files inside a project's `.skilltree/` directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    dir: PathBuf,
}

impl ProjectPaths {
    /// Paths for the project rooted at `root`.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            dir: root.join(PROJECT_DIR),
        }
    }

    /// Walk up from `start` to the nearest directory containing `.skilltree/`.
    #[must_use]
    pub fn discover(start: &Path) -> Option<Self> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(PROJECT_DIR);
            if candidate.is_dir() {
                return Some(Self { dir: candidate });
            }
            if !current.pop() {
                return None;
            }
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn snapshot(&self) -> PathBuf {
        self.dir.join("skills.json")
    }

    #[must_use]
    pub fn lock(&self) -> PathBuf {
        self.dir.join("lock")
    }

    #[must_use]
    pub fn config(&self) -> PathBuf {
        self.dir.join("config.toml")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub lock: LockConfig,
    #[serde(default)]
    pub skills: SkillsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// How long a command waits for another `sk` process to release the lock.
    #[serde(default = "default_lock_timeout_ms")]
    pub timeout_ms: u64,
}

impl LockConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_lock_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillsConfig {
    /// Level given to new skills when `sk add` is not passed `--level`.
    #[serde(default)]
    pub default_level: Level,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

/// Load `.skilltree/config.toml`, falling back to defaults when it is absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(paths: &ProjectPaths) -> Result<ProjectConfig> {
    let path = paths.config();
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load the per-user config from the platform config directory.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    load_user_config_from(&config_dir.join("skilltree/config.toml"))
}

fn load_user_config_from(path: &Path) -> Result<UserConfig> {
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Pick the output mode name: CLI flag, then `FORMAT` env, then user config,
/// then TTY detection.
#[must_use]
pub fn resolve_output(
    cli_format: Option<&str>,
    env_format: Option<&str>,
    user_output: Option<&str>,
) -> &'static str {
    let chosen = [cli_format, env_format, user_output]
        .into_iter()
        .flatten()
        .find_map(normalize_output_mode);
    if let Some(mode) = chosen {
        return mode;
    }

    if std::io::stdout().is_terminal() {
        "pretty"
    } else {
        "text"
    }
}

/// Pick the active user: `--user`, then `SKILLTREE_USER`, then user config.
/// Blank values are skipped.
#[must_use]
pub fn resolve_user(
    cli_user: Option<&str>,
    env_user: Option<&str>,
    config_user: Option<&str>,
) -> Option<String> {
    [cli_user, env_user, config_user]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|user| !user.is_empty())
        .map(ToString::to_string)
}

fn normalize_output_mode(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pretty" | "human" => Some("pretty"),
        "text" | "table" => Some("text"),
        "json" => Some("json"),
        _ => None,
    }
}

const fn default_lock_timeout_ms() -> u64 {
    5_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project() -> (TempDir, ProjectPaths) {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = ProjectPaths::new(dir.path());
        std::fs::create_dir_all(paths.dir()).expect("create .skilltree");
        (dir, paths)
    }

    #[test]
    fn missing_project_config_uses_defaults() {
        let (_dir, paths) = project();
        let cfg = load_project_config(&paths).expect("load should succeed");
        assert_eq!(cfg.lock.timeout_ms, 5_000);
        assert_eq!(cfg.lock.timeout(), Duration::from_secs(5));
        assert_eq!(cfg.skills.default_level, Level::Beginner);
    }

    #[test]
    fn project_config_parses_sections() {
        let (_dir, paths) = project();
        std::fs::write(
            paths.config(),
            "[lock]\ntimeout_ms = 250\n\n[skills]\ndefault_level = \"Advanced\"\n",
        )
        .expect("write config");

        let cfg = load_project_config(&paths).expect("load");
        assert_eq!(cfg.lock.timeout_ms, 250);
        assert_eq!(cfg.skills.default_level, Level::Advanced);
    }

    #[test]
    fn partial_project_config_keeps_other_defaults() {
        let (_dir, paths) = project();
        std::fs::write(paths.config(), "[skills]\ndefault_level = \"Intermediate\"\n")
            .expect("write config");

        let cfg = load_project_config(&paths).expect("load");
        assert_eq!(cfg.lock.timeout_ms, 5_000);
        assert_eq!(cfg.skills.default_level, Level::Intermediate);
    }

    #[test]
    fn malformed_project_config_is_an_error() {
        let (_dir, paths) = project();
        std::fs::write(paths.config(), "[lock\ntimeout_ms = ").expect("write config");

        let err = load_project_config(&paths).expect_err("should fail");
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn user_config_parses_output_and_user() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "output = \"json\"\nuser = \"alice\"\n").expect("write");

        let cfg = load_user_config_from(&path).expect("load");
        assert_eq!(cfg.output.as_deref(), Some("json"));
        assert_eq!(cfg.user.as_deref(), Some("alice"));
    }

    #[test]
    fn missing_user_config_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_user_config_from(&dir.path().join("absent.toml")).expect("load");
        assert!(cfg.output.is_none());
        assert!(cfg.user.is_none());
    }

    #[test]
    fn cli_format_overrides_env_and_config() {
        assert_eq!(resolve_output(Some("json"), Some("text"), Some("pretty")), "json");
    }

    #[test]
    fn env_overrides_user_config() {
        assert_eq!(resolve_output(None, Some("text"), Some("json")), "text");
    }

    #[test]
    fn unknown_values_fall_through() {
        assert_eq!(resolve_output(Some("yaml"), None, Some("json")), "json");
    }

    #[test]
    fn legacy_aliases_are_normalized() {
        assert_eq!(resolve_output(None, Some("human"), None), "pretty");
        assert_eq!(resolve_output(None, None, Some("TABLE")), "text");
    }

    #[test]
    fn user_precedence_skips_blank_values() {
        assert_eq!(
            resolve_user(Some("cli"), Some("env"), Some("cfg")),
            Some("cli".to_string())
        );
        assert_eq!(
            resolve_user(Some("  "), Some("env"), Some("cfg")),
            Some("env".to_string())
        );
        assert_eq!(resolve_user(None, None, Some(" cfg ")), Some("cfg".to_string()));
        assert_eq!(resolve_user(None, None, None), None);
    }

    #[test]
    fn discover_walks_up_to_project_dir() {
        let (dir, paths) = project();
        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).expect("nested");

        let found = ProjectPaths::discover(&nested).expect("found");
        assert_eq!(found, paths);
        assert_eq!(found.snapshot(), dir.path().join(".skilltree/skills.json"));
        assert_eq!(found.lock(), dir.path().join(".skilltree/lock"));
    }

    #[test]
    fn discover_without_project_dir_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(ProjectPaths::discover(dir.path()).is_none());
    }
}
