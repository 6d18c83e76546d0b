//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "writers-roundtable";
const PROJECT_FILES: [&str; 2] = ["roundtable.toml", ".roundtable.toml"];
const ENV_PREFIX: &str = "ROUNDTABLE_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources, later sources winning
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(
            Self::global_config_path().as_deref(),
            Self::project_config_path().as_deref(),
            config_path.map(PathBuf::as_path),
        )
        .extract()
        .map_err(Box::new)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    fn figment(global: Option<&Path>, project: Option<&Path>, explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        for path in [global, project].into_iter().flatten() {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }
        // An explicit path that does not exist is an error, not a silent skip
        if let Some(path) = explicit {
            figment = figment.merge(Toml::file_exact(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Global config file path: `<config dir>/writers-roundtable/config.toml`
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// The project-level config file, if one exists in the working directory
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for --show-config)
    pub fn print_config_sources(explicit: Option<&PathBuf>) {
        println!("Configuration sources (highest priority first):");
        println!("  [ENV  ] {}* (nested keys joined with __)", ENV_PREFIX);

        if let Some(path) = explicit {
            let mark = if path.exists() { "FOUND" } else { "MISSING" };
            println!("  [{:<5}] Explicit: {}", mark, path.display());
        }

        match Self::project_config_path() {
            Some(path) => println!("  [FOUND] Project: {}", path.display()),
            None => println!("  [     ] Project: ./{} or ./{}", PROJECT_FILES[0], PROJECT_FILES[1]),
        }

        if let Some(path) = Self::global_config_path() {
            let mark = if path.exists() { "FOUND" } else { "     " };
            println!("  [{}] Global:  {}", mark, path.display());
        }

        println!("  [     ] Default: built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::file_config::{GatewayProvider, PersistenceBackend};
    use std::fs;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.discussion.max_rounds, 5);
        assert_eq!(config.discussion.participants.len(), 2);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains(APP_DIR));
    }

    #[test]
    fn test_later_files_override_earlier() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let project = dir.path().join("project.toml");
        fs::write(
            &global,
            "[discussion]\nmax_rounds = 9\ncontext_window = 4\n\n[gateway]\nprovider = \"scripted\"\n",
        )
        .unwrap();
        fs::write(&project, "[discussion]\nmax_rounds = 2\n").unwrap();

        let config: FileConfig = ConfigLoader::figment(Some(&global), Some(&project), None)
            .extract()
            .unwrap();
        assert_eq!(config.discussion.max_rounds, 2);
        assert_eq!(config.discussion.context_window, 4);
        assert_eq!(config.gateway.provider, GatewayProvider::Scripted);
    }

    #[test]
    fn test_explicit_file_wins_and_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("explicit.toml");
        fs::write(&explicit, "[persistence]\nbackend = \"jsonl\"\n").unwrap();

        let config: FileConfig = ConfigLoader::figment(None, None, Some(&explicit))
            .extract()
            .unwrap();
        assert_eq!(config.persistence.backend, PersistenceBackend::Jsonl);

        let missing = dir.path().join("missing.toml");
        let result = ConfigLoader::figment(None, None, Some(&missing)).extract::<FileConfig>();
        assert!(result.is_err());
    }

    #[test]
    fn test_environment_overrides_files() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("roundtable.toml", "[scheduler]\nturn_timeout_secs = 30\n")?;
            jail.set_env("ROUNDTABLE_SCHEDULER__TURN_TIMEOUT_SECS", "5");
            jail.set_env("ROUNDTABLE_GATEWAY__MODEL", "local-model");

            let config: FileConfig =
                ConfigLoader::figment(None, Some(Path::new("roundtable.toml")), None).extract()?;
            assert_eq!(config.scheduler.turn_timeout_secs, 5);
            assert_eq!(config.gateway.model, "local-model");
            Ok(())
        });
    }
}
