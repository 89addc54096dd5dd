use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use pagescribe_core::RunPolicy;
use pagescribe_engine::{EngineConfig, FetchSettings, NovelSite, PacingWindow};
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, Command};

/// Settings read from the RON file. Every field may be omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store_dir: PathBuf,
    pub output_dir: PathBuf,
    pub log_file: Option<PathBuf>,
    pub fetch: FetchSettings,
    pub site: NovelSite,
    pub novel_pacing: PacingWindow,
    pub url_pacing: PacingWindow,
    pub novel_policy: RunPolicy,
    pub url_policy: RunPolicy,
    pub use_chrome: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            store_dir: engine.store_dir,
            output_dir: engine.output_dir,
            log_file: None,
            fetch: engine.fetch,
            site: engine.site,
            novel_pacing: engine.novel_pacing,
            url_pacing: engine.url_pacing,
            novel_policy: engine.novel_policy,
            url_policy: engine.url_policy,
            use_chrome: engine.use_chrome,
        }
    }
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(ron::from_str(raw)?)
    }

    /// Command-line flags win over the file.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.store_dir {
            self.store_dir = dir.clone();
        }
        if let Some(dir) = &cli.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(file) = &cli.log_file {
            self.log_file = Some(file.clone());
        }
        if let Command::Urls {
            delay_min,
            delay_max,
            chrome,
            ..
        } = &cli.command
        {
            if let Some(secs) = delay_min {
                self.url_pacing.min = Duration::from_secs(*secs);
            }
            if let Some(secs) = delay_max {
                self.url_pacing.max = Duration::from_secs(*secs);
            }
            self.use_chrome |= *chrome;
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            fetch: self.fetch.clone(),
            site: self.site.clone(),
            novel_pacing: self.novel_pacing,
            url_pacing: self.url_pacing,
            novel_policy: self.novel_policy,
            url_policy: self.url_policy,
            store_dir: self.store_dir.clone(),
            output_dir: self.output_dir.clone(),
            use_chrome: self.use_chrome,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use clap::Parser;
    use pagescribe_core::{OnItemError, OnPolicySkip};

    use super::AppConfig;
    use crate::cli::Cli;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(AppConfig::parse("()").unwrap(), AppConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = AppConfig::parse(
            r#"(
                output_dir: "books",
                url_pacing: (min: 500, max: 1500),
                url_policy: (on_item_error: abort_run),
                fetch: (request_timeout: 5000),
            )"#,
        )
        .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("books"));
        assert_eq!(config.url_pacing.max, Duration::from_millis(1500));
        assert_eq!(config.url_policy.on_item_error, OnItemError::AbortRun);
        assert_eq!(config.url_policy.on_policy_skip, OnPolicySkip::ExcludeItem);
        assert_eq!(config.fetch.request_timeout, Duration::from_secs(5));
        assert_eq!(config.fetch.redirect_limit, 5);
        assert_eq!(config.site, AppConfig::default().site);
    }

    #[test]
    fn flags_override_the_file() {
        let cli = Cli::parse_from([
            "pagescribe",
            "--output-dir",
            "out2",
            "urls",
            "list.txt",
            "--delay-min",
            "2",
            "--delay-max",
            "5",
        ]);
        let mut config = AppConfig::default();
        config.apply_cli(&cli);

        let engine = config.engine_config();
        assert_eq!(engine.output_dir, PathBuf::from("out2"));
        assert_eq!(engine.url_pacing.min, Duration::from_secs(2));
        assert_eq!(engine.url_pacing.max, Duration::from_secs(5));
        assert_eq!(engine.novel_pacing, AppConfig::default().novel_pacing);
    }

    #[test]
    fn load_reports_the_path_on_bad_syntax() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagescribe.ron");
        std::fs::write(&path, "(output_dir: )").unwrap();
        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("pagescribe.ron"));
    }
}
