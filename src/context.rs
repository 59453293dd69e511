//! Where the bot keeps its configuration and log file.
//!
//! Callers pass a `&dyn AppContext` to anything that touches the filesystem;
//! nothing reads directories from globals or the environment.
use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub trait AppContext: Send + Sync + std::fmt::Debug {
    fn get_data_dir(&self) -> Result<PathBuf>;
    fn get_config_dir(&self) -> Result<PathBuf>;

    fn get_config_file_path(&self) -> Result<PathBuf> {
        Ok(self.get_config_dir()?.join("config.toml"))
    }

    /// `None` when the data directory cannot be created; logging then stays on the terminal.
    fn get_log_file_path(&self) -> Option<PathBuf> {
        self.get_data_dir().ok().map(|p| p.join("jobcal.log"))
    }
}

/// Platform directories, or `<root>/data` and `<root>/config` under `--root`.
#[derive(Clone, Debug)]
pub struct StandardContext {
    root: Option<PathBuf>,
}

impl StandardContext {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    fn resolve(&self, subdir: &str, platform: fn(&ProjectDirs) -> &Path) -> Result<PathBuf> {
        let dir = match &self.root {
            Some(root) => root.join(subdir),
            None => ProjectDirs::from("com", "jobcal", "jobcal")
                .map(|dirs| platform(&dirs).to_path_buf())
                .ok_or_else(|| anyhow::anyhow!("No home directory to keep {} in", subdir))?,
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {} directory {}", subdir, dir.display()))?;
        Ok(dir)
    }
}

impl AppContext for StandardContext {
    fn get_data_dir(&self) -> Result<PathBuf> {
        self.resolve("data", ProjectDirs::data_dir)
    }

    fn get_config_dir(&self) -> Result<PathBuf> {
        self.resolve("config", ProjectDirs::config_dir)
    }
}
