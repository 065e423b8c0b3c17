use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_dirs::AppDirs;
use crate::exam::Difficulty;
use crate::gateway::GenerationParams;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub subject: String,
    pub topic: Option<String>,
    pub difficulty: Difficulty,
    pub question_count: u32,
    pub duration_minutes: u32,
    pub request_timeout_secs: u64,
    pub practice_mode: bool,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            subject: "Physics".to_string(),
            topic: None,
            difficulty: Difficulty::Medium,
            question_count: 10,
            duration_minutes: 30,
            request_timeout_secs: 60,
            practice_mode: false,
            log_level: "info".to_string(),
        }
    }
}

/// Values given on the command line; `None` keeps what the file says.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub api_base_url: Option<String>,
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub question_count: Option<u32>,
    pub duration_minutes: Option<u32>,
    pub request_timeout_secs: Option<u64>,
    pub practice_mode: bool,
}

impl Config {
    pub fn merged(mut self, overrides: &Overrides) -> Self {
        if let Some(url) = &overrides.api_base_url {
            self.api_base_url = url.clone();
        }
        if let Some(subject) = &overrides.subject {
            self.subject = subject.clone();
        }
        if let Some(topic) = &overrides.topic {
            self.topic = Some(topic.clone());
        }
        if let Some(difficulty) = overrides.difficulty {
            self.difficulty = difficulty;
        }
        if let Some(n) = overrides.question_count {
            self.question_count = n;
        }
        if let Some(m) = overrides.duration_minutes {
            self.duration_minutes = m;
        }
        if let Some(secs) = overrides.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        self.practice_mode |= overrides.practice_mode;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Starting values for the setup form.
    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            subject: self.subject.clone(),
            difficulty: self.difficulty,
            topic: self.topic.clone(),
            question_count: self.question_count,
            duration_minutes: self.duration_minutes,
        }
    }

    /// Remember the last form values so the next run starts from them.
    pub fn remember(&mut self, params: &GenerationParams) {
        self.subject = params.subject.clone();
        self.topic = params.topic.clone();
        self.difficulty = params.difficulty;
        self.question_count = params.question_count;
        self.duration_minutes = params.duration_minutes;
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("mocktest_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Config::default(),
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
