use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

// ── Final (merged) config types ──

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub shell: ShellConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub exec: ExecConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShellConfig {
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Maximum nesting of `history <ref>` replays.
    #[serde(default = "default_replay_depth")]
    pub max_replay_depth: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            max_replay_depth: default_replay_depth(),
        }
    }
}

fn default_prompt() -> String {
    "%".into()
}

fn default_replay_depth() -> usize {
    32
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ParserConfig {
    #[serde(default)]
    pub quoting: Quoting,
}

/// How a raw line is split into words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Quoting {
    /// Space-delimited tokens; quote characters are stripped from words.
    #[default]
    Literal,
    /// POSIX word splitting via shlex; quotes group words.
    Posix,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ExecConfig {
    #[serde(default)]
    pub chain_policy: ChainPolicy,
    #[serde(default)]
    pub wait_policy: WaitPolicy,
}

/// Whether `&&` / `||` gate the pipeline that follows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ChainPolicy {
    /// Every pipeline runs; the operators are recorded but not enforced.
    #[default]
    Unconditional,
    /// `a && b` runs `b` only if `a` succeeded, `a || b` only if it failed.
    ShortCircuit,
}

/// When the engine blocks on the stages of a foreground pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WaitPolicy {
    /// Launch a stage and wait for it before launching the next one.
    /// Inter-stage data larger than the pipe buffer stalls the writer.
    #[default]
    PerStage,
    /// Launch every stage, then wait on all of them in order.
    AfterLaunch,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// Log file; empty means stderr.
    #[serde(default)]
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: String::new(),
        }
    }
}

fn default_level() -> String {
    "off".into()
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    shell: ShellOverlay,
    #[serde(default)]
    parser: ParserOverlay,
    #[serde(default)]
    exec: ExecOverlay,
    #[serde(default)]
    logging: LoggingOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct ShellOverlay {
    prompt: Option<String>,
    max_replay_depth: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct ParserOverlay {
    quoting: Option<Quoting>,
}

#[derive(Debug, Deserialize, Default)]
struct ExecOverlay {
    chain_policy: Option<ChainPolicy>,
    wait_policy: Option<WaitPolicy>,
}

#[derive(Debug, Deserialize, Default)]
struct LoggingOverlay {
    level: Option<String>,
    file: Option<String>,
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge the overlay at `path`, or ~/.config/pipesh/config.toml when
    ///    no path is given (if it exists)
    ///
    /// Scalars in the overlay override the defaults; omitted keys keep them.
    pub fn load(path: Option<&Path>) -> Self {
        let mut config = Self::default_config();
        let path = path.map(Path::to_path_buf).or_else(user_config_path);
        if let Some(overlay) = path.and_then(|p| Self::load_overlay(&p)) {
            config.apply_overlay(overlay);
        }
        config
    }

    /// Try to load an overlay file. Missing files are silently skipped.
    fn load_overlay(path: &Path) -> Option<ConfigOverlay> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                eprintln!("pipesh: config parse error in {}: {e}", path.display());
                None
            }
        }
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        let s = overlay.shell;
        if let Some(v) = s.prompt {
            self.shell.prompt = v;
        }
        if let Some(v) = s.max_replay_depth {
            self.shell.max_replay_depth = v;
        }

        if let Some(v) = overlay.parser.quoting {
            self.parser.quoting = v;
        }

        let e = overlay.exec;
        if let Some(v) = e.chain_policy {
            self.exec.chain_policy = v;
        }
        if let Some(v) = e.wait_policy {
            self.exec.wait_policy = v;
        }

        let l = overlay.logging;
        if let Some(v) = l.level {
            self.logging.level = v;
        }
        if let Some(v) = l.file {
            self.logging.file = v;
        }
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}

fn user_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(Path::new(&home).join(".config/pipesh/config.toml"))
}
