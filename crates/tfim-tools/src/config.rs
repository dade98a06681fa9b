//! Tool configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! usable configuration.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tfim_conv::{DeltaRule, Growth, Tolerance};
use tfim_core::{ErrorInfo, TfimError};
use tfim_solve::{IdmrgSettings, LanczosOptions};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "TFIM_CONFIG";

/// External iDMRG engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdmrgConfig {
    /// Command line of the engine; the first entry is the program.
    #[serde(default = "IdmrgConfig::default_command")]
    pub command: Vec<String>,
    /// Settings forwarded with every request.
    #[serde(flatten)]
    pub settings: IdmrgSettings,
}

impl IdmrgConfig {
    fn default_command() -> Vec<String> {
        vec!["python3".to_string(), "bridges/tenpy_idmrg.py".to_string()]
    }
}

impl Default for IdmrgConfig {
    fn default() -> Self {
        Self {
            command: Self::default_command(),
            settings: IdmrgSettings::default(),
        }
    }
}

/// Defaults for adaptive refinement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RefineConfig {
    /// Growth rule between attempts.
    #[serde(default)]
    pub growth: Growth,
    /// Convergence threshold.
    #[serde(default = "RefineConfig::default_threshold")]
    pub threshold: f64,
    /// Delta measure.
    #[serde(default)]
    pub rule: DeltaRule,
    /// Call ceiling.
    #[serde(default = "RefineConfig::default_max_calls")]
    pub max_calls: u32,
    /// First value; the default schedule decides when unset.
    #[serde(default)]
    pub start: Option<u32>,
}

impl RefineConfig {
    const fn default_threshold() -> f64 {
        1e-5
    }

    const fn default_max_calls() -> u32 {
        6
    }

    /// Tolerance described by this section.
    pub fn tolerance(&self) -> Tolerance {
        Tolerance {
            threshold: self.threshold,
            rule: self.rule,
        }
    }
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            growth: Growth::default(),
            threshold: Self::default_threshold(),
            rule: DeltaRule::default(),
            max_calls: Self::default_max_calls(),
            start: None,
        }
    }
}

/// Output locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving figures.
    #[serde(default = "OutputConfig::default_plot_dir")]
    pub plot_dir: PathBuf,
}

impl OutputConfig {
    fn default_plot_dir() -> PathBuf {
        PathBuf::from("plots")
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            plot_dir: Self::default_plot_dir(),
        }
    }
}

/// Complete tool configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ToolConfig {
    /// `[idmrg]` section.
    #[serde(default)]
    pub idmrg: IdmrgConfig,
    /// `[refine]` section.
    #[serde(default)]
    pub refine: RefineConfig,
    /// `[lanczos]` section.
    #[serde(default)]
    pub lanczos: LanczosOptions,
    /// `[output]` section.
    #[serde(default)]
    pub output: OutputConfig,
}

impl ToolConfig {
    /// Parses TOML text and validates it.
    pub fn from_toml_str(text: &str) -> Result<Self, TfimError> {
        let config: Self = toml::from_str(text).map_err(|err| {
            TfimError::Config(ErrorInfo::new("config.parse", err.to_string()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self, TfimError> {
        let text = fs::read_to_string(path).map_err(|err| {
            TfimError::Io(
                ErrorInfo::new("config.read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_toml_str(&text).map_err(|err| match err {
            TfimError::Config(info) => {
                TfimError::Config(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })
    }

    /// Loads the explicit path if given, else the file named by
    /// `TFIM_CONFIG`, else the defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, TfimError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::load(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    /// Rejects empty engine commands and unusable refinement defaults.
    pub fn validate(&self) -> Result<(), TfimError> {
        if self
            .idmrg
            .command
            .first()
            .map_or(true, |program| program.trim().is_empty())
        {
            return Err(TfimError::Config(
                ErrorInfo::new("config.idmrg_command", "idmrg.command must name a program")
                    .with_hint("e.g. command = [\"python3\", \"bridges/tenpy_idmrg.py\"]"),
            ));
        }
        let as_config = |err: TfimError| TfimError::Config(err.info().clone());
        self.refine.tolerance().validate().map_err(as_config)?;
        self.refine.growth.validate().map_err(as_config)?;
        if self.refine.max_calls == 0 || self.refine.start == Some(0) {
            return Err(TfimError::Config(
                ErrorInfo::new("config.refine", "max_calls and start must be at least 1")
                    .with_context("max_calls", self.refine.max_calls.to_string()),
            ));
        }
        if !(self.lanczos.tolerance.is_finite() && self.lanczos.tolerance > 0.0)
            || self.lanczos.max_iterations == 0
        {
            return Err(TfimError::Config(ErrorInfo::new(
                "config.lanczos",
                "lanczos tolerance and max_iterations must be positive",
            )));
        }
        Ok(())
    }
}
