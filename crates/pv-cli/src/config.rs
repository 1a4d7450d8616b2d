//! Pipeline options from a TOML file, with command-line overrides.
//!
//! ```toml
//! [resolution]
//! preferred_vocabulary = "RXNORM"
//! curation_threshold = 199
//!
//! [signal]
//! roles = ["PS", "SS"]
//! min_cooccurrence = 3
//! ```

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use pv_model::{DrugRole, PipelineOptions};

/// Environment variable naming a config file used when `--config` is absent.
pub const CONFIG_ENV: &str = "PV_PIPELINE_CONFIG";

/// Explicit path first, then the environment variable. Blank values are ignored.
pub fn resolve_config_path(explicit: Option<&Path>, env_value: Option<OsString>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    env_value
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    resolve_config_path(explicit, std::env::var_os(CONFIG_ENV))
}

pub fn parse_options(text: &str) -> Result<PipelineOptions> {
    toml::from_str(text).context("parse pipeline config")
}

/// Options from the config file, or defaults when there is none.
pub fn load_options(explicit: Option<&Path>) -> Result<PipelineOptions> {
    let Some(path) = config_path(explicit) else {
        return Ok(PipelineOptions::default());
    };
    let text =
        fs::read_to_string(&path).with_context(|| format!("read config: {}", path.display()))?;
    let options =
        parse_options(&text).with_context(|| format!("load config: {}", path.display()))?;
    info!(path = %path.display(), "loaded pipeline config");
    Ok(options)
}

/// Command-line values that replace config-file values when present.
#[derive(Debug, Clone, Default)]
pub struct OptionOverrides {
    pub preferred_vocabulary: Option<String>,
    pub clinical_substance_vocabulary: Option<String>,
    pub curation_threshold: Option<usize>,
    pub max_clean_rounds: Option<usize>,
    pub roles: Vec<String>,
    pub periods: Vec<String>,
    pub min_cooccurrence: Option<i64>,
}

impl OptionOverrides {
    pub fn apply(self, options: &mut PipelineOptions) {
        let resolution = &mut options.resolution;
        if let Some(vocabulary) = self.preferred_vocabulary {
            resolution.preferred_vocabulary = vocabulary;
        }
        if let Some(vocabulary) = self.clinical_substance_vocabulary {
            resolution.clinical_substance_vocabulary = vocabulary;
        }
        if let Some(threshold) = self.curation_threshold {
            resolution.curation_threshold = threshold;
        }
        if let Some(rounds) = self.max_clean_rounds {
            resolution.max_clean_rounds = rounds;
        }

        let signal = &mut options.signal;
        if !self.roles.is_empty() {
            signal.roles = self.roles.iter().map(String::as_str).map(DrugRole::parse).collect();
        }
        if !self.periods.is_empty() {
            signal.periods = self.periods;
        }
        if let Some(min) = self.min_cooccurrence {
            signal.min_cooccurrence = min;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let options = parse_options(
            "[resolution]\ncuration_threshold = 50\n\n[signal]\nroles = [\"PS\"]\n",
        )
        .unwrap();
        assert_eq!(options.resolution.curation_threshold, 50);
        assert_eq!(options.resolution.preferred_vocabulary, "RXNORM");
        assert_eq!(options.resolution.max_clean_rounds, 5);
        assert_eq!(options.signal.roles, vec![DrugRole::PrimarySuspect]);
        assert_eq!(options.signal.min_cooccurrence, 1);
    }

    #[test]
    fn empty_config_is_default() {
        assert_eq!(parse_options("").unwrap(), PipelineOptions::default());
    }

    #[test]
    fn unknown_value_types_are_rejected() {
        assert!(parse_options("[resolution]\ncuration_threshold = \"many\"\n").is_err());
    }

    #[test]
    fn explicit_path_beats_environment() {
        let explicit = Path::new("run.toml");
        assert_eq!(
            resolve_config_path(Some(explicit), Some(OsString::from("env.toml"))),
            Some(PathBuf::from("run.toml"))
        );
        assert_eq!(
            resolve_config_path(None, Some(OsString::from("env.toml"))),
            Some(PathBuf::from("env.toml"))
        );
        assert_eq!(resolve_config_path(None, Some(OsString::new())), None);
        assert_eq!(resolve_config_path(None, None), None);
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut options = parse_options("[signal]\nmin_cooccurrence = 3\nperiods = [\"2019Q3\"]\n")
            .unwrap();
        OptionOverrides {
            curation_threshold: Some(10),
            roles: vec!["ss".to_string(), "PS".to_string()],
            min_cooccurrence: Some(5),
            ..OptionOverrides::default()
        }
        .apply(&mut options);
        assert_eq!(options.resolution.curation_threshold, 10);
        assert_eq!(
            options.signal.roles,
            vec![DrugRole::SecondarySuspect, DrugRole::PrimarySuspect]
        );
        assert_eq!(options.signal.periods, vec!["2019Q3".to_string()]);
        assert_eq!(options.signal.min_cooccurrence, 5);
    }
}
