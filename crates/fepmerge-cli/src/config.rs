use crate::cli::{MappingArgs, PolicyFlags};
use crate::error::{CliError, Result};
use fepmerge::core::io::mapping::parse_prematch;
use fepmerge::engine::config as core_config;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialMappingConfig {
    mapping_file: Option<PathBuf>,
    prematch: Option<String>,
    timeout_seconds: Option<f64>,
    max_candidates: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialMergeSection {
    allow_ring_breaking: Option<bool>,
    allow_ring_size_change: Option<bool>,
    molecule0: Option<usize>,
    molecule1: Option<usize>,
}

/// The TOML configuration file, every field optional.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialMergeConfig {
    mapping: Option<PartialMappingConfig>,
    merge: Option<PartialMergeSection>,
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

impl PartialMergeConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Reads the config file if one was given, otherwise starts empty.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Resolves the final configuration.
    ///
    /// Precedence, highest first: command-line flags, `-S key=value`
    /// overrides, the config file, built-in defaults.
    pub fn merge_with_cli(
        mut self,
        args: &MappingArgs,
        flags: PolicyFlags,
    ) -> Result<core_config::MergeConfig> {
        self.apply_set_values(&args.set_values)?;
        let mapping = self.mapping.take().unwrap_or_default();
        let merge = self.merge.take().unwrap_or_default();

        let mut builder = core_config::MergeConfigBuilder::new();

        if let Some(path) = args.mapping.clone().or(mapping.mapping_file) {
            builder = builder.mapping_file(path);
        }
        if let Some(text) = args.prematch.as_ref().or(mapping.prematch.as_ref()) {
            let prematch = parse_prematch(text).map_err(|source| CliError::Prematch {
                text: text.clone(),
                source,
            })?;
            builder = builder.prematch(prematch);
        }
        if let Some(seconds) = args.timeout.or(mapping.timeout_seconds) {
            let timeout = Duration::try_from_secs_f64(seconds)
                .map_err(|_| CliError::Timeout { seconds })?;
            builder = builder.timeout(timeout);
        }
        if let Some(n) = mapping.max_candidates {
            builder = builder.max_candidates(n);
        }
        if let Some(index) = args.molecule0.or(merge.molecule0) {
            builder = builder.molecule0(index);
        }
        if let Some(index) = args.molecule1.or(merge.molecule1) {
            builder = builder.molecule1(index);
        }

        let policy = core_config::MergePolicy {
            allow_ring_breaking: flags.allow_ring_breaking
                || merge.allow_ring_breaking.unwrap_or(false),
            allow_ring_size_change: flags.allow_ring_size_change
                || merge.allow_ring_size_change.unwrap_or(false),
        };

        builder
            .policy(policy)
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                ))
            })?;

            match key {
                "mapping.mapping-file" => {
                    self.mapping.get_or_insert_with(Default::default).mapping_file =
                        Some(PathBuf::from(value));
                }
                "mapping.prematch" => {
                    self.mapping.get_or_insert_with(Default::default).prematch = Some(value.to_string());
                }
                "mapping.timeout-seconds" => {
                    self.mapping.get_or_insert_with(Default::default).timeout_seconds =
                        Some(parse_value(key, value, "float")?);
                }
                "mapping.max-candidates" => {
                    self.mapping.get_or_insert_with(Default::default).max_candidates =
                        Some(parse_value(key, value, "integer")?);
                }
                "merge.allow-ring-breaking" => {
                    self.merge.get_or_insert_with(Default::default).allow_ring_breaking =
                        Some(parse_value(key, value, "boolean")?);
                }
                "merge.allow-ring-size-change" => {
                    self.merge.get_or_insert_with(Default::default).allow_ring_size_change =
                        Some(parse_value(key, value, "boolean")?);
                }
                "merge.molecule0" => {
                    self.merge.get_or_insert_with(Default::default).molecule0 =
                        Some(parse_value(key, value, "integer")?);
                }
                "merge.molecule1" => {
                    self.merge.get_or_insert_with(Default::default).molecule1 =
                        Some(parse_value(key, value, "integer")?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;

    fn merge_args(extra: &[&str]) -> (MappingArgs, PolicyFlags) {
        let mut argv = vec!["fepmerge", "merge", "-a", "a.mol2", "-b", "b.mol2", "-o", "out"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Merge(args) => (args.mapping, args.policy),
            _ => unreachable!(),
        }
    }

    fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("fepmerge.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn defaults_apply_without_a_file() {
        let (args, flags) = merge_args(&[]);
        let config = PartialMergeConfig::load(None)
            .unwrap()
            .merge_with_cli(&args, flags)
            .unwrap();
        assert_eq!(config.mapping.timeout, Duration::from_secs(10));
        assert_eq!(config.mapping.max_candidates, 10);
        assert!(config.mapping.prematch.is_empty());
        assert_eq!(config.policy, core_config::MergePolicy::default());
    }

    #[test]
    fn file_values_are_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
            [mapping]
            timeout-seconds = 2.5
            max-candidates = 4
            prematch = "1-3"

            [merge]
            allow-ring-breaking = true
            molecule1 = 2
            "#,
        );
        let (args, flags) = merge_args(&[]);
        let config = PartialMergeConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&args, flags)
            .unwrap();
        assert_eq!(config.mapping.timeout, Duration::from_millis(2500));
        assert_eq!(config.mapping.max_candidates, 4);
        assert_eq!(config.mapping.prematch.pairs(), &[(1, 3)]);
        assert!(config.policy.allow_ring_breaking);
        assert!(!config.policy.allow_ring_size_change);
        assert_eq!((config.molecule0, config.molecule1), (0, 2));
    }

    #[test]
    fn cli_beats_set_values_which_beat_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "[mapping]\ntimeout-seconds = 30.0\nmax-candidates = 4\nprematch = \"0-0\"\n",
        );
        let (args, flags) = merge_args(&[
            "--timeout",
            "1",
            "-S",
            "mapping.timeout-seconds=5",
            "-S",
            "mapping.max-candidates=2",
            "--allow-ring-size-change",
        ]);
        let config = PartialMergeConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&args, flags)
            .unwrap();
        assert_eq!(config.mapping.timeout, Duration::from_secs(1));
        assert_eq!(config.mapping.max_candidates, 2);
        assert_eq!(config.mapping.prematch.pairs(), &[(0, 0)]);
        assert!(config.policy.allow_ring_size_change);
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[mapping]\ntimeout = 3\n");
        assert!(matches!(
            PartialMergeConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn bad_set_values_are_rejected() {
        for set in ["mapping.unknown=1", "mapping.max-candidates=many", "no-equals-sign"] {
            let (args, flags) = merge_args(&["-S", set]);
            let result = PartialMergeConfig::default().merge_with_cli(&args, flags);
            assert!(matches!(result, Err(CliError::Config(_))), "{}", set);
        }
    }

    #[test]
    fn invalid_prematch_and_timeout_are_reported() {
        let (args, flags) = merge_args(&["--prematch", "1-2,3"]);
        assert!(matches!(
            PartialMergeConfig::default().merge_with_cli(&args, flags),
            Err(CliError::Prematch { .. })
        ));

        let (args, flags) = merge_args(&["--timeout=-1"]);
        assert!(matches!(
            PartialMergeConfig::default().merge_with_cli(&args, flags),
            Err(CliError::Timeout { .. })
        ));

        let (args, flags) = merge_args(&["--timeout", "0"]);
        assert!(matches!(
            PartialMergeConfig::default().merge_with_cli(&args, flags),
            Err(CliError::Config(_))
        ));
    }
}
