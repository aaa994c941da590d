use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use foundry_compilers::artifacts::remappings::Remapping;
use foundry_config::{Config as FoundryConfig, SolcReq};
use semver::Version;
use serde_json::Value;

use crate::internal::errors::{Error, Result};
use crate::internal::settings::{OptimizerDefaults, OptimizerSettings};
use crate::internal::solc;

/// Finalised driver configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct DriverConfig {
  pub solc_version: Version,
  pub optimizer: OptimizerDefaults,
  /// Directory the filesystem resolver reads imports from. `None` disables it.
  pub base_dir: Option<PathBuf>,
  pub allow_paths: BTreeSet<PathBuf>,
  /// Applied to every request ahead of the request's own `settings.remappings`.
  pub remappings: Vec<Remapping>,
}

impl Default for DriverConfig {
  fn default() -> Self {
    DriverConfig {
      solc_version: solc::default_version(),
      optimizer: OptimizerDefaults::default(),
      base_dir: None,
      allow_paths: BTreeSet::new(),
      remappings: Vec::new(),
    }
  }
}

/// Optional overrides that can be merged into a [`DriverConfig`].
#[derive(Clone, Debug, Default)]
pub struct DriverConfigOptions {
  pub solc_version: Option<Version>,
  pub optimizer_enabled: Option<bool>,
  pub optimizer_runs: Option<u32>,
  pub base_dir: Option<PathBuf>,
  pub allow_paths: Option<BTreeSet<PathBuf>>,
  pub remappings: Option<Vec<Remapping>>,
}

impl DriverConfig {
  pub fn from_options(options: Option<DriverConfigOptions>) -> Self {
    let base = DriverConfig::default();
    match options {
      Some(overrides) => base.merged(&overrides),
      None => base,
    }
  }

  pub fn merge_options(&self, options: Option<&DriverConfigOptions>) -> Self {
    match options {
      Some(overrides) => self.merged(overrides),
      None => self.clone(),
    }
  }

  pub fn merged(&self, overrides: &DriverConfigOptions) -> Self {
    let mut config = self.clone();
    if let Some(version) = &overrides.solc_version {
      config.solc_version = version.clone();
    }
    if let Some(enabled) = overrides.optimizer_enabled {
      config.optimizer.enabled = enabled;
    }
    if let Some(runs) = overrides.optimizer_runs {
      config.optimizer.runs = runs;
    }
    if let Some(base_dir) = &overrides.base_dir {
      config.base_dir = Some(base_dir.clone());
    }
    if let Some(allow_paths) = &overrides.allow_paths {
      config.allow_paths = allow_paths.clone();
    }
    if let Some(remappings) = &overrides.remappings {
      config.remappings = remappings.clone();
    }
    config
  }

  /// Load overrides from the `foundry.toml` rooted at `root` and merge them over the defaults.
  pub fn from_foundry_root(root: &Path) -> Result<Self> {
    let overrides = load_foundry_overrides(root)?;
    Ok(DriverConfig::default().merged(&overrides))
  }
}

fn load_foundry_overrides(root: &Path) -> Result<DriverConfigOptions> {
  let figment = FoundryConfig::figment_with_root(root);
  let config = FoundryConfig::try_from(figment)
    .map_err(|err| Error::config("Failed to load foundry configuration", err))?
    .sanitized()
    .canonic();

  let mut overrides = DriverConfigOptions::default();
  let base_dir = config.__root.0.clone();

  if let Some(SolcReq::Version(version)) = &config.solc {
    overrides.solc_version = Some(version.clone());
  }

  // foundry-config pins its own compilers release, so go through JSON rather than the type.
  let settings = config
    .solc_settings()
    .map_err(|err| Error::config("Failed to derive foundry compiler settings", err))?;
  let settings_json = serde_json::to_value(&settings)
    .map_err(|err| Error::config("Failed to serialise foundry compiler settings", err))?;
  if let Some(optimizer) = settings_json.get("optimizer").filter(|value| !value.is_null()) {
    let optimizer = parse_optimizer(optimizer.clone())?;
    overrides.optimizer_enabled = optimizer.enabled;
    overrides.optimizer_runs = optimizer
      .runs
      .and_then(|runs| u32::try_from(runs).ok());
  }

  overrides.remappings = Some(
    config
      .remappings
      .iter()
      .filter_map(|remapping| Remapping::from_str(&remapping.to_string()).ok())
      .collect(),
  );

  let mut allow_paths = config
    .allow_paths
    .iter()
    .map(|path| canonicalize_with_root(&base_dir, path))
    .collect::<BTreeSet<_>>();
  allow_paths.insert(base_dir.clone());
  overrides.allow_paths = Some(allow_paths);
  overrides.base_dir = Some(base_dir);

  Ok(overrides)
}

fn parse_optimizer(value: Value) -> Result<OptimizerSettings> {
  serde_json::from_value(value)
    .map_err(|err| Error::config("Failed to convert foundry optimizer settings", err))
}

pub(crate) fn canonicalize_with_root(root: &Path, path: &Path) -> PathBuf {
  let joined = if path.is_absolute() {
    path.to_path_buf()
  } else {
    root.join(path)
  };
  joined.canonicalize().unwrap_or(joined)
}
