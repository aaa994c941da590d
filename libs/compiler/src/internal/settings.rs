use foundry_compilers::artifacts::{output_selection::OutputSelection, Settings};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::internal::errors::{Error, Result};

/// Optimizer runs applied when a request enables the optimizer without naming a run count.
pub const DEFAULT_OPTIMIZER_RUNS: u32 = 200;

/// The `settings` object of a standard-JSON request.
///
/// `optimizer` is interpreted by the driver; every other key is forwarded to the compiler by
/// overlaying it onto the default solc settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestSettings {
  #[serde(default)]
  pub optimizer: OptimizerSettings,
  #[serde(flatten)]
  pub passthrough: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerSettings {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub enabled: Option<bool>,
  /// Signed so that a negative value can be rejected only when the optimizer is enabled.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub runs: Option<i64>,
}

impl OptimizerSettings {
  pub fn enabled(enabled: bool) -> Self {
    Self {
      enabled: Some(enabled),
      runs: None,
    }
  }
}

/// Optimizer values used when the request leaves them out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OptimizerDefaults {
  pub enabled: bool,
  pub runs: u32,
}

impl Default for OptimizerDefaults {
  fn default() -> Self {
    Self {
      enabled: false,
      runs: DEFAULT_OPTIMIZER_RUNS,
    }
  }
}

/// Build the solc [`Settings`] for a request.
pub(crate) fn resolve_settings(
  request: &RequestSettings,
  defaults: &OptimizerDefaults,
) -> Result<Settings> {
  let mut settings = overlay_passthrough(&Settings::default(), &request.passthrough)?;

  let enabled = request.optimizer.enabled.unwrap_or(defaults.enabled);
  let runs = if enabled {
    match request.optimizer.runs {
      Some(runs) if runs < 0 => {
        return Err(Error::invalid_request(format!(
          "Optimizer runs must be a non-negative integer, got {runs}."
        )))
      }
      Some(runs) => usize::try_from(runs).map_err(|_| {
        Error::invalid_request(format!("Optimizer runs value {runs} is out of range."))
      })?,
      None => defaults.runs as usize,
    }
  } else {
    defaults.runs as usize
  };

  settings.optimizer.enabled = Some(enabled);
  settings.optimizer.runs = Some(runs);
  Ok(sanitize_settings(settings))
}

fn overlay_passthrough(base: &Settings, passthrough: &Map<String, Value>) -> Result<Settings> {
  if passthrough.is_empty() {
    return Ok(base.clone());
  }
  let mut base_value = serde_json::to_value(base)
    .map_err(|err| Error::config("Failed to serialise base compiler settings", err))?;
  merge_settings_json(&mut base_value, Value::Object(passthrough.clone()));
  serde_json::from_value(base_value).map_err(|err| {
    Error::invalid_request(format!("Failed to parse compiler settings: {err}"))
  })
}

pub(crate) fn merge_settings_json(base: &mut Value, overrides: Value) {
  match (base, overrides) {
    (Value::Object(base_map), Value::Object(overrides_map)) => {
      for (key, value) in overrides_map {
        match base_map.get_mut(&key) {
          Some(existing) => merge_settings_json(existing, value),
          None => {
            base_map.insert(key, value);
          }
        }
      }
    }
    (target, value) => {
      *target = value;
    }
  }
}

pub(crate) fn sanitize_settings(mut settings: Settings) -> Settings {
  if output_selection_is_effectively_empty(&settings.output_selection) {
    settings.output_selection = Settings::default().output_selection;
  }
  settings
}

pub(crate) fn output_selection_is_effectively_empty(selection: &OutputSelection) -> bool {
  let map = selection.as_ref();
  if map.is_empty() {
    return true;
  }

  map.values().all(|contracts| {
    contracts
      .values()
      .all(|outputs| outputs.iter().all(|output| output.trim().is_empty()))
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn request(value: Value) -> RequestSettings {
    serde_json::from_value(value).expect("request settings")
  }

  #[test]
  fn enabled_optimizer_defaults_to_two_hundred_runs() {
    let settings = resolve_settings(
      &request(json!({ "optimizer": { "enabled": true } })),
      &OptimizerDefaults::default(),
    )
    .expect("settings");
    assert_eq!(settings.optimizer.enabled, Some(true));
    assert_eq!(settings.optimizer.runs, Some(200));
  }

  #[test]
  fn explicit_runs_are_kept() {
    let settings = resolve_settings(
      &request(json!({ "optimizer": { "enabled": true, "runs": 1000 } })),
      &OptimizerDefaults::default(),
    )
    .expect("settings");
    assert_eq!(settings.optimizer.runs, Some(1000));
  }

  #[test]
  fn negative_runs_rejected_only_when_enabled() {
    let err = resolve_settings(
      &request(json!({ "optimizer": { "enabled": true, "runs": -1 } })),
      &OptimizerDefaults::default(),
    )
    .unwrap_err();
    assert!(err.is_invalid_request());

    let settings = resolve_settings(
      &request(json!({ "optimizer": { "enabled": false, "runs": -1 } })),
      &OptimizerDefaults::default(),
    )
    .expect("disabled optimizer ignores runs");
    assert_eq!(settings.optimizer.enabled, Some(false));
  }

  #[test]
  fn passthrough_keys_reach_solc_settings() {
    let settings = resolve_settings(
      &request(json!({ "viaIR": true, "optimizer": { "enabled": false } })),
      &OptimizerDefaults::default(),
    )
    .expect("settings");
    assert_eq!(settings.via_ir, Some(true));
  }

  #[test]
  fn empty_output_selection_falls_back_to_defaults() {
    let settings = resolve_settings(
      &request(json!({ "outputSelection": {} })),
      &OptimizerDefaults::default(),
    )
    .expect("settings");
    assert!(!output_selection_is_effectively_empty(
      &settings.output_selection
    ));
  }

  #[test]
  fn merge_replaces_leaves_and_keeps_siblings() {
    let mut base = json!({ "optimizer": { "enabled": false, "runs": 200 }, "viaIR": false });
    merge_settings_json(&mut base, json!({ "optimizer": { "enabled": true } }));
    assert_eq!(base["optimizer"]["enabled"], json!(true));
    assert_eq!(base["optimizer"]["runs"], json!(200));
    assert_eq!(base["viaIR"], json!(false));
  }
}
