use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::internal::errors::{Error, Result};
use crate::internal::settings::{OptimizerSettings, RequestSettings};

/// Language tag for Solidity requests.
pub const SOLIDITY: &str = "Solidity";
/// Language tag for Yul requests.
pub const YUL: &str = "Yul";

/// Unit name given to a single source compiled without a file name.
pub const VIRTUAL_SOURCE_NAME: &str = "__VIRTUAL__.sol";

/// A standard-JSON compilation request.
///
/// Sources are keyed by unit name in a [`BTreeMap`], so names are unique and every traversal of
/// the request is in sorted order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilationRequest {
  pub language: String,
  #[serde(default)]
  pub sources: BTreeMap<String, SourceInput>,
  #[serde(default)]
  pub settings: RequestSettings,
}

/// One entry of the `sources` object. Either the content is inline, or it is fetched through the
/// source resolver from the first url that answers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInput {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub urls: Option<Vec<String>>,
}

impl SourceInput {
  pub fn content(content: impl Into<String>) -> Self {
    Self {
      content: Some(content.into()),
      urls: None,
    }
  }

  pub fn urls<I, S>(urls: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      content: None,
      urls: Some(urls.into_iter().map(Into::into).collect()),
    }
  }
}

impl CompilationRequest {
  pub fn new(language: impl Into<String>) -> Self {
    Self {
      language: language.into(),
      ..Default::default()
    }
  }

  pub fn solidity() -> Self {
    Self::new(SOLIDITY)
  }

  /// Request for `sources` as given, with the optimizer switched on or off and its run count
  /// left to the configured default.
  pub fn from_sources<I, K, V>(sources: I, optimize: bool) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    let mut request = Self::solidity().with_optimizer(optimize);
    for (name, content) in sources {
      request = request.with_source(name, content);
    }
    request
  }

  /// Request holding a single unnamed source.
  pub fn single(source: impl Into<String>, optimize: bool) -> Self {
    Self::from_sources([(VIRTUAL_SOURCE_NAME, source.into())], optimize)
  }

  pub fn with_source(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
    self
      .sources
      .insert(name.into(), SourceInput::content(content));
    self
  }

  pub fn with_source_urls<I, S>(mut self, name: impl Into<String>, urls: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.sources.insert(name.into(), SourceInput::urls(urls));
    self
  }

  pub fn with_optimizer(mut self, enabled: bool) -> Self {
    self.settings.optimizer = OptimizerSettings::enabled(enabled);
    self
  }

  pub fn with_optimizer_runs(mut self, runs: i64) -> Self {
    self.settings.optimizer.enabled = Some(true);
    self.settings.optimizer.runs = Some(runs);
    self
  }

  pub fn from_json(input: &str) -> Result<Self> {
    serde_json::from_str(input)
      .map_err(|err| Error::invalid_request(format!("Failed to parse request JSON: {err}")))
  }

  pub fn to_json(&self) -> Result<String> {
    serde_json::to_string(self).map_err(|err| Error::config("Failed to serialise request", err))
  }
}
