use std::collections::BTreeMap;

use foundry_compilers::artifacts::{Settings, SolcLanguage};

use crate::compiler::input::{CompilationRequest, SOLIDITY, YUL};
use crate::internal::errors::{Error, Result};
use crate::internal::settings::{resolve_settings, OptimizerDefaults};

/// Where the text of a requested source comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum UnitSource {
  Content(String),
  Urls(Vec<String>),
}

/// A validated request, ready for import resolution and compilation.
#[derive(Clone, Debug)]
pub(crate) struct NormalizedRequest {
  pub language: SolcLanguage,
  pub sources: BTreeMap<String, UnitSource>,
  pub settings: Settings,
}

pub(crate) fn normalize(
  request: &CompilationRequest,
  optimizer: &OptimizerDefaults,
) -> Result<NormalizedRequest> {
  let language = parse_language(&request.language)?;

  if request.sources.is_empty() {
    return Err(Error::invalid_request("No input sources specified."));
  }

  let mut sources = BTreeMap::new();
  for (name, input) in &request.sources {
    let unit = match (&input.content, &input.urls) {
      (Some(content), _) => UnitSource::Content(content.clone()),
      (None, Some(urls)) if !urls.is_empty() => UnitSource::Urls(urls.clone()),
      _ => {
        return Err(Error::invalid_request(format!(
          "Invalid input source specified for \"{name}\": expected \"content\" or \"urls\"."
        )))
      }
    };
    sources.insert(name.clone(), unit);
  }

  let settings = resolve_settings(&request.settings, optimizer)?;

  Ok(NormalizedRequest {
    language,
    sources,
    settings,
  })
}

fn parse_language(tag: &str) -> Result<SolcLanguage> {
  match tag {
    SOLIDITY => Ok(SolcLanguage::Solidity),
    YUL => Ok(SolcLanguage::Yul),
    other => Err(Error::invalid_request(format!(
      "Only \"{SOLIDITY}\" or \"{YUL}\" is supported as a language, got \"{other}\"."
    ))),
  }
}
