use std::collections::BTreeMap;

use foundry_compilers::artifacts::contract::Contract as FoundryContract;
use foundry_compilers::artifacts::{
  error::{
    Error as FoundryCompilerError, SecondarySourceLocation as FoundrySecondarySourceLocation,
    Severity,
  },
  Bytecode, BytecodeObject, CompilerOutput,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::internal::errors::{Error, Result};

/// `type` of diagnostics raised for imports the driver could not resolve.
pub const IMPORT_RESOLUTION_ERROR: &str = "ImportResolutionError";
/// `type` of diagnostics raised when the pipeline itself failed for a group of sources.
pub const INTERNAL_COMPILER_ERROR: &str = "InternalCompilerError";

// -----------------------------------------------------------------------------
// Diagnostics
// -----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
  Error,
  Warning,
  Info,
}

/// Coarse classification of a [`Diagnostic`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
  ImportResolution,
  Compilation,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
  pub file: String,
  pub start: i32,
  pub end: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondarySourceLocation {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub file: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub start: Option<i32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub end: Option<i32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
  pub message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub formatted_message: Option<String>,
  pub component: String,
  pub severity: SeverityLevel,
  #[serde(rename = "type")]
  pub error_type: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error_code: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source_location: Option<SourceLocation>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub secondary_source_locations: Vec<SecondarySourceLocation>,
}

impl Diagnostic {
  /// An error raised by the driver itself rather than the pipeline.
  pub(crate) fn driver_error(
    error_type: &str,
    message: String,
    source_location: SourceLocation,
  ) -> Self {
    Self {
      formatted_message: Some(format!(
        "{error_type}: {message}\n --> {}\n",
        source_location.file
      )),
      message,
      component: "general".to_string(),
      severity: SeverityLevel::Error,
      error_type: error_type.to_string(),
      error_code: None,
      source_location: Some(source_location),
      secondary_source_locations: Vec::new(),
    }
  }

  pub fn kind(&self) -> DiagnosticKind {
    if self.error_type == IMPORT_RESOLUTION_ERROR {
      DiagnosticKind::ImportResolution
    } else {
      DiagnosticKind::Compilation
    }
  }

  pub fn is_error(&self) -> bool {
    self.severity == SeverityLevel::Error
  }

  pub fn file(&self) -> Option<&str> {
    self
      .source_location
      .as_ref()
      .map(|location| location.file.as_str())
  }
}

// -----------------------------------------------------------------------------
// Artifacts
// -----------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BytecodeOutput {
  /// Hex without a `0x` prefix. Unlinked code keeps its library placeholders.
  pub object: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmOutput {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub bytecode: Option<BytecodeOutput>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub deployed_bytecode: Option<BytecodeOutput>,
}

/// Compiled outputs of one contract. The ABI is passed through untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractArtifact {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub abi: Option<Value>,
  #[serde(default)]
  pub evm: EvmOutput,
}

impl ContractArtifact {
  /// Deployed (runtime) bytecode, empty when the contract has none.
  pub fn deployed_bytecode(&self) -> &str {
    self
      .evm
      .deployed_bytecode
      .as_ref()
      .map(|bytecode| bytecode.object.as_str())
      .unwrap_or_default()
  }

  fn from_foundry(contract: &FoundryContract) -> Self {
    let abi = contract
      .abi
      .as_ref()
      .and_then(|abi| match serde_json::to_value(abi) {
        Ok(value) => Some(value),
        Err(err) => {
          log::warn!("dropping ABI that failed to serialise: {err}");
          None
        }
      });
    let evm = contract.evm.as_ref();
    let bytecode = evm
      .and_then(|evm| evm.bytecode.as_ref())
      .map(bytecode_output);
    let deployed_bytecode = evm
      .and_then(|evm| evm.deployed_bytecode.as_ref())
      .and_then(|deployed| deployed.bytecode.as_ref())
      .map(bytecode_output);

    Self {
      abi,
      evm: EvmOutput {
        bytecode,
        deployed_bytecode,
      },
    }
  }
}

fn bytecode_output(bytecode: &Bytecode) -> BytecodeOutput {
  let object = match &bytecode.object {
    BytecodeObject::Bytecode(bytes) => hex::encode(bytes.as_ref()),
    BytecodeObject::Unlinked(unlinked) => unlinked.trim_start_matches("0x").to_string(),
  };
  BytecodeOutput { object }
}

// -----------------------------------------------------------------------------
// Result
// -----------------------------------------------------------------------------

/// The assembled standard-JSON response.
///
/// Source and contract names are held in [`BTreeMap`]s, so iteration is in sorted name order
/// regardless of how the pipeline emitted them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationResult {
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub contracts: BTreeMap<String, BTreeMap<String, ContractArtifact>>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub errors: Vec<Diagnostic>,
}

impl CompilationResult {
  pub fn has_compiler_errors(&self) -> bool {
    self.errors.iter().any(Diagnostic::is_error)
  }

  pub fn contract(&self, source: &str, name: &str) -> Option<&ContractArtifact> {
    self.contracts.get(source)?.get(name)
  }

  /// Diagnostics whose primary location is in `source`.
  pub fn diagnostics_for<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
    self
      .errors
      .iter()
      .filter(move |diagnostic| diagnostic.file() == Some(source))
  }

  /// The first contract of the first source, both in sorted name order.
  ///
  /// This is a fixed policy for callers that want a single artifact out of what is usually a
  /// single-contract, single-file request. It does not try to pick the "main" contract.
  pub fn first_contract(&self) -> Option<(&str, &str, &ContractArtifact)> {
    self.contracts.iter().find_map(|(source, contracts)| {
      contracts
        .iter()
        .next()
        .map(|(name, artifact)| (source.as_str(), name.as_str(), artifact))
    })
  }

  /// Deployed bytecode of [`Self::first_contract`], or `None` when nothing was compiled.
  pub fn first_deployed_bytecode(&self) -> Option<&str> {
    self
      .first_contract()
      .map(|(_, _, artifact)| artifact.deployed_bytecode())
  }

  pub fn to_json(&self) -> Result<String> {
    serde_json::to_string(self).map_err(|err| Error::config("Failed to serialise result", err))
  }
}

/// Collects pipeline outputs and driver diagnostics into one [`CompilationResult`].
#[derive(Debug, Default)]
pub(crate) struct ResultAssembler {
  result: CompilationResult,
}

impl ResultAssembler {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record `diagnostic` unless an identical one is already present. Units compiled in more
  /// than one run report their diagnostics once.
  pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
    if !self.result.errors.contains(&diagnostic) {
      self.result.errors.push(diagnostic);
    }
  }

  pub fn push_output(&mut self, output: &CompilerOutput) {
    for (path, contracts) in &output.contracts {
      let source = path.to_string_lossy().to_string();
      let entry = self.result.contracts.entry(source).or_default();
      for (name, contract) in contracts {
        entry.insert(name.clone(), ContractArtifact::from_foundry(contract));
      }
    }
    for error in &output.errors {
      self.push_diagnostic(solc_error_to_diagnostic(error));
    }
  }

  pub fn finish(self) -> CompilationResult {
    self.result
  }
}

/// Assemble a single pipeline output as-is.
pub fn from_standard_json(output: &CompilerOutput) -> CompilationResult {
  let mut assembler = ResultAssembler::new();
  assembler.push_output(output);
  assembler.finish()
}

fn solc_error_to_diagnostic(error: &FoundryCompilerError) -> Diagnostic {
  let severity = match error.severity {
    Severity::Error => SeverityLevel::Error,
    Severity::Warning => SeverityLevel::Warning,
    Severity::Info => SeverityLevel::Info,
  };

  Diagnostic {
    message: error.message.clone(),
    formatted_message: error.formatted_message.clone(),
    component: error.component.clone(),
    severity,
    error_type: error.r#type.clone(),
    error_code: error.error_code.map(|code| code as i64),
    source_location: error.source_location.as_ref().map(|loc| SourceLocation {
      file: loc.file.clone(),
      start: loc.start,
      end: loc.end,
    }),
    secondary_source_locations: error
      .secondary_source_locations
      .iter()
      .map(to_secondary_location)
      .collect(),
  }
}

fn to_secondary_location(location: &FoundrySecondarySourceLocation) -> SecondarySourceLocation {
  SecondarySourceLocation {
    file: location.file.clone(),
    start: location.start,
    end: location.end,
    message: location.message.clone(),
  }
}
