use std::path::PathBuf;

use foundry_compilers::artifacts::{CompilerOutput, SolcInput};
use foundry_compilers::solc::Solc;
use semver::Version;

use crate::internal::config::DriverConfig;
use crate::internal::errors::{Error, Result};
use crate::internal::solc;

/// The language pipeline the driver hands fully resolved source groups to.
///
/// Every source imported by a member of `input.sources` is itself present in the input. An
/// `Err` means the pipeline could not run at all; problems with the sources belong in the
/// returned output's `errors`.
pub trait CompilationPipeline: Send + Sync {
  fn compile(&self, input: &SolcInput) -> Result<CompilerOutput>;
}

/// Runs a solc binary in `--standard-json` mode.
#[derive(Clone, Debug)]
pub struct SolcPipeline {
  solc: Solc,
}

impl SolcPipeline {
  pub fn new(solc: Solc) -> Self {
    Self { solc }
  }

  /// Use the svm-managed solc `version`, which must already be installed.
  pub fn installed(version: &Version) -> Result<Self> {
    solc::ensure_installed(version).map(Self::new)
  }

  pub fn from_config(config: &DriverConfig) -> Result<Self> {
    Self::installed(&config.solc_version)
  }

  /// Use the solc binary at `path`.
  pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
    Solc::new(path.into())
      .map(Self::new)
      .map_err(|err| Error::solc("Failed to load solc binary", err))
  }

  pub fn version(&self) -> &Version {
    &self.solc.version
  }
}

impl CompilationPipeline for SolcPipeline {
  fn compile(&self, input: &SolcInput) -> Result<CompilerOutput> {
    let mut input = input.clone();
    input.sanitize(&self.solc.version);
    self
      .solc
      .compile_as(&input)
      .map_err(|err| Error::solc("Solc compilation failed", err))
  }
}
