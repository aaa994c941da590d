//! A standard-JSON compilation driver.
//!
//! The driver validates a multi-source request, fetches imported sources the request does not
//! carry through a pluggable [`SourceResolver`], hands independent groups of sources to a
//! [`CompilationPipeline`] (solc by default) and assembles a single [`CompilationResult`].

#[cfg(feature = "napi")]
#[macro_use]
extern crate napi_derive;

mod compiler;
mod internal;

pub use compiler::{
  compile_file, compile_source,
  output::{
    from_standard_json, BytecodeOutput, CompilationResult, ContractArtifact, Diagnostic,
    DiagnosticKind, EvmOutput, SecondarySourceLocation, SeverityLevel, SourceLocation,
    IMPORT_RESOLUTION_ERROR, INTERNAL_COMPILER_ERROR,
  },
  pipeline::{CompilationPipeline, SolcPipeline},
  resolver::{
    FileSystemResolver, ReadResult, SourceResolver, CALLBACK_NOT_SUPPORTED, FILE_NOT_FOUND,
  },
  CompilationRequest, Driver, SourceInput, SOLIDITY, VIRTUAL_SOURCE_NAME, YUL,
};
pub use internal::config::{DriverConfig, DriverConfigOptions};
pub use internal::errors::{Error, Result};
pub use internal::settings::{
  OptimizerDefaults, OptimizerSettings, RequestSettings, DEFAULT_OPTIMIZER_RUNS,
};
pub use internal::solc::{install_version, is_version_installed, parse_version};
