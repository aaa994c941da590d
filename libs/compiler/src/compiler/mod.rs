use std::fs;
use std::path::Path;

pub use self::core::Driver;
pub use input::{CompilationRequest, SourceInput, SOLIDITY, VIRTUAL_SOURCE_NAME, YUL};

use crate::internal::config::DriverConfig;
use crate::internal::errors::{Error, Result};

#[cfg(feature = "napi")]
pub mod bindings;
pub mod core;
mod input;
mod normalize;
pub mod output;
pub mod pipeline;
pub mod resolver;


// Convenience entry points. They reduce a compilation to the deployed bytecode of the first
// contract and report every kind of failure as an empty string; use `Driver::compile` or
// `Driver::compile_bytecode` to tell the cases apart.

impl Driver {
  /// Compile one unnamed source and return the first contract's deployed bytecode.
  pub fn compile_source(&self, source: &str, optimize: bool) -> String {
    let request = CompilationRequest::single(source, optimize);
    match self.compile_bytecode(&request) {
      Ok(bytecode) => bytecode.unwrap_or_default(),
      Err(err) => {
        log::warn!("compile_source failed: {err}");
        String::new()
      }
    }
  }

  /// Read `path` and compile its contents as [`Driver::compile_source`] does. An unreadable or
  /// empty file yields an empty string without compiling.
  pub fn compile_file(&self, path: impl AsRef<Path>, optimize: bool) -> String {
    let path = path.as_ref();
    let source = match read_source(path) {
      Ok(source) => source,
      Err(err) => {
        log::warn!("compile_file failed: {err}");
        return String::new();
      }
    };
    log::debug!("compile_file {} ({} bytes)", path.display(), source.len());
    if source.is_empty() {
      return String::new();
    }
    self.compile_source(&source, optimize)
  }
}

fn read_source(path: &Path) -> Result<String> {
  fs::read_to_string(path)
    .map_err(|err| Error::io(format!("Failed to read {}", path.display()), err))
}

fn default_driver() -> Option<Driver> {
  match Driver::from_config(DriverConfig::default()) {
    Ok(driver) => Some(driver),
    Err(err) => {
      log::warn!("no default solc available: {err}");
      None
    }
  }
}

/// [`Driver::compile_source`] on a driver built from the default configuration.
pub fn compile_source(source: &str, optimize: bool) -> String {
  default_driver()
    .map(|driver| driver.compile_source(source, optimize))
    .unwrap_or_default()
}

/// [`Driver::compile_file`] on a driver built from the default configuration.
pub fn compile_file(path: impl AsRef<Path>, optimize: bool) -> String {
  default_driver()
    .map(|driver| driver.compile_file(path, optimize))
    .unwrap_or_default()
}
