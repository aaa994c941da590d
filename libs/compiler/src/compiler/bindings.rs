use napi::bindgen_prelude::AsyncTask;
use napi::{Env, Task};
use semver::Version;

use crate::compiler::Driver;
use crate::internal::config::{DriverConfig, DriverConfigOptions};
use crate::internal::solc;

fn driver_for(base_dir: Option<String>) -> napi::Result<Driver> {
  let options = DriverConfigOptions {
    base_dir: base_dir.map(Into::into),
    ..Default::default()
  };
  Ok(Driver::from_config(DriverConfig::from_options(Some(options)))?)
}

/// Compile a single source and return the first contract's deployed bytecode, or `""`.
#[napi(js_name = "compileSource")]
pub fn compile_source(source: String, optimize: Option<bool>) -> String {
  super::compile_source(&source, optimize.unwrap_or(false))
}

/// Compile the file at `path` and return the first contract's deployed bytecode, or `""`.
#[napi(js_name = "compileFile")]
pub fn compile_file(path: String, optimize: Option<bool>) -> String {
  super::compile_file(path, optimize.unwrap_or(false))
}

/// Run a standard-JSON request. Imports are read from disk below `baseDir` when given.
#[napi(js_name = "compileStandardJson")]
pub fn compile_standard_json(input: String, base_dir: Option<String>) -> napi::Result<String> {
  let driver = driver_for(base_dir)?;
  Ok(driver.compile_json(&input)?)
}

#[napi(js_name = "isSolcVersionInstalled")]
pub fn is_solc_version_installed(version: String) -> napi::Result<bool> {
  let parsed = solc::parse_version(&version)?;
  Ok(solc::is_version_installed(&parsed)?)
}

#[napi(js_name = "installSolcVersion")]
pub fn install_solc_version(version: String) -> napi::Result<AsyncTask<InstallSolcTask>> {
  let version = solc::parse_version(&version)?;
  Ok(AsyncTask::new(InstallSolcTask { version }))
}

pub struct InstallSolcTask {
  version: Version,
}

impl Task for InstallSolcTask {
  type Output = ();
  type JsValue = ();

  fn compute(&mut self) -> napi::Result<Self::Output> {
    Ok(solc::install_version(&self.version)?)
  }

  fn resolve(&mut self, _env: Env, _output: Self::Output) -> napi::Result<Self::JsValue> {
    Ok(())
  }
}
