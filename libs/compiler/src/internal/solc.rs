use std::sync::{Mutex, OnceLock};

use foundry_compilers::solc::Solc;
use semver::Version;

use crate::internal::errors::{Error, Result};

pub(crate) const DEFAULT_SOLC_VERSION: Version = Version::new(0, 8, 30);

pub(crate) fn default_version() -> Version {
  DEFAULT_SOLC_VERSION
}

pub fn parse_version(version: &str) -> Result<Version> {
  let trimmed = version.trim().trim_start_matches('v');
  Version::parse(trimmed).map_err(|err| Error::config("Failed to parse solc version", err))
}

pub(crate) fn ensure_installed(version: &Version) -> Result<Solc> {
  if let Some(solc) = find_installed_version(version)? {
    return Ok(solc);
  }
  Err(Error::Solc(format!(
    "Solc {version} is not installed. Call install_version first."
  )))
}

pub(crate) fn find_installed_version(version: &Version) -> Result<Option<Solc>> {
  Solc::find_svm_installed_version(version)
    .map_err(|err| Error::solc("Failed to inspect solc versions", err))
}

pub fn is_version_installed(version: &Version) -> Result<bool> {
  find_installed_version(version).map(|maybe| maybe.is_some())
}

fn install_mutex() -> &'static Mutex<()> {
  static INSTALL_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
  INSTALL_MUTEX.get_or_init(|| Mutex::new(()))
}

/// Install `version` through svm unless it is already present. Concurrent callers are
/// serialised so a version is downloaded once.
pub fn install_version(version: &Version) -> Result<()> {
  let _guard = install_mutex()
    .lock()
    .map_err(|err| Error::Solc(format!("Solc install mutex poisoned: {err}")))?;

  if find_installed_version(version)?.is_some() {
    return Ok(());
  }
  log::debug!("installing solc {version}");
  Solc::blocking_install(version)
    .map(|_| ())
    .map_err(|err| Error::solc("Failed to install solc version", err))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_versions_with_a_leading_v() {
    assert_eq!(parse_version("v0.8.21").unwrap(), Version::new(0, 8, 21));
    assert_eq!(parse_version(" 0.8.30 ").unwrap(), Version::new(0, 8, 30));
  }

  #[test]
  fn rejects_garbage_versions() {
    let err = parse_version("latest").unwrap_err();
    assert!(err.to_string().starts_with("Failed to parse solc version"));
  }
}
