use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::internal::config::DriverConfig;

/// Message reported when a resolver answers with neither content nor an error.
pub const FILE_NOT_FOUND: &str = "File not found.";
/// Message reported for every unresolved import when no resolver is configured.
pub const CALLBACK_NOT_SUPPORTED: &str = "File import callback not supported";

/// Outcome of asking a [`SourceResolver`] for one path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadResult {
  Found(String),
  Failed(String),
  NotFound,
}

impl ReadResult {
  /// Combine the two optional answers of a callback boundary. An error wins over content, and
  /// an empty answer means the file was not found.
  pub fn from_parts(contents: Option<String>, error: Option<String>) -> Self {
    match (contents, error) {
      (_, Some(error)) => ReadResult::Failed(error),
      (Some(contents), None) => ReadResult::Found(contents),
      (None, None) => ReadResult::NotFound,
    }
  }

  pub fn into_content(self) -> Result<String, String> {
    match self {
      ReadResult::Found(contents) => Ok(contents),
      ReadResult::Failed(message) => Err(message),
      ReadResult::NotFound => Err(FILE_NOT_FOUND.to_string()),
    }
  }
}

/// Supplies the contents of sources that are imported but were not part of the request.
///
/// Implementations may do any I/O they like. The driver never retries and imposes no timeout,
/// so a resolver that needs bounded latency has to enforce it itself.
pub trait SourceResolver: Send + Sync {
  fn read(&self, path: &str) -> ReadResult;
}

impl<F> SourceResolver for F
where
  F: Fn(&str) -> ReadResult + Send + Sync,
{
  fn read(&self, path: &str) -> ReadResult {
    self(path)
  }
}

/// Resolves imports from disk, relative to a base directory.
#[derive(Clone, Debug)]
pub struct FileSystemResolver {
  base_dir: PathBuf,
  allow_paths: BTreeSet<PathBuf>,
}

impl FileSystemResolver {
  pub fn new(base_dir: impl Into<PathBuf>) -> Self {
    let base_dir = base_dir.into();
    let base_dir = base_dir.canonicalize().unwrap_or(base_dir);
    Self {
      base_dir,
      allow_paths: BTreeSet::new(),
    }
  }

  pub fn from_config(config: &DriverConfig) -> Option<Self> {
    let base_dir = config.base_dir.as_ref()?;
    Some(Self::new(base_dir).with_allow_paths(config.allow_paths.iter().cloned()))
  }

  pub fn with_allow_paths(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
    self.allow_paths.extend(
      paths
        .into_iter()
        .map(|path| path.canonicalize().unwrap_or(path)),
    );
    self
  }

  pub fn base_dir(&self) -> &Path {
    &self.base_dir
  }

  fn is_allowed(&self, path: &Path) -> bool {
    path.starts_with(&self.base_dir)
      || self
        .allow_paths
        .iter()
        .any(|allowed| path.starts_with(allowed))
  }
}

impl SourceResolver for FileSystemResolver {
  fn read(&self, path: &str) -> ReadResult {
    let candidate = self.base_dir.join(path);
    let canonical = match candidate.canonicalize() {
      Ok(canonical) => canonical,
      Err(err) if err.kind() == ErrorKind::NotFound => return ReadResult::NotFound,
      Err(err) => return ReadResult::Failed(err.to_string()),
    };
    if !self.is_allowed(&canonical) {
      return ReadResult::Failed("File outside of allowed directories.".to_string());
    }
    if !canonical.is_file() {
      return ReadResult::Failed("Not a valid file.".to_string());
    }
    match fs::read_to_string(&canonical) {
      Ok(contents) => ReadResult::Found(contents),
      Err(err) => ReadResult::Failed(err.to_string()),
    }
  }
}

/// Request-local view of the resolver: each path is asked for at most once.
pub(crate) struct ResolutionSession<'a> {
  resolver: Option<&'a dyn SourceResolver>,
  answers: BTreeMap<String, Result<String, String>>,
}

impl<'a> ResolutionSession<'a> {
  pub fn new(resolver: Option<&'a dyn SourceResolver>) -> Self {
    Self {
      resolver,
      answers: BTreeMap::new(),
    }
  }

  pub fn fetch(&mut self, path: &str) -> Result<String, String> {
    if let Some(answer) = self.answers.get(path) {
      return answer.clone();
    }
    let answer = match self.resolver {
      Some(resolver) => {
        log::trace!("resolving source \"{path}\"");
        resolver.read(path).into_content()
      }
      None => Err(CALLBACK_NOT_SUPPORTED.to_string()),
    };
    self.answers.insert(path.to_string(), answer.clone());
    answer
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[test]
  fn from_parts_follows_the_callback_contract() {
    assert_eq!(
      ReadResult::from_parts(Some("x".into()), None),
      ReadResult::Found("x".into())
    );
    assert_eq!(
      ReadResult::from_parts(Some("x".into()), Some("boom".into())),
      ReadResult::Failed("boom".into())
    );
    assert_eq!(ReadResult::from_parts(None, None), ReadResult::NotFound);
    assert_eq!(
      ReadResult::NotFound.into_content(),
      Err(FILE_NOT_FOUND.to_string())
    );
  }

  #[test]
  fn session_without_resolver_reports_unsupported_callback() {
    let mut session = ResolutionSession::new(None);
    assert_eq!(
      session.fetch("A.sol"),
      Err(CALLBACK_NOT_SUPPORTED.to_string())
    );
  }

  #[test]
  fn session_asks_once_per_path() {
    let calls = AtomicUsize::new(0);
    let resolver = |path: &str| {
      calls.fetch_add(1, Ordering::SeqCst);
      ReadResult::Found(format!("// {path}"))
    };
    let mut session = ResolutionSession::new(Some(&resolver));
    assert_eq!(session.fetch("A.sol"), Ok("// A.sol".to_string()));
    assert_eq!(session.fetch("A.sol"), Ok("// A.sol".to_string()));
    assert_eq!(session.fetch("B.sol"), Ok("// B.sol".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn filesystem_resolver_reads_inside_the_base_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join("lib")).expect("lib dir");
    fs::write(dir.path().join("lib/Dep.sol"), "contract Dep {}").expect("write");

    let resolver = FileSystemResolver::new(dir.path());
    assert_eq!(
      resolver.read("lib/Dep.sol"),
      ReadResult::Found("contract Dep {}".into())
    );
    assert_eq!(resolver.read("lib/Missing.sol"), ReadResult::NotFound);
    assert!(matches!(resolver.read("lib"), ReadResult::Failed(_)));
  }

  #[test]
  fn filesystem_resolver_rejects_paths_outside_allowed_dirs() {
    let outer = tempfile::tempdir().expect("tempdir");
    let base = outer.path().join("project");
    fs::create_dir_all(&base).expect("project dir");
    fs::write(outer.path().join("Secret.sol"), "contract Secret {}").expect("write");

    let resolver = FileSystemResolver::new(&base);
    assert_eq!(
      resolver.read("../Secret.sol"),
      ReadResult::Failed("File outside of allowed directories.".into())
    );

    let resolver = resolver.with_allow_paths([outer.path().to_path_buf()]);
    assert_eq!(
      resolver.read("../Secret.sol"),
      ReadResult::Found("contract Secret {}".into())
    );
  }
}
