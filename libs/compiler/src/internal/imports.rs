use std::path::Path;

use foundry_compilers::artifacts::remappings::Remapping;
use foundry_compilers::resolver::parse::SolData;

/// One `import` directive found in a Solidity source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ImportDirective {
  /// The path exactly as written between the quotes.
  pub path: String,
  /// Byte range of the directive within the original source.
  pub start: usize,
  pub end: usize,
}

/// Collect the import directives of the Solidity unit `name`, in source order.
pub(crate) fn scan_imports(name: &str, source: &str) -> Vec<ImportDirective> {
  let data = SolData::parse(source, Path::new(name));
  if let Err(err) = &data.parse_result {
    log::trace!("{name} did not parse cleanly, imports were recovered textually: {err}");
  }
  data
    .imports
    .iter()
    .map(|import| {
      let span = import.span();
      ImportDirective {
        path: import.data().path().to_string_lossy().into_owned(),
        start: span.start,
        end: span.end,
      }
    })
    .collect()
}

/// Turn an import path into the unit name it refers to. `./` and `../` paths are relative to the
/// importing unit; anything else already is a unit name.
pub(crate) fn resolve_import_path(importer: &str, path: &str) -> String {
  if !(path.starts_with("./") || path.starts_with("../")) {
    return path.to_string();
  }

  let mut segments: Vec<&str> = importer.split('/').collect();
  segments.pop();
  for part in path.split('/') {
    match part {
      "" | "." => {}
      ".." => {
        if segments.last().is_some_and(|last| !last.is_empty()) {
          segments.pop();
        }
      }
      other => segments.push(other),
    }
  }
  segments.join("/")
}

/// Apply solc's remapping rules to an already resolved unit name.
///
/// A remapping applies when its context prefixes `importer` and its prefix prefixes `unit`. The
/// longest context wins, then the longest prefix, then the one listed last.
pub(crate) fn apply_remappings(importer: &str, unit: &str, remappings: &[Remapping]) -> String {
  let mut best: Option<(usize, usize, &Remapping)> = None;
  for remapping in remappings {
    let context = remapping.context.as_deref().unwrap_or_default();
    if !importer.starts_with(context) || !unit.starts_with(remapping.name.as_str()) {
      continue;
    }
    let rank = (context.len(), remapping.name.len());
    let wins = match best {
      Some((context_len, name_len, _)) => rank >= (context_len, name_len),
      None => true,
    };
    if wins {
      best = Some((rank.0, rank.1, remapping));
    }
  }
  match best {
    Some((_, _, remapping)) => format!("{}{}", remapping.path, &unit[remapping.name.len()..]),
    None => unit.to_string(),
  }
}

/// The unit name `path` refers to when imported from `importer`.
pub(crate) fn import_target(importer: &str, path: &str, remappings: &[Remapping]) -> String {
  apply_remappings(importer, &resolve_import_path(importer, path), remappings)
}
