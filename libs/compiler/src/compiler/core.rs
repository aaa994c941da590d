use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

use foundry_compilers::artifacts::remappings::Remapping;
use foundry_compilers::artifacts::{Settings, SolcInput, SolcLanguage, Source, Sources};

use crate::compiler::input::CompilationRequest;
use crate::compiler::normalize::{normalize, NormalizedRequest, UnitSource};
use crate::compiler::output::{
  CompilationResult, Diagnostic, ResultAssembler, SourceLocation, IMPORT_RESOLUTION_ERROR,
  INTERNAL_COMPILER_ERROR,
};
use crate::compiler::pipeline::{CompilationPipeline, SolcPipeline};
use crate::compiler::resolver::{FileSystemResolver, ResolutionSession, SourceResolver};
use crate::internal::config::DriverConfig;
use crate::internal::errors::Result;
use crate::internal::imports::{import_target, scan_imports, ImportDirective};

/// Standard-JSON compilation driver.
///
/// A driver holds no per-request state: every call to [`Driver::compile`] validates the request,
/// resolves missing imports through the configured [`SourceResolver`], compiles every unit
/// together with the units it transitively imports and assembles one [`CompilationResult`].
/// A compile error therefore only costs the artifacts of the units that depend on it. Clones share
/// the pipeline and resolver, and a driver can be used from several threads at once.
#[derive(Clone)]
pub struct Driver {
  config: DriverConfig,
  pipeline: Arc<dyn CompilationPipeline>,
  resolver: Option<Arc<dyn SourceResolver>>,
}

impl std::fmt::Debug for Driver {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Driver")
      .field("config", &self.config)
      .field("has_resolver", &self.resolver.is_some())
      .finish()
  }
}

impl Driver {
  pub fn new(pipeline: impl CompilationPipeline + 'static) -> Self {
    Self {
      config: DriverConfig::default(),
      pipeline: Arc::new(pipeline),
      resolver: None,
    }
  }

  /// A solc-backed driver for `config`. When the config names a base directory, imports are
  /// read from disk below it.
  pub fn from_config(config: DriverConfig) -> Result<Self> {
    let pipeline = SolcPipeline::from_config(&config)?;
    let mut driver = Driver::new(pipeline);
    if let Some(resolver) = FileSystemResolver::from_config(&config) {
      driver = driver.with_resolver(resolver);
    }
    Ok(driver.with_config(config))
  }

  pub fn with_config(mut self, config: DriverConfig) -> Self {
    self.config = config;
    self
  }

  pub fn with_resolver(mut self, resolver: impl SourceResolver + 'static) -> Self {
    self.resolver = Some(Arc::new(resolver));
    self
  }

  pub fn without_resolver(mut self) -> Self {
    self.resolver = None;
    self
  }

  pub fn config(&self) -> &DriverConfig {
    &self.config
  }

  /// Compile `request`. Only a malformed request is an `Err`; everything that goes wrong with
  /// individual sources is reported through the result's diagnostics.
  pub fn compile(&self, request: &CompilationRequest) -> Result<CompilationResult> {
    log::debug!("validating request with {} source(s)", request.sources.len());
    let mut normalized = normalize(request, &self.config.optimizer)?;
    prepend_remappings(&mut normalized.settings, &self.config.remappings);

    let mut assembler = ResultAssembler::new();
    let mut session = ResolutionSession::new(self.resolver.as_deref());
    let graph = SourceGraph::resolve(&normalized, &mut session, &mut assembler);

    // Units already covered by a run whose output they can take their artifacts from.
    let mut settled: BTreeSet<String> = BTreeSet::new();
    for (root, closure) in graph.closures() {
      if settled.contains(&root) {
        continue;
      }
      log::debug!("compiling {root} with {closure:?}");
      let sources: Sources = closure
        .iter()
        .map(|name| {
          let content = graph.content(name).unwrap_or_default().to_string();
          (PathBuf::from(name), Source::new(content))
        })
        .collect();
      let input = SolcInput::new(normalized.language, sources, normalized.settings.clone());
      match self.pipeline.compile(&input) {
        Ok(output) => {
          // A run with errors carries no artifacts, so only its root is settled.
          if output.errors.iter().any(|error| error.severity.is_error()) {
            settled.insert(root);
          } else {
            settled.extend(closure);
          }
          assembler.push_output(&output);
        }
        Err(err) => {
          log::debug!("pipeline failed for {root}: {err}");
          assembler.push_diagnostic(Diagnostic::driver_error(
            INTERNAL_COMPILER_ERROR,
            err.to_string(),
            whole_file(&root),
          ));
          settled.insert(root);
        }
      }
    }

    let result = assembler.finish();
    log::debug!(
      "assembled {} source(s) with contracts and {} diagnostic(s)",
      result.contracts.len(),
      result.errors.len()
    );
    Ok(result)
  }

  /// Standard-JSON in, standard-JSON out.
  pub fn compile_json(&self, input: &str) -> Result<String> {
    let request = CompilationRequest::from_json(input)?;
    self.compile(&request)?.to_json()
  }

  /// Deployed bytecode of the first contract the request produces.
  ///
  /// `Err` means the request itself was rejected, `Ok(None)` that compilation produced no
  /// contracts (only diagnostics). See [`CompilationResult::first_contract`] for which contract
  /// counts as first.
  pub fn compile_bytecode(&self, request: &CompilationRequest) -> Result<Option<String>> {
    let result = self.compile(request)?;
    Ok(result.first_deployed_bytecode().map(str::to_string))
  }
}

// Configured remappings go first so that a request's own remappings win ties.
fn prepend_remappings(settings: &mut Settings, configured: &[Remapping]) {
  if configured.is_empty() {
    return;
  }
  let requested = std::mem::take(&mut settings.remappings);
  settings.remappings = configured.iter().cloned().chain(requested).collect();
}

fn whole_file(name: &str) -> SourceLocation {
  SourceLocation {
    file: name.to_string(),
    start: -1,
    end: -1,
  }
}

fn directive_location(name: &str, directive: &ImportDirective) -> SourceLocation {
  SourceLocation {
    file: name.to_string(),
    start: i32::try_from(directive.start).unwrap_or(i32::MAX),
    end: i32::try_from(directive.end).unwrap_or(i32::MAX),
  }
}

struct Unit {
  content: Option<String>,
  /// Unit names this unit imports, with the directive that named each.
  imports: Vec<(String, ImportDirective)>,
}

/// All units of one request after import resolution.
struct SourceGraph {
  units: BTreeMap<String, Unit>,
  broken: BTreeSet<String>,
}

impl SourceGraph {
  fn resolve(
    request: &NormalizedRequest,
    session: &mut ResolutionSession<'_>,
    assembler: &mut ResultAssembler,
  ) -> Self {
    log::debug!("resolving imports");
    let mut units: BTreeMap<String, Unit> = BTreeMap::new();
    let mut broken: BTreeSet<String> = BTreeSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();

    for (name, source) in &request.sources {
      let content = match source {
        UnitSource::Content(content) => Some(content.clone()),
        UnitSource::Urls(urls) => match fetch_urls(session, urls) {
          Ok(content) => Some(content),
          Err(message) => {
            assembler.push_diagnostic(Diagnostic::driver_error(
              IMPORT_RESOLUTION_ERROR,
              message,
              whole_file(name),
            ));
            broken.insert(name.clone());
            None
          }
        },
      };
      units.insert(
        name.clone(),
        Unit {
          content,
          imports: Vec::new(),
        },
      );
      queue.push_back(name.clone());
    }

    while let Some(name) = queue.pop_front() {
      if request.language != SolcLanguage::Solidity {
        continue;
      }
      let Some(content) = units.get(&name).and_then(|unit| unit.content.clone()) else {
        continue;
      };

      let mut imports = Vec::new();
      let mut seen: BTreeSet<String> = BTreeSet::new();
      for directive in scan_imports(&name, &content) {
        let target = import_target(&name, &directive.path, &request.settings.remappings);
        if !seen.insert(target.clone()) {
          continue;
        }
        if !units.contains_key(&target) {
          match session.fetch(&target) {
            Ok(content) => {
              units.insert(
                target.clone(),
                Unit {
                  content: Some(content),
                  imports: Vec::new(),
                },
              );
              queue.push_back(target.clone());
            }
            Err(reason) => {
              assembler.push_diagnostic(Diagnostic::driver_error(
                IMPORT_RESOLUTION_ERROR,
                format!("Source \"{target}\" not found: {reason}"),
                directive_location(&name, &directive),
              ));
              broken.insert(name.clone());
              continue;
            }
          }
        }
        imports.push((target, directive));
      }
      if let Some(unit) = units.get_mut(&name) {
        unit.imports = imports;
      }
    }

    let mut graph = SourceGraph { units, broken };
    graph.propagate_breakage(assembler);
    graph
  }

  // A unit importing a unit that cannot be compiled cannot be compiled either.
  fn propagate_breakage(&mut self, assembler: &mut ResultAssembler) {
    loop {
      let mut newly_broken = Vec::new();
      for (name, unit) in &self.units {
        if self.broken.contains(name) {
          continue;
        }
        if let Some((target, directive)) = unit
          .imports
          .iter()
          .find(|(target, _)| self.broken.contains(target))
        {
          assembler.push_diagnostic(Diagnostic::driver_error(
            IMPORT_RESOLUTION_ERROR,
            format!("Source \"{target}\" could not be loaded."),
            directive_location(name, directive),
          ));
          newly_broken.push(name.clone());
        }
      }
      if newly_broken.is_empty() {
        break;
      }
      self.broken.extend(newly_broken);
    }
  }

  fn content(&self, name: &str) -> Option<&str> {
    self.units.get(name)?.content.as_deref()
  }

  fn healthy(&self) -> impl Iterator<Item = &String> {
    self
      .units
      .keys()
      .filter(|name| !self.broken.contains(*name))
  }

  /// Every healthy unit with the sorted set of units it needs, itself included. Larger sets come
  /// first so that one run covers as many units as possible; ties are ordered by unit name.
  fn closures(&self) -> Vec<(String, Vec<String>)> {
    let mut closures: Vec<(String, Vec<String>)> = self
      .healthy()
      .map(|root| (root.clone(), self.closure_of(root)))
      .collect();
    closures.sort_by(|(a_root, a), (b_root, b)| {
      (Reverse(a.len()), a_root).cmp(&(Reverse(b.len()), b_root))
    });
    closures
  }

  fn closure_of(&self, root: &str) -> Vec<String> {
    let mut closure = BTreeSet::new();
    let mut stack = vec![root];
    while let Some(current) = stack.pop() {
      if !closure.insert(current.to_string()) {
        continue;
      }
      if let Some(unit) = self.units.get(current) {
        stack.extend(unit.imports.iter().map(|(target, _)| target.as_str()));
      }
    }
    closure.into_iter().collect()
  }
}

fn fetch_urls(
  session: &mut ResolutionSession<'_>,
  urls: &[String],
) -> std::result::Result<String, String> {
  let mut failures = Vec::new();
  for url in urls {
    match session.fetch(url) {
      Ok(content) => return Ok(content),
      Err(reason) => failures.push(format!("Cannot import url (\"{url}\"): {reason}")),
    }
  }
  Err(failures.join("\n"))
}
