// Program
//
// An immutable snapshot of a file set. Construction loads the roots through a
// host, follows imports and re-exports, and records every module resolution.
// Any change to the file set or to a unit's text means building a new Program,
// optionally seeded from the previous one.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::host::{CompilerHost, HostError};
use crate::node::{SourceFile, Statement};
use crate::path::{dirname, is_absolute, is_relative_specifier, join, normalize_path, relative};
use crate::{Diagnostic, DiagnosticCategory};

/// Subset of `compilerOptions` the pipeline understands.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerOptions {
    pub base_url: Option<String>,
    pub declaration: Option<bool>,
    pub emit_decorator_metadata: Option<bool>,
    pub experimental_decorators: Option<bool>,
    pub module: Option<String>,
    pub no_emit: Option<bool>,
    pub no_emit_on_error: Option<bool>,
    pub out_dir: Option<String>,
    pub root_dir: Option<String>,
    pub root_dirs: Option<Vec<String>>,
    pub skip_lib_check: Option<bool>,
    pub target: Option<String>,
}

/// Module specifiers resolved for one unit. `None` records a failed lookup.
type Resolutions = IndexMap<String, Option<String>>;

#[derive(Debug)]
pub struct Program {
    root_names: Vec<String>,
    options: CompilerOptions,
    files: IndexMap<String, Arc<SourceFile>>,
    resolutions: HashMap<String, Resolutions>,
    options_diagnostics: Vec<Diagnostic>,
    current_directory: String,
    case_sensitive: bool,
    reused_file_count: usize,
}

impl Program {
    pub fn new(
        root_names: &[String],
        options: CompilerOptions,
        host: &dyn CompilerHost,
        old_program: Option<&Program>,
    ) -> Result<Program, HostError> {
        let current_directory = normalize_path(&host.get_current_directory());
        let case_sensitive = host.use_case_sensitive_file_names();
        let root_names: Vec<String> = root_names.iter().map(|r| join(&current_directory, r)).collect();

        let mut program = Program {
            root_names: root_names.clone(),
            options,
            files: IndexMap::new(),
            resolutions: HashMap::new(),
            options_diagnostics: Vec::new(),
            current_directory,
            case_sensitive,
            reused_file_count: 0,
        };

        let mut queue: VecDeque<(String, bool)> = root_names.into_iter().map(|r| (r, true)).collect();
        while let Some((file_name, is_root)) = queue.pop_front() {
            let key = program.key(&file_name);
            if program.files.contains_key(&key) {
                continue;
            }
            let source_file = match host.get_source_file(&file_name)? {
                Some(sf) => sf,
                None => {
                    if is_root {
                        program.options_diagnostics.push(Diagnostic::global(
                            DiagnosticCategory::Error,
                            6053,
                            format!("File '{}' not found.", file_name),
                        ));
                    }
                    continue;
                }
            };

            let previous = old_program.and_then(|old| {
                old.files
                    .get(&key)
                    .filter(|old_sf| Arc::ptr_eq(old_sf, &source_file))
                    .and_then(|_| old.resolutions.get(&key))
            });
            if previous.is_some() {
                program.reused_file_count += 1;
            }

            let mut resolved = Resolutions::new();
            for specifier in source_file.module_specifiers() {
                if resolved.contains_key(specifier) {
                    continue;
                }
                let target = match previous.and_then(|p| p.get(specifier)) {
                    Some(Some(hit)) => Some(hit.clone()),
                    _ => resolve_module_name(specifier, &source_file.file_name, &program.options, host),
                };
                if let Some(target) = &target {
                    queue.push_back((target.clone(), false));
                }
                resolved.insert(specifier.to_string(), target);
            }

            program.resolutions.insert(key.clone(), resolved);
            program.files.insert(key, source_file);
        }

        Ok(program)
    }

    fn key(&self, file_name: &str) -> String {
        let path = join(&self.current_directory, file_name);
        if self.case_sensitive {
            path
        } else {
            path.to_lowercase()
        }
    }

    pub fn root_names(&self) -> &[String] {
        &self.root_names
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn current_directory(&self) -> &str {
        &self.current_directory
    }

    /// Units whose parsed tree was carried over from the seed Program.
    pub fn reused_file_count(&self) -> usize {
        self.reused_file_count
    }

    /// All units in discovery order.
    pub fn source_files(&self) -> impl Iterator<Item = &Arc<SourceFile>> {
        self.files.values()
    }

    pub fn get_source_file(&self, file_name: &str) -> Option<&Arc<SourceFile>> {
        self.files.get(&self.key(file_name))
    }

    /// The unit a specifier written in `containing_file` resolves to.
    pub fn resolve_module(&self, containing_file: &str, specifier: &str) -> Option<&str> {
        self.resolutions
            .get(&self.key(containing_file))
            .and_then(|r| r.get(specifier))
            .and_then(|target| target.as_deref())
    }

    pub fn get_options_diagnostics(&self) -> Vec<Diagnostic> {
        self.options_diagnostics.clone()
    }

    pub fn get_syntactic_diagnostics(&self) -> Vec<Diagnostic> {
        self.files
            .values()
            .flat_map(|sf| sf.parse_diagnostics.iter().cloned())
            .collect()
    }

    /// Cross-file errors: relative imports that resolve to nothing.
    pub fn get_semantic_diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for (key, source_file) in &self.files {
            if source_file.is_declaration_file {
                continue;
            }
            let Some(resolutions) = self.resolutions.get(key) else {
                continue;
            };
            for statement in &source_file.statements {
                let (specifier, span) = match statement {
                    Statement::Import(import) => (&import.module_specifier, import.span),
                    Statement::ExportFrom(export) => (&export.module_specifier, export.span),
                    _ => continue,
                };
                if is_relative_specifier(specifier) && matches!(resolutions.get(specifier), Some(None)) {
                    diagnostics.push(Diagnostic::in_file(
                        DiagnosticCategory::Error,
                        2307,
                        &source_file.file_name,
                        span,
                        format!("Cannot find module '{}'.", specifier),
                    ));
                }
            }
        }
        diagnostics
    }
}

const EXTENSIONS: [&str; 3] = [".ts", ".tsx", ".d.ts"];

fn try_file(base: &str, host: &dyn CompilerHost) -> Option<String> {
    let base = base.strip_suffix(".js").unwrap_or(base);
    if (base.ends_with(".ts") || base.ends_with(".tsx")) && host.file_exists(base) {
        return Some(base.to_string());
    }
    for ext in EXTENSIONS {
        let candidate = format!("{}{}", base, ext);
        if host.file_exists(&candidate) {
            return Some(candidate);
        }
    }
    None
}

fn try_directory(dir: &str, host: &dyn CompilerHost) -> Option<String> {
    let manifest = join(dir, "package.json");
    if let Some(text) = host.read_file(&manifest) {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(&text) {
            let typings = json.get("typings").or_else(|| json.get("types")).and_then(|v| v.as_str());
            if let Some(typings) = typings {
                let target = join(dir, typings);
                if host.file_exists(&target) {
                    return Some(target);
                }
                if let Some(found) = try_file(crate::path::strip_extension(&target), host) {
                    return Some(found);
                }
            }
        }
    }
    try_file(&join(dir, "index"), host)
}

fn try_path(base: &str, host: &dyn CompilerHost) -> Option<String> {
    try_file(base, host).or_else(|| try_directory(base, host))
}

/// `rootDirs` make several directories behave as one: a relative specifier
/// that misses beside its unit is retried at the same relative location under
/// every other root.
fn resolve_through_root_dirs(
    specifier: &str,
    containing_dir: &str,
    options: &CompilerOptions,
    host: &dyn CompilerHost,
) -> Option<String> {
    let cwd = host.get_current_directory();
    let roots: Vec<String> = options.root_dirs.as_ref()?.iter().map(|r| join(&cwd, r)).collect();
    let owner = roots
        .iter()
        .filter(|root| containing_dir == root.as_str() || containing_dir.starts_with(&format!("{}/", root)))
        .max_by_key(|root| root.len())?;
    let rel_dir = relative(owner, containing_dir);
    roots
        .iter()
        .filter(|root| *root != owner)
        .find_map(|root| try_path(&join(&join(root, &rel_dir), specifier), host))
}

/// Resolve `specifier` as written in `containing_file`.
///
/// Relative and absolute specifiers are looked up beside the containing unit;
/// bare specifiers go through `baseUrl` and then `node_modules` ancestors.
pub fn resolve_module_name(
    specifier: &str,
    containing_file: &str,
    options: &CompilerOptions,
    host: &dyn CompilerHost,
) -> Option<String> {
    let containing_dir = dirname(containing_file);
    if is_absolute(specifier) {
        return try_path(specifier, host);
    }
    if is_relative_specifier(specifier) {
        return try_path(&join(&containing_dir, specifier), host)
            .or_else(|| resolve_through_root_dirs(specifier, &containing_dir, options, host));
    }

    if let Some(base_url) = &options.base_url {
        let base = join(&host.get_current_directory(), base_url);
        if let Some(found) = try_path(&join(&base, specifier), host) {
            return Some(found);
        }
    }

    let mut dir = containing_dir;
    loop {
        let candidate = join(&join(&dir, "node_modules"), specifier);
        if let Some(found) = try_path(&candidate, host) {
            return Some(found);
        }
        let parent = dirname(&dir);
        if parent == dir || dir.is_empty() {
            return None;
        }
        dir = parent;
    }
}
