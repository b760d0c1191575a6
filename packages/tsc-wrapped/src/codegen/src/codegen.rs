// Code Generator
//
// Classifies annotated classes of every source unit, analyzes the whole module
// graph once, compiles each file's components in parallel and writes the
// generated modules under `genDir`. Generation is best-effort per file: a
// failing file is logged and skipped, the others are still written.

use std::sync::Arc;

use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use ts::path::{join, normalize_path, relative};
use ts::{
    make_diagnostic_chain, CompilerHost, Diagnostic, DiagnosticCategory, HostError, Program, SourceFile, Span, Symbol,
    SymbolKind, TypeChecker,
};

use super::resource_loader::HostResourceLoader;
use super::static_reflector::{StaticReflector, StaticValue};
use super::template_compiler::{
    CodegenError, ComponentDescriptor, GeneratedModule, ModuleDescriptor, TemplateCompiler,
};
use crate::diagnostics::{make_diagnostic, ErrorCode};
use crate::host::{AnnotationKind, AnnotationRegistry};
use crate::logging::Logger;

/// Outputs of a previous codegen run are never codegen inputs.
pub static GENERATED_FILES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.ngfactory\.ts$|\.ngstyle\.ts$|\.ngsummary\.ts$").expect("valid regex"));

/// Matches `(<A>(<B>this.parent.parent)).member.transform` so the cast is applied once.
static DOUBLE_CAST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(<(\w+)>\(<(\w+)>(this\.parent(?:\.parent)?)\)\)\.(\w+)\.transform").expect("valid regex")
});

pub const PREAMBLE: &str = "/**\n * @fileoverview This file is generated by the Angular template compiler.\n * Do not edit.\n * @suppress {suspiciousCode,uselessCode,missingProperties}\n */\n /* tslint:disable */\n\n";

/// Rewrite the repeated parent cast emitted for pipes inside nested views.
pub fn patch_double_cast(source: &str) -> String {
    DOUBLE_CAST.replace_all(source, "(<${1}>${3}).${4}.transform").into_owned()
}

#[derive(Debug, Clone)]
pub struct CodegenOptions {
    pub base_path: String,
    pub gen_dir: String,
    pub root_dirs: Vec<String>,
    pub core_module: String,
}

#[derive(Debug, Default)]
pub struct CodegenResult {
    /// Paths written, in write order.
    pub emitted: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Where a generated module lands: its path relative to the deepest root
/// directory containing it, re-rooted under `genDir`. The base path is used
/// when no root directory contains the module.
pub fn calculate_emit_path(options: &CodegenOptions, module_url: &str) -> String {
    let root = options
        .root_dirs
        .iter()
        .map(|root_dir| normalize_path(root_dir))
        .filter(|root_dir| !relative(root_dir, module_url).starts_with(".."))
        .max_by_key(|root_dir| root_dir.split('/').filter(|s| !s.is_empty()).count())
        .unwrap_or_else(|| normalize_path(&options.base_path));
    let mut rel = relative(&root, module_url);
    while let Some(stripped) = rel.strip_prefix("../") {
        rel = stripped.to_string();
    }
    join(&options.gen_dir, &rel)
}

struct FileJob {
    source_file: Arc<SourceFile>,
    components: Vec<ComponentDescriptor>,
    modules: Vec<ModuleDescriptor>,
}

pub struct CodeGenerator<'a> {
    program: &'a Program,
    host: &'a dyn CompilerHost,
    compiler: &'a dyn TemplateCompiler,
    options: CodegenOptions,
    logger: &'a dyn Logger,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(
        program: &'a Program,
        host: &'a dyn CompilerHost,
        compiler: &'a dyn TemplateCompiler,
        options: CodegenOptions,
        logger: &'a dyn Logger,
    ) -> Self {
        Self {
            program,
            host,
            compiler,
            options,
            logger,
        }
    }

    pub fn options(&self) -> &CodegenOptions {
        &self.options
    }

    fn classify(&self, reflector: &StaticReflector, checker: &TypeChecker, source_file: &Arc<SourceFile>) -> FileJob {
        let file_name = source_file.file_name.as_str();
        let mut job = FileJob {
            source_file: Arc::clone(source_file),
            components: Vec::new(),
            modules: Vec::new(),
        };
        let Some(metadata) = reflector.metadata_of(file_name) else {
            return job;
        };
        for (name, entry) in &metadata.metadata {
            if entry.as_class().is_none() {
                continue;
            }
            let symbol = checker
                .resolve_export(file_name, name)
                .unwrap_or_else(|| Symbol::new(file_name, name.clone(), SymbolKind::Class));
            for annotation in reflector.annotations(file_name, name) {
                let config = annotation.arguments.first().cloned().unwrap_or(StaticValue::Null);
                let text = |key: &str| config.get(key).and_then(|v| v.as_str()).map(str::to_string);
                let strings = |key: &str| config.get(key).map(|v| v.strings()).unwrap_or_default();
                let symbols = |key: &str| config.get(key).map(|v| v.symbols()).unwrap_or_default();
                match annotation.kind {
                    AnnotationKind::Component => job.components.push(ComponentDescriptor {
                        symbol: symbol.clone(),
                        selector: text("selector"),
                        template: text("template"),
                        template_url: text("templateUrl"),
                        styles: strings("styles"),
                        style_urls: strings("styleUrls"),
                    }),
                    AnnotationKind::NgModule => job.modules.push(ModuleDescriptor {
                        symbol: symbol.clone(),
                        declarations: symbols("declarations"),
                        imports: symbols("imports"),
                        exports: symbols("exports"),
                        bootstrap: symbols("bootstrap"),
                    }),
                    _ => {}
                }
            }
        }
        job
    }

    /// Generate and write factories for every unit with components.
    pub fn codegen(&self) -> CodegenResult {
        let checker = TypeChecker::new(self.program);
        let registry = AnnotationRegistry::new(&checker, &self.options.core_module);
        let reflector = StaticReflector::new(&checker, &registry, self.host);

        let jobs: Vec<FileJob> = self
            .program
            .source_files()
            .filter(|sf| !sf.is_declaration_file && !GENERATED_FILES.is_match(&sf.file_name))
            .map(|sf| self.classify(&reflector, &checker, sf))
            .collect();

        let all_modules: Vec<ModuleDescriptor> = jobs.iter().flat_map(|j| j.modules.iter().cloned()).collect();
        let analyzed = self.compiler.analyze_modules(&all_modules);
        self.logger.debug(&format!(
            "codegen: {} modules, {} files with components",
            all_modules.len(),
            jobs.iter().filter(|j| !j.components.is_empty()).count()
        ));

        let resources = HostResourceLoader::new(self.host);
        let compiled: Vec<(&FileJob, Result<Vec<GeneratedModule>, CodegenError>)> = jobs
            .par_iter()
            .filter(|job| !job.components.is_empty())
            .map(|job| {
                let result = self.compiler.compile(
                    &job.source_file.file_name,
                    &analyzed,
                    &job.components,
                    &job.modules,
                    &resources,
                );
                (job, result)
            })
            .collect();

        let mut result = CodegenResult::default();
        for (job, outcome) in compiled {
            let file_name = job.source_file.file_name.as_str();
            let (code, reason) = match outcome {
                Ok(generated) => match self.write_outputs(&job.source_file, generated) {
                    Ok(paths) => {
                        result.emitted.extend(paths);
                        continue;
                    }
                    Err(error) => (ErrorCode::CodegenFailed, error.to_string()),
                },
                Err(error) => {
                    let code = match &error {
                        CodegenError::Resource(_) => ErrorCode::ResourceNotFound,
                        CodegenError::NotDeclared { .. } => ErrorCode::ComponentNotDeclared,
                        _ => ErrorCode::CodegenFailed,
                    };
                    (code, error.to_string())
                }
            };
            self.logger.error(&format!("codegen failed for {}: {}", file_name, reason));
            let mut diagnostic =
                make_diagnostic(code, DiagnosticCategory::Warning, Some(file_name), Span::default(), "");
            diagnostic.message_text = make_diagnostic_chain(
                format!("Factories for '{}' were not generated", file_name),
                Some(vec![reason.into()]),
            );
            result.diagnostics.push(diagnostic);
        }
        result
    }

    /// Writes every module generated for one source file, or none of them: on
    /// a failed write the modules already written for that file are removed.
    fn write_outputs(
        &self,
        source_file: &Arc<SourceFile>,
        generated: Vec<GeneratedModule>,
    ) -> Result<Vec<String>, HostError> {
        let outputs: Vec<(String, String)> = generated
            .into_iter()
            .map(|module| {
                let path = calculate_emit_path(&self.options, &module.module_url);
                (path, format!("{}{}", PREAMBLE, patch_double_cast(&module.source)))
            })
            .collect();

        let mut written: Vec<String> = Vec::with_capacity(outputs.len());
        for (path, text) in outputs {
            if let Err(error) = self.host.write_file(&path, &text, std::slice::from_ref(source_file)) {
                for path in &written {
                    if let Err(e) = self.host.delete_file(path) {
                        self.logger.warn(&format!("codegen: cannot remove {}: {}", path, e));
                    }
                }
                return Err(error);
            }
            self.logger.debug(&format!("codegen: wrote {}", path));
            written.push(path);
        }
        Ok(written)
    }
}
