// Closure Module Host
//
// Serves units of a held Program rewritten from ES module syntax into
// `goog.module` form. Every module is named with the `ModuleNamer`.

use std::fmt::Write;
use std::sync::{Arc, Mutex};

use ts::path::{is_dts_file, relative};
use ts::{
    CompilerHost, DelegatingHost, Diagnostic, DiagnosticCategory, ExportClause, HostError, ImportDeclaration,
    ImportedName, Program, SourceFile, Span, Statement, TypeChecker,
};

use super::annotation_host::apply_edits;
use crate::diagnostics::{make_diagnostic, ErrorCode};
use crate::module_namer::ModuleNamer;

const PASS_NAME: &str = "closure conversion";

pub struct ClosureCompilerHost<'a> {
    delegate: &'a dyn CompilerHost,
    program: &'a Program,
    checker: TypeChecker<'a>,
    namer: ModuleNamer,
    base_path: String,
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl<'a> ClosureCompilerHost<'a> {
    pub fn new(delegate: &'a dyn CompilerHost, program: &'a Program, namer: ModuleNamer, base_path: &str) -> Self {
        Self {
            delegate,
            program,
            checker: TypeChecker::new(program),
            namer,
            base_path: base_path.to_string(),
            diagnostics: Mutex::new(Vec::new()),
        }
    }

    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().map(|mut d| std::mem::take(&mut *d)).unwrap_or_default()
    }

    fn report(&self, file_name: &str, span: Span, message: String) {
        if let Ok(mut diagnostics) = self.diagnostics.lock() {
            diagnostics.push(make_diagnostic(
                ErrorCode::ClosureConversion,
                DiagnosticCategory::Warning,
                Some(file_name),
                span,
                message,
            ));
        }
    }

    /// `goog.module` name of a unit.
    pub fn module_name(&self, file_name: &str) -> String {
        self.namer.name("", &relative(&self.base_path, file_name))
    }

    fn required_name(&self, file_name: &str, specifier: &str) -> String {
        match self.program.resolve_module(file_name, specifier) {
            Some(target) if !is_dts_file(target) => self.module_name(target),
            _ => self.namer.name(&relative(&self.base_path, file_name), specifier),
        }
    }

    fn is_value(&self, file_name: &str, local: &str) -> bool {
        self.checker
            .symbol_at(file_name, local)
            .map_or(true, |symbol| symbol.kind.is_value())
    }

    pub fn rewrite(&self, source_file: &SourceFile) -> String {
        let file_name = source_file.file_name.as_str();
        let mut edits: Vec<(Span, String)> = Vec::new();
        let mut tail = String::new();
        let mut reexports = 0usize;

        edits.push((Span::new(0, 0), format!("goog.module('{}');\n", self.module_name(file_name))));

        for statement in &source_file.statements {
            match statement {
                Statement::Import(import) => {
                    edits.push((import.span, self.import_text(file_name, import)));
                }
                Statement::ExportLocal(export) => {
                    let mut text = String::new();
                    if !export.is_type_only {
                        for spec in export.specifiers.iter().filter(|s| !s.is_type_only) {
                            if self.is_value(file_name, &spec.local) {
                                let _ = write!(text, "exports.{} = {};", spec.exported, spec.local);
                            }
                        }
                    }
                    edits.push((export.span, text));
                }
                Statement::ExportAssignment(assign) => {
                    let text = match &assign.expression {
                        Some(expression) => format!("exports.default = {};", source_file.text_of(expression.span)),
                        None => String::new(),
                    };
                    edits.push((assign.span, text));
                }
                Statement::ExportFrom(export) => {
                    if export.is_type_only {
                        edits.push((export.span, String::new()));
                        continue;
                    }
                    let local = format!("__reexport_{}", reexports);
                    reexports += 1;
                    let mut text = format!(
                        "const {} = goog.require('{}');",
                        local,
                        self.required_name(file_name, &export.module_specifier)
                    );
                    match &export.clause {
                        ExportClause::Named(specifiers) => {
                            for spec in specifiers.iter().filter(|s| !s.is_type_only) {
                                let is_value = self
                                    .checker
                                    .resolve_import(file_name, &export.module_specifier, &spec.local)
                                    .map_or(true, |symbol| symbol.kind.is_value());
                                if is_value {
                                    let _ = write!(text, "\nexports.{} = {}.{};", spec.exported, local, spec.local);
                                }
                            }
                        }
                        ExportClause::Namespace(ns) => {
                            let _ = write!(text, "\nexports.{} = {};", ns, local);
                        }
                        ExportClause::All => match self.program.resolve_module(file_name, &export.module_specifier) {
                            Some(target) => {
                                for (name, symbol) in self.checker.exports_of_module(target) {
                                    if name != "default" && symbol.kind.is_value() {
                                        let _ = write!(text, "\nexports.{} = {}.{};", name, local, name);
                                    }
                                }
                            }
                            None => self.report(
                                file_name,
                                export.span,
                                format!("Cannot enumerate the exports of '{}'", export.module_specifier),
                            ),
                        },
                    }
                    edits.push((export.span, text));
                }
                declaration => {
                    let Some(modifiers) = declaration.modifiers() else { continue };
                    let Some(keyword) = modifiers.export_keyword else { continue };
                    if modifiers.is_default {
                        match declaration.declared_name() {
                            Some(name) => {
                                edits.push((keyword, String::new()));
                                let _ = writeln!(tail, "exports.default = {};", name);
                            }
                            None => edits.push((keyword, "exports.default = ".to_string())),
                        }
                        continue;
                    }
                    edits.push((keyword, String::new()));
                    if modifiers.is_ambient {
                        continue;
                    }
                    let names: Vec<&str> = match declaration {
                        Statement::Variable(var) => var.declarations.iter().filter_map(|d| d.name.as_deref()).collect(),
                        Statement::Type(t) if !t.is_value() => Vec::new(),
                        other => other.declared_name().into_iter().collect(),
                    };
                    for name in names {
                        let _ = writeln!(tail, "exports.{} = {};", name, name);
                    }
                }
            }
        }

        let mut text = apply_edits(&source_file.text, edits);
        if !tail.is_empty() {
            text.push('\n');
            text.push_str(&tail);
        }
        text
    }

    fn import_text(&self, file_name: &str, import: &ImportDeclaration) -> String {
        if import.is_type_only {
            return String::new();
        }
        let module = self.required_name(file_name, &import.module_specifier);
        if import.bindings.is_empty() {
            return format!("goog.require('{}');", module);
        }

        let mut destructured: Vec<String> = Vec::new();
        let mut text = String::new();
        for binding in import.bindings.iter().filter(|b| !b.is_type_only) {
            match &binding.imported {
                ImportedName::Namespace => {
                    let _ = write!(text, "const {} = goog.require('{}');", binding.local, module);
                }
                _ if !self.is_value(file_name, &binding.local) => {}
                ImportedName::Default => destructured.push(format!("default: {}", binding.local)),
                ImportedName::Named(name) if *name == binding.local => destructured.push(name.clone()),
                ImportedName::Named(name) => destructured.push(format!("{}: {}", name, binding.local)),
            }
        }
        if !destructured.is_empty() {
            text = format!("const {{{}}} = goog.require('{}');{}", destructured.join(", "), module, text);
        }
        text
    }
}

impl DelegatingHost for ClosureCompilerHost<'_> {
    fn delegate(&self) -> &dyn CompilerHost {
        self.delegate
    }

    fn get_source_file(&self, file_name: &str) -> Result<Option<Arc<SourceFile>>, HostError> {
        if is_dts_file(file_name) {
            return self.delegate.get_source_file(file_name);
        }
        let Some(held) = self.program.get_source_file(file_name) else {
            return self.delegate.get_source_file(file_name);
        };
        let text = self.rewrite(held);
        let rewritten = SourceFile::with_original(&held.file_name, &text, Arc::clone(held));
        if let Some(error) = rewritten.parse_diagnostics.first() {
            return Err(HostError::Pass {
                pass: PASS_NAME,
                file_name: held.file_name.clone(),
                message: error.message_text.to_string(),
            });
        }
        Ok(Some(Arc::new(rewritten)))
    }
}
