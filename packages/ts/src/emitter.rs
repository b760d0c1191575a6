// Emitter
//
// Final emission: strip TypeScript syntax with oxc and write JavaScript (and
// optionally declaration files) through the host, one write per output, each
// carrying the unit it was produced from.

use std::path::Path;
use std::sync::Arc;

use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_isolated_declarations::{IsolatedDeclarations, IsolatedDeclarationsOptions};
use oxc_parser::Parser;

use crate::host::{CompilerHost, HostError};
use crate::node::SourceFile;
use crate::parser::source_type_for;
use crate::path::{dirname, join, relative, strip_extension};
use crate::program::Program;
use crate::{Diagnostic, DiagnosticCategory};

#[derive(Debug, Default)]
pub struct EmitResult {
    pub emit_skipped: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub emitted_files: Vec<String>,
}

/// Transpile one unit's text to JavaScript. Returns the parse errors on failure.
pub fn transpile_module(file_name: &str, text: &str) -> Result<String, Vec<String>> {
    let allocator = Allocator::default();
    let mut ret = Parser::new(&allocator, text, source_type_for(file_name)).parse();
    if !ret.errors.is_empty() {
        return Err(ret.errors.iter().map(|e| e.to_string()).collect());
    }

    let semantic = oxc_semantic::SemanticBuilder::new()
        .with_excess_capacity(0.0)
        .build(&ret.program);
    let transform_options = oxc_transformer::TransformOptions::default();
    let transformer = oxc_transformer::Transformer::new(&allocator, Path::new(file_name), &transform_options);
    let _ = transformer.build_with_scoping(semantic.semantic.into_scoping(), &mut ret.program);

    Ok(Codegen::new().build(&ret.program).code)
}

/// Produce declaration text for one unit.
pub fn declaration_text(file_name: &str, text: &str) -> Result<String, Vec<String>> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, text, source_type_for(file_name)).parse();
    if !ret.errors.is_empty() {
        return Err(ret.errors.iter().map(|e| e.to_string()).collect());
    }
    let declarations = IsolatedDeclarations::new(&allocator, IsolatedDeclarationsOptions { strip_internal: false })
        .build(&ret.program);
    Ok(Codegen::new().build(&declarations.program).code)
}

impl Program {
    /// Directory that output paths mirror: `rootDir`, or the deepest directory
    /// containing every non-declaration unit.
    pub fn common_source_directory(&self) -> String {
        if let Some(root_dir) = &self.options().root_dir {
            return join(self.current_directory(), root_dir);
        }
        let mut common: Option<Vec<String>> = None;
        for sf in self.source_files().filter(|sf| !sf.is_declaration_file) {
            let dir: Vec<String> = dirname(&sf.file_name).split('/').map(String::from).collect();
            common = Some(match common {
                None => dir,
                Some(prev) => prev.into_iter().zip(dir).take_while(|(a, b)| a == b).map(|(a, _)| a).collect(),
            });
        }
        match common {
            Some(segments) if !segments.is_empty() => {
                let joined = segments.join("/");
                if joined.is_empty() {
                    "/".to_string()
                } else {
                    joined
                }
            }
            _ => self.current_directory().to_string(),
        }
    }

    /// Where the output for `file_name` with `extension` lands.
    pub fn output_path(&self, file_name: &str, extension: &str) -> String {
        let base = strip_extension(file_name);
        match &self.options().out_dir {
            Some(out_dir) => {
                let out_dir = join(self.current_directory(), out_dir);
                let rel = relative(&self.common_source_directory(), base);
                format!("{}{}", join(&out_dir, &rel), extension)
            }
            None => format!("{}{}", base, extension),
        }
    }

    fn has_errors(&self) -> bool {
        self.get_options_diagnostics()
            .iter()
            .chain(self.get_syntactic_diagnostics().iter())
            .chain(self.get_semantic_diagnostics().iter())
            .any(|d| d.is_error())
    }

    pub fn emit(&self, host: &dyn CompilerHost) -> Result<EmitResult, HostError> {
        let options = self.options();
        if options.no_emit.unwrap_or(false) || (options.no_emit_on_error.unwrap_or(false) && self.has_errors()) {
            return Ok(EmitResult {
                emit_skipped: true,
                ..Default::default()
            });
        }

        let mut result = EmitResult::default();
        let units: Vec<&Arc<SourceFile>> = self.source_files().filter(|sf| !sf.is_declaration_file).collect();
        for sf in units {
            let code = match transpile_module(&sf.file_name, &sf.text) {
                Ok(code) => code,
                Err(errors) => {
                    for message in errors {
                        result.diagnostics.push(Diagnostic::global(DiagnosticCategory::Error, 1005, message));
                    }
                    continue;
                }
            };
            let js_path = self.output_path(&sf.file_name, ".js");
            host.write_file(&js_path, &code, std::slice::from_ref(sf))?;
            result.emitted_files.push(js_path);

            if options.declaration.unwrap_or(false) {
                if let Ok(dts) = declaration_text(&sf.file_name, &sf.text) {
                    let dts_path = self.output_path(&sf.file_name, ".d.ts");
                    host.write_file(&dts_path, &dts, std::slice::from_ref(sf))?;
                    result.emitted_files.push(dts_path);
                }
            }
        }
        Ok(result)
    }
}
