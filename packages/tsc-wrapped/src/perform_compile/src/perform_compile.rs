// Perform Compile
//
// The pipeline driver. Each pass builds a fresh Program seeded from the
// previous one: codegen adds generated units, the downlevel and closure
// passes serve rewritten text, and the final emit writes through the metadata
// writer. Error diagnostics from one stage stop the run before the next.

use ts::path::{basename, join};
use ts::{CompilerHost, CompilerOptions, Diagnostic, Program, TypeChecker};

use super::config::{AnnotationsAs, EmitFlags, ParsedConfiguration};
use crate::bundler::{bundle_index_path, create_bundle_index, BundleIndexHost, MetadataBundler};
use crate::codegen::{CodeGenerator, CodegenOptions, TemplateCompiler};
use crate::diagnostics::{make_error, ErrorCode, PipelineError};
use crate::host::{ClosureCompilerHost, DecoratorDownlevelHost, MetadataWriterHost};
use crate::logging::Logger;
use crate::module_namer::ModuleNamer;

#[derive(Debug, Default)]
pub struct PerformCompilationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub emitted_files: Vec<String>,
    pub generated_files: Vec<String>,
    /// A pass or host contract failed and the run was aborted.
    pub fatal: bool,
}

impl PerformCompilationResult {
    /// 0 on success, 1 when any error was reported, 2 when the run aborted.
    pub fn exit_code(&self) -> i32 {
        if self.fatal {
            2
        } else if self.diagnostics.iter().any(|d| d.is_error()) {
            1
        } else {
            0
        }
    }

    fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }
}

/// Compiler options every Program of the run shares: `rootDirs` always
/// covers the base path and the generated directory so generated units
/// resolve their imports as if they sat beside their sources.
fn effective_options(config: &ParsedConfiguration) -> CompilerOptions {
    let mut options = config.options.clone();
    let mut root_dirs = options.root_dirs.take().unwrap_or_default();
    if root_dirs.is_empty() {
        root_dirs.push(config.base_path.clone());
    }
    let gen_dir = config.gen_dir();
    if !root_dirs.contains(&gen_dir) {
        root_dirs.push(gen_dir);
    }
    options.root_dirs = Some(root_dirs);
    if !config.emit_flags.contains(EmitFlags::DTS) {
        options.declaration = Some(false);
    }
    options
}

fn find_flat_module_index(root_names: &[String]) -> Option<&String> {
    let mut indexes = root_names.iter().filter(|r| basename(r) == "index.ts");
    match (indexes.next(), indexes.next()) {
        (Some(index), None) => Some(index),
        _ => None,
    }
}

/// Run the whole pipeline for `config`. Without a `compiler` no factories are
/// generated.
pub fn perform_compilation(
    config: &ParsedConfiguration,
    host: &dyn CompilerHost,
    compiler: Option<&dyn TemplateCompiler>,
    logger: &dyn Logger,
) -> PerformCompilationResult {
    let mut result = PerformCompilationResult {
        diagnostics: config.errors.clone(),
        ..Default::default()
    };
    if result.has_errors() {
        return result;
    }
    if let Err(error) = run(config, host, compiler, logger, &mut result) {
        logger.error(&format!("compilation aborted: {}", error));
        result.diagnostics.push(error.to_diagnostic());
        result.fatal = true;
    }
    result
}

fn run(
    config: &ParsedConfiguration,
    host: &dyn CompilerHost,
    compiler: Option<&dyn TemplateCompiler>,
    logger: &dyn Logger,
    result: &mut PerformCompilationResult,
) -> Result<(), PipelineError> {
    let angular = &config.angular_options;
    let options = effective_options(config);
    let mut root_names = config.root_names.clone();
    logger.debug(&format!("roots: {}", root_names.join(", ")));

    let mut seed: Option<Program> = None;
    let mut bundle_host: Option<BundleIndexHost> = None;
    if let Some(out_file) = &angular.flat_module_out_file {
        let Some(index) = find_flat_module_index(&root_names) else {
            result.diagnostics.push(make_error(
                ErrorCode::FlatModuleIndexNotFound,
                "Angular compiler option \"flatModuleOutFile\" requires one and only one .ts file named index.ts in the files list",
            ));
            return Ok(());
        };
        let index_file = join(&host.get_current_directory(), index);
        let program = Program::new(&root_names, options.clone(), host, None)?;
        let bundle = {
            let checker = TypeChecker::new(&program);
            MetadataBundler::new(&checker, &index_file, angular.flat_module_id.clone())
                .bundle()
                .map_err(|e| PipelineError::Bundle(e.to_string()))?
        };
        let index_path = bundle_index_path(&index_file, out_file);
        logger.info(&format!(
            "flat module index {}: {} public, {} private symbols",
            index_path,
            bundle.public_symbols.len(),
            bundle.private_symbols.len()
        ));
        let source = create_bundle_index(&index_file, &bundle);
        bundle_host = Some(BundleIndexHost::new(host, &index_path, &source, bundle.metadata));
        root_names.push(index_path);
        seed = Some(program);
    }
    let host: &dyn CompilerHost = match &bundle_host {
        Some(bundle_host) => bundle_host as &dyn CompilerHost,
        None => host,
    };

    let mut program = Program::new(&root_names, options.clone(), host, seed.as_ref())?;
    logger.debug(&format!(
        "program: {} units, {} reused",
        program.source_files().count(),
        program.reused_file_count()
    ));
    result.diagnostics.extend(program.get_options_diagnostics());
    result.diagnostics.extend(program.get_syntactic_diagnostics());
    if result.has_errors() {
        return Ok(());
    }

    if let Some(compiler) = compiler.filter(|_| config.emit_flags.contains(EmitFlags::CODEGEN)) {
        logger.info("generating template factories");
        let codegen_options = CodegenOptions {
            base_path: config.base_path.clone(),
            gen_dir: config.gen_dir(),
            root_dirs: options.root_dirs.clone().unwrap_or_default(),
            core_module: angular.core_module.clone(),
        };
        let generated = CodeGenerator::new(&program, host, compiler, codegen_options, logger).codegen();
        result.diagnostics.extend(generated.diagnostics);
        if !generated.emitted.is_empty() {
            root_names.extend(generated.emitted.iter().cloned());
            program = Program::new(&root_names, options.clone(), host, Some(&program))?;
            logger.debug(&format!("program with generated units: {} reused", program.reused_file_count()));
        }
        result.generated_files = generated.emitted;
    }

    result.diagnostics.extend(program.get_semantic_diagnostics());
    if result.has_errors() {
        return Ok(());
    }

    let downlevel = (angular.annotations_as == AnnotationsAs::StaticFields)
        .then(|| DecoratorDownlevelHost::new(host, &program, &angular.core_module));
    let downlevel_program = match &downlevel {
        Some(downlevel) => {
            logger.info("converting decorators to static fields");
            Some(Program::new(&root_names, options.clone(), downlevel, Some(&program))?)
        }
        None => None,
    };
    let (program, host): (&Program, &dyn CompilerHost) = match (&downlevel, &downlevel_program) {
        (Some(downlevel), Some(rewritten)) => (rewritten, downlevel as &dyn CompilerHost),
        _ => (&program, host),
    };

    let closure = angular.annotate_for_closure_compiler.then(|| {
        let namer = ModuleNamer::new(&angular.closure_module_prefix, &angular.closure_dist_root);
        ClosureCompilerHost::new(host, program, namer, &config.base_path)
    });
    let closure_program = match &closure {
        Some(closure) => {
            logger.info("converting modules to goog.module");
            Some(Program::new(&root_names, options.clone(), closure, Some(program))?)
        }
        None => None,
    };
    let (program, host): (&Program, &dyn CompilerHost) = match (&closure, &closure_program) {
        (Some(closure), Some(rewritten)) => (rewritten, closure as &dyn CompilerHost),
        _ => (program, host),
    };

    let skip_metadata = !config.emit_flags.contains(EmitFlags::METADATA) || angular.flat_module_out_file.is_some();
    let writer = MetadataWriterHost::new(host, angular.strict_metadata_emit, skip_metadata);
    logger.info("emitting");
    let emitted = program.emit(&writer)?;
    if emitted.emit_skipped {
        logger.warn("emit skipped");
    }
    result.emitted_files = emitted.emitted_files;
    result.diagnostics.extend(emitted.diagnostics);
    result.diagnostics.extend(writer.take_diagnostics());
    if let Some(downlevel) = &downlevel {
        result.diagnostics.extend(downlevel.take_diagnostics());
    }
    if let Some(closure) = &closure {
        result.diagnostics.extend(closure.take_diagnostics());
    }
    Ok(())
}
