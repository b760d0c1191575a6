// Configuration
//
// Reads a project's tsconfig.json: TypeScript compiler options, the
// `angularCompilerOptions` block and the root files, discovered from `files`
// or from `include`/`exclude` globs.

use std::fs;
use std::path::Path;

use bitflags::bitflags;
use serde::Deserialize;
use ts::path::{join, normalize_path};
use ts::{CompilerOptions, Diagnostic};

use crate::diagnostics::{make_error, ErrorCode};

bitflags! {
    /// Outputs a run produces.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EmitFlags: u32 {
        const DTS = 0b0001;
        const JS = 0b0010;
        const METADATA = 0b0100;
        const CODEGEN = 0b1000;
        const DEFAULT = Self::JS.bits() | Self::METADATA.bits() | Self::CODEGEN.bits();
    }
}

/// How annotations reach the emitted JavaScript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum AnnotationsAs {
    /// Left as decorator syntax for the emitter.
    #[serde(rename = "decorators")]
    Decorators,
    /// Rewritten into `decorators`, `ctorParameters` and `propDecorators` static fields.
    #[default]
    #[serde(rename = "static fields")]
    StaticFields,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AngularCompilerOptions {
    pub gen_dir: Option<String>,
    pub base_path: Option<String>,
    pub skip_metadata_emit: bool,
    pub strict_metadata_emit: bool,
    pub skip_template_codegen: bool,
    pub annotations_as: AnnotationsAs,
    pub annotate_for_closure_compiler: bool,
    pub flat_module_out_file: Option<String>,
    pub flat_module_id: Option<String>,
    pub closure_module_prefix: String,
    pub closure_dist_root: String,
    pub core_module: String,
    pub trace: bool,
}

impl Default for AngularCompilerOptions {
    fn default() -> Self {
        Self {
            gen_dir: None,
            base_path: None,
            skip_metadata_emit: false,
            strict_metadata_emit: false,
            skip_template_codegen: false,
            annotations_as: AnnotationsAs::default(),
            annotate_for_closure_compiler: false,
            flat_module_out_file: None,
            flat_module_id: None,
            closure_module_prefix: "@angular".to_string(),
            closure_dist_root: "packages-dist".to_string(),
            core_module: "@angular/core".to_string(),
            trace: false,
        }
    }
}

impl EmitFlags {
    pub fn from_options(options: &CompilerOptions, angular: &AngularCompilerOptions) -> Self {
        let mut flags = EmitFlags::JS;
        if options.declaration.unwrap_or(false) {
            flags |= EmitFlags::DTS;
        }
        if !angular.skip_metadata_emit {
            flags |= EmitFlags::METADATA;
        }
        if !angular.skip_template_codegen {
            flags |= EmitFlags::CODEGEN;
        }
        flags
    }
}

#[derive(Debug, Clone)]
pub struct ParsedConfiguration {
    /// The tsconfig.json the configuration was read from, if any.
    pub project: String,
    pub base_path: String,
    pub root_names: Vec<String>,
    pub options: CompilerOptions,
    pub angular_options: AngularCompilerOptions,
    pub emit_flags: EmitFlags,
    pub errors: Vec<Diagnostic>,
}

impl ParsedConfiguration {
    pub fn new(
        base_path: &str,
        root_names: Vec<String>,
        options: CompilerOptions,
        angular_options: AngularCompilerOptions,
    ) -> Self {
        let emit_flags = EmitFlags::from_options(&options, &angular_options);
        Self {
            project: String::new(),
            base_path: normalize_path(base_path),
            root_names,
            options,
            angular_options,
            emit_flags,
            errors: Vec::new(),
        }
    }

    /// Where generated factories are written; `basePath` unless `genDir` is set.
    pub fn gen_dir(&self) -> String {
        match &self.angular_options.gen_dir {
            Some(gen_dir) => join(&self.base_path, gen_dir),
            None => self.base_path.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TsConfigFile {
    compiler_options: CompilerOptions,
    angular_compiler_options: AngularCompilerOptions,
    files: Option<Vec<String>>,
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
}

/// Remove `//` and `/* */` comments outside string literals.
pub fn strip_json_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                while chars.peek().is_some_and(|&n| n != '\n') {
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for n in chars.by_ref() {
                    if prev == '*' && n == '/' {
                        break;
                    }
                    prev = n;
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Files under `base_dir` matching any `include` glob and no `exclude` glob, sorted.
pub fn discover_files(base_dir: &str, include: &[String], exclude: &[String]) -> Vec<String> {
    let excluded: Vec<glob::Pattern> = exclude
        .iter()
        .filter_map(|pattern| glob::Pattern::new(&join(base_dir, pattern)).ok())
        .collect();
    let mut files = Vec::new();
    for pattern in include {
        let Ok(paths) = glob::glob(&join(base_dir, pattern)) else {
            continue;
        };
        for path in paths.flatten() {
            if !path.is_file() {
                continue;
            }
            let path = normalize_path(&path.to_string_lossy());
            if excluded.iter().any(|p| p.matches(&path)) || files.contains(&path) {
                continue;
            }
            files.push(path);
        }
    }
    files.sort();
    files
}

fn resolve_paths(options: &mut CompilerOptions, base_dir: &str) {
    for path in [&mut options.out_dir, &mut options.root_dir, &mut options.base_url]
        .into_iter()
        .flatten()
    {
        *path = join(base_dir, path);
    }
    if let Some(root_dirs) = &mut options.root_dirs {
        for dir in root_dirs.iter_mut() {
            *dir = join(base_dir, dir);
        }
    }
}

/// Read `project`, a tsconfig.json file or a directory containing one. Paths
/// in the result are absolute. Problems are reported in `errors`.
pub fn read_configuration(project: &str) -> ParsedConfiguration {
    let project_path = Path::new(project);
    let config_path = if project_path.is_dir() {
        join(project, "tsconfig.json")
    } else {
        normalize_path(project)
    };
    let base_dir = ts::path::dirname(&config_path);

    let mut parsed = ParsedConfiguration::new(
        &base_dir,
        Vec::new(),
        CompilerOptions::default(),
        AngularCompilerOptions::default(),
    );
    parsed.project = config_path.clone();

    let text = match fs::read_to_string(&config_path) {
        Ok(text) => text,
        Err(e) => {
            parsed.errors.push(make_error(
                ErrorCode::ConfigInvalid,
                format!("Cannot read project file '{}': {}", config_path, e),
            ));
            return parsed;
        }
    };
    let file: TsConfigFile = match serde_json::from_str(&strip_json_comments(&text)) {
        Ok(file) => file,
        Err(e) => {
            parsed.errors.push(make_error(
                ErrorCode::ConfigInvalid,
                format!("Cannot parse project file '{}': {}", config_path, e),
            ));
            return parsed;
        }
    };

    let mut options = file.compiler_options;
    resolve_paths(&mut options, &base_dir);
    let base_path = match &file.angular_compiler_options.base_path {
        Some(base_path) => join(&base_dir, base_path),
        None => base_dir.clone(),
    };

    let root_names = match file.files {
        Some(files) => files.iter().map(|f| join(&base_dir, f)).collect(),
        None => {
            let include = file.include.unwrap_or_else(|| vec!["**/*.ts".to_string()]);
            let exclude = file.exclude.unwrap_or_else(|| vec!["**/node_modules/**".to_string()]);
            discover_files(&base_dir, &include, &exclude)
        }
    };

    let mut config = ParsedConfiguration::new(&base_path, root_names, options, file.angular_compiler_options);
    config.project = config_path;
    config
}
