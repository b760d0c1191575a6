// Bundle Index Host
//
// Serves the synthetic flat module index as a source unit and writes the
// bundle metadata beside its JavaScript output.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use ts::path::{dirname, join, strip_extension};
use ts::{create_source_file, CompilerHost, DelegatingHost, HostError, SourceFile};

use crate::metadata::ModuleMetadata;

static JS_EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.js$").expect("valid regex"));

/// Path of the synthetic index: `flatModuleOutFile` with a `.ts` extension,
/// in the directory of the library index.
pub fn bundle_index_path(library_index: &str, flat_module_out_file: &str) -> String {
    format!("{}.ts", join(&dirname(library_index), strip_extension(flat_module_out_file)))
}

pub struct BundleIndexHost<'a> {
    delegate: &'a dyn CompilerHost,
    index_path: String,
    index: Arc<SourceFile>,
    metadata: ModuleMetadata,
}

impl<'a> BundleIndexHost<'a> {
    pub fn new(delegate: &'a dyn CompilerHost, index_path: &str, source: &str, metadata: ModuleMetadata) -> Self {
        Self {
            delegate,
            index_path: index_path.to_string(),
            index: Arc::new(create_source_file(index_path, source)),
            metadata,
        }
    }

    pub fn index_path(&self) -> &str {
        &self.index_path
    }

    fn is_index(&self, file_name: &str) -> bool {
        let resolved = join(&self.delegate.get_current_directory(), file_name);
        self.delegate.get_canonical_file_name(&resolved) == self.delegate.get_canonical_file_name(&self.index_path)
    }
}

impl DelegatingHost for BundleIndexHost<'_> {
    fn delegate(&self) -> &dyn CompilerHost {
        self.delegate
    }

    fn get_source_file(&self, file_name: &str) -> Result<Option<Arc<SourceFile>>, HostError> {
        if self.is_index(file_name) {
            return Ok(Some(Arc::clone(&self.index)));
        }
        self.delegate.get_source_file(file_name)
    }

    fn read_file(&self, file_name: &str) -> Option<String> {
        if self.is_index(file_name) {
            return Some(self.index.text.clone());
        }
        self.delegate.read_file(file_name)
    }

    fn file_exists(&self, file_name: &str) -> bool {
        self.is_index(file_name) || self.delegate.file_exists(file_name)
    }

    fn write_file(&self, file_name: &str, data: &str, source_files: &[Arc<SourceFile>]) -> Result<(), HostError> {
        let from_index = source_files.iter().any(|sf| self.is_index(&sf.file_name));
        if from_index && source_files.len() > 1 {
            return Err(HostError::InvariantViolation(format!(
                "bundled emit of '{}' with {} source units is not supported",
                file_name,
                source_files.len()
            )));
        }
        self.delegate.write_file(file_name, data, source_files)?;
        if from_index && JS_EXTENSION.is_match(file_name) {
            let text = serde_json::to_string(&self.metadata).map_err(|e| HostError::Pass {
                pass: "flat module metadata",
                file_name: self.index_path.clone(),
                message: e.to_string(),
            })?;
            let path = JS_EXTENSION.replace(file_name, ".metadata.json");
            self.delegate.write_file(&path, &text, source_files)?;
        }
        Ok(())
    }
}
