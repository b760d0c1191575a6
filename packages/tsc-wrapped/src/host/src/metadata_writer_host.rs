// Metadata Writer Host
//
// Writes a `.metadata.json` sidecar beside every emitted JavaScript file whose
// unit exports something annotated. The primary write always happens first.

use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use regex::Regex;
use ts::path::is_dts_file;
use ts::{CompilerHost, DelegatingHost, Diagnostic, HostError, SourceFile};

use crate::metadata::{serialize_sidecar, MetadataCollector};

/// Generated outputs never get sidecars.
static IGNORED_FILES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.ngfactory\.js$|\.ngstyle\.js$").expect("valid regex"));
static JS_EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.js$").expect("valid regex"));

pub struct MetadataWriterHost<'a> {
    delegate: &'a dyn CompilerHost,
    collector: MetadataCollector,
    skip_metadata: bool,
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl<'a> MetadataWriterHost<'a> {
    /// `skip_metadata` turns the host into a pure pass-through writer, used when
    /// metadata emission is off or a flat module bundle replaces the sidecars.
    pub fn new(delegate: &'a dyn CompilerHost, strict: bool, skip_metadata: bool) -> Self {
        Self {
            delegate,
            collector: MetadataCollector::new(strict),
            skip_metadata,
            diagnostics: Mutex::new(Vec::new()),
        }
    }

    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().map(|mut d| std::mem::take(&mut *d)).unwrap_or_default()
    }

    fn write_metadata(&self, js_path: &str, source_file: &Arc<SourceFile>) -> Result<(), HostError> {
        let mut diagnostics = Vec::new();
        let metadata = self.collector.collect(source_file, &mut diagnostics);
        if let Ok(mut all) = self.diagnostics.lock() {
            all.extend(diagnostics);
        }
        let Some(metadata) = metadata else {
            return Ok(());
        };
        let text = serialize_sidecar(&metadata).map_err(|e| HostError::Pass {
            pass: "metadata emit",
            file_name: source_file.file_name.clone(),
            message: e.to_string(),
        })?;
        let path = JS_EXTENSION.replace(js_path, ".metadata.json");
        self.delegate.write_file(&path, &text, std::slice::from_ref(source_file))
    }
}

impl DelegatingHost for MetadataWriterHost<'_> {
    fn delegate(&self) -> &dyn CompilerHost {
        self.delegate
    }

    fn write_file(&self, file_name: &str, data: &str, source_files: &[Arc<SourceFile>]) -> Result<(), HostError> {
        if is_dts_file(file_name) {
            return self.delegate.write_file(file_name, data, source_files);
        }
        let wants_metadata =
            !self.skip_metadata && JS_EXTENSION.is_match(file_name) && !IGNORED_FILES.is_match(file_name);
        if !wants_metadata {
            return self.delegate.write_file(file_name, data, source_files);
        }
        let [source_file] = source_files else {
            return Err(HostError::InvariantViolation(format!(
                "metadata for '{}' needs exactly one source unit, got {}",
                file_name,
                source_files.len()
            )));
        };
        self.delegate.write_file(file_name, data, source_files)?;
        self.write_metadata(file_name, source_file)
    }
}
