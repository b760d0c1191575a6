// Compiler Host
//
// Abstraction for the compilation host environment. Every pass of the pipeline
// talks to the file system only through a `CompilerHost`; wrappers compose by
// implementing `DelegatingHost` and overriding the operations they change.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use thiserror::Error;

use crate::node::SourceFile;
use crate::parser::create_source_file;
use crate::path::{join, normalize_path};

#[derive(Debug, Error)]
pub enum HostError {
    #[error("cannot read file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot write file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot delete file '{path}': {source}")]
    Delete {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A host was used in a way its contract forbids.
    #[error("{0}")]
    InvariantViolation(String),

    /// A source transformation could not be applied to a unit.
    #[error("{pass} failed for '{file_name}': {message}")]
    Pass {
        pass: &'static str,
        file_name: String,
        message: String,
    },
}

/// Compilation host interface.
pub trait CompilerHost: Send + Sync {
    /// Load and parse a unit. `Ok(None)` means the file does not exist.
    fn get_source_file(&self, file_name: &str) -> Result<Option<Arc<SourceFile>>, HostError>;

    fn read_file(&self, file_name: &str) -> Option<String>;

    /// Write an output. `source_files` are the units the output was produced from.
    fn write_file(&self, file_name: &str, data: &str, source_files: &[Arc<SourceFile>]) -> Result<(), HostError>;

    /// Remove an output written earlier. Deleting a missing file is not an error.
    fn delete_file(&self, file_name: &str) -> Result<(), HostError>;

    fn file_exists(&self, file_name: &str) -> bool;

    fn directory_exists(&self, directory_name: &str) -> bool;

    fn get_current_directory(&self) -> String;

    fn get_canonical_file_name(&self, file_name: &str) -> String;

    fn use_case_sensitive_file_names(&self) -> bool;

    fn get_new_line(&self) -> String {
        "\n".to_string()
    }
}

/// A host that forwards every operation to an inner host unless overridden.
///
/// Implementors only provide `delegate()` plus the operations they intercept;
/// the blanket impl below makes them usable anywhere a `CompilerHost` is.
pub trait DelegatingHost: Send + Sync {
    fn delegate(&self) -> &dyn CompilerHost;

    fn get_source_file(&self, file_name: &str) -> Result<Option<Arc<SourceFile>>, HostError> {
        self.delegate().get_source_file(file_name)
    }

    fn read_file(&self, file_name: &str) -> Option<String> {
        self.delegate().read_file(file_name)
    }

    fn write_file(&self, file_name: &str, data: &str, source_files: &[Arc<SourceFile>]) -> Result<(), HostError> {
        self.delegate().write_file(file_name, data, source_files)
    }

    fn delete_file(&self, file_name: &str) -> Result<(), HostError> {
        self.delegate().delete_file(file_name)
    }

    fn file_exists(&self, file_name: &str) -> bool {
        self.delegate().file_exists(file_name)
    }

    fn directory_exists(&self, directory_name: &str) -> bool {
        self.delegate().directory_exists(directory_name)
    }

    fn get_current_directory(&self) -> String {
        self.delegate().get_current_directory()
    }

    fn get_canonical_file_name(&self, file_name: &str) -> String {
        self.delegate().get_canonical_file_name(file_name)
    }

    fn use_case_sensitive_file_names(&self) -> bool {
        self.delegate().use_case_sensitive_file_names()
    }

    fn get_new_line(&self) -> String {
        self.delegate().get_new_line()
    }
}

impl<T: DelegatingHost> CompilerHost for T {
    fn get_source_file(&self, file_name: &str) -> Result<Option<Arc<SourceFile>>, HostError> {
        DelegatingHost::get_source_file(self, file_name)
    }

    fn read_file(&self, file_name: &str) -> Option<String> {
        DelegatingHost::read_file(self, file_name)
    }

    fn write_file(&self, file_name: &str, data: &str, source_files: &[Arc<SourceFile>]) -> Result<(), HostError> {
        DelegatingHost::write_file(self, file_name, data, source_files)
    }

    fn delete_file(&self, file_name: &str) -> Result<(), HostError> {
        DelegatingHost::delete_file(self, file_name)
    }

    fn file_exists(&self, file_name: &str) -> bool {
        DelegatingHost::file_exists(self, file_name)
    }

    fn directory_exists(&self, directory_name: &str) -> bool {
        DelegatingHost::directory_exists(self, directory_name)
    }

    fn get_current_directory(&self) -> String {
        DelegatingHost::get_current_directory(self)
    }

    fn get_canonical_file_name(&self, file_name: &str) -> String {
        DelegatingHost::get_canonical_file_name(self, file_name)
    }

    fn use_case_sensitive_file_names(&self) -> bool {
        DelegatingHost::use_case_sensitive_file_names(self)
    }

    fn get_new_line(&self) -> String {
        DelegatingHost::get_new_line(self)
    }
}

/// Parsed units keyed by file name. A unit is reused only while its text is
/// unchanged, which is what lets a new Program share units with the old one.
#[derive(Default)]
pub struct SourceFileCache {
    files: RwLock<HashMap<String, Arc<SourceFile>>>,
}

impl SourceFileCache {
    pub fn get_or_parse(&self, file_name: &str, text: String) -> Arc<SourceFile> {
        if let Ok(files) = self.files.read() {
            if let Some(existing) = files.get(file_name) {
                if existing.text == text {
                    return Arc::clone(existing);
                }
            }
        }
        let parsed = Arc::new(create_source_file(file_name, &text));
        if let Ok(mut files) = self.files.write() {
            files.insert(file_name.to_string(), Arc::clone(&parsed));
        }
        parsed
    }
}

fn platform_is_case_sensitive() -> bool {
    !cfg!(any(windows, target_os = "macos"))
}

/// Host backed by the real file system.
pub struct NodeCompilerHost {
    current_directory: String,
    cache: SourceFileCache,
}

impl NodeCompilerHost {
    pub fn new(current_directory: impl Into<String>) -> Self {
        Self {
            current_directory: normalize_path(&current_directory.into()),
            cache: SourceFileCache::default(),
        }
    }

    fn resolve(&self, file_name: &str) -> String {
        join(&self.current_directory, file_name)
    }
}

impl CompilerHost for NodeCompilerHost {
    fn get_source_file(&self, file_name: &str) -> Result<Option<Arc<SourceFile>>, HostError> {
        let path = self.resolve(file_name);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(self.cache.get_or_parse(&path, text))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(HostError::Read { path, source }),
        }
    }

    fn read_file(&self, file_name: &str) -> Option<String> {
        std::fs::read_to_string(self.resolve(file_name)).ok()
    }

    fn write_file(&self, file_name: &str, data: &str, _source_files: &[Arc<SourceFile>]) -> Result<(), HostError> {
        let path = self.resolve(file_name);
        if let Some(parent) = Path::new(&path).parent() {
            std::fs::create_dir_all(parent).map_err(|source| HostError::Write {
                path: path.clone(),
                source,
            })?;
        }
        std::fs::write(&path, data).map_err(|source| HostError::Write { path, source })
    }

    fn delete_file(&self, file_name: &str) -> Result<(), HostError> {
        let path = self.resolve(file_name);
        match std::fs::remove_file(&path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(HostError::Delete { path, source: e }),
            _ => Ok(()),
        }
    }

    fn file_exists(&self, file_name: &str) -> bool {
        Path::new(&self.resolve(file_name)).is_file()
    }

    fn directory_exists(&self, directory_name: &str) -> bool {
        Path::new(&self.resolve(directory_name)).is_dir()
    }

    fn get_current_directory(&self) -> String {
        self.current_directory.clone()
    }

    fn get_canonical_file_name(&self, file_name: &str) -> String {
        if platform_is_case_sensitive() {
            file_name.to_string()
        } else {
            file_name.to_lowercase()
        }
    }

    fn use_case_sensitive_file_names(&self) -> bool {
        platform_is_case_sensitive()
    }
}

/// One recorded `write_file` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub file_name: String,
    pub data: String,
    pub source_file_names: Vec<String>,
}

/// In-memory compiler host. Written files become readable, so generated units
/// can be loaded by the next Program like any other file.
pub struct InMemoryCompilerHost {
    files: RwLock<BTreeMap<String, String>>,
    writes: Mutex<Vec<WrittenFile>>,
    current_directory: String,
    cache: SourceFileCache,
}

impl InMemoryCompilerHost {
    pub fn new(current_directory: impl Into<String>) -> Self {
        Self {
            files: RwLock::new(BTreeMap::new()),
            writes: Mutex::new(Vec::new()),
            current_directory: normalize_path(&current_directory.into()),
            cache: SourceFileCache::default(),
        }
    }

    pub fn with_files<I, P, C>(current_directory: impl Into<String>, files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: Into<String>,
    {
        let host = Self::new(current_directory);
        for (path, content) in files {
            host.add_file(path.as_ref(), content);
        }
        host
    }

    pub fn add_file(&self, path: &str, content: impl Into<String>) {
        let key = self.resolve(path);
        if let Ok(mut files) = self.files.write() {
            files.insert(key, content.into());
        }
    }

    /// Every write in call order.
    pub fn written_files(&self) -> Vec<WrittenFile> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }

    /// Contents of the last write to `path`, if any.
    pub fn written(&self, path: &str) -> Option<String> {
        let key = self.resolve(path);
        self.written_files()
            .into_iter()
            .rev()
            .find(|w| w.file_name == key)
            .map(|w| w.data)
    }

    fn resolve(&self, file_name: &str) -> String {
        join(&self.current_directory, file_name)
    }
}

impl CompilerHost for InMemoryCompilerHost {
    fn get_source_file(&self, file_name: &str) -> Result<Option<Arc<SourceFile>>, HostError> {
        Ok(self
            .read_file(file_name)
            .map(|text| self.cache.get_or_parse(&self.resolve(file_name), text)))
    }

    fn read_file(&self, file_name: &str) -> Option<String> {
        let key = self.resolve(file_name);
        self.files.read().ok().and_then(|files| files.get(&key).cloned())
    }

    fn write_file(&self, file_name: &str, data: &str, source_files: &[Arc<SourceFile>]) -> Result<(), HostError> {
        let key = self.resolve(file_name);
        self.files
            .write()
            .map_err(|_| HostError::InvariantViolation("in-memory file table poisoned".to_string()))?
            .insert(key.clone(), data.to_string());
        self.writes
            .lock()
            .map_err(|_| HostError::InvariantViolation("in-memory write log poisoned".to_string()))?
            .push(WrittenFile {
                file_name: key,
                data: data.to_string(),
                source_file_names: source_files.iter().map(|sf| sf.file_name.clone()).collect(),
            });
        Ok(())
    }

    /// Drops the file and every recorded write to it.
    fn delete_file(&self, file_name: &str) -> Result<(), HostError> {
        let key = self.resolve(file_name);
        self.files
            .write()
            .map_err(|_| HostError::InvariantViolation("in-memory file table poisoned".to_string()))?
            .remove(&key);
        self.writes
            .lock()
            .map_err(|_| HostError::InvariantViolation("in-memory write log poisoned".to_string()))?
            .retain(|w| w.file_name != key);
        Ok(())
    }

    fn file_exists(&self, file_name: &str) -> bool {
        let key = self.resolve(file_name);
        self.files.read().map(|files| files.contains_key(&key)).unwrap_or(false)
    }

    fn directory_exists(&self, directory_name: &str) -> bool {
        let prefix = format!("{}/", self.resolve(directory_name).trim_end_matches('/'));
        self.files
            .read()
            .map(|files| files.keys().any(|k| k.starts_with(&prefix)))
            .unwrap_or(false)
    }

    fn get_current_directory(&self) -> String {
        self.current_directory.clone()
    }

    fn get_canonical_file_name(&self, file_name: &str) -> String {
        file_name.to_string()
    }

    fn use_case_sensitive_file_names(&self) -> bool {
        true
    }
}

