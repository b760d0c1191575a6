// Metadata Bundler
//
// Builds the flat module bundle of a library: the public surface exported by
// the index unit, the private symbols generated code still needs, and one
// metadata document merging every reachable unit with references rewritten to
// bundle names.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use thiserror::Error;
use ts::path::{dirname, is_relative_specifier, relative, strip_extension};
use ts::{Symbol, TypeChecker};

use super::index_writer::private_name;
use crate::metadata::{
    MetadataCollector, MetadataEntry, MetadataSymbolicExpression, MetadataValue, ModuleExportMetadata, ModuleMetadata,
};

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("flat module index '{0}' is not part of the program")]
    IndexNotFound(String),
}

/// A symbol of the bundle and where it comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundledSymbol {
    pub symbol: Symbol,
    /// The name the origin module exports it under.
    pub export_name: String,
    /// Origin module, relative to the index directory (`./src/b`), or the bare
    /// specifier of an external module.
    pub module: String,
}

#[derive(Debug, Clone)]
pub struct FlatModuleBundle {
    pub public_symbols: IndexMap<String, BundledSymbol>,
    pub private_symbols: IndexMap<String, BundledSymbol>,
    pub metadata: ModuleMetadata,
}

pub struct MetadataBundler<'a> {
    checker: &'a TypeChecker<'a>,
    index_file: String,
    import_as: Option<String>,
}

impl<'a> MetadataBundler<'a> {
    pub fn new(checker: &'a TypeChecker<'a>, index_file: &str, import_as: Option<String>) -> Self {
        Self {
            checker,
            index_file: index_file.to_string(),
            import_as,
        }
    }

    /// Units reachable from `index` through relative imports and re-exports,
    /// breadth first, each once.
    fn reachable_units(&self, index: &str) -> Vec<String> {
        let program = self.checker.program();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue = VecDeque::from([index.to_string()]);
        let mut units = Vec::new();
        while let Some(unit) = queue.pop_front() {
            if !visited.insert(unit.clone()) {
                continue;
            }
            let Some(source_file) = program.get_source_file(&unit) else { continue };
            if source_file.is_declaration_file {
                continue;
            }
            for specifier in source_file.module_specifiers() {
                if !is_relative_specifier(specifier) {
                    continue;
                }
                if let Some(target) = program.resolve_module(&unit, specifier) {
                    if !visited.contains(target) {
                        queue.push_back(target.to_string());
                    }
                }
            }
            units.push(unit);
        }
        units
    }

    fn module_of(&self, index_dir: &str, symbol: &Symbol) -> String {
        let declared_in_library = self
            .checker
            .program()
            .get_source_file(&symbol.file_name)
            .is_some_and(|sf| !sf.is_declaration_file);
        if !declared_in_library {
            return symbol.file_name.clone();
        }
        let rel = relative(index_dir, strip_extension(&symbol.file_name));
        if rel.starts_with("../") {
            rel
        } else {
            format!("./{}", rel)
        }
    }

    fn rewrite_reference(&self, unit: &str, names: &HashMap<Symbol, String>, node: MetadataValue) -> MetadataValue {
        let replacement = match node.as_symbolic() {
            Some(MetadataSymbolicExpression::Reference { name, module }) => {
                let symbol = match module.as_deref() {
                    Some(module) if is_relative_specifier(module) => self.checker.resolve_import(unit, module, name),
                    Some(_) => None,
                    None => self.checker.resolve_export(unit, name),
                };
                symbol.and_then(|s| names.get(&s)).cloned()
            }
            _ => None,
        };
        match replacement {
            Some(bundle_name) => MetadataValue::reference(bundle_name, None),
            None => node,
        }
    }

    pub fn bundle(&self) -> Result<FlatModuleBundle, BundleError> {
        let program = self.checker.program();
        let index = program
            .get_source_file(&self.index_file)
            .ok_or_else(|| BundleError::IndexNotFound(self.index_file.clone()))?;
        let index_file = index.file_name.clone();
        let index_dir = dirname(&index_file);
        let units = self.reachable_units(&index_file);

        let mut names: HashMap<Symbol, String> = HashMap::new();
        let mut public_symbols = IndexMap::new();
        for (name, symbol) in self.checker.exports_of_module(&index_file) {
            names.entry(symbol.clone()).or_insert_with(|| name.clone());
            let module = self.module_of(&index_dir, &symbol);
            public_symbols.insert(
                name.clone(),
                BundledSymbol {
                    symbol,
                    export_name: name,
                    module,
                },
            );
        }

        let mut candidates: Vec<(String, String, Symbol)> = Vec::new();
        for unit in &units {
            for (export_name, symbol) in self.checker.exports_of_module(unit) {
                if symbol.file_name == *unit && !names.contains_key(&symbol) {
                    candidates.push((self.module_of(&index_dir, &symbol), export_name, symbol));
                }
            }
        }
        candidates.sort();

        let mut private_symbols = IndexMap::new();
        for (module, export_name, symbol) in candidates {
            if names.contains_key(&symbol) {
                continue;
            }
            let name = private_name(private_symbols.len());
            names.insert(symbol.clone(), name.clone());
            private_symbols.insert(
                name,
                BundledSymbol {
                    symbol,
                    export_name,
                    module,
                },
            );
        }

        let collector = MetadataCollector::new(false);
        let mut entries: HashMap<String, (MetadataEntry, String)> = HashMap::new();
        let mut exports: Vec<ModuleExportMetadata> = Vec::new();
        for unit in &units {
            let Some(source_file) = program.get_source_file(unit) else { continue };
            let metadata = collector.describe(source_file, &mut Vec::new());
            for (key, entry) in metadata.metadata {
                let Some(symbol) = self.checker.resolve_export(unit, &key) else { continue };
                let Some(bundle_name) = names.get(&symbol) else { continue };
                let entry = entry.map_nodes(&mut |node| self.rewrite_reference(unit, &names, node));
                entries.insert(bundle_name.clone(), (entry, self.module_of(&index_dir, &symbol)));
            }
            for export in metadata.exports.into_iter().flatten() {
                if !is_relative_specifier(&export.from) && !exports.contains(&export) {
                    exports.push(export);
                }
            }
        }

        let mut merged = IndexMap::new();
        let mut origins = IndexMap::new();
        for name in public_symbols.keys().chain(private_symbols.keys()) {
            if let Some((entry, origin)) = entries.remove(name) {
                merged.insert(name.clone(), entry);
                origins.insert(name.clone(), origin);
            }
        }

        let mut metadata = ModuleMetadata::new(merged);
        metadata.import_as = self.import_as.clone();
        metadata.origins = Some(origins);
        if !exports.is_empty() {
            metadata.exports = Some(exports);
        }

        Ok(FlatModuleBundle {
            public_symbols,
            private_symbols,
            metadata,
        })
    }
}
