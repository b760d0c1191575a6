// Static Reflector
//
// Reads collected metadata back as values: references are resolved to
// canonical symbols through the type checker, references to exported
// constants are replaced by the constant's value and spreads are flattened.

use std::collections::HashMap;

use indexmap::IndexMap;
use ts::path::strip_extension;
use ts::{CompilerHost, Symbol, SymbolKind, TypeChecker};

use crate::host::{AnnotationKind, AnnotationRegistry};
use crate::metadata::{
    parse_metadata, MetadataCollector, MetadataEntry, MetadataSymbolicExpression, MetadataValue, ModuleMetadata,
    METADATA_VERSION, QUOTED_KEYS,
};

const MAX_DEPTH: usize = 16;

/// A metadata value with its references resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum StaticValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<StaticValue>),
    Object(IndexMap<String, StaticValue>),
    Symbol(Symbol),
    /// A node that is kept as collected.
    Opaque(MetadataValue),
}

impl StaticValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StaticValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&StaticValue> {
        match self {
            StaticValue::Object(object) => object.get(key),
            _ => None,
        }
    }

    /// Every string of an array value.
    pub fn strings(&self) -> Vec<String> {
        match self {
            StaticValue::Array(items) => items.iter().filter_map(|i| i.as_str().map(str::to_string)).collect(),
            _ => Vec::new(),
        }
    }

    /// Every symbol of an array value, nested arrays included.
    pub fn symbols(&self) -> Vec<Symbol> {
        match self {
            StaticValue::Symbol(symbol) => vec![symbol.clone()],
            StaticValue::Array(items) => items.iter().flat_map(|i| i.symbols()).collect(),
            _ => Vec::new(),
        }
    }
}

/// One recognized annotation on a class.
#[derive(Debug, Clone)]
pub struct ResolvedAnnotation {
    pub kind: AnnotationKind,
    pub arguments: Vec<StaticValue>,
}

pub struct StaticReflector<'a> {
    checker: &'a TypeChecker<'a>,
    registry: &'a AnnotationRegistry,
    metadata: HashMap<String, ModuleMetadata>,
}

impl<'a> StaticReflector<'a> {
    /// Collects metadata for every source unit of the checker's Program.
    /// Declaration units are described by the sidecar written next to them.
    pub fn new(checker: &'a TypeChecker<'a>, registry: &'a AnnotationRegistry, host: &dyn CompilerHost) -> Self {
        let collector = MetadataCollector::new(false);
        let mut metadata = HashMap::new();
        for source_file in checker.program().source_files() {
            let collected = if source_file.is_declaration_file {
                let path = format!("{}.metadata.json", strip_extension(&source_file.file_name));
                host.read_file(&path)
                    .and_then(|text| parse_metadata(&path, &text).ok())
                    .and_then(|documents| documents.into_iter().max_by_key(|d| d.version))
                    .filter(|d| d.version <= METADATA_VERSION)
            } else {
                Some(collector.describe(source_file, &mut Vec::new()))
            };
            if let Some(collected) = collected {
                metadata.insert(source_file.file_name.clone(), collected);
            }
        }
        Self {
            checker,
            registry,
            metadata,
        }
    }

    pub fn metadata_of(&self, file_name: &str) -> Option<&ModuleMetadata> {
        self.metadata.get(file_name)
    }

    /// Resolve a reference node written in `file_name`.
    pub fn resolve_reference(&self, file_name: &str, name: &str, module: Option<&str>) -> Option<Symbol> {
        match module {
            Some(module) => self.checker.resolve_import(file_name, module, name),
            None => self
                .checker
                .resolve_export(file_name, name)
                .or_else(|| self.checker.symbol_at(file_name, name)),
        }
    }

    pub fn simplify(&self, file_name: &str, value: &MetadataValue) -> StaticValue {
        self.simplify_at(file_name, value, 0)
    }

    fn simplify_at(&self, file_name: &str, value: &MetadataValue, depth: usize) -> StaticValue {
        match value {
            MetadataValue::Null => StaticValue::Null,
            MetadataValue::Bool(b) => StaticValue::Bool(*b),
            MetadataValue::Number(n) => n.as_f64().map(StaticValue::Number).unwrap_or(StaticValue::Null),
            MetadataValue::String(s) => StaticValue::String(s.clone()),
            MetadataValue::Array(items) => {
                let mut result = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(MetadataSymbolicExpression::Spread { expression }) = item.as_symbolic() {
                        match self.simplify_at(file_name, expression, depth) {
                            StaticValue::Array(spread) => result.extend(spread),
                            _ => result.push(StaticValue::Opaque(item.clone())),
                        }
                    } else {
                        result.push(self.simplify_at(file_name, item, depth));
                    }
                }
                StaticValue::Array(result)
            }
            MetadataValue::Object(object) => StaticValue::Object(
                object
                    .iter()
                    .filter(|(key, _)| key.as_str() != QUOTED_KEYS)
                    .map(|(key, v)| (key.clone(), self.simplify_at(file_name, v, depth)))
                    .collect(),
            ),
            MetadataValue::Symbolic(expression) => match expression.as_ref() {
                MetadataSymbolicExpression::Reference { name, module } => {
                    let Some(symbol) = self.resolve_reference(file_name, name, module.as_deref()) else {
                        return StaticValue::Opaque(value.clone());
                    };
                    if symbol.kind == SymbolKind::Variable && depth < MAX_DEPTH {
                        let constant = self
                            .metadata
                            .get(&symbol.file_name)
                            .and_then(|m| m.metadata.get(&symbol.name));
                        if let Some(MetadataEntry::Value(constant)) = constant {
                            return self.simplify_at(&symbol.file_name, constant, depth + 1);
                        }
                    }
                    StaticValue::Symbol(symbol)
                }
                _ => StaticValue::Opaque(value.clone()),
            },
        }
    }

    /// The recognized annotations on class `class_name` of `file_name`.
    pub fn annotations(&self, file_name: &str, class_name: &str) -> Vec<ResolvedAnnotation> {
        let Some(MetadataEntry::Class(class)) = self.metadata_of(file_name).and_then(|m| m.metadata.get(class_name))
        else {
            return Vec::new();
        };
        class
            .decorators
            .iter()
            .flatten()
            .filter_map(|decorator| {
                let MetadataSymbolicExpression::Call { expression, arguments } = decorator.as_symbolic()? else {
                    return None;
                };
                let MetadataSymbolicExpression::Reference { name, module } = expression.as_symbolic()? else {
                    return None;
                };
                let symbol = self.resolve_reference(file_name, name, module.as_deref())?;
                let kind = self.registry.kind_of(&symbol)?;
                Some(ResolvedAnnotation {
                    kind,
                    arguments: arguments.iter().map(|a| self.simplify(file_name, a)).collect(),
                })
            })
            .collect()
    }
}
