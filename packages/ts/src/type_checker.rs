// Type Checker
//
// Symbol resolution over a Program. Every local name, import binding and
// re-export is followed to the declaration that introduces it, so two
// references are the same symbol exactly when they resolve to the same
// `Symbol`, whatever they were called at the use site.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::node::{ExportClause, Expression, ExpressionKind, ImportedName, SourceFile, Statement, TypeDeclarationKind};
use crate::path::{dirname, is_relative_specifier, join};
use crate::program::Program;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolKind {
    Class,
    Function,
    Variable,
    Interface,
    TypeAlias,
    Enum,
    Namespace,
    /// A whole module, as bound by `import * as ns`.
    Module,
    /// Declared in a module that is not part of the Program.
    Ambient,
}

impl SymbolKind {
    /// Whether the symbol exists at runtime. Ambient symbols are assumed to.
    pub fn is_value(&self) -> bool {
        !matches!(self, SymbolKind::Interface | SymbolKind::TypeAlias)
    }
}

/// The canonical identity of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    /// Declaring unit, or the module specifier for modules outside the Program.
    pub file_name: String,
    pub name: String,
    pub kind: SymbolKind,
}

impl Symbol {
    pub fn new(file_name: impl Into<String>, name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            file_name: file_name.into(),
            name: name.into(),
            kind,
        }
    }

    /// Identity of `name` exported from a module the Program could not load.
    pub fn ambient(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(module, name, SymbolKind::Ambient)
    }

    pub fn is_ambient(&self) -> bool {
        self.kind == SymbolKind::Ambient
    }
}

pub struct TypeChecker<'p> {
    program: &'p Program,
}

fn declaration_kind(statement: &Statement) -> Option<SymbolKind> {
    Some(match statement {
        Statement::Class(_) => SymbolKind::Class,
        Statement::Function(_) => SymbolKind::Function,
        Statement::Variable(_) => SymbolKind::Variable,
        Statement::Type(t) => match t.kind {
            TypeDeclarationKind::Interface => SymbolKind::Interface,
            TypeDeclarationKind::TypeAlias => SymbolKind::TypeAlias,
            TypeDeclarationKind::Enum => SymbolKind::Enum,
            TypeDeclarationKind::Namespace => SymbolKind::Namespace,
        },
        _ => return None,
    })
}

fn declares(statement: &Statement, name: &str) -> bool {
    match statement {
        Statement::Variable(var) => var.declarations.iter().any(|d| d.name.as_deref() == Some(name)),
        other => other.declared_name() == Some(name),
    }
}

impl<'p> TypeChecker<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self { program }
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    /// Resolve a name used at module scope of `file_name`.
    pub fn symbol_at(&self, file_name: &str, local_name: &str) -> Option<Symbol> {
        let source_file = self.program.get_source_file(file_name)?;
        self.resolve_local(source_file, local_name, &mut HashSet::new())
    }

    /// Resolve `export_name` as exported by the unit `module_file`.
    pub fn resolve_export(&self, module_file: &str, export_name: &str) -> Option<Symbol> {
        self.resolve_export_inner(module_file, export_name, &mut HashSet::new())
    }

    /// Resolve `export_name` of `specifier` as imported from `containing_file`.
    pub fn resolve_import(&self, containing_file: &str, specifier: &str, export_name: &str) -> Option<Symbol> {
        match self.program.resolve_module(containing_file, specifier) {
            Some(target) => self.resolve_export(target, export_name),
            None => Some(Symbol::ambient(self.ambient_module(containing_file, specifier), export_name)),
        }
    }

    /// The module `specifier` names, for modules the Program could not load.
    pub fn ambient_module(&self, containing_file: &str, specifier: &str) -> String {
        if is_relative_specifier(specifier) {
            join(&dirname(containing_file), specifier)
        } else {
            specifier.to_string()
        }
    }

    fn resolve_local(
        &self,
        source_file: &SourceFile,
        local_name: &str,
        visited: &mut HashSet<(String, String)>,
    ) -> Option<Symbol> {
        for statement in &source_file.statements {
            if let Statement::Import(import) = statement {
                let Some(binding) = import.bindings.iter().find(|b| b.local == local_name) else {
                    continue;
                };
                let target = self.program.resolve_module(&source_file.file_name, &import.module_specifier);
                return match (&binding.imported, target) {
                    (ImportedName::Namespace, Some(target)) => Some(Symbol::new(target, "*", SymbolKind::Module)),
                    (ImportedName::Namespace, None) => Some(Symbol::ambient(
                        self.ambient_module(&source_file.file_name, &import.module_specifier),
                        "*",
                    )),
                    (imported, Some(target)) => {
                        let name = match imported {
                            ImportedName::Named(name) => name.as_str(),
                            _ => "default",
                        };
                        self.resolve_export_inner(target, name, visited)
                    }
                    (imported, None) => {
                        let name = match imported {
                            ImportedName::Named(name) => name.as_str(),
                            _ => "default",
                        };
                        Some(Symbol::ambient(
                            self.ambient_module(&source_file.file_name, &import.module_specifier),
                            name,
                        ))
                    }
                };
            }
        }

        source_file
            .statements
            .iter()
            .find(|s| declares(s, local_name))
            .and_then(|s| declaration_kind(s))
            .map(|kind| Symbol::new(&source_file.file_name, local_name, kind))
    }

    fn resolve_export_inner(
        &self,
        module_file: &str,
        export_name: &str,
        visited: &mut HashSet<(String, String)>,
    ) -> Option<Symbol> {
        let source_file = self.program.get_source_file(module_file)?;
        if !visited.insert((source_file.file_name.clone(), export_name.to_string())) {
            return None;
        }
        let file_name = source_file.file_name.as_str();

        for statement in &source_file.statements {
            match statement {
                Statement::ExportLocal(export) => {
                    if let Some(spec) = export.specifiers.iter().find(|s| s.exported == export_name) {
                        return self.resolve_local(source_file, &spec.local, visited);
                    }
                }
                Statement::ExportAssignment(assign) if export_name == "default" => {
                    if let Some(Expression {
                        kind: ExpressionKind::Identifier(name),
                        ..
                    }) = &assign.expression
                    {
                        return self.resolve_local(source_file, name, visited);
                    }
                    return Some(Symbol::new(file_name, "default", SymbolKind::Variable));
                }
                Statement::ExportFrom(export) => {
                    let target = self.program.resolve_module(file_name, &export.module_specifier);
                    match &export.clause {
                        ExportClause::Named(specifiers) => {
                            if let Some(spec) = specifiers.iter().find(|s| s.exported == export_name) {
                                return match target {
                                    Some(target) => self.resolve_export_inner(target, &spec.local, visited),
                                    None => Some(Symbol::ambient(
                                        self.ambient_module(file_name, &export.module_specifier),
                                        spec.local.clone(),
                                    )),
                                };
                            }
                        }
                        ExportClause::Namespace(ns) if ns == export_name => {
                            return Some(match target {
                                Some(target) => Symbol::new(target, "*", SymbolKind::Module),
                                None => Symbol::ambient(self.ambient_module(file_name, &export.module_specifier), "*"),
                            });
                        }
                        _ => {}
                    }
                }
                other => {
                    let Some(modifiers) = other.modifiers() else { continue };
                    if !modifiers.exported {
                        continue;
                    }
                    let matches = if modifiers.is_default {
                        export_name == "default"
                    } else {
                        declares(other, export_name)
                    };
                    if matches {
                        let name = if modifiers.is_default {
                            other.declared_name().unwrap_or("default")
                        } else {
                            export_name
                        };
                        return declaration_kind(other).map(|kind| Symbol::new(file_name, name, kind));
                    }
                }
            }
        }

        if export_name == "default" {
            return None;
        }
        for statement in &source_file.statements {
            if let Statement::ExportFrom(export) = statement {
                if export.clause != ExportClause::All {
                    continue;
                }
                if let Some(target) = self.program.resolve_module(file_name, &export.module_specifier) {
                    if let Some(found) = self.resolve_export_inner(target, export_name, visited) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }

    /// Every name a module exports, mapped to its canonical symbol.
    pub fn exports_of_module(&self, module_file: &str) -> IndexMap<String, Symbol> {
        let mut exports = IndexMap::new();
        self.collect_exports(module_file, &mut exports, &mut HashSet::new());
        exports
    }

    fn collect_exports(&self, module_file: &str, exports: &mut IndexMap<String, Symbol>, visited: &mut HashSet<String>) {
        let Some(source_file) = self.program.get_source_file(module_file) else {
            return;
        };
        if !visited.insert(source_file.file_name.clone()) {
            return;
        }
        let is_root = visited.len() == 1;

        let mut names: Vec<String> = Vec::new();
        for statement in &source_file.statements {
            match statement {
                Statement::ExportLocal(export) => names.extend(export.specifiers.iter().map(|s| s.exported.clone())),
                Statement::ExportAssignment(_) => names.push("default".to_string()),
                Statement::ExportFrom(export) => match &export.clause {
                    ExportClause::Named(specifiers) => names.extend(specifiers.iter().map(|s| s.exported.clone())),
                    ExportClause::Namespace(ns) => names.push(ns.clone()),
                    ExportClause::All => {}
                },
                Statement::Variable(var) if var.modifiers.exported => {
                    names.extend(var.declarations.iter().filter_map(|d| d.name.clone()));
                }
                other => {
                    if let Some(modifiers) = other.modifiers().filter(|m| m.exported) {
                        if modifiers.is_default {
                            names.push("default".to_string());
                        } else if let Some(name) = other.declared_name() {
                            names.push(name.to_string());
                        }
                    }
                }
            }
        }

        for name in names {
            if exports.contains_key(&name) || (!is_root && name == "default") {
                continue;
            }
            if let Some(symbol) = self.resolve_export(&source_file.file_name, &name) {
                exports.insert(name, symbol);
            }
        }

        for statement in &source_file.statements {
            if let Statement::ExportFrom(export) = statement {
                if export.clause == ExportClause::All {
                    if let Some(target) = self.program.resolve_module(&source_file.file_name, &export.module_specifier) {
                        self.collect_exports(target, exports, visited);
                    }
                }
            }
        }
    }
}
