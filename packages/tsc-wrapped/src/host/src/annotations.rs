// Annotation Registry
//
// Recognizes annotations by the declaration they resolve to, never by the
// name written at the use site, so `import {Component as C}` and
// `import * as core` usages classify the same as a plain import.

use std::collections::HashMap;

use ts::{Decorator, Expression, ExpressionKind, Symbol, SymbolKind, TypeChecker};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    Component,
    Directive,
    NgModule,
    Pipe,
    Injectable,
    Input,
    Output,
    HostBinding,
    HostListener,
    ContentChild,
    ContentChildren,
    ViewChild,
    ViewChildren,
    Inject,
    Optional,
    Self_,
    SkipSelf,
    Host,
    Attribute,
}

impl AnnotationKind {
    pub const ALL: [AnnotationKind; 19] = [
        AnnotationKind::Component,
        AnnotationKind::Directive,
        AnnotationKind::NgModule,
        AnnotationKind::Pipe,
        AnnotationKind::Injectable,
        AnnotationKind::Input,
        AnnotationKind::Output,
        AnnotationKind::HostBinding,
        AnnotationKind::HostListener,
        AnnotationKind::ContentChild,
        AnnotationKind::ContentChildren,
        AnnotationKind::ViewChild,
        AnnotationKind::ViewChildren,
        AnnotationKind::Inject,
        AnnotationKind::Optional,
        AnnotationKind::Self_,
        AnnotationKind::SkipSelf,
        AnnotationKind::Host,
        AnnotationKind::Attribute,
    ];

    /// Name exported by the core module.
    pub fn export_name(&self) -> &'static str {
        match self {
            AnnotationKind::Component => "Component",
            AnnotationKind::Directive => "Directive",
            AnnotationKind::NgModule => "NgModule",
            AnnotationKind::Pipe => "Pipe",
            AnnotationKind::Injectable => "Injectable",
            AnnotationKind::Input => "Input",
            AnnotationKind::Output => "Output",
            AnnotationKind::HostBinding => "HostBinding",
            AnnotationKind::HostListener => "HostListener",
            AnnotationKind::ContentChild => "ContentChild",
            AnnotationKind::ContentChildren => "ContentChildren",
            AnnotationKind::ViewChild => "ViewChild",
            AnnotationKind::ViewChildren => "ViewChildren",
            AnnotationKind::Inject => "Inject",
            AnnotationKind::Optional => "Optional",
            AnnotationKind::Self_ => "Self",
            AnnotationKind::SkipSelf => "SkipSelf",
            AnnotationKind::Host => "Host",
            AnnotationKind::Attribute => "Attribute",
        }
    }

    /// Annotations valid on constructor parameters.
    pub fn is_parameter_annotation(&self) -> bool {
        matches!(
            self,
            AnnotationKind::Inject
                | AnnotationKind::Optional
                | AnnotationKind::Self_
                | AnnotationKind::SkipSelf
                | AnnotationKind::Host
                | AnnotationKind::Attribute
        )
    }
}

/// Canonical symbols of the recognized annotations.
#[derive(Debug, Clone)]
pub struct AnnotationRegistry {
    core_module: String,
    kinds: HashMap<Symbol, AnnotationKind>,
}

impl AnnotationRegistry {
    pub fn new(checker: &TypeChecker, core_module: &str) -> Self {
        let program = checker.program();
        let target = program
            .source_files()
            .find_map(|sf| program.resolve_module(&sf.file_name, core_module))
            .map(str::to_string);

        let kinds = AnnotationKind::ALL
            .iter()
            .flat_map(|kind| {
                let name = kind.export_name();
                let mut symbols = vec![Symbol::ambient(core_module, name)];
                if let Some(symbol) = target.as_deref().and_then(|t| checker.resolve_export(t, name)) {
                    symbols.push(symbol);
                }
                symbols.into_iter().map(move |symbol| (symbol, *kind))
            })
            .collect();

        Self {
            core_module: core_module.to_string(),
            kinds,
        }
    }

    pub fn core_module(&self) -> &str {
        &self.core_module
    }

    pub fn kind_of(&self, symbol: &Symbol) -> Option<AnnotationKind> {
        self.kinds.get(symbol).copied()
    }

    /// Classify a decorator written in `file_name`.
    pub fn decorator_kind(&self, checker: &TypeChecker, file_name: &str, decorator: &Decorator) -> Option<AnnotationKind> {
        let callee = match &decorator.expression.kind {
            ExpressionKind::Call { callee, .. } => callee.as_ref(),
            _ => &decorator.expression,
        };
        self.kind_of(&resolve_callee(checker, file_name, callee)?)
    }
}

/// Symbol an annotation callee refers to: `Name` or `ns.Name` on a namespace import.
pub fn resolve_callee(checker: &TypeChecker, file_name: &str, callee: &Expression) -> Option<Symbol> {
    match &callee.kind {
        ExpressionKind::Identifier(name) => checker.symbol_at(file_name, name),
        ExpressionKind::PropertyAccess { expression, name } => {
            let ExpressionKind::Identifier(ns) = &expression.kind else {
                return None;
            };
            let namespace = checker.symbol_at(file_name, ns)?;
            match namespace.kind {
                SymbolKind::Module => checker.resolve_export(&namespace.file_name, name),
                SymbolKind::Ambient if namespace.name == "*" => Some(Symbol::ambient(namespace.file_name, name.clone())),
                _ => None,
            }
        }
        _ => None,
    }
}
