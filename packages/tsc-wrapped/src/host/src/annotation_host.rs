// Decorator Downlevel Host
//
// Serves units of a held Program with recognized annotations rewritten into
// static class fields (`decorators`, `ctorParameters`, `propDecorators`) so
// the emitted JavaScript needs no decorator support at runtime.

use std::fmt::Write;
use std::sync::{Arc, Mutex};

use ts::path::is_dts_file;
use ts::{
    Argument, ClassDeclaration, CompilerHost, DelegatingHost, Diagnostic, DiagnosticCategory, Decorator,
    ExpressionKind, HostError, MemberKind, Parameter, Program, SourceFile, Span, Statement, TypeChecker,
};

use super::annotations::AnnotationRegistry;
use crate::diagnostics::{make_diagnostic, ErrorCode};

const PASS_NAME: &str = "decorator downlevel";

/// Declares the shape of the emitted `decorators` fields.
pub const DECORATOR_INVOCATION_PREAMBLE: &str = "\ninterface DecoratorInvocation {\n  type: Function;\n  args?: any[];\n}\n";

pub struct DecoratorDownlevelHost<'a> {
    delegate: &'a dyn CompilerHost,
    program: &'a Program,
    checker: TypeChecker<'a>,
    registry: AnnotationRegistry,
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl<'a> DecoratorDownlevelHost<'a> {
    pub fn new(delegate: &'a dyn CompilerHost, program: &'a Program, core_module: &str) -> Self {
        let checker = TypeChecker::new(program);
        let registry = AnnotationRegistry::new(&checker, core_module);
        Self {
            delegate,
            program,
            checker,
            registry,
            diagnostics: Mutex::new(Vec::new()),
        }
    }

    /// Drain the diagnostics reported while rewriting.
    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().map(|mut d| std::mem::take(&mut *d)).unwrap_or_default()
    }

    fn report(&self, diagnostic: Diagnostic) {
        if let Ok(mut diagnostics) = self.diagnostics.lock() {
            diagnostics.push(diagnostic);
        }
    }

    /// The rewritten text of `source_file`, or `None` when nothing in it is annotated.
    pub fn rewrite(&self, source_file: &SourceFile) -> Result<Option<String>, HostError> {
        let mut edits: Vec<(Span, String)> = Vec::new();
        for statement in &source_file.statements {
            if let Statement::Class(class) = statement {
                self.rewrite_class(source_file, class, &mut edits)?;
            }
        }
        if edits.is_empty() {
            return Ok(None);
        }
        let mut text = apply_edits(&source_file.text, edits);
        text.push_str(DECORATOR_INVOCATION_PREAMBLE);
        Ok(Some(text))
    }

    fn recognized(&self, source_file: &SourceFile, decorators: &[Decorator]) -> Vec<(Span, String)> {
        decorators
            .iter()
            .filter(|d| {
                self.registry
                    .decorator_kind(&self.checker, &source_file.file_name, d)
                    .is_some()
            })
            .map(|d| (d.span, invocation_text(source_file, d)))
            .collect()
    }

    fn rewrite_class(
        &self,
        source_file: &SourceFile,
        class: &ClassDeclaration,
        edits: &mut Vec<(Span, String)>,
    ) -> Result<(), HostError> {
        let class_decorators = self.recognized(source_file, &class.decorators);

        let mut parameters: Vec<(&Parameter, Vec<(Span, String)>)> = Vec::new();
        if let Some(ctor) = class.constructor() {
            for parameter in &ctor.parameters {
                parameters.push((parameter, self.recognized(source_file, &parameter.decorators)));
            }
        }
        let has_parameter_decorators = parameters.iter().any(|(_, d)| !d.is_empty());

        let mut prop_decorators: Vec<(String, Vec<(Span, String)>)> = Vec::new();
        for member in &class.members {
            if member.kind == MemberKind::Constructor {
                continue;
            }
            if member.parameters.iter().any(|p| !p.decorators.is_empty()) {
                self.report(make_diagnostic(
                    ErrorCode::DecoratorDownlevel,
                    DiagnosticCategory::Warning,
                    Some(&source_file.file_name),
                    member.span,
                    "Parameter decorators are only supported on constructors and are left in place",
                ));
            }
            let recognized = self.recognized(source_file, &member.decorators);
            if recognized.is_empty() {
                continue;
            }
            let Some(name) = member.name.as_ref().and_then(|n| n.text()) else {
                self.report(make_diagnostic(
                    ErrorCode::DecoratorDownlevel,
                    DiagnosticCategory::Warning,
                    Some(&source_file.file_name),
                    member.span,
                    "Decorators on computed members are left in place",
                ));
                continue;
            };
            prop_decorators.push((name.to_string(), recognized));
        }

        if class_decorators.is_empty() && !has_parameter_decorators && prop_decorators.is_empty() {
            return Ok(());
        }
        if class.name.is_none() {
            return Err(HostError::Pass {
                pass: PASS_NAME,
                file_name: source_file.file_name.clone(),
                message: "cannot convert decorators of an anonymous class".to_string(),
            });
        }

        let mut fields = String::new();
        if !class_decorators.is_empty() {
            fields.push_str("\n  static decorators: DecoratorInvocation[] = [\n");
            for (span, invocation) in &class_decorators {
                let _ = writeln!(fields, "    {},", invocation);
                edits.push((*span, String::new()));
            }
            fields.push_str("  ];\n");
        }

        if !parameters.is_empty() && (!class_decorators.is_empty() || has_parameter_decorators) {
            fields.push_str("  /** @nocollapse */\n  static ctorParameters = () => [\n");
            for (parameter, decorators) in &parameters {
                let type_text = self.parameter_type(source_file, parameter);
                if decorators.is_empty() {
                    let _ = writeln!(fields, "    {{ type: {} }},", type_text);
                } else {
                    let list: Vec<&str> = decorators.iter().map(|(_, text)| text.as_str()).collect();
                    let _ = writeln!(fields, "    {{ type: {}, decorators: [{}] }},", type_text, list.join(", "));
                }
                edits.extend(decorators.iter().map(|(span, _)| (*span, String::new())));
            }
            fields.push_str("  ];\n");
        }

        if !prop_decorators.is_empty() {
            fields.push_str("  static propDecorators: {[key: string]: DecoratorInvocation[]} = {\n");
            for (name, decorators) in &prop_decorators {
                let list: Vec<&str> = decorators.iter().map(|(_, text)| text.as_str()).collect();
                let _ = writeln!(fields, "    {:?}: [{}],", name, list.join(", "));
                edits.extend(decorators.iter().map(|(span, _)| (*span, String::new())));
            }
            fields.push_str("  };\n");
        }

        let close = class.body_span.end.saturating_sub(1);
        edits.push((Span::new(close, close), fields));
        Ok(())
    }

    /// The runtime value of a parameter's type, or `undefined` when the type
    /// only exists at compile time.
    fn parameter_type(&self, source_file: &SourceFile, parameter: &Parameter) -> String {
        let Some(type_reference) = &parameter.type_reference else {
            return "undefined".to_string();
        };
        let root = type_reference.root_identifier();
        let type_only_import = source_file.imports().any(|import| {
            import
                .bindings
                .iter()
                .any(|b| b.local == root && (import.is_type_only || b.is_type_only))
        });
        if type_only_import {
            return "undefined".to_string();
        }
        match self.checker.symbol_at(&source_file.file_name, root) {
            Some(symbol) if symbol.kind.is_value() => type_reference.name.clone(),
            _ => "undefined".to_string(),
        }
    }
}

/// `{ type: X, args: [...] }` with the argument text copied verbatim.
fn invocation_text(source_file: &SourceFile, decorator: &Decorator) -> String {
    match &decorator.expression.kind {
        ExpressionKind::Call { callee, arguments } if !arguments.is_empty() => {
            let args: Vec<String> = arguments
                .iter()
                .map(|argument| match argument {
                    Argument::Expression(e) => source_file.text_of(e.span).to_string(),
                    Argument::Spread(e) => format!("...{}", source_file.text_of(e.span)),
                })
                .collect();
            format!("{{ type: {}, args: [{}] }}", source_file.text_of(callee.span), args.join(", "))
        }
        ExpressionKind::Call { callee, .. } => format!("{{ type: {} }}", source_file.text_of(callee.span)),
        _ => format!("{{ type: {} }}", source_file.text_of(decorator.expression.span)),
    }
}

/// Apply non-overlapping replacements. Insertions are zero-length spans.
pub(crate) fn apply_edits(text: &str, mut edits: Vec<(Span, String)>) -> String {
    edits.sort_by(|a, b| b.0.start.cmp(&a.0.start).then(b.0.end.cmp(&a.0.end)));
    let mut result = text.to_string();
    for (span, replacement) in edits {
        if span.start <= span.end && span.end <= result.len() {
            result.replace_range(span.start..span.end, &replacement);
        }
    }
    result
}

impl DelegatingHost for DecoratorDownlevelHost<'_> {
    fn delegate(&self) -> &dyn CompilerHost {
        self.delegate
    }

    fn get_source_file(&self, file_name: &str) -> Result<Option<Arc<SourceFile>>, HostError> {
        if is_dts_file(file_name) {
            return self.delegate.get_source_file(file_name);
        }
        let Some(held) = self.program.get_source_file(file_name) else {
            return self.delegate.get_source_file(file_name);
        };
        let Some(text) = self.rewrite(held)? else {
            return Ok(Some(Arc::clone(held)));
        };
        let rewritten = SourceFile::with_original(&held.file_name, &text, Arc::clone(held));
        if let Some(error) = rewritten.parse_diagnostics.first() {
            return Err(HostError::Pass {
                pass: PASS_NAME,
                file_name: held.file_name.clone(),
                message: error.message_text.to_string(),
            });
        }
        Ok(Some(Arc::new(rewritten)))
    }
}
