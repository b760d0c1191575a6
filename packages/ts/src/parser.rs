// Parser
//
// Parses TypeScript with oxc and lowers the arena AST into the owned syntax
// model in `node.rs`. Only module-level structure and the expression forms the
// pipeline inspects are kept; everything else becomes `Other` / `Unsupported`.

use std::path::Path;
use std::sync::Arc;

use oxc_allocator::Allocator;
use oxc_ast::ast as oxc;
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};

use crate::node::*;
use crate::path::is_dts_file;
use crate::{Diagnostic, DiagnosticCategory};

/// Parse `text` into a fresh compilation unit. Syntax errors are recorded on the
/// unit rather than returned.
pub fn create_source_file(file_name: &str, text: &str) -> SourceFile {
    let allocator = Allocator::default();
    let source_type = source_type_for(file_name);
    let ret = Parser::new(&allocator, text, source_type).parse();

    let parse_diagnostics = ret
        .errors
        .iter()
        .map(|error| Diagnostic {
            category: DiagnosticCategory::Error,
            code: 1005,
            file: Some(file_name.to_string()),
            start: 0,
            length: 0,
            message_text: error.to_string().into(),
            related_information: None,
        })
        .collect();

    let lowering = Lowering { text };
    let statements = ret
        .program
        .body
        .iter()
        .map(|stmt| lowering.statement(stmt))
        .collect();

    SourceFile {
        file_name: file_name.to_string(),
        text: text.to_string(),
        is_declaration_file: is_dts_file(file_name),
        statements,
        parse_diagnostics,
        original: None,
        line_starts: compute_line_starts(text),
    }
}

impl SourceFile {
    /// Parse rewritten text for a unit, remembering the unit it came from.
    pub fn with_original(file_name: &str, text: &str, original: Arc<SourceFile>) -> SourceFile {
        let mut file = create_source_file(file_name, text);
        file.original = Some(original);
        file
    }
}

pub(crate) fn source_type_for(file_name: &str) -> SourceType {
    SourceType::from_path(Path::new(file_name)).unwrap_or_else(|_| SourceType::ts())
}

struct Lowering<'t> {
    text: &'t str,
}

fn span_of(span: oxc_span::Span) -> Span {
    Span::new(span.start as usize, span.end as usize)
}

fn export_name(name: &oxc::ModuleExportName) -> String {
    match name {
        oxc::ModuleExportName::IdentifierName(id) => id.name.to_string(),
        oxc::ModuleExportName::IdentifierReference(id) => id.name.to_string(),
        oxc::ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
    }
}

fn binding_name(pattern: &oxc::BindingPattern) -> Option<String> {
    match &pattern.kind {
        oxc::BindingPatternKind::BindingIdentifier(id) => Some(id.name.to_string()),
        oxc::BindingPatternKind::AssignmentPattern(assign) => match &assign.left.kind {
            oxc::BindingPatternKind::BindingIdentifier(id) => Some(id.name.to_string()),
            _ => None,
        },
        _ => None,
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn type_name_text(name: &oxc::TSTypeName) -> Option<String> {
    match name {
        oxc::TSTypeName::IdentifierReference(id) => Some(id.name.to_string()),
        oxc::TSTypeName::QualifiedName(q) => Some(format!("{}.{}", type_name_text(&q.left)?, q.right.name)),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

impl<'t> Lowering<'t> {
    fn statement(&self, stmt: &oxc::Statement) -> Statement {
        match stmt {
            oxc::Statement::ImportDeclaration(decl) => Statement::Import(self.import(decl)),
            oxc::Statement::ExportAllDeclaration(decl) => Statement::ExportFrom(ExportFromDeclaration {
                module_specifier: decl.source.value.to_string(),
                clause: match &decl.exported {
                    Some(name) => ExportClause::Namespace(export_name(name)),
                    None => ExportClause::All,
                },
                is_type_only: decl.export_kind.is_type(),
                span: span_of(decl.span),
            }),
            oxc::Statement::ExportNamedDeclaration(decl) => self.export_named(decl),
            oxc::Statement::ExportDefaultDeclaration(decl) => self.export_default(decl),
            oxc::Statement::TSExportAssignment(assign) => Statement::ExportAssignment(ExportAssignment {
                expression: Some(self.expression(&assign.expression)),
                span: span_of(assign.span),
            }),
            other => {
                let span = span_of(other.span());
                let modifiers = DeclarationModifiers { statement_span: span, ..Default::default() };
                self.declaration_statement(other.as_declaration(), modifiers)
                    .unwrap_or(Statement::Other(span))
            }
        }
    }

    fn import(&self, decl: &oxc::ImportDeclaration) -> ImportDeclaration {
        let mut bindings = Vec::new();
        for specifier in decl.specifiers.iter().flatten() {
            let binding = match specifier {
                oxc::ImportDeclarationSpecifier::ImportSpecifier(s) => ImportBinding {
                    local: s.local.name.to_string(),
                    imported: ImportedName::Named(export_name(&s.imported)),
                    is_type_only: s.import_kind.is_type(),
                },
                oxc::ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => ImportBinding {
                    local: s.local.name.to_string(),
                    imported: ImportedName::Default,
                    is_type_only: false,
                },
                oxc::ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => ImportBinding {
                    local: s.local.name.to_string(),
                    imported: ImportedName::Namespace,
                    is_type_only: false,
                },
            };
            bindings.push(binding);
        }
        ImportDeclaration {
            module_specifier: decl.source.value.to_string(),
            bindings,
            is_type_only: decl.import_kind.is_type(),
            span: span_of(decl.span),
        }
    }

    fn export_named(&self, decl: &oxc::ExportNamedDeclaration) -> Statement {
        let span = span_of(decl.span);
        let specifiers: Vec<ExportSpecifier> = decl
            .specifiers
            .iter()
            .map(|s| ExportSpecifier {
                local: export_name(&s.local),
                exported: export_name(&s.exported),
                is_type_only: s.export_kind.is_type(),
            })
            .collect();

        if let Some(source) = &decl.source {
            return Statement::ExportFrom(ExportFromDeclaration {
                module_specifier: source.value.to_string(),
                clause: ExportClause::Named(specifiers),
                is_type_only: decl.export_kind.is_type(),
                span,
            });
        }

        match &decl.declaration {
            Some(declaration) => {
                let decorators: Vec<Span> = match declaration {
                    oxc::Declaration::ClassDeclaration(class) => class.decorators.iter().map(|d| span_of(d.span)).collect(),
                    _ => Vec::new(),
                };
                let start = decorators.first().map_or(span.start, |d| d.start.min(span.start));
                let modifiers = DeclarationModifiers {
                    exported: true,
                    is_default: false,
                    is_ambient: false,
                    export_keyword: self.export_keyword(start, &decorators),
                    statement_span: Span::new(start, span.end),
                };
                self.declaration_statement(Some(declaration), modifiers)
                    .unwrap_or(Statement::Other(span))
            }
            None => Statement::ExportLocal(ExportLocalDeclaration {
                specifiers,
                is_type_only: decl.export_kind.is_type(),
                span,
            }),
        }
    }

    fn export_default(&self, decl: &oxc::ExportDefaultDeclaration) -> Statement {
        let span = span_of(decl.span);
        match &decl.declaration {
            oxc::ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                let decorators: Vec<Span> = class.decorators.iter().map(|d| span_of(d.span)).collect();
                let start = decorators.first().map_or(span.start, |d| d.start.min(span.start));
                let modifiers = DeclarationModifiers {
                    exported: true,
                    is_default: true,
                    is_ambient: class.declare,
                    export_keyword: self.export_keyword(start, &decorators),
                    statement_span: Span::new(start, span.end),
                };
                Statement::Class(self.class(class, modifiers))
            }
            oxc::ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                let modifiers = DeclarationModifiers {
                    exported: true,
                    is_default: true,
                    is_ambient: func.declare,
                    export_keyword: self.export_keyword(span.start, &[]),
                    statement_span: span,
                };
                Statement::Function(self.function(func, modifiers))
            }
            other => Statement::ExportAssignment(ExportAssignment {
                expression: other.as_expression().map(|e| self.expression(e)),
                span,
            }),
        }
    }

    /// Locate `export ` / `export default ` after any leading decorators.
    fn export_keyword(&self, start: usize, decorators: &[Span]) -> Option<Span> {
        let bytes = self.text.as_bytes();
        let skip_ws = |mut pos: usize| {
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            pos
        };

        let mut pos = skip_ws(start);
        for decorator in decorators {
            if decorator.start >= pos && self.text.get(pos..decorator.start).is_some_and(|s| s.trim().is_empty()) {
                pos = skip_ws(decorator.end);
            }
        }
        let rest = self.text.get(pos..)?;
        if !rest.starts_with("export") {
            return None;
        }
        let mut end = skip_ws(pos + "export".len());
        if self.text.get(end..).is_some_and(|s| s.starts_with("default")) {
            end = skip_ws(end + "default".len());
        }
        Some(Span::new(pos, end))
    }

    fn declaration_statement(
        &self,
        declaration: Option<&oxc::Declaration>,
        mut modifiers: DeclarationModifiers,
    ) -> Option<Statement> {
        let statement = match declaration? {
            oxc::Declaration::ClassDeclaration(class) => {
                modifiers.is_ambient = class.declare;
                if !modifiers.exported {
                    if let Some(first) = class.decorators.first() {
                        modifiers.statement_span.start = modifiers.statement_span.start.min(first.span.start as usize);
                    }
                }
                Statement::Class(self.class(class, modifiers))
            }
            oxc::Declaration::FunctionDeclaration(func) => {
                modifiers.is_ambient = func.declare;
                Statement::Function(self.function(func, modifiers))
            }
            oxc::Declaration::VariableDeclaration(var) => {
                modifiers.is_ambient = var.declare;
                Statement::Variable(VariableStatement {
                    modifiers,
                    is_const: matches!(var.kind, oxc::VariableDeclarationKind::Const),
                    declarations: var
                        .declarations
                        .iter()
                        .map(|d| VariableDeclarator {
                            name: binding_name(&d.id),
                            initializer: d.init.as_ref().map(|init| self.expression(init)),
                            span: span_of(d.span),
                        })
                        .collect(),
                    span: span_of(var.span),
                })
            }
            oxc::Declaration::TSInterfaceDeclaration(decl) => Statement::Type(TypeDeclaration {
                name: decl.id.name.to_string(),
                kind: TypeDeclarationKind::Interface,
                modifiers,
                span: span_of(decl.span),
            }),
            oxc::Declaration::TSTypeAliasDeclaration(decl) => Statement::Type(TypeDeclaration {
                name: decl.id.name.to_string(),
                kind: TypeDeclarationKind::TypeAlias,
                modifiers,
                span: span_of(decl.span),
            }),
            oxc::Declaration::TSEnumDeclaration(decl) => {
                modifiers.is_ambient = decl.declare;
                Statement::Type(TypeDeclaration {
                    name: decl.id.name.to_string(),
                    kind: TypeDeclarationKind::Enum,
                    modifiers,
                    span: span_of(decl.span),
                })
            }
            oxc::Declaration::TSModuleDeclaration(decl) => {
                let name = match &decl.id {
                    oxc::TSModuleDeclarationName::Identifier(id) => id.name.to_string(),
                    oxc::TSModuleDeclarationName::StringLiteral(lit) => lit.value.to_string(),
                };
                modifiers.is_ambient = decl.declare;
                Statement::Type(TypeDeclaration {
                    name,
                    kind: TypeDeclarationKind::Namespace,
                    modifiers,
                    span: span_of(decl.span),
                })
            }
            _ => return None,
        };
        Some(statement)
    }

    fn decorators(&self, decorators: &[oxc::Decorator]) -> Vec<Decorator> {
        decorators
            .iter()
            .map(|d| Decorator {
                expression: self.expression(&d.expression),
                span: span_of(d.span),
            })
            .collect()
    }

    fn class(&self, class: &oxc::Class, modifiers: DeclarationModifiers) -> ClassDeclaration {
        let members = class.body.body.iter().map(|element| self.class_member(element)).collect();
        ClassDeclaration {
            name: class.id.as_ref().map(|id| id.name.to_string()),
            modifiers,
            decorators: self.decorators(&class.decorators),
            members,
            extends: class.super_class.as_ref().map(|e| self.expression(e)),
            body_span: span_of(class.body.span),
            span: span_of(class.span),
        }
    }

    fn class_member(&self, element: &oxc::ClassElement) -> ClassMember {
        match element {
            oxc::ClassElement::MethodDefinition(method) => {
                let kind = match method.kind {
                    oxc::MethodDefinitionKind::Constructor => MemberKind::Constructor,
                    oxc::MethodDefinitionKind::Method => MemberKind::Method,
                    oxc::MethodDefinitionKind::Get => MemberKind::GetAccessor,
                    oxc::MethodDefinitionKind::Set => MemberKind::SetAccessor,
                };
                let parameters = method
                    .value
                    .params
                    .items
                    .iter()
                    .map(|param| Parameter {
                        name: binding_name(&param.pattern),
                        type_reference: param
                            .pattern
                            .type_annotation
                            .as_ref()
                            .and_then(|t| self.type_reference(&t.type_annotation)),
                        decorators: self.decorators(&param.decorators),
                        span: span_of(param.span),
                    })
                    .collect();
                ClassMember {
                    kind,
                    name: Some(self.property_key(&method.key, method.computed)),
                    is_static: method.r#static,
                    decorators: self.decorators(&method.decorators),
                    parameters,
                    initializer: None,
                    span: span_of(method.span),
                }
            }
            oxc::ClassElement::PropertyDefinition(prop) => ClassMember {
                kind: MemberKind::Property,
                name: Some(self.property_key(&prop.key, prop.computed)),
                is_static: prop.r#static,
                decorators: self.decorators(&prop.decorators),
                parameters: Vec::new(),
                initializer: prop.value.as_ref().map(|v| self.expression(v)),
                span: span_of(prop.span),
            },
            oxc::ClassElement::AccessorProperty(prop) => ClassMember {
                kind: MemberKind::Property,
                name: Some(self.property_key(&prop.key, prop.computed)),
                is_static: prop.r#static,
                decorators: self.decorators(&prop.decorators),
                parameters: Vec::new(),
                initializer: prop.value.as_ref().map(|v| self.expression(v)),
                span: span_of(prop.span),
            },
            other => ClassMember {
                kind: MemberKind::Other,
                name: None,
                is_static: false,
                decorators: Vec::new(),
                parameters: Vec::new(),
                initializer: None,
                span: span_of(other.span()),
            },
        }
    }

    fn type_reference(&self, ty: &oxc::TSType) -> Option<TypeReference> {
        match ty {
            oxc::TSType::TSTypeReference(reference) => Some(TypeReference {
                name: type_name_text(&reference.type_name)?,
                span: span_of(reference.span),
            }),
            _ => None,
        }
    }

    fn function(&self, func: &oxc::Function, modifiers: DeclarationModifiers) -> FunctionDeclaration {
        FunctionDeclaration {
            name: func.id.as_ref().map(|id| id.name.to_string()),
            modifiers,
            parameters: func.params.items.iter().filter_map(|p| binding_name(&p.pattern)).collect(),
            single_return: func.body.as_ref().and_then(|body| self.single_return(&body.statements)),
            span: span_of(func.span),
        }
    }

    fn single_return(&self, statements: &[oxc::Statement]) -> Option<Expression> {
        match statements {
            [oxc::Statement::ReturnStatement(ret)] => ret.argument.as_ref().map(|e| self.expression(e)),
            _ => None,
        }
    }

    fn property_key(&self, key: &oxc::PropertyKey, computed: bool) -> PropertyName {
        if computed {
            return PropertyName::Computed(Box::new(match key.as_expression() {
                Some(expr) => self.expression(expr),
                None => Expression {
                    kind: ExpressionKind::Unsupported("computed key"),
                    span: span_of(key.span()),
                },
            }));
        }
        match key {
            oxc::PropertyKey::StaticIdentifier(id) => PropertyName::Identifier(id.name.to_string()),
            oxc::PropertyKey::PrivateIdentifier(id) => PropertyName::Private(id.name.to_string()),
            oxc::PropertyKey::StringLiteral(lit) => PropertyName::StringLiteral(lit.value.to_string()),
            oxc::PropertyKey::NumericLiteral(num) => PropertyName::NumericLiteral(format_number(num.value)),
            other => PropertyName::Computed(Box::new(match other.as_expression() {
                Some(expr) => self.expression(expr),
                None => Expression {
                    kind: ExpressionKind::Unsupported("property key"),
                    span: span_of(other.span()),
                },
            })),
        }
    }

    fn arguments(&self, arguments: &[oxc::Argument]) -> Vec<Argument> {
        arguments
            .iter()
            .map(|arg| match arg {
                oxc::Argument::SpreadElement(spread) => Argument::Spread(self.expression(&spread.argument)),
                other => match other.as_expression() {
                    Some(expr) => Argument::Expression(self.expression(expr)),
                    None => Argument::Expression(Expression {
                        kind: ExpressionKind::Unsupported("argument"),
                        span: span_of(other.span()),
                    }),
                },
            })
            .collect()
    }

    fn function_body(&self, expression_body: bool, body: &oxc::FunctionBody) -> Option<Box<Expression>> {
        if expression_body {
            if let [oxc::Statement::ExpressionStatement(stmt)] = body.statements.as_slice() {
                return Some(Box::new(self.expression(&stmt.expression)));
            }
            return None;
        }
        self.single_return(&body.statements).map(Box::new)
    }

    fn expression(&self, expr: &oxc::Expression) -> Expression {
        let span = span_of(expr.span());
        let kind = match expr {
            oxc::Expression::StringLiteral(lit) => ExpressionKind::StringLiteral(lit.value.to_string()),
            oxc::Expression::NumericLiteral(lit) => ExpressionKind::NumericLiteral(lit.value),
            oxc::Expression::BooleanLiteral(lit) => ExpressionKind::BooleanLiteral(lit.value),
            oxc::Expression::NullLiteral(_) => ExpressionKind::NullLiteral,
            oxc::Expression::TemplateLiteral(tpl) => ExpressionKind::TemplateLiteral {
                quasis: tpl
                    .quasis
                    .iter()
                    .map(|q| match &q.value.cooked {
                        Some(cooked) => cooked.to_string(),
                        None => q.value.raw.to_string(),
                    })
                    .collect(),
                expressions: tpl.expressions.iter().map(|e| self.expression(e)).collect(),
            },
            oxc::Expression::Identifier(id) => ExpressionKind::Identifier(id.name.to_string()),
            oxc::Expression::ThisExpression(_) => ExpressionKind::This,
            oxc::Expression::ArrayExpression(array) => ExpressionKind::Array(
                array
                    .elements
                    .iter()
                    .map(|element| match element {
                        oxc::ArrayExpressionElement::SpreadElement(spread) => {
                            ArrayElement::Spread(self.expression(&spread.argument))
                        }
                        oxc::ArrayExpressionElement::Elision(_) => ArrayElement::Hole,
                        other => match other.as_expression() {
                            Some(e) => ArrayElement::Expression(self.expression(e)),
                            None => ArrayElement::Hole,
                        },
                    })
                    .collect(),
            ),
            oxc::Expression::ObjectExpression(object) => ExpressionKind::Object(
                object
                    .properties
                    .iter()
                    .map(|property| match property {
                        oxc::ObjectPropertyKind::ObjectProperty(p) => ObjectMember::Property {
                            key: self.property_key(&p.key, p.computed),
                            value: self.expression(&p.value),
                            shorthand: p.shorthand,
                        },
                        oxc::ObjectPropertyKind::SpreadProperty(spread) => {
                            ObjectMember::Spread(self.expression(&spread.argument))
                        }
                    })
                    .collect(),
            ),
            oxc::Expression::CallExpression(call) => ExpressionKind::Call {
                callee: Box::new(self.expression(&call.callee)),
                arguments: self.arguments(&call.arguments),
            },
            oxc::Expression::NewExpression(new) => ExpressionKind::New {
                callee: Box::new(self.expression(&new.callee)),
                arguments: self.arguments(&new.arguments),
            },
            oxc::Expression::StaticMemberExpression(member) => ExpressionKind::PropertyAccess {
                expression: Box::new(self.expression(&member.object)),
                name: member.property.name.to_string(),
            },
            oxc::Expression::ComputedMemberExpression(member) => ExpressionKind::ElementAccess {
                expression: Box::new(self.expression(&member.object)),
                argument: Box::new(self.expression(&member.expression)),
            },
            oxc::Expression::ArrowFunctionExpression(arrow) => ExpressionKind::Function {
                parameters: arrow.params.items.iter().filter_map(|p| binding_name(&p.pattern)).collect(),
                body: self.function_body(arrow.expression, &arrow.body),
            },
            oxc::Expression::FunctionExpression(func) => ExpressionKind::Function {
                parameters: func.params.items.iter().filter_map(|p| binding_name(&p.pattern)).collect(),
                body: func.body.as_ref().and_then(|b| self.function_body(false, b)),
            },
            oxc::Expression::BinaryExpression(bin) => ExpressionKind::Binary {
                operator: bin.operator.as_str().to_string(),
                left: Box::new(self.expression(&bin.left)),
                right: Box::new(self.expression(&bin.right)),
            },
            oxc::Expression::LogicalExpression(logical) => ExpressionKind::Binary {
                operator: logical.operator.as_str().to_string(),
                left: Box::new(self.expression(&logical.left)),
                right: Box::new(self.expression(&logical.right)),
            },
            oxc::Expression::UnaryExpression(unary) => ExpressionKind::Unary {
                operator: unary.operator.as_str().to_string(),
                operand: Box::new(self.expression(&unary.argument)),
            },
            oxc::Expression::ConditionalExpression(cond) => ExpressionKind::Conditional {
                condition: Box::new(self.expression(&cond.test)),
                when_true: Box::new(self.expression(&cond.consequent)),
                when_false: Box::new(self.expression(&cond.alternate)),
            },
            oxc::Expression::ParenthesizedExpression(paren) => return self.expression(&paren.expression),
            oxc::Expression::TSAsExpression(e) => return self.expression(&e.expression),
            oxc::Expression::TSSatisfiesExpression(e) => return self.expression(&e.expression),
            oxc::Expression::TSNonNullExpression(e) => return self.expression(&e.expression),
            oxc::Expression::TSTypeAssertion(e) => return self.expression(&e.expression),
            oxc::Expression::RegExpLiteral(_) => ExpressionKind::Unsupported("regular expression"),
            oxc::Expression::ClassExpression(_) => ExpressionKind::Unsupported("class expression"),
            oxc::Expression::ChainExpression(_) => ExpressionKind::Unsupported("optional chain"),
            oxc::Expression::TaggedTemplateExpression(_) => ExpressionKind::Unsupported("tagged template"),
            _ => ExpressionKind::Unsupported("expression"),
        };
        Expression { kind, span }
    }
}
