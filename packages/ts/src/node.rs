// Syntax Model
//
// Owned, immutable syntax for one compilation unit. The parser lowers the oxc
// arena AST into these types so that a `SourceFile` can outlive its allocator
// and be shared across Program snapshots behind an `Arc`.

use std::sync::Arc;

use crate::Diagnostic;

/// Byte range into the unit's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A parsed compilation unit.
#[derive(Debug)]
pub struct SourceFile {
    pub file_name: String,
    pub text: String,
    pub is_declaration_file: bool,
    pub statements: Vec<Statement>,
    pub parse_diagnostics: Vec<Diagnostic>,
    pub(crate) original: Option<Arc<SourceFile>>,
    pub(crate) line_starts: Vec<usize>,
}

impl SourceFile {
    /// The unit this one was rewritten from, if any.
    pub fn original(&self) -> Option<&Arc<SourceFile>> {
        self.original.as_ref()
    }

    /// Walk the rewrite chain back to the unit that was read from the host.
    pub fn original_source(&self) -> &SourceFile {
        let mut current = self;
        while let Some(original) = current.original.as_deref() {
            current = original;
        }
        current
    }

    pub fn text_of(&self, span: Span) -> &str {
        self.text.get(span.start..span.end).unwrap_or("")
    }

    /// Zero-based line and character for a byte offset.
    pub fn line_and_character_of_position(&self, position: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&position) {
            Ok(line) => line,
            Err(next) => next.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        let end = position.min(self.text.len());
        let character = self
            .text
            .get(line_start..end)
            .map(|s| s.chars().count())
            .unwrap_or(0);
        (line, character)
    }

    pub fn imports(&self) -> impl Iterator<Item = &ImportDeclaration> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Import(import) => Some(import),
            _ => None,
        })
    }

    /// Every module specifier this unit depends on, in source order.
    pub fn module_specifiers(&self) -> Vec<&str> {
        self.statements
            .iter()
            .filter_map(|s| match s {
                Statement::Import(import) => Some(import.module_specifier.as_str()),
                Statement::ExportFrom(export) => Some(export.module_specifier.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Find a top-level declaration by its local name.
    pub fn find_declaration(&self, name: &str) -> Option<&Statement> {
        self.statements.iter().find(|s| match s {
            Statement::Variable(var) => var.declarations.iter().any(|d| d.name.as_deref() == Some(name)),
            other => other.declared_name() == Some(name),
        })
    }
}

pub(crate) fn compute_line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (idx, byte) in text.bytes().enumerate() {
        if byte == b'\n' {
            starts.push(idx + 1);
        }
    }
    starts
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Import(ImportDeclaration),
    ExportFrom(ExportFromDeclaration),
    ExportLocal(ExportLocalDeclaration),
    ExportAssignment(ExportAssignment),
    Class(ClassDeclaration),
    Function(FunctionDeclaration),
    Variable(VariableStatement),
    Type(TypeDeclaration),
    Other(Span),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Import(s) => s.span,
            Statement::ExportFrom(s) => s.span,
            Statement::ExportLocal(s) => s.span,
            Statement::ExportAssignment(s) => s.span,
            Statement::Class(s) => s.modifiers.statement_span,
            Statement::Function(s) => s.modifiers.statement_span,
            Statement::Variable(s) => s.modifiers.statement_span,
            Statement::Type(s) => s.modifiers.statement_span,
            Statement::Other(span) => *span,
        }
    }

    /// Name introduced by a single-name declaration.
    pub fn declared_name(&self) -> Option<&str> {
        match self {
            Statement::Class(c) => c.name.as_deref(),
            Statement::Function(f) => f.name.as_deref(),
            Statement::Type(t) => Some(t.name.as_str()),
            _ => None,
        }
    }

    pub fn modifiers(&self) -> Option<&DeclarationModifiers> {
        match self {
            Statement::Class(s) => Some(&s.modifiers),
            Statement::Function(s) => Some(&s.modifiers),
            Statement::Variable(s) => Some(&s.modifiers),
            Statement::Type(s) => Some(&s.modifiers),
            _ => None,
        }
    }
}

/// Export state shared by every declaration statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeclarationModifiers {
    pub exported: bool,
    pub is_default: bool,
    pub is_ambient: bool,
    /// `export ` or `export default ` including trailing whitespace.
    pub export_keyword: Option<Span>,
    /// Whole statement including any export keyword and decorators.
    pub statement_span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDeclaration {
    pub module_specifier: String,
    pub bindings: Vec<ImportBinding>,
    pub is_type_only: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportBinding {
    pub local: String,
    pub imported: ImportedName,
    pub is_type_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportedName {
    Named(String),
    Default,
    Namespace,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportFromDeclaration {
    pub module_specifier: String,
    pub clause: ExportClause,
    pub is_type_only: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportClause {
    /// `export * from '...'`
    All,
    /// `export * as ns from '...'`
    Namespace(String),
    Named(Vec<ExportSpecifier>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpecifier {
    pub local: String,
    pub exported: String,
    pub is_type_only: bool,
}

/// `export { a, b as c };`
#[derive(Debug, Clone, PartialEq)]
pub struct ExportLocalDeclaration {
    pub specifiers: Vec<ExportSpecifier>,
    pub is_type_only: bool,
    pub span: Span,
}

/// `export default <expression>;`
#[derive(Debug, Clone, PartialEq)]
pub struct ExportAssignment {
    pub expression: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDeclaration {
    pub name: Option<String>,
    pub modifiers: DeclarationModifiers,
    pub decorators: Vec<Decorator>,
    pub members: Vec<ClassMember>,
    /// The `extends` clause, if any.
    pub extends: Option<Expression>,
    /// The `{ ... }` body, braces included.
    pub body_span: Span,
    pub span: Span,
}

impl ClassDeclaration {
    pub fn constructor(&self) -> Option<&ClassMember> {
        self.members.iter().find(|m| m.kind == MemberKind::Constructor)
    }

    pub fn has_member_decorators(&self) -> bool {
        self.members
            .iter()
            .any(|m| !m.decorators.is_empty() || m.parameters.iter().any(|p| !p.decorators.is_empty()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decorator {
    pub expression: Expression,
    /// Includes the leading `@`.
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Constructor,
    Method,
    Property,
    GetAccessor,
    SetAccessor,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassMember {
    pub kind: MemberKind,
    pub name: Option<PropertyName>,
    pub is_static: bool,
    pub decorators: Vec<Decorator>,
    pub parameters: Vec<Parameter>,
    /// Property initializer.
    pub initializer: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: Option<String>,
    pub type_reference: Option<TypeReference>,
    pub decorators: Vec<Decorator>,
    pub span: Span,
}

/// A named type such as `Foo` or `ns.Foo`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeReference {
    pub name: String,
    pub span: Span,
}

impl TypeReference {
    /// Leftmost identifier of a possibly qualified name.
    pub fn root_identifier(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: Option<String>,
    pub modifiers: DeclarationModifiers,
    pub parameters: Vec<String>,
    /// The returned expression when the body is exactly `return <expr>;`.
    pub single_return: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableStatement {
    pub modifiers: DeclarationModifiers,
    pub is_const: bool,
    pub declarations: Vec<VariableDeclarator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarator {
    pub name: Option<String>,
    pub initializer: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDeclarationKind {
    Interface,
    TypeAlias,
    Enum,
    Namespace,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDeclaration {
    pub name: String,
    pub kind: TypeDeclarationKind,
    pub modifiers: DeclarationModifiers,
    pub span: Span,
}

impl TypeDeclaration {
    /// Enums and namespaces exist at runtime.
    pub fn is_value(&self) -> bool {
        matches!(self.kind, TypeDeclarationKind::Enum | TypeDeclarationKind::Namespace)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    StringLiteral(String),
    NumericLiteral(f64),
    BooleanLiteral(bool),
    NullLiteral,
    TemplateLiteral {
        quasis: Vec<String>,
        expressions: Vec<Expression>,
    },
    Identifier(String),
    This,
    Array(Vec<ArrayElement>),
    Object(Vec<ObjectMember>),
    Call {
        callee: Box<Expression>,
        arguments: Vec<Argument>,
    },
    New {
        callee: Box<Expression>,
        arguments: Vec<Argument>,
    },
    PropertyAccess {
        expression: Box<Expression>,
        name: String,
    },
    ElementAccess {
        expression: Box<Expression>,
        argument: Box<Expression>,
    },
    /// Arrow function or function expression. `body` is present only when the
    /// body is a single expression or a single `return` statement.
    Function {
        parameters: Vec<String>,
        body: Option<Box<Expression>>,
    },
    Binary {
        operator: String,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Unary {
        operator: String,
        operand: Box<Expression>,
    },
    Conditional {
        condition: Box<Expression>,
        when_true: Box<Expression>,
        when_false: Box<Expression>,
    },
    /// Any form the metadata model has no representation for.
    Unsupported(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayElement {
    Expression(Expression),
    Spread(Expression),
    Hole,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Expression(Expression),
    Spread(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectMember {
    Property {
        key: PropertyName,
        value: Expression,
        shorthand: bool,
    },
    Spread(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyName {
    Identifier(String),
    StringLiteral(String),
    NumericLiteral(String),
    Private(String),
    Computed(Box<Expression>),
}

impl PropertyName {
    /// Static text of the name, `None` for computed names.
    pub fn text(&self) -> Option<&str> {
        match self {
            PropertyName::Identifier(name)
            | PropertyName::StringLiteral(name)
            | PropertyName::NumericLiteral(name)
            | PropertyName::Private(name) => Some(name),
            PropertyName::Computed(_) => None,
        }
    }

    pub fn is_quoted(&self) -> bool {
        matches!(self, PropertyName::StringLiteral(_))
    }
}
