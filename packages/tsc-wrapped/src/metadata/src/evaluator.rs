// Expression Evaluator
//
// Folds the syntax of one unit's annotation arguments into metadata values.
// Literals fold, imported and exported names become references, private
// constants are inlined and everything else becomes an explicit error node.

use std::collections::HashMap;

use indexmap::IndexMap;
use ts::{
    Argument, ArrayElement, Expression, ExpressionKind, ImportedName, ObjectMember, PropertyName, SourceFile, Span,
    Statement, TypeReference,
};

use super::schema::{MetadataSymbolicExpression, MetadataValue, QUOTED_KEYS};

enum LocalImport<'a> {
    Named { module: &'a str, name: &'a str },
    Default { module: &'a str },
    Namespace { module: &'a str },
}

pub struct Evaluator<'a> {
    source_file: &'a SourceFile,
    imports: HashMap<&'a str, LocalImport<'a>>,
    /// Local name to the name it is exported under.
    exports: HashMap<&'a str, &'a str>,
}

impl<'a> Evaluator<'a> {
    pub fn new(source_file: &'a SourceFile) -> Self {
        let mut imports = HashMap::new();
        let mut exports = HashMap::new();
        for statement in &source_file.statements {
            match statement {
                Statement::Import(import) => {
                    let module = import.module_specifier.as_str();
                    for binding in &import.bindings {
                        let local = match &binding.imported {
                            ImportedName::Named(name) => LocalImport::Named { module, name },
                            ImportedName::Default => LocalImport::Default { module },
                            ImportedName::Namespace => LocalImport::Namespace { module },
                        };
                        imports.insert(binding.local.as_str(), local);
                    }
                }
                Statement::ExportLocal(export) => {
                    for spec in &export.specifiers {
                        exports.entry(spec.local.as_str()).or_insert(spec.exported.as_str());
                    }
                }
                Statement::Variable(var) if var.modifiers.exported => {
                    for name in var.declarations.iter().filter_map(|d| d.name.as_deref()) {
                        exports.insert(name, name);
                    }
                }
                other => {
                    if let (Some(name), Some(modifiers)) = (other.declared_name(), other.modifiers()) {
                        if modifiers.exported {
                            exports.insert(name, name);
                        }
                    }
                }
            }
        }
        Self {
            source_file,
            imports,
            exports,
        }
    }

    pub fn source_file(&self) -> &'a SourceFile {
        self.source_file
    }

    /// The name `local` is exported under, if it is exported at all.
    pub fn exported_name(&self, local: &str) -> Option<&'a str> {
        self.exports.get(local).copied()
    }

    pub fn evaluate(&self, expression: &Expression) -> MetadataValue {
        self.eval(expression, &mut Vec::new())
    }

    /// Evaluate a type annotation such as `Foo` or `ns.Foo` as a value reference.
    pub fn evaluate_type_reference(&self, type_reference: &TypeReference) -> MetadataValue {
        let mut segments = type_reference.name.split('.');
        let root = segments.next().unwrap_or_default();
        let mut expression = Expression {
            kind: ExpressionKind::Identifier(root.to_string()),
            span: type_reference.span,
        };
        for segment in segments {
            expression = Expression {
                kind: ExpressionKind::PropertyAccess {
                    expression: Box::new(expression),
                    name: segment.to_string(),
                },
                span: type_reference.span,
            };
        }
        self.evaluate(&expression)
    }

    pub fn error_at(&self, message: &str, span: Span) -> MetadataValue {
        let (line, character) = self.source_file.line_and_character_of_position(span.start);
        MetadataValue::error(message, Some(line), Some(character))
    }

    fn eval(&self, expression: &Expression, inlining: &mut Vec<String>) -> MetadataValue {
        let span = expression.span;
        match &expression.kind {
            ExpressionKind::StringLiteral(value) => MetadataValue::String(value.clone()),
            ExpressionKind::NumericLiteral(value) => MetadataValue::number(*value)
                .unwrap_or_else(|| self.error_at("Numeric value has no JSON representation", span)),
            ExpressionKind::BooleanLiteral(value) => MetadataValue::Bool(*value),
            ExpressionKind::NullLiteral => MetadataValue::Null,
            ExpressionKind::TemplateLiteral { quasis, expressions } => self.eval_template(quasis, expressions, inlining),
            ExpressionKind::Identifier(name) => self.eval_identifier(name, span, inlining),
            ExpressionKind::Array(elements) => MetadataValue::Array(
                elements
                    .iter()
                    .map(|element| match element {
                        ArrayElement::Expression(e) => self.eval(e, inlining),
                        ArrayElement::Spread(e) => MetadataValue::symbolic(MetadataSymbolicExpression::Spread {
                            expression: self.eval(e, inlining),
                        }),
                        ArrayElement::Hole => MetadataValue::Null,
                    })
                    .collect(),
            ),
            ExpressionKind::Object(members) => self.eval_object(members, span, inlining),
            ExpressionKind::Call { callee, arguments } => {
                if let Some(target) = forward_ref_target(callee, arguments) {
                    return self.eval(target, inlining);
                }
                MetadataValue::symbolic(MetadataSymbolicExpression::Call {
                    expression: self.eval(callee, inlining),
                    arguments: self.eval_arguments(arguments, inlining),
                })
            }
            ExpressionKind::New { callee, arguments } => MetadataValue::symbolic(MetadataSymbolicExpression::New {
                expression: self.eval(callee, inlining),
                arguments: self.eval_arguments(arguments, inlining),
            }),
            ExpressionKind::PropertyAccess { expression: target, name } => {
                if let ExpressionKind::Identifier(local) = &target.kind {
                    if let Some(LocalImport::Namespace { module }) = self.imports.get(local.as_str()) {
                        return MetadataValue::reference(name.clone(), Some(module.to_string()));
                    }
                }
                let target = self.eval(target, inlining);
                match &target {
                    MetadataValue::Object(object) if object.contains_key(name.as_str()) => {
                        object.get(name.as_str()).cloned().unwrap_or(MetadataValue::Null)
                    }
                    MetadataValue::String(s) if name == "length" => {
                        MetadataValue::number(s.chars().count() as f64).unwrap_or(MetadataValue::Null)
                    }
                    MetadataValue::Array(items) if name == "length" => {
                        MetadataValue::number(items.len() as f64).unwrap_or(MetadataValue::Null)
                    }
                    _ => MetadataValue::symbolic(MetadataSymbolicExpression::Select {
                        expression: target,
                        member: name.clone(),
                    }),
                }
            }
            ExpressionKind::ElementAccess { expression: target, argument } => {
                let target = self.eval(target, inlining);
                let index = self.eval(argument, inlining);
                match (&target, &index) {
                    (MetadataValue::Object(object), MetadataValue::String(key)) if object.contains_key(key.as_str()) => {
                        object.get(key.as_str()).cloned().unwrap_or(MetadataValue::Null)
                    }
                    (MetadataValue::Array(items), MetadataValue::Number(n)) => match n.as_u64() {
                        Some(i) if (i as usize) < items.len() => items[i as usize].clone(),
                        _ => MetadataValue::symbolic(MetadataSymbolicExpression::Index {
                            expression: target.clone(),
                            index: index.clone(),
                        }),
                    },
                    _ => MetadataValue::symbolic(MetadataSymbolicExpression::Index {
                        expression: target,
                        index,
                    }),
                }
            }
            ExpressionKind::Function { parameters, body } => match body {
                Some(body) => MetadataValue::symbolic(MetadataSymbolicExpression::Function {
                    parameters: parameters.clone(),
                    value: self.eval(body, inlining),
                }),
                None => self.error_at("Lambda not supported", span),
            },
            ExpressionKind::Binary { operator, left, right } => {
                let left = self.eval(left, inlining);
                let right = self.eval(right, inlining);
                fold_binary(operator, &left, &right).unwrap_or_else(|| {
                    MetadataValue::symbolic(MetadataSymbolicExpression::Binop {
                        operator: operator.clone(),
                        left,
                        right,
                    })
                })
            }
            ExpressionKind::Unary { operator, operand } => {
                let operand = self.eval(operand, inlining);
                fold_unary(operator, &operand).unwrap_or_else(|| {
                    MetadataValue::symbolic(MetadataSymbolicExpression::Pre {
                        operator: operator.clone(),
                        operand,
                    })
                })
            }
            ExpressionKind::Conditional {
                condition,
                when_true,
                when_false,
            } => match self.eval(condition, inlining) {
                MetadataValue::Bool(true) => self.eval(when_true, inlining),
                MetadataValue::Bool(false) => self.eval(when_false, inlining),
                condition => MetadataValue::symbolic(MetadataSymbolicExpression::If {
                    condition,
                    then_expression: self.eval(when_true, inlining),
                    else_expression: self.eval(when_false, inlining),
                }),
            },
            ExpressionKind::This | ExpressionKind::Unsupported(_) => {
                self.error_at("Expression form not supported", span)
            }
        }
    }

    fn eval_arguments(&self, arguments: &[Argument], inlining: &mut Vec<String>) -> Vec<MetadataValue> {
        arguments
            .iter()
            .map(|argument| match argument {
                Argument::Expression(e) => self.eval(e, inlining),
                Argument::Spread(e) => MetadataValue::symbolic(MetadataSymbolicExpression::Spread {
                    expression: self.eval(e, inlining),
                }),
            })
            .collect()
    }

    fn eval_template(&self, quasis: &[String], expressions: &[Expression], inlining: &mut Vec<String>) -> MetadataValue {
        let mut result = MetadataValue::String(quasis.first().cloned().unwrap_or_default());
        for (index, expression) in expressions.iter().enumerate() {
            let value = self.eval(expression, inlining);
            result = concat(result, value);
            if let Some(quasi) = quasis.get(index + 1).filter(|q| !q.is_empty()) {
                result = concat(result, MetadataValue::String(quasi.clone()));
            }
        }
        result
    }

    fn eval_object(&self, members: &[ObjectMember], span: Span, inlining: &mut Vec<String>) -> MetadataValue {
        let mut object = IndexMap::new();
        let mut quoted = Vec::new();
        for member in members {
            match member {
                ObjectMember::Property { key, value, .. } => {
                    let name = match key {
                        PropertyName::Identifier(name) | PropertyName::NumericLiteral(name) => name.clone(),
                        PropertyName::StringLiteral(name) => {
                            quoted.push(MetadataValue::String(name.clone()));
                            name.clone()
                        }
                        PropertyName::Private(_) | PropertyName::Computed(_) => {
                            return self.error_at("Computed property names are not supported", span);
                        }
                    };
                    object.insert(name, self.eval(value, inlining));
                }
                ObjectMember::Spread(_) => return self.error_at("Object spread is not supported", span),
            }
        }
        if !quoted.is_empty() {
            object.insert(QUOTED_KEYS.to_string(), MetadataValue::Array(quoted));
        }
        MetadataValue::Object(object)
    }

    fn eval_identifier(&self, name: &str, span: Span, inlining: &mut Vec<String>) -> MetadataValue {
        if let Some(import) = self.imports.get(name) {
            return match import {
                LocalImport::Named { module, name } => MetadataValue::reference(*name, Some(module.to_string())),
                LocalImport::Default { module } => MetadataValue::reference("default", Some(module.to_string())),
                LocalImport::Namespace { .. } => self.error_at("Reference to a namespace import is not supported", span),
            };
        }
        if let Some(exported) = self.exported_name(name) {
            return MetadataValue::reference(exported, None);
        }

        match self.source_file.find_declaration(name) {
            Some(Statement::Variable(var)) => {
                let initializer = var
                    .declarations
                    .iter()
                    .find(|d| d.name.as_deref() == Some(name))
                    .and_then(|d| d.initializer.as_ref());
                match initializer {
                    Some(_) if inlining.iter().any(|n| n == name) => {
                        self.error_at(&format!("Circular reference to '{}'", name), span)
                    }
                    Some(initializer) => {
                        inlining.push(name.to_string());
                        let value = self.eval(initializer, inlining);
                        inlining.pop();
                        value
                    }
                    None => self.error_at(&format!("Reference to uninitialized variable '{}'", name), span),
                }
            }
            Some(Statement::Class(_)) => self.error_at("Reference to non-exported class", span),
            Some(Statement::Function(_)) => self.error_at("Reference to non-exported function", span),
            Some(_) => self.error_at("Reference to a local symbol", span),
            None if name == "undefined" => MetadataValue::Null,
            None => MetadataValue::reference(name, None),
        }
    }
}

/// `forwardRef(() => X)` stands for `X`.
fn forward_ref_target<'e>(callee: &Expression, arguments: &'e [Argument]) -> Option<&'e Expression> {
    if !matches!(&callee.kind, ExpressionKind::Identifier(name) if name == "forwardRef") {
        return None;
    }
    match arguments {
        [Argument::Expression(Expression {
            kind: ExpressionKind::Function { parameters, body: Some(body) },
            ..
        })] if parameters.is_empty() => Some(body),
        _ => None,
    }
}

fn primitive_text(value: &MetadataValue) -> Option<String> {
    match value {
        MetadataValue::String(s) => Some(s.clone()),
        MetadataValue::Number(n) => Some(n.to_string()),
        MetadataValue::Bool(b) => Some(b.to_string()),
        MetadataValue::Null => Some("null".to_string()),
        _ => None,
    }
}

fn concat(left: MetadataValue, right: MetadataValue) -> MetadataValue {
    match (primitive_text(&left), primitive_text(&right)) {
        (Some(l), Some(r)) => MetadataValue::String(l + &r),
        _ => MetadataValue::symbolic(MetadataSymbolicExpression::Binop {
            operator: "+".to_string(),
            left,
            right,
        }),
    }
}

fn fold_binary(operator: &str, left: &MetadataValue, right: &MetadataValue) -> Option<MetadataValue> {
    if !left.is_primitive() || !right.is_primitive() {
        return None;
    }
    if operator == "+" && (left.as_str().is_some() || right.as_str().is_some()) {
        return Some(MetadataValue::String(primitive_text(left)? + &primitive_text(right)?));
    }
    match operator {
        "===" | "==" => return Some(MetadataValue::Bool(left == right)),
        "!==" | "!=" => return Some(MetadataValue::Bool(left != right)),
        "&&" | "||" => {
            let (MetadataValue::Bool(l), MetadataValue::Bool(r)) = (left, right) else {
                return None;
            };
            return Some(MetadataValue::Bool(if operator == "&&" { *l && *r } else { *l || *r }));
        }
        _ => {}
    }
    let (l, r) = (left.as_f64()?, right.as_f64()?);
    match operator {
        "+" => MetadataValue::number(l + r),
        "-" => MetadataValue::number(l - r),
        "*" => MetadataValue::number(l * r),
        "/" => MetadataValue::number(l / r),
        "%" => MetadataValue::number(l % r),
        "<" => Some(MetadataValue::Bool(l < r)),
        ">" => Some(MetadataValue::Bool(l > r)),
        "<=" => Some(MetadataValue::Bool(l <= r)),
        ">=" => Some(MetadataValue::Bool(l >= r)),
        "|" => MetadataValue::number(((l as i64) | (r as i64)) as f64),
        "&" => MetadataValue::number(((l as i64) & (r as i64)) as f64),
        _ => None,
    }
}

fn fold_unary(operator: &str, operand: &MetadataValue) -> Option<MetadataValue> {
    match (operator, operand) {
        ("!", MetadataValue::Bool(b)) => Some(MetadataValue::Bool(!b)),
        ("-", value) => MetadataValue::number(-value.as_f64()?),
        ("+", value) => MetadataValue::number(value.as_f64()?),
        _ => None,
    }
}
