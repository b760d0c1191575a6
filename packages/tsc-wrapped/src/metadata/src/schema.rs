// Metadata Schema
//
// The JSON shape of `.metadata.json` sidecars. Every symbolic node carries a
// `__symbolic` tag; plain JSON values stand for themselves.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current schema version.
pub const METADATA_VERSION: u32 = 3;

/// Key under which an object literal lists the property names written quoted.
pub const QUOTED_KEYS: &str = "$quoted$";

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("cannot serialize metadata: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("invalid metadata in '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type MetadataObject = IndexMap<String, MetadataValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<MetadataValue>),
    Symbolic(Box<MetadataSymbolicExpression>),
    Object(MetadataObject),
}

impl MetadataValue {
    /// A number node. Integral values serialize without a fraction; NaN and
    /// infinities have no JSON form and become `None`.
    pub fn number(value: f64) -> Option<MetadataValue> {
        if value.fract() == 0.0 && value.abs() < 9.0e15 {
            Some(MetadataValue::Number(serde_json::Number::from(value as i64)))
        } else {
            serde_json::Number::from_f64(value).map(MetadataValue::Number)
        }
    }

    pub fn symbolic(expression: MetadataSymbolicExpression) -> MetadataValue {
        MetadataValue::Symbolic(Box::new(expression))
    }

    pub fn reference(name: impl Into<String>, module: Option<String>) -> MetadataValue {
        Self::symbolic(MetadataSymbolicExpression::Reference {
            name: name.into(),
            module,
        })
    }

    pub fn error(message: impl Into<String>, line: Option<usize>, character: Option<usize>) -> MetadataValue {
        Self::symbolic(MetadataSymbolicExpression::Error {
            message: message.into(),
            line,
            character,
        })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_symbolic(&self) -> Option<&MetadataSymbolicExpression> {
        match self {
            MetadataValue::Symbolic(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this value is a literal JSON primitive.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            MetadataValue::Null | MetadataValue::Bool(_) | MetadataValue::Number(_) | MetadataValue::String(_)
        )
    }

    /// The first error node in this tree, depth first.
    pub fn find_error(&self) -> Option<&MetadataSymbolicExpression> {
        match self {
            MetadataValue::Array(items) => items.iter().find_map(|v| v.find_error()),
            MetadataValue::Object(object) => object.values().find_map(|v| v.find_error()),
            MetadataValue::Symbolic(expression) => match expression.as_ref() {
                error @ MetadataSymbolicExpression::Error { .. } => Some(error),
                other => other.children().into_iter().find_map(|v| v.find_error()),
            },
            _ => None,
        }
    }

    /// Apply `f` to every node bottom-up.
    pub fn map_nodes(self, f: &mut dyn FnMut(MetadataValue) -> MetadataValue) -> MetadataValue {
        let mapped = match self {
            MetadataValue::Array(items) => MetadataValue::Array(items.into_iter().map(|v| v.map_nodes(f)).collect()),
            MetadataValue::Object(object) => {
                MetadataValue::Object(object.into_iter().map(|(k, v)| (k, v.map_nodes(f))).collect())
            }
            MetadataValue::Symbolic(expression) => MetadataValue::Symbolic(Box::new(expression.map_children(f))),
            other => other,
        };
        f(mapped)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__symbolic", rename_all = "lowercase")]
pub enum MetadataSymbolicExpression {
    Reference {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        module: Option<String>,
    },
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        line: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        character: Option<usize>,
    },
    Call {
        expression: MetadataValue,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        arguments: Vec<MetadataValue>,
    },
    New {
        expression: MetadataValue,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        arguments: Vec<MetadataValue>,
    },
    Select {
        expression: MetadataValue,
        member: String,
    },
    Index {
        expression: MetadataValue,
        index: MetadataValue,
    },
    Binop {
        operator: String,
        left: MetadataValue,
        right: MetadataValue,
    },
    Pre {
        operator: String,
        operand: MetadataValue,
    },
    If {
        condition: MetadataValue,
        #[serde(rename = "thenExpression")]
        then_expression: MetadataValue,
        #[serde(rename = "elseExpression")]
        else_expression: MetadataValue,
    },
    Function {
        parameters: Vec<String>,
        value: MetadataValue,
    },
    Spread {
        expression: MetadataValue,
    },
}

impl MetadataSymbolicExpression {
    fn children(&self) -> Vec<&MetadataValue> {
        use MetadataSymbolicExpression::*;
        match self {
            Reference { .. } | Error { .. } => Vec::new(),
            Call { expression, arguments } | New { expression, arguments } => {
                std::iter::once(expression).chain(arguments.iter()).collect()
            }
            Select { expression, .. } | Spread { expression } => vec![expression],
            Index { expression, index } => vec![expression, index],
            Binop { left, right, .. } => vec![left, right],
            Pre { operand, .. } => vec![operand],
            If {
                condition,
                then_expression,
                else_expression,
            } => vec![condition, then_expression, else_expression],
            Function { value, .. } => vec![value],
        }
    }

    fn map_children(self, f: &mut dyn FnMut(MetadataValue) -> MetadataValue) -> Self {
        use MetadataSymbolicExpression::*;
        match self {
            leaf @ (Reference { .. } | Error { .. }) => leaf,
            Call { expression, arguments } => Call {
                expression: expression.map_nodes(f),
                arguments: arguments.into_iter().map(|a| a.map_nodes(f)).collect(),
            },
            New { expression, arguments } => New {
                expression: expression.map_nodes(f),
                arguments: arguments.into_iter().map(|a| a.map_nodes(f)).collect(),
            },
            Select { expression, member } => Select {
                expression: expression.map_nodes(f),
                member,
            },
            Index { expression, index } => Index {
                expression: expression.map_nodes(f),
                index: index.map_nodes(f),
            },
            Binop { operator, left, right } => Binop {
                operator,
                left: left.map_nodes(f),
                right: right.map_nodes(f),
            },
            Pre { operator, operand } => Pre {
                operator,
                operand: operand.map_nodes(f),
            },
            If {
                condition,
                then_expression,
                else_expression,
            } => If {
                condition: condition.map_nodes(f),
                then_expression: then_expression.map_nodes(f),
                else_expression: else_expression.map_nodes(f),
            },
            Function { parameters, value } => Function {
                parameters,
                value: value.map_nodes(f),
            },
            Spread { expression } => Spread {
                expression: expression.map_nodes(f),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassTag {
    #[serde(rename = "class")]
    Class,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetadata {
    #[serde(rename = "__symbolic")]
    pub symbolic: ClassTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<MetadataValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decorators: Option<Vec<MetadataValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<IndexMap<String, Vec<MemberMetadata>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statics: Option<IndexMap<String, MetadataValue>>,
}

impl Default for ClassMetadata {
    fn default() -> Self {
        Self {
            symbolic: ClassTag::Class,
            extends: None,
            decorators: None,
            members: None,
            statics: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__symbolic", rename_all = "lowercase")]
pub enum MemberMetadata {
    Constructor {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        decorators: Option<Vec<MetadataValue>>,
        #[serde(
            rename = "parameterDecorators",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        parameter_decorators: Option<Vec<Option<Vec<MetadataValue>>>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parameters: Option<Vec<MetadataValue>>,
    },
    Method {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        decorators: Option<Vec<MetadataValue>>,
    },
    Property {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        decorators: Option<Vec<MetadataValue>>,
    },
}

impl MemberMetadata {
    pub fn decorators(&self) -> &[MetadataValue] {
        match self {
            MemberMetadata::Constructor { decorators, .. }
            | MemberMetadata::Method { decorators }
            | MemberMetadata::Property { decorators } => decorators.as_deref().unwrap_or(&[]),
        }
    }
}

/// One top-level entry: a class record or any metadata value (functions and
/// constants are plain values).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataEntry {
    Class(ClassMetadata),
    Value(MetadataValue),
}

impl MetadataEntry {
    pub fn as_class(&self) -> Option<&ClassMetadata> {
        match self {
            MetadataEntry::Class(class) => Some(class),
            MetadataEntry::Value(_) => None,
        }
    }

    pub fn find_error(&self) -> Option<&MetadataSymbolicExpression> {
        match self {
            MetadataEntry::Value(value) => value.find_error(),
            MetadataEntry::Class(class) => {
                let decorators = class.decorators.iter().flatten();
                let extends = class.extends.iter();
                let members = class.members.iter().flat_map(|m| m.values().flatten()).flat_map(|member| {
                    let parameters: Vec<&MetadataValue> = match member {
                        MemberMetadata::Constructor {
                            parameter_decorators,
                            parameters,
                            ..
                        } => parameter_decorators
                            .iter()
                            .flatten()
                            .flatten()
                            .flatten()
                            .chain(parameters.iter().flatten())
                            .collect(),
                        _ => Vec::new(),
                    };
                    member.decorators().iter().chain(parameters)
                });
                let statics = class.statics.iter().flat_map(|s| s.values());
                decorators
                    .chain(extends)
                    .chain(members)
                    .chain(statics)
                    .find_map(|v| v.find_error())
            }
        }
    }
}

/// `export ... from` records. A missing `export` list means `export *`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleExportMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export: Option<Vec<ExportedName>>,
    pub from: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExportedName {
    Name(String),
    Alias {
        name: String,
        #[serde(rename = "as")]
        alias: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleTag {
    #[serde(rename = "module")]
    Module,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    #[serde(rename = "__symbolic")]
    pub symbolic: ModuleTag,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exports: Option<Vec<ModuleExportMetadata>>,
    #[serde(rename = "importAs", default, skip_serializing_if = "Option::is_none")]
    pub import_as: Option<String>,
    pub metadata: IndexMap<String, MetadataEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origins: Option<IndexMap<String, String>>,
}

impl ModuleMetadata {
    pub fn new(metadata: IndexMap<String, MetadataEntry>) -> Self {
        Self {
            symbolic: ModuleTag::Module,
            version: METADATA_VERSION,
            exports: None,
            import_as: None,
            metadata,
            origins: None,
        }
    }

    /// The version 1 form of this document: no re-export records and no
    /// quoted-key lists.
    pub fn to_v1(&self) -> ModuleMetadata {
        let metadata = self
            .metadata
            .iter()
            .map(|(name, entry)| {
                (name.clone(), entry.clone().map_nodes(&mut strip_quoted))
            })
            .collect();
        ModuleMetadata {
            symbolic: ModuleTag::Module,
            version: 1,
            exports: None,
            import_as: self.import_as.clone(),
            metadata,
            origins: self.origins.clone(),
        }
    }
}

fn strip_quoted(node: MetadataValue) -> MetadataValue {
    match node {
        MetadataValue::Object(mut object) => {
            object.shift_remove(QUOTED_KEYS);
            MetadataValue::Object(object)
        }
        other => other,
    }
}

fn map_all(values: Vec<MetadataValue>, f: &mut dyn FnMut(MetadataValue) -> MetadataValue) -> Vec<MetadataValue> {
    values.into_iter().map(|v| v.map_nodes(f)).collect()
}

impl ClassMetadata {
    /// Apply `f` bottom-up to every value node of the record.
    pub fn map_nodes(mut self, f: &mut dyn FnMut(MetadataValue) -> MetadataValue) -> ClassMetadata {
        self.decorators = self.decorators.map(|d| map_all(d, f));
        self.extends = self.extends.map(|e| e.map_nodes(f));
        self.statics = self
            .statics
            .map(|statics| statics.into_iter().map(|(k, v)| (k, v.map_nodes(f))).collect());
        if let Some(members) = self.members.take() {
            let mut mapped = IndexMap::new();
            for (name, records) in members {
                let mut out = Vec::with_capacity(records.len());
                for record in records {
                    out.push(match record {
                        MemberMetadata::Constructor {
                            decorators,
                            parameter_decorators,
                            parameters,
                        } => MemberMetadata::Constructor {
                            decorators: decorators.map(|d| map_all(d, f)),
                            parameter_decorators: parameter_decorators.map(|all| {
                                let mut params = Vec::with_capacity(all.len());
                                for p in all {
                                    params.push(p.map(|d| map_all(d, f)));
                                }
                                params
                            }),
                            parameters: parameters.map(|p| map_all(p, f)),
                        },
                        MemberMetadata::Method { decorators } => MemberMetadata::Method {
                            decorators: decorators.map(|d| map_all(d, f)),
                        },
                        MemberMetadata::Property { decorators } => MemberMetadata::Property {
                            decorators: decorators.map(|d| map_all(d, f)),
                        },
                    });
                }
                mapped.insert(name, out);
            }
            self.members = Some(mapped);
        }
        self
    }
}

impl MetadataEntry {
    pub fn map_nodes(self, f: &mut dyn FnMut(MetadataValue) -> MetadataValue) -> MetadataEntry {
        match self {
            MetadataEntry::Value(value) => MetadataEntry::Value(value.map_nodes(f)),
            MetadataEntry::Class(class) => MetadataEntry::Class(class.map_nodes(f)),
        }
    }
}

/// Serialize a sidecar: the current document followed by its version 1 form.
pub fn serialize_sidecar(metadata: &ModuleMetadata) -> Result<String, MetadataError> {
    serde_json::to_string(&(metadata, metadata.to_v1())).map_err(MetadataError::Serialize)
}

/// Read a sidecar written by `serialize_sidecar` or a single bundle document.
pub fn parse_metadata(path: &str, text: &str) -> Result<Vec<ModuleMetadata>, MetadataError> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(|source| MetadataError::Parse {
        path: path.to_string(),
        source,
    })?;
    let parsed = if value.is_array() {
        serde_json::from_value::<Vec<ModuleMetadata>>(value)
    } else {
        serde_json::from_value::<ModuleMetadata>(value).map(|m| vec![m])
    };
    parsed.map_err(|source| MetadataError::Parse {
        path: path.to_string(),
        source,
    })
}
