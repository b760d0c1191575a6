// Metadata Collector
//
// Produces the metadata document for one compilation unit. Collection always
// reads the unit's original source so that rewritten text (for example after
// decorators were turned into static fields) still reports its annotations.

use indexmap::IndexMap;
use ts::{
    ClassDeclaration, ClassMember, Diagnostic, DiagnosticCategory, ExportClause, MemberKind, SourceFile, Span,
    Statement,
};

use super::evaluator::Evaluator;
use super::schema::{
    ClassMetadata, ExportedName, MemberMetadata, MetadataEntry, MetadataSymbolicExpression, MetadataValue,
    ModuleExportMetadata, ModuleMetadata,
};
use crate::diagnostics::{make_diagnostic, ErrorCode};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataCollector {
    /// Report error nodes as diagnostics and drop the entries that hold them.
    pub strict: bool,
}

impl MetadataCollector {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    /// Collect metadata for `source_file`. `None` means the unit exports nothing
    /// annotated and has no re-exports, so there is nothing to write.
    pub fn collect(&self, source_file: &SourceFile, diagnostics: &mut Vec<Diagnostic>) -> Option<ModuleMetadata> {
        let (metadata, annotated) = self.collect_unit(source_file, diagnostics);
        (annotated || metadata.exports.is_some()).then_some(metadata)
    }

    /// Like `collect`, but always describes the unit's exported values, even
    /// when nothing in it is annotated. Used when reading constants back.
    pub fn describe(&self, source_file: &SourceFile, diagnostics: &mut Vec<Diagnostic>) -> ModuleMetadata {
        self.collect_unit(source_file, diagnostics).0
    }

    fn collect_unit(&self, source_file: &SourceFile, diagnostics: &mut Vec<Diagnostic>) -> (ModuleMetadata, bool) {
        let source_file = source_file.original_source();
        let evaluator = Evaluator::new(source_file);

        let mut entries: IndexMap<String, (MetadataEntry, Span)> = IndexMap::new();

        for statement in &source_file.statements {
            match statement {
                Statement::Class(class) => {
                    let Some(name) = class.name.as_deref() else { continue };
                    let Some(exported) = evaluator.exported_name(name) else { continue };
                    if class.decorators.is_empty() && !class.has_member_decorators() {
                        continue;
                    }
                    let metadata = class_metadata(&evaluator, class);
                    entries.insert(exported.to_string(), (MetadataEntry::Class(metadata), class.span));
                }
                Statement::Function(function) => {
                    let Some(name) = function.name.as_deref() else { continue };
                    let (Some(exported), Some(value)) = (evaluator.exported_name(name), &function.single_return)
                    else {
                        continue;
                    };
                    let node = MetadataValue::symbolic(MetadataSymbolicExpression::Function {
                        parameters: function.parameters.clone(),
                        value: evaluator.evaluate(value),
                    });
                    entries.insert(exported.to_string(), (MetadataEntry::Value(node), function.span));
                }
                Statement::Variable(var) => {
                    for declaration in &var.declarations {
                        let Some(name) = declaration.name.as_deref() else { continue };
                        let (Some(exported), Some(initializer)) =
                            (evaluator.exported_name(name), &declaration.initializer)
                        else {
                            continue;
                        };
                        let value = evaluator.evaluate(initializer);
                        entries.insert(exported.to_string(), (MetadataEntry::Value(value), declaration.span));
                    }
                }
                _ => {}
            }
        }

        let exports = re_exports(source_file);

        if self.strict {
            entries.retain(|name, (entry, span)| match entry.find_error() {
                Some(MetadataSymbolicExpression::Error { message, .. }) => {
                    diagnostics.push(make_diagnostic(
                        ErrorCode::MetadataCollection,
                        DiagnosticCategory::Error,
                        Some(&source_file.file_name),
                        *span,
                        format!(
                            "Metadata collected contains an error that will be reported at runtime: {} (in '{}')",
                            message, name
                        ),
                    ));
                    false
                }
                _ => true,
            });
        }

        // Only annotated classes are recorded as class entries.
        let annotated = entries.values().any(|(entry, _)| matches!(entry, MetadataEntry::Class(_)));
        let mut metadata = ModuleMetadata::new(entries.into_iter().map(|(name, (entry, _))| (name, entry)).collect());
        if !exports.is_empty() {
            metadata.exports = Some(exports);
        }
        (metadata, annotated)
    }
}

fn decorators_of(evaluator: &Evaluator, decorators: &[ts::Decorator]) -> Option<Vec<MetadataValue>> {
    if decorators.is_empty() {
        None
    } else {
        Some(decorators.iter().map(|d| evaluator.evaluate(&d.expression)).collect())
    }
}

fn class_metadata(evaluator: &Evaluator, class: &ClassDeclaration) -> ClassMetadata {
    let mut members: IndexMap<String, Vec<MemberMetadata>> = IndexMap::new();
    let mut statics: IndexMap<String, MetadataValue> = IndexMap::new();

    for member in &class.members {
        let Some(name) = member.name.as_ref().and_then(|n| n.text()) else { continue };
        if member.is_static {
            if let (MemberKind::Property, Some(initializer)) = (member.kind, &member.initializer) {
                statics.insert(name.to_string(), evaluator.evaluate(initializer));
            }
            continue;
        }
        let record = match member.kind {
            MemberKind::Constructor => constructor_metadata(evaluator, member),
            MemberKind::Method => Some(MemberMetadata::Method {
                decorators: decorators_of(evaluator, &member.decorators),
            }),
            MemberKind::Property | MemberKind::GetAccessor | MemberKind::SetAccessor => {
                decorators_of(evaluator, &member.decorators).map(|decorators| MemberMetadata::Property {
                    decorators: Some(decorators),
                })
            }
            MemberKind::Other => None,
        };
        if let Some(record) = record {
            members.entry(name.to_string()).or_default().push(record);
        }
    }

    ClassMetadata {
        extends: class.extends.as_ref().map(|e| evaluator.evaluate(e)),
        decorators: decorators_of(evaluator, &class.decorators),
        members: (!members.is_empty()).then_some(members),
        statics: (!statics.is_empty()).then_some(statics),
        ..ClassMetadata::default()
    }
}

fn constructor_metadata(evaluator: &Evaluator, member: &ClassMember) -> Option<MemberMetadata> {
    if member.parameters.is_empty() && member.decorators.is_empty() {
        return None;
    }
    let parameter_decorators: Vec<Option<Vec<MetadataValue>>> = member
        .parameters
        .iter()
        .map(|p| decorators_of(evaluator, &p.decorators))
        .collect();
    let parameters: Vec<MetadataValue> = member
        .parameters
        .iter()
        .map(|p| match &p.type_reference {
            Some(type_reference) => evaluator.evaluate_type_reference(type_reference),
            None => MetadataValue::Null,
        })
        .collect();
    Some(MemberMetadata::Constructor {
        decorators: decorators_of(evaluator, &member.decorators),
        parameter_decorators: parameter_decorators
            .iter()
            .any(Option::is_some)
            .then_some(parameter_decorators),
        parameters: (!parameters.is_empty()).then_some(parameters),
    })
}

fn re_exports(source_file: &SourceFile) -> Vec<ModuleExportMetadata> {
    source_file
        .statements
        .iter()
        .filter_map(|statement| match statement {
            Statement::ExportFrom(export) if !export.is_type_only => {
                let names = match &export.clause {
                    ExportClause::All => None,
                    ExportClause::Named(specifiers) => Some(
                        specifiers
                            .iter()
                            .filter(|s| !s.is_type_only)
                            .map(|s| {
                                if s.local == s.exported {
                                    ExportedName::Name(s.local.clone())
                                } else {
                                    ExportedName::Alias {
                                        name: s.local.clone(),
                                        alias: s.exported.clone(),
                                    }
                                }
                            })
                            .collect(),
                    ),
                    ExportClause::Namespace(_) => return None,
                };
                Some(ModuleExportMetadata {
                    export: names,
                    from: export.module_specifier.clone(),
                })
            }
            _ => None,
        })
        .collect()
}
