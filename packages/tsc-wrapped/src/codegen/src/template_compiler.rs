// Template Compiler
//
// The seam to the downstream template compiler. `FactoryCompiler` is the
// built-in implementation: it checks module membership, loads external
// resources and writes one factory module (plus a style module when the
// components carry styles) per source file.

use std::collections::HashMap;
use std::fmt::Write;

use thiserror::Error;
use ts::path::{dirname, is_absolute, relative, strip_extension};
use ts::Symbol;

use super::resource_loader::{resolve_resource_url, ResourceError, ResourceLoader};

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDescriptor {
    pub symbol: Symbol,
    pub selector: Option<String>,
    pub template: Option<String>,
    pub template_url: Option<String>,
    pub styles: Vec<String>,
    pub style_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDescriptor {
    pub symbol: Symbol,
    pub declarations: Vec<Symbol>,
    pub imports: Vec<Symbol>,
    pub exports: Vec<Symbol>,
    pub bootstrap: Vec<Symbol>,
}

/// Module graph facts computed over every module of the Program at once.
#[derive(Debug, Clone, Default)]
pub struct AnalyzedModules {
    pub modules: Vec<ModuleDescriptor>,
    /// Declared type to the modules that declare it.
    pub declaring_modules: HashMap<Symbol, Vec<Symbol>>,
}

impl AnalyzedModules {
    pub fn declaring_modules_of(&self, symbol: &Symbol) -> &[Symbol] {
        self.declaring_modules.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModule {
    pub module_url: String,
    pub source: String,
}

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("component '{component}' is declared in {count} modules, expected exactly one")]
    NotDeclared { component: String, count: usize },

    #[error("component '{component}' has neither a template nor a templateUrl")]
    MissingTemplate { component: String },

    #[error("{0}")]
    Compile(String),
}

pub trait TemplateCompiler: Send + Sync {
    fn analyze_modules(&self, modules: &[ModuleDescriptor]) -> AnalyzedModules;

    fn compile(
        &self,
        file_url: &str,
        analyzed: &AnalyzedModules,
        components: &[ComponentDescriptor],
        modules: &[ModuleDescriptor],
        resources: &dyn ResourceLoader,
    ) -> Result<Vec<GeneratedModule>, CodegenError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FactoryCompiler;

impl FactoryCompiler {
    pub fn new() -> Self {
        Self
    }
}

/// Import bindings of one generated module, deduplicated by symbol.
#[derive(Default)]
struct ImportSet {
    order: Vec<(String, Vec<(String, String)>)>,
    locals: HashMap<Symbol, String>,
    used: HashMap<String, usize>,
}

impl ImportSet {
    fn local_for(&mut self, symbol: &Symbol, specifier: String) -> String {
        if let Some(local) = self.locals.get(symbol) {
            return local.clone();
        }
        let count = self.used.entry(symbol.name.clone()).or_insert(0);
        let local = if *count == 0 {
            symbol.name.clone()
        } else {
            format!("{}_{}", symbol.name, count)
        };
        *count += 1;
        match self.order.iter_mut().find(|(s, _)| *s == specifier) {
            Some((_, names)) => names.push((symbol.name.clone(), local.clone())),
            None => self.order.push((specifier, vec![(symbol.name.clone(), local.clone())])),
        }
        self.locals.insert(symbol.clone(), local.clone());
        local
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for (specifier, names) in &self.order {
            let bindings: Vec<String> = names
                .iter()
                .map(|(name, local)| {
                    if name == local {
                        name.clone()
                    } else {
                        format!("{} as {}", name, local)
                    }
                })
                .collect();
            let _ = writeln!(out, "import {{{}}} from '{}';", bindings.join(", "), specifier);
        }
        out
    }
}

/// Module specifier for `symbol` as imported from a module in `from_dir`.
fn specifier_for(from_dir: &str, symbol: &Symbol) -> String {
    if !is_absolute(&symbol.file_name) {
        return symbol.file_name.clone();
    }
    let rel = relative(from_dir, strip_extension(&symbol.file_name));
    if rel.starts_with("../") {
        rel
    } else {
        format!("./{}", rel)
    }
}

fn string_literal(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string())
}

impl TemplateCompiler for FactoryCompiler {
    fn analyze_modules(&self, modules: &[ModuleDescriptor]) -> AnalyzedModules {
        let mut declaring_modules: HashMap<Symbol, Vec<Symbol>> = HashMap::new();
        for module in modules {
            for declaration in &module.declarations {
                let declaring = declaring_modules.entry(declaration.clone()).or_default();
                if !declaring.contains(&module.symbol) {
                    declaring.push(module.symbol.clone());
                }
            }
        }
        AnalyzedModules {
            modules: modules.to_vec(),
            declaring_modules,
        }
    }

    fn compile(
        &self,
        file_url: &str,
        analyzed: &AnalyzedModules,
        components: &[ComponentDescriptor],
        _modules: &[ModuleDescriptor],
        resources: &dyn ResourceLoader,
    ) -> Result<Vec<GeneratedModule>, CodegenError> {
        let base = strip_extension(file_url);
        let dir = dirname(file_url);
        let style_module = format!("{}.ngstyle", base);

        let mut imports = ImportSet::default();
        let mut factories = String::new();
        let mut styles_out = String::new();

        for component in components {
            let name = component.symbol.name.clone();
            let module = match analyzed.declaring_modules_of(&component.symbol) {
                [module] => module.clone(),
                other => {
                    return Err(CodegenError::NotDeclared {
                        component: name,
                        count: other.len(),
                    })
                }
            };

            let template = match (&component.template, &component.template_url) {
                (Some(template), _) => template.clone(),
                (None, Some(url)) => resources.get(&resolve_resource_url(file_url, url))?,
                (None, None) => return Err(CodegenError::MissingTemplate { component: name }),
            };
            let mut styles = component.styles.clone();
            for url in &component.style_urls {
                styles.push(resources.get(&resolve_resource_url(file_url, url))?);
            }

            let component_local = imports.local_for(&component.symbol, specifier_for(&dir, &component.symbol));
            let module_local = imports.local_for(&module, specifier_for(&dir, &module));
            let styles_ref = if styles.is_empty() {
                "[]".to_string()
            } else {
                let export = format!("styles_{}", name);
                let literals: Vec<String> = styles.iter().map(|s| string_literal(s)).collect();
                let _ = writeln!(styles_out, "export const {}: string[] = [{}];", export, literals.join(", "));
                let style_symbol = Symbol::new(style_module.clone(), export, component.symbol.kind);
                let specifier = format!("./{}", ts::path::basename(&style_module));
                imports.local_for(&style_symbol, specifier)
            };

            let _ = write!(
                factories,
                "\nexport const {name}NgFactory = {{\n  componentType: {component},\n  selector: {selector},\n  template: {template},\n  styles: {styles},\n  module: {module},\n}};\n",
                name = name,
                component = component_local,
                selector = string_literal(component.selector.as_deref().unwrap_or("")),
                template = string_literal(&template),
                styles = styles_ref,
                module = module_local,
            );
        }

        let mut generated = vec![GeneratedModule {
            module_url: format!("{}.ngfactory.ts", base),
            source: format!("{}{}", imports.render(), factories),
        }];
        if !styles_out.is_empty() {
            generated.push(GeneratedModule {
                module_url: format!("{}.ts", style_module),
                source: styles_out,
            });
        }
        Ok(generated)
    }
}
