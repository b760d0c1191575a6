// Module Namer
//
// Maps file paths and import specifiers to `goog.module` identifiers. The
// mapping is pure and total: every input yields an identifier matching
// `[A-Za-z_$][A-Za-z0-9._$]*`.
//
// `_` is escaped to `__` before path separators become `$`, so distinct paths
// never collapse onto the same name.

use once_cell::sync::Lazy;
use regex::Regex;
use ts::path::{dirname, is_relative_specifier, join};

static SOURCE_EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.(js|ts)$").expect("valid regex"));
static SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[/\\]").expect("valid regex"));
static LEADING_INVALID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^A-Za-z_$]").expect("valid regex"));
static INVALID: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9._$]").expect("valid regex"));

/// Names modules for a distribution tree laid out as
/// `dist/<dist_root>/<package>/[esm|es5|es2015|bundles/]<rest>`.
#[derive(Debug, Clone)]
pub struct ModuleNamer {
    package_prefix: String,
    dist_pattern: Regex,
}

impl Default for ModuleNamer {
    fn default() -> Self {
        Self::new("@angular", "packages-dist")
    }
}

impl ModuleNamer {
    pub fn new(package_prefix: &str, dist_root: &str) -> Self {
        let pattern = format!(
            r"(?:^|/)dist/{}/([^/]+)/(?:(?:esm|es5|es2015|bundles)/)?(.*)$",
            regex::escape(dist_root)
        );
        Self {
            package_prefix: package_prefix.trim_end_matches('/').to_string(),
            dist_pattern: Regex::new(&pattern).unwrap_or_else(|_| Regex::new("$^").expect("valid regex")),
        }
    }

    /// Identifier for the module `import_specifier` names when written in `context_path`.
    pub fn name(&self, context_path: &str, import_specifier: &str) -> String {
        let stripped = SOURCE_EXTENSION.replace(import_specifier, "");
        let mut path = if is_relative_specifier(&stripped) {
            join(&dirname(context_path), &stripped)
        } else {
            stripped.into_owned()
        };

        if let Some(captures) = self.dist_pattern.captures(&path) {
            let package = &captures[1];
            let rest = captures[2].trim_end_matches('/');
            let mut qualified = if rest.is_empty() {
                format!("{}/{}", self.package_prefix, package)
            } else {
                format!("{}/{}/{}", self.package_prefix, package, rest)
            };
            if let Some(without_index) = qualified.strip_suffix("/index") {
                qualified = without_index.to_string();
            }
            path = qualified;
        }

        escape_module_name(&path)
    }
}

/// Turn a path into an identifier.
pub fn escape_module_name(path: &str) -> String {
    let escaped = path.replace('_', "__");
    let escaped = SEPARATOR.replace_all(&escaped, regex::NoExpand("$"));
    let escaped = LEADING_INVALID.replace(&escaped, "_");
    let escaped = INVALID.replace_all(&escaped, "_");
    if escaped.is_empty() {
        "_".to_string()
    } else {
        escaped.into_owned()
    }
}
