use std::fmt::Write;

use once_cell::sync::Lazy;
use regex::Regex;
use ts::{CompilerHost, Diagnostic};

use super::error_code::ErrorCode;

static ERROR_CODE_MATCHER: Lazy<Regex> = Lazy::new(|| Regex::new(r"TS-99(\d+)").expect("valid regex"));

/// Angular codes are stored as `-99<code>` so they never collide with
/// TypeScript's; when formatted, the `TS-99` prefix becomes `NG`.
pub fn ng_error_code(code: ErrorCode) -> i32 {
    -(990000 + code as i32)
}

pub fn replace_ts_with_ng_in_errors(errors: &str) -> String {
    ERROR_CODE_MATCHER.replace_all(errors, "NG${1}").to_string()
}

/// Render diagnostics as `file(line,col): category TScode: message`, one per
/// line. Positions are resolved by loading the file through `host`.
pub fn format_diagnostics(diagnostics: &[Diagnostic], host: &dyn CompilerHost) -> String {
    let new_line = host.get_new_line();
    let mut output = String::new();
    for diagnostic in diagnostics {
        if let Some(file) = &diagnostic.file {
            let position = host
                .get_source_file(file)
                .ok()
                .flatten()
                .map(|sf| sf.line_and_character_of_position(diagnostic.start));
            let _ = match position {
                Some((line, character)) => write!(output, "{}({},{}): ", file, line + 1, character + 1),
                None => write!(output, "{}: ", file),
            };
        }
        let _ = write!(
            output,
            "{} TS{}: {}{}",
            diagnostic.category, diagnostic.code, diagnostic.message_text, new_line
        );
    }
    replace_ts_with_ng_in_errors(&output)
}
