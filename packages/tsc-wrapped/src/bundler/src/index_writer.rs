// Bundle Index Writer
//
// Source text of the synthetic index unit of a flat module.

use std::fmt::Write;

use indexmap::IndexMap;
use ts::path::{basename, strip_extension};

use super::bundler::FlatModuleBundle;

const INDEX_HEADER: &str = "/**\n * Generated bundle index. Do not edit.\n */\n\n";

/// `ɵa` .. `ɵz`, then `ɵaa`, `ɵab`, ...
pub fn private_name(index: usize) -> String {
    let mut letters = Vec::new();
    let mut i = index;
    loop {
        letters.push((b'a' + (i % 26) as u8) as char);
        if i < 26 {
            break;
        }
        i = i / 26 - 1;
    }
    letters.reverse();
    format!("\u{0275}{}", letters.into_iter().collect::<String>())
}

/// The index re-exports everything the library index exports, then each
/// private symbol under its bundle name, grouped by origin module.
pub fn create_bundle_index(index_file: &str, bundle: &FlatModuleBundle) -> String {
    let mut out = String::from(INDEX_HEADER);
    let _ = writeln!(out, "export * from './{}';", basename(strip_extension(index_file)));

    let mut by_module: IndexMap<&str, Vec<String>> = IndexMap::new();
    for (name, private) in &bundle.private_symbols {
        by_module
            .entry(private.module.as_str())
            .or_default()
            .push(format!("{} as {}", private.export_name, name));
    }
    if !by_module.is_empty() {
        out.push('\n');
    }
    for (module, specifiers) in by_module {
        let _ = writeln!(out, "export {{{}}} from '{}';", specifiers.join(", "), module);
    }
    out
}
