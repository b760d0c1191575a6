//! Configuration Tests
//!
//! Reading tsconfig.json projects from disk and running `ngc` against them.

use std::fs;
use std::path::Path;

use tsc_wrapped::diagnostics::{ng_error_code, ErrorCode};
use tsc_wrapped::main_entry::main;
use tsc_wrapped::perform_compile::{read_configuration, AnnotationsAs, EmitFlags};

fn write(dir: &Path, name: &str, text: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

fn path_of(dir: &Path, name: &str) -> String {
    dir.join(name).to_string_lossy().replace('\\', "/")
}

const TSCONFIG: &str = r#"{
  // compiler options
  "compilerOptions": {
    "outDir": "dist",
    "rootDir": ".",
    "declaration": true /* also .d.ts */
  },
  "angularCompilerOptions": {
    "genDir": "gen",
    "annotationsAs": "decorators",
    "strictMetadataEmit": true,
    "skipTemplateCodegen": true
  },
  "exclude": ["**/node_modules/**", "src/skip/**"]
}
"#;

#[test]
fn should_read_options_with_comments() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "tsconfig.json", TSCONFIG);
    write(dir.path(), "src/a.ts", "export const a = 1;");

    let config = read_configuration(&path_of(dir.path(), "tsconfig.json"));
    assert!(config.errors.is_empty(), "{:?}", config.errors);
    assert_eq!(config.options.out_dir.as_deref(), Some(path_of(dir.path(), "dist").as_str()));
    assert_eq!(config.options.declaration, Some(true));
    assert_eq!(config.angular_options.annotations_as, AnnotationsAs::Decorators);
    assert!(config.angular_options.strict_metadata_emit);
    assert_eq!(config.gen_dir(), path_of(dir.path(), "gen"));
    assert_eq!(config.emit_flags, EmitFlags::DTS | EmitFlags::JS | EmitFlags::METADATA);
}

#[test]
fn should_discover_roots_from_globs() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "tsconfig.json", TSCONFIG);
    write(dir.path(), "src/b.ts", "");
    write(dir.path(), "src/a.ts", "");
    write(dir.path(), "src/skip/c.ts", "");
    write(dir.path(), "src/styles.css", "");
    write(dir.path(), "node_modules/lib/index.d.ts", "");

    let config = read_configuration(&path_of(dir.path(), "."));
    assert_eq!(
        config.root_names,
        vec![path_of(dir.path(), "src/a.ts"), path_of(dir.path(), "src/b.ts")]
    );
}

#[test]
fn should_prefer_explicit_files() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "tsconfig.json", r#"{"files": ["src/main.ts"], "include": ["**/*.ts"]}"#);
    write(dir.path(), "src/main.ts", "");
    write(dir.path(), "src/other.ts", "");

    let config = read_configuration(&path_of(dir.path(), "tsconfig.json"));
    assert_eq!(config.root_names, vec![path_of(dir.path(), "src/main.ts")]);
    assert_eq!(config.emit_flags, EmitFlags::DEFAULT);
}

#[test]
fn should_resolve_base_path_against_the_project() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "tsconfig.json", r#"{"angularCompilerOptions": {"basePath": "src"}}"#);

    let config = read_configuration(&path_of(dir.path(), "tsconfig.json"));
    assert_eq!(config.base_path, path_of(dir.path(), "src"));
    assert_eq!(config.gen_dir(), path_of(dir.path(), "src"));
}

#[test]
fn should_report_unparsable_projects() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "tsconfig.json", "{\"compilerOptions\": ");

    let config = read_configuration(&path_of(dir.path(), "tsconfig.json"));
    assert_eq!(config.errors.len(), 1);
    assert_eq!(config.errors[0].code, ng_error_code(ErrorCode::ConfigInvalid));
    assert!(config.errors[0].message_text.to_string().contains("Cannot parse project file"));
}

#[test]
fn should_compile_a_project_from_the_command_line() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "tsconfig.json",
        r#"{"compilerOptions": {"outDir": "dist", "rootDir": "."}, "include": ["src/**/*.ts"]}"#,
    );
    write(
        dir.path(),
        "node_modules/@angular/core/index.d.ts",
        "export declare function Component(o: any): any;\nexport declare function NgModule(o: any): any;\n",
    );
    write(
        dir.path(),
        "src/app.ts",
        "import {Component, NgModule} from '@angular/core';\n\
         @Component({selector: 'my-app', template: '<p>hi</p>'})\n\
         export class AppComponent {}\n\
         @NgModule({declarations: [AppComponent]})\n\
         export class AppModule {}\n",
    );

    let cwd = path_of(dir.path(), ".");
    let args: Vec<String> = ["ngc", "-p", "tsconfig.json"].iter().map(|a| a.to_string()).collect();
    assert_eq!(main(&args, &cwd), 0);

    assert!(dir.path().join("src/app.ngfactory.ts").is_file());
    assert!(dir.path().join("dist/src/app.js").is_file());
    assert!(dir.path().join("dist/src/app.ngfactory.js").is_file());
    assert!(dir.path().join("dist/src/app.metadata.json").is_file());
    assert!(!dir.path().join("dist/src/app.ngfactory.metadata.json").exists());
}

#[test]
fn should_exit_with_one_on_bad_projects() {
    let dir = tempfile::tempdir().unwrap();
    let cwd = path_of(dir.path(), ".");
    let args: Vec<String> = ["ngc", "-p", "missing.json"].iter().map(|a| a.to_string()).collect();
    assert_eq!(main(&args, &cwd), 1);
}
