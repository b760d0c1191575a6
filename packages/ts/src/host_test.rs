// Compiler Host Tests

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::*;

    /// Counts writes and rewrites every read to upper case.
    struct ShoutingHost<'a> {
        inner: &'a dyn CompilerHost,
        writes: AtomicUsize,
    }

    impl DelegatingHost for ShoutingHost<'_> {
        fn delegate(&self) -> &dyn CompilerHost {
            self.inner
        }

        fn read_file(&self, file_name: &str) -> Option<String> {
            self.delegate().read_file(file_name).map(|t| t.to_uppercase())
        }

        fn write_file(&self, file_name: &str, data: &str, source_files: &[Arc<SourceFile>]) -> Result<(), HostError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.delegate().write_file(file_name, data, source_files)
        }
    }

    mod delegating_host_tests {
        use super::*;

        #[test]
        fn should_forward_operations_that_are_not_overridden() {
            let inner = InMemoryCompilerHost::with_files("/w", [("a.ts", "const a = 1;")]);
            let host = ShoutingHost { inner: &inner, writes: AtomicUsize::new(0) };
            let host: &dyn CompilerHost = &host;

            assert!(host.file_exists("a.ts"));
            assert!(host.directory_exists("/w"));
            assert_eq!(host.get_current_directory(), "/w");
            assert_eq!(host.get_new_line(), "\n");
            assert_eq!(host.get_source_file("a.ts").unwrap().unwrap().text, "const a = 1;");
        }

        #[test]
        fn should_apply_overrides() {
            let inner = InMemoryCompilerHost::with_files("/w", [("a.ts", "const a = 1;")]);
            let shouting = ShoutingHost { inner: &inner, writes: AtomicUsize::new(0) };
            let host: &dyn CompilerHost = &shouting;

            assert_eq!(host.read_file("a.ts").as_deref(), Some("CONST A = 1;"));
            host.write_file("out.js", "x", &[]).unwrap();
            assert_eq!(shouting.writes.load(Ordering::SeqCst), 1);
            assert_eq!(inner.written("out.js").as_deref(), Some("x"));
        }

        #[test]
        fn should_stack() {
            let inner = InMemoryCompilerHost::new("/w");
            let middle = ShoutingHost { inner: &inner, writes: AtomicUsize::new(0) };
            let outer = ShoutingHost { inner: &middle, writes: AtomicUsize::new(0) };
            let host: &dyn CompilerHost = &outer;
            host.write_file("a.js", "a", &[]).unwrap();
            assert_eq!(outer.writes.load(Ordering::SeqCst), 1);
            assert_eq!(middle.writes.load(Ordering::SeqCst), 1);
            assert_eq!(inner.written_files().len(), 1);
        }
    }

    mod in_memory_host_tests {
        use super::*;

        #[test]
        fn should_record_writes_with_their_source_units() {
            let host = InMemoryCompilerHost::with_files("/w", [("src/a.ts", "export const a = 1;")]);
            let unit = host.get_source_file("src/a.ts").unwrap().unwrap();
            host.write_file("dist/a.js", "first", std::slice::from_ref(&unit)).unwrap();
            host.write_file("dist/a.js", "second", &[]).unwrap();

            let writes = host.written_files();
            assert_eq!(writes.len(), 2);
            assert_eq!(writes[0].file_name, "/w/dist/a.js");
            assert_eq!(writes[0].source_file_names, vec!["/w/src/a.ts".to_string()]);
            assert_eq!(host.written("dist/a.js").as_deref(), Some("second"));
            assert_eq!(host.read_file("/w/dist/a.js").as_deref(), Some("second"));
        }

        #[test]
        fn should_share_parsed_units_while_text_is_unchanged() {
            let host = InMemoryCompilerHost::with_files("/w", [("a.ts", "let a;")]);
            let first = host.get_source_file("a.ts").unwrap().unwrap();
            let second = host.get_source_file("/w/a.ts").unwrap().unwrap();
            assert!(Arc::ptr_eq(&first, &second));

            host.add_file("a.ts", "let b;");
            let third = host.get_source_file("a.ts").unwrap().unwrap();
            assert!(!Arc::ptr_eq(&first, &third));
        }

        #[test]
        fn should_forget_deleted_outputs() {
            let host = InMemoryCompilerHost::new("/w");
            host.write_file("gen/a.ngfactory.ts", "x", &[]).unwrap();
            host.write_file("gen/b.ngfactory.ts", "y", &[]).unwrap();
            host.delete_file("/w/gen/a.ngfactory.ts").unwrap();

            assert!(!host.file_exists("gen/a.ngfactory.ts"));
            assert!(host.written("gen/a.ngfactory.ts").is_none());
            assert_eq!(host.written_files().len(), 1);
            host.delete_file("gen/missing.ts").unwrap();
        }

        #[test]
        fn should_return_none_for_missing_files() {
            let host = InMemoryCompilerHost::new("/w");
            assert!(host.get_source_file("nope.ts").unwrap().is_none());
            assert!(!host.file_exists("nope.ts"));
        }
    }

    mod node_host_tests {
        use super::*;

        #[test]
        fn should_write_into_missing_directories() {
            let dir = tempfile::tempdir().unwrap();
            let root = dir.path().to_string_lossy().to_string();
            let host = NodeCompilerHost::new(root.clone());

            host.write_file("out/nested/a.js", "var a;", &[]).unwrap();
            assert!(dir.path().join("out/nested/a.js").is_file());
            assert!(host.directory_exists("out/nested"));
            assert_eq!(host.read_file("out/nested/a.js").as_deref(), Some("var a;"));
        }

        #[test]
        fn should_delete_files_from_disk() {
            let dir = tempfile::tempdir().unwrap();
            let host = NodeCompilerHost::new(dir.path().to_string_lossy().to_string());
            host.write_file("a.js", "var a;", &[]).unwrap();
            host.delete_file("a.js").unwrap();
            assert!(!dir.path().join("a.js").exists());
            host.delete_file("a.js").unwrap();
        }

        #[test]
        fn should_parse_files_from_disk() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("a.ts"), "export class A {}").unwrap();
            let host = NodeCompilerHost::new(dir.path().to_string_lossy().to_string());

            let unit = host.get_source_file("a.ts").unwrap().unwrap();
            assert_eq!(unit.statements.len(), 1);
            assert!(host.get_source_file("missing.ts").unwrap().is_none());
        }
    }
}
