// Module Namer Tests

#[cfg(test)]
mod tests {
    use crate::module_namer::*;
    use regex::Regex;

    fn is_identifier(name: &str) -> bool {
        Regex::new(r"^[A-Za-z_$][A-Za-z0-9._$]*$").unwrap().is_match(name)
    }

    mod dist_tests {
        use super::*;

        #[test]
        fn should_qualify_distribution_paths() {
            let namer = ModuleNamer::new("@angular", "packages-dist");
            assert_eq!(
                namer.name("some-file", "dist/packages-dist/core/esm/place/testing"),
                "_angular$core$place$testing"
            );
        }

        #[test]
        fn should_drop_trailing_index() {
            let namer = ModuleNamer::default();
            assert_eq!(namer.name("x", "dist/packages-dist/common/index.js"), "_angular$common");
            assert_eq!(namer.name("x", "dist/packages-dist/common/es5/http/index"), "_angular$common$http");
        }

        #[test]
        fn should_honor_configured_roots() {
            let namer = ModuleNamer::new("@scope", "out");
            assert_eq!(namer.name("x", "/repo/dist/out/lib/bundles/api"), "_scope$lib$api");
            assert_eq!(namer.name("x", "dist/packages-dist/core/api"), "dist$packages_dist$core$api");
        }
    }

    mod relative_tests {
        use super::*;

        #[test]
        fn should_resolve_against_context_directory() {
            let namer = ModuleNamer::default();
            assert_eq!(namer.name("some-file", "./other_file"), "other__file");
            assert_eq!(namer.name("src/app/main.ts", "./app.module"), "src$app$app.module");
            assert_eq!(namer.name("src/app/main.ts", "../shared/util.js"), "src$shared$util");
        }

        #[test]
        fn should_leave_bare_specifiers_unresolved() {
            let namer = ModuleNamer::default();
            assert_eq!(namer.name("src/app/main.ts", "@angular/core"), "_angular$core");
            assert_eq!(namer.name("src/app/main.ts", "rxjs/Observable"), "rxjs$Observable");
        }
    }

    mod escaping_tests {
        use super::*;

        #[test]
        fn should_escape_invalid_characters() {
            assert_eq!(escape_module_name("1st-file"), "_st_file");
            assert_eq!(escape_module_name("a b+c"), "a_b_c");
        }

        #[test]
        fn should_produce_an_identifier_for_empty_input() {
            let namer = ModuleNamer::default();
            assert_eq!(namer.name("", ".ts"), "_");
            assert_eq!(escape_module_name(""), "_");
        }

        #[test]
        fn should_be_total_and_deterministic() {
            let namer = ModuleNamer::default();
            let inputs = [
                ("a.ts", "./b"),
                ("", ""),
                ("x/y.ts", "../../../up"),
                ("ctx", "-weird name!.js"),
                ("ctx", "dist/packages-dist/core/esm/index"),
                ("ctx", "C:\\win\\path.ts"),
                ("ctx", "9lives"),
            ];
            for (context, specifier) in inputs {
                let first = namer.name(context, specifier);
                assert!(is_identifier(&first), "{:?} from {:?}", first, (context, specifier));
                assert_eq!(first, namer.name(context, specifier));
            }
        }
    }
}
