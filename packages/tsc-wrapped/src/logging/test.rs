// Logging Tests
//
// Level filtering and the in-memory sink used by pipeline tests.

#[cfg(test)]
mod tests {
    use crate::logging::*;

    mod log_level_tests {
        use super::*;

        #[test]
        fn should_order_by_severity() {
            assert!(LogLevel::Debug < LogLevel::Info);
            assert!(LogLevel::Info < LogLevel::Warn);
            assert!(LogLevel::Warn < LogLevel::Error);
        }

        #[test]
        fn should_display_lowercase_labels() {
            assert_eq!(LogLevel::Warn.to_string(), "warn");
            assert_eq!(format!("{}", LogLevel::Error), "error");
        }
    }

    mod console_logger_tests {
        use super::*;

        #[test]
        fn should_check_level_enabled() {
            let logger = ConsoleLogger::new(LogLevel::Warn);
            assert!(!logger.is_enabled(LogLevel::Debug));
            assert!(!logger.is_enabled(LogLevel::Info));
            assert!(logger.is_enabled(LogLevel::Warn));
            assert!(logger.is_enabled(LogLevel::Error));
        }

        #[test]
        fn should_enable_debug_when_tracing() {
            assert_eq!(ConsoleLogger::for_trace(true).level(), LogLevel::Debug);
            assert_eq!(ConsoleLogger::for_trace(false).level(), LogLevel::Warn);
        }
    }

    mod memory_logger_tests {
        use super::*;

        #[test]
        fn should_record_messages_in_order() {
            let logger = MemoryLogger::new();
            logger.info("first");
            logger.error("second");
            assert_eq!(
                logger.messages(),
                vec![(LogLevel::Info, "first".to_string()), (LogLevel::Error, "second".to_string())]
            );
        }

        #[test]
        fn should_drop_messages_below_threshold() {
            let logger = MemoryLogger::with_level(LogLevel::Warn);
            logger.debug("roots: /app/a.ts");
            logger.info("emitting");
            logger.warn("emit skipped");
            assert_eq!(logger.messages(), vec![(LogLevel::Warn, "emit skipped".to_string())]);
        }
    }

    mod null_logger_tests {
        use super::*;

        #[test]
        fn should_disable_everything_below_error() {
            let logger = NullLogger::new();
            assert!(!logger.is_enabled(LogLevel::Warn));
            logger.error("dropped");
        }
    }
}
