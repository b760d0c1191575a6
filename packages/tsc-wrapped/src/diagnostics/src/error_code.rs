use std::fmt;

/// Stable codes for the pipeline's own diagnostics. Reported as `NG<code>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The project file could not be read or parsed.
    ConfigInvalid = 1001,

    /// `flatModuleOutFile` is set but the roots do not contain exactly one `index.ts`.
    FlatModuleIndexNotFound = 1002,

    /// Strict metadata collection met an expression it could not evaluate.
    MetadataCollection = 2001,

    /// A decorator could not be converted to static fields.
    DecoratorDownlevel = 2002,

    /// Module syntax could not be converted to `goog.module` form.
    ClosureConversion = 2003,

    /// Generating factories for one file failed; the file is skipped.
    CodegenFailed = 3001,

    /// An external template or stylesheet does not exist.
    ResourceNotFound = 3002,

    /// A component is declared by no module or by more than one.
    ComponentNotDeclared = 3003,

    /// The flat module bundle could not be built.
    BundleFailed = 4001,

    /// A pass or host contract failed and the run was aborted.
    PipelineAborted = 9001,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NG{}", *self as i32)
    }
}
