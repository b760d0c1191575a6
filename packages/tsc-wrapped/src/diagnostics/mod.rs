pub mod src {
    pub mod error;
    pub mod error_code;
    pub mod util;
}

pub use src::error::*;
pub use src::error_code::*;
pub use src::util::*;
pub use ts::{Diagnostic, DiagnosticCategory, DiagnosticMessageChain};

#[cfg(test)]
mod test;
