pub mod src {
    pub mod codegen;
    pub mod resource_loader;
    pub mod static_reflector;
    pub mod template_compiler;
}

pub use src::codegen::*;
pub use src::resource_loader::*;
pub use src::static_reflector::*;
pub use src::template_compiler::*;
