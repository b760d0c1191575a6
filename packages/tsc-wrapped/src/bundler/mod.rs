pub mod src {
    pub mod bundle_index_host;
    pub mod bundler;
    pub mod index_writer;
}

pub use src::bundle_index_host::*;
pub use src::bundler::*;
pub use src::index_writer::*;
