pub mod src {
    pub mod annotation_host;
    pub mod annotations;
    pub mod closure_host;
    pub mod metadata_writer_host;
}

pub use src::annotation_host::*;
pub use src::annotations::*;
pub use src::closure_host::*;
pub use src::metadata_writer_host::*;

#[cfg(test)]
mod test;
