pub mod src {
    pub mod config;
    pub mod perform_compile;
}

pub use src::config::*;
pub use src::perform_compile::*;

#[cfg(test)]
mod test;
