pub mod src {
    pub mod module_namer;
}

pub use src::module_namer::*;

#[cfg(test)]
mod test;
