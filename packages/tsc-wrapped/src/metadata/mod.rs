pub mod src {
    pub mod collector;
    pub mod evaluator;
    pub mod schema;
}

pub use src::collector::*;
pub use src::evaluator::*;
pub use src::schema::*;
