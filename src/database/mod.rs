pub mod pool;
pub mod schema;

pub use pool::*;
pub use schema::*;
