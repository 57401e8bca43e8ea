mod reset;
mod subjects;
pub mod utils;

pub use utils::test_utils;
