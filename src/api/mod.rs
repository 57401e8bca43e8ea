mod admin;
mod links;
mod students;
mod subjects;
mod tutors;

pub use admin::*;
pub use links::*;
pub use students::*;
pub use subjects::*;
pub use tutors::*;
