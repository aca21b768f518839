pub mod account;
pub mod announcement;

pub use account::*;
pub use announcement::*;
