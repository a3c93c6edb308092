//! the test_utils folder here will share utils or test components between
//! unit tests
mod common;
mod stubs;

pub use common::*;
pub use stubs::*;
