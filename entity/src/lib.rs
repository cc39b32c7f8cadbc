//! Employee record schema shared by the persistence gateway and the HTTP layer.

pub mod cards;
pub mod employees;

pub use cards::{EmployeeCard, EmployeeCardPatch, InvalidField};
