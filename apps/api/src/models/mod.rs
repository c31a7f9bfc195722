pub mod field;
pub mod page;
