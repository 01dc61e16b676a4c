pub mod catalog;
pub mod registration;
