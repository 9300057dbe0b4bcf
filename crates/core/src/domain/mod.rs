pub mod customer;
pub mod patch;
pub mod validation;
