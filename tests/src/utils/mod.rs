pub mod assert;
pub mod data_types;
