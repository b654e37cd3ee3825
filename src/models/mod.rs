pub mod document;
pub mod status;
