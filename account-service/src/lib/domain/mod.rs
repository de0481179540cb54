pub mod documents;
pub mod principal;
