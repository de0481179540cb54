pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;

pub use domain::documents;
pub use domain::principal;
pub use outbound::repositories;
