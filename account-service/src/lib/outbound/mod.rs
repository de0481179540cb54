pub mod documents;
pub mod notifications;
pub mod repositories;
pub mod roster;
