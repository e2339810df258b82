pub mod geo;
pub mod profile;
pub mod query;
pub mod quote;
