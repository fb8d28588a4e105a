pub mod profile;
pub mod vehicle;
