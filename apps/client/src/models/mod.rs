pub mod draft;
pub mod generation;
pub mod profile;
pub mod user;
