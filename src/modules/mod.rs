pub mod import;
pub mod integrations;
