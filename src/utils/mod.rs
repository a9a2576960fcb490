pub mod time;

pub use time::now_rfc3339;
