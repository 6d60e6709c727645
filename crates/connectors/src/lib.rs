pub mod channel;
pub mod error;
pub mod settings;
pub mod sql;
