pub mod connection;
pub mod data_type;
pub mod encoder;
pub mod frame;
pub mod importer;
pub mod utils;
