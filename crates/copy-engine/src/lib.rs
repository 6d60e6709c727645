pub mod column;
pub mod error;
pub mod helper;
pub mod mapping;
mod stream;

#[cfg(test)]
mod testing;

pub use connectors::settings::ImportSettings;
pub use error::{CopyError, CopyPhase, ProtocolError};
pub use helper::CopyHelper;
