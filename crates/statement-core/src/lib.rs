pub mod error;
pub mod period;
pub mod stats;
pub mod traits;
pub mod types;

pub use error::*;
pub use period::*;
pub use traits::*;
pub use types::*;
