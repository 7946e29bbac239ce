pub mod fallback;
pub mod monitoring;

mod macros;

pub use tracing;
