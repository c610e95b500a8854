pub mod candidate;
pub mod evaluation;
pub mod metrics;
pub mod plan;
pub mod session;
pub mod tolerance;

pub use candidate::*;
pub use evaluation::*;
pub use metrics::*;
pub use plan::*;
pub use session::*;
pub use tolerance::*;
