pub mod assignment;
pub mod event;
pub mod rollup;
pub mod sla;
pub mod ticket;

pub use assignment::*;
pub use event::*;
pub use rollup::*;
pub use sla::*;
pub use ticket::*;
