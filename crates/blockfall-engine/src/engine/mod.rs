//! Game rules on top of the core primitives: the piece source, score
//! bookkeeping and the tick-driven session controller.

pub use self::{bag::*, config::*, scoring::*, session::*};

pub(crate) mod bag;
pub(crate) mod config;
pub(crate) mod scoring;
pub(crate) mod session;
