//! Board and piece primitives with no timing or scoring attached.

pub use self::{board::*, piece::*};

pub(crate) mod board;
pub(crate) mod piece;
