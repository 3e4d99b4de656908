//! A falling-block game engine.
//!
//! [`core`] holds the board and piece primitives, [`engine`] the rules
//! that animate them. A frontend drives a [`GameSession`] by calling
//! [`GameSession::tick`] at a fixed rate and forwarding player input,
//! then reads the field, piece and stats back for drawing.

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;
