//! Grid snake: a deterministic rules engine plus a skinnable terminal front
//! end.
//!
//! [`engine::GameEngine`] is the only authority on game state. Everything
//! else drives it once per tick and draws what it reports.

pub mod apple;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod renderer;
pub mod session;
pub mod skin;
pub mod snake;
pub mod terminal_runtime;
pub mod ui;
