//! Ravel CLI — request dispatch and command-line surface for the
//! routine engine.

pub mod dispatch;
