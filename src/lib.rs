//! Scene Script — turns writer-friendly scene scripts into WebGAL scripts.
//!
//! A scene script is an ordered list of tagged statements (background
//! changes, narration, character dialogue with an emotion tag). Generation
//! validates the script, resolves each speaking character to a figure and
//! costume from the game's assets, maps emotion tags to motions and
//! expressions, and renders WebGAL command lines.

pub mod config;
pub mod core;
pub mod project;
pub mod schema;
