//! urodxctl - command-line front end for the urodx differential engine.
//!
//! Loads config and catalog files, reads case files, renders results and
//! runs the interactive questioning loop.

pub mod case;
pub mod config;
pub mod display;
pub mod logging;
pub mod session;
