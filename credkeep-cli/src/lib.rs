//! credkeep CLI
//!
//! Library half of the `credkeep` binary. The command implementations live
//! here so they can be tested against an in-memory store.

pub mod commands;
