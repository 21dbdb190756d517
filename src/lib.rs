//! replica-rebuild - rebuild a MySQL secondary from a hot backup and
//! re-point it at its primary for replication.
//!
//! The run is a fixed sequence of stages, each a handful of external
//! command invocations checked by exit status.

pub mod cli;
pub mod config;
pub mod exec;
pub mod observability;
pub mod replication;
pub mod stages;
