//! The `deptrail` command-line tool
//!
//! Resolves coordinates against a local repository, fetching missing
//! artifacts from remote endpoints, and searches dependency closures for
//! resource paths.

pub mod commands;
pub mod config;
