//! Configuration loading and resolution for the `bedscan` binary.
//!
//! `load` layers default files, explicit `--config` files, `BEDSCAN__*`
//! environment variables and command-line flags, then validates the result
//! into a [`ResolvedConfig`].

mod loader;
mod raw;
mod resolved;
mod sources;

pub(crate) use loader::load;
pub(crate) use resolved::{EngineChoice, ResolvedConfig};
