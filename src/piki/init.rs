use crate::api::PikiApi;
use crate::config::{self, PikiConfig};
use crate::error::Result;
use std::path::PathBuf;
use tracing::debug;

pub struct PikiContext {
    pub api: PikiApi,
    /// The config as stored, paths not yet resolved.
    pub config: PikiConfig,
}

/// Opens piki in the default data directory (see [`config::data_dir`]).
pub fn initialize() -> Result<PikiContext> {
    initialize_at(config::data_dir()?)
}

pub fn initialize_at(data_dir: PathBuf) -> Result<PikiContext> {
    let config = PikiConfig::load(&data_dir)?;
    debug!(data_dir = %data_dir.display(), "Opening piki");
    let api = PikiApi::open(data_dir, &config)?;
    Ok(PikiContext { api, config })
}
