//! # API Facade
//!
//! A **thin facade** over the command layer and the single entry point for every
//! piki operation, whatever the UI.
//!
//! The API:
//! - **Dispatches** to the matching `commands::*::run`
//! - **Returns structured types** (`Result<CmdResult>`)
//!
//! It does no business logic (that lives in `commands/` and [`DocumentFacade`]) and
//! no terminal output.

use crate::commands;
use crate::config::PikiConfig;
use crate::error::Result;
use crate::facade::DocumentFacade;
use std::path::{Path, PathBuf};

pub struct PikiApi {
    facade: DocumentFacade,
    data_dir: PathBuf,
}

impl PikiApi {
    pub fn new(facade: DocumentFacade, data_dir: PathBuf) -> Self {
        Self { facade, data_dir }
    }

    /// Opens the facade described by `config`, resolved against `data_dir`.
    pub fn open(data_dir: PathBuf, config: &PikiConfig) -> Result<Self> {
        let facade = DocumentFacade::open(&config.resolved(&data_dir))?;
        Ok(Self::new(facade, data_dir))
    }

    pub fn get_page(&self, path: &str, version: Option<u32>) -> Result<CmdResult> {
        commands::get::run(&self.facade, path, version)
    }

    pub fn update_page(
        &self,
        path: &str,
        content: &str,
        tags: Option<&str>,
        user: Option<&str>,
    ) -> Result<CmdResult> {
        commands::update::run(&self.facade, path, content, tags, user)
    }

    pub fn rename_page(&self, path: &str, new_path: &str, user: Option<&str>) -> Result<CmdResult> {
        commands::rename::run(&self.facade, path, new_path, user)
    }

    pub fn delete_pages(&self, paths: &[String]) -> Result<CmdResult> {
        commands::delete::run(&self.facade, paths)
    }

    pub fn history(&self, path: &str) -> Result<CmdResult> {
        commands::history::run(&self.facade, path)
    }

    pub fn diff(&self, path: &str, version: u32) -> Result<CmdResult> {
        commands::history::diff(&self.facade, path, version)
    }

    pub fn search(&self, query: &str) -> Result<CmdResult> {
        commands::search::run(&self.facade, query)
    }

    pub fn list_pages(&self, prefix: &str, depth: Option<usize>) -> Result<CmdResult> {
        commands::list::run(&self.facade, prefix, depth)
    }

    pub fn tree(&self, prefix: &str, depth: Option<usize>) -> Result<CmdResult> {
        commands::list::tree(&self.facade, prefix, depth)
    }

    pub fn reindex(&self) -> Result<CmdResult> {
        commands::reindex::run(&self.facade)
    }

    pub fn doctor(&self, fix: bool) -> Result<CmdResult> {
        commands::doctor::run(&self.facade, fix)
    }

    pub fn init(&self) -> Result<CmdResult> {
        commands::init::run(&self.facade, &self.data_dir)
    }

    pub fn config(&self, action: ConfigAction) -> Result<CmdResult> {
        commands::config::run(&self.data_dir, action)
    }

    pub fn facade(&self) -> &DocumentFacade {
        &self.facade
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

pub use crate::commands::config::ConfigAction;
pub use commands::{CmdMessage, CmdResult, MessageLevel};
