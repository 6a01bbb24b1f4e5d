use crate::commands::{CmdMessage, CmdResult};
use crate::config::PikiConfig;
use crate::error::Result;
use crate::facade::DocumentFacade;
use std::fs;
use std::path::Path;

/// Creates the data directory layout, writes a default config if none exists,
/// installs the system pages and rebuilds the search index.
pub fn run(facade: &DocumentFacade, data_dir: &Path) -> Result<CmdResult> {
    let mut result = CmdResult::default();

    fs::create_dir_all(facade.pages().root())?;
    if !data_dir.join(crate::config::CONFIG_FILENAME).exists() {
        PikiConfig::default().save(data_dir)?;
        result.add_message(CmdMessage::info(format!(
            "Wrote default config to {}",
            data_dir.display()
        )));
    }

    let installed = facade.install_system_pages()?;
    if installed > 0 {
        result.add_message(CmdMessage::info(format!(
            "Installed {} system page(s)",
            installed
        )));
    }

    let indexed = facade.rebuild_index()?;
    result.add_message(CmdMessage::success(format!(
        "Initialized piki at {} ({} page(s) indexed)",
        data_dir.display(),
        indexed
    )));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::fixture;
    use crate::model::Source;

    #[test]
    fn initializes_once() {
        let fx = fixture();
        let result = run(&fx.facade, fx.dir.path()).unwrap();
        assert_eq!(result.messages.len(), 3);
        assert!(fx.dir.path().join("config.json").is_file());
        assert!(fx.dir.path().join("pages").is_dir());
        assert_eq!(fx.facade.get("index", None).unwrap().source, Source::SystemDefault);

        let again = run(&fx.facade, fx.dir.path()).unwrap();
        assert_eq!(again.messages.len(), 1);
    }
}
