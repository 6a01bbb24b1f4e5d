use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::facade::DocumentFacade;
use crate::tree;

/// Available pages below `prefix`, as a flat sorted list.
pub fn run(facade: &DocumentFacade, prefix: &str, depth: Option<usize>) -> Result<CmdResult> {
    let paths = facade.list_pages(prefix, depth)?;
    let mut result = CmdResult::default();
    if paths.is_empty() {
        result.add_message(CmdMessage::info("No pages found."));
    }
    Ok(result.with_paths(paths))
}

/// Same selection as [`run`], drawn as a tree.
pub fn tree(facade: &DocumentFacade, prefix: &str, depth: Option<usize>) -> Result<CmdResult> {
    let mut result = run(facade, prefix, depth)?;
    if !result.paths.is_empty() {
        let text = tree::render(&result.paths);
        result = result.with_text(text);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::fixture;

    #[test]
    fn lists_below_prefix() {
        let fx = fixture();
        for path in ["docs/a", "docs/b/c", "notes"] {
            fx.facade.update(path, "x", None, None).unwrap();
        }
        let result = run(&fx.facade, "docs", None).unwrap();
        assert_eq!(result.paths, vec!["docs/a", "docs/b/c"]);

        let shallow = run(&fx.facade, "", Some(1)).unwrap();
        assert_eq!(shallow.paths, vec!["notes"]);
    }

    #[test]
    fn deleted_pages_are_not_listed() {
        let fx = fixture();
        fx.facade.update("gone", "x", None, None).unwrap();
        fx.facade.delete("gone").unwrap();
        let result = run(&fx.facade, "", None).unwrap();
        assert!(result.paths.is_empty());
        assert_eq!(result.messages.len(), 1);
    }

    #[test]
    fn tree_renders_text() {
        let fx = fixture();
        for path in ["docs/a", "docs/b"] {
            fx.facade.update(path, "x", None, None).unwrap();
        }
        let result = tree(&fx.facade, "", None).unwrap();
        assert_eq!(result.text.as_deref(), Some("docs\n├── a\n└── b\n"));
    }
}
