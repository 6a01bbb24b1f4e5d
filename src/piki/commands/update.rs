use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::facade::DocumentFacade;

/// Saves a page. Without `tags`, the page keeps the tags it has.
pub fn run(
    facade: &DocumentFacade,
    path: &str,
    content: &str,
    tags: Option<&str>,
    user: Option<&str>,
) -> Result<CmdResult> {
    let changed = facade.update(path, content, tags, user)?;
    let document = facade.get(path, None)?;
    let mut result = CmdResult::default();

    if changed {
        result.add_message(CmdMessage::success(format!("Page saved: {}", document.path)));
    } else {
        result.add_message(CmdMessage::info(format!(
            "No changes to save for {}",
            document.path
        )));
    }

    Ok(result.with_document(document))
}
