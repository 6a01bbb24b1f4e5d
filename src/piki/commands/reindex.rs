use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::facade::DocumentFacade;

pub fn run(facade: &DocumentFacade) -> Result<CmdResult> {
    let count = facade.rebuild_index()?;
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Search index rebuilt with {} page(s).",
        count
    )));
    Ok(result)
}
