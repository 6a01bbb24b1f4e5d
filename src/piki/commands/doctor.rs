use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::facade::DocumentFacade;

/// Reports pages whose files disagree and a search index that is out of step.
/// With `fix`, repairs both.
pub fn run(facade: &DocumentFacade, fix: bool) -> Result<CmdResult> {
    let mut result = CmdResult::default();

    if fix {
        let repaired = facade.repair()?;
        for path in &repaired.metadata_created {
            result.add_message(CmdMessage::info(format!("  - Created metadata for {}", path)));
        }
        for path in &repaired.metadata_removed {
            result.add_message(CmdMessage::info(format!(
                "  - Removed metadata without content: {}",
                path
            )));
        }
        result.add_message(CmdMessage::success(format!(
            "Repair done, {} page(s) indexed.",
            repaired.indexed
        )));
        return Ok(result);
    }

    let report = facade.check()?;
    let live = facade.live_paths()?.len() as u64;
    let indexed = facade.index().len();

    if report.is_clean() && live == indexed {
        result.add_message(CmdMessage::success("No inconsistencies found."));
        return Ok(result);
    }

    result.add_message(CmdMessage::warning("Inconsistencies found:"));
    for path in &report.missing_metadata {
        result.add_message(CmdMessage::info(format!("  - Missing metadata: {}", path)));
    }
    for path in &report.orphaned_metadata {
        result.add_message(CmdMessage::info(format!("  - Metadata without content: {}", path)));
    }
    for entry in &report.foreign_entries {
        result.add_message(CmdMessage::info(format!(
            "  - Not a page directory: {}",
            entry.display()
        )));
    }
    if live != indexed {
        result.add_message(CmdMessage::info(format!(
            "  - Search index holds {} page(s), {} available",
            indexed, live
        )));
    }
    result.add_message(CmdMessage::info("Run with --fix to repair."));
    Ok(result)
}
