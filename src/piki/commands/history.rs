use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::facade::DocumentFacade;

pub fn run(facade: &DocumentFacade, path: &str) -> Result<CmdResult> {
    let history = facade.history(path)?;
    let mut result = CmdResult::default();
    if history.is_empty() {
        result.add_message(CmdMessage::info(format!(
            "No history for {}",
            crate::codec::normalize(path)
        )));
    }
    Ok(result.with_history(history))
}

/// What changed between history `version` and the live page.
pub fn diff(facade: &DocumentFacade, path: &str, version: u32) -> Result<CmdResult> {
    let diff = facade.diff(path, version)?;
    let mut result = CmdResult::default();
    if diff.is_empty() {
        result.add_message(CmdMessage::info(format!(
            "Version {} of {} matches the current page",
            version,
            crate::codec::normalize(path)
        )));
        return Ok(result);
    }
    Ok(result.with_text(diff))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::fixture;

    #[test]
    fn lists_versions_newest_first() {
        let fx = fixture();
        fx.facade.update("a", "one", None, None).unwrap();
        fx.facade.update("a", "two", None, None).unwrap();
        fx.facade.update("a", "two", Some("tagged"), None).unwrap();

        let result = run(&fx.facade, "a").unwrap();
        let versions: Vec<u32> = result.history.iter().map(|h| h.version).collect();
        assert_eq!(versions, vec![2, 1]);
        assert!(result.history[0].tags_changed);
        assert!(!result.history[0].content_changed);
        assert!(result.history[1].content_changed);
        assert!(result.messages.is_empty());
    }

    #[test]
    fn diff_is_returned_as_text() {
        let fx = fixture();
        fx.facade.update("a", "one\n", None, None).unwrap();
        fx.facade.update("a", "two\n", None, None).unwrap();

        let result = diff(&fx.facade, "a", 1).unwrap();
        let text = result.text.unwrap();
        assert!(text.contains("-one\n+two\n"));
        assert!(result.messages.is_empty());

        fx.facade.update("a", "one\n", None, None).unwrap();
        let same = diff(&fx.facade, "a", 1).unwrap();
        assert!(same.text.is_none());
        assert_eq!(same.messages[0].level, crate::commands::MessageLevel::Info);
        assert!(diff(&fx.facade, "a", 9).is_err());
    }

    #[test]
    fn empty_history_is_reported() {
        let fx = fixture();
        let result = run(&fx.facade, "fresh").unwrap();
        assert!(result.history.is_empty());
        assert_eq!(result.messages.len(), 1);
    }
}
