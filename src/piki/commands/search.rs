use crate::commands::{CmdMessage, CmdResult};
use crate::error::{PikiError, Result};
use crate::facade::DocumentFacade;

pub fn run(facade: &DocumentFacade, query: &str) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    match facade.search(query) {
        Ok(paths) => {
            if paths.is_empty() {
                result.add_message(CmdMessage::info("No pages found."));
            }
            Ok(result.with_paths(paths))
        }
        Err(e @ PikiError::InvalidQuery { .. }) => {
            result.add_message(CmdMessage::error(e.to_string()));
            Ok(result)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::fixture;
    use crate::commands::MessageLevel;

    #[test]
    fn finds_matching_pages() {
        let fx = fixture();
        fx.facade.update("linux/setup", "install the kernel", Some("howto"), None).unwrap();
        fx.facade.update("recipes/bread", "flour and water", None, None).unwrap();

        let result = run(&fx.facade, "kernel tag:howto").unwrap();
        assert_eq!(result.paths, vec!["linux/setup"]);
        assert!(result.messages.is_empty());
    }

    #[test]
    fn invalid_query_becomes_error_message() {
        let fx = fixture();
        let result = run(&fx.facade, "(unclosed").unwrap();
        assert!(result.has_errors());
        assert!(result.paths.is_empty());
    }

    #[test]
    fn no_hits_is_informational() {
        let fx = fixture();
        let result = run(&fx.facade, "nothing").unwrap();
        assert_eq!(result.messages[0].level, MessageLevel::Info);
    }
}
