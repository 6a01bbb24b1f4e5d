use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::facade::DocumentFacade;
use crate::model::Source;

pub fn run(facade: &DocumentFacade, path: &str, version: Option<u32>) -> Result<CmdResult> {
    let document = facade.get(path, version)?;
    let mut result = CmdResult::default();

    match document.source {
        Source::User => {}
        Source::SystemDefault => result.add_message(CmdMessage::info(format!(
            "'{}' does not exist, showing the system page '{}'",
            document.path, document.title
        ))),
        Source::BuiltinStartpage => {
            result.add_message(CmdMessage::info("Showing the built-in start page"))
        }
        Source::Missing => result.add_message(CmdMessage::warning(format!(
            "Page '{}' does not exist yet",
            document.path
        ))),
    }

    Ok(result.with_document(document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::fixture;
    use crate::commands::MessageLevel;
    use crate::error::PikiError;

    #[test]
    fn returns_user_page_without_messages() {
        let fx = fixture();
        fx.facade.update("a/b", "Body", None, None).unwrap();

        let result = run(&fx.facade, "/a/b/", None).unwrap();
        let doc = result.document.unwrap();
        assert_eq!(doc.path, "a/b");
        assert_eq!(doc.content, "Body");
        assert!(result.messages.is_empty());
    }

    #[test]
    fn warns_about_missing_page() {
        let fx = fixture();
        let result = run(&fx.facade, "nothing", None).unwrap();
        assert_eq!(result.document.unwrap().source, Source::Missing);
        assert_eq!(result.messages[0].level, MessageLevel::Warning);
    }

    #[test]
    fn startpage_is_announced() {
        let fx = fixture();
        let result = run(&fx.facade, "startpage", None).unwrap();
        assert!(result.messages[0].content.contains("start page"));
    }

    #[test]
    fn missing_version_is_an_error() {
        let fx = fixture();
        fx.facade.update("a", "x", None, None).unwrap();
        assert!(matches!(
            run(&fx.facade, "a", Some(1)),
            Err(PikiError::NotFound(_))
        ));
    }
}
