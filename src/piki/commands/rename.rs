use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::facade::DocumentFacade;

pub fn run(
    facade: &DocumentFacade,
    path: &str,
    new_path: &str,
    user: Option<&str>,
) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    match facade.rename(path, new_path, user) {
        Ok(target) => {
            result.add_message(CmdMessage::success(format!(
                "Page moved: {} -> {}",
                crate::codec::normalize(path),
                target
            )));
            Ok(result.with_paths(vec![target]))
        }
        Err(e) if e.is_no_change() => {
            result.add_message(CmdMessage::info("Old and new path are the same, nothing to do"));
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
    use crate::error::PikiError;

    #[test]
    fn moves_page() {
        let fx = fixture();
        fx.facade.update("old", "text", None, None).unwrap();
        let result = run(&fx.facade, "old", "new/place", Some("bob")).unwrap();
        assert_eq!(result.paths, vec!["new/place"]);
        assert_eq!(result.messages[0].level, MessageLevel::Success);
        assert_eq!(fx.facade.get("new/place", None).unwrap().content, "text");
    }

    #[test]
    fn same_path_is_informational() {
        let fx = fixture();
        fx.facade.update("old", "text", None, None).unwrap();
        let result = run(&fx.facade, "old", "/old", None).unwrap();
        assert!(result.paths.is_empty());
        assert_eq!(result.messages[0].level, MessageLevel::Info);
    }

    #[test]
    fn collision_is_an_error() {
        let fx = fixture();
        fx.facade.update("a", "A", None, None).unwrap();
        fx.facade.update("b", "B", None, None).unwrap();
        assert!(matches!(
            run(&fx.facade, "a", "b", None),
            Err(PikiError::PathCollision(_))
        ));
    }
}
