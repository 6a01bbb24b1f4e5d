use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::facade::DocumentFacade;

pub fn run(facade: &DocumentFacade, paths: &[String]) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    for path in paths {
        facade.delete(path)?;
        let path = crate::codec::normalize(path);
        result.add_message(CmdMessage::success(format!("Page deleted: {}", path)));
        result.paths.push(path);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::fixture;
    use crate::model::Source;

    #[test]
    fn deletes_each_page() {
        let fx = fixture();
        fx.facade.update("a", "A", None, None).unwrap();
        fx.facade.update("b", "B", None, None).unwrap();

        let result = run(&fx.facade, &["a".to_string(), "/b/".to_string()]).unwrap();
        assert_eq!(result.paths, vec!["a", "b"]);
        assert_eq!(fx.facade.get("a", None).unwrap().source, Source::Missing);
        assert_eq!(fx.facade.history("b").unwrap().len(), 1);
    }

    #[test]
    fn stops_at_first_missing_page() {
        let fx = fixture();
        fx.facade.update("b", "B", None, None).unwrap();
        assert!(run(&fx.facade, &["a".to_string(), "b".to_string()]).is_err());
        assert_eq!(fx.facade.get("b", None).unwrap().source, Source::User);
    }
}
