use piki::codec;
use piki::config::PikiConfig;
use piki::error::PikiError;
use piki::facade::DocumentFacade;
use piki::model::Source;
use tempfile::TempDir;

fn open(dir: &TempDir) -> DocumentFacade {
    let config = PikiConfig {
        writer_heap_bytes: 20_000_000,
        ..PikiConfig::default()
    };
    DocumentFacade::open(&config.resolved(dir.path())).unwrap()
}

#[test]
fn rename_then_search_by_tag() {
    let dir = tempfile::tempdir().unwrap();
    let facade = open(&dir);

    assert!(facade
        .update("docs/intro", "Hello", Some("intro"), Some("alice"))
        .unwrap());
    assert!(facade.update("docs/intro", "Hello v2", None, None).unwrap());

    let key = codec::encode("docs/intro").unwrap();
    assert_eq!(facade.history_manager().list_versions(&key).unwrap().len(), 1);
    assert_eq!(facade.get("docs/intro", Some(1)).unwrap().content, "Hello");

    facade
        .rename("docs/intro", "docs/introduction", Some("bob"))
        .unwrap();

    let old = facade.get("docs/intro", None).unwrap();
    assert_eq!(old.source, Source::Missing);
    assert!(!old.is_available());
    let moved = facade.get("docs/introduction", None).unwrap();
    assert!(moved.is_available());
    assert_eq!(moved.content, "Hello v2");
    assert_eq!(moved.metadata.tags.as_deref(), Some("intro"));
    assert_eq!(facade.get("docs/introduction", Some(1)).unwrap().content, "Hello");

    assert_eq!(facade.search("tag:intro").unwrap(), vec!["docs/introduction"]);
}

#[test]
fn index_and_pages_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let facade = open(&dir);
        facade.update("linux/setup", "apt install", Some("howto"), None).unwrap();
        facade.update("linux/setup", "apt install git", Some("howto"), None).unwrap();
    }

    let facade = open(&dir);
    assert_eq!(facade.search("git").unwrap(), vec!["linux/setup"]);
    assert_eq!(facade.get("linux/setup", Some(1)).unwrap().content, "apt install");
    let key = codec::encode("linux/setup").unwrap();
    let versions: Vec<u32> = facade
        .history_manager()
        .list_versions(&key)
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(versions, vec![1]);
}

#[test]
fn next_version_stays_above_remaining_after_removal() {
    let dir = tempfile::tempdir().unwrap();
    let facade = open(&dir);
    for content in ["1", "2", "3", "4"] {
        facade.update("p", content, None, None).unwrap();
    }
    let key = codec::encode("p").unwrap();
    let history = dir.path().join("pages").join("p").join("history");
    std::fs::remove_file(history.join("00003_page")).unwrap();
    std::fs::remove_file(history.join("00003_meta.json")).unwrap();

    let next = facade.history_manager().next_version(&key).unwrap();
    let remaining = facade.history_manager().list_versions(&key).unwrap();
    assert!(remaining.iter().all(|v| *v < next));
}

#[test]
fn delete_then_recreate() {
    let dir = tempfile::tempdir().unwrap();
    let facade = open(&dir);

    facade.update("note", "draft", None, None).unwrap();
    facade.delete("note").unwrap();
    let view = facade.get("note", None).unwrap();
    assert!(!view.is_available());
    assert_eq!(view.content, "");
    assert_eq!(facade.history("note").unwrap().len(), 1);
    assert!(facade.live_paths().unwrap().is_empty());

    facade.update("note", "final", None, None).unwrap();
    assert_eq!(facade.get("note", Some(1)).unwrap().content, "draft");
    assert_eq!(facade.get("note", None).unwrap().content, "final");
}

#[test]
fn history_versions_are_read_only() {
    let dir = tempfile::tempdir().unwrap();
    let facade = open(&dir);
    facade.update("p", "one", None, None).unwrap();
    facade.update("p", "two", None, None).unwrap();

    let key = codec::encode("p").unwrap();
    let err = facade
        .pages()
        .write(&key, piki::model::Revision::History(1), "tampered")
        .unwrap_err();
    assert!(matches!(err, PikiError::ImmutableVersion { version: 1, .. }));
    assert_eq!(facade.get("p", Some(1)).unwrap().content, "one");
}

#[test]
fn date_queries_see_fresh_pages() {
    let dir = tempfile::tempdir().unwrap();
    let facade = open(&dir);
    facade.update("fresh", "new page", None, None).unwrap();

    assert_eq!(facade.search("modified_time:-1h").unwrap(), vec!["fresh"]);
    assert_eq!(facade.search("creation_time:>=2000").unwrap(), vec!["fresh"]);
    assert!(facade.search("modified_time:<2000").unwrap().is_empty());
}
