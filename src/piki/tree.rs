//! Listing helpers over logical paths: filtering below a prefix and drawing a tree.
//!
//! ```text
//! docs
//! ├── intro
//! └── setup
//!     └── linux
//! notes
//! ```
//!
//! Intermediate segments appear in the tree even when no page exists at that path.

use std::collections::BTreeMap;

const TEE: &str = "├── ";
const ELBOW: &str = "└── ";
const PIPE: &str = "│   ";
const BLANK: &str = "    ";

/// Paths strictly below `prefix`, sorted. `depth` limits how many segments past the
/// prefix a path may have. An empty prefix selects everything.
pub fn below(paths: &[String], prefix: &str, depth: Option<usize>) -> Vec<String> {
    let mut selected: Vec<String> = paths
        .iter()
        .filter_map(|path| {
            let rest = if prefix.is_empty() {
                path.as_str()
            } else {
                path.strip_prefix(prefix)?.strip_prefix('/')?
            };
            let levels = rest.split('/').count();
            (!rest.is_empty() && depth.map_or(true, |d| levels <= d)).then(|| path.clone())
        })
        .collect();
    selected.sort();
    selected
}

#[derive(Default)]
struct Node {
    children: BTreeMap<String, Node>,
}

impl Node {
    fn insert(&mut self, path: &str) {
        let mut node = self;
        for segment in path.split('/') {
            node = node.children.entry(segment.to_string()).or_default();
        }
    }

    fn draw(&self, fill: &str, out: &mut String) {
        let last = self.children.len().saturating_sub(1);
        for (i, (name, child)) in self.children.iter().enumerate() {
            let (branch, indent) = if i == last { (ELBOW, BLANK) } else { (TEE, PIPE) };
            out.push_str(fill);
            out.push_str(branch);
            out.push_str(name);
            out.push('\n');
            child.draw(&format!("{fill}{indent}"), out);
        }
    }
}

/// Draws all paths as a tree. Top-level entries are flush left.
pub fn render(paths: &[String]) -> String {
    let mut root = Node::default();
    for path in paths {
        root.insert(path);
    }

    let mut out = String::new();
    for (name, child) in &root.children {
        out.push_str(name);
        out.push('\n');
        child.draw("", &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(list: &[&str]) -> Vec<String> {
        list.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn below_excludes_prefix_itself_and_siblings() {
        let all = paths(&["docs", "docs/a", "docs/a/b", "docsx/c", "notes"]);
        assert_eq!(below(&all, "docs", None), vec!["docs/a", "docs/a/b"]);
        assert_eq!(below(&all, "docs", Some(1)), vec!["docs/a"]);
        assert_eq!(below(&all, "", Some(1)), vec!["docs", "notes"]);
        assert!(below(&all, "missing", None).is_empty());
    }

    #[test]
    fn renders_nested_tree() {
        let all = paths(&["docs/setup/linux", "docs/intro", "notes", "docs"]);
        let expected = "\
docs
├── intro
└── setup
    └── linux
notes
";
        assert_eq!(render(&all), expected);
    }

    #[test]
    fn renders_pipes_for_open_branches() {
        let all = paths(&["a/b/c", "a/d"]);
        let expected = "\
a
├── b
│   └── c
└── d
";
        assert_eq!(render(&all), expected);
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert_eq!(render(&[]), "");
    }
}
