use clap::{Parser, Subcommand};

/// "0.3.0" for releases, "0.3.0@abc1234 2025-01-15" for dev builds.
fn version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("PIKI_GIT_HASH");
    const GIT_DATE: &str = env!("PIKI_GIT_DATE");
    const RELEASE: &str = env!("PIKI_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if RELEASE == "true" || GIT_HASH.is_empty() {
            VERSION.to_string()
        } else {
            format!("{}@{} {}", VERSION, GIT_HASH, GIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(name = "piki", version = version())]
#[command(about = "Hierarchical, versioned wiki pages with full-text search", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show a page
    #[command(alias = "cat")]
    Get {
        /// Page path, e.g. docs/setup
        path: String,

        /// Show a history version instead of the live page
        #[arg(short, long = "rev")]
        rev: Option<u32>,
    },

    /// Save a page (content from the argument or stdin)
    #[command(alias = "save")]
    Update {
        /// Page path
        path: String,

        /// New content; read from stdin when omitted
        content: Option<String>,

        /// Whitespace-separated tags; existing tags are kept when omitted
        #[arg(short, long)]
        tags: Option<String>,

        /// Who made the change
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Move a page and its history
    #[command(alias = "mv")]
    Rename {
        path: String,
        new_path: String,

        /// Who made the change
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Delete one or more pages (history is kept)
    #[command(alias = "rm")]
    Delete {
        #[arg(required = true, num_args = 1..)]
        paths: Vec<String>,
    },

    /// List the stored versions of a page
    #[command(alias = "log")]
    History {
        path: String,

        /// Show what changed between this version and the current page
        #[arg(short, long, value_name = "VERSION")]
        diff: Option<u32>,
    },

    /// Search pages, e.g. `tag:howto modified_time:>2024-01`
    #[command(alias = "s")]
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// List pages below a path
    #[command(alias = "ls")]
    List {
        /// Path prefix; all pages when omitted
        prefix: Option<String>,

        /// Maximum levels below the prefix
        #[arg(short, long)]
        depth: Option<usize>,
    },

    /// Draw pages below a path as a tree
    Tree {
        prefix: Option<String>,

        #[arg(short, long)]
        depth: Option<usize>,
    },

    /// Rebuild the search index from the stored pages
    Reindex,

    /// Check stored pages and the search index for inconsistencies
    Doctor {
        /// Repair what was found
        #[arg(long)]
        fix: bool,
    },

    /// Set up the data directory and system pages
    Init,

    /// Get or set configuration
    Config {
        /// Config key (e.g. startpage)
        key: Option<String>,

        /// Value to set
        value: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases_and_options() {
        let cli = Cli::try_parse_from(["piki", "cat", "docs/intro", "--rev", "2"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Get { ref path, rev: Some(2) }) if path == "docs/intro"
        ));

        let cli = Cli::try_parse_from(["piki", "-v", "save", "a", "-t", "x y"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Some(Commands::Update { content: None, tags: Some(ref t), .. }) if t == "x y"
        ));
    }

    #[test]
    fn search_joins_words() {
        let cli = Cli::try_parse_from(["piki", "s", "tag:a", "b"]).unwrap();
        let Some(Commands::Search { query }) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(query, vec!["tag:a", "b"]);
    }

    #[test]
    fn history_takes_a_diff_version() {
        let cli = Cli::try_parse_from(["piki", "log", "a", "--diff", "3"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::History { diff: Some(3), .. })));
        assert!(Cli::try_parse_from(["piki", "history", "a", "-d", "x"]).is_err());
    }

    #[test]
    fn delete_needs_a_path() {
        assert!(Cli::try_parse_from(["piki", "rm"]).is_err());
    }
}
