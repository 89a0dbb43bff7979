use anyhow::{Context, Result, bail};
use clap::Parser;
use rulegraph_app::{GroupCatalogSource, JsonGroupCatalogFile};
use rulegraph_core::{GroupCatalog, LayoutConfig, Rule, Ruleset};
use rulegraph_graph::{RuleGraph, components_graph, select};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Ruleset JSON: either `{"id", "rules": [...]}` or a bare array of rules
    #[arg(short, long)]
    rules: PathBuf,

    /// Group catalog JSON; the built-in default groups are used when absent or unreadable
    #[arg(short, long)]
    groups: Option<PathBuf>,

    /// Layout configuration JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the details of one rule instead of the whole graph
    #[arg(short, long)]
    select: Option<String>,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long)]
    pretty: bool,
}

fn load_rules(path: &Path) -> Result<Vec<Rule>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read rules {}", path.display()))?;
    if let Ok(ruleset) = serde_json::from_str::<Ruleset>(&content) {
        return Ok(ruleset.rules);
    }
    serde_json::from_str::<Vec<Rule>>(&content)
        .with_context(|| format!("Failed to parse rules {}", path.display()))
}

fn load_catalog(path: Option<&Path>) -> GroupCatalog {
    let Some(path) = path else {
        return GroupCatalog::fallback();
    };
    let fetched = JsonGroupCatalogFile::new(path).fetch_groups();
    let (catalog, issue) = GroupCatalog::resolve(fetched.map_err(|err| format!("{err:#}")));
    if let Some(issue) = issue {
        tracing::debug!("catalog: {issue}");
    }
    catalog
}

fn render(value: &impl serde::Serialize, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    let args = Args::parse();

    let rules = load_rules(&args.rules)?;
    let catalog = load_catalog(args.groups.as_deref());
    let config = match &args.config {
        Some(path) => LayoutConfig::load(path)?,
        None => LayoutConfig::default(),
    };

    let json = match &args.select {
        Some(id) => {
            let graph = RuleGraph::from_rules(&rules);
            let Some(details) = select(&rules, &graph, id) else {
                bail!("No rule named {id} in {}", args.rules.display());
            };
            render(&details, args.pretty)?
        }
        None => {
            let view = components_graph(&rules, &catalog, &config);
            tracing::info!(
                nodes = view.nodes.len(),
                edges = view.edges.len(),
                layers = view.layers.len(),
                "rendered components graph"
            );
            render(&view, args.pretty)?
        }
    };

    match &args.output {
        Some(path) => fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_rules_accepts_both_shapes() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let wrapped = dir.path().join("wrapped.json");
        let bare = dir.path().join("bare.json");
        fs::write(
            &wrapped,
            r#"{"id": "rs", "rules": [{"target": "Base", "expression": "1"}]}"#,
        )?;
        fs::write(&bare, r#"[{"target": "Base", "expression": "1"}]"#)?;

        assert_eq!(load_rules(&wrapped)?, load_rules(&bare)?);
        Ok(())
    }

    #[test]
    fn test_load_rules_accepts_ruleset_without_id() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("unnamed.json");
        fs::write(
            &path,
            r#"{"name": "x", "rules": [{"target": "Base", "expression": "1"}]}"#,
        )?;
        let rules = load_rules(&path)?;
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].target, "Base");
        Ok(())
    }

    #[test]
    fn test_load_rules_reports_bad_json() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("broken.json");
        fs::write(&path, "{")?;
        let err = load_rules(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse rules"));
        Ok(())
    }

    #[test]
    fn test_unreadable_catalog_falls_back() {
        let catalog = load_catalog(Some(Path::new("/nonexistent/groups.json")));
        assert_eq!(catalog, GroupCatalog::fallback());
        assert_eq!(load_catalog(None), GroupCatalog::fallback());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from([
            "rulegraph",
            "--rules",
            "rules.json",
            "--groups",
            "groups.json",
            "--pretty",
        ]);
        assert_eq!(args.rules, PathBuf::from("rules.json"));
        assert!(args.pretty);
        assert!(args.config.is_none());
    }
}
