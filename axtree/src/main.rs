//! Inspect accessibility-tree observations from the command line.
//!
//! Every command except `init` reads a raw observation JSON file, builds the
//! numbered tree and (unless `--raw`) cleans it before acting.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use axtree::core::invariants::validate_invariants;
use axtree::core::markdown::markdown;
use axtree::core::matcher::Matcher;
use axtree::core::path::{node_path, outline};
use axtree::core::query::Query;
use axtree::exit_codes;
use axtree::io::config::{SessionConfig, default_config_path, load_config, write_config};
use axtree::io::observation::{build_clean_tree, build_tree, load_observation, write_snapshot};
use axtree::logging;
use axtree::tree::Tree;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};

#[derive(Parser)]
#[command(
    name = "axtree",
    version,
    about = "Clean, query and render accessibility-tree observations"
)]
struct Cli {
    /// Session config file; defaults to `.axtree/config.toml`.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Input {
    /// Observation JSON file.
    path: PathBuf,
    /// Skip cleaning; act on the tree as observed.
    #[arg(long)]
    raw: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Write the default session config if missing.
    Init {
        /// Overwrite an existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Print the page as Markdown.
    Render {
        #[command(flatten)]
        input: Input,
    },
    /// Print an indented outline with element ids and properties.
    Outline {
        #[command(flatten)]
        input: Input,
    },
    /// Print the path of matching nodes. Exits 2 when nothing matches.
    Find {
        #[command(flatten)]
        input: Input,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        nth: Option<usize>,
        /// Match category and name as substrings.
        #[arg(long)]
        substrings: bool,
        /// Treat category and name as regular expressions.
        #[arg(long)]
        regex: bool,
        /// Print every match instead of the first.
        #[arg(long)]
        all: bool,
    },
    /// Check the config, then the observation against the schema and the tree
    /// invariants.
    Validate {
        /// Observation JSON file.
        path: PathBuf,
    },
    /// Write the detached tree as JSON.
    Snapshot {
        #[command(flatten)]
        input: Input,
        /// Output file; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .unwrap_or_else(|| default_config_path(Path::new(".")));
    match cli.command {
        Command::Init { force } => cmd_init(&config_path, force),
        Command::Render { input } => {
            let tree = load_input(&input)?;
            println!("{}", markdown(&tree).context("render markdown")?);
            Ok(exit_codes::OK)
        }
        Command::Outline { input } => {
            let tree = load_input(&input)?;
            print!("{}", outline(&tree, tree.root()));
            Ok(exit_codes::OK)
        }
        Command::Find {
            input,
            category,
            name,
            nth,
            substrings,
            regex,
            all,
        } => {
            let tree = load_input(&input)?;
            let query = build_query(
                category.as_deref(),
                name.as_deref(),
                nth,
                substrings,
                regex,
            )?;
            cmd_find(&tree, &query, all)
        }
        Command::Validate { path } => cmd_validate(&path, &config_path),
        Command::Snapshot { input, out } => {
            let tree = load_input(&input)?;
            let snapshot = tree.detach();
            match out {
                Some(path) => write_snapshot(&path, &snapshot)?,
                None => println!("{}", serde_json::to_string_pretty(&snapshot)?),
            }
            Ok(exit_codes::OK)
        }
    }
}

fn load_input(input: &Input) -> Result<Tree> {
    let observation = load_observation(&input.path)?;
    debug!(path = %input.path.display(), raw = input.raw, "loaded observation");
    if input.raw {
        build_tree(&observation)
    } else {
        build_clean_tree(&observation)
    }
}

fn build_query(
    category: Option<&str>,
    name: Option<&str>,
    nth: Option<usize>,
    substrings: bool,
    regex: bool,
) -> Result<Query> {
    let matcher = |text: &str| -> Result<Matcher> {
        if regex {
            Ok(Matcher::pattern(text)?)
        } else {
            Ok(Matcher::literal(text))
        }
    };
    let mut query = Query::new().match_substrings(substrings);
    if let Some(category) = category {
        query = query.category(matcher(category)?);
    }
    if let Some(name) = name {
        query = query.name(matcher(name)?);
    }
    if let Some(nth) = nth {
        query = query.nth(nth);
    }
    Ok(query)
}

fn cmd_find(tree: &Tree, query: &Query, all: bool) -> Result<i32> {
    let matches = if all {
        tree.find_all(tree.root(), query)
    } else {
        tree.find(tree.root(), query).into_iter().collect()
    };
    if matches.is_empty() {
        return Ok(exit_codes::NOT_FOUND);
    }
    for id in matches {
        println!("{}", node_path(tree, id));
    }
    Ok(exit_codes::OK)
}

fn cmd_init(config_path: &Path, force: bool) -> Result<i32> {
    if !force && config_path.exists() {
        println!("{} already exists", config_path.display());
        return Ok(exit_codes::OK);
    }
    write_config(config_path, &SessionConfig::default())?;
    info!(path = %config_path.display(), "wrote config");
    println!("wrote {}", config_path.display());
    Ok(exit_codes::OK)
}

fn cmd_validate(path: &Path, config_path: &Path) -> Result<i32> {
    let config = load_config(config_path).context("load config")?;
    debug!(?config, "config ok");
    let observation = load_observation(path)?;
    let tree = build_tree(&observation)?;
    let errors = validate_invariants(&tree);
    if !errors.is_empty() {
        bail!("invariant violations:\n- {}", errors.join("\n- "));
    }
    let cleaned = build_clean_tree(&observation)?;
    println!(
        "ok: {} nodes, {} after cleaning",
        tree.all_nodes().len(),
        cleaned.all_nodes().len()
    );
    Ok(exit_codes::OK)
}
