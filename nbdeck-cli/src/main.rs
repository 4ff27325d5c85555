//! nbdeck CLI
//!
//! Converts a rendered notebook page into a reveal.js slide deck.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use nbdeck_common::warning::{set_verbose, status};
use nbdeck_dom::NodeId;
use nbdeck_html::{format_tree, parse_document_with_issues};
use nbdeck_slides::{
    DeckConfig, RevealJs, content_root, flatten_content, is_slideshow, present_document,
    serialize_document,
};
use owo_colors::OwoColorize;

/// nbdeck: turn a rendered notebook page into a reveal.js slide deck
#[derive(Parser, Debug)]
#[command(name = "nbdeck")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Convert a page and write the deck next to it
    nbdeck notebook.html -o notebook.slides.html

    # Use a config file and enable the overview mode
    nbdeck -c deck.json --overview notebook.html

    # Inspect the restructured DOM
    nbdeck --tree --html '<div id="main-content"><div>...</div></div>'
"#)]
struct Cli {
    /// Path to the rendered notebook page
    #[arg(value_name = "FILE", required_unless_present = "html")]
    path: Option<PathBuf>,

    /// Parse HTML string directly instead of a file
    #[arg(long, value_name = "HTML", conflicts_with = "path")]
    html: Option<String>,

    /// Write the result to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Id of the element holding the notebook content
    #[arg(long, value_name = "ID")]
    root_id: Option<String>,

    /// Class of the page container to hide
    #[arg(long, value_name = "CLASS")]
    container_class: Option<String>,

    /// Enable reveal.js overview mode
    #[arg(long)]
    overview: bool,

    /// Transform pages that carry no slideshow metadata
    #[arg(long)]
    force: bool,

    /// Print the resulting DOM tree instead of HTML
    #[arg(long)]
    tree: bool,

    /// Print progress messages to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    set_verbose(cli.verbose);

    let config = load_config(&cli)?;
    let source = load_source(&cli)?;

    let (mut tree, issues) = parse_document_with_issues(&source);
    if !issues.is_empty() {
        status("CLI", &format!("recovered from {} HTML parse issue(s)", issues.len()));
    }

    if !cli.force {
        let root = content_root(&tree, &config)?;
        let content = flatten_content(&tree, root);
        if !is_slideshow(&tree, &content)? {
            bail!("page has no slideshow metadata (use --force to convert anyway)");
        }
    }

    let library = RevealJs::new(config.assets.clone());
    let deck = present_document(&mut tree, &config, &library)?;

    let rendered = if cli.tree {
        format_tree(&tree, NodeId::ROOT)
    } else {
        serialize_document(&tree)
    };

    match cli.output {
        Some(ref path) => {
            fs::write(path, rendered)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            eprintln!(
                "{} {} ({})",
                "wrote".green().bold(),
                path.display(),
                deck.summary
            );
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Read the config file, if any, and apply command-line overrides.
fn load_config(cli: &Cli) -> Result<DeckConfig> {
    let mut config = match cli.config {
        Some(ref path) => DeckConfig::from_json_file(path)?,
        None => DeckConfig::default(),
    };
    if let Some(ref id) = cli.root_id {
        config.content_root_id.clone_from(id);
    }
    if let Some(ref class) = cli.container_class {
        config.hidden_container_class.clone_from(class);
    }
    if cli.overview {
        config.presentation.overview = true;
    }
    Ok(config)
}

/// Load the page source from --html or the file argument.
fn load_source(cli: &Cli) -> Result<String> {
    if let Some(ref html) = cli.html {
        return Ok(html.clone());
    }
    let Some(ref path) = cli.path else {
        bail!("a file path or --html is required");
    };
    fs::read_to_string(path).with_context(|| format!("failed to read '{}'", path.display()))
}
