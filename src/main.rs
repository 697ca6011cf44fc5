use std::path::PathBuf;

use clap::Parser;

use crate::config::{BuildConfig, ConfigOverrides};

mod build;
mod commands;
mod config;
mod log;

/// Build a static site from `pages/`, running any `.hook` stages along the way.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// The project root containing pages/ and public/
    #[arg(long)]
    path: Option<PathBuf>,

    /// The output directory
    #[arg(long)]
    out: Option<PathBuf>,

    /// The base URL exposed to templates as Meta.BaseURL
    #[arg(long = "baseurl")]
    base_url: Option<String>,

    /// The hooks directory, relative to the project root
    #[arg(long)]
    hooks: Option<PathBuf>,

    /// Highlight fenced code blocks
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    highlight: Option<bool>,

    /// The color theme used for highlighting
    #[arg(long)]
    highlight_theme: Option<String>,

    /// Render every line break in markdown as <br />
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    hard_wrap: Option<bool>,

    /// Serve the output directory after building
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    serve: Option<bool>,

    /// The port to serve on
    #[arg(long)]
    port: Option<u16>,

    /// Open the served site in the default browser
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    open: Option<bool>,
}

impl From<Args> for ConfigOverrides {
    fn from(args: Args) -> Self {
        Self {
            path: args.path,
            out: args.out,
            base_url: args.base_url,
            hooks: args.hooks,
            highlight: args.highlight,
            highlight_theme: args.highlight_theme,
            hard_wrap: args.hard_wrap,
            serve: args.serve,
            port: args.port,
            open: args.open,
        }
    }
}

async fn run(args: Args) -> Result<(), anyhow::Error> {
    let config = BuildConfig::load(&args.into())?;
    log::debug(&format!("{config:?}"));

    commands::build::run(&config).await?;

    if config.serve {
        commands::serve::run(&config).await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(err) = run(args).await {
        log::error(&format!("{err:#}"));
        std::process::exit(1);
    }
}
