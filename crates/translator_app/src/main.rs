mod platform;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use platform::config::{ClientConfig, Mode, Overrides};
use platform::logging::{self, LogDestination};

#[derive(Parser)]
#[command(name = "translator", version, about = "Client for the document translation service")]
struct Cli {
    /// RON configuration file (default: ./translator.ron if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the translation service
    #[arg(long, global = true)]
    server: Option<String>,

    /// Where log output goes
    #[arg(long, value_enum, global = true, default_value_t = LogDestination::File)]
    log: LogDestination,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Translate one document and save the result
    File {
        /// PDF, DOCX, PPTX or image file
        path: PathBuf,

        /// Source language name or code, or "auto"
        #[arg(long)]
        source: Option<String>,

        /// Target language name or code
        #[arg(long)]
        target: Option<String>,

        /// How progress is followed
        #[arg(long, value_enum)]
        mode: Option<Mode>,

        /// Directory the translated file is saved in
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Translate text typed on stdin, one line at a time
    Text {
        #[arg(long)]
        source: Option<String>,

        #[arg(long)]
        target: Option<String>,
    },
    /// List the supported languages
    Languages,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::Languages = cli.command {
        return platform::app::print_languages();
    }

    logging::initialize(cli.log, cli.verbose);

    let mut config = ClientConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let mut overrides = Overrides {
        server_url: cli.server,
        ..Overrides::default()
    };

    match cli.command {
        Command::File {
            path,
            source,
            target,
            mode,
            output,
        } => {
            overrides.source_lang = source;
            overrides.target_lang = target;
            overrides.mode = mode;
            overrides.output_dir = output;
            config.apply(overrides);

            let saved = platform::app::translate_file(&config, &path)?;
            println!("Saved {}", saved.display());
        }
        Command::Text { source, target } => {
            overrides.source_lang = source;
            overrides.target_lang = target;
            config.apply(overrides);
            platform::app::live_text(&config)?;
        }
        Command::Languages => {}
    }
    Ok(())
}
