//! Binary entry point for marginalia.
//!
//! This binary provides the CLI interface for augmenting vault notes with
//! AI-generated callouts from a local inference server.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print output in the main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use marginalia::cli::{default_config_path, render_prompt_list, render_status};
use marginalia::config::{DEFAULT_PROMPT_KEY, MarginaliaConfig, PromptSlot};
use marginalia::llm::{InferenceClient, OllamaClient};
use marginalia::observability::init_logging;
use marginalia::services::GenerationService;
use marginalia::vault::{FsVault, Vault};
use std::path::PathBuf;
use std::process::ExitCode;

/// Marginalia - AI augmentation for markdown journal vaults.
#[derive(Parser)]
#[command(name = "marginalia")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the vault root directory.
    #[arg(long, global = true, env = "MARGINALIA_VAULT", default_value = ".")]
    vault: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Generate an AI callout for a note.
    Generate {
        /// Vault-relative path of the note.
        note: String,

        /// Prompt key to use.
        #[arg(short, long, default_value = DEFAULT_PROMPT_KEY)]
        prompt: String,

        /// Append the formatted callout to the note instead of printing it.
        #[arg(long)]
        write: bool,

        /// Print the raw response without callout formatting.
        #[arg(long, conflicts_with = "write")]
        raw: bool,
    },

    /// Manage prompt slots.
    Prompts {
        #[command(subcommand)]
        action: PromptsAction,
    },

    /// Show configuration and connectivity.
    Status,
}

/// Prompt slot management actions.
#[derive(Subcommand)]
enum PromptsAction {
    /// List configured prompt slots.
    List,

    /// Add or replace a prompt slot.
    Add {
        /// Stable prompt key.
        key: String,

        /// Display label.
        #[arg(short, long)]
        label: String,

        /// Vault-relative prompt file path.
        #[arg(long)]
        prompt_file: Option<String>,

        /// Callout heading prepended to generated output.
        #[arg(long)]
        callout_heading: Option<String>,

        /// Callout types stripped from the input, comma-separated.
        #[arg(long)]
        exclude_callouts: Option<String>,
    },

    /// Remove a prompt slot.
    Remove {
        /// Prompt key to remove.
        key: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate {
            note,
            prompt,
            write,
            raw,
        } => cmd_generate(config, cli.vault, &note, &prompt, write, raw),
        Commands::Prompts { action } => cmd_prompts(config, cli.config, action),
        Commands::Status => cmd_status(&config),
    }
}

fn load_config(explicit: Option<&std::path::Path>) -> anyhow::Result<MarginaliaConfig> {
    explicit.map_or_else(
        || Ok(MarginaliaConfig::load_default()),
        |path| {
            MarginaliaConfig::load_from_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))
        },
    )
}

/// Generate command.
fn cmd_generate(
    config: MarginaliaConfig,
    vault_root: PathBuf,
    note: &str,
    prompt: &str,
    write: bool,
    raw: bool,
) -> anyhow::Result<()> {
    let vault = FsVault::new(&vault_root);
    let editor_text = vault
        .read(note)
        .with_context(|| format!("failed to read note '{note}'"))?;

    let client = OllamaClient::new().with_endpoint(config.endpoint.clone());
    let service = GenerationService::new(config, vault, client);

    let Some(answer) = service.generate(note, &editor_text, prompt) else {
        bail!("generation failed for '{note}' (see warnings above)");
    };

    if raw {
        println!("{answer}");
        return Ok(());
    }

    let formatted = service.format_response(&answer, prompt);
    if write {
        let note_path = vault_root.join(note);
        let updated = format!("{}\n\n{formatted}\n", editor_text.trim_end());
        std::fs::write(&note_path, updated)
            .with_context(|| format!("failed to update {}", note_path.display()))?;
        println!("Appended generated callout to {note}");
    } else {
        println!("{formatted}");
    }
    Ok(())
}

/// Prompts command.
fn cmd_prompts(
    mut config: MarginaliaConfig,
    config_path: Option<PathBuf>,
    action: PromptsAction,
) -> anyhow::Result<()> {
    match action {
        PromptsAction::List => {
            print!("{}", render_prompt_list(&config));
            Ok(())
        }
        PromptsAction::Add {
            key,
            label,
            prompt_file,
            callout_heading,
            exclude_callouts,
        } => {
            let slot = PromptSlot {
                display_label: label,
                prompt_file,
                callout_heading,
                exclude_callout_types: exclude_callouts
                    .map(|raw| raw.split(',').map(str::trim).collect::<Vec<_>>().join("\n")),
            };
            config.add_prompt(key.clone(), slot);
            save_config(&config, config_path)?;
            println!("Saved prompt '{key}'");
            Ok(())
        }
        PromptsAction::Remove { key } => {
            config.remove_prompt(&key)?;
            save_config(&config, config_path)?;
            println!("Removed prompt '{key}'");
            Ok(())
        }
    }
}

fn save_config(config: &MarginaliaConfig, explicit: Option<PathBuf>) -> anyhow::Result<()> {
    let path = match explicit {
        Some(path) => path,
        None => default_config_path().context("could not determine a config directory")?,
    };
    config
        .save_to_file(&path)
        .with_context(|| format!("failed to save config to {}", path.display()))?;
    Ok(())
}

/// Status command.
fn cmd_status(config: &MarginaliaConfig) -> anyhow::Result<()> {
    let client = OllamaClient::new().with_endpoint(config.endpoint.clone());
    let reachable = client.check_connection();
    print!("{}", render_status(config, reachable));
    Ok(())
}
