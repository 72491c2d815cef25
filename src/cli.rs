//! CLI argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::params::OutputFormat;
use crate::prompt::{Background, Refinement, ACCESSORIES_SUGGESTION};

/// Virtual outfit try-on: dress a selfie in an outfit photo with Gemini.
#[derive(Parser, Debug)]
#[command(name = "tryon", version, about)]
pub struct Cli {
    /// Model name or short alias (default from config, else nano-banana).
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a try-on image from a selfie and an outfit photo.
    Generate(GenerateArgs),
    /// Refine an existing try-on image.
    Refine(RefineArgs),
}

/// Arguments for `tryon generate`.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Photo of yourself (well-lit, front-facing).
    #[arg(short, long)]
    pub selfie: PathBuf,

    /// Photo of the outfit (flat-lay works best).
    #[arg(short = 'u', long)]
    pub outfit: PathBuf,

    /// File with a custom styling instruction.
    #[arg(short = 'i', long)]
    pub instruction_file: Option<PathBuf>,

    /// Refinements applied after the try-on.
    #[command(flatten)]
    pub refine: RefinementArgs,

    /// Output options.
    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for `tryon refine`.
#[derive(Args, Debug)]
pub struct RefineArgs {
    /// Previously generated image.
    pub image: PathBuf,

    /// Refinements to apply.
    #[command(flatten)]
    pub refine: RefinementArgs,

    /// Output options.
    #[command(flatten)]
    pub output: OutputArgs,
}

/// Background swap and free-text edits.
#[derive(Args, Debug)]
pub struct RefinementArgs {
    /// Background preset: white-studio, city-street, runway.
    #[arg(short, long)]
    pub background: Option<Background>,

    /// Add a stylish necklace and sunglasses.
    #[arg(short = 'a', long)]
    pub accessorize: bool,

    /// Free-text edit (repeatable, applied in order).
    #[arg(short, long = "edit")]
    pub edits: Vec<String>,
}

impl RefinementArgs {
    /// Refinements in the order they are applied: background first, then
    /// the accessories suggestion, then edits as given.
    #[must_use]
    pub fn refinements(&self) -> Vec<Refinement> {
        let suggestion = self.accessorize.then(|| ACCESSORIES_SUGGESTION.to_string());
        self.background
            .map(Refinement::Background)
            .into_iter()
            .chain(suggestion.into_iter().chain(self.edits.iter().cloned()).map(Refinement::Edit))
            .collect()
    }
}

/// Where and how to save the result.
#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Output file path (auto-generated if not specified).
    #[arg(short, long)]
    pub output: Option<String>,

    /// Output format: jpeg, png, webp (default from config, else png).
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Also save a before/after image next to the output.
    #[arg(long)]
    pub compare: bool,
}

impl GenerateArgs {
    /// Resolve the styling instruction from the file flag, if given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn resolve_instruction(&self) -> Result<Option<String>, std::io::Error> {
        self.instruction_file.as_ref().map(std::fs::read_to_string).transpose()
    }
}
