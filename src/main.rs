//! Tryon - virtual outfit try-on CLI.

mod adapters;
mod cassette;
mod cli;
mod config;
mod context;
mod error;
mod input;
mod mime;
mod model;
mod normalize;
mod orchestrator;
mod output;
mod params;
mod ports;
mod prompt;
mod session;

use std::process;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::context::{Mode, ServiceContext};
use crate::error::TryOnError;
use crate::input::{load_image, load_refinement_source};
use crate::mime::SignatureSniffer;
use crate::model::{resolve_model, validate_model};
use crate::orchestrator::Orchestrator;
use crate::output::{compare_path, resolve_output_path, save_comparison, save_image};
use crate::params::OutputFormat;
use crate::ports::{Capability, ImagePayload};
use crate::prompt::Refinement;
use crate::session::{Session, SessionState};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        if e.is_transport() {
            eprintln!("The image service could not complete the request. Please try again.");
        }
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "tryon=debug" } else { "tryon=warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

async fn run(cli: Cli) -> Result<(), TryOnError> {
    // Load config
    let config_path = config::discover_config_path(cli.config.as_deref());
    let config = Config::load(&config_path).map_err(TryOnError::Config)?;

    // Resolve model
    let model_name = cli.model.clone().unwrap_or_else(|| config.defaults.model.clone());
    let model = resolve_model(&model_name);
    validate_model(&model).map_err(TryOnError::InvalidArgument)?;
    debug!(%model, requested = %model_name, "resolved model");

    // Validate refinements and output options
    let (refinements, output) = match &cli.command {
        Command::Generate(args) => (args.refine.refinements(), &args.output),
        Command::Refine(args) => (args.refine.refinements(), &args.output),
    };
    if matches!(cli.command, Command::Refine(_)) && refinements.is_empty() {
        return Err(TryOnError::InvalidArgument(
            "Provide at least one --edit, --background or --accessorize to refine".into(),
        ));
    }
    let format = match output.format {
        Some(format) => format,
        None => config.defaults.format.parse::<OutputFormat>().map_err(TryOnError::Config)?,
    };

    // Create context based on mode (live / recording / replaying)
    let mode = Mode::from_env();
    debug!(?mode, "capability mode");
    let (ctx, recording_session) = ServiceContext::for_mode(&mode, &config)?;

    let outcome = drive(&cli.command, ctx.capability.as_ref(), &model, &refinements).await;
    drop(ctx);

    // Finish recording if active, whatever the outcome
    if let Some(session) = recording_session {
        match session.finish() {
            Ok(path) => eprintln!("Cassette saved: {}", path.display()),
            Err(e) => eprintln!("Warning: failed to save cassette: {e}"),
        }
    }

    let outcome = outcome?;
    if let Some((image, note)) = &outcome.image {
        if let Some(note) = note {
            eprintln!("Model: {note}");
        }
        let path = resolve_output_path(output.output.as_deref(), &outcome.label, format);
        save_image(image, format, &path)?;
        eprintln!("Saved: {}", path.display());

        if output.compare {
            let compare = compare_path(&path, format);
            save_comparison(&outcome.before, image, format, &compare)?;
            eprintln!("Saved comparison: {}", compare.display());
        }
    }

    outcome.error.map_or(Ok(()), Err)
}

/// What a session produced before it finished or stopped.
struct Outcome {
    /// Latest image produced by a request in this run, with any model text.
    image: Option<(ImagePayload, Option<String>)>,
    /// Description of the step that produced `image`, used for file naming.
    label: String,
    /// The selfie, or the image a standalone refinement started from.
    before: ImagePayload,
    /// Refinement failure that stopped the run early.
    error: Option<TryOnError>,
}

/// Run the try-on and refinements through one session.
///
/// Failures before any image exists are returned as `Err`. A refinement
/// failure after that keeps the last good image in the outcome.
async fn drive(
    command: &Command,
    capability: &dyn Capability,
    model: &str,
    refinements: &[Refinement],
) -> Result<Outcome, TryOnError> {
    let sniffer = SignatureSniffer;
    let orchestrator = Orchestrator::new(capability, model).with_sniffer(Box::new(sniffer));

    let (mut session, before, mut label, mut produced) = match command {
        Command::Generate(args) => {
            let mut session = Session::new(orchestrator);
            if let Some(instruction) = args.resolve_instruction()? {
                session = session.with_styling_instruction(instruction);
            }
            let selfie = load_image(&args.selfie, &sniffer)?;
            session.set_user_image(Some(selfie.clone()));
            session.set_outfit_image(Some(load_image(&args.outfit, &sniffer)?));

            eprintln!("Styling your look...");
            session.generate().await?;
            (session, selfie, "try-on".to_string(), true)
        }
        Command::Refine(args) => {
            let source = load_refinement_source(&args.image, &sniffer)?;
            (Session::with_generated(orchestrator, source.clone()), source, String::new(), false)
        }
    };

    let mut error = None;
    for refinement in refinements {
        match refinement {
            Refinement::Background(bg) => eprintln!("Changing background to {bg}..."),
            Refinement::Edit(_) => eprintln!("Applying your edits..."),
        }
        if let Err(e) = session.refine(refinement).await {
            if !produced {
                return Err(e);
            }
            error = Some(e);
            break;
        }
        label = refinement.label();
        produced = true;
    }

    let image = match session.state() {
        SessionState::Success { image, note } => Some((image.clone(), note.clone())),
        other => other.current_image().map(|image| (image.clone(), None)),
    };
    Ok(Outcome { image: image.filter(|_| produced), label, before, error })
}
