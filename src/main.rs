use anyhow::Result;
use cardlens::app::{App, RunOutcome};
use cardlens::models::Mode;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "cardlens")]
#[command(about = "Composite a reference image onto a card held in a captured photo")]
struct CliArgs {
    /// Captured photo to use as the subject image.
    #[arg(value_name = "PHOTO")]
    photo: Option<PathBuf>,

    /// Generation mode.
    #[arg(long, default_value = "rainbow", value_parser = Mode::parse)]
    mode: Mode,

    /// Store a new prompt for the mode before generating.
    #[arg(long, value_name = "TEXT")]
    set_prompt: Option<String>,

    /// Store a new reference image for the mode before generating.
    #[arg(long, value_name = "IMAGE")]
    set_reference: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cardlens=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let app = match App::new() {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    if args.set_prompt.is_some() || args.set_reference.is_some() {
        app.update_settings(args.mode, args.set_prompt.clone(), args.set_reference.as_deref())?;
    }

    let Some(photo) = args.photo else {
        info!("No photo given, nothing to generate");
        return Ok(());
    };

    match app.run(&photo, args.mode).await? {
        RunOutcome::Saved(path) => {
            info!("Generated image saved to {}", path.display());
            Ok(())
        }
        RunOutcome::Failed(message) => {
            error!("{}", message);
            std::process::exit(1);
        }
    }
}
