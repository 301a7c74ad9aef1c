// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and hands off to Layer 2.
//
//   1. `train`   — fits the model on the train/test directories
//   2. `project` — loads the checkpoint and projects one file

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, ProjectArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "clip-to-clap",
    version,
    about = "Train a small MLP that maps CLIP embeddings into CLAP space."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Project(args) => run_project(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on '{}'", args.train_dir.display());
    let checkpoint_dir = args.checkpoint_dir.clone();

    TrainUseCase::new(args.into()).execute()?;

    println!("Training complete. Artifacts saved in '{}'.", checkpoint_dir.display());
    Ok(())
}

fn run_project(args: ProjectArgs) -> Result<()> {
    use crate::application::project_use_case::{format_projection, ProjectUseCase};

    let projection = ProjectUseCase::new(args.into()).execute()?;
    print!("{}", format_projection(&projection));
    Ok(())
}
