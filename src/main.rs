use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use dfn_fram::{read_input, write_output, DfnGenerator, DfngenError};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to input file
    input_file: PathBuf,

    /// Path to output folder
    output_folder: PathBuf,
}

/// Raises the returned flag when `~` is typed in the terminal.
fn spawn_stop_listener() -> Arc<AtomicBool> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();

    println!("Press '~' to stop inserting fractures and write the current DFN");

    std::thread::spawn(move || {
        let term = console::Term::stdout();

        // Reading fails when stdout is not a terminal, the listener just exits then
        while let Ok(key) = term.read_char() {
            if key == '~' {
                flag.store(true, Ordering::Relaxed);
                break;
            }
        }
    });

    stop
}

fn run(input_file: &Path, output_folder: &Path) -> Result<(), DfngenError> {
    let (input, fam_opt) = read_input(input_file)?;

    let mut generator = DfnGenerator::new(input, fam_opt)?;
    let stop = spawn_stop_listener();
    let summary = generator.run(&stop)?;

    if stop.load(Ordering::Relaxed) {
        warn!("Generation was stopped by user, writing the DFN generated so far");
    }

    write_output(output_folder, &mut generator, &summary.final_fractures)?;

    if !summary.boundary_connected {
        return Err(DfngenError::NoBoundaryConnection);
    }

    info!("dfngen complete, seed {}", summary.seed);

    Ok(())
}

fn main() -> Result<(), DfngenError> {
    let cli = Cli::parse();

    std::fs::create_dir_all(&cli.output_folder)?;
    let output_file = File::create(cli.output_folder.join("DFN_output.txt"))?;

    // Setup tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stdout),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(output_file),
        )
        .init();

    info!("Starting dfngen");

    run(&cli.input_file, &cli.output_folder).inspect_err(|e| error!("{}", e))
}
