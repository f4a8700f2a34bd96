use clap::{Parser, Subcommand};
use gallery_ingest::imaging::{self, RustBackend};
use gallery_ingest::pipeline::PipelineEvent;
use gallery_ingest::types::GalleryReport;
use gallery_ingest::{config, gallery, output};
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "gallery-ingest")]
#[command(about = "Resize, vectorize and catalog photo-gallery albums")]
#[command(long_about = "\
Resize, vectorize and catalog photo-gallery albums

Every directory in the gallery root is an album. Drop photos into its
originals/ directory and run the pipeline:

  gallery/
  ├── config.toml                  # Optional, overrides stock defaults
  ├── app/                         # Skipped (see skip_dirs)
  └── trip/                        # Album
      ├── originals/               # Your photos (png, jpg, jpeg, gif)
      │   ├── a.png
      │   └── a-A.jpg              # Renamed from a.jpg (duplicate stem)
      ├── tiny/ small/ medium/ large/
      │   └── a--tiny.jpg          # Longest edge fitted per size
      ├── svg/
      │   └── a.svg                # Ellipse rendering of the photo
      ├── album-1-to-10.json       # Metadata, first page
      └── album-11-plus.json       # Metadata, the rest

Output directories are cleared and regenerated on every run. Originals are
never modified except for duplicate-stem renames. Hand-edited fields in the
metadata pages survive re-runs.

Run 'gallery-ingest gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Gallery root directory
    #[arg(long, default_value = ".", global = true)]
    gallery: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: rename → resize → vectorize → metadata
    Run {
        /// Process only this album
        album: Option<String>,
    },
    /// Rebuild metadata pages from existing vector output
    Hydrate {
        /// Hydrate only this album
        album: Option<String>,
    },
    /// Survey albums and show planned renames without writing
    Check {
        /// Check only this album
        album: Option<String>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let report = match cli.command {
        Command::Run { album } => {
            let config = config::load_config(&cli.gallery)?;
            let backend = RustBackend::new();
            let vectorizer = imaging::vectorizer_for(&config.vector);
            println!("==> Processing {}", cli.gallery.display());
            let (tx, printer) = spawn_printer();
            let result = gallery::run_gallery(
                &backend,
                vectorizer.as_ref(),
                &cli.gallery,
                &config,
                album.as_deref(),
                Some(tx),
            );
            join_printer(printer);
            let report = result?;
            output::print_gallery_report(&report);
            report
        }
        Command::Hydrate { album } => {
            let config = config::load_config(&cli.gallery)?;
            let backend = RustBackend::new();
            println!("==> Hydrating {}", cli.gallery.display());
            let (tx, printer) = spawn_printer();
            let result = gallery::hydrate_gallery(
                &backend,
                &cli.gallery,
                &config,
                album.as_deref(),
                Some(tx),
            );
            join_printer(printer);
            let report = result?;
            output::print_gallery_report(&report);
            report
        }
        Command::Check { album } => {
            let config = config::load_config(&cli.gallery)?;
            println!("==> Checking {}", cli.gallery.display());
            for ext in gallery::undecodable_extensions(&config) {
                println!("Warning: no decoder for .{ext} files; they will fail to convert");
            }
            let report = gallery::check_gallery(&cli.gallery, &config, album.as_deref())?;
            output::print_check_report(&report);
            report
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            GalleryReport::default()
        }
    };

    if report.has_fatal() {
        std::process::exit(1);
    }
    Ok(())
}

/// Start the thread that prints progress events as they arrive.
///
/// The thread exits once every sender is dropped, i.e. when the gallery
/// run returns.
fn spawn_printer() -> (Sender<PipelineEvent>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_event(&event) {
                println!("{}", line);
            }
        }
    });
    (tx, printer)
}

fn join_printer(printer: JoinHandle<()>) {
    if printer.join().is_err() {
        eprintln!("progress printer panicked");
    }
}
