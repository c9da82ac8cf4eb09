//! # Sheetsync CLI
//!
//! Command-line interface for binding spreadsheet rows into a scene.
//!
//! ## Usage
//!
//! ```bash
//! # Bind rows.xlsx into the first template under the scene root
//! sheetsync bind --template scene.json --data rows.xlsx --out populated.json
//!
//! # Bind a specific node by name
//! sheetsync bind --template scene.json --data rows.xlsx --node "Product Card"
//!
//! # Inspect the derived column keys of a workbook
//! sheetsync headers --data rows.xlsx
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sheetsync::{
    SheetSyncError,
    binding::HttpImageFetcher,
    ingest::xlsx::load_xlsx,
    scene::{NodeId, Scene},
    sync::sync_rows,
};

/// Sheetsync - bind spreadsheet rows into a node-tree template
#[derive(Parser, Debug)]
#[command(name = "sheetsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clone a template once per data row and fill its tagged slots
    Bind {
        /// Scene JSON containing the template
        #[arg(long, value_name = "FILE")]
        template: PathBuf,

        /// Workbook with the data rows
        #[arg(long, value_name = "FILE")]
        data: PathBuf,

        /// Worksheet name (defaults to the first sheet)
        #[arg(long)]
        sheet: Option<String>,

        /// Template node name (defaults to the first child of the root)
        #[arg(long)]
        node: Option<String>,

        /// Write the populated scene here
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Print the derived column keys of a workbook
    Headers {
        /// Workbook to inspect
        #[arg(long, value_name = "FILE")]
        data: PathBuf,

        /// Worksheet name (defaults to the first sheet)
        #[arg(long)]
        sheet: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), SheetSyncError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Bind {
            template,
            data,
            sheet,
            node,
            out,
        } => {
            let raw = std::fs::read_to_string(&template)?;
            let mut scene: Scene = serde_json::from_str(&raw)?;
            scene.validate()?;
            let target = select_template(&scene, node.as_deref())?;

            let sheet_data = load_xlsx(&data, sheet.as_deref())?;
            if sheet_data.rows.is_empty() {
                return Err(SheetSyncError::Precondition(
                    "workbook has no data rows".to_string(),
                ));
            }

            let fetcher = HttpImageFetcher::new()?;
            let report = sync_rows(&mut scene, target, &sheet_data.rows, &fetcher).await?;
            println!("{}", report.summary());

            if let Some(out) = out {
                std::fs::write(&out, serde_json::to_string_pretty(&scene)?)?;
                println!("Wrote {}", out.display());
            }
        }

        Commands::Headers { data, sheet } => {
            let sheet_data = load_xlsx(&data, sheet.as_deref())?;
            if sheet_data.headers.is_empty() {
                println!("No columns found.");
                return Ok(());
            }
            for header in &sheet_data.headers {
                println!("{}  ({})", header.key, header.label);
            }
            println!("{} data row(s)", sheet_data.rows.len());
        }
    }

    Ok(())
}

/// Resolve the template node: by name when given, otherwise the first
/// child of the scene root.
fn select_template(scene: &Scene, name: Option<&str>) -> Result<NodeId, SheetSyncError> {
    if let Some(name) = name {
        scene
            .descendants(scene.root)
            .into_iter()
            .find(|&id| scene.get(id).name == name)
            .ok_or_else(|| {
                SheetSyncError::Precondition(format!("no node named '{name}' in the scene"))
            })
    } else {
        scene
            .children(scene.root)
            .first()
            .copied()
            .ok_or_else(|| {
                SheetSyncError::Precondition("scene root has no children to use as template".into())
            })
    }
}
