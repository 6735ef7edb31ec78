mod serve;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use formflow_core::Role;

/// Multi-party form workflow service.
#[derive(Parser)]
#[command(name = "formflow", version, about = "Multi-party form workflow service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "3001", env = "FORMFLOW_PORT")]
        port: u16,
        /// Path to the JSON data file
        #[arg(long, default_value = "data/db.json", env = "FORMFLOW_DATA")]
        data: PathBuf,
        /// Directory for uploaded document artifacts
        #[arg(long, default_value = "uploads", env = "FORMFLOW_UPLOADS")]
        uploads: PathBuf,
        /// Role assigned to every freshly extracted field
        #[arg(long, default_value = "buyer")]
        default_role: Role,
    },

    /// Extract a form template from a PDF and print it as JSON
    Extract {
        /// Path to the PDF file
        file: PathBuf,
        /// Role assigned to every extracted field
        #[arg(long, default_value = "buyer")]
        default_role: Role,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            data,
            uploads,
            default_role,
        } => {
            let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
            let options = serve::ServeOptions {
                port,
                data,
                uploads,
                default_role,
            };
            if let Err(e) = rt.block_on(serve::start_server(options)) {
                eprintln!("server error: {e}");
                process::exit(1);
            }
        }
        Commands::Extract { file, default_role } => {
            cmd_extract(&file, default_role);
        }
    }
}

fn cmd_extract(file: &std::path::Path, default_role: Role) {
    let bytes = match std::fs::read(file) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("error reading '{}': {e}", file.display());
            process::exit(1);
        }
    };

    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());

    match formflow_extract::extract_template(&bytes, &filename, default_role) {
        Ok(template) => {
            let pretty = serde_json::to_string_pretty(&template)
                .unwrap_or_else(|e| format!("serialization error: {e}"));
            println!("{pretty}");
        }
        Err(e) => {
            eprintln!("extraction error: {e}");
            process::exit(1);
        }
    }
}
