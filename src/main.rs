use adaptive_images::client::PreferenceIntent;
use adaptive_images::config::{self, ServerConfig};
use adaptive_images::serve::{ImageServer, ServeRequest};
use adaptive_images::{logging, warm};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "adaptive-images")]
#[command(about = "Breakpoint-keyed responsive image resizing and caching")]
#[command(long_about = "\
Breakpoint-keyed responsive image resizing and caching

The transport layer (HTTP server) hands each image request to this core,
which picks a breakpoint resolution from the client's width signal and
returns the cached variant at that resolution, generating it on demand.

Cache layout:

  ai-cache/
  ├── 480/albums/dawn.jpg          # one directory per breakpoint,
  ├── 768/albums/dawn.jpg          # mirroring the source tree
  └── 1382/albums/dawn.jpg

Variants keep the source's file name: PNG stays PNG, GIF stays GIF,
everything else is encoded as JPEG at the configured quality.

Run 'adaptive-images gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults are used when it does not exist)
    #[arg(long, default_value = "adaptive-images.toml", global = true)]
    config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve one request and print the file that would be served
    Resolve {
        /// Logical image path, relative to the source root
        path: String,
        /// Stored width preference (the cookie value), if any
        #[arg(long)]
        preference: Option<String>,
        /// Request signature (user agent) for device-class inference
        #[arg(long, default_value = "")]
        signature: String,
    },
    /// Pre-generate every breakpoint variant for all source images
    Warm,
    /// Validate the configuration and the source/cache roots
    Check,
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Resolve {
            path,
            preference,
            signature,
        } => {
            let server = ImageServer::new(load_config(&cli.config)?)?;
            let response = server.serve(&ServeRequest {
                path: &path,
                preference: preference.as_deref(),
                signature: &signature,
            })?;
            if response.preference == PreferenceIntent::Clear {
                eprintln!(
                    "note: stored preference is malformed; the '{}' cookie should be cleared",
                    server.config().cookie_name
                );
            }
            println!("{}", response.file.display());
        }
        Command::Warm => {
            let config = load_config(&cli.config)?;
            let stats = warm::warm(&config)?;
            println!("{stats}");
        }
        Command::Check => {
            let config = load_config(&cli.config)?;
            if !Path::new(&config.source_root).is_dir() {
                return Err(format!("source root is not a directory: {}", config.source_root).into());
            }
            fs::create_dir_all(&config.cache_root)
                .map_err(|e| format!("cache root is not writable: {e}"))?;
            println!("configuration OK");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<ServerConfig, config::ConfigError> {
    if path.exists() {
        ServerConfig::load(path)
    } else {
        Ok(ServerConfig::default())
    }
}
