use clap::{Parser, Subcommand};
use imgdesk::config::{self, Credentials};
use imgdesk::gateway::{self, AppState};
use imgdesk::imaging::{EncodingRequest, ImageAsset, Quality, RustBackend, compress};
use imgdesk::output;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

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
#[command(name = "imgdesk")]
#[command(about = "Image compression and hosted image-API gateway")]
#[command(long_about = "\
Image compression and hosted image-API gateway

Compress images locally (PNG/WebP sources become WebP, everything else JPEG),
or run the HTTP gateway that relays to hosted image services:

  POST /api/ai-generation   JSON {prompt, size?, response_format?}   needs ARK_API_KEY
  POST /api/recognition     multipart image_file, prompt?            needs ARK_API_KEY
  POST /api/remove-bg       multipart image_file, size?              needs REMOVE_BG_API_KEY
  GET  /api/remove-bg       {ok, hasKey}

API keys are read from the environment or a .env file.

Run 'imgdesk gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the gateway HTTP server
    Serve {
        /// Listen address, overrides server.bind
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Re-encode an image at a lower quality
    Compress {
        /// Image to compress
        input: PathBuf,
        /// Quality 1-100 (out-of-range values are clamped)
        #[arg(long, short, allow_negative_numbers = true)]
        quality: Option<i64>,
        /// Output file (default: <input stem>.min.<jpg|webp>)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Validate config and report which API keys are present
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { bind } => {
            let app_config = config::load_config(cli.config.as_deref())?;
            let addr = match bind {
                Some(addr) => addr,
                None => app_config.server.bind.parse()?,
            };
            let state = AppState::new(app_config, Credentials::from_env())?;
            tokio::runtime::Runtime::new()?.block_on(gateway::serve(state, addr))?;
        }
        Command::Compress {
            input,
            quality,
            output: output_path,
        } => {
            let app_config = config::load_config(cli.config.as_deref())?;
            let backend = RustBackend::with_max_pixels(app_config.compress.max_pixels);
            let quality = quality.map(Quality::new).unwrap_or(app_config.compress.quality);

            let bytes = std::fs::read(&input)?;
            let declared = image::ImageFormat::from_path(&input)
                .ok()
                .map(|format| format.to_mime_type());
            let asset = ImageAsset::decode(&backend, bytes, declared)?;
            let request = EncodingRequest::for_source(asset.mime(), quality);
            let result = compress(&backend, &asset, &request)?;

            let output_path =
                output_path.unwrap_or_else(|| output::default_output_path(&input, request.format));
            std::fs::write(&output_path, &result.bytes)?;
            output::print_compress_output(&input, &output_path, &asset, &request, &result);
        }
        Command::Check => {
            let app_config = config::load_config(cli.config.as_deref())?;
            output::print_check_output(&app_config, &Credentials::from_env());
            println!("==> Config is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG`.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
