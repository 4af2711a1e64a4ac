use clap::{Parser, Subcommand};
use picserve::artifact::Artifact;
use picserve::imaging::decode;
use picserve::output::{self, ArtifactSummary};
use picserve::process::Server;
use picserve::source::{FileSource, SOURCE_PARAM};
use picserve::{args, batch, config, logging};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "picserve")]
#[command(about = "On-demand image processing pipeline")]
#[command(long_about = "\
On-demand image processing pipeline

Each request is a set of parameters, given as key=value pairs (dots nest) or
as one JSON object:

  picserve process photo.jpg format=png resize.width=100
  picserve process photo.jpg '{\"resize\": {\"width\": 100, \"mode\": \"thumbnail\"}}'

Recognised parameters:
  format                 Output format: jpeg, png, gif, tiff, webp, avif
                         (default: same as the input)
  quality                1-100, for jpeg and avif
  resize.width           Target width, 0 = derive from height
  resize.height          Target height, 0 = derive from width
  resize.interpolation   nearest_neighbor, bilinear, bicubic, mitchell_netravali,
                         gaussian, lanczos2, lanczos3
  resize.mode            resize (exact) or thumbnail (fit inside, never upscale)

The resize key is configurable ([resize] param in picserve.toml).

Run 'picserve gen-config' to generate a documented picserve.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = config::CONFIG_FILE_NAME, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process one image file
    Process {
        /// Input image
        input: PathBuf,
        /// Parameters: key=value pairs or one JSON object
        params: Vec<String>,
        /// Output file (default: input name with the output format's extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Process every image under a directory in parallel
    Batch {
        /// Input directory
        input: PathBuf,
        /// Output directory (mirrors the input tree)
        #[arg(short, long)]
        output: PathBuf,
        /// Parameters applied to every image
        params: Vec<String>,
    },
    /// Wrap an image file in the binary artifact format
    Pack {
        input: PathBuf,
        output: PathBuf,
    },
    /// Extract the image from a packed artifact
    Unpack {
        input: PathBuf,
        output: PathBuf,
    },
    /// Print a stock picserve.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Process {
            input,
            params,
            output: dest,
        } => {
            let config = setup(&cli.config)?;
            let root = input.parent().unwrap_or(Path::new(""));
            let name = input
                .file_name()
                .ok_or_else(|| format!("not a file: {}", input.display()))?;

            let mut params = args::parse(&params)?;
            params.set(SOURCE_PARAM, name.to_string_lossy().into_owned());

            let server = Server::new(FileSource::new(root), config.build_pipeline()?);
            let (original, result) = server.get_with_original(&params)?;

            let dest = dest.unwrap_or_else(|| {
                default_output(&input, batch::extension_for(result.format()))
            });
            std::fs::write(&dest, result.data())?;
            output::print_process_result(
                &summarize(&input, &original),
                &params,
                &summarize(&dest, &result),
            );
        }
        Command::Batch {
            input,
            output: dest,
            params,
        } => {
            let config = setup(&cli.config)?;
            init_thread_pool(&config.processing);
            let params = args::parse(&params)?;
            let pipeline = config.build_pipeline()?;
            let outcomes = batch::run(&pipeline, &input, &dest, &params);
            output::print_batch_summary(&outcomes, &input);
        }
        Command::Pack {
            input,
            output: dest,
        } => {
            let data = std::fs::read(&input)?;
            let format = decode::sniff(&data)?;
            let packed = Artifact::new(format, data).marshal_binary()?;
            std::fs::write(&dest, &packed)?;
            output::print_lines(&output::format_pack_result(
                &input,
                &dest,
                format,
                packed.len(),
            ));
        }
        Command::Unpack {
            input,
            output: dest,
        } => {
            let artifact = Artifact::unmarshal_binary(&std::fs::read(&input)?)?;
            std::fs::write(&dest, artifact.data())?;
            output::print_lines(&output::format_unpack_result(
                &input,
                &dest,
                artifact.format(),
                artifact.data().len(),
            ));
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the config file and start logging at its level.
fn setup(path: &Path) -> Result<config::Config, config::ConfigError> {
    let config = config::load_config(path)?;
    logging::init(&config.logging.level);
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: users can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// `photo.jpg` + `png` → `photo.out.png`, next to the input.
fn default_output(input: &Path, extension: &str) -> PathBuf {
    input.with_extension(format!("out.{extension}"))
}

fn summarize(path: &Path, artifact: &Artifact) -> ArtifactSummary {
    ArtifactSummary {
        path: path.to_path_buf(),
        format: artifact.format().to_string(),
        dims: decode::check(artifact).ok(),
        bytes: artifact.data().len(),
    }
}
