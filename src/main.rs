use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use asset_compressor_rust::batch::{self, BatchItem, BatchResult};
use asset_compressor_rust::report::{compression_ratio, format_file_size, output_path};
use asset_compressor_rust::{
    compress_image_auto, compress_pdf_with_level, CompressError, CompressionLevel,
    CompressionRequest, ImageSearchPolicy, JpegEncoderAdapter, LopdfSerializer, PdfSearchPolicy,
    RefinementPolicy, TrialResult,
};
use clap::{Parser, Subcommand};

/// Compress images and PDFs, optionally toward a target size
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory for the compressed files
    #[arg(long, global = true, default_value = ".")]
    out_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Re-encode images as JPEG
    Image {
        /// Input image files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Target size in KB
        #[arg(long, conflicts_with = "auto")]
        target_kb: Option<u64>,

        /// One-shot compression to 1 MB and 1920 px
        #[arg(long)]
        auto: bool,

        /// Only accept the dimension refinement when it lands closer to the target
        #[arg(long)]
        keep_if_better: bool,
    },
    /// Re-serialize PDFs
    Pdf {
        /// Input PDF files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Target size in KB
        #[arg(long, conflicts_with = "level")]
        target_kb: Option<u64>,

        /// Preset: high, medium or low
        #[arg(long)]
        level: Option<CompressionLevel>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {:?}", args.out_dir))?;

    let start = Instant::now();
    let (inputs, result, extension) = match args.command {
        Command::Image {
            inputs,
            target_kb,
            auto,
            keep_if_better,
        } => {
            let result = match (target_kb, auto) {
                (Some(target_kb), _) => {
                    let policy = ImageSearchPolicy {
                        refinement: if keep_if_better {
                            RefinementPolicy::KeepIfBetter
                        } else {
                            RefinementPolicy::Unconditional
                        },
                        ..ImageSearchPolicy::default()
                    };
                    let items =
                        read_all(&inputs, |bytes| CompressionRequest::image(bytes, target_kb));
                    batch::compress_images(&JpegEncoderAdapter, items, &policy)
                }
                (None, true) => batch::run(
                    read_all(&inputs, |bytes| CompressionRequest::image(bytes, 1)),
                    |request| compress_image_auto(&JpegEncoderAdapter, request.source.clone()),
                ),
                (None, false) => bail!("either --target-kb or --auto is required"),
            };
            (inputs, result, Some("jpg"))
        }
        Command::Pdf {
            inputs,
            target_kb,
            level,
        } => {
            let result = match (target_kb, level) {
                (Some(target_kb), _) => batch::compress_pdfs(
                    &LopdfSerializer,
                    read_all(&inputs, |bytes| CompressionRequest::pdf(bytes, target_kb)),
                    &PdfSearchPolicy::default(),
                ),
                (None, level) => {
                    let level = level.unwrap_or_default();
                    batch::run(
                        read_all(&inputs, |bytes| CompressionRequest::pdf(bytes, 1)),
                        |request| compress_pdf_with_level(&LopdfSerializer, &request.source, level),
                    )
                }
            };
            (inputs, result, None)
        }
    };
    println!("Processed {} files in {:.2?}", inputs.len(), start.elapsed());

    write_outputs(&args.out_dir, &inputs, &result, extension)?;

    if !result.is_empty() && result.succeeded() == 0 {
        bail!("every input failed");
    }
    Ok(())
}

fn read_all<F>(inputs: &[PathBuf], build: F) -> Vec<BatchItem>
where
    F: Fn(Vec<u8>) -> asset_compressor_rust::Result<CompressionRequest>,
{
    inputs
        .iter()
        .map(|path| {
            std::fs::read(path)
                .map_err(|e| CompressError::AssetLoadFailed(format!("{:?}: {}", path, e)))
                .and_then(&build)
        })
        .collect()
}

fn write_outputs(
    out_dir: &Path,
    inputs: &[PathBuf],
    result: &BatchResult,
    extension: Option<&str>,
) -> Result<()> {
    for (input, item) in inputs.iter().zip(&result.items) {
        match item {
            Ok(trial) => write_one(out_dir, input, trial, extension)?,
            Err(e) => eprintln!("{}: {}", input.display(), e),
        }
    }
    println!("{} ok, {} failed", result.succeeded(), result.failed());
    Ok(())
}

fn write_one(
    out_dir: &Path,
    input: &Path,
    trial: &TrialResult,
    extension: Option<&str>,
) -> Result<()> {
    let original = std::fs::metadata(input)?.len();
    let path = output_path(out_dir, input, extension);
    std::fs::write(&path, &trial.output_bytes[..])
        .with_context(|| format!("Failed to write {:?}", path))?;
    println!(
        "{} -> {}: {} -> {} ({})",
        input.display(),
        path.display(),
        format_file_size(original),
        format_file_size(trial.output_size_bytes),
        compression_ratio(original, trial.output_size_bytes)
    );
    Ok(())
}
