use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::{Parser, Subcommand};
use jericho_core::{
    DEFAULT_FILENAME, DEFAULT_MAX_SIZE_BYTES, Extension, ValidImage, ValidationOptions,
    ValidationResult, Validator,
};
use serde_json::json;

/// Exit status for a payload that is not a valid image
const EXIT_INVALID: i32 = 2;

#[derive(Debug, Parser)]
#[command(name = "jericho")]
#[command(about = "Validate base64 data-URL images and emit a canonical, metadata-free copy")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate a data URL read from a file or stdin
    Validate {
        /// File holding the data URL ("-" for stdin)
        #[arg(default_value = "-")]
        input: PathBuf,

        /// Filename for the validated image; any extension is discarded
        #[arg(long, default_value = DEFAULT_FILENAME)]
        filename: String,

        /// Maximum estimated decoded size in bytes
        #[arg(long, env = "JERICHO_MAX_SIZE", default_value_t = DEFAULT_MAX_SIZE_BYTES)]
        max_size: usize,

        /// Disable the size limit entirely
        #[arg(long, conflicts_with = "max_size")]
        no_limit: bool,

        /// Print the store record as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Wrap an image file as a data URL
    Encode {
        /// Image file to wrap
        path: PathBuf,

        /// MIME type to announce (default: inferred from the file extension)
        #[arg(long)]
        mime: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.cmd {
        Command::Validate {
            input,
            filename,
            max_size,
            no_limit,
            json,
        } => {
            let max_size = if *no_limit { None } else { Some(*max_size) };
            let valid = cmd_validate(input, filename, max_size, *json)?;
            if !valid {
                std::process::exit(EXIT_INVALID);
            }
            Ok(())
        }
        Command::Encode { path, mime } => cmd_encode(path, mime.as_deref()),
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn read_input(input: &Path) -> anyhow::Result<String> {
    let mut raw = if input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read data URL from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("read data URL from {}", input.display()))?
    };
    tracing::debug!("read {} bytes of input", raw.len());

    // Files usually end with a newline the client never sent
    let trimmed_len = raw.trim_end().len();
    raw.truncate(trimmed_len);
    Ok(raw)
}

/// Pick the extension to announce for `path`
fn extension_for(path: &Path, mime: Option<&str>) -> anyhow::Result<Extension> {
    if let Some(mime) = mime {
        let subtype = mime
            .trim()
            .strip_prefix("image/")
            .ok_or_else(|| anyhow!("not an image MIME type: {mime}"))?;
        return subtype
            .parse()
            .with_context(|| format!("unsupported MIME type: {mime}"));
    }

    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| anyhow!("cannot infer type of {}; pass --mime", path.display()))?;
    ext.parse()
        .with_context(|| format!("unsupported file extension: {ext}"))
}

fn summary(image: &ValidImage) -> serde_json::Value {
    json!({
        "valid": true,
        "size_bytes": image.size_bytes(),
        "dimensions": [image.dimensions().width, image.dimensions().height],
        "filename": image.filename(),
        "extension": image.extension(),
        "format_prefix": image.format_prefix(),
    })
}

fn print(v: serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(&v).expect("json encode"));
}

// ── Commands ────────────────────────────────────────────────────────────────

fn cmd_validate(
    input: &Path,
    filename: &str,
    max_size: Option<usize>,
    as_json: bool,
) -> anyhow::Result<bool> {
    let raw = read_input(input)?;
    let validator = Validator::new(ValidationOptions::with_max_size(max_size));
    tracing::debug!(
        "validating with max size {:?}",
        validator.options().max_size_bytes
    );

    let result = validator
        .validate(&raw, filename)
        .context("image rejected")?;

    match result {
        ValidationResult::Valid(image) => {
            if as_json {
                print(serde_json::to_value(image.store_record())?);
            } else {
                print(summary(&image));
            }
            Ok(true)
        }
        ValidationResult::Invalid => {
            print(json!({ "valid": false }));
            Ok(false)
        }
    }
}

fn cmd_encode(path: &Path, mime: Option<&str>) -> anyhow::Result<()> {
    let extension = extension_for(path, mime)?;
    let data = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    println!("{}{}", extension.data_url_prefix(), STANDARD.encode(data));
    Ok(())
}
