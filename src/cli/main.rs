use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use cropping_picker::config::{self, MediaType};
use cropping_picker::host::{
    CropHost, CropOutcome, CropRequest, Selection, SelectionHost, SelectionRequest,
};
use cropping_picker::item::{CropRect, MediaItem};
use cropping_picker::media::{self, MediaKind};
use cropping_picker::picker::Picker;

#[derive(Parser, Debug)]
#[command(
    name = "cropping-picker",
    version,
    about = "Pick, compress and crop images and videos from the filesystem, printing normalized JSON results"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to config file (default: picker.json next to binary)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Initialize a default picker.json and exit
    #[arg(long)]
    init: bool,

    /// Per-call options as a JSON object, e.g. '{"includeExif":true}'
    #[arg(short, long, value_name = "JSON", global = true)]
    options: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Select media files (directories are walked recursively)
    Pick {
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        /// Return every found file instead of the first one
        #[arg(short, long)]
        multiple: bool,

        /// Crop rectangle used when cropping is enabled: x,y,width,height
        #[arg(long, value_parser = parse_rect)]
        rect: Option<CropRect>,
    },
    /// Crop one image
    Crop {
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Crop rectangle: x,y,width,height (default: whole image)
        #[arg(long, value_parser = parse_rect)]
        rect: Option<CropRect>,
    },
    /// Remove every file in the scratch directory
    Clean,
    /// Remove one previously produced file
    CleanSingle {
        #[arg(value_name = "PATH")]
        path: String,
    },
}

fn parse_rect(s: &str) -> Result<CropRect, String> {
    let parts: Vec<i64> = s
        .split(',')
        .map(|p| p.trim().parse::<i64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid rectangle '{s}': {e}"))?;
    match parts.as_slice() {
        [x, y, width, height] if *width > 0 && *height > 0 => Ok(CropRect {
            x: *x,
            y: *y,
            width: *width,
            height: *height,
        }),
        _ => Err(format!("expected x,y,width,height with positive size, got '{s}'")),
    }
}

/// "Library" backed by files and directories given on the command line.
struct FileSelection {
    paths: Vec<PathBuf>,
}

#[async_trait::async_trait]
impl SelectionHost for FileSelection {
    async fn present(&self, request: &SelectionRequest) -> Result<Selection> {
        let mut found: Vec<_> = media::collect_media(&self.paths)
            .into_iter()
            .filter(|p| matches_type(p, request.media_type))
            .map(cropping_picker::host::MediaRef::from_path)
            .collect();

        if !request.multiple {
            found.truncate(1);
        } else if request.max_files > 0 {
            found.truncate(request.max_files as usize);
        }
        log::debug!("Selected {} file(s)", found.len());
        Ok(Selection::Selected(found))
    }
}

fn matches_type(path: &std::path::Path, media_type: MediaType) -> bool {
    let kind = media::mime_from_extension(path).and_then(MediaKind::from_mime);
    match media_type {
        MediaType::Any => kind.is_some(),
        MediaType::Photo => matches!(kind, Some(MediaKind::Image | MediaKind::Gif)),
        MediaType::Video => kind == Some(MediaKind::Video),
    }
}

/// Crops to a fixed rectangle, clamped to the image bounds.
struct RectCrop {
    rect: Option<CropRect>,
}

#[async_trait::async_trait]
impl CropHost for RectCrop {
    async fn crop(&self, request: &CropRequest) -> Result<CropOutcome> {
        let img = image::open(&request.source)
            .with_context(|| format!("Failed to open {}", request.source.display()))?;
        let (w, h) = (img.width() as i64, img.height() as i64);

        let rect = self.rect.unwrap_or(CropRect {
            x: 0,
            y: 0,
            width: w,
            height: h,
        });
        let x = rect.x.clamp(0, w - 1);
        let y = rect.y.clamp(0, h - 1);
        let cw = rect.width.min(w - x).max(1);
        let ch = rect.height.min(h - y).max(1);

        log::info!("Cropping {} to {cw}x{ch}+{x}+{y}", request.source.display());
        img.crop_imm(x as u32, y as u32, cw as u32, ch as u32)
            .to_rgb8()
            .save_with_format(&request.output, image::ImageFormat::Jpeg)
            .with_context(|| format!("Failed to write {}", request.output.display()))?;

        Ok(CropOutcome::Cropped {
            path: request.output.clone(),
            rect: CropRect {
                x,
                y,
                width: cw,
                height: ch,
            },
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = config::Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    let Some(command) = cli.command else {
        anyhow::bail!("No command specified. Use --help for usage.");
    };

    let config = config::Config::load(cli.config.as_deref())?;
    let mut options: serde_json::Value = match &cli.options {
        Some(raw) => serde_json::from_str(raw).context("--options must be a JSON object")?,
        None => serde_json::json!({}),
    };
    if !options.is_object() {
        anyhow::bail!("--options must be a JSON object");
    }

    match command {
        Command::Pick {
            paths,
            multiple,
            rect,
        } => {
            if multiple {
                options["multiple"] = true.into();
            }
            let picker = Picker::builder(
                Arc::new(FileSelection { paths }),
                Arc::new(RectCrop { rect }),
            )
            .config(config)
            .build();

            let payload = picker.open_picker(&options).await?;
            let items = payload.clone().into_items();
            log_items(&items);
            print_json(&payload)?;
        }
        Command::Crop { path, rect } => {
            options["path"] = path.to_string_lossy().into_owned().into();
            let picker = Picker::builder(
                Arc::new(FileSelection { paths: Vec::new() }),
                Arc::new(RectCrop { rect }),
            )
            .config(config)
            .build();

            let item = picker.open_cropper(&options).await?;
            log_items(std::slice::from_ref(&item));
            print_json(&item)?;
        }
        Command::Clean => {
            let picker = idle_picker(config);
            picker.clean().await?;
            println!("Cleaned {}", picker.store().dir().display());
        }
        Command::CleanSingle { path } => {
            idle_picker(config).clean_single(&path).await?;
            println!("Removed {path}");
        }
    }

    Ok(())
}

fn idle_picker(config: config::Config) -> Picker {
    Picker::builder(
        Arc::new(FileSelection { paths: Vec::new() }),
        Arc::new(RectCrop { rect: None }),
    )
    .config(config)
    .build()
}

fn log_items(items: &[MediaItem]) {
    for item in items {
        log::info!(
            "{} {}x{} {} ({} bytes)",
            item.local_path(),
            item.width,
            item.height,
            item.mime,
            item.size.unwrap_or(0)
        );
    }
    log::info!("Done: {} item(s)", items.len());
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
