use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use easel::{
    ExportFormat, Invert, Paint, Posterize, RenderSettings, Rgba8, Solarize, Surface,
    TableImageFilter, Viewport,
};

const DEFAULT_JPEG_QUALITY: u8 = 90;

#[derive(Parser, Debug)]
#[command(name = "easel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a viewport record to an image.
    Render(RenderArgs),
    /// Apply a table filter to an image.
    Filter(FilterArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Png,
    Jpeg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FilterKind {
    Solarize,
    Invert,
    Posterize,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input viewport JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output image path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, value_enum, default_value_t = FormatArg::Png)]
    format: FormatArg,

    /// JPEG quality 1..=100 (defaults to $EASEL_JPEG_QUALITY, then 90).
    #[arg(long)]
    quality: Option<u8>,

    /// Override the pixel width stored in the record.
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Override the pixel height stored in the record.
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Solid background (#RRGGBB or #RRGGBBAA) composited beneath the scene.
    #[arg(long)]
    background: Option<String>,
}

#[derive(Parser, Debug)]
struct FilterArgs {
    /// Input image (any format `image` can decode).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, value_enum)]
    kind: FilterKind,

    /// Posterize levels, 2..=256.
    #[arg(long, default_value_t = 4)]
    levels: u16,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Filter(args) => cmd_filter(args),
    }
}

fn jpeg_quality(flag: Option<u8>) -> anyhow::Result<u8> {
    if let Some(q) = flag {
        return Ok(q);
    }
    match std::env::var("EASEL_JPEG_QUALITY") {
        Ok(raw) => raw
            .trim()
            .parse::<u8>()
            .with_context(|| format!("parse EASEL_JPEG_QUALITY '{raw}'")),
        Err(_) => Ok(DEFAULT_JPEG_QUALITY),
    }
}

fn ensure_parent_dir(path: &std::path::Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut vp = Viewport::from_path(&args.in_path)
        .with_context(|| format!("load viewport '{}'", args.in_path.display()))?;

    if let (Some(w), Some(h)) = (args.width, args.height) {
        vp.set_pixel_size(w, h)?;
    }
    let include_background = match &args.background {
        Some(hex) => {
            let color = Rgba8::parse_hex(hex)?;
            vp.set_background_layer(Surface::new().with_settings(RenderSettings {
                clear_rgba: Some(color),
                ..RenderSettings::default()
            }))?;
            true
        }
        None => false,
    };

    let format = match args.format {
        FormatArg::Png => ExportFormat::Png,
        FormatArg::Jpeg => ExportFormat::jpeg(jpeg_quality(args.quality)?),
    };

    vp.draw();
    let bytes = vp.export_image(format, include_background)?;

    ensure_parent_dir(&args.out)?;
    std::fs::write(&args.out, bytes)
        .with_context(|| format!("write image '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_filter(args: FilterArgs) -> anyhow::Result<()> {
    let img = image::open(&args.in_path)
        .with_context(|| format!("decode image '{}'", args.in_path.display()))?;
    let mut rgba = img.to_rgba8();

    match args.kind {
        FilterKind::Solarize => TableImageFilter::new(Solarize).apply(&mut rgba)?,
        FilterKind::Invert => TableImageFilter::new(Invert).apply(&mut rgba)?,
        FilterKind::Posterize => {
            TableImageFilter::new(Posterize::new(args.levels)).apply(&mut rgba)?
        }
    }

    ensure_parent_dir(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        &rgba,
        rgba.width(),
        rgba.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
