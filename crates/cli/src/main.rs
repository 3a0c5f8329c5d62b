//! CLI tool for building PPTX slide decks.

mod deck_file;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use deck_core::{
    BackgroundImage, DeckSession, ImageFormat, TemplateChoice, TemplateSource, ThemeDocument,
};
use deck_file::{resolve, DeckFile};
use deck_pptx::slide::EMU_PER_INCH;
use deck_pptx::{DeckReader, TemplateCache, EXPORT_FILE_NAME};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Build slide decks from a JSON deck description.
#[derive(Parser, Debug)]
#[command(name = "deck-build")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a .pptx from a deck description
    Build(BuildArgs),
    /// Suggest a built-in template for a deck description
    Suggest {
        /// Deck description (JSON)
        deck: PathBuf,
    },
    /// Show the page size and layouts of a theme document
    InspectTheme {
        /// Theme document (.pptx)
        theme: PathBuf,
    },
    /// Print the slides of a .pptx
    Inspect {
        /// Presentation (.pptx)
        input: PathBuf,
    },
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Deck description (JSON)
    deck: PathBuf,

    /// Output file or directory (default: presentation.pptx next to the description)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Theme document (.pptx) whose layouts and page size are used
    #[arg(long)]
    theme: Option<PathBuf>,

    /// Background image (PNG or JPEG) stamped on every slide
    #[arg(long)]
    background: Option<PathBuf>,

    /// Font color for all text, as #RRGGBB
    #[arg(long)]
    font_color: Option<String>,

    /// Built-in template: business, minimal or creative
    #[arg(long)]
    template: Option<String>,

    /// Print the suggested template after building
    #[arg(long)]
    print_suggestion: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match cli.command {
        Command::Build(args) => {
            let output_path = build(&args)?;
            println!("Written to: {}", output_path.display());
        }
        Command::Suggest { deck } => {
            let session = load_session(&deck)?.0;
            println!("Suggested template: {}", session.suggest_theme().name());
        }
        Command::InspectTheme { theme } => inspect_theme(&theme)?,
        Command::Inspect { input } => inspect(&input)?,
    }

    Ok(())
}

/// Read a deck description into a fresh session.
fn load_session(deck_path: &Path) -> Result<(DeckSession, DeckFile, PathBuf)> {
    let (deck, base_dir) = DeckFile::load(deck_path)?;

    let mut session = DeckSession::new();
    session.set_info(deck.info());
    for slide in deck.new_slides(&base_dir)? {
        if session.add_slide(slide).is_none() {
            log::warn!("Skipping a slide with an empty title");
        }
    }
    log::debug!(
        "Loaded {} slides from {}",
        session.store().len(),
        deck_path.display()
    );

    Ok((session, deck, base_dir))
}

/// Build one deck and return where it was written.
fn build(args: &BuildArgs) -> Result<PathBuf> {
    let (mut session, deck, base_dir) = load_session(&args.deck)?;
    let cache = TemplateCache::new();

    // Flags override the description
    if let Some(name) = args.template.as_deref().or(deck.template.as_deref()) {
        let choice = TemplateChoice::from_name(name).with_context(|| {
            format!("Unknown template '{}': expected business, minimal or creative", name)
        })?;
        session.theme_mut().set_template(TemplateSource::BuiltIn(choice));
    }

    let theme_path = args
        .theme
        .clone()
        .or_else(|| deck.theme.as_ref().map(|p| resolve(&base_dir, p)));
    if let Some(path) = theme_path {
        if args.template.is_some() || deck.template.is_some() {
            log::warn!("Theme document {} replaces the built-in template", path.display());
        }
        let doc = load_theme(&cache, &path)?;
        session.theme_mut().set_template(TemplateSource::Document(doc));
    }

    if let Some(color) = args.font_color.as_deref().or(deck.font_color.as_deref()) {
        session.theme_mut().set_font_color_hex(color)?;
    }

    let background_path = args
        .background
        .clone()
        .or_else(|| deck.background.as_ref().map(|p| resolve(&base_dir, p)));
    if let Some(path) = background_path {
        let data = std::fs::read(&path)
            .with_context(|| format!("Failed to read background {}", path.display()))?;
        let image = BackgroundImage::new(data, declared_mime(&path))
            .with_context(|| format!("Unusable background {}", path.display()))?;
        session.theme_mut().set_background_image(image);
    }

    let exported = deck_pptx::export(&session)
        .with_context(|| format!("Failed to export {}", args.deck.display()))?;

    let output_path = output_path(&base_dir, args.output.as_ref())?;
    write_output(&output_path, &exported.bytes)?;

    if args.print_suggestion {
        println!("Suggested template: {}", session.suggest_theme().name());
    }

    Ok(output_path)
}

/// Read a theme document through the cache.
fn load_theme(cache: &TemplateCache, path: &Path) -> Result<Arc<ThemeDocument>> {
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read theme {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("theme.pptx");
    Ok(cache.get_or_load(name, data)?)
}

/// MIME type implied by an image file extension.
fn declared_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension().and_then(|e| e.to_str())?.to_lowercase();
    match ext.as_str() {
        "png" => Some(ImageFormat::Png.mime_type()),
        "jpg" | "jpeg" => Some(ImageFormat::Jpeg.mime_type()),
        _ => None,
    }
}

/// Print a theme document's page size and layouts.
fn inspect_theme(path: &Path) -> Result<()> {
    let doc = load_theme(&TemplateCache::new(), path)?;

    println!(
        "{}: {} x {} EMU ({:.2} x {:.2} in)",
        doc.name,
        doc.slide_width,
        doc.slide_height,
        doc.slide_width as f64 / EMU_PER_INCH as f64,
        doc.slide_height as f64 / EMU_PER_INCH as f64
    );

    let content = doc.content_layout().map(|l| l.part_name.as_str());
    for (i, layout) in doc.layouts.iter().enumerate() {
        let placeholders: Vec<String> = layout
            .placeholders
            .iter()
            .map(|ph| match (&ph.ph_type, ph.idx) {
                (Some(t), Some(idx)) => format!("{}#{}", t, idx),
                (Some(t), None) => t.clone(),
                (None, Some(idx)) => format!("#{}", idx),
                (None, None) => "body".to_string(),
            })
            .collect();
        let marker = if Some(layout.part_name.as_str()) == content {
            "  <- content slides"
        } else {
            ""
        };
        println!("  {}: {} [{}]{}", i, layout.name, placeholders.join(", "), marker);
    }

    Ok(())
}

/// Print the slides of a presentation.
fn inspect(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let deck = DeckReader::new()
        .read(BufReader::new(file))
        .with_context(|| format!("Failed to read {}", path.display()))?;

    println!("{} slides", deck.slides.len());
    for slide in &deck.slides {
        println!("Slide {}: {}", slide.number, slide.title().unwrap_or_default());
        for shape in slide.body_shapes() {
            for paragraph in &shape.paragraphs {
                let text = paragraph.text.replace('\n', " / ");
                match paragraph.level {
                    Some(_) => println!("  • {}", text),
                    None => println!("  {}", text),
                }
            }
        }
        for picture in slide.pictures() {
            println!("  [picture {}]", picture);
        }
    }

    Ok(())
}

/// Determine the output path for the exported deck.
fn output_path(base_dir: &Path, output: Option<&PathBuf>) -> Result<PathBuf> {
    let output_path = match output {
        Some(path) if path.is_dir() => path.join(EXPORT_FILE_NAME),
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory: {}", parent.display())
                })?;
            }
            path.clone()
        }
        None => base_dir.join(EXPORT_FILE_NAME),
    };

    Ok(output_path)
}

/// Write output to a file.
fn write_output(path: &Path, content: &[u8]) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content)
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}
