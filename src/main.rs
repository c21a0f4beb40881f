// ABOUTME: Main entry point for the mdslides program.
// ABOUTME: Provides CLI interface and executes commands from the library.

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use mdslides::{
    Config, ConversionSummary, EngineKind, Stylesheet, ThemeConfig, WatchConfig, docs, render,
    resources,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output (-v for progress, -vv for debug detail)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert markdown sources to Marp decks
    MdToMarp(MdToMarpArgs),

    /// Render Marp decks to PDF with the Marp CLI
    MarpToPdf(MarpToPdfArgs),

    /// Render markdown sources to A4 PDF documents (slide breaks removed)
    DocsToPdf(DocsToPdfArgs),

    /// Render the theme's program.md to PDF
    ProgramToPdf(ProgramToPdfArgs),

    /// Watch markdown sources and regenerate decks on change
    Watch(WatchArgs),
}

#[derive(Args)]
struct VisualArgs {
    /// Theme name written to the Marp front matter
    #[arg(short, long)]
    theme: Option<String>,

    /// Upper-left logo image
    #[arg(long)]
    logo_left: Option<PathBuf>,

    /// Upper-right logo image
    #[arg(long)]
    logo_right: Option<PathBuf>,

    /// Slide background image
    #[arg(long)]
    background: Option<PathBuf>,

    /// Header text shown at the top of each slide
    #[arg(long)]
    header: Option<String>,

    /// Footer text shown at the bottom of each slide
    #[arg(long)]
    footer: Option<String>,
}

#[derive(Args)]
struct MdToMarpArgs {
    /// Directory with markdown sources, relative to the project directory
    #[arg(default_value = "presentation/md_src")]
    md_src: PathBuf,

    /// Output directory for Marp decks, relative to the project directory
    #[arg(short, long, default_value = "presentation/marp_slides")]
    output: PathBuf,

    #[command(flatten)]
    visuals: VisualArgs,

    /// Stylesheet inlined into every deck (default: presentation/style.css if present)
    #[arg(short, long)]
    style: Option<PathBuf>,

    /// Program file converted alongside the sources (default: program.md if present)
    #[arg(short, long)]
    program: Option<PathBuf>,

    /// Project directory that relative paths are resolved against
    #[arg(long, default_value = ".")]
    project_dir: PathBuf,
}

#[derive(Args)]
struct MarpToPdfArgs {
    /// Directory with Marp decks (resolved under <project>/presentation/ unless it starts with presentation/)
    #[arg(default_value = "presentation/marp_slides")]
    input: String,

    /// Output directory for PDFs (default: presentation/pdf_slides)
    #[arg(short, long)]
    output: Option<String>,

    /// Theme name; <project>/<THEME>.css is passed to Marp when it exists
    #[arg(short, long)]
    theme: Option<String>,

    /// Project directory that relative paths are resolved against
    #[arg(long, default_value = ".")]
    project_dir: PathBuf,

    /// Marp CLI executable (overrides MARP_PATH)
    #[arg(long)]
    marp_bin: Option<PathBuf>,
}

#[derive(Args)]
struct EngineArgs {
    /// PDF engine to try, in order; repeatable (default: weasyprint, chrome, wkhtmltopdf)
    #[arg(long = "engine")]
    engines: Vec<EngineKind>,

    /// Stylesheet path or URL overriding the theme lookup
    #[arg(long)]
    css: Option<String>,
}

#[derive(Args)]
struct DocsToPdfArgs {
    /// Theme directory containing presentation/md_src/
    theme_path: PathBuf,

    /// Output directory (default: <theme>/presentation/pdf_docs)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory searched for a4-docs-theme.css (overrides SCRIPTS_DIR)
    #[arg(long)]
    scripts_dir: Option<PathBuf>,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Args)]
struct ProgramToPdfArgs {
    /// Theme directory containing program.md
    theme_path: PathBuf,

    /// Output PDF path (default: <theme>/program.pdf)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Args)]
struct WatchArgs {
    #[command(flatten)]
    marp: MdToMarpArgs,

    /// Also render slide PDFs into this directory after each rebuild
    #[arg(long)]
    pdf_output: Option<String>,

    /// Marp CLI executable (overrides MARP_PATH)
    #[arg(long)]
    marp_bin: Option<PathBuf>,

    /// Debounce time in milliseconds
    #[arg(long, default_value_t = 500)]
    debounce_ms: u64,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(cli: &Cli) -> anyhow::Result<bool> {
    let config = Config::from_env();

    match &cli.command {
        Commands::MdToMarp(args) => md_to_marp(args),
        Commands::MarpToPdf(args) => marp_to_pdf(args, config),
        Commands::DocsToPdf(args) => docs_to_pdf(args, config),
        Commands::ProgramToPdf(args) => program_to_pdf(args, config),
        Commands::Watch(args) => watch(args, config),
    }
}

/// Paths under `presentation/` are taken from the project root, others from `<project>/presentation/`.
fn presentation_path(project_dir: &Path, arg: &str) -> PathBuf {
    if arg.starts_with("presentation/") || Path::new(arg).is_absolute() {
        project_dir.join(arg)
    } else {
        project_dir.join("presentation").join(arg)
    }
}

/// Explicit path under the project, else `default` under the project when it exists.
fn optional_project_file(project_dir: &Path, explicit: Option<&Path>, default: &str) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(project_dir.join(path)),
        None => Some(project_dir.join(default)).filter(|p| p.is_file()),
    }
}

fn theme_config(args: &MdToMarpArgs) -> ThemeConfig {
    let visuals = &args.visuals;
    ThemeConfig {
        theme: visuals.theme.clone(),
        logo_left: visuals.logo_left.clone(),
        logo_right: visuals.logo_right.clone(),
        background: visuals.background.clone(),
        header_text: visuals.header.clone(),
        footer_text: visuals.footer.clone(),
        stylesheet: optional_project_file(
            &args.project_dir,
            args.style.as_deref(),
            "presentation/style.css",
        ),
    }
}

fn report(summary: &ConversionSummary, what: &str, output_dir: &Path) -> bool {
    println!("{}", summary.summary_line());
    if summary.succeeded() > 0 {
        println!("{} generated in: {}", what, output_dir.display());
    }

    if summary.is_complete() {
        println!("✅ All conversions completed successfully!");
        true
    } else {
        println!("❌ Some conversions failed!");
        false
    }
}

fn md_to_marp(args: &MdToMarpArgs) -> anyhow::Result<bool> {
    let md_src = args.project_dir.join(&args.md_src);
    let marp_dir = args.project_dir.join(&args.output);
    let program = optional_project_file(&args.project_dir, args.program.as_deref(), "program.md");

    let summary = mdslides::convert_md_to_marp(&md_src, &marp_dir, &theme_config(args), program.as_deref())?;
    Ok(report(&summary, "Marp decks", &marp_dir))
}

fn marp_to_pdf(args: &MarpToPdfArgs, mut config: Config) -> anyhow::Result<bool> {
    if let Some(marp_bin) = &args.marp_bin {
        config.marp_path = marp_bin.clone();
    }

    let input = presentation_path(&args.project_dir, &args.input);
    let output = presentation_path(
        &args.project_dir,
        args.output.as_deref().unwrap_or("presentation/pdf_slides"),
    );
    let theme_css = render::resolve_theme_css(&args.project_dir, args.theme.as_deref());

    let summary = mdslides::generate_pdfs_from_marp(
        &input,
        &output,
        theme_css.as_deref(),
        &config.marp_renderer(),
    )?;
    Ok(report(&summary, "Slide PDFs", &output))
}

fn pdf_config(config: Config) -> anyhow::Result<Config> {
    config
        .with_pdf_settings_from_env()
        .context("Invalid PDF engine configuration")
}

fn apply_engine_args(config: &mut Config, args: &EngineArgs) {
    if !args.engines.is_empty() {
        config.pdf_engines = args.engines.clone();
    }
}

fn docs_to_pdf(args: &DocsToPdfArgs, config: Config) -> anyhow::Result<bool> {
    let mut config = pdf_config(config)?;
    apply_engine_args(&mut config, &args.engine);
    if let Some(dir) = &args.scripts_dir {
        config.scripts_dir = Some(dir.clone());
    }

    let stylesheet = match &args.engine.css {
        Some(location) => Stylesheet::from_location(location),
        None => resources::find_docs_stylesheet(config.scripts_dir().as_deref()),
    };

    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| docs::pdf_docs_dir(&args.theme_path));

    let summary = mdslides::convert_all_md_files(
        &args.theme_path,
        Some(&output_dir),
        &stylesheet,
        &config.pdf_renderer(),
    )?;
    Ok(report(&summary, "PDF documents", &output_dir))
}

fn program_to_pdf(args: &ProgramToPdfArgs, config: Config) -> anyhow::Result<bool> {
    let mut config = pdf_config(config)?;
    apply_engine_args(&mut config, &args.engine);

    let stylesheet = match &args.engine.css {
        Some(location) => Stylesheet::from_location(location),
        None => resources::find_program_stylesheet(&args.theme_path),
    };

    match mdslides::convert_program_to_pdf(
        &args.theme_path,
        args.output.as_deref(),
        &stylesheet,
        &config.pdf_renderer(),
    ) {
        Ok(output) => {
            println!("Conversion completed successfully: {}", output.display());
            Ok(true)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            println!("Conversion failed!");
            Ok(false)
        }
    }
}

fn watch(args: &WatchArgs, mut config: Config) -> anyhow::Result<bool> {
    if let Some(marp_bin) = &args.marp_bin {
        config.marp_path = marp_bin.clone();
    }

    let marp = &args.marp;
    let watch_config = WatchConfig {
        md_src_dir: marp.project_dir.join(&marp.md_src),
        marp_dir: marp.project_dir.join(&marp.output),
        pdf_dir: args
            .pdf_output
            .as_deref()
            .map(|dir| presentation_path(&marp.project_dir, dir)),
        theme_css: render::resolve_theme_css(&marp.project_dir, marp.visuals.theme.as_deref()),
        program_file: optional_project_file(&marp.project_dir, marp.program.as_deref(), "program.md"),
        theme: theme_config(marp),
        debounce_ms: args.debounce_ms,
    };

    mdslides::watch_sources(watch_config, &config.marp_renderer())?;
    Ok(true)
}
