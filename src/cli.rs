use crate::config::{Alignment, LayoutOptions, SortMode};
use crate::envelope::{request_id, Envelope, Metrics, StageMetrics, Warning};
use crate::error::AppError;
use crate::import::{self, filter_roots, ImportOptions, ImportResult, InputFormat};
use crate::layout::{layout_trees, LayoutResult};
use crate::layout_dump::write_layout_dump;
use crate::model::ModelSummary;
use crate::render::{render_svg, wrap_html};
use crate::text_metrics;
use crate::theme::{resolve_theme, Theme, ThemeOverrides};
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(
    name = "bcmr",
    version,
    about = "Business capability map renderer (JSON/CSV in, SVG/HTML/PNG out)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import a capability model, lay it out, and export artefacts
    Render(RenderArgs),
    /// Detect schema and fields and summarize the model without rendering
    Inspect(InspectArgs),
    /// Validate the model (cycles, duplicate ids) without rendering
    Validate(ValidateArgs),
    /// Print the CLI contract (commands, flags, error codes, defaults) as JSON
    Guide,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Input file (.json/.csv/.tsv) or '-' for stdin
    pub input: Option<PathBuf>,

    /// Override auto-detected name field
    #[arg(long)]
    pub name_field: Option<String>,

    /// Override auto-detected description field
    #[arg(long)]
    pub desc_field: Option<String>,

    /// Override auto-detected children field
    #[arg(long)]
    pub children_field: Option<String>,

    /// Override auto-detected parent field
    #[arg(long)]
    pub parent_field: Option<String>,

    /// Override auto-detected id field
    #[arg(long)]
    pub id_field: Option<String>,

    /// Override auto-detected level field for CSV hierarchy inference
    #[arg(long)]
    pub level_field: Option<String>,

    /// Explicit property to unwrap from a wrapper object
    #[arg(long)]
    pub unwrap: Option<String>,

    /// Input format (auto-detected from extension if omitted)
    #[arg(long, value_enum)]
    pub format: Option<InputFormat>,

    /// Select specific root by id or name (repeatable)
    #[arg(long = "root")]
    pub roots: Vec<String>,
}

impl ImportArgs {
    fn input_path(&self) -> Option<&Path> {
        match &self.input {
            Some(path) if path.as_os_str() != "-" => Some(path.as_path()),
            _ => None,
        }
    }

    fn to_options(&self) -> ImportOptions {
        ImportOptions {
            name_field: self.name_field.clone(),
            desc_field: self.desc_field.clone(),
            children_field: self.children_field.clone(),
            parent_field: self.parent_field.clone(),
            id_field: self.id_field.clone(),
            level_field: self.level_field.clone(),
            unwrap: self.unwrap.clone(),
            format: self.format,
            roots: self.roots.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct LayoutArgs {
    /// Element gap in px
    #[arg(long, default_value_t = 8.0)]
    pub gap: f32,

    /// Container padding in px
    #[arg(long, default_value_t = 12.0)]
    pub padding: f32,

    /// Container header height in px
    #[arg(long, default_value_t = 48.0)]
    pub header_height: f32,

    /// Gap between root trees in px
    #[arg(long, default_value_t = 30.0)]
    pub root_gap: f32,

    /// View margin in px
    #[arg(long = "margin", default_value_t = 20.0)]
    pub view_margin: f32,

    /// Target aspect ratio
    #[arg(long, default_value_t = 1.6)]
    pub aspect_ratio: f32,

    /// Row alignment
    #[arg(long, value_enum, default_value = "center")]
    pub alignment: Alignment,

    /// Maximum depth to render (integer, or 'all' for unlimited)
    #[arg(long, default_value = "all", value_parser = parse_max_depth)]
    pub max_depth: i32,

    /// Child sort mode
    #[arg(long = "sort", value_enum, default_value = "subtrees")]
    pub sort_mode: SortMode,

    /// Minimum leaf card width in px
    #[arg(long, default_value_t = 120.0)]
    pub min_leaf_width: f32,

    /// Maximum leaf card width in px
    #[arg(long, default_value_t = 200.0)]
    pub max_leaf_width: f32,

    /// Leaf card height in px
    #[arg(long, default_value_t = 55.0)]
    pub leaf_height: f32,
}

impl LayoutArgs {
    fn to_options(&self) -> Result<LayoutOptions, AppError> {
        if self.max_leaf_width < self.min_leaf_width {
            return Err(AppError::InvalidOption {
                message: format!(
                    "max-leaf-width ({}) must be >= min-leaf-width ({})",
                    self.max_leaf_width, self.min_leaf_width
                ),
            });
        }
        for (name, value) in [
            ("gap", self.gap),
            ("padding", self.padding),
            ("header-height", self.header_height),
            ("root-gap", self.root_gap),
            ("margin", self.view_margin),
            ("aspect-ratio", self.aspect_ratio),
            ("min-leaf-width", self.min_leaf_width),
            ("max-leaf-width", self.max_leaf_width),
            ("leaf-height", self.leaf_height),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::InvalidOption {
                    message: format!("{name} must be a non-negative finite number"),
                });
            }
        }
        Ok(LayoutOptions {
            gap: self.gap,
            padding: self.padding,
            header_height: self.header_height,
            root_gap: self.root_gap,
            view_margin: self.view_margin,
            aspect_ratio: self.aspect_ratio,
            alignment: self.alignment,
            max_depth: self.max_depth,
            sort_mode: self.sort_mode,
            min_leaf_width: self.min_leaf_width,
            max_leaf_width: self.max_leaf_width,
            leaf_height: self.leaf_height,
        })
    }
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub import: ImportArgs,

    #[command(flatten)]
    pub layout: LayoutArgs,

    /// Theme JSON5 file
    #[arg(long)]
    pub theme: Option<PathBuf>,

    /// Font family override
    #[arg(long)]
    pub font: Option<String>,

    /// Font size override in pt
    #[arg(long)]
    pub font_size: Option<f32>,

    /// Measure labels with system font metrics instead of the stub ruler
    #[arg(long)]
    pub font_metrics: bool,

    /// Output directory
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Skip the SVG artefact
    #[arg(long)]
    pub no_svg: bool,

    /// Also write an HTML page
    #[arg(long)]
    pub html: bool,

    /// Also write a PNG (requires the png feature)
    #[arg(long)]
    pub png: bool,

    /// PNG pixel density scale
    #[arg(long, default_value_t = 2.0)]
    pub scale: f32,

    /// Write the computed layout as JSON for debugging
    #[arg(long)]
    pub dump_layout: Option<PathBuf>,

    /// Compute layout and report the summary without writing files
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub import: ImportArgs,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub import: ImportArgs,
}

fn parse_max_depth(value: &str) -> Result<i32, String> {
    if value.eq_ignore_ascii_case("all") {
        return Ok(-1);
    }
    value
        .parse::<i32>()
        .map_err(|_| format!("expected an integer or 'all', got \"{value}\""))
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let exit_code = match cli.command {
        Command::Render(args) => run_render(&args),
        Command::Inspect(args) => run_inspect(&args),
        Command::Validate(args) => run_validate(&args),
        Command::Guide => run_guide(),
    };
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}

fn write_envelope<T: Serialize>(envelope: &Envelope<T>) {
    match serde_json::to_string_pretty(envelope) {
        Ok(text) => println!("{text}"),
        Err(err) => eprintln!("error: failed to serialize envelope: {err}"),
    }
}

fn metrics(start: Instant, stages: StageMetrics) -> Metrics {
    Metrics {
        duration_ms: start.elapsed().as_millis() as u64,
        stages,
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

// ---------------------------------------------------------------------------
// render
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct Artefact {
    #[serde(rename = "type")]
    kind: &'static str,
    path: String,
    bytes: u64,
}

#[derive(Debug, Serialize)]
struct LayoutSummary {
    total_width: f32,
    total_height: f32,
    leaf_width: f32,
    leaf_height: f32,
}

#[derive(Debug, Serialize)]
struct RenderOutcome {
    artefacts: Vec<Artefact>,
    model_summary: ModelSummary,
    layout_summary: LayoutSummary,
}

fn run_render(args: &RenderArgs) -> i32 {
    let start = Instant::now();
    let rid = request_id();
    let mut stages = StageMetrics::default();

    match render_pipeline(args, &mut stages) {
        Ok((outcome, warnings)) => {
            write_envelope(&Envelope::success(
                "bcm.render",
                rid,
                outcome,
                warnings,
                metrics(start, stages),
            ));
            0
        }
        Err(err) => {
            write_envelope(&Envelope::<RenderOutcome>::failure(
                "bcm.render",
                rid,
                &err,
                metrics(start, stages),
            ));
            err.exit_code()
        }
    }
}

fn import_stage(
    import_args: &ImportArgs,
    stages: &mut StageMetrics,
) -> Result<(ImportResult, Vec<Warning>), AppError> {
    let import_start = Instant::now();
    let path = import_args.input_path();
    let raw = import::read_input(path)?;
    let mut result = import::import_data(&raw, &import_args.to_options(), path)?;

    let mut warnings = std::mem::take(&mut result.warnings);
    if !import_args.roots.is_empty() {
        let (filtered, root_warnings) =
            filter_roots(std::mem::take(&mut result.roots), &import_args.roots);
        result.roots = filtered;
        result.summary = crate::model::summarize(&result.roots);
        warnings.extend(root_warnings);
    }
    stages.import_ms = Some(elapsed_ms(import_start));
    Ok((result, warnings))
}

fn layout_stage(
    import_result: &ImportResult,
    options: &LayoutOptions,
    theme: &Theme,
    use_font_metrics: bool,
    warnings: &mut Vec<Warning>,
    stages: &mut StageMetrics,
) -> LayoutResult {
    let layout_start = Instant::now();

    let font_family = theme.leaf_font.family.clone();
    let font_size = theme.leaf_font.size;
    let font_available = use_font_metrics
        && text_metrics::measure_text_width("x", font_size, &font_family).is_some();
    if use_font_metrics && !font_available {
        warnings.push(Warning::new(
            "WARN_FONT_FALLBACK",
            format!("no system font matched \"{font_family}\"; using stub metrics"),
        ));
    }

    let measure = move |text: &str| {
        if font_available
            && let Some(width) = text_metrics::measure_text_width(text, font_size, &font_family)
        {
            return width;
        }
        text_metrics::stub_measure(text)
    };

    let layout = layout_trees(&import_result.roots, options, measure);
    stages.layout_ms = Some(elapsed_ms(layout_start));
    layout
}

fn render_pipeline(
    args: &RenderArgs,
    stages: &mut StageMetrics,
) -> Result<(RenderOutcome, Vec<Warning>), AppError> {
    let (import_result, mut warnings) = import_stage(&args.import, stages)?;

    let options = args.layout.to_options()?;
    let theme = resolve_theme(
        &ThemeOverrides {
            font: args.font.clone(),
            font_size: args.font_size,
            ..Default::default()
        },
        args.theme.as_deref(),
    )?;

    let layout = layout_stage(
        &import_result,
        &options,
        &theme,
        args.font_metrics,
        &mut warnings,
        stages,
    );

    let render_start = Instant::now();
    let svg = render_svg(&layout, &theme, &options);
    let html = wrap_html(&svg, layout.total_width, layout.total_height, &theme);
    stages.render_ms = Some(elapsed_ms(render_start));

    let export_start = Instant::now();
    let mut artefacts: Vec<Artefact> = Vec::new();
    let base_name = args
        .import
        .input_path()
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .unwrap_or("capability-map")
        .to_string();

    if let Some(dump_path) = &args.dump_layout {
        write_layout_dump(dump_path, &layout).map_err(|err| AppError::Write {
            path: dump_path.clone(),
            source: std::io::Error::other(err.to_string()),
        })?;
    }

    if !args.dry_run {
        if !args.no_svg {
            let path = args.out_dir.join(format!("{base_name}.svg"));
            atomic_write(&path, svg.as_bytes())?;
            artefacts.push(Artefact {
                kind: "svg",
                path: path.display().to_string(),
                bytes: svg.len() as u64,
            });
        }
        if args.html {
            let path = args.out_dir.join(format!("{base_name}.html"));
            atomic_write(&path, html.as_bytes())?;
            artefacts.push(Artefact {
                kind: "html",
                path: path.display().to_string(),
                bytes: html.len() as u64,
            });
        }
        if args.png {
            let path = args.out_dir.join(format!("{base_name}.png"));
            export_png(&svg, &path, args.scale)?;
            let bytes = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            artefacts.push(Artefact {
                kind: "png",
                path: path.display().to_string(),
                bytes,
            });
        }
    }
    stages.export_ms = Some(elapsed_ms(export_start));

    Ok((
        RenderOutcome {
            artefacts,
            model_summary: import_result.summary,
            layout_summary: LayoutSummary {
                total_width: layout.total_width,
                total_height: layout.total_height,
                leaf_width: layout.leaf_size.w,
                leaf_height: layout.leaf_size.h,
            },
        },
        warnings,
    ))
}

#[cfg(feature = "png")]
fn export_png(svg: &str, path: &Path, scale: f32) -> Result<(), AppError> {
    crate::render::write_output_png(svg, path, scale).map_err(|err| AppError::Export {
        message: format!("PNG export failed: {err}"),
    })
}

#[cfg(not(feature = "png"))]
fn export_png(_svg: &str, _path: &Path, _scale: f32) -> Result<(), AppError> {
    Err(AppError::Export {
        message: "PNG support not compiled in; rebuild with the png feature".to_string(),
    })
}

/// Write through a sibling temp file and rename, so partially written
/// artefacts never land under the final name.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), AppError> {
    let write_err = |source: std::io::Error| AppError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("artefact");
    let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", std::process::id()));
    std::fs::write(&tmp, content).map_err(write_err)?;
    std::fs::rename(&tmp, path).map_err(write_err)
}

// ---------------------------------------------------------------------------
// inspect / validate / guide
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct InspectOutcome {
    detected_schema: crate::import::SchemaType,
    fields: crate::import::DetectedFields,
    model_summary: ModelSummary,
}

fn run_inspect(args: &InspectArgs) -> i32 {
    let start = Instant::now();
    let rid = request_id();
    let mut stages = StageMetrics::default();

    match import_stage(&args.import, &mut stages) {
        Ok((result, warnings)) => {
            write_envelope(&Envelope::success(
                "bcm.inspect",
                rid,
                InspectOutcome {
                    detected_schema: result.schema,
                    fields: result.fields,
                    model_summary: result.summary,
                },
                warnings,
                metrics(start, stages),
            ));
            0
        }
        Err(err) => {
            write_envelope(&Envelope::<InspectOutcome>::failure(
                "bcm.inspect",
                rid,
                &err,
                metrics(start, stages),
            ));
            err.exit_code()
        }
    }
}

#[derive(Debug, Serialize)]
struct ValidateOutcome {
    valid: bool,
    model_summary: ModelSummary,
}

fn run_validate(args: &ValidateArgs) -> i32 {
    let start = Instant::now();
    let rid = request_id();
    let mut stages = StageMetrics::default();

    match import_stage(&args.import, &mut stages) {
        Ok((result, warnings)) => {
            write_envelope(&Envelope::success(
                "bcm.validate",
                rid,
                ValidateOutcome {
                    valid: true,
                    model_summary: result.summary,
                },
                warnings,
                metrics(start, stages),
            ));
            0
        }
        Err(err) => {
            write_envelope(&Envelope::<ValidateOutcome>::failure(
                "bcm.validate",
                rid,
                &err,
                metrics(start, stages),
            ));
            err.exit_code()
        }
    }
}

fn run_guide() -> i32 {
    let start = Instant::now();
    let rid = request_id();

    let guide = json!({
        "commands": {
            "render": "Import a capability model, lay it out, and export SVG/HTML/PNG artefacts",
            "inspect": "Detect schema and fields and summarize the model",
            "validate": "Validate the model (cycles, duplicate ids)",
            "guide": "Print this contract",
        },
        "input_formats": {
            "json": "nested (embedded children), flat (parent references), or simple (plain list)",
            "csv": "flat via a parent column, or hierarchy inferred from a level column (L1/L2 or 1/2)",
            "tsv": "same as csv, tab-delimited",
        },
        "layout_defaults": LayoutOptions::default(),
        "error_codes": {
            "ERR_IO_FILE_NOT_FOUND": 50,
            "ERR_IO_READ": 50,
            "ERR_IO_WRITE": 50,
            "ERR_VALIDATION_JSON_PARSE": 10,
            "ERR_VALIDATION_CSV_PARSE": 10,
            "ERR_VALIDATION_SCHEMA_DETECT": 10,
            "ERR_VALIDATION_NO_NAME_FIELD": 10,
            "ERR_VALIDATION_EMPTY_INPUT": 10,
            "ERR_VALIDATION_CYCLE": 10,
            "ERR_VALIDATION_DUPLICATE_ID": 10,
            "ERR_VALIDATION_OPTION": 10,
            "ERR_EXPORT": 30,
            "ERR_INTERNAL": 90,
        },
    });

    write_envelope(&Envelope::success(
        "bcm.guide",
        rid,
        guide,
        Vec::new(),
        metrics(start, StageMetrics::default()),
    ));
    0
}
