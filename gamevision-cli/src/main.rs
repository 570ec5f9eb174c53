use clap::{Args, Parser, Subcommand, ValueEnum};
use gamevision::image::io::{load_gray_image, load_pixels, save_pixels, SaveFormat};
use gamevision::kernel::Correlator;
use gamevision::process::SystemProcesses;
use gamevision::{
    capture, compare_images, input, Automator, ClickMethod, ClickOptions, ClickTarget,
    CompareMethod, MatchMode, MatchResult, Metric, MouseButton, MultiScaleConfig, MultiScaleMatcher,
    ProcessLocator, Template, VisionError,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Find and click template images in application windows")]
struct Cli {
    /// Path to an optional JSON configuration file.
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output on stderr.
    #[arg(long, global = true)]
    trace: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List running processes.
    List {
        /// Only show processes whose name contains this text.
        #[arg(long)]
        filter: Option<String>,
    },
    /// Capture a process window to an image file.
    Capture {
        #[command(flatten)]
        target: ProcessArgs,
        #[arg(short, long, default_value = "capture.png")]
        output: PathBuf,
        /// Output encoding; defaults to the file extension.
        #[arg(long)]
        format: Option<FormatArg>,
        /// JPEG quality.
        #[arg(long, default_value_t = 90, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: u8,
    },
    /// Compare two image files.
    Compare {
        first: PathBuf,
        second: PathBuf,
        #[arg(long, value_enum, default_value_t = CompareArg::Template)]
        method: CompareArg,
        /// Similarity at or above which the images count as similar.
        #[arg(long, default_value_t = 0.8)]
        threshold: f32,
    },
    /// Search an image file for a template.
    Find {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        template: PathBuf,
        /// Report every qualifying scale instead of only the best.
        #[arg(long)]
        all: bool,
    },
    /// Locate a template in a process window and click it.
    Click {
        #[command(flatten)]
        target: ProcessArgs,
        #[arg(long)]
        template: PathBuf,
        #[arg(long, value_enum)]
        button: Option<ButtonArg>,
        #[arg(long = "target", value_enum)]
        click_target: Option<TargetArg>,
        /// Locate and report the point without clicking.
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Args, Debug)]
struct ProcessArgs {
    #[arg(long, required_unless_present = "name", conflicts_with = "name")]
    pid: Option<u32>,
    /// Process name; substring match unless `--exact` is given.
    #[arg(long)]
    name: Option<String>,
    #[arg(long, requires = "name")]
    exact: bool,
}

impl ProcessArgs {
    fn resolve(&self) -> Result<u32, Failure> {
        if let Some(pid) = self.pid {
            return Ok(pid);
        }
        let name = self.name.as_deref().unwrap_or_default();
        let mode = if self.exact {
            MatchMode::Exact
        } else {
            MatchMode::Fuzzy
        };
        Ok(SystemProcesses.first_pid(name, mode)?)
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Png,
    Jpeg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CompareArg {
    Template,
    Histogram,
    MeanAbsolute,
}

impl From<CompareArg> for CompareMethod {
    fn from(value: CompareArg) -> Self {
        match value {
            CompareArg::Template => CompareMethod::Template,
            CompareArg::Histogram => CompareMethod::Histogram,
            CompareArg::MeanAbsolute => CompareMethod::MeanAbsolute,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
enum ButtonArg {
    #[default]
    Left,
    Right,
    Middle,
}

impl From<ButtonArg> for MouseButton {
    fn from(value: ButtonArg) -> Self {
        match value {
            ButtonArg::Left => MouseButton::Left,
            ButtonArg::Right => MouseButton::Right,
            ButtonArg::Middle => MouseButton::Middle,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
enum TargetArg {
    #[default]
    Center,
    TopLeft,
    #[value(name = "random")]
    RandomInBox,
}

impl From<TargetArg> for ClickTarget {
    fn from(value: TargetArg) -> Self {
        match value {
            TargetArg::Center => ClickTarget::Center,
            TargetArg::TopLeft => ClickTarget::TopLeft,
            TargetArg::RandomInBox => ClickTarget::RandomInBox,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum MetricConfig {
    #[default]
    Zncc,
    Ssd,
}

impl From<MetricConfig> for Metric {
    fn from(value: MetricConfig) -> Self {
        match value {
            MetricConfig::Zncc => Metric::Zncc,
            MetricConfig::Ssd => Metric::Ssd,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum MethodConfig {
    #[default]
    SystemInput,
    WindowMessage,
}

impl From<MethodConfig> for ClickMethod {
    fn from(value: MethodConfig) -> Self {
        match value {
            MethodConfig::SystemInput => ClickMethod::SystemInput,
            MethodConfig::WindowMessage => ClickMethod::WindowMessage,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct MultiScaleJson {
    min_scale: f32,
    max_scale: f32,
    scale_step: f32,
    threshold: f32,
    max_results: usize,
}

impl Default for MultiScaleJson {
    fn default() -> Self {
        let cfg = MultiScaleConfig::default();
        Self {
            min_scale: cfg.min_scale(),
            max_scale: cfg.max_scale(),
            scale_step: cfg.scale_step(),
            threshold: cfg.threshold(),
            max_results: cfg.max_results(),
        }
    }
}

impl MultiScaleJson {
    fn to_config(&self) -> Result<MultiScaleConfig, VisionError> {
        MultiScaleConfig::new(
            self.min_scale,
            self.max_scale,
            self.scale_step,
            self.threshold,
            self.max_results,
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ClickJson {
    button: ButtonArg,
    target: TargetArg,
    method: MethodConfig,
    delay_ms: u64,
    jitter: bool,
    restore_focus: bool,
}

impl Default for ClickJson {
    fn default() -> Self {
        let opts = ClickOptions::default();
        Self {
            button: ButtonArg::Left,
            target: TargetArg::Center,
            method: MethodConfig::SystemInput,
            delay_ms: opts.delay.as_millis() as u64,
            jitter: opts.jitter,
            restore_focus: opts.restore_focus,
        }
    }
}

impl ClickJson {
    fn options(&self) -> ClickOptions {
        ClickOptions {
            delay: Duration::from_millis(self.delay_ms),
            jitter: self.jitter,
            restore_focus: self.restore_focus,
            method: self.method.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Config {
    multi_scale: MultiScaleJson,
    metric: MetricConfig,
    parallel: bool,
    click: ClickJson,
}

impl Config {
    /// Matcher using the configured metric and parallelism.
    fn matcher(&self) -> MultiScaleMatcher<Box<dyn Correlator>> {
        MultiScaleMatcher::with_correlator(Metric::from(self.metric).correlator())
            .with_parallel(self.parallel)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            multi_scale: MultiScaleJson::default(),
            metric: MetricConfig::Zncc,
            parallel: true,
            click: ClickJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct MatchRecord {
    similarity: f32,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    scale: f32,
}

impl From<MatchResult> for MatchRecord {
    fn from(value: MatchResult) -> Self {
        Self {
            similarity: value.similarity,
            x: value.location.x,
            y: value.location.y,
            width: value.bounding_box.width(),
            height: value.bounding_box.height(),
            scale: value.scale,
        }
    }
}

#[derive(Debug, Serialize)]
struct FindOutput {
    best: Option<MatchRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    all: Option<Vec<MatchRecord>>,
}

#[derive(Debug, Serialize)]
struct CompareOutput {
    method: &'static str,
    similarity: f32,
    similar: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<[i32; 2]>,
}

/// CLI failure; library errors keep their pipeline stage for reporting.
enum Failure {
    Vision(VisionError),
    Other(String),
}

impl From<VisionError> for Failure {
    fn from(err: VisionError) -> Self {
        Failure::Vision(err)
    }
}

impl From<std::io::Error> for Failure {
    fn from(err: std::io::Error) -> Self {
        Failure::Other(err.to_string())
    }
}

impl From<serde_json::Error> for Failure {
    fn from(err: serde_json::Error) -> Self {
        Failure::Other(err.to_string())
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Vision(err) => write!(f, "error [{}]: {err}", err.stage()),
            Failure::Other(msg) => write!(f, "error: {msg}"),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            eprintln!("{failure}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, Failure> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&text)?)
        }
        None => Ok(Config::default()),
    }
}

fn run(cli: Cli) -> Result<(), Failure> {
    if cli.trace {
        let directive: Directive = "gamevision=debug"
            .parse()
            .map_err(|err| Failure::Other(format!("{err}")))?;
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let Some(command) = cli.command else {
        return Err(Failure::Other(
            "no subcommand given; see --help".to_string(),
        ));
    };
    let config = load_config(cli.config.as_ref())?;

    match command {
        Command::List { filter } => {
            let processes = match filter.as_deref() {
                Some(name) => SystemProcesses.find(name, MatchMode::Fuzzy),
                None => SystemProcesses.list(),
            };
            for process in processes {
                println!("{:>8}  {}", process.pid, process.name);
            }
        }
        Command::Capture {
            target,
            output,
            format,
            quality,
        } => {
            let pid = target.resolve()?;
            let backend = capture::create_backend(false);
            tracing::debug!(pid, backend = backend.name(), "capturing");
            let captured = backend.capture_window(pid)?;
            let format = match format {
                Some(FormatArg::Png) => SaveFormat::Png,
                Some(FormatArg::Jpeg) => SaveFormat::Jpeg { quality },
                None => match SaveFormat::from_path(&output) {
                    SaveFormat::Jpeg { .. } => SaveFormat::Jpeg { quality },
                    png => png,
                },
            };
            save_pixels(&captured.pixels, &output, format)?;
            let rect = captured.rect;
            println!(
                "captured {}x{} from window at ({}, {})-({}, {}) via {} capture -> {}",
                captured.pixels.width(),
                captured.pixels.height(),
                rect.min_x(),
                rect.min_y(),
                rect.max_x(),
                rect.max_y(),
                captured.strategy,
                output.display()
            );
        }
        Command::Compare {
            first,
            second,
            method,
            threshold,
        } => {
            let a = load_pixels(&first)?;
            let b = load_pixels(&second)?;
            let cmp = compare_images(&a, &b, method.into())?;
            let output = CompareOutput {
                method: match cmp.method {
                    CompareMethod::Template => "template",
                    CompareMethod::Histogram => "histogram",
                    CompareMethod::MeanAbsolute => "mean_absolute",
                },
                similarity: cmp.similarity,
                similar: cmp.similarity >= threshold,
                location: cmp.location.map(|p| [p.x, p.y]),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Find {
            image,
            template,
            all,
        } => {
            let source = load_gray_image(&image)?;
            let template = Template::from(load_gray_image(&template)?);
            let cfg = config.multi_scale.to_config()?;
            let matcher = config.matcher();
            let output = if all {
                let hits = matcher.match_all_scales(source.view(), template.view(), &cfg)?;
                FindOutput {
                    best: hits.first().copied().map(MatchRecord::from),
                    all: Some(hits.into_iter().map(MatchRecord::from).collect()),
                }
            } else {
                let best = matcher.match_best_scale(source.view(), template.view(), &cfg)?;
                FindOutput {
                    best: best.is_found().then(|| MatchRecord::from(best)),
                    all: None,
                }
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Click {
            target,
            template,
            button,
            click_target,
            dry_run,
        } => {
            let pid = target.resolve()?;
            let template = Template::from(load_gray_image(&template)?);
            let cfg = config.multi_scale.to_config()?;
            let button: MouseButton = button.unwrap_or(config.click.button).into();
            let click_target: ClickTarget = click_target.unwrap_or(config.click.target).into();
            let automator = Automator::with_matcher(
                capture::create_backend(false),
                input::create_backend(false),
                config.matcher(),
            );
            tracing::debug!(
                pid,
                capture = automator.capture_backend().name(),
                input = automator.input_backend().name(),
                "backends ready"
            );
            if dry_run {
                match automator.locate(pid, &template, &cfg)? {
                    Some(located) => {
                        let at = click_target.point_in(&located.screen_rect);
                        println!(
                            "found (similarity {:.3}, scale {:.2}); would click ({}, {})",
                            located.found.similarity, located.found.scale, at.x, at.y
                        );
                    }
                    None => println!("template not found"),
                }
                return Ok(());
            }
            let options = config.click.options();
            match automator.click_template(pid, &template, &cfg, button, &options, click_target)? {
                Some(at) => println!("clicked ({}, {})", at.x, at.y),
                None => println!("template not found"),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Config, MetricConfig};
    use gamevision::{ImageView, MultiScaleConfig};

    #[test]
    fn metric_defaults_to_zncc() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.metric, MetricConfig::Zncc);
    }

    #[test]
    fn ssd_metric_is_selectable() {
        let config: Config = serde_json::from_str(r#"{ "metric": "ssd" }"#).unwrap();
        assert_eq!(config.metric, MetricConfig::Ssd);

        // A flat template carries no ZNCC signal but matches exactly under SSD.
        let source = vec![90u8; 40 * 40];
        let template = vec![90u8; 10 * 10];
        let source = ImageView::from_slice(&source, 40, 40).unwrap();
        let template = ImageView::from_slice(&template, 10, 10).unwrap();
        let cfg = MultiScaleConfig::new(1.0, 1.0, 0.1, 0.9, 1).unwrap();

        let best = config.matcher().match_best_scale(source, template, &cfg).unwrap();
        assert!(best.similarity > 0.999);

        let zncc: Config = serde_json::from_str("{}").unwrap();
        let best = zncc.matcher().match_best_scale(source, template, &cfg).unwrap();
        assert!(!best.is_found());
    }

    #[test]
    fn example_config_parses() {
        let config: Config = serde_json::from_str(super::EXAMPLE_JSON).unwrap();
        assert_eq!(config.metric, MetricConfig::Zncc);
        config.multi_scale.to_config().unwrap();
    }
}
