//! CLI definitions and command dispatch.

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use cjk_subset_core::{
    CacheConfig, CachedSource, Error, ExecutionSummary, Format, FontDisplay, FontWeight, GoogleFonts, Locale, NameTableInspector,
    OptionsBuilder, Pipeline, PipelineOptions, PyftSubset, Report, SerializeOptions, Stylesheet,
    StylesheetRequest, StylesheetSource,
    config::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL},
    stylesheet::serialize,
};
use cjk_subset_font_subsetter::DEFAULT_TIMEOUT;

use crate::config::FileConfig;

#[derive(Parser)]
#[command(name = "cjk-subset", version)]
#[command(about = "Generate CJK web font subsets split along the Google Fonts unicode ranges")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Which upstream stylesheet to use and how to cache it.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct StylesheetArgs {
    /// sc, tc, hk, jp or kr [default: sc]
    #[arg(short, long)]
    pub locale: Option<String>,
    /// 100, 300, 400, 500, 700, 900 or the weight name [default: 400]
    #[arg(short, long)]
    pub weight: Option<String>,
    /// auto, block, swap, fallback or optional [default: swap]
    #[arg(short, long)]
    pub display: Option<String>,
    /// Keep fetched stylesheets in this directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
    /// Seconds a cached stylesheet is reused [default: 86400]
    #[arg(long)]
    pub cache_ttl: Option<u64>,
    /// Always fetch the stylesheet
    #[arg(long)]
    pub no_cache: bool,
    /// TOML file with default values for these flags
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Wrap long src and unicode-range lists beyond this width
    #[arg(long)]
    pub line_width: Option<usize>,
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct GenerateArgs {
    /// Source font file (TTF/OTF)
    #[arg(short, long)]
    pub input: Option<PathBuf>,
    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// font-family for the generated rules [default: the font's family name]
    #[arg(long)]
    pub family: Option<String>,
    /// Output formats in src order [default: woff2,woff]
    #[arg(short, long, value_delimiter = ',')]
    pub format: Vec<String>,
    /// URL prefix of the generated src entries [default: ../webfonts]
    #[arg(long)]
    pub src_prefix: Option<String>,
    /// Regenerate subsets that already exist
    #[arg(long)]
    pub overwrite: bool,
    /// Subset jobs run at once [default: available CPUs]
    #[arg(short, long)]
    pub jobs: Option<usize>,
    /// Seconds before a subset job is killed, 0 to disable [default: 600]
    #[arg(long)]
    pub timeout: Option<u64>,
    /// pyftsubset executable
    #[arg(long)]
    pub pyftsubset: Option<PathBuf>,
    #[command(flatten)]
    pub stylesheet: StylesheetArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Subset a font and write the matching stylesheet
    Generate {
        #[command(flatten)]
        args: GenerateArgs,
    },
    /// Print the upstream stylesheet as it will be parsed
    Fetch {
        #[command(flatten)]
        args: StylesheetArgs,
    },
    /// List supported locales, weights, display values and formats
    Options,
}

impl Commands {
    pub fn run(self) -> Result<()> {
        match self {
            Commands::Generate { args } => {
                let settings = Settings::resolve(args)?;
                let report = settings.generate().inspect_err(print_failure_summary)?;
                print_report(&report);
            }
            Commands::Fetch { args } => {
                let settings = Settings::resolve(GenerateArgs { stylesheet: args, ..Default::default() })?;
                print!("{}", settings.fetch()?);
            }
            Commands::Options => print_options(),
        }
        Ok(())
    }
}

/// Flag values merged over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub family: Option<String>,
    pub formats: Option<Vec<String>>,
    pub src_prefix: Option<String>,
    pub overwrite: bool,
    pub jobs: Option<usize>,
    pub timeout: Option<Duration>,
    pub pyftsubset: Option<PathBuf>,
    pub line_width: Option<usize>,
    pub locale: Option<String>,
    pub weight: Option<String>,
    pub display: Option<String>,
    pub cache: Option<CacheConfig>,
}

impl Settings {
    pub fn resolve(args: GenerateArgs) -> Result<Self> {
        let file = match &args.stylesheet.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Ok(Self::merge(args, file))
    }

    /// Flags win over the config file; unset values fall back to defaults later.
    pub fn merge(args: GenerateArgs, file: FileConfig) -> Self {
        let stylesheet = args.stylesheet;
        let timeout_secs = args.timeout.or(file.timeout);
        let no_cache = stylesheet.no_cache || file.no_cache.unwrap_or(false);
        let cache = (!no_cache).then(|| CacheConfig {
            ttl: stylesheet.cache_ttl.or(file.cache_ttl).map_or(DEFAULT_CACHE_TTL, Duration::from_secs),
            capacity: DEFAULT_CACHE_CAPACITY,
            dir: stylesheet.cache_dir.or(file.cache_dir),
        });

        Self {
            input: args.input.or(file.input),
            output: args.output.or(file.output),
            family: args.family.or(file.family),
            formats: if args.format.is_empty() { file.format } else { Some(args.format) },
            src_prefix: args.src_prefix.or(file.src_prefix),
            overwrite: args.overwrite || file.overwrite.unwrap_or(false),
            jobs: args.jobs.or(file.jobs),
            timeout: match timeout_secs {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => Some(DEFAULT_TIMEOUT),
            },
            pyftsubset: args.pyftsubset.or(file.pyftsubset),
            line_width: stylesheet.line_width.or(file.line_width),
            locale: stylesheet.locale.or(file.locale),
            weight: stylesheet.weight.or(file.weight.map(|weight| weight.as_string())),
            display: stylesheet.display.or(file.display),
            cache,
        }
    }

    pub fn options(&self) -> Result<PipelineOptions> {
        let mut builder = OptionsBuilder::new().overwrite(self.overwrite);
        if let Some(input) = &self.input {
            builder = builder.input(input);
        }
        if let Some(output) = &self.output {
            builder = builder.output(output);
        }
        if let Some(family) = &self.family {
            builder = builder.font_family(family);
        }
        if let Some(formats) = &self.formats {
            builder = builder.formats(formats.iter().map(String::as_str));
        }
        if let Some(prefix) = &self.src_prefix {
            builder = builder.src_prefix(prefix);
        }
        if let Some(jobs) = self.jobs {
            builder = builder.concurrency(jobs);
        }
        if let Some(locale) = &self.locale {
            builder = builder.locale(locale);
        }
        if let Some(weight) = &self.weight {
            builder = builder.font_weight(weight);
        }
        if let Some(display) = &self.display {
            builder = builder.font_display(display);
        }
        Ok(builder.build()?)
    }

    pub fn subsetter(&self) -> PyftSubset {
        let subsetter = PyftSubset::new().with_timeout(self.timeout);
        match &self.pyftsubset {
            Some(program) => subsetter.with_program(program),
            None => subsetter,
        }
    }

    pub fn source(&self) -> Result<Box<dyn StylesheetSource>> {
        let google = GoogleFonts::new()?;
        Ok(match &self.cache {
            Some(config) => Box::new(CachedSource::new(google, config.clone())),
            None => Box::new(google),
        })
    }

    pub fn serialize_options(&self) -> SerializeOptions {
        SerializeOptions { line_width: self.line_width, ..SerializeOptions::default() }
    }

    pub fn generate(&self) -> Result<Report> {
        let options = self.options()?;
        let source = self.source()?;
        let subsetter = self.subsetter();
        info!("Subsetting {} into {}", options.input().display(), options.output().display());

        let report = Pipeline::new(&*source, &subsetter, &NameTableInspector)
            .with_serialize_options(self.serialize_options())
            .run(&options)?;
        Ok(report)
    }

    /// Fetch and re-serialize the stylesheet for the configured locale.
    pub fn fetch(&self) -> Result<String> {
        let request = StylesheetRequest {
            locale: self.locale.as_deref().map(str::parse).transpose()?.unwrap_or_default(),
            weight: self.weight.as_deref().map(str::parse).transpose()?.unwrap_or_default(),
            display: self.display.as_deref().map(str::parse).transpose()?.unwrap_or_default(),
        };
        let css = self.source()?.fetch(&request)?;
        let sheet = Stylesheet::parse(&css).context("Upstream stylesheet is not valid CSS")?;
        info!("{} @font-face rule(s)", sheet.font_face_count());
        Ok(serialize(&sheet, &self.serialize_options()))
    }
}

fn print_report(report: &Report) {
    let summary = &report.summary;
    println!("Stylesheet: {}", report.css_path.display());
    println!("Family:     {}", report.family);
    println!("Rules:      {}", report.font_faces);
    println!("Subsets:    {}", summary_line(summary));
}

/// Counts are still useful when some jobs failed; the error itself is
/// reported by `main`.
fn print_failure_summary(err: &anyhow::Error) {
    if let Some(text) = failure_summary(err) {
        println!("{text}");
    }
}

fn failure_summary(err: &anyhow::Error) -> Option<String> {
    match err.downcast_ref::<Error>()? {
        Error::SubsetJobs { css_path, summary, .. } => Some(format!(
            "Stylesheet: {} (partial)\nSubsets:    {}",
            css_path.display(),
            summary_line(summary)
        )),
        _ => None,
    }
}

fn summary_line(summary: &ExecutionSummary) -> String {
    let mut line = format!("{} generated, {} reused", summary.generated, summary.reused);
    if summary.failed > 0 {
        line.push_str(&format!(", {} failed", summary.failed));
    }
    line
}

fn print_options() {
    println!("Locales:");
    for locale in Locale::ALL {
        println!("  {:<4} {} ({})", locale.suffix(), locale.noto_family(), locale.description());
    }
    println!("Weights:");
    for weight in FontWeight::ALL {
        println!("  {:<4} {}", weight.value(), weight.name());
    }
    println!("Display:");
    for display in FontDisplay::ALL {
        println!("  {display}");
    }
    println!("Formats:");
    for format in Format::ALL {
        println!("  {format}");
    }
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use tempfile::TempDir;

    use super::*;
    use crate::config::Weight;

    #[test]
    fn test_failure_summary_keeps_counts() {
        let err = anyhow::Error::from(Error::SubsetJobs {
            failures: Vec::new(),
            css_path: PathBuf::from("dist/F/css/F.css"),
            summary: ExecutionSummary { generated: 3, reused: 2, failed: 1 },
        });
        assert_eq!(
            failure_summary(&err).unwrap(),
            "Stylesheet: dist/F/css/F.css (partial)\nSubsets:    3 generated, 2 reused, 1 failed"
        );
        assert!(failure_summary(&anyhow::anyhow!("other")).is_none());
    }

    #[test]
    fn test_summary_line_omits_zero_failures() {
        let summary = ExecutionSummary { generated: 4, reused: 0, failed: 0 };
        assert_eq!(summary_line(&summary), "4 generated, 0 reused");
    }

    fn generate_args(argv: &[&str]) -> GenerateArgs {
        let cli = Cli::try_parse_from(["cjk-subset", "generate"].iter().chain(argv)).unwrap();
        match cli.command {
            Commands::Generate { args } => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_parse_generate_flags() {
        let args = generate_args(&["-i", "font.ttf", "-o", "dist", "--format", "woff,woff2", "-l", "jp", "-j", "4"]);
        assert_eq!(args.input, Some(PathBuf::from("font.ttf")));
        assert_eq!(args.format, ["woff", "woff2"]);
        assert_eq!(args.stylesheet.locale.as_deref(), Some("jp"));
        assert_eq!(args.jobs, Some(4));
    }

    #[test]
    fn test_flags_override_config_file() {
        let args = generate_args(&["--locale", "kr", "--timeout", "0"]);
        let file = FileConfig {
            locale: Some("tc".to_string()),
            weight: Some(Weight::Number(700)),
            output: Some(PathBuf::from("from-config")),
            timeout: Some(30),
            ..Default::default()
        };

        let settings = Settings::merge(args, file);
        assert_eq!(settings.locale.as_deref(), Some("kr"));
        assert_eq!(settings.weight.as_deref(), Some("700"));
        assert_eq!(settings.output, Some(PathBuf::from("from-config")));
        assert_eq!(settings.timeout, None);
    }

    #[test]
    fn test_defaults_without_config() {
        let settings = Settings::merge(generate_args(&[]), FileConfig::default());
        assert_eq!(settings.timeout, Some(DEFAULT_TIMEOUT));
        assert_eq!(settings.formats, None);
        assert_eq!(settings.cache.as_ref().map(|cache| cache.ttl), Some(DEFAULT_CACHE_TTL));
        assert!(!settings.overwrite);
    }

    #[test]
    fn test_no_cache_from_config() {
        let file = FileConfig { no_cache: Some(true), ..Default::default() };
        let settings = Settings::merge(generate_args(&["--cache-ttl", "5"]), file);
        assert_eq!(settings.cache, None);
    }

    #[test]
    fn test_config_formats_used_when_flag_absent() {
        let file = FileConfig { format: Some(vec!["woff".to_string()]), ..Default::default() };
        let settings = Settings::merge(generate_args(&[]), file);
        assert_eq!(settings.formats, Some(vec!["woff".to_string()]));
    }

    #[test]
    fn test_options_from_settings() {
        let dir = TempDir::new().unwrap();
        let font = dir.path().join("font.ttf");
        write(&font, b"font").unwrap();

        let args = generate_args(&["-i", font.to_str().unwrap(), "-o", "dist", "-w", "bold", "-d", "optional"]);
        let options = Settings::merge(args, FileConfig::default()).options().unwrap();
        assert_eq!(options.font_weight(), FontWeight::Bold);
        assert_eq!(options.font_display(), FontDisplay::Optional);
        assert_eq!(options.formats(), Format::ALL);
    }

    #[test]
    fn test_invalid_display_rejected() {
        let settings = Settings::merge(generate_args(&["-o", "dist", "-d", "sometimes"]), FileConfig::default());
        let err = settings.options().unwrap_err();
        assert!(err.to_string().contains("Invalid font display"), "{err}");
    }

    #[test]
    fn test_fetch_shares_stylesheet_flags() {
        let cli = Cli::try_parse_from(["cjk-subset", "fetch", "--locale", "hk", "--no-cache"]).unwrap();
        match cli.command {
            Commands::Fetch { args } => {
                assert_eq!(args.locale.as_deref(), Some("hk"));
                assert!(args.no_cache);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_subsetter_program_and_timeout() {
        let file = FileConfig { pyftsubset: Some(PathBuf::from("/opt/bin/pyftsubset")), ..Default::default() };
        let subsetter = Settings::merge(generate_args(&["--timeout", "12"]), file).subsetter();
        assert_eq!(subsetter.program(), PathBuf::from("/opt/bin/pyftsubset"));
        assert_eq!(subsetter.timeout(), Some(Duration::from_secs(12)));
    }
}
