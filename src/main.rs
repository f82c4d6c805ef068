// DocSEO CLI - SEO auditing and frontmatter synthesis for Markdown documentation
use anyhow::Result;
use clap::{Parser, Subcommand};

// Macro for conditional printing based on quiet flag
macro_rules! qprintln {
    ($quiet:expr, $($arg:tt)*) => {
        if !$quiet {
            println!($($arg)*);
        }
    };
}

use chrono::Utc;
use docseo::{
    init_logging_with_level,
    reports::{issue_summary_rows, RunSummary},
    services::{
        AnalysisService, AnalyzeOptions, DocumentOutcome, FrontmatterService, KeywordFix,
        OptimizationService, RunOptions, TranslateOptions, UpdateOptions,
    },
    site_files::{write_robots, write_sitemap_index},
    with_trace_id, CompletionEnhancer, Enhancer, RunCounters, SeoConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "DocSEO - SEO auditing and frontmatter synthesis for Markdown docs",
    long_about = None,
    after_help = "EXAMPLES:
  # Audit a docs tree and write CSV reports
  docseo analyze ./docs --output seo_reports

  # Preview synthesized frontmatter, then write it
  docseo update ./docs --preview
  docseo update ./docs

  # Full pipeline: robots.txt, sitemap index, reports, frontmatter, i18n
  docseo --config docseo.toml run"
)]
struct Cli {
    /// Enable verbose logging (DEBUG level)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// TOML configuration file
    #[arg(short, long, global = true, env = "DOCSEO_CONFIG")]
    config: Option<PathBuf>,

    /// Disable the language-model enhancer even when an API key is set
    #[arg(long, global = true)]
    no_enhancer: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit documents against the SEO checklist and write reports
    Analyze {
        /// File or directory to analyze
        path: PathBuf,
        /// Report directory (defaults to the configured output directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Synthesize missing frontmatter fields
    Update {
        /// File or directory to update
        path: PathBuf,
        /// Print the merged front-blocks without writing
        #[arg(long)]
        preview: bool,
        /// Give documents without a front-block a fresh one
        #[arg(long)]
        create_missing: bool,
        /// With --preview, also print the enhancer's SEO review
        #[arg(long, requires = "preview")]
        analysis: bool,
    },

    /// Rewrite comma-joined keywords into list form
    FixKeywords {
        /// File or directory to repair
        path: PathBuf,
    },

    /// Translate a single document through the enhancer
    Translate {
        /// Markdown file to translate
        path: PathBuf,
        /// Target language, e.g. en, ja, ko, zh-Hant
        #[arg(long)]
        to: String,
        /// Source language
        #[arg(long, default_value = "zh-Hans")]
        from: String,
        /// Directory receiving <stem>_<lang>.md
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Write robots.txt into the static directory
    Robots,

    /// Write the multi-locale sitemap index into the static directory
    Sitemap,

    /// Run the full optimization pipeline
    Run {
        /// Update this directory instead of the docs directory (skips i18n)
        #[arg(long)]
        target: Option<PathBuf>,
        #[arg(long)]
        preview: bool,
        #[arg(long)]
        create_missing: bool,
    },
}

fn build_enhancer(config: &SeoConfig, disabled: bool) -> Option<Arc<dyn Enhancer>> {
    if disabled || !config.enhancer.enabled {
        return None;
    }
    match CompletionEnhancer::new(config.enhancer.clone()) {
        Ok(enhancer) => {
            info!("Language-model enhancement enabled");
            Some(Arc::new(enhancer))
        }
        Err(e) => {
            info!("Language-model enhancement disabled: {}", e);
            None
        }
    }
}

fn print_counters(quiet: bool, label: &str, counters: &RunCounters) {
    qprintln!(
        quiet,
        "{label}: {} succeeded, {} skipped, {} failed ({} files)",
        counters.succeeded,
        counters.skipped,
        counters.failed,
        counters.seen
    );
}

fn print_run_summary(quiet: bool, summary: &RunSummary) {
    qprintln!(quiet, "\n📋 Optimization summary");
    qprintln!(quiet, "   Target:        {}", summary.target);
    qprintln!(quiet, "   Duration:      {:.2}s", summary.duration_secs);
    qprintln!(quiet, "   SEO issues:    {}", summary.seo_issues);
    qprintln!(quiet, "   Files checked: {}", summary.files_analyzed);
    qprintln!(quiet, "   Updated:       {}", summary.documents_updated);
    qprintln!(quiet, "   Failed:        {}", summary.documents_failed);
    qprintln!(quiet, "   Reports:       {}", summary.output_dir);
}

async fn run(cli: Cli) -> Result<()> {
    let quiet = cli.quiet;
    let config = SeoConfig::load(cli.config.as_deref())?;
    let enhancer = build_enhancer(&config, cli.no_enhancer);

    match cli.command {
        Commands::Analyze { path, output } => {
            let output_dir = output.unwrap_or_else(|| config.paths.output_dir.clone());
            let result = AnalysisService::new(&config)
                .analyze(AnalyzeOptions {
                    target: path,
                    output_dir: Some(output_dir.clone()),
                })
                .await?;

            qprintln!(quiet, "🔍 SEO reports written to {}", output_dir.display());
            qprintln!(
                quiet,
                "   {} issue(s) in {} file(s); {} analyzed",
                result.stats.total_issues(),
                result.stats.document_issues().len(),
                result.stats.documents_analyzed()
            );
            for row in issue_summary_rows(&result.stats).iter().take(5) {
                qprintln!(quiet, "   {:>5}  {}", row.count, row.label);
            }
            print_counters(quiet, "Analysis", &result.counters);
        }

        Commands::Update {
            path,
            preview,
            create_missing,
            analysis,
        } => {
            let service = FrontmatterService::new(&config, enhancer);
            let result = service
                .update(UpdateOptions {
                    target: path,
                    preview,
                    create_missing,
                    with_analysis: analysis,
                })
                .await?;

            for outcome in &result.outcomes {
                match outcome {
                    DocumentOutcome::Previewed {
                        document,
                        front_block,
                        analysis,
                    } => {
                        qprintln!(quiet, "\n{}\n{}", "=".repeat(50), document);
                        qprintln!(quiet, "---\n{}---", front_block);
                        if let Some(analysis) = analysis {
                            qprintln!(quiet, "\nSEO analysis:\n{}", analysis);
                        }
                    }
                    DocumentOutcome::Written { document, .. } => {
                        qprintln!(quiet, "✅ Updated: {}", document);
                    }
                    DocumentOutcome::Skipped { document, reason } => {
                        qprintln!(quiet, "⚠️  Skipped {}: {}", document, reason);
                    }
                    DocumentOutcome::Failed { document, error } => {
                        qprintln!(quiet, "❌ Failed {}: {}", document, error);
                    }
                }
            }
            print_counters(quiet, "\nFrontmatter update", &result.counters);
        }

        Commands::FixKeywords { path } => {
            let service = FrontmatterService::new(&config, None);
            let result = service.fix_keywords(&path).await?;
            for (document, fix) in &result.fixes {
                match fix {
                    KeywordFix::Converted => qprintln!(quiet, "✅ Fixed: {}", document),
                    KeywordFix::AddedEmpty => {
                        qprintln!(quiet, "➕ Added empty keywords: {}", document)
                    }
                    KeywordFix::AlreadyCanonical => {}
                }
            }
            print_counters(quiet, "Keyword repair", &result.counters);
        }

        Commands::Translate {
            path,
            to,
            from,
            output_dir,
        } => {
            let service = FrontmatterService::new(&config, enhancer);
            let output = service
                .translate(TranslateOptions {
                    file: path,
                    source_lang: from,
                    target_lang: to,
                    output_dir,
                })
                .await?;
            qprintln!(quiet, "🌐 Translation written: {}", output.display());
        }

        Commands::Robots => {
            let path = write_robots(&config).await?;
            qprintln!(quiet, "🤖 robots.txt written: {}", path.display());
        }

        Commands::Sitemap => {
            let path = write_sitemap_index(&config, Utc::now().date_naive()).await?;
            qprintln!(
                quiet,
                "🗺️  Sitemap index written: {} ({} entries)",
                path.display(),
                config.site.locales.len() + 1
            );
        }

        Commands::Run {
            target,
            preview,
            create_missing,
        } => {
            let frontmatter = FrontmatterService::new(&config, enhancer);
            let outcome = OptimizationService::new(&config, frontmatter)
                .run(RunOptions {
                    target,
                    preview,
                    create_missing,
                })
                .await?;
            print_run_summary(quiet, &outcome.summary);
            if outcome.counters.failed > 0 {
                warn!("{} document(s) failed", outcome.counters.failed);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Ignore error if already initialized
    let _ = init_logging_with_level(cli.verbose, cli.quiet);

    if let Err(e) = with_trace_id("docseo-cli", run(cli)).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
