use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;
mod extract;
mod launch;
mod render;
mod stats;
mod table;
mod time;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "ns3-latency")]
#[command(about = "Run ns-3 latency experiments and plot their results", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start simulator runs for every size, repeated in batches.
    Launch {
        /// Program under scratch/ to run.
        #[arg(short = 'e', long)]
        experiment_file: String,

        /// Directory name for the results (defaults to the program name).
        #[arg(short = 'n', long)]
        experiment_name: Option<String>,

        /// Where raw logs are stored; omit to print to the console.
        #[arg(short = 'o', long)]
        results_dir: Option<PathBuf>,

        #[arg(short = 'r', long, default_value_t = 1)]
        repeats: usize,

        /// Node counts, e.g. 8,16,32
        #[arg(short = 's', long)]
        sizes: String,

        /// Extra simulator arguments, e.g. comp_factor=2,cluster=2
        #[arg(short = 'a', long = "args")]
        extra_args: Option<String>,

        #[arg(long, default_value = "./waf")]
        waf: PathBuf,

        /// Pause between spawns within a batch.
        #[arg(long, default_value_t = 3)]
        stagger_secs: u64,

        /// Kill a simulation that runs longer than this.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Rebuild the per-size data files from raw logs.
    Extract {
        /// Experiment directory holding one sub-directory per size.
        root: PathBuf,
    },

    /// Aggregate data files and write an HTML report.
    Analyze {
        /// Experiment result directories.
        #[arg(short = 'r', long, num_args = 1.., required = true)]
        results: Vec<PathBuf>,

        #[arg(short = 'o', long, default_value = "latency-report.html")]
        output: PathBuf,

        #[arg(long)]
        plot_dist: bool,

        #[arg(long)]
        plot_avg: bool,

        /// Print pgfplots coordinates for every figure.
        #[arg(long)]
        latex: bool,

        /// Expected event columns per run (defaults to the first run's).
        #[arg(long)]
        columns: Option<usize>,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Launch {
            experiment_file,
            experiment_name,
            results_dir,
            repeats,
            sizes,
            extra_args,
            waf,
            stagger_secs,
            timeout_secs,
        } => {
            let plan = launch::LaunchPlan {
                experiment_name: experiment_name.unwrap_or_else(|| experiment_file.clone()),
                experiment_file,
                results_dir,
                repeats,
                sizes: launch::parse_sizes(&sizes)?,
                extra_args: match extra_args {
                    Some(a) => launch::parse_extra_args(&a)?,
                    None => Vec::new(),
                },
                waf,
                stagger: Duration::from_secs(stagger_secs),
                timeout: timeout_secs.map(Duration::from_secs),
            };
            let summary = launch::run(&plan)?;
            println!(
                "Spawned {} runs ({} failed, {} timed out)",
                summary.spawned, summary.failed, summary.timed_out
            );
        }

        Commands::Extract { root } => {
            for done in extract::consolidate_experiment(&root)? {
                println!(
                    "{}: {} logs, {} rows",
                    done.dir.display(),
                    done.files,
                    done.rows
                );
            }
        }

        Commands::Analyze {
            results,
            output,
            plot_dist,
            plot_avg,
            latex,
            columns,
        } => {
            let cfg = config::AnalyzeConfig {
                results,
                output,
                plot_dist,
                plot_avg,
                latex,
                columns,
            };
            cfg.validate()?;

            // 1) Parse data files.
            let table = table::load_run_table(&cfg.results)?;

            // 2) Aggregate + draw.
            let report = render::build_report(&cfg, &table)?;

            // 3) Coordinates go to stdout for copy/paste.
            for export in &report.exports {
                println!("{}", export.heading);
                println!("{}", export.text);
            }

            // 4) Render HTML.
            let html = render::render_html_report(&report)?;
            std::fs::write(&cfg.output, html)
                .with_context(|| format!("write report {}", cfg.output.display()))?;
            println!("Wrote {}", cfg.output.display());
        }
    }

    Ok(())
}
