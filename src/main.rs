use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use halotrace::analysis::{
    self, BranchComparison, BranchLengths, BranchSamples, BranchStatistic, LineageFailure,
};
use halotrace::catalogue::{HaloCatalogue, OccupancyRange};
use halotrace::report::{self, OutputDir, RatioKind};
use halotrace::{io, AnalysisConfig, Dataset, KsResult, StatisticsError, DEFAULT_CUTOFF};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "halotrace",
    about = "Main-branch statistics and diagnostic plots for halo merger trees"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct Output {
    /// Minimum halo mass in particles.
    #[arg(long, default_value_t = DEFAULT_CUTOFF)]
    cutoff: u64,
    /// Directory receiving figures and tables.
    #[arg(long, default_value = "Plots")]
    out: PathBuf,
    /// Label of the primary dataset.
    #[arg(long, default_value = "ll=0.1")]
    label: String,
    /// Label of the comparison dataset.
    #[arg(long, default_value = "ll=0.2")]
    compare_label: String,
}

#[derive(Args, Debug)]
struct TreeInput {
    /// Merger tree (JSON).
    #[arg(long)]
    tree: PathBuf,
    /// Snapshot metadata with a `time` per snapshot (JSON).
    #[arg(long)]
    times: PathBuf,
    /// Second merger tree to compare against.
    #[arg(long)]
    compare: Option<PathBuf>,
    /// Snapshot metadata of the second tree (default: same as --times).
    #[arg(long, requires = "compare")]
    compare_times: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CatalogueInput {
    /// Halo catalogue (JSON).
    #[arg(long)]
    catalogue: PathBuf,
    /// Second catalogue to compare against.
    #[arg(long)]
    compare: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Histogram of logarithmic mass growth along main branches.
    LogGrowth {
        #[command(flatten)]
        input: TreeInput,
        #[command(flatten)]
        output: Output,
        /// Histogram bins (default: 1000).
        #[arg(long)]
        bins: Option<usize>,
    },
    /// Histogram of mass fluctuation along main branches.
    MassFluctuation {
        #[command(flatten)]
        input: TreeInput,
        #[command(flatten)]
        output: Output,
        /// Histogram bins (default: 50).
        #[arg(long)]
        bins: Option<usize>,
    },
    /// Distribution of main-branch lengths.
    BranchLength {
        #[command(flatten)]
        input: TreeInput,
        #[command(flatten)]
        output: Output,
    },
    /// Progenitor and descendant counts of every halo.
    LinkCounts {
        #[command(flatten)]
        input: TreeInput,
        #[command(flatten)]
        output: Output,
    },
    /// Number of sub-halos per host.
    Occupancy {
        #[command(flatten)]
        input: CatalogueInput,
        #[command(flatten)]
        output: Output,
    },
    /// Summed and largest sub-halo mass against host mass.
    SubMass {
        #[command(flatten)]
        input: CatalogueInput,
        #[command(flatten)]
        output: Output,
    },
    /// Sub-halo distance from the host centre over the host radius.
    SubhaloPosition {
        #[command(flatten)]
        input: CatalogueInput,
        #[command(flatten)]
        output: Output,
        #[command(flatten)]
        selection: Selection,
    },
    /// Sub-halo speed offset over the host velocity dispersion.
    SubhaloVelocity {
        #[command(flatten)]
        input: CatalogueInput,
        #[command(flatten)]
        output: Output,
        #[command(flatten)]
        selection: Selection,
    },
    /// Sub-halo position ratio against speed ratio.
    SubhaloPhase {
        #[command(flatten)]
        input: CatalogueInput,
        #[command(flatten)]
        output: Output,
        /// Host occupancy range, `low-high`.
        #[arg(long, default_value = "1-1000")]
        occupancy: OccupancyRange,
    },
}

#[derive(Args, Debug)]
struct Selection {
    /// Host occupancy range, `low-high`.
    #[arg(long, default_value = "1-1000")]
    occupancy: OccupancyRange,
    /// Occupancy range applied to the comparison catalogue.
    #[arg(long)]
    compare_occupancy: Option<OccupancyRange>,
    /// Histogram bins (default: 50).
    #[arg(long)]
    bins: Option<usize>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::LogGrowth {
            input,
            output,
            bins,
        } => run_branch_statistic(BranchStatistic::LogMassGrowth, input, output, bins)?,
        Commands::MassFluctuation {
            input,
            output,
            bins,
        } => run_branch_statistic(BranchStatistic::MassFluctuation, input, output, bins)?,
        Commands::BranchLength { input, output } => run_branch_length(input, output)?,
        Commands::LinkCounts { input, output } => run_link_counts(input, output)?,
        Commands::Occupancy { input, output } => run_occupancy(input, output)?,
        Commands::SubMass { input, output } => run_sub_mass(input, output)?,
        Commands::SubhaloPosition {
            input,
            output,
            selection,
        } => run_subhalo_ratio(RatioKind::Position, input, output, selection)?,
        Commands::SubhaloVelocity {
            input,
            output,
            selection,
        } => run_subhalo_ratio(RatioKind::Speed, input, output, selection)?,
        Commands::SubhaloPhase {
            input,
            output,
            occupancy,
        } => run_subhalo_phase(input, output, occupancy)?,
    }

    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("HALOTRACE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn config_from(output: &Output) -> Result<AnalysisConfig> {
    let config = AnalysisConfig::default()
        .with_cutoff(output.cutoff)
        .with_output_dir(&output.out)
        .with_labels(&output.label, &output.compare_label);
    config.validate().context("invalid analysis parameters")?;
    Ok(config)
}

fn open_output(config: &AnalysisConfig) -> Result<OutputDir> {
    OutputDir::create(&config.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            config.output_dir.display()
        )
    })
}

fn load_dataset(tree: &Path, times: &Path, label: &str) -> Result<Dataset> {
    Dataset::load(tree, times, label)
        .with_context(|| format!("failed to load dataset {label} from {}", tree.display()))
}

fn load_datasets(input: &TreeInput, config: &AnalysisConfig) -> Result<(Dataset, Option<Dataset>)> {
    let primary = load_dataset(&input.tree, &input.times, &config.primary_label)?;
    let comparison = match &input.compare {
        Some(tree) => {
            let times = input.compare_times.as_deref().unwrap_or(input.times.as_path());
            Some(load_dataset(tree, times, &config.comparison_label)?)
        }
        None => None,
    };
    Ok((primary, comparison))
}

fn load_catalogue(path: &Path) -> Result<HaloCatalogue> {
    io::load_catalogue(path)
        .with_context(|| format!("failed to load catalogue from {}", path.display()))
}

fn print_written(paths: &[PathBuf]) {
    for path in paths {
        println!("wrote {}", path.display());
    }
}

fn print_ks(what: &str, ks: &Result<KsResult, StatisticsError>) {
    match ks {
        Ok(ks) => println!(
            "{what}: KS statistic={:.6}\tp-value={:.6}",
            ks.statistic, ks.p_value
        ),
        Err(err) => println!("{what}: KS test skipped: {err}"),
    }
}

fn report_failures(label: &str, failures: &[LineageFailure]) {
    if failures.is_empty() {
        return;
    }
    warn!(label, failed = failures.len(), "lineages excluded from the statistics");
    for failure in failures {
        println!(
            "{label}: lineage of halo {} excluded: {}",
            failure.root_id, failure.error
        );
    }
}

fn print_samples(label: &str, samples: &BranchSamples) {
    println!(
        "{label}: roots={}\tvalues={}\tundefined={}\tfailed={}",
        samples.roots,
        samples.values.len(),
        samples.undefined,
        samples.failures.len()
    );
    report_failures(label, &samples.failures);
}

fn run_branch_statistic(
    statistic: BranchStatistic,
    input: TreeInput,
    output: Output,
    bins: Option<usize>,
) -> Result<()> {
    let mut config = config_from(&output)?;
    if let Some(bins) = bins {
        match statistic {
            BranchStatistic::LogMassGrowth => config.growth_bins = bins,
            BranchStatistic::MassFluctuation => config.fluctuation_bins = bins,
        }
        config.validate().context("invalid analysis parameters")?;
    }
    let bins = match statistic {
        BranchStatistic::LogMassGrowth => config.growth_bins,
        BranchStatistic::MassFluctuation => config.fluctuation_bins,
    };

    let (primary, comparison) = load_datasets(&input, &config)?;
    let out = open_output(&config)?;

    let samples = primary.branch_statistic(statistic, config.cutoff);
    print_samples(&primary.label, &samples);
    let paths = report::branch_statistic_figure(
        &out,
        statistic,
        &samples,
        &primary.label,
        config.cutoff,
        bins,
    )
    .with_context(|| format!("failed to report {}", statistic.name()))?;
    print_written(&paths);

    if let Some(other) = comparison {
        let second = other.branch_statistic(statistic, config.cutoff);
        print_samples(&other.label, &second);
        let comparison = BranchComparison::new(samples, second);
        print_ks(statistic.name(), &comparison.ks);

        let paths = report::branch_comparison_figure(
            &out,
            statistic,
            &comparison,
            (&primary.label, &other.label),
            config.cutoff,
            bins,
        )
        .with_context(|| format!("failed to report {} comparison", statistic.name()))?;
        print_written(&paths);
    }

    Ok(())
}

fn print_lengths(label: &str, lengths: &BranchLengths) {
    println!(
        "{label}: branches={}\tfailed={}",
        lengths.lengths.len(),
        lengths.failures.len()
    );
    report_failures(label, &lengths.failures);
}

fn run_branch_length(input: TreeInput, output: Output) -> Result<()> {
    let config = config_from(&output)?;
    let (primary, comparison) = load_datasets(&input, &config)?;
    let out = open_output(&config)?;

    let Some(other) = comparison else {
        let lengths = analysis::branch_lengths(&primary.tree, &primary.index, config.cutoff);
        print_lengths(&primary.label, &lengths);
        let paths = report::branch_length_figure(&out, &lengths, &primary.label, config.cutoff)
            .context("failed to report main branch lengths")?;
        print_written(&paths);
        return Ok(());
    };

    let comparison =
        analysis::compare_branch_lengths(primary.as_pair(), other.as_pair(), config.cutoff);
    print_lengths(&primary.label, &comparison.first);
    print_lengths(&other.label, &comparison.second);
    print_ks("branchLength", &comparison.ks);

    let mut paths = Vec::new();
    for (label, lengths) in [
        (&primary.label, &comparison.first),
        (&other.label, &comparison.second),
    ] {
        if !lengths.lengths.is_empty() {
            paths.extend(
                report::branch_length_figure(&out, lengths, label, config.cutoff)
                    .context("failed to report main branch lengths")?,
            );
        }
    }
    paths.extend(
        report::branch_length_comparison_figure(
            &out,
            &comparison,
            (&primary.label, &other.label),
            config.cutoff,
        )
        .context("failed to report main branch length comparison")?,
    );
    print_written(&paths);
    Ok(())
}

fn run_link_counts(input: TreeInput, output: Output) -> Result<()> {
    let config = config_from(&output)?;
    let (primary, comparison) = load_datasets(&input, &config)?;
    let out = open_output(&config)?;

    match comparison {
        None => {
            let counts = primary.link_counts(config.cutoff);
            println!("{}: halos={}", primary.label, counts.len());
            let paths = report::link_count_figure(&out, &counts, &primary.label, config.cutoff)
                .context("failed to report link counts")?;
            print_written(&paths);
        }
        Some(other) => {
            let comparison =
                analysis::compare_link_counts(primary.as_pair(), other.as_pair(), config.cutoff);
            println!("{}: halos={}", primary.label, comparison.first.len());
            println!("{}: halos={}", other.label, comparison.second.len());
            print_ks("nProg", &comparison.progenitor_ks);
            print_ks("nDesc", &comparison.descendant_ks);

            let mut paths = Vec::new();
            for (label, counts) in [
                (&primary.label, &comparison.first),
                (&other.label, &comparison.second),
            ] {
                if !counts.is_empty() {
                    paths.extend(
                        report::link_count_figure(&out, counts, label, config.cutoff)
                            .context("failed to report link counts")?,
                    );
                }
            }
            paths.extend(
                report::link_count_comparison_figures(
                    &out,
                    &comparison,
                    (&primary.label, &other.label),
                    config.cutoff,
                )
                .context("failed to report link count comparison")?,
            );
            print_written(&paths);
        }
    }
    Ok(())
}

fn load_catalogues(
    input: &CatalogueInput,
    config: &AnalysisConfig,
) -> Result<Vec<(String, HaloCatalogue)>> {
    let mut catalogues = vec![(
        config.primary_label.clone(),
        load_catalogue(&input.catalogue)?,
    )];
    if let Some(path) = &input.compare {
        catalogues.push((config.comparison_label.clone(), load_catalogue(path)?));
    }
    Ok(catalogues)
}

fn run_occupancy(input: CatalogueInput, output: Output) -> Result<()> {
    let config = config_from(&output)?;
    let catalogues = load_catalogues(&input, &config)?;
    let out = open_output(&config)?;

    for (label, catalogue) in &catalogues {
        println!("{label}: hosts={}", catalogue.hosts.len());
    }
    let borrowed: Vec<_> = catalogues.iter().map(|(l, c)| (l.as_str(), c)).collect();
    let paths =
        report::occupancy_figure(&out, &borrowed).context("failed to report occupancy")?;
    print_written(&paths);
    Ok(())
}

fn run_sub_mass(input: CatalogueInput, output: Output) -> Result<()> {
    let config = config_from(&output)?;
    let catalogues = load_catalogues(&input, &config)?;
    let out = open_output(&config)?;

    let borrowed: Vec<_> = catalogues.iter().map(|(l, c)| (l.as_str(), c)).collect();
    let paths = report::subhalo_mass_figures(&out, &borrowed)
        .context("failed to report sub-halo masses")?;
    print_written(&paths);
    Ok(())
}

fn run_subhalo_ratio(
    kind: RatioKind,
    input: CatalogueInput,
    output: Output,
    selection: Selection,
) -> Result<()> {
    let mut config = config_from(&output)?;
    if let Some(bins) = selection.bins {
        config.ratio_bins = bins;
        config.validate().context("invalid analysis parameters")?;
    }
    let catalogues = load_catalogues(&input, &config)?;
    let out = open_output(&config)?;

    let (label, primary) = &catalogues[0];
    let mut paths = report::subhalo_ratio_figure(
        &out,
        kind,
        primary,
        selection.occupancy,
        label,
        config.ratio_bins,
    )
    .context("failed to report sub-halo ratios")?;

    if catalogues.len() > 1 {
        let compare_range = selection.compare_occupancy.unwrap_or(selection.occupancy);
        let entries: Vec<_> = catalogues
            .iter()
            .zip([selection.occupancy, compare_range])
            .map(|((l, c), range)| (l.as_str(), c, range))
            .collect();
        paths.extend(
            report::subhalo_ratio_comparison_figure(&out, kind, &entries, config.ratio_bins)
                .context("failed to report sub-halo ratio comparison")?,
        );
    }
    print_written(&paths);
    Ok(())
}

fn run_subhalo_phase(
    input: CatalogueInput,
    output: Output,
    occupancy: OccupancyRange,
) -> Result<()> {
    let config = config_from(&output)?;
    let catalogues = load_catalogues(&input, &config)?;
    let out = open_output(&config)?;

    for (label, catalogue) in &catalogues {
        println!(
            "{label}: sub-halos={}",
            catalogue.subhalo_phase_points(occupancy).len()
        );
    }
    let borrowed: Vec<_> = catalogues.iter().map(|(l, c)| (l.as_str(), c)).collect();
    let paths = report::phase_figure(&out, &borrowed, occupancy)
        .context("failed to report sub-halo phase space")?;
    print_written(&paths);
    Ok(())
}
