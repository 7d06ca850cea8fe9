// Standard Library Imports
use std::{
    fs::{self, File},
    io::BufReader,
    path::PathBuf,
    str::FromStr,
};

// External Crate Imports
use aminochem::{Enzyme, MassScale, ModificationRules, ReplacementRule};
use clap::{Args, Parser};
use fanout::{ExportTarget, JsonLinesSource, Pipeline};
use log::info;
use miette::{IntoDiagnostic, Result, WrapErr};
use proteograph::{Combinator, FeatureKind, GraphOptions, MassKind, MassTable, PathFilter, StatisticsOptions};
use rust_decimal::Decimal;

/// Compiles annotated protein entries into proteoform graphs, reporting statistics and exporting peptides
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// A file of JSON-encoded entries, one per line
    input: PathBuf,

    /// A KDL file of residue masses, replacing the built-in table
    #[arg(long)]
    mass_table: Option<PathBuf>,
    /// Multiply every mass by this factor and round it to a whole number
    #[arg(long, value_name = "FACTOR")]
    integral_masses: Option<u64>,

    /// Feature kinds to execute (all of them when none are given)
    #[arg(long = "feature", value_name = "KIND", value_delimiter = ',', value_parser = FeatureKind::from_str)]
    features: Vec<FeatureKind>,
    /// Amino-acid replacement rules, like `J->I,L`
    #[arg(long = "replace", value_name = "RULE")]
    replacements: Vec<String>,
    /// Enzymes to digest with, in order
    #[arg(long = "digest", value_name = "ENZYME", value_delimiter = ',', default_value = "trypsin",
        value_parser = Enzyme::from_str)]
    digestion: Vec<Enzyme>,
    /// Fixed modifications, like `C:57.021464`
    #[arg(long = "fixed-mod", value_name = "RULE")]
    fixed_modifications: Vec<String>,
    /// Variable modifications, like `M:15.994915`
    #[arg(long = "variable-mod", value_name = "RULE")]
    variable_modifications: Vec<String>,

    /// Keep parallel edges between the same pair of nodes
    #[arg(long)]
    no_collapse: bool,
    /// Keep single-residue nodes instead of merging linear chains
    #[arg(long)]
    no_merge: bool,
    /// Annotate every node with its residue masses
    #[arg(long)]
    masses: bool,
    /// Also annotate every node with the lightest mass from it to the end of the protein
    #[arg(long)]
    suffix_masses: bool,

    #[command(flatten)]
    statistics: StatisticsArgs,
    #[command(flatten)]
    exports: ExportArgs,

    /// Worker threads (defaults to one fewer than there are cores)
    #[arg(short, long)]
    workers: Option<usize>,
    /// Entries that may wait for a worker before reading pauses
    #[arg(long, default_value_t = Pipeline::DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,
}

#[derive(Args, Debug)]
struct StatisticsArgs {
    /// Write one CSV row of statistics per protein
    #[arg(short, long, value_name = "FILE")]
    statistics: Option<PathBuf>,
    #[arg(long)]
    path_count: bool,
    /// Count paths by how many cleaved edges they read through
    #[arg(long)]
    miscleavages: bool,
    /// Count paths by how many nodes they visit
    #[arg(long)]
    hops: bool,
    /// Count paths by how many features of a kind they carry, like `VARIANT:max`
    #[arg(long = "feature-distribution", value_name = "KIND:min|max", value_parser = feature_distribution)]
    feature_distributions: Vec<(FeatureKind, Combinator)>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Write every graph to one DOT file
    #[arg(long, value_name = "FILE")]
    dot: Option<PathBuf>,
    /// Write every peptide to one CSV file
    #[arg(long, value_name = "FILE")]
    peptides: Option<PathBuf>,

    /// Shortest peptide to export
    #[arg(long, default_value_t = 0)]
    min_length: usize,
    /// Skip peptides with unknown residues
    #[arg(long)]
    reject_unknown: bool,
    #[arg(long)]
    max_miscleavages: Option<usize>,
    #[arg(long)]
    max_hops: Option<usize>,
    /// Requires `--masses`
    #[arg(long)]
    min_mass: Option<Decimal>,
    /// Requires `--masses`, and prunes much sooner with `--suffix-masses`
    #[arg(long)]
    max_mass: Option<Decimal>,
    /// Filter on average rather than monoisotopic masses
    #[arg(long)]
    average: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::default()
        .parse_env(env_logger::Env::default().filter_or("PROTGRAPH_LOG", "warn,protgraph=info"))
        .init();

    let cli = Cli::parse();
    let table = mass_table(&cli)?;
    let options = graph_options(&cli, &table)?;
    let pipeline = pipeline(&cli, options, table);

    let input = File::open(&cli.input)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to open {:?}", cli.input))?;
    let summary = pipeline.run(JsonLinesSource::new(BufReader::new(input)))?;

    info!(
        "read {} entries: {} built, {} failed, {} skipped",
        summary.read, summary.built, summary.failed, summary.skipped
    );
    Ok(())
}

fn mass_table(cli: &Cli) -> Result<MassTable> {
    let scale = cli
        .integral_masses
        .map_or(Ok(MassScale::Exact), MassScale::integral)?;
    let Some(path) = &cli.mass_table else {
        return Ok(MassTable::with_scale(scale));
    };

    let kdl = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read the mass table {path:?}"))?;
    Ok(MassTable::new(path.to_string_lossy(), kdl, scale)?)
}

fn graph_options(cli: &Cli, table: &MassTable) -> Result<GraphOptions> {
    let features = if cli.features.is_empty() {
        FeatureKind::EXECUTABLE.into()
    } else {
        cli.features.iter().copied().collect()
    };
    let replacements = cli
        .replacements
        .iter()
        .map(|rule| ReplacementRule::parse(rule, table))
        .collect::<Result<Vec<_>, _>>()?;
    let modifications = ModificationRules::parse(&cli.fixed_modifications, &cli.variable_modifications, table)?;

    let statistics = &cli.statistics;
    Ok(GraphOptions {
        features,
        replacements,
        digestion: cli.digestion.clone(),
        modifications,
        collapse_edges: !cli.no_collapse,
        merge_chains: !cli.no_merge,
        masses: cli.masses,
        suffix_masses: cli.suffix_masses,
        statistics: StatisticsOptions {
            path_count: statistics.path_count,
            miscleavages: statistics.miscleavages,
            hops: statistics.hops,
            features: statistics.feature_distributions.clone(),
        },
    })
}

fn pipeline(cli: &Cli, options: GraphOptions, table: MassTable) -> Pipeline {
    let exports = &cli.exports;
    let filter = PathFilter {
        min_length: exports.min_length,
        reject_unknown: exports.reject_unknown,
        max_miscleavages: exports.max_miscleavages,
        min_mass: exports.min_mass.map(|mass| table.delta(mass)),
        max_mass: exports.max_mass.map(|mass| table.delta(mass)),
        mass_kind: if exports.average {
            MassKind::Average
        } else {
            MassKind::Monoisotopic
        },
        max_hops: exports.max_hops,
    };

    let mut pipeline = Pipeline::new(options, table).queue_capacity(cli.queue_capacity);
    if let Some(workers) = cli.workers {
        pipeline = pipeline.workers(workers);
    }
    if let Some(path) = &cli.statistics.statistics {
        pipeline = pipeline.statistics(path);
    }
    if let Some(path) = &exports.dot {
        pipeline = pipeline.export(ExportTarget::Dot(path.clone()));
    }
    if let Some(path) = &exports.peptides {
        pipeline = pipeline.export(ExportTarget::PeptideCsv(path.clone(), filter));
    }
    pipeline
}

fn feature_distribution(arg: &str) -> Result<(FeatureKind, Combinator), String> {
    let (kind, combinator) = arg.rsplit_once(':').unwrap_or((arg, "max"));
    let kind = kind.parse().map_err(|error| format!("{error}"))?;
    let combinator = match combinator.trim().to_ascii_lowercase().as_str() {
        "min" => Combinator::Min,
        "max" => Combinator::Max,
        other => return Err(format!("expected `min` or `max`, found {other:?}")),
    };
    Ok((kind, combinator))
}
