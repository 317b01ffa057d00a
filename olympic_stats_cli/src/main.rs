use std::collections::BTreeMap;
use std::fs;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use olympic_stats::mekko::{country_mekko, MekkoChart};
use olympic_stats::tally::{
    self, AverageAge, DetailSort, MedalCount, MedalSort, MedalistTotal, ParticipationSummary,
};
use olympic_stats::{parse_records, AthleteEvent, Filter, Medal, PaddingPolicy, Preset, Season, Sex};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod plot;

use plot::{
    derive_split_paths, render_chart_guard, AgeHistogramPlot, AverageAgePlot, ChartKind,
    HistoryPlot, MekkoPlot, ParticipationPlot, TopMedalistsPlot, YearMedalsPlot,
};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("OLYMPIC_STATS_COMMIT"),
    ")"
);

#[derive(Parser, Debug)]
#[command(
    author,
    version = VERSION,
    about = "Olympic medal and participation reports",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Marimekko chart of one country's medal mix per Games
    Mekko(MekkoArgs),
    /// Medal counts per country and year, with details and map frames
    Medals(MedalsArgs),
    /// Which countries took part in which Games
    Participation(ParticipationArgs),
    /// Top medalists and their medal history
    Medalists(MedalistsArgs),
    /// Medalist age distribution and average age per sport
    Ages(AgesArgs),
    /// Summarize the shape of the input table
    Inspect(InspectArgs),
}

impl Command {
    fn data(&self) -> &DataArgs {
        match self {
            Command::Mekko(args) => &args.data,
            Command::Medals(args) => &args.data,
            Command::Participation(args) => &args.data,
            Command::Medalists(args) => &args.data,
            Command::Ages(args) => &args.data,
            Command::Inspect(args) => &args.data,
        }
    }
}

#[derive(Args, Debug)]
struct DataArgs {
    /// athlete_events CSV files to ingest
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    inputs: Vec<PathBuf>,

    /// Games season; unset keeps the preset's choice, `both` clears it
    #[arg(long, value_enum)]
    season: Option<SeasonOpt>,

    /// Athlete gender; unset keeps the preset's choice, `both` clears it
    #[arg(long, value_enum)]
    gender: Option<GenderOpt>,

    /// Restrict to a sport (repeatable)
    #[arg(long = "sport")]
    sports: Vec<String>,

    /// Restrict to a country, by NOC code or name (repeatable)
    #[arg(long = "country")]
    countries: Vec<String>,

    /// JSON preset with default filters and padding
    #[arg(long, value_hint = ValueHint::FilePath)]
    preset: Option<PathBuf>,

    /// Count a team medal once per country
    #[arg(long, action = ArgAction::SetTrue)]
    dedupe_team_medals: bool,

    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,

    /// Log timings of the major stages
    #[arg(long, action = ArgAction::SetTrue)]
    profile: bool,
}

#[derive(Args, Debug)]
struct PlotArgs {
    /// Output PNG figure path (defaults next to the CSV)
    #[arg(long, value_hint = ValueHint::FilePath)]
    png: Option<PathBuf>,

    /// Output SVG figure path
    #[arg(long, value_hint = ValueHint::FilePath)]
    svg: Option<PathBuf>,

    /// Disable plot generation
    #[arg(long, action = ArgAction::SetTrue)]
    no_plot: bool,
}

#[derive(Parser, Debug)]
struct MekkoArgs {
    /// Country to chart (NOC code or name)
    #[arg(long = "for", value_name = "COUNTRY")]
    target: String,

    #[command(flatten)]
    data: DataArgs,

    #[command(flatten)]
    plot: PlotArgs,

    /// Output path for the segments (`-` for stdout)
    #[arg(short, long, default_value = "mekko.csv", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Write segments as JSON instead of CSV
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Fixed padding between bars (disables adaptive padding)
    #[arg(long)]
    padding: Option<f64>,

    /// Adaptive padding scale for sparse charts (divided by the year count)
    #[arg(long)]
    sparse_scale: Option<f64>,
}

#[derive(Parser, Debug)]
struct MedalsArgs {
    #[command(flatten)]
    data: DataArgs,

    #[command(flatten)]
    plot: PlotArgs,

    /// Output CSV path for medal counts (`-` for stdout)
    #[arg(short, long, default_value = "medal_counts.csv", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Medal count ordering
    #[arg(long, value_enum, default_value_t = MedalSortOpt::Year)]
    sort: MedalSortOpt,

    /// Optional CSV with medals per country, year, sport and gender
    #[arg(long, value_hint = ValueHint::FilePath)]
    details: Option<PathBuf>,

    /// Detail table ordering
    #[arg(long, value_enum, default_value_t = DetailSortOpt::Year)]
    details_sort: DetailSortOpt,

    /// Optional CSV of per-year choropleth frames (every country, zero-filled)
    #[arg(long, value_hint = ValueHint::FilePath)]
    map_output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ParticipationArgs {
    #[command(flatten)]
    data: DataArgs,

    #[command(flatten)]
    plot: PlotArgs,

    /// Output CSV path for (year, country) participation (`-` for stdout)
    #[arg(short, long, default_value = "participation.csv", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Optional CSV with Games attended per country
    #[arg(long, value_hint = ValueHint::FilePath)]
    summary: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct MedalistsArgs {
    #[command(flatten)]
    data: DataArgs,

    #[command(flatten)]
    plot: PlotArgs,

    /// Output CSV path for the leaderboard (`-` for stdout)
    #[arg(short, long, default_value = "top_medalists.csv", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Number of athletes to rank
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Optional CSV with the year-by-year history of the ranked athletes
    #[arg(long, value_hint = ValueHint::FilePath)]
    history: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct AgesArgs {
    #[command(flatten)]
    data: DataArgs,

    #[command(flatten)]
    plot: PlotArgs,

    /// Output CSV path for the age histogram (`-` for stdout)
    #[arg(short, long, default_value = "age_histogram.csv", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Optional CSV with mean age per sport and year
    #[arg(long, value_hint = ValueHint::FilePath)]
    averages: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Output report path (`-` for stdout)
    #[arg(short, long, default_value = "dataset_report.txt", value_hint = ValueHint::FilePath)]
    output: PathBuf,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum SeasonOpt {
    Both,
    Summer,
    Winter,
}

impl From<SeasonOpt> for Option<Season> {
    fn from(value: SeasonOpt) -> Self {
        match value {
            SeasonOpt::Both => None,
            SeasonOpt::Summer => Some(Season::Summer),
            SeasonOpt::Winter => Some(Season::Winter),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum GenderOpt {
    Both,
    Female,
    Male,
}

impl From<GenderOpt> for Option<Sex> {
    fn from(value: GenderOpt) -> Self {
        match value {
            GenderOpt::Both => None,
            GenderOpt::Female => Some(Sex::Female),
            GenderOpt::Male => Some(Sex::Male),
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MedalSortOpt {
    Year,
    Total,
    Gold,
    Silver,
    Bronze,
    Country,
}

impl From<MedalSortOpt> for MedalSort {
    fn from(value: MedalSortOpt) -> Self {
        match value {
            MedalSortOpt::Year => MedalSort::Year,
            MedalSortOpt::Total => MedalSort::Total,
            MedalSortOpt::Gold => MedalSort::Gold,
            MedalSortOpt::Silver => MedalSort::Silver,
            MedalSortOpt::Bronze => MedalSort::Bronze,
            MedalSortOpt::Country => MedalSort::Country,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum DetailSortOpt {
    Count,
    Year,
}

impl From<DetailSortOpt> for DetailSort {
    fn from(value: DetailSortOpt) -> Self {
        match value {
            DetailSortOpt::Count => DetailSort::Count,
            DetailSortOpt::Year => DetailSort::Year,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.command.data().verbose {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Command::Mekko(args) => handle_mekko(args),
        Command::Medals(args) => handle_medals(args),
        Command::Participation(args) => handle_participation(args),
        Command::Medalists(args) => handle_medalists(args),
        Command::Ages(args) => handle_ages(args),
        Command::Inspect(args) => handle_inspect(args),
    }
}

/// Rows from every input plus the settings resolved from preset and flags.
struct Dataset {
    rows: Vec<AthleteEvent>,
    filter: Filter,
    padding: PaddingPolicy,
    dedupe: bool,
    profile: bool,
}

impl Dataset {
    fn filtered(&self) -> Vec<&AthleteEvent> {
        let t_filter = Instant::now();
        let kept = self.filter.apply(&self.rows);
        let kept = if self.dedupe {
            tally::dedupe_team_medals(&kept)
        } else {
            kept
        };
        if self.profile {
            info!(
                "Filter stage: {:.1} ms ({} of {} rows)",
                t_filter.elapsed().as_secs_f64() * 1000.0,
                kept.len(),
                self.rows.len()
            );
        }
        kept
    }

    fn all(&self) -> Vec<&AthleteEvent> {
        self.rows.iter().collect()
    }
}

fn load_dataset(args: &DataArgs) -> Result<Dataset> {
    if args.inputs.is_empty() {
        return Err(anyhow!("no input files supplied"));
    }

    let preset = match args.preset.as_ref() {
        Some(path) => load_preset(path)?,
        None => Preset::default(),
    };
    let filter = merge_filter(preset.filter, args);
    debug!("Active filters: {}", filter.describe());

    let t_parse = Instant::now();
    let inputs: Vec<(usize, &PathBuf)> = args.inputs.iter().enumerate().collect();
    let mut parsed: Vec<(usize, Vec<AthleteEvent>)> = inputs
        .par_iter()
        .map(|(idx, path)| -> Result<(usize, Vec<AthleteEvent>)> {
            let data =
                fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            let rows = parse_records(&data)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            debug!("{}: {} rows", path.display(), rows.len());
            Ok((*idx, rows))
        })
        .collect::<Result<Vec<_>>>()?;

    // Restore argument order before concatenating.
    parsed.sort_by_key(|(idx, _)| *idx);
    let rows: Vec<AthleteEvent> = parsed.into_iter().flat_map(|(_, rows)| rows).collect();

    if args.profile || args.verbose {
        info!(
            "Parse stage: {:.1} ms ({} rows)",
            t_parse.elapsed().as_secs_f64() * 1000.0,
            rows.len()
        );
    }

    Ok(Dataset {
        rows,
        filter,
        padding: preset.padding,
        dedupe: args.dedupe_team_medals,
        profile: args.profile,
    })
}

fn load_preset(path: &Path) -> Result<Preset> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read preset {}", path.display()))?;
    let preset =
        Preset::from_json(&text).with_context(|| format!("invalid preset {}", path.display()))?;
    info!("Loaded preset: {}", path.display());
    Ok(preset)
}

/// Command-line values win over the preset; omitted flags and empty lists
/// defer to it.
fn merge_filter(mut base: Filter, args: &DataArgs) -> Filter {
    if let Some(season) = args.season {
        base.season = season.into();
    }
    if let Some(gender) = args.gender {
        base.sex = gender.into();
    }
    if !args.sports.is_empty() {
        base.sports = args.sports.clone();
    }
    if !args.countries.is_empty() {
        base.countries = args.countries.clone();
    }
    base
}

fn merge_padding(mut base: PaddingPolicy, args: &MekkoArgs) -> Result<PaddingPolicy> {
    if let Some(scale) = args.sparse_scale {
        base.sparse_scale = scale;
    }
    if let Some(padding) = args.padding {
        base = PaddingPolicy {
            sparse_scale: base.sparse_scale,
            ..PaddingPolicy::fixed(padding)
        };
    }
    base.validate()?;
    Ok(base)
}

fn handle_mekko(args: MekkoArgs) -> Result<()> {
    let dataset = load_dataset(&args.data)?;
    let policy = merge_padding(dataset.padding.clone(), &args)?;
    let rows = dataset.filtered();

    let t_compute = Instant::now();
    let chart = country_mekko(&rows, &args.target, &policy);
    if dataset.profile {
        info!(
            "Compute stage: {:.1} ms ({} years)",
            t_compute.elapsed().as_secs_f64() * 1000.0,
            chart.columns.len()
        );
    }

    let title = format!(
        "Medal share - {}{}",
        args.target,
        dataset.filter.title_suffix()
    );
    if chart.columns.is_empty() {
        warn!("{} has no entries under the active filters", args.target);
    } else {
        info!(
            "Marimekko for {}: {} years, {} medals, padding {:.3}",
            args.target,
            chart.columns.len(),
            chart.grand_total,
            chart.padding
        );
    }

    if args.json {
        write_mekko_json(&chart, &args.target, &title, &args.output)?;
    } else {
        write_mekko_csv(&chart, &args.output)?;
    }
    log_written("Marimekko segments", &args.output);

    if chart.is_empty() {
        info!("No medals to draw; skipping plot");
        return Ok(());
    }
    let plot = MekkoPlot {
        chart: &chart,
        title,
    };
    for (path, kind) in plot_targets(&args.plot, &args.output) {
        emit_plot(&plot, &path, kind);
    }
    Ok(())
}

fn handle_medals(args: MedalsArgs) -> Result<()> {
    let dataset = load_dataset(&args.data)?;
    let rows = dataset.filtered();

    let mut counts = tally::medal_counts(&rows);
    let per_year = medals_per_year(&counts);
    tally::sort_medal_counts(&mut counts, args.sort.into());
    write_table(&counts, &args.output)?;
    log_written("medal counts", &args.output);

    if let Some(path) = args.details.as_ref() {
        let mut details = tally::medal_details(&rows);
        tally::sort_medal_details(&mut details, args.details_sort.into());
        write_table(&details, path)?;
        log_written("medal details", path);
    }

    if let Some(path) = args.map_output.as_ref() {
        let frames = tally::map_frames(&dataset.all(), &rows);
        write_table(&frames, path)?;
        log_written("map frames", path);
    }

    if per_year.is_empty() {
        warn!("No medals under the active filters; skipping plot");
        return Ok(());
    }
    let plot = YearMedalsPlot {
        per_year: &per_year,
        title: format!("Medals by type{}", dataset.filter.title_suffix()),
    };
    for (path, kind) in plot_targets(&args.plot, &args.output) {
        emit_plot(&plot, &path, kind);
    }
    Ok(())
}

/// Medal counts per year summed over countries, in stack order.
fn medals_per_year(counts: &[MedalCount]) -> Vec<(u16, [u32; 3])> {
    let mut per_year: BTreeMap<u16, [u32; 3]> = BTreeMap::new();
    for count in counts {
        let slot = per_year.entry(count.year).or_default();
        slot[Medal::Bronze.index()] += count.bronze;
        slot[Medal::Silver.index()] += count.silver;
        slot[Medal::Gold.index()] += count.gold;
    }
    per_year.into_iter().collect()
}

fn handle_participation(args: ParticipationArgs) -> Result<()> {
    let dataset = load_dataset(&args.data)?;
    let rows = dataset.filtered();

    let entries = tally::participation(&rows);
    write_table(&entries, &args.output)?;
    log_written("participation", &args.output);

    let summary = tally::participation_summary(&entries);
    log_top_participants(&summary, 5);
    if let Some(path) = args.summary.as_ref() {
        write_table(&summary, path)?;
        log_written("participation summary", path);
    }

    let per_year = tally::participants_per_year(&entries);
    if per_year.is_empty() {
        warn!("No participation under the active filters; skipping plot");
        return Ok(());
    }
    let plot = ParticipationPlot {
        per_year: &per_year,
        title: format!("Participating countries{}", dataset.filter.title_suffix()),
    };
    for (path, kind) in plot_targets(&args.plot, &args.output) {
        emit_plot(&plot, &path, kind);
    }
    Ok(())
}

fn handle_medalists(args: MedalistsArgs) -> Result<()> {
    if args.top == 0 {
        return Err(anyhow!("--top must be at least 1"));
    }
    let dataset = load_dataset(&args.data)?;
    let rows = dataset.filtered();

    let history = tally::medal_history(&rows);
    let top = tally::top_medalists(&history, args.top);
    write_table(&top, &args.output)?;
    log_written("top medalists", &args.output);
    log_leaders(&top, 3);

    let lines = tally::history_lines(&history, args.top);
    if let Some(path) = args.history.as_ref() {
        write_table(&lines, path)?;
        log_written("medal history", path);
    }

    if top.is_empty() {
        warn!("No medalists under the active filters; skipping plots");
        return Ok(());
    }
    let suffix = dataset.filter.title_suffix();
    let bars = TopMedalistsPlot {
        athletes: &top,
        title: format!("Top {} medalists{}", top.len(), suffix),
    };
    let history_plot = HistoryPlot {
        lines: &lines,
        title: format!("Medal history of the top {}{}", top.len(), suffix),
    };
    for (path, kind) in plot_targets(&args.plot, &args.output) {
        let (top_path, history_path) = derive_split_paths(&path, "top", "history");
        emit_plot(&bars, &top_path, kind);
        emit_plot(&history_plot, &history_path, kind);
    }
    Ok(())
}

fn handle_ages(args: AgesArgs) -> Result<()> {
    let dataset = load_dataset(&args.data)?;
    let rows = dataset.filtered();

    let bins = tally::age_histogram(&rows);
    write_table(&bins, &args.output)?;
    log_written("age histogram", &args.output);

    let averages = tally::average_age(&rows);
    if let Some(path) = args.averages.as_ref() {
        write_table(&averages, path)?;
        log_written("average ages", path);
    }
    log_age_extremes(&averages);

    let suffix = dataset.filter.title_suffix();
    let histogram = AgeHistogramPlot {
        bins: &bins,
        title: format!("Medals by age group{}", suffix),
    };
    let average_plot = AverageAgePlot {
        averages: &averages,
        title: format!("Average age by sport{}", suffix),
    };
    let has_medals = bins.iter().any(|b| b.total() > 0);
    for (path, kind) in plot_targets(&args.plot, &args.output) {
        let (hist_path, avg_path) = derive_split_paths(&path, "hist", "avg");
        if has_medals {
            emit_plot(&histogram, &hist_path, kind);
        }
        if !averages.is_empty() {
            emit_plot(&average_plot, &avg_path, kind);
        }
    }
    Ok(())
}

fn handle_inspect(args: InspectArgs) -> Result<()> {
    let dataset = load_dataset(&args.data)?;
    let rows = dataset.filtered();
    let summary = tally::summarize(&rows);

    let mut report = String::new();
    for path in &args.data.inputs {
        report.push_str(&format!("FILE: {}\n", path.display()));
    }
    report.push_str(&format!("  filters: {}\n", dataset.filter.describe()));
    report.push_str(&format!("  rows: {}\n", summary.rows));
    report.push_str(&format!("  medal_rows: {}\n", summary.medal_rows));
    if let (Some(first), Some(last)) = (summary.first_year, summary.last_year) {
        report.push_str(&format!("  years: {}-{}\n", first, last));
    }
    report.push_str(&format!("  games: {}\n", summary.games));
    report.push_str(&format!("  nocs: {}\n", summary.nocs));
    for medal in Medal::STACK_ORDER.iter().rev() {
        report.push_str(&format!(
            "  {}: {}\n",
            medal.name().to_ascii_lowercase(),
            summary.medals.get(medal).copied().unwrap_or(0)
        ));
    }
    report.push_str("  missing:\n");
    report.push_str(&format!("    - age: {}\n", summary.missing_age));
    report.push_str(&format!("    - height: {}\n", summary.missing_height));
    report.push_str(&format!("    - weight: {}\n", summary.missing_weight));
    report.push_str(&format!("  sports ({}):\n", summary.sports.len()));
    for sport in &summary.sports {
        report.push_str(&format!("    - {}\n", sport));
    }

    if args.output.as_os_str() == "-" {
        io::stdout().lock().write_all(report.as_bytes())?;
    } else {
        fs::write(&args.output, report)
            .with_context(|| format!("failed to write {}", args.output.display()))?;
        info!("Dataset report written: {}", args.output.display());
    }
    Ok(())
}

fn table_writer(path: &Path) -> Result<csv::Writer<Box<dyn Write>>> {
    let sink: Box<dyn Write> = if path.as_os_str() == "-" {
        Box::new(io::stdout().lock())
    } else {
        Box::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )
    };
    Ok(csv::Writer::from_writer(sink))
}

fn write_table<T: Serialize>(rows: &[T], path: &Path) -> Result<()> {
    let mut writer = table_writer(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_mekko_csv(chart: &MekkoChart, path: &Path) -> Result<()> {
    let mut writer = table_writer(path)?;
    writer.write_record([
        "year",
        "medal",
        "count",
        "proportion",
        "width",
        "x",
        "center",
        "base",
        "label",
    ])?;
    for segment in chart.segments() {
        writer.write_record([
            segment.year.to_string(),
            segment.medal.to_string(),
            segment.count.to_string(),
            format!("{:.4}", segment.proportion),
            format!("{:.4}", segment.width),
            format!("{:.4}", segment.x),
            format!("{:.4}", segment.center),
            format!("{:.4}", segment.base),
            segment.label.unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct MekkoReport<'a> {
    country: &'a str,
    title: &'a str,
    padding: f64,
    grand_total: u64,
    x_range: (f64, f64),
    segments: Vec<olympic_stats::MekkoSegment>,
}

fn write_mekko_json(chart: &MekkoChart, country: &str, title: &str, path: &Path) -> Result<()> {
    let report = MekkoReport {
        country,
        title,
        padding: chart.padding,
        grand_total: chart.grand_total,
        x_range: chart.x_range(),
        segments: chart.segments(),
    };
    if path.as_os_str() == "-" {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        serde_json::to_writer_pretty(&mut handle, &report)?;
        handle.write_all(b"\n")?;
    } else {
        let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(file, &report)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

fn log_written(what: &str, path: &Path) {
    if path.as_os_str() != "-" {
        info!("Wrote {}: {}", what, path.display());
    }
}

/// Explicit `--png`/`--svg` targets, or a PNG next to the table when neither
/// is given and the table goes to a file.
fn plot_targets(opts: &PlotArgs, output: &Path) -> Vec<(PathBuf, ChartKind)> {
    if opts.no_plot {
        return Vec::new();
    }
    let mut targets = Vec::new();
    if let Some(path) = opts.png.as_ref() {
        targets.push((path.clone(), ChartKind::Png));
    }
    if let Some(path) = opts.svg.as_ref() {
        targets.push((path.clone(), ChartKind::Svg));
    }
    if targets.is_empty() && output.as_os_str() != "-" {
        let mut png_path = output.to_path_buf();
        png_path.set_extension("png");
        targets.push((png_path, ChartKind::Png));
    }
    targets
}

fn emit_plot<P: plot::Plot>(plot: &P, path: &Path, kind: ChartKind) {
    let t_plot = Instant::now();
    match render_chart_guard(plot, path, kind) {
        Ok(()) => info!(
            "Wrote plot: {} ({:.1} ms)",
            path.display(),
            t_plot.elapsed().as_secs_f64() * 1000.0
        ),
        Err(err) => warn!("Skipping plot ({}): {}", path.display(), err),
    }
}

fn log_top_participants(summary: &[ParticipationSummary], n: usize) {
    let leaders: Vec<String> = summary
        .iter()
        .take(n)
        .map(|s| format!("{} {}", s.country, s.games))
        .collect();
    if !leaders.is_empty() {
        info!("Most Games attended: {}", leaders.join("; "));
    }
}

fn log_leaders(top: &[MedalistTotal], n: usize) {
    let leaders: Vec<String> = top
        .iter()
        .take(n)
        .map(|t| format!("{} ({}G {}S {}B)", t.name, t.gold, t.silver, t.bronze))
        .collect();
    if !leaders.is_empty() {
        info!("Leaders: {}", leaders.join("; "));
    }
}

fn log_age_extremes(averages: &[AverageAge]) {
    let youngest = averages
        .iter()
        .min_by(|a, b| a.mean_age.total_cmp(&b.mean_age));
    let oldest = averages
        .iter()
        .max_by(|a, b| a.mean_age.total_cmp(&b.mean_age));
    if let (Some(young), Some(old)) = (youngest, oldest) {
        info!(
            "Youngest field: {} {} ({:.1}); oldest: {} {} ({:.1})",
            young.sport, young.year, young.mean_age, old.sport, old.year, old.mean_age
        );
    }
}
