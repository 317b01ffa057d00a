use std::collections::BTreeMap;
use std::panic;
use std::path::{Path, PathBuf};

use anyhow::Result;
use olympic_stats::tally::{AgeBin, AverageAge, MedalHistoryEntry, MedalistTotal};
use olympic_stats::{Medal, MekkoChart};
use plotters::coord::{CoordTranslate, Shift};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontStyle};

const CHART_SIZE: (u32, u32) = (1600, 900);
const LEGEND_MAX_SERIES: usize = 12;

#[derive(Clone, Copy, Debug)]
pub enum ChartKind {
    Png,
    Svg,
}

/// A figure that can be drawn on any plotters backend.
pub trait Plot {
    fn draw<DB>(&self, root: DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static;
}

/// Renders `plot` to `path`, turning backend errors and panics into messages
/// so a failed figure never aborts the table output.
pub fn render_chart_guard<P: Plot>(plot: &P, path: &Path, kind: ChartKind) -> Result<(), String> {
    let render = || -> Result<()> {
        match kind {
            ChartKind::Png => plot.draw(BitMapBackend::new(path, CHART_SIZE).into_drawing_area()),
            ChartKind::Svg => plot.draw(SVGBackend::new(path, CHART_SIZE).into_drawing_area()),
        }
    };

    panic::catch_unwind(panic::AssertUnwindSafe(render))
        .map_err(|_| "plotting backend panicked".to_string())?
        .map_err(|e| format!("plotting error: {}", e))
}

/// `out/chart.png` -> (`out/chart_<first>.png`, `out/chart_<second>.png`).
pub fn derive_split_paths(base: &Path, first: &str, second: &str) -> (PathBuf, PathBuf) {
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("chart");
    let ext = base.extension().and_then(|s| s.to_str()).unwrap_or("png");
    (
        base.with_file_name(format!("{}_{}.{}", stem, first, ext)),
        base.with_file_name(format!("{}_{}.{}", stem, second, ext)),
    )
}

fn medal_color(medal: Medal) -> RGBColor {
    let (r, g, b) = medal.rgb();
    RGBColor(r, g, b)
}

fn swatch(color: RGBColor, (x, y): (i32, i32)) -> Rectangle<(i32, i32)> {
    Rectangle::new([(x, y - 6), (x + 14, y + 6)], color.filled())
}

fn axis_font() -> FontDesc<'static> {
    FontDesc::new(FontFamily::SansSerif, 18.0, FontStyle::Normal)
}

fn annotation_style(size: f64, anchor: Pos) -> TextStyle<'static> {
    FontDesc::new(FontFamily::SansSerif, size, FontStyle::Normal)
        .color(&BLACK)
        .pos(anchor)
}

fn centered() -> Pos {
    Pos::new(HPos::Center, VPos::Center)
}

fn draw_legend<'a, DB, CT>(
    chart: &mut ChartContext<'a, DB, CT>,
    position: SeriesLabelPosition,
) -> Result<()>
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
    CT: CoordTranslate,
{
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK.mix(0.3))
        .label_font(axis_font().color(&BLACK))
        .position(position)
        .draw()?;
    Ok(())
}

/// Variable-width stacked bars: one column per Games, width by medal share.
pub struct MekkoPlot<'a> {
    pub chart: &'a MekkoChart,
    pub title: String,
}

impl Plot for MekkoPlot<'_> {
    fn draw<DB>(&self, root: DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let area = root;
        area.fill(&WHITE)?;
        let (x_lo, x_hi) = self.chart.x_range();
        // Bands below 0 and above 1 hold the year and total labels.
        let mut chart = ChartBuilder::on(&area)
            .caption(&self.title, ("sans-serif", 28).into_font())
            .margin(25)
            .set_label_area_size(LabelAreaPosition::Left, 70)
            .set_label_area_size(LabelAreaPosition::Bottom, 20)
            .build_cartesian_2d(x_lo..x_hi, -0.08..1.12)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .light_line_style(&TRANSPARENT)
            .x_label_formatter(&|_| String::new())
            .y_label_formatter(&|v| {
                if *v < 0.0 || *v > 1.0 {
                    String::new()
                } else {
                    format!("{:.0}%", v * 100.0)
                }
            })
            .y_desc("Share of the year's medals")
            .label_style(axis_font())
            .draw()?;

        let segments = self.chart.segments();
        for medal in Medal::STACK_ORDER {
            let color = medal_color(medal);
            chart
                .draw_series(
                    segments
                        .iter()
                        .filter(|s| s.medal == medal && s.proportion > 0.0 && s.width > 0.0)
                        .map(|s| {
                            Rectangle::new(
                                [(s.x, s.base), (s.x + s.width, s.top())],
                                color.filled(),
                            )
                        }),
                )?
                .label(medal.name())
                .legend(move |pos| swatch(color, pos));
        }

        chart.draw_series(self.chart.columns.iter().map(|c| {
            Text::new(
                c.year.to_string(),
                (c.center(), -0.04),
                annotation_style(14.0, centered()),
            )
        }))?;
        chart.draw_series(segments.iter().filter_map(|s| {
            s.label.as_ref().map(|label| {
                Text::new(
                    label.clone(),
                    (s.center, 1.04),
                    annotation_style(16.0, centered()),
                )
            })
        }))?;

        draw_legend(&mut chart, SeriesLabelPosition::UpperRight)?;
        area.present()?;
        Ok(())
    }
}

/// Stacked medal bars per year; `counts` are in stack order.
pub struct YearMedalsPlot<'a> {
    pub per_year: &'a [(u16, [u32; 3])],
    pub title: String,
}

impl Plot for YearMedalsPlot<'_> {
    fn draw<DB>(&self, root: DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let area = root;
        area.fill(&WHITE)?;
        let (x_lo, x_hi, half) = year_axis(self.per_year.iter().map(|(year, _)| *year));
        let y_max = self
            .per_year
            .iter()
            .map(|(_, counts)| counts.iter().sum::<u32>())
            .max()
            .unwrap_or(1)
            .max(1) as f64;

        let mut chart = ChartBuilder::on(&area)
            .caption(&self.title, ("sans-serif", 28).into_font())
            .margin(25)
            .set_label_area_size(LabelAreaPosition::Left, 70)
            .set_label_area_size(LabelAreaPosition::Bottom, 50)
            .build_cartesian_2d(x_lo..x_hi, 0.0..y_max * 1.1)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_label_formatter(&|v| format!("{:.0}", v))
            .y_label_formatter(&|v| format!("{:.0}", v))
            .x_desc("Year")
            .y_desc("Medals")
            .label_style(axis_font())
            .draw()?;

        for medal in Medal::STACK_ORDER {
            let color = medal_color(medal);
            let idx = medal.index();
            chart
                .draw_series(self.per_year.iter().filter(|(_, c)| c[idx] > 0).map(|(year, c)| {
                    let base: u32 = c[..idx].iter().sum();
                    let x = *year as f64;
                    Rectangle::new(
                        [(x - half, base as f64), (x + half, (base + c[idx]) as f64)],
                        color.filled(),
                    )
                }))?
                .label(medal.name())
                .legend(move |pos| swatch(color, pos));
        }

        draw_legend(&mut chart, SeriesLabelPosition::UpperLeft)?;
        area.present()?;
        Ok(())
    }
}

/// Axis bounds padded by one Games gap, and a bar half-width that never
/// overlaps neighbouring years.
fn year_axis(years: impl Iterator<Item = u16>) -> (f64, f64, f64) {
    let years: Vec<u16> = years.collect();
    let first = years.iter().copied().min().unwrap_or(1896) as f64;
    let last = years.iter().copied().max().unwrap_or(2016) as f64;
    let gap = years
        .windows(2)
        .map(|w| w[1].abs_diff(w[0]) as f64)
        .filter(|g| *g > 0.0)
        .fold(4.0, f64::min);
    (first - gap, last + gap, gap * 0.4)
}

pub struct ParticipationPlot<'a> {
    pub per_year: &'a [(u16, u32)],
    pub title: String,
}

impl Plot for ParticipationPlot<'_> {
    fn draw<DB>(&self, root: DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let area = root;
        area.fill(&WHITE)?;
        let (x_lo, x_hi, half) = year_axis(self.per_year.iter().map(|(year, _)| *year));
        let y_max = self
            .per_year
            .iter()
            .map(|(_, n)| *n)
            .max()
            .unwrap_or(1)
            .max(1) as f64;

        let mut chart = ChartBuilder::on(&area)
            .caption(&self.title, ("sans-serif", 28).into_font())
            .margin(25)
            .set_label_area_size(LabelAreaPosition::Left, 70)
            .set_label_area_size(LabelAreaPosition::Bottom, 50)
            .build_cartesian_2d(x_lo..x_hi, 0.0..y_max * 1.1)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_label_formatter(&|v| format!("{:.0}", v))
            .y_label_formatter(&|v| format!("{:.0}", v))
            .x_desc("Year")
            .y_desc("Countries")
            .label_style(axis_font())
            .draw()?;

        let bar = RGBColor(70, 130, 180);
        chart.draw_series(self.per_year.iter().map(|(year, n)| {
            let x = *year as f64;
            Rectangle::new([(x - half, 0.0), (x + half, *n as f64)], bar.filled())
        }))?;

        area.present()?;
        Ok(())
    }
}

/// Horizontal stacked bars of weighted medal points, best athlete on top.
pub struct TopMedalistsPlot<'a> {
    pub athletes: &'a [MedalistTotal],
    pub title: String,
}

impl Plot for TopMedalistsPlot<'_> {
    fn draw<DB>(&self, root: DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let area = root;
        area.fill(&WHITE)?;
        let n = self.athletes.len();
        let x_max = self
            .athletes
            .iter()
            .map(|a| a.score)
            .max()
            .unwrap_or(1)
            .max(1) as f64;
        // Names are drawn inside the negative x band.
        let name_band = x_max * 0.45;

        let mut chart = ChartBuilder::on(&area)
            .caption(&self.title, ("sans-serif", 28).into_font())
            .margin(25)
            .set_label_area_size(LabelAreaPosition::Left, 10)
            .set_label_area_size(LabelAreaPosition::Bottom, 50)
            .build_cartesian_2d(-name_band..x_max * 1.1, 0.0..n.max(1) as f64)?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(0)
            .x_label_formatter(&|v| {
                if *v < 0.0 {
                    String::new()
                } else {
                    format!("{:.0}", v)
                }
            })
            .x_desc("Points (gold 3, silver 2, bronze 1)")
            .label_style(axis_font())
            .draw()?;

        let row_of = |rank: usize| (n - 1 - rank) as f64;
        for medal in Medal::STACK_ORDER {
            let color = medal_color(medal);
            let idx = medal.index();
            chart
                .draw_series(self.athletes.iter().enumerate().filter_map(|(rank, a)| {
                    let heights = a.weighted();
                    if heights[idx] == 0 {
                        return None;
                    }
                    let base: u32 = heights[..idx].iter().sum();
                    let y = row_of(rank);
                    Some(Rectangle::new(
                        [
                            (base as f64, y + 0.15),
                            ((base + heights[idx]) as f64, y + 0.85),
                        ],
                        color.filled(),
                    ))
                }))?
                .label(medal.name())
                .legend(move |pos| swatch(color, pos));
        }

        let name_style = annotation_style(15.0, Pos::new(HPos::Right, VPos::Center));
        chart.draw_series(self.athletes.iter().enumerate().map(|(rank, a)| {
            Text::new(
                short_name(&a.name, 28),
                (-x_max * 0.02, row_of(rank) + 0.5),
                name_style.clone(),
            )
        }))?;

        draw_legend(&mut chart, SeriesLabelPosition::LowerRight)?;
        area.present()?;
        Ok(())
    }
}

fn short_name(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        name.to_string()
    } else {
        let mut cut: String = name.chars().take(max_chars - 1).collect();
        cut.push('…');
        cut
    }
}

/// Cumulative points per athlete over the years.
pub struct HistoryPlot<'a> {
    pub lines: &'a [MedalHistoryEntry],
    pub title: String,
}

impl Plot for HistoryPlot<'_> {
    fn draw<DB>(&self, root: DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let area = root;
        area.fill(&WHITE)?;
        let (x_lo, x_hi, _) = year_axis(self.lines.iter().map(|e| e.year));
        let y_max = self.lines.iter().map(|e| e.score).max().unwrap_or(1).max(1) as f64;

        let mut chart = ChartBuilder::on(&area)
            .caption(&self.title, ("sans-serif", 28).into_font())
            .margin(25)
            .set_label_area_size(LabelAreaPosition::Left, 70)
            .set_label_area_size(LabelAreaPosition::Bottom, 50)
            .build_cartesian_2d(x_lo..x_hi, 0.0..y_max * 1.1)?;

        chart
            .configure_mesh()
            .x_label_formatter(&|v| format!("{:.0}", v))
            .y_label_formatter(&|v| format!("{:.0}", v))
            .x_desc("Year")
            .y_desc("Cumulative points")
            .label_style(axis_font())
            .draw()?;

        // Lines arrive grouped by athlete in rank order.
        let mut start = 0;
        let mut series = 0;
        while start < self.lines.len() {
            let id = self.lines[start].athlete_id;
            let end = self.lines[start..]
                .iter()
                .position(|e| e.athlete_id != id)
                .map_or(self.lines.len(), |offset| start + offset);
            let athlete = &self.lines[start..end];
            let color = Palette99::pick(series).to_rgba();
            let points: Vec<(f64, f64)> = athlete
                .iter()
                .map(|e| (e.year as f64, e.score as f64))
                .collect();
            chart
                .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
                .label(athlete[0].name.clone())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 30, y)], color.stroke_width(2))
                });
            chart.draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 4, color.filled())),
            )?;
            start = end;
            series += 1;
        }

        draw_legend(&mut chart, SeriesLabelPosition::UpperLeft)?;
        area.present()?;
        Ok(())
    }
}

/// Stacked medal counts per five-year age group.
pub struct AgeHistogramPlot<'a> {
    pub bins: &'a [AgeBin],
    pub title: String,
}

impl Plot for AgeHistogramPlot<'_> {
    fn draw<DB>(&self, root: DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let area = root;
        area.fill(&WHITE)?;
        let x_lo = self.bins.first().map_or(10, |b| b.lower) as f64;
        let x_hi = self.bins.last().map_or(70, |b| b.upper) as f64;
        let y_max = self.bins.iter().map(AgeBin::total).max().unwrap_or(1).max(1) as f64;

        let mut chart = ChartBuilder::on(&area)
            .caption(&self.title, ("sans-serif", 28).into_font())
            .margin(25)
            .set_label_area_size(LabelAreaPosition::Left, 70)
            .set_label_area_size(LabelAreaPosition::Bottom, 50)
            .build_cartesian_2d(x_lo..x_hi, 0.0..y_max * 1.1)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(self.bins.len() + 1)
            .x_label_formatter(&|v| format!("{:.0}", v))
            .y_label_formatter(&|v| format!("{:.0}", v))
            .x_desc("Age")
            .y_desc("Medals")
            .label_style(axis_font())
            .draw()?;

        for medal in Medal::STACK_ORDER {
            let color = medal_color(medal);
            chart
                .draw_series(self.bins.iter().filter(|b| b.count(medal) > 0).map(|b| {
                    let base: u32 = Medal::STACK_ORDER[..medal.index()]
                        .iter()
                        .map(|m| b.count(*m))
                        .sum();
                    Rectangle::new(
                        [
                            (b.lower as f64 + 0.3, base as f64),
                            (b.upper as f64 - 0.3, (base + b.count(medal)) as f64),
                        ],
                        color.filled(),
                    )
                }))?
                .label(medal.name())
                .legend(move |pos| swatch(color, pos));
        }

        draw_legend(&mut chart, SeriesLabelPosition::UpperRight)?;
        area.present()?;
        Ok(())
    }
}

/// Mean athlete age per sport across the Games.
pub struct AverageAgePlot<'a> {
    pub averages: &'a [AverageAge],
    pub title: String,
}

impl Plot for AverageAgePlot<'_> {
    fn draw<DB>(&self, root: DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let area = root;
        area.fill(&WHITE)?;
        let (x_lo, x_hi, _) = year_axis(self.averages.iter().map(|a| a.year));
        let y_lo = self
            .averages
            .iter()
            .map(|a| a.mean_age)
            .fold(f64::INFINITY, f64::min);
        let y_hi = self
            .averages
            .iter()
            .map(|a| a.mean_age)
            .fold(f64::NEG_INFINITY, f64::max);
        let (y_lo, y_hi) = if y_lo.is_finite() && y_hi.is_finite() {
            ((y_lo - 2.0).max(0.0), y_hi + 2.0)
        } else {
            (15.0, 50.0)
        };

        let mut chart = ChartBuilder::on(&area)
            .caption(&self.title, ("sans-serif", 28).into_font())
            .margin(25)
            .set_label_area_size(LabelAreaPosition::Left, 70)
            .set_label_area_size(LabelAreaPosition::Bottom, 50)
            .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

        chart
            .configure_mesh()
            .x_label_formatter(&|v| format!("{:.0}", v))
            .y_label_formatter(&|v| format!("{:.0}", v))
            .x_desc("Year")
            .y_desc("Mean age")
            .label_style(axis_font())
            .draw()?;

        let mut by_sport: BTreeMap<&str, Vec<(f64, f64)>> = BTreeMap::new();
        for avg in self.averages {
            by_sport
                .entry(avg.sport.as_str())
                .or_default()
                .push((avg.year as f64, avg.mean_age));
        }
        let labelled = by_sport.len() <= LEGEND_MAX_SERIES;
        for (idx, (sport, points)) in by_sport.into_iter().enumerate() {
            let color = Palette99::pick(idx).to_rgba();
            let series = chart.draw_series(LineSeries::new(points, color.stroke_width(2)))?;
            if labelled {
                series
                    .label(sport)
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 30, y)], color.stroke_width(2))
                    });
            }
        }

        if labelled {
            draw_legend(&mut chart, SeriesLabelPosition::UpperRight)?;
        }
        area.present()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_paths_keep_directory_and_extension() {
        let (a, b) = derive_split_paths(Path::new("out/ages.svg"), "hist", "avg");
        assert_eq!(a, PathBuf::from("out/ages_hist.svg"));
        assert_eq!(b, PathBuf::from("out/ages_avg.svg"));
    }

    #[test]
    fn year_axis_uses_smallest_gap() {
        let (lo, hi, half) = year_axis([1994u16, 1996, 1998].into_iter());
        assert_eq!(lo, 1992.0);
        assert_eq!(hi, 2000.0);
        assert!((half - 0.8).abs() < 1e-9);

        let (lo, hi, half) = year_axis([2000u16].into_iter());
        assert_eq!((lo, hi), (1996.0, 2004.0));
        assert!((half - 1.6).abs() < 1e-9);
    }

    #[test]
    fn long_names_are_shortened() {
        assert_eq!(short_name("Ana Silva", 28), "Ana Silva");
        let cut = short_name("Abcdefghijklmnopqrstuvwxyz Abcdef", 10);
        assert_eq!(cut.chars().count(), 10);
        assert!(cut.ends_with('…'));
    }
}
