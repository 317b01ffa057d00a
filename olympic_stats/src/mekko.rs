//! Marimekko (variable-width stacked bar) geometry for one country's medals.
//!
//! Each requested year becomes one bar. Segment heights are the share of each
//! medal type within the year; bar widths are the year's share of the
//! country's medals across all requested years. Bars are laid out left to
//! right with `x` holding the left edge, so consecutive bars are separated by
//! exactly the resolved padding.

use std::collections::BTreeSet;

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::{AthleteEvent, Medal, MedalRecord, StatsError};

/// Gap between bars on dense charts.
pub const DEFAULT_PADDING: f64 = 0.1;

/// How much horizontal space to leave between bars.
///
/// Dense charts use `fixed`. Sparse charts (few years or few medals) use
/// `sparse_scale / years` so short series do not drown in whitespace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaddingPolicy {
    pub fixed: f64,
    pub sparse_scale: f64,
    pub sparse_year_limit: usize,
    pub sparse_medal_limit: u64,
}

impl Default for PaddingPolicy {
    fn default() -> Self {
        Self {
            fixed: DEFAULT_PADDING,
            sparse_scale: 0.5,
            sparse_year_limit: 20,
            sparse_medal_limit: 10,
        }
    }
}

impl PaddingPolicy {
    pub fn fixed(padding: f64) -> Self {
        Self {
            fixed: padding,
            sparse_year_limit: 0,
            sparse_medal_limit: 0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), StatsError> {
        if !self.fixed.is_finite() || self.fixed <= 0.0 {
            return Err(StatsError::InvalidParameter(format!(
                "padding must be positive, got {}",
                self.fixed
            )));
        }
        if !self.sparse_scale.is_finite() || self.sparse_scale <= 0.0 {
            return Err(StatsError::InvalidParameter(format!(
                "sparse padding scale must be positive, got {}",
                self.sparse_scale
            )));
        }
        Ok(())
    }

    pub fn is_sparse(&self, years: usize, grand_total: u64) -> bool {
        years < self.sparse_year_limit || grand_total < self.sparse_medal_limit
    }

    /// Padding for `years` bars holding `grand_total` medals, 0 when there
    /// are no bars. A policy that would not pass [`validate`](Self::validate)
    /// falls back to [`DEFAULT_PADDING`] so x positions stay strictly increasing.
    pub fn resolve(&self, years: usize, grand_total: u64) -> f64 {
        if years == 0 {
            return 0.0;
        }
        let padding = if self.is_sparse(years, grand_total) {
            self.sparse_scale / years as f64
        } else {
            self.fixed
        };
        if padding.is_finite() && padding > 0.0 {
            padding
        } else {
            DEFAULT_PADDING
        }
    }
}

/// One year's bar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MekkoColumn {
    pub year: u16,
    /// Indexed by [`Medal::index`]: bronze, silver, gold.
    pub counts: [u64; 3],
    pub total: u64,
    pub proportions: [f64; 3],
    pub width: f64,
    pub x: f64,
}

impl MekkoColumn {
    pub fn count(&self, medal: Medal) -> u64 {
        self.counts[medal.index()]
    }

    pub fn proportion(&self, medal: Medal) -> f64 {
        self.proportions[medal.index()]
    }

    pub fn center(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

/// A single stacked rectangle ready for a charting backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MekkoSegment {
    pub year: u16,
    pub medal: Medal,
    pub proportion: f64,
    pub count: u64,
    pub width: f64,
    pub x: f64,
    pub center: f64,
    /// Cumulative proportion of the segments stacked below this one.
    pub base: f64,
    pub label: Option<String>,
    pub tooltip: String,
}

impl MekkoSegment {
    pub fn top(&self) -> f64 {
        self.base + self.proportion
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MekkoChart {
    pub columns: Vec<MekkoColumn>,
    pub padding: f64,
    pub grand_total: u64,
}

impl MekkoChart {
    /// True when there is nothing to draw: no years, or no medals in any year.
    pub fn is_empty(&self) -> bool {
        self.grand_total == 0
    }

    /// Horizontal extent with half a padding of margin on both sides.
    pub fn x_range(&self) -> (f64, f64) {
        let half = self.padding / 2.0;
        match self.columns.last() {
            Some(last) => (-half, last.right() + half),
            None => (0.0, 0.0),
        }
    }

    /// Segments ordered by year, then bronze → silver → gold.
    pub fn segments(&self) -> Vec<MekkoSegment> {
        let mut out = Vec::with_capacity(self.columns.len() * 3);
        for column in &self.columns {
            let mut base = 0.0;
            for medal in Medal::STACK_ORDER {
                let proportion = column.proportion(medal);
                let count = column.count(medal);
                let label = if medal == Medal::Gold && column.total > 0 {
                    Some(column.total.to_string())
                } else {
                    None
                };
                out.push(MekkoSegment {
                    year: column.year,
                    medal,
                    proportion,
                    count,
                    width: column.width,
                    x: column.x,
                    center: column.center(),
                    base,
                    label,
                    tooltip: format!(
                        "Year: {}\n{} medals: {}\n{} share: {:.2}",
                        column.year, medal, count, medal, proportion
                    ),
                });
                base += proportion;
            }
        }
        out
    }
}

/// Build the Marimekko layout for `records` over the requested `years`.
///
/// Years are sorted and de-duplicated; records outside the requested years
/// are ignored. A year with no medals keeps its slot with zero width and
/// zero proportions.
pub fn build_mekko(
    records: &[MedalRecord<'_>],
    years: &[u16],
    policy: &PaddingPolicy,
) -> MekkoChart {
    let years: Vec<u16> = years
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let n = years.len();

    let mut counts = Array2::<f64>::zeros((n, 3));
    for record in records {
        if let Ok(row) = years.binary_search(&record.year) {
            counts[[row, record.medal.index()]] += 1.0;
        }
    }

    let totals = counts.sum_axis(Axis(1));
    let grand_total = totals.sum();

    let mut proportions = counts.clone();
    for (mut row, &total) in proportions.outer_iter_mut().zip(totals.iter()) {
        if total > 0.0 {
            row /= total;
        } else {
            row.fill(0.0);
        }
    }

    let widths: Array1<f64> = if grand_total > 0.0 {
        &totals / grand_total
    } else {
        Array1::zeros(n)
    };

    let grand_total = grand_total as u64;
    let padding = policy.resolve(n, grand_total);

    let mut columns = Vec::with_capacity(n);
    let mut cursor = 0.0;
    for (i, &year) in years.iter().enumerate() {
        let width = widths[i];
        columns.push(MekkoColumn {
            year,
            counts: [
                counts[[i, 0]] as u64,
                counts[[i, 1]] as u64,
                counts[[i, 2]] as u64,
            ],
            total: totals[i] as u64,
            proportions: [proportions[[i, 0]], proportions[[i, 1]], proportions[[i, 2]]],
            width,
            x: cursor,
        });
        cursor += width + padding;
    }

    tracing::debug!(years = n, medals = grand_total, padding, "built marimekko layout");
    MekkoChart {
        columns,
        padding,
        grand_total,
    }
}

/// Years in which `country` appears in `rows`, medal or not.
pub fn country_years(rows: &[&AthleteEvent], country: &str) -> Vec<u16> {
    rows.iter()
        .filter(|r| r.matches_country(country))
        .map(|r| r.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Marimekko layout for one country over the years it took part in.
pub fn country_mekko(
    rows: &[&AthleteEvent],
    country: &str,
    policy: &PaddingPolicy,
) -> MekkoChart {
    let records: Vec<MedalRecord<'_>> = rows
        .iter()
        .filter(|r| r.matches_country(country))
        .filter_map(|r| r.medal_record())
        .collect();
    build_mekko(&records, &country_years(rows, country), policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::sample_rows;
    use crate::Sex;

    const EPS: f64 = 1e-9;

    fn record(year: u16, medal: Medal) -> MedalRecord<'static> {
        MedalRecord {
            noc: "BRA",
            year,
            medal,
            sport: "Judo",
            sex: Sex::Female,
        }
    }

    #[test]
    fn worked_example_widths_and_proportions() {
        let records = [
            record(2000, Medal::Gold),
            record(2000, Medal::Gold),
            record(2004, Medal::Silver),
        ];
        let chart = build_mekko(&records, &[2000, 2004, 2008], &PaddingPolicy::default());

        let c2000 = &chart.columns[0];
        assert!((c2000.proportion(Medal::Gold) - 1.0).abs() < EPS);
        assert!((c2000.width - 2.0 / 3.0).abs() < EPS);

        let c2004 = &chart.columns[1];
        assert!((c2004.proportion(Medal::Silver) - 1.0).abs() < EPS);
        assert!((c2004.width - 1.0 / 3.0).abs() < EPS);

        let c2008 = &chart.columns[2];
        assert_eq!(c2008.total, 0);
        assert_eq!(c2008.proportions, [0.0, 0.0, 0.0]);
        assert_eq!(c2008.width, 0.0);
        assert_eq!(chart.grand_total, 3);
    }

    #[test]
    fn proportions_sum_to_one_for_medal_years() {
        let records = [
            record(1996, Medal::Gold),
            record(1996, Medal::Bronze),
            record(1996, Medal::Bronze),
            record(2000, Medal::Silver),
            record(2000, Medal::Gold),
            record(2000, Medal::Bronze),
        ];
        let chart = build_mekko(&records, &[1996, 2000], &PaddingPolicy::default());
        for column in &chart.columns {
            let sum: f64 = column.proportions.iter().sum();
            assert!((sum - 1.0).abs() < EPS, "year {} sums to {}", column.year, sum);
        }
        let widths: f64 = chart.columns.iter().map(|c| c.width).sum();
        assert!((widths - 1.0).abs() < EPS);
    }

    #[test]
    fn no_medals_gives_all_zero_chart() {
        let chart = build_mekko(&[], &[1992, 1996, 2000], &PaddingPolicy::default());
        assert!(chart.is_empty());
        assert_eq!(chart.columns.len(), 3);
        for column in &chart.columns {
            assert_eq!(column.counts, [0, 0, 0]);
            assert!(column.proportions.iter().all(|p| *p == 0.0));
            assert!(column.width == 0.0 && column.x.is_finite());
        }
        assert!(chart.segments().iter().all(|s| !s.proportion.is_nan()));
    }

    #[test]
    fn no_years_gives_empty_chart() {
        let chart = build_mekko(&[record(2000, Medal::Gold)], &[], &PaddingPolicy::default());
        assert!(chart.is_empty());
        assert!(chart.columns.is_empty());
        assert_eq!(chart.padding, 0.0);
        assert_eq!(chart.x_range(), (0.0, 0.0));
    }

    #[test]
    fn x_positions_step_by_width_plus_padding() {
        let records = [
            record(2000, Medal::Gold),
            record(2004, Medal::Silver),
            record(2004, Medal::Bronze),
            record(2012, Medal::Gold),
        ];
        let years = [2012, 2000, 2004, 2008, 2004];
        let chart = build_mekko(&records, &years, &PaddingPolicy::default());
        let got: Vec<u16> = chart.columns.iter().map(|c| c.year).collect();
        assert_eq!(got, vec![2000, 2004, 2008, 2012]);

        assert_eq!(chart.columns[0].x, 0.0);
        for pair in chart.columns.windows(2) {
            let step = pair[1].x - pair[0].x;
            assert!((step - (pair[0].width + chart.padding)).abs() < EPS);
            assert!(pair[1].x > pair[0].x);
            assert!(pair[1].x >= pair[0].right());
        }
    }

    #[test]
    fn sparse_data_uses_adaptive_padding() {
        let policy = PaddingPolicy::default();
        let records = [record(2000, Medal::Gold)];
        let chart = build_mekko(&records, &[2000, 2004, 2008, 2012], &policy);
        assert!((chart.padding - 0.5 / 4.0).abs() < EPS);

        // 20+ years and 10+ medals: dense, fixed padding.
        let years: Vec<u16> = (0..24).map(|i| 1900 + i * 4).collect();
        let dense: Vec<MedalRecord<'static>> =
            years.iter().map(|&y| record(y, Medal::Bronze)).collect();
        let chart = build_mekko(&dense, &years, &policy);
        assert!((chart.padding - 0.1).abs() < EPS);
    }

    #[test]
    fn fixed_policy_ignores_sparsity() {
        let chart = build_mekko(
            &[record(2000, Medal::Gold)],
            &[2000, 2004],
            &PaddingPolicy::fixed(0.3),
        );
        assert!((chart.padding - 0.3).abs() < EPS);
        assert!(PaddingPolicy::fixed(-1.0).validate().is_err());
    }

    #[test]
    fn unvalidated_zero_padding_still_separates_bars() {
        let policy = PaddingPolicy::fixed(0.0);
        assert!(policy.validate().is_err());
        let chart = build_mekko(&[record(2000, Medal::Gold)], &[2000, 2004, 2008], &policy);
        assert!((chart.padding - DEFAULT_PADDING).abs() < EPS);
        for pair in chart.columns.windows(2) {
            assert!(pair[1].x > pair[0].x);
        }
        assert_eq!(PaddingPolicy::fixed(f64::NAN).resolve(3, 30), DEFAULT_PADDING);
        assert_eq!(policy.resolve(0, 0), 0.0);
    }

    #[test]
    fn segments_stack_bronze_silver_gold() {
        let records = [
            record(2000, Medal::Gold),
            record(2000, Medal::Silver),
            record(2000, Medal::Bronze),
            record(2000, Medal::Bronze),
        ];
        let chart = build_mekko(&records, &[2000], &PaddingPolicy::default());
        let segments = chart.segments();
        let order: Vec<Medal> = segments.iter().map(|s| s.medal).collect();
        assert_eq!(order, vec![Medal::Bronze, Medal::Silver, Medal::Gold]);
        assert_eq!(segments[0].base, 0.0);
        assert!((segments[1].base - 0.5).abs() < EPS);
        assert!((segments[2].top() - 1.0).abs() < EPS);
        assert_eq!(segments[2].label.as_deref(), Some("4"));
        assert!(segments[0].label.is_none());
        assert!(segments[0].tooltip.contains("Bronze medals: 2"));
        assert!(segments[0].tooltip.contains("Bronze share: 0.50"));
    }

    #[test]
    fn records_outside_requested_years_are_ignored() {
        let records = [record(1896, Medal::Gold), record(2000, Medal::Silver)];
        let chart = build_mekko(&records, &[2000], &PaddingPolicy::default());
        assert_eq!(chart.grand_total, 1);
        assert!((chart.columns[0].width - 1.0).abs() < EPS);
    }

    #[test]
    fn country_mekko_uses_participation_years() {
        let rows = sample_rows();
        let refs: Vec<&AthleteEvent> = rows.iter().collect();
        assert_eq!(country_years(&refs, "BRA"), vec![2000, 2004, 2008]);

        let chart = country_mekko(&refs, "Brazil", &PaddingPolicy::default());
        assert_eq!(chart.grand_total, 3);
        assert_eq!(chart.columns[0].count(Medal::Gold), 2);
        assert_eq!(chart.columns[1].count(Medal::Silver), 1);
        assert_eq!(chart.columns[2].total, 0);

        let none = country_mekko(&refs, "ARG", &PaddingPolicy::default());
        assert!(none.is_empty() && none.columns.is_empty());
    }
}
