//! Group-by / count / pivot tables behind the medal, participation,
//! medalist and age reports.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{AthleteEvent, Medal, Season, Sex};

/// First country name seen for each NOC. Team names vary per row
/// ("United States-1"), so reports key on the NOC and label with this.
pub fn country_names<'a>(rows: &[&'a AthleteEvent]) -> BTreeMap<&'a str, &'a str> {
    let mut names = BTreeMap::new();
    for &row in rows {
        names.entry(row.noc.as_str()).or_insert(row.country.as_str());
    }
    names
}

/// Keep one medal per (NOC, Games, event, medal) so team events count once
/// per country. Rows without a medal pass through untouched.
pub fn dedupe_team_medals<'a>(rows: &[&'a AthleteEvent]) -> Vec<&'a AthleteEvent> {
    let mut seen: HashSet<(&str, u16, Season, &str, Medal)> = HashSet::new();
    let out: Vec<&AthleteEvent> = rows
        .iter()
        .copied()
        .filter(|&row| match row.medal {
            Some(medal) => seen.insert((
                row.noc.as_str(),
                row.year,
                row.season,
                row.event.as_str(),
                medal,
            )),
            None => true,
        })
        .collect();
    tracing::debug!(before = rows.len(), after = out.len(), "deduplicated team medals");
    out
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalCount {
    pub noc: String,
    pub country: String,
    pub year: u16,
    pub gold: u32,
    pub silver: u32,
    pub bronze: u32,
    pub total: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MedalSort {
    Year,
    Total,
    Gold,
    Silver,
    Bronze,
    Country,
}

/// Medal totals per (NOC, year), only for groups that won something.
/// Ordered by year, then NOC.
pub fn medal_counts(rows: &[&AthleteEvent]) -> Vec<MedalCount> {
    let names = country_names(rows);
    let mut groups: BTreeMap<(u16, &str), [u32; 3]> = BTreeMap::new();
    for row in rows {
        if let Some(medal) = row.medal {
            groups.entry((row.year, row.noc.as_str())).or_default()[medal.index()] += 1;
        }
    }
    groups
        .into_iter()
        .map(|((year, noc), tally)| MedalCount {
            noc: noc.to_string(),
            country: names.get(noc).copied().unwrap_or(noc).to_string(),
            year,
            bronze: tally[Medal::Bronze.index()],
            silver: tally[Medal::Silver.index()],
            gold: tally[Medal::Gold.index()],
            total: tally.iter().sum(),
        })
        .collect()
}

/// Stable sort: counts descend, year and country ascend.
pub fn sort_medal_counts(counts: &mut [MedalCount], key: MedalSort) {
    match key {
        MedalSort::Year => counts.sort_by_key(|c| c.year),
        MedalSort::Total => counts.sort_by(|a, b| b.total.cmp(&a.total)),
        MedalSort::Gold => counts.sort_by(|a, b| b.gold.cmp(&a.gold)),
        MedalSort::Silver => counts.sort_by(|a, b| b.silver.cmp(&a.silver)),
        MedalSort::Bronze => counts.sort_by(|a, b| b.bronze.cmp(&a.bronze)),
        MedalSort::Country => counts.sort_by(|a, b| a.country.cmp(&b.country)),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalDetail {
    pub noc: String,
    pub country: String,
    pub year: u16,
    pub sport: String,
    pub sex: Sex,
    pub count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetailSort {
    Count,
    Year,
}

/// Medals per (NOC, year, sport, sex).
pub fn medal_details(rows: &[&AthleteEvent]) -> Vec<MedalDetail> {
    let names = country_names(rows);
    let mut groups: BTreeMap<(&str, u16, &str, Sex), u32> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.medal.is_some()) {
        *groups
            .entry((row.noc.as_str(), row.year, row.sport.as_str(), row.sex))
            .or_default() += 1;
    }
    groups
        .into_iter()
        .map(|((noc, year, sport, sex), count)| MedalDetail {
            noc: noc.to_string(),
            country: names.get(noc).copied().unwrap_or(noc).to_string(),
            year,
            sport: sport.to_string(),
            sex,
            count,
        })
        .collect()
}

pub fn sort_medal_details(details: &mut [MedalDetail], key: DetailSort) {
    match key {
        DetailSort::Count => details.sort_by(|a, b| b.count.cmp(&a.count)),
        DetailSort::Year => details.sort_by_key(|d| d.year),
    }
}

/// One choropleth frame cell: a country's medal total in one year.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapFrame {
    pub year: u16,
    pub noc: String,
    pub country: String,
    pub total_medals: u32,
}

/// Every country in `all_rows` × every year in `rows`, zero-filled.
///
/// `all_rows` is the unfiltered table so countries without medals under the
/// current filter still get a frame cell.
pub fn map_frames(all_rows: &[&AthleteEvent], rows: &[&AthleteEvent]) -> Vec<MapFrame> {
    let names = country_names(all_rows);
    let years: BTreeSet<u16> = rows.iter().map(|r| r.year).collect();
    let totals: HashMap<(u16, String), u32> = medal_counts(rows)
        .into_iter()
        .map(|c| ((c.year, c.noc), c.total))
        .collect();

    let mut frames = Vec::with_capacity(years.len() * names.len());
    for &year in &years {
        for (&noc, &country) in &names {
            frames.push(MapFrame {
                year,
                noc: noc.to_string(),
                country: country.to_string(),
                total_medals: totals.get(&(year, noc.to_string())).copied().unwrap_or(0),
            });
        }
    }
    frames
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Participation {
    pub year: u16,
    pub noc: String,
    pub country: String,
}

/// Distinct (year, NOC) pairs with at least one entry, ordered by year then NOC.
pub fn participation(rows: &[&AthleteEvent]) -> Vec<Participation> {
    let names = country_names(rows);
    let pairs: BTreeSet<(u16, &str)> = rows.iter().map(|r| (r.year, r.noc.as_str())).collect();
    pairs
        .into_iter()
        .map(|(year, noc)| Participation {
            year,
            noc: noc.to_string(),
            country: names.get(noc).copied().unwrap_or(noc).to_string(),
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipationSummary {
    pub noc: String,
    pub country: String,
    pub games: u32,
}

/// Games attended per country, most first, ties by country name.
pub fn participation_summary(entries: &[Participation]) -> Vec<ParticipationSummary> {
    let mut per_noc: BTreeMap<&str, (&str, u32)> = BTreeMap::new();
    for entry in entries {
        per_noc
            .entry(entry.noc.as_str())
            .or_insert((entry.country.as_str(), 0))
            .1 += 1;
    }
    let mut out: Vec<ParticipationSummary> = per_noc
        .into_iter()
        .map(|(noc, (country, games))| ParticipationSummary {
            noc: noc.to_string(),
            country: country.to_string(),
            games,
        })
        .collect();
    out.sort_by(|a, b| b.games.cmp(&a.games).then_with(|| a.country.cmp(&b.country)));
    out
}

/// Number of participating NOCs per year.
pub fn participants_per_year(entries: &[Participation]) -> Vec<(u16, u32)> {
    let mut per_year: BTreeMap<u16, u32> = BTreeMap::new();
    for entry in entries {
        *per_year.entry(entry.year).or_default() += 1;
    }
    per_year.into_iter().collect()
}

/// An athlete's running medal tally after one medal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalHistoryEntry {
    pub athlete_id: u64,
    pub name: String,
    pub sport: String,
    pub year: u16,
    pub bronze: u32,
    pub silver: u32,
    pub gold: u32,
    pub score: u32,
}

fn score(bronze: u32, silver: u32, gold: u32) -> u32 {
    bronze * Medal::Bronze.weight()
        + silver * Medal::Silver.weight()
        + gold * Medal::Gold.weight()
}

/// Running tallies per athlete in chronological order. Medals won in the same
/// year keep input order.
pub fn medal_history(rows: &[&AthleteEvent]) -> Vec<MedalHistoryEntry> {
    let mut per_athlete: BTreeMap<u64, Vec<&AthleteEvent>> = BTreeMap::new();
    for &row in rows.iter().filter(|r| r.medal.is_some()) {
        per_athlete.entry(row.id).or_default().push(row);
    }

    let mut out = Vec::new();
    for (id, mut medals) in per_athlete {
        medals.sort_by_key(|r| r.year);
        let (mut bronze, mut silver, mut gold) = (0u32, 0u32, 0u32);
        for row in medals {
            match row.medal {
                Some(Medal::Bronze) => bronze += 1,
                Some(Medal::Silver) => silver += 1,
                Some(Medal::Gold) => gold += 1,
                None => continue,
            }
            out.push(MedalHistoryEntry {
                athlete_id: id,
                name: row.name.clone(),
                sport: row.sport.clone(),
                year: row.year,
                bronze,
                silver,
                gold,
                score: score(bronze, silver, gold),
            });
        }
    }
    out
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalistTotal {
    pub athlete_id: u64,
    pub name: String,
    pub sport: String,
    pub bronze: u32,
    pub silver: u32,
    pub gold: u32,
    pub score: u32,
}

impl MedalistTotal {
    /// Stacked bar heights in stack order: bronze·1, silver·2, gold·3.
    pub fn weighted(&self) -> [u32; 3] {
        [
            self.bronze * Medal::Bronze.weight(),
            self.silver * Medal::Silver.weight(),
            self.gold * Medal::Gold.weight(),
        ]
    }
}

/// The `n` highest-scoring athletes, best first, ties broken by name.
pub fn top_medalists(history: &[MedalHistoryEntry], n: usize) -> Vec<MedalistTotal> {
    let mut last: BTreeMap<u64, &MedalHistoryEntry> = BTreeMap::new();
    for entry in history {
        // History is chronological per athlete, so the last entry is the final tally.
        last.insert(entry.athlete_id, entry);
    }
    let mut totals: Vec<MedalistTotal> = last
        .into_values()
        .map(|e| MedalistTotal {
            athlete_id: e.athlete_id,
            name: e.name.clone(),
            sport: e.sport.clone(),
            bronze: e.bronze,
            silver: e.silver,
            gold: e.gold,
            score: e.score,
        })
        .collect();
    totals.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
    totals.truncate(n);
    totals
}

/// Year-end tallies of the top `n` athletes, ordered by athlete rank then year.
pub fn history_lines(history: &[MedalHistoryEntry], n: usize) -> Vec<MedalHistoryEntry> {
    let top = top_medalists(history, n);
    let rank: HashMap<u64, usize> = top
        .iter()
        .enumerate()
        .map(|(i, t)| (t.athlete_id, i))
        .collect();

    let mut year_end: BTreeMap<(usize, u16), &MedalHistoryEntry> = BTreeMap::new();
    for entry in history {
        if let Some(&r) = rank.get(&entry.athlete_id) {
            year_end.insert((r, entry.year), entry);
        }
    }
    year_end.into_values().cloned().collect()
}

pub const AGE_BIN_START: u32 = 10;
pub const AGE_BIN_END: u32 = 70;
pub const AGE_BIN_WIDTH: u32 = 5;

/// Right-inclusive age interval `(lower, upper]` with medals per type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBin {
    pub lower: u32,
    pub upper: u32,
    pub bronze: u32,
    pub silver: u32,
    pub gold: u32,
}

impl AgeBin {
    pub fn label(&self) -> String {
        format!("{} to {}", self.lower, self.upper)
    }

    pub fn total(&self) -> u32 {
        self.bronze + self.silver + self.gold
    }

    pub fn count(&self, medal: Medal) -> u32 {
        match medal {
            Medal::Bronze => self.bronze,
            Medal::Silver => self.silver,
            Medal::Gold => self.gold,
        }
    }
}

fn age_bin_index(age: f64) -> Option<usize> {
    let start = AGE_BIN_START as f64;
    let end = AGE_BIN_END as f64;
    if !age.is_finite() || age <= start || age > end {
        return None;
    }
    Some(((age - start) / AGE_BIN_WIDTH as f64).ceil() as usize - 1)
}

/// Medalists per 5-year age bin from (10, 15] to (65, 70]. Every bin is
/// present; ages outside the range or missing are dropped.
pub fn age_histogram(rows: &[&AthleteEvent]) -> Vec<AgeBin> {
    let mut bins: Vec<AgeBin> = (AGE_BIN_START..AGE_BIN_END)
        .step_by(AGE_BIN_WIDTH as usize)
        .map(|lower| AgeBin {
            lower,
            upper: lower + AGE_BIN_WIDTH,
            bronze: 0,
            silver: 0,
            gold: 0,
        })
        .collect();
    for row in rows {
        let (Some(medal), Some(age)) = (row.medal, row.age) else {
            continue;
        };
        if let Some(bin) = age_bin_index(age).and_then(|i| bins.get_mut(i)) {
            match medal {
                Medal::Bronze => bin.bronze += 1,
                Medal::Silver => bin.silver += 1,
                Medal::Gold => bin.gold += 1,
            }
        }
    }
    bins
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AverageAge {
    pub sport: String,
    pub year: u16,
    pub mean_age: f64,
    pub athletes: u32,
}

/// Mean age per (sport, year), skipping rows without an age.
pub fn average_age(rows: &[&AthleteEvent]) -> Vec<AverageAge> {
    let mut groups: BTreeMap<(&str, u16), (f64, u32)> = BTreeMap::new();
    for row in rows {
        if let Some(age) = row.age {
            let slot = groups.entry((row.sport.as_str(), row.year)).or_default();
            slot.0 += age;
            slot.1 += 1;
        }
    }
    groups
        .into_iter()
        .map(|((sport, year), (sum, count))| AverageAge {
            sport: sport.to_string(),
            year,
            mean_age: sum / count as f64,
            athletes: count,
        })
        .collect()
}

/// Shape of a loaded table, for the `inspect` report.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub medal_rows: usize,
    pub first_year: Option<u16>,
    pub last_year: Option<u16>,
    pub games: usize,
    pub nocs: usize,
    pub sports: Vec<String>,
    pub missing_age: usize,
    pub missing_height: usize,
    pub missing_weight: usize,
    pub medals: BTreeMap<Medal, usize>,
}

pub fn summarize(rows: &[&AthleteEvent]) -> DatasetSummary {
    let mut summary = DatasetSummary {
        rows: rows.len(),
        ..DatasetSummary::default()
    };
    let mut games: HashSet<(u16, Season)> = HashSet::new();
    let mut nocs: HashSet<&str> = HashSet::new();
    let mut sports: BTreeSet<&str> = BTreeSet::new();
    for row in rows {
        games.insert((row.year, row.season));
        nocs.insert(&row.noc);
        sports.insert(&row.sport);
        summary.first_year = Some(summary.first_year.map_or(row.year, |y| y.min(row.year)));
        summary.last_year = Some(summary.last_year.map_or(row.year, |y| y.max(row.year)));
        summary.missing_age += row.age.is_none() as usize;
        summary.missing_height += row.height.is_none() as usize;
        summary.missing_weight += row.weight.is_none() as usize;
        if let Some(medal) = row.medal {
            summary.medal_rows += 1;
            *summary.medals.entry(medal).or_default() += 1;
        }
    }
    summary.games = games.len();
    summary.nocs = nocs.len();
    summary.sports = sports.into_iter().map(str::to_string).collect();
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::sample_rows;
    use crate::parse_records;

    fn refs(rows: &[AthleteEvent]) -> Vec<&AthleteEvent> {
        rows.iter().collect()
    }

    const TEAM: &str = "\
ID,Name,Sex,Age,Height,Weight,Team,NOC,Games,Year,Season,City,Sport,Event,Medal
10,P1,M,25,NA,NA,Italy,ITA,2000 Summer,2000,Summer,Sydney,Water Polo,Water Polo Men's Water Polo,Gold
11,P2,M,26,NA,NA,Italy,ITA,2000 Summer,2000,Summer,Sydney,Water Polo,Water Polo Men's Water Polo,Gold
12,P3,M,27,NA,NA,Italy,ITA,2000 Summer,2000,Summer,Sydney,Fencing,Fencing Men's Foil,Silver
10,P1,M,29,NA,NA,Italy,ITA,2004 Summer,2004,Summer,Athina,Water Polo,Water Polo Men's Water Polo,Bronze
10,P1,M,33,NA,NA,Italy,ITA,2008 Summer,2008,Summer,Beijing,Water Polo,Water Polo Men's Water Polo,Gold
13,P4,F,NA,NA,NA,Spain,ESP,2008 Summer,2008,Summer,Beijing,Judo,Judo Women's Lightweight,NA
";

    #[test]
    fn medal_counts_group_by_noc_and_year() {
        let rows = sample_rows();
        let counts = medal_counts(&refs(&rows));
        let bra2000 = counts
            .iter()
            .find(|c| c.noc == "BRA" && c.year == 2000)
            .unwrap();
        assert_eq!((bra2000.gold, bra2000.silver, bra2000.bronze), (2, 0, 0));
        assert_eq!(bra2000.total, 2);
        assert!(counts.iter().all(|c| c.total > 0));
        let years: Vec<u16> = counts.iter().map(|c| c.year).collect();
        let mut sorted = years.clone();
        sorted.sort();
        assert_eq!(years, sorted);
    }

    #[test]
    fn sorting_medal_counts() {
        let rows = sample_rows();
        let mut counts = medal_counts(&refs(&rows));
        sort_medal_counts(&mut counts, MedalSort::Total);
        assert_eq!(counts[0].noc, "BRA");
        assert_eq!(counts[0].total, 2);
        sort_medal_counts(&mut counts, MedalSort::Country);
        assert_eq!(counts[0].country, "Brazil");
        sort_medal_counts(&mut counts, MedalSort::Bronze);
        assert_eq!(counts[0].noc, "NOR");
    }

    #[test]
    fn team_medals_dedupe_per_event() {
        let rows = parse_records(TEAM.as_bytes()).unwrap();
        let all = refs(&rows);
        let deduped = dedupe_team_medals(&all);
        assert_eq!(deduped.len(), all.len() - 1);
        let counts = medal_counts(&deduped);
        let ita2000 = counts.iter().find(|c| c.year == 2000).unwrap();
        assert_eq!((ita2000.gold, ita2000.silver), (1, 1));
    }

    #[test]
    fn details_count_only_medals() {
        let rows = sample_rows();
        let mut details = medal_details(&refs(&rows));
        assert!(details.iter().all(|d| d.count > 0));
        sort_medal_details(&mut details, DetailSort::Count);
        assert_eq!(details[0].sport, "Swimming");
        assert_eq!(details[0].count, 2);
        assert_eq!(details[0].sex, Sex::Female);
    }

    #[test]
    fn map_frames_zero_fill_countries() {
        let rows = sample_rows();
        let all = refs(&rows);
        let summer: Vec<&AthleteEvent> = all
            .iter()
            .copied()
            .filter(|r| r.season == Season::Summer)
            .collect();
        let frames = map_frames(&all, &summer);
        // 5 summer years × 4 countries.
        assert_eq!(frames.len(), 20);
        let nor = frames
            .iter()
            .find(|f| f.noc == "NOR" && f.year == 2000)
            .unwrap();
        assert_eq!(nor.total_medals, 0);
        let bra = frames
            .iter()
            .find(|f| f.noc == "BRA" && f.year == 2000)
            .unwrap();
        assert_eq!(bra.total_medals, 2);
    }

    #[test]
    fn participation_counts_games() {
        let rows = sample_rows();
        let entries = participation(&refs(&rows));
        assert_eq!(entries.len(), 6);
        let summary = participation_summary(&entries);
        assert_eq!(summary[0].noc, "BRA");
        assert_eq!(summary[0].games, 3);
        let per_year = participants_per_year(&entries);
        assert_eq!(per_year.first(), Some(&(1900, 1)));
        assert_eq!(per_year.len(), 6);
    }

    #[test]
    fn history_accumulates_and_scores() {
        let rows = parse_records(TEAM.as_bytes()).unwrap();
        let history = medal_history(&refs(&rows));
        let p1: Vec<&MedalHistoryEntry> =
            history.iter().filter(|e| e.athlete_id == 10).collect();
        assert_eq!(p1.len(), 3);
        assert_eq!(p1[0].score, 3);
        assert_eq!((p1[1].bronze, p1[1].gold), (1, 1));
        assert_eq!(p1[2].score, 3 + 1 + 3);

        let top = top_medalists(&history, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "P1");
        assert_eq!(top[0].weighted(), [1, 0, 6]);
        assert_eq!(top[1].name, "P2");

        let lines = history_lines(&history, 1);
        let years: Vec<u16> = lines.iter().map(|l| l.year).collect();
        assert_eq!(years, vec![2000, 2004, 2008]);
    }

    #[test]
    fn age_bins_are_right_inclusive() {
        assert_eq!(age_bin_index(15.0), Some(0));
        assert_eq!(age_bin_index(15.5), Some(1));
        assert_eq!(age_bin_index(10.0), None);
        assert_eq!(age_bin_index(70.0), Some(11));
        assert_eq!(age_bin_index(71.0), None);

        let rows = sample_rows();
        let bins = age_histogram(&refs(&rows));
        assert_eq!(bins.len(), 12);
        assert_eq!(bins[0].label(), "10 to 15");
        assert_eq!((bins[2].lower, bins[2].upper), (20, 25));
        // Ana Silva (22) won two golds.
        assert_eq!(bins[2].gold, 2);
        let total: u32 = bins.iter().map(AgeBin::total).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn average_age_by_sport_and_year() {
        let rows = parse_records(TEAM.as_bytes()).unwrap();
        let averages = average_age(&refs(&rows));
        let polo2000 = averages
            .iter()
            .find(|a| a.sport == "Water Polo" && a.year == 2000)
            .unwrap();
        assert!((polo2000.mean_age - 25.5).abs() < 1e-9);
        assert_eq!(polo2000.athletes, 2);
        assert!(averages.iter().all(|a| a.sport != "Judo"));
    }

    #[test]
    fn summary_counts_shape() {
        let rows = sample_rows();
        let summary = summarize(&refs(&rows));
        assert_eq!(summary.rows, 7);
        assert_eq!(summary.medal_rows, 5);
        assert_eq!(summary.first_year, Some(1900));
        assert_eq!(summary.last_year, Some(2008));
        assert_eq!(summary.nocs, 4);
        assert_eq!(summary.medals.get(&Medal::Gold), Some(&3));
        assert_eq!(summary.missing_height, 1);
    }
}
