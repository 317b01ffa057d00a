//! Olympic athlete-event aggregations and Marimekko chart geometry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod filter;
pub mod mekko;
pub mod tally;

pub use filter::Filter;
pub use mekko::{build_mekko, MekkoChart, MekkoColumn, MekkoSegment, PaddingPolicy};

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("malformed CSV at line {line}: {message}")]
    Csv { line: u64, message: String },
    #[error("unknown medal type: {0}")]
    UnknownMedal(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("invalid preset: {0}")]
    Preset(String),
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Medal {
    Bronze,
    Silver,
    Gold,
}

impl Medal {
    /// Bottom-to-top order used when stacking segments.
    pub const STACK_ORDER: [Medal; 3] = [Medal::Bronze, Medal::Silver, Medal::Gold];

    pub fn index(self) -> usize {
        match self {
            Medal::Bronze => 0,
            Medal::Silver => 1,
            Medal::Gold => 2,
        }
    }

    /// Points used to rank athletes: gold 3, silver 2, bronze 1.
    pub fn weight(self) -> u32 {
        self.index() as u32 + 1
    }

    /// Display colour: bronze #cd7f32, silver #c0c0c0, gold #ffd700.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Medal::Bronze => (205, 127, 50),
            Medal::Silver => (192, 192, 192),
            Medal::Gold => (255, 215, 0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Medal::Bronze => "Bronze",
            Medal::Silver => "Silver",
            Medal::Gold => "Gold",
        }
    }
}

impl fmt::Display for Medal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Medal {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gold" | "ouro" => Ok(Medal::Gold),
            "silver" | "prata" => Ok(Medal::Silver),
            "bronze" => Ok(Medal::Bronze),
            _ => Err(StatsError::UnknownMedal(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Season {
    Summer,
    Winter,
}

impl FromStr for Season {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summer" | "verão" | "verao" => Ok(Season::Summer),
            "winter" | "inverno" => Ok(Season::Winter),
            _ => Err(StatsError::InvalidParameter(format!("unknown season '{}'", s))),
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::Summer => f.write_str("Summer"),
            Season::Winter => f.write_str("Winter"),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sex {
    Female,
    Male,
}

impl FromStr for Sex {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "F" | "FEMALE" => Ok(Sex::Female),
            "M" | "MALE" => Ok(Sex::Male),
            _ => Err(StatsError::InvalidParameter(format!("unknown sex '{}'", s))),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Female => f.write_str("Female"),
            Sex::Male => f.write_str("Male"),
        }
    }
}

/// One athlete's entry in one event at one Games.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AthleteEvent {
    pub id: u64,
    pub name: String,
    pub sex: Sex,
    pub age: Option<f64>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub team: String,
    pub noc: String,
    pub country: String,
    pub games: String,
    pub year: u16,
    pub season: Season,
    pub city: String,
    pub sport: String,
    pub event: String,
    pub medal: Option<Medal>,
}

impl AthleteEvent {
    /// Case-insensitive match on either the NOC code or the country name.
    pub fn matches_country(&self, key: &str) -> bool {
        let key = key.trim();
        self.noc.eq_ignore_ascii_case(key) || self.country.eq_ignore_ascii_case(key)
    }

    pub fn medal_record(&self) -> Option<MedalRecord<'_>> {
        self.medal.map(|medal| MedalRecord {
            noc: &self.noc,
            year: self.year,
            medal,
            sport: &self.sport,
            sex: self.sex,
        })
    }
}

/// The medal-bearing projection of an [`AthleteEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MedalRecord<'a> {
    pub noc: &'a str,
    pub year: u16,
    pub medal: Medal,
    pub sport: &'a str,
    pub sex: Sex,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Sex")]
    sex: String,
    #[serde(rename = "Age", default)]
    age: Option<String>,
    #[serde(rename = "Height", default)]
    height: Option<String>,
    #[serde(rename = "Weight", default)]
    weight: Option<String>,
    #[serde(rename = "Team", default)]
    team: Option<String>,
    #[serde(rename = "NOC")]
    noc: String,
    #[serde(rename = "Games", default)]
    games: Option<String>,
    #[serde(rename = "Year")]
    year: String,
    #[serde(rename = "Season")]
    season: String,
    #[serde(rename = "City", default)]
    city: Option<String>,
    #[serde(rename = "Sport")]
    sport: String,
    #[serde(rename = "Event", default)]
    event: Option<String>,
    #[serde(rename = "Medal", default)]
    medal: Option<String>,
    #[serde(rename = "País", alias = "Country", alias = "region", default)]
    country: Option<String>,
}

/// Empty cells and the literal `NA` both mean "missing".
fn cell(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "NA")
}

fn numeric_cell(value: Option<String>, column: &str, line: u64) -> Result<Option<f64>, StatsError> {
    match cell(value) {
        None => Ok(None),
        Some(text) => text.parse::<f64>().map(Some).map_err(|_| StatsError::Csv {
            line,
            message: format!("{} '{}' is not a number", column, text),
        }),
    }
}

impl RawRow {
    fn into_event(self, line: u64) -> Result<AthleteEvent, StatsError> {
        let csv_err = |message: String| StatsError::Csv { line, message };

        let id = match cell(Some(self.id)) {
            Some(text) => text
                .parse::<u64>()
                .map_err(|_| csv_err(format!("ID '{}' is not an integer", text)))?,
            None => return Err(csv_err("ID is missing".into())),
        };
        let year = self
            .year
            .trim()
            .parse::<u16>()
            .map_err(|_| csv_err(format!("Year '{}' is not a valid year", self.year)))?;
        let sex = self.sex.parse::<Sex>().map_err(|e| csv_err(e.to_string()))?;
        let season = self
            .season
            .parse::<Season>()
            .map_err(|e| csv_err(e.to_string()))?;
        let medal = match cell(self.medal) {
            Some(text) => Some(text.parse::<Medal>().map_err(|e| csv_err(e.to_string()))?),
            None => None,
        };
        let noc = self.noc.trim().to_ascii_uppercase();
        if noc.is_empty() {
            return Err(csv_err("NOC is empty".into()));
        }
        let team = cell(self.team).unwrap_or_default();
        let country = cell(self.country).unwrap_or_else(|| {
            if team.is_empty() {
                noc.clone()
            } else {
                team.clone()
            }
        });

        Ok(AthleteEvent {
            id,
            name: cell(self.name).unwrap_or_default(),
            sex,
            age: numeric_cell(self.age, "Age", line)?,
            height: numeric_cell(self.height, "Height", line)?,
            weight: numeric_cell(self.weight, "Weight", line)?,
            team,
            noc,
            country,
            games: cell(self.games).unwrap_or_else(|| format!("{} {}", year, season)),
            year,
            season,
            city: cell(self.city).unwrap_or_default(),
            sport: self.sport.trim().to_string(),
            event: cell(self.event).unwrap_or_default(),
            medal,
        })
    }
}

/// Parse athlete-event rows from CSV bytes with a header line.
pub fn parse_records(input: &[u8]) -> Result<Vec<AthleteEvent>, StatsError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| StatsError::Csv {
            line: 1,
            message: e.to_string(),
        })?
        .clone();
    // Athletes are told apart by ID alone; names repeat across the table.
    if !headers.iter().any(|h| h == "ID") {
        return Err(StatsError::Csv {
            line: 1,
            message: "missing required column 'ID'".into(),
        });
    }

    let mut out = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| StatsError::Csv {
            line: e.position().map(|p| p.line()).unwrap_or(0),
            message: e.to_string(),
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let raw: RawRow = record
            .deserialize(Some(&headers))
            .map_err(|e| StatsError::Csv {
                line,
                message: e.to_string(),
            })?;
        out.push(raw.into_event(line)?);
    }
    tracing::debug!(rows = out.len(), "parsed athlete-event rows");
    Ok(out)
}

/// Reusable filter and layout settings loaded from JSON.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Preset {
    pub filter: Filter,
    pub padding: PaddingPolicy,
}

impl Preset {
    pub fn from_json(text: &str) -> Result<Self, StatsError> {
        let preset: Preset =
            serde_json::from_str(text).map_err(|e| StatsError::Preset(e.to_string()))?;
        preset.padding.validate()?;
        Ok(preset)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = "\
ID,Name,Sex,Age,Height,Weight,Team,NOC,Games,Year,Season,City,Sport,Event,Medal
1,A Dijiang,M,24,180,80,China,CHN,1992 Summer,1992,Summer,Barcelona,Basketball,Basketball Men's Basketball,NA
2,Edgar Aabye,M,34,NA,NA,Denmark/Sweden,DEN,1900 Summer,1900,Summer,Paris,Tug-Of-War,Tug-Of-War Men's Tug-Of-War,Gold
3,Ana Silva,F,22,170,60,Brazil,BRA,2000 Summer,2000,Summer,Sydney,Swimming,Swimming Women's 100 metres Freestyle,Gold
4,Ana Silva,F,22,170,60,Brazil,BRA,2000 Summer,2000,Summer,Sydney,Swimming,Swimming Women's 200 metres Freestyle,Gold
5,Bruno Costa,M,28,185,82,Brazil,BRA,2004 Summer,2004,Summer,Athina,Judo,Judo Men's Lightweight,Silver
6,Carla Souza,F,19,160,50,Brazil,BRA,2008 Summer,2008,Summer,Beijing,Judo,Judo Women's Lightweight,NA
7,Erik Berg,M,31,190,90,Norway,NOR,2006 Winter,2006,Winter,Torino,Biathlon,Biathlon Men's 20 kilometres,Bronze
";

    pub(crate) fn sample_rows() -> Vec<AthleteEvent> {
        parse_records(SAMPLE.as_bytes()).expect("sample parses")
    }

    #[test]
    fn parses_na_cells_as_missing() {
        let rows = sample_rows();
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0].medal, None);
        assert_eq!(rows[1].height, None);
        assert_eq!(rows[1].medal, Some(Medal::Gold));
        assert_eq!(rows[6].season, Season::Winter);
        assert_eq!(rows[2].country, "Brazil");
    }

    #[test]
    fn country_column_overrides_team() {
        let csv = "\
ID,Name,Sex,Age,Height,Weight,Team,NOC,Games,Year,Season,City,Sport,Event,Medal,País
1,X,F,20,NA,NA,United States-1,USA,2000 Summer,2000,Summer,Sydney,Rowing,Rowing Women's Eights,Gold,Estados Unidos
";
        let rows = parse_records(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].country, "Estados Unidos");
        assert!(rows[0].matches_country("usa"));
        assert!(rows[0].matches_country("estados unidos"));
    }

    #[test]
    fn bad_medal_reports_line() {
        let csv = "\
ID,Name,Sex,Age,Height,Weight,Team,NOC,Games,Year,Season,City,Sport,Event,Medal
1,X,F,20,NA,NA,Chile,CHI,2000 Summer,2000,Summer,Sydney,Judo,Judo,Gold
2,Y,F,20,NA,NA,Chile,CHI,2000 Summer,2000,Summer,Sydney,Judo,Judo,Platinum
";
        match parse_records(csv.as_bytes()) {
            Err(StatsError::Csv { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("Platinum"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn id_column_is_required() {
        let csv = "\
Name,Sex,Age,Height,Weight,Team,NOC,Games,Year,Season,City,Sport,Event,Medal
Alice,F,20,NA,NA,Chile,CHI,2000 Summer,2000,Summer,Sydney,Judo,Judo,Gold
Bob,M,24,NA,NA,Peru,PER,2004 Summer,2004,Summer,Athina,Judo,Judo,Gold
";
        match parse_records(csv.as_bytes()) {
            Err(StatsError::Csv { line, message }) => {
                assert_eq!(line, 1);
                assert!(message.contains("ID"));
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let csv = "\
ID,Name,Sex,Age,Height,Weight,Team,NOC,Games,Year,Season,City,Sport,Event,Medal
1,Alice,F,20,NA,NA,Chile,CHI,2000 Summer,2000,Summer,Sydney,Judo,Judo,Gold
NA,Bob,M,24,NA,NA,Peru,PER,2004 Summer,2004,Summer,Athina,Judo,Judo,Gold
";
        match parse_records(csv.as_bytes()) {
            Err(StatsError::Csv { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn medal_parsing_accepts_portuguese() {
        assert_eq!("Ouro".parse::<Medal>().unwrap(), Medal::Gold);
        assert_eq!("prata".parse::<Medal>().unwrap(), Medal::Silver);
        assert!("tin".parse::<Medal>().is_err());
        assert_eq!(Medal::Gold.weight(), 3);
        assert_eq!(Medal::Bronze.weight(), 1);
    }

    #[test]
    fn preset_rejects_non_positive_padding() {
        let err = Preset::from_json(r#"{"padding": {"fixed": 0.0}}"#).unwrap_err();
        assert!(matches!(err, StatsError::InvalidParameter(_)));
        let ok = Preset::from_json(r#"{"filter": {"season": "Winter", "sports": ["Biathlon"]}}"#)
            .unwrap();
        assert_eq!(ok.filter.season, Some(Season::Winter));
        assert_eq!(ok.filter.sports, vec!["Biathlon".to_string()]);
    }
}
