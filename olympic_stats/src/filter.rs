use serde::{Deserialize, Serialize};

use crate::{AthleteEvent, Season, Sex};

/// Row predicates shared by every report. `None` and empty lists mean "all".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filter {
    pub season: Option<Season>,
    pub sex: Option<Sex>,
    pub sports: Vec<String>,
    pub countries: Vec<String>,
}

impl Filter {
    pub fn matches(&self, row: &AthleteEvent) -> bool {
        if let Some(season) = self.season {
            if row.season != season {
                return false;
            }
        }
        if let Some(sex) = self.sex {
            if row.sex != sex {
                return false;
            }
        }
        if !self.sports.is_empty()
            && !self
                .sports
                .iter()
                .any(|s| s.trim().eq_ignore_ascii_case(&row.sport))
        {
            return false;
        }
        if !self.countries.is_empty() && !self.countries.iter().any(|c| row.matches_country(c)) {
            return false;
        }
        true
    }

    pub fn apply<'a>(&self, rows: &'a [AthleteEvent]) -> Vec<&'a AthleteEvent> {
        let kept: Vec<&AthleteEvent> = rows.iter().filter(|r| self.matches(r)).collect();
        tracing::debug!(input = rows.len(), kept = kept.len(), "applied filter");
        kept
    }

    /// Chart title suffix, e.g. ` - Summer Games - Swimming - Female`.
    pub fn title_suffix(&self) -> String {
        let mut out = String::new();
        if let Some(season) = self.season {
            out.push_str(&format!(" - {} Games", season));
        }
        if !self.sports.is_empty() {
            out.push_str(&format!(" - {}", self.sports.join(", ")));
        }
        if let Some(sex) = self.sex {
            out.push_str(&format!(" - {}", sex));
        }
        out
    }

    /// One-line description of the active filters for report headers.
    pub fn describe(&self) -> String {
        let season = self
            .season
            .map(|s| s.to_string())
            .unwrap_or_else(|| "Both".into());
        let sex = self
            .sex
            .map(|s| s.to_string())
            .unwrap_or_else(|| "Both".into());
        let sports = if self.sports.is_empty() {
            "All".to_string()
        } else {
            self.sports.join(", ")
        };
        let countries = if self.countries.is_empty() {
            "All".to_string()
        } else {
            self.countries.join(", ")
        };
        format!(
            "season: {} | gender: {} | sport: {} | country: {}",
            season, sex, sports, countries
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::sample_rows;

    #[test]
    fn default_filter_keeps_everything() {
        let rows = sample_rows();
        assert_eq!(Filter::default().apply(&rows).len(), rows.len());
        assert_eq!(Filter::default().title_suffix(), "");
    }

    #[test]
    fn predicates_combine() {
        let rows = sample_rows();
        let filter = Filter {
            season: Some(Season::Summer),
            sex: Some(Sex::Female),
            sports: vec!["swimming".into()],
            countries: vec![],
        };
        let kept = filter.apply(&rows);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|r| r.name == "Ana Silva"));
        assert_eq!(filter.title_suffix(), " - Summer Games - swimming - Female");
    }

    #[test]
    fn countries_match_code_or_name() {
        let rows = sample_rows();
        let by_code = Filter {
            countries: vec!["bra".into()],
            ..Filter::default()
        };
        let by_name = Filter {
            countries: vec!["Brazil".into()],
            ..Filter::default()
        };
        assert_eq!(by_code.apply(&rows).len(), 4);
        assert_eq!(by_name.apply(&rows), by_code.apply(&rows));
    }
}
