use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::form::SelectorTable;

pub const DEFAULT_CONFIG_FILE: &str = "tutor-eval.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub form_url: String,
    pub webdriver_url: String,
    pub ledger: LedgerConfig,
    pub pacing: Pacing,
    pub policy: FormPolicy,
    /// Overrides for individual entries of the built-in selector table.
    pub selectors: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            form_url: "https://bit.ly/tutors-eval".to_string(),
            webdriver_url: "http://localhost:9515".to_string(),
            ledger: LedgerConfig::default(),
            pacing: Pacing::default(),
            policy: FormPolicy::default(),
            selectors: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub spreadsheet_id: Option<String>,
    pub sheet: String,
    /// First ledger row to read; earlier rows belong to past terms.
    pub start_row: usize,
    pub last_column: String,
    pub clock: LedgerClock,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            spreadsheet_id: None,
            sheet: "Session Tracker".to_string(),
            start_row: 500,
            last_column: "P".to_string(),
            clock: LedgerClock::TwentyFourHour,
        }
    }
}

/// How to read a ledger time that carries no AM/PM suffix. Times with a
/// suffix, and bare hours of 0 or 13-23, read the same in every mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LedgerClock {
    /// "18:30"; a bare "6:30" is morning.
    #[serde(rename = "24h")]
    TwentyFourHour,
    /// Bare 12-hour times are before noon.
    #[serde(rename = "12h-am")]
    TwelveHourAm,
    /// Bare 12-hour times are after noon; "6:30" is 18:30.
    #[serde(rename = "12h-pm")]
    TwelveHourPm,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Pacing {
    pub step_delay_ms: u64,
    pub page_delay_ms: u64,
    pub step_timeout_ms: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Pacing {
            step_delay_ms: 500,
            page_delay_ms: 1000,
            step_timeout_ms: 10_000,
        }
    }
}

impl Pacing {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.step_timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeridiemMode {
    /// Pick AM or PM from the parsed hour.
    Derived,
    /// Only open the start-time AM/PM dropdown, leaving the form default.
    Legacy,
}

/// Answers that do not come from the ledger or the operator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FormPolicy {
    pub teaching_assistant: bool,
    pub mentioned_dropping: bool,
    pub comments_placeholder: String,
    pub meridiem: MeridiemMode,
    pub submit: bool,
}

impl Default for FormPolicy {
    fn default() -> Self {
        FormPolicy {
            teaching_assistant: false,
            mentioned_dropping: false,
            comments_placeholder: "N/A".to_string(),
            meridiem: MeridiemMode::Derived,
            submit: false,
        }
    }
}

impl Config {
    /// Load `path`, or `tutor-eval.toml` in the working directory when present.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Path::new(DEFAULT_CONFIG_FILE),
            None => return Ok(Config::default()),
        };

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn selector_table(&self) -> SelectorTable {
        let mut table = SelectorTable::default();
        for (field, selector) in &self.selectors {
            table.set(field, selector);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_tracker_layout() {
        let config = Config::default();
        assert_eq!(config.ledger.sheet, "Session Tracker");
        assert_eq!(config.ledger.start_row, 500);
        assert_eq!(config.ledger.clock, LedgerClock::TwentyFourHour);
        assert!(!config.policy.teaching_assistant);
        assert!(!config.policy.mentioned_dropping);
        assert_eq!(config.policy.comments_placeholder, "N/A");
        assert_eq!(config.pacing.step_delay(), Duration::from_millis(500));
    }

    #[test]
    fn partial_file_keeps_defaults_and_overrides_selectors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
form_url = "https://forms.example.com/eval"

[ledger]
spreadsheet_id = "sheet-123"
start_row = 2
clock = "12h-pm"

[policy]
teaching_assistant = true
meridiem = "legacy"

[selectors]
"comments" = "textarea#comments"
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.form_url, "https://forms.example.com/eval");
        assert_eq!(config.ledger.spreadsheet_id.as_deref(), Some("sheet-123"));
        assert_eq!(config.ledger.start_row, 2);
        assert_eq!(config.ledger.sheet, "Session Tracker");
        assert_eq!(config.ledger.clock, LedgerClock::TwelveHourPm);
        assert!(config.policy.teaching_assistant);
        assert_eq!(config.policy.meridiem, MeridiemMode::Legacy);
        assert_eq!(config.pacing.page_delay_ms, 1000);

        let table = config.selector_table();
        assert_eq!(table.get("comments"), Some("textarea#comments"));
        assert!(table.get("next-page").is_some());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/tutor-eval.toml")));
        assert!(err.is_err());
    }
}
