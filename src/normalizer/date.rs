use super::NumberExtraction;
use crate::model::NormalizeError;
use crate::utils::{bare_word, concat_digits, first_numeric_token, parse_numeric_token};
use chrono::{DateTime, Datelike, TimeDelta, TimeZone, Utc};

/// Marker words and month names for one site locale.
#[derive(Debug, Clone)]
pub struct DateLocale {
    pub yesterday: Vec<&'static str>,
    pub minutes: Vec<&'static str>,
    pub hours: Vec<&'static str>,
    pub days: Vec<&'static str>,
    /// Words standing for the number one ("hace una hora").
    pub one: Vec<&'static str>,
    pub months: Vec<(&'static str, u32)>,
}

impl DateLocale {
    pub fn spanish() -> Self {
        Self {
            yesterday: vec!["ayer"],
            minutes: vec!["minuto"],
            hours: vec!["hora"],
            days: vec!["día", "dia"],
            one: vec!["un", "una", "uno"],
            months: vec![
                ("enero", 1),
                ("febrero", 2),
                ("marzo", 3),
                ("abril", 4),
                ("mayo", 5),
                ("junio", 6),
                ("julio", 7),
                ("agosto", 8),
                ("septiembre", 9),
                ("octubre", 10),
                ("noviembre", 11),
                ("diciembre", 12),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Unit {
    Minutes,
    Hours,
    Days,
}

impl Unit {
    fn delta(self, amount: u64) -> Option<TimeDelta> {
        let amount = i64::try_from(amount).ok()?;
        match self {
            Unit::Minutes => TimeDelta::try_minutes(amount),
            Unit::Hours => TimeDelta::try_hours(amount),
            Unit::Days => TimeDelta::try_days(amount),
        }
    }
}

/// Turns site-native relative dates ("hace 3 horas", "ayer", "15 de marzo")
/// into absolute timestamps.
#[derive(Debug, Clone)]
pub struct DateNormalizer {
    locale: DateLocale,
    extraction: NumberExtraction,
}

impl DateNormalizer {
    pub fn new(locale: DateLocale, extraction: NumberExtraction) -> Self {
        Self { locale, extraction }
    }

    pub fn spanish(extraction: NumberExtraction) -> Self {
        Self::new(DateLocale::spanish(), extraction)
    }

    /// First matching pattern wins: yesterday, minutes, hours, days, then a month name with a day.
    pub fn normalize(
        &self,
        raw: &str,
        reference: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, NormalizeError> {
        let unparseable = || NormalizeError::UnparseableDate(raw.to_string());
        let text = raw.trim().to_lowercase();
        let words: Vec<&str> = text.split_whitespace().collect();

        if self.locale.yesterday.iter().any(|m| text.contains(m)) {
            return reference
                .checked_sub_signed(TimeDelta::days(1))
                .ok_or_else(unparseable);
        }

        let units = [
            (&self.locale.minutes, Unit::Minutes),
            (&self.locale.hours, Unit::Hours),
            (&self.locale.days, Unit::Days),
        ];
        for (markers, unit) in units {
            let Some(position) = find_marker(&words, markers) else {
                continue;
            };
            let amount = self.magnitude(&text, &words, position).ok_or_else(unparseable)?;
            let delta = unit.delta(amount).ok_or_else(unparseable)?;
            return reference.checked_sub_signed(delta).ok_or_else(unparseable);
        }

        self.month_name_date(&text, &words, reference)
            .ok_or_else(unparseable)
    }

    fn magnitude(&self, text: &str, words: &[&str], unit_position: usize) -> Option<u64> {
        match self.extraction {
            NumberExtraction::Legacy => concat_digits(text).parse().ok(),
            NumberExtraction::Token => {
                let neighbours = [Some(unit_position), unit_position.checked_sub(1)];
                for word in neighbours.into_iter().flatten().map(|i| words[i]) {
                    if let Some(n) = parse_numeric_token(word) {
                        return Some(n);
                    }
                    if self.locale.one.iter().any(|one| *one == bare_word(word)) {
                        return Some(1);
                    }
                }
                first_numeric_token(text)
            }
        }
    }

    fn month_name_date(
        &self,
        text: &str,
        words: &[&str],
        reference: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let month = words.iter().find_map(|word| {
            let word = bare_word(word);
            self.locale
                .months
                .iter()
                .find(|(name, _)| *name == word)
                .map(|(_, number)| *number)
        })?;

        let day = match self.extraction {
            NumberExtraction::Legacy => concat_digits(text).parse::<u64>().ok(),
            NumberExtraction::Token => first_numeric_token(text),
        }?;
        let day = u32::try_from(day).ok()?;

        Utc.with_ymd_and_hms(reference.year(), month, day, 0, 0, 0)
            .single()
    }
}

/// Index of the first word starting with any of the markers.
fn find_marker(words: &[&str], markers: &[&'static str]) -> Option<usize> {
    words.iter().position(|word| {
        let word = bare_word(word);
        markers.iter().any(|m| word.starts_with(m))
    })
}
