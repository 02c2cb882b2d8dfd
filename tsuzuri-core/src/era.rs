//! Japanese era (wareki) ↔ Gregorian date conversion.
//!
//! Era dates are `(era, year-in-era, month, day)`; year 1 of an era is written
//! `元年` ("first year") and starts on the era's start date, not on January 1st.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EraError;
use crate::text::normalize_width;

/// The five eras since the adoption of the modern calendar, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Era {
    Meiji,
    Taisho,
    Showa,
    Heisei,
    Reiwa,
}

impl Era {
    pub const ALL: [Era; 5] = [Era::Meiji, Era::Taisho, Era::Showa, Era::Heisei, Era::Reiwa];

    pub const fn kanji(self) -> &'static str {
        match self {
            Era::Meiji => "明治",
            Era::Taisho => "大正",
            Era::Showa => "昭和",
            Era::Heisei => "平成",
            Era::Reiwa => "令和",
        }
    }

    pub const fn romaji(self) -> &'static str {
        match self {
            Era::Meiji => "Meiji",
            Era::Taisho => "Taisho",
            Era::Showa => "Showa",
            Era::Heisei => "Heisei",
            Era::Reiwa => "Reiwa",
        }
    }

    pub const fn symbol(self) -> char {
        match self {
            Era::Meiji => 'M',
            Era::Taisho => 'T',
            Era::Showa => 'S',
            Era::Heisei => 'H',
            Era::Reiwa => 'R',
        }
    }

    /// Numeric era code used by insurance cards and receipts (1 = Meiji … 5 = Reiwa).
    pub const fn code(self) -> u32 {
        match self {
            Era::Meiji => 1,
            Era::Taisho => 2,
            Era::Showa => 3,
            Era::Heisei => 4,
            Era::Reiwa => 5,
        }
    }

    /// First day of the era as `(year, month, day)`.
    pub const fn start(self) -> (i32, u32, u32) {
        match self {
            Era::Meiji => (1868, 10, 23),
            Era::Taisho => (1912, 7, 30),
            Era::Showa => (1926, 12, 25),
            Era::Heisei => (1989, 1, 8),
            Era::Reiwa => (2019, 5, 1),
        }
    }

    pub fn next(self) -> Option<Era> {
        let idx = Self::ALL.iter().position(|e| *e == self)?;
        Self::ALL.get(idx + 1).copied()
    }

    pub fn previous(self) -> Option<Era> {
        let idx = Self::ALL.iter().position(|e| *e == self)?;
        idx.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    /// Resolve an era from any accepted spelling: `令和`, `令`, `Reiwa`, `R`, `5`.
    pub fn from_token(token: &str) -> Option<Era> {
        let token = normalize_width(token);
        Self::ALL.into_iter().find(|era| {
            token == era.kanji()
                || token.chars().eq(era.kanji().chars().take(1))
                || token.eq_ignore_ascii_case(era.romaji())
                || (token.len() == 1
                    && token
                        .chars()
                        .next()
                        .is_some_and(|c| c.to_ascii_uppercase() == era.symbol()))
                || token == era.code().to_string()
        })
    }
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kanji())
    }
}

/// A date in era notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EraDate {
    pub era: Era,
    pub year: u32,
    pub month: u32,
    pub day: u32,
}

impl EraDate {
    pub fn new(era: Era, year: u32, month: u32, day: u32) -> Self {
        Self {
            era,
            year,
            month,
            day,
        }
    }

    pub fn to_gregorian(&self) -> Result<NaiveDate, EraError> {
        era_to_gregorian(self)
    }

    /// `令和3年4月1日`; the first year is rendered as `元年`.
    pub fn to_kanji(&self) -> String {
        let year = if self.year == 1 {
            "元".to_string()
        } else {
            self.year.to_string()
        };
        format!("{}{}年{}月{}日", self.era.kanji(), year, self.month, self.day)
    }

    /// `R3.4.1`
    pub fn to_abbreviated(&self) -> String {
        format!("{}{}.{}.{}", self.era.symbol(), self.year, self.month, self.day)
    }
}

impl fmt::Display for EraDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_kanji())
    }
}

/// Era date → Gregorian date.
///
/// Rejects impossible calendar dates and dates outside the era's span
/// (before its start or on/after the next era's start).
pub fn era_to_gregorian(date: &EraDate) -> Result<NaiveDate, EraError> {
    let out_of_era = || EraError::OutOfEra {
        era: date.era,
        year: date.year,
        month: date.month,
        day: date.day,
    };

    let (start_year, _, _) = date.era.start();
    let year = i32::try_from(date.year)
        .ok()
        .filter(|y| *y >= 1)
        .and_then(|y| start_year.checked_add(y - 1))
        .ok_or_else(out_of_era)?;

    let gregorian =
        NaiveDate::from_ymd_opt(year, date.month, date.day).ok_or(EraError::InvalidDate {
            year,
            month: date.month,
            day: date.day,
        })?;

    let ymd = (year, date.month, date.day);
    if ymd < date.era.start() || date.era.next().is_some_and(|next| ymd >= next.start()) {
        return Err(out_of_era());
    }

    Ok(gregorian)
}

/// Gregorian date → era date, picking the newest era that has started.
pub fn gregorian_to_era(date: NaiveDate) -> Result<EraDate, EraError> {
    let ymd = (date.year(), date.month(), date.day());
    Era::ALL
        .iter()
        .rev()
        .find(|era| era.start() <= ymd)
        .map(|&era| EraDate {
            era,
            year: (date.year() - era.start().0 + 1) as u32,
            month: date.month(),
            day: date.day(),
        })
        .ok_or(EraError::BeforeFirstEra(date))
}

/// Parse an era-notation date such as `令和3年4月1日`, `令和元年5月1日`, `R3.4.1`,
/// `Reiwa 3-4-1`, `H31.4` (day defaults to 1), `R030401` or `5030401`.
///
/// The result is always a valid date inside its era.
pub fn parse_era_date(input: &str) -> Result<EraDate, EraError> {
    let normalized = normalize_width(input);
    let (era, rest) = split_era_prefix(&normalized)
        .ok_or_else(|| EraError::UnknownEra(input.trim().to_string()))?;

    let rest = rest.trim_start();
    let rest = match rest.strip_prefix('元') {
        Some(tail) => format!("1{}", tail),
        None => rest.to_string(),
    };

    let (year, month, day) = split_components(&rest, 2)
        .ok_or_else(|| EraError::Unparseable(input.trim().to_string()))?;

    let date = EraDate::new(era, year, month, day);
    era_to_gregorian(&date)?;
    Ok(date)
}

/// Parse any supported date notation into a Gregorian date.
///
/// Era notation is tried first; plain `YYYY/MM/DD`, `YYYY-MM-DD`, `YYYYMMDD`,
/// `YYYY年M月D日` and `YYYY/MM` are accepted as a fallback.
pub fn parse_date(input: &str) -> Result<NaiveDate, EraError> {
    let normalized = normalize_width(input);
    if normalized.is_empty() {
        return Err(EraError::Unparseable(input.to_string()));
    }

    if looks_like_era_notation(&normalized) {
        return parse_era_date(&normalized)?.to_gregorian();
    }

    parse_gregorian(&normalized).map_err(|e| match e {
        EraError::Unparseable(_) => EraError::Unparseable(input.trim().to_string()),
        other => other,
    })
}

fn looks_like_era_notation(s: &str) -> bool {
    match s.chars().next() {
        Some(c) if c.is_ascii_digit() => s.len() == 7 && s.chars().all(|c| c.is_ascii_digit()),
        Some(_) => true,
        None => false,
    }
}

fn split_era_prefix(s: &str) -> Option<(Era, &str)> {
    for era in Era::ALL {
        if let Some(rest) = s.strip_prefix(era.kanji()) {
            return Some((era, rest));
        }
    }

    let mut chars = s.chars();
    let first = chars.next()?;

    // Single-kanji abbreviation: 令3年4月1日
    if !first.is_ascii()
        && let Some(era) = Era::from_token(&first.to_string())
        && chars
            .next()
            .is_some_and(|c| c.is_ascii_digit() || c == '元')
    {
        return Some((era, &s[first.len_utf8()..]));
    }

    // Numeric-only form: era code + yymmdd
    if s.len() == 7 && s.chars().all(|c| c.is_ascii_digit()) {
        let era = Era::from_token(&s[..1])?;
        return Some((era, &s[1..]));
    }

    let alpha_len = s.chars().take_while(|c| c.is_ascii_alphabetic()).count();
    if alpha_len > 0 {
        let era = Era::from_token(&s[..alpha_len])?;
        return Some((era, &s[alpha_len..]));
    }

    None
}

/// Split `y/m/d`-like text into numbers. Separators may be `/ . - 年 月` or
/// spaces; `日` is dropped. A single run of digits is read as `yymmdd` or
/// `yymm` with `year_width` digits for the year. Missing days default to 1.
fn split_components(s: &str, year_width: usize) -> Option<(u32, u32, u32)> {
    let cleaned: String = s
        .chars()
        .filter(|c| *c != '日')
        .map(|c| match c {
            '年' | '月' | '.' | '-' | ' ' | ',' => '/',
            _ => c,
        })
        .collect();

    let parts: Vec<&str> = cleaned.split('/').filter(|p| !p.is_empty()).collect();

    match parts.as_slice() {
        [compact] => {
            if !compact.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            match compact.len().checked_sub(year_width)? {
                4 => Some((
                    number(&compact[..year_width])?,
                    number(&compact[year_width..year_width + 2])?,
                    number(&compact[year_width + 2..])?,
                )),
                2 => Some((
                    number(&compact[..year_width])?,
                    number(&compact[year_width..])?,
                    1,
                )),
                _ => None,
            }
        }
        [year, month] => Some((number(year)?, number(month)?, 1)),
        [year, month, day] => Some((number(year)?, number(month)?, number(day)?)),
        _ => None,
    }
}

fn parse_gregorian(s: &str) -> Result<NaiveDate, EraError> {
    let unparseable = || EraError::Unparseable(s.to_string());

    // Drop a time part: 2024-03-10T09:00:00+09:00
    let date_part = s.split('T').next().unwrap_or(s);
    if date_part.len() < 6 {
        return Err(unparseable());
    }

    let (year, month, day) = split_components(date_part, 4).ok_or_else(unparseable)?;
    let year_digits = date_part
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .count();
    if year_digits != 4 && year_digits != 6 && year_digits != 8 {
        return Err(unparseable());
    }

    let year = i32::try_from(year).map_err(|_| unparseable())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or(EraError::InvalidDate { year, month, day })
}

fn number(part: &str) -> Option<u32> {
    if part.is_empty() || part.len() > 4 || !part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_reiwa_to_gregorian() {
        let date = EraDate::new(Era::Reiwa, 3, 4, 1);
        assert_eq!(era_to_gregorian(&date).unwrap(), ymd(2021, 4, 1));
    }

    #[test]
    fn test_last_heisei_day() {
        let era = gregorian_to_era(ymd(2019, 4, 30)).unwrap();
        assert_eq!(era, EraDate::new(Era::Heisei, 31, 4, 30));
        assert_eq!(era.to_kanji(), "平成31年4月30日");
    }

    #[test]
    fn test_era_start_is_first_year() {
        for era in Era::ALL {
            let (y, m, d) = era.start();
            let converted = gregorian_to_era(ymd(y, m, d)).unwrap();
            assert_eq!(converted.era, era);
            assert_eq!(converted.year, 1);

            let day_before = ymd(y, m, d).pred_opt().unwrap();
            match era.previous() {
                Some(prev) => assert_eq!(gregorian_to_era(day_before).unwrap().era, prev),
                None => assert!(matches!(
                    gregorian_to_era(day_before),
                    Err(EraError::BeforeFirstEra(_))
                )),
            }
        }
    }

    #[test]
    fn test_first_year_rendering() {
        let date = EraDate::new(Era::Reiwa, 1, 5, 1);
        assert_eq!(date.to_kanji(), "令和元年5月1日");
        assert_eq!(date.to_abbreviated(), "R1.5.1");
        assert_eq!(date.to_gregorian().unwrap(), ymd(2019, 5, 1));
    }

    #[test]
    fn test_out_of_era_rejected() {
        // Heisei 31 ends on April 30th
        assert!(matches!(
            era_to_gregorian(&EraDate::new(Era::Heisei, 31, 5, 1)),
            Err(EraError::OutOfEra { .. })
        ));
        // Reiwa 1 starts on May 1st
        assert!(matches!(
            era_to_gregorian(&EraDate::new(Era::Reiwa, 1, 4, 30)),
            Err(EraError::OutOfEra { .. })
        ));
        assert!(matches!(
            era_to_gregorian(&EraDate::new(Era::Reiwa, 0, 4, 30)),
            Err(EraError::OutOfEra { .. })
        ));
    }

    #[test]
    fn test_invalid_calendar_date_not_clamped() {
        // Reiwa 5 = 2023, not a leap year
        assert_eq!(
            era_to_gregorian(&EraDate::new(Era::Reiwa, 5, 2, 29)),
            Err(EraError::InvalidDate {
                year: 2023,
                month: 2,
                day: 29
            })
        );
        assert!(era_to_gregorian(&EraDate::new(Era::Reiwa, 6, 2, 29)).is_ok());
        assert!(era_to_gregorian(&EraDate::new(Era::Reiwa, 6, 4, 31)).is_err());
    }

    #[test]
    fn test_from_token_spellings() {
        assert_eq!(Era::from_token("令和"), Some(Era::Reiwa));
        assert_eq!(Era::from_token("令"), Some(Era::Reiwa));
        assert_eq!(Era::from_token("Reiwa"), Some(Era::Reiwa));
        assert_eq!(Era::from_token("heisei"), Some(Era::Heisei));
        assert_eq!(Era::from_token("s"), Some(Era::Showa));
        assert_eq!(Era::from_token("Ｈ"), Some(Era::Heisei));
        assert_eq!(Era::from_token("3"), Some(Era::Showa));
        assert_eq!(Era::from_token("Edo"), None);
        assert_eq!(Era::from_token("X"), None);
    }

    #[test]
    fn test_parse_era_notations() {
        let expected = EraDate::new(Era::Reiwa, 3, 4, 1);
        for input in [
            "令和3年4月1日",
            "令和３年４月１日",
            "令3年4月1日",
            "R3.4.1",
            "r03/04/01",
            "Reiwa 3-4-1",
            "R030401",
            "5030401",
        ] {
            assert_eq!(parse_era_date(input).unwrap(), expected, "input: {}", input);
        }
    }

    #[test]
    fn test_parse_first_year_token() {
        assert_eq!(
            parse_era_date("令和元年5月1日").unwrap(),
            EraDate::new(Era::Reiwa, 1, 5, 1)
        );
        assert_eq!(
            parse_era_date("H元.1.8").unwrap(),
            EraDate::new(Era::Heisei, 1, 1, 8)
        );
    }

    #[test]
    fn test_parse_year_month_only() {
        assert_eq!(
            parse_era_date("H31.4").unwrap(),
            EraDate::new(Era::Heisei, 31, 4, 1)
        );
        assert_eq!(
            parse_era_date("平成31年4月").unwrap(),
            EraDate::new(Era::Heisei, 31, 4, 1)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_era_date("Edo 3.4.1"), Err(EraError::UnknownEra(_))));
        assert!(matches!(parse_era_date("R3"), Err(EraError::Unparseable(_))));
        assert!(matches!(
            parse_era_date("平成32年1月1日"),
            Err(EraError::OutOfEra { .. })
        ));
    }

    #[test]
    fn test_parse_date_gregorian_fallback() {
        for input in [
            "2024/03/10",
            "2024-03-10",
            "20240310",
            "2024年3月10日",
            "２０２４／０３／１０",
            "2024-03-10T09:30:00+09:00",
        ] {
            assert_eq!(parse_date(input).unwrap(), ymd(2024, 3, 10), "input: {}", input);
        }
        assert_eq!(parse_date("2024/03").unwrap(), ymd(2024, 3, 1));
    }

    #[test]
    fn test_parse_date_mixed() {
        assert_eq!(parse_date("昭和50年3月1日").unwrap(), ymd(1975, 3, 1));
        assert!(matches!(
            parse_date("2023/02/30"),
            Err(EraError::InvalidDate { .. })
        ));
        assert!(matches!(parse_date("24/3/10"), Err(EraError::Unparseable(_))));
        assert!(matches!(parse_date(""), Err(EraError::Unparseable(_))));
    }
}
