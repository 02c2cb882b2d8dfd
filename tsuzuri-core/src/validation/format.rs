//! Japanese identifier and clinical code format checks.
//!
//! All predicates take raw user text, fold full-width characters to ASCII and
//! drop the usual separators before checking. They never panic; callers turn a
//! `false` into a message.

use regex::Regex;
use std::sync::LazyLock;

use crate::constants::code_system;
use crate::text::normalize_width;

static ICD10_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][0-9]{2}(\.?[0-9A-Z]{1,4})?$").expect("ICD-10 regex must compile")
});

static JLAC10_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9][A-Z0-9][0-9]{3}-?[0-9]{4}-?[0-9]{3}-?[0-9]{3}-?[0-9]{2}$")
        .expect("JLAC10 regex must compile")
});

static YJ_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{7}[A-Z][0-9A-Z]{4}$").expect("YJ regex must compile")
});

static LOINC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{1,7}-[0-9]$").expect("LOINC regex must compile"));

/// Width-normalized text with separators (hyphen, space, dot, slash, parentheses) removed.
pub fn compact(input: &str) -> String {
    normalize_width(input)
        .chars()
        .filter(|c| !matches!(c, '-' | ' ' | '.' | '/' | '(' | ')'))
        .collect()
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn all_zero(s: &str) -> bool {
    s.bytes().all(|b| b == b'0')
}

/// Two-digit prefecture code, 01 (Hokkaido) to 47 (Okinawa).
pub fn is_prefecture_code(s: &str) -> bool {
    s.len() == 2 && all_digits(s) && s.parse::<u32>().is_ok_and(|n| (1..=47).contains(&n))
}

/// Registration schemes a professional license number can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseKind {
    /// 6-digit medical registry number (leading pair is the registration-year code)
    MedicalRegistry,
    /// 8-digit prefecture-prefixed registration
    Prefectural,
    /// Letter-prefixed registration for pharmacists and other professions
    LetterPrefixed,
}

pub fn classify_license_number(input: &str) -> Option<LicenseKind> {
    let s = compact(input).to_ascii_uppercase();

    if s.len() == 6 && all_digits(&s) {
        return (&s[..2] != "00").then_some(LicenseKind::MedicalRegistry);
    }

    if s.len() == 8 && all_digits(&s) {
        return (is_prefecture_code(&s[..2]) && !all_zero(&s[2..]))
            .then_some(LicenseKind::Prefectural);
    }

    let mut chars = s.chars();
    if let Some(first) = chars.next()
        && first.is_ascii_uppercase()
    {
        let digits = chars.as_str();
        return (digits.len() == 6 && all_digits(digits) && !all_zero(digits))
            .then_some(LicenseKind::LetterPrefixed);
    }

    None
}

pub fn is_valid_license_number(input: &str) -> bool {
    classify_license_number(input).is_some()
}

/// Medical institution code: prefecture (2) + fee-schedule class (1) + serial.
///
/// The class digit is 1 (medical), 3 (dental) or 4 (pharmacy).
pub fn is_valid_facility_code(input: &str, expected_len: usize) -> bool {
    let s = compact(input);
    s.len() == expected_len
        && s.len() >= 3
        && all_digits(&s)
        && is_prefecture_code(&s[..2])
        && matches!(s.as_bytes()[2], b'1' | b'3' | b'4')
}

/// Health insurance schemes identified by the insurer number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsurerScheme {
    /// 国民健康保険
    NationalHealthInsurance,
    /// 被用者保険 (協会けんぽ, 組合, 船員保険)
    EmployeeHealthInsurance,
    /// 共済組合
    MutualAid,
    /// 後期高齢者医療
    LateStageElderly,
    /// 退職者医療
    RetireeNationalHealthInsurance,
}

pub fn classify_insurer_number(input: &str) -> Option<InsurerScheme> {
    let s = compact(input);
    if !all_digits(&s) {
        return None;
    }

    match s.len() {
        6 => is_prefecture_code(&s[..2]).then_some(InsurerScheme::NationalHealthInsurance),
        8 => {
            if !is_prefecture_code(&s[2..4]) {
                return None;
            }
            match &s[..2] {
                "01" | "02" | "03" | "04" | "06" | "07" | "63" => {
                    Some(InsurerScheme::EmployeeHealthInsurance)
                }
                "31" | "32" | "33" | "34" => Some(InsurerScheme::MutualAid),
                "39" => Some(InsurerScheme::LateStageElderly),
                "67" => Some(InsurerScheme::RetireeNationalHealthInsurance),
                _ => None,
            }
        }
        _ => None,
    }
}

pub fn is_valid_insurer_number(input: &str) -> bool {
    classify_insurer_number(input).is_some()
}

/// 7-digit postal code, optionally written with `〒` and a hyphen.
pub fn is_valid_postal_code(input: &str) -> bool {
    let s = compact(&input.replace('〒', ""));
    s.len() == 7 && all_digits(&s) && !s.starts_with('0')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoneKind {
    Mobile,
    IpPhone,
    TollFree,
    Landline,
}

pub fn classify_phone_number(input: &str) -> Option<PhoneKind> {
    let mut s = compact(input);
    if let Some(national) = s.strip_prefix("+81") {
        s = format!("0{}", national);
    }
    if !all_digits(&s) || !s.starts_with('0') {
        return None;
    }

    let len = s.len();
    // 0800 shares its first three digits with mobile 080
    if (s.starts_with("0120") && len == 10) || (s.starts_with("0800") && len == 11) {
        return Some(PhoneKind::TollFree);
    }
    if ["070", "080", "090"].iter().any(|p| s.starts_with(p)) && len == 11 {
        return Some(PhoneKind::Mobile);
    }
    if s.starts_with("050") && len == 11 {
        return Some(PhoneKind::IpPhone);
    }
    if len == 10 && matches!(s.as_bytes()[1], b'1'..=b'9') {
        return Some(PhoneKind::Landline);
    }
    None
}

pub fn is_valid_phone_number(input: &str) -> bool {
    classify_phone_number(input).is_some()
}

/// HOT9 or HOT13 medication code.
pub fn is_valid_hot_code(code: &str) -> bool {
    let s = normalize_width(code);
    all_digits(&s) && matches!(s.len(), 9 | 13)
}

pub fn is_valid_yj_code(code: &str) -> bool {
    YJ_RE.is_match(&normalize_width(code))
}

pub fn is_valid_icd10_code(code: &str) -> bool {
    ICD10_RE.is_match(&normalize_width(code))
}

pub fn is_valid_jlac10_code(code: &str) -> bool {
    JLAC10_RE.is_match(&normalize_width(code))
}

pub fn is_valid_loinc_code(code: &str) -> bool {
    LOINC_RE.is_match(&normalize_width(code))
}

/// Structural check of `code` for the coding system `system`.
///
/// Systems without a known structure always pass.
pub fn code_matches_system(system: &str, code: &str) -> bool {
    match system {
        code_system::HOT9 => {
            let s = normalize_width(code);
            s.len() == 9 && all_digits(&s)
        }
        code_system::HOT13 => {
            let s = normalize_width(code);
            s.len() == 13 && all_digits(&s)
        }
        code_system::RECEIPT_MEDICATION => {
            let s = normalize_width(code);
            s.len() == 9 && all_digits(&s)
        }
        code_system::YJ => is_valid_yj_code(code),
        code_system::ICD10 | code_system::ICD10_JP => is_valid_icd10_code(code),
        code_system::JLAC10 => is_valid_jlac10_code(code),
        code_system::LOINC => is_valid_loinc_code(code),
        _ => true,
    }
}
