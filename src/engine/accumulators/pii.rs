//! Lazy, first-match PII pattern detection.
//!
//! One compiled pattern set shared across all string columns (compiling a
//! `regex::Regex` is expensive; the patterns have no per-column state).
//! Patterns are evaluated in a fixed order and stop at the first match per
//! spec ("evaluated lazily (first pattern to match ...)").

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PiiKind {
    Email,
    Phone,
    Ssn,
    CreditCard,
    DateOrZip,
}

impl PiiKind {
    pub fn note(&self) -> &'static str {
        match self {
            PiiKind::Email => "potential PII: email",
            PiiKind::Phone => "potential PII: phone",
            PiiKind::Ssn => "potential PII: ssn",
            PiiKind::CreditCard => "potential PII: credit card",
            PiiKind::DateOrZip => "potential PII: date or zip",
        }
    }
}

struct PiiPatterns {
    email: Regex,
    phone_e164: Regex,
    ssn: Regex,
    credit_card_candidate: Regex,
    iso_date_or_zip: Regex,
}

fn patterns() -> &'static PiiPatterns {
    static PATTERNS: OnceLock<PiiPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| PiiPatterns {
        email: Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap(),
        phone_e164: Regex::new(r"^\+[1-9]\d{7,14}$").unwrap(),
        ssn: Regex::new(r"^\d{3}-\d{2}-\d{4}$").unwrap(),
        credit_card_candidate: Regex::new(r"^(?:\d[ -]?){13,19}$").unwrap(),
        iso_date_or_zip: Regex::new(r"^(?:\d{4}-\d{2}-\d{2}|\d{5}(?:-\d{4})?)$").unwrap(),
    })
}

/// Returns the first pattern that matches `text`, evaluating in spec order:
/// email, phone, SSN, credit-card-candidate (Luhn-checked), ISO date/ZIP.
pub fn detect(text: &str) -> Option<PiiKind> {
    let p = patterns();
    if p.email.is_match(text) {
        return Some(PiiKind::Email);
    }
    if p.phone_e164.is_match(text) {
        return Some(PiiKind::Phone);
    }
    if p.ssn.is_match(text) {
        return Some(PiiKind::Ssn);
    }
    if p.credit_card_candidate.is_match(text) && luhn_checksum_valid(text) {
        return Some(PiiKind::CreditCard);
    }
    if p.iso_date_or_zip.is_match(text) {
        return Some(PiiKind::DateOrZip);
    }
    None
}

/// Standard Luhn mod-10 checksum, used to cut down false positives on the
/// generic 13-19 digit credit-card-shaped pattern above.
fn luhn_checksum_valid(text: &str) -> bool {
    let digits: Vec<u32> = text.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 13 {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// Per-column counter of how many times each PII kind has fired, used to
/// decide at finalize which `"potential PII: ..."` notes to emit.
#[derive(Debug, Clone, Default)]
pub struct PiiCounters {
    pub email: u64,
    pub phone: u64,
    pub ssn: u64,
    pub credit_card: u64,
    pub date_or_zip: u64,
}

impl PiiCounters {
    pub fn record(&mut self, kind: PiiKind) {
        match kind {
            PiiKind::Email => self.email += 1,
            PiiKind::Phone => self.phone += 1,
            PiiKind::Ssn => self.ssn += 1,
            PiiKind::CreditCard => self.credit_card += 1,
            PiiKind::DateOrZip => self.date_or_zip += 1,
        }
    }

    /// Notes to attach at finalize, in a stable, deterministic order.
    pub fn notes(&self) -> Vec<&'static str> {
        let mut notes = Vec::new();
        if self.email > 0 {
            notes.push(PiiKind::Email.note());
        }
        if self.phone > 0 {
            notes.push(PiiKind::Phone.note());
        }
        if self.ssn > 0 {
            notes.push(PiiKind::Ssn.note());
        }
        if self.credit_card > 0 {
            notes.push(PiiKind::CreditCard.note());
        }
        if self.date_or_zip > 0 {
            notes.push(PiiKind::DateOrZip.note());
        }
        notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn e4_email_scenario() {
        assert_eq!(detect("a@b.com"), Some(PiiKind::Email));
        assert_eq!(detect("c@d.org"), Some(PiiKind::Email));
        assert_eq!(detect("not-an-email"), None);
    }

    #[test]
    fn ssn_pattern() {
        assert_eq!(detect("123-45-6789"), Some(PiiKind::Ssn));
    }

    #[test]
    fn credit_card_requires_luhn() {
        // 4111111111111111 is a well-known Luhn-valid test Visa number.
        assert_eq!(detect("4111111111111111"), Some(PiiKind::CreditCard));
        // Same length, fails Luhn.
        assert_eq!(detect("4111111111111112"), None);
    }

    #[test]
    fn first_match_wins_email_before_date_or_zip() {
        // An address-shaped string that could coincidentally look digit-like
        // should still resolve to email when it matches the email pattern.
        assert_eq!(detect("2024-01-05"), Some(PiiKind::DateOrZip));
    }
}
