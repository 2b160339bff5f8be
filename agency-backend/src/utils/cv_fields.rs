//! Best-effort contact field extraction from CV text.
//!
//! Every field tries its patterns in order and keeps the first hit. There is
//! no confidence score: a field either comes back or stays empty. The name
//! fallback takes the first line made of exactly two words, so a two-word
//! section heading at the top of a CV will be reported as the name.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

const PROFESSION_MAX_CHARS: usize = 100;

static EMAIL_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap(),
        Regex::new(concat!(
            r#"(?:אימייל|מייל|דוא"ל|דואר אלקטרוני)"#,
            r"\s*[:\-]?\s*(\S+@\S+)",
        ))
        .unwrap(),
        Regex::new(r"[<\[(]\s*([^\s<>\[\]()]+@[^\s<>\[\]()]+)\s*[>\])]").unwrap(),
    ]
});

static MOBILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\+972[\s-]?|\b0)(5\d)[\s-]?(\d{3})[\s-]?(\d{4})\b").unwrap());

static LABELLED_MOBILE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)(?:נייד|פלאפון|טלפון נייד|mobile|cell(?:ular)?)",
        r"\s*[:\-]?\s*(\+?[\d][\d\s-]{8,14}\d)",
    ))
    .unwrap()
});

static LANDLINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b0([2-489])[\s-]?(\d{3})[\s-]?(\d{4})\b").unwrap());

static LABELLED_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*(?:full\s+name|name|שם\s+מלא|שם)\s*[:\-]\s*(.+?)\s*$").unwrap()
});

static TWO_WORD_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([\p{L}'-]{2,})\s+([\p{L}'-]{2,})$").unwrap());

static LABELLED_PROFESSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?im)^\s*(?:profession|occupation|position|current\s+role|title|מקצוע|תפקיד)",
        r"\s*[:\-]\s*(.+?)\s*$",
    ))
    .unwrap()
});

static ROLE_PREFIXED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?im)^\s*((?:senior|junior|lead|chief|head\s+of|principal",
        r"|מנהלת?|מהנדסת?|מפתחת?|רכזת?|אחראית?)\s+.+?)\s*$",
    ))
    .unwrap()
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedFields {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub phone: Option<String>,
    pub profession: Option<String>,
}

impl ExtractedFields {
    /// Names of the fields that were found, for audit metadata.
    pub fn found(&self) -> Vec<&'static str> {
        let mut found = Vec::new();
        if self.first_name.is_some() {
            found.push("name");
        }
        if self.email.is_some() {
            found.push("email");
        }
        if self.mobile.is_some() {
            found.push("mobile");
        }
        if self.phone.is_some() {
            found.push("phone");
        }
        if self.profession.is_some() {
            found.push("profession");
        }
        found
    }
}

pub fn parse_cv_text(text: &str) -> ExtractedFields {
    let (first_name, last_name) = match extract_name(text) {
        Some((first, last)) => (Some(first), last),
        None => (None, None),
    };

    ExtractedFields {
        first_name,
        last_name,
        email: extract_email(text),
        mobile: extract_mobile(text),
        phone: extract_landline(text),
        profession: extract_profession(text),
    }
}

pub fn extract_email(text: &str) -> Option<String> {
    for regex in EMAIL_RES.iter() {
        for captures in regex.captures_iter(text) {
            let value = captures
                .get(1)
                .or_else(|| captures.get(0))
                .map(|m| clean_email(m.as_str()))
                .unwrap_or_default();
            if is_plausible_email(&value) {
                return Some(value.to_lowercase());
            }
        }
    }
    None
}

fn clean_email(raw: &str) -> String {
    raw.trim_matches(|c: char| !c.is_alphanumeric())
        .to_string()
}

fn is_plausible_email(value: &str) -> bool {
    value.contains('@') && value.contains('.') && value.len() > 5
}

/// Israeli mobile number as ten digits, `05XXXXXXXX`.
pub fn extract_mobile(text: &str) -> Option<String> {
    if let Some(captures) = MOBILE_RE.captures(text) {
        return Some(format!("0{}{}{}", &captures[1], &captures[2], &captures[3]));
    }

    let captures = LABELLED_MOBILE_RE.captures(text)?;
    let digits: String = captures[1].chars().filter(char::is_ascii_digit).collect();
    let local = match digits.strip_prefix("972") {
        Some(rest) => format!("0{}", rest),
        None => digits,
    };
    (local.len() == 10 && local.starts_with("05")).then_some(local)
}

/// Israeli landline (area codes 02-04, 08, 09) with separators stripped.
pub fn extract_landline(text: &str) -> Option<String> {
    LANDLINE_RE
        .captures(text)
        .map(|c| format!("0{}{}{}", &c[1], &c[2], &c[3]))
}

/// Returns `(first_name, last_name)`.
pub fn extract_name(text: &str) -> Option<(String, Option<String>)> {
    if let Some(captures) = LABELLED_NAME_RE.captures(text) {
        let mut words = captures[1].split_whitespace();
        if let Some(first) = words.next() {
            let rest = words.collect::<Vec<_>>().join(" ");
            return Some((first.to_string(), (!rest.is_empty()).then_some(rest)));
        }
    }

    text.lines()
        .map(str::trim)
        .find_map(|line| TWO_WORD_LINE_RE.captures(line))
        .map(|c| (c[1].to_string(), Some(c[2].to_string())))
}

pub fn extract_profession(text: &str) -> Option<String> {
    let raw = LABELLED_PROFESSION_RE
        .captures(text)
        .or_else(|| ROLE_PREFIXED_RE.captures(text))
        .map(|c| c[1].trim().to_string())?;

    if raw.is_empty() {
        return None;
    }
    Some(raw.chars().take(PROFESSION_MAX_CHARS).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_lowercased() {
        let text = "Contact me at John.Doe@Example.COM for details";
        assert_eq!(extract_email(text).as_deref(), Some("john.doe@example.com"));
    }

    #[test]
    fn email_from_hebrew_label_and_brackets() {
        assert_eq!(
            extract_email("דוא\"ל: dana@mail.co.il").as_deref(),
            Some("dana@mail.co.il")
        );
        assert_eq!(
            extract_email("reach me <x.y@corp.io>").as_deref(),
            Some("x.y@corp.io")
        );
        assert_eq!(extract_email("no address here @ all."), None);
    }

    #[test]
    fn mobile_is_ten_digits_without_separators() {
        assert_eq!(extract_mobile("Tel 054-123-4567").as_deref(), Some("0541234567"));
        assert_eq!(extract_mobile("0541234567").as_deref(), Some("0541234567"));
        assert_eq!(extract_mobile("call 052 987 6543 now").as_deref(), Some("0529876543"));
        assert_eq!(extract_mobile("+972-50-111-2222").as_deref(), Some("0501112222"));
        assert_eq!(extract_mobile("Mobile: 972 58 765 4321").as_deref(), Some("0587654321"));
        assert_eq!(extract_mobile("03-123-4567"), None);
    }

    #[test]
    fn landline_matches_area_codes() {
        assert_eq!(extract_landline("Office: 03-123-4567").as_deref(), Some("031234567"));
        assert_eq!(extract_landline("09 765 4321").as_deref(), Some("097654321"));
        assert_eq!(extract_landline("054-123-4567"), None);
        assert_eq!(extract_landline("07-123-4567"), None);
    }

    #[test]
    fn name_prefers_label_then_two_word_line() {
        let labelled = "Curriculum Vitae\nName: Dana Levi Cohen\n";
        assert_eq!(
            extract_name(labelled),
            Some(("Dana".to_string(), Some("Levi Cohen".to_string())))
        );

        let unlabelled = "\n  John Smith  \nSoftware developer with 5 years\n";
        assert_eq!(
            extract_name(unlabelled),
            Some(("John".to_string(), Some("Smith".to_string())))
        );

        let hebrew = "ישראל ישראלי\nתל אביב";
        assert_eq!(
            extract_name(hebrew),
            Some(("ישראל".to_string(), Some("ישראלי".to_string())))
        );
    }

    #[test]
    fn name_fallback_takes_two_word_headings() {
        let text = "Work Experience\nJohn Smith\n";
        assert_eq!(
            extract_name(text),
            Some(("Work".to_string(), Some("Experience".to_string())))
        );
    }

    #[test]
    fn profession_is_truncated() {
        let long = format!("Profession: {}", "x".repeat(150));
        assert_eq!(extract_profession(&long).map(|p| p.chars().count()), Some(100));

        assert_eq!(
            extract_profession("John Smith\nSenior Backend Engineer\n").as_deref(),
            Some("Senior Backend Engineer")
        );
        assert_eq!(
            extract_profession("תפקיד: מנהלת חשבונות").as_deref(),
            Some("מנהלת חשבונות")
        );
    }

    #[test]
    fn parse_cv_text_combines_fields() {
        let text = concat!(
            "Dana Levi\nSenior QA Engineer\n",
            "Email: Dana@Example.com\nMobile 050-123-4567\nHome 02-555-1234\n",
        );
        let fields = parse_cv_text(text);
        assert_eq!(fields.first_name.as_deref(), Some("Dana"));
        assert_eq!(fields.last_name.as_deref(), Some("Levi"));
        assert_eq!(fields.email.as_deref(), Some("dana@example.com"));
        assert_eq!(fields.mobile.as_deref(), Some("0501234567"));
        assert_eq!(fields.phone.as_deref(), Some("025551234"));
        assert_eq!(fields.profession.as_deref(), Some("Senior QA Engineer"));
        assert_eq!(fields.found(), vec!["name", "email", "mobile", "phone", "profession"]);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert_eq!(parse_cv_text(""), ExtractedFields::default());
    }
}
