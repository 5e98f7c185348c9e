use chrono::{Datelike, NaiveDate};
use shared::protocol::parse_wire_date;

const MONTHS_FR: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// `2023-01-01` -> `1 janvier 2023`.
pub fn french_long_date(date: NaiveDate) -> String {
    let month = MONTHS_FR[date.month0() as usize];
    format!("{} {month} {}", date.day(), date.year())
}

/// Formats a date as sent by the service, falling back to the raw text.
pub fn display_wire_date(raw: &str) -> String {
    match parse_wire_date(raw) {
        Some(date) => french_long_date(date),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_dates_with_french_month_names() {
        let date = NaiveDate::from_ymd_opt(2023, 8, 10).expect("date");
        assert_eq!(french_long_date(date), "10 août 2023");
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).expect("date");
        assert_eq!(french_long_date(date), "1 janvier 2023");
    }

    #[test]
    fn unparseable_wire_dates_are_shown_verbatim() {
        assert_eq!(display_wire_date("bientôt"), "bientôt");
        assert_eq!(
            display_wire_date("2023-12-25T00:00:00.000Z"),
            "25 décembre 2023"
        );
    }
}
