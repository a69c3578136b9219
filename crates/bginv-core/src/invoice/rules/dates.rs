//! Date extraction: invoice dates in five formats and service periods.

use chrono::NaiveDate;

use super::patterns::{
    DATE_FORMATS, INVOICE_DATE_LABEL, MONTHS, SERVICE_DATE_DMY, SERVICE_DATE_MONTH_NAME,
    SERVICE_DATE_MY,
};
use super::{first_match, Rule};
use crate::models::invoice::{DateSource, ServiceDate};

/// Find the first date in `raw`.
///
/// Formats are tried in a fixed order (`DD/MM/YYYY`, `YYYY-MM-DD`,
/// `DD.MM.YYYY`, `Month D, YYYY`, `Mon D, YYYY`). Within a format every match
/// is tried, so a match that fails to parse does not hide a later one.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS.iter().find_map(|(pattern, format)| {
        pattern
            .find_iter(raw)
            .find_map(|m| NaiveDate::parse_from_str(m.as_str(), format).ok())
    })
}

/// Format a date the way Bulgarian invoices print it.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Find the invoice date, preferring a labelled line over any date in the text.
pub fn extract_invoice_date(text: &str) -> Option<(NaiveDate, DateSource)> {
    let rules: [Rule<(NaiveDate, DateSource)>; 2] = [labelled_date, any_date];
    first_match(text, &rules)
}

fn labelled_date(text: &str) -> Option<(NaiveDate, DateSource)> {
    INVOICE_DATE_LABEL
        .captures_iter(text)
        .find_map(|caps| parse_date(&caps[1]))
        .map(|date| (date, DateSource::Labelled))
}

fn any_date(text: &str) -> Option<(NaiveDate, DateSource)> {
    parse_date(text).map(|date| (date, DateSource::Scanned))
}

/// Month/year mentioned on a service line, e.g. `18.08.2021`, `08/2021` or
/// `August 2021`.
pub fn extract_service_date(line: &str) -> Option<ServiceDate> {
    let rules: [Rule<ServiceDate>; 3] = [numeric_day_month_year, numeric_month_year, month_name_year];
    first_match(line, &rules)
}

fn numeric_day_month_year(line: &str) -> Option<ServiceDate> {
    SERVICE_DATE_DMY
        .captures_iter(line)
        .find_map(|caps| ServiceDate::new(caps[1].parse().ok()?, caps[2].parse().ok()?))
}

fn numeric_month_year(line: &str) -> Option<ServiceDate> {
    SERVICE_DATE_MY
        .captures_iter(line)
        .find_map(|caps| ServiceDate::new(caps[1].parse().ok()?, caps[2].parse().ok()?))
}

fn month_name_year(line: &str) -> Option<ServiceDate> {
    SERVICE_DATE_MONTH_NAME
        .captures_iter(line)
        .find_map(|caps| ServiceDate::new(month_number(&caps[1])?, caps[2].parse().ok()?))
}

fn month_number(name: &str) -> Option<u32> {
    MONTHS
        .iter()
        .position(|(long, short)| long.eq_ignore_ascii_case(name) || short.eq_ignore_ascii_case(name))
        .map(|i| i as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_all_formats_agree() {
        for raw in [
            "18/08/2021",
            "2021-08-18",
            "18.08.2021",
            "August 18, 2021",
            "Aug 18, 2021",
        ] {
            assert_eq!(parse_date(raw), Some(ymd(2021, 8, 18)), "format {raw}");
        }
    }

    #[test]
    fn test_parse_date_in_context() {
        assert_eq!(parse_date("Invoice date: 05.01.2024, due in 14 days"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date("no date here"), None);
    }

    #[test]
    fn test_invalid_match_falls_through() {
        // 31/02 is not a date; the second slash date is.
        assert_eq!(parse_date("31/02/2024 then 01/03/2024"), Some(ymd(2024, 3, 1)));
        // Slash format has no valid match, so the dotted one is used.
        assert_eq!(parse_date("99/99/2024 or 02.03.2024"), Some(ymd(2024, 3, 2)));
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(ymd(2021, 8, 5)), "05.08.2021");
    }

    #[test]
    fn test_labelled_date_wins() {
        let text = "Period 01/07/2021\nInvoice date: 18.08.2021\n";
        assert_eq!(
            extract_invoice_date(text),
            Some((ymd(2021, 8, 18), DateSource::Labelled))
        );

        assert_eq!(
            extract_invoice_date("Issued 2021-08-18 in Sofia"),
            Some((ymd(2021, 8, 18), DateSource::Scanned))
        );
        assert_eq!(extract_invoice_date("nothing"), None);
    }

    #[test]
    fn test_service_date() {
        assert_eq!(extract_service_date("Consulting 18.08.2021 100.00"), ServiceDate::new(8, 2021));
        assert_eq!(extract_service_date("Support 07/2021 100.00"), ServiceDate::new(7, 2021));
        assert_eq!(extract_service_date("Development August 2021"), ServiceDate::new(8, 2021));
        assert_eq!(extract_service_date("Hosting Sep 2023"), ServiceDate::new(9, 2023));
        assert_eq!(extract_service_date("Consulting services"), None);
    }
}
