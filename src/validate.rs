//! Row-level schema validation for listing uploads.

use crate::model::{ListingDraft, RawRecord};

/// Hard cap on listing titles, matching the listings table column.
const TITLE_MAX_CHARS: usize = 200;

/// Validate one decoded row against the listing schema.
///
/// Rules run in declaration order (title, price, projectId) and the first
/// violation wins. Columns outside the schema are ignored and never reach the
/// draft. Failure is a value, not a panic, and there is no hidden state:
/// validating the same record twice gives the same result.
pub fn validate_row(record: &RawRecord) -> Result<ListingDraft, String> {
    let title = match record.get("title").map(str::trim) {
        None | Some("") => return Err("title is required".to_string()),
        Some(t) => t,
    };
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(format!(
            "title must be at most {TITLE_MAX_CHARS} characters"
        ));
    }

    let price = match record.get("price").map(str::trim) {
        None | Some("") => return Err("price is required".to_string()),
        Some(raw) => match raw.parse::<f64>() {
            Ok(v) if v.is_finite() && v > 0.0 => v,
            Ok(_) => return Err("price must be greater than 0".to_string()),
            Err(_) => return Err("price must be a number".to_string()),
        },
    };

    let project_id = match record.get("projectId").map(str::trim) {
        None | Some("") => return Err("projectId is required".to_string()),
        Some(p) => p,
    };

    Ok(ListingDraft::new(
        title.to_string(),
        price,
        project_id.to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, price: &str, project: &str) -> RawRecord {
        RawRecord::from_pairs([("title", title), ("price", price), ("projectId", project)])
    }

    #[test]
    fn accepts_a_well_formed_row() {
        let draft = validate_row(&record("Villa", "500000", "p1")).unwrap();
        assert_eq!(draft.title(), "Villa");
        assert_eq!(draft.price(), 500000.0);
        assert_eq!(draft.project_id(), "p1");
    }

    #[test]
    fn trims_before_checking() {
        let draft = validate_row(&record("  Villa  ", " 250.5 ", " p1 ")).unwrap();
        assert_eq!(draft.title(), "Villa");
        assert_eq!(draft.project_id(), "p1");
    }

    #[test]
    fn missing_and_blank_title_both_fail() {
        assert_eq!(
            validate_row(&record("", "100", "p1")).unwrap_err(),
            "title is required"
        );
        assert_eq!(
            validate_row(&record("   ", "100", "p1")).unwrap_err(),
            "title is required"
        );
        let no_column = RawRecord::from_pairs([("price", "100"), ("projectId", "p1")]);
        assert_eq!(validate_row(&no_column).unwrap_err(), "title is required");
    }

    #[test]
    fn caps_title_length() {
        let long = "x".repeat(201);
        assert_eq!(
            validate_row(&record(&long, "100", "p1")).unwrap_err(),
            "title must be at most 200 characters"
        );
        assert!(validate_row(&record(&"x".repeat(200), "100", "p1")).is_ok());
    }

    #[test]
    fn price_rules() {
        assert_eq!(
            validate_row(&record("Ok", "", "p1")).unwrap_err(),
            "price is required"
        );
        assert_eq!(
            validate_row(&record("Ok", "abc", "p1")).unwrap_err(),
            "price must be a number"
        );
        assert_eq!(
            validate_row(&record("Ok", "-5", "p1")).unwrap_err(),
            "price must be greater than 0"
        );
        assert_eq!(
            validate_row(&record("Ok", "0", "p1")).unwrap_err(),
            "price must be greater than 0"
        );
        assert_eq!(
            validate_row(&record("Ok", "inf", "p1")).unwrap_err(),
            "price must be greater than 0"
        );
    }

    #[test]
    fn price_failure_wins_over_later_fields() {
        // projectId is also bad here, but price is declared first.
        assert_eq!(
            validate_row(&record("Ok", "-5", "")).unwrap_err(),
            "price must be greater than 0"
        );
    }

    #[test]
    fn project_id_required() {
        assert_eq!(
            validate_row(&record("Ok", "100", "")).unwrap_err(),
            "projectId is required"
        );
    }

    #[test]
    fn unknown_columns_are_ignored() {
        let rec = RawRecord::from_pairs([
            ("title", "Villa"),
            ("price", "100"),
            ("projectId", "p1"),
            ("agent", "someone"),
            ("notes", "ignore me"),
        ]);
        assert!(validate_row(&rec).is_ok());
    }

    #[test]
    fn validation_is_idempotent() {
        let good = record("Villa", "100", "p1");
        assert_eq!(validate_row(&good), validate_row(&good));
        let bad = record("", "100", "p1");
        assert_eq!(validate_row(&bad), validate_row(&bad));
    }
}
