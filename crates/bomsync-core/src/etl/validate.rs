//! Per-part business rule checks

use crate::models::Part;

const MIN_PART_NUMBER_LEN: usize = 3;
const MIN_DESCRIPTION_LEN: usize = 5;

/// Outcome of validating a batch of parts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validation {
    /// Parts that passed every rule, in input order
    pub valid: Vec<Part>,
    /// One `"{part_number}: {violations}"` message per rejected part
    pub errors: Vec<String>,
}

/// Check a single part and return every violated rule.
///
/// A priced leaf component without a supplier is only logged; it does not
/// make the part invalid.
pub fn validate_part(part: &Part) -> Vec<String> {
    let mut violations = Vec::new();

    if part.part_number.chars().count() < MIN_PART_NUMBER_LEN {
        violations.push(format!("Invalid part number: '{}'", part.part_number));
    }

    if part.description.chars().count() < MIN_DESCRIPTION_LEN {
        violations.push(format!("Description too short: '{}'", part.description));
    }

    if part.unit_price.is_nan() {
        violations.push("Invalid price: NaN".to_string());
    } else if part.unit_price < 0.0 {
        violations.push(format!("Negative price: {}", part.unit_price));
    }

    if part.is_component() && part.supplier.is_none() && part.unit_price > 0.0 {
        tracing::warn!("Component {} has no supplier defined", part.part_number);
    }

    violations
}

/// Split parts into loadable ones and formatted error messages
pub fn transform(parts: Vec<Part>) -> Validation {
    tracing::info!("TRANSFORM: Validating data quality...");

    let mut validation = Validation::default();
    for part in parts {
        let violations = validate_part(&part);
        if violations.is_empty() {
            validation.valid.push(part);
        } else {
            let message = format!("{}: {}", part.part_number, violations.join(", "));
            tracing::error!("TRANSFORM: Validation failed - {message}");
            validation.errors.push(message);
        }
    }

    tracing::info!(
        "TRANSFORM: {} valid, {} errors",
        validation.valid.len(),
        validation.errors.len()
    );
    validation
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn part(part_number: &str, description: &str, price: f64) -> Part {
        Part {
            id: "1".to_string(),
            part_number: part_number.to_string(),
            description: description.to_string(),
            category: None,
            quantity: 1,
            unit_price: price,
            bom_level: 1,
            parent_assembly: Some("ASM-1".to_string()),
            is_assembly: false,
            supplier: Some("Acme".to_string()),
            children: Vec::new(),
        }
    }

    #[test]
    fn valid_part_has_no_violations() {
        assert!(validate_part(&part("PRT-001", "Hex bolt M8", 0.0)).is_empty());
    }

    #[test]
    fn short_part_number_is_rejected() {
        assert_eq!(
            validate_part(&part("P1", "Hex bolt M8", 1.0)),
            vec!["Invalid part number: 'P1'"]
        );
        assert_eq!(validate_part(&part("", "Hex bolt M8", 1.0)).len(), 1);
    }

    #[test]
    fn short_description_is_rejected() {
        assert_eq!(
            validate_part(&part("PRT-001", "Bolt", 1.0)),
            vec!["Description too short: 'Bolt'"]
        );
    }

    #[test]
    fn negative_price_is_rejected() {
        assert_eq!(
            validate_part(&part("PRT-001", "Hex bolt M8", -1.5)),
            vec!["Negative price: -1.5"]
        );
        assert_eq!(
            validate_part(&part("PRT-001", "Hex bolt M8", f64::NAN)),
            vec!["Invalid price: NaN"]
        );
    }

    #[test]
    fn all_violations_are_reported_together() {
        let violations = validate_part(&part("X", "", -2.0));
        assert_eq!(
            violations,
            vec![
                "Invalid part number: 'X'",
                "Description too short: ''",
                "Negative price: -2",
            ]
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // three characters, six bytes
        assert!(validate_part(&part("ÄÖÜ", "Größe", 1.0)).is_empty());
    }

    #[test]
    fn missing_supplier_is_only_advisory() {
        let mut unsupplied = part("PRT-002", "Washer M8", 5.0);
        unsupplied.supplier = None;
        assert!(validate_part(&unsupplied).is_empty());
    }

    #[test]
    fn transform_splits_and_formats_errors() {
        let validation = transform(vec![
            part("PRT-001", "Hex bolt M8", 10.0),
            part("PRT-002", "Washer M8", -1.0),
            part("AB", "tiny", 3.0),
        ]);

        assert_eq!(validation.valid.len(), 1);
        assert_eq!(validation.valid[0].part_number, "PRT-001");
        assert_eq!(
            validation.errors,
            vec![
                "PRT-002: Negative price: -1".to_string(),
                "AB: Invalid part number: 'AB', Description too short: 'tiny'".to_string(),
            ]
        );
    }
}
