//! Terminal rendering of predictions and rejections.

use modelserve_core::purchase::format_percentage;
use modelserve_core::{
    IrisPrediction, PurchaseOutcome, PurchasePrediction, SpeciesDisplay, ValidationErrors,
};

pub fn iris(prediction: &IrisPrediction) -> String {
    let display = SpeciesDisplay::for_label(prediction.prediction);
    format!(
        "{} Iris {}\n  class: {}",
        display.icon, display.name, prediction.prediction
    )
}

pub fn purchase(prediction: &PurchasePrediction) -> String {
    format!(
        "{}\n  purchase probability: {}",
        PurchaseOutcome::from_label(prediction.prediction).message(),
        format_percentage(prediction.probability)
    )
}

/// One line per rejected field.
pub fn rejection(errors: &ValidationErrors) -> String {
    let mut out = String::from("Rejected input:");
    for d in &errors.detail {
        let at = d
            .field()
            .map(str::to_string)
            .unwrap_or_else(|| d.loc.join("."));
        out.push_str(&format!("\n  {at}: {}", d.msg));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelserve_core::{FieldViolation, ViolationKind};

    #[test]
    fn iris_card() {
        assert_eq!(
            iris(&IrisPrediction { prediction: 1 }),
            "🌸 Iris Versicolor\n  class: 1"
        );
        assert!(iris(&IrisPrediction { prediction: 5 }).starts_with("❓ Iris Unknown"));
    }

    #[test]
    fn purchase_card() {
        let text = purchase(&PurchasePrediction::new(0, 0.02512));
        assert_eq!(
            text,
            "❌ This person will probably NOT buy the product.\n  purchase probability: 2.51 %"
        );
    }

    #[test]
    fn rejection_lists_each_field() {
        let errors = ValidationErrors {
            detail: vec![FieldViolation {
                loc: vec!["body".into(), "age".into()],
                kind: ViolationKind::GreaterThanEqual,
                msg: "Input should be greater than or equal to 18".into(),
                input: serde_json::json!(17),
            }],
        };
        assert_eq!(
            rejection(&errors),
            "Rejected input:\n  age: Input should be greater than or equal to 18"
        );
    }
}
