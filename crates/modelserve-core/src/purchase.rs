//! Purchase deployment: gender, age and estimated salary in, buy / no-buy out.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::validate::{FieldRange, Location, ValidationErrors, Validator};

/// Feature order the purchase model was trained on.
pub const FEATURE_NAMES: [&str; 3] = ["gender", "age", "estimated_salary"];

pub const GENDER: FieldRange = FieldRange::inclusive("gender", 0.0, 1.0);
pub const AGE: FieldRange = FieldRange::inclusive("age", 18.0, 60.0);
pub const ESTIMATED_SALARY: FieldRange =
    FieldRange::inclusive("estimated_salary", 0.0, 150_000.0);

/// A validated purchase-intent feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseProfile {
    /// 0 = male, 1 = female.
    pub gender: i64,
    pub age: i64,
    pub estimated_salary: i64,
}

impl PurchaseProfile {
    pub fn to_features(&self) -> [f64; 3] {
        [
            self.gender as f64,
            self.age as f64,
            self.estimated_salary as f64,
        ]
    }
}

impl Default for PurchaseProfile {
    fn default() -> Self {
        Self {
            gender: Gender::Male.code(),
            age: 30,
            estimated_salary: 50_000,
        }
    }
}

/// JSON body fields exactly as they arrived.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPurchaseProfile {
    pub gender: Option<Value>,
    pub age: Option<Value>,
    pub estimated_salary: Option<Value>,
}

impl RawPurchaseProfile {
    /// Pick the fields out of a decoded body, which must be a JSON object.
    ///
    /// Unknown keys are ignored; `null` counts as absent.
    pub fn from_json(body: Value, location: Location) -> Result<Self, ValidationErrors> {
        let mut fields = match body {
            Value::Object(fields) => fields,
            other => return Err(ValidationErrors::not_an_object(location, other)),
        };
        let mut take = |name: &str| take_field(&mut fields, name);
        Ok(Self {
            gender: take("gender"),
            age: take("age"),
            estimated_salary: take("estimated_salary"),
        })
    }

    pub fn validate(&self, location: Location) -> Result<PurchaseProfile, ValidationErrors> {
        let mut v = Validator::new(location);
        let gender = v.integer(&GENDER, self.gender.as_ref());
        let age = v.integer(&AGE, self.age.as_ref());
        let estimated_salary = v.integer(&ESTIMATED_SALARY, self.estimated_salary.as_ref());

        let (Some(gender), Some(age), Some(estimated_salary)) = (gender, age, estimated_salary)
        else {
            return Err(v.into_errors());
        };

        Ok(PurchaseProfile {
            gender,
            age,
            estimated_salary,
        })
    }
}

fn take_field(fields: &mut Map<String, Value>, name: &str) -> Option<Value> {
    fields.remove(name).filter(|v| !v.is_null())
}

impl TryFrom<RawPurchaseProfile> for PurchaseProfile {
    type Error = ValidationErrors;

    fn try_from(raw: RawPurchaseProfile) -> Result<Self, Self::Error> {
        raw.validate(Location::Body)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Self::Male, Self::Female];

    pub fn code(&self) -> i64 {
        match self {
            Self::Male => 0,
            Self::Female => 1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Male),
            1 => Some(Self::Female),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

/// Binary outcome of the purchase classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOutcome {
    WillBuy,
    WillNotBuy,
}

impl PurchaseOutcome {
    /// Label 1 is a purchase; anything else is not.
    pub fn from_label(label: i64) -> Self {
        if label == 1 {
            Self::WillBuy
        } else {
            Self::WillNotBuy
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::WillBuy => "✅ This person will probably buy the product!",
            Self::WillNotBuy => "❌ This person will probably NOT buy the product.",
        }
    }
}

/// `0.1234` → `"12.34 %"`.
pub fn format_percentage(probability: f64) -> String {
    format!("{:.2} %", probability * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::ViolationKind;
    use serde_json::json;

    fn raw(body: Value) -> RawPurchaseProfile {
        RawPurchaseProfile::from_json(body, Location::Body).unwrap()
    }

    #[test]
    fn valid_body() {
        let p = PurchaseProfile::try_from(raw(json!({
            "gender": 0, "age": 30, "estimated_salary": 50000
        })))
        .unwrap();
        assert_eq!(p, PurchaseProfile::default());
        assert_eq!(p.to_features(), [0.0, 30.0, 50000.0]);
    }

    #[test]
    fn bounds_are_inclusive_at_both_ends() {
        for body in [
            json!({"gender": 0, "age": 18, "estimated_salary": 0}),
            json!({"gender": 1, "age": 60, "estimated_salary": 150000}),
        ] {
            assert!(PurchaseProfile::try_from(raw(body)).is_ok());
        }
    }

    #[test]
    fn out_of_range_fields_are_named() {
        let errors = PurchaseProfile::try_from(raw(json!({
            "gender": 2, "age": 17, "estimated_salary": 150001
        })))
        .unwrap_err();
        assert_eq!(errors.fields(), vec!["gender", "age", "estimated_salary"]);
        assert_eq!(errors.detail[1].kind, ViolationKind::GreaterThanEqual);
        assert_eq!(errors.detail[1].loc, vec!["body", "age"]);
    }

    #[test]
    fn missing_and_null_fields_are_required() {
        let errors = PurchaseProfile::try_from(raw(json!({"gender": null, "age": 30})))
            .unwrap_err();
        assert_eq!(errors.fields(), vec!["gender", "estimated_salary"]);
        assert!(
            errors
                .detail
                .iter()
                .all(|d| d.kind == ViolationKind::Missing)
        );
    }

    #[test]
    fn extra_keys_are_ignored() {
        let p = PurchaseProfile::try_from(raw(json!({
            "gender": 1, "age": 45, "estimated_salary": 90000, "country": "FR"
        })))
        .unwrap();
        assert_eq!(p.gender, 1);
    }

    #[test]
    fn positional_bodies_are_not_field_maps() {
        for body in [json!([0, 30, 50000]), json!("0,30,50000"), json!(42), Value::Null] {
            let errors = RawPurchaseProfile::from_json(body.clone(), Location::Body).unwrap_err();
            assert_eq!(errors.detail.len(), 1);
            assert_eq!(errors.detail[0].kind, ViolationKind::ModelAttributesType);
            assert_eq!(errors.detail[0].loc, vec!["body"]);
            assert_eq!(errors.detail[0].input, body);
        }
    }

    #[test]
    fn outcome_and_percentage() {
        assert_eq!(PurchaseOutcome::from_label(1), PurchaseOutcome::WillBuy);
        assert_eq!(PurchaseOutcome::from_label(0), PurchaseOutcome::WillNotBuy);
        assert_eq!(format_percentage(0.1234), "12.34 %");
        assert_eq!(format_percentage(1.0), "100.00 %");
    }

    #[test]
    fn gender_codes() {
        for g in Gender::ALL {
            assert_eq!(Gender::from_code(g.code()), Some(g));
        }
        assert_eq!(Gender::from_code(2), None);
    }
}
