//! Input controls and decoding of submitted form values.

use std::collections::HashMap;

use modelserve_core::{Deployment, IrisMeasurements, PurchaseProfile};

use crate::error::DashboardError;

/// A numeric input bound to a feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Control {
    pub name: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

pub const IRIS_CONTROLS: [Control; 4] = [
    Control {
        name: "sepal_length",
        label: "Sepal length (cm)",
        min: 4.0,
        max: 8.0,
        step: 0.1,
    },
    Control {
        name: "sepal_width",
        label: "Sepal width (cm)",
        min: 2.0,
        max: 4.5,
        step: 0.1,
    },
    Control {
        name: "petal_length",
        label: "Petal length (cm)",
        min: 1.0,
        max: 7.0,
        step: 0.1,
    },
    Control {
        name: "petal_width",
        label: "Petal width (cm)",
        min: 0.1,
        max: 2.5,
        step: 0.1,
    },
];

pub const AGE_CONTROL: Control = Control {
    name: "age",
    label: "Age",
    min: 18.0,
    max: 60.0,
    step: 1.0,
};

pub const SALARY_CONTROL: Control = Control {
    name: "estimated_salary",
    label: "Estimated salary (€)",
    min: 0.0,
    max: 150_000.0,
    step: 1000.0,
};

/// Feature values collected from the form, ready to send.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    Iris(IrisMeasurements),
    Purchase(PurchaseProfile),
}

impl Input {
    /// What the form shows before anything is submitted.
    pub fn initial(deployment: Deployment) -> Self {
        match deployment {
            Deployment::Iris => Self::Iris(IrisMeasurements::default()),
            Deployment::Purchase => Self::Purchase(PurchaseProfile::default()),
        }
    }

    /// Decode an urlencoded submission. Range checks are left to the service.
    pub fn from_form(
        deployment: Deployment,
        form: &HashMap<String, String>,
    ) -> Result<Self, DashboardError> {
        match deployment {
            Deployment::Iris => Ok(Self::Iris(IrisMeasurements {
                sepal_length: float(form, "sepal_length")?,
                sepal_width: float(form, "sepal_width")?,
                petal_length: float(form, "petal_length")?,
                petal_width: float(form, "petal_width")?,
            })),
            Deployment::Purchase => Ok(Self::Purchase(PurchaseProfile {
                gender: integer(form, "gender")?,
                age: integer(form, "age")?,
                estimated_salary: integer(form, "estimated_salary")?,
            })),
        }
    }
}

/// Control values as text, the way the form shows them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormValues(HashMap<&'static str, String>);

impl FormValues {
    /// Echo a submission back verbatim, whether or not it decodes.
    ///
    /// Fields absent from the submission show their initial value.
    pub fn submitted(deployment: Deployment, form: &HashMap<String, String>) -> Self {
        let mut values = Self::from(&Input::initial(deployment));
        for &name in deployment.feature_names() {
            if let Some(raw) = form.get(name) {
                values.0.insert(name, raw.clone());
            }
        }
        values
    }

    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or_default()
    }
}

impl From<&Input> for FormValues {
    fn from(input: &Input) -> Self {
        match input {
            Input::Iris(m) => Self(
                IRIS_CONTROLS
                    .iter()
                    .zip(m.to_features())
                    .map(|(control, value)| (control.name, value.to_string()))
                    .collect(),
            ),
            Input::Purchase(p) => Self(HashMap::from([
                ("gender", p.gender.to_string()),
                (AGE_CONTROL.name, p.age.to_string()),
                (SALARY_CONTROL.name, p.estimated_salary.to_string()),
            ])),
        }
    }
}

fn field<'a>(
    form: &'a HashMap<String, String>,
    name: &'static str,
) -> Result<&'a str, DashboardError> {
    form.get(name)
        .map(|v| v.trim())
        .ok_or(DashboardError::Form {
            field: name,
            reason: "missing".into(),
        })
}

fn float(form: &HashMap<String, String>, name: &'static str) -> Result<f64, DashboardError> {
    let raw = field(form, name)?;
    raw.parse().map_err(|_| DashboardError::Form {
        field: name,
        reason: format!("{raw:?} is not a number"),
    })
}

fn integer(form: &HashMap<String, String>, name: &'static str) -> Result<i64, DashboardError> {
    let raw = field(form, name)?;
    raw.parse().map_err(|_| DashboardError::Form {
        field: name,
        reason: format!("{raw:?} is not a whole number"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn iris_defaults_sit_inside_the_controls() {
        let Input::Iris(m) = Input::initial(Deployment::Iris) else {
            panic!("expected iris input");
        };
        for (control, value) in IRIS_CONTROLS.iter().zip(m.to_features()) {
            assert!(control.min <= value && value <= control.max, "{}", control.name);
        }
    }

    #[test]
    fn decodes_iris_form() {
        let input = Input::from_form(
            Deployment::Iris,
            &form(&[
                ("sepal_length", "6.7"),
                ("sepal_width", "3.0"),
                ("petal_length", "5.2"),
                ("petal_width", " 2.3 "),
            ]),
        )
        .unwrap();
        assert_eq!(
            input,
            Input::Iris(IrisMeasurements {
                sepal_length: 6.7,
                sepal_width: 3.0,
                petal_length: 5.2,
                petal_width: 2.3,
            })
        );
    }

    #[test]
    fn decodes_purchase_form() {
        let input = Input::from_form(
            Deployment::Purchase,
            &form(&[("gender", "1"), ("age", "42"), ("estimated_salary", "87000")]),
        )
        .unwrap();
        assert_eq!(
            input,
            Input::Purchase(PurchaseProfile {
                gender: 1,
                age: 42,
                estimated_salary: 87_000,
            })
        );
    }

    #[test]
    fn form_values_follow_the_input() {
        let values = FormValues::from(&Input::initial(Deployment::Purchase));
        assert_eq!(values.get("gender"), "0");
        assert_eq!(values.get("age"), "30");
        assert_eq!(values.get("estimated_salary"), "50000");

        let values = FormValues::from(&Input::initial(Deployment::Iris));
        assert_eq!(values.get("sepal_length"), "5.8");
        assert_eq!(values.get("petal_width"), "1.2");
    }

    #[test]
    fn submitted_values_are_echoed_verbatim() {
        let values = FormValues::submitted(
            Deployment::Purchase,
            &form(&[("gender", "1"), ("age", "thirty"), ("country", "FR")]),
        );
        assert_eq!(values.get("gender"), "1");
        assert_eq!(values.get("age"), "thirty");
        assert_eq!(values.get("estimated_salary"), "50000");
        assert_eq!(values.get("country"), "");
    }

    #[test]
    fn missing_or_garbled_fields_are_named() {
        let err = Input::from_form(Deployment::Purchase, &form(&[("gender", "0"), ("age", "30")]))
            .unwrap_err();
        assert!(matches!(err, DashboardError::Form { field: "estimated_salary", .. }));

        let err = Input::from_form(
            Deployment::Purchase,
            &form(&[("gender", "0"), ("age", "thirty"), ("estimated_salary", "1")]),
        )
        .unwrap_err();
        assert!(matches!(err, DashboardError::Form { field: "age", .. }));
    }
}
