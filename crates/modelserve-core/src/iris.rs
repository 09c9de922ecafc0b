//! Iris deployment: four flower measurements in, one of three species out.

use serde::{Deserialize, Serialize};

use crate::validate::{FieldRange, Location, ValidationErrors, Validator};

/// Feature order the iris model was trained on.
pub const FEATURE_NAMES: [&str; 4] = [
    "sepal_length",
    "sepal_width",
    "petal_length",
    "petal_width",
];

/// Measurement bounds in centimetres.
pub const SEPAL_LENGTH: FieldRange = FieldRange::positive("sepal_length", 10.0);
pub const SEPAL_WIDTH: FieldRange = FieldRange::positive("sepal_width", 10.0);
pub const PETAL_LENGTH: FieldRange = FieldRange::positive("petal_length", 10.0);
pub const PETAL_WIDTH: FieldRange = FieldRange::positive("petal_width", 10.0);

/// A validated flower measurement vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrisMeasurements {
    pub sepal_length: f64,
    pub sepal_width: f64,
    pub petal_length: f64,
    pub petal_width: f64,
}

impl IrisMeasurements {
    pub fn to_features(&self) -> [f64; 4] {
        [
            self.sepal_length,
            self.sepal_width,
            self.petal_length,
            self.petal_width,
        ]
    }
}

impl Default for IrisMeasurements {
    /// The dashboard's starting position.
    fn default() -> Self {
        Self {
            sepal_length: 5.8,
            sepal_width: 3.0,
            petal_length: 4.0,
            petal_width: 1.2,
        }
    }
}

/// Query parameters exactly as they arrived, before any parsing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawIrisQuery {
    pub sepal_length: Option<String>,
    pub sepal_width: Option<String>,
    pub petal_length: Option<String>,
    pub petal_width: Option<String>,
}

impl RawIrisQuery {
    pub fn validate(&self, location: Location) -> Result<IrisMeasurements, ValidationErrors> {
        let mut v = Validator::new(location);
        let sepal_length = v.float(&SEPAL_LENGTH, self.sepal_length.as_deref());
        let sepal_width = v.float(&SEPAL_WIDTH, self.sepal_width.as_deref());
        let petal_length = v.float(&PETAL_LENGTH, self.petal_length.as_deref());
        let petal_width = v.float(&PETAL_WIDTH, self.petal_width.as_deref());

        let (Some(sepal_length), Some(sepal_width), Some(petal_length), Some(petal_width)) =
            (sepal_length, sepal_width, petal_length, petal_width)
        else {
            return Err(v.into_errors());
        };

        Ok(IrisMeasurements {
            sepal_length,
            sepal_width,
            petal_length,
            petal_width,
        })
    }
}

impl TryFrom<RawIrisQuery> for IrisMeasurements {
    type Error = ValidationErrors;

    fn try_from(raw: RawIrisQuery) -> Result<Self, Self::Error> {
        raw.validate(Location::Query)
    }
}

impl From<&IrisMeasurements> for RawIrisQuery {
    fn from(m: &IrisMeasurements) -> Self {
        Self {
            sepal_length: Some(m.sepal_length.to_string()),
            sepal_width: Some(m.sepal_width.to_string()),
            petal_length: Some(m.petal_length.to_string()),
            petal_width: Some(m.petal_width.to_string()),
        }
    }
}

/// The three species the classifier distinguishes, by class label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrisSpecies {
    Setosa,
    Versicolor,
    Virginica,
}

impl IrisSpecies {
    pub const ALL: [IrisSpecies; 3] = [Self::Setosa, Self::Versicolor, Self::Virginica];

    pub fn from_label(label: i64) -> Option<Self> {
        match label {
            0 => Some(Self::Setosa),
            1 => Some(Self::Versicolor),
            2 => Some(Self::Virginica),
            _ => None,
        }
    }

    pub fn label(&self) -> i64 {
        match self {
            Self::Setosa => 0,
            Self::Versicolor => 1,
            Self::Virginica => 2,
        }
    }

    pub fn display(&self) -> SpeciesDisplay {
        match self {
            Self::Setosa => SpeciesDisplay {
                name: "Setosa",
                icon: "🌼",
                color: "#FF6B6B",
            },
            Self::Versicolor => SpeciesDisplay {
                name: "Versicolor",
                icon: "🌸",
                color: "#4ECDC4",
            },
            Self::Virginica => SpeciesDisplay {
                name: "Virginica",
                icon: "🌺",
                color: "#A66CFF",
            },
        }
    }
}

/// How a predicted label is shown to a human.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeciesDisplay {
    pub name: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

impl SpeciesDisplay {
    pub const UNKNOWN: SpeciesDisplay = SpeciesDisplay {
        name: "Unknown",
        icon: "❓",
        color: "#888",
    };

    /// Display entry for any label, falling back to [`SpeciesDisplay::UNKNOWN`].
    pub fn for_label(label: i64) -> Self {
        IrisSpecies::from_label(label)
            .map(|s| s.display())
            .unwrap_or(Self::UNKNOWN)
    }
}
