//! Named, versioned feature schema shared by the assembler and the model
//! artifact.
//!
//! The schema separates the *input fields* (what the form collects, each with
//! a domain) from the *positions* (the exact column order the trained model
//! consumes). A position always refers to an input field by name, so a field
//! may feed more than one column.

use crate::utils::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 0/1 encoded boolean.
    Flag,
    Integer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub min: i64,
    pub max: i64,
}

impl FieldSpec {
    pub const fn flag(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Flag,
            min: 0,
            max: 1,
        }
    }

    pub const fn integer(name: &'static str, label: &'static str, min: i64, max: i64) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Integer,
            min,
            max,
        }
    }

    pub fn check(&self, value: i64) -> Result<(), ValidationError> {
        match self.kind {
            FieldKind::Flag if value != 0 && value != 1 => Err(ValidationError::new(
                self.name,
                format!("{} must be 0 or 1, got {}", self.label, value),
            )),
            _ if value < self.min || value > self.max => Err(ValidationError::new(
                self.name,
                format!(
                    "{} must be between {} and {}, got {}",
                    self.label, self.min, self.max, value
                ),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    version: &'static str,
    fields: &'static [FieldSpec],
    positions: &'static [&'static str],
}

const ROUTE_FIELDS: [FieldSpec; 6] = [
    FieldSpec::flag("completedMoreThanOneRoute", "Completed More Than One Route"),
    FieldSpec::integer("routesCompleted", "Routes Completed", 1, 10),
    FieldSpec::integer("timeToCompleteMinutes", "Time to Complete (min)", 10, 300),
    FieldSpec::integer("adultVolunteers", "Number of Adult Volunteers", 1, 50),
    FieldSpec::integer("doorsInRoute", "Number of Doors in Route", 10, 500),
    FieldSpec::integer("youthVolunteers", "Number of Youth Volunteers", 1, 50),
];

// The shipped classifier was trained with the time column twice: once as
// "Time Spent" and once as "Time to Complete (min)".
const ROUTE_POSITIONS: [&str; 7] = [
    "completedMoreThanOneRoute",
    "routesCompleted",
    "timeToCompleteMinutes",
    "adultVolunteers",
    "doorsInRoute",
    "youthVolunteers",
    "timeToCompleteMinutes",
];

impl FeatureSchema {
    pub const ROUTE_V1: FeatureSchema = FeatureSchema {
        version: "route-v1",
        fields: &ROUTE_FIELDS,
        positions: &ROUTE_POSITIONS,
    };

    pub fn version(&self) -> &'static str {
        self.version
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    pub fn positions(&self) -> &'static [&'static str] {
        self.positions
    }

    pub fn width(&self) -> usize {
        self.positions.len()
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields that occupy more than one position.
    pub fn duplicated_fields(&self) -> Vec<&'static str> {
        let mut duplicated: Vec<&'static str> = Vec::new();
        for (i, name) in self.positions.iter().enumerate() {
            if self.positions[..i].contains(name) && !duplicated.contains(name) {
                duplicated.push(*name);
            }
        }
        duplicated
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::ROUTE_V1
    }
}
