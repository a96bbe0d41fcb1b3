use crate::utils::error::ValidationError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw form input for one route, before any domain checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteObservation {
    pub completed_more_than_one_route: i64,
    pub routes_completed: i64,
    pub time_to_complete_minutes: i64,
    pub adult_volunteers: i64,
    pub doors_in_route: i64,
    pub youth_volunteers: i64,
}

impl RouteObservation {
    /// Slider defaults of the prediction form.
    pub const FORM_DEFAULTS: RouteObservation = RouteObservation {
        completed_more_than_one_route: 0,
        routes_completed: 5,
        time_to_complete_minutes: 60,
        adult_volunteers: 10,
        doors_in_route: 100,
        youth_volunteers: 10,
    };

    /// Looks a field up by its schema name.
    pub fn field(&self, name: &str) -> Option<i64> {
        match name {
            "completedMoreThanOneRoute" => Some(self.completed_more_than_one_route),
            "routesCompleted" => Some(self.routes_completed),
            "timeToCompleteMinutes" => Some(self.time_to_complete_minutes),
            "adultVolunteers" => Some(self.adult_volunteers),
            "doorsInRoute" => Some(self.doors_in_route),
            "youthVolunteers" => Some(self.youth_volunteers),
            _ => None,
        }
    }

    /// Builds an observation from textual form fields keyed by schema name.
    ///
    /// Missing and non-integer values are rejected here; domain checks are
    /// left to the assembler.
    pub fn from_fields<'a, I>(fields: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let fields: Vec<(&str, &str)> = fields.into_iter().collect();
        let lookup = |name: &str| -> Result<i64, ValidationError> {
            let raw = fields
                .iter()
                .rev()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.trim())
                .ok_or_else(|| ValidationError::new(name, "value is missing"))?;
            if raw.is_empty() {
                return Err(ValidationError::new(name, "value is missing"));
            }
            raw.parse::<i64>().map_err(|_| {
                ValidationError::new(name, format!("'{}' is not a whole number", raw))
            })
        };

        Ok(Self {
            completed_more_than_one_route: lookup("completedMoreThanOneRoute")?,
            routes_completed: lookup("routesCompleted")?,
            time_to_complete_minutes: lookup("timeToCompleteMinutes")?,
            adult_volunteers: lookup("adultVolunteers")?,
            doors_in_route: lookup("doorsInRoute")?,
            youth_volunteers: lookup("youthVolunteers")?,
        })
    }
}

impl Default for RouteObservation {
    fn default() -> Self {
        Self::FORM_DEFAULTS
    }
}

/// Ordered model input. Only the assembler can build one.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    schema_version: String,
    values: Vec<f64>,
}

impl FeatureVector {
    pub(crate) fn new(schema_version: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            schema_version: schema_version.into(),
            values,
        }
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictedDonationCount(f64);

impl PredictedDonationCount {
    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for PredictedDonationCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 && self.0.abs() < 1e15 {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{:.2}", self.0)
        }
    }
}

/// One row of the donation drive dataset after column renaming.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DonationRecord {
    pub date: Option<NaiveDateTime>,
    pub location: String,
    pub city: String,
    pub stake: String,
    pub route: String,
    pub adult_volunteers: Option<f64>,
    pub youth_volunteers: Option<f64>,
    pub donation_bags_collected: Option<f64>,
    pub time_to_complete_minutes: Option<f64>,
    pub completed_more_than_one_route: Option<bool>,
    pub routes_completed: Option<f64>,
    pub doors_in_route: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fields_parses_all_six() {
        let obs = RouteObservation::from_fields([
            ("completedMoreThanOneRoute", "1"),
            ("routesCompleted", "3"),
            ("timeToCompleteMinutes", " 45 "),
            ("adultVolunteers", "4"),
            ("doorsInRoute", "120"),
            ("youthVolunteers", "2"),
        ])
        .unwrap();

        assert_eq!(obs.completed_more_than_one_route, 1);
        assert_eq!(obs.time_to_complete_minutes, 45);
        assert_eq!(obs.field("doorsInRoute"), Some(120));
    }

    #[test]
    fn test_from_fields_reports_missing_and_non_numeric() {
        let missing = RouteObservation::from_fields([("routesCompleted", "3")]).unwrap_err();
        assert_eq!(missing.field, "completedMoreThanOneRoute");

        let bad = RouteObservation::from_fields([
            ("completedMoreThanOneRoute", "0"),
            ("routesCompleted", "three"),
        ])
        .unwrap_err();
        assert_eq!(bad.field, "routesCompleted");
        assert!(bad.reason.contains("three"));
    }

    #[test]
    fn test_observation_json_uses_camel_case() {
        let json = serde_json::to_value(RouteObservation::default()).unwrap();
        assert_eq!(json["adultVolunteers"], 10);
        assert_eq!(json["completedMoreThanOneRoute"], 0);
    }

    #[test]
    fn test_prediction_display() {
        assert_eq!(PredictedDonationCount::new(12.0).to_string(), "12");
        assert_eq!(PredictedDonationCount::new(12.5).to_string(), "12.50");
    }
}
