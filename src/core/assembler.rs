use crate::core::schema::FeatureSchema;
use crate::domain::model::{FeatureVector, RouteObservation};
use crate::utils::error::ValidationError;

/// Turns validated form input into the positional vector a model consumes.
#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    schema: FeatureSchema,
}

impl FeatureAssembler {
    pub fn new(schema: FeatureSchema) -> Self {
        let duplicated = schema.duplicated_fields();
        if !duplicated.is_empty() {
            tracing::debug!(
                "Feature schema {} feeds {:?} into more than one model column",
                schema.version(),
                duplicated
            );
        }
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn assemble(&self, observation: &RouteObservation) -> Result<FeatureVector, ValidationError> {
        for field_spec in self.schema.fields() {
            let value = observation
                .field(field_spec.name)
                .ok_or_else(|| ValidationError::new(field_spec.name, "value is missing"))?;
            field_spec.check(value)?;
        }

        let values = self
            .schema
            .positions()
            .iter()
            .map(|name| {
                observation
                    .field(name)
                    .map(|v| v as f64)
                    .ok_or_else(|| ValidationError::new(*name, "value is missing"))
            })
            .collect::<Result<Vec<f64>, ValidationError>>()?;

        Ok(FeatureVector::new(self.schema.version(), values))
    }
}

impl Default for FeatureAssembler {
    fn default() -> Self {
        Self::new(FeatureSchema::ROUTE_V1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation() -> RouteObservation {
        RouteObservation {
            completed_more_than_one_route: 0,
            routes_completed: 5,
            time_to_complete_minutes: 60,
            adult_volunteers: 10,
            doors_in_route: 100,
            youth_volunteers: 10,
        }
    }

    #[test]
    fn test_assemble_duplicates_time_column() {
        let vector = FeatureAssembler::default().assemble(&observation()).unwrap();

        assert_eq!(vector.len(), 7);
        assert_eq!(vector.values(), &[0.0, 5.0, 60.0, 10.0, 100.0, 10.0, 60.0]);
        assert_eq!(vector.schema_version(), "route-v1");
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let assembler = FeatureAssembler::default();
        let first = assembler.assemble(&observation()).unwrap();
        for _ in 0..10 {
            assert_eq!(assembler.assemble(&observation()).unwrap(), first);
        }
    }

    #[test]
    fn test_assemble_rejects_out_of_domain_fields() {
        let assembler = FeatureAssembler::default();

        for adult in [0, 51] {
            let obs = RouteObservation {
                adult_volunteers: adult,
                ..observation()
            };
            let err = assembler.assemble(&obs).unwrap_err();
            assert_eq!(err.field, "adultVolunteers");
        }

        let obs = RouteObservation {
            completed_more_than_one_route: 2,
            ..observation()
        };
        assert_eq!(
            assembler.assemble(&obs).unwrap_err().field,
            "completedMoreThanOneRoute"
        );

        let obs = RouteObservation {
            time_to_complete_minutes: 301,
            ..observation()
        };
        assert_eq!(
            assembler.assemble(&obs).unwrap_err().field,
            "timeToCompleteMinutes"
        );
    }

    #[test]
    fn test_assemble_accepts_domain_bounds() {
        let assembler = FeatureAssembler::default();
        let low = RouteObservation {
            completed_more_than_one_route: 0,
            routes_completed: 1,
            time_to_complete_minutes: 10,
            adult_volunteers: 1,
            doors_in_route: 10,
            youth_volunteers: 1,
        };
        let high = RouteObservation {
            completed_more_than_one_route: 1,
            routes_completed: 10,
            time_to_complete_minutes: 300,
            adult_volunteers: 50,
            doors_in_route: 500,
            youth_volunteers: 50,
        };
        assert!(assembler.assemble(&low).is_ok());
        assert!(assembler.assemble(&high).is_ok());
    }
}
