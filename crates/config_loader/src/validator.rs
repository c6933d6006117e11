//! Configuration validation
//!
//! Validation rules:
//! - destination names unique and non-empty
//! - http destinations carry an `endpoint` param
//! - queue.max_size >= 1
//! - consent mapping categories non-empty
//! - declared events unique per (area, name)

use std::collections::HashSet;

use contracts::{DestinationKind, PipelineBlueprint, PipelineError};

/// Validate a PipelineBlueprint.
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &PipelineBlueprint) -> Result<(), PipelineError> {
    validate_destinations(blueprint)?;
    validate_queue(blueprint)?;
    validate_consent(blueprint)?;
    validate_events(blueprint)?;
    Ok(())
}

fn validate_destinations(blueprint: &PipelineBlueprint) -> Result<(), PipelineError> {
    let mut seen = HashSet::new();
    for destination in &blueprint.destinations {
        if destination.name.is_empty() {
            return Err(PipelineError::config_validation(
                "destinations[].name",
                "destination name must not be empty",
            ));
        }
        if !seen.insert(&destination.name) {
            return Err(PipelineError::config_validation(
                format!("destinations[name={}]", destination.name),
                "duplicate destination name",
            ));
        }
        if destination.kind == DestinationKind::Http
            && !destination.params.contains_key("endpoint")
        {
            return Err(PipelineError::config_validation(
                format!("destinations[name={}].params.endpoint", destination.name),
                "http destination requires an 'endpoint' param",
            ));
        }
    }
    Ok(())
}

fn validate_queue(blueprint: &PipelineBlueprint) -> Result<(), PipelineError> {
    if blueprint.queue.enabled && blueprint.queue.max_size == 0 {
        return Err(PipelineError::config_validation(
            "queue.max_size",
            "max_size must be >= 1",
        ));
    }
    Ok(())
}

fn validate_consent(blueprint: &PipelineBlueprint) -> Result<(), PipelineError> {
    if blueprint.consent.default_category.is_empty() {
        return Err(PipelineError::config_validation(
            "consent.default_category",
            "default category must not be empty",
        ));
    }
    for (pattern, category) in &blueprint.consent.mapping {
        if category.is_empty() {
            return Err(PipelineError::config_validation(
                format!("consent.mapping[{pattern}]"),
                "mapped category must not be empty",
            ));
        }
    }
    Ok(())
}

fn validate_events(blueprint: &PipelineBlueprint) -> Result<(), PipelineError> {
    let mut seen = HashSet::new();
    for event in &blueprint.events {
        if event.area.is_empty() || event.name.is_empty() {
            return Err(PipelineError::config_validation(
                "events[]",
                "event area and name must not be empty",
            ));
        }
        if !seen.insert((&event.area, &event.name)) {
            return Err(PipelineError::config_validation(
                format!("events[{}::{}]", event.area, event.name),
                "duplicate event declaration",
            ));
        }
    }
    Ok(())
}
