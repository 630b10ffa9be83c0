//! The tracking-plan submission tree accepted by the reconciler.
//!
//! Shape is enforced by deserialisation; [`PlanSubmission::validate`] adds the
//! checks serde cannot express. A submission that fails validation never
//! reaches the reconciler.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  catalog::{EventType, PropertyType},
};

/// A plan and the events (with their properties) it declares.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSubmission {
  pub name:        String,
  #[serde(default)]
  pub description: Option<String>,
  pub events:      Vec<EventInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
  pub name:                  String,
  pub description:           String,
  /// When absent the reconciler matches on name alone, defaulting to
  /// [`EventType::Track`] if nothing matches.
  #[serde(rename = "type", default)]
  pub event_type:            Option<EventType>,
  pub additional_properties: bool,
  pub properties:            Vec<PropertyInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyInput {
  pub name:          String,
  #[serde(rename = "type")]
  pub property_type: PropertyType,
  pub description:   String,
  pub required:      bool,
}

impl PlanSubmission {
  /// Reject blank plan, event and property names.
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::Validation("plan name is required".to_owned()));
    }
    for (i, event) in self.events.iter().enumerate() {
      if event.name.trim().is_empty() {
        return Err(Error::Validation(format!("events[{i}].name is required")));
      }
      for (j, property) in event.properties.iter().enumerate() {
        if property.name.trim().is_empty() {
          return Err(Error::Validation(format!(
            "events[{i}].properties[{j}].name is required"
          )));
        }
      }
    }
    Ok(())
  }

  /// Total number of property links the submission declares.
  pub fn property_count(&self) -> usize {
    self.events.iter().map(|e| e.properties.len()).sum()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> PlanSubmission {
    serde_json::from_value(serde_json::json!({
      "name": "Sample Plan",
      "description": "A test plan",
      "events": [{
        "name": "Signup",
        "type": "track",
        "description": "User signup",
        "additionalProperties": false,
        "properties": [
          { "name": "email", "type": "string", "description": "User email", "required": true },
          { "name": "plan",  "type": "string", "description": "Chosen plan", "required": false }
        ]
      }]
    }))
    .unwrap()
  }

  #[test]
  fn deserialises_wire_shape() {
    let s = sample();
    assert_eq!(s.name, "Sample Plan");
    assert_eq!(s.events[0].event_type, Some(EventType::Track));
    assert!(!s.events[0].additional_properties);
    assert_eq!(s.events[0].properties[1].property_type, PropertyType::String);
    assert_eq!(s.property_count(), 2);
    assert!(s.validate().is_ok());
  }

  #[test]
  fn event_type_is_optional() {
    let s: PlanSubmission = serde_json::from_value(serde_json::json!({
      "name": "p",
      "events": [{
        "name": "Login",
        "description": "d",
        "additionalProperties": true,
        "properties": []
      }]
    }))
    .unwrap();
    assert_eq!(s.events[0].event_type, None);
    assert_eq!(s.description, None);
  }

  #[test]
  fn unknown_event_type_is_rejected() {
    let r: std::result::Result<PlanSubmission, serde_json::Error> = serde_json::from_value(serde_json::json!({
      "name": "p",
      "events": [{
        "name": "Login",
        "type": "click",
        "description": "d",
        "additionalProperties": true,
        "properties": []
      }]
    }));
    assert!(r.is_err());
  }

  #[test]
  fn blank_names_fail_validation() {
    let mut s = sample();
    s.name = "  ".into();
    assert!(matches!(s.validate(), Err(Error::Validation(_))));

    let mut s = sample();
    s.events[0].properties[1].name = String::new();
    let err = s.validate().unwrap_err().to_string();
    assert!(err.contains("events[0].properties[1].name"), "{err}");
  }
}
