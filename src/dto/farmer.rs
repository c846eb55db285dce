use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::entities::farmer;

pub const NAME_MAX: u64 = 255;
pub const PHONE_MAX: u64 = 15;
pub const LOCATION_MAX: u64 = 255;

/// Order in which field errors are reported
pub const FIELD_ORDER: &[&str] = &["name", "phone", "location"];

/// A submitted JSON value for a text column.
///
/// Anything that is not a JSON string is kept as-is so validation can report it
/// instead of the request failing to deserialize.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TextField {
    Text(String),
    Other(serde_json::Value),
}

impl TextField {
    /// Trimmed text, if this is a non-blank string
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(raw) => Some(raw.trim()).filter(|t| !t.is_empty()),
            Self::Other(_) => None,
        }
    }
}

/// Distinguishes `"field": null` (Some(Other(Null))) from an absent field (None).
fn present<'de, D>(deserializer: D) -> Result<Option<TextField>, D::Error>
where
    D: Deserializer<'de>,
{
    TextField::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[schema(example = json!({
    "name": "Amy Lee",
    "phone": "5550001111",
    "location": "Ohio"
}))]
pub struct CreateFarmerRequest {
    /// Farmer's full name
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, example = "Amy Lee", max_length = 255)]
    pub name: Option<TextField>,
    /// Contact phone, unique across farmers
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, example = "5550001111", max_length = 15)]
    pub phone: Option<TextField>,
    /// Free-form location
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, example = "Ohio", max_length = 255)]
    pub location: Option<TextField>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[schema(example = json!({ "location": "Indiana" }))]
pub struct UpdateFarmerRequest {
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, example = "Amy Lee", max_length = 255)]
    pub name: Option<TextField>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, example = "5550001111", max_length = 15)]
    pub phone: Option<TextField>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, example = "Indiana", max_length = 255)]
    pub location: Option<TextField>,
}

impl CreateFarmerRequest {
    /// Phone worth checking for uniqueness
    pub fn phone_candidate(&self) -> Option<&str> {
        self.phone.as_ref().and_then(TextField::text)
    }
}

impl UpdateFarmerRequest {
    pub fn phone_candidate(&self) -> Option<&str> {
        self.phone.as_ref().and_then(TextField::text)
    }
}

impl Validate for CreateFarmerRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        rules::required(&mut errors, "name", self.name.as_ref(), NAME_MAX);
        rules::required(&mut errors, "phone", self.phone.as_ref(), PHONE_MAX);
        rules::required(&mut errors, "location", self.location.as_ref(), LOCATION_MAX);
        rules::finish(errors)
    }
}

impl Validate for UpdateFarmerRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        rules::sometimes(&mut errors, "name", self.name.as_ref(), NAME_MAX);
        rules::sometimes(&mut errors, "phone", self.phone.as_ref(), PHONE_MAX);
        rules::sometimes(&mut errors, "location", self.location.as_ref(), LOCATION_MAX);
        rules::finish(errors)
    }
}

/// A validated farmer ready to insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFarmer {
    pub name: String,
    pub phone: String,
    pub location: String,
}

/// Validated partial update; `None` leaves the stored value alone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FarmerChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
}

fn owned_text(field: Option<TextField>) -> Option<String> {
    field.as_ref().and_then(TextField::text).map(str::to_string)
}

impl TryFrom<CreateFarmerRequest> for NewFarmer {
    type Error = ValidationErrors;

    fn try_from(request: CreateFarmerRequest) -> Result<Self, Self::Error> {
        request.validate()?;
        Ok(Self {
            name: owned_text(request.name).unwrap_or_default(),
            phone: owned_text(request.phone).unwrap_or_default(),
            location: owned_text(request.location).unwrap_or_default(),
        })
    }
}

impl TryFrom<UpdateFarmerRequest> for FarmerChanges {
    type Error = ValidationErrors;

    fn try_from(request: UpdateFarmerRequest) -> Result<Self, Self::Error> {
        request.validate()?;
        Ok(Self {
            name: owned_text(request.name),
            phone: owned_text(request.phone),
            location: owned_text(request.location),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "name": "John Doe",
    "phone": "1234567890",
    "location": "Texas",
    "created_at": "2024-06-01T10:30:00Z",
    "updated_at": "2024-06-01T10:30:00Z"
}))]
pub struct FarmerResponse {
    /// Farmer id assigned by the datastore
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "1234567890")]
    pub phone: String,
    #[schema(example = "Texas")]
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<farmer::Model> for FarmerResponse {
    fn from(model: farmer::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            phone: model.phone,
            location: model.location,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Field rules and their messages.
pub mod rules {
    use super::*;

    fn violation(code: &'static str, message: String) -> ValidationError {
        let mut err = ValidationError::new(code);
        err.message = Some(Cow::Owned(message));
        err
    }

    pub fn required_violation(field: &str) -> ValidationError {
        violation("required", format!("The {} field is required.", field))
    }

    pub fn string_violation(field: &str) -> ValidationError {
        violation("string", format!("The {} field must be a string.", field))
    }

    pub fn max_violation(field: &str, max: u64) -> ValidationError {
        let mut err = violation(
            "max",
            format!(
                "The {} field must not be greater than {} characters.",
                field, max
            ),
        );
        err.add_param(Cow::from("max"), &max);
        err
    }

    pub fn unique_violation(field: &str) -> ValidationError {
        violation("unique", format!("The {} has already been taken.", field))
    }

    fn check_length(errors: &mut ValidationErrors, field: &'static str, text: &str, max: u64) {
        if !validator::validate_length(text, None, Some(max), None) {
            errors.add(field, max_violation(field, max));
        }
    }

    /// Must be present, non-null, a string, and non-blank after trimming.
    pub fn required(
        errors: &mut ValidationErrors,
        field: &'static str,
        value: Option<&TextField>,
        max: u64,
    ) {
        match value {
            None | Some(TextField::Other(serde_json::Value::Null)) => {
                errors.add(field, required_violation(field))
            }
            Some(TextField::Other(_)) => errors.add(field, string_violation(field)),
            Some(text) => match text.text() {
                Some(trimmed) => check_length(errors, field, trimmed, max),
                None => errors.add(field, required_violation(field)),
            },
        }
    }

    /// Checked only when present; then it must be a non-blank string.
    pub fn sometimes(
        errors: &mut ValidationErrors,
        field: &'static str,
        value: Option<&TextField>,
        max: u64,
    ) {
        let Some(value) = value else {
            return;
        };
        match value.text() {
            Some(trimmed) => check_length(errors, field, trimmed, max),
            None => errors.add(field, string_violation(field)),
        }
    }

    pub fn finish(errors: ValidationErrors) -> Result<(), ValidationErrors> {
        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FieldErrors;
    use serde_json::json;

    fn create(body: serde_json::Value) -> CreateFarmerRequest {
        serde_json::from_value(body).unwrap()
    }

    fn update(body: serde_json::Value) -> UpdateFarmerRequest {
        serde_json::from_value(body).unwrap()
    }

    fn messages(errors: ValidationErrors) -> FieldErrors {
        FieldErrors::from_validation_errors(&errors, FIELD_ORDER)
    }

    #[test]
    fn null_and_missing_are_told_apart() {
        let request = create(json!({ "name": null }));
        assert_eq!(
            request.name,
            Some(TextField::Other(serde_json::Value::Null))
        );
        assert_eq!(request.phone, None);
    }

    #[test]
    fn valid_create_is_trimmed() {
        let farmer = NewFarmer::try_from(create(json!({
            "name": "  Amy Lee ",
            "phone": "5550001111",
            "location": "Ohio\n"
        })))
        .unwrap();

        assert_eq!(
            farmer,
            NewFarmer {
                name: "Amy Lee".into(),
                phone: "5550001111".into(),
                location: "Ohio".into(),
            }
        );
    }

    #[test]
    fn unknown_fields_are_dropped() {
        let farmer = NewFarmer::try_from(create(json!({
            "id": 99,
            "name": "Amy Lee",
            "phone": "5550001111",
            "location": "Ohio",
            "created_at": "1999-01-01T00:00:00Z"
        })))
        .unwrap();
        assert_eq!(farmer.name, "Amy Lee");
    }

    #[test]
    fn empty_create_reports_every_field_in_order() {
        let errors = messages(NewFarmer::try_from(create(json!({}))).unwrap_err());

        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["name", "phone", "location"]
        );
        assert_eq!(
            errors.get("name").unwrap(),
            &["The name field is required.".to_string()]
        );
        assert_eq!(
            errors.summary(),
            "The name field is required. (and 2 more errors)"
        );
    }

    #[test]
    fn blank_and_non_string_values_on_create() {
        let errors = messages(
            NewFarmer::try_from(create(json!({
                "name": "   ",
                "phone": 5550001111u64,
                "location": null
            })))
            .unwrap_err(),
        );

        assert_eq!(
            errors.get("name").unwrap(),
            &["The name field is required.".to_string()]
        );
        assert_eq!(
            errors.get("phone").unwrap(),
            &["The phone field must be a string.".to_string()]
        );
        assert_eq!(
            errors.get("location").unwrap(),
            &["The location field is required.".to_string()]
        );
    }

    #[test]
    fn lengths_count_characters() {
        // 15 multi-byte characters fit, 16 do not
        let ok = "é".repeat(15);
        let too_long = "é".repeat(16);

        assert!(NewFarmer::try_from(create(json!({
            "name": "Amy", "phone": ok, "location": "Ohio"
        })))
        .is_ok());

        let errors = messages(
            NewFarmer::try_from(create(json!({
                "name": "Amy", "phone": too_long, "location": "Ohio"
            })))
            .unwrap_err(),
        );
        assert_eq!(
            errors.get("phone").unwrap(),
            &["The phone field must not be greater than 15 characters.".to_string()]
        );
    }

    #[test]
    fn name_limit_is_255() {
        let errors = messages(
            NewFarmer::try_from(create(json!({
                "name": "a".repeat(256), "phone": "1", "location": "b".repeat(255)
            })))
            .unwrap_err(),
        );
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn empty_update_changes_nothing() {
        let changes = FarmerChanges::try_from(update(json!({}))).unwrap();
        assert_eq!(changes, FarmerChanges::default());
    }

    #[test]
    fn partial_update_keeps_only_present_fields() {
        let changes = FarmerChanges::try_from(update(json!({ "location": " Indiana " }))).unwrap();
        assert_eq!(
            changes,
            FarmerChanges {
                location: Some("Indiana".into()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn present_but_unusable_update_values_fail_string() {
        let errors = messages(
            FarmerChanges::try_from(update(json!({
                "name": null,
                "phone": "",
                "location": ["Ohio"]
            })))
            .unwrap_err(),
        );

        for field in FIELD_ORDER {
            assert_eq!(
                errors.get(field).unwrap(),
                &[format!("The {} field must be a string.", field)]
            );
        }
    }

    #[test]
    fn phone_candidate_is_trimmed_text_only() {
        assert_eq!(
            create(json!({ "phone": " 555 " })).phone_candidate(),
            Some("555")
        );
        assert_eq!(create(json!({ "phone": 555 })).phone_candidate(), None);
        assert_eq!(update(json!({ "phone": "  " })).phone_candidate(), None);
    }

    #[test]
    fn response_mirrors_model() {
        let now = Utc::now();
        let model = farmer::Model {
            id: 7,
            name: "Jane Smith".into(),
            phone: "9876543210".into(),
            location: "California".into(),
            created_at: now,
            updated_at: now,
        };

        let response = FarmerResponse::from(model);
        assert_eq!(response.id, 7);
        assert_eq!(response.location, "California");
        assert_eq!(
            serde_json::to_value(&response).unwrap()["phone"],
            "9876543210"
        );
    }
}
