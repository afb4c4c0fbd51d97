use std::collections::BTreeMap;

use serde::Serialize;

use super::Group;

/// Field-level validation messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub(crate) fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Cleaned post form input, ready to be written to a [`super::Post`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub text: String,
    pub group_id: Option<i64>,
}

impl PostDraft {
    /// Validate raw form input.
    ///
    /// The text is trimmed and must not be empty. `group` is the raw value of
    /// the group select; blank means no group, anything else must be the id of
    /// one of `known_groups`.
    pub fn validate(
        text: &str,
        group: Option<&str>,
        known_groups: &[Group],
    ) -> Result<Self, FormErrors> {
        let mut errors = FormErrors::default();

        let text = text.trim();
        if text.is_empty() {
            errors.add("text", "This field is required.");
        }

        let group_id = match group.map(str::trim).filter(|g| !g.is_empty()) {
            None => None,
            Some(raw) => {
                let id = raw
                    .parse::<i64>()
                    .ok()
                    .filter(|id| known_groups.iter().any(|g| g.id == *id));
                if id.is_none() {
                    errors.add(
                        "group",
                        "Select a valid choice. That choice is not one of the available choices.",
                    );
                }
                id
            }
        };

        errors.into_result()?;

        Ok(Self {
            text: text.to_string(),
            group_id,
        })
    }
}
