use crate::utils::error::{PlannerError, Result};
use crate::utils::validation::Validate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub budget: f64,
    /// Target duration in days.
    pub duration: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_data: Option<SuggestionSet>,
}

/// Partial update applied to a stored project. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub budget: Option<f64>,
    pub duration: Option<u32>,
    pub generated_data: Option<SuggestionSet>,
}

impl ProjectPatch {
    pub fn generated_data(set: SuggestionSet) -> Self {
        Self {
            generated_data: Some(set),
            ..Self::default()
        }
    }

    pub fn apply_to(self, project: &mut Project) {
        if let Some(name) = self.name {
            project.name = name;
        }
        if let Some(description) = self.description {
            project.description = description;
        }
        if let Some(budget) = self.budget {
            project.budget = budget;
        }
        if let Some(duration) = self.duration {
            project.duration = duration;
        }
        if let Some(set) = self.generated_data {
            project.generated_data = Some(set);
        }
    }
}

/// Candidate module produced by the draft service. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDraft {
    pub title: String,
    pub module_name: String,
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub title: String,
    pub module_name: String,
    pub duration: u32,
    /// Set when the catalog already holds a matching submodule.
    #[serde(default)]
    pub exists: bool,
}

impl Suggestion {
    pub fn new(title: impl Into<String>, module_name: impl Into<String>, duration: u32, exists: bool) -> Self {
        Self {
            title: title.into(),
            module_name: module_name.into(),
            duration,
            exists,
        }
    }

    pub fn process_title(&self) -> String {
        process_title(&self.title)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionSet {
    pub suggestions: Vec<Suggestion>,
}

impl SuggestionSet {
    pub fn new(suggestions: Vec<Suggestion>) -> Self {
        Self { suggestions }
    }

    /// Structural validation of an untyped payload.
    ///
    /// The value must be an object whose `suggestions` field is an array of
    /// suggestion objects with non-blank titles. Unknown fields are ignored;
    /// a missing `exists` flag reads as `false`.
    pub fn from_value(value: serde_json::Value) -> std::result::Result<Self, String> {
        let serde_json::Value::Object(mut obj) = value else {
            return Err("payload must be a JSON object".to_string());
        };

        let items = match obj.remove("suggestions") {
            Some(serde_json::Value::Array(items)) => items,
            Some(other) => {
                return Err(format!(
                    "'suggestions' must be a list, got {}",
                    json_type_name(&other)
                ))
            }
            None => return Err("missing 'suggestions' field".to_string()),
        };

        let suggestions = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value::<Suggestion>(item)
                    .map_err(|e| format!("suggestion #{} is malformed: {}", index, e))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let set = Self { suggestions };
        set.check_titles()?;
        Ok(set)
    }

    /// Every title must normalize to a non-empty process title.
    pub(crate) fn check_titles(&self) -> std::result::Result<(), String> {
        match self
            .suggestions
            .iter()
            .position(|s| s.process_title().is_empty())
        {
            Some(index) => Err(format!("suggestion #{} has a blank title", index)),
            None => Ok(()),
        }
    }

    /// Suggestions not yet present in the catalog.
    pub fn pending(&self) -> impl Iterator<Item = &Suggestion> {
        self.suggestions.iter().filter(|s| !s.exists)
    }

    pub fn len(&self) -> usize {
        self.suggestions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }
}

impl Validate for SuggestionSet {
    fn validate(&self) -> Result<()> {
        self.check_titles()
            .map_err(|message| PlannerError::ValidationError { message })
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Catalog entry. At most one record exists per `process_title`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmoduleRecord {
    pub name: String,
    pub module_name: String,
    pub duration: u32,
    pub process_title: String,
    pub created_at: DateTime<Utc>,
}

impl SubmoduleRecord {
    pub fn from_suggestion(suggestion: &Suggestion, created_at: DateTime<Utc>) -> Self {
        Self {
            name: suggestion.title.clone(),
            module_name: suggestion.module_name.clone(),
            duration: suggestion.duration,
            process_title: suggestion.process_title(),
            created_at,
        }
    }
}

/// Dedup key for a module title: lower-cased with all whitespace removed.
pub fn process_title(title: &str) -> String {
    title.to_lowercase().split_whitespace().collect()
}
