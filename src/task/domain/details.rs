//! Descriptive task content: everything a creator may edit.

use super::{ParseTaskValueError, PriorityLevel, RequiredVolunteers, TaskDomainError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of relief work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Debris and mud cleanup.
    Cleanup,
    /// Search and rescue.
    Rescue,
    /// Moving supplies between stations and recipients.
    SupplyDelivery,
    /// First aid and medical support.
    MedicalAid,
    /// Staffing shelters.
    ShelterSupport,
}

impl TaskType {
    /// Every task type, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Cleanup,
        Self::Rescue,
        Self::SupplyDelivery,
        Self::MedicalAid,
        Self::ShelterSupport,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cleanup => "cleanup",
            Self::Rescue => "rescue",
            Self::SupplyDelivery => "supply_delivery",
            Self::MedicalAid => "medical_aid",
            Self::ShelterSupport => "shelter_support",
        }
    }
}

impl TryFrom<&str> for TaskType {
    type Error = ParseTaskValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|task_type| task_type.as_str() == normalized)
            .ok_or_else(|| ParseTaskValueError::new("task type", value))
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-empty task title of at most 200 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskTitle(String);

impl TaskTitle {
    const MAX_CHARS: usize = 200;

    /// Creates a validated, trimmed title.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] or
    /// [`TaskDomainError::TitleTooLong`].
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        let length = trimmed.chars().count();
        if length > Self::MAX_CHARS {
            return Err(TaskDomainError::TitleTooLong(length));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the title as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the work takes place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskLocation {
    address: String,
    details: Option<String>,
}

impl TaskLocation {
    /// Creates a location from a street address.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyAddress`] when the address is blank.
    pub fn new(address: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = address.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyAddress);
        }
        Ok(Self {
            address: trimmed.to_owned(),
            details: None,
        })
    }

    /// Adds free-form directions.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Returns the address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the directions, if any.
    #[must_use]
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }
}

/// Validated, editable content of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDetails {
    /// Short title.
    pub title: TaskTitle,
    /// Full description of the work.
    pub description: String,
    /// Work category.
    pub task_type: TaskType,
    /// Work location.
    pub location: TaskLocation,
    /// Number of volunteers needed.
    pub required_volunteers: RequiredVolunteers,
    /// Skills or qualifications volunteers should have.
    pub required_skills: Vec<String>,
    /// Optional deadline.
    pub deadline: Option<DateTime<Utc>>,
    /// Listing priority.
    pub priority: PriorityLevel,
}

impl TaskDetails {
    /// Creates details with a single volunteer slot and lowest priority.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyDescription`] when the description is
    /// blank.
    pub fn new(
        title: TaskTitle,
        description: impl Into<String>,
        task_type: TaskType,
        location: TaskLocation,
    ) -> Result<Self, TaskDomainError> {
        Ok(Self {
            title,
            description: validated_description(description.into())?,
            task_type,
            location,
            required_volunteers: RequiredVolunteers::new(1)?,
            required_skills: Vec::new(),
            deadline: None,
            priority: PriorityLevel::LOWEST,
        })
    }
}

fn validated_description(raw: String) -> Result<String, TaskDomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TaskDomainError::EmptyDescription);
    }
    Ok(trimmed.to_owned())
}

/// Partial update to [`TaskDetails`]; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// Replacement title.
    pub title: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement category.
    pub task_type: Option<TaskType>,
    /// Replacement address.
    pub address: Option<String>,
    /// Replacement volunteer count.
    pub required_volunteers: Option<u32>,
    /// Replacement skill list.
    pub required_skills: Option<Vec<String>>,
    /// Replacement deadline; `Some(None)` clears it.
    pub deadline: Option<Option<DateTime<Utc>>>,
    /// Replacement priority.
    pub priority: Option<u8>,
}

impl TaskPatch {
    /// Returns `true` when the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Produces patched details, validating every supplied field.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure; `details` is left untouched.
    pub fn apply_to(self, details: &TaskDetails) -> Result<TaskDetails, TaskDomainError> {
        let mut patched = details.clone();
        if let Some(title) = self.title {
            patched.title = TaskTitle::new(title)?;
        }
        if let Some(description) = self.description {
            patched.description = validated_description(description)?;
        }
        if let Some(task_type) = self.task_type {
            patched.task_type = task_type;
        }
        if let Some(address) = self.address {
            let mut location = TaskLocation::new(address)?;
            location.details = patched.location.details.take();
            patched.location = location;
        }
        if let Some(required) = self.required_volunteers {
            patched.required_volunteers = RequiredVolunteers::new(required)?;
        }
        if let Some(skills) = self.required_skills {
            patched.required_skills = skills;
        }
        if let Some(deadline) = self.deadline {
            patched.deadline = deadline;
        }
        if let Some(priority) = self.priority {
            patched.priority = PriorityLevel::new(priority)?;
        }
        Ok(patched)
    }
}
