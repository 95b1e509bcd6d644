//! Hike domain record, draft, and normalized field types.

use serde::{Deserialize, Serialize};

use crate::types::{Coords, Difficulty, HikeId};

/// Fully materialized, authoritative hike record.
///
/// Serialized with the camelCase field names of the persisted blob; absent
/// optional fields are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HikeRecord {
    /// Stable hike identifier.
    pub id: HikeId,
    /// Hike name.
    pub name: String,
    /// Location text.
    pub location: String,
    /// Free-form date/time text.
    pub date: String,
    /// Length in kilometres.
    pub length_km: f64,
    /// Free-text difficulty, conventionally one of [`Difficulty`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Latitude of the fix captured at save time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Longitude of the fix captured at save time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl HikeRecord {
    /// Builds a record from an id and normalized fields.
    pub fn from_fields(id: HikeId, fields: HikeFields) -> Self {
        let mut rec = Self {
            id,
            name: String::new(),
            location: String::new(),
            date: String::new(),
            length_km: 0.0,
            difficulty: None,
            description: None,
            latitude: None,
            longitude: None,
        };
        fields.apply_to(&mut rec);
        rec
    }

    /// Returns the coordinate pair when both halves are present.
    pub fn coords(&self) -> Option<Coords> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coords::new(latitude, longitude)),
            _ => None,
        }
    }

    /// Interprets the free-text difficulty as a conventional level.
    pub fn difficulty_level(&self) -> Option<Difficulty> {
        self.difficulty.as_deref().and_then(|d| d.parse().ok())
    }
}

/// Raw, unvalidated form input for a hike.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HikeDraft {
    /// Name text.
    pub name: String,
    /// Location text.
    pub location: String,
    /// Date/time text.
    pub date: String,
    /// Length text, parsed on save.
    pub length_km: String,
    /// Difficulty text; blank means absent.
    pub difficulty: String,
    /// Description text; blank means absent.
    pub description: String,
}

impl HikeDraft {
    /// Populates a draft from an existing record for editing.
    pub fn from_record(rec: &HikeRecord) -> Self {
        Self {
            name: rec.name.clone(),
            location: rec.location.clone(),
            date: rec.date.clone(),
            length_km: rec.length_km.to_string(),
            difficulty: rec.difficulty.clone().unwrap_or_default(),
            description: rec.description.clone().unwrap_or_default(),
        }
    }
}

/// Validated, normalized hike fields without an id.
#[derive(Debug, Clone, PartialEq)]
pub struct HikeFields {
    /// Trimmed name.
    pub name: String,
    /// Trimmed location.
    pub location: String,
    /// Trimmed date text.
    pub date: String,
    /// Parsed length in kilometres.
    pub length_km: f64,
    /// Trimmed difficulty, `None` when blank.
    pub difficulty: Option<String>,
    /// Trimmed description, `None` when blank.
    pub description: Option<String>,
    /// Coordinates captured at save time.
    pub coords: Option<Coords>,
}

impl HikeFields {
    /// Overwrites every field of `rec` except its id.
    ///
    /// Coordinates are only replaced when a fix is present, so editing a
    /// record without a new fix keeps its original position.
    pub fn apply_to(self, rec: &mut HikeRecord) {
        rec.name = self.name;
        rec.location = self.location;
        rec.date = self.date;
        rec.length_km = self.length_km;
        rec.difficulty = self.difficulty;
        rec.description = self.description;
        if let Some(c) = self.coords {
            rec.latitude = Some(c.latitude);
            rec.longitude = Some(c.longitude);
        }
    }
}

pub(crate) fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
