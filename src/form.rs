//! Draft state a form binds to, plus the save workflow around it.

use crate::{
    hike::{HikeDraft, HikeRecord},
    location::{LocationError, LocationProvider, get_current_fix},
    runtime::handle::{HikeLogHandle, RuntimeError},
    types::{Coords, Difficulty, HikeId},
    validate::{self, ValidationError},
};

/// Pending draft, editing marker, and captured fix.
///
/// `editing == None` is create mode; otherwise saves update that hike.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HikeForm {
    /// Field values bound to the form inputs.
    pub draft: HikeDraft,
    editing: Option<HikeId>,
    fix: Option<Coords>,
    location_error: Option<String>,
}

impl HikeForm {
    /// Creates an empty form in create mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hike currently being edited, if any.
    pub fn editing(&self) -> Option<&HikeId> {
        self.editing.as_ref()
    }

    /// Fix captured for the next save.
    pub fn fix(&self) -> Option<Coords> {
        self.fix
    }

    /// Message for the last failed fix attempt.
    pub fn location_error(&self) -> Option<&str> {
        self.location_error.as_deref()
    }

    /// Sets the difficulty field to a conventional level.
    pub fn set_difficulty(&mut self, level: Difficulty) {
        self.draft.difficulty = level.as_str().to_string();
    }

    /// Switches to edit mode for `rec`, loading its fields into the draft.
    pub fn edit(&mut self, rec: &HikeRecord) {
        self.draft = HikeDraft::from_record(rec);
        self.editing = Some(rec.id.clone());
        self.fix = None;
        self.location_error = None;
    }

    /// Clears the draft, the captured fix, and returns to create mode.
    pub fn reset_draft(&mut self) {
        *self = Self::default();
    }

    /// Checks the current draft.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::validate(&self.draft)
    }

    /// Requests one fix from `provider`.
    ///
    /// On success the fix is kept for the next save and the location text
    /// shows the coordinates; on failure the error message is kept for
    /// display. Saving stays possible either way.
    pub async fn capture_fix<P: LocationProvider + ?Sized>(
        &mut self,
        provider: &P,
    ) -> Result<Coords, LocationError> {
        self.location_error = None;
        match get_current_fix(provider).await {
            Ok(coords) => {
                self.fix = Some(coords);
                self.draft.location = coords.label();
                Ok(coords)
            }
            Err(err) => {
                self.location_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Saves the draft through `handle`.
    ///
    /// A successful create resets the form; a successful edit keeps it.
    pub async fn save(&mut self, handle: &HikeLogHandle) -> Result<HikeId, RuntimeError> {
        let creating = self.editing.is_none();
        let id = handle
            .save(self.draft.clone(), self.editing.clone(), self.fix)
            .await?;
        if creating {
            self.reset_draft();
        }
        Ok(id)
    }

    /// Deletes `id`, leaving edit mode once the hike being edited is gone.
    ///
    /// The draft is kept when the delete fails or removes nothing.
    pub async fn delete(&mut self, handle: &HikeLogHandle, id: HikeId) -> Result<bool, RuntimeError> {
        let was_editing = self.editing.as_ref() == Some(&id);
        let removed = handle.delete(id).await?;
        if removed && was_editing {
            self.reset_draft();
        }
        Ok(removed)
    }

    /// Resets the whole database and this form.
    pub async fn reset_all(&mut self, handle: &HikeLogHandle) -> Result<(), RuntimeError> {
        handle.reset_all().await?;
        self.reset_draft();
        Ok(())
    }
}
