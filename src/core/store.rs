use std::time::{SystemTime, UNIX_EPOCH};

use hashbrown::{HashMap, HashSet};
use thiserror::Error;

use crate::{
    hike::{HikeFields, HikeRecord},
    op::{AppliedChange, Change},
    types::{Generation, HikeId},
};

/// Errors raised by store mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No hike with this id exists.
    #[error("hike not found: {0}")]
    MissingHike(HikeId),
}

/// Authoritative in-memory hike collection.
///
/// Records are kept oldest-first internally so ids stay at stable positions
/// on create; every public view is newest-first.
#[derive(Debug, Default)]
pub struct HikeStore {
    records: Vec<HikeRecord>,
    pos: HashMap<HikeId, usize>,
    next_generation: Generation,
    last_minted_ms: u64,
}

impl HikeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            next_generation: 1,
            ..Self::default()
        }
    }

    /// Builds a store from a newest-first record sequence.
    ///
    /// Duplicate ids keep their first (newest) occurrence. A record carrying
    /// only one coordinate loses it, and records with a non-finite length
    /// are dropped.
    pub fn from_records(newest_first: Vec<HikeRecord>) -> Self {
        let mut store = Self::new();
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(newest_first.len());

        for mut rec in newest_first {
            if !seen.insert(rec.id.clone()) {
                tracing::warn!(id = %rec.id, "dropping hike with duplicate id");
                continue;
            }
            if !rec.length_km.is_finite() {
                tracing::warn!(id = %rec.id, "dropping hike with non-finite length");
                continue;
            }
            if rec.latitude.is_some() != rec.longitude.is_some() {
                tracing::warn!(id = %rec.id, "clearing half-present coordinates");
                rec.latitude = None;
                rec.longitude = None;
            }
            kept.push(rec);
        }

        kept.reverse();
        store.records = kept;
        store.reindex_from(0);
        store
    }

    /// Newest-first copy of the whole collection.
    pub fn to_records(&self) -> Vec<HikeRecord> {
        self.iter().cloned().collect()
    }

    /// Newest-first iterator over the collection.
    pub fn iter(&self) -> impl Iterator<Item = &HikeRecord> {
        self.records.iter().rev()
    }

    /// Newest-first ids.
    pub fn ids(&self) -> Vec<HikeId> {
        self.iter().map(|r| r.id.clone()).collect()
    }

    /// Looks up a hike by id.
    pub fn get(&self, id: &HikeId) -> Option<&HikeRecord> {
        self.pos.get(id).map(|idx| &self.records[*idx])
    }

    /// Clones a hike by id.
    pub fn get_cloned(&self, id: &HikeId) -> Option<HikeRecord> {
        self.get(id).cloned()
    }

    /// Number of hikes.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Highest generation handed out so far.
    pub fn latest_generation(&self) -> Generation {
        self.next_generation.saturating_sub(1)
    }

    /// Creates a hike with a freshly minted id at the front of the collection.
    pub fn insert(&mut self, fields: HikeFields) -> (HikeId, AppliedChange) {
        let id = self.mint_id();
        self.pos.insert(id.clone(), self.records.len());
        self.records.push(HikeRecord::from_fields(id.clone(), fields));

        let applied = self.stamp(Change::Created { id: id.clone() });
        (id, applied)
    }

    /// Replaces the fields of an existing hike, keeping its id and position.
    pub fn update(&mut self, id: &HikeId, fields: HikeFields) -> Result<AppliedChange, StoreError> {
        let idx = *self
            .pos
            .get(id)
            .ok_or_else(|| StoreError::MissingHike(id.clone()))?;
        fields.apply_to(&mut self.records[idx]);
        Ok(self.stamp(Change::Updated { id: id.clone() }))
    }

    /// Removes a hike; `None` when no hike has this id.
    pub fn delete(&mut self, id: &HikeId) -> Option<AppliedChange> {
        let idx = self.pos.remove(id)?;
        self.records.remove(idx);
        self.reindex_from(idx);
        Some(self.stamp(Change::Deleted { id: id.clone() }))
    }

    /// Empties the collection.
    pub fn clear(&mut self) -> AppliedChange {
        self.records.clear();
        self.pos.clear();
        self.stamp(Change::Cleared)
    }

    fn stamp(&mut self, change: Change) -> AppliedChange {
        let generation = self.next_generation;
        self.next_generation += 1;
        AppliedChange { generation, change }
    }

    fn reindex_from(&mut self, start: usize) {
        for (idx, rec) in self.records.iter().enumerate().skip(start) {
            self.pos.insert(rec.id.clone(), idx);
        }
    }

    fn mint_id(&mut self) -> HikeId {
        let mut ms = now_ms().max(self.last_minted_ms.saturating_add(1));
        while self.pos.contains_key(&HikeId::new(ms.to_string())) {
            ms += 1;
        }
        self.last_minted_ms = ms;
        HikeId::new(ms.to_string())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
