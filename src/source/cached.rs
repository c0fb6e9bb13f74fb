//! Option-list cache in front of a [`QueueSource`].
//!
//! Unit and practitioner lists change rarely, so they are fetched once per
//! process. Snapshots always go to the inner source.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use antrian_adapters::AdapterError;
use antrian_types::{FacilityOption, QueueSnapshot};

use super::QueueSource;

/// A source that remembers unit and practitioner lists.
///
/// Failed lookups are not cached. There is no invalidation; restart the
/// process to pick up a new list.
#[derive(Debug)]
pub struct CachedSource<S> {
    inner: S,
    units: RwLock<Option<Vec<FacilityOption>>>,
    doctors: RwLock<HashMap<String, Vec<FacilityOption>>>,
}

impl<S: QueueSource> CachedSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            units: RwLock::new(None),
            doctors: RwLock::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Label of a unit, if its list has been fetched.
    pub fn cached_unit_label(&self, unit_code: &str) -> Option<String> {
        let units = self.units.read();
        let units = units.as_ref()?;
        antrian_types::label_for(units, unit_code).map(str::to_string)
    }

    /// Label of a practitioner, if the unit's list has been fetched.
    pub fn cached_doctor_label(&self, unit_code: &str, doctor_code: &str) -> Option<String> {
        let doctors = self.doctors.read();
        let list = doctors.get(unit_code)?;
        antrian_types::label_for(list, doctor_code).map(str::to_string)
    }
}

#[async_trait]
impl<S: QueueSource> QueueSource for CachedSource<S> {
    async fn units(&self) -> Result<Vec<FacilityOption>, AdapterError> {
        let cached = self.units.read().clone();
        if let Some(units) = cached {
            return Ok(units);
        }

        let units = self.inner.units().await?;
        tracing::debug!(count = units.len(), "caching unit list");
        *self.units.write() = Some(units.clone());
        Ok(units)
    }

    async fn doctors(&self, unit_code: &str) -> Result<Vec<FacilityOption>, AdapterError> {
        let cached = self.doctors.read().get(unit_code).cloned();
        if let Some(doctors) = cached {
            return Ok(doctors);
        }

        let doctors = self.inner.doctors(unit_code).await?;
        tracing::debug!(unit = unit_code, count = doctors.len(), "caching practitioner list");
        self.doctors
            .write()
            .insert(unit_code.to_string(), doctors.clone());
        Ok(doctors)
    }

    async fn snapshot(
        &self,
        unit_code: &str,
        doctor_code: &str,
    ) -> Result<QueueSnapshot, AdapterError> {
        self.inner.snapshot(unit_code, doctor_code).await
    }

    fn description(&self) -> &str {
        self.inner.description()
    }
}
