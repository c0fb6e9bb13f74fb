//! Where queue snapshots come from.
//!
//! The monitor does not talk to the site adapter directly. It goes through
//! [`QueueSource`], which keeps the polling logic testable with scripted
//! sources and lets the option lists be cached in front of the site.

mod cached;

pub use cached::CachedSource;

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use antrian_adapters::rsuii::RsuiiAdapter;
use antrian_adapters::AdapterError;
use antrian_types::{FacilityOption, QueueSnapshot};

/// Trait for reading queue state from a hospital site.
///
/// # Example
///
/// ```no_run
/// use antrian_watch::{QueueSource, RsuiiAdapter};
///
/// # tokio_test::block_on(async {
/// let source = RsuiiAdapter::builder().build();
/// for unit in source.units().await.unwrap() {
///     println!("{} {}", unit.code, unit.label);
/// }
/// # });
/// ```
#[async_trait]
pub trait QueueSource: Send + Sync + Debug {
    /// List the units on the landing page.
    async fn units(&self) -> Result<Vec<FacilityOption>, AdapterError>;

    /// List the practitioners of a unit.
    async fn doctors(&self, unit_code: &str) -> Result<Vec<FacilityOption>, AdapterError>;

    /// Take a snapshot of one practitioner's queue.
    async fn snapshot(
        &self,
        unit_code: &str,
        doctor_code: &str,
    ) -> Result<QueueSnapshot, AdapterError>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;
}

#[async_trait]
impl QueueSource for RsuiiAdapter {
    async fn units(&self) -> Result<Vec<FacilityOption>, AdapterError> {
        RsuiiAdapter::units(self).await
    }

    async fn doctors(&self, unit_code: &str) -> Result<Vec<FacilityOption>, AdapterError> {
        RsuiiAdapter::doctors(self, unit_code).await
    }

    async fn snapshot(
        &self,
        unit_code: &str,
        doctor_code: &str,
    ) -> Result<QueueSnapshot, AdapterError> {
        self.collect(unit_code, doctor_code).await
    }

    fn description(&self) -> &str {
        self.endpoint()
    }
}

#[async_trait]
impl<S: QueueSource + ?Sized> QueueSource for Arc<S> {
    async fn units(&self) -> Result<Vec<FacilityOption>, AdapterError> {
        (**self).units().await
    }

    async fn doctors(&self, unit_code: &str) -> Result<Vec<FacilityOption>, AdapterError> {
        (**self).doctors(unit_code).await
    }

    async fn snapshot(
        &self,
        unit_code: &str,
        doctor_code: &str,
    ) -> Result<QueueSnapshot, AdapterError> {
        (**self).snapshot(unit_code, doctor_code).await
    }

    fn description(&self) -> &str {
        (**self).description()
    }
}
