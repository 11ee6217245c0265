//! Backend classification
//!
//! Answers "which package manager handles this image" by probing the
//! registered drivers inside throwaway containers, and memoizes the
//! answer in the shared cache so an image is probed at most once per
//! host, not once per invocation.

pub mod drivers;
pub mod update;

use crate::cache::{self, ClassificationStore, UNCLASSIFIED};
use crate::error::PodpatchResult;
use crate::orchestration::ContainerRuntime;
use drivers::Driver;
use tracing::{debug, info};

/// Outcome of classifying an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A registered backend claims this image.
    Backend(String),
    /// No registered backend applies (or the cache is disabled).
    Unclassified,
}

/// Resolves and memoizes image classifications.
///
/// Owns the store for the lifetime of the invocation; every mutation is
/// written back through the cache file's read-merge-write protocol, so
/// concurrent invocations never clobber each other.
pub struct Classifier<'a> {
    store: ClassificationStore,
    runtime: &'a dyn ContainerRuntime,
}

impl<'a> Classifier<'a> {
    /// Classifier backed by the default cache location.
    pub fn new(runtime: &'a dyn ContainerRuntime) -> Self {
        Self {
            store: cache::load(),
            runtime,
        }
    }

    /// Classifier over an already-loaded store.
    pub fn with_store(store: ClassificationStore, runtime: &'a dyn ContainerRuntime) -> Self {
        Self { store, runtime }
    }

    pub fn store(&self) -> &ClassificationStore {
        &self.store
    }

    /// Classify an image by its ID.
    ///
    /// A cache hit never probes, including hits in the unclassified
    /// bucket: a negative answer is as sticky as a positive one. On a
    /// miss, drivers are probed in registration order and the first
    /// success wins. A disabled cache answers unclassified straight
    /// away; probing without being able to remember the answer would
    /// cost a container spin-up on every call for nothing.
    pub async fn resolve(&mut self, image_id: &str) -> Classification {
        if !self.store.is_valid() {
            return Classification::Unclassified;
        }

        if let Some(bucket) = self.store.bucket_of(image_id) {
            debug!("cache hit: {} handled by {}", image_id, bucket);
            return if bucket == UNCLASSIFIED {
                Classification::Unclassified
            } else {
                Classification::Backend(bucket.to_string())
            };
        }

        for driver in drivers::registered() {
            if self
                .runtime
                .check_command(image_id, driver.detect_command())
                .await
            {
                info!("image {} classified as {}", image_id, driver.name());
                self.store.record(driver.name(), image_id);
                cache::write_back(&mut self.store);
                return Classification::Backend(driver.name().to_string());
            }
        }

        info!("no backend claims image {}", image_id);
        self.store.record(UNCLASSIFIED, image_id);
        cache::write_back(&mut self.store);
        Classification::Unclassified
    }

    /// The driver for an image, or an error if no backend claims it.
    pub async fn driver_for(&mut self, image_id: &str) -> PodpatchResult<&'static dyn Driver> {
        match self.resolve(image_id).await {
            // A cache written by a newer podpatch may record names this
            // build does not know; treat those like unclassified images.
            Classification::Backend(name) => drivers::by_name(&name)
                .ok_or_else(|| crate::error::PodpatchError::UnsupportedImage(image_id.to_string())),
            Classification::Unclassified => {
                Err(crate::error::PodpatchError::UnsupportedImage(image_id.to_string()))
            }
        }
    }

    /// Record a finished update: the original image becomes outdated,
    /// the freshly committed image joins the backend's bucket.
    ///
    /// Resolving the original reference to its ID goes through the
    /// runtime and that failure propagates; without the ID there is
    /// nothing meaningful to record. The two records are independent
    /// and each writes back on its own; both are idempotent, so a crash
    /// in between loses at most one of them until the next update.
    pub async fn mark_remediated(
        &mut self,
        original: &str,
        result_id: &str,
        backend: &str,
    ) -> PodpatchResult<()> {
        let original_id = self.runtime.image_id(original).await?;

        if self.store.record_outdated(&original_id) {
            cache::write_back(&mut self.store);
        }
        if self.store.record(backend, result_id) {
            cache::write_back(&mut self.store);
        }
        Ok(())
    }

    /// Whether the image has already been patched or updated.
    pub fn is_remediated(&self, image_id: &str) -> bool {
        self.store.is_outdated(image_id)
    }

    /// Empty the cache, in memory and on disk. Bypasses the union-merge
    /// on purpose: merging an empty store would resurrect whatever is
    /// currently in the file.
    pub fn reset(&mut self) {
        self.store.clear();
        cache::replace_on_disk(&mut self.store);
    }
}
