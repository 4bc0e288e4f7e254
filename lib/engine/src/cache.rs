use dashmap::DashMap;
use formula_resolver_model::{ResolutionKey, ResolveResult, Scalar};
use futures::future::{BoxFuture, Shared};
use rustc_hash::FxHashMap;
use std::sync::Mutex;

/// Per-session value cache. Write-once: a key resolved earlier in the session
/// keeps its first scalar, so repeated observations are identical.
#[derive(Default)]
pub(crate) struct ValueCache {
    map: DashMap<ResolutionKey, Scalar>,
}

impl ValueCache {
    pub(crate) fn get(&self, key: &ResolutionKey) -> Option<Scalar> {
        self.map.get(key).map(|entry| entry.value().clone())
    }

    pub(crate) fn insert(&self, key: ResolutionKey, value: Scalar) {
        self.map.entry(key).or_insert(value);
    }

    pub(crate) fn clear(&self) {
        self.map.clear();
    }
}

/// The future-like handle a second arrival on a key awaits instead of
/// starting duplicate work.
pub(crate) type SharedResolve = Shared<BoxFuture<'static, ResolveResult<Scalar>>>;

/// In-flight resolutions keyed by [ResolutionKey].
#[derive(Default)]
pub(crate) struct InflightMap {
    map: Mutex<FxHashMap<ResolutionKey, SharedResolve>>,
}

impl InflightMap {
    /// Returns the existing in-flight computation for `key`, or installs the
    /// one produced by `create` and returns it.
    pub(crate) fn get_or_insert(
        &self,
        key: &ResolutionKey,
        create: impl FnOnce() -> SharedResolve,
    ) -> SharedResolve {
        let mut map = self.map.lock().expect("in-flight map poisoned");
        if let Some(existing) = map.get(key) {
            return existing.clone();
        }
        let fresh = create();
        map.insert(key.clone(), fresh.clone());
        fresh
    }

    pub(crate) fn remove(&self, key: &ResolutionKey) {
        self.map.lock().expect("in-flight map poisoned").remove(key);
    }

    pub(crate) fn clear(&self) {
        self.map.lock().expect("in-flight map poisoned").clear();
    }
}
