//! Cache key derivation and the memoization layer.
//!
//! A cache key is a readable composite of the dashboard name, the identity
//! token (when authenticated), the component key and every non-empty
//! parameter value in lexicographic parameter-name order. Keys are
//! deterministic byte-for-byte for identical inputs, and distinct identity
//! tokens can never collide with each other's entries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::error::TaskResult;
use crate::loader::Params;

/// Time-to-live applied to memoized loads unless the blueprint overrides it.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10);

/// The backing cache. The store owns atomicity: callers expect that
/// concurrent `get_or_compute` calls with the same key converge on a single
/// computation within the TTL window.
pub trait CacheStore: Send + Sync {
    fn get_or_compute(
        &self,
        key: &str,
        ttl: Duration,
        compute: &dyn Fn() -> TaskResult<Value>,
    ) -> TaskResult<Value>;
}

type Slot = Arc<Mutex<Option<(Instant, Value)>>>;

/// In-memory [`CacheStore`] with one slot per key. The outer map lock is held
/// only long enough to fetch the slot, so slow computations for one key never
/// block other keys; callers racing on the same key serialize on the slot and
/// all but the first reuse the freshly stored value.
#[derive(Default)]
pub struct MemoryCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCache {
    fn get_or_compute(
        &self,
        key: &str,
        ttl: Duration,
        compute: &dyn Fn() -> TaskResult<Value>,
    ) -> TaskResult<Value> {
        let slot = {
            let mut slots = self.slots.lock().unwrap();
            slots.entry(key.to_owned()).or_default().clone()
        };

        let mut entry = slot.lock().unwrap();
        if let Some((written, value)) = entry.as_ref() {
            if written.elapsed() < ttl {
                tracing::debug!(key, "cache hit");
                return Ok(value.clone());
            }
        }

        tracing::debug!(key, "cache miss");
        let value = compute()?;
        *entry = Some((Instant::now(), value.clone()));

        Ok(value)
    }
}

/// Derive the composite cache key for one component load.
pub(crate) fn cache_key(
    dashboard: &str,
    identity: Option<&str>,
    component: &str,
    params: &Params,
) -> String {
    let mut key = String::from(dashboard);
    if let Some(token) = identity {
        key.push('-');
        key.push_str(token);
    }
    key.push('-');
    key.push_str(component);

    for value in params.values() {
        if let Some(fragment) = fragment(value) {
            key.push('-');
            key.push_str(&fragment);
        }
    }

    key
}

/// Textual fragment of a parameter value, or `None` for empty values.
/// Empty values contribute nothing so that absent filters do not create
/// spurious cache misses. Numeric zero is a value, not an absence.
fn fragment(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(fragment)
                .collect::<Vec<_>>()
                .join(",");
            (!joined.is_empty()).then_some(joined)
        }
        Value::Object(map) if map.is_empty() => None,
        Value::Object(_) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, Value)]) -> Params {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_key_shape() {
        let params = params(&[("region", json!("emea")), ("year", json!(2024))]);
        assert_eq!(
            cache_key("sales", None, "revenue", &params),
            "sales-revenue-emea-2024"
        );
        assert_eq!(
            cache_key("sales", Some("tok123"), "revenue", &params),
            "sales-tok123-revenue-emea-2024"
        );
    }

    #[test]
    fn test_key_is_order_independent() {
        let a = params(&[("b", json!("2")), ("a", json!("1"))]);
        let b = params(&[("a", json!("1")), ("b", json!("2"))]);
        assert_eq!(
            cache_key("d", None, "c", &a),
            cache_key("d", None, "c", &b)
        );
    }

    #[test]
    fn test_empty_values_contribute_nothing() {
        let full = params(&[("region", json!("emea"))]);
        let padded = params(&[
            ("region", json!("emea")),
            ("search", json!("")),
            ("tags", json!([])),
            ("extra", Value::Null),
        ]);
        assert_eq!(
            cache_key("d", None, "c", &full),
            cache_key("d", None, "c", &padded)
        );
    }

    #[test]
    fn test_zero_is_kept() {
        let zero = params(&[("offset", json!(0))]);
        let absent = params(&[]);
        assert_ne!(
            cache_key("d", None, "c", &zero),
            cache_key("d", None, "c", &absent)
        );
    }

    #[test]
    fn test_identity_isolation() {
        let params = params(&[("region", json!("emea"))]);
        let alice = cache_key("d", Some("alice"), "c", &params);
        let bob = cache_key("d", Some("bob"), "c", &params);
        assert_ne!(alice, bob);
    }

    #[test]
    fn test_array_values_join() {
        let params = params(&[("regions", json!(["emea", "apac"]))]);
        assert_eq!(cache_key("d", None, "c", &params), "d-c-emea,apac");
    }

    #[test]
    fn test_memoization_within_ttl() {
        let cache = MemoryCache::new();
        let calls = AtomicUsize::new(0);
        let compute = || -> TaskResult<Value> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!(42))
        };

        let first = cache
            .get_or_compute("k", Duration::from_secs(60), &compute)
            .unwrap();
        let second = cache
            .get_or_compute("k", Duration::from_secs(60), &compute)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_expired_entries_recompute() {
        let cache = MemoryCache::new();
        let calls = AtomicUsize::new(0);
        let compute = || -> TaskResult<Value> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!(1))
        };

        cache
            .get_or_compute("k", Duration::ZERO, &compute)
            .unwrap();
        cache
            .get_or_compute("k", Duration::ZERO, &compute)
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failed_computations_are_not_cached() {
        let cache = MemoryCache::new();
        let calls = AtomicUsize::new(0);

        let failing = || -> TaskResult<Value> {
            calls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("boom")
        };
        assert!(
            cache
                .get_or_compute("k", Duration::from_secs(60), &failing)
                .is_err()
        );

        let ok = || -> TaskResult<Value> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!(2))
        };
        assert_eq!(
            cache
                .get_or_compute("k", Duration::from_secs(60), &ok)
                .unwrap(),
            json!(2)
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_distinct_keys_are_independent() {
        let cache = MemoryCache::new();
        let a = cache
            .get_or_compute("a", Duration::from_secs(60), &|| Ok(json!("a")))
            .unwrap();
        let b = cache
            .get_or_compute("b", Duration::from_secs(60), &|| Ok(json!("b")))
            .unwrap();
        assert_ne!(a, b);
    }
}
