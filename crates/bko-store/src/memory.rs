use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::error::{RegistryError, RegistryResult};
use crate::traits::ObjectRegistry;

type ObjectSet = Arc<RwLock<HashSet<String>>>;

/// In-memory, `HashMap`-based registry.
///
/// The bucket map sits behind one `RwLock` and every bucket's object set
/// behind its own. Once a bucket exists, inserts and removes only take the
/// outer lock for reading, so writers to different buckets run in
/// parallel. The outer write lock is taken only to create a bucket, and the
/// first object is added before it is released.
///
/// Lock order is always outer map, then bucket set.
pub struct InMemoryRegistry {
    buckets: RwLock<HashMap<String, ObjectSet>>,
}

impl InMemoryRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
        }
    }

    /// Number of buckets ever inserted into, including emptied ones.
    pub fn bucket_count(&self) -> RegistryResult<usize> {
        Ok(self.buckets.read()?.len())
    }

    /// Total number of objects across all buckets.
    pub fn object_count(&self) -> RegistryResult<usize> {
        let buckets = self.buckets.read()?;
        let mut total = 0;
        for set in buckets.values() {
            total += set.read()?.len();
        }
        Ok(total)
    }

    /// Returns `true` if the bucket has ever held an object.
    pub fn contains_bucket(&self, bucket: &str) -> RegistryResult<bool> {
        Ok(self.buckets.read()?.contains_key(bucket))
    }

    fn bucket(&self, bucket: &str) -> RegistryResult<Option<ObjectSet>> {
        let buckets = self.buckets.read()?;
        Ok(buckets.get(bucket).cloned())
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectRegistry for InMemoryRegistry {
    fn insert_object(&self, bucket: &str, object: &str) -> RegistryResult<()> {
        if let Some(set) = self.bucket(bucket)? {
            set.write()?.insert(object.to_owned());
            return Ok(());
        }

        // Another writer may have created the bucket between the two locks;
        // `entry` covers that case.
        let mut buckets = self.buckets.write()?;
        let set = buckets.entry(bucket.to_owned()).or_default();
        set.write()?.insert(object.to_owned());
        debug!(bucket, object, "bucket created");
        Ok(())
    }

    fn get_object(&self, bucket: &str, object: &str) -> RegistryResult<String> {
        let set = self
            .bucket(bucket)?
            .ok_or_else(|| RegistryError::bucket_not_found(bucket))?;
        let objects = set.read()?;
        if objects.contains(object) {
            debug!(bucket, object, "found object");
            Ok(object.to_owned())
        } else {
            Err(RegistryError::object_not_found(bucket, object))
        }
    }

    fn remove_object(&self, bucket: &str, object: &str) -> RegistryResult<()> {
        let set = self
            .bucket(bucket)?
            .ok_or_else(|| RegistryError::bucket_not_found(bucket))?;
        if set.write()?.remove(object) {
            debug!(bucket, object, "removed object");
            Ok(())
        } else {
            Err(RegistryError::object_not_found(bucket, object))
        }
    }
}

impl std::fmt::Debug for InMemoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("InMemoryRegistry");
        match self.bucket_count() {
            Ok(count) => s.field("bucket_count", &count),
            Err(_) => s.field("bucket_count", &"<poisoned>"),
        };
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bucket_not_found(bucket: &str) -> RegistryError {
        RegistryError::BucketNotFound {
            bucket: bucket.into(),
        }
    }

    fn object_not_found(bucket: &str, object: &str) -> RegistryError {
        RegistryError::ObjectNotFound {
            bucket: bucket.into(),
            object: object.into(),
        }
    }

    // -----------------------------------------------------------------------
    // Core operations
    // -----------------------------------------------------------------------

    #[test]
    fn insert_then_get() {
        let registry = InMemoryRegistry::new();
        registry.insert_object("b1", "o1").unwrap();
        assert_eq!(registry.get_object("b1", "o1").unwrap(), "o1");
    }

    #[test]
    fn get_from_unknown_bucket() {
        let registry = InMemoryRegistry::new();
        assert_eq!(
            registry.get_object("b1", "o1").unwrap_err(),
            bucket_not_found("b1")
        );
    }

    #[test]
    fn get_unknown_object_in_known_bucket() {
        let registry = InMemoryRegistry::new();
        registry.insert_object("b1", "o1").unwrap();
        assert_eq!(
            registry.get_object("b1", "o2").unwrap_err(),
            object_not_found("b1", "o2")
        );
    }

    #[test]
    fn insert_is_idempotent() {
        let registry = InMemoryRegistry::new();
        registry.insert_object("b1", "o1").unwrap();
        registry.insert_object("b1", "o1").unwrap();
        assert_eq!(registry.object_count().unwrap(), 1);
        assert_eq!(registry.get_object("b1", "o1").unwrap(), "o1");
    }

    #[test]
    fn remove_then_get() {
        let registry = InMemoryRegistry::new();
        registry.insert_object("b1", "o1").unwrap();
        registry.remove_object("b1", "o1").unwrap();
        assert_eq!(
            registry.get_object("b1", "o1").unwrap_err(),
            object_not_found("b1", "o1")
        );
    }

    #[test]
    fn second_remove_reports_object_not_found() {
        let registry = InMemoryRegistry::new();
        registry.insert_object("b1", "o1").unwrap();
        registry.remove_object("b1", "o1").unwrap();
        assert_eq!(
            registry.remove_object("b1", "o1").unwrap_err(),
            object_not_found("b1", "o1")
        );
    }

    #[test]
    fn remove_never_inserted() {
        let registry = InMemoryRegistry::new();
        assert_eq!(
            registry.remove_object("b1", "o1").unwrap_err(),
            bucket_not_found("b1")
        );
        registry.insert_object("b1", "o1").unwrap();
        assert_eq!(
            registry.remove_object("b1", "o2").unwrap_err(),
            object_not_found("b1", "o2")
        );
    }

    #[test]
    fn emptied_bucket_stays_known() {
        let registry = InMemoryRegistry::new();
        registry.insert_object("b1", "o1").unwrap();
        registry.remove_object("b1", "o1").unwrap();
        assert!(registry.contains_bucket("b1").unwrap());
        assert_eq!(registry.bucket_count().unwrap(), 1);
        assert_eq!(registry.object_count().unwrap(), 0);
    }

    #[test]
    fn buckets_are_namespaces() {
        let registry = InMemoryRegistry::new();
        registry.insert_object("b1", "shared").unwrap();
        registry.insert_object("b2", "shared").unwrap();
        registry.remove_object("b1", "shared").unwrap();
        assert_eq!(registry.get_object("b2", "shared").unwrap(), "shared");
    }

    #[test]
    fn contains_object_default() {
        let registry = InMemoryRegistry::new();
        assert!(!registry.contains_object("b1", "o1").unwrap());
        registry.insert_object("b1", "o1").unwrap();
        assert!(registry.contains_object("b1", "o1").unwrap());
        assert!(!registry.contains_object("b1", "o2").unwrap());
    }

    #[test]
    fn scenario() {
        let registry = InMemoryRegistry::new();
        registry.insert_object("b1", "o1").unwrap();
        assert_eq!(registry.get_object("b1", "o1").unwrap(), "o1");
        assert_eq!(
            registry.get_object("b1", "o2").unwrap_err(),
            object_not_found("b1", "o2")
        );
        assert_eq!(
            registry.get_object("b2", "o1").unwrap_err(),
            bucket_not_found("b2")
        );
        registry.remove_object("b1", "o1").unwrap();
        assert_eq!(
            registry.get_object("b1", "o1").unwrap_err(),
            object_not_found("b1", "o1")
        );
    }

    #[test]
    fn usable_as_trait_object() {
        let registry: Arc<dyn ObjectRegistry> = Arc::new(InMemoryRegistry::new());
        registry.insert_object("b1", "o1").unwrap();
        assert_eq!(registry.get_object("b1", "o1").unwrap(), "o1");
    }

    #[test]
    fn debug_shows_bucket_count() {
        let registry = InMemoryRegistry::new();
        registry.insert_object("b1", "o1").unwrap();
        assert_eq!(
            format!("{registry:?}"),
            "InMemoryRegistry { bucket_count: 1 }"
        );
    }

    #[test]
    fn poisoned_lock_is_an_error() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.insert_object("b1", "o1").unwrap();

        let poisoner = Arc::clone(&registry);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.buckets.write().unwrap();
            panic!("poison the bucket map");
        })
        .join();

        let err = registry.get_object("b1", "o1").unwrap_err();
        assert_eq!(err, RegistryError::LockPoisoned);
        assert!(!err.is_not_found());
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_inserts_into_one_bucket_are_not_lost() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 250;

        let registry = InMemoryRegistry::new();
        std::thread::scope(|s| {
            for t in 0..THREADS {
                let registry = &registry;
                s.spawn(move || {
                    for i in 0..PER_THREAD {
                        registry
                            .insert_object("shared", &format!("obj-{t}-{i}"))
                            .unwrap();
                    }
                });
            }
        });

        assert_eq!(registry.bucket_count().unwrap(), 1);
        assert_eq!(registry.object_count().unwrap(), THREADS * PER_THREAD);
        for t in 0..THREADS {
            for i in 0..PER_THREAD {
                let key = format!("obj-{t}-{i}");
                assert_eq!(registry.get_object("shared", &key).unwrap(), key);
            }
        }
    }

    #[test]
    fn concurrent_inserts_across_buckets() {
        let registry = InMemoryRegistry::new();
        std::thread::scope(|s| {
            for t in 0..8 {
                let registry = &registry;
                s.spawn(move || {
                    let bucket = format!("bucket-{t}");
                    for i in 0..100 {
                        registry.insert_object(&bucket, &format!("o{i}")).unwrap();
                    }
                });
            }
        });

        assert_eq!(registry.bucket_count().unwrap(), 8);
        assert_eq!(registry.object_count().unwrap(), 800);
    }

    #[test]
    fn readers_never_see_a_half_created_bucket() {
        // Only ("fresh", "o1") is ever inserted, so a reader may see the
        // bucket missing or the object present, but never an empty bucket.
        for _ in 0..50 {
            let registry = InMemoryRegistry::new();
            std::thread::scope(|s| {
                let r = &registry;
                for _ in 0..4 {
                    s.spawn(move || {
                        for _ in 0..200 {
                            match r.get_object("fresh", "o1") {
                                Ok(key) => assert_eq!(key, "o1"),
                                Err(RegistryError::BucketNotFound { .. }) => {}
                                Err(other) => panic!("torn read: {other}"),
                            }
                        }
                    });
                }
                s.spawn(move || r.insert_object("fresh", "o1").unwrap());
            });
        }
    }

    // -----------------------------------------------------------------------
    // Model-based properties
    // -----------------------------------------------------------------------

    #[derive(Debug, Clone)]
    enum Op {
        Insert(String, String),
        Get(String, String),
        Remove(String, String),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let pair = ("[a-c]", "[x-z]");
        prop_oneof![
            pair.prop_map(|(b, o)| Op::Insert(b, o)),
            pair.prop_map(|(b, o)| Op::Get(b, o)),
            pair.prop_map(|(b, o)| Op::Remove(b, o)),
        ]
    }

    fn expected_lookup(
        model: &HashMap<String, HashSet<String>>,
        bucket: &str,
        object: &str,
    ) -> RegistryResult<String> {
        match model.get(bucket) {
            None => Err(bucket_not_found(bucket)),
            Some(set) if set.contains(object) => Ok(object.to_owned()),
            Some(_) => Err(object_not_found(bucket, object)),
        }
    }

    proptest! {
        #[test]
        fn matches_set_model(ops in prop::collection::vec(op_strategy(), 1..64)) {
            let registry = InMemoryRegistry::new();
            let mut model: HashMap<String, HashSet<String>> = HashMap::new();

            for op in ops {
                match op {
                    Op::Insert(b, o) => {
                        prop_assert_eq!(registry.insert_object(&b, &o), Ok(()));
                        model.entry(b).or_default().insert(o);
                    }
                    Op::Get(b, o) => {
                        prop_assert_eq!(
                            registry.get_object(&b, &o),
                            expected_lookup(&model, &b, &o)
                        );
                    }
                    Op::Remove(b, o) => {
                        let expected = expected_lookup(&model, &b, &o).map(|_| ());
                        prop_assert_eq!(registry.remove_object(&b, &o), expected.clone());
                        if let (Ok(()), Some(set)) = (expected, model.get_mut(&b)) {
                            set.remove(&o);
                        }
                    }
                }
            }

            let total: usize = model.values().map(HashSet::len).sum();
            prop_assert_eq!(registry.object_count().unwrap(), total);
            prop_assert_eq!(registry.bucket_count().unwrap(), model.len());
        }

        #[test]
        fn insert_then_get_round_trips(bucket in "\\PC{1,16}", object in "\\PC{1,16}") {
            let registry = InMemoryRegistry::new();
            registry.insert_object(&bucket, &object).unwrap();
            registry.insert_object(&bucket, &object).unwrap();
            prop_assert_eq!(registry.get_object(&bucket, &object).unwrap(), object.clone());
            prop_assert_eq!(registry.object_count().unwrap(), 1);
        }
    }
}
