//! Package and library names.
//!
//! A name shows up in every identity caravel handles: package IDs, usage
//! keys, the qualifier on a compile plan. Names are created a handful of
//! times while manifests load, then copied and compared everywhere, so
//! the text is stored once in a process-wide pool and `Name` itself is a
//! `Copy` handle. Equality, ordering and hashing all go through the
//! content, so a `Name` behaves exactly like the `&str` it wraps.

use std::fmt;
use std::sync::{Mutex, OnceLock};

fn name_pool() -> &'static Mutex<Vec<&'static str>> {
    static POOL: OnceLock<Mutex<Vec<&'static str>>> = OnceLock::new();
    POOL.get_or_init(|| Mutex::new(Vec::new()))
}

/// A package or library name, pooled for cheap copying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(&'static str);

impl Name {
    /// Get the handle for a name, pooling its text on first sight.
    pub fn new(raw: impl AsRef<str>) -> Name {
        let raw = raw.as_ref();
        let mut pool = name_pool().lock().unwrap();
        let probe = pool.binary_search_by(|stored| {
            let stored: &str = stored;
            stored.cmp(raw)
        });
        match probe {
            Ok(found) => Name(pool[found]),
            Err(slot) => {
                // The pool is the sole owner and lives for the whole
                // process, so leaking is the storage strategy.
                let stored: &'static str = Box::leak(raw.to_owned().into_boxed_str());
                pool.insert(slot, stored);
                Name(stored)
            }
        }
    }

    /// The name's text.
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        self.0
    }
}

impl From<&str> for Name {
    fn from(raw: &str) -> Name {
        Name::new(raw)
    }
}

impl From<String> for Name {
    fn from(raw: String) -> Name {
        Name::new(raw)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
