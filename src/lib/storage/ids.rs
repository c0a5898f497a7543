//! Module generating identifiers of rendered artifacts.

use std::sync::atomic::{AtomicU64, Ordering};

use regex::Regex;
use time::OffsetDateTime;


lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_-]+").unwrap();
    static ref ARTIFACT_ID: Regex = Regex::new(r"^[A-Za-z0-9_-]+-[0-9]+$").unwrap();
}


/// Generator of `{templateId}-{timestamp}` artifact IDs,
/// where timestamp is in milliseconds since the Unix epoch.
///
/// The clock is monotonic: when two IDs would share the same millisecond,
/// the later one is moved forward, so IDs from one generator never collide.
#[derive(Debug, Default)]
pub struct ArtifactIds {
    last: AtomicU64,
}

impl ArtifactIds {
    #[inline]
    pub fn new() -> Self {
        ArtifactIds::default()
    }

    /// Produce the ID for a new artifact made from given template.
    pub fn next(&self, template_id: &str) -> String {
        let template_id = UNSAFE_CHARS.replace_all(template_id.trim(), "_");
        format!("{}-{}", template_id, self.next_timestamp())
    }

    fn next_timestamp(&self) -> u64 {
        let now = now_millis();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match self.last.compare_exchange_weak(
                    last, candidate, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }
}

/// Check whether the string has the form of an artifact ID.
pub fn is_artifact_id(s: &str) -> bool {
    ARTIFACT_ID.is_match(s)
}

fn now_millis() -> u64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    (nanos / 1_000_000).max(0) as u64
}


#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;
    use spectral::prelude::*;
    use super::{is_artifact_id, ArtifactIds};

    #[test]
    fn id_format() {
        let id = ArtifactIds::new().next("181913649");
        let (template, timestamp) = id.split_at(id.rfind('-').unwrap());
        assert_eq!("181913649", template);
        let millis: u64 = timestamp[1..].parse().unwrap();
        // Somewhere after 2020.
        assert_that!(millis).is_greater_than(1_577_836_800_000);
        assert!(is_artifact_id(&id));
    }

    #[test]
    fn ids_never_collide() {
        let ids = ArtifactIds::new();
        let generated: Vec<_> = (0..1000).map(|_| ids.next("drake")).collect();
        let unique: HashSet<_> = generated.iter().collect();
        assert_eq!(generated.len(), unique.len());
    }

    #[test]
    fn ids_never_collide_across_threads() {
        let ids = Arc::new(ArtifactIds::new());
        let handles: Vec<_> = (0..4).map(|_| {
            let ids = ids.clone();
            thread::spawn(move || (0..250).map(|_| ids.next("drake")).collect::<Vec<_>>())
        }).collect();
        let mut unique = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(unique.insert(id));
            }
        }
        assert_eq!(1000, unique.len());
    }

    #[test]
    fn template_id_is_sanitized() {
        let id = ArtifactIds::new().next("../../etc/passwd");
        assert!(id.starts_with("_etc_passwd-"), "unexpected id: {}", id);
        assert!(is_artifact_id(&id));
    }

    #[test]
    fn artifact_id_check() {
        assert!(is_artifact_id("drake-1700000000000"));
        assert!(!is_artifact_id("drake"));
        assert!(!is_artifact_id("../drake-1700000000000"));
        assert!(!is_artifact_id("drake-1700000000000.jpg"));
    }
}
