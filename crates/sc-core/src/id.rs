use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Global string interner for screen IDs.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Last stamp handed out by `next_stamp`.
static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

/// A lightweight, interned identifier for screens on the canvas.
/// Internally a `Spur` index: 4 bytes, Copy, O(1) Eq and Hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScreenId(Spur);

impl ScreenId {
    /// Intern a string as a ScreenId, or return existing if already interned.
    pub fn intern(s: &str) -> Self {
        ScreenId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Generate a fresh `screen-<stamp>` id.
    pub fn generate() -> Self {
        Self::intern(&format!("screen-{}", next_stamp()))
    }

    /// Id of the `n`-th version synthesized from this base on load.
    pub fn version_of(&self, n: u32) -> Self {
        Self::intern(&format!("{}-v{n}", self.as_str()))
    }
}

/// Millisecond timestamp that is strictly greater than every stamp
/// returned before it in this process.
///
/// Used for `screen-`, `flow-` and `IMAGE-` ids so two requests completing
/// within the same millisecond still get distinct keys.
pub fn next_stamp() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let mut last = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_STAMP.compare_exchange_weak(last, candidate, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => return candidate,
            Err(seen) => last = seen,
        }
    }
}

impl fmt::Debug for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ScreenId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ScreenId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ScreenId::intern(&s))
    }
}
