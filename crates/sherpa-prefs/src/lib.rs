pub mod kv;
pub mod rank;
pub mod store;

pub use kv::{FileStore, KvStore, MemoryStore};
pub use rank::{rank, score};
pub use store::{
    ExpiryPolicy, Intensity, PreferenceStore, PreferencesUpdate, SessionPreferences, TripLength,
    MAX_DEEP_VIEWS, PREFS_KEY,
};
