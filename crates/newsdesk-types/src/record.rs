//! The [`Record`] capability trait.
//!
//! The data layer is generic over record types. The only structure it ever
//! relies on is what this trait exposes: the collection a type is stored
//! in, its identifier, and its version token. Any other field is only
//! touched by name, as a string, for sorting and counting -- the gateway
//! never inspects record fields directly.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::ids::{RecordId, VersionToken};

/// Capability trait for types that can be persisted by the data layer.
///
/// Records cross the session boundary as JSON documents, so every record
/// type must be serde-serializable. The identifier and version token are
/// session-managed: both are `None` on a freshly constructed value and are
/// filled in by the store on create.
///
/// # Example
///
/// ```
/// use newsdesk_types::{Language, Record};
///
/// let lang = Language::new("English", "en");
/// assert_eq!(Language::COLLECTION, "Language");
/// assert!(lang.id().is_none());
/// ```
pub trait Record: Serialize + DeserializeOwned + 'static {
    /// Name of the collection this type is stored in.
    ///
    /// This is the explicit per-type registration that stands in for
    /// deriving a store name from the type's name at runtime.
    const COLLECTION: &'static str;

    /// The record's identifier, if it has been persisted.
    fn id(&self) -> Option<RecordId>;

    /// The record's version token, if it has been persisted.
    fn version(&self) -> Option<VersionToken>;
}
