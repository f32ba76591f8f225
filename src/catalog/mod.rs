//! Catalog: metadata records, tag sets, and the persisted store.

pub mod record;
pub mod store;
pub mod tags;

pub use record::{MetadataRecord, UserField, CUSTOM_FIELD_1_LABEL, CUSTOM_FIELD_2_LABEL};
pub use store::CatalogStore;
pub use tags::TagSet;
