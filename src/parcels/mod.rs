//! Parcel data model: the wide per-entity table and the snapshot source.

pub mod source;
pub mod table;

pub use source::{entity_id_from_snapshot_name, ParcelSource, SnapshotRef};
pub use table::{storage_name, Parcel, ParcelTable, MAX_FIELD_NAME_LEN};
