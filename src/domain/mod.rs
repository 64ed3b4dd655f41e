//! Domain models for the exporter
//!
//! Plain data types shared by the host seam and the export engine. Nothing in
//! here talks to the host or does I/O.

mod asset;
mod block;
mod entity;
mod options;
mod properties;

pub use asset::{AssetInfo, AssetRegistry, IMAGE_EXTENSIONS};
pub use block::Block;
pub use entity::{Entity, EntityRef};
pub use options::ExportOptions;
pub use properties::PropertyBag;
