//! Frame correlation.
//!
//! Numbers the display frames of a load and maps every entry of the related
//! traces to the frames it contributed to.

pub mod frame_map;
pub mod mapper;
pub mod relation;
pub mod table;

// Re-export main types
pub use frame_map::{FrameMap, FramesRange};
pub use mapper::FrameMapper;
pub use relation::{default_relations, FrameRelation, LinkMode, ROOT_PREFERENCE};
pub use table::{Frame, FrameTable};
