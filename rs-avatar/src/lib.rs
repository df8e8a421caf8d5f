//! Avatar scene graph: decodes authored models into a part tree, keeps the
//! layered per-part transforms, overlays the host skeleton pose and walks
//! the tree into face batches under a complexity budget.

mod avatar;
mod customization;
mod decode;
mod encode;
mod error;
mod geometry;
mod loader;
pub mod math;
mod part;
mod render;
mod texture;
mod tree;
mod trust;
mod vanilla;

#[cfg(test)]
mod fixtures;

pub use avatar::{Avatar, COMPRESSED_EXTENSION};
pub use customization::{Customization, PartType, RenderType, pack_light, unpack_light};
pub use decode::{DecodeOptions, DecodeWarning, LoadReport, MAX_PART_DEPTH, decode_tree};
pub use encode::{MAX_MESH_TEXTURE_SLOT, encode_tree};
pub use error::{AvatarError, EncodeError, MathError, ScriptError};
pub use geometry::{
    CuboidFace, CuboidSource, GeometryBatch, GeometryError, IndexWidth, PartGeometry,
    VERTICES_PER_FACE, Vertex,
};
pub use loader::{AvatarLoader, AvatarSlot, AvatarSource, LoadedAvatar, OwnerId};
pub use part::{ModelPart, PartId, TextureSize};
pub use render::{
    FaceBatch, PartRenderState, RecordedBatch, RecordingBackend, RenderBackend, RenderStats,
    render_tree,
};
pub use texture::TextureSet;
pub use tree::ModelTree;
pub use trust::{COMPLEXITY_MAX, ComplexityBudget};
pub use vanilla::{BonePose, BonusTransform, HumanoidPose, ParentType, PoseSource, VanillaBone};
