use std::collections::HashMap;
use std::fmt;

use crate::customization::Customization;
use crate::geometry::PartGeometry;
use crate::math::{Mat3, Mat4};
use crate::vanilla::{ParentType, VanillaBone};

/// Handle of a part inside its [`ModelTree`](crate::ModelTree).
///
/// Parts are stored in decode pre-order, so the root is always `PartId(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartId(pub(crate) usize);

impl PartId {
    pub const ROOT: PartId = PartId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// Texture resolution shared by every face under a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureSize {
    /// No faces at all under this part.
    #[default]
    Empty,
    Uniform(u32, u32),
    /// Faces use textures of different sizes (or an unreadable texture).
    Mixed,
}

impl TextureSize {
    pub fn merge(self, other: TextureSize) -> TextureSize {
        match (self, other) {
            (TextureSize::Empty, x) | (x, TextureSize::Empty) => x,
            (TextureSize::Uniform(w1, h1), TextureSize::Uniform(w2, h2)) if w1 == w2 && h1 == h2 => {
                self
            }
            _ => TextureSize::Mixed,
        }
    }

    pub fn get(self) -> Option<(u32, u32)> {
        match self {
            TextureSize::Uniform(w, h) => Some((w, h)),
            _ => None,
        }
    }

    /// Width, or -1 when unknown.
    pub fn width(self) -> i32 {
        self.get().map_or(-1, |(w, _)| w as i32)
    }

    /// Height, or -1 when unknown.
    pub fn height(self) -> i32 {
        self.get().map_or(-1, |(_, h)| h as i32)
    }
}

pub struct ModelPart {
    pub(crate) name: String,
    pub(crate) parent: Option<PartId>,
    pub(crate) children: Vec<PartId>,
    // Valid forever: the child set never changes after decode.
    pub(crate) child_cache: HashMap<String, Option<PartId>>,
    pub customization: Customization,
    pub(crate) parent_type: ParentType,
    pub(crate) bone: Option<VanillaBone>,
    pub(crate) index: Option<usize>,
    pub(crate) geometry: PartGeometry,
    pub(crate) texture_size: TextureSize,
    pub(crate) saved_part_to_world: Mat4,
    // Derived from saved_part_to_world, refreshed only when that moves.
    pub(crate) saved_normal_to_world: Mat3,
}

impl ModelPart {
    pub(crate) fn new(name: String, customization: Customization) -> Self {
        Self {
            name,
            parent: None,
            children: Vec::new(),
            child_cache: HashMap::new(),
            customization,
            parent_type: ParentType::None,
            bone: None,
            index: None,
            geometry: PartGeometry::default(),
            texture_size: TextureSize::Empty,
            saved_part_to_world: Mat4::IDENTITY,
            saved_normal_to_world: Mat3::IDENTITY,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<PartId> {
        self.parent
    }

    pub fn children(&self) -> &[PartId] {
        &self.children
    }

    /// Geometry ordinal in decode pre-order, -1 for parts without geometry.
    pub fn index(&self) -> i32 {
        self.index.map_or(-1, |i| i as i32)
    }

    pub fn has_geometry(&self) -> bool {
        self.index.is_some()
    }

    pub fn geometry(&self) -> &PartGeometry {
        &self.geometry
    }

    pub fn texture_size(&self) -> TextureSize {
        self.texture_size
    }

    pub fn parent_type(&self) -> ParentType {
        self.parent_type
    }

    pub fn set_parent_type(&mut self, parent_type: ParentType) {
        self.parent_type = parent_type;
        self.bone = parent_type.bone();
    }

    /// Bone resolved from the parent type when it was assigned.
    pub fn vanilla_bone(&self) -> Option<VanillaBone> {
        self.bone
    }

    /// Part-to-world matrix captured by the last render pass.
    pub fn part_to_world(&self) -> Mat4 {
        self.saved_part_to_world
    }

    /// Normal matrix matching [`ModelPart::part_to_world`].
    pub fn normal_to_world(&self) -> Mat3 {
        self.saved_normal_to_world
    }
}

impl fmt::Debug for ModelPart {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ModelPart")
            .field("name", &self.name)
            .field("index", &self.index())
            .field("parent_type", &self.parent_type)
            .field("children", &self.children.len())
            .field("faces", &self.geometry.total_faces())
            .finish()
    }
}

impl fmt::Display for ModelPart {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (ModelPart)", self.name)
    }
}
