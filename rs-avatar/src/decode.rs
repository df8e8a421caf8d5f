//! Builds a [`ModelTree`] from the serialized part compound.

use rs_nbt::Compound;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::customization::{Customization, PartType, RenderType};
use crate::geometry::{self, GeometryError, PartGeometry};
use crate::math::Vec3;
use crate::part::{ModelPart, PartId, TextureSize};
use crate::texture::TextureSet;
use crate::tree::ModelTree;
use crate::vanilla::ParentType;

/// Parts nested deeper than this are dropped with a warning.
pub const MAX_PART_DEPTH: usize = 256;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Derive a parent type from bone-like part names (`Head`, `LEFT_ARM` ...)
    /// when the part carries no explicit `pt` tag.
    pub infer_parent_types: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            infer_parent_types: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodeWarning {
    /// The part loaded without geometry.
    Geometry { part: String, error: GeometryError },
    /// Children below the depth limit were skipped.
    TooDeep { part: String },
}

/// Non-fatal problems found while loading one avatar.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub warnings: Vec<DecodeWarning>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

struct Decoder<'a> {
    tree: ModelTree,
    textures: &'a [TextureSet],
    options: &'a DecodeOptions,
    next_index: usize,
    report: LoadReport,
}

pub fn decode_tree(
    root: &Compound,
    textures: &[TextureSet],
    options: &DecodeOptions,
) -> (ModelTree, LoadReport) {
    let mut decoder = Decoder {
        tree: ModelTree::new(),
        textures,
        options,
        next_index: 0,
        report: LoadReport::default(),
    };
    decoder.read_part(root, None, 0);
    debug!(
        parts = decoder.tree.len(),
        geometry_parts = decoder.next_index,
        faces = decoder.tree.total_faces(),
        "decoded model tree"
    );
    (decoder.tree, decoder.report)
}

impl Decoder<'_> {
    fn read_part(&mut self, tag: &Compound, parent: Option<PartId>, depth: usize) -> PartId {
        let name = tag.get_string("name").unwrap_or_default().to_string();
        let mut customization = read_customization(tag);

        let decoded = if geometry::has_cube_data(tag) {
            Some((PartType::Cube, geometry::read_cuboid(tag)))
        } else if geometry::has_mesh_data(tag) {
            Some((PartType::Mesh, geometry::read_mesh(tag)))
        } else {
            None
        };

        let mut geometry = PartGeometry::default();
        let mut index = None;
        match decoded {
            Some((part_type, Ok(g))) => {
                customization.part_type = part_type;
                geometry = g;
                index = Some(self.next_index);
                self.next_index += 1;
            }
            Some((_, Err(error))) => {
                warn!(part = %name, "dropping part geometry: {error}");
                self.report.warnings.push(DecodeWarning::Geometry {
                    part: name.clone(),
                    error,
                });
            }
            None => {}
        }

        let mut part = ModelPart::new(name, customization);
        part.parent = parent;
        part.index = index;
        part.geometry = geometry;
        part.set_parent_type(self.read_parent_type(tag, &part.name));
        let id = self.tree.push(part);

        if let Some(children) = tag.get_list("chld") {
            if depth >= MAX_PART_DEPTH {
                let part = self.tree[id].name.clone();
                warn!(part = %part, "part nesting too deep, children skipped");
                self.report.warnings.push(DecodeWarning::TooDeep { part });
            } else {
                for child in children.compounds() {
                    let child_id = self.read_part(child, Some(id), depth + 1);
                    self.tree[id].children.push(child_id);
                }
            }
        }

        self.tree[id].texture_size = self.texture_size(id);
        id
    }

    /// Explicit `pt` wins; an unknown value keeps what the name suggested.
    fn read_parent_type(&self, tag: &Compound, name: &str) -> ParentType {
        let mut parent_type = if self.options.infer_parent_types {
            ParentType::from_name_prefix(name)
        } else {
            ParentType::None
        };
        if let Some(pt) = tag.get_string("pt") {
            match pt.parse() {
                Ok(explicit) => parent_type = explicit,
                Err(_) => debug!(part = %name, pt, "ignoring unknown parent type"),
            }
        }
        parent_type
    }

    fn texture_size(&self, id: PartId) -> TextureSize {
        let part = &self.tree[id];
        let mut size = part
            .children
            .iter()
            .fold(TextureSize::Empty, |acc, &child| {
                acc.merge(self.tree[child].texture_size)
            });
        for (slot, faces) in part.geometry.faces_by_texture() {
            if faces == 0 {
                continue;
            }
            let slot_size = match self.textures.get(slot).and_then(TextureSet::size) {
                Some((w, h)) => TextureSize::Uniform(w, h),
                None => TextureSize::Mixed,
            };
            size = size.merge(slot_size);
        }
        size
    }
}

fn read_customization(tag: &Compound) -> Customization {
    let mut c = Customization::default();
    c.set_rot(geometry::read_vec3(tag, "rot", Vec3::ZERO));
    c.set_pivot(geometry::read_vec3(tag, "piv", Vec3::ZERO));
    if let Some(primary) = tag.get_string("primary") {
        if let Ok(render_type) = primary.parse::<RenderType>() {
            c.set_primary_render_type(Some(render_type));
        }
    }
    if let Some(secondary) = tag.get_string("secondary") {
        if let Ok(render_type) = secondary.parse::<RenderType>() {
            c.set_secondary_render_type(Some(render_type));
        }
    }
    if tag.contains("vsb") {
        c.set_visible(tag.get_bool("vsb"));
    }
    c
}
