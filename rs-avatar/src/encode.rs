//! Re-encodes a decoded tree back into the part compound format.
//!
//! Box parts are written back from their authored `cube_data`, everything
//! else as `mesh_data` with one listed vertex per emitted corner. Decoding
//! the result reproduces the same batches, normals included, in the same
//! order.

use rs_nbt::{Compound, List};

use crate::error::EncodeError;
use crate::geometry::{CuboidSource, IndexWidth, PartGeometry, VERTICES_PER_FACE};
use crate::math::Vec3;
use crate::part::PartId;
use crate::tree::ModelTree;
use crate::vanilla::ParentType;

/// Highest slot a packed mesh `tex` entry (`slot << 4 | count` in an i16)
/// can carry.
pub const MAX_MESH_TEXTURE_SLOT: usize = (i16::MAX >> 4) as usize;

pub fn encode_tree(tree: &ModelTree) -> Result<Compound, EncodeError> {
    if tree.is_empty() {
        return Ok(Compound::new());
    }
    encode_part(tree, tree.root())
}

fn encode_part(tree: &ModelTree, id: PartId) -> Result<Compound, EncodeError> {
    let part = &tree[id];
    let c = &part.customization;
    let mut tag = Compound::new()
        .with("name", part.name.as_str())
        .with("rot", vec3_list(c.rot()))
        .with("piv", vec3_list(c.pivot()));
    if let Some(primary) = c.primary_render_type() {
        tag.insert("primary", primary.as_str());
    }
    if let Some(secondary) = c.secondary_render_type() {
        tag.insert("secondary", secondary.as_str());
    }
    if let Some(visible) = c.visible() {
        tag.insert("vsb", visible);
    }
    if part.parent_type != ParentType::None {
        tag.insert("pt", part.parent_type.as_str());
    }
    if part.has_geometry() {
        match part.geometry.cuboid() {
            Some(cuboid) if !cuboid.faces.is_empty() => write_cuboid(&mut tag, cuboid),
            _ => {
                tag.insert("mesh_data", encode_mesh(&part.name, &part.geometry)?);
            }
        }
    }
    if !part.children.is_empty() {
        let children = part
            .children
            .iter()
            .map(|&child| encode_part(tree, child))
            .collect::<Result<Vec<_>, _>>()?;
        tag.insert("chld", List::of_compounds(children));
    }
    Ok(tag)
}

fn vec3_list(v: Vec3) -> List {
    List::of_floats(&v.to_array())
}

fn write_cuboid(tag: &mut Compound, cuboid: &CuboidSource) {
    let mut faces = Compound::new();
    for face in &cuboid.faces {
        faces.insert(
            face.key,
            Compound::new()
                .with("tex", face.slot)
                .with("rot", face.rotation)
                .with("uv", List::of_floats(&face.uv.to_array())),
        );
    }
    tag.insert("f", vec3_list(cuboid.from));
    tag.insert("t", vec3_list(cuboid.to));
    if cuboid.inflate != 0.0 {
        tag.insert("inf", cuboid.inflate);
    }
    tag.insert("cube_data", faces);
}

fn encode_mesh(part: &str, geometry: &PartGeometry) -> Result<Compound, EncodeError> {
    let mut vtx = Vec::new();
    let mut uvs = Vec::new();
    let mut tex = Vec::new();
    for (slot, batch) in geometry.batches().iter().enumerate() {
        if batch.faces() == 0 {
            continue;
        }
        if slot > MAX_MESH_TEXTURE_SLOT {
            return Err(EncodeError::TextureSlotTooLarge {
                part: part.to_string(),
                slot,
            });
        }
        for face in batch.vertices().chunks_exact(VERTICES_PER_FACE) {
            for v in face {
                vtx.extend_from_slice(&v.pos.to_array());
                uvs.extend_from_slice(&v.uv.to_array());
            }
            tex.push(((slot as i16) << 4) | VERTICES_PER_FACE as i16);
        }
    }
    let vertex_count = vtx.len() / 3;
    let indices: Vec<u32> = (0..vertex_count as u32).collect();
    Ok(Compound::new()
        .with("vtx", List::of_floats(&vtx))
        .with("tex", List::of_shorts(&tex))
        .with("fac", IndexWidth::for_vertex_count(vertex_count).encode(&indices))
        .with("uvs", List::of_floats(&uvs)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, CubeFace};
    use crate::geometry;

    #[test]
    fn mesh_slots_past_the_packed_range_are_rejected() {
        let cube = fixtures::cube_part("wide", Vec3::ZERO, Vec3::ONE, 0.0, &[CubeFace::new(
            "n",
            MAX_MESH_TEXTURE_SLOT as i16 + 1,
        )]);
        let geometry = geometry::read_cuboid(&cube).unwrap();
        assert_eq!(
            encode_mesh("wide", &geometry).unwrap_err(),
            EncodeError::TextureSlotTooLarge {
                part: "wide".into(),
                slot: MAX_MESH_TEXTURE_SLOT + 1,
            }
        );

        let cube = fixtures::cube_part("ok", Vec3::ZERO, Vec3::ONE, 0.0, &[CubeFace::new(
            "n",
            MAX_MESH_TEXTURE_SLOT as i16,
        )]);
        let mesh = encode_mesh("ok", &geometry::read_cuboid(&cube).unwrap()).unwrap();
        let tex = mesh.get_list("tex").unwrap();
        assert_eq!(tex.get(0), Some(&rs_nbt::Tag::Short(i16::MAX & !0xf | 4)));
    }
}
