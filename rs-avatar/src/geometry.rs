//! Cuboid and mesh decoding into per-texture vertex batches.
//!
//! Every face is emitted as exactly four vertices (quad list). Triangles
//! repeat their third vertex so consumers only ever see quads.

use rs_nbt::{Compound, List, Tag, TagType};
use thiserror::Error;

use crate::math::{Vec2, Vec3, Vec4};

pub const VERTICES_PER_FACE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub pos: Vec3,
    pub uv: Vec2,
    pub normal: Vec3,
}

/// Vertices for one texture slot, in emission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryBatch {
    vertices: Vec<Vertex>,
}

impl GeometryBatch {
    pub fn faces(&self) -> usize {
        self.vertices.len() / VERTICES_PER_FACE
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Vertices of the first `faces` faces.
    pub fn leading_faces(&self, faces: usize) -> &[Vertex] {
        let end = (faces * VERTICES_PER_FACE).min(self.vertices.len());
        &self.vertices[..end]
    }

    fn push_face(&mut self, face: [Vertex; VERTICES_PER_FACE]) {
        self.vertices.extend_from_slice(&face);
    }
}

/// One authored face of a box part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CuboidFace {
    pub key: &'static str,
    pub slot: i16,
    pub rotation: f32,
    pub uv: Vec4,
}

/// Box parameters as authored, before inflation. Kept so the part can be
/// written back as `cube_data` with its face normals intact.
#[derive(Debug, Clone, PartialEq)]
pub struct CuboidSource {
    pub from: Vec3,
    pub to: Vec3,
    pub inflate: f32,
    pub faces: Vec<CuboidFace>,
}

/// A part's batches, indexed by texture slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartGeometry {
    batches: Vec<GeometryBatch>,
    cuboid: Option<CuboidSource>,
}

impl PartGeometry {
    pub fn batches(&self) -> &[GeometryBatch] {
        &self.batches
    }

    /// Authored box, for geometry read from `cube_data`.
    pub fn cuboid(&self) -> Option<&CuboidSource> {
        self.cuboid.as_ref()
    }

    /// `(slot, face count)` pairs in slot order, including empty slots.
    pub fn faces_by_texture(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.batches.iter().map(GeometryBatch::faces).enumerate()
    }

    pub fn total_faces(&self) -> usize {
        self.batches.iter().map(GeometryBatch::faces).sum()
    }

    fn batch_mut(&mut self, slot: usize) -> &mut GeometryBatch {
        if slot >= self.batches.len() {
            self.batches.resize_with(slot + 1, GeometryBatch::default);
        }
        &mut self.batches[slot]
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("face {face} uses negative texture slot {slot}")]
    NegativeTextureSlot { face: usize, slot: i32 },

    #[error("face {face} has {count} vertices, expected 3 or 4")]
    BadFaceVertexCount { face: usize, count: usize },

    #[error("face {face} reads past the end of the index list")]
    IndexListTooShort { face: usize },

    #[error("face {face} references vertex {index} of {vertices}")]
    VertexIndexOutOfRange {
        face: usize,
        index: i64,
        vertices: usize,
    },

    #[error("face {face} reads past the end of the uv list")]
    UvListTooShort { face: usize },

    #[error("index list holds {found:?}, {vertices} vertices require {expected:?}")]
    WrongIndexWidth {
        expected: TagType,
        found: TagType,
        vertices: usize,
    },
}

/// Width of the serialized `fac` list, chosen from the vertex count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexWidth {
    Byte,
    Short,
    Int,
}

impl IndexWidth {
    pub fn for_vertex_count(vertices: usize) -> Self {
        if vertices > 32767 {
            IndexWidth::Int
        } else if vertices > 255 {
            IndexWidth::Short
        } else {
            IndexWidth::Byte
        }
    }

    pub fn tag_type(self) -> TagType {
        match self {
            IndexWidth::Byte => TagType::Byte,
            IndexWidth::Short => TagType::Short,
            IndexWidth::Int => TagType::Int,
        }
    }

    /// Encodes vertex indices the way the reader expects them.
    pub fn encode(self, indices: &[u32]) -> List {
        match self {
            IndexWidth::Byte => {
                List::of_bytes(&indices.iter().map(|&i| i as u8 as i8).collect::<Vec<_>>())
            }
            IndexWidth::Short => {
                List::of_shorts(&indices.iter().map(|&i| i as u16 as i16).collect::<Vec<_>>())
            }
            IndexWidth::Int => List::of_ints(&indices.iter().map(|&i| i as i32).collect::<Vec<_>>()),
        }
    }

    fn decode(self, tag: &Tag) -> Option<i64> {
        match (self, tag) {
            (IndexWidth::Byte, Tag::Byte(v)) => Some((*v as u8) as i64),
            (IndexWidth::Short, Tag::Short(v)) => Some((*v as u16) as i64),
            (IndexWidth::Int, Tag::Int(v)) => Some(*v as i64),
            _ => None,
        }
    }
}

struct FaceTemplate {
    key: &'static str,
    corners: [Vec3; 4],
    normal: Vec3,
}

const fn v3(x: f32, y: f32, z: f32) -> Vec3 {
    Vec3::new(x, y, z)
}

// Corner offsets are fractions of (to - from). Order is the emission order.
const CUBE_FACES: [FaceTemplate; 6] = [
    FaceTemplate {
        key: "n",
        corners: [v3(1., 0., 0.), v3(0., 0., 0.), v3(0., 1., 0.), v3(1., 1., 0.)],
        normal: v3(0., 0., -1.),
    },
    FaceTemplate {
        key: "s",
        corners: [v3(0., 0., 1.), v3(1., 0., 1.), v3(1., 1., 1.), v3(0., 1., 1.)],
        normal: v3(0., 0., 1.),
    },
    FaceTemplate {
        key: "e",
        corners: [v3(1., 0., 1.), v3(1., 0., 0.), v3(1., 1., 0.), v3(1., 1., 1.)],
        normal: v3(1., 0., 0.),
    },
    FaceTemplate {
        key: "w",
        corners: [v3(0., 0., 0.), v3(0., 0., 1.), v3(0., 1., 1.), v3(0., 1., 0.)],
        normal: v3(-1., 0., 0.),
    },
    FaceTemplate {
        key: "u",
        corners: [v3(0., 1., 1.), v3(1., 1., 1.), v3(1., 1., 0.), v3(0., 1., 0.)],
        normal: v3(0., 1., 0.),
    },
    FaceTemplate {
        key: "d",
        corners: [v3(0., 0., 0.), v3(1., 0., 0.), v3(1., 0., 1.), v3(0., 0., 1.)],
        normal: v3(0., -1., 0.),
    },
];

// Canonical corners; a quarter turn shifts which one each vertex takes.
const UV_CORNERS: [Vec2; 4] = [
    Vec2::new(0., 1.),
    Vec2::new(1., 1.),
    Vec2::new(1., 0.),
    Vec2::new(0., 0.),
];

pub fn has_cube_data(part: &Compound) -> bool {
    part.get_compound("cube_data").is_some_and(|c| !c.is_empty())
}

pub fn has_mesh_data(part: &Compound) -> bool {
    part.get_compound("mesh_data").is_some_and(|c| !c.is_empty())
}

/// Reads a 3 element numeric list stored as floats, ints, shorts or bytes.
pub fn read_vec3(tag: &Compound, key: &str, default: Vec3) -> Vec3 {
    match read_numeric_list::<3>(tag, key) {
        Some([x, y, z]) => Vec3::new(x, y, z),
        None => default,
    }
}

pub fn read_vec4(tag: &Compound, key: &str) -> Vec4 {
    match read_numeric_list::<4>(tag, key) {
        Some([x, y, z, w]) => Vec4::new(x, y, z, w),
        None => Vec4::ZERO,
    }
}

fn read_numeric_list<const N: usize>(tag: &Compound, key: &str) -> Option<[f32; N]> {
    let list = tag.get_list(key)?;
    if !matches!(
        list.element(),
        TagType::Float | TagType::Int | TagType::Short | TagType::Byte
    ) {
        return None;
    }
    let mut out = [0.0; N];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = list.numeric(i).unwrap_or(0.0) as f32;
    }
    Some(out)
}

fn lerp(t: f32, a: f32, b: f32) -> f32 {
    a + t * (b - a)
}

/// Builds the six faces of a box part. Corners `f`/`t` and the inflate
/// amount `inf` live on the part compound; faces live in `cube_data`.
pub fn read_cuboid(part: &Compound) -> Result<PartGeometry, GeometryError> {
    let mut geometry = PartGeometry::default();
    let Some(faces) = part.get_compound("cube_data") else {
        return Ok(geometry);
    };

    let mut source = CuboidSource {
        from: read_vec3(part, "f", Vec3::ZERO),
        to: read_vec3(part, "t", Vec3::ZERO),
        inflate: part.get_float("inf").unwrap_or(0.0),
        faces: Vec::new(),
    };
    let from = source.from - Vec3::splat(source.inflate);
    let to = source.to + Vec3::splat(source.inflate);
    let size = to - from;

    for (face_idx, template) in CUBE_FACES.iter().enumerate() {
        let Some(face) = faces.get_compound(template.key) else {
            continue;
        };
        let slot = face.get_short("tex").unwrap_or(0);
        if slot < 0 {
            return Err(GeometryError::NegativeTextureSlot {
                face: face_idx,
                slot: slot as i32,
            });
        }
        let rotation = face.get_float("rot").unwrap_or(0.0);
        let turns = (rotation / 90.0) as i32;
        let uv = read_vec4(face, "uv");
        source.faces.push(CuboidFace {
            key: template.key,
            slot,
            rotation,
            uv,
        });

        let quad = std::array::from_fn(|i| {
            let corner = UV_CORNERS[(i as i32 + turns).rem_euclid(4) as usize];
            Vertex {
                pos: from + size * template.corners[i],
                uv: Vec2::new(lerp(corner.x, uv.x, uv.z), lerp(corner.y, uv.y, uv.w)),
                normal: template.normal,
            }
        });
        geometry.batch_mut(slot as usize).push_face(quad);
    }
    geometry.cuboid = Some(source);
    Ok(geometry)
}

/// Builds flat-shaded faces from `mesh_data`.
///
/// `tex` packs `slot << 4 | vertex_count` per face, `fac` lists vertex
/// indices at the width implied by the vertex count, and `uvs` holds one
/// pair per listed face corner.
pub fn read_mesh(part: &Compound) -> Result<PartGeometry, GeometryError> {
    let mut geometry = PartGeometry::default();
    let Some(mesh) = part.get_compound("mesh_data") else {
        return Ok(geometry);
    };
    let empty = List::default();
    let vtx = mesh.get_list("vtx").unwrap_or(&empty);
    let uvs = mesh.get_list("uvs").unwrap_or(&empty);
    let tex = mesh.get_list("tex").unwrap_or(&empty);
    let fac = mesh.get_list("fac").unwrap_or(&empty);

    let vertex_count = vtx.len() / 3;
    let width = IndexWidth::for_vertex_count(vertex_count);
    if !fac.is_empty() && fac.element() != width.tag_type() {
        return Err(GeometryError::WrongIndexWidth {
            expected: width.tag_type(),
            found: fac.element(),
            vertices: vertex_count,
        });
    }

    let mut vi = 0usize;
    let mut uvi = 0usize;
    for (face, packed) in tex.iter().enumerate() {
        let packed = packed.as_i64().unwrap_or(0) as i16;
        let slot = (packed >> 4) as i32;
        let count = (packed & 0xf) as usize;
        if slot < 0 {
            return Err(GeometryError::NegativeTextureSlot { face, slot });
        }
        if !(3..=VERTICES_PER_FACE).contains(&count) {
            return Err(GeometryError::BadFaceVertexCount { face, count });
        }

        let mut pos = [Vec3::ZERO; VERTICES_PER_FACE];
        let mut uv = [Vec2::ZERO; VERTICES_PER_FACE];
        for j in 0..count {
            let index = fac
                .get(vi + j)
                .and_then(|tag| width.decode(tag))
                .ok_or(GeometryError::IndexListTooShort { face })?;
            if index < 0 || index as usize >= vertex_count {
                return Err(GeometryError::VertexIndexOutOfRange {
                    face,
                    index,
                    vertices: vertex_count,
                });
            }
            let base = index as usize * 3;
            pos[j] = Vec3::new(
                vtx.numeric(base).unwrap_or(0.0) as f32,
                vtx.numeric(base + 1).unwrap_or(0.0) as f32,
                vtx.numeric(base + 2).unwrap_or(0.0) as f32,
            );
            let (Some(u), Some(v)) = (uvs.numeric(uvi + 2 * j), uvs.numeric(uvi + 2 * j + 1))
            else {
                return Err(GeometryError::UvListTooShort { face });
            };
            uv[j] = Vec2::new(u as f32, v as f32);
        }

        let normal = (pos[2] - pos[1]).cross(pos[0] - pos[1]).normalize_or_zero();
        if count == 3 {
            pos[3] = pos[2];
            uv[3] = uv[2];
        }
        let quad = std::array::from_fn(|i| Vertex {
            pos: pos[i],
            uv: uv[i],
            normal,
        });
        geometry.batch_mut(slot as usize).push_face(quad);

        vi += count;
        uvi += 2 * count;
    }
    Ok(geometry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, CubeFace};

    fn unit_cube(faces: &[CubeFace]) -> Compound {
        fixtures::cube_part(
            "cube",
            Vec3::splat(-1.0),
            Vec3::splat(1.0),
            0.0,
            faces,
        )
    }

    #[test]
    fn north_face_is_one_outward_quad() {
        let part = unit_cube(&[CubeFace::new("n", 0)]);
        let geometry = read_cuboid(&part).unwrap();
        let batch = &geometry.batches()[0];
        assert_eq!(batch.faces(), 1);
        assert_eq!(batch.vertices().len(), 4);
        for v in batch.vertices() {
            assert_eq!(v.normal, Vec3::new(0.0, 0.0, -1.0));
            assert_eq!(v.pos.z, -1.0);
        }
        assert_eq!(batch.vertices()[0].pos, Vec3::new(1.0, -1.0, -1.0));
    }

    #[test]
    fn inflate_grows_both_corners() {
        let part = fixtures::cube_part(
            "cube",
            Vec3::ZERO,
            Vec3::ONE,
            0.5,
            &[CubeFace::new("u", 0)],
        );
        let geometry = read_cuboid(&part).unwrap();
        let ys: Vec<f32> = geometry.batches()[0].vertices().iter().map(|v| v.pos.y).collect();
        assert!(ys.iter().all(|&y| y == 1.5));
        let xs: Vec<f32> = geometry.batches()[0].vertices().iter().map(|v| v.pos.x).collect();
        assert_eq!(xs, vec![-0.5, 1.5, 1.5, -0.5]);
    }

    #[test]
    fn face_rotation_shifts_uv_corners() {
        let plain = read_cuboid(&unit_cube(&[CubeFace::new("s", 0).uv([0., 0., 4., 8.])])).unwrap();
        let turned = read_cuboid(&unit_cube(&[CubeFace::new("s", 0)
            .uv([0., 0., 4., 8.])
            .rotation(90.0)]))
        .unwrap();
        let plain: Vec<Vec2> = plain.batches()[0].vertices().iter().map(|v| v.uv).collect();
        let turned: Vec<Vec2> = turned.batches()[0].vertices().iter().map(|v| v.uv).collect();
        assert_eq!(plain, vec![
            Vec2::new(0., 8.),
            Vec2::new(4., 8.),
            Vec2::new(4., 0.),
            Vec2::new(0., 0.),
        ]);
        for i in 0..4 {
            assert_eq!(turned[i], plain[(i + 1) % 4]);
        }
        // Positions do not move with the UV rotation.
        let negative = read_cuboid(&unit_cube(&[CubeFace::new("s", 0)
            .uv([0., 0., 4., 8.])
            .rotation(-90.0)]))
        .unwrap();
        assert_eq!(negative.batches()[0].vertices()[0].uv, plain[3]);
    }

    #[test]
    fn texture_slots_grow_on_demand() {
        let part = unit_cube(&[CubeFace::new("n", 2), CubeFace::new("d", 0)]);
        let geometry = read_cuboid(&part).unwrap();
        let counts: Vec<(usize, usize)> = geometry.faces_by_texture().collect();
        assert_eq!(counts, vec![(0, 1), (1, 0), (2, 1)]);
        assert_eq!(geometry.total_faces(), 2);
    }

    #[test]
    fn triangle_repeats_its_last_vertex() {
        let part = fixtures::mesh_part(
            "tri",
            &[0., 0., 0., 1., 0., 0., 0., 1., 0.],
            &[(0, 3)],
            &[0, 1, 2],
            &[0., 0., 1., 0., 0., 1.],
        );
        let geometry = read_mesh(&part).unwrap();
        let v = geometry.batches()[0].vertices();
        assert_eq!(v.len(), 4);
        assert_eq!(v[3].pos, v[2].pos);
        assert_eq!(v[3].uv, v[2].uv);
        // cross(p3 - p2, p1 - p2) for this winding points along +Z.
        assert_eq!(v[0].normal, Vec3::new(0.0, 0.0, 1.0));
        assert!(v.iter().all(|x| x.normal == v[0].normal));
    }

    #[test]
    fn quads_land_in_their_slot() {
        let part = fixtures::mesh_part(
            "quad",
            &[0., 0., 0., 1., 0., 0., 1., 1., 0., 0., 1., 0.],
            &[(1, 4), (0, 3)],
            &[0, 1, 2, 3, 0, 1, 2],
            &[0.; 14],
        );
        let geometry = read_mesh(&part).unwrap();
        let counts: Vec<(usize, usize)> = geometry.faces_by_texture().collect();
        assert_eq!(counts, vec![(0, 1), (1, 1)]);
    }

    #[test]
    fn index_width_follows_vertex_count() {
        assert_eq!(IndexWidth::for_vertex_count(255), IndexWidth::Byte);
        assert_eq!(IndexWidth::for_vertex_count(256), IndexWidth::Short);
        assert_eq!(IndexWidth::for_vertex_count(32767), IndexWidth::Short);
        assert_eq!(IndexWidth::for_vertex_count(32768), IndexWidth::Int);
    }

    #[test]
    fn byte_indices_are_unsigned() {
        // 200 vertices still fit the byte width; index 199 is stored as -57.
        let mut vtx = vec![0.0f32; 200 * 3];
        vtx[199 * 3] = 5.0;
        let part = fixtures::mesh_part("wide", &vtx, &[(0, 3)], &[199, 0, 1], &[0.; 6]);
        let geometry = read_mesh(&part).unwrap();
        assert_eq!(geometry.batches()[0].vertices()[0].pos.x, 5.0);
    }

    #[test]
    fn short_indices_address_past_the_byte_range() {
        let mut vtx = vec![0.0f32; 300 * 3];
        vtx[299 * 3] = 7.0;
        vtx[256 * 3 + 1] = 3.0;
        let part = fixtures::mesh_part("short", &vtx, &[(0, 3)], &[299, 256, 0], &[0.; 6]);
        let fac = part
            .get_compound("mesh_data")
            .and_then(|mesh| mesh.get_list("fac"))
            .unwrap();
        assert_eq!(fac.element(), TagType::Short);
        let geometry = read_mesh(&part).unwrap();
        let v = geometry.batches()[0].vertices();
        assert_eq!(v[0].pos.x, 7.0);
        assert_eq!(v[1].pos.y, 3.0);
    }

    #[test]
    fn short_indices_above_i16_max_wrap_back() {
        let count = 32767;
        let mut vtx = vec![0.0f32; count * 3];
        vtx[32766 * 3 + 2] = 9.0;
        let indices = [32766u32, 0, 1];
        let encoded = IndexWidth::Short.encode(&indices);
        assert_eq!(encoded.get(0), Some(&Tag::Short(32766)));
        let part = fixtures::mesh_part("edge", &vtx, &[(0, 3)], &indices, &[0.; 6]);
        let geometry = read_mesh(&part).unwrap();
        assert_eq!(geometry.batches()[0].vertices()[0].pos.z, 9.0);

        // Stored negative, read back as the unsigned value.
        assert_eq!(IndexWidth::Short.decode(&Tag::Short(-25536)), Some(40000));
        assert_eq!(IndexWidth::Short.encode(&[40000]).get(0), Some(&Tag::Short(-25536)));
    }

    #[test]
    fn int_indices_reach_past_the_short_range() {
        let count = 40_000;
        let mut vtx = vec![0.0f32; count * 3];
        vtx[39_999 * 3] = 2.0;
        vtx[32_768 * 3 + 1] = 4.0;
        let part = fixtures::mesh_part(
            "dense",
            &vtx,
            &[(1, 4)],
            &[39_999, 32_768, 1, 0],
            &[0.; 8],
        );
        let fac = part
            .get_compound("mesh_data")
            .and_then(|mesh| mesh.get_list("fac"))
            .unwrap();
        assert_eq!(fac.element(), TagType::Int);
        let geometry = read_mesh(&part).unwrap();
        let v = geometry.batches()[1].vertices();
        assert_eq!(v[0].pos.x, 2.0);
        assert_eq!(v[1].pos.y, 4.0);
    }

    #[test]
    fn cuboids_remember_their_authored_box() {
        let part = fixtures::cube_part(
            "plane",
            Vec3::new(-1.0, 0.0, 2.0),
            Vec3::new(2.0, 5.0, 2.0),
            0.25,
            &[CubeFace::new("e", 3).rotation(180.0).uv([1., 2., 3., 4.])],
        );
        let geometry = read_cuboid(&part).unwrap();
        let source = geometry.cuboid().unwrap();
        assert_eq!(source.from, Vec3::new(-1.0, 0.0, 2.0));
        assert_eq!(source.to, Vec3::new(2.0, 5.0, 2.0));
        assert_eq!(source.inflate, 0.25);
        assert_eq!(source.faces, vec![CuboidFace {
            key: "e",
            slot: 3,
            rotation: 180.0,
            uv: Vec4::new(1., 2., 3., 4.),
        }]);
        assert!(read_mesh(&fixtures::mesh_part("m", &[0.; 9], &[(0, 3)], &[0, 1, 2], &[0.; 6]))
            .unwrap()
            .cuboid()
            .is_none());
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let part = fixtures::mesh_part(
            "broken",
            &[0., 0., 0., 1., 0., 0., 0., 1., 0.],
            &[(0, 3)],
            &[0, 1, 7],
            &[0.; 6],
        );
        assert!(matches!(
            read_mesh(&part),
            Err(GeometryError::VertexIndexOutOfRange { index: 7, .. })
        ));
    }

    #[test]
    fn mismatched_index_width_is_rejected() {
        let mesh = Compound::new()
            .with("vtx", List::of_floats(&[0.; 9]))
            .with("tex", List::of_shorts(&[3]))
            .with("fac", List::of_ints(&[0, 1, 2]))
            .with("uvs", List::of_floats(&[0.; 6]));
        let part = Compound::new().with("mesh_data", mesh);
        assert!(matches!(
            read_mesh(&part),
            Err(GeometryError::WrongIndexWidth { .. })
        ));
    }
}
