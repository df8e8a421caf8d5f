//! In-memory avatar pieces for tests.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use rs_nbt::{Compound, List};

use crate::geometry::IndexWidth;
use crate::math::Vec3;

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    RgbaImage::new(width, height)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// One `textures` entry holding a blank PNG.
pub fn texture(name: &str, width: u32, height: u32) -> Compound {
    let data: Vec<i8> = png(width, height).into_iter().map(|b| b as i8).collect();
    Compound::new().with("name", name).with("default", data)
}

fn vec3(v: Vec3) -> List {
    List::of_floats(&v.to_array())
}

#[derive(Debug, Clone)]
pub struct CubeFace {
    key: &'static str,
    slot: i16,
    uv: [f32; 4],
    rotation: f32,
}

impl CubeFace {
    pub fn new(key: &'static str, slot: i16) -> Self {
        Self {
            key,
            slot,
            uv: [0.0, 0.0, 16.0, 16.0],
            rotation: 0.0,
        }
    }

    pub fn uv(mut self, uv: [f32; 4]) -> Self {
        self.uv = uv;
        self
    }

    pub fn rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    fn to_nbt(&self) -> Compound {
        Compound::new()
            .with("tex", self.slot)
            .with("rot", self.rotation)
            .with("uv", List::of_floats(&self.uv))
    }
}

/// All six faces on one slot.
pub fn all_faces(slot: i16) -> Vec<CubeFace> {
    ["n", "s", "e", "w", "u", "d"]
        .into_iter()
        .map(|key| CubeFace::new(key, slot))
        .collect()
}

pub fn group(name: &str) -> Compound {
    Compound::new().with("name", name)
}

pub fn cube_part(name: &str, from: Vec3, to: Vec3, inflate: f32, faces: &[CubeFace]) -> Compound {
    let mut cube_data = Compound::new();
    for face in faces {
        cube_data.insert(face.key, face.to_nbt());
    }
    let mut part = group(name)
        .with("f", vec3(from))
        .with("t", vec3(to))
        .with("cube_data", cube_data);
    if inflate != 0.0 {
        part.insert("inf", inflate);
    }
    part
}

/// `faces` lists `(slot, vertex_count)` per face in order.
pub fn mesh_part(
    name: &str,
    vtx: &[f32],
    faces: &[(i16, i16)],
    indices: &[u32],
    uvs: &[f32],
) -> Compound {
    let tex: Vec<i16> = faces.iter().map(|&(slot, count)| slot << 4 | count).collect();
    let width = IndexWidth::for_vertex_count(vtx.len() / 3);
    let mesh = Compound::new()
        .with("vtx", List::of_floats(vtx))
        .with("tex", List::of_shorts(&tex))
        .with("fac", width.encode(indices))
        .with("uvs", List::of_floats(uvs));
    group(name).with("mesh_data", mesh)
}

pub fn with_children(mut part: Compound, children: Vec<Compound>) -> Compound {
    part.insert("chld", List::of_compounds(children));
    part
}

/// Avatar root with the given model tree and textures.
pub fn avatar_root(models: Compound, textures: Vec<Compound>) -> Compound {
    Compound::new()
        .with("models", models)
        .with("textures", List::of_compounds(textures))
}
