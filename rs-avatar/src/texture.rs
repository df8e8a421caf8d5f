use rs_nbt::Compound;
use tracing::warn;

/// A texture slot: the main image plus an optional emissive layer.
///
/// Pixel data stays encoded; only the dimensions are needed on this side.
#[derive(Debug, Clone)]
pub struct TextureSet {
    pub name: String,
    pub main: Vec<u8>,
    pub emissive: Option<Vec<u8>>,
    size: Option<(u32, u32)>,
}

impl TextureSet {
    pub fn new(name: impl Into<String>, main: Vec<u8>, emissive: Option<Vec<u8>>) -> Self {
        let name = name.into();
        let size = match image::load_from_memory(&main) {
            Ok(img) => Some((img.width(), img.height())),
            Err(err) => {
                warn!(texture = %name, "unreadable texture: {err}");
                None
            }
        };
        Self {
            name,
            main,
            emissive,
            size,
        }
    }

    /// Reads one entry of the avatar `textures` list.
    pub fn from_nbt(tag: &Compound) -> Self {
        let name = tag.get_string("name").unwrap_or_default();
        let main = tag.get_byte_array("default").map(to_bytes).unwrap_or_default();
        let emissive = tag.get_byte_array("emissive").map(to_bytes);
        Self::new(name, main, emissive)
    }

    pub fn to_nbt(&self) -> Compound {
        let mut tag = Compound::new()
            .with("name", self.name.as_str())
            .with("default", from_bytes(&self.main));
        if let Some(emissive) = &self.emissive {
            tag.insert("emissive", from_bytes(emissive));
        }
        tag
    }

    /// Width and height of the main image, `None` when it could not be read.
    pub fn size(&self) -> Option<(u32, u32)> {
        self.size
    }

    pub fn width(&self) -> i32 {
        self.size.map_or(-1, |(w, _)| w as i32)
    }

    pub fn height(&self) -> i32 {
        self.size.map_or(-1, |(_, h)| h as i32)
    }
}

fn to_bytes(data: &[i8]) -> Vec<u8> {
    data.iter().map(|&b| b as u8).collect()
}

fn from_bytes(data: &[u8]) -> Vec<i8> {
    data.iter().map(|&b| b as i8).collect()
}
