use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rs_nbt::Compound;
use tracing::{debug, info};

use crate::decode::{self, DecodeOptions, LoadReport};
use crate::encode;
use crate::error::{AvatarError, EncodeError};
use crate::render::{self, RenderBackend, RenderStats};
use crate::texture::TextureSet;
use crate::tree::ModelTree;
use crate::trust::ComplexityBudget;
use crate::vanilla::PoseSource;

/// Extension of gzip-compressed avatar files.
pub const COMPRESSED_EXTENSION: &str = "moon";

/// One loaded avatar: its model tree and texture slots.
///
/// Dropping the avatar releases everything it owns.
#[derive(Debug)]
pub struct Avatar {
    name: String,
    tree: Option<ModelTree>,
    textures: Vec<TextureSet>,
    report: LoadReport,
}

impl Avatar {
    /// Builds an avatar from its root compound (`models` + `textures`).
    pub fn from_nbt(name: impl Into<String>, root: &Compound, options: &DecodeOptions) -> Self {
        let name = name.into();
        let textures: Vec<TextureSet> = root
            .get_list("textures")
            .map(|list| list.compounds().map(TextureSet::from_nbt).collect())
            .unwrap_or_default();

        let (tree, report) = match root.get_compound("models") {
            Some(models) => {
                let (tree, report) = decode::decode_tree(models, &textures, options);
                (Some(tree), report)
            }
            None => (None, LoadReport::default()),
        };

        let avatar = Self {
            name,
            tree,
            textures,
            report,
        };
        info!(
            avatar = %avatar.name,
            parts = avatar.part_count(),
            faces = avatar.total_faces(),
            textures = avatar.textures.len(),
            warnings = avatar.report.warnings.len(),
            "avatar loaded"
        );
        avatar
    }

    /// Reads an avatar file; `.moon` files are gzip-compressed.
    pub fn read_file(path: &Path, options: &DecodeOptions) -> Result<Self, AvatarError> {
        let mut file = BufReader::new(File::open(path)?);
        let compressed = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(COMPRESSED_EXTENSION));
        debug!(path = %path.display(), compressed, "reading avatar");
        let root = if compressed {
            rs_nbt::read_compressed(file)?
        } else {
            rs_nbt::read(&mut file)?
        };
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::from_nbt(name, &root, options))
    }

    /// Serializes the avatar back to its root compound.
    pub fn to_nbt(&self) -> Result<Compound, EncodeError> {
        let mut root = Compound::new();
        if let Some(tree) = &self.tree {
            root.insert("models", encode::encode_tree(tree)?);
        }
        let textures = self.textures.iter().map(TextureSet::to_nbt);
        root.insert("textures", rs_nbt::List::of_compounds(textures));
        Ok(root)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tree(&self) -> Option<&ModelTree> {
        self.tree.as_ref()
    }

    pub fn tree_mut(&mut self) -> Option<&mut ModelTree> {
        self.tree.as_mut()
    }

    pub fn textures(&self) -> &[TextureSet] {
        &self.textures
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn part_count(&self) -> usize {
        self.tree.as_ref().map_or(0, ModelTree::len)
    }

    pub fn total_faces(&self) -> usize {
        self.tree.as_ref().map_or(0, ModelTree::total_faces)
    }

    /// Refreshes the vanilla bonus layer from `pose`, then walks the tree.
    /// `pose` is `None` when the avatar is not attached to a live entity.
    pub fn render_frame(
        &mut self,
        pose: Option<&dyn PoseSource>,
        budget: ComplexityBudget,
        backend: &mut dyn RenderBackend,
    ) -> RenderStats {
        let Some(tree) = self.tree.as_mut() else {
            return RenderStats::default();
        };
        tree.apply_vanilla_pose(pose);
        render::render_tree(tree, &self.textures, budget, backend)
    }
}
