use thiserror::Error;

#[derive(Debug, Error)]
pub enum MathError {
    #[error("Matrix is singular (determinant {determinant})")]
    Singular { determinant: f32 },
}

#[derive(Debug, Error)]
pub enum AvatarError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("NBT error: {0}")]
    Nbt(#[from] rs_nbt::NbtError),

    #[error("Avatar loader is shut down")]
    LoaderClosed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("Part \"{part}\" uses texture slot {slot}, too large for packed mesh faces")]
    TextureSlotTooLarge { part: String, slot: usize },
}

/// Errors surfaced to the scripting layer. State is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("Illegal RenderType: \"{0}\".")]
    IllegalRenderType(String),

    #[error("Illegal ParentType: \"{0}\".")]
    IllegalParentType(String),

    #[error("Cannot get texture size of part \"{0}\", it has multiple different-sized textures!")]
    MixedTextureSize(String),

    #[error("Cannot call setUVPixels on part \"{0}\" with multiple texture sizes!")]
    UvPixelsMixedSize(String),
}
