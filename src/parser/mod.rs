pub mod dot_splat;
pub mod ply;

use std::path::Path;

use crate::error::LoadError;
use crate::splat::Splat;

pub use dot_splat::load_splat_file;
pub use ply::load_ply_file;

pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads a scene, picking the decoder from the file extension.
pub fn load_scene(path: impl AsRef<Path>) -> Result<Vec<Splat>, LoadError> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "ply" => load_ply_file(path),
        "splat" => load_splat_file(path),
        _ => Err(LoadError::Unsupported(path.to_path_buf())),
    }
}
