//! Classification of source files for the compiler

use std::path::{Component, Path};

use super::output_path::has_extension;

pub const SCRIPT_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "ts", "mts", "cts"];

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "tga", "jpg", "jpeg"];

/// How the compiler treats a changed file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetCategory {
    /// Handled by the bundler, never copied one by one
    Script,
    /// Image under `textures/`
    Texture,
    Other,
}

impl AssetCategory {
    /// Classify a path relative to the pack root
    pub fn classify(rel_path: &Path) -> Self {
        if has_extension(rel_path, SCRIPT_EXTENSIONS) {
            return AssetCategory::Script;
        }

        let under_textures = matches!(
            rel_path.components().next(),
            Some(Component::Normal(first)) if first == "textures"
        );
        if under_textures && has_extension(rel_path, IMAGE_EXTENSIONS) {
            return AssetCategory::Texture;
        }

        AssetCategory::Other
    }

    pub fn is_image(path: &Path) -> bool {
        has_extension(path, IMAGE_EXTENSIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_scripts() {
        for name in ["scripts/main.ts", "scripts/lib/util.mjs", "a.cts"] {
            assert_eq!(AssetCategory::classify(Path::new(name)), AssetCategory::Script);
        }
    }

    #[test]
    fn classify_textures_only_under_textures_dir() {
        assert_eq!(
            AssetCategory::classify(Path::new("textures/blocks/stone.png")),
            AssetCategory::Texture
        );
        assert_eq!(
            AssetCategory::classify(Path::new("pack_icon.png")),
            AssetCategory::Other
        );
        assert_eq!(
            AssetCategory::classify(Path::new("textures/terrain_texture.json")),
            AssetCategory::Other
        );
    }
}
