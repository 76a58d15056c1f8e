use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Uploaded files on local disk under a configured media root. Stored
/// paths are relative so the rows stay valid if the root moves.
#[derive(Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write an uploaded post image and return its media-relative path.
    /// The original filename only contributes the extension; the name on
    /// disk is a fresh uuid so uploads never collide.
    pub async fn store_post_image(
        &self,
        original_name: &str,
        bytes: &[u8],
    ) -> anyhow::Result<String> {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        let relative = format!("posts/{}.{}", Uuid::now_v7(), ext);

        let target = self.root.join(&relative);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;

        Ok(relative)
    }
}
