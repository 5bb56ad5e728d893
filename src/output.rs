//! Writing generated artifacts to disk or stdout.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs as afs;
use tracing::info;

use crate::generator::BannerArtifacts;

/// One generated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ArtifactKind {
    Html,
    Css,
    Js,
    ConsentInit,
}

impl ArtifactKind {
    pub const ALL: [Self; 4] = [Self::Html, Self::Css, Self::Js, Self::ConsentInit];

    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Html => "banner.html",
            Self::Css => "banner.css",
            Self::Js => "banner.js",
            Self::ConsentInit => "consent-init.js",
        }
    }

    pub fn contents(self, artifacts: &BannerArtifacts) -> &str {
        match self {
            Self::Html => &artifacts.html,
            Self::Css => &artifacts.css,
            Self::Js => &artifacts.js,
            Self::ConsentInit => &artifacts.consent_init,
        }
    }

    /// Comment syntax used to label the artifact when several are printed together.
    fn banner_comment(self) -> String {
        match self {
            Self::Html => format!("<!-- {} -->", self.file_name()),
            Self::Css | Self::Js | Self::ConsentInit => format!("/* {} */", self.file_name()),
        }
    }
}

pub const PREVIEW_FILE: &str = "preview.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Files to produce in `dir` for the selected artifacts (plus the preview page, if any).
pub fn plan_outputs(
    dir: &Path,
    artifacts: &BannerArtifacts,
    kinds: &[ArtifactKind],
    preview: Option<String>,
) -> Vec<OutputFile> {
    let mut files: Vec<OutputFile> = kinds
        .iter()
        .map(|kind| OutputFile {
            path: dir.join(kind.file_name()),
            contents: kind.contents(artifacts).to_string(),
        })
        .collect();
    if let Some(page) = preview {
        files.push(OutputFile {
            path: dir.join(PREVIEW_FILE),
            contents: page,
        });
    }
    files
}

/// Write every planned file, creating the directory first. In dry-run mode only logs.
pub async fn write_outputs(files: &[OutputFile], dry_run: bool) -> Result<()> {
    for file in files {
        if dry_run {
            info!(
                target: "bannergen::output",
                path = %file.path.display(), bytes = file.contents.len(),
                "DRY-RUN write"
            );
            continue;
        }
        if let Some(parent) = file.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            afs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
        }
        afs::write(&file.path, &file.contents)
            .await
            .with_context(|| format!("Failed to write {}", file.path.display()))?;
        info!(
            target: "bannergen::output",
            path = %file.path.display(), bytes = file.contents.len(),
            "Wrote artifact"
        );
    }
    Ok(())
}

/// Text printed to stdout for the selected artifacts. A single artifact is printed
/// as-is; several are each preceded by a labelling comment.
pub fn render_for_stdout(artifacts: &BannerArtifacts, kinds: &[ArtifactKind]) -> String {
    match kinds {
        [single] => single.contents(artifacts).to_string(),
        _ => kinds
            .iter()
            .map(|kind| format!("{}\n{}", kind.banner_comment(), kind.contents(artifacts).trim_end()))
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}
