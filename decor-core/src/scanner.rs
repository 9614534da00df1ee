use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::sitemap::SiteMap;

/// Finds page sources under the source directory. A page published as
/// `a/b.html` is written in `a/b.md`.
pub struct SourceScanner {
    source_dir: PathBuf,
}

impl SourceScanner {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            source_dir: path.as_ref().to_path_buf(),
        }
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn source_for(&self, page_path: &str) -> PathBuf {
        self.source_dir.join(Path::new(page_path).with_extension("md"))
    }

    /// Markdown files that no site map entry refers to, sorted.
    pub fn orphans(&self, site: &SiteMap) -> Vec<PathBuf> {
        let listed: HashSet<PathBuf> = site
            .entries()
            .iter()
            .map(|entry| self.source_for(&entry.path))
            .collect();

        let mut orphans: Vec<PathBuf> = get_all_markdown_files(&self.source_dir)
            .into_iter()
            .filter(|path| !listed.contains(path))
            .collect();
        orphans.sort();
        orphans
    }
}

fn get_all_markdown_files<P: AsRef<Path>>(path: P) -> Vec<PathBuf> {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path().is_file() && e.path().extension().map(|ext| ext == "md").unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect()
}
