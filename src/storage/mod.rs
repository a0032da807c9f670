// src/storage/mod.rs
pub mod csv;

use crate::extractors::article::ArticleRecord;
use crate::storage::csv::url_to_handle;
use crate::utils::error::StorageError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct StorageManager {
    base_dir: PathBuf,
}

/// File stem for an article: its URL handle, else a sanitized title.
pub fn article_slug(record: &ArticleRecord) -> String {
    let handle = url_to_handle(&record.url);
    let source = if handle.is_empty() { record.title.as_str() } else { handle.as_str() };
    let slug: String = source
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "article".to_string()
    } else {
        slug
    }
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Directory like `/base_dir/<slug>/`, created on demand.
    fn article_dir(&self, record: &ArticleRecord) -> Result<PathBuf, StorageError> {
        let target_dir = self.base_dir.join(article_slug(record));
        if !target_dir.exists() {
            fs::create_dir_all(&target_dir).map_err(StorageError::IoError)?;
        }
        Ok(target_dir)
    }

    /// Saves the rendered canonical HTML of an article.
    pub fn save_article_html(&self, record: &ArticleRecord) -> Result<PathBuf, StorageError> {
        let file_path = self.article_dir(record)?.join(format!("{}.html", article_slug(record)));

        let mut file = fs::File::create(&file_path).map_err(StorageError::IoError)?;
        file.write_all(record.html.as_bytes()).map_err(StorageError::IoError)?;

        tracing::info!("Saved article HTML to {}", file_path.display());
        Ok(file_path)
    }

    /// Saves article metadata and the block list in JSON format.
    pub fn save_article_metadata(&self, record: &ArticleRecord) -> Result<PathBuf, StorageError> {
        let file_path = self.article_dir(record)?.join(format!("{}_meta.json", article_slug(record)));

        let block_kinds: Vec<&str> = record.blocks.iter().map(|b| b.kind.label()).collect();
        let metadata = serde_json::json!({
            "title": record.title,
            "url": record.url,
            "author": record.author,
            "published_at": record.published_at,
            "tags": record.tags,
            "image_src": record.image_src,
            "image_alt": record.image_alt,
            "summary": record.summary,
            "block_kinds": block_kinds,
            "blocks": record.blocks,
            "html_length": record.html.len(),
            "error": record.error,
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, metadata_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved metadata to {}", file_path.display());
        Ok(file_path)
    }

    /// Writes the Matrixify import CSV for the whole batch.
    pub fn save_csv(&self, records: &[ArticleRecord], filename: &str) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(filename);
        fs::write(&file_path, csv::generate_csv(records)).map_err(StorageError::IoError)?;
        tracing::info!("Saved CSV for {} articles to {}", records.len(), file_path.display());
        Ok(file_path)
    }

    /// Writes an auxiliary file (debug report, raw page) next to the article output.
    pub fn save_article_file(&self, record: &ArticleRecord, name: &str, contents: &str) -> Result<PathBuf, StorageError> {
        let file_path = self.article_dir(record)?.join(name);
        fs::write(&file_path, contents).map_err(StorageError::IoError)?;
        tracing::debug!("Saved {}", file_path.display());
        Ok(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("blog_migrator_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn slugs_prefer_url_handle() {
        let mut record = ArticleRecord::failed("https://blog.example.com/2024/01/My-Post/", "x");
        assert_eq!(article_slug(&record), "my-post");
        record.url = "file.html".into();
        record.title = "Spring: The Edit!".into();
        assert_eq!(article_slug(&record), "spring--the-edit");
        record.title = "???".into();
        assert_eq!(article_slug(&record), "article");
    }

    #[test]
    fn writes_html_metadata_and_csv() {
        let dir = scratch_dir("storage");
        let storage = StorageManager::new(&dir).unwrap();
        assert_eq!(storage.base_dir(), dir.as_path());
        let mut record = ArticleRecord::for_url("https://blog.example.com/ten-bags/");
        record.html = "<hr class=\"blog__divider\">".into();

        let html_path = storage.save_article_html(&record).unwrap();
        assert_eq!(fs::read_to_string(&html_path).unwrap(), record.html);
        assert!(html_path.ends_with("ten-bags/ten-bags.html"));

        let meta_path = storage.save_article_metadata(&record).unwrap();
        let meta: serde_json::Value = serde_json::from_str(&fs::read_to_string(meta_path).unwrap()).unwrap();
        assert_eq!(meta["url"], "https://blog.example.com/ten-bags/");
        assert!(meta["error"].is_null());

        let csv_path = storage.save_csv(&[record], csv::DEFAULT_CSV_FILENAME).unwrap();
        assert_eq!(fs::read_to_string(csv_path).unwrap().lines().count(), 2);

        fs::remove_dir_all(dir).unwrap();
    }
}
