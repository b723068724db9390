use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Completion flag written once an item's title has been translated.
pub const TRANSLATED_FLAG: &str = "_translated";
pub const TRANSLATED_VALUE: &str = "yes";

const PUBLISHED: &str = "publish";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The content store the batch job reads from and writes back to.
pub trait ContentStore: Send + Sync {
    /// Whether the host commerce system is up at all.
    fn is_available(&self) -> bool;
    /// Published items without the [`TRANSLATED_FLAG`], at most `limit`, in a
    /// stable order.
    fn list_unflagged_published(&self, limit: usize) -> Result<Vec<ItemId>>;
    fn get_title(&self, id: ItemId) -> Result<String>;
    fn set_title(&self, id: ItemId, title: &str) -> Result<()>;
    fn primary_image_id(&self, id: ItemId) -> Result<Option<ImageId>>;
    fn gallery_image_ids(&self, id: ItemId) -> Result<Vec<ImageId>>;
    fn get_image_alt(&self, image: ImageId) -> Result<String>;
    fn set_image_alt(&self, image: ImageId, alt: &str) -> Result<()>;
    fn set_flag(&self, id: ItemId, key: &str, value: &str) -> Result<()>;
    fn has_flag(&self, id: ItemId, key: &str) -> Result<bool>;
}

/// Parses the comma-separated gallery field. Blank and non-numeric entries
/// are dropped; order is kept.
pub fn parse_gallery_ids(raw: &str) -> Vec<ImageId> {
    raw.split(',')
        .filter_map(|part| part.trim().parse::<u64>().ok())
        .map(ImageId)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub items: Vec<CatalogItem>,
    #[serde(default)]
    pub images: Vec<CatalogImage>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            available: true,
            items: Vec::new(),
            images: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub title: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<ImageId>,
    /// Comma-separated image ids, as the host stores them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gallery: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flags: BTreeMap<String, String>,
}

impl CatalogItem {
    pub fn published(id: u64, title: impl Into<String>) -> Self {
        Self {
            id: ItemId(id),
            title: title.into(),
            status: PUBLISHED.to_string(),
            featured_image: None,
            gallery: None,
            flags: BTreeMap::new(),
        }
    }

    pub fn with_featured_image(mut self, image: u64) -> Self {
        self.featured_image = Some(ImageId(image));
        self
    }

    pub fn with_gallery(mut self, gallery: impl Into<String>) -> Self {
        self.gallery = Some(gallery.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogImage {
    pub id: ImageId,
    #[serde(default)]
    pub alt: String,
}

impl CatalogImage {
    pub fn new(id: u64, alt: impl Into<String>) -> Self {
        Self {
            id: ImageId(id),
            alt: alt.into(),
        }
    }
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse catalog: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("failed to write catalog: {}", path.display()))
    }

    fn item(&self, id: ItemId) -> Result<&CatalogItem> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .ok_or_else(|| anyhow!("unknown item {}", id))
    }

    fn item_mut(&mut self, id: ItemId) -> Result<&mut CatalogItem> {
        self.items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| anyhow!("unknown item {}", id))
    }
}

/// [`ContentStore`] over an in-process [`Catalog`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    catalog: Mutex<Catalog>,
}

impl MemoryStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Mutex::new(catalog),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(Catalog::load(path)?))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.lock().save(path)
    }

    pub fn snapshot(&self) -> Catalog {
        self.lock().clone()
    }

    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    fn lock(&self) -> MutexGuard<'_, Catalog> {
        self.catalog
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ContentStore for MemoryStore {
    fn is_available(&self) -> bool {
        self.lock().available
    }

    fn list_unflagged_published(&self, limit: usize) -> Result<Vec<ItemId>> {
        let catalog = self.lock();
        let mut ids = catalog
            .items
            .iter()
            .filter(|item| item.status == PUBLISHED && !item.flags.contains_key(TRANSLATED_FLAG))
            .map(|item| item.id)
            .collect::<Vec<_>>();
        ids.sort();
        ids.truncate(limit);
        Ok(ids)
    }

    fn get_title(&self, id: ItemId) -> Result<String> {
        Ok(self.lock().item(id)?.title.clone())
    }

    fn set_title(&self, id: ItemId, title: &str) -> Result<()> {
        self.lock().item_mut(id)?.title = title.to_string();
        Ok(())
    }

    fn primary_image_id(&self, id: ItemId) -> Result<Option<ImageId>> {
        Ok(self.lock().item(id)?.featured_image)
    }

    fn gallery_image_ids(&self, id: ItemId) -> Result<Vec<ImageId>> {
        let catalog = self.lock();
        Ok(catalog
            .item(id)?
            .gallery
            .as_deref()
            .map(parse_gallery_ids)
            .unwrap_or_default())
    }

    fn get_image_alt(&self, image: ImageId) -> Result<String> {
        Ok(self
            .lock()
            .images
            .iter()
            .find(|entry| entry.id == image)
            .map(|entry| entry.alt.clone())
            .unwrap_or_default())
    }

    fn set_image_alt(&self, image: ImageId, alt: &str) -> Result<()> {
        let mut catalog = self.lock();
        let entry = catalog
            .images
            .iter_mut()
            .find(|entry| entry.id == image)
            .ok_or_else(|| anyhow!("unknown image {}", image))?;
        entry.alt = alt.to_string();
        Ok(())
    }

    fn set_flag(&self, id: ItemId, key: &str, value: &str) -> Result<()> {
        self.lock()
            .item_mut(id)?
            .flags
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn has_flag(&self, id: ItemId, key: &str) -> Result<bool> {
        Ok(self.lock().item(id)?.flags.contains_key(key))
    }
}

fn default_available() -> bool {
    true
}

fn default_status() -> String {
    PUBLISHED.to_string()
}
