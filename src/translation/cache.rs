/*!
 * Durable translation caching.
 *
 * Translations are cached on disk, one JSON file per (language, namespace)
 * partition, so repeated runs skip provider calls for unchanged strings.
 * An entry is keyed by its flattened resource key and stores the source
 * text it was translated from: when the current source differs, the entry
 * is stale and treated as a miss. That comparison is the only invalidation
 * rule; there is no TTL.
 *
 * Partition writes are atomic (temp file + rename) and a partition that
 * fails to parse is treated as empty rather than an error, so a crash or
 * torn write can cost cached work but never a run.
 */

use chrono::Utc;
use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::CacheError;

const CACHE_FORMAT_VERSION: u32 = 1;

/// One cached translation, as handed to `set_batch`
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Flattened resource key
    pub key: String,
    /// Target language of the translation
    pub target_lang: String,
    /// Namespace partition the key belongs to
    pub namespace: String,
    /// Source text the translation was produced from
    pub source_text: String,
    /// The translated text
    pub translated_text: String,
    /// Identifier of the provider that produced it
    pub provider: String,
    /// Free-form annotations (plural form, warnings)
    pub metadata: BTreeMap<String, String>,
}

/// Aggregate counts for one language, as reported by `stats`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Entries across all namespaces of the language
    pub total_entries: usize,
    /// Number of namespace partitions present
    pub total_namespaces: usize,
}

/// On-disk representation of one partition file
#[derive(Debug, Serialize, Deserialize)]
struct PartitionFile {
    version: u32,
    entries: BTreeMap<String, StoredEntry>,
}

/// On-disk representation of one entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    source_text: String,
    translated_text: String,
    provider: String,
    timestamp: i64,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

/// In-memory image of one partition, lazily loaded from disk
#[derive(Debug, Default)]
struct Partition {
    entries: BTreeMap<String, StoredEntry>,
    loaded: bool,
}

/// Durable translation cache partitioned by (language, namespace)
#[derive(Debug)]
pub struct TranslationCache {
    /// Root directory; partitions live at `<root>/<lang>/<namespace>.json`
    root: PathBuf,

    /// Whether lookups and writes are performed at all
    enabled: bool,

    /// Partition registry; each partition carries its own lock so writers
    /// to different partitions never contend
    partitions: Mutex<HashMap<(String, String), Arc<Mutex<Partition>>>>,
}

impl TranslationCache {
    /// Create a cache rooted at the given directory
    pub fn new(root: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            root: root.into(),
            enabled,
            partitions: Mutex::new(HashMap::new()),
        }
    }

    /// Check if the cache is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn partition_path(&self, target_lang: &str, namespace: &str) -> PathBuf {
        self.root.join(target_lang).join(format!("{}.json", namespace))
    }

    fn partition(&self, target_lang: &str, namespace: &str) -> Arc<Mutex<Partition>> {
        let key = (target_lang.to_string(), namespace.to_string());
        Arc::clone(
            self.partitions
                .lock()
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(Partition::default()))),
        )
    }

    /// Load a partition from disk if it has not been touched yet.
    ///
    /// A missing file is an empty partition. A file that exists but fails to
    /// parse, or carries an unknown format version, is logged and treated as
    /// empty; the next successful write replaces it wholesale.
    fn ensure_loaded(&self, partition: &mut Partition, path: &Path) {
        if partition.loaded {
            return;
        }
        partition.loaded = true;

        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return,
        };
        match serde_json::from_str::<PartitionFile>(&raw) {
            Ok(file) if file.version == CACHE_FORMAT_VERSION => {
                partition.entries = file.entries;
            }
            Ok(file) => {
                warn!(
                    "cache partition {:?} has unsupported version {}, ignoring",
                    path, file.version
                );
            }
            Err(e) => {
                warn!("corrupt cache partition {:?} ({}), treating as empty", path, e);
            }
        }
    }

    /// Look up a translation.
    ///
    /// Misses when the key is absent or when the stored source text differs
    /// from `current_source` (stale). Stale entries are left in place; the
    /// next `set_batch` for the key overwrites them.
    pub fn get(
        &self,
        key: &str,
        target_lang: &str,
        namespace: &str,
        current_source: &str,
    ) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let partition = self.partition(target_lang, namespace);
        let mut partition = partition.lock();
        self.ensure_loaded(&mut partition, &self.partition_path(target_lang, namespace));

        match partition.entries.get(key) {
            Some(entry) if entry.source_text == current_source => {
                debug!("cache hit for '{}' ({}/{})", key, target_lang, namespace);
                Some(entry.translated_text.clone())
            }
            Some(_) => {
                debug!("cache stale for '{}' ({}/{})", key, target_lang, namespace);
                None
            }
            None => {
                debug!("cache miss for '{}' ({}/{})", key, target_lang, namespace);
                None
            }
        }
    }

    /// Store a batch of entries, grouping by partition and rewriting each
    /// touched partition file atomically.
    pub fn set_batch(&self, entries: Vec<CacheEntry>) -> Result<(), CacheError> {
        if !self.enabled || entries.is_empty() {
            return Ok(());
        }

        let now = Utc::now().timestamp();
        let mut by_partition: BTreeMap<(String, String), Vec<CacheEntry>> = BTreeMap::new();
        for entry in entries {
            by_partition
                .entry((entry.target_lang.clone(), entry.namespace.clone()))
                .or_default()
                .push(entry);
        }

        for ((target_lang, namespace), batch) in by_partition {
            let path = self.partition_path(&target_lang, &namespace);
            let partition = self.partition(&target_lang, &namespace);
            let mut partition = partition.lock();
            self.ensure_loaded(&mut partition, &path);

            for entry in batch {
                partition.entries.insert(
                    entry.key,
                    StoredEntry {
                        source_text: entry.source_text,
                        translated_text: entry.translated_text,
                        provider: entry.provider,
                        timestamp: now,
                        metadata: entry.metadata,
                    },
                );
            }

            self.write_partition(&partition, &path)?;
        }

        Ok(())
    }

    /// Serialize a partition and swap it into place via a temp file in the
    /// same directory, so readers never observe a half-written file.
    fn write_partition(&self, partition: &Partition, path: &Path) -> Result<(), CacheError> {
        let parent = path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(parent)?;

        let file = PartitionFile {
            version: CACHE_FORMAT_VERSION,
            entries: partition.entries.clone(),
        };
        let serialized = serde_json::to_string_pretty(&file)?;

        let temp = tempfile::NamedTempFile::new_in(parent)?;
        fs::write(temp.path(), serialized)?;
        temp.persist(path).map_err(|e| CacheError::Io(e.error))?;

        debug!("wrote cache partition {:?} ({} entries)", path, file.entries.len());
        Ok(())
    }

    /// Drop cached data, optionally narrowed to one namespace and/or one
    /// language. With no filters, the whole cache is cleared.
    pub fn clear(
        &self,
        namespace: Option<&str>,
        language: Option<&str>,
    ) -> Result<(), CacheError> {
        {
            let mut partitions = self.partitions.lock();
            partitions.retain(|(lang, ns), _| {
                let lang_match = language.is_none_or(|l| l == lang);
                let ns_match = namespace.is_none_or(|n| n == ns);
                !(lang_match && ns_match)
            });
        }

        if !self.root.exists() {
            return Ok(());
        }

        for lang_dir in fs::read_dir(&self.root)? {
            let lang_dir = lang_dir?;
            if !lang_dir.path().is_dir() {
                continue;
            }
            let lang_name = lang_dir.file_name().to_string_lossy().to_string();
            if language.is_some_and(|l| l != lang_name) {
                continue;
            }

            match namespace {
                None => fs::remove_dir_all(lang_dir.path())?,
                Some(ns) => {
                    let file = lang_dir.path().join(format!("{}.json", ns));
                    if file.exists() {
                        fs::remove_file(file)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Count entries and namespaces cached for a language
    pub fn stats(&self, language: &str) -> CacheStats {
        let lang_dir = self.root.join(language);
        let entries = match fs::read_dir(&lang_dir) {
            Ok(entries) => entries,
            Err(_) => return CacheStats::default(),
        };

        let mut stats = CacheStats::default();
        for dir_entry in entries.flatten() {
            let path = dir_entry.path();
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };
            if path.extension().is_none_or(|e| e != "json") {
                continue;
            }

            stats.total_namespaces += 1;
            let partition = self.partition(language, &stem);
            let mut partition = partition.lock();
            self.ensure_loaded(&mut partition, &path);
            stats.total_entries += partition.entries.len();
        }
        stats
    }
}
