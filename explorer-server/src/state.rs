//! Process-wide state and the single exclusive lock guarding it.
//!
//! Every mutating HTTP operation acquires `AppState`'s `Mutex` for the
//! entire duration of the operation; upstream I/O (in `crate::fetch`)
//! happens outside the lock and only re-acquires it to merge results, per
//! this system's concurrency contract.

use std::path::PathBuf;
use std::sync::Arc;

use explorer_core::{CoverageLedger, RawTable, SiteSettings, TagInfo, TagSettings, WorkingTableBuilder};
use tokio::sync::Mutex;

pub struct AppState {
    pub inner: Mutex<SharedState>,
    pub data_dir: PathBuf,
    pub upstream: Arc<dyn explorer_upstream::UpstreamClient>,
}

/// Everything protected by the single exclusive lock.
pub struct SharedState {
    pub raw: RawTable,
    pub coverage: CoverageLedger,
    pub taglist: Vec<TagInfo>,
    pub site_settings: SiteSettings,
    pub tag_settings: TagSettings,
    pub working_builder: WorkingTableBuilder,
}

impl AppState {
    pub fn new(data_dir: PathBuf, upstream: Arc<dyn explorer_upstream::UpstreamClient>) -> Self {
        let cache_dir = data_dir.join("Cache");
        let settings_dir = data_dir.join("Settings");

        let raw = explorer_core::durability::read_table_csv_tolerant(&cache_dir.join("RawTable.csv"));
        let coverage =
            explorer_core::durability::read_coverage_tolerant(&cache_dir.join("TagCoverage.json"));
        let taglist: Vec<TagInfo> =
            explorer_core::durability::read_json_tolerant(&cache_dir.join("Taglist.json"));
        let site_settings: SiteSettings =
            explorer_core::durability::read_json_tolerant(&settings_dir.join("SiteSettings.json"));
        let tag_settings: TagSettings =
            explorer_core::durability::read_json_tolerant(&settings_dir.join("TagSettings.json"));

        Self {
            inner: Mutex::new(SharedState {
                raw,
                coverage,
                taglist,
                site_settings,
                tag_settings,
                working_builder: WorkingTableBuilder::new(),
            }),
            data_dir,
            upstream,
        }
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("Cache")
    }

    pub fn settings_dir(&self) -> PathBuf {
        self.data_dir.join("Settings")
    }
}

impl SharedState {
    pub fn persist_raw_and_coverage(&self, dir: &std::path::Path) -> explorer_core::CoreResult<()> {
        explorer_core::durability::write_table_csv_atomic(&dir.join("RawTable.csv"), &self.raw)?;
        explorer_core::durability::write_coverage_atomic(
            &dir.join("TagCoverage.json"),
            &self.coverage,
        )?;
        Ok(())
    }
}
