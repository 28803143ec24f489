//! Storage engine configuration schema
//!
//! Immutable value records describing how the engine under test sizes its
//! data regions, writes its WAL and checkpoints. Every record:
//! - is fully defaulted (no required fields)
//! - derives variants through `with_*` copy-with-override methods
//! - keeps unset optionals as `None` so renderers can omit them

use std::collections::HashSet;
use std::ops::RangeInclusive;

use serde::Deserialize;
use serde::Serialize;

use super::WarmUpConfiguration;
use crate::constants::DEFAULT_REGION_INITIAL_SIZE;
use crate::constants::DEFAULT_REGION_MAX_SIZE;
use crate::constants::DEFAULT_REGION_NAME;
use crate::constants::LZ4_MAX_LEVEL;
use crate::constants::LZ4_MIN_LEVEL;
use crate::constants::MAX_PAGE_SIZE;
use crate::constants::MIN_PAGE_SIZE;
use crate::constants::MIN_WAL_SEGMENT_SIZE;
use crate::constants::ZSTD_MAX_LEVEL;
use crate::constants::ZSTD_MIN_LEVEL;
use crate::Error;
use crate::Result;

/// WAL durability mode
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalMode {
    Fsync,
    LogOnly,
    Background,
    None,
}

impl WalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalMode::Fsync => "FSYNC",
            WalMode::LogOnly => "LOG_ONLY",
            WalMode::Background => "BACKGROUND",
            WalMode::None => "NONE",
        }
    }
}

/// Page compression algorithm used for WAL records and checkpoint recovery data
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiskPageCompression {
    Disabled,
    SkipGarbage,
    Zstd,
    Lz4,
    Snappy,
}

impl DiskPageCompression {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiskPageCompression::Disabled => "DISABLED",
            DiskPageCompression::SkipGarbage => "SKIP_GARBAGE",
            DiskPageCompression::Zstd => "ZSTD",
            DiskPageCompression::Lz4 => "LZ4",
            DiskPageCompression::Snappy => "SNAPPY",
        }
    }

    /// Accepted compression levels, `None` when the algorithm takes no level
    pub fn level_range(&self) -> Option<RangeInclusive<i32>> {
        match self {
            DiskPageCompression::Zstd => Some(ZSTD_MIN_LEVEL..=ZSTD_MAX_LEVEL),
            DiskPageCompression::Lz4 => Some(LZ4_MIN_LEVEL..=LZ4_MAX_LEVEL),
            _ => None,
        }
    }
}

/// One named memory region of the storage engine
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DataRegionConfiguration {
    /// Region identity, unique within one data storage configuration
    #[serde(default = "default_region_name")]
    name: String,

    #[serde(default)]
    persistence_enabled: bool,

    /// Initial region size in bytes
    #[serde(default = "default_initial_size")]
    initial_size: u64,

    /// Maximum region size in bytes
    #[serde(default = "default_max_size")]
    max_size: u64,

    #[serde(default = "default_metrics_enabled")]
    metrics_enabled: bool,

    /// Metrics rate time interval in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metrics_rate_time_interval: Option<u64>,

    /// Checkpoint page buffer size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    checkpoint_page_buffer_size: Option<u64>,

    /// Change-data-capture for this region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cdc_enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    lazy_memory_allocation: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    warm_up_configuration: Option<WarmUpConfiguration>,
}

impl Default for DataRegionConfiguration {
    fn default() -> Self {
        Self {
            name: default_region_name(),
            persistence_enabled: false,
            initial_size: default_initial_size(),
            max_size: default_max_size(),
            metrics_enabled: default_metrics_enabled(),
            metrics_rate_time_interval: None,
            checkpoint_page_buffer_size: None,
            cdc_enabled: None,
            lazy_memory_allocation: None,
            warm_up_configuration: None,
        }
    }
}

impl DataRegionConfiguration {
    /// Default region renamed to `name`
    pub fn named(name: impl Into<String>) -> Self {
        Self::default().with_name(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn persistence_enabled(&self) -> bool {
        self.persistence_enabled
    }

    pub fn initial_size(&self) -> u64 {
        self.initial_size
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn metrics_enabled(&self) -> bool {
        self.metrics_enabled
    }

    pub fn metrics_rate_time_interval(&self) -> Option<u64> {
        self.metrics_rate_time_interval
    }

    pub fn checkpoint_page_buffer_size(&self) -> Option<u64> {
        self.checkpoint_page_buffer_size
    }

    pub fn cdc_enabled(&self) -> Option<bool> {
        self.cdc_enabled
    }

    pub fn lazy_memory_allocation(&self) -> Option<bool> {
        self.lazy_memory_allocation
    }

    pub fn warm_up_configuration(&self) -> Option<WarmUpConfiguration> {
        self.warm_up_configuration
    }

    pub fn with_name(
        self,
        name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    pub fn with_persistence_enabled(
        self,
        persistence_enabled: bool,
    ) -> Self {
        Self {
            persistence_enabled,
            ..self
        }
    }

    pub fn with_initial_size(
        self,
        initial_size: u64,
    ) -> Self {
        Self {
            initial_size,
            ..self
        }
    }

    pub fn with_max_size(
        self,
        max_size: u64,
    ) -> Self {
        Self { max_size, ..self }
    }

    pub fn with_metrics_enabled(
        self,
        metrics_enabled: bool,
    ) -> Self {
        Self {
            metrics_enabled,
            ..self
        }
    }

    pub fn with_metrics_rate_time_interval(
        self,
        interval_ms: u64,
    ) -> Self {
        Self {
            metrics_rate_time_interval: Some(interval_ms),
            ..self
        }
    }

    pub fn with_checkpoint_page_buffer_size(
        self,
        size: u64,
    ) -> Self {
        Self {
            checkpoint_page_buffer_size: Some(size),
            ..self
        }
    }

    pub fn with_cdc_enabled(
        self,
        cdc_enabled: bool,
    ) -> Self {
        Self {
            cdc_enabled: Some(cdc_enabled),
            ..self
        }
    }

    pub fn with_lazy_memory_allocation(
        self,
        lazy: bool,
    ) -> Self {
        Self {
            lazy_memory_allocation: Some(lazy),
            ..self
        }
    }

    pub fn with_warm_up_configuration(
        self,
        warm_up: WarmUpConfiguration,
    ) -> Self {
        Self {
            warm_up_configuration: Some(warm_up),
            ..self
        }
    }

    /// Validates region sizing
    /// # Errors
    /// Returns `Error::InvalidConfig` if any configuration rules are violated
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidConfig("data region name cannot be empty".into()));
        }

        if self.initial_size > self.max_size {
            return Err(Error::InvalidConfig(format!(
                "data region '{}': initial_size {} exceeds max_size {}",
                self.name, self.initial_size, self.max_size
            )));
        }

        if self.metrics_rate_time_interval == Some(0) {
            return Err(Error::InvalidConfig(format!(
                "data region '{}': metrics_rate_time_interval must be > 0",
                self.name
            )));
        }

        if self.checkpoint_page_buffer_size == Some(0) {
            return Err(Error::InvalidConfig(format!(
                "data region '{}': checkpoint_page_buffer_size must be > 0",
                self.name
            )));
        }

        Ok(())
    }
}

/// The storage engine as a whole: the implicit default region, additional
/// named regions, WAL and checkpoint tuning.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DataStorageConfiguration {
    /// The implicit region always present
    #[serde(rename = "default", default)]
    default_region: DataRegionConfiguration,

    /// Additional named regions, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    regions: Vec<DataRegionConfiguration>,

    /// Engine page size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page_size: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    wal_mode: Option<WalMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    wal_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    wal_archive_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    cdc_wal_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    wal_segment_size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    wal_buffer_size: Option<u64>,

    /// Number of checkpoints kept in WAL history
    #[serde(default, skip_serializing_if = "Option::is_none")]
    wal_history_size: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_wal_archive_size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    wal_compaction_enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    write_recovery_data_on_checkpoint: Option<bool>,

    /// In milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    wal_force_archive_timeout: Option<u64>,

    /// In milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    checkpoint_frequency: Option<u64>,

    /// In milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metrics_rate_time_interval: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    wal_page_compression: Option<DiskPageCompression>,

    /// Only meaningful together with `wal_page_compression`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    wal_page_compression_level: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    checkpoint_recovery_data_compression: Option<DiskPageCompression>,

    /// Only meaningful together with `checkpoint_recovery_data_compression`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    checkpoint_recovery_data_compression_level: Option<i32>,

    #[serde(default = "default_metrics_enabled")]
    metrics_enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_warm_up_configuration: Option<WarmUpConfiguration>,
}

impl Default for DataStorageConfiguration {
    fn default() -> Self {
        Self {
            default_region: DataRegionConfiguration::default(),
            regions: vec![],
            page_size: None,
            wal_mode: None,
            wal_path: None,
            wal_archive_path: None,
            cdc_wal_path: None,
            wal_segment_size: None,
            wal_buffer_size: None,
            wal_history_size: None,
            max_wal_archive_size: None,
            wal_compaction_enabled: None,
            write_recovery_data_on_checkpoint: None,
            wal_force_archive_timeout: None,
            checkpoint_frequency: None,
            metrics_rate_time_interval: None,
            wal_page_compression: None,
            wal_page_compression_level: None,
            checkpoint_recovery_data_compression: None,
            checkpoint_recovery_data_compression_level: None,
            metrics_enabled: default_metrics_enabled(),
            default_warm_up_configuration: None,
        }
    }
}

impl DataStorageConfiguration {
    pub fn default_region(&self) -> &DataRegionConfiguration {
        &self.default_region
    }

    pub fn regions(&self) -> &[DataRegionConfiguration] {
        &self.regions
    }

    /// Default region followed by the additional regions
    pub fn all_regions(&self) -> impl Iterator<Item = &DataRegionConfiguration> {
        std::iter::once(&self.default_region).chain(self.regions.iter())
    }

    pub fn region(
        &self,
        name: &str,
    ) -> Option<&DataRegionConfiguration> {
        self.all_regions().find(|r| r.name() == name)
    }

    pub fn page_size(&self) -> Option<u32> {
        self.page_size
    }

    pub fn wal_mode(&self) -> Option<WalMode> {
        self.wal_mode
    }

    pub fn wal_path(&self) -> Option<&str> {
        self.wal_path.as_deref()
    }

    pub fn wal_archive_path(&self) -> Option<&str> {
        self.wal_archive_path.as_deref()
    }

    pub fn cdc_wal_path(&self) -> Option<&str> {
        self.cdc_wal_path.as_deref()
    }

    pub fn wal_segment_size(&self) -> Option<u64> {
        self.wal_segment_size
    }

    pub fn wal_buffer_size(&self) -> Option<u64> {
        self.wal_buffer_size
    }

    pub fn wal_history_size(&self) -> Option<u32> {
        self.wal_history_size
    }

    pub fn max_wal_archive_size(&self) -> Option<u64> {
        self.max_wal_archive_size
    }

    pub fn wal_compaction_enabled(&self) -> Option<bool> {
        self.wal_compaction_enabled
    }

    pub fn write_recovery_data_on_checkpoint(&self) -> Option<bool> {
        self.write_recovery_data_on_checkpoint
    }

    pub fn wal_force_archive_timeout(&self) -> Option<u64> {
        self.wal_force_archive_timeout
    }

    pub fn checkpoint_frequency(&self) -> Option<u64> {
        self.checkpoint_frequency
    }

    pub fn metrics_rate_time_interval(&self) -> Option<u64> {
        self.metrics_rate_time_interval
    }

    pub fn wal_page_compression(&self) -> Option<DiskPageCompression> {
        self.wal_page_compression
    }

    pub fn wal_page_compression_level(&self) -> Option<i32> {
        self.wal_page_compression_level
    }

    pub fn checkpoint_recovery_data_compression(&self) -> Option<DiskPageCompression> {
        self.checkpoint_recovery_data_compression
    }

    pub fn checkpoint_recovery_data_compression_level(&self) -> Option<i32> {
        self.checkpoint_recovery_data_compression_level
    }

    pub fn metrics_enabled(&self) -> bool {
        self.metrics_enabled
    }

    pub fn default_warm_up_configuration(&self) -> Option<WarmUpConfiguration> {
        self.default_warm_up_configuration
    }

    pub fn with_default_region(
        self,
        region: DataRegionConfiguration,
    ) -> Self {
        Self {
            default_region: region,
            ..self
        }
    }

    /// Replaces the additional regions
    pub fn with_regions(
        self,
        regions: Vec<DataRegionConfiguration>,
    ) -> Self {
        Self { regions, ..self }
    }

    /// Appends one additional region
    pub fn with_region(
        mut self,
        region: DataRegionConfiguration,
    ) -> Self {
        self.regions.push(region);
        self
    }

    pub fn with_page_size(
        self,
        page_size: u32,
    ) -> Self {
        Self {
            page_size: Some(page_size),
            ..self
        }
    }

    pub fn with_wal_mode(
        self,
        wal_mode: WalMode,
    ) -> Self {
        Self {
            wal_mode: Some(wal_mode),
            ..self
        }
    }

    pub fn with_wal_path(
        self,
        path: impl Into<String>,
    ) -> Self {
        Self {
            wal_path: Some(path.into()),
            ..self
        }
    }

    pub fn with_wal_archive_path(
        self,
        path: impl Into<String>,
    ) -> Self {
        Self {
            wal_archive_path: Some(path.into()),
            ..self
        }
    }

    pub fn with_cdc_wal_path(
        self,
        path: impl Into<String>,
    ) -> Self {
        Self {
            cdc_wal_path: Some(path.into()),
            ..self
        }
    }

    pub fn with_wal_segment_size(
        self,
        size: u64,
    ) -> Self {
        Self {
            wal_segment_size: Some(size),
            ..self
        }
    }

    pub fn with_wal_buffer_size(
        self,
        size: u64,
    ) -> Self {
        Self {
            wal_buffer_size: Some(size),
            ..self
        }
    }

    pub fn with_wal_history_size(
        self,
        size: u32,
    ) -> Self {
        Self {
            wal_history_size: Some(size),
            ..self
        }
    }

    pub fn with_max_wal_archive_size(
        self,
        size: u64,
    ) -> Self {
        Self {
            max_wal_archive_size: Some(size),
            ..self
        }
    }

    pub fn with_wal_compaction_enabled(
        self,
        enabled: bool,
    ) -> Self {
        Self {
            wal_compaction_enabled: Some(enabled),
            ..self
        }
    }

    pub fn with_write_recovery_data_on_checkpoint(
        self,
        enabled: bool,
    ) -> Self {
        Self {
            write_recovery_data_on_checkpoint: Some(enabled),
            ..self
        }
    }

    pub fn with_wal_force_archive_timeout(
        self,
        timeout_ms: u64,
    ) -> Self {
        Self {
            wal_force_archive_timeout: Some(timeout_ms),
            ..self
        }
    }

    pub fn with_checkpoint_frequency(
        self,
        frequency_ms: u64,
    ) -> Self {
        Self {
            checkpoint_frequency: Some(frequency_ms),
            ..self
        }
    }

    pub fn with_metrics_rate_time_interval(
        self,
        interval_ms: u64,
    ) -> Self {
        Self {
            metrics_rate_time_interval: Some(interval_ms),
            ..self
        }
    }

    pub fn with_wal_page_compression(
        self,
        compression: DiskPageCompression,
    ) -> Self {
        Self {
            wal_page_compression: Some(compression),
            ..self
        }
    }

    pub fn with_wal_page_compression_level(
        self,
        level: i32,
    ) -> Self {
        Self {
            wal_page_compression_level: Some(level),
            ..self
        }
    }

    pub fn with_checkpoint_recovery_data_compression(
        self,
        compression: DiskPageCompression,
    ) -> Self {
        Self {
            checkpoint_recovery_data_compression: Some(compression),
            ..self
        }
    }

    pub fn with_checkpoint_recovery_data_compression_level(
        self,
        level: i32,
    ) -> Self {
        Self {
            checkpoint_recovery_data_compression_level: Some(level),
            ..self
        }
    }

    pub fn with_metrics_enabled(
        self,
        enabled: bool,
    ) -> Self {
        Self {
            metrics_enabled: enabled,
            ..self
        }
    }

    pub fn with_default_warm_up_configuration(
        self,
        warm_up: WarmUpConfiguration,
    ) -> Self {
        Self {
            default_warm_up_configuration: Some(warm_up),
            ..self
        }
    }

    /// Validates the storage configuration and every region in it
    /// # Errors
    /// Returns `Error::InvalidConfig` when:
    /// - two regions share a name (including the default region)
    /// - a region is mis-sized
    /// - the page size or WAL segment size is not one the engine accepts
    /// - a compression level is set without, or outside the range of, its algorithm
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for region in self.all_regions() {
            region.validate()?;

            if !names.insert(region.name()) {
                return Err(Error::InvalidConfig(format!(
                    "Duplicate data region name '{}'",
                    region.name()
                )));
            }
        }

        if let Some(page_size) = self.page_size {
            if !page_size.is_power_of_two() || !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&page_size)
            {
                return Err(Error::InvalidConfig(format!(
                    "page_size {} must be a power of two between {} and {}",
                    page_size, MIN_PAGE_SIZE, MAX_PAGE_SIZE
                )));
            }
        }

        if let Some(size) = self.wal_segment_size {
            if size < MIN_WAL_SEGMENT_SIZE {
                return Err(Error::InvalidConfig(format!(
                    "wal_segment_size {} is below the minimum of {} bytes",
                    size, MIN_WAL_SEGMENT_SIZE
                )));
            }
        }

        if self.wal_buffer_size == Some(0) {
            return Err(Error::InvalidConfig("wal_buffer_size must be > 0".into()));
        }

        if self.checkpoint_frequency == Some(0) {
            return Err(Error::InvalidConfig("checkpoint_frequency must be > 0".into()));
        }

        if self.metrics_rate_time_interval == Some(0) {
            return Err(Error::InvalidConfig(
                "metrics_rate_time_interval must be > 0".into(),
            ));
        }

        validate_compression(
            "wal_page_compression",
            self.wal_page_compression,
            self.wal_page_compression_level,
        )?;
        validate_compression(
            "checkpoint_recovery_data_compression",
            self.checkpoint_recovery_data_compression,
            self.checkpoint_recovery_data_compression_level,
        )?;

        Ok(())
    }
}

fn validate_compression(
    field: &str,
    algorithm: Option<DiskPageCompression>,
    level: Option<i32>,
) -> Result<()> {
    let (algorithm, level) = match (algorithm, level) {
        (_, None) => return Ok(()),
        (None, Some(_)) => {
            return Err(Error::InvalidConfig(format!(
                "{field}_level is set but {field} is not"
            )));
        }
        (Some(algorithm), Some(level)) => (algorithm, level),
    };

    match algorithm.level_range() {
        Some(range) if range.contains(&level) => Ok(()),
        Some(range) => Err(Error::InvalidConfig(format!(
            "{field}_level {} is out of range {:?} for {}",
            level,
            range,
            algorithm.as_str()
        ))),
        None => Err(Error::InvalidConfig(format!(
            "{field}_level is not supported by {}",
            algorithm.as_str()
        ))),
    }
}

fn default_region_name() -> String {
    DEFAULT_REGION_NAME.to_string()
}
fn default_initial_size() -> u64 {
    DEFAULT_REGION_INITIAL_SIZE
}
fn default_max_size() -> u64 {
    DEFAULT_REGION_MAX_SIZE
}
fn default_metrics_enabled() -> bool {
    true
}
