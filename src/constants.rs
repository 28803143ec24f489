// -
// Storage schema defaults

/// Name of the region every data storage configuration carries implicitly
pub const DEFAULT_REGION_NAME: &str = "default";

pub const DEFAULT_REGION_INITIAL_SIZE: u64 = 100 * 1024 * 1024;
pub const DEFAULT_REGION_MAX_SIZE: u64 = 512 * 1024 * 1024;

/// Valid engine page sizes are powers of two in this range
pub(crate) const MIN_PAGE_SIZE: u32 = 1024;
pub(crate) const MAX_PAGE_SIZE: u32 = 16 * 1024;

pub(crate) const MIN_WAL_SEGMENT_SIZE: u64 = 512 * 1024;

pub(crate) const ZSTD_MIN_LEVEL: i32 = -131072;
pub(crate) const ZSTD_MAX_LEVEL: i32 = 22;
pub(crate) const LZ4_MIN_LEVEL: i32 = 0;
pub(crate) const LZ4_MAX_LEVEL: i32 = 17;

// -
// Node defaults

pub(crate) const DEFAULT_FAILURE_DETECTION_TIMEOUT_MS: u64 = 10_000;

/// First discovery port handed out to local cluster members
pub(crate) const DEFAULT_DISCOVERY_PORT: u16 = 47500;

// -
// Harness settings

/// Prefix of the environment variables overriding harness settings
pub(crate) const ENV_PREFIX: &str = "DUCKTEST";
pub(crate) const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

// -
// Compute

/// Message prefix of the wrapper a remote node puts around a user exception
pub const REMOTE_JOB_USER_EXCEPTION: &str = "Remote job threw user exception";

/// How deep remote wrappers are unwrapped before giving up
pub(crate) const MAX_REMOTE_CAUSE_DEPTH: usize = 10;
