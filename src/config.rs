//! Configuration for the intake pipeline.
//!
//! All pipeline behaviour is controlled through [`IntakeConfig`], built via
//! its [`IntakeConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a config across requests and to diff two deployments to
//! understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A constructor taking eight positional fields is unreadable and breaks on
//! every new field. The builder lets callers set only what they care about
//! and rely on documented defaults for the rest.

use crate::error::IntakeError;
use std::path::PathBuf;

/// Configuration for upload intake and conversion.
///
/// Built via [`IntakeConfig::builder()`] or [`IntakeConfig::default()`].
///
/// # Example
/// ```rust
/// use bookmill::IntakeConfig;
///
/// let config = IntakeConfig::builder()
///     .cache_root("/srv/www/cache")
///     .base_url("https://books.example.org")
///     .tool("/usr/local/bin/ebookmaker")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// Directory under which per-request staging directories are created.
    /// Default: `cache`.
    ///
    /// Each request gets `{cache_root}/{request_id}/`; the whole subtree is
    /// also the public `cache/` URL prefix, so the web server serving
    /// [`base_url`](Self::base_url) must expose it.
    pub cache_root: PathBuf,

    /// Public base URL used to build the result link
    /// `{base_url}/cache/{request_id}`. Default: `http://localhost:8000`.
    ///
    /// Stored without a trailing slash; the builder trims one if present.
    pub base_url: String,

    /// Command used to run the external conversion tool.
    /// Default: `ebookmaker`.
    ///
    /// Resolved through `PATH` when not absolute. The tool is a black box:
    /// it receives option flags plus a `file://` URL and reports only an
    /// exit code.
    pub tool: PathBuf,

    /// Command used to unpack uploaded archives, invoked as
    /// `{unpack_tool} -o {archive} -d {dir}`. Default: `unzip`.
    pub unpack_tool: PathBuf,

    /// Value of the `--max-depth=` flag passed to the conversion tool.
    /// Default: 3.
    pub max_depth: u32,

    /// Upper bound on single-subdirectory descent during input resolution.
    /// Default: 32.
    ///
    /// A chain of nested single subdirectories is followed one level at a
    /// time; without a bound a crafted archive could descend indefinitely.
    /// 32 is far beyond any real upload layout.
    pub max_descent: usize,

    /// Optional wall-clock bound on the conversion tool, in seconds.
    /// Default: none.
    ///
    /// When unset the tool runs to completion however long that takes,
    /// which for large inputs can be minutes. When set, an overrunning
    /// tool is killed and the request fails with
    /// [`IntakeError::ToolTimeout`](crate::error::IntakeError::ToolTimeout).
    pub tool_timeout_secs: Option<u64>,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            cache_root: PathBuf::from("cache"),
            base_url: "http://localhost:8000".to_string(),
            tool: PathBuf::from("ebookmaker"),
            unpack_tool: PathBuf::from("unzip"),
            max_depth: 3,
            max_descent: 32,
            tool_timeout_secs: None,
        }
    }
}

impl IntakeConfig {
    /// Create a new builder for `IntakeConfig`.
    pub fn builder() -> IntakeConfigBuilder {
        IntakeConfigBuilder {
            config: Self::default(),
        }
    }

    /// Short display name of the conversion tool, for user-facing command
    /// echoes (never the full path).
    pub fn tool_name(&self) -> String {
        self.tool
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.tool.display().to_string())
    }
}

/// Builder for [`IntakeConfig`].
#[derive(Debug)]
pub struct IntakeConfigBuilder {
    config: IntakeConfig,
}

impl IntakeConfigBuilder {
    pub fn cache_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cache_root = path.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn tool(mut self, tool: impl Into<PathBuf>) -> Self {
        self.config.tool = tool.into();
        self
    }

    pub fn unpack_tool(mut self, tool: impl Into<PathBuf>) -> Self {
        self.config.unpack_tool = tool.into();
        self
    }

    pub fn max_depth(mut self, depth: u32) -> Self {
        self.config.max_depth = depth;
        self
    }

    pub fn max_descent(mut self, levels: usize) -> Self {
        self.config.max_descent = levels;
        self
    }

    pub fn tool_timeout_secs(mut self, secs: u64) -> Self {
        self.config.tool_timeout_secs = Some(secs);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<IntakeConfig, IntakeError> {
        while self.config.base_url.ends_with('/') {
            self.config.base_url.pop();
        }

        let c = &self.config;
        if c.base_url.is_empty() {
            return Err(IntakeError::InvalidConfig(
                "base_url must not be empty".into(),
            ));
        }
        if c.cache_root.as_os_str().is_empty() {
            return Err(IntakeError::InvalidConfig(
                "cache_root must not be empty".into(),
            ));
        }
        if c.max_depth == 0 {
            return Err(IntakeError::InvalidConfig(
                "max_depth must be ≥ 1".into(),
            ));
        }
        if c.max_descent == 0 {
            return Err(IntakeError::InvalidConfig(
                "max_descent must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build() {
        let c = IntakeConfig::builder().build().unwrap();
        assert_eq!(c.cache_root, PathBuf::from("cache"));
        assert_eq!(c.max_depth, 3);
        assert_eq!(c.max_descent, 32);
        assert!(c.tool_timeout_secs.is_none());
    }

    #[test]
    fn trailing_slash_trimmed() {
        let c = IntakeConfig::builder()
            .base_url("https://books.example.org/")
            .build()
            .unwrap();
        assert_eq!(c.base_url, "https://books.example.org");
    }

    #[test]
    fn empty_base_url_rejected() {
        let err = IntakeConfig::builder().base_url("/").build().unwrap_err();
        assert!(matches!(err, IntakeError::InvalidConfig(_)));
    }

    #[test]
    fn zero_descent_rejected() {
        let err = IntakeConfig::builder().max_descent(0).build().unwrap_err();
        assert!(matches!(err, IntakeError::InvalidConfig(_)));
    }

    #[test]
    fn tool_name_is_file_name() {
        let c = IntakeConfig::builder()
            .tool("/opt/ebookmaker/bin/ebookmaker")
            .build()
            .unwrap();
        assert_eq!(c.tool_name(), "ebookmaker");
    }
}
