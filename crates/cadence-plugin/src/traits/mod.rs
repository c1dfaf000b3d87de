//! Plugin traits.

pub mod parser;
pub mod release;

/// Identity shared by every Cadence plugin.
///
/// `name` is the key used in `cadence.toml`, in `--no-publish-plugins`
/// filtering and in failure reports, so it must be stable.
pub trait Plugin: Send + Sync {
    /// Returns the plugin name.
    fn name(&self) -> &'static str;

    /// Returns the plugin version.
    fn version(&self) -> &'static str;

    /// Returns a short description of the plugin.
    fn description(&self) -> &'static str {
        ""
    }
}
