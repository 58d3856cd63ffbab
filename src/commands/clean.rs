//! Clean command - removes build artifacts.

use anyhow::Result;

use crate::clean;
use crate::config::Config;

/// Execute the clean command. With a tag, removes that build tree only;
/// without one, removes the whole build root.
pub fn cmd_clean(config: &Config, tag: Option<String>) -> Result<()> {
    match tag {
        Some(tag) => clean::clean_tag(config, &tag),
        None => clean::clean_all(config),
    }
}
