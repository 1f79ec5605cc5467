use serde::{Deserialize, Serialize};

/// Pericope block cap per chapter. One chapter carrying more headings than
/// this is already almost impossible; anything beyond is silently dropped.
pub const DEFAULT_MAX_PERICOPE_BLOCKS: usize = 30;

pub const DEFAULT_HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Append the version short name to copied text, e.g. "(KJV)".
    pub copy_with_version_name: bool,
    /// Prefix each copied verse with its number when more than one is selected.
    pub copy_with_verse_numbers: bool,
    /// Submit copied selections to the share-URL service.
    pub share_url_enabled: bool,
    pub share_url_endpoint: String,
    pub max_pericope_blocks: usize,
    pub history_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            copy_with_version_name: true,
            copy_with_verse_numbers: false,
            share_url_enabled: false,
            share_url_endpoint: String::new(),
            max_pericope_blocks: DEFAULT_MAX_PERICOPE_BLOCKS,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}
