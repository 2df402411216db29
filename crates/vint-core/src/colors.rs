//! Category colors for charts
//!
//! Colors come from a hash of the category name, so a category keeps its
//! color across reloads no matter which categories appear first.

use sha2::{Digest, Sha256};

pub const CATEGORY_COLORS: &[&str] = &[
    "#2de1a3", "#ff6bcb", "#ffd166", "#6ec6ff", "#ff7f50", "#a385ff", "#ffb86b", "#43e97b",
    "#f6416c",
];

/// Palette color for a category name
pub fn color_for_category(category: &str) -> &'static str {
    let digest = Sha256::digest(category.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    let index = u64::from_be_bytes(prefix) % CATEGORY_COLORS.len() as u64;
    CATEGORY_COLORS[index as usize]
}
