//! Generated notes: listing helpers and Obsidian deep links.

use reqwest::Url;

use crate::backend::{DisplayConfig, NoteEntry};

/// Deep link that opens `filename` in the configured vault. `None` when no
/// vault is configured.
pub fn obsidian_uri(config: &DisplayConfig, filename: &str) -> Option<String> {
    let vault = config.obsidian_vault_name.trim();
    if vault.is_empty() {
        return None;
    }

    let stem = filename.strip_suffix(".md").unwrap_or(filename);
    let subpath = config.obsidian_notes_subpath.trim_matches('/');
    let file = if subpath.is_empty() {
        stem.to_string()
    } else {
        format!("{subpath}/{stem}")
    };

    let mut url = Url::parse("obsidian://open").ok()?;
    url.query_pairs_mut()
        .append_pair("vault", vault)
        .append_pair("file", &file);
    // Form encoding writes spaces as '+', which Obsidian keeps literally.
    Some(url.as_str().replace('+', "%20"))
}

/// Title for display, falling back to the file stem.
pub fn display_title(note: &NoteEntry) -> &str {
    if note.title.trim().is_empty() {
        note.filename.strip_suffix(".md").unwrap_or(&note.filename)
    } else {
        &note.title
    }
}
