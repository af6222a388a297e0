//! Editor view — paginated file windows rendered into every prompt.
//!
//! Purely a rendering concern: the page cursors live here, the file
//! contents stay authoritative on disk. Windowing is deterministic:
//! pages are 1-based, `pages = max(1, ceil(lines / PAGE_SIZE))` (so an
//! exactly-page-sized file has no trailing empty page), an empty file is a
//! single page rendering `(empty file)`, and out-of-range page requests
//! clamp to the last page.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Lines per editor page.
pub const PAGE_SIZE: usize = 100;

/// One rendered window of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    /// The 1-based page actually shown (after clamping).
    pub page: usize,
    /// Total pages in the file.
    pub pages: usize,
    /// The window body, with 1-based line numbers.
    pub body: String,
}

/// Window `content` at `requested_page` (1-based, clamped into range).
pub fn paginate(content: &str, requested_page: usize) -> PageView {
    let lines: Vec<&str> = content.lines().collect();

    if lines.is_empty() {
        return PageView {
            page: 1,
            pages: 1,
            body: "(empty file)".into(),
        };
    }

    let pages = lines.len().div_ceil(PAGE_SIZE);
    let page = requested_page.clamp(1, pages);
    let start = (page - 1) * PAGE_SIZE;
    let end = (start + PAGE_SIZE).min(lines.len());

    let body = lines[start..end]
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>4} {line}", start + i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    PageView { page, pages, body }
}

/// Page cursors for the files the model has opened, keyed by workspace-
/// relative path.
pub struct EditorView {
    root: PathBuf,
    cursors: BTreeMap<String, usize>,
}

impl EditorView {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            cursors: BTreeMap::new(),
        }
    }

    /// Track (or move) a file's page cursor.
    pub fn open(&mut self, path: &str, page: usize) {
        self.cursors.insert(path.to_string(), page.max(1));
    }

    /// Whether any file is open.
    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    /// Render every open file's current window.
    pub fn render(&self) -> String {
        if self.cursors.is_empty() {
            return "(no open files)".into();
        }

        let mut out = String::new();
        for (path, &page) in &self.cursors {
            if !out.is_empty() {
                out.push('\n');
            }
            match std::fs::read_to_string(self.root.join(path)) {
                Ok(content) => {
                    let view = paginate(&content, page);
                    out.push_str(&format!(
                        "[File: {path}] (page {}/{})\n{}\n",
                        view.page, view.pages, view.body
                    ));
                }
                Err(e) => {
                    out.push_str(&format!("[File: {path}] (unreadable: {e})\n"));
                }
            }
        }
        out
    }
}
