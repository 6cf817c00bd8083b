//! HTML rewriting stages.
//!
//! Each stage is a pure function from the current body (plus its inputs) to
//! a [`Rewrite`]. Stages never decide whether they should run; the
//! orchestrator gates them on [`crate::Detection`]. They run in this order:
//!
//! 1. [`inject_summary_box`]
//! 2. [`convert_technical_lists`]
//! 3. [`inject_internal_links`]
//! 4. [`append_related_section`]
//! 5. [`inject_entity_links`]

pub mod entity_links;
pub mod internal_links;
pub mod related;
pub mod summary_box;
pub mod tables;

pub use entity_links::inject_entity_links;
pub use internal_links::inject_internal_links;
pub use related::{append_related_section, render_related_section};
pub use summary_box::{inject_summary_box, render_summary_box};
pub use tables::convert_technical_lists;

/// Output of a stage: the rewritten body and how many insertions it made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub html: String,
    pub applied: usize,
}

impl Rewrite {
    pub(crate) fn unchanged(html: &str) -> Self {
        Self { html: html.to_string(), applied: 0 }
    }

    pub(crate) fn new(html: String, applied: usize) -> Self {
        Self { html, applied }
    }
}
