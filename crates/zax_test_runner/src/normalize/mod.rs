//! Path normalization shared by discovery, selection and reporting.

pub mod path;

pub use path::{normalize_slashes, relative_display, truncate_for_log};
