//! Wayland-side collaborators: region screenshots and the clipboard.

pub mod clipboard;
pub mod screenshot;
pub mod types;

pub use clipboard::WaylandClipboard;
pub use screenshot::SlurpGrimSource;
pub use types::CaptureError;
