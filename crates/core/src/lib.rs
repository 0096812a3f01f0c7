//! agora-core – Gemeinsame Typen und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Agora-Crates gemeinsam genutzt werden: Skalare und Geometrie
//! des Navigationsraums, Client-IDs und der zentrale Fehler-Enum.

pub mod error;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{AgoraError, Result};
pub use types::{ClientId, Point, Scalar, VideoTransform};
