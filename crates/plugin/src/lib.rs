//! agora-plugin – Plugin-Vertrag des Kollaborations-Frameworks
//!
//! Das Host-Framework (Transport, Frame-Tick, Client-Lifecycle) liegt
//! ausserhalb dieses Repos; dieses Crate drueckt seinen Plugin-Vertrag
//! als Traits aus, gegen die das Agora-Protokoll implementiert ist:
//! [`ProtocolClient`] fuer die Client-Seite, [`ProtocolServer`] fuer die
//! Server-Seite, dazu die Nachrichten-ID-Registrierung.

pub mod client;
pub mod error;
pub mod registry;
pub mod server;

pub use client::ProtocolClient;
pub use error::{PluginError, PluginResult};
pub use registry::{ProtokollEintrag, ProtokollTabelle};
pub use server::ProtocolServer;
