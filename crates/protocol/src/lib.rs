//! agora-protocol – Drahtformat des Agora-Unterprotokolls
//!
//! Dieses Crate definiert die typisierte Kollaborations-Pipe und die vier
//! Nachrichtenkoerper (Connect-Request, Connect-Forward, Client-Update,
//! Server-Update), die zwischen Client und Server ausgetauscht werden.
//! Die Transportrahmung (Laengenpraefix, Nachrichten-IDs) gehoert dem
//! Host-Framework.

pub mod error;
pub mod messages;
pub mod pipe;
pub mod video;

pub use error::{ProtocolError, ProtocolResult};
pub use messages::{
    AudioUpdate, ConnectForward, ConnectRequest, StreamParameter, TheoraAnkuendigung,
    UpdateNachricht, VideoUpdate, ANZAHL_NACHRICHTEN, PROTOKOLL_NAME,
};
pub use pipe::{Pipe, SpeicherPipe, StreamPipe};
pub use video::VideoPacket;
