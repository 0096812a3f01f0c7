//! agora-video – Video-Strecke des Agora-Protokolls
//!
//! Sende-Pfad: Geraete-Callback -> Y'CbCr-Extraktion -> Frame-Slot ->
//! Theora-Encoder (Tick-Rate) -> Paket-Slot. Empfangs-Pfad pro
//! entferntem Client: Paket-Slot -> Decoder-Thread (Condvar-getrieben)
//! -> Frame-Slot, vom Renderer abgetastet.
//!
//! Codec und Aufnahmegeraet liegen ausserhalb dieses Repos und sind als
//! Traits gefasst ([`codec::TheoraEncoder`], [`codec::TheoraDecoder`],
//! [`capture::VideoQuelle`], [`capture::BildExtraktor`]).

pub mod capture;
pub mod codec;
pub mod decoder;
pub mod encoder;
pub mod error;

pub use capture::{BildExtraktor, FrameBuffer, PixelFormat, VideoQuelle};
pub use codec::{TheoraConfig, TheoraDecoder, TheoraEncoder, TheoraFrame};
pub use decoder::VideoDecoderThread;
pub use encoder::VideoEncoderPumpe;
pub use error::{VideoError, VideoResult};
