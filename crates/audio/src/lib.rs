//! agora-audio – Audio-Strecke des Agora-Protokolls
//!
//! Sende-Pfad: Capture-Ring -> SPEEX-Encoder-Pumpe -> Paket-Warteschlange
//! (vom Client-Update-Tick entleert). Empfangs-Pfad pro entferntem
//! Client: Jitter-Warteschlange -> SPEEX-Decoder -> Streaming-Quelle
//! mit umlaufenden Puffern, getrieben vom AL-Render-Pass.
//!
//! Die Codec-Bibliothek und die Audiogeraete liegen ausserhalb dieses
//! Repos und sind als Traits gefasst ([`codec::SpeexEncoder`],
//! [`codec::SpeexDecoder`], [`capture::MikrofonQuelle`],
//! [`playback::StreamingQuelle`]).

pub mod capture;
pub mod codec;
pub mod encoder;
pub mod error;
pub mod playback;

// Bequeme Re-Exporte der wichtigsten Typen
pub use capture::{capture_ring, CaptureConfig, CaptureConsumer, CaptureProducer, MikrofonQuelle};
pub use codec::{SpeexConfig, SpeexDecoder, SpeexEncoder};
pub use encoder::EncoderPumpe;
pub use error::{AudioError, AudioResult};
pub use playback::{PlaybackPumpe, PufferId, StreamingQuelle};
