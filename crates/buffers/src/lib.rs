//! agora-buffers – Verlustbehaftete Kanaele zwischen Echtzeit-Threads
//!
//! Zwei Single-Producer/Single-Consumer Primitive, die auf der Medienebene
//! Verlust dem Blockieren vorziehen:
//!
//! - [`dropout::DropoutBuffer`]: begrenzte FIFO fester Segmente; bei
//!   Ueberlauf wird das aelteste Segment verworfen, nie das neueste.
//! - [`triple::TripleBuffer`]: wartefreier Letzter-Wert-Slot mit drei
//!   Speicherzellen, sodass keine Seite jemals wartet.
//!
//! Beide werden wie `ringbuf::HeapRb` in eine Producer- und eine
//! Consumer-Haelfte aufgeteilt; die Haelften sind nicht klonbar, womit
//! die SPSC-Disziplin zur Compilezeit feststeht.

pub mod dropout;
pub mod triple;

pub use dropout::{DropoutBuffer, DropoutConsumer, DropoutProducer};
pub use triple::{TripleBuffer, TripleConsumer, TripleProducer};
