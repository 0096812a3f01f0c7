//! Dropout-Buffer – begrenzte FIFO fester Segmente mit Verwerfen des Aeltesten
//!
//! Der Producer schreibt Segmente fester Laenge; sind alle `N` Plaetze
//! belegt, verdraengt ein neues Segment das aelteste. Der Consumer friert
//! mit [`DropoutConsumer::sperren`] einen Stapel ein, liest ihn segmentweise
//! und gibt ihn mit [`DropoutConsumer::entsperren`] als verbraucht frei.
//! Ein Push, der ein gesperrtes Segment verdraengen muesste, wird verworfen.
//!
//! ## Eigenschaften
//! - Begrenzter Speicher, vorhersagbares Verlustverhalten bei Consumer-Stau
//! - Keine Seite blockiert; der Index-Mutex wird nur fuer wenige
//!   Zeigeroperationen gehalten, Datenkopien laufen ausserhalb
//! - Genau ein Producer und ein Consumer (nicht klonbare Haelften)

use parking_lot::Mutex;
use std::cell::UnsafeCell;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Index-Zustand
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Zustand {
    /// Slot-Index des aeltesten festgeschriebenen Segments
    kopf: usize,
    /// Anzahl festgeschriebener Segmente
    belegt: usize,
    /// Anzahl vom Consumer gesperrter Segmente (Praefix ab `kopf`)
    gesperrt: usize,
    /// Anzahl verworfener Segmente seit Erstellung
    verworfen: u64,
}

struct Kern<T> {
    segment_laenge: usize,
    kapazitaet: usize,
    zustand: Mutex<Zustand>,
    /// Flacher Speicher: `kapazitaet * segment_laenge` Elemente.
    /// Zugriffsdisziplin: der Producer schreibt ausschliesslich den einen
    /// nicht festgeschriebenen Slot; der Consumer liest ausschliesslich
    /// gesperrte Slots. Gesperrte Slots koennen nicht verdraengt werden,
    /// daher ueberlappen Schreib- und Lesezugriffe nie.
    daten: Box<[UnsafeCell<T>]>,
}

// Sicherheit: die Zugriffsdisziplin oben stellt sicher, dass kein Slot
// gleichzeitig von beiden Seiten beruehrt wird; die Uebergabe der Slots
// laeuft ueber den Index-Mutex.
unsafe impl<T: Send> Send for Kern<T> {}
unsafe impl<T: Send> Sync for Kern<T> {}

// ---------------------------------------------------------------------------
// DropoutBuffer
// ---------------------------------------------------------------------------

/// Begrenzte Segment-FIFO, aufgeteilt in Producer- und Consumer-Haelfte
pub struct DropoutBuffer;

impl DropoutBuffer {
    /// Erstellt einen Buffer fuer `kapazitaet` Segmente zu je
    /// `segment_laenge` Elementen und teilt ihn in seine Haelften.
    ///
    /// # Panics
    /// Wenn `segment_laenge` oder `kapazitaet` null ist.
    pub fn neu<T: Copy + Default>(
        segment_laenge: usize,
        kapazitaet: usize,
    ) -> (DropoutProducer<T>, DropoutConsumer<T>) {
        assert!(segment_laenge > 0, "Segmentlaenge muss > 0 sein");
        assert!(kapazitaet > 0, "Kapazitaet muss > 0 sein");

        let daten: Box<[UnsafeCell<T>]> = (0..segment_laenge * kapazitaet)
            .map(|_| UnsafeCell::new(T::default()))
            .collect();

        let kern = Arc::new(Kern {
            segment_laenge,
            kapazitaet,
            zustand: Mutex::new(Zustand {
                kopf: 0,
                belegt: 0,
                gesperrt: 0,
                verworfen: 0,
            }),
            daten,
        });

        (
            DropoutProducer {
                kern: Arc::clone(&kern),
            },
            DropoutConsumer {
                kern,
                gesperrt_kopf: 0,
                gesperrt_anzahl: 0,
            },
        )
    }
}

// ---------------------------------------------------------------------------
// Producer-Haelfte
// ---------------------------------------------------------------------------

/// Schreibende Haelfte des Dropout-Buffers
pub struct DropoutProducer<T> {
    kern: Arc<Kern<T>>,
}

impl<T: Copy> DropoutProducer<T> {
    /// Schreibt ein Segment und schreibt es fest.
    ///
    /// Sind alle Plaetze belegt, wird das aelteste Segment verdraengt.
    /// Wuerde die Verdraengung ein vom Consumer gesperrtes Segment
    /// treffen, wird stattdessen dieses Push verworfen und `false`
    /// zurueckgegeben.
    ///
    /// # Panics
    /// Wenn `segment` nicht exakt die Segmentlaenge hat.
    pub fn push_segment(&mut self, segment: &[T]) -> bool {
        assert_eq!(
            segment.len(),
            self.kern.segment_laenge,
            "Segment hat falsche Laenge"
        );

        let slot = {
            let mut z = self.kern.zustand.lock();
            if z.belegt == self.kern.kapazitaet {
                if z.gesperrt > 0 {
                    // Das aelteste Segment ist eingefroren
                    z.verworfen += 1;
                    tracing::trace!("Push waehrend Sperre verworfen");
                    return false;
                }
                z.kopf = (z.kopf + 1) % self.kern.kapazitaet;
                z.belegt -= 1;
                z.verworfen += 1;
                tracing::trace!("Ueberlauf: aeltestes Segment verdraengt");
            }
            (z.kopf + z.belegt) % self.kern.kapazitaet
        };

        // Der Slot ist nicht festgeschrieben und damit exklusiv unser.
        let basis = slot * self.kern.segment_laenge;
        for (i, wert) in segment.iter().enumerate() {
            unsafe {
                *self.kern.daten[basis + i].get() = *wert;
            }
        }

        // Festschreiben; die Mutex-Uebergabe ordnet die Datenschreibzugriffe
        // vor jedem spaeteren Consumer-Zugriff.
        self.kern.zustand.lock().belegt += 1;
        true
    }

    /// Anzahl seit Erstellung verworfener Segmente
    pub fn verworfene_segmente(&self) -> u64 {
        self.kern.zustand.lock().verworfen
    }
}

// ---------------------------------------------------------------------------
// Consumer-Haelfte
// ---------------------------------------------------------------------------

/// Lesende Haelfte des Dropout-Buffers
pub struct DropoutConsumer<T> {
    kern: Arc<Kern<T>>,
    /// Slot-Index des ersten gesperrten Segments
    gesperrt_kopf: usize,
    /// Anzahl aktuell gesperrter Segmente
    gesperrt_anzahl: usize,
}

impl<T: Copy> DropoutConsumer<T> {
    /// Friert die aktuell festgeschriebenen Segmente ein und gibt ihre
    /// Anzahl zurueck.
    ///
    /// Die eingefrorenen Segmente bilden ein zusammenhaengendes Suffix der
    /// Push-Reihenfolge; `gesperrtes_segment(0)` ist das aelteste. Der
    /// Producer darf waehrend der Sperre weiter pushen, solange er kein
    /// gesperrtes Segment verdraengen muesste.
    pub fn sperren(&mut self) -> usize {
        let mut z = self.kern.zustand.lock();
        z.gesperrt = z.belegt;
        self.gesperrt_kopf = z.kopf;
        self.gesperrt_anzahl = z.gesperrt;
        self.gesperrt_anzahl
    }

    /// Liest das `i`-te gesperrte Segment (FIFO: 0 = aeltestes).
    ///
    /// # Panics
    /// Wenn `i` ausserhalb des gesperrten Stapels liegt.
    pub fn gesperrtes_segment(&self, i: usize) -> &[T] {
        assert!(i < self.gesperrt_anzahl, "Segment-Index nicht gesperrt");
        let slot = (self.gesperrt_kopf + i) % self.kern.kapazitaet;
        let basis = slot * self.kern.segment_laenge;
        // Gesperrte Slots kann der Producer weder schreiben noch
        // verdraengen; die Referenz lebt hoechstens bis zum naechsten
        // &mut-Aufruf (sperren/entsperren) dieser Haelfte.
        unsafe {
            std::slice::from_raw_parts(
                self.kern.daten[basis].get() as *const T,
                self.kern.segment_laenge,
            )
        }
    }

    /// Gibt den gesperrten Stapel vollstaendig als verbraucht frei.
    pub fn entsperren(&mut self) {
        let anzahl = self.gesperrt_anzahl;
        self.entsperren_teilweise(anzahl);
    }

    /// Gibt die ersten `verbraucht` gesperrten Segmente als verbraucht
    /// frei; der Rest bleibt festgeschrieben und kommt beim naechsten
    /// `sperren` erneut.
    pub fn entsperren_teilweise(&mut self, verbraucht: usize) {
        assert!(
            verbraucht <= self.gesperrt_anzahl,
            "Mehr Segmente verbraucht als gesperrt"
        );
        let mut z = self.kern.zustand.lock();
        z.kopf = (z.kopf + verbraucht) % self.kern.kapazitaet;
        z.belegt -= verbraucht;
        z.gesperrt = 0;
        self.gesperrt_anzahl = 0;
    }

    /// Anzahl aktuell festgeschriebener Segmente
    pub fn fuellstand(&self) -> usize {
        self.kern.zustand.lock().belegt
    }

    /// Kapazitaet in Segmenten
    pub fn kapazitaet(&self) -> usize {
        self.kern.kapazitaet
    }

    /// Elemente pro Segment
    pub fn segment_laenge(&self) -> usize {
        self.kern.segment_laenge
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
