//! Protokoll-Registrierung – Nachrichten-ID-Vergabe beim Host
//!
//! Das Host-Framework vergibt jedem registrierten Protokoll einen
//! zusammenhaengenden Nachrichten-ID-Bereich oberhalb seiner eigenen
//! Basisnachrichten und leitet eingehende Nachrichten anhand dieser
//! Tabelle an das zustaendige Plugin weiter.

use crate::error::{PluginError, PluginResult};

/// Eintrag eines registrierten Protokolls
#[derive(Debug, Clone)]
pub struct ProtokollEintrag {
    pub name: String,
    /// Erste Nachrichten-ID des Protokolls
    pub basis: u32,
    /// Anzahl reservierter Nachrichten-IDs
    pub anzahl: u32,
}

/// Tabelle der registrierten Protokolle eines Clients oder Servers
pub struct ProtokollTabelle {
    eintraege: Vec<ProtokollEintrag>,
    naechste_basis: u32,
}

impl ProtokollTabelle {
    /// Erstellt eine Tabelle; `basis_start` ist die erste ID oberhalb der
    /// Basisnachrichten des Host-Frameworks.
    pub fn neu(basis_start: u32) -> Self {
        Self {
            eintraege: Vec::new(),
            naechste_basis: basis_start,
        }
    }

    /// Registriert ein Protokoll und gibt seine Basis-ID zurueck.
    /// Muss vor dem Verbindungsaufbau geschehen.
    pub fn registrieren(&mut self, name: &str, anzahl_nachrichten: u32) -> PluginResult<u32> {
        if self.eintraege.iter().any(|e| e.name == name) {
            return Err(PluginError::BereitsRegistriert(name.into()));
        }
        let basis = self.naechste_basis;
        self.eintraege.push(ProtokollEintrag {
            name: name.into(),
            basis,
            anzahl: anzahl_nachrichten,
        });
        self.naechste_basis += anzahl_nachrichten;
        tracing::debug!(
            protokoll = name,
            basis,
            anzahl_nachrichten,
            "Protokoll registriert"
        );
        Ok(basis)
    }

    /// Findet das Protokoll, dem eine Nachrichten-ID gehoert
    pub fn protokoll_fuer_nachricht(&self, nachrichten_id: u32) -> Option<&ProtokollEintrag> {
        self.eintraege
            .iter()
            .find(|e| nachrichten_id >= e.basis && nachrichten_id < e.basis + e.anzahl)
    }

    /// Anzahl registrierter Protokolle
    pub fn anzahl(&self) -> usize {
        self.eintraege.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registrierung_vergibt_fortlaufende_basen() {
        let mut tabelle = ProtokollTabelle::neu(16);
        assert_eq!(tabelle.registrieren("Agora", 0).unwrap(), 16);
        assert_eq!(tabelle.registrieren("Graphein", 4).unwrap(), 16);
        assert_eq!(tabelle.registrieren("Emineo", 2).unwrap(), 20);
    }

    #[test]
    fn doppelte_registrierung_abgelehnt() {
        let mut tabelle = ProtokollTabelle::neu(0);
        tabelle.registrieren("Agora", 0).unwrap();
        assert!(tabelle.registrieren("Agora", 0).is_err());
    }

    #[test]
    fn nachrichten_zuordnung() {
        let mut tabelle = ProtokollTabelle::neu(10);
        tabelle.registrieren("A", 3).unwrap();
        tabelle.registrieren("B", 2).unwrap();

        assert_eq!(tabelle.protokoll_fuer_nachricht(10).unwrap().name, "A");
        assert_eq!(tabelle.protokoll_fuer_nachricht(12).unwrap().name, "A");
        assert_eq!(tabelle.protokoll_fuer_nachricht(13).unwrap().name, "B");
        assert!(tabelle.protokoll_fuer_nachricht(15).is_none());
        assert!(tabelle.protokoll_fuer_nachricht(9).is_none());
    }
}
