//! Identitaets-Pool – Vergibt Anzeigename und Avatar fuer neue Verbindungen
//!
//! Der Name wird gleichverteilt zufaellig aus dem konfigurierten Pool
//! gezogen. Als Avatar wird immer der erste konfigurierte Eintrag vergeben.

use plauderstube_core::{ConnectionId, Identity, PlauderError};
use rand::seq::SliceRandom;

/// Pool der verfuegbaren Anzeigenamen und Avatare
///
/// Nach der Konstruktion unveraenderlich; beide Listen sind garantiert
/// nicht leer.
#[derive(Debug, Clone)]
pub struct IdentityPool {
    namen: Vec<String>,
    avatare: Vec<String>,
}

impl IdentityPool {
    /// Erstellt einen neuen Pool
    ///
    /// Schlaegt mit `LeererPool` fehl wenn Namen oder Avatare fehlen. Wird
    /// beim Serverstart geprueft, zur Laufzeit kann der Pool nicht leer sein.
    pub fn neu(namen: Vec<String>, avatare: Vec<String>) -> plauderstube_core::Result<Self> {
        if namen.is_empty() {
            return Err(PlauderError::leerer_pool("name"));
        }
        if avatare.is_empty() {
            return Err(PlauderError::leerer_pool("avatar"));
        }
        Ok(Self { namen, avatare })
    }

    /// Vergibt eine Identitaet fuer die gegebene Verbindung
    pub fn zuweisen(&self, fd: ConnectionId) -> Identity {
        let mut rng = rand::thread_rng();
        let name = self
            .namen
            .choose(&mut rng)
            .cloned()
            .unwrap_or_default();
        let avatar = self.avatare.first().cloned().unwrap_or_default();

        Identity { fd, name, avatar }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn strings(werte: &[&str]) -> Vec<String> {
        werte.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn leere_namen_abgelehnt() {
        let ergebnis = IdentityPool::neu(vec![], strings(&["a.png"]));
        assert!(matches!(
            ergebnis,
            Err(PlauderError::LeererPool { ref pool }) if pool == "name"
        ));
    }

    #[test]
    fn leere_avatare_abgelehnt() {
        let ergebnis = IdentityPool::neu(strings(&["Anna"]), vec![]);
        assert!(matches!(
            ergebnis,
            Err(PlauderError::LeererPool { ref pool }) if pool == "avatar"
        ));
    }

    #[test]
    fn name_stammt_aus_dem_pool() {
        let pool = IdentityPool::neu(strings(&["Anna", "Bert", "Cleo"]), strings(&["a.png"])).unwrap();
        for i in 0..50 {
            let ident = pool.zuweisen(ConnectionId(i));
            assert_eq!(ident.fd, ConnectionId(i));
            assert!(pool.namen.contains(&ident.name));
        }
    }

    #[test]
    fn avatar_ist_immer_der_erste() {
        let pool = IdentityPool::neu(
            strings(&["Anna", "Bert"]),
            strings(&["erster.png", "zweiter.png", "dritter.png"]),
        )
        .unwrap();
        for i in 0..20 {
            assert_eq!(pool.zuweisen(ConnectionId(i)).avatar, "erster.png");
        }
    }

    #[test]
    fn auswahl_ist_zufaellig_verteilt() {
        let pool = IdentityPool::neu(strings(&["Anna", "Bert", "Cleo", "Dora"]), strings(&["a.png"])).unwrap();
        let gesehen: HashSet<String> = (0..400).map(|i| pool.zuweisen(ConnectionId(i)).name).collect();
        // Bei 400 Ziehungen aus 4 Namen ist das Fehlen eines Namens praktisch ausgeschlossen
        assert_eq!(gesehen.len(), 4);
    }
}
