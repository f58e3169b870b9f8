//! plauderstube-protocol – Chatprotokoll-Definitionen
//!
//! Dieses Crate definiert alle Nachrichtentypen die zwischen Client und
//! Server ueber die WebSocket-Verbindung ausgetauscht werden, sowie das
//! JSON-Wire-Format.

pub mod chat;
pub mod wire;

pub use chat::{AusgehendeNachricht, ChatInhalt, EingehendeNachricht, zeitstempel_jetzt};
pub use wire::{ProtokollFehler, ausgehend_kodieren, eingehend_dekodieren};
