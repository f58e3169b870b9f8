//! plauderstube-relay – Chat-Relay-Kern und WebSocket-Transport
//!
//! Dieser Crate haelt die Menge der live verbundenen Identitaeten und
//! verteilt Chat-Nachrichten an alle oder an genau einen Empfaenger.
//!
//! ## Architektur
//!
//! ```text
//! WebSocket-Listener (RelayServer, axum)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |  Sitzung: Ausstehend -> Aktiv -> Geschlossen
//!     |
//!     v
//! MessageRouter
//!     |
//!     +-- IdentityPool          (Name + Avatar beim Oeffnen)
//!     +-- ConnectionRegistry    (wer ist gerade verbunden)
//!     +-- Transport             (Push an eine Verbindungs-ID)
//! ```

pub mod connection;
pub mod error;
pub mod identity;
pub mod registry;
pub mod router;
pub mod server_state;
pub mod transport;
pub mod ws;

// Bequeme Re-Exporte
pub use connection::{ClientConnection, Sitzung, VerbindungsZustand};
pub use error::{RelayError, RelayResult};
pub use identity::IdentityPool;
pub use registry::ConnectionRegistry;
pub use router::MessageRouter;
pub use server_state::{PlatzReservierung, RelayConfig, RelayState};
pub use transport::{Anmeldung, QueueTransport, Transport};
pub use ws::RelayServer;
