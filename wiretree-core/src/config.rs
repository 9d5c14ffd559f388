//! Dissection preferences.

use crate::protocol::KISMET_TCP_PORT;

/// Registration-time preferences.
///
/// Loading and storing preferences is left to the host application; this
/// type only carries the values a registry is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
    /// TCP port the Kismet dissector registers on.
    pub kismet_tcp_port: u16,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            kismet_tcp_port: KISMET_TCP_PORT,
        }
    }
}

impl Preferences {
    /// Override the Kismet TCP port.
    pub fn with_kismet_tcp_port(mut self, port: u16) -> Self {
        self.kismet_tcp_port = port;
        self
    }
}
