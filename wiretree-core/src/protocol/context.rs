//! Packet metadata handed to dissectors.

use compact_str::CompactString;

/// Transport a payload arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Transport {
    #[default]
    Tcp,
    Udp,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Tcp => "tcp",
            Transport::Udp => "udp",
        }
    }
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Demultiplexing key a dissector registers under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransportKey {
    pub transport: Transport,
    pub port: u16,
}

impl TransportKey {
    pub const fn new(transport: Transport, port: u16) -> Self {
        Self { transport, port }
    }

    pub const fn tcp(port: u16) -> Self {
        Self::new(Transport::Tcp, port)
    }

    pub const fn udp(port: u16) -> Self {
        Self::new(Transport::Udp, port)
    }
}

impl std::fmt::Display for TransportKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.port == {}", self.transport, self.port)
    }
}

/// Summary columns a dissector fills in for a packet list view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Columns {
    pub protocol: CompactString,
    pub info: String,
}

impl Columns {
    pub fn set_protocol(&mut self, protocol: &str) {
        self.protocol = CompactString::new(protocol);
    }

    pub fn set_info(&mut self, info: impl Into<String>) {
        self.info = info.into();
    }

    pub fn clear(&mut self) {
        self.protocol.clear();
        self.info.clear();
    }
}

/// Per-packet context passed to every dissector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketContext {
    pub transport: Transport,
    pub src_port: u16,
    pub dst_port: u16,

    /// Port whose registration selected the current dissector.
    ///
    /// Set by the dispatcher before each candidate runs.
    pub match_port: u16,

    pub columns: Columns,
}

impl PacketContext {
    /// Create a context for one payload.
    ///
    /// `match_port` starts out as the destination port.
    pub fn new(transport: Transport, src_port: u16, dst_port: u16) -> Self {
        Self {
            transport,
            src_port,
            dst_port,
            match_port: dst_port,
            columns: Columns::default(),
        }
    }

    pub fn tcp(src_port: u16, dst_port: u16) -> Self {
        Self::new(Transport::Tcp, src_port, dst_port)
    }

    pub fn udp(src_port: u16, dst_port: u16) -> Self {
        Self::new(Transport::Udp, src_port, dst_port)
    }

    /// Check whether the packet flows toward the registered port.
    ///
    /// This is the direction flag dissectors use to tell a request from a
    /// response.
    pub fn is_to_match_port(&self) -> bool {
        self.match_port == self.dst_port
    }

    /// Transport key of the registered port.
    pub fn match_key(&self) -> TransportKey {
        TransportKey::new(self.transport, self.match_port)
    }
}
