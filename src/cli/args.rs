//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use wiretree_core::protocol::{PacketContext, Transport, KISMET_TCP_PORT};
use wiretree_core::Preferences;

use super::OutputFormat;

/// Client-side port used when none is given.
pub const DEFAULT_CLIENT_PORT: u16 = 40000;

/// Transport the payload arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportArg {
    /// Transmission Control Protocol
    Tcp,
    /// User Datagram Protocol
    Udp,
}

impl From<TransportArg> for Transport {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::Tcp => Transport::Tcp,
            TransportArg::Udp => Transport::Udp,
        }
    }
}

/// Dissect protocol payloads into field trees.
#[derive(Parser, Debug)]
#[command(name = "wiretree")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Payload files to dissect, one packet each ("-" reads stdin)
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Input is hex text instead of raw bytes
    #[arg(long = "hex")]
    pub hex: bool,

    /// Transport the payload arrived on
    #[arg(long = "transport", value_enum, default_value = "tcp")]
    pub transport: TransportArg,

    /// Source port of the payload (defaults to the Kismet port, so payloads
    /// are read as server responses)
    #[arg(long = "src-port")]
    pub src_port: Option<u16>,

    /// Destination port of the payload; set it to the Kismet port (and
    /// --src-port to a client port) to read a payload as a client request
    #[arg(long = "dst-port", default_value_t = DEFAULT_CLIENT_PORT)]
    pub dst_port: u16,

    /// TCP port the Kismet dissector is registered on
    #[arg(
        long = "kismet-port",
        env = "WIRETREE_KISMET_PORT",
        default_value_t = KISMET_TCP_PORT
    )]
    pub kismet_port: u16,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// List registered dissectors
    #[arg(long = "list-protocols")]
    pub list_protocols: bool,

    /// List registered header fields
    #[arg(long = "list-fields")]
    pub list_fields: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Check if this is an info-only command (no input needed).
    pub fn is_info_only(&self) -> bool {
        self.list_protocols || self.list_fields
    }

    /// Registration preferences selected on the command line.
    pub fn preferences(&self) -> Preferences {
        Preferences::default().with_kismet_tcp_port(self.kismet_port)
    }

    /// Source port, falling back to the Kismet port.
    pub fn src_port(&self) -> u16 {
        self.src_port.unwrap_or(self.kismet_port)
    }

    /// Packet context for one payload read from the command line.
    pub fn packet_context(&self) -> PacketContext {
        PacketContext::new(self.transport.into(), self.src_port(), self.dst_port)
    }
}
