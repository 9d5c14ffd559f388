//! Kismet client/server protocol dissector.
//!
//! Kismet servers speak a line-oriented text protocol. Clients send
//! commands; the server answers with records such as
//!
//! ```text
//! *KISMET: {version} {start time} \x01{server name}\x01 {build revision} {?} {extended version}
//! *TIME: {seconds since epoch}
//! ```
//!
//! The protocol has no length prefix, so an accepted payload is always
//! consumed in full.

use tracing::trace;

use crate::buffer::{format_text, Tvb};
use crate::error::DissectError;
use crate::expert::{ExpertGroup, ExpertInfo, Severity};
use crate::schema::{FieldKind, HeaderField};
use crate::tokenize::{lines, token_matches, trim_sentinels, Line};
use crate::tree::{parse_epoch_seconds, FieldTree, FieldValue, ItemId};

use super::{DataDissector, Dissector, PacketContext};

/// Default TCP port of a Kismet server.
pub const KISMET_TCP_PORT: u16 = 2501;

/// Number of leading bytes inspected by the text heuristic.
const SNIFF_LEN: usize = 8;

const KISMET_TAG: &[u8] = b"*KISMET";
const TIME_TAG: &[u8] = b"*TIME";

pub static HF_KISMET: HeaderField =
    HeaderField::new("Kismet Client/Server Protocol", "kismet", FieldKind::Protocol);
pub static HF_RESPONSE: HeaderField =
    HeaderField::new("Response", "kismet.response", FieldKind::Boolean)
        .with_description("TRUE if kismet response");
pub static HF_REQUEST: HeaderField =
    HeaderField::new("Request", "kismet.request", FieldKind::Boolean)
        .with_description("TRUE if kismet request");
pub static HF_VERSION: HeaderField =
    HeaderField::new("Version", "kismet.version", FieldKind::String);
pub static HF_START_TIME: HeaderField =
    HeaderField::new("Start time", "kismet.start_time", FieldKind::String);
pub static HF_SERVER_NAME: HeaderField =
    HeaderField::new("Server name", "kismet.server_name", FieldKind::String);
pub static HF_BUILD_REVISION: HeaderField =
    HeaderField::new("Build revision", "kismet.build_revision", FieldKind::String);
pub static HF_UNKNOWN_FIELD: HeaderField =
    HeaderField::new("Unknown field", "kismet.unknown_field", FieldKind::String);
pub static HF_EXTENDED_VERSION_STRING: HeaderField = HeaderField::new(
    "Extended version string",
    "kismet.extended_version_string",
    FieldKind::String,
);
pub static HF_TIME: HeaderField =
    HeaderField::new("Time", "kismet.time", FieldKind::AbsoluteTime);

pub static EI_TIME_INVALID: ExpertInfo = ExpertInfo::new(
    "kismet.time.invalid",
    ExpertGroup::Protocol,
    Severity::Warning,
    "Invalid time",
);
pub static EI_FIELD_MISSING: ExpertInfo = ExpertInfo::new(
    "kismet.field.missing",
    ExpertGroup::Malformed,
    Severity::Warning,
    "Record ended before all fields were read",
);

static FIELDS: &[&HeaderField] = &[
    &HF_KISMET,
    &HF_RESPONSE,
    &HF_REQUEST,
    &HF_VERSION,
    &HF_START_TIME,
    &HF_SERVER_NAME,
    &HF_BUILD_REVISION,
    &HF_UNKNOWN_FIELD,
    &HF_EXTENDED_VERSION_STRING,
    &HF_TIME,
];

static EXPERT_INFOS: &[&ExpertInfo] = &[&EI_TIME_INVALID, &EI_FIELD_MISSING];

/// Fields of a `*KISMET` record in wire order, with whether the value is
/// wrapped in sentinel bytes.
static KISMET_RECORD: &[(&HeaderField, bool)] = &[
    (&HF_VERSION, false),
    (&HF_START_TIME, false),
    (&HF_SERVER_NAME, true),
    (&HF_BUILD_REVISION, false),
    (&HF_UNKNOWN_FIELD, false),
    (&HF_EXTENDED_VERSION_STRING, false),
];

/// What the first line says about a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Response,
    /// Follow-on data of an earlier response.
    Continuation,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Request => "Request",
            MessageKind::Response => "Response",
            MessageKind::Continuation => "Continuation",
        }
    }
}

/// Heuristic check that a line starts with text.
///
/// The first [`SNIFF_LEN`] bytes must all lie in `32..=128`. Byte 128 is
/// accepted.
pub fn looks_like_text(line: &[u8]) -> bool {
    line.len() >= SNIFF_LEN && line[..SNIFF_LEN].iter().all(|b| (32..=128).contains(b))
}

/// Classify a payload from its first line and direction.
///
/// Returns `None` if the payload does not look like Kismet traffic.
pub fn classify(first_line: &[u8], to_server: bool) -> Option<MessageKind> {
    if !looks_like_text(first_line) {
        return None;
    }
    let kind = if to_server {
        MessageKind::Request
    } else if first_line.starts_with(b"*") || first_line.starts_with(b"!") {
        MessageKind::Response
    } else {
        MessageKind::Continuation
    };
    Some(kind)
}

/// Kismet dissector.
#[derive(Debug, Clone, Copy, Default)]
pub struct KismetDissector;

impl KismetDissector {
    /// Decode the records of one response line beneath `subtree`.
    fn dissect_record(
        tvb: &Tvb,
        line: &Line,
        tree: &mut FieldTree,
        subtree: ItemId,
    ) -> Result<(), DissectError> {
        let mut tokens = line.tokens(tvb)?;
        let (tag, tag_bytes) = tokens.next_token();
        if tag.is_empty() {
            return Ok(());
        }

        if token_matches(tag_bytes, KISMET_TAG) {
            for &(hf, sentinels) in KISMET_RECORD {
                let (token, bytes) = tokens.next_token();
                if token.is_empty() {
                    tree.add_expert_message(
                        subtree,
                        &EI_FIELD_MISSING,
                        format!("{} missing", hf.name),
                    );
                    break;
                }
                let shown = if sentinels { trim_sentinels(bytes) } else { bytes };
                tree.add_field(
                    subtree,
                    hf,
                    token.offset,
                    token.length,
                    FieldValue::string(format_text(shown)),
                )?;
            }
        } else if token_matches(tag_bytes, TIME_TAG) {
            let (token, bytes) = tokens.next_token();
            if token.is_empty() {
                tree.add_expert_message(
                    subtree,
                    &EI_FIELD_MISSING,
                    format!("{} missing", HF_TIME.name),
                );
                return Ok(());
            }
            let time = match parse_epoch_seconds(bytes) {
                Ok(time) => Some(time),
                Err(err) => {
                    trace!(offset = token.offset, %err, "undecodable time");
                    None
                }
            };
            let item = tree.add_field(
                subtree,
                &HF_TIME,
                token.offset,
                token.length,
                FieldValue::AbsoluteTime(time),
            )?;
            if time.is_none() {
                tree.add_expert(item, &EI_TIME_INVALID);
            }
        }
        Ok(())
    }
}

impl Dissector for KismetDissector {
    fn protocol_id(&self) -> &'static str {
        "kismet"
    }

    fn display_name(&self) -> &'static str {
        "Kismet"
    }

    fn fields(&self) -> &'static [&'static HeaderField] {
        FIELDS
    }

    fn expert_infos(&self) -> &'static [&'static ExpertInfo] {
        EXPERT_INFOS
    }

    fn try_dissect(
        &self,
        tvb: &Tvb,
        ctx: &mut PacketContext,
        tree: &mut FieldTree,
        parent: ItemId,
    ) -> Result<usize, DissectError> {
        let Ok(first) = Line::at(tvb, 0) else {
            return Err(DissectError::Declined);
        };
        let first_bytes = first.bytes(tvb)?;
        let Some(kind) = classify(first_bytes, ctx.is_to_match_port()) else {
            return Err(DissectError::Declined);
        };

        ctx.columns.set_protocol(self.protocol_id());
        match kind {
            MessageKind::Continuation => ctx.columns.set_info(kind.as_str()),
            _ => ctx
                .columns
                .set_info(format!("{}: {}", kind.as_str(), format_text(first_bytes))),
        }

        let item = tree.add_protocol(parent, &HF_KISMET, 0, tvb.len(), String::new())?;

        if kind == MessageKind::Continuation {
            DataDissector::dissect_payload(tvb, tree, item)?;
            return Ok(tvb.len());
        }

        let flag = match kind {
            MessageKind::Request => &HF_REQUEST,
            _ => &HF_RESPONSE,
        };
        tree.add_generated(item, flag, FieldValue::Bool(true))?;

        for line in lines(tvb) {
            trace!(offset = line.offset, length = line.length, "kismet line");
            if line.length == 0 {
                continue;
            }
            let label = tvb.format_text(line.offset, line.length);
            let subtree = tree.add_subtree(item, line.offset, line.total_length(), label)?;
            if kind == MessageKind::Response {
                Self::dissect_record(tvb, &line, tree, subtree)?;
            }
        }

        Ok(tvb.len())
    }
}
