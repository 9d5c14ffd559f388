//! Field kinds.

/// Semantic type of a header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Boolean (true/false)
    Boolean,

    /// Display string decoded from the wire
    String,

    /// Unsigned integer
    Integer,

    /// Absolute point in time (seconds since the Unix epoch)
    AbsoluteTime,

    /// Raw bytes
    Bytes,

    /// Protocol item that groups the fields of one dissector
    Protocol,
}

impl FieldKind {
    /// Human-readable type name for display.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Boolean => "boolean",
            FieldKind::String => "string",
            FieldKind::Integer => "uint",
            FieldKind::AbsoluteTime => "absolute_time",
            FieldKind::Bytes => "bytes",
            FieldKind::Protocol => "protocol",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(FieldKind::Boolean.type_name(), "boolean");
        assert_eq!(FieldKind::String.type_name(), "string");
        assert_eq!(FieldKind::Integer.type_name(), "uint");
        assert_eq!(FieldKind::AbsoluteTime.type_name(), "absolute_time");
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", FieldKind::Bytes), "bytes");
        assert_eq!(format!("{}", FieldKind::Protocol), "protocol");
    }
}
