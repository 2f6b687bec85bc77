use thiserror::Error;

/// Errors raised while lifting a single method body.
///
/// The lifter is deliberately forgiving: unresolvable references are skipped
/// and stack underflow substitutes a zero literal. An opcode the loader could
/// not classify is the one condition with no recovery.
#[derive(Debug, Error)]
pub enum LiftError {
    #[error("unknown opcode {opcode:#04X} at IL offset {offset:#06X}")]
    UnknownOpCode { opcode: u8, offset: u32 },
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to lift {method}: {source}")]
    Lift {
        method: String,
        #[source]
        source: LiftError,
    },
}

pub type Result<T> = std::result::Result<T, BuildError>;
