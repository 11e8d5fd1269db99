use crate::money::Money;

/// A player action the engine refused. The state is left exactly as it was
/// before the action was attempted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// The generator does not exist, or its ownership is wrong for the
    /// action (buying an owned one, upgrading an unowned one).
    #[error("Generator {index} not available")]
    GeneratorUnavailable { index: u32 },

    /// The balance does not cover the price.
    #[error("Not enough balance: need {required}, have {available}")]
    InsufficientBalance { required: Money, available: Money },

    /// The request did not name a usable generator index.
    #[error("{0}")]
    MalformedInput(String),
}

impl EngineError {
    /// Whether the caller, rather than the server, is at fault.
    /// Every variant qualifies today; transports map these to a 400.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EngineError::GeneratorUnavailable { .. }
                | EngineError::InsufficientBalance { .. }
                | EngineError::MalformedInput(_)
        )
    }
}
