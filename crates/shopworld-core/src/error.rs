use thiserror::Error;

/// Core error types for storefront domain rules
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{field}: {message}")]
    InvalidField { field: &'static str, message: String },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount overflow while computing {0}")]
    AmountOverflow(&'static str),

    #[error("Unknown order status: {0}")]
    UnknownOrderStatus(String),
}

impl CoreError {
    /// Create a new InvalidField error
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }

    /// Create a new InvalidAmount error
    pub fn invalid_amount(value: impl Into<String>) -> Self {
        Self::InvalidAmount(value.into())
    }

    /// Check if this error was caused by client input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidField { .. }
                | Self::InvalidAmount(_)
                | Self::UnknownOrderStatus(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_field_message_names_the_field() {
        let err = CoreError::invalid_field("email", "must contain '@'");
        assert_eq!(err.to_string(), "email: must contain '@'");
        assert!(err.is_client_error());
    }

    #[test]
    fn overflow_is_not_a_client_error() {
        assert!(!CoreError::AmountOverflow("order total").is_client_error());
    }
}
