use gasless_ton::Coins;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid address {0}")]
    InvalidAddress(String),

    #[error("invalid amount {0}")]
    InvalidAmount(String),

    #[error("paymaster unavailable: {0}")]
    PaymasterUnavailable(String),

    #[error("quote failed: {0}")]
    QuoteFailed(String),

    #[error("fee {fee} exceeds the maximum fee {max_fee}")]
    FeeExceeded { fee: Coins, max_fee: Coins },

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("{0} client is not connected")]
    ClientNotConnected(String),

    #[error("operation not supported: {0}")]
    OperationNotSupported(String),

    #[error("provider error {0}")]
    Provider(String),
}

impl From<gasless_ton::Error> for Error {
    fn from(value: gasless_ton::Error) -> Self {
        match value {
            gasless_ton::Error::InvalidAddress(e) => Self::InvalidAddress(e),
            gasless_ton::Error::InvalidAmount(e) => Self::InvalidAmount(e),
            e => Self::Provider(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use gasless_ton::Coins;

    use crate::Error;

    #[test]
    fn input_errors_keep_their_kind() {
        let address: Error = gasless_ton::Error::InvalidAddress("x".to_string()).into();
        let amount: Error = gasless_ton::Error::InvalidAmount("-1".to_string()).into();
        let remote: Error = gasless_ton::Error::RateLimited.into();

        assert!(matches!(address, Error::InvalidAddress(_)));
        assert!(matches!(amount, Error::InvalidAmount(_)));
        assert!(matches!(remote, Error::Provider(_)));
    }

    #[test]
    fn fee_exceeded_reports_both_amounts() {
        let error = Error::FeeExceeded {
            fee: Coins::from_nano(5_000_000),
            max_fee: Coins::from_nano(5_000_000),
        };

        assert_eq!(error.to_string(), "fee 5000000 exceeds the maximum fee 5000000");
    }
}
