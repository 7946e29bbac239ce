use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Deadline after which a signed wallet request is refused by the contract
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidUntil(pub u32);

impl ValidUntil {
    pub fn valid_for(validity: Duration) -> Self {
        let deadline = (Utc::now() + validity).timestamp();
        Self(deadline.clamp(0, u32::MAX as i64) as u32)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;

    use crate::wallet::ValidUntil;

    #[test]
    fn deadline_is_in_the_future() {
        let now = Utc::now().timestamp() as u32;

        let deadline = ValidUntil::valid_for(Duration::from_secs(300));

        assert!(deadline.0 >= now + 300);
        assert!(deadline.0 <= now + 301);
    }
}
