//! Factory patterns for generating security records

use common::{OptionType, Px, Security, SecurityRef, SecurityType};
use std::sync::Arc;

/// Extension key Zerodha adapters store the instrument token under
pub const ZERODHA_TOKEN_KEY: &str = "zerodha.instrument_token";

/// Extension key Binance adapters store the venue symbol under
pub const BINANCE_SYMBOL_KEY: &str = "binance.symbol";

/// Factory for security records carrying a Zerodha instrument token
#[derive(Debug, Clone)]
pub struct SecurityFactory {
    board: String,
}

impl Default for SecurityFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SecurityFactory {
    pub fn new() -> Self {
        Self {
            board: "NFO".to_string(),
        }
    }

    pub fn with_board(mut self, board: impl Into<String>) -> Self {
        self.board = board.into();
        self
    }

    /// Record with a token under the Zerodha key
    pub fn tokenized(&self, code: &str, token: u32) -> SecurityRef {
        Arc::new(self.security(code).with_extension(ZERODHA_TOKEN_KEY, token))
    }

    /// Record the adapter cannot key on
    pub fn untokenized(&self, code: &str) -> SecurityRef {
        Arc::new(self.security(code))
    }

    /// Record whose extension info lacks the Zerodha key
    pub fn foreign(&self, code: &str, symbol: &str) -> SecurityRef {
        Arc::new(self.security(code).with_extension(BINANCE_SYMBOL_KEY, symbol))
    }

    pub fn option(
        &self,
        underlying: &str,
        strike: f64,
        option_type: OptionType,
        token: u32,
    ) -> SecurityRef {
        let suffix = match option_type {
            OptionType::Call => "CE",
            OptionType::Put => "PE",
        };
        let mut security = self
            .security(&format!("{underlying}{strike}{suffix}"))
            .with_type(SecurityType::Option)
            .with_extension(ZERODHA_TOKEN_KEY, token);
        security.strike = Some(Px::new(strike));
        security.option_type = Some(option_type);
        security.underlying_id = Some(format!("{underlying}@{}", self.board));
        Arc::new(security)
    }

    /// `count` records `SYM0..` with consecutive tokens from `first_token`
    pub fn batch(&self, count: u32, first_token: u32) -> Vec<SecurityRef> {
        (0..count)
            .map(|i| self.tokenized(&format!("SYM{i}"), first_token + i))
            .collect()
    }

    /// Criteria carrying only a token
    pub fn token_criteria(&self, token: u32) -> Security {
        Security::criteria().with_extension(ZERODHA_TOKEN_KEY, token)
    }

    fn security(&self, code: &str) -> Security {
        Security::new(code, self.board.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_factory_records() {
        let factory = SecurityFactory::new();
        let option = factory.option("NIFTY", 24_500.0, OptionType::Call, 42);

        assert_eq!(option.id, "NIFTY24500CE@NFO");
        assert_eq!(option.extension(ZERODHA_TOKEN_KEY).and_then(|v| v.as_u64()), Some(42));
        assert_eq!(option.underlying_id.as_deref(), Some("NIFTY@NFO"));
        assert!(factory.untokenized("SBER").extension(ZERODHA_TOKEN_KEY).is_none());
        assert_eq!(factory.batch(3, 100).len(), 3);
    }
}
