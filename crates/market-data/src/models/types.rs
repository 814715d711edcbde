use std::borrow::Cow;

/// Provider identifier - mostly static constants
pub type ProviderId = Cow<'static, str>;

/// Identifier of the Brazilian-market provider.
pub const BRAPI_PROVIDER_ID: &str = "BRAPI";

/// Identifier of the US-market provider.
pub const TIINGO_PROVIDER_ID: &str = "TIINGO";
