pub(crate) mod claims;
pub(crate) mod codec;
pub(crate) mod store;

pub(crate) use claims::{AccessClaims, RefreshClaims, TokenClaims, TokenKind};
pub(crate) use codec::TokenCodec;
pub(crate) use store::RefreshRecord;
