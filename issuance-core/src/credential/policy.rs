use std::sync::Arc;

use super::CredentialExchangeRecord;

/// `AcceptPolicy` decides whether a received credential offer should be accepted
pub trait AcceptPolicy: Send + Sync {
    fn should_accept(&self, record: &CredentialExchangeRecord) -> bool;
}

impl<T: AcceptPolicy + ?Sized> AcceptPolicy for Box<T> {
    fn should_accept(&self, record: &CredentialExchangeRecord) -> bool {
        (**self).should_accept(record)
    }
}

impl<T: AcceptPolicy + ?Sized> AcceptPolicy for Arc<T> {
    fn should_accept(&self, record: &CredentialExchangeRecord) -> bool {
        (**self).should_accept(record)
    }
}

/// Accepts every offer received by the holder
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAccept;

impl AcceptPolicy for AlwaysAccept {
    fn should_accept(&self, _: &CredentialExchangeRecord) -> bool {
        true
    }
}

/// Never accepts automatically, offers are left for a manual review
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverAccept;

impl AcceptPolicy for NeverAccept {
    fn should_accept(&self, _: &CredentialExchangeRecord) -> bool {
        false
    }
}

/// `TrustedIssuers` only accepts offers whose credential definition has been registered
/// by one of the allowed issuer DIDs
///
/// A credential definition id is formatted as `{did}:3:CL:{schema_seq_no}:{tag}`
#[derive(Debug, Clone, Default)]
pub struct TrustedIssuers {
    issuers: Vec<String>,
}

impl TrustedIssuers {
    pub fn new(issuers: Vec<String>) -> Self {
        Self { issuers }
    }

    pub fn issuer_of(credential_definition_id: &str) -> Option<&str> {
        credential_definition_id
            .split_once(":3:")
            .map(|(did, _)| did)
            .filter(|did| !did.is_empty())
    }
}

impl AcceptPolicy for TrustedIssuers {
    fn should_accept(&self, record: &CredentialExchangeRecord) -> bool {
        record
            .get_credential_definition_id()
            .and_then(|id| Self::issuer_of(id))
            .map(|did| self.issuers.iter().any(|trusted| trusted == did))
            .unwrap_or(false)
    }
}

/// Wraps any predicate function as an [`AcceptPolicy`]
pub struct Predicate<F>(F);

impl<F> Predicate<F>
where
    F: Fn(&CredentialExchangeRecord) -> bool + Send + Sync,
{
    pub fn new(predicate: F) -> Self {
        Self(predicate)
    }
}

impl<F> AcceptPolicy for Predicate<F>
where
    F: Fn(&CredentialExchangeRecord) -> bool + Send + Sync,
{
    fn should_accept(&self, record: &CredentialExchangeRecord) -> bool {
        (self.0)(record)
    }
}
