/// Whoever is asking the studio to do something, as far as the
/// authentication provider is concerned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    token: Option<String>,
}

impl Caller {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// Capability check in front of generation. Sign-in, sign-up and session
/// refresh belong to whatever implements this.
#[async_trait::async_trait]
pub trait AuthGate: Send + Sync {
    async fn is_authenticated(&self, caller: &Caller) -> bool;
}

/// Lets every caller through.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait::async_trait]
impl AuthGate for AllowAll {
    async fn is_authenticated(&self, _caller: &Caller) -> bool {
        true
    }
}

/// Rejects every caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

#[async_trait::async_trait]
impl AuthGate for DenyAll {
    async fn is_authenticated(&self, _caller: &Caller) -> bool {
        false
    }
}
