use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    config,
    error::AuthError,
    management::TokenStore,
    spotify::{
        AuthorizationFlow, AuthorizationPrompt, HttpTokenEndpoint, TokenEndpoint, TokenGrant,
        issue_credential,
    },
    types::{CachePolicy, ClientIdentity, Credential, IssuedCredential, ScopeMismatch, ScopeSet},
};

/// Source of a valid access token for the REST layer.
#[async_trait]
pub trait AccessTokenProvider: Send {
    /// An access token that has not expired at the time of the call.
    async fn access_token(&mut self) -> Result<String, AuthError>;
}

/// Configures and starts a [`TokenSession`].
pub struct SessionBuilder {
    identity: ClientIdentity,
    policy: CachePolicy,
    store: Option<Arc<dyn TokenStore>>,
    endpoint: Option<Arc<dyn TokenEndpoint>>,
    authorize_url: Option<String>,
}

impl SessionBuilder {
    pub fn cache_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Credential cache to consult and update. Without one the session always
    /// logs in interactively and never persists anything.
    pub fn store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn endpoint(mut self, endpoint: Arc<dyn TokenEndpoint>) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn authorize_url(mut self, url: impl Into<String>) -> Self {
        self.authorize_url = Some(url.into());
        self
    }

    /// Adopts a cached credential when allowed and available, otherwise runs
    /// the interactive authorization flow through `prompt`.
    pub async fn initialize<P>(self, prompt: &mut P) -> Result<TokenSession, AuthError>
    where
        P: AuthorizationPrompt + ?Sized,
    {
        let endpoint = self
            .endpoint
            .unwrap_or_else(|| Arc::new(HttpTokenEndpoint::from_env()) as Arc<dyn TokenEndpoint>);

        let cached = match (&self.store, self.policy.check_cache) {
            (Some(store), true) => store.get(&self.identity).await,
            _ => None,
        };

        if let Some(credential) = cached {
            return Ok(TokenSession {
                granted_scope: self.identity.scope.clone(),
                identity: self.identity,
                credential,
                policy: self.policy,
                store: self.store,
                endpoint,
                scope_mismatch: None,
                failure: None,
            });
        }

        let authorize_url = self.authorize_url.unwrap_or_else(config::auth_url);
        let issued = AuthorizationFlow::new(&self.identity, authorize_url)
            .run(prompt, endpoint.as_ref())
            .await?;

        let mut session = TokenSession {
            granted_scope: self.identity.scope.clone(),
            identity: self.identity,
            credential: issued.credential.clone(),
            policy: self.policy,
            store: self.store,
            endpoint,
            scope_mismatch: None,
            failure: None,
        };
        session.adopt(issued).await?;
        Ok(session)
    }
}

/// In-memory credential state of one authenticated session.
///
/// Owned by its caller and used serially; nothing is shared between
/// sessions except, optionally, the credential store.
pub struct TokenSession {
    identity: ClientIdentity,
    granted_scope: ScopeSet,
    credential: Credential,
    policy: CachePolicy,
    store: Option<Arc<dyn TokenStore>>,
    endpoint: Arc<dyn TokenEndpoint>,
    scope_mismatch: Option<ScopeMismatch>,
    failure: Option<String>,
}

impl TokenSession {
    pub fn builder(identity: ClientIdentity) -> SessionBuilder {
        SessionBuilder {
            identity,
            policy: CachePolicy::default(),
            store: None,
            endpoint: None,
            authorize_url: None,
        }
    }

    /// Returns the current access token, refreshing it first when it has
    /// expired. A failed refresh ends the session: every later call fails
    /// without contacting the provider.
    pub async fn access_token(&mut self) -> Result<String, AuthError> {
        if let Some(reason) = &self.failure {
            return Err(AuthError::Refresh(format!(
                "session ended after an earlier failure: {}",
                reason
            )));
        }

        if !self.credential.is_valid_at(Utc::now()) {
            self.refresh().await?;
        }

        Ok(self.credential.access_token.clone())
    }

    async fn refresh(&mut self) -> Result<(), AuthError> {
        let grant = TokenGrant::RefreshToken {
            refresh_token: &self.credential.refresh_token,
        };

        let issued = match self.endpoint.request(&self.identity, grant).await {
            Ok(response) => issue_credential(
                response,
                &self.granted_scope,
                Some(&self.credential.refresh_token),
                Utc::now(),
            ),
            Err(e) => Err(e.to_string()),
        };

        let issued = issued.and_then(|issued| {
            if issued.credential.is_valid_at(Utc::now()) {
                Ok(issued)
            } else {
                Err("the provider issued an access token that has already expired".to_string())
            }
        });

        match issued {
            Ok(issued) => self.adopt(issued).await,
            Err(reason) => {
                self.failure = Some(reason.clone());
                Err(AuthError::Refresh(reason))
            }
        }
    }

    /// Replaces the in-memory credential and writes it back if the policy
    /// asks for it.
    async fn adopt(&mut self, issued: IssuedCredential) -> Result<(), AuthError> {
        self.credential = issued.credential;
        self.granted_scope = issued.granted_scope;
        if issued.scope_mismatch.is_some() {
            self.scope_mismatch = issued.scope_mismatch;
        }

        if let (true, Some(store)) = (self.policy.update_cache, &self.store) {
            // cached under the scope the provider actually granted
            let key = self.identity.with_scope(self.granted_scope.clone());
            store.put(&key, &self.credential).await?;
        }
        Ok(())
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    /// Scope governing API calls: what the provider granted last.
    pub fn granted_scope(&self) -> &ScopeSet {
        &self.granted_scope
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.credential.expires_at
    }

    /// Most recent scope anomaly reported by the provider, if any.
    pub fn scope_mismatch(&self) -> Option<&ScopeMismatch> {
        self.scope_mismatch.as_ref()
    }

    pub fn cache_policy(&self) -> CachePolicy {
        self.policy
    }
}

#[async_trait]
impl AccessTokenProvider for TokenSession {
    async fn access_token(&mut self) -> Result<String, AuthError> {
        TokenSession::access_token(self).await
    }
}
