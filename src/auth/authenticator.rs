//! Shared, lazily created authentication context.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use super::clock::{Clock, SystemClock};
use super::context::{AuthenticationContext, Capability};
use super::strategy::AuthenticationStrategy;
use crate::Result;

/// Lifecycle of the cached context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationState {
    /// Nothing obtained yet, or signed out
    NoContext,
    /// A context is cached and not expired
    Valid,
    /// A context is cached but past its expiry
    Expired,
}

/// Owns the authentication context shared by every command.
///
/// At most one token request is in flight at a time. Concurrent callers
/// that find the slot empty or expired wait for that request and then
/// reuse its result.
pub struct Authenticator {
    strategy: Box<dyn AuthenticationStrategy>,
    clock: Arc<dyn Clock>,
    slot: RwLock<Option<Arc<AuthenticationContext>>>,
    creation: Mutex<()>,
}

impl Authenticator {
    /// Create an authenticator using the system clock.
    pub fn new(strategy: Box<dyn AuthenticationStrategy>) -> Self {
        Self::with_clock(strategy, Arc::new(SystemClock))
    }

    /// Create an authenticator with a custom clock.
    pub fn with_clock(strategy: Box<dyn AuthenticationStrategy>, clock: Arc<dyn Clock>) -> Self {
        Self {
            strategy,
            clock,
            slot: RwLock::new(None),
            creation: Mutex::new(()),
        }
    }

    /// Capability tags every context from this authenticator carries.
    pub fn capabilities(&self) -> &'static [Capability] {
        self.strategy.capabilities()
    }

    /// Name of the underlying grant.
    pub fn label(&self) -> &str {
        self.strategy.label()
    }

    /// Current state of the cached context.
    pub async fn state(&self) -> AuthenticationState {
        match self.slot.read().await.as_ref() {
            None => AuthenticationState::NoContext,
            Some(ctx) if ctx.is_expired(self.clock.now()) => AuthenticationState::Expired,
            Some(_) => AuthenticationState::Valid,
        }
    }

    /// Return a valid context, creating or refreshing it if needed.
    ///
    /// # Errors
    ///
    /// Returns the strategy's error if a token cannot be obtained. The slot
    /// is left unchanged in that case.
    pub async fn context(&self) -> Result<Arc<AuthenticationContext>> {
        if let Some(ctx) = self.valid_context().await {
            return Ok(ctx);
        }

        let _guard = self.creation.lock().await;

        // Another caller may have finished while we waited for the lock.
        let current = self.slot.read().await.clone();
        let token = match current {
            Some(ctx) if !ctx.is_expired(self.clock.now()) => return Ok(ctx),
            Some(expired) => {
                info!(grant = self.strategy.label(), "Refreshing expired token");
                self.strategy.refresh(&expired).await?
            }
            None => {
                info!(grant = self.strategy.label(), "Obtaining token");
                self.strategy.authenticate().await?
            }
        };

        let ctx = Arc::new(AuthenticationContext::new(
            self.strategy.label(),
            token,
            self.strategy.capabilities(),
            self.clock.now(),
        ));
        debug!(expires_at = %ctx.expires_at(), "Authentication context stored");
        *self.slot.write().await = Some(ctx.clone());

        Ok(ctx)
    }

    /// Forget the cached context and any persisted session.
    pub async fn sign_out(&self) -> Result<()> {
        let _guard = self.creation.lock().await;
        *self.slot.write().await = None;
        self.strategy.sign_out().await
    }

    async fn valid_context(&self) -> Option<Arc<AuthenticationContext>> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|ctx| !ctx.is_expired(self.clock.now()))
            .cloned()
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("grant", &self.strategy.label())
            .field("capabilities", &self.strategy.capabilities())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;
    use crate::auth::context::APPLICATION_ONLY;
    use crate::auth::token::Token;
    use crate::Error;
    use async_trait::async_trait;
    use chrono::Duration;
    use secrecy::ExposeSecret;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Issues `T1`, `T2`, ... and counts calls.
    #[derive(Default)]
    struct CountingStrategy {
        authenticate_calls: AtomicUsize,
        refresh_calls: AtomicUsize,
        fail: bool,
    }

    impl CountingStrategy {
        fn issued(&self) -> usize {
            self.authenticate_calls.load(Ordering::SeqCst) + self.refresh_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AuthenticationStrategy for Arc<CountingStrategy> {
        fn label(&self) -> &str {
            "counting"
        }

        fn capabilities(&self) -> &'static [Capability] {
            APPLICATION_ONLY
        }

        async fn authenticate(&self) -> Result<Token> {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            if self.fail {
                return Err(Error::Authentication("denied".to_string()));
            }
            let n = self.authenticate_calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Token::new(format!("T{n}"), 3600))
        }

        async fn refresh(&self, _current: &AuthenticationContext) -> Result<Token> {
            let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Token::new(format!("T{}", n + 2), 3600))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_token() {
        let strategy = Arc::new(CountingStrategy::default());
        let authenticator = Arc::new(Authenticator::new(Box::new(strategy.clone())));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let authenticator = authenticator.clone();
                tokio::spawn(async move { authenticator.context().await.unwrap() })
            })
            .collect();

        for handle in handles {
            let ctx = handle.await.unwrap();
            assert_eq!(ctx.access_token().expose_secret(), "T1");
        }
        assert_eq!(strategy.issued(), 1);
    }

    #[tokio::test]
    async fn test_expired_context_is_refreshed_once() {
        let strategy = Arc::new(CountingStrategy::default());
        let clock = ManualClock::new();
        let authenticator =
            Authenticator::with_clock(Box::new(strategy.clone()), Arc::new(clock.clone()));

        let first = authenticator.context().await.unwrap();
        assert_eq!(first.access_token().expose_secret(), "T1");
        assert_eq!(authenticator.state().await, AuthenticationState::Valid);

        clock.advance(Duration::seconds(3601));
        assert_eq!(authenticator.state().await, AuthenticationState::Expired);

        let second = authenticator.context().await.unwrap();
        let third = authenticator.context().await.unwrap();

        assert_eq!(second.access_token().expose_secret(), "T2");
        assert_eq!(third.access_token().expose_secret(), "T2");
        assert_eq!(strategy.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_token_valid_up_to_expiry_boundary() {
        let strategy = Arc::new(CountingStrategy::default());
        let clock = ManualClock::new();
        let authenticator =
            Authenticator::with_clock(Box::new(strategy.clone()), Arc::new(clock.clone()));

        authenticator.context().await.unwrap();
        clock.advance(Duration::seconds(3600));
        authenticator.context().await.unwrap();

        assert_eq!(strategy.issued(), 1);
    }

    #[tokio::test]
    async fn test_failure_leaves_slot_empty() {
        let strategy = Arc::new(CountingStrategy {
            fail: true,
            ..Default::default()
        });
        let authenticator = Authenticator::new(Box::new(strategy));

        let err = authenticator.context().await.unwrap_err();
        assert!(err.is_auth_error());
        assert_eq!(authenticator.state().await, AuthenticationState::NoContext);
    }

    #[tokio::test]
    async fn test_sign_out_clears_context() {
        let strategy = Arc::new(CountingStrategy::default());
        let authenticator = Authenticator::new(Box::new(strategy.clone()));

        authenticator.context().await.unwrap();
        authenticator.sign_out().await.unwrap();
        assert_eq!(authenticator.state().await, AuthenticationState::NoContext);

        let ctx = authenticator.context().await.unwrap();
        assert_eq!(ctx.access_token().expose_secret(), "T2");
    }
}
