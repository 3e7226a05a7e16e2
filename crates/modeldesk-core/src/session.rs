//! Bearer-token session shared by the API client and the route guard.

use std::sync::{Mutex, RwLock};

use tracing::{debug, info};

use crate::error::Result;

/// Storage key under which the token is persisted.
pub const TOKEN_KEY: &str = "token";

/// Persistent home of the bearer token (browser storage, a file, memory).
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.lock().ok().and_then(|t| t.clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        if let Ok(mut t) = self.token.lock() {
            *t = Some(token.to_string());
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if let Ok(mut t) = self.token.lock() {
            *t = None;
        }
        Ok(())
    }
}

/// The signed-in state of the console.
///
/// Created from whatever the store holds, set by a successful sign-in and
/// cleared on logout. The token is cached so request building never touches
/// the store.
pub struct Session {
    store: Box<dyn TokenStore>,
    token: RwLock<Option<String>>,
}

impl Session {
    pub fn new(store: impl TokenStore + 'static) -> Self {
        let token = store.load().filter(|t| !t.trim().is_empty());
        debug!(restored = token.is_some(), "session created");
        Self {
            store: Box::new(store),
            token: RwLock::new(token),
        }
    }

    /// A session that persists nothing.
    pub fn in_memory() -> Self {
        Self::new(MemoryTokenStore::default())
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Value of the `Authorization` header, if signed in.
    pub fn authorization(&self) -> Option<String> {
        self.token().map(|t| format!("Bearer {t}"))
    }

    pub fn establish(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        self.store.save(&token)?;
        if let Ok(mut t) = self.token.write() {
            *t = Some(token);
        }
        info!("signed in");
        Ok(())
    }

    pub fn end(&self) -> Result<()> {
        if let Ok(mut t) = self.token.write() {
            *t = None;
        }
        self.store.clear()?;
        info!("signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Shared(Arc<MemoryTokenStore>);

    impl TokenStore for Shared {
        fn load(&self) -> Option<String> {
            self.0.load()
        }
        fn save(&self, token: &str) -> Result<()> {
            self.0.save(token)
        }
        fn clear(&self) -> Result<()> {
            self.0.clear()
        }
    }

    #[test]
    fn restores_persisted_token() {
        let session = Session::new(MemoryTokenStore::with_token("abc"));
        assert!(session.is_authenticated());
        assert_eq!(session.authorization().as_deref(), Some("Bearer abc"));
    }

    #[test]
    fn blank_token_is_not_a_session() {
        let session = Session::new(MemoryTokenStore::with_token("  "));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn lifecycle_writes_through_to_store() {
        let store = Arc::new(MemoryTokenStore::default());
        let session = Session::new(Shared(store.clone()));
        assert!(session.authorization().is_none());

        session.establish("tok").unwrap();
        assert_eq!(store.load().as_deref(), Some("tok"));

        session.end().unwrap();
        assert!(store.load().is_none());
        assert!(!session.is_authenticated());
    }
}
