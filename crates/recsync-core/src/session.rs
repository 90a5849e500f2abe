//! Scoped registrar sessions
//!
//! A [`Session`] is opened by logging in and must be closed with
//! [`Session::close`], which logs out. Logout failures are logged and never
//! returned: the caller's own result always wins.

use crate::error::Result;
use crate::traits::{Registrar, SessionInfo};
use tracing::{debug, error, warn};

/// An open registrar session bracketing one pass or one read
pub struct Session<'r> {
    registrar: &'r dyn Registrar,
    info: SessionInfo,
    closed: bool,
}

impl<'r> Session<'r> {
    /// Log in and open a session
    ///
    /// A login failure is returned as is; nothing needs closing in that case.
    pub async fn open(registrar: &'r dyn Registrar) -> Result<Self> {
        let info = registrar.login().await?;
        debug!(
            "Logged in to {} (customer {:?}, account {:?})",
            registrar.registrar_name(),
            info.customer_id,
            info.account_id
        );
        Ok(Self {
            registrar,
            info,
            closed: false,
        })
    }

    /// The registrar this session belongs to
    pub fn registrar(&self) -> &'r dyn Registrar {
        self.registrar
    }

    /// What the registrar reported at login
    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    /// Log out, logging (not returning) any failure
    pub async fn close(mut self) {
        self.closed = true;
        if let Err(e) = self.registrar.logout().await {
            error!(
                "Error encountered while logging out of {}: {}",
                self.registrar.registrar_name(),
                e
            );
        } else {
            debug!("Logged out of {}", self.registrar.registrar_name());
        }
    }

    /// Run `body` inside the session and close it afterwards
    ///
    /// The session is closed whether `body` succeeds or fails.
    pub async fn scoped<T, F, Fut>(registrar: &'r dyn Registrar, body: F) -> Result<T>
    where
        F: FnOnce(&Session<'r>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let session = Self::open(registrar).await?;
        let result = body(&session).await;
        session.close().await;
        result
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if !self.closed {
            warn!(
                "Session with {} dropped without logout",
                self.registrar.registrar_name()
            );
        }
    }
}
