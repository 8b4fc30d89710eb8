//! Per-domain credential management. Every change is saved immediately and
//! followed by a broker restart.

use myqtt_fsops::MOD_AUTH_MYSQL;
use tracing::info;

use crate::context::AdminContext;
use crate::credentials::{Account, CredentialFile};
use crate::domains::DomainManager;
use crate::error::{AdminError, AdminResult};

/// Adds, updates and removes accounts in a domain's XML credential store.
#[derive(Clone, Copy)]
pub struct AccountStore<'a> {
    ctx: &'a AdminContext,
}

impl<'a> AccountStore<'a> {
    /// Store bound to `ctx`.
    #[must_use]
    pub const fn new(ctx: &'a AdminContext) -> Self {
        Self { ctx }
    }

    /// Open the credential file of `domain`, checking the backend first.
    fn open(&self, domain: &str) -> AdminResult<CredentialFile> {
        let record = DomainManager::new(self.ctx).get(domain)?;
        let path = record.users_file();
        if !path.is_file() {
            let detail = if self.ctx.modules().is_enabled(MOD_AUTH_MYSQL) {
                "the mod-auth-mysql backend is not implemented by this tool".to_string()
            } else {
                format!("no XML credential store at {}", path.display())
            };
            return Err(AdminError::BackendUnsupported {
                domain: domain.to_string(),
                detail,
            });
        }
        CredentialFile::open(&path)
    }

    fn commit(&self, store: &CredentialFile) -> AdminResult<()> {
        store.save()?;
        self.ctx.restart_broker()
    }

    /// Accounts of `domain`, as stored.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::DomainNotFound`] or [`AdminError::BackendUnsupported`].
    pub fn list(&self, domain: &str) -> AdminResult<Vec<Account>> {
        Ok(self.open(domain)?.accounts())
    }

    /// Add a credential entry.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::AccountExists`] when `client_id` is taken, plus the
    /// backend and restart failures described on [`AccountStore::list`] and
    /// [`AdminContext::restart_broker`].
    pub fn add(
        &self,
        domain: &str,
        client_id: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> AdminResult<()> {
        let mut store = self.open(domain)?;
        if !store.add(client_id, username, password) {
            return Err(AdminError::AccountExists {
                domain: domain.to_string(),
                client_id: client_id.to_string(),
            });
        }
        self.commit(&store)?;
        info!(domain, client_id, "account added");
        Ok(())
    }

    /// Overwrite the provided fields of an existing entry.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::AccountNotFound`] when `client_id` is absent.
    pub fn update(
        &self,
        domain: &str,
        client_id: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> AdminResult<()> {
        let mut store = self.open(domain)?;
        if !store.update(client_id, username, password) {
            return Err(AdminError::AccountNotFound {
                domain: domain.to_string(),
                client_id: client_id.to_string(),
            });
        }
        self.commit(&store)?;
        info!(domain, client_id, "account updated");
        Ok(())
    }

    /// Delete an entry.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::AccountNotFound`] when `client_id` is absent.
    pub fn remove(&self, domain: &str, client_id: &str) -> AdminResult<()> {
        let mut store = self.open(domain)?;
        if !store.remove(client_id) {
            return Err(AdminError::AccountNotFound {
                domain: domain.to_string(),
                client_id: client_id.to_string(),
            });
        }
        self.commit(&store)?;
        info!(domain, client_id, "account removed");
        Ok(())
    }
}
