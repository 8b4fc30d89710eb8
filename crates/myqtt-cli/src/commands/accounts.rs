//! Account operations and their comma-separated argument forms.

use myqtt_admin::{AccountStore, AdminContext};

use crate::cli::{CliError, CliResult};

/// One parsed account argument. Empty fields are treated as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AccountArg {
    pub(crate) client_id: String,
    pub(crate) username: Option<String>,
    pub(crate) password: Option<String>,
}

fn field(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn client_id(value: Option<&str>) -> CliResult<String> {
    field(value).ok_or_else(|| CliError::validation("a client id is required"))
}

fn required_password(value: Option<&str>) -> CliResult<String> {
    field(value).ok_or_else(|| CliError::validation("a password is required"))
}

/// `client_id`, `client_id,username` or `client_id,username,password`.
pub(crate) fn parse_add_account(raw: &str) -> CliResult<AccountArg> {
    let mut parts = raw.splitn(3, ',');
    Ok(AccountArg {
        client_id: client_id(parts.next())?,
        username: field(parts.next()),
        password: field(parts.next()),
    })
}

/// `client_id,password` or `client_id,username,password`. The password is mandatory.
pub(crate) fn parse_set_password(raw: &str) -> CliResult<AccountArg> {
    let parts: Vec<&str> = raw.split(',').collect();
    match parts.as_slice() {
        [id, password] => Ok(AccountArg {
            client_id: client_id(Some(id))?,
            username: None,
            password: Some(required_password(Some(password))?),
        }),
        [id, username, password] => Ok(AccountArg {
            client_id: client_id(Some(id))?,
            username: field(Some(username)),
            password: Some(required_password(Some(password))?),
        }),
        _ => Err(CliError::validation(
            "expected client_id,password or client_id,username,password",
        )),
    }
}

pub(crate) fn handle_add(ctx: &AdminContext, domain: &str, raw: &str) -> CliResult<()> {
    let account = parse_add_account(raw)?;
    AccountStore::new(ctx).add(
        domain,
        &account.client_id,
        account.username.as_deref(),
        account.password.as_deref(),
    )?;
    println!("Account '{}' added to domain '{domain}'", account.client_id);
    Ok(())
}

pub(crate) fn handle_set_password(ctx: &AdminContext, domain: &str, raw: &str) -> CliResult<()> {
    let account = parse_set_password(raw)?;
    AccountStore::new(ctx).update(
        domain,
        &account.client_id,
        account.username.as_deref(),
        account.password.as_deref(),
    )?;
    println!("Account '{}' updated in domain '{domain}'", account.client_id);
    Ok(())
}

pub(crate) fn handle_remove(ctx: &AdminContext, domain: &str, client_id: &str) -> CliResult<()> {
    let client_id = client_id.trim();
    AccountStore::new(ctx).remove(domain, client_id)?;
    println!("Account '{client_id}' removed from domain '{domain}'");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg(client_id: &str, username: Option<&str>, password: Option<&str>) -> AccountArg {
        AccountArg {
            client_id: client_id.to_string(),
            username: username.map(str::to_string),
            password: password.map(str::to_string),
        }
    }

    #[test]
    fn add_account_accepts_one_to_three_fields() {
        assert_eq!(
            parse_add_account("sensor-1").ok(),
            Some(arg("sensor-1", None, None))
        );
        assert_eq!(
            parse_add_account("alice,alice").ok(),
            Some(arg("alice", Some("alice"), None))
        );
        assert_eq!(
            parse_add_account("alice,alice,secret").ok(),
            Some(arg("alice", Some("alice"), Some("secret")))
        );
        assert_eq!(
            parse_add_account("alice,,secret").ok(),
            Some(arg("alice", None, Some("secret")))
        );
        assert_eq!(
            parse_add_account("bob,bob,pa,ss").ok(),
            Some(arg("bob", Some("bob"), Some("pa,ss")))
        );
        assert!(parse_add_account(",alice").is_err());
    }

    #[test]
    fn set_password_requires_two_or_three_fields() {
        assert_eq!(
            parse_set_password("alice,secret").ok(),
            Some(arg("alice", None, Some("secret")))
        );
        assert_eq!(
            parse_set_password("alice,bob,secret").ok(),
            Some(arg("alice", Some("bob"), Some("secret")))
        );
        assert!(parse_set_password("alice").is_err());
        assert!(parse_set_password("a,b,c,d").is_err());
        for blank in ["alice,", "alice, ", "alice,bob,", "alice,,"] {
            let err = parse_set_password(blank).expect_err("blank password");
            assert!(
                matches!(&err, CliError::Validation(message) if message.contains("password")),
                "{blank}"
            );
        }
        assert!(matches!(
            parse_set_password(" ,secret"),
            Err(CliError::Validation(_))
        ));
    }
}
