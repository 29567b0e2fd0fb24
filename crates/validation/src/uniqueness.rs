//! Account name/email uniqueness.
//!
//! Runs before structural validation: a taken name or email is reported on
//! its own as a conflict, without field details.

use recipebook_core::{AccountStore, UserId};

use crate::UniquenessError;

/// Check `name`, then `email`, against existing accounts. Lookups are
/// case-insensitive and operate on the trimmed values; blank candidates are
/// skipped. `except` excludes the caller's own account (profile edits).
pub async fn ensure_unique<S>(
    store: &S,
    name: Option<&str>,
    email: Option<&str>,
    except: Option<UserId>,
) -> Result<(), UniquenessError>
where
    S: AccountStore + ?Sized,
{
    let is_other = |id: UserId| except != Some(id);

    if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
        if store
            .find_account_by_name(name)
            .await?
            .is_some_and(|account| is_other(account.id))
        {
            return Err(UniquenessError::NameTaken);
        }
    }

    if let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) {
        if store
            .find_account_by_email(email)
            .await?
            .is_some_and(|account| is_other(account.id))
        {
            return Err(UniquenessError::EmailTaken);
        }
    }

    Ok(())
}
