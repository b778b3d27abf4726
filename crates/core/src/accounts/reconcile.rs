use super::AccountId;

/// What to do with a freshly verified identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// The current user already owns this OpenID.
    AlreadyLinked,
    /// A user is logged in but the OpenID belongs to someone else (or nobody):
    /// offer to link it to the current account.
    OfferAssociation,
    /// Exactly one account matches: log in as it.
    LogInAs(AccountId),
    /// Several accounts match: let the user choose.
    OfferAccountPicker(Vec<AccountId>),
    /// No account matches: offer registration.
    OfferRegistration,
}

/// Remove duplicate account IDs, keeping first occurrences in order.
pub fn dedupe_accounts(matches: &[AccountId]) -> Vec<AccountId> {
    let mut unique = Vec::with_capacity(matches.len());
    for id in matches {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }
    unique
}

/// Decide the login outcome from the current session account and the
/// accounts linked to the verified identity.
pub fn reconcile(current: Option<AccountId>, matches: &[AccountId]) -> Reconciliation {
    let matches = dedupe_accounts(matches);

    if let Some(current) = current {
        return if matches.contains(&current) {
            Reconciliation::AlreadyLinked
        } else {
            Reconciliation::OfferAssociation
        };
    }

    match matches.as_slice() {
        [] => Reconciliation::OfferRegistration,
        [only] => Reconciliation::LogInAs(*only),
        _ => Reconciliation::OfferAccountPicker(matches),
    }
}
