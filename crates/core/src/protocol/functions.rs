use std::collections::BTreeMap;

use super::{ExtensionArg, SregRequest};
use crate::error::{AuthError, Result};

/// Characters that open an XRI global context (i-names).
const XRI_GLOBAL_CONTEXT_SYMBOLS: [char; 5] = ['=', '@', '+', '$', '!'];

/// Whether a claimed identifier is a URL or an XRI i-name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierScheme {
    Uri,
    Xri,
}

/// Classify a user-entered identifier.
pub fn identifier_scheme(identifier: &str) -> IdentifierScheme {
    let identifier = identifier.trim();
    let has_xri_prefix = identifier
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("xri://"));

    match identifier.chars().next() {
        _ if has_xri_prefix => IdentifierScheme::Xri,
        Some(c) if XRI_GLOBAL_CONTEXT_SYMBOLS.contains(&c) || c == '(' => IdentifierScheme::Xri,
        _ => IdentifierScheme::Uri,
    }
}

/// Drop everything from the first `?`, as required for return-to verification.
pub fn strip_query(url: &str) -> &str {
    match url.split_once('?') {
        Some((base, _)) => base,
        None => url,
    }
}

/// Assemble the extension arguments to attach to an auth request.
///
/// `configured` keys have the form `"<namespace>.<key>"`. The sreg shortcuts
/// are applied afterwards and win over configured keys of the same name.
pub fn build_extension_args(
    configured: &BTreeMap<String, String>,
    sreg: &SregRequest,
) -> Result<Vec<ExtensionArg>> {
    let mut args = configured.clone();

    if !sreg.optional.is_empty() {
        args.insert("sreg.optional".to_string(), sreg.optional.join(","));
    }
    if !sreg.required.is_empty() {
        args.insert("sreg.required".to_string(), sreg.required.join(","));
    }
    if let Some(policy_url) = &sreg.policy_url {
        args.insert("sreg.policy_url".to_string(), policy_url.clone());
    }

    args.into_iter()
        .map(|(name, value)| {
            let (namespace, key) = name
                .split_once('.')
                .ok_or_else(|| AuthError::InvalidExtensionKey(name.clone()))?;
            Ok(ExtensionArg {
                namespace: namespace.to_string(),
                key: key.to_string(),
                value,
            })
        })
        .collect()
}
