//! C4.11 Escrow Identifier Scheme: human-readable internal identifiers with
//! a derived, content-hashed on-chain identifier (spec §4.11).
//!
//! Two shapes:
//! - Policy escrow: `INS-{PROVIDER_SHORT(8)}-{POLICY_SHORT(12)}-{MILLIS}-{RAND(6)}-{CHECKSUM(4)}`
//! - User escrow:   `USR-{USER_SHORT(8)}-{PURPOSE(<=12)}-{MILLIS}-{RAND(6)}-{CHECKSUM(4)}`

use rand::Rng;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::{CoreError, Result};

const CHECKSUM_SALT: &str = "aegis-escrow-checksum-v1";
const RAND_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const KNOWN_PREFIXES: &[&str] = &["INS-", "USR-", "POL-"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPolicyEscrowId {
    pub provider_short: String,
    pub policy_short: String,
    pub millis: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUserEscrowId {
    pub user_short: String,
    pub purpose: String,
    pub millis: i64,
}

pub fn generate_policy_escrow_id(provider_name: &str, policy_id: Uuid) -> String {
    let provider_short = short_id(provider_name, 8);
    let policy_short = short_id(&policy_id.simple().to_string(), 12);
    let millis = chrono::Utc::now().timestamp_millis();
    let rand_suffix = random_suffix(6);
    let checksum = checksum(&[
        provider_short.as_str(),
        policy_short.as_str(),
        &millis.to_string(),
        rand_suffix.as_str(),
    ]);
    format!("INS-{provider_short}-{policy_short}-{millis}-{rand_suffix}-{checksum}")
}

pub fn generate_user_escrow_id(user_id: &str, purpose: &str) -> String {
    let user_short = short_id(user_id, 8);
    let purpose_clean = clean_upper_truncated(purpose, 12);
    let millis = chrono::Utc::now().timestamp_millis();
    let rand_suffix = random_suffix(6);
    let checksum = checksum(&[
        user_short.as_str(),
        purpose_clean.as_str(),
        &millis.to_string(),
        rand_suffix.as_str(),
    ]);
    format!("USR-{user_short}-{purpose_clean}-{millis}-{rand_suffix}-{checksum}")
}

/// Parse and checksum-verify a policy escrow identifier. Per spec §9 open
/// questions, the decoded `provider_short`/`policy_short` are short-form,
/// lossy representations, not round-trippable to the original values.
pub fn parse_policy_escrow_id(id: &str) -> Result<ParsedPolicyEscrowId> {
    let parts: Vec<&str> = id.split('-').collect();
    let [prefix, provider_short, policy_short, millis, rand_suffix, checksum_field] = parts.as_slice() else {
        return Err(CoreError::InvalidIdentifier(format!("malformed policy escrow id: {id}")));
    };
    if *prefix != "INS" {
        return Err(CoreError::InvalidIdentifier(format!("unexpected prefix in {id}")));
    }
    verify_checksum(&[provider_short, policy_short, millis, rand_suffix], checksum_field, id)?;
    let millis = millis
        .parse()
        .map_err(|_| CoreError::InvalidIdentifier(format!("non-numeric millis field in {id}")))?;
    Ok(ParsedPolicyEscrowId {
        provider_short: provider_short.to_string(),
        policy_short: policy_short.to_string(),
        millis,
    })
}

/// Parse and checksum-verify a user escrow identifier. Lossy by design: the
/// decoded `userId` is a non-unique short-form search key, not the true ID
/// (spec §9 open questions).
pub fn parse_user_escrow_id(id: &str) -> Result<ParsedUserEscrowId> {
    let parts: Vec<&str> = id.split('-').collect();
    let [prefix, user_short, purpose, millis, rand_suffix, checksum_field] = parts.as_slice() else {
        return Err(CoreError::InvalidIdentifier(format!("malformed user escrow id: {id}")));
    };
    if *prefix != "USR" {
        return Err(CoreError::InvalidIdentifier(format!("unexpected prefix in {id}")));
    }
    verify_checksum(&[user_short, purpose, millis, rand_suffix], checksum_field, id)?;
    let millis = millis
        .parse()
        .map_err(|_| CoreError::InvalidIdentifier(format!("non-numeric millis field in {id}")))?;
    Ok(ParsedUserEscrowId {
        user_short: user_short.to_string(),
        purpose: purpose.to_string(),
        millis,
    })
}

/// Derive the on-chain identifier: the hash of the full internal identifier,
/// so internal IDs stay human-auditable while on-chain IDs are uniform.
pub fn derive_blockchain_id(internal_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(internal_id.as_bytes());
    format!("0x{:x}", hasher.finalize())
}

fn verify_checksum(fields: &[&str], expected: &str, id: &str) -> Result<()> {
    let computed = checksum(fields);
    if computed.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(CoreError::InvalidIdentifier(format!("checksum mismatch for {id}")))
    }
}

fn checksum(fields: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(CHECKSUM_SALT.as_bytes());
    for field in fields {
        hasher.update(b"|");
        hasher.update(field.as_bytes());
    }
    let digest = hasher.finalize();
    format!("{:x}", digest)[..4].to_uppercase()
}

fn short_id(source: &str, width: usize) -> String {
    let cleaned = clean_upper(strip_known_prefix(source));
    if cleaned.len() >= width {
        cleaned[..width].to_string()
    } else {
        format!("{cleaned:0<width$}")
    }
}

fn clean_upper_truncated(source: &str, max_width: usize) -> String {
    let cleaned = clean_upper(strip_known_prefix(source));
    cleaned.chars().take(max_width).collect()
}

fn strip_known_prefix(source: &str) -> &str {
    for prefix in KNOWN_PREFIXES {
        if let Some(stripped) = source.strip_prefix(prefix) {
            return stripped;
        }
    }
    source
}

fn clean_upper(source: &str) -> String {
    source
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| RAND_ALPHABET[rng.gen_range(0..RAND_ALPHABET.len())] as char)
        .collect()
}
