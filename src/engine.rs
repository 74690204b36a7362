//! Engine: the external wallet library, seen only through these traits.
//!
//! Workflow entry points must return promptly. The engine reports on the
//! supplied [`WorkflowCallback`] later, from any thread it likes, and
//! may call it zero or more times before one terminal call. An `Err`
//! from an entry point means the workflow never started; the bridge turns
//! it into an interruption.
//!
//! ```text
//! Bridge::add_session(..)
//!     │ validate
//!     ▼
//! WalletEngine::add_session(.., callback) ── returns immediately
//!                                    │
//!            engine thread ──────────┘
//!                 ├── callback.on_acknowledged(..)
//!                 ├── callback.on_progress(..)*
//!                 └── callback.on_complete(..) | callback.on_error(..)
//! ```

use crate::callback::WorkflowCallback;
use anyhow::Result;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

pub const MIN_PIN_LENGTH: usize = 6;
pub const MIN_SALT_LENGTH: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("user id is empty")]
    MissingUserId,
    #[error("pin shorter than {} characters", MIN_PIN_LENGTH)]
    PinTooShort,
    #[error("salt shorter than {} characters", MIN_SALT_LENGTH)]
    SaltTooShort,
    #[error("mnemonic phrase is blank")]
    BlankMnemonics,
}

/// User secret: pin combined with an application salt. Wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Passphrase {
    #[zeroize(skip)]
    user_id: String,
    pin: String,
    salt: String,
}

impl Passphrase {
    pub fn new(user_id: &str, pin: &str, salt: &str) -> Result<Self, CredentialError> {
        if user_id.trim().is_empty() {
            return Err(CredentialError::MissingUserId);
        }
        if pin.chars().count() < MIN_PIN_LENGTH {
            return Err(CredentialError::PinTooShort);
        }
        if salt.chars().count() < MIN_SALT_LENGTH {
            return Err(CredentialError::SaltTooShort);
        }
        Ok(Self { user_id: user_id.to_string(), pin: pin.to_string(), salt: salt.to_string() })
    }

    pub fn user_id(&self) -> &str { &self.user_id }

    /// Salt followed by pin, as the engine's key derivation expects
    pub fn secret(&self) -> Zeroizing<Vec<u8>> {
        let mut bytes = Vec::with_capacity(self.salt.len() + self.pin.len());
        bytes.extend_from_slice(self.salt.as_bytes());
        bytes.extend_from_slice(self.pin.as_bytes());
        Zeroizing::new(bytes)
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Passphrase").field("user_id", &self.user_id).finish_non_exhaustive()
    }
}

/// Recovery phrase bytes. Wiped on drop.
pub struct Mnemonics(Zeroizing<Vec<u8>>);

impl Mnemonics {
    pub fn new(phrase: &str) -> Result<Self, CredentialError> {
        if phrase.trim().is_empty() {
            return Err(CredentialError::BlankMnemonics);
        }
        Ok(Self(Zeroizing::new(phrase.as_bytes().to_vec())))
    }

    pub fn as_bytes(&self) -> &[u8] { &self.0 }
}

impl fmt::Debug for Mnemonics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Mnemonics(..)")
    }
}

/// A validated transfer request
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRequest {
    pub user_id: String,
    pub token_holder_addresses: Vec<String>,
    pub amounts: Vec<String>,
    pub rule_name: String,
    pub meta: Map<String, Value>,
    pub options: Map<String, Value>,
}

/// Direct workflows and synchronous lookups
pub trait WalletEngine: Send + Sync {
    fn initialize(&self, base_url: &str, config: Value) -> Result<()>;

    // Lookups: Ok(None) when there is no record
    fn get_user(&self, user_id: &str) -> Result<Option<Value>>;
    fn get_token(&self, token_id: &str) -> Result<Option<Value>>;
    fn get_current_device(&self, user_id: &str) -> Result<Option<Value>>;
    fn get_active_sessions(&self, user_id: &str, min_spending_limit: &str) -> Result<Vec<Value>>;
    fn is_biometric_enabled(&self, user_id: &str) -> bool;
    /// PNG bytes
    fn add_device_qr_code(&self, user_id: &str) -> Result<Vec<u8>>;

    // Workflows
    fn setup_device(&self, user_id: &str, token_id: &str, callback: Arc<dyn WorkflowCallback>) -> Result<()>;
    fn activate_user(
        &self,
        passphrase: Passphrase,
        expires_after_secs: u64,
        spending_limit: &str,
        callback: Arc<dyn WorkflowCallback>,
    ) -> Result<()>;
    fn add_session(
        &self,
        user_id: &str,
        spending_limit: &str,
        expires_after_secs: u64,
        callback: Arc<dyn WorkflowCallback>,
    ) -> Result<()>;
    fn execute_transaction(&self, request: TransactionRequest, callback: Arc<dyn WorkflowCallback>) -> Result<()>;
    fn get_device_mnemonics(&self, user_id: &str, callback: Arc<dyn WorkflowCallback>) -> Result<()>;
    fn authorize_current_device_with_mnemonics(
        &self,
        user_id: &str,
        mnemonics: Mnemonics,
        callback: Arc<dyn WorkflowCallback>,
    ) -> Result<()>;
    fn perform_qr_action(&self, user_id: &str, payload: Value, callback: Arc<dyn WorkflowCallback>) -> Result<()>;
    fn reset_pin(
        &self,
        user_id: &str,
        current: Passphrase,
        new: Passphrase,
        callback: Arc<dyn WorkflowCallback>,
    ) -> Result<()>;
    fn revoke_device(&self, user_id: &str, device_address: &str, callback: Arc<dyn WorkflowCallback>) -> Result<()>;
    fn initiate_device_recovery(
        &self,
        user_id: &str,
        passphrase: Passphrase,
        device_address: &str,
        callback: Arc<dyn WorkflowCallback>,
    ) -> Result<()>;
    fn abort_device_recovery(&self, user_id: &str, passphrase: Passphrase, callback: Arc<dyn WorkflowCallback>) -> Result<()>;
    fn update_biometric_preference(&self, user_id: &str, enabled: bool, callback: Arc<dyn WorkflowCallback>) -> Result<()>;
    fn logout_all_sessions(&self, user_id: &str, callback: Arc<dyn WorkflowCallback>) -> Result<()>;
}

/// Workflows that drive their own screens (pin entry, QR scanning).
/// Their events are also published to registry subscribers.
pub trait InteractiveEngine: Send + Sync {
    fn activate_user(
        &self,
        user_id: &str,
        expires_after_secs: u64,
        spending_limit: &str,
        callback: Arc<dyn WorkflowCallback>,
    ) -> Result<()>;
    fn add_session(
        &self,
        user_id: &str,
        expires_after_secs: u64,
        spending_limit: &str,
        callback: Arc<dyn WorkflowCallback>,
    ) -> Result<()>;
    fn reset_pin(&self, user_id: &str, callback: Arc<dyn WorkflowCallback>) -> Result<()>;
    fn revoke_device(&self, user_id: &str, device_address: Option<&str>, callback: Arc<dyn WorkflowCallback>) -> Result<()>;
    fn initiate_device_recovery(
        &self,
        user_id: &str,
        device_address: Option<&str>,
        callback: Arc<dyn WorkflowCallback>,
    ) -> Result<()>;
    fn abort_device_recovery(&self, user_id: &str, callback: Arc<dyn WorkflowCallback>) -> Result<()>;
    fn update_biometric_preference(&self, user_id: &str, enabled: bool, callback: Arc<dyn WorkflowCallback>) -> Result<()>;
    fn get_device_mnemonics(&self, user_id: &str, callback: Arc<dyn WorkflowCallback>) -> Result<()>;
    fn authorize_current_device_with_mnemonics(&self, user_id: &str, callback: Arc<dyn WorkflowCallback>) -> Result<()>;
    fn show_device_qr(&self, user_id: &str, callback: Arc<dyn WorkflowCallback>) -> Result<()>;
    fn authorize_device_with_qr(&self, user_id: &str, callback: Arc<dyn WorkflowCallback>) -> Result<()>;
    fn execute_transaction_via_qr(&self, user_id: &str, callback: Arc<dyn WorkflowCallback>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: &str = "6e2c1b1a9d8f7e6d5c4b3a2918273645";

    #[test]
    fn test_passphrase_rules() {
        assert!(Passphrase::new("u-1", "123456", SALT).is_ok());
        assert_eq!(Passphrase::new(" ", "123456", SALT).unwrap_err(), CredentialError::MissingUserId);
        assert_eq!(Passphrase::new("u-1", "12345", SALT).unwrap_err(), CredentialError::PinTooShort);
        assert_eq!(Passphrase::new("u-1", "123456", "short").unwrap_err(), CredentialError::SaltTooShort);
    }

    #[test]
    fn test_passphrase_secret_and_redaction() {
        let passphrase = Passphrase::new("u-1", "654321", SALT).unwrap();
        let secret = passphrase.secret();
        assert!(secret.starts_with(SALT.as_bytes()));
        assert!(secret.ends_with(b"654321"));
        let debug = format!("{:?}", passphrase);
        assert!(debug.contains("u-1"));
        assert!(!debug.contains("654321"));
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(Mnemonics::new("   ").unwrap_err(), CredentialError::BlankMnemonics);
        let m = Mnemonics::new("abandon ability able").unwrap();
        assert_eq!(m.as_bytes(), b"abandon ability able");
        assert_eq!(format!("{:?}", m), "Mnemonics(..)");
    }
}
