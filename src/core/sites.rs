//! Origin-site labels
//!
//! Every entry operation has an origin label, and every local failure
//! point a numbered site label. They land in `ErrorPayload.internal_reason`
//! for diagnostics only; nothing branches on them.

/// Direct (single-consumer) entry operations
pub mod sdk {
    pub const INITIALIZE: &str = "wb_sdk_initialize";
    pub const GET_USER: &str = "wb_sdk_get_user";
    pub const GET_TOKEN: &str = "wb_sdk_get_token";
    pub const GET_CURRENT_DEVICE: &str = "wb_sdk_get_current_device";
    pub const GET_ACTIVE_SESSIONS: &str = "wb_sdk_get_active_sessions";
    pub const GET_ADD_DEVICE_QR_CODE: &str = "wb_sdk_get_add_device_qr_code";
    pub const IS_BIOMETRIC_ENABLED: &str = "wb_sdk_is_biometric_enabled";

    pub const SETUP_DEVICE: &str = "wb_sdk_setup_device";
    pub const ACTIVATE_USER: &str = "wb_sdk_activate_user";
    pub const ADD_SESSION: &str = "wb_sdk_add_session";
    pub const EXECUTE_TRANSACTION: &str = "wb_sdk_execute_transaction";
    pub const GET_DEVICE_MNEMONICS: &str = "wb_sdk_get_device_mnemonics";
    pub const AUTHORIZE_WITH_MNEMONICS: &str = "wb_sdk_authorize_with_mnemonics";
    pub const PERFORM_QR_ACTION: &str = "wb_sdk_perform_qr_action";
    pub const RESET_PIN: &str = "wb_sdk_reset_pin";
    pub const REVOKE_DEVICE: &str = "wb_sdk_revoke_device";
    pub const INITIATE_DEVICE_RECOVERY: &str = "wb_sdk_initiate_device_recovery";
    pub const ABORT_DEVICE_RECOVERY: &str = "wb_sdk_abort_device_recovery";
    pub const UPDATE_BIOMETRIC_PREFERENCE: &str = "wb_sdk_update_biometric_preference";
    pub const LOGOUT_ALL_SESSIONS: &str = "wb_sdk_logout_all_sessions";

    pub const ACTIVATE_USER_PASSPHRASE: &str = "wb_sdk_au_1";
    pub const ACTIVATE_USER_EXPIRY: &str = "wb_sdk_au_2";
    pub const ADD_SESSION_EXPIRY: &str = "wb_sdk_as_1";
    pub const EXECUTE_TRANSACTION_ADDRESSES: &str = "wb_sdk_et_1";
    pub const EXECUTE_TRANSACTION_AMOUNTS: &str = "wb_sdk_et_2";
    pub const EXECUTE_TRANSACTION_META: &str = "wb_sdk_et_3";
    pub const EXECUTE_TRANSACTION_OPTIONS: &str = "wb_sdk_et_4";
    pub const AUTHORIZE_WITH_MNEMONICS_PHRASE: &str = "wb_sdk_acdwm_1";
    pub const PERFORM_QR_ACTION_PAYLOAD: &str = "wb_sdk_pqra_1";
    pub const RESET_PIN_CURRENT: &str = "wb_sdk_rp_1";
    pub const RESET_PIN_NEW: &str = "wb_sdk_rp_2";
    pub const INITIATE_DEVICE_RECOVERY_PASSPHRASE: &str = "wb_sdk_idr_1";
    pub const ABORT_DEVICE_RECOVERY_PASSPHRASE: &str = "wb_sdk_adr_1";
    pub const USER_ID: &str = "wb_sdk_uid_1";
}

/// Interactive (fan-out) entry operations
pub mod ui {
    pub const ACTIVATE_USER: &str = "wb_ui_activate_user";
    pub const ADD_SESSION: &str = "wb_ui_add_session";
    pub const RESET_PIN: &str = "wb_ui_reset_pin";
    pub const REVOKE_DEVICE: &str = "wb_ui_revoke_device";
    pub const INITIATE_DEVICE_RECOVERY: &str = "wb_ui_initiate_device_recovery";
    pub const ABORT_DEVICE_RECOVERY: &str = "wb_ui_abort_device_recovery";
    pub const UPDATE_BIOMETRIC_PREFERENCE: &str = "wb_ui_update_biometric_preference";
    pub const GET_DEVICE_MNEMONICS: &str = "wb_ui_get_device_mnemonics";
    pub const AUTHORIZE_WITH_MNEMONICS: &str = "wb_ui_authorize_with_mnemonics";
    pub const SHOW_DEVICE_QR: &str = "wb_ui_show_device_qr";
    pub const AUTHORIZE_WITH_QR: &str = "wb_ui_authorize_with_qr";
    pub const EXECUTE_TRANSACTION_VIA_QR: &str = "wb_ui_execute_transaction_via_qr";

    pub const ACTIVATE_USER_EXPIRY: &str = "wb_ui_au_1";
    pub const ADD_SESSION_EXPIRY: &str = "wb_ui_as_1";
    pub const USER_ID: &str = "wb_ui_uid_1";
}

/// Callback adapter internals
pub mod callback {
    pub const ENCODE_PAYLOAD: &str = "wb_cb_encode_1";
}
