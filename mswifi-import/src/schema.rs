//! The Windows WLAN profile schema.
//!
//! Element names, namespaces and nesting follow the WLAN profile XML grammar
//! (`http://www.microsoft.com/networking/WLAN/profile/v1` and friends). Each
//! leaf is bound to one string key of a password-database entry.

use std::sync::OnceLock;

use xml_bind_core::binding::{Field, NodeSpec, Presence, Schema, SchemaBuilder, SchemaError};

/// XML namespaces used by WLAN profiles.
pub mod ns {
    pub const WLAN_V1: &str = "http://www.microsoft.com/networking/WLAN/profile/v1";
    pub const WLAN_V2: &str = "http://www.microsoft.com/networking/WLAN/profile/v2";
    pub const WLAN_V3: &str = "http://www.microsoft.com/networking/WLAN/profile/v3";
    pub const ONEX: &str = "http://www.microsoft.com/networking/OneX/v1";
    pub const EAP_HOST_CONFIG: &str = "http://www.microsoft.com/provisioning/EapHostConfig";
    pub const EAP_COMMON: &str = "http://www.microsoft.com/provisioning/EapCommon";
    pub const BASE_EAP: &str =
        "http://www.microsoft.com/provisioning/BaseEapConnectionPropertiesV1";
    pub const PEAP_V1: &str = "http://www.microsoft.com/provisioning/MsPeapConnectionPropertiesV1";
    pub const PEAP_V2: &str = "http://www.microsoft.com/provisioning/MsPeapConnectionPropertiesV2";
    pub const PEAP_V3: &str = "http://www.microsoft.com/provisioning/MsPeapConnectionPropertiesV3";
    pub const MSCHAPV2: &str =
        "http://www.microsoft.com/provisioning/MsChapV2ConnectionPropertiesV1";
}

/// Entry string keys. The identity and key material use the database's
/// standard title and password fields.
pub mod keys {
    pub use xml_bind_core::{PASSWORD_KEY as KEY_MATERIAL, TITLE_KEY as NAME};

    pub const CONNECTION_TYPE: &str = "wifi_ConnectionType";
    pub const CONNECTION_MODE: &str = "wifi_ConnectionMode";
    pub const AUTO_SWITCH: &str = "wifi_AutoSwitch";
    pub const SSID: &str = "wifi_SSID";
    pub const SSID_HEX: &str = "wifi_SSID_Hex";
    pub const SSID_PREFIX: &str = "wifi_SSID_Prefix";
    pub const SSID_PREFIX_HEX: &str = "wifi_SSID_Prefix_Hex";
    pub const NON_BROADCAST: &str = "wifi_NonBroadcast";
    pub const MAC_RANDOMIZATION: &str = "wifi_MACRandomizationEnabled";

    pub const AUTHENTICATION: &str = "wifi_Authentication";
    pub const ENCRYPTION: &str = "wifi_Encryption";
    pub const USE_ONEX: &str = "wifi_Authenticiation_UseOneX";
    pub const FIPS_MODE: &str = "wifi_FIPSMode";
    pub const PMK_CACHE_MODE: &str = "wifi_PMK_CacheMode";
    pub const PMK_CACHE_TTL: &str = "wifi_PMK_CacheTTL";
    pub const PMK_CACHE_SIZE: &str = "wifi_PMK_CacheSize";
    pub const PRE_AUTH_MODE: &str = "wifi_PreAuthentificationMode";
    pub const PRE_AUTH_THROTTLE: &str = "wifi_PreAuthThrottle";
    pub const KEY_TYPE: &str = "wifi_SharedKey_KeyType";
    pub const KEY_PROTECTED: &str = "wifi_SharedKey_Protected";
    pub const KEY_INDEX: &str = "wifi_KeyIndex";

    pub const CACHE_USER_DATA: &str = "wifi_CacheUserData";
    pub const HELD_PERIOD: &str = "wifi_oneX_HeldPeriod";
    pub const AUTH_PERIOD: &str = "wifi_oneX_AuthPeriod";
    pub const START_PERIOD: &str = "wifi_oneX_StartPeriod";
    pub const MAX_START: &str = "wifi_oneX_MaxStart";
    pub const MAX_AUTH_FAILURES: &str = "wifi_oneX_MaxAuthFailures";
    pub const SUPPLICANT_MODE: &str = "wifi_oneX_SupplicantMode";
    pub const EAP_AUTH_MODE: &str = "wifi_EAP_AuthMode";
    pub const SSO_TYPE: &str = "wifi_SingleSignOn_Type";
    pub const SSO_MAX_DELAY: &str = "wifi_SingleSignOn_MaxDelay";
    pub const SSO_USER_VLAN: &str = "wifi_SingleSignOn_UserBasedVLan";

    pub const EAP_METHOD_TYPE: &str = "wifi_EAP_MethodeType";
    pub const EAP_VENDOR_ID: &str = "wifi_EAP_VendorID";
    pub const EAP_VENDOR_TYPE: &str = "wifi_EAP_VendorType";
    pub const EAP_AUTHOR_ID: &str = "wifi_EAP_AuthorID";
    pub const EAP_CONFIG_TYPE: &str = "wifi_EAP_ConfigType";
    pub const EAP_CONFIG_BLOB: &str = "wifi_EAP_ConfigBlob";
    pub const EAP_DISABLE_SERVER_PROMPT: &str = "wifi_EAP_DisableUserPromptServerVali";
    pub const EAP_SERVER_NAMES: &str = "wifi_EAP_ServerNames";
    pub const EAP_TRUSTED_ROOT_CA: &str = "wifi_EAP_TrustedRootCA";
    pub const EAP_FAST_RECONNECT: &str = "wifi_EAP_FastReconnect";
    pub const EAP_INNER_OPTIONAL: &str = "wifi_EAP_InnerEAPOptional";
    pub const EAP_INNER_TYPE: &str = "wifi_EAP_Config_Type";
    pub const EAP_USE_WINLOGON: &str = "wifi_EAP_UseWinlogon";
    pub const EAP_QUARANTINE_CHECKS: &str = "wifi_EAP_EnableQuarantineChecks";
    pub const EAP_REQUIRE_CRYPTO_BINDING: &str = "wifi_EAP_RequireCryptoBinding";
    pub const EAP_PERFORM_SERVER_VALIDATION: &str = "wifi_EAP_PerformServerVali";
    pub const EAP_ACCEPT_SERVER_NAME: &str = "wifi_EAP_AcceptServerName";
    pub const EAP_ALLOW_PROMPT_CA_NOT_FOUND: &str = "wifi_EAP_AllowPromptingWhenServerCAnotFound";

    pub const OUI: &str = "wifi_OuiHeaderOui";
    pub const OUI_TYPE: &str = "wifi_OuiHeaderType";
    pub const USE_MS_ONEX: &str = "wifi_useMSOneX";
}

/// Maximum SSID length, in characters, for both the text and hex forms.
pub const SSID_MAX_LEN: usize = 32;

const AUTHENTICATIONS: &[&str] = &["open", "shared", "WPA", "WPAPSK", "WPA2", "WPA2PSK"];
const ENCRYPTIONS: &[&str] = &["none", "WEP", "TKIP", "AES"];
const ENABLED_DISABLED: &[&str] = &["disabled", "enabled"];

/// The process-wide profile schema.
pub fn profile_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| match build_profile_schema() {
        Ok(schema) => schema,
        Err(err) => panic!("built-in WLAN profile schema is inconsistent: {err}"),
    })
}

/// Declare the WLAN profile tree.
pub fn build_profile_schema() -> Result<Schema, SchemaError> {
    use keys::*;

    SchemaBuilder::new("WLANProfile", "WLANProfile", Some(ns::WLAN_V1))
        .node(
            NodeSpec::new("WLANProfile")
                .field(
                    Field::text("name", NAME)
                        .length(1, usize::MAX)
                        .mandatory()
                        .unprotected(),
                )
                .field(Field::node("SSIDConfig", "SSIDConfig").mandatory())
                .field(Field::choice("connectionType", CONNECTION_TYPE, &["IBSS", "ESS"]).mandatory())
                .field(Field::choice("connectionMode", CONNECTION_MODE, &["auto", "manual"]))
                .field(Field::boolean("autoSwitch", AUTO_SWITCH))
                .field(Field::node("MSM", "MSM"))
                .field(Field::node("IHV", "IHV").exists_by(OUI))
                .field(
                    Field::node("MacRandomization", "MacRandomization")
                        .ns(ns::WLAN_V3)
                        .exists_by(MAC_RANDOMIZATION),
                ),
        )
        .node(
            NodeSpec::new("SSIDConfig")
                .field(Field::node("SSID", "SSID").mandatory())
                .field(Field::node("SSIDPrefix", "SSIDPrefix").ns(ns::WLAN_V2))
                .field(Field::boolean("nonBroadcast", NON_BROADCAST))
                .present_if(Presence::AnyKey(&[SSID_HEX, SSID])),
        )
        .node(ssid_node("SSID", SSID_HEX, SSID).present_if(Presence::AnyKey(&[SSID_HEX, SSID])))
        .node(
            ssid_node("SSIDPrefix", SSID_PREFIX_HEX, SSID_PREFIX)
                .present_if(Presence::AnyKey(&[SSID_PREFIX_HEX, SSID_PREFIX])),
        )
        .node(
            NodeSpec::new("MSM")
                .field(Field::node("security", "security").mandatory())
                .present_if(Presence::AllKeys(&[AUTHENTICATION, ENCRYPTION])),
        )
        .node(
            NodeSpec::new("security")
                .field(Field::node("authEncryption", "authEncryption").mandatory())
                .field(Field::node("sharedKey", "sharedKey").exists_by(KEY_TYPE))
                .field(Field::int("keyIndex", KEY_INDEX).range(0, 3))
                .field(Field::choice("PMKCacheMode", PMK_CACHE_MODE, ENABLED_DISABLED))
                .field(Field::int("PMKCacheTTL", PMK_CACHE_TTL).range(5, 1400))
                .field(Field::int("PMKCacheSize", PMK_CACHE_SIZE).range(1, 255))
                .field(Field::choice("preAuthMode", PRE_AUTH_MODE, ENABLED_DISABLED))
                .field(Field::int("preAuthThrottle", PRE_AUTH_THROTTLE).range(1, 16))
                .field(Field::node("OneX", "OneX").ns(ns::ONEX).exists_by(EAP_METHOD_TYPE))
                .present_if(Presence::AllKeys(&[AUTHENTICATION, ENCRYPTION])),
        )
        .node(
            NodeSpec::new("authEncryption")
                .field(Field::choice("authentication", AUTHENTICATION, AUTHENTICATIONS).mandatory())
                .field(Field::choice("encryption", ENCRYPTION, ENCRYPTIONS).mandatory())
                .field(Field::boolean("useOneX", USE_ONEX))
                .field(Field::boolean("FIPSMode", FIPS_MODE).ns(ns::WLAN_V2))
                .present_if(Presence::AllKeys(&[AUTHENTICATION, ENCRYPTION])),
        )
        .node(
            NodeSpec::new("sharedKey")
                .field(
                    Field::choice("keyType", KEY_TYPE, &["networkKey", "passPhrase"]).mandatory(),
                )
                .field(Field::boolean("protected", KEY_PROTECTED).mandatory())
                .field(Field::text("keyMaterial", KEY_MATERIAL).mandatory()),
        )
        .node(
            NodeSpec::new("OneX")
                .field(Field::boolean("cacheUserData", CACHE_USER_DATA))
                .field(Field::int("heldPeriod", HELD_PERIOD).range(1, 3600))
                .field(Field::int("authPeriod", AUTH_PERIOD).range(1, 3600))
                .field(Field::int("startPeriod", START_PERIOD).range(1, 3600))
                .field(Field::int("maxStart", MAX_START).range(1, 100))
                .field(Field::int("maxAuthFailures", MAX_AUTH_FAILURES).range(1, 100))
                .field(Field::choice(
                    "supplicantMode",
                    SUPPLICANT_MODE,
                    &["inhibitTransmission", "includeLearning", "compliant"],
                ))
                .field(Field::choice(
                    "authMode",
                    EAP_AUTH_MODE,
                    &["machineOrUser", "machine", "user", "guest"],
                ))
                .field(Field::node("singleSignOn", "singleSignOn").exists_by(SSO_TYPE))
                .field(Field::node("EAPConfig", "EAPConfig").mandatory().exists_by(EAP_METHOD_TYPE)),
        )
        .node(
            NodeSpec::new("singleSignOn")
                .field(Field::choice("type", SSO_TYPE, &["preLogon", "postLogon"]).mandatory())
                .field(Field::int("maxDelay", SSO_MAX_DELAY).range(0, 120))
                .field(Field::boolean("userBasedVirtualLan", SSO_USER_VLAN)),
        )
        .node(
            NodeSpec::new("EAPConfig").field(
                Field::node("EapHostConfig", "EapHostConfig")
                    .ns(ns::EAP_HOST_CONFIG)
                    .mandatory()
                    .exists_by(EAP_METHOD_TYPE),
            ),
        )
        .node(
            NodeSpec::new("EapHostConfig")
                .field(Field::node("EapMethod", "EapMethod").mandatory().exists_by(EAP_METHOD_TYPE))
                .field(
                    Field::node("Config", "Config")
                        .ns(ns::EAP_HOST_CONFIG)
                        .exists_by(EAP_CONFIG_TYPE),
                )
                .field(Field::text("ConfigBlob", EAP_CONFIG_BLOB).length(1, usize::MAX))
                .valid_if_any(&["Config", "ConfigBlob"]),
        )
        .node(
            NodeSpec::new("EapMethod")
                .field(Field::text("Type", EAP_METHOD_TYPE).ns(ns::EAP_COMMON).mandatory())
                .field(Field::int("VendorId", EAP_VENDOR_ID).ns(ns::EAP_COMMON).mandatory())
                .field(Field::int("VendorType", EAP_VENDOR_TYPE).ns(ns::EAP_COMMON).mandatory())
                .field(Field::int("AuthorId", EAP_AUTHOR_ID).ns(ns::EAP_COMMON)),
        )
        .node(
            NodeSpec::new("Config").field(
                Field::node("Eap", "Eap")
                    .ns(ns::BASE_EAP)
                    .mandatory()
                    .exists_by(EAP_CONFIG_TYPE),
            ),
        )
        .node(
            NodeSpec::new("Eap")
                .field(Field::text("Type", EAP_CONFIG_TYPE).mandatory())
                .field(
                    Field::node("EapType", "PeapEapType")
                        .ns(ns::PEAP_V1)
                        .mandatory()
                        .exists_by(EAP_REQUIRE_CRYPTO_BINDING),
                ),
        )
        .node(
            NodeSpec::new("PeapEapType")
                .field(
                    Field::node("ServerValidation", "ServerValidation")
                        .mandatory()
                        .exists_by(EAP_SERVER_NAMES),
                )
                .field(Field::boolean("FastReconnect", EAP_FAST_RECONNECT))
                .field(Field::boolean("InnerEapOptional", EAP_INNER_OPTIONAL))
                .field(
                    Field::node("Eap", "InnerEap")
                        .ns(ns::BASE_EAP)
                        .mandatory()
                        .exists_by(EAP_USE_WINLOGON),
                )
                .field(Field::boolean("EnableQuarantineChecks", EAP_QUARANTINE_CHECKS))
                .field(Field::boolean("RequireCryptoBinding", EAP_REQUIRE_CRYPTO_BINDING).mandatory())
                .field(
                    Field::node("PeapExtensions", "PeapExtensions")
                        .exists_by(EAP_PERFORM_SERVER_VALIDATION),
                ),
        )
        .node(
            NodeSpec::new("ServerValidation")
                .field(Field::boolean(
                    "DisableUserPromptForServerValidation",
                    EAP_DISABLE_SERVER_PROMPT,
                ))
                .field(Field::text("ServerNames", EAP_SERVER_NAMES).mandatory())
                .field(Field::text("TrustedRootCA", EAP_TRUSTED_ROOT_CA)),
        )
        .node(
            NodeSpec::new("InnerEap")
                .field(Field::text("Type", EAP_INNER_TYPE))
                .field(
                    Field::node("EapType", "MsChapV2EapType")
                        .ns(ns::MSCHAPV2)
                        .mandatory()
                        .exists_by(EAP_USE_WINLOGON),
                ),
        )
        .node(
            NodeSpec::new("MsChapV2EapType").field(
                Field::boolean("UseWinLogonCredentials", EAP_USE_WINLOGON).mandatory(),
            ),
        )
        .node(
            NodeSpec::new("PeapExtensions")
                .field(
                    Field::boolean("PerformServerValidation", EAP_PERFORM_SERVER_VALIDATION)
                        .ns(ns::PEAP_V2)
                        .mandatory(),
                )
                .field(
                    Field::boolean("AcceptServerName", EAP_ACCEPT_SERVER_NAME)
                        .ns(ns::PEAP_V2)
                        .mandatory(),
                )
                .field(
                    Field::node("PeapExtensionsV2", "PeapExtensionsV2")
                        .ns(ns::PEAP_V2)
                        .exists_by(EAP_ALLOW_PROMPT_CA_NOT_FOUND),
                ),
        )
        .node(
            NodeSpec::new("PeapExtensionsV2").field(
                Field::boolean("AllowPromptingWhenServerCANotFound", EAP_ALLOW_PROMPT_CA_NOT_FOUND)
                    .ns(ns::PEAP_V3)
                    .mandatory(),
            ),
        )
        .node(
            NodeSpec::new("IHV")
                .field(Field::node("OUIHeader", "OUIHeader").mandatory().exists_by(OUI))
                .field(Field::boolean("useMSOneX", USE_MS_ONEX)),
        )
        .node(
            NodeSpec::new("OUIHeader")
                .field(Field::text("oui", OUI).mandatory())
                .field(Field::text("type", OUI_TYPE).mandatory()),
        )
        .node(
            NodeSpec::new("MacRandomization").field(
                Field::boolean("enableRandomization", MAC_RANDOMIZATION).mandatory(),
            ),
        )
        .build()
}

/// An SSID is given as hex, as text, or both; either one suffices.
fn ssid_node(name: &'static str, hex_key: &'static str, name_key: &'static str) -> NodeSpec {
    NodeSpec::new(name)
        .field(Field::text("hex", hex_key).length(1, SSID_MAX_LEN))
        .field(Field::text("name", name_key).length(1, SSID_MAX_LEN))
        .valid_if_any(&["hex", "name"])
}
