use std::path::PathBuf;

use xml_bind_core::{parse_file, parse_str};

const WLAN_V1: &str = "http://www.microsoft.com/networking/WLAN/profile/v1";
const WLAN_V3: &str = "http://www.microsoft.com/networking/WLAN/profile/v3";

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

#[test]
fn resolves_default_and_nested_namespaces() {
    let node = parse_file(&fixture("fixtures/wpa2psk-home.xml")).expect("parse should succeed");
    assert!(node.is("WLANProfile", Some(WLAN_V1)));
    assert!(node.attributes.is_empty(), "xmlns must not become an attribute");

    let ssid = node.get_child("SSIDConfig").and_then(|c| c.get_child("SSID"));
    assert!(ssid.is_some_and(|s| s.is("SSID", Some(WLAN_V1))));

    let mac = node.get_child("MacRandomization").expect("MacRandomization");
    assert!(mac.is("MacRandomization", Some(WLAN_V3)));
    let flag = mac.get_child("enableRandomization").expect("flag");
    assert_eq!(flag.namespace.as_deref(), Some(WLAN_V3));
    assert_eq!(flag.text.as_deref(), Some("false"));
}

#[test]
fn prefixed_elements_resolve_to_the_same_namespace() {
    let prefixed = parse_str(
        r#"<w:WLANProfile xmlns:w="http://www.microsoft.com/networking/WLAN/profile/v1">
             <w:name>HomeWifi</w:name>
           </w:WLANProfile>"#,
    )
    .expect("parse");
    assert!(prefixed.is("WLANProfile", Some(WLAN_V1)));
    assert_eq!(prefixed.get_text(&["name"]), Some("HomeWifi"));
}

#[test]
fn keeps_text_untrimmed_and_drops_layout_whitespace() {
    let peap = parse_file(&fixture("fixtures/peap-enterprise.xml")).expect("parse");
    let root_ca = [
        "MSM", "security", "OneX", "EAPConfig", "EapHostConfig", "Config", "Eap", "EapType",
        "ServerValidation", "TrustedRootCA",
    ];
    let text = peap.get_text(&root_ca).expect("TrustedRootCA");
    assert!(text.ends_with(' '));
    assert!(peap.get_child("MSM").is_some_and(|msm| msm.text.is_none()));
}

#[test]
fn unknown_vendor_elements_are_kept_in_the_tree() {
    let node = parse_file(&fixture("fixtures/vendor-extension.xml")).expect("parse");
    let hint = node
        .get_child("SSIDConfig")
        .and_then(|c| c.get_child("roamingHint"))
        .expect("roamingHint");
    assert!(hint.is("roamingHint", Some("urn:example:vendor")));
}

#[test]
fn malformed_xml_is_an_error() {
    assert!(parse_str("<WLANProfile><name>x</WLANProfile>").is_err());
    assert!(parse_str("").is_err());
}
