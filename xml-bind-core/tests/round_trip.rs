use std::path::PathBuf;

use xml_bind_core::{parse, parse_file, write, write_file};

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

#[test]
fn parse_write_parse_round_trip_preserves_tree_shape() {
    for name in ["wpa2psk-home.xml", "peap-enterprise.xml", "vendor-extension.xml"] {
        let first = parse_file(&fixture(&format!("fixtures/{name}"))).expect("initial parse");

        let written = write(&first).expect("write should succeed");
        let second = parse(&written).expect("re-parse should succeed");

        assert_eq!(first, second, "{name}");
    }
}

#[test]
fn namespace_declared_only_where_it_changes() {
    let node = parse_file(&fixture("fixtures/wpa2psk-home.xml")).expect("parse");
    let written = String::from_utf8(write(&node).expect("write")).expect("utf8");

    assert_eq!(written.matches("xmlns=").count(), 2);
    assert!(written.contains(
        r#"<MacRandomization xmlns="http://www.microsoft.com/networking/WLAN/profile/v3">"#
    ));
}

#[test]
fn parse_and_write_file_round_trip() {
    let node = parse_file(&fixture("fixtures/open-guest.xml")).expect("parse should succeed");
    let out_dir = tempfile::tempdir().expect("tempdir should be created");
    let out_path = out_dir.path().join("roundtrip.xml");

    write_file(&node, &out_path).expect("write_file should succeed");
    let on_disk = std::fs::read_to_string(&out_path).expect("read back");
    assert!(on_disk.starts_with("<?xml version=\"1.0\"?>"));

    let reparsed = parse_file(&out_path).expect("parse_file should succeed");
    assert_eq!(node, reparsed);
}
