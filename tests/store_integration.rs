//! Integration tests for profile and overlay persistence
//!
//! These tests exercise the storage layer through real files on disk rather
//! than constructing the documents in memory, covering the JSON wire shapes,
//! missing-file defaults, and malformed-file reporting.

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use devprof::device::{AudioDevice, Bounds, DeviceState, DeviceType, Monitor, Profile};
use devprof::error::Error;
use devprof::store::{IgnoreList, Nicknames, Storage};

fn storage() -> (TempDir, Storage) {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let storage = Storage::at(temp.path());
    (temp, storage)
}

fn sample_profile(name: &str) -> Profile {
    Profile {
        name: name.to_string(),
        monitors: vec![Monitor {
            device_handle: "\\\\.\\DISPLAY1".to_string(),
            display_name: "Dell U2720Q".to_string(),
            is_primary: true,
            is_active: true,
            is_enabled: true,
            bounds: Bounds {
                x: 0,
                y: 0,
                width: 3840,
                height: 2160,
            },
            nickname: Some("Desk".to_string()),
        }],
        audio_devices: vec![AudioDevice {
            id: "Realtek\\Device\\Speakers\\Render".to_string(),
            name: "Speakers".to_string(),
            device_type: DeviceType::Output,
            state: DeviceState::Active,
            is_default: true,
            is_enabled: true,
            selected: true,
            nickname: None,
        }],
    }
}

#[test]
fn profiles_round_trip_through_disk() {
    let (_temp, storage) = storage();

    let profiles = vec![sample_profile("desk"), sample_profile("couch")];
    storage.save_profiles(&profiles).expect("save failed");

    let loaded = storage.load_profiles().expect("load failed");
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].name, "desk");
    assert_eq!(loaded[0].monitors[0].bounds.width, 3840);
    assert_eq!(loaded[0].monitors[0].nickname.as_deref(), Some("Desk"));
    assert!(loaded[0].audio_devices[0].is_default);
}

#[test]
fn missing_files_load_as_empty_defaults() {
    let (_temp, storage) = storage();

    assert!(storage.load_profiles().expect("profiles").is_empty());
    assert!(storage.load_ignore_list().expect("ignore").is_empty());
    let nicknames = storage.load_nicknames().expect("nicknames");
    assert!(nicknames.monitors.is_empty());
    assert!(nicknames.audio_devices.is_empty());
}

#[test]
fn malformed_document_is_a_format_error_not_a_panic() {
    let (temp, storage) = storage();

    std::fs::write(temp.path().join("profiles.json"), b"{ not json")
        .expect("write failed");

    let err = storage.load_profiles().expect_err("should fail");
    assert!(matches!(err, Error::StorageFormat(_)));
}

#[test]
fn persisted_json_uses_camel_case_wire_names() {
    let (temp, storage) = storage();

    storage
        .save_profiles(&[sample_profile("wire")])
        .expect("save failed");

    let raw = std::fs::read_to_string(temp.path().join("profiles.json")).expect("read failed");
    assert!(raw.contains("\"deviceHandle\""));
    assert!(raw.contains("\"displayName\""));
    assert!(raw.contains("\"isPrimary\""));
    assert!(raw.contains("\"audioDevices\""));
    assert!(raw.contains("\"isDefault\""));
    assert!(!raw.contains("\"device_handle\""));
}

#[test]
fn ignore_list_persists_and_enforces_membership() {
    let (_temp, storage) = storage();

    let mut list = IgnoreList::default();
    list.add("dev-1").expect("add failed");
    list.add("dev-2").expect("add failed");
    assert!(matches!(list.add("dev-1"), Err(Error::AlreadyIgnored(_))));

    storage.save_ignore_list(&list).expect("save failed");
    let mut loaded = storage.load_ignore_list().expect("load failed");
    assert_eq!(loaded.len(), 2);
    assert!(loaded.contains("dev-1"));

    loaded.remove("dev-1").expect("remove failed");
    assert!(matches!(loaded.remove("dev-1"), Err(Error::NotIgnored(_))));
}

#[test]
fn nicknames_persist_and_empty_string_removes() {
    let (_temp, storage) = storage();

    let mut nicknames = Nicknames::default();
    nicknames.set_monitor("\\\\.\\DISPLAY1", "Desk");
    nicknames.set_audio("Realtek\\Speakers", "Big speakers");
    storage.save_nicknames(&nicknames).expect("save failed");

    let mut loaded = storage.load_nicknames().expect("load failed");
    assert_eq!(loaded.monitor("\\\\.\\DISPLAY1"), Some("Desk"));
    assert_eq!(loaded.audio("Realtek\\Speakers"), Some("Big speakers"));

    loaded.set_monitor("\\\\.\\DISPLAY1", "");
    storage.save_nicknames(&loaded).expect("save failed");
    let reloaded = storage.load_nicknames().expect("load failed");
    assert_eq!(reloaded.monitor("\\\\.\\DISPLAY1"), None);
    // Other class untouched
    assert_eq!(reloaded.audio("Realtek\\Speakers"), Some("Big speakers"));
}

#[test]
fn legacy_display_blob_removal_tolerates_absence() {
    let (temp, storage) = storage();

    // Nothing on disk: not an error
    storage
        .remove_legacy_display_blob("ghost")
        .expect("missing blob should be fine");

    // A real leftover blob gets swept
    let blob = temp.path().join("desk-display.cfg");
    std::fs::write(&blob, b"legacy").expect("write failed");
    storage
        .remove_legacy_display_blob("desk")
        .expect("remove failed");
    assert!(!blob.exists());
}

#[test]
fn save_replaces_rather_than_appends() {
    let (_temp, storage) = storage();

    storage
        .save_profiles(&[sample_profile("a"), sample_profile("b")])
        .expect("save failed");
    storage
        .save_profiles(&[sample_profile("a")])
        .expect("save failed");

    let loaded = storage.load_profiles().expect("load failed");
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].name, "a");
}
