#![allow(dead_code)]
use eflk::{Container, GroupContents, Header, ParameterRecord, TriggerRecord};

use std::path::{Path, PathBuf};
use std::sync::Once;

static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .is_test(true)
            .init();
    });
}

/// Absolute position of the first header body in a container with a single header.
pub const SINGLE_HEADER_BODY: usize = 32;
pub const HEADER_PROLOGUE: usize = 28;
pub const PARAMETER_WITH_CALLBACKS: usize = 104 + 16;
pub const RESOURCE_GROUP_ENTRY: usize = 20;

pub fn parameter(index: u32, name: &str) -> ParameterRecord {
    ParameterRecord {
        index,
        name: name.to_owned(),
        collision_attribute: "none".to_owned(),
        collision_state: "none".to_owned(),
        map_name: "stage01".to_owned(),
        bone_name: "Root".to_owned(),
        camera_param_name: String::new(),
        scale: 1.0,
        position: [0.0, 1.5, 0.0],
        rotation: [0.0, 90.0, 0.0],
        color: [1.0, 0.5, 0.25, 1.0],
        ..ParameterRecord::default()
    }
}

pub fn trigger(index: u32, resource_name: &str, delay: u32) -> TriggerRecord {
    TriggerRecord {
        index,
        resource_name: resource_name.to_owned(),
        bone_name: "Root".to_owned(),
        delay,
        emission_rate: 1.0,
        offset: [0.0, 0.0, 0.5],
        ..TriggerRecord::default()
    }
}

pub fn resource_group(
    key: &str,
    name: &str,
    records: Vec<ParameterRecord>,
) -> GroupContents<ParameterRecord> {
    GroupContents {
        key: key.to_owned(),
        name: name.to_owned(),
        records,
    }
}

pub fn action_group(
    key: &str,
    name: &str,
    records: Vec<TriggerRecord>,
) -> GroupContents<TriggerRecord> {
    GroupContents {
        key: key.to_owned(),
        name: name.to_owned(),
        records,
    }
}

/// Two resource groups over three parameters, one action group over two triggers.
pub fn sample_header(name: &str) -> Header {
    let (header, collisions) = Header::from_groups(
        name,
        vec![
            resource_group(
                "Resource0",
                "trail",
                vec![parameter(0, "trail_a"), parameter(1, "trail_b")],
            ),
            resource_group("Resource1", "spark", vec![parameter(2, "spark")]),
        ],
        vec![action_group(
            "Action0",
            "swing",
            vec![trigger(0, "trail", 0), trigger(1, "spark", 6)],
        )],
    );
    assert!(collisions.is_empty());
    header
}

pub fn sample_container() -> Container {
    let mut container = Container::new(1);
    container.insert_header(sample_header("slash"));
    container.insert_header(sample_header("斬撃"));
    container
}

/// One header `fx` with a single resource group owning `count` parameters.
pub fn single_group_container(count: u32) -> Container {
    let records = (0..count).map(|i| parameter(i, &format!("p{}", i))).collect();
    let (header, _) = Header::from_groups(
        "fx",
        vec![resource_group("Resource0", "all", records)],
        vec![],
    );

    let mut container = Container::new(1);
    container.insert_header(header);
    container
}

/// Absolute position of the `start` field of resource group `group`, for a container with a
/// single header holding `parameter_count` parameters.
pub fn resource_group_start(parameter_count: usize, group: usize) -> usize {
    SINGLE_HEADER_BODY
        + HEADER_PROLOGUE
        + parameter_count * PARAMETER_WITH_CALLBACKS
        + group * RESOURCE_GROUP_ENTRY
        + 16
}

pub fn patch_u16(bytes: &mut [u8], position: usize, value: u16) {
    bytes[position..position + 2].copy_from_slice(&value.to_be_bytes());
}

pub fn patch_u32(bytes: &mut [u8], position: usize, value: u32) {
    bytes[position..position + 4].copy_from_slice(&value.to_be_bytes());
}

pub fn read_u32(bytes: &[u8], position: usize) -> u32 {
    u32::from_be_bytes([
        bytes[position],
        bytes[position + 1],
        bytes[position + 2],
        bytes[position + 3],
    ])
}

pub fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    haystack
        .windows(needle.len())
        .filter(|window| *window == needle)
        .count()
}

pub fn write_sample(dir: &Path, file_name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, bytes).unwrap();
    path
}
