// Unit tests for compile database sanitizing and merging

use std::fs;
use tempfile::tempdir;
use tidyscan_rs::compile_db::{
    load_database, merge_databases, write_database, ArgumentWhitelist, CompileCommandEntry,
    Sanitizer, DEFAULT_EXTRA_INCLUDE,
};

const FIRMWARE_DIR: &str = "/home/dev/robot-software/can-io-firmware";

fn entry(arguments: &[&str], directory: &str, file: &str) -> CompileCommandEntry {
    CompileCommandEntry {
        arguments: arguments.iter().map(|a| a.to_string()).collect(),
        directory: directory.to_string(),
        file: file.to_string(),
    }
}

fn object_entry(directory: &str, file: &str) -> CompileCommandEntry {
    entry(
        &["arm-none-eabi-gcc", "-o", "build/obj/hal.o", file],
        directory,
        file,
    )
}

#[test]
fn test_sanitize_firmware_entry() {
    let hal = "../lib/ChibiOS/os/hal/src/hal.c";
    let initial = entry(
        &[
            "arm-none-eabi-gcc",
            "-c",
            "-mcpu=cortex-m4",
            "-Os",
            "-ggdb",
            "-fomit-frame-pointer",
            "-falign-functions=16",
            "-fno-common",
            "-ffunction-sections",
            "-fdata-sections",
            "-fno-common",
            "-Wall",
            "-Wextra",
            "-Wundef",
            "-Wstrict-prototypes",
            "-Wa,-alms=build/lst/hal.lst",
            "-DUAVCAN_TOSTRING=0",
            "-DUAVCAN_STM32_NUM_IFACES=1",
            "-DCVRA_NO_DYNAMIC_ALLOCATION=1",
            "-DTHUMB_PRESENT",
            "-mno-thumb-interwork",
            "-DTHUMB_NO_INTERWORKING",
            "-mthumb",
            "-DTHUMB",
            "-I.",
            "-I../lib/ChibiOS/os/common/portability/GCC",
            "-I../lib/ChibiOS/os/common/startup/ARMCMx/compilers/GCC",
            "-I../lib/ChibiOS/os/common/startup/ARMCMx/devices/STM32F3xx",
            "-Idsdlc_generated",
            "-o",
            "build/obj/hal.o",
            hal,
        ],
        FIRMWARE_DIR,
        hal,
    );
    let want = entry(
        &[
            "arm-none-eabi-gcc",
            "-c",
            "-Wall",
            "-Wextra",
            "-Wundef",
            "-Wstrict-prototypes",
            "-Wa,-alms=build/lst/hal.lst",
            "-DUAVCAN_TOSTRING=0",
            "-DUAVCAN_STM32_NUM_IFACES=1",
            "-DCVRA_NO_DYNAMIC_ALLOCATION=1",
            "-DTHUMB_PRESENT",
            "-DTHUMB_NO_INTERWORKING",
            "-DTHUMB",
            "-I.",
            "-I../lib/ChibiOS/os/common/portability/GCC",
            "-I../lib/ChibiOS/os/common/startup/ARMCMx/compilers/GCC",
            "-I../lib/ChibiOS/os/common/startup/ARMCMx/devices/STM32F3xx",
            "-Idsdlc_generated",
            "-o",
            "build/obj/hal.o",
            hal,
            DEFAULT_EXTRA_INCLUDE,
        ],
        FIRMWARE_DIR,
        hal,
    );

    let got = Sanitizer::default().sanitize(&[initial]);
    assert_eq!(got, vec![want]);
}

#[test]
fn test_sanitize_with_custom_whitelist() {
    let whitelist = ArgumentWhitelist::new(&["-c", "-D.*"]).unwrap();
    let sanitizer = Sanitizer::new(whitelist, "-I/opt/include");
    let initial = entry(&["gcc", "-c", "-O2", "-DX=1", "foo.c"], "/src", "foo.c");

    let got = sanitizer.sanitize_entry(&initial);

    assert_eq!(
        got.arguments,
        vec!["gcc", "-c", "-DX=1", "foo.c", "-I/opt/include"]
    );
    assert_eq!(got.directory, "/src");
    assert_eq!(got.file, "foo.c");
}

#[test]
fn test_compiler_name_is_kept_even_if_not_whitelisted() {
    let whitelist = ArgumentWhitelist::new(&["-c"]).unwrap();
    let sanitizer = Sanitizer::new(whitelist, "-I/x");
    let got = sanitizer.sanitize_entry(&entry(&["-c", "-c", "a.c"], "/src", "a.c"));
    assert_eq!(got.arguments[0], "-c");

    let got = sanitizer.sanitize_entry(&entry(&["clang++", "-O3", "a.cpp"], "/src", "a.cpp"));
    assert_eq!(got.arguments[0], "clang++");
    assert!(got.arguments.contains(&"a.cpp".to_string()));
    assert!(!got.arguments.contains(&"-O3".to_string()));
}

#[test]
fn test_sanitizing_twice_appends_extra_include_again() {
    let sanitizer = Sanitizer::default();
    let initial = entry(&["gcc", "-c", "-O2", "-DX=1", "foo.c"], "/src", "foo.c");

    let once = sanitizer.sanitize_entry(&initial);
    let twice = sanitizer.sanitize_entry(&once);

    // Filtering is stable; only the trailing include is repeated.
    assert_eq!(&twice.arguments[..once.arguments.len()], &once.arguments[..]);
    assert_eq!(twice.arguments.len(), once.arguments.len() + 1);
    assert_eq!(twice.arguments.last().unwrap(), DEFAULT_EXTRA_INCLUDE);
}

#[test]
fn test_merge_compile_db() {
    let db1 = vec![
        object_entry(FIRMWARE_DIR, "../lib/ChibiOS/os/hal/src/hal.c"),
        object_entry(FIRMWARE_DIR, "../lib/ChibiOS/os/hal/src/file2.c"),
    ];
    // First file is the same one reached from another directory; second is new.
    let db2 = vec![
        object_entry(
            &format!("{}/tests", FIRMWARE_DIR),
            "../../lib/ChibiOS/os/hal/src/hal.c",
        ),
        object_entry(FIRMWARE_DIR, "../lib/ChibiOS/os/hal/src/file3.c"),
    ];

    let want = vec![
        object_entry(FIRMWARE_DIR, "../lib/ChibiOS/os/hal/src/hal.c"),
        object_entry(FIRMWARE_DIR, "../lib/ChibiOS/os/hal/src/file2.c"),
        object_entry(FIRMWARE_DIR, "../lib/ChibiOS/os/hal/src/file3.c"),
    ];

    assert_eq!(merge_databases(vec![db1, db2]), want);
}

#[test]
fn test_merge_identical_databases() {
    let db = vec![
        object_entry("/src", "a.c"),
        object_entry("/src", "b.c"),
        object_entry("/src", "./c.c"),
    ];
    assert_eq!(merge_databases(vec![db.clone(), db.clone()]), db);
}

#[test]
fn test_merge_first_occurrence_wins_within_database() {
    let first = entry(&["gcc", "-DFIRST", "a.c"], "/src", "a.c");
    let second = entry(&["gcc", "-DSECOND", "a.c"], "/src/sub", "../a.c");
    let merged = merge_databases(vec![vec![first.clone(), second]]);
    assert_eq!(merged, vec![first]);
}

#[test]
fn test_load_rejects_entry_without_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("compile_commands.json");
    fs::write(&path, r#"[{"arguments": ["gcc", "a.c"], "directory": "/src"}]"#).unwrap();

    let err = load_database(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("Malformed compile database"));
}

#[test]
fn test_write_then_load_database() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("compile_commands.json");
    let db = vec![object_entry("/src", "a.c")];

    write_database(&path, &db).unwrap();
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("\"arguments\""));
    assert_eq!(load_database(&path).unwrap(), db);
}
