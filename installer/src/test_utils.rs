//! Shared test utilities for the installer crate.

use flate2::Compression;
use flate2::write::GzEncoder;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::Path;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Hex-encoded SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// A minimal `QodanaAppInfo.xml` document.
pub fn app_info_xml(product: &str, build: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<component xmlns="http://jetbrains.org/intellij/schema/application-info">
  <company name="JetBrains s.r.o." url="https://www.jetbrains.com"/>
  <version major="2024" minor="1" micro="2"/>
  <build number="QDJVM-{build}" date="202405010000"/>
  <names product="{product}" fullname="Qodana for JVM" script="idea"/>
</component>
"#
    )
}

/// A release feed with one release of `code` offering `link` under `key`.
pub fn release_feed_json(
    code: &str,
    kind: &str,
    build: &str,
    key: &str,
    link: &str,
    checksum_link: Option<&str>,
) -> String {
    let mut download = json!({ "link": link, "size": 1024 });
    if let Some(checksum) = checksum_link {
        download["checksumLink"] = json!(checksum);
    }
    json!({
        code: [{
            "date": "2024-05-01",
            "type": kind,
            "version": "2024.1",
            "build": build,
            "downloads": { key: download }
        }]
    })
    .to_string()
}

/// Gzip-compressed tarball of `files` below a single top-level directory.
pub fn tar_gz_bytes(top_level: &str, files: &[(&str, &[u8])]) -> Vec<u8> {
    let entries: Vec<TarEntry<'_>> = files
        .iter()
        .map(|&(name, contents)| TarEntry::File(name, contents))
        .collect();
    tar_gz_entries(top_level, &entries)
}

/// One entry of a tarball built by [`tar_gz_entries`].
#[derive(Debug, Clone, Copy)]
pub enum TarEntry<'a> {
    /// A regular file with its contents.
    File(&'a str, &'a [u8]),
    /// A symlink and its target, written verbatim.
    Symlink(&'a str, &'a str),
    /// A hard link and the archive path it names, written verbatim.
    HardLink(&'a str, &'a str),
}

/// Gzip-compressed tarball of `entries`, in order, below `top_level`.
///
/// # Panics
///
/// Panics if the in-memory archive cannot be built.
pub fn tar_gz_entries(top_level: &str, entries: &[TarEntry<'_>]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::fast());
    let mut builder = tar::Builder::new(encoder);
    for entry in entries {
        let mut header = tar::Header::new_gnu();
        header.set_mode(0o755);
        match *entry {
            TarEntry::File(name, contents) => {
                header.set_size(contents.len() as u64);
                header.set_cksum();
                builder
                    .append_data(&mut header, format!("{top_level}/{name}"), contents)
                    .expect("append tar entry");
            }
            TarEntry::Symlink(name, target) => {
                header.set_entry_type(tar::EntryType::Symlink);
                header.set_size(0);
                builder
                    .append_link(&mut header, format!("{top_level}/{name}"), target)
                    .expect("append tar symlink");
            }
            TarEntry::HardLink(name, target) => {
                header.set_entry_type(tar::EntryType::Link);
                header.set_size(0);
                builder
                    .append_link(&mut header, format!("{top_level}/{name}"), target)
                    .expect("append tar hard link");
            }
        }
    }
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip")
}

/// Tarball of an installation whose manifest names `product`.
pub fn install_tar_gz(product: &str, build: &str) -> Vec<u8> {
    let xml = app_info_xml(product, build);
    tar_gz_bytes(
        "qodana-241.1",
        &[
            ("bin/QodanaAppInfo.xml", xml.as_bytes()),
            ("bin/idea.sh", b"#!/bin/sh\n"),
            ("lib/app.jar", b"jar"),
        ],
    )
}

/// Zip archive of `files`, laid out from the archive root.
///
/// # Panics
///
/// Panics if the in-memory archive cannot be built.
pub fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, contents) in files {
        writer.start_file(*name, options).expect("start zip entry");
        writer.write_all(contents).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Write `bytes` to `path`, creating parent directories.
///
/// # Panics
///
/// Panics on I/O failure.
pub fn write_file(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    std::fs::write(path, bytes).expect("write file");
}
