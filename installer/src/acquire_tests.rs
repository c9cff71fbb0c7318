//! Unit tests for tool acquisition orchestration.

use super::*;
use crate::app_info::APP_INFO_FILE;
use crate::download::{DownloadError, MockArtefactDownloader};
use crate::extraction::{ExtractionError, MockArtefactExtractor};
use crate::platform::{ArchiveFormat, HostArch, HostOs};
use crate::test_utils::{app_info_xml, release_feed_json, sha256_hex, write_file};
use rstest::{fixture, rstest};

const FAKE_ARCHIVE: &[u8] = b"fake distribution";
const LINK: &str = "https://download.test/qodana-241.tar.gz";
const CHECKSUM_LINK: &str = "https://download.test/qodana-241.tar.gz.sha256";

fn linux() -> HostPlatform {
    HostPlatform::new(HostOs::Linux, HostArch::X86_64)
}

struct Workspace {
    _temp: tempfile::TempDir,
    destination: Utf8PathBuf,
}

#[fixture]
fn workspace() -> Workspace {
    let temp = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
    Workspace {
        _temp: temp,
        destination: root.join("tools").join("qodana"),
    }
}

fn feed(kind: &str, checksum: bool) -> String {
    release_feed_json(
        "QDJVM",
        kind,
        "241.14494.240",
        "linux",
        LINK,
        checksum.then_some(CHECKSUM_LINK),
    )
}

/// Downloader serving a feed, the fake archive and a checksum for `archive`.
fn serving_downloader(feed_json: String, checksum_of: &'static [u8]) -> MockArtefactDownloader {
    let mut downloader = MockArtefactDownloader::new();
    downloader.expect_fetch_text().returning(move |url| {
        if url == CHECKSUM_LINK {
            Ok(format!("{}  *qodana-241.tar.gz\n", sha256_hex(checksum_of)))
        } else {
            Ok(feed_json.clone())
        }
    });
    downloader
        .expect_download_to()
        .returning(|_url, dest| std::fs::write(dest, FAKE_ARCHIVE).map_err(DownloadError::Io));
    downloader
}

/// Extractor producing a flat installation with a valid manifest.
fn installing_extractor() -> MockArtefactExtractor {
    let mut extractor = MockArtefactExtractor::new();
    extractor
        .expect_extract()
        .withf(|_archive, format, _dest| *format == ArchiveFormat::TarGz)
        .returning(|_archive, _format, dest| {
            let xml = app_info_xml("Qodana", "241.14494.240");
            write_file(&dest.join("bin").join(APP_INFO_FILE), xml.as_bytes());
            Ok(())
        });
    extractor
}

fn run(
    downloader: &MockArtefactDownloader,
    extractor: &MockArtefactExtractor,
    code: &str,
    destination: &Utf8Path,
) -> Result<InstalledTool> {
    let mut stderr = Vec::new();
    ToolAcquirer::new(linux(), downloader, extractor)
        .quiet(true)
        .acquire(code, destination, &mut stderr)
}

fn staging_leftovers(destination: &Utf8Path) -> Vec<String> {
    let parent = destination.parent().expect("parent");
    let Ok(entries) = std::fs::read_dir(parent) else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(STAGING_PREFIX))
        .collect()
}

#[rstest]
fn installs_verified_release(workspace: Workspace) {
    let downloader = serving_downloader(feed("release", true), FAKE_ARCHIVE);
    let extractor = installing_extractor();

    let tool = run(&downloader, &extractor, "QDJVM", &workspace.destination).expect("install");

    assert_eq!(tool.product.as_str(), "QDJVM");
    assert_eq!(tool.channel, Channel::Stable);
    assert_eq!(tool.path, workspace.destination);
    assert_eq!(tool.home, workspace.destination);
    assert_eq!(tool.info.name, "Qodana");
    assert!(tool.freshly_installed);
    assert!(
        workspace
            .destination
            .join("bin")
            .join(APP_INFO_FILE)
            .is_file()
    );
    assert!(staging_leftovers(&workspace.destination).is_empty());
}

#[rstest]
fn early_access_suffix_queries_eap_feed(workspace: Workspace) {
    let mut downloader = MockArtefactDownloader::new();
    downloader
        .expect_fetch_text()
        .withf(|url| url.ends_with("type=eap"))
        .times(1)
        .returning(|_| Ok(feed("eap", false)));
    downloader
        .expect_download_to()
        .returning(|_url, dest| std::fs::write(dest, FAKE_ARCHIVE).map_err(DownloadError::Io));
    let extractor = installing_extractor();

    let tool = run(&downloader, &extractor, "QDJVM-EAP", &workspace.destination).expect("install");
    assert_eq!(tool.channel, Channel::EarlyAccess);
}

#[rstest]
fn unknown_product_touches_nothing(workspace: Workspace) {
    let downloader = MockArtefactDownloader::new();
    let extractor = MockArtefactExtractor::new();

    let err = run(&downloader, &extractor, "QDCOBOL", &workspace.destination).expect_err("unknown");

    assert!(matches!(err.failure, AcquisitionFailure::UnknownProduct(_)));
    assert_eq!(err.product, "QDCOBOL");
    assert_eq!(err.destination, workspace.destination);
    let parent = workspace.destination.parent().expect("parent");
    assert!(!parent.exists(), "no directory may be created");
}

#[rstest]
fn checksum_mismatch_leaves_destination_absent(workspace: Workspace) {
    let downloader = serving_downloader(feed("release", true), b"something else");
    let extractor = MockArtefactExtractor::new();

    let err = run(&downloader, &extractor, "QDJVM", &workspace.destination).expect_err("mismatch");

    assert!(matches!(err.failure, AcquisitionFailure::Checksum(_)));
    assert!(!workspace.destination.exists());
}

#[rstest]
fn extraction_failure_removes_staging(workspace: Workspace) {
    let downloader = serving_downloader(feed("release", true), FAKE_ARCHIVE);
    let mut extractor = MockArtefactExtractor::new();
    extractor.expect_extract().returning(|_archive, _format, dest| {
        std::fs::write(dest.join("partial"), b"half").map_err(ExtractionError::Io)?;
        Err(ExtractionError::EmptyArchive)
    });

    let err = run(&downloader, &extractor, "QDJVM", &workspace.destination).expect_err("fails");

    assert!(matches!(err.failure, AcquisitionFailure::Extraction(_)));
    assert!(!workspace.destination.exists());
    assert!(staging_leftovers(&workspace.destination).is_empty());
}

#[rstest]
fn missing_manifest_is_a_metadata_error(workspace: Workspace) {
    let downloader = serving_downloader(feed("release", true), FAKE_ARCHIVE);
    let mut extractor = MockArtefactExtractor::new();
    extractor.expect_extract().returning(|_archive, _format, dest| {
        write_file(&dest.join("bin").join("idea.sh"), b"#!/bin/sh");
        Ok(())
    });

    let err = run(&downloader, &extractor, "QDJVM", &workspace.destination).expect_err("fails");

    assert!(matches!(err.failure, AcquisitionFailure::Metadata(_)));
    assert!(!workspace.destination.exists());
}

#[rstest]
fn existing_installation_is_reused(workspace: Workspace) {
    let xml = app_info_xml("Qodana", "233.1.1");
    write_file(
        &workspace.destination.join("bin").join(APP_INFO_FILE).into_std_path_buf(),
        xml.as_bytes(),
    );
    let downloader = MockArtefactDownloader::new();
    let extractor = MockArtefactExtractor::new();

    let tool = run(&downloader, &extractor, "QDJVM", &workspace.destination).expect("reuse");

    assert!(!tool.freshly_installed);
    assert_eq!(tool.info.build_number(), "233.1.1");
}

#[rstest]
fn populated_destination_without_manifest_is_refused(workspace: Workspace) {
    write_file(
        &workspace.destination.join("notes.txt").into_std_path_buf(),
        b"mine",
    );
    let downloader = MockArtefactDownloader::new();
    let extractor = MockArtefactExtractor::new();

    let err = run(&downloader, &extractor, "QDJVM", &workspace.destination).expect_err("occupied");

    assert!(matches!(err.failure, AcquisitionFailure::DestinationOccupied));
    assert!(workspace.destination.join("notes.txt").is_file());
}

#[rstest]
fn empty_destination_directory_is_filled(workspace: Workspace) {
    std::fs::create_dir_all(&workspace.destination).expect("create destination");
    let downloader = serving_downloader(feed("release", true), FAKE_ARCHIVE);
    let extractor = installing_extractor();

    let tool = run(&downloader, &extractor, "QDJVM", &workspace.destination).expect("install");
    assert!(tool.freshly_installed);
}

#[rstest]
fn missing_checksum_link_still_installs(workspace: Workspace) {
    let downloader = serving_downloader(feed("release", false), FAKE_ARCHIVE);
    let extractor = installing_extractor();

    run(&downloader, &extractor, "QDJVM", &workspace.destination).expect("install");
}

#[rstest]
fn feed_failure_is_reported_with_context(workspace: Workspace) {
    let mut downloader = MockArtefactDownloader::new();
    downloader.expect_fetch_text().returning(|url| {
        Err(DownloadError::HttpError {
            url: url.to_owned(),
            reason: "connection refused".to_owned(),
        })
    });
    let extractor = MockArtefactExtractor::new();

    let err = run(&downloader, &extractor, "QDJVM", &workspace.destination).expect_err("offline");

    assert!(matches!(err.failure, AcquisitionFailure::Download(_)));
    let message = err.to_string();
    assert!(message.contains("QDJVM"));
    assert!(message.contains("connection refused"));
}

#[rstest]
fn bundle_layout_reports_contents_home(workspace: Workspace) {
    let downloader = serving_downloader(feed("release", true), FAKE_ARCHIVE);
    let mut extractor = MockArtefactExtractor::new();
    extractor.expect_extract().returning(|_archive, _format, dest| {
        let xml = app_info_xml("Qodana", "241.1");
        write_file(
            &dest.join("Contents").join("bin").join(APP_INFO_FILE),
            xml.as_bytes(),
        );
        Ok(())
    });

    let tool = run(&downloader, &extractor, "QDJVM", &workspace.destination).expect("install");
    assert_eq!(tool.home, workspace.destination.join("Contents"));
}

#[test]
fn progress_is_written_unless_quiet() {
    let temp = tempfile::tempdir().expect("temp dir");
    let destination =
        Utf8PathBuf::try_from(temp.path().join("qodana")).expect("UTF-8 path");
    let downloader = serving_downloader(feed("release", true), FAKE_ARCHIVE);
    let extractor = installing_extractor();
    let mut stderr = Vec::new();

    ToolAcquirer::new(linux(), &downloader, &extractor)
        .acquire("QDJVM", &destination, &mut stderr)
        .expect("install");

    let output = String::from_utf8(stderr).expect("utf8");
    assert!(output.contains("Downloading Qodana for JVM"));
    assert!(output.contains("Installed Qodana"));
}
