//! Persisting assembled VM options.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

use qodana_prep_common::Environment;

use crate::assemble::AssembledConfiguration;
use crate::context::ProductContext;

/// Errors arising while writing the VM options file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// The configuration directory could not be created.
    #[error("failed to create configuration directory {path}: {source}")]
    CreateDirectory {
        /// The directory.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The VM options file could not be written.
    #[error("failed to write VM options to {path}: {source}")]
    Write {
        /// The file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Location of the VM options file for a product.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use qodana_prep_properties::vm_options_path;
///
/// let path = vm_options_path(Utf8Path::new("/cache/conf/241"), "QDJVM");
/// assert_eq!(path.as_str(), "/cache/conf/241/qdjvm.vmoptions");
/// ```
#[must_use]
pub fn vm_options_path(config_dir: &Utf8Path, product_code: &str) -> Utf8PathBuf {
    config_dir.join(format!("{}.vmoptions", product_code.to_ascii_lowercase()))
}

/// Write `configuration` into the product's configuration directory and
/// point the product's VM options variable at it.
///
/// Unlike [`qodana_prep_common::export_if_unset`], the variable is always
/// overwritten: a stale value would make the launcher read another file.
///
/// # Errors
///
/// Returns [`ConfigurationError`] if the directory or file cannot be
/// written; the variable is left untouched in that case.
pub fn write_vm_options(
    configuration: &AssembledConfiguration,
    context: &ProductContext,
    env: &dyn Environment,
) -> Result<Utf8PathBuf, ConfigurationError> {
    let config_dir = &context.paths.config;
    fs::create_dir_all(config_dir).map_err(|source| ConfigurationError::CreateDirectory {
        path: config_dir.clone(),
        source,
    })?;

    let path = vm_options_path(config_dir, &context.product_code);
    fs::write(&path, configuration.to_string()).map_err(|source| ConfigurationError::Write {
        path: path.clone(),
        source,
    })?;
    log::debug!(
        "wrote {} VM options to {path}",
        configuration.lines().len()
    );

    env.set_var(&context.vm_options_env, path.as_str());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::{Baseline, assemble};
    use crate::context::{DotNetSettings, IdePaths};
    use crate::device::DeviceIdentity;
    use crate::layer::ConfigurationLayer;
    use qodana_prep_common::MemoryEnvironment;

    fn context_in(cache: &Utf8Path) -> ProductContext {
        ProductContext {
            product_code: "QDGO".to_owned(),
            parent_prefix: "GoLand".to_owned(),
            vm_options_env: "GOLAND_VM_OPTIONS".to_owned(),
            early_access: false,
            is_233_or_newer: true,
            treat_as_release: false,
            statistics_enabled: false,
            paths: IdePaths::under_cache(cache, &cache.join("bin/QodanaAppInfo.xml"), "241"),
            device: DeviceIdentity::derive("seed"),
            analysis_id: "run".to_owned(),
            plugins: Vec::new(),
            coverage_dir: None,
            dotnet: DotNetSettings::default(),
        }
    }

    fn temp_cache() -> (tempfile::TempDir, Utf8PathBuf) {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
        (temp, path)
    }

    #[test]
    fn writes_lines_and_sets_variable() {
        let (_temp, cache) = temp_cache();
        let context = context_in(&cache);
        let configuration = assemble(
            &Baseline::standard(&context.paths.log, false),
            &context,
            &ConfigurationLayer::new(),
            &ConfigurationLayer::new(),
        );
        let env = MemoryEnvironment::default();

        let path = write_vm_options(&configuration, &context, &env).expect("write");

        assert_eq!(path, cache.join("conf/241/qdgo.vmoptions"));
        let written = fs::read_to_string(&path).expect("read back");
        assert_eq!(written, configuration.to_string());
        assert_eq!(written.lines().count(), configuration.lines().len());
        assert_eq!(env.var("GOLAND_VM_OPTIONS").as_deref(), Some(path.as_str()));
    }

    #[test]
    fn existing_variable_is_replaced() {
        let (_temp, cache) = temp_cache();
        let context = context_in(&cache);
        let configuration = assemble(
            &Baseline::standard(&context.paths.log, false),
            &context,
            &ConfigurationLayer::new(),
            &ConfigurationLayer::new(),
        );
        let env = MemoryEnvironment::with_vars([("GOLAND_VM_OPTIONS", "/stale.vmoptions")]);

        let path = write_vm_options(&configuration, &context, &env).expect("write");
        assert_eq!(env.var("GOLAND_VM_OPTIONS").as_deref(), Some(path.as_str()));
    }

    #[test]
    fn unwritable_directory_is_reported_and_variable_untouched() {
        let (_temp, cache) = temp_cache();
        // A file where the configuration directory should be.
        fs::write(cache.join("conf"), b"not a directory").expect("write blocker");
        let context = context_in(&cache);
        let configuration = assemble(
            &Baseline::standard(&context.paths.log, false),
            &context,
            &ConfigurationLayer::new(),
            &ConfigurationLayer::new(),
        );
        let env = MemoryEnvironment::default();

        let err = write_vm_options(&configuration, &context, &env).expect_err("blocked");

        assert!(matches!(err, ConfigurationError::CreateDirectory { .. }));
        assert_eq!(env.var("GOLAND_VM_OPTIONS"), None);
    }
}
