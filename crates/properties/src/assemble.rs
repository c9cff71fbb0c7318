//! Merging layers into the final VM options.
//!
//! The output starts from a fixed baseline of JVM flags that no layer may
//! override, adds the product defaults, then the project and command-line
//! layers in increasing precedence, and is sorted so that identical inputs
//! always produce identical files.

use std::collections::BTreeMap;
use std::fmt;

use camino::Utf8Path;

use crate::context::ProductContext;
use crate::layer::ConfigurationLayer;
use crate::rules::{RIDER_FAMILY, matching_entries};

/// Flags every launch carries, emitted verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    flags: Vec<String>,
}

impl Baseline {
    /// The standard baseline writing the GC log into `log_dir`.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use qodana_prep_properties::Baseline;
    ///
    /// let baseline = Baseline::standard(Utf8Path::new("/logs"), false);
    /// assert!(baseline.flags().contains(&"-Xlog:gc*:/logs/gc.log".to_owned()));
    /// assert!(baseline.contains_key("-XX:+UseG1GC"));
    /// ```
    #[must_use]
    pub fn standard(log_dir: &Utf8Path, treat_as_release: bool) -> Self {
        let gc_log = log_dir.join("gc.log");
        let mut flags = vec![
            format!("-Xlog:gc*:{}", quote_if_space(gc_log.as_str())),
            r#"-Djdk.http.auth.tunneling.disabledSchemes="""#.to_owned(),
            "-XX:+HeapDumpOnOutOfMemoryError".to_owned(),
            "-XX:+UseG1GC".to_owned(),
            "-XX:-OmitStackTraceInFastThrow".to_owned(),
            "-ea".to_owned(),
        ];
        if treat_as_release {
            flags.push("-Deap.require.license=release".to_owned());
        }
        Self { flags }
    }

    /// The baseline flags in emission order.
    #[must_use]
    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    /// Whether `key` names one of the baseline flags.
    ///
    /// A flag's key is the text before its first `=`, or the whole flag.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.flags.iter().any(|flag| flag_key(flag) == key)
    }
}

/// The merged, sorted VM options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledConfiguration {
    lines: Vec<String>,
}

impl AssembledConfiguration {
    /// The option lines in output order.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Value of the `key=value` line for `key`, if any.
    #[must_use]
    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| {
            let (line_key, value) = line.split_once('=')?;
            (line_key == key).then_some(value)
        })
    }
}

impl fmt::Display for AssembledConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join("\n"))
    }
}

/// Merge the baseline, product defaults and the two override layers.
///
/// Later layers win over earlier ones for the same key. Keys that collide
/// with a baseline flag are dropped with a warning. Standalone flags from
/// the command-line layer are added once.
#[must_use]
pub fn assemble(
    baseline: &Baseline,
    context: &ProductContext,
    user: &ConfigurationLayer,
    cli: &ConfigurationLayer,
) -> AssembledConfiguration {
    let mut lines = baseline.flags.clone();
    for flag in user.flags().iter().chain(cli.flags()) {
        if !lines.contains(flag) {
            lines.push(flag.clone());
        }
    }

    let mut merged = base_mapping(context);
    for (source, layer) in [("qodana.yaml", user), ("command line", cli)] {
        for (key, value) in layer.properties() {
            if baseline.contains_key(key) {
                log::warn!("ignoring {key} from {source}: it is fixed by the baseline options");
                continue;
            }
            log::debug!("{key} set from {source}");
            merged.insert(key.to_owned(), value.to_owned());
        }
    }

    lines.extend(merged.into_iter().map(|(key, value)| format!("{key}={value}")));
    lines.sort();
    AssembledConfiguration { lines }
}

/// Product-derived defaults in flag form.
fn base_mapping(context: &ProductContext) -> BTreeMap<String, String> {
    let paths = &context.paths;
    let mut properties: BTreeMap<String, String> = [
        ("-Dfus.internal.reduce.initial.delay", "true"),
        ("-Didea.headless.statistics.max.files.to.send", "5000"),
        ("-Dinspect.save.project.settings", "true"),
        ("-Djava.awt.headless", "true"),
        ("-Djava.net.useSystemProxies", "true"),
        ("-Djdk.attach.allowAttachSelf", "true"),
        ("-Djdk.module.illegalAccess.silent", "true"),
        ("-Dkotlinx.coroutines.debug", "off"),
        ("-Dsun.io.useCanonCaches", "false"),
        ("-Dsun.tools.attach.tmp.only", "true"),
        ("-Didea.platform.prefix", "Qodana"),
        ("-Didea.qodana.thirdpartyplugins.accept", "true"),
        ("-Didea.job.launcher.without.timeout", "true"),
        ("-XX:SoftRefLRUPolicyMSPerMB", "50"),
        ("-XX:MaxJavaStackTraceDepth", "10000"),
        ("-XX:ReservedCodeCacheSize", "512m"),
        ("-XX:CICompilerCount", "2"),
        ("-XX:MaxRAMPercentage", "70"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_owned(), value.to_owned()))
    .collect();

    let mut set = |key: &str, value: String| {
        properties.insert(key.to_owned(), value);
    };
    set(
        "-Didea.headless.enable.statistics",
        context.statistics_enabled.to_string(),
    );
    set(
        "-Didea.headless.statistics.device.id",
        context.device.id.clone(),
    );
    set("-Didea.headless.statistics.salt", context.device.salt.clone());
    set("-Didea.parent.prefix", context.parent_prefix.clone());
    set("-Didea.config.path", quote_if_space(paths.config.as_str()));
    set("-Didea.system.path", quote_if_space(paths.system.as_str()));
    set("-Didea.plugins.path", quote_if_space(paths.plugins.as_str()));
    set(
        "-Didea.application.info.value",
        quote_if_space(paths.app_info.as_str()),
    );
    set("-Didea.log.path", quote_if_space(paths.log.as_str()));
    set(
        "-Dqodana.automation.guid",
        quote_if_space(&context.analysis_id),
    );

    if let Some(coverage) = &context.coverage_dir {
        set("-Dqodana.coverage.input", quote_if_space(coverage.as_str()));
    }
    if context.early_access {
        set("-Deap.login.enabled", "false".to_owned());
    }
    if !context.plugins.is_empty() {
        set("-Didea.required.plugins.id", context.plugins.join(","));
    }
    for (key, value) in matching_entries(context) {
        set(key, value.to_owned());
    }
    if context.parent_prefix == RIDER_FAMILY {
        for (key, value) in dotnet_entries(context) {
            set(key, value);
        }
    }
    properties
}

/// .NET integration keys; a project wins over a solution.
fn dotnet_entries(context: &ProductContext) -> Vec<(&'static str, String)> {
    let dotnet = &context.dotnet;
    let present = |value: &Option<String>| value.clone().filter(|value| !value.is_empty());
    let mut entries = Vec::new();
    if let Some(project) = present(&dotnet.project) {
        entries.push(("-Dqodana.net.project", project));
    } else if let Some(solution) = present(&dotnet.solution) {
        entries.push(("-Dqodana.net.solution", solution));
    }
    if let Some(configuration) = present(&dotnet.configuration) {
        entries.push(("-Dqodana.net.configuration", configuration));
    }
    if let Some(platform) = present(&dotnet.platform) {
        entries.push(("-Dqodana.net.platform", platform));
    }
    entries
}

fn flag_key(flag: &str) -> &str {
    flag.split_once('=').map_or(flag, |(key, _)| key)
}

/// Wrap a value in double quotes when it contains a space.
#[must_use]
pub fn quote_if_space(value: &str) -> String {
    if value.contains(' ') {
        format!("\"{value}\"")
    } else {
        value.to_owned()
    }
}

#[cfg(test)]
#[path = "assemble_tests.rs"]
mod tests;
