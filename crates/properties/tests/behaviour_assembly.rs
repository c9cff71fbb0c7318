//! BDD tests for VM options assembly.

use camino::{Utf8Path, Utf8PathBuf};
use qodana_prep_common::{Environment, MemoryEnvironment};
use qodana_prep_properties::{
    AssembledConfiguration, Baseline, ConfigurationLayer, DeviceIdentity, DotNetSettings,
    IdePaths, ProductContext, assemble, write_vm_options,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

struct AssemblyWorld {
    _temp_dir: tempfile::TempDir,
    cache: Utf8PathBuf,
    context: Option<ProductContext>,
    user: ConfigurationLayer,
    cli_arguments: Vec<String>,
    env: MemoryEnvironment,
    assembled: Option<AssembledConfiguration>,
    written: Option<Utf8PathBuf>,
}

#[fixture]
fn world() -> AssemblyWorld {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let cache = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).expect("UTF-8 path");
    AssemblyWorld {
        _temp_dir: temp_dir,
        cache,
        context: None,
        user: ConfigurationLayer::new(),
        cli_arguments: Vec::new(),
        env: MemoryEnvironment::default(),
        assembled: None,
        written: None,
    }
}

fn product(cache: &Utf8Path, prefix: &str, is_233_or_newer: bool) -> ProductContext {
    ProductContext {
        product_code: "QDJVM".to_owned(),
        parent_prefix: prefix.to_owned(),
        vm_options_env: "IDEA_VM_OPTIONS".to_owned(),
        early_access: false,
        is_233_or_newer,
        treat_as_release: false,
        statistics_enabled: false,
        paths: IdePaths::under_cache(cache, &cache.join("ide/bin/QodanaAppInfo.xml"), "241"),
        device: DeviceIdentity::derive("behaviour"),
        analysis_id: "behaviour-run".to_owned(),
        plugins: Vec::new(),
        coverage_dir: None,
        dotnet: DotNetSettings::default(),
    }
}

impl AssemblyWorld {
    fn context(&self) -> &ProductContext {
        self.context.as_ref().expect("product configured")
    }

    fn assembled(&self) -> &AssembledConfiguration {
        self.assembled.as_ref().expect("configuration assembled")
    }
}

#[given("a \"{prefix}\" product")]
fn given_product(world: &mut AssemblyWorld, prefix: String) {
    world.context = Some(product(&world.cache, &prefix, false));
}

#[given("a \"{prefix}\" product from branch 233 or later")]
fn given_recent_product(world: &mut AssemblyWorld, prefix: String) {
    world.context = Some(product(&world.cache, &prefix, true));
}

#[given("the .NET solution is \"{solution}\"")]
fn given_solution(world: &mut AssemblyWorld, solution: String) {
    let context = world.context.as_mut().expect("product configured");
    context.dotnet.solution = Some(solution);
}

#[given("qodana.yaml sets \"{key}\" to \"{value}\"")]
fn given_user_property(world: &mut AssemblyWorld, key: String, value: String) {
    world.user.insert(&key, value);
}

#[given("the command line sets \"{argument}\"")]
fn given_cli_argument(world: &mut AssemblyWorld, argument: String) {
    world.cli_arguments.push(argument);
}

#[when("the configuration is assembled")]
fn when_assembled(world: &mut AssemblyWorld) {
    let context = world.context();
    let baseline = Baseline::standard(&context.paths.log, context.treat_as_release);
    let cli = ConfigurationLayer::from_arguments(&world.cli_arguments);
    let assembled = assemble(&baseline, context, &world.user, &cli);
    world.assembled = Some(assembled);
}

#[when("the configuration is written")]
fn when_written(world: &mut AssemblyWorld) {
    let path = write_vm_options(world.assembled(), world.context(), &world.env).expect("write");
    world.written = Some(path);
}

#[then("the option \"{key}\" has value \"{value}\"")]
fn then_option_value(world: &mut AssemblyWorld, key: String, value: String) {
    assert_eq!(world.assembled().value_of(&key), Some(value.as_str()));
}

#[then("the option \"{key}\" is absent")]
fn then_option_absent(world: &mut AssemblyWorld, key: String) {
    assert_eq!(world.assembled().value_of(&key), None);
}

#[then("exactly one line sets \"{key}\"")]
fn then_key_once(world: &mut AssemblyWorld, key: String) {
    let count = world
        .assembled()
        .lines()
        .iter()
        .filter(|line| line.split_once('=').is_some_and(|(line_key, _)| line_key == key))
        .count();
    assert_eq!(count, 1, "lines: {:?}", world.assembled().lines());
}

#[then("no line ends with \"{suffix}\"")]
fn then_no_suffix(world: &mut AssemblyWorld, suffix: String) {
    assert!(
        !world
            .assembled()
            .lines()
            .iter()
            .any(|line| line.ends_with(&suffix))
    );
}

#[then("\"{name}\" points at the written file")]
fn then_env_points(world: &mut AssemblyWorld, name: String) {
    let written = world.written.as_ref().expect("written");
    assert_eq!(world.env.var(&name).as_deref(), Some(written.as_str()));
}

#[then("the written file lists every assembled line in sorted order")]
fn then_file_sorted(world: &mut AssemblyWorld) {
    let written = world.written.as_ref().expect("written");
    let contents = std::fs::read_to_string(written).expect("read back");
    let lines: Vec<&str> = contents.lines().collect();
    let mut sorted = lines.clone();
    sorted.sort_unstable();
    assert_eq!(lines, sorted);
    assert_eq!(lines.len(), world.assembled().lines().len());
}

#[scenario(
    path = "tests/features/vm_options_assembly.feature",
    name = "Command line beats project configuration"
)]
fn scenario_cli_beats_user(world: AssemblyWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/vm_options_assembly.feature",
    name = "Project configuration beats product defaults"
)]
fn scenario_user_beats_defaults(world: AssemblyWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/vm_options_assembly.feature",
    name = "Baseline options cannot be overridden"
)]
fn scenario_baseline_fixed(world: AssemblyWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/vm_options_assembly.feature",
    name = "Bare keys are rendered in flag form once"
)]
fn scenario_normalised_once(world: AssemblyWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/vm_options_assembly.feature",
    name = "Recent Rider builds use the .NET profiles"
)]
fn scenario_rider_profiles(world: AssemblyWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/vm_options_assembly.feature",
    name = "Written options are announced through the environment"
)]
fn scenario_written(world: AssemblyWorld) {
    let _ = world;
}
