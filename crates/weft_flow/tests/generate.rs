use std::path::Path;
use weft_bitstream::ConfigBitAccountant;
use weft_build::{BuildOptions, FabricBuilder};
use weft_common::{ConfigOrganization, FabricError};
use weft_flow::{generate_fabric, run, FabricReport};
use weft_test_helpers::{
    fixture_device, fixture_device_json, init_logging, BLOCK_CLB, BLOCK_FLE,
};

fn write_project(dir: &Path, config: &str) {
    std::fs::create_dir_all(dir.join("arch")).unwrap();
    std::fs::write(dir.join("arch/fixture.json"), fixture_device_json()).unwrap();
    std::fs::write(dir.join("weft.toml"), config).unwrap();
}

fn project(extra: &str) -> (tempfile::TempDir, FabricReport) {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = format!(
        "[fabric]\nname = \"fixture\"\ndevice = \"arch/fixture.json\"\n{extra}"
    );
    write_project(dir.path(), &config);
    let report = run(dir.path()).unwrap();
    (dir, report)
}

fn file_names(report: &FabricReport) -> Vec<String> {
    report
        .sdc_files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

/// Sum of independent bits over every physical block, computed directly.
fn expected_fabric_bits(organization: ConfigOrganization) -> usize {
    let device = fixture_device();
    let options = BuildOptions {
        organization,
        compact_routing: true,
        duplicate_grid_pin: false,
    };
    let modules = FabricBuilder::new(&device, options).build_all().unwrap();
    let accountant = ConfigBitAccountant::new(&modules.graph, &device, organization).unwrap();
    modules
        .placement
        .physical_blocks(&modules.graph)
        .unwrap()
        .iter()
        .map(|(_, module)| accountant.independent_bits(*module).unwrap() as usize)
        .sum()
}

#[test]
fn compact_project_writes_one_file_per_distinct_block() {
    let (dir, report) = project("");
    assert_eq!(
        file_names(&report),
        vec!["sb_1__1_.sdc", "sb_1__2_.sdc", "cbx_1__1_.sdc", "cby_1__1_.sdc"]
    );
    for path in &report.sdc_files {
        assert!(path.starts_with(dir.path().join("SDC")));
        assert!(path.is_file());
    }
    assert!(report.bitstream.is_none());
}

#[test]
fn switch_block_constraints_carry_switch_delays() {
    let (_dir, report) = project("");
    let sb = report
        .sdc_files
        .iter()
        .find(|p| p.ends_with("sb_1__1_.sdc"))
        .unwrap();
    let text = std::fs::read_to_string(sb).unwrap();
    let directives: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(directives.len(), 5);
    assert!(directives.iter().all(|d| d.starts_with("set_max_delay -from sb_1__1_/")));
    assert!(directives.contains(
        &"set_max_delay -from sb_1__1_/chanx_left_in_0 -to sb_1__1_/chanx_right_out_0 5"
    ));
    // the block without multiplexers still gets a header
    let short = report
        .sdc_files
        .iter()
        .find(|p| p.ends_with("sb_1__2_.sdc"))
        .unwrap();
    let text = std::fs::read_to_string(short).unwrap();
    assert!(text.lines().all(|l| l.starts_with('#')));
}

#[test]
fn flat_project_writes_one_file_per_position() {
    let (_dir, report) = project("compact_routing_hierarchy = false\n");
    let names = file_names(&report);
    assert_eq!(names.len(), 5);
    assert!(names.contains(&"sb_2__1_.sdc".to_string()));
    assert!(report.bits.contains_key("sb_2__1_"));
}

#[test]
fn bitstream_covers_every_physical_block() {
    let (dir, report) = project(
        "config_organization = \"standalone\"\n\n[output]\nbitstream = \"out/bits.xml\"\n",
    );
    let path = report.bitstream.as_ref().unwrap();
    assert_eq!(path, &dir.path().join("out/bits.xml"));
    let xml = std::fs::read_to_string(path).unwrap();
    assert!(xml.contains("grid_clb_1__1_"));
    assert_eq!(
        report.fabric_bits,
        expected_fabric_bits(ConfigOrganization::Standalone)
    );
    assert_eq!(report.bits["pb_clb_mode_default"].independent, 58);
    assert_eq!(report.bits["pb_lut4"].independent, 16);
}

#[test]
fn memory_bank_reports_shared_bits() {
    let (_dir, report) = project("config_organization = \"memory_bank\"\n");
    let sb = report.bits["sb_1__1_"];
    assert_eq!(sb.independent, 3);
    assert!(sb.shared > 0);
    assert_eq!(
        report.fabric_bits,
        expected_fabric_bits(ConfigOrganization::MemoryBank)
    );
}

#[test]
fn disabled_blocks_are_not_constrained() {
    let (_dir, report) = project(
        "\n[sdc]\nconstrain_switch_blocks = false\nconstrain_connection_blocks = false\n",
    );
    assert!(report.sdc_files.is_empty());
}

#[test]
fn runs_are_deterministic() {
    let extra = "config_organization = \"scan_chain\"\n\n[output]\nbitstream = \"bits.xml\"\n";
    let (a_dir, a) = project(extra);
    let (b_dir, b) = project(extra);
    assert_eq!(file_names(&a), file_names(&b));
    for (x, y) in a.sdc_files.iter().zip(&b.sdc_files) {
        assert_eq!(
            std::fs::read_to_string(x).unwrap(),
            std::fs::read_to_string(y).unwrap()
        );
    }
    assert_eq!(
        std::fs::read_to_string(a_dir.path().join("bits.xml")).unwrap(),
        std::fs::read_to_string(b_dir.path().join("bits.xml")).unwrap()
    );
    assert_eq!(
        serde_json::to_value(&a.bits).unwrap(),
        serde_json::to_value(&b.bits).unwrap()
    );
}

#[test]
fn invalid_config_is_structural_error() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path(), "[fabric]\nname = \"\"\ndevice = \"arch/fixture.json\"\n");
    assert!(matches!(run(dir.path()), Err(FabricError::Structural(_))));
}

#[test]
fn missing_device_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("weft.toml"),
        "[fabric]\nname = \"fixture\"\ndevice = \"missing.json\"\n",
    )
    .unwrap();
    assert!(matches!(run(dir.path()), Err(FabricError::Io { .. })));
}

#[test]
fn generate_without_project_directory() {
    init_logging();
    let config = weft_config::load_config_from_str(
        "[fabric]\nname = \"fixture\"\ndevice = \"unused.json\"\n\n[output]\nsdc_dir = \"timing\"\n",
    )
    .unwrap();
    let out = tempfile::tempdir().unwrap();
    let report = generate_fabric(&config, &fixture_device(), out.path()).unwrap();
    assert!(out.path().join("timing/cbx_1__1_.sdc").is_file());
    assert_eq!(report.bits.len(), report.module_count);
}

#[test]
fn failed_constraint_write_leaves_no_artifacts() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    write_project(
        dir.path(),
        "[fabric]\nname = \"fixture\"\ndevice = \"arch/fixture.json\"\n\n[output]\nbitstream = \"bits.xml\"\n",
    );
    // a directory where the last constraint file should go
    std::fs::create_dir_all(dir.path().join("SDC/cby_1__1_.sdc")).unwrap();
    assert!(matches!(run(dir.path()), Err(FabricError::Io { .. })));
    assert!(!dir.path().join("bits.xml").exists());
    let left: Vec<_> = std::fs::read_dir(dir.path().join("SDC"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(left, vec!["cby_1__1_.sdc"]);
}

#[test]
fn cyclic_hierarchy_is_rejected_before_any_output() {
    init_logging();
    let config = weft_config::load_config_from_str(
        "[fabric]\nname = \"fixture\"\ndevice = \"unused.json\"\n\n[output]\nbitstream = \"bits.xml\"\n",
    )
    .unwrap();
    let mut device = fixture_device();
    let fle = &mut device.clusters.blocks[BLOCK_FLE.index()];
    let mode = fle.physical_mode.unwrap_or(0);
    fle.modes[mode].children[0].block = BLOCK_CLB;
    let out = tempfile::tempdir().unwrap();
    assert!(matches!(
        generate_fabric(&config, &device, out.path()),
        Err(FabricError::Structural(_))
    ));
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn duplicated_grid_pins_keep_the_bit_count() {
    let (_dir, plain) = project("");
    let (_dir, duplicated) = project("duplicate_grid_pin = true\n");
    assert_eq!(plain.fabric_bits, duplicated.fabric_bits);
    assert_eq!(plain.module_count, duplicated.module_count);
    assert_eq!(file_names(&plain), file_names(&duplicated));
}
