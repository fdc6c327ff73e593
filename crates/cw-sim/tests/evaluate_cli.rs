use std::fs;

use cw_charclass::{CharClassConfig, ClassReport};
use cw_core::ClassType;
use cw_forms::{from_json_slice, stable_hash_string, Blade};
use cw_sim::commands::classes::{self, ClassesArgs};
use cw_sim::commands::evaluate::{self, EvaluateArgs};
use cw_sim::problem::Problem;
use sha2::{Digest, Sha256};
use tempfile::tempdir;

const CHERN: &str = include_str!("../problems/chern_line_bundle.yaml");
const EULER: &str = include_str!("../problems/euler_sphere.yaml");

#[test]
fn evaluate_writes_report_and_hash() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("problem.yaml");
    fs::write(&input, CHERN).unwrap();
    let out = dir.path().join("out");

    evaluate::run(&EvaluateArgs {
        input,
        out: out.clone(),
        config: None,
    })
    .unwrap();

    let bytes = fs::read(out.join("class_form.json")).unwrap();
    let report: ClassReport = from_json_slice(&bytes).unwrap();
    let hash = fs::read_to_string(out.join("class_form.hash")).unwrap();
    assert_eq!(hash.trim(), format!("{:x}", Sha256::digest(&bytes)));
    assert_eq!(report.display, "c(E, nabla) = c_0(E, nabla) + zero + c_1(E, nabla)");
    assert_eq!(report.class.class_type, ClassType::Multiplicative);

    // Curvature 2*pi*i dx1/\dx2 normalizes to the unit area form.
    let form = &report.form;
    let domain = *form.domains().iter().next().unwrap();
    let top = form.component(2).unwrap().restriction(domain).unwrap();
    let area = top.coefficient(Blade::from_mask(0b11));
    assert!((area.re - 1.0).abs() < 1e-12 && area.im.abs() < 1e-12);
}

#[test]
fn reports_are_reproducible() {
    let problem = Problem::from_yaml_str(CHERN).unwrap();
    let first = evaluate::evaluate(&problem, CharClassConfig::default()).unwrap();
    let second = evaluate::evaluate(&problem, CharClassConfig::default()).unwrap();
    assert_eq!(
        stable_hash_string(&first).unwrap(),
        stable_hash_string(&second).unwrap()
    );
}

#[test]
fn euler_class_on_two_charts_passes_overlap_check() {
    let problem = Problem::from_yaml_str(EULER).unwrap();
    let config = CharClassConfig {
        verify_overlaps: true,
        ..CharClassConfig::default()
    };
    let report = evaluate::evaluate(&problem, config).unwrap();
    assert_eq!(report.class.name.as_deref(), Some("e"));
    assert_eq!(report.class.latex, "e(TS^2)");
    assert_eq!(report.expansions.len(), 2);
    assert!(report.form.component(0).unwrap().is_zero);
    assert_eq!(
        report.form.latex_name(),
        Some("e(TS^2, \\nabla)")
    );
}

#[test]
fn euler_class_without_supplied_curvature_is_not_supported() {
    let mut problem = Problem::from_yaml_str(EULER).unwrap();
    problem.supply_curvature = false;
    let err = evaluate::evaluate(&problem, CharClassConfig::default()).unwrap_err();
    assert!(err.to_string().contains("pfaffian-curvature"));
}

#[test]
fn config_file_is_applied() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(&path, "verify_overlaps: true\noverlap_tolerance: 1.0e-6\n").unwrap();
    let config = evaluate::load_config(Some(path.as_path())).unwrap();
    assert!(config.verify_overlaps);
    assert_eq!(config.overlap_tolerance, 1.0e-6);
    assert_eq!(
        evaluate::load_config(None).unwrap(),
        CharClassConfig::default()
    );
}

#[test]
fn unknown_names_in_problem_are_rejected() {
    let broken = CHERN.replace("domain: U", "domain: W");
    let problem = Problem::from_yaml_str(&broken).unwrap();
    let err = evaluate::evaluate(&problem, CharClassConfig::default()).unwrap_err();
    assert!(err.to_string().contains("unknown-domain"));

    let err = Problem::from_yaml_str("manifold: [").unwrap_err();
    assert_eq!(err.code(), "yaml-read");
}

#[test]
fn duplicate_domain_names_are_rejected() {
    let broken = EULER.replacen("    - name: V\n", "    - name: U\n", 1);
    let problem = Problem::from_yaml_str(&broken).unwrap();
    let err = evaluate::evaluate(&problem, CharClassConfig::default()).unwrap_err();
    assert!(err.to_string().contains("duplicate-domain"));
}

#[test]
fn custom_polynomial_class() {
    let custom = CHERN.replace(
        "  predefined: Chern",
        "  polynomial: [0.0, 1.0]\n  class_type: additive\n  name: tr",
    );
    let problem = Problem::from_yaml_str(&custom).unwrap();
    let report = evaluate::evaluate(&problem, CharClassConfig::default()).unwrap();
    assert_eq!(report.class.class_type, ClassType::Additive);
    assert_eq!(report.class.function, "x");
    assert_eq!(report.display, "tr(E, nabla) = tr_0(E, nabla) + zero + tr_1(E, nabla)");
}

#[test]
fn classes_listing_covers_registry() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("classes.json");
    classes::run(&ClassesArgs {
        out: Some(out.clone()),
    })
    .unwrap();
    let listing: serde_json::Value = serde_json::from_slice(&fs::read(out).unwrap()).unwrap();
    let keys: Vec<&str> = listing
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["key"].as_str().unwrap())
        .collect();
    assert_eq!(
        keys,
        vec!["ChernChar", "Todd", "Chern", "Pontryagin", "AHat", "Hirzebruch", "Euler"]
    );
    assert_eq!(classes::registry()[6].class_type, ClassType::Pfaffian);
}
