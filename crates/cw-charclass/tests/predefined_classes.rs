use nalgebra::Normed;
use std::sync::Arc;

use cw_charclass::{build_report, CharacteristicClass, PredefinedClass};
use cw_core::{ClassType, FieldType};
use cw_forms::{stable_hash_string, Complex64, DiffForm};
use cw_manifold::{ConnectionArena, Manifold, TabulatedConnection, VectorBundle};

fn assert_coefficients(class: &CharacteristicClass, expected: &[f64]) {
    let got = class.coefficients();
    assert_eq!(got.len(), expected.len(), "{got:?}");
    for (value, want) in got.iter().zip(expected) {
        assert!((value - Complex64::new(*want, 0.0)).norm() < 1e-12, "{got:?}");
    }
}

fn complex_bundle(dim: usize) -> Arc<VectorBundle> {
    let base = Arc::new(Manifold::new(dim, "M"));
    Arc::new(VectorBundle::new(base, 1, "E", FieldType::Complex))
}

fn tangent_bundle(dim: usize) -> Arc<VectorBundle> {
    Arc::new(VectorBundle::tangent(Arc::new(Manifold::new(dim, "M"))))
}

#[test]
fn todd_class_coefficients() {
    let todd = CharacteristicClass::predefined(complex_bundle(6), "Todd").unwrap();
    assert_coefficients(&todd, &[1.0, 0.5, 1.0 / 12.0]);
    assert_eq!(todd.class_type(), ClassType::Additive);
    assert_eq!(todd.latex(), "\\mathrm{Td}(E)");
}

#[test]
fn chern_character_uses_exponential() {
    let ch = CharacteristicClass::predefined(complex_bundle(4), "ChernChar").unwrap();
    assert_coefficients(&ch, &[1.0, 1.0, 0.5]);
}

#[test]
fn pontryagin_class_expands_in_even_powers() {
    let p = CharacteristicClass::predefined(tangent_bundle(4), "Pontryagin").unwrap();
    assert_coefficients(&p, &[1.0, 0.0, 0.5]);
    assert_eq!(
        p.to_string(),
        "Characteristic class p of multiplicative type associated to x + 1 on the \
         Tangent bundle TM over the 4-dimensional differentiable manifold M"
    );
}

#[test]
fn euler_class_keeps_the_linear_term() {
    let e = CharacteristicClass::predefined(tangent_bundle(2), "Euler").unwrap();
    assert_coefficients(&e, &[0.0, 1.0]);
    assert_eq!(e.class_type(), ClassType::Pfaffian);
}

#[test]
fn hirzebruch_and_a_hat_start_at_one() {
    for key in ["Hirzebruch", "AHat"] {
        let class = CharacteristicClass::predefined(tangent_bundle(4), key).unwrap();
        assert_eq!(class.coefficients().len(), 3);
        assert!((class.coefficients()[0] - Complex64::new(1.0, 0.0)).norm() < 1e-12);
        assert!(class.coefficients()[1].norm() < 1e-12);
    }
}

#[test]
fn field_mismatch_and_unknown_keys_fail() {
    let err = CharacteristicClass::predefined(tangent_bundle(2), "Chern").unwrap_err();
    assert_eq!(err.code(), "field-mismatch");
    assert_eq!(err.info().message, "base field must be complex for class 'Chern'");

    let err = CharacteristicClass::predefined(complex_bundle(2), "Pontryagin").unwrap_err();
    assert_eq!(err.code(), "field-mismatch");

    let err = CharacteristicClass::predefined(complex_bundle(2), "Segre").unwrap_err();
    assert_eq!(err.code(), "unknown-class");
}

#[test]
fn every_predefined_class_builds_on_a_matching_bundle() {
    for class in PredefinedClass::ALL {
        let bundle = match class.signature().field {
            FieldType::Complex => complex_bundle(4),
            _ => tangent_bundle(4),
        };
        let built = CharacteristicClass::predefined(bundle, class.key()).unwrap();
        assert_eq!(built.name(), Some(class.signature().name));
    }
}

#[test]
fn report_records_class_and_form() {
    let mut base = Manifold::new(2, "M");
    let u = base.open_subset(base.root(), "U").unwrap();
    let mut bundle = VectorBundle::new(Arc::new(base), 1, "E", FieldType::Complex);
    let frame = bundle.local_frame("e", u).unwrap();
    let bundle = Arc::new(bundle);

    let mut connection = TabulatedConnection::bundle(&bundle, "nabla");
    let omega = DiffForm::monomial(2, &[0, 1], Complex64::new(0.0, 1.0)).unwrap();
    connection.set_curvature_form(1, 1, frame, omega).unwrap();
    let mut arena = ConnectionArena::new();
    let id = arena.insert(connection);

    let class = CharacteristicClass::predefined(Arc::clone(&bundle), "Chern").unwrap();
    let form = class.get_form(&arena, id, None).unwrap();
    let report = build_report(&class, &form, Some("nabla")).unwrap();

    assert_eq!(report.class.name.as_deref(), Some("c"));
    assert_eq!(report.class.coefficients, vec![[1.0, 0.0], [1.0, 0.0]]);
    assert_eq!(report.connection.as_deref(), Some("nabla"));
    assert_eq!(report.display, "c(E, nabla) = c_0(E, nabla) + zero + c_1(E, nabla)");
    assert_eq!(report.expansions.keys().collect::<Vec<_>>(), vec!["U"]);
    assert_eq!(report.form_hash, stable_hash_string(&*form).unwrap());
    assert_eq!(report.form, *form);
}
