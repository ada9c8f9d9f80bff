//! Integration tests for strata-material.

use strata_material::newtonian::VOLUMETRIC_STRAIN;
use strata_material::{ConstitutiveModel, LinearElastic, Material, MaterialTable, Newtonian};
use strata_math::SymTensor;
use strata_types::MaterialId;

// ─── LinearElastic Tests ──────────────────────────────────────

#[test]
fn elastic_rejects_bad_poisson_ratio() {
    assert!(LinearElastic::new(1.0e6, 0.5, 1000.0).is_err());
    assert!(LinearElastic::new(-1.0, 0.3, 1000.0).is_err());
    assert!(LinearElastic::new(1.0e6, 0.3, 0.0).is_err());
}

#[test]
fn elastic_uniaxial_strain() {
    let m = LinearElastic::new(1.0e6, 0.25, 1000.0).unwrap();
    let mut state = m.initial_state();
    let de = SymTensor::new(1.0e-3, 0.0, 0.0, 0.0);
    let s = m.compute_stress(&SymTensor::ZERO, &de, &mut state, 1.0e-3).unwrap();

    let lambda = m.lambda();
    let mu = m.shear_modulus();
    assert!((s.xx - (lambda + 2.0 * mu) * 1.0e-3).abs() < 1e-6);
    assert!((s.yy - lambda * 1.0e-3).abs() < 1e-6);
    assert!((s.zz - lambda * 1.0e-3).abs() < 1e-6);
    assert_eq!(s.xy, 0.0);
}

#[test]
fn elastic_zero_strain_keeps_stress() {
    let m = LinearElastic::new(1.0e6, 0.3, 1000.0).unwrap();
    let sigma = SymTensor::new(-10.0, -5.0, -4.0, 1.0);
    let mut state = m.initial_state();
    let s = m.compute_stress(&sigma, &SymTensor::ZERO, &mut state, 1.0e-3).unwrap();
    assert_eq!(s, sigma);
}

// ─── Newtonian Tests ──────────────────────────────────────────

#[test]
fn newtonian_accumulates_volumetric_strain() {
    let m = Newtonian::new(2.0e6, 0.0, 1000.0).unwrap();
    let mut state = m.initial_state();
    let de = SymTensor::new(-1.0e-4, -1.0e-4, 0.0, 0.0);

    m.compute_stress(&SymTensor::ZERO, &de, &mut state, 1.0e-3).unwrap();
    let s = m.compute_stress(&SymTensor::ZERO, &de, &mut state, 1.0e-3).unwrap();

    assert!((state.get(VOLUMETRIC_STRAIN) + 4.0e-4).abs() < 1e-15);
    // Compression gives positive pressure, i.e. negative mean stress.
    assert!((s.mean() - 2.0e6 * -4.0e-4).abs() < 1e-6);
}

#[test]
fn newtonian_viscous_shear() {
    let m = Newtonian::new(2.0e6, 1.0e-3, 1000.0).unwrap();
    let mut state = m.initial_state();
    let de = SymTensor::new(0.0, 0.0, 0.0, 1.0e-3);
    let s = m.compute_stress(&SymTensor::ZERO, &de, &mut state, 1.0e-3).unwrap();
    assert!((s.xy - 2.0e-3).abs() < 1e-12);
}

// ─── Material Table Tests ─────────────────────────────────────

#[test]
fn table_lookup() {
    let table = MaterialTable::new(vec![
        Material::LinearElastic(LinearElastic::new(1.0e6, 0.3, 1800.0).unwrap()),
        Material::Newtonian(Newtonian::new(2.0e6, 1.0e-3, 1000.0).unwrap()),
    ])
    .unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.get(MaterialId(1)).unwrap().name(), "newtonian");
    assert_eq!(table.get(MaterialId(0)).unwrap().density(), 1800.0);
    assert!(table.get(MaterialId(2)).is_err());
}

#[test]
fn material_from_toml() {
    let src = r#"
        model = "linear_elastic"
        youngs_modulus = 1.0e6
        poisson_ratio = 0.3
        density = 1800.0
    "#;
    let material: Material = toml::from_str(src).unwrap();
    assert!(matches!(material, Material::LinearElastic(_)));
    assert!(material.validate().is_ok());
}
