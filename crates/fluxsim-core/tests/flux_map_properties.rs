use fluxsim_core::domain::FluxErrorCategory;
use fluxsim_core::modules::flux_map::{AngularFluxTable, FluxMapSynthesizer, synthesize};
use fluxsim_core::numerics::RingGeometry;

fn uniform_table(particle: &str, energy: f64, fluxes: &[f64]) -> String {
    let intervals = (fluxes.len() - 1) as f64;
    let mut csv = String::from("particle,energy,costheta,flux\n");
    for (index, flux) in fluxes.iter().enumerate() {
        let cosine = -1.0 + 2.0 * index as f64 / intervals;
        csv.push_str(&format!("{particle},{energy},{cosine},{flux}\n"));
    }
    csv
}

fn parse(csv: &str) -> AngularFluxTable {
    AngularFluxTable::parse_csv(csv, "fixture").expect("fixture table should parse")
}

#[test]
fn maps_have_one_finite_value_per_pixel() {
    let table = parse(&uniform_table("proton", 100.0, &[4.0, 3.0, 2.5, 1.0, 0.5, 0.0]));
    for nside in [1_u32, 2, 4, 8, 16] {
        let map = synthesize(&table, "proton", 100.0, nside).expect("map should build");
        assert_eq!(map.npix() as u64, 12 * u64::from(nside) * u64::from(nside));
        assert!(map.values().iter().all(|value| value.is_finite()));
    }
}

#[test]
fn monotone_tables_stay_within_sample_bounds() {
    let fluxes = [9.0, 7.5, 7.0, 4.0, 3.5, 1.0, 0.25, 0.125, 0.0];
    let table = parse(&uniform_table("muplus", 2.0, &fluxes));
    let map = synthesize(&table, "muplus", 2.0, 8).expect("map should build");
    let (lo, hi) = map.min_max().expect("non-empty map");
    assert!(lo >= 0.0, "minimum {lo}");
    assert!(hi <= 9.0, "maximum {hi}");
}

#[test]
fn top_cell_pixels_take_the_penultimate_sample() {
    let fluxes = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
    let table = parse(&uniform_table("electr", 1.0, &fluxes));
    let threshold = 1.0 - 2.0 / 6.0;

    for nside in [1_u32, 4, 16] {
        let geometry = RingGeometry::new(nside).expect("valid nside");
        let map = synthesize(&table, "electr", 1.0, nside).expect("map should build");
        let mut top_cell_pixels = 0;
        for (pixel, cosine) in geometry.cos_colatitudes().into_iter().enumerate() {
            if cosine >= threshold {
                top_cell_pixels += 1;
                assert_eq!(map.values()[pixel], 6.0, "nside {nside} pixel {pixel}");
            }
        }
        assert!(top_cell_pixels > 0);
    }
}

#[test]
fn grid_aligned_pixels_reproduce_tabulated_values() {
    // The equatorial ring sits at cos θ = 0, a grid point whenever the
    // sample count is 2^k + 1.
    for fluxes in [
        vec![3.0, 2.0, 1.0],
        vec![5.0, 4.0, 3.5, 2.0, 1.0],
        vec![9.0, 8.0, 7.0, 6.0, 5.5, 4.0, 3.0, 2.0, 1.0],
    ] {
        let middle = fluxes[(fluxes.len() - 1) / 2];
        let table = parse(&uniform_table("photon", 10.0, &fluxes));
        let geometry = RingGeometry::new(1).expect("valid nside");
        let map = synthesize(&table, "photon", 10.0, 1).expect("map should build");
        for (pixel, cosine) in geometry.cos_colatitudes().into_iter().enumerate() {
            if cosine == 0.0 {
                assert_eq!(map.values()[pixel], middle);
            }
        }
    }
}

#[test]
fn non_uniform_sampling_is_insufficient_data() {
    let table = parse(
        "particle,energy,costheta,flux\nneutro,1,-1,1\nneutro,1,-0.2,1\nneutro,1,0.5,1\nneutro,1,1,1\n",
    );
    let error = synthesize(&table, "neutro", 1.0, 4).expect_err("non-uniform grid");
    assert_eq!(error.category(), FluxErrorCategory::DataInsufficient);
    assert_eq!(error.placeholder(), "DATA.NONUNIFORM_SAMPLING");
}

#[test]
fn single_sample_slice_is_insufficient_data() {
    let table = parse("particle,energy,costheta,flux\nneutro,1,1,1\n");
    let error = synthesize(&table, "neutro", 1.0, 1).expect_err("one sample");
    assert_eq!(error.placeholder(), "DATA.TOO_FEW_SAMPLES");
}

#[test]
fn five_sample_profile_end_to_end() {
    let table = parse(&uniform_table("proton", 10.0, &[1.0, 0.8, 0.5, 0.3, 0.1]));
    let geometry = RingGeometry::new(1).expect("valid nside");
    let map = synthesize(&table, "proton", 10.0, 1).expect("map should build");

    assert_eq!(map.npix(), 12);
    for (pixel, cosine) in geometry.cos_colatitudes().into_iter().enumerate() {
        if cosine >= 0.5 {
            assert_eq!(map.values()[pixel], 0.3);
        }
    }
}

#[test]
fn bundle_integrates_over_energy() {
    let mut csv = uniform_table("proton", 1.0, &[2.0, 2.0, 2.0]);
    csv.push_str(
        uniform_table("proton", 3.0, &[4.0, 4.0, 4.0])
            .trim_start_matches("particle,energy,costheta,flux\n"),
    );
    let table = parse(&csv);
    let bundle = FluxMapSynthesizer::new(2)
        .expect("valid nside")
        .synthesize_particle(&table, "proton")
        .expect("bundle should build");
    let integrated = bundle.integrated_map().expect("two bands integrate");
    assert_eq!(integrated.npix(), 48);
    assert!(integrated.values().iter().all(|value| *value == 6.0));
}
