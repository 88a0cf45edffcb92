use approx::assert_relative_eq;
use atoms::{build_special, Atoms, Domain, NeighborList};
use drude::{DrudeTypes, PartnerRegistry};
use dwconsts::REAL_QQR2E;
use dwmpi::SerialComm;
use thole::*;
use vector3::*;

const BOX: f64 = 20.0;
const CUT: f64 = 6.0;

// (tag, type, charge, x) with types 1 = core, 2 = Drude, 3 = plain
type Record = (i64, usize, f64, Vector3f64);

fn two_molecules(offset: Vector3f64) -> Vec<Record> {
    let a = Vector3f64::new(5.0, 10.0, 10.0);
    let b = a + offset;

    vec![
        (1, 1, 1.0, a),
        (2, 2, -0.3, a + Vector3f64::new(0.1, 0.05, -0.02)),
        (3, 1, 0.5, b),
        (4, 2, -0.2, b + Vector3f64::new(-0.05, 0.1, 0.03)),
    ]
}

struct Setup {
    atoms: Atoms,
    registry: PartnerRegistry,
    pair: PairThole,
    ctx: PairContext,
}

fn setup(records: &[Record], charge: bool) -> Setup {
    let mut atoms = Atoms::new(3, charge, false);
    for t in 1..=3 {
        atoms.set_mass(t, 1.0).unwrap();
    }

    for &(tag, itype, q, x) in records.iter() {
        let i = atoms
            .add_atom(tag, itype, x, Vector3f64::zeros(), q, &mut [])
            .unwrap();

        if itype == 1 {
            atoms.add_bond(i, tag + 1);
        }
    }

    build_special(&mut atoms).unwrap();

    let mut registry = PartnerRegistry::new(DrudeTypes::parse("C D N", "1:2", 3).unwrap());
    registry
        .build_partner_links(&atoms, &SerialComm::new())
        .unwrap();

    let mut pair = PairThole::new(3);
    pair.settings(&["2.6", &CUT.to_string()]).unwrap();
    pair.coeff(&["*", "*", "1.0"]).unwrap();

    Setup {
        atoms,
        registry,
        pair,
        ctx: PairContext::new(REAL_QQR2E, [0.0, 0.0, 0.5], true),
    }
}

fn evaluate(s: &mut Setup, newton_pair: bool) -> EnergyVirial {
    s.ctx.newton_pair = newton_pair;
    s.pair.init(&s.atoms).unwrap();

    for f in s.atoms.f.iter_mut() {
        f.set_zeros();
    }

    let list = NeighborList::build_half(&s.atoms, CUT, newton_pair);

    s.pair
        .compute(&mut s.atoms, &s.registry, &list, &s.ctx, true, true)
        .unwrap()
}

fn expected_energy(records: &[Record]) -> f64 {
    let a = 2.6;
    let mut e = 0.0;

    // Drude particles keep their charge, cores take minus their Drude's
    let charge = |k: usize| -> f64 {
        if records[k].1 == 2 {
            records[k].2
        } else {
            -records[k + 1].2
        }
    };

    for (i, j) in [(0, 2), (0, 3), (1, 2), (1, 3)] {
        let r = (records[i].3 - records[j].3).norm2();
        let (_, factor_e) = thole_factors(a, r, 1.0);
        e += factor_e * REAL_QQR2E * charge(i) * charge(j) / r;
    }

    e
}

#[test]
fn test_energy_uses_split_charges() {
    let records = two_molecules(Vector3f64::new(2.5, 0.5, 0.0));
    let mut s = setup(&records, true);

    let ev = evaluate(&mut s, true);

    assert_relative_eq!(ev.eng_coul, expected_energy(&records), max_relative = 1e-12);
}

#[test]
fn test_forces_are_pairwise_and_conservative() {
    let records = two_molecules(Vector3f64::new(2.0, -0.7, 0.4));
    let mut s = setup(&records, true);

    evaluate(&mut s, true);

    let total = s.atoms.f[..4]
        .iter()
        .fold(Vector3f64::zeros(), |acc, &f| acc + f);
    assert_relative_eq!(total.norm2(), 0.0, epsilon = 1e-10);

    // force on the first Drude particle against a central difference
    let h = 1e-5;
    let d = s.atoms.map(2).unwrap();
    let force = s.atoms.f[d];

    for idim in 0..3 {
        let mut moved = records.clone();

        moved[1].3.set(idim, records[1].3.get(idim) + h);
        let ep = evaluate(&mut setup(&moved, true), true).eng_coul;

        moved[1].3.set(idim, records[1].3.get(idim) - h);
        let em = evaluate(&mut setup(&moved, true), true).eng_coul;

        assert_relative_eq!(force.get(idim), -(ep - em) / (2.0 * h), epsilon = 1e-5, max_relative = 1e-5);
    }
}

#[test]
fn test_own_partner_does_not_interact() {
    let records = two_molecules(Vector3f64::new(2.0, 0.0, 0.0));
    let mut s = setup(&records[..2], true);

    let ev = evaluate(&mut s, true);

    assert_eq!(ev.eng_coul, 0.0);
    assert_eq!(ev.virial, [0.0; 6]);
    assert!(s.atoms.f[..2].iter().all(|f| *f == Vector3f64::zeros()));
}

#[test]
fn test_plain_atoms_do_not_interact() {
    let mut records = two_molecules(Vector3f64::new(2.0, 0.0, 0.0));
    records.truncate(2);
    records.push((5, 3, 1.0, Vector3f64::new(6.0, 10.0, 10.0)));

    let mut s = setup(&records, true);
    let ev = evaluate(&mut s, true);

    assert_eq!(ev.eng_coul, 0.0);
}

#[test]
fn test_single_matches_compute() {
    let records = two_molecules(Vector3f64::new(1.5, 1.0, -0.5));
    let mut s = setup(&records, true);

    let ev = evaluate(&mut s, true);

    let mut energy = 0.0;
    for i in 0..4 {
        for j in (i + 1)..4 {
            let rsq = (s.atoms.x[i] - s.atoms.x[j]).norm2_squared();
            let (e, _) = s
                .pair
                .single(
                    &s.atoms,
                    &s.registry,
                    &s.ctx,
                    i,
                    j,
                    s.atoms.atom_type[i],
                    s.atoms.atom_type[j],
                    rsq,
                    s.ctx.special_coul[0],
                )
                .unwrap();
            energy += e;
        }
    }

    assert_relative_eq!(energy, ev.eng_coul, max_relative = 1e-12);

    // the force on the first core is the sum of fforce * del over the other molecule
    let mut f0 = Vector3f64::zeros();
    for j in [2, 3] {
        let del = s.atoms.x[0] - s.atoms.x[j];
        let (_, fforce) = s
            .pair
            .single(&s.atoms, &s.registry, &s.ctx, 0, j, 1, s.atoms.atom_type[j], del.norm2_squared(), 1.0)
            .unwrap();
        f0 += del * fforce;
    }

    assert_relative_eq!((f0 - s.atoms.f[0]).norm2(), 0.0, epsilon = 1e-12);
}

#[test]
fn test_newton_off_matches_newton_on_across_the_boundary() {
    let domain = Domain::new(
        Vector3f64::zeros(),
        Vector3f64::new(BOX, BOX, BOX),
        [true; 3],
        3,
    );

    let mut records = two_molecules(Vector3f64::zeros());
    records[0].3 = Vector3f64::new(0.5, 10.0, 10.0);
    records[1].3 = Vector3f64::new(0.6, 10.0, 10.0);
    records[2].3 = Vector3f64::new(19.3, 10.0, 10.0);
    records[3].3 = Vector3f64::new(19.4, 10.0, 10.0);

    let mut results = Vec::new();

    for &newton in [true, false].iter() {
        let mut s = setup(&records, true);
        domain
            .borders(&mut s.atoms, CUT, &mut [&mut s.registry])
            .unwrap();

        let ev = evaluate(&mut s, newton);
        domain.reverse_comm_forces(&mut s.atoms);

        let forces: Vec<Vector3f64> = (1..=4).map(|tag| s.atoms.f[s.atoms.map(tag).unwrap()]).collect();

        results.push((ev, forces));
    }

    let (on, off) = (&results[0], &results[1]);

    assert!(on.0.eng_coul.abs() > 0.0);
    assert_relative_eq!(on.0.eng_coul, off.0.eng_coul, max_relative = 1e-12);

    for k in 0..6 {
        assert_relative_eq!(on.0.virial[k], off.0.virial[k], epsilon = 1e-10, max_relative = 1e-10);
    }

    for (a, b) in on.1.iter().zip(off.1.iter()) {
        assert_relative_eq!((*a - *b).norm2(), 0.0, epsilon = 1e-10);
    }
}

#[test]
fn test_charge_attribute_is_required() {
    let records = two_molecules(Vector3f64::new(2.0, 0.0, 0.0));
    let mut s = setup(&records, false);

    assert_eq!(s.pair.init(&s.atoms), Err(TholeError::MissingCharge));

    let list = NeighborList::build_half(&s.atoms, CUT, true);
    assert_eq!(
        s.pair
            .compute(&mut s.atoms, &s.registry, &list, &s.ctx, true, true),
        Err(TholeError::NotInitialized)
    );
}

#[test]
fn test_ghost_drude_without_its_core() {
    let records = two_molecules(Vector3f64::new(2.5, 0.5, 0.0));

    let mut local = setup(&records[..2], true);
    let mut remote = setup(&records[2..], true);

    // only the Drude particle of the second molecule reaches this process
    let k = remote.atoms.map(4).unwrap();
    let buf = remote
        .atoms
        .pack_border(&[k], Vector3f64::zeros(), &[&mut remote.registry]);
    let g = local
        .atoms
        .unpack_border(1, &buf, &mut [&mut local.registry])
        .unwrap();

    assert_eq!(local.atoms.map(3), None);
    assert_eq!(local.registry.partner_of(g), Some(3));

    let ev = evaluate(&mut local, true);

    let mut expected = 0.0;
    for (i, qi) in [(0, 0.3), (1, -0.3)] {
        let r = (records[i].3 - records[3].3).norm2();
        let (_, factor_e) = thole_factors(2.6, r, 1.0);
        expected += factor_e * REAL_QQR2E * qi * -0.2 / r;
    }

    assert_relative_eq!(ev.eng_coul, expected, max_relative = 1e-12);

    let rsq = (local.atoms.x[0] - local.atoms.x[g]).norm2_squared();
    let (e, _) = local
        .pair
        .single(&local.atoms, &local.registry, &local.ctx, 0, g, 1, 2, rsq, 1.0)
        .unwrap();

    let (_, factor_e) = thole_factors(2.6, rsq.sqrt(), 1.0);
    assert_relative_eq!(e, factor_e * REAL_QQR2E * 0.3 * -0.2 / rsq.sqrt(), max_relative = 1e-12);
}
