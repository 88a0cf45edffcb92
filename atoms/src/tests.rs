use super::*;

use approx::assert_relative_eq;

// A per-atom scalar riding along with the atoms.
#[derive(Default)]
struct Column {
    data: Vec<f64>,
}

impl AtomColumn for Column {
    fn grow(&mut self, nmax: usize) {
        self.data.resize(nmax, 0.0);
    }

    fn copy(&mut self, i: usize, j: usize, _delflag: bool) {
        self.data[j] = self.data[i];
    }

    fn pack_exchange(&self, i: usize, buf: &mut Vec<f64>) -> usize {
        buf.push(self.data[i]);
        1
    }

    fn unpack_exchange(&mut self, nlocal: usize, buf: &[f64]) -> usize {
        self.data[nlocal] = buf[0];
        1
    }

    fn pack_border(&self, list: &[usize], buf: &mut Vec<f64>) -> usize {
        buf.extend(list.iter().map(|&i| self.data[i]));
        list.len()
    }

    fn unpack_border(&mut self, n: usize, first: usize, buf: &[f64]) -> usize {
        self.data[first..first + n].copy_from_slice(&buf[..n]);
        n
    }
}

fn cubic_domain(l: f64) -> Domain {
    Domain::new(Vector3f64::zeros(), Vector3f64::new(l, l, l), [true; 3], 3)
}

fn add(atoms: &mut Atoms, tag: Tag, itype: usize, x: [f64; 3], col: &mut Column) -> usize {
    atoms
        .add_atom(
            tag,
            itype,
            Vector3f64::from_slice(&x),
            Vector3f64::zeros(),
            0.0,
            &mut [col],
        )
        .unwrap()
}

#[test]
fn test_add_atom_and_map() {
    let mut atoms = Atoms::new(2, true, false);
    let mut col = Column::default();

    atoms.set_mass(1, 12.0).unwrap();
    atoms.set_mass(2, 1.0).unwrap();

    add(&mut atoms, 10, 1, [1.0, 1.0, 1.0], &mut col);
    add(&mut atoms, 11, 2, [2.0, 1.0, 1.0], &mut col);

    assert_eq!(atoms.nlocal, 2);
    assert_eq!(atoms.map(10), Some(0));
    assert_eq!(atoms.map(11), Some(1));
    assert_eq!(atoms.map(12), None);
    assert_eq!(atoms.mass_of(1), 1.0);
    assert!(col.data.len() >= 2);

    let err = atoms
        .add_atom(12, 3, Vector3f64::zeros(), Vector3f64::zeros(), 0.0, &mut [])
        .unwrap_err();
    assert_eq!(err, AtomsError::UnknownType { itype: 3, ntypes: 2 });
}

#[test]
fn test_groups_by_type() {
    let mut atoms = Atoms::new(3, false, false);
    let mut col = Column::default();

    add(&mut atoms, 1, 1, [0.0; 3], &mut col);
    add(&mut atoms, 2, 2, [0.0; 3], &mut col);

    let bit = atoms.define_group_by_types("light", &[2, 3]).unwrap();
    assert_eq!(atoms.group_bit("light"), Some(bit));
    assert_eq!(atoms.group_bit("all"), Some(GROUP_ALL_BIT));

    add(&mut atoms, 3, 3, [0.0; 3], &mut col);

    assert_eq!(atoms.mask[0] & bit, 0);
    assert_ne!(atoms.mask[1] & bit, 0);
    assert_ne!(atoms.mask[2] & bit, 0);
    assert_eq!(atoms.group_count(bit, &dwmpi::SerialComm::new()), 2.0);

    assert_eq!(
        atoms.define_group_by_types("light", &[1]),
        Err(AtomsError::DuplicateGroup("light".to_string()))
    );
}

#[test]
fn test_delete_local_moves_columns() {
    let mut atoms = Atoms::new(1, false, false);
    let mut col = Column::default();

    for tag in 1..=3 {
        let i = add(&mut atoms, tag, 1, [tag as f64, 0.0, 0.0], &mut col);
        col.data[i] = 100.0 + tag as f64;
    }

    atoms.delete_local(0, &mut [&mut col]).unwrap();

    assert_eq!(atoms.nlocal, 2);
    assert_eq!(atoms.tag[0], 3);
    assert_eq!(col.data[0], 103.0);
    assert_eq!(atoms.map(3), Some(0));
    assert_eq!(atoms.map(1), None);
}

#[test]
fn test_delete_local_out_of_range() {
    let mut atoms = Atoms::new(1, false, false);
    let mut col = Column::default();

    assert_eq!(
        atoms.delete_local(0, &mut [&mut col]),
        Err(AtomsError::IndexOutOfRange { index: 0, nlocal: 0 })
    );

    add(&mut atoms, 1, 1, [1.0, 0.0, 0.0], &mut col);

    assert_eq!(
        atoms.delete_local(1, &mut [&mut col]),
        Err(AtomsError::IndexOutOfRange { index: 1, nlocal: 1 })
    );

    atoms.delete_local(0, &mut [&mut col]).unwrap();
    assert_eq!(atoms.nlocal, 0);
    assert_eq!(atoms.map(1), None);
}

#[test]
fn test_exchange_between_stores() {
    let mut src = Atoms::new(1, true, true);
    let mut dst = Atoms::new(1, true, true);
    let mut col_src = Column::default();
    let mut col_dst = Column::default();

    src.set_mass(1, 4.0).unwrap();

    let i = add(&mut src, 7, 1, [1.0, 2.0, 3.0], &mut col_src);
    src.add_bond(i, 8);
    src.special[i] = SpecialList::new(vec![8], vec![9], vec![]);
    col_src.data[i] = -2.5;

    let buf = src.pack_exchange(i, &[&mut col_src]);
    let j = dst.unpack_exchange(&buf, &mut [&mut col_dst]).unwrap();

    assert_eq!(dst.tag[j], 7);
    assert_eq!(dst.x[j], Vector3f64::new(1.0, 2.0, 3.0));
    assert_eq!(dst.rmass.as_ref().unwrap()[j], 4.0);
    assert_eq!(dst.bond_atom[j], vec![8]);
    assert_eq!(dst.special[j].level_of(9), 2);
    assert_eq!(col_dst.data[j], -2.5);
    assert_eq!(dst.map(7), Some(j));

    let err = dst.unpack_exchange(&buf[..4], &mut []).unwrap_err();
    assert!(matches!(err, AtomsError::TruncatedBuffer { .. }));
}

#[test]
fn test_minimum_image_and_remap() {
    let domain = cubic_domain(10.0);

    let d = domain.minimum_image(Vector3f64::new(9.0, -6.0, 2.0));
    assert_relative_eq!(d.x, -1.0, epsilon = 1e-12);
    assert_relative_eq!(d.y, 4.0, epsilon = 1e-12);
    assert_relative_eq!(d.z, 2.0, epsilon = 1e-12);

    let x = domain.remap(Vector3f64::new(-0.5, 10.5, 3.0));
    assert_relative_eq!(x.x, 9.5, epsilon = 1e-12);
    assert_relative_eq!(x.y, 0.5, epsilon = 1e-12);
    assert_relative_eq!(x.z, 3.0, epsilon = 1e-12);

    assert_relative_eq!(domain.volume(), 1000.0);
}

#[test]
fn test_borders_images_and_closest() {
    let domain = cubic_domain(10.0);
    let mut atoms = Atoms::new(1, false, false);
    let mut col = Column::default();

    let a = add(&mut atoms, 1, 1, [0.5, 5.0, 5.0], &mut col);
    let b = add(&mut atoms, 2, 1, [9.5, 5.0, 5.0], &mut col);
    col.data[a] = 1.0;
    col.data[b] = 2.0;

    let nghost = domain.borders(&mut atoms, 2.0, &mut [&mut col]).unwrap();
    assert_eq!(nghost, 2);

    // owned copies stay first in the map
    assert_eq!(atoms.map(1), Some(a));
    assert_eq!(atoms.images(1).count(), 2);

    let ghost_of_b = atoms.images(2).nth(1).unwrap();
    assert!(ghost_of_b >= atoms.nlocal);
    assert_relative_eq!(atoms.x[ghost_of_b].x, -0.5, epsilon = 1e-12);
    assert_eq!(col.data[ghost_of_b], 2.0);

    assert_eq!(atoms.closest_image(a, b), ghost_of_b);
    assert_eq!(atoms.closest_image_of_tag(a, 2), Some(ghost_of_b));

    atoms.f[ghost_of_b] = Vector3f64::new(1.0, 0.0, 0.0);
    atoms.f[b] = Vector3f64::new(0.5, 0.0, 0.0);
    domain.reverse_comm_forces(&mut atoms);

    assert_relative_eq!(atoms.f[b].x, 1.5, epsilon = 1e-12);
    assert_eq!(atoms.f[ghost_of_b], Vector3f64::zeros());

    atoms.clear_ghosts();
    assert_eq!(atoms.nghost, 0);
    assert_eq!(atoms.images(2).count(), 1);
}

#[test]
fn test_build_special_chain() {
    let mut atoms = Atoms::new(1, false, false);
    let mut col = Column::default();

    for tag in 1..=5 {
        add(&mut atoms, tag, 1, [tag as f64, 0.0, 0.0], &mut col);
    }

    for i in 0..4 {
        let next = atoms.tag[i + 1];
        atoms.add_bond(i, next);
    }

    build_special(&mut atoms).unwrap();

    let s = &atoms.special[0];
    assert_eq!(s.onetwo, vec![2]);
    assert_eq!(s.onethree, vec![3]);
    assert_eq!(s.onefour, vec![4]);
    assert_eq!(s.level_of(5), 0);

    let s = &atoms.special[2];
    assert_eq!(s.onetwo, vec![2, 4]);
    assert_eq!(s.onethree, vec![1, 5]);
    assert!(s.onefour.is_empty());

    let mut buf = Vec::new();
    s.pack(&mut buf);
    let (back, n) = SpecialList::unpack(&buf).unwrap();
    assert_eq!(n, buf.len());
    assert_eq!(&back, s);
}

#[test]
fn test_build_special_requires_owned_partner() {
    let mut atoms = Atoms::new(1, false, false);
    let mut col = Column::default();

    add(&mut atoms, 1, 1, [0.0; 3], &mut col);
    atoms.add_bond(0, 42);

    assert_eq!(build_special(&mut atoms), Err(AtomsError::MissingAtom { tag: 42 }));
}

#[test]
fn test_half_list_counts_each_pair_once() {
    let domain = cubic_domain(10.0);

    for &newton in [true, false].iter() {
        let mut atoms = Atoms::new(1, false, false);
        let mut col = Column::default();

        add(&mut atoms, 1, 1, [0.5, 5.0, 5.0], &mut col);
        add(&mut atoms, 2, 1, [9.5, 5.0, 5.0], &mut col);
        add(&mut atoms, 3, 1, [1.5, 5.0, 5.0], &mut col);

        atoms.add_bond(0, 3);
        build_special(&mut atoms).unwrap();

        domain.borders(&mut atoms, 2.5, &mut [&mut col]).unwrap();

        let list = NeighborList::build_half(&atoms, 2.5, newton);
        assert_eq!(list.inum(), 3);

        // pairs (1,2) across the boundary, (1,3) directly, (2,3) across at 2.0
        let mut pairs = Vec::new();
        for (ii, &i) in list.get_ilist().iter().enumerate() {
            for &jraw in list.get_neighbors(ii) {
                let j = jraw & NEIGHMASK;
                let (a, b) = (atoms.tag[i], atoms.tag[j]);
                pairs.push((a.min(b), a.max(b), sbmask(jraw)));
            }
        }
        pairs.sort();

        if newton {
            assert_eq!(pairs, vec![(1, 2, 0), (1, 3, 1), (2, 3, 0)]);
        } else {
            // both owners keep their side of a pair that crosses the boundary
            assert_eq!(pairs, vec![(1, 2, 0), (1, 2, 0), (1, 3, 1), (2, 3, 0), (2, 3, 0)]);
        }
    }
}

#[test]
fn test_sbmask_encoding() {
    let j = 12345usize;
    let encoded = j | (2 << SBBITS);
    assert_eq!(encoded & NEIGHMASK, j);
    assert_eq!(sbmask(encoded), 2);
    assert_eq!(sbmask(j), 0);
}
