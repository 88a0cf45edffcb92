use anyhow::{anyhow, Context};
use atoms::{build_special, Atoms, Domain, NeighborList};
use control::Control;
use drude::{DrudeTypes, ParticleRole, PartnerRegistry};
use dwconsts::*;
use dwmpi::{Comm, SerialComm};
use rctransform::ReducedTransform;
use tempdrude::TempDrude;
use thole::{PairContext, PairThole};
use vector3::Vector3f64;

mod system;
use system::System;

fn main() -> anyhow::Result<()> {
    // start the timer-main

    let stopwatch_main = std::time::Instant::now();

    let comm = SerialComm::new();

    // read in control parameters

    let mut control = Control::new();
    control.read_file("in.ctrl")?;

    // RUST_LOG still takes precedence over the verbosity
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(control.get_log_filter())).init();

    control.display();

    // read in the molecular system

    let mut system = System::new();
    system.read_file(control.get_system_file())?;

    system.display();

    let ntypes = system.get_ntypes();

    let types = DrudeTypes::parse(control.get_drude_types(), control.get_drude_pairs(), ntypes)?;
    let mut registry = PartnerRegistry::new(types);

    let mut atoms = Atoms::new(ntypes, true, false);

    for group in control.get_groups().iter() {
        atoms
            .define_group_by_types(&group.name, &group.types)
            .with_context(|| format!("group '{}'", group.name))?;
    }

    system.populate(&mut atoms, &mut [&mut registry])?;

    // pair style

    let mut thole = PairThole::new(ntypes);

    thole.settings(&control.get_pair_thole())?;

    for args in control.get_pair_coeff().iter() {
        thole.coeff(args)?;
    }

    let cut_max = thole.init(&atoms)?;

    thole.display();

    // periodic images and core/Drude topology

    let domain = Domain::new(
        system.get_lo(),
        system.get_hi(),
        [true; 3],
        control.get_dimension(),
    );

    domain.borders(&mut atoms, cut_max, &mut [&mut registry])?;

    registry.build_partner_links(&atoms, &comm)?;

    build_special(&mut atoms)?;
    registry.rebuild_special(&mut atoms, &comm)?;

    // induced-dipole interactions

    let newton_pair = control.get_newton_pair();

    let list = NeighborList::build_half(&atoms, cut_max, newton_pair);

    let ctx = PairContext::new(
        control.get_units().get_qqrd2e(control.get_dielectric()),
        control.get_special_coul(),
        newton_pair,
    );

    atoms.f.iter_mut().for_each(|f| f.set_zeros());

    let ev = thole.compute(&mut atoms, &registry, &list, &ctx, true, true)?;

    if newton_pair {
        domain.reverse_comm_forces(&mut atoms);
    }

    let ev = ev.all_sum(&comm);

    let fmax = atoms.f[..atoms.nlocal]
        .iter()
        .map(|f| f.norm2())
        .fold(0.0, f64::max);

    let mut fsum = Vector3f64::zeros();
    for f in atoms.f[..atoms.nlocal].iter() {
        fsum += *f;
    }

    // temperature

    let temp_bit = group_bit(&atoms, control.get_temp_group())?;

    let mut temperature = TempDrude::new(temp_bit, control.get_dimension(), control.get_units());
    temperature.set_extra_dof(control.get_temp_extra_dof());
    temperature.set_dynamic(control.get_temp_dynamic());
    temperature.setup(&atoms, &[], &comm);

    let t = temperature.compute_scalar(&atoms, &registry, &comm)?;
    let ke_tensor = temperature.compute_vector(&atoms, &registry, &comm)?;

    // reduced-coordinate round trip

    let mut transform = ReducedTransform::new(group_bit(&atoms, control.get_transform_group())?);

    let ke_real = kinetic_energy(&atoms, &comm) * control.get_units().get_mvv2e();

    let x0 = atoms.x.clone();
    let v0 = atoms.v.clone();

    let npairs = transform.direct(&mut atoms, &mut registry)?;

    let ke_reduced = kinetic_energy(&atoms, &comm) * control.get_units().get_mvv2e();

    transform.inverse(&mut atoms, &mut registry)?;

    let mut dx_max: f64 = 0.0;
    let mut dv_max: f64 = 0.0;

    for i in 0..atoms.nlocal {
        dx_max = dx_max.max(domain.minimum_image(atoms.x[i] - x0[i]).norm2());
        dv_max = dv_max.max((atoms.v[i] - v0[i]).norm2());
    }

    // report

    let ncores = (0..atoms.nlocal)
        .filter(|&i| registry.role_of(&atoms, i) == ParticleRole::Core)
        .count();

    println!();
    println!("   {:-^80}", " core/Drude topology ");
    println!();

    print_row("roles", registry.get_types().letters());
    print_row("core/Drude pairs", comm.all_sum_scalar_i64(ncores as i64));
    print_row("ghost images", atoms.nghost);
    print_row("neighbor pairs", list.total_neighbors());

    println!();
    println!("   {:-^80}", " thole ");
    println!();

    print_row("energy", format!("{:.10E}", ev.eng_coul));
    for (name, w) in ["xx", "yy", "zz", "xy", "xz", "yz"].iter().zip(ev.virial.iter()) {
        print_row(format!("virial {}", name), format!("{:.10E}", w));
    }
    print_row("max |f|", format!("{:.10E}", fmax));
    print_row("|sum f|", format!("{:.10E}", fsum.norm2()));

    println!();
    println!("   {:-^80}", " temperature ");
    println!();

    print_row("dof", temperature.get_dof());
    print_row("temperature", format!("{:.6}", t));
    for (name, k) in ["xx", "yy", "zz", "xy", "xz", "yz"].iter().zip(ke_tensor.iter()) {
        print_row(format!("ke {}", name), format!("{:.10E}", k));
    }

    println!();
    println!("   {:-^80}", " reduced coordinates ");
    println!();

    print_row("transformed pairs", npairs);
    print_row("ke real", format!("{:.10E}", ke_real));
    print_row("ke reduced", format!("{:.10E}", ke_reduced));
    print_row("max |dx| round trip", format!("{:.3E}", dx_max));
    print_row("max |dv| round trip", format!("{:.3E}", dv_max));

    if dx_max > EPS8 || dv_max > EPS8 {
        log::warn!("round trip deviates by {:.3E} in x and {:.3E} in v", dx_max, dv_max);
    }

    println!();
    println!(
        "   {:<width1$} = {:>width2$.2} s",
        "total time",
        stopwatch_main.elapsed().as_secs_f64(),
        width1 = OUT_WIDTH1,
        width2 = OUT_WIDTH2
    );

    Ok(())
}

fn group_bit(atoms: &Atoms, name: &str) -> anyhow::Result<u32> {
    atoms
        .group_bit(name)
        .ok_or_else(|| anyhow!("group '{}' is not defined", name))
}

fn kinetic_energy(atoms: &Atoms, comm: &dyn Comm) -> f64 {
    let ke: f64 = (0..atoms.nlocal)
        .map(|i| 0.5 * atoms.mass_of(i) * atoms.v[i].norm2_squared())
        .sum();

    comm.all_sum_scalar_f64(ke)
}

fn print_row<K: std::fmt::Display, V: std::fmt::Display>(key: K, val: V) {
    println!(
        "   {:<width1$} = {:>width2$}",
        key.to_string(),
        val.to_string(),
        width1 = OUT_WIDTH1,
        width2 = OUT_WIDTH2
    );
}
