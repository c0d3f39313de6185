//! End-to-end composition of mixtures and autoregressive losses
use nalgebra::{dvector, DMatrix};
use provar::prelude::*;
use provar::varmap;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

fn three_component_mixture() -> MixtureModel {
    let components: Vec<Box<dyn Distribution>> = vec![
        Box::new(
            Normal::new("p_0", "x", dvector![-10.0], dvector![1.0]).unwrap(),
        ),
        Box::new(
            Normal::new("p_1", "x", dvector![0.0], dvector![1.0]).unwrap(),
        ),
        Box::new(
            Normal::new("p_2", "x", dvector![10.0], dvector![1.0]).unwrap(),
        ),
    ];
    let prior = Categorical::new("prior", "z", &[0.2, 0.5, 0.3]).unwrap();
    MixtureModel::new(components, Box::new(prior), "p").unwrap()
}

#[test]
fn posterior_recovers_the_generating_component() {
    let mut rng = Xoshiro256Plus::seed_from_u64(0xDECAF);
    let mm = three_component_mixture();

    let n = 200;
    let out = mm.sample(n, true, &mut rng);
    let xs = get_values(&out, &["x".to_string()]);
    let resps = mm.get_posterior_probs(&xs).unwrap();

    // components are 10 sigma apart, so the posterior arg-max should
    // recover the hidden assignment for every draw
    let mut recovered = 0;
    for j in 0..n {
        let true_ix = (0..3)
            .max_by(|&a, &b| {
                out["z"][(j, a)].partial_cmp(&out["z"][(j, b)]).unwrap()
            })
            .unwrap();
        let map_ix = (0..3)
            .max_by(|&a, &b| {
                resps[(a, j)].partial_cmp(&resps[(b, j)]).unwrap()
            })
            .unwrap();
        if true_ix == map_ix {
            recovered += 1;
        }
    }
    assert_eq!(recovered, n);
}

#[test]
fn mixture_nll_feeds_an_autoregressive_objective() {
    let mm = three_component_mixture();
    let x = varmap! {
        "x" => DMatrix::from_row_slice(4, 1, &[-10.0, -0.5, 0.5, 10.0])
    };
    let mean_ll = mm.log_likelihood(&x).unwrap().mean();

    let loss = ArDrawLoss::new(3)
        .with_step_loss(Box::new(NllLoss::new(Box::new(mm))))
        .with_last_loss(Box::new(ValueLoss::new(1.0)));

    assert_eq!(loss.input_var(), &["x".to_string()]);

    // identity transition: three identical step terms plus the constant
    let total = loss.estimate(&x).unwrap();
    assert!((total - (3.0 * -mean_ll + 1.0)).abs() < 1E-10);
}

#[test]
fn series_unroll_scores_each_time_step_once() {
    let p = Normal::standard("p", "x", 1);
    let x = varmap! {
        "x" => DMatrix::from_row_slice(3, 1, &[0.0, 1.0, -1.0])
    };

    let expected: f64 = [0.0_f64, 1.0, -1.0]
        .iter()
        .map(|&v| 0.5 * v * v + 0.918_938_533_204_672_7)
        .sum();

    let loss = ArSeriesLoss::new(3, vec!["x".to_string()])
        .with_step_loss(Box::new(NllLoss::new(Box::new(p))));

    let (total, state) = loss.estimate_with_state(&x).unwrap();
    assert!((total - expected).abs() < 1E-10);
    // the caller gets the full series back, not the last slice
    assert_eq!(state["x"], x["x"]);
}

#[test]
fn summed_losses_compose_with_the_unroll() {
    let a: Box<dyn Loss> = Box::new(ValueLoss::new(0.25));
    let b: Box<dyn Loss> = Box::new(ValueLoss::new(0.75));
    let step = a + b;

    let loss = ArDrawLoss::new(4).with_step_loss(step);
    assert_eq!(loss.estimate(&varmap! {}).unwrap(), 4.0);
}
