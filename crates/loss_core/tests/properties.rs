//! Property tests for the loss library and the winnings scorer

use pir_loss_core::{
    AsymmetricLoss, EvalMetric, Objective, OutcomeScorer, Penalty, SquaredObjective,
};
use proptest::prelude::*;

fn price() -> impl Strategy<Value = f64> {
    1.0f64..10_000.0
}

fn penalty() -> impl Strategy<Value = Penalty> {
    (1.0f64..50.0).prop_map(|p| Penalty::new(p).unwrap())
}

proptest! {
    #[test]
    fn under_predictions_win_their_value(truth in price(), frac in 0.0f64..=1.0) {
        let prediction = truth * frac;
        let report = OutcomeScorer::new(vec![truth], vec![prediction]).unwrap().score();

        prop_assert_eq!(report.over_predictions, 0);
        prop_assert_eq!(report.winnings, prediction);
        prop_assert_eq!(report.normalized_winnings, prediction / truth);
    }

    #[test]
    fn over_predictions_win_nothing(truth in price(), excess in 0.001f64..1_000.0) {
        let prediction = truth + excess;
        let report = OutcomeScorer::new(vec![truth], vec![prediction]).unwrap().score();

        prop_assert_eq!(report.over_predictions, 1);
        prop_assert_eq!(report.winnings, 0.0);
        prop_assert_eq!(report.normalized_winnings, 0.0);
    }

    #[test]
    fn over_count_increments_by_one(
        truths in prop::collection::vec(price(), 1..40),
        seed in any::<u64>(),
    ) {
        let predictions: Vec<f64> = truths
            .iter()
            .enumerate()
            .map(|(i, t)| if (seed >> (i % 64)) & 1 == 1 { t + 1.0 } else { t - 0.5 })
            .collect();
        let expected = truths
            .iter()
            .zip(&predictions)
            .filter(|(t, p)| p > t)
            .count();

        let report = OutcomeScorer::new(truths.clone(), predictions).unwrap().score();
        prop_assert_eq!(report.over_predictions, expected);
        prop_assert_eq!(report.total, truths.len());
    }

    #[test]
    fn winnings_monotone_towards_truth(
        truth in price(),
        lo in 0.0f64..=1.0,
        hi in 0.0f64..=1.0,
    ) {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let near = OutcomeScorer::new(vec![truth], vec![truth * hi]).unwrap().score();
        let far = OutcomeScorer::new(vec![truth], vec![truth * lo]).unwrap().score();
        prop_assert!(near.winnings >= far.winnings);
    }

    #[test]
    fn squared_objective_under_branch_is_penalty_free(
        truth in price(),
        frac in 0.0f64..=1.0,
        p in penalty(),
    ) {
        let prediction = truth * frac;
        let err = truth - prediction;
        let gp = SquaredObjective::asymmetric(p).gradient_pair(truth, prediction);
        prop_assert_eq!(gp.grad, -2.0 * err);
        prop_assert_eq!(gp.hess, 2.0);
    }

    #[test]
    fn squared_objective_over_branch_scales(
        truth in price(),
        excess in 0.001f64..1_000.0,
        p in penalty(),
    ) {
        let prediction = truth + excess;
        let err = truth - prediction;
        let gp = SquaredObjective::asymmetric(p).gradient_pair(truth, prediction);
        prop_assert_eq!(gp.grad, -2.0 * p.value() * err);
        prop_assert_eq!(gp.hess, 2.0 * p.value());
    }

    #[test]
    fn larger_penalty_costs_more_when_over(truth in price(), excess in 0.001f64..1_000.0) {
        let prediction = truth + excess;
        let low = Penalty::new(3.0).unwrap();
        let high = Penalty::new(12.0).unwrap();

        let grad_low = SquaredObjective::asymmetric(low).gradient_pair(truth, prediction);
        let grad_high = SquaredObjective::asymmetric(high).gradient_pair(truth, prediction);
        prop_assert!(grad_high.grad > grad_low.grad);
        prop_assert!(grad_high.hess > grad_low.hess);

        for (lo, hi) in [
            (AsymmetricLoss::squared(low), AsymmetricLoss::squared(high)),
            (AsymmetricLoss::absolute(low), AsymmetricLoss::absolute(high)),
        ] {
            prop_assert!(hi.pair_loss(truth, prediction) > lo.pair_loss(truth, prediction));
        }
    }

    #[test]
    fn evaluation_is_mean_of_pair_losses(
        pairs in prop::collection::vec((price(), price()), 1..30),
        p in penalty(),
    ) {
        let (truths, predictions): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        let loss = AsymmetricLoss::absolute(p);
        let eval = loss.evaluate(&truths, &predictions).unwrap();

        let expected = truths
            .iter()
            .zip(&predictions)
            .map(|(&t, &y)| loss.pair_loss(t, y))
            .sum::<f64>()
            / truths.len() as f64;
        prop_assert!((eval.value - expected).abs() <= 1e-9 * expected.abs().max(1.0));
        prop_assert!(!eval.higher_is_better);
    }
}

#[test]
fn scenario_mixed_pairs() {
    let report = OutcomeScorer::new(vec![10.0, 10.0], vec![7.0, 11.0])
        .unwrap()
        .score();
    assert_eq!(report.over_predictions, 1);
    assert!((report.winnings - 7.0).abs() < 1e-12);
    assert!((report.normalized_winnings - 0.7).abs() < 1e-12);
}

#[test]
fn scenario_boundary_counts_as_win() {
    let report = OutcomeScorer::new(vec![10.0], vec![10.0]).unwrap().score();
    assert_eq!(report.winnings, 10.0);
}
