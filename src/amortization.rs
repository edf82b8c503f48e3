use log::trace;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AmortizationPoint {
    pub month: u32,
    pub outstanding_principal: f64,
    pub interest_payment: f64,
    pub principal_payment: f64,
}

impl AmortizationPoint {
    pub fn payment(&self) -> f64 {
        self.interest_payment + self.principal_payment
    }
}

// (1 + alpha)^k
fn growth(alpha: f64, k: u32) -> f64 {
    match i32::try_from(k) {
        Ok(k) => (1. + alpha).powi(k),
        Err(_) => (1. + alpha).powf(k as f64),
    }
}

// zero rate, or a rate too small to move (1 + alpha)^n off 1: repay straight-line
fn is_flat(alpha: f64, num_months: u32) -> bool {
    alpha == 0. || growth(alpha, num_months) - 1. == 0.
}

// balance right after the k-th payment, closed form instead of the recurrence
pub fn outstanding_principal(k: u32, principal: f64, num_months: u32, alpha: f64) -> f64 {
    if is_flat(alpha, num_months) {
        return principal * (1. - k as f64 / num_months as f64);
    }
    let g_k = growth(alpha, k);
    let g_n = growth(alpha, num_months);
    principal * g_k - principal * g_n * (g_k - 1.) / (g_n - 1.)
}

pub fn fixed_monthly_payment(principal: f64, num_months: u32, alpha: f64) -> f64 {
    if is_flat(alpha, num_months) {
        return principal / num_months as f64;
    }
    let g_n = growth(alpha, num_months);
    alpha * g_n * principal / (g_n - 1.)
}

pub fn interest_payment(k: u32, principal: f64, num_months: u32, alpha: f64) -> f64 {
    alpha * outstanding_principal(k, principal, num_months, alpha)
}

pub fn principal_payment(k: u32, principal: f64, num_months: u32, alpha: f64) -> f64 {
    fixed_monthly_payment(principal, num_months, alpha)
        - interest_payment(k, principal, num_months, alpha)
}

pub fn total_repayment(principal: f64, num_months: u32, alpha: f64) -> f64 {
    num_months as f64 * fixed_monthly_payment(principal, num_months, alpha)
}

pub fn outstanding_principals<I>(ks: I, principal: f64, num_months: u32, alpha: f64) -> Vec<f64>
where
    I: IntoIterator<Item = u32>,
{
    ks.into_iter()
        .map(|k| outstanding_principal(k, principal, num_months, alpha))
        .collect()
}

pub fn interest_payments<I>(ks: I, principal: f64, num_months: u32, alpha: f64) -> Vec<f64>
where
    I: IntoIterator<Item = u32>,
{
    ks.into_iter()
        .map(|k| interest_payment(k, principal, num_months, alpha))
        .collect()
}

pub fn principal_payments<I>(ks: I, principal: f64, num_months: u32, alpha: f64) -> Vec<f64>
where
    I: IntoIterator<Item = u32>,
{
    ks.into_iter()
        .map(|k| principal_payment(k, principal, num_months, alpha))
        .collect()
}

pub fn amortization_point(k: u32, principal: f64, num_months: u32, alpha: f64) -> AmortizationPoint {
    let balance = outstanding_principal(k, principal, num_months, alpha);
    let interest = alpha * balance;
    AmortizationPoint {
        month: k,
        outstanding_principal: balance,
        interest_payment: interest,
        principal_payment: fixed_monthly_payment(principal, num_months, alpha) - interest,
    }
}

pub fn schedule(principal: f64, num_months: u32, alpha: f64) -> Vec<AmortizationPoint> {
    (0..num_months)
        .map(|k| {
            let point = amortization_point(k, principal, num_months, alpha);
            trace!(
                "month {}, balance {}, interest {}, principal {}",
                point.month,
                point.outstanding_principal,
                point.interest_payment,
                point.principal_payment
            );
            point
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    const P: f64 = 240000.;
    const N: u32 = 360;
    const ALPHA: f64 = 0.04 / 12.;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {} within {} of {}",
            actual,
            tol,
            expected
        );
    }

    #[test]
    fn test_balance_boundaries() {
        for &(p, n, alpha) in &[(P, N, ALPHA), (100000., 180, 0.07 / 12.), (5000., 12, 0.2 / 12.)] {
            assert_close(outstanding_principal(0, p, n, alpha), p, 1e-9 * p);
            assert_close(outstanding_principal(n, p, n, alpha), 0., 1e-6 * p);
        }
    }

    #[test]
    fn test_payment_split_sums_to_fixed_payment() {
        let payment = fixed_monthly_payment(P, N, ALPHA);
        for k in 0..N {
            let split = interest_payment(k, P, N, ALPHA) + principal_payment(k, P, N, ALPHA);
            assert_close(split, payment, 1e-9);
        }
    }

    #[test]
    fn test_fixed_monthly_payment() {
        assert_close(fixed_monthly_payment(P, N, ALPHA), 1145.80, 0.5);
        assert_close(fixed_monthly_payment(270000., N, ALPHA), 1289.02, 0.01);
    }

    #[test]
    fn test_total_repayment() {
        assert_eq!(
            total_repayment(P, N, ALPHA),
            N as f64 * fixed_monthly_payment(P, N, ALPHA)
        );
        assert_close(total_repayment(P, N, ALPHA), 412486.82, 0.01);
    }

    #[test]
    fn test_balance_strictly_decreasing() {
        let balances = outstanding_principals(0..=N, P, N, ALPHA);
        for pair in balances.windows(2) {
            assert!(pair[1] < pair[0], "{} !< {}", pair[1], pair[0]);
        }
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        assert_eq!(fixed_monthly_payment(P, N, 0.), P / N as f64);
        assert_eq!(outstanding_principal(0, P, N, 0.), P);
        assert_eq!(outstanding_principal(N, P, N, 0.), 0.);
        assert_eq!(outstanding_principal(180, P, N, 0.), P / 2.);
        assert_eq!(interest_payment(10, P, N, 0.), 0.);
        assert_eq!(principal_payment(10, P, N, 0.), P / N as f64);
        assert_close(total_repayment(P, N, 0.), P, 1e-6);
        assert!(schedule(P, N, 0.).iter().all(|p| p.outstanding_principal.is_finite()));
    }

    #[test]
    fn test_negligible_rate_is_straight_line() {
        let alpha = 1e-16 / 12.;
        assert_eq!(fixed_monthly_payment(P, N, alpha), P / N as f64);
        assert_eq!(outstanding_principal(0, P, N, alpha), P);
        assert_eq!(outstanding_principal(N, P, N, alpha), 0.);
        for point in schedule(P, N, alpha) {
            assert!(point.outstanding_principal.is_finite());
            assert!(point.interest_payment.is_finite());
            assert_close(point.payment(), P / N as f64, 1e-9);
        }
        assert_close(total_repayment(P, N, alpha), P, 1e-6);
    }

    #[test]
    fn test_vectorized_matches_scalar() {
        let ks = [0, 1, 17, 120, 359];
        let balances = outstanding_principals(ks, P, N, ALPHA);
        let interest = interest_payments(ks, P, N, ALPHA);
        let principal = principal_payments(ks, P, N, ALPHA);
        for (i, &k) in ks.iter().enumerate() {
            assert_eq!(balances[i], outstanding_principal(k, P, N, ALPHA));
            assert_eq!(interest[i], interest_payment(k, P, N, ALPHA));
            assert_eq!(principal[i], principal_payment(k, P, N, ALPHA));
        }
    }

    #[test]
    fn test_schedule() {
        let sched = schedule(P, N, ALPHA);
        assert_eq!(sched.len(), N as usize);
        assert_eq!(sched[0].month, 0);
        assert_eq!(sched[0].outstanding_principal, outstanding_principal(0, P, N, ALPHA));
        assert_close(sched[0].interest_payment, 800., 1e-6);
        assert_eq!(sched[42], amortization_point(42, P, N, ALPHA));
        assert_close(sched[359].payment(), fixed_monthly_payment(P, N, ALPHA), 1e-9);
    }
}
