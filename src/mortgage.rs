use chrono::{Months, NaiveDate};
use log::{debug, trace};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::amortization::{
    self, fixed_monthly_payment, interest_payments, outstanding_principals, principal_payments,
    total_repayment, AmortizationPoint,
};
use crate::error::{MortgageError, Result};

pub const DEFAULT_INSURANCE_RATE: f64 = 0.01;
pub const PROPERTY_TAX_RATE: f64 = 1.22e-2;
pub const PMI_DOWN_PAYMENT_THRESHOLD: f64 = 0.2;
// PMI stops once the balance drops to this fraction of the principal
pub const PMI_CUTOFF_FRACTION: f64 = 0.8;
pub const MAX_TERM_YEARS: u32 = 100;

#[cfg(feature = "serde")]
fn default_insurance_rate() -> f64 {
    DEFAULT_INSURANCE_RATE
}

/// Raw loan terms as supplied by the caller, before validation.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct LoanInputs {
    pub total_price: f64,
    pub num_years: u32,
    pub annual_interest_rate: f64,
    pub down_payment_fraction: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_insurance_rate"))]
    pub insurance_rate: f64,
}

impl TryFrom<LoanInputs> for LoanParameters {
    type Error = MortgageError;

    fn try_from(inputs: LoanInputs) -> Result<Self> {
        LoanParameters::build(
            inputs.total_price,
            inputs.num_years,
            inputs.annual_interest_rate,
            inputs.down_payment_fraction,
            inputs.insurance_rate,
        )
    }
}

impl From<LoanParameters> for LoanInputs {
    fn from(params: LoanParameters) -> Self {
        params.inputs()
    }
}

// serialized as its inputs only; derived fields are rebuilt on the way back in
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "LoanInputs", into = "LoanInputs")
)]
pub struct LoanParameters {
    total_price: f64,
    num_years: u32,
    annual_interest_rate: f64,
    down_payment_fraction: f64,
    insurance_rate: f64,
    tax_rate: f64,
    num_months: u32,
    down_payment: f64,
    principal: f64,
    monthly_rate: f64,
}

impl LoanParameters {
    pub fn new(
        total_price: f64,
        num_years: u32,
        annual_interest_rate: f64,
        down_payment_fraction: f64,
    ) -> Result<Self> {
        Self::build(
            total_price,
            num_years,
            annual_interest_rate,
            down_payment_fraction,
            DEFAULT_INSURANCE_RATE,
        )
    }

    pub fn with_insurance_rate(self, insurance_rate: f64) -> Result<Self> {
        Self::build(
            self.total_price,
            self.num_years,
            self.annual_interest_rate,
            self.down_payment_fraction,
            insurance_rate,
        )
    }

    fn build(
        total_price: f64,
        num_years: u32,
        annual_interest_rate: f64,
        down_payment_fraction: f64,
        insurance_rate: f64,
    ) -> Result<Self> {
        if !total_price.is_finite() || total_price <= 0. {
            return Err(MortgageError::InvalidTotalPrice(total_price));
        }
        if num_years == 0 || num_years > MAX_TERM_YEARS {
            return Err(MortgageError::InvalidTerm(num_years));
        }
        if !annual_interest_rate.is_finite() || annual_interest_rate < 0. {
            return Err(MortgageError::InvalidInterestRate(annual_interest_rate));
        }
        if !(0. ..1.).contains(&down_payment_fraction) {
            return Err(MortgageError::InvalidDownPayment(down_payment_fraction));
        }
        if !insurance_rate.is_finite() || insurance_rate < 0. {
            return Err(MortgageError::InvalidInsuranceRate(insurance_rate));
        }

        let down_payment = down_payment_fraction * total_price;
        Ok(Self {
            total_price,
            num_years,
            annual_interest_rate,
            down_payment_fraction,
            insurance_rate,
            tax_rate: PROPERTY_TAX_RATE,
            num_months: num_years * 12,
            down_payment,
            principal: total_price - down_payment,
            monthly_rate: annual_interest_rate / 12.,
        })
    }

    pub fn inputs(&self) -> LoanInputs {
        LoanInputs {
            total_price: self.total_price,
            num_years: self.num_years,
            annual_interest_rate: self.annual_interest_rate,
            down_payment_fraction: self.down_payment_fraction,
            insurance_rate: self.insurance_rate,
        }
    }

    pub fn total_price(&self) -> f64 {
        self.total_price
    }

    pub fn num_years(&self) -> u32 {
        self.num_years
    }

    pub fn annual_interest_rate(&self) -> f64 {
        self.annual_interest_rate
    }

    pub fn down_payment_fraction(&self) -> f64 {
        self.down_payment_fraction
    }

    pub fn insurance_rate(&self) -> f64 {
        self.insurance_rate
    }

    pub fn tax_rate(&self) -> f64 {
        self.tax_rate
    }

    pub fn num_months(&self) -> u32 {
        self.num_months
    }

    pub fn down_payment(&self) -> f64 {
        self.down_payment
    }

    pub fn principal(&self) -> f64 {
        self.principal
    }

    pub fn monthly_rate(&self) -> f64 {
        self.monthly_rate
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ItemKind {
    Fraction,
    Percent,
    Currency,
    Ratio,
}

#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SummaryItem {
    pub label: &'static str,
    pub value: f64,
    pub kind: ItemKind,
}

impl SummaryItem {
    fn new(label: &'static str, value: f64, kind: ItemKind) -> Self {
        Self { label, value, kind }
    }

    pub fn as_pair(&self) -> (&'static str, f64) {
        (self.label, self.value)
    }
}

/// Cost breakdown of a mortgage, rebuilt in full from `LoanParameters`.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MortgageSummary {
    pub down_payment_fraction: f64,
    pub interest_rate: f64,
    pub insurance_rate: f64,
    pub total_price: f64,
    pub down_payment: f64,
    pub principal: f64,
    pub interest_to_principal_ratio: f64,
    pub monthly_insurance_payment: f64,
    pub monthly_principal_and_interest: f64,
    pub monthly_payment: f64,
    pub monthly_tax: f64,
    pub monthly_payment_with_tax: f64,
    pub total_tax: f64,
    pub total_loan_repayment: f64,
    pub total_interest: f64,
    pub total_insurance_payment: f64,
    pub total_cost_no_tax: f64,
    pub grand_total: f64,
}

impl MortgageSummary {
    pub fn items(&self) -> Vec<SummaryItem> {
        use ItemKind::*;
        vec![
            SummaryItem::new("Down payment fraction", self.down_payment_fraction, Fraction),
            SummaryItem::new("Interest Rate", self.interest_rate, Fraction),
            SummaryItem::new("PMI rate", self.insurance_rate, Percent),
            SummaryItem::new("Total price", self.total_price, Currency),
            SummaryItem::new("Down payment", self.down_payment, Currency),
            SummaryItem::new("Principal loan", self.principal, Currency),
            SummaryItem::new(
                "Interest to principal ratio",
                self.interest_to_principal_ratio,
                Ratio,
            ),
            SummaryItem::new("monthly PMI Insurance", self.monthly_insurance_payment, Currency),
            SummaryItem::new(
                "monthly principal + interest",
                self.monthly_principal_and_interest,
                Currency,
            ),
            SummaryItem::new("monthly payment", self.monthly_payment, Currency),
            SummaryItem::new(
                "monthly payment + tax (approx)",
                self.monthly_payment_with_tax,
                Currency,
            ),
            SummaryItem::new("Total tax paid", self.total_tax, Currency),
            SummaryItem::new("Total loan payment", self.total_loan_repayment, Currency),
            SummaryItem::new("Total interest paid", self.total_interest, Currency),
            SummaryItem::new("Total PMI paid", self.total_insurance_payment, Currency),
            SummaryItem::new("Total cost (no tax)", self.total_cost_no_tax, Currency),
            SummaryItem::new("Grand total", self.grand_total, Currency),
        ]
    }

    pub fn pairs(&self) -> Vec<(&'static str, f64)> {
        self.items().iter().map(SummaryItem::as_pair).collect()
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DatedPayment {
    pub pmt_date: NaiveDate,
    pub point: AmortizationPoint,
}

impl fmt::Display for DatedPayment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pmt number {}, date {}, payment ${:.2}, interest paid ${:.2}, principal paid ${:.2}, balance ${:.2}",
            self.point.month + 1,
            self.pmt_date,
            self.point.payment(),
            self.point.interest_payment,
            self.point.principal_payment,
            self.point.outstanding_principal
        )
    }
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PrincipalChart {
    pub years: Vec<f64>,
    pub outstanding_principal: Vec<f64>,
    // 80% of the sale price
    pub sale_price_reference: f64,
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PaymentChart {
    pub years: Vec<f64>,
    pub interest: Vec<f64>,
    pub principal: Vec<f64>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Mortgage {
    params: LoanParameters,
    summary: MortgageSummary,
}

impl Mortgage {
    pub fn new(params: LoanParameters) -> Self {
        Self {
            params,
            summary: build_summary(&params),
        }
    }

    pub fn from_terms(
        total_price: f64,
        num_years: u32,
        annual_interest_rate: f64,
        down_payment_fraction: f64,
    ) -> Result<Self> {
        LoanParameters::new(
            total_price,
            num_years,
            annual_interest_rate,
            down_payment_fraction,
        )
        .map(Self::new)
    }

    pub fn parameters(&self) -> &LoanParameters {
        &self.params
    }

    pub fn summary(&self) -> &MortgageSummary {
        &self.summary
    }

    pub fn compute_summary(&mut self) -> &MortgageSummary {
        self.summary = build_summary(&self.params);
        &self.summary
    }

    pub fn set_parameters(&mut self, params: LoanParameters) {
        self.params = params;
        self.compute_summary();
    }

    pub fn set_total_price(&mut self, total_price: f64) -> Result<()> {
        let p = self.params;
        self.update(LoanParameters::build(
            total_price,
            p.num_years,
            p.annual_interest_rate,
            p.down_payment_fraction,
            p.insurance_rate,
        ))
    }

    pub fn set_num_years(&mut self, num_years: u32) -> Result<()> {
        let p = self.params;
        self.update(LoanParameters::build(
            p.total_price,
            num_years,
            p.annual_interest_rate,
            p.down_payment_fraction,
            p.insurance_rate,
        ))
    }

    pub fn set_annual_interest_rate(&mut self, annual_interest_rate: f64) -> Result<()> {
        let p = self.params;
        self.update(LoanParameters::build(
            p.total_price,
            p.num_years,
            annual_interest_rate,
            p.down_payment_fraction,
            p.insurance_rate,
        ))
    }

    pub fn set_down_payment_fraction(&mut self, down_payment_fraction: f64) -> Result<()> {
        let p = self.params;
        self.update(LoanParameters::build(
            p.total_price,
            p.num_years,
            p.annual_interest_rate,
            down_payment_fraction,
            p.insurance_rate,
        ))
    }

    pub fn set_insurance_rate(&mut self, insurance_rate: f64) -> Result<()> {
        self.update(self.params.with_insurance_rate(insurance_rate))
    }

    // leaves the mortgage untouched when validation fails
    fn update(&mut self, params: Result<LoanParameters>) -> Result<()> {
        self.set_parameters(params?);
        Ok(())
    }

    pub fn principal_series(&self) -> Vec<f64> {
        let p = &self.params;
        outstanding_principals(0..p.num_months, p.principal, p.num_months, p.monthly_rate)
    }

    pub fn interest_series(&self) -> Vec<f64> {
        let p = &self.params;
        interest_payments(0..p.num_months, p.principal, p.num_months, p.monthly_rate)
    }

    pub fn principal_payment_series(&self) -> Vec<f64> {
        let p = &self.params;
        principal_payments(0..p.num_months, p.principal, p.num_months, p.monthly_rate)
    }

    pub fn schedule(&self) -> Vec<AmortizationPoint> {
        let p = &self.params;
        amortization::schedule(p.principal, p.num_months, p.monthly_rate)
    }

    // month k is paid k months after first_pmt_date
    pub fn dated_schedule(&self, first_pmt_date: NaiveDate) -> Result<Vec<DatedPayment>> {
        self.schedule()
            .into_iter()
            .map(|point| -> Result<DatedPayment> {
                let pmt_date = first_pmt_date
                    .checked_add_months(Months::new(point.month))
                    .ok_or(MortgageError::DateOutOfRange {
                        start: first_pmt_date,
                        months: point.month,
                    })?;
                Ok(DatedPayment { pmt_date, point })
            })
            .collect()
    }

    pub fn insurance_months(&self) -> u32 {
        if self.summary.monthly_insurance_payment == 0. {
            return 0;
        }
        count_insurance_months(&self.params)
    }

    pub fn principal_chart(&self) -> PrincipalChart {
        PrincipalChart {
            years: self.years(),
            outstanding_principal: self.principal_series(),
            sale_price_reference: PMI_CUTOFF_FRACTION * self.params.total_price,
        }
    }

    pub fn payment_chart(&self) -> PaymentChart {
        PaymentChart {
            years: self.years(),
            interest: self.interest_series(),
            principal: self.principal_payment_series(),
        }
    }

    fn years(&self) -> Vec<f64> {
        (0..self.params.num_months).map(|k| k as f64 / 12.).collect()
    }
}

fn round(amt: f64, dec: f64) -> f64 {
    if amt == 0. {
        0.
    } else {
        (amt * 10_f64.powf(dec)).round_ties_even() / 10_f64.powf(dec)
    }
}

// months whose balance is still above the PMI cutoff; scans the full term
fn count_insurance_months(params: &LoanParameters) -> u32 {
    let cutoff = PMI_CUTOFF_FRACTION * params.principal;
    outstanding_principals(
        0..params.num_months,
        params.principal,
        params.num_months,
        params.monthly_rate,
    )
    .into_iter()
    .filter(|&balance| balance > cutoff)
    .count() as u32
}

fn monthly_insurance_payment(params: &LoanParameters) -> f64 {
    if params.down_payment_fraction < PMI_DOWN_PAYMENT_THRESHOLD {
        params.insurance_rate * params.principal / 12.
    } else {
        0.
    }
}

fn build_summary(params: &LoanParameters) -> MortgageSummary {
    let principal = params.principal;
    let n = params.num_months;
    let alpha = params.monthly_rate;

    let monthly_insurance = monthly_insurance_payment(params);
    let total_insurance = if monthly_insurance > 0. {
        let months = count_insurance_months(params);
        trace!("PMI paid for {} months", months);
        monthly_insurance * months as f64
    } else {
        0.
    };

    let total_tax = params.tax_rate * params.total_price * params.num_years as f64;
    let monthly_tax = params.tax_rate * params.total_price / 12.;
    let payment = fixed_monthly_payment(principal, n, alpha);
    let total_loan_repayment = total_repayment(principal, n, alpha);
    let total_interest = total_loan_repayment - principal;
    let total_cost_no_tax = total_loan_repayment + params.down_payment + total_insurance;

    debug!(
        "summary for principal {}, {} months at {}: payment {}, total {}",
        principal, n, alpha, payment, total_loan_repayment
    );

    MortgageSummary {
        down_payment_fraction: params.down_payment_fraction,
        interest_rate: params.annual_interest_rate,
        insurance_rate: params.insurance_rate,
        total_price: params.total_price,
        down_payment: params.down_payment,
        principal,
        interest_to_principal_ratio: round(total_interest / principal, 2.),
        monthly_insurance_payment: monthly_insurance,
        monthly_principal_and_interest: payment,
        monthly_payment: payment + monthly_insurance,
        monthly_tax,
        monthly_payment_with_tax: payment + monthly_insurance + monthly_tax,
        total_tax,
        total_loan_repayment,
        total_interest,
        total_insurance_payment: total_insurance,
        total_cost_no_tax,
        grand_total: total_cost_no_tax + total_tax,
    }
}
