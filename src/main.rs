#![allow(dead_code)]
use chrono::NaiveDate;
use log::{error, info};
use mortgage::mortgage::Mortgage;
use mortgage::render::{Renderer, TextRenderer};
use simple_logger::SimpleLogger;

fn main() {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()
        .unwrap();

    let mortgage = match Mortgage::from_terms(300000., 30, 0.04, 0.1) {
        Ok(mortgage) => mortgage,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    info!(
        "PMI paid for {} of {} months",
        mortgage.insurance_months(),
        mortgage.parameters().num_months()
    );

    let renderer = TextRenderer;
    print!("{}", renderer.render_summary(mortgage.summary()));
    print!("{}", renderer.render_principal_chart(&mortgage.principal_chart()));
    print!("{}", renderer.render_payment_chart(&mortgage.payment_chart()));

    if let Some(first_pmt_date) = NaiveDate::from_ymd_opt(2024, 4, 1) {
        match mortgage.dated_schedule(first_pmt_date) {
            Ok(sched) => sched.iter().take(12).for_each(|pmt| println!("{}", pmt)),
            Err(e) => error!("{}", e),
        }
    }
}

// verifies that types can implement the gated traits below
fn is_normal<T: Sized + Send + Sync + Unpin>() {}

#[test]
fn normal_types() {
    is_normal::<mortgage::LoanParameters>();
    is_normal::<mortgage::MortgageSummary>();
    is_normal::<Mortgage>();
    is_normal::<mortgage::amortization::AmortizationPoint>();
    is_normal::<mortgage::mortgage::DatedPayment>();
}
