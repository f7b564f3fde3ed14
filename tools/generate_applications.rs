//! Sample Application Generator
//!
//! Generates plausible loan applications as JSON Lines for exercising the
//! scoring pipeline.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use credit_risk_scorer::types::application::LoanApplication;
use rand::Rng;
use std::fs;
use std::io::Write;
use tracing::info;

/// Application generator with low-risk and high-risk profiles
struct ApplicationGenerator {
    rng: rand::rngs::ThreadRng,
    application_counter: u64,
}

impl ApplicationGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            application_counter: 0,
        }
    }

    fn next_id(&mut self) -> String {
        self.application_counter += 1;
        format!("app_{:08}", self.application_counter)
    }

    fn random_issue_date(&mut self) -> NaiveDate {
        let today = Utc::now().date_naive();
        let year = self.rng.gen_range(today.year() - 3..=today.year());
        let month = self.rng.gen_range(1..=12);
        NaiveDate::from_ymd_opt(year, month, self.rng.gen_range(1..=28))
            .unwrap_or(today)
    }

    /// Generate a solid-borrower application
    fn generate_typical(&mut self) -> LoanApplication {
        let fico_low = self.rng.gen_range(680.0_f64..790.0).round();

        LoanApplication {
            application_id: self.next_id(),
            loan_amnt: self.rng.gen_range(3000.0_f64..20000.0).round(),
            int_rate: self.rng.gen_range(6.0..14.0),
            term: self
                .random_choice(&["36 months", "36 months", "60 months"])
                .to_string(),
            annual_inc: self.rng.gen_range(40000.0_f64..120000.0).round(),
            home_ownership: self.random_choice(&["MORTGAGE", "OWN", "RENT"]).to_string(),
            purpose: self
                .random_choice(&["credit_card", "debt_consolidation", "home_improvement", "car"])
                .to_string(),
            dti: self.rng.gen_range(5.0..25.0),
            initial_list_status: self.random_choice(&["f", "w"]).to_string(),
            verification_status: self
                .random_choice(&["Not Verified", "Source Verified", "Verified"])
                .to_string(),
            application_type: "Individual".to_string(),
            mort_acc: self.rng.gen_range(0..4),
            pub_rec_bankruptcies: 0,
            issue_date: self.random_issue_date(),
            fico_range_low: fico_low,
            fico_range_high: (fico_low + 4.0).min(850.0),
            time_to_earliest_cr_line: self.rng.gen_range(60.0..300.0).round(),
            timestamp: Utc::now(),
        }
    }

    /// Generate a stretched-borrower application
    fn generate_risky(&mut self) -> LoanApplication {
        let fico_low = self.rng.gen_range(600.0_f64..660.0).round();

        LoanApplication {
            application_id: self.next_id(),
            loan_amnt: self.rng.gen_range(15000.0_f64..40000.0).round(), // Large loan
            int_rate: self.rng.gen_range(18.0..30.0),                    // High rate
            term: "60 months".to_string(),
            annual_inc: self.rng.gen_range(18000.0_f64..45000.0).round(), // Low income
            home_ownership: "RENT".to_string(),
            purpose: self
                .random_choice(&["small_business", "other", "moving"])
                .to_string(),
            dti: self.rng.gen_range(30.0..55.0), // Heavy debt load
            initial_list_status: self.random_choice(&["f", "w"]).to_string(),
            verification_status: "Not Verified".to_string(),
            application_type: self.random_choice(&["Individual", "Joint App"]).to_string(),
            mort_acc: 0,
            pub_rec_bankruptcies: self.rng.gen_range(0..3),
            issue_date: self.random_issue_date(),
            fico_range_low: fico_low,
            fico_range_high: fico_low + 4.0,
            time_to_earliest_cr_line: self.rng.gen_range(12.0..80.0).round(), // Thin file
            timestamp: Utc::now(),
        }
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("generate_applications=info".parse()?),
        )
        .init();

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let output = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or("applications.jsonl");
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);
    let risky_rate: f64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0.2);

    info!(
        output = %output,
        count = count,
        risky_rate = risky_rate,
        "Generating sample applications"
    );

    let mut generator = ApplicationGenerator::new();
    let mut rng = rand::thread_rng();
    let mut file = fs::File::create(output)
        .with_context(|| format!("Failed to create output file {}", output))?;

    let mut typical_count = 0;
    let mut risky_count = 0;

    for i in 0..count {
        let application = if rng.gen_bool(risky_rate) {
            risky_count += 1;
            generator.generate_risky()
        } else {
            typical_count += 1;
            generator.generate_typical()
        };

        serde_json::to_writer(&mut file, &application)?;
        writeln!(file)?;

        if (i + 1) % 50 == 0 {
            info!(
                "Generated {}/{} applications ({} typical, {} risky)",
                i + 1,
                count,
                typical_count,
                risky_count
            );
        }
    }

    info!(
        "Completed! Wrote {} applications ({} typical, {} risky) to {}",
        count, typical_count, risky_count, output
    );

    Ok(())
}
