//! Common test utilities and helpers

use pericope::{ExtractionEngine, PericopeConfig};
use tracing_subscriber::EnvFilter;

/// Create an engine with default configuration and no entity analyzer
pub fn test_engine() -> ExtractionEngine {
    init_tracing();
    ExtractionEngine::new(PericopeConfig::default())
}

/// Install a subscriber once so RUST_LOG reveals pipeline logs in tests
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

/// A small report mixing data-heavy and prose-only sections
pub fn financial_report() -> String {
    "\
1. Executive Summary

The year closed ahead of plan across all operating segments. Customer
retention held steady while onboarding volumes grew through organic
referrals, and the services backlog entering the new year remains the
largest in company history.

2. Financial Results

Net revenue was $8,450,000 for the year ended 12/31/2024, an increase
of 14% over the prior year. Gross margin improved to 61%.

| Segment   | Revenue    | Change |
| Platform  | $5,100,000 | +11%   |
| Services  | $3,350,000 | +19%   |

3. LEGAL NOTICES

Forward-looking statements in this report are subject to risks and
uncertainties. Readers should not place undue reliance on them, and the
company undertakes no obligation to update any statement after the date
of this report except as required by law.
"
    .to_string()
}

/// Build a document of `count` numbered sections with alternating
/// data-rich and prose-only bodies
///
/// Even-numbered sections carry currency, dates, and a table; odd ones
/// are plain prose. Useful for teaching the scorer a separable signal.
pub fn sectioned_document(count: usize) -> String {
    let mut doc = String::new();
    for i in 1..=count {
        doc.push_str(&format!("{i}. Operating Area {i}\n\n"));
        if i % 2 == 0 {
            doc.push_str(&format!(
                "Quarterly totals reached ${amount},000 on 03/{day:02}/2024, a {pct}% \
                 change against plan across {units} tracked units.\n\
                 | Metric | Value |\n\
                 | Units  | {units} |\n\
                 | Orders | {orders} |\n\n",
                amount = 100 + i * 7,
                day = (i % 28) + 1,
                pct = 3 + i % 9,
                units = 40 + i,
                orders = 200 + i * 3,
            ));
        } else {
            doc.push_str(
                "General remarks follow without figures. The team continued routine \
                 work during the period and noted no changes requiring further \
                 attention from reviewers at this time.\n\n",
            );
        }
    }
    doc
}
