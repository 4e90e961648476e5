//! Built-in seed dataset for a fresh triage session.

use super::model::{CardKind, FeedbackCard};

fn avatar(seed: &str) -> String {
    format!("https://api.dicebear.com/7.x/avataaars/svg?seed={seed}")
}

/// The default deck, in triage order. Ids are unique.
pub fn default_seed() -> Vec<FeedbackCard> {
    vec![
        FeedbackCard::new(
            "1",
            CardKind::Feature,
            "Direct IRS E-File Integration",
            "Users are requesting a more streamlined way to e-file directly to the IRS from \
             within the platform, bypassing third-party bridges to reduce latency and security risks.",
        )
        .with_emoji("🏦")
        .with_mentions(124)
        .with_reporter("CPA Mark", avatar("Mark"))
        .with_reporter("Linda S.", avatar("Linda"))
        .with_reporter("TaxPro Inc", avatar("TaxPro"))
        .with_tags(["Critical", "API", "IRS"])
        .with_competitor("TurboTax", true)
        .with_evidence(
            "Zendesk #4410",
            "Why do I have to export a CSV to file? Can we just hit 'Submit' to IRS?",
            "1h ago",
        )
        .with_evidence(
            "Slack #tax-ops",
            "Enterprise firms are asking for direct IRS API status tracking.",
            "4h ago",
        ),
        FeedbackCard::new(
            "2",
            CardKind::Bug,
            "Incorrect Section 179 Depreciation Calc",
            "Reported discrepancy in the 2024 Section 179 expense deduction limit. AI is \
             calculating based on 2023 thresholds ($1.16M vs $1.22M).",
        )
        .with_emoji("📐")
        .with_mentions(89)
        .with_reporter("Accountant Dave", avatar("Dave"))
        .with_tags(["Bug", "High Priority", "Calculation"])
        .with_evidence(
            "Twitter",
            "@TaxGo_App your depreciation math is off for 2024 returns. Please fix!",
            "30m ago",
        )
        .with_evidence(
            "In-App Feedback",
            "The system is capping Section 179 too early. Check 2024 IRS updates.",
            "2h ago",
        ),
        FeedbackCard::new(
            "3",
            CardKind::Feature,
            "AI Mileage Log Reconciliation",
            "Users want the AI to automatically reconcile Uber/Lyft mileage logs with bank \
             statements to auto-generate Form 2106 deductions.",
        )
        .with_emoji("🚗")
        .with_mentions(45)
        .with_reporter("Gary V.", avatar("Gary"))
        .with_reporter("Uber Driver Assoc", avatar("Uber"))
        .with_tags(["AI", "Automation", "Form 2106"])
        .with_competitor("QuickBooks", false)
        .with_evidence(
            "Reddit r/TaxPro",
            "TaxGo needs a better way to handle gig worker mileage.",
            "1d ago",
        ),
        FeedbackCard::new(
            "4",
            CardKind::Feature,
            "State-Specific K-1 Auto-Import",
            "Large firms need faster state-level K-1 processing, specifically for NY and CA. \
             Currently requires heavy manual data entry.",
        )
        .with_emoji("📜")
        .with_mentions(67)
        .with_reporter("Sarah Corp", avatar("Sarah"))
        .with_tags(["Reporting", "K-1", "State Tax"])
        .with_evidence("Email", "Processing 500 NY K-1s is taking hours. Help!", "2d ago"),
        FeedbackCard::new(
            "5",
            CardKind::Bug,
            "Duplicate 1099-NEC Generation",
            "System is generating duplicate 1099-NEC forms when the vendor has multiple bank \
             accounts linked. Risk of misreporting to the IRS.",
        )
        .with_emoji("🛑")
        .with_mentions(34)
        .with_reporter("Office Mgr", avatar("Office"))
        .with_tags(["Bug", "Urgent", "Compliance"])
        .with_evidence(
            "Slack #support",
            "URGENT: A client sent two 1099s to the same contractor. IRS will flag this.",
            "45m ago",
        ),
        FeedbackCard::new(
            "6",
            CardKind::Feature,
            "Opportunity Zone Investment Tracker",
            "High-net-worth clients need a dashboard to track QOF (Qualified Opportunity Fund) \
             investments for deferral tracking.",
        )
        .with_emoji("🏗️")
        .with_mentions(22)
        .with_reporter("Investor Group", avatar("Inv"))
        .with_tags(["Strategic", "Wealth Management"])
        .with_competitor("Addepar", true)
        .with_evidence(
            "Interview",
            "We need a way to track reinvestment timelines for tax deferrals.",
            "1w ago",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn seed_ids_are_unique() {
        let seed = default_seed();
        let ids: HashSet<_> = seed.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), seed.len());
    }

    #[test]
    fn seed_order_and_kinds() {
        let kinds: Vec<_> = default_seed().iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                CardKind::Feature,
                CardKind::Bug,
                CardKind::Feature,
                CardKind::Feature,
                CardKind::Bug,
                CardKind::Feature,
            ]
        );
    }
}
