//! Human-readable rendering of a detail record

use std::fmt::Write;

use crate::types::IpoDetail;

const PLACEHOLDER: &str = "N/A";
const RULE: &str = "=======================================";

fn or_placeholder(value: &str) -> &str {
    if value.trim().is_empty() {
        PLACEHOLDER
    } else {
        value
    }
}

/// Group the integer part in threes, keeping at most three decimals
///
/// `1234567.891` renders as `1,234,567.891`; trailing zeros are dropped.
pub fn group_thousands(n: f64) -> String {
    if !n.is_finite() {
        return "0".to_string();
    }

    let rendered = format!("{:.3}", n.abs());
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if n < 0.0 && (int_part != "0" || !frac_part.is_empty()) {
        "-"
    } else {
        ""
    };

    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac_part}")
    }
}

/// Multi-section text summary of a listing
///
/// Optional sections (A+H, proceeds, management, cornerstones, prospectus,
/// shareholders) are left out when their data is empty.
pub fn format_detail(detail: &IpoDetail) -> String {
    let info = &detail.info;
    let company = &detail.company_info;
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out);
    let _ = writeln!(out, "{} ({})", or_placeholder(&info.stock_name), info.stock_code);
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out);

    let _ = writeln!(out, "Company:");
    let _ = writeln!(out, "- Full name: {}", or_placeholder(&company.full_name));
    let _ = writeln!(out, "- Industry: {}", or_placeholder(&info.industry));
    let _ = writeln!(out, "- Website: {}", or_placeholder(&company.website));
    let _ = writeln!(out, "- Principal office: {}", or_placeholder(&company.principal_office));
    let _ = writeln!(out, "- Chairman: {}", or_placeholder(&company.chairman));
    let _ = writeln!(out, "- Secretary: {}", or_placeholder(&company.secretary));
    let _ = writeln!(out, "- Telephone: {}", or_placeholder(&company.telephone));
    let _ = writeln!(out, "- Business: {}", or_placeholder(&company.business));
    let _ = writeln!(out);

    let _ = writeln!(out, "Offering:");
    let _ = writeln!(out, "- Offer price: {}", or_placeholder(&info.price_range));
    let _ = writeln!(out, "- Lot size: {} shares", info.lot_size);
    let _ = writeln!(out, "- Subscription: {}", or_placeholder(&info.subscription_period));
    let _ = writeln!(out, "- Listing date: {}", or_placeholder(&info.listing_date));
    let _ = writeln!(out, "- Results: {}", or_placeholder(&info.result_date));
    let _ = writeln!(out, "- P/E: {}x", info.pe_ratio);
    let _ = writeln!(out, "- Market cap: {} HKD", group_thousands(info.market_cap));
    let _ = writeln!(out, "- Public offering: {} shares", group_thousands(company.public_offering));
    let _ = writeln!(
        out,
        "- International offering: {} shares",
        group_thousands(company.international_offering)
    );
    let _ = writeln!(out, "- Total shares: {} shares", group_thousands(company.total_shares));
    let _ = writeln!(out, "- Proceeds: {} (10k HKD)", group_thousands(company.raise_money));
    let _ = writeln!(out, "- H-share ratio: {}%", company.issue_ratio);
    let _ = writeln!(out, "- Over-allotment: {}", or_placeholder(&company.over_allotment));
    let _ = writeln!(out, "- Underwriting fee: {}%", company.underwriting_fee);
    let _ = writeln!(out, "- Currency: {}", or_placeholder(&company.currency));
    let _ = writeln!(out);

    if company.is_ah_stock {
        let _ = writeln!(out, "A+H listing:");
        let _ = writeln!(out, "- A-share code: {}", or_placeholder(&company.a_symbol));
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "Underwriting syndicate:");
    let _ = writeln!(out, "- Sponsor: {}", or_placeholder(&info.sponsor));
    let _ = writeln!(out, "- Lead agents: {}", or_placeholder(&company.lead_agent));
    let _ = writeln!(out, "- Bookrunners: {}", or_placeholder(&company.book_runners));
    let _ = writeln!(out, "- Coordinator: {}", or_placeholder(&company.coordinator));
    let _ = writeln!(
        out,
        "- Stabilizing manager: {}",
        or_placeholder(&company.stabilizing_manager)
    );
    let _ = writeln!(out);

    if !company.use_of_proceeds.trim().is_empty() {
        let _ = writeln!(out, "Use of proceeds:");
        let _ = writeln!(out, "{}", company.use_of_proceeds.replace("\\n", "\n"));
        let _ = writeln!(out);
    }

    if !company.management.is_empty() {
        let _ = writeln!(out, "Management:");
        for (i, manager) in company.management.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. {} - {}",
                i + 1,
                or_placeholder(&manager.name),
                or_placeholder(&manager.position)
            );
        }
        let _ = writeln!(out);
    }

    if !company.corner_stone_investors.is_empty() {
        let _ = writeln!(
            out,
            "Cornerstone investors (total {}%):",
            company.total_corner_stone_percentage
        );
        for (i, investor) in company.corner_stone_investors.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, or_placeholder(&investor.name));
            let _ = writeln!(
                out,
                "   - Shares: {} ({}%)",
                group_thousands(investor.shareholding),
                investor.percentage
            );
            let _ = writeln!(
                out,
                "   - Investment: {} HKD",
                group_thousands(investor.investment_amount)
            );
            let _ = writeln!(
                out,
                "   - Type: {} | Lock-up ends: {}",
                or_placeholder(&investor.investor_type),
                or_placeholder(&investor.release_date)
            );
        }
        let _ = writeln!(out);
    }

    if !company.prospectus_link.trim().is_empty() {
        let _ = writeln!(out, "Prospectus:");
        let _ = writeln!(out, "{}", company.prospectus_link);
        let _ = writeln!(out);
    }

    if !company.substantial_shareholders.trim().is_empty() {
        let _ = writeln!(out, "Substantial shareholders:");
        let _ = writeln!(out, "{}", company.substantial_shareholders);
    }

    out
}
