use meshlint_types::{
    CheckOutcome, CheckStatus, REASON_CANCELLED, REASON_CHECK_ERRORS, REASON_NO_CHECKS,
    REASON_TRUNCATED, RunReceipt, Verbosity, VerdictStatus,
};

/// Items listed per failing check at normal verbosity.
pub const NORMAL_ITEM_LIMIT: usize = 10;

const RENDERABLE_REASONS: &[&str] = &[
    REASON_CHECK_ERRORS,
    REASON_TRUNCATED,
    REASON_CANCELLED,
    REASON_NO_CHECKS,
];

pub fn render_markdown_for_receipt(receipt: &RunReceipt, verbosity: Verbosity) -> String {
    let status = match receipt.verdict.status {
        VerdictStatus::Pass => "PASS",
        VerdictStatus::Fail => "FAIL",
        VerdictStatus::Error => "ERROR",
    };

    let mut out = String::new();
    out.push_str(&format!("## meshlint: {status}\n\n"));

    let counts = &receipt.verdict.counts;
    out.push_str(&format!(
        "Scene `{}` (backend: `{}`, {} entities): **{}** passed, **{}** failed, **{}** errored\n\n",
        escape_md(&receipt.scene.source),
        receipt.scene.backend.as_str(),
        receipt.scene.entities_considered,
        counts.passed,
        counts.failed,
        counts.errored
    ));

    let reasons: Vec<&String> = receipt
        .verdict
        .reasons
        .iter()
        .filter(|r| RENDERABLE_REASONS.contains(&r.as_str()))
        .collect();
    if !reasons.is_empty() {
        out.push_str("**Verdict reasons:**\n");
        for r in &reasons {
            out.push_str(&format!("- {r}\n"));
        }
        out.push('\n');
    }

    if receipt.checks.is_empty() {
        out.push_str("No checks were run.\n");
        return out;
    }

    out.push_str("| Check | Category | Kind | Status | Count |\n");
    out.push_str("|---|---|---|---|---|\n");
    for c in &receipt.checks {
        out.push_str(&render_check_row(c));
    }

    if verbosity == Verbosity::Overview {
        return out;
    }

    let limit = match verbosity {
        Verbosity::Verbose => usize::MAX,
        _ => NORMAL_ITEM_LIMIT,
    };

    for c in receipt.checks.iter().filter(|c| c.status == CheckStatus::Fail) {
        out.push_str(&format!("\n### {} (`{}`)\n\n", escape_md(&c.label), c.name));
        let shown = c.items.len().min(limit);
        for item in &c.items[..shown] {
            out.push_str(&format!("- `{}`\n", escape_md(item)));
        }
        let hidden = c.count as usize - shown.min(c.count as usize);
        if hidden > 0 {
            out.push_str(&format!("- and {hidden} more\n"));
        }
    }

    let errored: Vec<&CheckOutcome> = receipt
        .checks
        .iter()
        .filter(|c| c.status == CheckStatus::Error)
        .collect();
    if !errored.is_empty() {
        out.push_str("\n**Check errors:**\n");
        for c in errored {
            match (verbosity, &c.error) {
                (Verbosity::Verbose, Some(e)) => {
                    out.push_str(&format!("- `{}`: {}\n", c.name, escape_md(e)))
                }
                _ => out.push_str(&format!("- `{}`\n", c.name)),
            }
        }
    }

    out
}

fn render_check_row(c: &CheckOutcome) -> String {
    format!(
        "| {label} (`{name}`) | {category} | {kind} | {status} | {count} |\n",
        label = escape_md(&c.label),
        name = c.name,
        category = escape_md(&c.category),
        kind = c.entity_kind.as_str(),
        status = c.status.as_str(),
        count = c.count
    )
}

fn escape_md(s: &str) -> String {
    s.replace('|', "\\|").replace('`', "\\`")
}
